pub mod cli;
pub mod commands;
pub mod shutdown;
pub mod telemetry;

pub use cli::{Cli, Command};
pub use commands::{execute, report, stdin_lines, watch, Console, WatchView};
pub use shutdown::{ShutdownSignal, SignalHandler};
