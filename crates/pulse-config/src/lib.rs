pub mod console;
pub mod loader;

pub use console::{ApiConfig, ConsoleConfig, DashboardConfig, LoggingConfig, SimulatorConfig};
pub use loader::{ConfigLoader, DEFAULT_CONFIG_FILE, ENV_PREFIX};
