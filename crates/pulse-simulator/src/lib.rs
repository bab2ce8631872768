pub mod channel;
pub mod error;
pub mod jitter;
pub mod run;
pub mod simulator;
pub mod task;

pub use channel::{ChannelConfig, SimulationProfile};
pub use error::{Result, SimulatorError};
pub use jitter::Jitter;
pub use run::RunState;
pub use simulator::{ChannelStats, SimulationStats, Simulator, SimulatorBuilder};
pub use task::RepeatingTask;
