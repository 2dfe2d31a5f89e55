pub mod application;
pub mod infrastructure;

pub use application::{run_demo, run_interactive, DemoOptions, MatchReport};
pub use infrastructure::{CliError, LogConfig, Result};
