pub mod console;
pub mod demo;

pub use console::{log_summary, render, run_interactive};
pub use demo::{run_demo, DemoOptions, MatchReport};
