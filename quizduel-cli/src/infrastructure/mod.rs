pub mod error;
pub mod observability;
pub mod quiz_loader;

pub use error::{CliError, Result};
pub use observability::LogConfig;
pub use quiz_loader::{demo_quiz, load_quiz, parse_quiz};
