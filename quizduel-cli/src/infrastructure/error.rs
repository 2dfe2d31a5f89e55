use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("P2P error: {0}")]
    P2P(#[from] quizduel_p2p::P2PError),

    #[error("Quiz file not found: {path}")]
    QuizNotFound { path: PathBuf },

    #[error("Invalid quiz: {0}")]
    InvalidQuiz(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Match did not finish within {0:?}")]
    Timeout(std::time::Duration),

    #[error("Peer disconnected before the match finished")]
    Disconnected,
}

impl CliError {
    pub fn quiz_not_found(path: PathBuf) -> Self {
        CliError::QuizNotFound { path }
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
