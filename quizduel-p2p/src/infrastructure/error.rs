use quizduel_core::GameError;

#[derive(Debug, thiserror::Error)]
pub enum P2PError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Invalid peer ID: {0}")]
    InvalidPeerId(String),

    #[error("No open channel to a peer")]
    NotConnected,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Channel closed")]
    ChannelClosed,

    #[error("Transport registry already initialized")]
    AlreadyInitialized,

    #[error("Transport registry not initialized")]
    NotInitialized,

    #[error("Game error: {0}")]
    Game(#[from] GameError),
}

pub type Result<T> = std::result::Result<T, P2PError>;
