//! Two-player quiz match synchronisation over a single peer-to-peer channel.
//!
//! The host owns progression; both peers grade their own answers and mirror
//! the opponent's. State-changing messages are sequenced, acknowledged and
//! retried on top of an unreliable transport.

// Domain layer (core)
pub mod domain;

// Application layer (use cases)
pub mod application;

// Infrastructure layer (adapters)
pub mod infrastructure;

// Re-exports for convenience
pub use application::{ConnectionEvent, GameLoop, SessionEvent, SyncConfig};
pub use domain::{
    ChannelStatus, ConnectionQuality, IceServer, PeerId, PeerSession, QualityLevel, SessionId,
};
pub use infrastructure::error::{P2PError, Result};
pub use infrastructure::{
    Envelope, MatchboxConnection, MatchboxConnectionBuilder, MemoryConnection, MemoryHub,
    MessageBody, NetworkConnection, TransportRegistry,
};
