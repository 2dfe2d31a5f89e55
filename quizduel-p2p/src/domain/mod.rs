mod ice_server;
mod peer;
mod peer_session;
mod quality;
mod session;

pub use ice_server::IceServer;
pub use peer::{MatchboxPeerId, PeerId};
pub use peer_session::{ChannelStatus, PeerSession};
pub use quality::{elapsed_since, ConnectionQuality, QualityLevel, QualityThresholds};
pub use session::SessionId;
