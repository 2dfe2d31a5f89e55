use crate::domain::PeerId;
use crate::infrastructure::error::{P2PError, Result};
use std::fmt;
use uuid::Uuid;

/// Signalling room a host opens. Its string form is the identifier the host
/// shares and the guest dials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an identifier typed in by a joining player
    pub fn parse(s: &str) -> Result<Self> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| P2PError::InvalidPeerId(format!("{}: {}", s.trim(), e)))
    }

    pub fn to_peer_id(self) -> PeerId {
        PeerId::new(self.0.to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&PeerId> for SessionId {
    type Error = P2PError;

    fn try_from(peer: &PeerId) -> Result<Self> {
        Self::parse(peer.as_str())
    }
}
