use serde::{Deserialize, Serialize};
use std::fmt;

pub use matchbox_socket::PeerId as MatchboxPeerId;

/// Opaque identifier of one end of a data channel, as handed out by the
/// transport. Users copy it around as plain text, so it is kept as a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(String);

impl PeerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<MatchboxPeerId> for PeerId {
    fn from(id: MatchboxPeerId) -> Self {
        Self(id.0.to_string())
    }
}

impl From<&str> for PeerId {
    fn from(id: &str) -> Self {
        Self(id.trim().to_string())
    }
}
