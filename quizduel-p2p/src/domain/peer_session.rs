use crate::domain::PeerId;
use quizduel_core::Role;

/// Connection status of the one data channel a peer session has
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelStatus {
    /// Host waiting for a dial, or guest dial in flight
    Pending,
    Open { remote: PeerId },
    Closed,
}

/// One side's local connection context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerSession {
    local_id: PeerId,
    role: Role,
    /// Peer the guest dialed; unknown to the host until the channel opens
    target: Option<PeerId>,
    status: ChannelStatus,
}

impl PeerSession {
    pub fn host(local_id: PeerId) -> Self {
        Self {
            local_id,
            role: Role::Host,
            target: None,
            status: ChannelStatus::Pending,
        }
    }

    pub fn guest(local_id: PeerId, target: PeerId) -> Self {
        Self {
            local_id,
            role: Role::Guest,
            target: Some(target),
            status: ChannelStatus::Pending,
        }
    }

    pub fn local_id(&self) -> &PeerId {
        &self.local_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn target(&self) -> Option<&PeerId> {
        self.target.as_ref()
    }

    pub fn status(&self) -> &ChannelStatus {
        &self.status
    }

    pub fn connected(&self) -> bool {
        matches!(self.status, ChannelStatus::Open { .. })
    }

    pub fn remote(&self) -> Option<&PeerId> {
        match &self.status {
            ChannelStatus::Open { remote } => Some(remote),
            _ => None,
        }
    }

    /// Returns false if a channel is already open
    pub fn open(&mut self, remote: PeerId) -> bool {
        if self.connected() {
            return false;
        }
        self.status = ChannelStatus::Open { remote };
        true
    }

    /// Returns false if `peer` is not the open channel's remote
    pub fn close(&mut self, peer: &PeerId) -> bool {
        if self.remote() != Some(peer) {
            return false;
        }
        self.status = ChannelStatus::Closed;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_starts_pending() {
        let session = PeerSession::host(PeerId::new("room"));
        assert_eq!(session.role(), Role::Host);
        assert!(!session.connected());
        assert!(session.target().is_none());
    }

    #[test]
    fn test_single_channel() {
        let mut session = PeerSession::guest(PeerId::new("me"), PeerId::new("room"));

        assert!(session.open(PeerId::new("host")));
        assert!(!session.open(PeerId::new("intruder")));
        assert_eq!(session.remote(), Some(&PeerId::new("host")));
    }

    #[test]
    fn test_close_only_for_remote() {
        let mut session = PeerSession::host(PeerId::new("room"));
        session.open(PeerId::new("guest"));

        assert!(!session.close(&PeerId::new("someone-else")));
        assert!(session.connected());

        assert!(session.close(&PeerId::new("guest")));
        assert_eq!(session.status(), &ChannelStatus::Closed);
    }
}
