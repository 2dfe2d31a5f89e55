use crate::application::ConnectionEvent;
use crate::domain::{PeerId, PeerSession};
use crate::infrastructure::error::{P2PError, Result};
use crate::infrastructure::message::Envelope;
use crate::infrastructure::transport::NetworkConnection;
use quizduel_core::Role;

/// Owns the transport and the peer session built on top of it
pub struct ConnectionManager<C: NetworkConnection> {
    connection: C,
    session: Option<PeerSession>,
}

impl<C: NetworkConnection> ConnectionManager<C> {
    pub fn new(connection: C) -> Self {
        Self {
            connection,
            session: None,
        }
    }

    /// Take the host role and wait for a guest to dial in
    pub fn become_host(&mut self) -> Result<PeerId> {
        let local_id = self.require_local_id()?;
        self.session = Some(PeerSession::host(local_id.clone()));
        tracing::info!("🏠 Hosting as {}", local_id);
        Ok(local_id)
    }

    /// Take the guest role and dial the host
    pub fn connect_to_peer(&mut self, target: &PeerId) -> Result<()> {
        let local_id = self.require_local_id()?;
        self.connection.dial(target)?;
        self.session = Some(PeerSession::guest(local_id, target.clone()));
        tracing::info!("📞 Dialing {}", target);
        Ok(())
    }

    /// Drain the transport, keeping the peer session's channel state current
    pub fn poll(&mut self) -> Vec<ConnectionEvent> {
        let events = self.drain();
        for event in &events {
            self.track(event);
        }
        events
    }

    /// Raw transport events; pair each with `track` before acting on it
    pub fn drain(&mut self) -> Vec<ConnectionEvent> {
        self.connection.poll_events()
    }

    /// Apply one event to the peer session. Transport errors are logged and
    /// otherwise change nothing.
    pub fn track(&mut self, event: &ConnectionEvent) {
        match event {
            ConnectionEvent::ChannelOpened(remote) => match self.session.as_mut() {
                Some(session) => {
                    if session.open(remote.clone()) {
                        tracing::info!("🟢 Channel open to {}", remote);
                    } else {
                        tracing::warn!("Second channel from {} ignored", remote);
                    }
                }
                None => tracing::warn!("Channel from {} before choosing a role", remote),
            },
            ConnectionEvent::ChannelClosed(remote) => {
                if let Some(session) = self.session.as_mut() {
                    if session.close(remote) {
                        tracing::info!("🔴 Channel to {} closed", remote);
                    }
                }
            }
            ConnectionEvent::Error(message) => {
                tracing::error!("Transport error: {}", message);
            }
            ConnectionEvent::MessageReceived { .. } => {}
        }
    }

    pub fn send(&mut self, envelope: &Envelope) -> Result<()> {
        if !self.is_connected() {
            return Err(P2PError::NotConnected);
        }
        let data = envelope.to_bytes()?;
        self.connection.send(data)
    }

    /// Close the channel and forget the peer session
    pub fn leave(&mut self) {
        self.connection.close();
        if let Some(session) = self.session.take() {
            tracing::info!("👋 Left match as {}", session.role());
        }
    }

    pub fn peer_session(&self) -> Option<&PeerSession> {
        self.session.as_ref()
    }

    pub fn role(&self) -> Option<Role> {
        self.session.as_ref().map(PeerSession::role)
    }

    pub fn is_connected(&self) -> bool {
        self.session.as_ref().is_some_and(PeerSession::connected)
    }

    pub fn local_peer_id(&self) -> Option<PeerId> {
        self.connection.local_peer_id()
    }

    /// Is this message from the peer our channel is open to?
    pub fn is_remote(&self, peer: &PeerId) -> bool {
        self.session
            .as_ref()
            .and_then(PeerSession::remote)
            .is_some_and(|remote| remote == peer)
    }

    fn require_local_id(&self) -> Result<PeerId> {
        self.connection.local_peer_id().ok_or_else(|| {
            P2PError::ConnectionFailed("transport has not assigned a peer id".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory::MemoryHub;

    #[test]
    fn test_host_and_guest_connect() {
        let hub = MemoryHub::new();
        let mut host = ConnectionManager::new(hub.endpoint());
        let mut guest = ConnectionManager::new(hub.endpoint());

        let host_id = host.become_host().unwrap();
        guest.connect_to_peer(&host_id).unwrap();

        assert!(!guest.is_connected());
        host.poll();
        guest.poll();

        assert!(host.is_connected());
        assert!(guest.is_connected());
        assert_eq!(host.role(), Some(Role::Host));
        assert_eq!(guest.role(), Some(Role::Guest));
        assert_eq!(guest.peer_session().unwrap().target(), Some(&host_id));
    }

    #[test]
    fn test_send_requires_open_channel() {
        let hub = MemoryHub::new();
        let mut host = ConnectionManager::new(hub.endpoint());
        host.become_host().unwrap();

        let err = host.send(&Envelope::heartbeat()).unwrap_err();
        assert!(matches!(err, P2PError::NotConnected));
    }

    #[test]
    fn test_dial_failure_leaves_no_session() {
        let hub = MemoryHub::new();
        let mut guest = ConnectionManager::new(hub.endpoint());

        assert!(guest.connect_to_peer(&PeerId::new("missing")).is_err());
        assert!(guest.peer_session().is_none());
    }

    /// Transport that is open from the start and then only reports errors
    struct FlakyConnection;

    impl NetworkConnection for FlakyConnection {
        fn local_peer_id(&self) -> Option<PeerId> {
            Some(PeerId::new("flaky"))
        }

        fn dial(&mut self, _target: &PeerId) -> Result<()> {
            Ok(())
        }

        fn send(&mut self, _data: Vec<u8>) -> Result<()> {
            Ok(())
        }

        fn poll_events(&mut self) -> Vec<ConnectionEvent> {
            vec![ConnectionEvent::Error("ice failure".to_string())]
        }

        fn close(&mut self) {}
    }

    #[test]
    fn test_transport_error_keeps_state() {
        let mut manager = ConnectionManager::new(FlakyConnection);
        manager.become_host().unwrap();
        manager
            .session
            .as_mut()
            .unwrap()
            .open(PeerId::new("guest"));

        let before = manager.peer_session().cloned();
        let events = manager.poll();

        assert_eq!(events, vec![ConnectionEvent::Error("ice failure".to_string())]);
        assert_eq!(manager.peer_session().cloned(), before);
        assert!(manager.is_connected());
    }

    #[test]
    fn test_leave_notifies_remote() {
        let hub = MemoryHub::new();
        let mut host = ConnectionManager::new(hub.endpoint());
        let mut guest = ConnectionManager::new(hub.endpoint());
        let host_id = host.become_host().unwrap();
        guest.connect_to_peer(&host_id).unwrap();
        host.poll();
        guest.poll();

        guest.leave();
        assert!(guest.peer_session().is_none());

        let events = host.poll();
        assert!(matches!(events[0], ConnectionEvent::ChannelClosed(_)));
        assert!(!host.is_connected());
    }
}
