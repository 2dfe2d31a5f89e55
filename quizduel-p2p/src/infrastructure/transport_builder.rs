use crate::application::SyncConfig;
use crate::domain::{IceServer, PeerId, SessionId};
use crate::infrastructure::connection::MatchboxConnection;
use crate::infrastructure::error::Result;

/// Builds matchbox connections for either side of a match
pub struct MatchboxConnectionBuilder {
    signalling_server: String,
    ice_servers: Vec<IceServer>,
}

impl MatchboxConnectionBuilder {
    pub fn new(signalling_server: impl Into<String>) -> Self {
        Self {
            signalling_server: signalling_server.into(),
            ice_servers: IceServer::default_stun_servers(),
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            signalling_server: config.signalling_server.clone(),
            ice_servers: config.ice_servers.clone(),
        }
    }

    pub fn ice_servers(mut self, ice_servers: Vec<IceServer>) -> Self {
        self.ice_servers = ice_servers;
        self
    }

    /// Open a fresh room. The returned connection's local peer id is the
    /// room id, which is what the guest needs to dial.
    pub async fn build_host(self) -> Result<MatchboxConnection> {
        let room = SessionId::new();
        tracing::info!("🎯 Opening HOST room {}", room);
        MatchboxConnection::open(&self.signalling_server, room, &self.ice_servers, true).await
    }

    /// Join the room identified by the host's peer id
    pub async fn build_guest(self, target: &PeerId) -> Result<MatchboxConnection> {
        let room = SessionId::try_from(target)?;
        tracing::info!("🎯 Joining room {} as GUEST", room);
        MatchboxConnection::open(&self.signalling_server, room, &self.ice_servers, false).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_stun() {
        let builder = MatchboxConnectionBuilder::new("wss://signal.example.com");
        assert_eq!(builder.ice_servers, IceServer::default_stun_servers());
    }

    #[test]
    fn test_from_config_takes_servers() {
        let config = SyncConfig::default()
            .with_signalling_server("ws://localhost:3536")
            .with_ice_servers(vec![IceServer::turn("turn:t.example.com", "u", "p")]);

        let builder = MatchboxConnectionBuilder::from_config(&config);
        assert_eq!(builder.signalling_server, "ws://localhost:3536");
        assert!(builder.ice_servers[0].is_turn());
    }
}
