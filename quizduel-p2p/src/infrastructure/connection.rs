use crate::application::ConnectionEvent;
use crate::domain::{IceServer, MatchboxPeerId, PeerId, SessionId};
use crate::infrastructure::error::{P2PError, Result};
use crate::infrastructure::transport::NetworkConnection;
use matchbox_socket::{PeerState, RtcIceServerConfig, WebRtcSocket, WebRtcSocketBuilder};

/// WebRTC data channel brokered by a matchbox signalling server.
///
/// Both players join the same signalling room. The host names the room and
/// shares the room id as its peer id; the guest joins the room it was given
/// and `dial` only confirms the target matches it.
pub struct MatchboxConnection {
    socket: Option<WebRtcSocket>,
    room: SessionId,
    local_id: PeerId,
    remote: Option<MatchboxPeerId>,
}

impl MatchboxConnection {
    /// Join `room` on the signalling server at `signalling_url`
    pub async fn open(
        signalling_url: &str,
        room: SessionId,
        ice_servers: &[IceServer],
        advertise_room: bool,
    ) -> Result<Self> {
        let room_url = format!("{}/{}", signalling_url.trim_end_matches('/'), room);
        tracing::info!("Connecting to signalling room: {}", room_url);

        for (i, server) in ice_servers.iter().enumerate() {
            let auth = if server.is_turn() { " (with auth)" } else { "" };
            tracing::info!("  ICE Server {}: {}{}", i + 1, server.urls.join(", "), auth);
        }

        let (mut socket, loop_fut) = WebRtcSocketBuilder::new(room_url)
            .ice_server(build_ice_server_config(ice_servers))
            .add_channel(matchbox_socket::ChannelConfig::reliable())
            .build();

        let matchbox_span = tracing::info_span!("matchbox::webrtc_loop");

        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(async move {
            let _enter = matchbox_span.enter();
            let _ = loop_fut.await;
            tracing::debug!("Matchbox loop ended");
        });

        #[cfg(not(target_arch = "wasm32"))]
        {
            #[cfg(feature = "native")]
            tokio::spawn(async move {
                let _enter = matchbox_span.enter();
                let _ = loop_fut.await;
                tracing::debug!("Matchbox loop ended");
            });

            #[cfg(not(feature = "native"))]
            compile_error!("Non-WASM builds require the 'native' feature to be enabled");
        }

        let socket_id = wait_for_socket_id(&mut socket).await?;
        let local_id = if advertise_room {
            room.to_peer_id()
        } else {
            PeerId::from(socket_id)
        };

        tracing::info!("Signalling ready, local peer id {}", local_id);

        Ok(Self {
            socket: Some(socket),
            room,
            local_id,
            remote: None,
        })
    }

    pub fn room(&self) -> SessionId {
        self.room
    }
}

impl NetworkConnection for MatchboxConnection {
    fn local_peer_id(&self) -> Option<PeerId> {
        self.socket.as_ref().map(|_| self.local_id.clone())
    }

    fn dial(&mut self, target: &PeerId) -> Result<()> {
        let room = SessionId::try_from(target)?;
        if room != self.room {
            return Err(P2PError::ConnectionFailed(format!(
                "joined room {} but asked to dial {}",
                self.room, target
            )));
        }
        if self.socket.is_none() {
            return Err(P2PError::ChannelClosed);
        }
        // The data channel opens once the host shows up in the room
        Ok(())
    }

    fn send(&mut self, data: Vec<u8>) -> Result<()> {
        let remote = self.remote.ok_or(P2PError::NotConnected)?;
        let socket = self.socket.as_mut().ok_or(P2PError::ChannelClosed)?;

        let len = data.len();
        socket
            .channel_mut(0)
            .send(data.into_boxed_slice(), remote);

        tracing::trace!("Sent {} bytes to peer {}", len, remote);
        Ok(())
    }

    fn poll_events(&mut self) -> Vec<ConnectionEvent> {
        let mut events = Vec::new();
        let Some(socket) = self.socket.as_mut() else {
            return events;
        };

        for (peer_id, state) in socket.update_peers() {
            match state {
                PeerState::Connected => {
                    if self.remote.is_none() {
                        self.remote = Some(peer_id);
                        events.push(ConnectionEvent::ChannelOpened(PeerId::from(peer_id)));
                    } else {
                        tracing::warn!("Ignoring extra peer {} in room {}", peer_id, self.room);
                    }
                }
                PeerState::Disconnected => {
                    if self.remote == Some(peer_id) {
                        self.remote = None;
                        events.push(ConnectionEvent::ChannelClosed(PeerId::from(peer_id)));
                    }
                }
            }
        }

        for (peer_id, packet) in socket.channel_mut(0).receive() {
            if self.remote != Some(peer_id) {
                continue;
            }
            events.push(ConnectionEvent::MessageReceived {
                from: PeerId::from(peer_id),
                data: packet.to_vec(),
            });
        }

        events
    }

    fn close(&mut self) {
        if self.socket.take().is_some() {
            tracing::info!("Left signalling room {}", self.room);
        }
        self.remote = None;
    }
}

/// Matchbox takes a single ICE server entry; use the first configured one
fn build_ice_server_config(ice_servers: &[IceServer]) -> RtcIceServerConfig {
    match ice_servers.first() {
        Some(server) => RtcIceServerConfig {
            urls: server.urls.clone(),
            username: server.username.clone(),
            credential: server.credential.clone(),
        },
        None => RtcIceServerConfig::default(),
    }
}

async fn wait_for_socket_id(socket: &mut WebRtcSocket) -> Result<MatchboxPeerId> {
    use instant::{Duration, Instant};

    let start = Instant::now();
    let timeout = Duration::from_secs(5);

    loop {
        socket.update_peers();

        if let Some(id) = socket.id() {
            return Ok(id);
        }

        if start.elapsed() > timeout {
            return Err(P2PError::ConnectionFailed(
                "timeout waiting for signalling server".to_string(),
            ));
        }

        platform_sleep(10).await;
    }
}

#[cfg(target_arch = "wasm32")]
async fn platform_sleep(millis: u32) {
    gloo_timers::future::TimeoutFuture::new(millis).await;
}

#[cfg(not(target_arch = "wasm32"))]
async fn platform_sleep(millis: u32) {
    #[cfg(feature = "native")]
    tokio::time::sleep(instant::Duration::from_millis(millis as u64)).await;

    #[cfg(not(feature = "native"))]
    compile_error!("Non-WASM builds require the 'native' feature to be enabled");
}
