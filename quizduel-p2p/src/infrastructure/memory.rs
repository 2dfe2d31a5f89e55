use crate::application::ConnectionEvent;
use crate::domain::PeerId;
use crate::infrastructure::error::{P2PError, Result};
use crate::infrastructure::transport::NetworkConnection;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Decides whether a frame is lost in transit: `(sender, frame) -> drop?`
pub type DropFilter = Box<dyn FnMut(&PeerId, &[u8]) -> bool + Send>;

#[derive(Default)]
struct Endpoint {
    inbox: VecDeque<ConnectionEvent>,
    link: Option<PeerId>,
}

#[derive(Default)]
struct HubState {
    endpoints: HashMap<PeerId, Endpoint>,
    drop_filter: Option<DropFilter>,
}

impl HubState {
    fn push(&mut self, to: &PeerId, event: ConnectionEvent) {
        if let Some(endpoint) = self.endpoints.get_mut(to) {
            endpoint.inbox.push_back(event);
        }
    }

    fn unlink(&mut self, id: &PeerId) -> Option<PeerId> {
        let remote = self.endpoints.get_mut(id)?.link.take()?;
        if let Some(endpoint) = self.endpoints.get_mut(&remote) {
            endpoint.link = None;
        }
        Some(remote)
    }
}

/// In-process switchboard: every endpoint can dial any other endpoint on the
/// same hub. Frames are delivered in order into the receiver's inbox and
/// picked up on its next `poll_events`.
#[derive(Clone, Default)]
pub struct MemoryHub {
    state: Arc<Mutex<HubState>>,
}

impl MemoryHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new endpoint with a fresh identifier
    pub fn endpoint(&self) -> MemoryConnection {
        let id = PeerId::new(Uuid::new_v4().to_string());
        self.lock().endpoints.insert(id.clone(), Endpoint::default());
        tracing::debug!("🔌 Memory endpoint {} registered", id);

        MemoryConnection {
            id,
            hub: self.clone(),
        }
    }

    /// Install a loss model. Returning `true` drops the frame.
    pub fn set_drop_filter<F>(&self, filter: F)
    where
        F: FnMut(&PeerId, &[u8]) -> bool + Send + 'static,
    {
        self.lock().drop_filter = Some(Box::new(filter));
    }

    pub fn clear_drop_filter(&self) {
        self.lock().drop_filter = None;
    }

    pub fn endpoint_count(&self) -> usize {
        self.lock().endpoints.len()
    }

    /// Close every open channel; both ends see `ChannelClosed`
    pub fn close_all(&self) {
        let mut state = self.lock();
        let ids: Vec<PeerId> = state.endpoints.keys().cloned().collect();

        for id in ids {
            if let Some(remote) = state.unlink(&id) {
                state.push(&id, ConnectionEvent::ChannelClosed(remote.clone()));
                state.push(&remote, ConnectionEvent::ChannelClosed(id));
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One end of a memory channel
pub struct MemoryConnection {
    id: PeerId,
    hub: MemoryHub,
}

impl MemoryConnection {
    pub fn id(&self) -> &PeerId {
        &self.id
    }
}

impl NetworkConnection for MemoryConnection {
    fn local_peer_id(&self) -> Option<PeerId> {
        Some(self.id.clone())
    }

    fn dial(&mut self, target: &PeerId) -> Result<()> {
        let mut state = self.hub.lock();

        if target == &self.id {
            return Err(P2PError::ConnectionFailed("cannot dial self".to_string()));
        }

        let target_free = match state.endpoints.get(target) {
            Some(endpoint) => endpoint.link.is_none(),
            None => {
                return Err(P2PError::ConnectionFailed(format!(
                    "peer {} not found",
                    target
                )))
            }
        };
        if !target_free {
            return Err(P2PError::ConnectionFailed(format!(
                "peer {} is already in a match",
                target
            )));
        }

        let own = state
            .endpoints
            .get_mut(&self.id)
            .ok_or(P2PError::ChannelClosed)?;
        if own.link.is_some() {
            return Err(P2PError::ConnectionFailed(
                "channel already open".to_string(),
            ));
        }
        own.link = Some(target.clone());
        own.inbox
            .push_back(ConnectionEvent::ChannelOpened(target.clone()));

        if let Some(remote) = state.endpoints.get_mut(target) {
            remote.link = Some(self.id.clone());
            remote
                .inbox
                .push_back(ConnectionEvent::ChannelOpened(self.id.clone()));
        }

        tracing::debug!("🔗 {} dialed {}", self.id, target);
        Ok(())
    }

    fn send(&mut self, data: Vec<u8>) -> Result<()> {
        let mut state = self.hub.lock();
        let state = &mut *state;

        let remote = state
            .endpoints
            .get(&self.id)
            .and_then(|endpoint| endpoint.link.clone())
            .ok_or(P2PError::NotConnected)?;

        if let Some(filter) = state.drop_filter.as_mut() {
            if filter(&self.id, &data) {
                tracing::trace!("🕳️ Dropped {} bytes from {}", data.len(), self.id);
                return Ok(());
            }
        }

        state.push(
            &remote,
            ConnectionEvent::MessageReceived {
                from: self.id.clone(),
                data,
            },
        );
        Ok(())
    }

    fn poll_events(&mut self) -> Vec<ConnectionEvent> {
        self.hub
            .lock()
            .endpoints
            .get_mut(&self.id)
            .map(|endpoint| endpoint.inbox.drain(..).collect())
            .unwrap_or_default()
    }

    fn close(&mut self) {
        let mut state = self.hub.lock();
        if let Some(remote) = state.unlink(&self.id) {
            tracing::debug!("🔌 {} closed channel to {}", self.id, remote);
            state.push(&remote, ConnectionEvent::ChannelClosed(self.id.clone()));
        }
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        self.close();
        self.hub.lock().endpoints.remove(&self.id);
    }
}

/// Owner of the process's in-memory hub.
///
/// Created once with `init`, torn down explicitly with `teardown`; nothing
/// is reachable without holding the registry.
#[derive(Default)]
pub struct TransportRegistry {
    hub: Option<MemoryHub>,
}

impl TransportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn init(&mut self) -> Result<MemoryHub> {
        if self.hub.is_some() {
            return Err(P2PError::AlreadyInitialized);
        }
        let hub = MemoryHub::new();
        self.hub = Some(hub.clone());
        tracing::info!("🧩 Transport registry initialized");
        Ok(hub)
    }

    pub fn hub(&self) -> Result<MemoryHub> {
        self.hub.clone().ok_or(P2PError::NotInitialized)
    }

    pub fn is_initialized(&self) -> bool {
        self.hub.is_some()
    }

    /// Close every channel and release the hub; `init` may be called again
    pub fn teardown(&mut self) {
        if let Some(hub) = self.hub.take() {
            hub.close_all();
            tracing::info!("🧩 Transport registry torn down");
        }
    }
}
