use crate::application::ConnectionEvent;
use crate::domain::PeerId;
use crate::infrastructure::error::Result;

/// A single bidirectional data channel between two peers.
///
/// Implemented by the matchbox WebRTC adapter and by the in-process
/// memory hub used in tests and demos.
pub trait NetworkConnection {
    /// Identifier this end hands out to be dialed, if the transport has
    /// assigned one yet
    fn local_peer_id(&self) -> Option<PeerId>;

    /// Open a channel to `target`. Completion is reported later as
    /// `ConnectionEvent::ChannelOpened`.
    fn dial(&mut self, target: &PeerId) -> Result<()>;

    /// Send one frame over the open channel
    fn send(&mut self, data: Vec<u8>) -> Result<()>;

    /// Drain everything that happened since the last call
    fn poll_events(&mut self) -> Vec<ConnectionEvent>;

    /// Close the channel. The remote side sees `ChannelClosed`.
    fn close(&mut self);
}
