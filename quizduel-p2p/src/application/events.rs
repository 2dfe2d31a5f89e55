use crate::domain::{PeerId, QualityLevel};
use instant::Duration;
use quizduel_core::GameEvent;

/// Raw events from a `NetworkConnection`
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    /// The data channel to this peer is open
    ChannelOpened(PeerId),
    /// The data channel to this peer was closed
    ChannelClosed(PeerId),
    /// One frame from the remote peer
    MessageReceived { from: PeerId, data: Vec<u8> },
    /// Transport-level failure; the connection state is unchanged
    Error(String),
}

/// Everything a UI needs to observe, drained from the game loop
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Match state changed
    Game(GameEvent),

    ChannelOpened {
        remote: PeerId,
    },

    QualityChanged {
        level: QualityLevel,
        sync_buffer: Duration,
    },

    /// A sequenced message ran out of retries without an ack
    DeliveryFailed {
        sequence_id: u64,
        kind: &'static str,
    },

    /// A state-changing message arrived for a question that is no longer
    /// current and was ignored
    StaleDiscarded {
        kind: &'static str,
        question_index: usize,
        current_index: usize,
    },

    TransportError(String),
}

impl From<GameEvent> for SessionEvent {
    fn from(event: GameEvent) -> Self {
        SessionEvent::Game(event)
    }
}
