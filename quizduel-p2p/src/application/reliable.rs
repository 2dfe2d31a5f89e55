use crate::domain::elapsed_since;
use crate::infrastructure::message::{Envelope, MessageBody};
use instant::{Duration, Instant};
use std::collections::{BTreeMap, HashSet};

/// A sequenced message waiting for its ack
#[derive(Debug, Clone)]
pub struct PendingMessage {
    pub envelope: Envelope,
    pub retries: u32,
    pub sent_at: Instant,
    /// Retry budget exhausted and already reported
    pub exhausted: bool,
}

/// Result of one retry sweep
#[derive(Debug, Default)]
pub struct Sweep {
    /// Frames to send again
    pub resend: Vec<Envelope>,
    /// Sequence ids that just ran out of retries
    pub exhausted: Vec<(u64, &'static str)>,
}

/// What to do with an inbound frame
#[derive(Debug)]
pub struct Receipt {
    /// Ack to send back before handling the frame
    pub ack: Option<Envelope>,
    /// False for acks and already-seen sequence ids
    pub deliver: bool,
}

/// Sequencing, acknowledgement, retry and de-duplication over an unreliable
/// channel. Ordering between the two peers' sequences is not guaranteed.
#[derive(Debug)]
pub struct ReliableChannel {
    next_sequence: u64,
    pending: BTreeMap<u64, PendingMessage>,
    seen: HashSet<u64>,
    retry_after: Duration,
    max_retries: u32,
}

impl ReliableChannel {
    pub fn new(retry_after: Duration, max_retries: u32) -> Self {
        Self {
            next_sequence: 1,
            pending: BTreeMap::new(),
            seen: HashSet::new(),
            retry_after,
            max_retries,
        }
    }

    /// Wrap `body` for sending. State-changing bodies get the next sequence
    /// id and are held until acked.
    pub fn prepare(&mut self, body: MessageBody, now: Instant) -> Envelope {
        if !body.is_sequenced() {
            return Envelope::new(body);
        }

        let sequence_id = self.next_sequence;
        self.next_sequence += 1;

        let envelope = Envelope::new(body).with_sequence(sequence_id);
        self.pending.insert(
            sequence_id,
            PendingMessage {
                envelope: envelope.clone(),
                retries: 0,
                sent_at: now,
                exhausted: false,
            },
        );

        tracing::trace!("📤 Queued {} as #{}", envelope.body.kind(), sequence_id);
        envelope
    }

    /// Resend whatever has waited longer than `retry_after`, up to
    /// `max_retries` times. Exhausted entries stay pending.
    pub fn sweep(&mut self, now: Instant) -> Sweep {
        let mut sweep = Sweep::default();

        for (sequence_id, entry) in self.pending.iter_mut() {
            if elapsed_since(entry.sent_at, now) < self.retry_after {
                continue;
            }

            if entry.retries < self.max_retries {
                entry.retries += 1;
                entry.sent_at = now;
                tracing::debug!(
                    "🔁 Resending {} #{} (retry {}/{})",
                    entry.envelope.body.kind(),
                    sequence_id,
                    entry.retries,
                    self.max_retries
                );
                sweep.resend.push(entry.envelope.clone());
            } else if !entry.exhausted {
                entry.exhausted = true;
                tracing::warn!(
                    "❌ {} #{} not acknowledged after {} retries, giving up",
                    entry.envelope.body.kind(),
                    sequence_id,
                    self.max_retries
                );
                sweep.exhausted.push((*sequence_id, entry.envelope.body.kind()));
            }
        }

        sweep
    }

    /// Process an inbound frame: acks clear pending entries, sequenced
    /// frames are acked every time but delivered only once.
    pub fn receive(&mut self, envelope: &Envelope) -> Receipt {
        if let MessageBody::Ack { sequence_id } = envelope.body {
            self.acknowledge(sequence_id);
            return Receipt {
                ack: None,
                deliver: false,
            };
        }

        match envelope.sequence_id {
            Some(sequence_id) => {
                let fresh = self.seen.insert(sequence_id);
                if !fresh {
                    tracing::debug!(
                        "Duplicate {} #{} ignored",
                        envelope.body.kind(),
                        sequence_id
                    );
                }
                Receipt {
                    ack: Some(Envelope::ack(sequence_id)),
                    deliver: fresh,
                }
            }
            None => Receipt {
                ack: None,
                deliver: true,
            },
        }
    }

    /// Returns false for unknown or already-acked ids
    pub fn acknowledge(&mut self, sequence_id: u64) -> bool {
        match self.pending.remove(&sequence_id) {
            Some(entry) => {
                tracing::trace!("✅ {} #{} acked", entry.envelope.body.kind(), sequence_id);
                true
            }
            None => false,
        }
    }

    pub fn pending(&self, sequence_id: u64) -> Option<&PendingMessage> {
        self.pending.get(&sequence_id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Pending entries that still have retries left
    pub fn in_flight(&self) -> usize {
        self.pending.values().filter(|entry| !entry.exhausted).count()
    }

    /// Forget everything, including the sequence counter
    pub fn reset(&mut self) {
        self.next_sequence = 1;
        self.pending.clear();
        self.seen.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizduel_core::Scores;

    fn channel() -> ReliableChannel {
        ReliableChannel::new(Duration::from_secs(5), 3)
    }

    fn game_end() -> MessageBody {
        MessageBody::GameEnd {
            final_scores: Scores::new(1, 2),
        }
    }

    #[test]
    fn test_sequence_ids_increase() {
        let mut channel = channel();
        let now = Instant::now();

        let a = channel.prepare(game_end(), now);
        let b = channel.prepare(game_end(), now);

        assert_eq!(a.sequence_id, Some(1));
        assert_eq!(b.sequence_id, Some(2));
        assert_eq!(channel.pending_count(), 2);
    }

    #[test]
    fn test_heartbeat_not_tracked() {
        let mut channel = channel();
        let envelope = channel.prepare(
            MessageBody::Heartbeat { timestamp: 0 },
            Instant::now(),
        );

        assert!(envelope.sequence_id.is_none());
        assert_eq!(channel.pending_count(), 0);
    }

    #[test]
    fn test_ack_removes_exactly_once() {
        let mut channel = channel();
        let id = channel
            .prepare(game_end(), Instant::now())
            .sequence_id
            .unwrap();

        let receipt = channel.receive(&Envelope::ack(id));
        assert!(!receipt.deliver);
        assert_eq!(channel.pending_count(), 0);

        assert!(!channel.acknowledge(id));
    }

    #[test]
    fn test_retry_schedule_and_cap() {
        let mut channel = channel();
        let t0 = Instant::now();
        let id = channel.prepare(game_end(), t0).sequence_id.unwrap();

        assert!(channel.sweep(t0 + Duration::from_secs(4)).resend.is_empty());

        let mut resent = 0;
        let mut exhausted = Vec::new();
        for step in 1..=30 {
            let sweep = channel.sweep(t0 + Duration::from_secs(2 * step));
            resent += sweep.resend.len();
            exhausted.extend(sweep.exhausted);
        }

        assert_eq!(resent, 3);
        assert_eq!(exhausted, vec![(id, "game-end")]);

        let entry = channel.pending(id).unwrap();
        assert_eq!(entry.retries, 3);
        assert!(entry.exhausted);
    }

    #[test]
    fn test_exhausted_entries_leave_flight() {
        let mut channel = channel();
        let t0 = Instant::now();
        channel.prepare(game_end(), t0);
        let acked = channel.prepare(game_end(), t0);
        assert_eq!(channel.in_flight(), 2);

        channel.acknowledge(acked.sequence_id.unwrap());
        for secs in [5, 10, 15, 20] {
            channel.sweep(t0 + Duration::from_secs(secs));
        }

        assert_eq!(channel.pending_count(), 1);
        assert_eq!(channel.in_flight(), 0);
    }

    #[test]
    fn test_resend_keeps_sequence_id() {
        let mut channel = channel();
        let t0 = Instant::now();
        let original = channel.prepare(game_end(), t0);

        let sweep = channel.sweep(t0 + Duration::from_secs(6));
        assert_eq!(sweep.resend, vec![original]);
    }

    #[test]
    fn test_duplicates_acked_but_not_delivered() {
        let mut channel = channel();
        let frame = Envelope::new(game_end()).with_sequence(9);

        let first = channel.receive(&frame);
        let second = channel.receive(&frame);

        assert!(first.deliver);
        assert!(!second.deliver);
        assert!(matches!(
            first.ack.map(|a| a.body),
            Some(MessageBody::Ack { sequence_id: 9 })
        ));
        assert!(matches!(
            second.ack.map(|a| a.body),
            Some(MessageBody::Ack { sequence_id: 9 })
        ));
    }

    #[test]
    fn test_unsequenced_frames_delivered_without_ack() {
        let mut channel = channel();
        let receipt = channel.receive(&Envelope::heartbeat());
        assert!(receipt.deliver);
        assert!(receipt.ack.is_none());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut channel = channel();
        channel.prepare(game_end(), Instant::now());
        channel.receive(&Envelope::new(game_end()).with_sequence(1));

        channel.reset();

        assert_eq!(channel.pending_count(), 0);
        assert!(channel.receive(&Envelope::new(game_end()).with_sequence(1)).deliver);
        assert_eq!(
            channel.prepare(game_end(), Instant::now()).sequence_id,
            Some(1)
        );
    }
}
