use instant::{Duration, Instant};
use quizduel_core::{GameSession, ProgressionNotice, ProgressionStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Scheduled {
    question_index: usize,
    due: Instant,
}

/// Host-side timing of "both answered, move on".
///
/// Fires at most once per question: `check` schedules a decision when both
/// answers are in, `take_due` hands it back once the delay has passed. The
/// decision itself is made by the caller against the session as it is then.
#[derive(Debug, Default)]
pub struct ProgressionController {
    scheduled: Option<Scheduled>,
}

impl ProgressionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a decision if both players have answered and none is pending.
    /// Returns the notice to broadcast right away.
    pub fn check(
        &mut self,
        session: &GameSession,
        now: Instant,
        delay: Duration,
    ) -> Option<ProgressionNotice> {
        if self.scheduled.is_some() || !session.both_answered() {
            return None;
        }

        let question_index = session.question_index();
        self.scheduled = Some(Scheduled {
            question_index,
            due: now + delay,
        });

        tracing::info!(
            "⏳ Both answered question {}, deciding in {}ms",
            question_index + 1,
            delay.as_millis()
        );

        Some(ProgressionNotice {
            status: ProgressionStatus::BothAnswered,
            next_in_ms: delay.as_millis() as u64,
            scores: session.scores(),
            question_index,
        })
    }

    /// Question index whose decision is due at `now`
    pub fn take_due(&mut self, now: Instant) -> Option<usize> {
        let scheduled = self.scheduled?;
        if now < scheduled.due {
            return None;
        }
        self.scheduled = None;
        Some(scheduled.question_index)
    }


    pub fn is_scheduled(&self) -> bool {
        self.scheduled.is_some()
    }

    pub fn reset(&mut self) {
        self.scheduled = None;
    }
}
