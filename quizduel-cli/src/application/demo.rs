use crate::application::console::render;
use crate::infrastructure::error::{CliError, Result};
use instant::Duration;
use quizduel_core::{GameState, MatchSummary, Quiz, Role, Scores};
use quizduel_p2p::{GameLoop, MemoryConnection, SessionEvent, SyncConfig, TransportRegistry};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Settings for a scripted host-vs-guest match over the in-memory hub
#[derive(Debug, Clone)]
pub struct DemoOptions {
    pub config: SyncConfig,
    /// Lose every n-th frame on the hub (n >= 2)
    pub drop_every: Option<usize>,
    pub tick: Duration,
    pub timeout: Duration,
    /// Log every session event as it happens
    pub verbose: bool,
}

impl Default for DemoOptions {
    fn default() -> Self {
        Self {
            config: SyncConfig::default(),
            drop_every: None,
            tick: Duration::from_millis(50),
            timeout: Duration::from_secs(300),
            verbose: true,
        }
    }
}

impl DemoOptions {
    /// Sub-second timers so a match finishes quickly
    pub fn fast() -> Self {
        Self {
            config: SyncConfig::default()
                .with_heartbeat_interval(Duration::from_millis(100))
                .with_retry_policy(Duration::from_millis(50), Duration::from_millis(150), 3)
                .with_progression_delay(Duration::from_millis(200)),
            tick: Duration::from_millis(10),
            timeout: Duration::from_secs(30),
            ..Default::default()
        }
    }

    pub fn with_drop_every(mut self, n: usize) -> Self {
        self.drop_every = Some(n);
        self
    }

    pub fn quiet(mut self) -> Self {
        self.verbose = false;
        self
    }
}

/// Outcome of a demo match
#[derive(Debug, Clone)]
pub struct MatchReport {
    pub host_scores: Scores,
    pub guest_scores: Scores,
    pub summary: MatchSummary,
    pub delivery_failures: usize,
    pub stale_discarded: usize,
    pub dropped_frames: usize,
}

/// Play `quiz` between two scripted peers on the registry's hub.
///
/// The host bot always answers correctly; the guest bot gets every second
/// question right.
pub async fn run_demo(
    registry: &TransportRegistry,
    quiz: Quiz,
    options: DemoOptions,
) -> Result<MatchReport> {
    let hub = registry.hub()?;

    let dropped = Arc::new(AtomicUsize::new(0));
    if let Some(n) = options.drop_every {
        if n < 2 {
            return Err(CliError::InvalidConfig(
                "drop-every must be at least 2".to_string(),
            ));
        }
        let counter = dropped.clone();
        let mut seen = 0usize;
        hub.set_drop_filter(move |_, _| {
            seen += 1;
            let lose = seen % n == 0;
            if lose {
                counter.fetch_add(1, Ordering::Relaxed);
            }
            lose
        });
        tracing::info!("🕳️ Dropping every {}th frame", n);
    }

    let mut host = GameLoop::new(hub.endpoint(), options.config.clone());
    let mut guest = GameLoop::new(hub.endpoint(), options.config.clone());
    let host_id = host.become_host()?;
    guest.connect_to_peer(&host_id)?;

    let mut quiz = Some(quiz);
    let mut delivery_failures = 0;
    let mut stale_discarded = 0;

    let mut interval = tokio::time::interval(options.tick);
    let deadline = tokio::time::Instant::now() + options.timeout;

    let outcome = loop {
        interval.tick().await;

        for game in [&mut host, &mut guest] {
            game.poll();
            for event in game.drain_events() {
                match event {
                    SessionEvent::DeliveryFailed { .. } => delivery_failures += 1,
                    SessionEvent::StaleDiscarded { .. } => stale_discarded += 1,
                    _ => {}
                }
                if options.verbose {
                    render(&event, game.session());
                }
            }
        }

        if host.is_connected() && host.session().state() == GameState::Ready {
            if let Some(quiz) = quiz.take() {
                host.start_game(quiz)?;
            }
        }

        play(&mut host, Role::Host)?;
        play(&mut guest, Role::Guest)?;

        let states = (host.session().state(), guest.session().state());
        if states == (GameState::Finished, GameState::Finished) {
            break Ok(());
        }
        if states.0 == GameState::Disconnected || states.1 == GameState::Disconnected {
            break Err(CliError::Disconnected);
        }
        if tokio::time::Instant::now() >= deadline {
            break Err(CliError::Timeout(options.timeout));
        }
    };

    hub.clear_drop_filter();
    let report = MatchReport {
        host_scores: host.session().scores(),
        guest_scores: guest.session().scores(),
        summary: host.session().summary(),
        delivery_failures,
        stale_discarded,
        dropped_frames: dropped.load(Ordering::Relaxed),
    };
    host.leave_game();
    guest.leave_game();

    outcome.map(|_| report)
}

fn play(game: &mut GameLoop<MemoryConnection>, role: Role) -> Result<()> {
    let session = game.session();
    if !session.is_playing() || session.answers_received().has_answered(role) {
        return Ok(());
    }
    let Some(question) = session.current_question() else {
        return Ok(());
    };

    let index = session.question_index();
    let knows_it = role.is_host() || index % 2 == 1;
    let answer = if knows_it {
        question.answer_key().unwrap_or_default().to_string()
    } else {
        "?".to_string()
    };
    let time_to_answer = if role.is_host() { 4 + index as u32 } else { 7 };

    game.submit_answer(&answer, time_to_answer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::quiz_loader::demo_quiz;

    #[tokio::test]
    async fn test_demo_match_completes() {
        let mut registry = TransportRegistry::new();
        registry.init().unwrap();

        let report = run_demo(&registry, demo_quiz(3), DemoOptions::fast().quiet())
            .await
            .unwrap();

        // Host: 126 + 125 + 124, guest only right on question 2
        assert_eq!(report.host_scores, Scores::new(375, 123));
        assert_eq!(report.guest_scores, report.host_scores);
        assert_eq!(report.summary.winner, Some(Role::Host));
        assert_eq!(report.dropped_frames, 0);

        registry.teardown();
    }

    #[tokio::test]
    async fn test_demo_survives_frame_loss() {
        let mut registry = TransportRegistry::new();
        registry.init().unwrap();

        let options = DemoOptions::fast().quiet().with_drop_every(5);
        let report = run_demo(&registry, demo_quiz(3), options).await.unwrap();

        assert!(report.dropped_frames > 0);
        assert_eq!(report.host_scores, Scores::new(375, 123));
        assert_eq!(report.guest_scores, report.host_scores);

        registry.teardown();
    }

    #[tokio::test]
    async fn test_demo_needs_registry() {
        let registry = TransportRegistry::new();
        let err = run_demo(&registry, demo_quiz(1), DemoOptions::fast())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CliError::P2P(quizduel_p2p::P2PError::NotInitialized)
        ));
    }

    #[tokio::test]
    async fn test_rejects_drop_every_one() {
        let mut registry = TransportRegistry::new();
        registry.init().unwrap();
        let err = run_demo(&registry, demo_quiz(1), DemoOptions::fast().with_drop_every(1))
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::InvalidConfig(_)));
    }
}
