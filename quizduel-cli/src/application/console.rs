use crate::infrastructure::error::{CliError, Result};
use instant::{Duration, Instant};
use quizduel_core::{GameEvent, GameSession, GameState, MatchSummary, QuestionOptions, Quiz, Role};
use quizduel_p2p::{GameLoop, NetworkConnection, SessionEvent};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Drive one match from the terminal: answers are read line by line from
/// stdin, everything else is logged. The host starts `quiz` as soon as the
/// guest has joined.
pub async fn run_interactive<C: NetworkConnection>(
    mut game: GameLoop<C>,
    mut quiz: Option<Quiz>,
) -> Result<MatchSummary> {
    let mut interval = tokio::time::interval(POLL_INTERVAL);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                game.poll();
                for event in game.drain_events() {
                    render(&event, game.session());
                }

                if game.role() == Some(Role::Host)
                    && game.is_connected()
                    && game.session().state() == GameState::Ready
                {
                    if let Some(quiz) = quiz.take() {
                        game.start_game(quiz)?;
                    }
                }

                // Stay on the line after the last question until the final
                // game-end has been acked or its retries are spent
                match game.session().state() {
                    GameState::Finished if game.is_delivery_settled() || !game.is_connected() => {
                        let summary = game.session().summary();
                        game.leave_game();
                        return Ok(summary);
                    }
                    GameState::Disconnected => {
                        game.leave_game();
                        return Err(CliError::Disconnected);
                    }
                    _ => {}
                }
            }
            line = lines.next_line(), if stdin_open => {
                match line? {
                    Some(line) => submit_line(&mut game, line.trim()),
                    None => {
                        debug!("stdin closed, answers will time out");
                        stdin_open = false;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down...");
                game.leave_game();
                return Err(CliError::Disconnected);
            }
        }
    }
}

fn submit_line<C: NetworkConnection>(game: &mut GameLoop<C>, answer: &str) {
    if answer.is_empty() {
        return;
    }
    let Some(left) = game.time_left(Instant::now()) else {
        info!("No question to answer right now");
        return;
    };

    let taken = game.config().answer_window.saturating_sub(left);
    if let Err(e) = game.submit_answer(answer, taken.as_secs() as u32) {
        warn!("Answer not accepted: {}", e);
    }
}

/// Log a session event for a human at the terminal
pub fn render(event: &SessionEvent, session: &GameSession) {
    match event {
        SessionEvent::Game(game) => render_game(game, session),
        SessionEvent::ChannelOpened { remote } => info!("🟢 Connected to {}", remote),
        SessionEvent::QualityChanged { level, sync_buffer } => {
            info!("📶 Link quality {} (progression +{:?})", level, sync_buffer)
        }
        SessionEvent::DeliveryFailed { sequence_id, kind } => {
            warn!("❌ {} #{} never acknowledged, peer may be out of sync", kind, sequence_id)
        }
        SessionEvent::StaleDiscarded {
            kind,
            question_index,
            current_index,
        } => debug!(
            "Late {} for question {} ignored (now on {})",
            kind,
            question_index + 1,
            current_index + 1
        ),
        SessionEvent::TransportError(message) => error!("Transport error: {}", message),
    }
}

fn render_game(event: &GameEvent, session: &GameSession) {
    match event {
        GameEvent::PlayerJoined => info!("👋 Opponent joined"),
        GameEvent::GameStarted {
            quiz_name,
            total_questions,
        } => {
            info!("🎮 '{}' started ({} questions)", quiz_name, total_questions);
            show_question(session);
        }
        GameEvent::AnswerRecorded {
            role,
            is_correct,
            points,
            new_score,
            ..
        } => info!(
            "{} {} answered: +{} (score {})",
            if *is_correct { "✅" } else { "✖️" },
            role,
            points,
            new_score
        ),
        GameEvent::ProgressionPending {
            next_in_ms, scores, ..
        } => info!(
            "⏳ Both answered. Host {} / guest {}, next in {:.1}s",
            scores.host,
            scores.guest,
            *next_in_ms as f64 / 1000.0
        ),
        GameEvent::QuestionChanged { scores, .. } => {
            info!("Score: host {} / guest {}", scores.host, scores.guest);
            show_question(session);
        }
        GameEvent::GameEnded { summary, .. } => log_summary(summary),
        GameEvent::Disconnected => warn!("🔴 Opponent left, match over"),
    }
}

fn show_question(session: &GameSession) {
    let Some(question) = session.current_question() else {
        return;
    };
    info!(
        "❓ [{}/{}] {}",
        session.question_index() + 1,
        session.total_questions(),
        question.question
    );
    match &question.options {
        Some(QuestionOptions::Keyed(options)) => {
            for (key, text) in options {
                info!("   {}) {}", key, text);
            }
        }
        Some(QuestionOptions::Listed(options)) => {
            for text in options {
                info!("   - {}", text);
            }
        }
        None => {}
    }
}

pub fn log_summary(summary: &MatchSummary) {
    info!("🏁 Final standings");
    for standing in &summary.standings {
        info!(
            "   {}. {} {:>4} pts  {}/{} correct ({}%)  avg {:.1}s",
            standing.position,
            standing.role,
            standing.score,
            standing.correct_answers,
            standing.total_answers,
            standing.accuracy,
            standing.average_time
        );
    }
    match summary.winner {
        Some(role) => info!("🏆 Winner: {}", role),
        None => info!("🤝 Draw"),
    }
}
