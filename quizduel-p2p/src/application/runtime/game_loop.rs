use crate::application::config::SyncConfig;
use crate::application::connection_manager::ConnectionManager;
use crate::application::heartbeat::HeartbeatMonitor;
use crate::application::progression::ProgressionController;
use crate::application::reliable::{PendingMessage, ReliableChannel};
use crate::application::runtime::timer::IntervalTimer;
use crate::application::{ConnectionEvent, SessionEvent};
use crate::domain::{elapsed_since, ChannelStatus, ConnectionQuality, PeerId, PeerSession};
use crate::infrastructure::error::Result;
use crate::infrastructure::message::{Envelope, MessageBody};
use crate::infrastructure::transport::NetworkConnection;
use instant::{Duration, Instant};
use quizduel_core::{
    AnswerSubmission, GameError, GameEvent, GameSession, Progression, ProgressionNotice, Quiz,
    Role,
};

/// Single-threaded driver for one peer of a match.
///
/// All state lives here and is only touched from `poll_at` and the public
/// operations, so nothing needs locking. Operations called between polls are
/// timed against the clock reading of the latest poll.
pub struct GameLoop<C: NetworkConnection> {
    connection: ConnectionManager<C>,
    session: GameSession,
    config: SyncConfig,

    reliable: ReliableChannel,
    heartbeat: HeartbeatMonitor,
    progression: ProgressionController,

    heartbeat_timer: IntervalTimer,
    retry_timer: IntervalTimer,

    /// When the current question became current on this peer
    question_started: Option<Instant>,
    now: Instant,

    events: Vec<SessionEvent>,
}

impl<C: NetworkConnection> GameLoop<C> {
    pub fn new(connection: C, config: SyncConfig) -> Self {
        Self {
            connection: ConnectionManager::new(connection),
            session: GameSession::new(),
            reliable: ReliableChannel::new(config.retry_after, config.max_retries),
            heartbeat: HeartbeatMonitor::new(config.quality, config.stall_threshold),
            progression: ProgressionController::new(),
            heartbeat_timer: IntervalTimer::new(config.heartbeat_interval),
            retry_timer: IntervalTimer::new(config.retry_sweep_interval),
            question_started: None,
            now: Instant::now(),
            events: Vec::new(),
            config,
        }
    }

    /// Host a match; returns the id the guest has to dial
    pub fn become_host(&mut self) -> Result<PeerId> {
        self.connection.become_host()
    }

    /// Join the match hosted at `target`
    pub fn connect_to_peer(&mut self, target: &PeerId) -> Result<()> {
        self.connection.connect_to_peer(target)
    }

    /// Start the match (host only, with a guest connected)
    pub fn start_game(&mut self, quiz: Quiz) -> Result<()> {
        match self.connection.role() {
            Some(Role::Host) => {}
            Some(Role::Guest) => return Err(GameError::NotHost.into()),
            None => return Err(GameError::NotConnected.into()),
        }
        if !self.connection.is_connected() {
            return Err(GameError::NotConnected.into());
        }

        let event = self.session.start(quiz.clone())?;
        self.enter_playing(self.now);
        self.emit(event);
        self.send_reliable(MessageBody::GameStart { quiz });
        Ok(())
    }

    /// Grade and broadcast the local player's answer to the current question
    pub fn submit_answer(&mut self, answer: &str, time_to_answer: u32) -> Result<AnswerSubmission> {
        let role = self.connection.role().ok_or(GameError::NotConnected)?;
        let submission =
            self.session
                .submit_local(role, answer, time_to_answer, &self.config.scoring)?;

        tracing::info!(
            "✏️ {} answered question {} ({}, +{})",
            role,
            submission.question_index + 1,
            if submission.is_correct { "correct" } else { "wrong" },
            submission.points
        );

        self.emit(GameEvent::AnswerRecorded {
            role,
            question_index: submission.question_index,
            is_correct: submission.is_correct,
            points: submission.points,
            new_score: submission.new_score,
        });
        self.send_reliable(MessageBody::AnswerSubmitted(submission.clone()));
        self.drive_progression(self.now);

        Ok(submission)
    }

    /// Close the channel and drop all session, messaging and timer state
    pub fn leave_game(&mut self) {
        self.connection.leave();
        self.session.reset();
        self.reliable.reset();
        self.heartbeat.reset();
        self.progression.reset();
        self.heartbeat_timer.stop();
        self.retry_timer.stop();
        self.question_started = None;
    }

    pub fn poll(&mut self) -> usize {
        self.poll_at(Instant::now())
    }

    /// Run one loop iteration at `now`: inbound frames, heartbeat, retry
    /// sweep, answer deadline and host progression. Returns the number of
    /// transport events handled.
    pub fn poll_at(&mut self, now: Instant) -> usize {
        self.now = now;

        if !self.retry_timer.is_running() {
            self.retry_timer.start(now);
        }
        if !self.heartbeat_timer.is_running() {
            self.heartbeat_timer.start(now);
        }

        let events = self.connection.drain();
        let processed = events.len();
        for event in events {
            // Frames queued ahead of a close still belong to the match
            self.connection.track(&event);
            self.handle_connection_event(event, now);
        }

        if self.heartbeat_timer.fire(now) {
            self.heartbeat_tick(now);
        }
        if self.retry_timer.fire(now) {
            self.retry_sweep(now);
        }

        self.check_answer_deadline(now);
        self.drive_progression(now);

        processed
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn peer_session(&self) -> Option<&PeerSession> {
        self.connection.peer_session()
    }

    pub fn role(&self) -> Option<Role> {
        self.connection.role()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    pub fn local_peer_id(&self) -> Option<PeerId> {
        self.connection.local_peer_id()
    }

    pub fn quality(&self) -> &ConnectionQuality {
        self.heartbeat.quality()
    }

    pub fn pending_count(&self) -> usize {
        self.reliable.pending_count()
    }

    pub fn pending(&self, sequence_id: u64) -> Option<&PendingMessage> {
        self.reliable.pending(sequence_id)
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Remaining answer time for the current question, `None` when not playing
    pub fn time_left(&self, now: Instant) -> Option<Duration> {
        if !self.session.is_playing() {
            return None;
        }
        let started = self.question_started?;
        Some(
            self.config
                .answer_window
                .saturating_sub(elapsed_since(started, now)),
        )
    }

    /// Nothing left to deliver: every sequenced message was acked or has
    /// run out of retries. Leaving before this loses the retries.
    pub fn is_delivery_settled(&self) -> bool {
        self.reliable.in_flight() == 0
    }

    fn handle_connection_event(&mut self, event: ConnectionEvent, now: Instant) {
        match event {
            ConnectionEvent::ChannelOpened(remote) => {
                if !self.connection.is_remote(&remote) {
                    return;
                }
                self.emit(SessionEvent::ChannelOpened {
                    remote: remote.clone(),
                });

                if self.connection.role() == Some(Role::Guest) {
                    if let Some(peer_id) = self.connection.local_peer_id() {
                        self.send_reliable(MessageBody::PlayerJoined { peer_id });
                    }
                    if let Some(event) = self.session.mark_player_joined() {
                        self.emit(event);
                    }
                }
            }
            ConnectionEvent::ChannelClosed(remote) => {
                let closed = self
                    .connection
                    .peer_session()
                    .is_some_and(|session| session.status() == &ChannelStatus::Closed);
                if !closed {
                    return;
                }
                tracing::warn!("🔴 Peer {} left, match over", remote);
                self.progression.reset();
                if let Some(event) = self.session.mark_disconnected() {
                    self.emit(event);
                }
            }
            ConnectionEvent::MessageReceived { from, data } => {
                if !self.connection.is_remote(&from) {
                    tracing::debug!("Frame from unknown peer {} ignored", from);
                    return;
                }
                self.handle_frame(&data, now);
            }
            ConnectionEvent::Error(message) => {
                self.emit(SessionEvent::TransportError(message));
            }
        }
    }

    fn handle_frame(&mut self, data: &[u8], now: Instant) {
        let envelope = match Envelope::from_bytes(data) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!("Undecodable frame ({} bytes): {}", data.len(), e);
                return;
            }
        };

        let receipt = self.reliable.receive(&envelope);
        if let Some(ack) = receipt.ack {
            self.transmit(&ack);
        }
        if receipt.deliver {
            self.dispatch(envelope.body, now);
        }
    }

    fn dispatch(&mut self, body: MessageBody, now: Instant) {
        let Some(role) = self.connection.role() else {
            return;
        };

        match body {
            MessageBody::PlayerJoined { peer_id } => {
                if role.is_host() {
                    tracing::info!("👋 {} joined", peer_id);
                    if let Some(event) = self.session.mark_player_joined() {
                        self.emit(event);
                    }
                }
            }
            MessageBody::GameStart { quiz } => {
                if role.is_host() {
                    return;
                }
                match self.session.start(quiz) {
                    Ok(event) => {
                        self.enter_playing(now);
                        self.emit(event);
                    }
                    Err(e) => tracing::warn!("Ignoring game-start: {}", e),
                }
            }
            MessageBody::AnswerSubmitted(submission) => {
                self.apply_remote_answer(role, submission);
            }
            MessageBody::NextQuestion {
                question_index,
                scores,
            } => {
                if role.is_host() {
                    return;
                }
                match self.session.apply_next_question(question_index, scores) {
                    Some(event) => {
                        self.question_started = Some(now);
                        self.emit(event);
                    }
                    None => self.discard_stale("next-question", question_index),
                }
            }
            MessageBody::ProgressionStatus {
                status,
                next_in,
                current_scores,
                question_index,
            } => {
                if role.is_host() {
                    return;
                }
                let notice = ProgressionNotice {
                    status,
                    next_in_ms: next_in,
                    scores: current_scores,
                    question_index,
                };
                match self.session.apply_progression_status(notice) {
                    Some(event) => self.emit(event),
                    None => self.discard_stale("progression-status", question_index),
                }
            }
            MessageBody::GameEnd { final_scores } => {
                if role.is_host() {
                    return;
                }
                if let Some(event) = self.session.apply_game_end(final_scores) {
                    self.progression.reset();
                    self.emit(event);
                }
            }
            MessageBody::Heartbeat { .. } => self.heartbeat.record_heartbeat(now),
            MessageBody::Ack { .. } => {}
        }
    }

    fn apply_remote_answer(&mut self, own_role: Role, submission: AnswerSubmission) {
        if submission.player_id != own_role.opponent() {
            tracing::warn!("Peer sent an answer in our name, ignored");
            return;
        }
        if submission.question_index != self.session.question_index() {
            self.discard_stale("answer-submitted", submission.question_index);
            return;
        }
        if let Some(event) = self.session.apply_remote_answer(&submission) {
            self.emit(event);
        }
    }

    fn discard_stale(&mut self, kind: &'static str, question_index: usize) {
        let current_index = self.session.question_index();
        tracing::debug!(
            "Stale {} for question {} discarded (current {})",
            kind,
            question_index,
            current_index
        );
        self.emit(SessionEvent::StaleDiscarded {
            kind,
            question_index,
            current_index,
        });
    }

    fn heartbeat_tick(&mut self, now: Instant) {
        let playing = self.session.is_playing();
        if playing && self.connection.is_connected() {
            self.transmit(&Envelope::heartbeat());
        }
        if let Some(quality) = self.heartbeat.tick(now, playing) {
            self.emit(SessionEvent::QualityChanged {
                level: quality.level,
                sync_buffer: quality.sync_buffer,
            });
        }
    }

    fn retry_sweep(&mut self, now: Instant) {
        let sweep = self.reliable.sweep(now);
        for envelope in &sweep.resend {
            self.transmit(envelope);
        }
        for (sequence_id, kind) in sweep.exhausted {
            self.emit(SessionEvent::DeliveryFailed { sequence_id, kind });
        }
    }

    fn check_answer_deadline(&mut self, now: Instant) {
        let Some(role) = self.connection.role() else {
            return;
        };
        if self.session.answers_received().has_answered(role) {
            return;
        }
        if self.time_left(now) != Some(Duration::ZERO) {
            return;
        }

        tracing::info!(
            "⏰ Answer window closed on question {}, submitting blank",
            self.session.question_index() + 1
        );
        let window_secs = self.config.answer_window.as_secs() as u32;
        if let Err(e) = self.submit_answer("", window_secs) {
            tracing::warn!("Auto-submit failed: {}", e);
        }
    }

    /// Host only: announce once both answered, then advance or finish when
    /// the delay is up
    fn drive_progression(&mut self, now: Instant) {
        if self.connection.role() != Some(Role::Host) {
            return;
        }

        let delay = self.config.progression_delay + self.heartbeat.sync_buffer();
        if let Some(notice) = self.progression.check(&self.session, now, delay) {
            self.emit(GameEvent::ProgressionPending {
                question_index: notice.question_index,
                next_in_ms: notice.next_in_ms,
                scores: notice.scores,
            });
            self.send_reliable(MessageBody::ProgressionStatus {
                status: notice.status,
                next_in: notice.next_in_ms,
                current_scores: notice.scores,
                question_index: notice.question_index,
            });
        }

        let Some(question_index) = self.progression.take_due(now) else {
            return;
        };
        if question_index != self.session.question_index() {
            return;
        }

        match self.session.advance() {
            Ok(Progression::NextQuestion {
                question_index,
                scores,
            }) => {
                tracing::info!(
                    "➡️ Question {}/{}",
                    question_index + 1,
                    self.session.total_questions()
                );
                self.question_started = Some(now);
                self.emit(GameEvent::QuestionChanged {
                    question_index,
                    scores,
                });
                self.send_reliable(MessageBody::NextQuestion {
                    question_index,
                    scores,
                });
            }
            Ok(Progression::Finished { final_scores }) => {
                tracing::info!(
                    "🏁 Match over: host {} / guest {}",
                    final_scores.host,
                    final_scores.guest
                );
                self.emit(GameEvent::GameEnded {
                    final_scores,
                    summary: self.session.summary(),
                });
                self.send_reliable(MessageBody::GameEnd { final_scores });
            }
            Err(e) => tracing::debug!("Progression skipped: {}", e),
        }
    }

    fn enter_playing(&mut self, now: Instant) {
        self.heartbeat.start(now);
        self.progression.reset();
        self.question_started = Some(now);
    }

    fn send_reliable(&mut self, body: MessageBody) {
        let envelope = self.reliable.prepare(body, self.now);
        self.transmit(&envelope);
    }

    /// Send failures are logged; sequenced frames stay pending and are retried
    fn transmit(&mut self, envelope: &Envelope) {
        if let Err(e) = self.connection.send(envelope) {
            tracing::warn!("Failed to send {}: {}", envelope.body.kind(), e);
        }
    }

    fn emit(&mut self, event: impl Into<SessionEvent>) {
        self.events.push(event.into());
    }
}
