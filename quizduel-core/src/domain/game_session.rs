use crate::domain::{
    AnswerFlags, AnswerRecord, GameEvent, MatchSummary, Question, Quiz, Role, Scores,
    ScoringRules,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a match as seen by one peer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameState {
    /// Session created, opponent not there yet
    #[default]
    Waiting,
    /// Opponent joined, quiz not started
    Ready,
    Playing,
    Finished,
    /// Channel closed; terminal for this session
    Disconnected,
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            GameState::Waiting => "waiting",
            GameState::Ready => "ready",
            GameState::Playing => "playing",
            GameState::Finished => "finished",
            GameState::Disconnected => "disconnected",
        };
        f.write_str(label)
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum GameError {
    #[error("Only the host can do this")]
    NotHost,

    #[error("No peer connected")]
    NotConnected,

    #[error("Quiz has no questions")]
    EmptyQuiz,

    #[error("Game is not in progress (state: {0})")]
    NotPlaying(GameState),

    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: GameState,
    },

    #[error("{0} already answered question {1}")]
    AlreadyAnswered(Role, usize),

    #[error("Question index {index} out of range (total: {total})")]
    QuestionOutOfRange { index: usize, total: usize },

    #[error("Not all players have answered yet")]
    AnswersOutstanding,
}

/// Payload of an `answer-submitted` message.
///
/// `new_score` is the sender's absolute score after this answer, so the
/// receiver can set its mirror directly instead of re-adding points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSubmission {
    pub player_id: Role,
    pub answer: String,
    pub is_correct: bool,
    pub time_to_answer: u32,
    pub question_index: usize,
    pub points: u32,
    pub new_score: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgressionStatus {
    BothAnswered,
}

/// Host's "moving on soon" notice, kept by the guest for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionNotice {
    pub status: ProgressionStatus,
    pub next_in_ms: u64,
    pub scores: Scores,
    pub question_index: usize,
}

/// Outcome of the host's progression decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progression {
    NextQuestion { question_index: usize, scores: Scores },
    Finished { final_scores: Scores },
}

/// One peer's view of the match.
///
/// Every mutation is a method taking `&mut self`, so it always works on the
/// state as it is when the call happens.
#[derive(Debug, Clone, Default)]
pub struct GameSession {
    quiz: Option<Quiz>,
    question_index: usize,
    scores: Scores,
    answers_received: AnswerFlags,
    state: GameState,
    answers: Vec<AnswerRecord>,
    progression: Option<ProgressionNotice>,
}

impl GameSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn quiz(&self) -> Option<&Quiz> {
        self.quiz.as_ref()
    }

    pub fn question_index(&self) -> usize {
        self.question_index
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.quiz.as_ref()?.question(self.question_index)
    }

    pub fn total_questions(&self) -> usize {
        self.quiz.as_ref().map(Quiz::total_questions).unwrap_or(0)
    }

    pub fn scores(&self) -> Scores {
        self.scores
    }

    pub fn answers_received(&self) -> AnswerFlags {
        self.answers_received
    }

    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    pub fn progression(&self) -> Option<&ProgressionNotice> {
        self.progression.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.state == GameState::Playing
    }

    /// Progression trigger: both flags set while playing
    pub fn both_answered(&self) -> bool {
        self.is_playing() && self.answers_received.both()
    }

    pub fn summary(&self) -> MatchSummary {
        MatchSummary::compute(&self.scores, &self.answers)
    }

    /// `waiting -> ready` when the opponent shows up
    pub fn mark_player_joined(&mut self) -> Option<GameEvent> {
        if self.state != GameState::Waiting {
            return None;
        }
        self.state = GameState::Ready;
        Some(GameEvent::PlayerJoined)
    }

    /// `waiting|ready -> playing`; fixes the quiz and resets the match
    pub fn start(&mut self, quiz: Quiz) -> Result<GameEvent, GameError> {
        if !matches!(self.state, GameState::Waiting | GameState::Ready) {
            return Err(GameError::InvalidTransition {
                action: "start",
                state: self.state,
            });
        }
        if quiz.total_questions() == 0 {
            return Err(GameError::EmptyQuiz);
        }

        let event = GameEvent::GameStarted {
            quiz_name: quiz.quiz_name.clone(),
            total_questions: quiz.total_questions(),
        };

        self.quiz = Some(quiz);
        self.question_index = 0;
        self.scores = Scores::default();
        self.answers_received = AnswerFlags::default();
        self.answers.clear();
        self.progression = None;
        self.state = GameState::Playing;

        tracing::info!("Game started: {:?}", event);
        Ok(event)
    }

    /// Grade and record a local answer for the current question.
    ///
    /// Returns the payload to send to the opponent.
    pub fn submit_local(
        &mut self,
        role: Role,
        answer: &str,
        time_to_answer: u32,
        rules: &ScoringRules,
    ) -> Result<AnswerSubmission, GameError> {
        if !self.is_playing() {
            return Err(GameError::NotPlaying(self.state));
        }
        if self.answers_received.has_answered(role) {
            return Err(GameError::AlreadyAnswered(role, self.question_index));
        }

        let question = self
            .current_question()
            .ok_or(GameError::QuestionOutOfRange {
                index: self.question_index,
                total: self.total_questions(),
            })?;

        let is_correct = question.is_correct(answer);
        let points = rules.points(is_correct, time_to_answer);

        self.scores[role] += points;
        self.answers_received.mark(role);

        let submission = AnswerSubmission {
            player_id: role,
            answer: answer.to_string(),
            is_correct,
            time_to_answer,
            question_index: self.question_index,
            points,
            new_score: self.scores[role],
        };
        self.record(&submission);

        Ok(submission)
    }

    /// Mirror the opponent's answer. Answers tagged with another question
    /// are stale and change nothing.
    pub fn apply_remote_answer(&mut self, submission: &AnswerSubmission) -> Option<GameEvent> {
        if !self.is_playing() || submission.question_index != self.question_index {
            return None;
        }

        let role = submission.player_id;
        let first_delivery = !self.answers_received.has_answered(role);

        self.scores[role] = self.scores[role].max(submission.new_score);
        self.answers_received.mark(role);

        if first_delivery {
            self.record(submission);
        }

        Some(GameEvent::AnswerRecorded {
            role,
            question_index: submission.question_index,
            is_correct: submission.is_correct,
            points: submission.points,
            new_score: self.scores[role],
        })
    }

    /// Host decision once both answered: next question or end of match
    pub fn advance(&mut self) -> Result<Progression, GameError> {
        if !self.is_playing() {
            return Err(GameError::NotPlaying(self.state));
        }
        if !self.answers_received.both() {
            return Err(GameError::AnswersOutstanding);
        }

        if self.question_index + 1 < self.total_questions() {
            self.question_index += 1;
            self.answers_received = AnswerFlags::default();
            self.progression = None;
            Ok(Progression::NextQuestion {
                question_index: self.question_index,
                scores: self.scores,
            })
        } else {
            self.end(self.scores);
            Ok(Progression::Finished {
                final_scores: self.scores,
            })
        }
    }

    /// Guest side of `next-question`: host scores overwrite ours.
    /// Indices at or behind the current one are discarded.
    pub fn apply_next_question(&mut self, question_index: usize, scores: Scores) -> Option<GameEvent> {
        if !self.is_playing()
            || question_index <= self.question_index
            || question_index >= self.total_questions()
        {
            return None;
        }

        self.question_index = question_index;
        self.answers_received = AnswerFlags::default();
        self.scores = scores;
        self.progression = None;

        Some(GameEvent::QuestionChanged {
            question_index,
            scores,
        })
    }

    /// Guest side of `progression-status` for the current question
    pub fn apply_progression_status(&mut self, notice: ProgressionNotice) -> Option<GameEvent> {
        if !self.is_playing() || notice.question_index != self.question_index {
            return None;
        }

        self.scores = notice.scores;
        self.progression = Some(notice);

        Some(GameEvent::ProgressionPending {
            question_index: notice.question_index,
            next_in_ms: notice.next_in_ms,
            scores: notice.scores,
        })
    }

    /// Host-side end of match with the scores as they stand
    pub fn finish(&mut self) -> Option<GameEvent> {
        self.apply_game_end(self.scores)
    }

    /// `game-end` from the host, or the host's own finish
    pub fn apply_game_end(&mut self, final_scores: Scores) -> Option<GameEvent> {
        if matches!(self.state, GameState::Finished | GameState::Disconnected) {
            return None;
        }

        self.end(final_scores);

        Some(GameEvent::GameEnded {
            final_scores,
            summary: self.summary(),
        })
    }

    /// Any state -> disconnected
    pub fn mark_disconnected(&mut self) -> Option<GameEvent> {
        if self.state == GameState::Disconnected {
            return None;
        }
        self.state = GameState::Disconnected;
        Some(GameEvent::Disconnected)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn end(&mut self, final_scores: Scores) {
        self.scores = final_scores;
        self.state = GameState::Finished;
        self.progression = None;
        tracing::info!("Game finished: {:?}", final_scores);
    }

    fn record(&mut self, submission: &AnswerSubmission) {
        self.answers.push(AnswerRecord {
            role: submission.player_id,
            question_index: submission.question_index,
            answer: submission.answer.clone(),
            is_correct: submission.is_correct,
            time_to_answer: submission.time_to_answer,
            points: submission.points,
        });
    }
}
