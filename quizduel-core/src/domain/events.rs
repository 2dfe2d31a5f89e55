use crate::domain::{MatchSummary, Role, Scores};
use serde::{Deserialize, Serialize};

/// State changes reported to whoever renders the match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    /// The opponent is on the line; the host may start
    PlayerJoined,

    GameStarted {
        quiz_name: String,
        total_questions: usize,
    },

    AnswerRecorded {
        role: Role,
        question_index: usize,
        is_correct: bool,
        points: u32,
        new_score: u32,
    },

    /// Both players answered, the host will move on after `next_in_ms`
    ProgressionPending {
        question_index: usize,
        next_in_ms: u64,
        scores: Scores,
    },

    QuestionChanged {
        question_index: usize,
        scores: Scores,
    },

    GameEnded {
        final_scores: Scores,
        summary: MatchSummary,
    },

    /// Channel closed; the session cannot be resumed
    Disconnected,
}
