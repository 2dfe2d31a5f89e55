pub mod events;
pub mod game_session;
pub mod quiz;
pub mod role;
pub mod scoring;

pub use events::GameEvent;
pub use game_session::{
    AnswerSubmission, GameError, GameSession, GameState, Progression, ProgressionNotice,
    ProgressionStatus,
};
pub use quiz::{Question, QuestionOptions, Quiz};
pub use role::{AnswerFlags, Role, Scores};
pub use scoring::{AnswerRecord, MatchSummary, PlayerStanding, ScoringRules};
