pub mod domain;

pub use domain::{
    AnswerFlags, AnswerRecord, AnswerSubmission, GameError, GameEvent, GameSession, GameState,
    MatchSummary, PlayerStanding, Progression, ProgressionNotice, ProgressionStatus, Question,
    QuestionOptions, Quiz, Role, Scores, ScoringRules,
};
