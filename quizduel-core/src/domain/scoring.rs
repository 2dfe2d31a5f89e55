use crate::domain::{Role, Scores};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Points awarded per answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringRules {
    /// Points for any correct answer
    pub base_points: u32,
    /// A correct answer earns one bonus point per second left in this window
    pub bonus_window_secs: u32,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            base_points: 100,
            bonus_window_secs: 30,
        }
    }
}

impl ScoringRules {
    /// `base + max(0, window - time)` for a correct answer, 0 otherwise
    pub fn points(&self, is_correct: bool, time_to_answer: u32) -> u32 {
        if !is_correct {
            return 0;
        }
        self.base_points + self.bonus_window_secs.saturating_sub(time_to_answer)
    }
}

/// One applied answer, local or remote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub role: Role,
    pub question_index: usize,
    pub answer: String,
    pub is_correct: bool,
    pub time_to_answer: u32,
    pub points: u32,
}

/// Final standing of one player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStanding {
    pub role: Role,
    pub score: u32,
    pub correct_answers: usize,
    pub total_answers: usize,
    /// Percent, rounded
    pub accuracy: u32,
    /// Seconds, one decimal
    pub average_time: f64,
    /// 1-based rank
    pub position: usize,
}

/// Leaderboard for a finished (or running) match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub standings: Vec<PlayerStanding>,
    /// `None` when the players tie on every criterion
    pub winner: Option<Role>,
}

impl MatchSummary {
    /// Rank by score, then accuracy, then average time (faster first)
    pub fn compute(scores: &Scores, answers: &[AnswerRecord]) -> Self {
        let mut standings: Vec<PlayerStanding> = [Role::Host, Role::Guest]
            .into_iter()
            .map(|role| standing_for(role, scores[role], answers))
            .collect();

        standings.sort_by(rank);

        let winner = match rank(&standings[0], &standings[1]) {
            Ordering::Equal => None,
            _ => Some(standings[0].role),
        };

        for (i, standing) in standings.iter_mut().enumerate() {
            standing.position = i + 1;
        }

        Self { standings, winner }
    }

    pub fn standing(&self, role: Role) -> Option<&PlayerStanding> {
        self.standings.iter().find(|s| s.role == role)
    }
}

fn standing_for(role: Role, score: u32, answers: &[AnswerRecord]) -> PlayerStanding {
    let own: Vec<&AnswerRecord> = answers.iter().filter(|a| a.role == role).collect();
    let total_answers = own.len();
    let correct_answers = own.iter().filter(|a| a.is_correct).count();

    let (accuracy, average_time) = if total_answers > 0 {
        let accuracy = (correct_answers as f64 / total_answers as f64) * 100.0;
        let total_time: u64 = own.iter().map(|a| a.time_to_answer as u64).sum();
        let average = total_time as f64 / total_answers as f64;
        (accuracy.round() as u32, (average * 10.0).round() / 10.0)
    } else {
        (0, 0.0)
    };

    PlayerStanding {
        role,
        score,
        correct_answers,
        total_answers,
        accuracy,
        average_time,
        position: 0,
    }
}

fn rank(a: &PlayerStanding, b: &PlayerStanding) -> Ordering {
    b.score
        .cmp(&a.score)
        .then(b.accuracy.cmp(&a.accuracy))
        .then(
            a.average_time
                .partial_cmp(&b.average_time)
                .unwrap_or(Ordering::Equal),
        )
}
