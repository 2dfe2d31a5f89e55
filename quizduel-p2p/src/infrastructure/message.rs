use crate::domain::PeerId;
use crate::infrastructure::error::Result;
use quizduel_core::{AnswerSubmission, ProgressionStatus, Quiz, Scores};
use serde::{Deserialize, Serialize};

/// One frame on the data channel:
/// `{type, payload, sequenceId?, timestamp}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(flatten)]
    pub body: MessageBody,

    /// Set on every state-changing message, absent on heartbeat and ack
    #[serde(rename = "sequenceId", default, skip_serializing_if = "Option::is_none")]
    pub sequence_id: Option<u64>,

    /// Sender wall clock, ms since the Unix epoch
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum MessageBody {
    #[serde(rename_all = "camelCase")]
    PlayerJoined { peer_id: PeerId },

    GameStart { quiz: Quiz },

    AnswerSubmitted(AnswerSubmission),

    #[serde(rename_all = "camelCase")]
    NextQuestion {
        question_index: usize,
        scores: Scores,
    },

    #[serde(rename_all = "camelCase")]
    ProgressionStatus {
        status: ProgressionStatus,
        /// Milliseconds until the host decides
        next_in: u64,
        current_scores: Scores,
        question_index: usize,
    },

    #[serde(rename_all = "camelCase")]
    GameEnd { final_scores: Scores },

    Heartbeat { timestamp: i64 },

    #[serde(rename_all = "camelCase")]
    Ack { sequence_id: u64 },
}

impl MessageBody {
    /// Heartbeats and acks are fire-and-forget; everything else is sequenced
    pub fn is_sequenced(&self) -> bool {
        !matches!(self, MessageBody::Heartbeat { .. } | MessageBody::Ack { .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            MessageBody::PlayerJoined { .. } => "player-joined",
            MessageBody::GameStart { .. } => "game-start",
            MessageBody::AnswerSubmitted(_) => "answer-submitted",
            MessageBody::NextQuestion { .. } => "next-question",
            MessageBody::ProgressionStatus { .. } => "progression-status",
            MessageBody::GameEnd { .. } => "game-end",
            MessageBody::Heartbeat { .. } => "heartbeat",
            MessageBody::Ack { .. } => "ack",
        }
    }
}

impl Envelope {
    /// Unsequenced frame stamped with the current wall clock
    pub fn new(body: MessageBody) -> Self {
        Self {
            body,
            sequence_id: None,
            timestamp: now_millis(),
        }
    }

    pub fn heartbeat() -> Self {
        Self::new(MessageBody::Heartbeat {
            timestamp: now_millis(),
        })
    }

    pub fn ack(sequence_id: u64) -> Self {
        Self::new(MessageBody::Ack { sequence_id })
    }

    pub fn with_sequence(mut self, sequence_id: u64) -> Self {
        self.sequence_id = Some(sequence_id);
        self
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizduel_core::{Question, Role};
    use serde_json::json;

    #[test]
    fn test_answer_submitted_wire_format() {
        let envelope = Envelope::new(MessageBody::AnswerSubmitted(AnswerSubmission {
            player_id: Role::Host,
            answer: "B".to_string(),
            is_correct: true,
            time_to_answer: 5,
            question_index: 0,
            points: 125,
            new_score: 125,
        }))
        .with_sequence(7);

        let value = serde_json::to_value(&envelope).unwrap();

        assert_eq!(value["type"], "answer-submitted");
        assert_eq!(value["sequenceId"], 7);
        assert_eq!(value["payload"]["playerId"], "host");
        assert_eq!(value["payload"]["newScore"], 125);
        assert!(value["timestamp"].is_i64());
    }

    #[test]
    fn test_heartbeat_has_no_sequence_id() {
        let value = serde_json::to_value(Envelope::heartbeat()).unwrap();

        assert_eq!(value["type"], "heartbeat");
        assert!(value.get("sequenceId").is_none());
        assert!(value["payload"]["timestamp"].is_i64());
    }

    #[test]
    fn test_progression_status_payload_names() {
        let body = MessageBody::ProgressionStatus {
            status: ProgressionStatus::BothAnswered,
            next_in: 3000,
            current_scores: Scores::new(125, 0),
            question_index: 0,
        };
        let value = serde_json::to_value(Envelope::new(body)).unwrap();

        assert_eq!(
            value["payload"],
            json!({
                "status": "both-answered",
                "nextIn": 3000,
                "currentScores": {"host": 125, "guest": 0},
                "questionIndex": 0
            })
        );
    }

    #[test]
    fn test_decode_frame_from_peer() {
        let frame = br#"{
            "type": "next-question",
            "payload": {"questionIndex": 1, "scores": {"host": 125, "guest": 0}},
            "sequenceId": 4,
            "timestamp": 1717000000000
        }"#;

        let envelope = Envelope::from_bytes(frame).unwrap();
        assert_eq!(envelope.sequence_id, Some(4));
        assert_eq!(
            envelope.body,
            MessageBody::NextQuestion {
                question_index: 1,
                scores: Scores::new(125, 0)
            }
        );
    }

    #[test]
    fn test_game_start_carries_quiz() {
        let quiz = Quiz::new(
            "Capitals",
            vec![Question::multiple_choice("France?", &[("A", "Paris")], "A")],
        );
        let bytes = Envelope::new(MessageBody::GameStart { quiz: quiz.clone() })
            .with_sequence(1)
            .to_bytes()
            .unwrap();

        let decoded = Envelope::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.body, MessageBody::GameStart { quiz });
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(Envelope::from_bytes(b"{\"type\":\"teleport\"}").is_err());
        assert!(Envelope::from_bytes(b"not json").is_err());
    }

    #[test]
    fn test_sequenced_kinds() {
        assert!(!Envelope::ack(1).body.is_sequenced());
        assert!(!Envelope::heartbeat().body.is_sequenced());
        assert!(MessageBody::GameEnd {
            final_scores: Scores::default()
        }
        .is_sequenced());
    }
}
