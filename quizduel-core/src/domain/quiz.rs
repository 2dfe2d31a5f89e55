use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Quiz document as handed out by the quiz store.
///
/// Only the question list and each question's answer key matter to the
/// match; every other field is carried along untouched so the copy sent to
/// the peer in `game-start` is identical to the one the host loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub quiz_name: String,

    /// Whole-quiz time limit as stored, passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz_time: Option<Value>,

    pub questions_and_answers: Vec<Question>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single quiz question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub question: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<QuestionOptions>,

    /// Multiple-choice key (e.g. "B")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,

    /// Legacy free-text answer, used when no `correct_answer` is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Answer options come either keyed (`{"A": .., "B": ..}`) or as a plain list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionOptions {
    Keyed(BTreeMap<String, String>),
    Listed(Vec<String>),
}

impl QuestionOptions {
    pub fn len(&self) -> usize {
        match self {
            QuestionOptions::Keyed(map) => map.len(),
            QuestionOptions::Listed(list) => list.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Question {
    /// Multiple-choice question with keyed options
    pub fn multiple_choice(
        question: impl Into<String>,
        options: &[(&str, &str)],
        correct_answer: impl Into<String>,
    ) -> Self {
        let options = options
            .iter()
            .map(|(key, text)| (key.to_string(), text.to_string()))
            .collect();

        Self {
            question: question.into(),
            options: Some(QuestionOptions::Keyed(options)),
            correct_answer: Some(correct_answer.into()),
            answer: None,
            extra: Map::new(),
        }
    }

    /// Canonical answer key: `correct_answer`, falling back to `answer`
    pub fn answer_key(&self) -> Option<&str> {
        self.correct_answer
            .as_deref()
            .or(self.answer.as_deref())
    }

    /// Exact comparison against the answer key. A question without a key
    /// can never be answered correctly.
    pub fn is_correct(&self, answer: &str) -> bool {
        match self.answer_key() {
            Some(key) => !answer.is_empty() && answer == key,
            None => false,
        }
    }
}

impl Quiz {
    pub fn new(quiz_name: impl Into<String>, questions: Vec<Question>) -> Self {
        Self {
            quiz_name: quiz_name.into(),
            quiz_time: None,
            questions_and_answers: questions,
            extra: Map::new(),
        }
    }

    pub fn total_questions(&self) -> usize {
        self.questions_and_answers.len()
    }

    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions_and_answers.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_key_prefers_correct_answer() {
        let mut q = Question::multiple_choice("2 + 2?", &[("A", "3"), ("B", "4")], "B");
        q.answer = Some("4".to_string());

        assert_eq!(q.answer_key(), Some("B"));
        assert!(q.is_correct("B"));
        assert!(!q.is_correct("4"));
    }

    #[test]
    fn test_answer_key_falls_back_to_legacy_answer() {
        let json = r#"{"question": "Capital of France?", "answer": "Paris"}"#;
        let q: Question = serde_json::from_str(json).unwrap();

        assert_eq!(q.answer_key(), Some("Paris"));
        assert!(q.is_correct("Paris"));
        assert!(!q.is_correct("paris"));
    }

    #[test]
    fn test_question_without_key_is_never_correct() {
        let q: Question = serde_json::from_str(r#"{"question": "?"}"#).unwrap();
        assert!(!q.is_correct(""));
        assert!(!q.is_correct("A"));
    }

    #[test]
    fn test_empty_answer_is_never_correct() {
        let q: Question = serde_json::from_str(r#"{"question": "?", "answer": ""}"#).unwrap();
        assert!(!q.is_correct(""));
    }

    #[test]
    fn test_options_accept_both_shapes() {
        let keyed: Question = serde_json::from_str(
            r#"{"question": "q", "options": {"A": "x", "B": "y"}, "correct_answer": "A"}"#,
        )
        .unwrap();
        let listed: Question = serde_json::from_str(
            r#"{"question": "q", "options": ["x", "y", "z"], "correct_answer": "x"}"#,
        )
        .unwrap();

        assert!(matches!(keyed.options, Some(QuestionOptions::Keyed(_))));
        assert_eq!(listed.options.as_ref().map(QuestionOptions::len), Some(3));
    }

    #[test]
    fn test_unknown_fields_survive_reserialization() {
        let json = r#"{
            "_id": "665f",
            "pdf_name": "bio.pdf",
            "quiz_name": "Biology",
            "quiz_time": "45",
            "questions_and_answers": [
                {"_id": "q1", "question": "Cell powerhouse?", "correct_answer": "C"}
            ]
        }"#;

        let quiz: Quiz = serde_json::from_str(json).unwrap();
        assert_eq!(quiz.total_questions(), 1);
        assert_eq!(quiz.quiz_time, Some(Value::from("45")));

        let value = serde_json::to_value(&quiz).unwrap();
        assert_eq!(value["_id"], "665f");
        assert_eq!(value["pdf_name"], "bio.pdf");
        assert_eq!(value["questions_and_answers"][0]["_id"], "q1");

        let back: Quiz = serde_json::from_value(value).unwrap();
        assert_eq!(back, quiz);
    }
}
