use crate::infrastructure::error::{CliError, Result};
use quizduel_core::{Question, Quiz};
use std::path::Path;

/// Read a quiz document as exported by the quiz store
pub fn load_quiz(path: &Path) -> Result<Quiz> {
    if !path.is_file() {
        return Err(CliError::quiz_not_found(path.to_path_buf()));
    }
    let raw = std::fs::read_to_string(path)?;
    let quiz = parse_quiz(&raw)?;
    tracing::info!(
        "📚 Loaded '{}' ({} questions) from {}",
        quiz.quiz_name,
        quiz.total_questions(),
        path.display()
    );
    Ok(quiz)
}

pub fn parse_quiz(raw: &str) -> Result<Quiz> {
    let quiz: Quiz = serde_json::from_str(raw)?;

    if quiz.total_questions() == 0 {
        return Err(CliError::InvalidQuiz(format!(
            "'{}' has no questions",
            quiz.quiz_name
        )));
    }

    let unanswerable = quiz
        .questions_and_answers
        .iter()
        .filter(|q| q.answer_key().is_none())
        .count();
    if unanswerable > 0 {
        tracing::warn!(
            "{} question(s) in '{}' have no answer key and can't be answered correctly",
            unanswerable,
            quiz.quiz_name
        );
    }

    Ok(quiz)
}

/// Built-in quiz for the demo
pub fn demo_quiz(questions: usize) -> Quiz {
    const BANK: &[(&str, [&str; 4], &str)] = &[
        ("Which layer owns the match state?", ["The host", "The guest", "Both", "Neither"], "A"),
        ("How many retries before giving up?", ["One", "Two", "Three", "Forever"], "C"),
        ("What does an ack carry?", ["A score", "A sequence id", "A quiz", "Nothing"], "B"),
        ("Heartbeat period while playing?", ["1s", "2s", "5s", "3s"], "D"),
        ("Who grades an answer?", ["The answering peer", "The host", "The server", "Nobody"], "A"),
    ];

    let questions = (0..questions)
        .map(|i| {
            let (text, options, key) = BANK[i % BANK.len()];
            let keyed: Vec<(&str, &str)> = ["A", "B", "C", "D"].into_iter().zip(options).collect();
            Question::multiple_choice(text, &keyed, key)
        })
        .collect();

    Quiz::new("Protocol Warm-up", questions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_store_document() {
        let raw = r#"{
            "_id": "65f1",
            "quiz_name": "Capitals",
            "quiz_time": "120",
            "questions_and_answers": [
                {"question": "France?", "options": {"A": "Paris", "B": "Lyon"}, "correct_answer": "A"},
                {"question": "Spain?", "options": ["Madrid", "Seville"], "answer": "Madrid"}
            ]
        }"#;

        let quiz = parse_quiz(raw).unwrap();
        assert_eq!(quiz.total_questions(), 2);
        assert_eq!(quiz.quiz_time, Some(serde_json::Value::from("120")));
        assert!(quiz.question(1).unwrap().is_correct("Madrid"));
        assert_eq!(quiz.extra["_id"], "65f1");
    }

    #[test]
    fn test_empty_quiz_rejected() {
        let raw = r#"{"quiz_name": "Empty", "questions_and_answers": []}"#;
        assert!(matches!(parse_quiz(raw), Err(CliError::InvalidQuiz(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = load_quiz(Path::new("/nonexistent/quiz.json")).unwrap_err();
        assert!(matches!(err, CliError::QuizNotFound { .. }));
    }

    #[test]
    fn test_demo_quiz_cycles_bank() {
        let quiz = demo_quiz(7);
        assert_eq!(quiz.total_questions(), 7);
        assert_eq!(quiz.question(5).unwrap().question, quiz.question(0).unwrap().question);
        assert!(quiz.question(3).unwrap().is_correct("D"));
    }

    #[test]
    fn test_sample_file_parses() {
        let raw = include_str!("../../quizzes/sample.json");
        let quiz = parse_quiz(raw).unwrap();
        assert!(quiz.total_questions() >= 3);
    }
}
