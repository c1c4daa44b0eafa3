//! Question banks.

use std::path::Path;

use quizforge_protocol::Question;
use rand::seq::SliceRandom;

use crate::RoomError;

/// A source of quiz questions.
///
/// Rooms only ever ask for a batch at game start. Implementations must be
/// shareable across room actors.
pub trait QuestionBank: Send + Sync + 'static {
    /// Returns `count` distinct questions in random order.
    ///
    /// # Errors
    /// Returns [`RoomError::BankExhausted`] if fewer than `count`
    /// questions are available.
    fn draw(&self, count: usize) -> Result<Vec<Question>, RoomError>;

    /// Number of questions available to draw from.
    fn available(&self) -> usize;
}

/// A fixed list of questions held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBank {
    questions: Vec<Question>,
}

impl InMemoryBank {
    /// Builds a bank from `questions`.
    ///
    /// # Errors
    /// Returns [`RoomError::MalformedQuestion`] for the first question
    /// whose correct index is out of range.
    pub fn new(questions: Vec<Question>) -> Result<Self, RoomError> {
        if let Some(bad) = questions.iter().find(|q| !q.is_well_formed()) {
            return Err(RoomError::MalformedQuestion {
                id: bad.id.clone(),
                index: bad.correct_index,
                options: bad.options.len(),
            });
        }
        Ok(Self { questions })
    }

    /// Parses a JSON array of questions:
    ///
    /// ```json
    /// [{"id": "1", "questionText": "2 + 2?", "options": ["3", "4"], "correctIndex": 1}]
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self, RoomError> {
        let questions: Vec<Question> = serde_json::from_str(json)?;
        Self::new(questions)
    }

    /// Reads and parses a JSON question file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RoomError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Number of questions in the bank.
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Returns `true` if the bank holds no questions.
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

impl QuestionBank for InMemoryBank {
    fn draw(&self, count: usize) -> Result<Vec<Question>, RoomError> {
        if count > self.questions.len() {
            return Err(RoomError::BankExhausted {
                requested: count,
                available: self.questions.len(),
            });
        }
        let mut drawn = self.questions.clone();
        drawn.shuffle(&mut rand::rng());
        drawn.truncate(count);
        Ok(drawn)
    }

    fn available(&self) -> usize {
        self.len()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn numbered(n: usize) -> Vec<Question> {
        (0..n)
            .map(|i| Question {
                id: i.to_string(),
                question_text: format!("Question {i}?"),
                options: vec!["yes".into(), "no".into()],
                correct_index: 0,
            })
            .collect()
    }

    #[test]
    fn test_draw_returns_distinct_questions() {
        let bank = InMemoryBank::new(numbered(10)).unwrap();
        let drawn = bank.draw(4).unwrap();

        assert_eq!(drawn.len(), 4);
        let ids: HashSet<_> = drawn.iter().map(|q| q.id.clone()).collect();
        assert_eq!(ids.len(), 4, "no question drawn twice");
    }

    #[test]
    fn test_draw_whole_bank_is_a_permutation() {
        let bank = InMemoryBank::new(numbered(6)).unwrap();
        let mut ids: Vec<String> = bank.draw(6).unwrap().into_iter().map(|q| q.id).collect();
        ids.sort();
        assert_eq!(ids, vec!["0", "1", "2", "3", "4", "5"]);
    }

    #[test]
    fn test_draw_more_than_available_returns_bank_exhausted() {
        let bank = InMemoryBank::new(numbered(2)).unwrap();
        let result = bank.draw(3);
        assert!(matches!(
            result,
            Err(RoomError::BankExhausted {
                requested: 3,
                available: 2
            })
        ));
    }

    #[test]
    fn test_draw_is_shuffled() {
        // A 20-question draw comes back in file order with odds 1/20!.
        let bank = InMemoryBank::new(numbered(20)).unwrap();
        let drawn = bank.draw(20).unwrap();
        let in_order = drawn.iter().enumerate().all(|(i, q)| q.id == i.to_string());
        assert!(!in_order);
    }

    #[test]
    fn test_new_rejects_out_of_range_correct_index() {
        let mut questions = numbered(3);
        questions[1].correct_index = 2;
        let result = InMemoryBank::new(questions);
        assert!(matches!(
            result,
            Err(RoomError::MalformedQuestion { ref id, index: 2, options: 2 }) if id == "1"
        ));
    }

    #[test]
    fn test_from_json_str_reads_question_file_shape() {
        let bank = InMemoryBank::from_json_str(
            r#"[
                {"id": "a", "questionText": "Capital of France?",
                 "options": ["Rome", "Paris"], "correctIndex": 1}
            ]"#,
        )
        .unwrap();
        assert_eq!(bank.len(), 1);
        let q = &bank.draw(1).unwrap()[0];
        assert_eq!(q.correct_option(), Some("Paris"));
    }

    #[test]
    fn test_from_json_str_malformed_returns_bank_format() {
        let result = InMemoryBank::from_json_str(r#"{"not": "a list"}"#);
        assert!(matches!(result, Err(RoomError::BankFormat(_))));
    }

    #[test]
    fn test_from_path_missing_file_returns_bank_io() {
        let result = InMemoryBank::from_path("/definitely/not/here.json");
        assert!(matches!(result, Err(RoomError::BankIo(_))));
    }
}
