//! Core data types shared by the server and its clients.
//!
//! Everything here is plain data: identifiers, quiz questions, the room
//! lifecycle state, and the summaries that lobby lists are built from.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a room (one quiz session).
///
/// Newtype over the string clients see, so a room id can't be mixed up
/// with a player name even though both are strings underneath.
/// `#[serde(transparent)]` keeps it a bare JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Wraps an existing id string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Question
// ---------------------------------------------------------------------------

/// One quiz item as stored in a question bank.
///
/// The field names follow the question files clients already author
/// (`questionText`, `correctIndex`). A `Question` is never sent to players
/// as-is: the `question` event carries only the text and the options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub question_text: String,
    pub options: Vec<String>,
    pub correct_index: usize,
}

impl Question {
    /// The text of the correct option, or `None` if `correct_index` is out
    /// of range.
    pub fn correct_option(&self) -> Option<&str> {
        self.options.get(self.correct_index).map(String::as_str)
    }

    /// Returns `true` if `answer` is exactly the correct option's text.
    pub fn is_correct(&self, answer: &str) -> bool {
        self.correct_option() == Some(answer)
    }

    /// Returns `true` if `correct_index` points at one of the options.
    pub fn is_well_formed(&self) -> bool {
        self.correct_index < self.options.len()
    }
}

// ---------------------------------------------------------------------------
// RoomState
// ---------------------------------------------------------------------------

/// The lifecycle state of a room.
///
/// ```text
/// Waiting → Countdown → Question ⟲ → Ended
/// ```
///
/// - **Waiting**: accepting joins; the owner may start once two players
///   are in.
/// - **Countdown**: questions are drawn, a 3-2-1-0 countdown is running.
/// - **Question**: a question is being asked, revealed, or the room is
///   in the grace period before the next one. Re-entered once per
///   question.
/// - **Ended**: final scores are out. Terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomState {
    Waiting,
    Countdown,
    Question,
    Ended,
}

impl RoomState {
    /// Returns `true` if the room is accepting new players.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// Returns `true` if moving from `self` to `target` is a legal
    /// transition.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Waiting, Self::Countdown)
                | (Self::Countdown, Self::Question)
                | (Self::Question, Self::Question)
                | (Self::Question, Self::Ended)
        )
    }
}

impl fmt::Display for RoomState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Countdown => write!(f, "countdown"),
            Self::Question => write!(f, "question"),
            Self::Ended => write!(f, "ended"),
        }
    }
}

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

/// A room as it appears in lobby lists and global room notices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub id: RoomId,
    pub name: String,
    pub question_count: usize,
    pub state: RoomState,
    /// Roster in join order; the first entry owns the room.
    pub player_names: Vec<String>,
    pub player_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
}

/// One line of a score table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub name: String,
    pub score: u32,
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;

    fn question() -> Question {
        Question {
            id: "q1".into(),
            question_text: "2 + 2?".into(),
            options: vec!["3".into(), "4".into(), "5".into()],
            correct_index: 1,
        }
    }

    #[test]
    fn test_room_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&RoomId::new("abc")).unwrap();
        assert_eq!(json, "\"abc\"");
    }

    #[test]
    fn test_room_id_display() {
        assert_eq!(RoomId::new("abc").to_string(), "abc");
    }

    #[test]
    fn test_question_correct_option() {
        assert_eq!(question().correct_option(), Some("4"));
        assert!(question().is_correct("4"));
        assert!(!question().is_correct("3"));
        assert!(!question().is_correct(" 4"), "comparison is exact");
    }

    #[test]
    fn test_question_out_of_range_index_is_not_well_formed() {
        let q = Question {
            correct_index: 3,
            ..question()
        };
        assert!(!q.is_well_formed());
        assert_eq!(q.correct_option(), None);
        assert!(!q.is_correct("4"));
    }

    #[test]
    fn test_question_reads_question_file_shape() {
        let q: Question = serde_json::from_str(
            r#"{"id":"q1","questionText":"2 + 2?","options":["3","4","5"],"correctIndex":1}"#,
        )
        .unwrap();
        assert_eq!(q, question());
    }

    #[test]
    fn test_room_state_serializes_lowercase() {
        let json = serde_json::to_string(&RoomState::Countdown).unwrap();
        assert_eq!(json, "\"countdown\"");
        assert_eq!(RoomState::Ended.to_string(), "ended");
    }

    #[test]
    fn test_room_state_transitions() {
        let (w, c, q, e) = (
            RoomState::Waiting,
            RoomState::Countdown,
            RoomState::Question,
            RoomState::Ended,
        );
        assert!(w.can_transition_to(c));
        assert!(c.can_transition_to(q));
        assert!(q.can_transition_to(q));
        assert!(q.can_transition_to(e));
        assert!(!w.can_transition_to(q));
        assert!(!e.can_transition_to(w));
        assert!(!c.can_transition_to(w));
    }

    #[test]
    fn test_room_state_only_waiting_is_joinable() {
        assert!(RoomState::Waiting.is_joinable());
        assert!(!RoomState::Countdown.is_joinable());
        assert!(!RoomState::Question.is_joinable());
        assert!(!RoomState::Ended.is_joinable());
    }

    #[test]
    fn test_room_summary_json_shape() {
        let summary = RoomSummary {
            id: RoomId::new("r1"),
            name: "Quiz".into(),
            question_count: 2,
            state: RoomState::Waiting,
            player_names: vec!["ann".into()],
            player_count: 1,
            winner: None,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["id"], "r1");
        assert_eq!(json["questionCount"], 2);
        assert_eq!(json["state"], "waiting");
        assert_eq!(json["playerNames"][0], "ann");
        assert_eq!(json["playerCount"], 1);
        assert!(json.get("winner").is_none(), "no winner key before the end");
    }
}
