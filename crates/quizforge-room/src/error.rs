//! Error types for the room layer.
//!
//! Every variant's `Display` text is written for players: the orchestrator
//! sends it back verbatim in an `error` event.

use quizforge_protocol::{RoomId, RoomState, ServerEvent};

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist (never did, or has been removed).
    #[error("Game not found")]
    NotFound(RoomId),

    /// The room is in a state that doesn't allow this operation.
    #[error("Cannot {action} while the game is {state}")]
    InvalidState {
        state: RoomState,
        action: &'static str,
    },

    /// The player is not on the room's roster.
    #[error("{player} is not in this game")]
    NotInRoom { player: String, room: RoomId },

    /// Only the room owner (first on the roster) may do this.
    #[error("Only the game creator can {action} the game")]
    NotOwner { room: RoomId, action: &'static str },

    /// The question bank can't supply as many questions as the room asked
    /// for. The room stays in `waiting`.
    #[error("Not enough questions: {requested} requested, {available} available")]
    BankExhausted { requested: usize, available: usize },

    /// The command's parameters are out of range.
    #[error("{0}")]
    InvalidRequest(String),

    /// A question file could not be read.
    #[error("failed to read question file: {0}")]
    BankIo(#[from] std::io::Error),

    /// A question file is not a valid JSON question list.
    #[error("malformed question file: {0}")]
    BankFormat(#[from] serde_json::Error),

    /// A question's `correctIndex` doesn't point at one of its options.
    #[error("question {id} has correct index {index} but only {options} options")]
    MalformedQuestion {
        id: String,
        index: usize,
        options: usize,
    },
}

impl RoomError {
    /// The event sent to a player whose `join` failed.
    ///
    /// A missing room and a room that has already started get the
    /// dedicated `game_join_failed` event; anything else is a plain
    /// `error`.
    pub fn join_failure(&self) -> ServerEvent {
        match self {
            Self::NotFound(_) => ServerEvent::GameJoinFailed {
                message: "Game not found".to_owned(),
            },
            Self::InvalidState { .. } => ServerEvent::GameJoinFailed {
                message: "Game has already started".to_owned(),
            },
            other => other.to_event(),
        }
    }

    /// The `error` event describing this failure.
    pub fn to_event(&self) -> ServerEvent {
        ServerEvent::error(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_failure_not_found_is_game_join_failed() {
        let event = RoomError::NotFound(RoomId::new("r1")).join_failure();
        assert_eq!(
            event,
            ServerEvent::GameJoinFailed {
                message: "Game not found".into()
            }
        );
    }

    #[test]
    fn test_join_failure_started_room_is_game_join_failed() {
        let err = RoomError::InvalidState {
            state: RoomState::Question,
            action: "join",
        };
        assert_eq!(
            err.join_failure(),
            ServerEvent::GameJoinFailed {
                message: "Game has already started".into()
            }
        );
    }

    #[test]
    fn test_join_failure_other_errors_are_plain_errors() {
        let err = RoomError::InvalidRequest("nope".into());
        assert_eq!(err.join_failure(), ServerEvent::error("nope"));
    }

    #[test]
    fn test_to_event_uses_display_text() {
        let err = RoomError::NotOwner {
            room: RoomId::new("r1"),
            action: "destroy",
        };
        assert_eq!(
            err.to_event(),
            ServerEvent::error("Only the game creator can destroy the game")
        );
    }
}
