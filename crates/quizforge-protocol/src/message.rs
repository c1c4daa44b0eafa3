//! Client commands and server events.
//!
//! Both enums are "adjacently tagged": the variant name becomes `type`
//! (snake_case) and its data becomes `payload`, with camelCase field
//! names:
//!
//! ```text
//! {"type": "answer", "payload": {"gameId": "3f…", "answer": "Paris"}}
//! ```

use serde::{Deserialize, Serialize};

use crate::{RoomId, RoomState, RoomSummary, ScoreEntry};

// ---------------------------------------------------------------------------
// ClientCommand — client → server
// ---------------------------------------------------------------------------

/// Everything a connected player can ask the server to do.
///
/// The sender's identity is never part of the payload; it comes from the
/// connection the command arrived on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Open a new room owned by the sender.
    #[serde(rename_all = "camelCase")]
    Create {
        name: String,
        #[serde(alias = "question_count")]
        question_count: usize,
    },

    /// Join a waiting room.
    #[serde(rename_all = "camelCase")]
    Join { game_id: RoomId },

    /// Start the game (needs at least two players).
    #[serde(rename_all = "camelCase")]
    Start { game_id: RoomId },

    /// Answer the current question with the text of one option.
    #[serde(rename_all = "camelCase")]
    Answer { game_id: RoomId, answer: String },

    /// Leave a room.
    #[serde(rename_all = "camelCase")]
    Leave { game_id: RoomId },

    /// Tear a room down. Only the room owner may do this.
    #[serde(rename_all = "camelCase")]
    Destroy { game_id: RoomId },
}

impl ClientCommand {
    /// The room this command targets, if it targets an existing one.
    pub fn room_id(&self) -> Option<&RoomId> {
        match self {
            Self::Create { .. } => None,
            Self::Join { game_id }
            | Self::Start { game_id }
            | Self::Answer { game_id, .. }
            | Self::Leave { game_id }
            | Self::Destroy { game_id } => Some(game_id),
        }
    }

    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Join { .. } => "join",
            Self::Start { .. } => "start",
            Self::Answer { .. } => "answer",
            Self::Leave { .. } => "leave",
            Self::Destroy { .. } => "destroy",
        }
    }
}

// ---------------------------------------------------------------------------
// ServerEvent — server → client(s)
// ---------------------------------------------------------------------------

/// Why a question's answer was revealed without anyone scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealReason {
    /// The question timer ran out.
    Deadline,
    /// Every eligible player answered wrong before the timer ran out.
    AllIncorrect,
}

/// Sent to a player who created or joined a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinedRoom {
    pub id: RoomId,
    pub name: String,
    pub question_count: usize,
    pub player_count: usize,
    pub state: RoomState,
    pub players: Vec<String>,
}

impl From<&RoomSummary> for JoinedRoom {
    fn from(summary: &RoomSummary) -> Self {
        Self {
            id: summary.id.clone(),
            name: summary.name.clone(),
            question_count: summary.question_count,
            player_count: summary.player_count,
            state: summary.state,
            players: summary.player_names.clone(),
        }
    }
}

/// Sent to a room when its roster grows or shrinks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterChange {
    pub player_name: String,
    pub game_id: RoomId,
    pub player_count: usize,
    pub players: Vec<String>,
    pub message: String,
}

/// Everything the server pushes to clients.
///
/// The doc line on each variant names who receives it: **everyone**
/// connected, the **room** roster, or just the **sender** of the command
/// that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Sender: name accepted, connection is live.
    #[serde(rename_all = "camelCase")]
    ConnectionSuccess { player_name: String },

    /// Sender: name rejected during the handshake. The connection closes.
    NameTaken { message: String },

    /// Everyone: the names of all connected players.
    #[serde(rename_all = "camelCase")]
    PlayerConnected { connected_players: Vec<String> },

    /// Everyone: a room was created.
    GameCreate(RoomSummary),

    /// Everyone: a room's roster, state, or winner changed.
    GameUpdate(RoomSummary),

    /// Everyone: a room is gone.
    #[serde(rename_all = "camelCase")]
    GameDestroy { game_id: RoomId },

    /// Everyone: the full list of live rooms.
    GameListUpdate(Vec<RoomSummary>),

    /// Sender: you are in this room now.
    GameJoined(JoinedRoom),

    /// Sender: the join was refused.
    GameJoinFailed { message: String },

    /// Sender: you left this room.
    #[serde(rename_all = "camelCase")]
    GameLeft { game_id: RoomId },

    /// Room: someone joined.
    PlayerJoined(RosterChange),

    /// Room: someone left or disconnected.
    PlayerLeft(RosterChange),

    /// Room: the countdown is about to begin.
    #[serde(rename_all = "camelCase")]
    GameStart { game_id: RoomId, players: Vec<String> },

    /// Room: one countdown tick (3, 2, 1, 0).
    #[serde(rename_all = "camelCase")]
    Countdown { game_id: RoomId, countdown: u32 },

    /// Room: a new question. Never carries the correct answer.
    #[serde(rename_all = "camelCase")]
    Question {
        game_id: RoomId,
        question_index: usize,
        total_questions: usize,
        question: String,
        options: Vec<String>,
    },

    /// Room: someone answered correctly and scored.
    #[serde(rename_all = "camelCase")]
    CorrectAnswer {
        player_name: String,
        game_id: RoomId,
        correct_answer: String,
        scores: Vec<ScoreEntry>,
    },

    /// Room: someone answered wrong and is out for this question.
    #[serde(rename_all = "camelCase")]
    IncorrectAnswer { player_name: String, game_id: RoomId },

    /// Room: the question closed without a winner.
    #[serde(rename_all = "camelCase")]
    TimeUp {
        game_id: RoomId,
        correct_answer: String,
        reason: RevealReason,
    },

    /// Room: final scores.
    #[serde(rename_all = "camelCase")]
    GameEnd {
        game_id: RoomId,
        scores: Vec<ScoreEntry>,
        winner: Option<String>,
    },

    /// Room: the owner tore the room down.
    #[serde(rename_all = "camelCase")]
    GameDestroyed { game_id: RoomId, message: String },

    /// Sender: the command could not be carried out.
    Error { message: String },
}

impl ServerEvent {
    /// Builds an [`ServerEvent::Error`] from anything printable.
    pub fn error(message: impl ToString) -> Self {
        Self::Error {
            message: message.to_string(),
        }
    }

    /// The wire `type` tag, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConnectionSuccess { .. } => "connection_success",
            Self::NameTaken { .. } => "name_taken",
            Self::PlayerConnected { .. } => "player_connected",
            Self::GameCreate(_) => "game_create",
            Self::GameUpdate(_) => "game_update",
            Self::GameDestroy { .. } => "game_destroy",
            Self::GameListUpdate(_) => "game_list_update",
            Self::GameJoined(_) => "game_joined",
            Self::GameJoinFailed { .. } => "game_join_failed",
            Self::GameLeft { .. } => "game_left",
            Self::PlayerJoined(_) => "player_joined",
            Self::PlayerLeft(_) => "player_left",
            Self::GameStart { .. } => "game_start",
            Self::Countdown { .. } => "countdown",
            Self::Question { .. } => "question",
            Self::CorrectAnswer { .. } => "correct_answer",
            Self::IncorrectAnswer { .. } => "incorrect_answer",
            Self::TimeUp { .. } => "time_up",
            Self::GameEnd { .. } => "game_end",
            Self::GameDestroyed { .. } => "game_destroyed",
            Self::Error { .. } => "error",
        }
    }
}
