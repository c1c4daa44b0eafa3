//! Wire protocol for Quizforge.
//!
//! This crate defines the "language" that quiz clients and the server
//! speak:
//!
//! - **Types** ([`RoomId`], [`Question`], [`RoomState`], [`RoomSummary`]) —
//!   the data that rooms are made of and that lobby lists show.
//! - **Messages** ([`ClientCommand`], [`ServerEvent`]) — what a client may
//!   ask for, and what the server pushes back.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! Every message on the wire has the shape
//! `{"type": "<snake_case_name>", "payload": {...}}`.
//!
//! ```text
//! Transport (bytes) → Protocol (ClientCommand / ServerEvent) → Rooms
//! ```

mod codec;
mod error;
mod message;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use message::{
    ClientCommand, JoinedRoom, RevealReason, RosterChange, ServerEvent,
};
pub use types::{Question, RoomId, RoomState, RoomSummary, ScoreEntry};
