//! Player identity and event delivery for Quizforge.
//!
//! This crate answers two questions for the layers above it:
//!
//! 1. **Who is this connection?** The [`ConnectionRegistry`] maps each
//!    live [`ConnectionId`](quizforge_transport::ConnectionId) to the
//!    unique player name it claimed, and back.
//! 2. **How do I reach them?** The [`Broadcaster`] pushes a
//!    [`ServerEvent`](quizforge_protocol::ServerEvent) to everyone, to a
//!    room's roster, or to a single connection.
//!
//! # How it fits in the stack
//!
//! ```text
//! Room Layer (above)     ← looks up names, fans room events out
//!     ↕
//! Session Layer (this crate)
//!     ↕
//! Transport / Protocol (below)  ← ConnectionId, ServerEvent
//! ```
//!
//! Delivery never touches a socket. Each connection registers an
//! unbounded outbox channel; its handler task drains the outbox onto the
//! wire. A slow or dead client therefore can't stall a room.

mod broadcast;
mod error;
mod registry;

pub use broadcast::{Broadcaster, Delivery};
pub use error::SessionError;
pub use registry::{ConnectionRegistry, Outbox, SharedRegistry};
