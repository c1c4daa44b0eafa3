//! Quiz rooms for Quizforge.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns its
//! roster, scores, drawn questions, and a single phase timer. The
//! [`Orchestrator`] sits in front of all of them and turns player
//! commands into room commands.
//!
//! # Key types
//!
//! - [`Orchestrator`] — connection lifecycle and command routing
//! - [`RoomDirectory`] — every live room, with its latest summary
//! - [`RoomHandle`] — send commands to a running room actor
//! - [`QuestionBank`] / [`InMemoryBank`] — where questions come from
//! - [`QuizConfig`] — timings and limits
//!
//! # A room's life
//!
//! ```text
//! create ─→ Waiting ─start─→ Countdown (3, 2, 1, 0)
//!                               │
//!                               ▼
//!                  ┌──────→ Question ── correct answer / all wrong / 10 s
//!                  │            │
//!                  └── 3 s ─────┘  (until the drawn questions run out)
//!                               │
//!                               ▼
//!                             Ended ── linger ──→ removed
//! ```

mod bank;
mod config;
mod directory;
mod error;
mod orchestrator;
mod resolver;
mod room;

pub use bank::{InMemoryBank, QuestionBank};
pub use config::QuizConfig;
pub use directory::RoomDirectory;
pub use error::RoomError;
pub use orchestrator::Orchestrator;
pub use room::{RoomContext, RoomHandle};
