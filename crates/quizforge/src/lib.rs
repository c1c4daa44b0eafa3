//! # Quizforge
//!
//! Real-time multiplayer quiz rooms over WebSockets.
//!
//! Players connect with a unique name (`ws://host/?name=Alice`), create or
//! join rooms, and race to answer timed multiple-choice questions. Each
//! room is an actor task that runs its own countdown, question deadlines,
//! and scoring; the server just wires sockets to it.
//!
//! ```text
//! WebSocket ─→ handler ─→ Orchestrator ─→ RoomHandle ─→ room actor
//!     ↑                                                     │
//!     └────────────── outbox ←── Broadcaster ←──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quizforge::prelude::*;
//!
//! # async fn run() -> Result<(), QuizforgeError> {
//! let bank = InMemoryBank::from_path("questions.json")?;
//! let server = QuizforgeServer::<InMemoryBank>::builder()
//!     .bind("0.0.0.0:8080")
//!     .build(bank)
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::QuizforgeError;
pub use server::{QuizforgeServer, QuizforgeServerBuilder, NAME_TAKEN_MESSAGE};

/// Everything needed to run a quiz server and talk to it in tests.
pub mod prelude {
    pub use crate::{QuizforgeError, QuizforgeServer, QuizforgeServerBuilder, NAME_TAKEN_MESSAGE};
    pub use quizforge_protocol::{
        ClientCommand, Codec, JsonCodec, Question, RevealReason, RoomId, RoomState,
        RoomSummary, ScoreEntry, ServerEvent,
    };
    pub use quizforge_room::{InMemoryBank, Orchestrator, QuestionBank, QuizConfig, RoomError};
    pub use quizforge_session::SessionError;
    pub use quizforge_transport::{ConnectionId, TransportError};
}
