//! Unified error type for the quiz server.

use quizforge_protocol::ProtocolError;
use quizforge_room::RoomError;
use quizforge_session::SessionError;
use quizforge_transport::TransportError;

/// Top-level error that wraps every crate-specific error, so `?` works
/// across layers.
#[derive(Debug, thiserror::Error)]
pub enum QuizforgeError {
    /// Binding, accepting, sending, or receiving failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A frame could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The connection's name was rejected.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room operation or question bank load failed.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// Reading a config file failed.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A required setting is missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),
}
