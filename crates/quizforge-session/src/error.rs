//! Error types for the session layer.

use quizforge_transport::ConnectionId;

/// Errors that can occur while registering or looking up connections.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Another live connection already holds this name.
    #[error("the name {0:?} is already taken")]
    DuplicateName(String),

    /// The requested name is empty or only whitespace.
    #[error("a player name is required")]
    InvalidName,

    /// No name is registered for this connection. It either never
    /// claimed one or has already been released.
    #[error("no player registered for {0}")]
    NotFound(ConnectionId),

    /// The connection already holds a name. A connection gets exactly one
    /// claim for its whole lifetime.
    #[error("{0} has already claimed a name")]
    AlreadyRegistered(ConnectionId),
}
