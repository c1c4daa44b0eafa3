//! `QuizforgeServer` builder and accept loop.
//!
//! This ties the layers together: transport → handler → orchestrator →
//! room actors.

use std::net::SocketAddr;
use std::sync::Arc;

use quizforge_room::{Orchestrator, QuestionBank, QuizConfig};
use quizforge_transport::{Transport, WebSocketTransport};

use crate::QuizforgeError;
use crate::handler::handle_connection;

/// Sent in a `name_taken` event when a connection asks for a name that
/// is already in use.
pub const NAME_TAKEN_MESSAGE: &str = "This name is already taken. Please choose a different name.";

/// Builder for configuring and starting a quiz server.
///
/// # Example
///
/// ```rust,ignore
/// let server = QuizforgeServer::builder()
///     .bind("0.0.0.0:8080")
///     .quiz_config(config)
///     .build(bank)
///     .await?;
/// server.run().await
/// ```
pub struct QuizforgeServerBuilder {
    bind_addr: String,
    quiz_config: QuizConfig,
}

impl QuizforgeServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            quiz_config: QuizConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the timings and limits every room runs with.
    pub fn quiz_config(mut self, config: QuizConfig) -> Self {
        self.quiz_config = config;
        self
    }

    /// Binds the listener and builds the server around `bank`.
    pub async fn build<B: QuestionBank>(
        self,
        bank: B,
    ) -> Result<QuizforgeServer<B>, QuizforgeError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        let orchestrator = Arc::new(Orchestrator::new(bank, self.quiz_config));

        Ok(QuizforgeServer {
            transport,
            orchestrator,
        })
    }
}

impl Default for QuizforgeServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound quiz server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct QuizforgeServer<B> {
    transport: WebSocketTransport,
    orchestrator: Arc<Orchestrator<B>>,
}

impl<B: QuestionBank> QuizforgeServer<B> {
    /// Creates a new builder.
    pub fn builder() -> QuizforgeServerBuilder {
        QuizforgeServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// The orchestrator every connection is routed through.
    pub fn orchestrator(&self) -> &Arc<Orchestrator<B>> {
        &self.orchestrator
    }

    /// Runs the accept loop, spawning a handler task per connection.
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), QuizforgeError> {
        tracing::info!(addr = ?self.transport.local_addr().ok(), "quiz server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let orchestrator = Arc::clone(&self.orchestrator);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, orchestrator).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
