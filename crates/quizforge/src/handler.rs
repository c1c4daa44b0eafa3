//! Per-connection handler: name claim, then event pumping.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Claim the name from the upgrade URL, or send `name_taken` and close
//!   2. Loop: inbound frames go to the orchestrator, outbox events go to
//!      the socket
//!   3. On exit, release the name and pull the player out of their rooms

use std::sync::Arc;

use quizforge_protocol::{Codec, JsonCodec, ServerEvent};
use quizforge_room::{Orchestrator, QuestionBank};
use quizforge_session::SessionError;
use quizforge_transport::{Connection, ConnectionId, WebSocketConnection};
use tokio::sync::mpsc;

use crate::QuizforgeError;
use crate::server::NAME_TAKEN_MESSAGE;

/// Drop guard that disconnects the player when the handler exits.
///
/// Runs even if the handler errors out or panics. `Drop` is synchronous,
/// so the async disconnect is spawned fire-and-forget.
struct DisconnectGuard<B: QuestionBank> {
    conn_id: ConnectionId,
    orchestrator: Arc<Orchestrator<B>>,
}

impl<B: QuestionBank> Drop for DisconnectGuard<B> {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let orchestrator = Arc::clone(&self.orchestrator);
        tokio::spawn(async move {
            orchestrator.disconnect(conn_id).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<B: QuestionBank>(
    conn: WebSocketConnection,
    orchestrator: Arc<Orchestrator<B>>,
) -> Result<(), QuizforgeError> {
    let conn_id = conn.id();
    let codec = JsonCodec;
    let name = conn.requested_name().unwrap_or_default().to_owned();
    tracing::debug!(%conn_id, player = %name, "handling new connection");

    // --- Step 1: Claim the name ---
    let (outbox, mut events) = mpsc::unbounded_channel();
    if let Err(err) = orchestrator.connect(conn_id, &name, outbox).await {
        tracing::info!(%conn_id, player = %name, %err, "connection rejected");
        send_event(&conn, &codec, &rejection(&err)).await?;
        conn.close().await?;
        return Err(err.into());
    }
    let _guard = DisconnectGuard {
        conn_id,
        orchestrator: Arc::clone(&orchestrator),
    };
    tracing::info!(%conn_id, player = %name, "player connected");

    // --- Step 2: Pump frames both ways ---
    loop {
        tokio::select! {
            frame = conn.recv() => match frame {
                Ok(Some(data)) => orchestrator.handle_raw(conn_id, &data).await,
                Ok(None) => {
                    tracing::info!(%conn_id, player = %name, "connection closed cleanly");
                    break;
                }
                Err(e) => {
                    tracing::debug!(%conn_id, player = %name, error = %e, "recv error");
                    break;
                }
            },
            event = events.recv() => match event {
                Some(event) => send_event(&conn, &codec, &event).await?,
                // The registry dropped our outbox: the name was released.
                None => break,
            },
        }
    }

    // _guard drops here → disconnect fires.
    Ok(())
}

/// The event a client gets when its name can't be claimed.
fn rejection(err: &SessionError) -> ServerEvent {
    match err {
        SessionError::DuplicateName(_) => ServerEvent::NameTaken {
            message: NAME_TAKEN_MESSAGE.to_owned(),
        },
        other => ServerEvent::error(other),
    }
}

async fn send_event(
    conn: &WebSocketConnection,
    codec: &impl Codec,
    event: &ServerEvent,
) -> Result<(), QuizforgeError> {
    let bytes = codec.encode(event)?;
    conn.send(&bytes).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_name_is_rejected_with_name_taken() {
        let event = rejection(&SessionError::DuplicateName("ann".into()));
        assert_eq!(
            event,
            ServerEvent::NameTaken {
                message: NAME_TAKEN_MESSAGE.into()
            }
        );
    }

    #[test]
    fn test_missing_name_is_rejected_with_error() {
        let event = rejection(&SessionError::InvalidName);
        assert_eq!(event, ServerEvent::error("a player name is required"));
    }
}
