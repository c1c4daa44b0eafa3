//! The orchestrator: the entry point for everything a connection does.
//!
//! ```text
//! connect ──→ handle / handle_raw (×N) ──→ disconnect
//!                    │
//!                    ├─ create ──→ RoomDirectory::create (spawns an actor)
//!                    └─ join/start/answer/leave/destroy ──→ RoomHandle
//! ```
//!
//! The orchestrator resolves *who* (registry) and *which room*
//! (directory), then hands the command to that room's actor and returns.
//! It never holds the registry or directory lock while talking to an
//! actor.

use std::sync::Arc;

use quizforge_protocol::{
    ClientCommand, Codec, JoinedRoom, JsonCodec, RoomSummary, ServerEvent,
};
use quizforge_session::{Broadcaster, ConnectionRegistry, Outbox, SessionError, SharedRegistry};
use quizforge_transport::ConnectionId;

use crate::room::RoomContext;
use crate::{QuestionBank, QuizConfig, RoomDirectory, RoomError};

/// Routes connection lifecycle and player commands to rooms.
pub struct Orchestrator<B> {
    ctx: RoomContext<B>,
    registry: SharedRegistry,
    directory: RoomDirectory,
    codec: JsonCodec,
}

impl<B: QuestionBank> Orchestrator<B> {
    /// Creates an orchestrator with a fresh registry and directory.
    pub fn new(bank: B, config: QuizConfig) -> Self {
        Self::with_registry(ConnectionRegistry::shared(), bank, config)
    }

    /// Creates an orchestrator over an existing registry.
    pub fn with_registry(registry: SharedRegistry, bank: B, config: QuizConfig) -> Self {
        let broadcaster = Broadcaster::new(Arc::clone(&registry));
        Self {
            ctx: RoomContext::new(config, Arc::new(bank), broadcaster),
            registry,
            directory: RoomDirectory::new(),
            codec: JsonCodec,
        }
    }

    /// The connection registry.
    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// The room directory.
    pub fn directory(&self) -> &RoomDirectory {
        &self.directory
    }

    /// The (validated) quiz config every room runs with.
    pub fn config(&self) -> &QuizConfig {
        self.ctx.config()
    }

    /// Summaries of every live room, oldest first.
    pub async fn list_open(&self) -> Vec<RoomSummary> {
        self.directory.list_open().await
    }

    // -- Connection lifecycle ----------------------------------------------

    /// Registers a new connection under `name` and onboards it.
    ///
    /// On success the connection gets `connection_success`, and everyone
    /// gets the room list and the connected-player list.
    ///
    /// # Errors
    /// Returns the registry's [`SessionError`] if the name is blank or
    /// taken. Nothing is sent in that case.
    pub async fn connect(
        &self,
        conn: ConnectionId,
        name: &str,
        outbox: Outbox,
    ) -> Result<(), SessionError> {
        self.registry.lock().await.claim(conn, name, outbox)?;

        self.broadcaster()
            .to_connection(
                conn,
                &ServerEvent::ConnectionSuccess {
                    player_name: name.to_owned(),
                },
            )
            .await;
        self.broadcast_room_list().await;
        self.broadcast_connected_players().await;
        Ok(())
    }

    /// Removes `conn`'s player from every room, then releases its name.
    ///
    /// The leaves are queued before the name is freed, so a reconnect
    /// under the same name always lands behind them.
    pub async fn disconnect(&self, conn: ConnectionId) {
        let lookup = self.registry.lock().await.name_of(conn).map(str::to_owned);
        let name = match lookup {
            Ok(name) => name,
            Err(err) => {
                tracing::debug!(conn_id = %conn, %err, "disconnect for unregistered connection");
                return;
            }
        };

        // Rooms the player isn't in ignore the leave.
        for handle in self.directory.handles().await {
            if let Err(err) = handle.leave(name.clone(), None).await {
                tracing::debug!(room_id = %handle.room_id(), %err, "room gone before leave");
            }
        }

        let released = self.registry.lock().await.release(conn);
        if let Err(err) = released {
            tracing::debug!(conn_id = %conn, %err, "connection released twice");
            return;
        }
        tracing::info!(conn_id = %conn, player = %name, "player released");
        self.broadcast_connected_players().await;
    }

    // -- Commands ----------------------------------------------------------

    /// Decodes a raw frame and handles it. Frames that don't decode get an
    /// `error` event back.
    pub async fn handle_raw(&self, conn: ConnectionId, data: &[u8]) {
        match self.codec.decode::<ClientCommand>(data) {
            Ok(cmd) => self.handle(conn, cmd).await,
            Err(err) => {
                tracing::debug!(conn_id = %conn, %err, "undecodable command");
                self.broadcaster()
                    .to_connection(conn, &ServerEvent::error(format!("Invalid message: {err}")))
                    .await;
            }
        }
    }

    /// Handles one command from `conn`.
    ///
    /// Failures are reported to `conn` only: `game_join_failed` for a
    /// missing or started room on `join`, `error` otherwise.
    pub async fn handle(&self, conn: ConnectionId, cmd: ClientCommand) {
        let lookup = self.registry.lock().await.name_of(conn).map(str::to_owned);
        let player = match lookup {
            Ok(player) => player,
            Err(err) => {
                tracing::debug!(conn_id = %conn, %err, command = cmd.kind(), "command from unregistered connection");
                return;
            }
        };

        let kind = cmd.kind();
        tracing::debug!(
            conn_id = %conn,
            %player,
            command = kind,
            room_id = ?cmd.room_id(),
            "command received"
        );

        let joining = matches!(cmd, ClientCommand::Join { .. });
        if let Err(err) = self.dispatch(conn, &player, cmd).await {
            tracing::debug!(conn_id = %conn, %player, command = kind, %err, "command failed");
            let event = if joining {
                err.join_failure()
            } else {
                err.to_event()
            };
            self.broadcaster().to_connection(conn, &event).await;
        }
    }

    async fn dispatch(
        &self,
        conn: ConnectionId,
        player: &str,
        cmd: ClientCommand,
    ) -> Result<(), RoomError> {
        match cmd {
            ClientCommand::Create {
                name,
                question_count,
            } => self.create(conn, player, name, question_count).await,
            ClientCommand::Join { game_id } => {
                self.directory.find(&game_id).await?.join(player, conn).await
            }
            ClientCommand::Start { game_id } => {
                self.directory.find(&game_id).await?.start(player, conn).await
            }
            ClientCommand::Answer { game_id, answer } => {
                self.directory.find(&game_id).await?.answer(player, answer).await
            }
            ClientCommand::Leave { game_id } => {
                self.directory
                    .find(&game_id)
                    .await?
                    .leave(player, Some(conn))
                    .await
            }
            ClientCommand::Destroy { game_id } => {
                self.directory.find(&game_id).await?.destroy(player, conn).await
            }
        }
    }

    async fn create(
        &self,
        conn: ConnectionId,
        owner: &str,
        name: String,
        question_count: usize,
    ) -> Result<(), RoomError> {
        if name.trim().is_empty() {
            return Err(RoomError::InvalidRequest("A game name is required".to_owned()));
        }
        let max = self.config().max_question_count;
        if !(1..=max).contains(&question_count) {
            return Err(RoomError::InvalidRequest(format!(
                "Question count must be between 1 and {max}"
            )));
        }

        let summary = self
            .directory
            .create(name, question_count, owner, &self.ctx)
            .await;

        let broadcaster = self.broadcaster();
        broadcaster
            .to_connection(conn, &ServerEvent::GameJoined(JoinedRoom::from(&summary)))
            .await;
        broadcaster
            .to_everyone(&ServerEvent::GameCreate(summary))
            .await;
        self.broadcast_room_list().await;
        Ok(())
    }

    // -- Helpers -----------------------------------------------------------

    fn broadcaster(&self) -> &Broadcaster {
        self.ctx.broadcaster()
    }

    async fn broadcast_room_list(&self) {
        let rooms = self.directory.list_open().await;
        self.broadcaster()
            .to_everyone(&ServerEvent::GameListUpdate(rooms))
            .await;
    }

    async fn broadcast_connected_players(&self) {
        let connected_players = self.registry.lock().await.connected_names();
        self.broadcaster()
            .to_everyone(&ServerEvent::PlayerConnected { connected_players })
            .await;
    }
}
