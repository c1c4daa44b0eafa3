//! Room actor: an isolated Tokio task that owns one quiz session.
//!
//! Each room runs in its own task and talks to the outside world through
//! an mpsc channel. Player commands and the room's own timer are the only
//! two things that can change a room, and the actor loop takes them one
//! at a time:
//!
//! ```text
//!            ┌──────────── RoomActor::run ────────────┐
//! commands ─→│ select! { receiver.recv(), timer.fired() } │─→ events
//!            └────────────────────────────────────────┘
//! ```
//!
//! A question deadline firing is handled exactly like an answer arriving,
//! so "who was first" is decided by the order the actor dequeues them.

use std::sync::Arc;

use quizforge_protocol::{
    JoinedRoom, Question, RevealReason, RoomId, RoomState, RoomSummary, RosterChange,
    ServerEvent,
};
use quizforge_session::Broadcaster;
use quizforge_timer::PhaseTimer;
use quizforge_transport::ConnectionId;
use tokio::sync::{mpsc, oneshot};

use crate::resolver::{self, Outcome, Player, Round, RoundStatus};
use crate::{QuestionBank, QuizConfig, RoomDirectory, RoomError};

/// Message sent to every remaining player when the owner destroys a room.
const DESTROYED_MESSAGE: &str = "The game has been destroyed by the creator.";

// ---------------------------------------------------------------------------
// Commands and handle
// ---------------------------------------------------------------------------

/// Commands sent to a room actor through its channel.
///
/// Replies to the requesting player go straight to their connection
/// (`conn`) as events, so callers never wait on the room.
#[derive(Debug)]
pub(crate) enum RoomCommand {
    Join {
        player: String,
        conn: ConnectionId,
    },
    Start {
        player: String,
        conn: ConnectionId,
    },
    Answer {
        player: String,
        answer: String,
    },
    /// `conn` is `None` when the player disconnected and there is nobody
    /// left to confirm the leave to.
    Leave {
        player: String,
        conn: Option<ConnectionId>,
    },
    Destroy {
        player: String,
        conn: ConnectionId,
    },
    Summary {
        reply: oneshot::Sender<RoomSummary>,
    },
}

/// Handle to a running room actor.
///
/// Cheap to clone: it's an `mpsc::Sender` plus the room id. Every method
/// returns once the command is queued; results reach players as events.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// The room's id.
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Returns `true` once the actor has exited.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Asks the room to add `player`.
    pub async fn join(&self, player: impl Into<String>, conn: ConnectionId) -> Result<(), RoomError> {
        self.send(RoomCommand::Join {
            player: player.into(),
            conn,
        })
        .await
    }

    /// Asks the room to start its game.
    pub async fn start(&self, player: impl Into<String>, conn: ConnectionId) -> Result<(), RoomError> {
        self.send(RoomCommand::Start {
            player: player.into(),
            conn,
        })
        .await
    }

    /// Submits an answer to the current question.
    pub async fn answer(
        &self,
        player: impl Into<String>,
        answer: impl Into<String>,
    ) -> Result<(), RoomError> {
        self.send(RoomCommand::Answer {
            player: player.into(),
            answer: answer.into(),
        })
        .await
    }

    /// Removes `player` from the room. Pass `None` for `conn` when the
    /// player has disconnected.
    pub async fn leave(
        &self,
        player: impl Into<String>,
        conn: Option<ConnectionId>,
    ) -> Result<(), RoomError> {
        self.send(RoomCommand::Leave {
            player: player.into(),
            conn,
        })
        .await
    }

    /// Asks the room to tear itself down. Only honoured for the owner.
    pub async fn destroy(&self, player: impl Into<String>, conn: ConnectionId) -> Result<(), RoomError> {
        self.send(RoomCommand::Destroy {
            player: player.into(),
            conn,
        })
        .await
    }

    /// Fetches the room's current summary straight from the actor.
    pub async fn summary(&self) -> Result<RoomSummary, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Summary { reply: reply_tx }).await?;
        reply_rx
            .await
            .map_err(|_| RoomError::NotFound(self.room_id.clone()))
    }

    /// A closed channel means the actor has exited, i.e. the room is gone.
    async fn send(&self, cmd: RoomCommand) -> Result<(), RoomError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| RoomError::NotFound(self.room_id.clone()))
    }
}

// ---------------------------------------------------------------------------
// Shared context
// ---------------------------------------------------------------------------

/// What every room actor on a server shares: timing config, the question
/// bank, and the way out to players.
pub struct RoomContext<B> {
    config: Arc<QuizConfig>,
    bank: Arc<B>,
    broadcaster: Broadcaster,
}

impl<B> RoomContext<B> {
    pub fn new(config: QuizConfig, bank: Arc<B>, broadcaster: Broadcaster) -> Self {
        Self {
            config: Arc::new(config.validated()),
            bank,
            broadcaster,
        }
    }

    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    pub fn bank(&self) -> &B {
        &self.bank
    }

    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }
}

// `B` itself needn't be `Clone`; only the `Arc` is cloned.
impl<B> Clone for RoomContext<B> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            bank: Arc::clone(&self.bank),
            broadcaster: self.broadcaster.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

/// Where the room is in its lifecycle, with the data only that phase has.
#[derive(Debug)]
enum Phase {
    Waiting,
    /// `next` is the value the next tick will announce.
    Countdown { next: u32 },
    Question(Round),
    Ended,
}

impl Phase {
    fn state(&self) -> RoomState {
        match self {
            Self::Waiting => RoomState::Waiting,
            Self::Countdown { .. } => RoomState::Countdown,
            Self::Question(_) => RoomState::Question,
            Self::Ended => RoomState::Ended,
        }
    }
}

/// What the room's single timer is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Alarm {
    CountdownTick,
    QuestionDeadline { cursor: usize },
    Grace,
    PostGame,
}

/// One unit of work for the actor loop.
enum Trigger {
    Command(Option<RoomCommand>),
    Alarm(Alarm),
}

/// Whether the actor keeps running after handling a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Close,
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor<B> {
    id: RoomId,
    name: String,
    question_count: usize,
    /// Join order. The first entry owns the room.
    roster: Vec<Player>,
    phase: Phase,
    questions: Vec<Question>,
    /// Index of the question most recently asked.
    cursor: Option<usize>,
    winner: Option<String>,
    timer: PhaseTimer<Alarm>,
    ctx: RoomContext<B>,
    directory: RoomDirectory,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl<B: QuestionBank> RoomActor<B> {
    /// Runs the actor loop until the room is destroyed, emptied, or
    /// retired after its game.
    async fn run(mut self) {
        tracing::info!(room_id = %self.id, name = %self.name, "room actor started");

        loop {
            let trigger = tokio::select! {
                cmd = self.receiver.recv() => Trigger::Command(cmd),
                fired = self.timer.fired() => {
                    tracing::trace!(
                        room_id = %self.id,
                        alarm = ?fired.kind,
                        generation = fired.generation,
                        late_by = ?fired.late_by,
                        "alarm fired"
                    );
                    Trigger::Alarm(fired.kind)
                }
            };

            let flow = match trigger {
                Trigger::Command(Some(cmd)) => self.handle_command(cmd).await,
                Trigger::Command(None) => Flow::Close,
                Trigger::Alarm(alarm) => self.handle_alarm(alarm).await,
            };

            if flow == Flow::Close {
                break;
            }
        }

        self.refuse_queued().await;
        tracing::info!(room_id = %self.id, "room actor stopped");
    }

    /// Answers commands that were queued behind the one that closed the
    /// room. To their senders the room no longer exists.
    async fn refuse_queued(&mut self) {
        self.receiver.close();
        while let Ok(cmd) = self.receiver.try_recv() {
            let gone = RoomError::NotFound(self.id.clone());
            let (player, conn, event) = match cmd {
                RoomCommand::Join { player, conn } => (player, Some(conn), gone.join_failure()),
                RoomCommand::Start { player, conn } | RoomCommand::Destroy { player, conn } => {
                    (player, Some(conn), gone.to_event())
                }
                RoomCommand::Leave { player, conn } => (player, conn, gone.to_event()),
                RoomCommand::Answer { .. } | RoomCommand::Summary { .. } => continue,
            };
            tracing::debug!(room_id = %self.id, %player, "command queued behind room close");
            if let Some(conn) = conn {
                self.reply(conn, &event).await;
            }
        }
    }

    async fn handle_command(&mut self, cmd: RoomCommand) -> Flow {
        match cmd {
            RoomCommand::Join { player, conn } => {
                if let Err(err) = self.join(&player, conn).await {
                    tracing::debug!(room_id = %self.id, %player, %err, "join rejected");
                    self.reply(conn, &err.join_failure()).await;
                }
                Flow::Continue
            }
            RoomCommand::Start { player, conn } => {
                if let Err(err) = self.start(&player).await {
                    self.reject(Some(conn), &player, err).await;
                }
                Flow::Continue
            }
            RoomCommand::Answer { player, answer } => {
                self.answer(&player, &answer).await;
                Flow::Continue
            }
            RoomCommand::Leave { player, conn } => match self.leave(&player, conn).await {
                Ok(flow) => flow,
                Err(err) => {
                    self.reject(conn, &player, err).await;
                    Flow::Continue
                }
            },
            RoomCommand::Destroy { player, conn } => match self.destroy(&player).await {
                Ok(flow) => flow,
                Err(err) => {
                    self.reject(Some(conn), &player, err).await;
                    Flow::Continue
                }
            },
            RoomCommand::Summary { reply } => {
                let _ = reply.send(self.summary());
                Flow::Continue
            }
        }
    }

    async fn handle_alarm(&mut self, alarm: Alarm) -> Flow {
        match alarm {
            Alarm::CountdownTick => self.countdown_tick().await,
            Alarm::QuestionDeadline { cursor } => {
                self.deadline(cursor).await;
                Flow::Continue
            }
            Alarm::Grace => self.next_question().await,
            Alarm::PostGame => {
                self.retire().await;
                Flow::Close
            }
        }
    }

    // -- Player commands ---------------------------------------------------

    async fn join(&mut self, player: &str, conn: ConnectionId) -> Result<(), RoomError> {
        let state = self.phase.state();
        if !state.is_joinable() {
            return Err(RoomError::InvalidState {
                state,
                action: "join",
            });
        }
        if self.is_member(player) {
            // Joining twice just confirms the first join again.
            self.reply(conn, &ServerEvent::GameJoined(self.joined_room()))
                .await;
            return Ok(());
        }

        self.roster.push(Player::new(player));
        tracing::info!(
            room_id = %self.id,
            %player,
            players = self.roster.len(),
            "player joined"
        );

        let summary = self.publish().await;
        self.to_everyone(&ServerEvent::GameUpdate(summary)).await;
        self.reply(conn, &ServerEvent::GameJoined(self.joined_room()))
            .await;
        let change = self.roster_change(player, "has joined the game.");
        self.to_room(&ServerEvent::PlayerJoined(change)).await;
        Ok(())
    }

    async fn start(&mut self, player: &str) -> Result<(), RoomError> {
        self.ensure_member(player)?;
        if !matches!(self.phase, Phase::Waiting) {
            return Err(RoomError::InvalidState {
                state: self.phase.state(),
                action: "start",
            });
        }
        if self.roster.len() < self.ctx.config.min_players {
            tracing::debug!(
                room_id = %self.id,
                players = self.roster.len(),
                needed = self.ctx.config.min_players,
                "start ignored, not enough players"
            );
            return Ok(());
        }

        let available = self.ctx.bank.available();
        if available < self.question_count {
            return Err(RoomError::BankExhausted {
                requested: self.question_count,
                available,
            });
        }
        let mut questions = self.ctx.bank.draw(self.question_count)?;
        questions.truncate(self.question_count);
        if questions.len() < self.question_count {
            return Err(RoomError::BankExhausted {
                requested: self.question_count,
                available: questions.len(),
            });
        }
        self.questions = questions;
        self.cursor = None;
        self.enter(Phase::Countdown {
            next: self.ctx.config.countdown_from,
        });
        self.timer
            .arm(self.ctx.config.countdown_interval, Alarm::CountdownTick);

        tracing::info!(
            room_id = %self.id,
            players = self.roster.len(),
            questions = self.questions.len(),
            "game started"
        );

        self.to_room(&ServerEvent::GameStart {
            game_id: self.id.clone(),
            players: self.names(),
        })
        .await;
        let summary = self.publish().await;
        self.to_everyone(&ServerEvent::GameUpdate(summary)).await;
        Ok(())
    }

    async fn answer(&mut self, player: &str, answer: &str) {
        let Phase::Question(round) = &mut self.phase else {
            tracing::debug!(room_id = %self.id, %player, "answer ignored, no question asked");
            return;
        };
        let Some(question) = self.questions.get(round.cursor) else {
            return;
        };
        let outcome = resolver::submit_answer(round, &mut self.roster, question, player, answer);
        let cursor = round.cursor;

        match outcome {
            Outcome::Correct => {
                tracing::debug!(room_id = %self.id, %player, cursor, "correct answer");
                resolver::clear_missed(&mut self.roster);
                // Replaces the question deadline.
                self.timer.arm(self.ctx.config.reveal_grace, Alarm::Grace);
                self.to_room(&ServerEvent::CorrectAnswer {
                    player_name: player.to_owned(),
                    game_id: self.id.clone(),
                    correct_answer: self.correct_answer(cursor),
                    scores: resolver::scores(&self.roster),
                })
                .await;
            }
            Outcome::Incorrect { exhausted } => {
                self.to_room(&ServerEvent::IncorrectAnswer {
                    player_name: player.to_owned(),
                    game_id: self.id.clone(),
                })
                .await;
                if exhausted {
                    self.reveal(RevealReason::AllIncorrect).await;
                }
            }
            Outcome::Ignored(reason) => {
                tracing::debug!(room_id = %self.id, %player, ?reason, "answer ignored");
            }
        }
    }

    async fn leave(&mut self, player: &str, conn: Option<ConnectionId>) -> Result<Flow, RoomError> {
        let Some(pos) = self.roster.iter().position(|p| p.name == player) else {
            return Err(self.not_in_room(player));
        };
        self.roster.remove(pos);
        tracing::info!(
            room_id = %self.id,
            %player,
            players = self.roster.len(),
            "player left"
        );

        if self.roster.is_empty() {
            self.timer.cancel();
            self.directory.remove(&self.id).await;
            tracing::info!(room_id = %self.id, "last player left, room removed");

            self.to_everyone(&ServerEvent::GameDestroy {
                game_id: self.id.clone(),
            })
            .await;
            if let Some(conn) = conn {
                self.reply(conn, &self.game_left()).await;
            }
            self.broadcast_room_list().await;
            return Ok(Flow::Close);
        }

        let change = self.roster_change(player, "has left the game.");
        self.to_room(&ServerEvent::PlayerLeft(change)).await;
        if let Some(conn) = conn {
            self.reply(conn, &self.game_left()).await;
        }
        self.publish().await;
        self.broadcast_room_list().await;

        // Everyone still here may already have answered wrong.
        let open = matches!(&self.phase, Phase::Question(round) if round.is_open());
        if open && resolver::everyone_missed(&self.roster) {
            self.reveal(RevealReason::AllIncorrect).await;
        }
        Ok(Flow::Continue)
    }

    async fn destroy(&mut self, player: &str) -> Result<Flow, RoomError> {
        let is_owner = self.roster.first().is_some_and(|p| p.name == player);
        if !is_owner {
            return Err(RoomError::NotOwner {
                room: self.id.clone(),
                action: "destroy",
            });
        }

        self.timer.cancel();
        self.directory.remove(&self.id).await;
        tracing::info!(room_id = %self.id, %player, "room destroyed by owner");

        self.to_room(&ServerEvent::GameDestroyed {
            game_id: self.id.clone(),
            message: DESTROYED_MESSAGE.to_owned(),
        })
        .await;
        self.to_everyone(&ServerEvent::GameDestroy {
            game_id: self.id.clone(),
        })
        .await;
        self.broadcast_room_list().await;
        Ok(Flow::Close)
    }

    // -- Timer-driven phases -----------------------------------------------

    async fn countdown_tick(&mut self) -> Flow {
        let Phase::Countdown { next } = self.phase else {
            tracing::debug!(room_id = %self.id, "stale countdown tick ignored");
            return Flow::Continue;
        };

        self.to_room(&ServerEvent::Countdown {
            game_id: self.id.clone(),
            countdown: next,
        })
        .await;

        if next == 0 {
            return self.next_question().await;
        }
        self.phase = Phase::Countdown { next: next - 1 };
        self.timer
            .arm(self.ctx.config.countdown_interval, Alarm::CountdownTick);
        Flow::Continue
    }

    /// Advances the cursor and asks the next question, or ends the game
    /// when there are none left.
    async fn next_question(&mut self) -> Flow {
        let next = self.cursor.map_or(0, |c| c + 1);
        let Some(question) = self.questions.get(next).cloned() else {
            return self.end_game().await;
        };

        self.cursor = Some(next);
        resolver::clear_missed(&mut self.roster);
        self.enter(Phase::Question(Round::open(next)));
        self.timer.arm(
            self.ctx.config.question_time,
            Alarm::QuestionDeadline { cursor: next },
        );
        tracing::debug!(room_id = %self.id, cursor = next, "question asked");

        self.to_room(&ServerEvent::Question {
            game_id: self.id.clone(),
            question_index: next,
            total_questions: self.questions.len(),
            question: question.question_text,
            options: question.options,
        })
        .await;
        let summary = self.publish().await;
        self.to_everyone(&ServerEvent::GameUpdate(summary)).await;
        Flow::Continue
    }

    async fn deadline(&mut self, cursor: usize) {
        let current = matches!(
            &self.phase,
            Phase::Question(round) if round.cursor == cursor && round.is_open()
        );
        if current {
            self.reveal(RevealReason::Deadline).await;
        } else {
            tracing::debug!(room_id = %self.id, cursor, "stale deadline ignored");
        }
    }

    /// Closes the current question without a winner and schedules the
    /// next one.
    async fn reveal(&mut self, reason: RevealReason) {
        let Phase::Question(round) = &mut self.phase else {
            return;
        };
        round.status = RoundStatus::Resolved;
        let cursor = round.cursor;

        resolver::clear_missed(&mut self.roster);
        self.timer.arm(self.ctx.config.reveal_grace, Alarm::Grace);
        tracing::debug!(room_id = %self.id, cursor, ?reason, "answer revealed");

        self.to_room(&ServerEvent::TimeUp {
            game_id: self.id.clone(),
            correct_answer: self.correct_answer(cursor),
            reason,
        })
        .await;
    }

    async fn end_game(&mut self) -> Flow {
        self.timer.cancel();
        self.enter(Phase::Ended);
        self.winner = resolver::winner(&self.roster).map(|p| p.name.clone());
        tracing::info!(room_id = %self.id, winner = ?self.winner, "game ended");

        self.to_room(&ServerEvent::GameEnd {
            game_id: self.id.clone(),
            scores: resolver::scores(&self.roster),
            winner: self.winner.clone(),
        })
        .await;
        let summary = self.publish().await;
        self.to_everyone(&ServerEvent::GameUpdate(summary)).await;

        let linger = self.ctx.config.post_game_linger;
        if linger.is_zero() {
            self.retire().await;
            return Flow::Close;
        }
        self.timer.arm(linger, Alarm::PostGame);
        Flow::Continue
    }

    /// Takes a finished room out of the directory.
    async fn retire(&mut self) {
        self.directory.remove(&self.id).await;
        tracing::info!(room_id = %self.id, "finished room removed");
        self.broadcast_room_list().await;
    }

    // -- Helpers -----------------------------------------------------------

    /// Moves to `phase`. Transitions outside the room lifecycle are a bug.
    fn enter(&mut self, phase: Phase) {
        debug_assert!(
            self.phase.state().can_transition_to(phase.state()),
            "illegal transition {} -> {}",
            self.phase.state(),
            phase.state()
        );
        self.phase = phase;
    }

    fn is_member(&self, player: &str) -> bool {
        self.roster.iter().any(|p| p.name == player)
    }

    fn ensure_member(&self, player: &str) -> Result<(), RoomError> {
        if self.is_member(player) {
            Ok(())
        } else {
            Err(self.not_in_room(player))
        }
    }

    fn not_in_room(&self, player: &str) -> RoomError {
        RoomError::NotInRoom {
            player: player.to_owned(),
            room: self.id.clone(),
        }
    }

    fn names(&self) -> Vec<String> {
        self.roster.iter().map(|p| p.name.clone()).collect()
    }

    fn correct_answer(&self, cursor: usize) -> String {
        self.questions
            .get(cursor)
            .and_then(Question::correct_option)
            .unwrap_or_default()
            .to_owned()
    }

    fn summary(&self) -> RoomSummary {
        RoomSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            question_count: self.question_count,
            state: self.phase.state(),
            player_names: self.names(),
            player_count: self.roster.len(),
            winner: self.winner.clone(),
        }
    }

    fn joined_room(&self) -> JoinedRoom {
        JoinedRoom::from(&self.summary())
    }

    fn roster_change(&self, player: &str, what: &str) -> RosterChange {
        RosterChange {
            player_name: player.to_owned(),
            game_id: self.id.clone(),
            player_count: self.roster.len(),
            players: self.names(),
            message: format!("{player} {what}"),
        }
    }

    fn game_left(&self) -> ServerEvent {
        ServerEvent::GameLeft {
            game_id: self.id.clone(),
        }
    }

    /// Writes the current summary into the directory and returns it.
    async fn publish(&self) -> RoomSummary {
        let summary = self.summary();
        self.directory.publish(summary.clone()).await;
        summary
    }

    async fn broadcast_room_list(&self) {
        let rooms = self.directory.list_open().await;
        self.to_everyone(&ServerEvent::GameListUpdate(rooms)).await;
    }

    async fn to_room(&self, event: &ServerEvent) {
        let names = self.names();
        self.ctx.broadcaster.to_roster(&names, event).await;
    }

    async fn to_everyone(&self, event: &ServerEvent) {
        self.ctx.broadcaster.to_everyone(event).await;
    }

    async fn reply(&self, conn: ConnectionId, event: &ServerEvent) {
        self.ctx.broadcaster.to_connection(conn, event).await;
    }

    /// Tells the requester why their command failed.
    async fn reject(&self, conn: Option<ConnectionId>, player: &str, err: RoomError) {
        tracing::debug!(room_id = %self.id, %player, %err, "command rejected");
        if let Some(conn) = conn {
            self.reply(conn, &err.to_event()).await;
        }
    }
}

/// Spawns a room actor with `owner` as its only player and returns a
/// handle to it plus its initial summary.
pub(crate) fn spawn_room<B: QuestionBank>(
    id: RoomId,
    name: String,
    question_count: usize,
    owner: String,
    ctx: RoomContext<B>,
    directory: RoomDirectory,
) -> (RoomHandle, RoomSummary) {
    let (tx, rx) = mpsc::channel(ctx.config.command_channel_size);

    let actor = RoomActor {
        id: id.clone(),
        name,
        question_count,
        roster: vec![Player::new(owner)],
        phase: Phase::Waiting,
        questions: Vec::new(),
        cursor: None,
        winner: None,
        timer: PhaseTimer::new(),
        ctx,
        directory,
        receiver: rx,
    };
    let summary = actor.summary();

    tokio::spawn(actor.run());

    (
        RoomHandle {
            room_id: id,
            sender: tx,
        },
        summary,
    )
}
