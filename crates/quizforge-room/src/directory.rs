//! The room directory: every live room, by id.
//!
//! The directory stores each room's handle next to the last summary that
//! room published. Listing rooms reads those summaries and never asks an
//! actor anything, so a room actor can itself call
//! [`list_open`](RoomDirectory::list_open) (it does, after removing
//! itself) without waiting on other rooms.

use std::collections::HashMap;
use std::sync::Arc;

use quizforge_protocol::{RoomId, RoomSummary};
use rand::Rng;
use tokio::sync::Mutex;

use crate::room::{RoomContext, spawn_room};
use crate::{QuestionBank, RoomError, RoomHandle};

#[derive(Debug)]
struct Entry {
    handle: RoomHandle,
    summary: RoomSummary,
    /// Creation order, for stable listings.
    seq: u64,
}

#[derive(Debug, Default)]
struct Rooms {
    entries: HashMap<RoomId, Entry>,
    next_seq: u64,
}

/// Shared map of live rooms.
///
/// Cheap to clone; every clone sees the same rooms.
#[derive(Debug, Clone, Default)]
pub struct RoomDirectory {
    inner: Arc<Mutex<Rooms>>,
}

impl RoomDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns a new room owned by `owner` and registers it. Returns the
    /// room's initial summary (its roster is exactly `[owner]`).
    pub async fn create<B: QuestionBank>(
        &self,
        name: impl Into<String>,
        question_count: usize,
        owner: impl Into<String>,
        ctx: &RoomContext<B>,
    ) -> RoomSummary {
        let mut rooms = self.inner.lock().await;

        let id = loop {
            let candidate = fresh_room_id();
            if !rooms.entries.contains_key(&candidate) {
                break candidate;
            }
        };

        let (handle, summary) = spawn_room(
            id.clone(),
            name.into(),
            question_count,
            owner.into(),
            ctx.clone(),
            self.clone(),
        );

        let seq = rooms.next_seq;
        rooms.next_seq += 1;
        rooms.entries.insert(
            id.clone(),
            Entry {
                handle,
                summary: summary.clone(),
                seq,
            },
        );

        tracing::info!(
            room_id = %id,
            name = %summary.name,
            question_count,
            owner = ?summary.player_names.first(),
            "room created"
        );
        summary
    }

    /// The handle for room `id`.
    ///
    /// # Errors
    /// Returns [`RoomError::NotFound`] if no such room is live.
    pub async fn find(&self, id: &RoomId) -> Result<RoomHandle, RoomError> {
        self.inner
            .lock()
            .await
            .entries
            .get(id)
            .map(|entry| entry.handle.clone())
            .ok_or_else(|| RoomError::NotFound(id.clone()))
    }

    /// The last summary room `id` published.
    pub async fn summary(&self, id: &RoomId) -> Option<RoomSummary> {
        self.inner
            .lock()
            .await
            .entries
            .get(id)
            .map(|entry| entry.summary.clone())
    }

    /// Replaces the stored summary for `summary.id`.
    ///
    /// Does nothing (and returns `false`) if the room has been removed,
    /// so a late publish can't bring a room back.
    pub async fn publish(&self, summary: RoomSummary) -> bool {
        match self.inner.lock().await.entries.get_mut(&summary.id) {
            Some(entry) => {
                entry.summary = summary;
                true
            }
            None => false,
        }
    }

    /// Removes room `id`. Returns `false` if it was already gone.
    pub async fn remove(&self, id: &RoomId) -> bool {
        let removed = self.inner.lock().await.entries.remove(id).is_some();
        if removed {
            tracing::debug!(room_id = %id, "room removed from directory");
        }
        removed
    }

    /// Summaries of every live room, oldest first.
    pub async fn list_open(&self) -> Vec<RoomSummary> {
        let rooms = self.inner.lock().await;
        let mut entries: Vec<&Entry> = rooms.entries.values().collect();
        entries.sort_by_key(|entry| entry.seq);
        entries.into_iter().map(|entry| entry.summary.clone()).collect()
    }

    /// Handles of every live room.
    pub async fn handles(&self) -> Vec<RoomHandle> {
        self.inner
            .lock()
            .await
            .entries
            .values()
            .map(|entry| entry.handle.clone())
            .collect()
    }

    /// Number of live rooms.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    /// Returns `true` if there are no live rooms.
    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.entries.is_empty()
    }
}

/// Generates a random 32-character hex room id (128 bits).
fn fresh_room_id() -> RoomId {
    let bytes: [u8; 16] = rand::rng().random();
    RoomId::new(bytes.iter().map(|b| format!("{b:02x}")).collect::<String>())
}
