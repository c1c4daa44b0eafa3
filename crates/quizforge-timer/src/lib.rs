//! Single-slot phase timer for Quizforge.
//!
//! A quiz room is always waiting on at most one clock: the next countdown
//! tick, the question deadline, the pause before the next question, or the
//! post-game linger. [`PhaseTimer`] holds that one clock. Arming it again
//! replaces whatever was pending, so a room can never have two timers
//! racing each other.
//!
//! # Integration
//!
//! The timer sits inside a room actor's `tokio::select!` loop next to the
//! command channel. When nothing is armed, [`PhaseTimer::fired`] pends
//! forever and `select!` simply keeps serving commands:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         cmd = cmd_rx.recv() => { /* handle commands */ }
//!         fired = timer.fired() => {
//!             match fired.kind { /* advance the phase */ }
//!         }
//!     }
//! }
//! ```
//!
//! `fired` is cancel-safe: if `select!` picks the other branch, the timer
//! stays armed with the same deadline.

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::trace;

/// A timer that went off, returned by [`PhaseTimer::fired`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired<K> {
    /// What was armed.
    pub kind: K,
    /// Which arming this was (starts at 1, one per [`PhaseTimer::arm`]).
    pub generation: u64,
    /// How far past the deadline the timer was observed.
    pub late_by: Duration,
}

#[derive(Debug)]
struct Armed<K> {
    kind: K,
    deadline: Instant,
    generation: u64,
}

/// Holds at most one pending deadline, tagged with a `K` describing what
/// should happen when it passes.
#[derive(Debug)]
pub struct PhaseTimer<K> {
    slot: Option<Armed<K>>,
    generation: u64,
}

impl<K> Default for PhaseTimer<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> PhaseTimer<K> {
    /// Creates a disarmed timer.
    pub fn new() -> Self {
        Self {
            slot: None,
            generation: 0,
        }
    }

    /// Arms the timer to fire `after` from now. Any pending timer is
    /// dropped without firing. Returns this arming's generation.
    pub fn arm(&mut self, after: Duration, kind: K) -> u64 {
        self.generation += 1;
        if self.slot.is_some() {
            trace!(generation = self.generation, "replacing pending timer");
        }
        self.slot = Some(Armed {
            kind,
            deadline: Instant::now() + after,
            generation: self.generation,
        });
        self.generation
    }

    /// Disarms the timer. Returns what was pending, if anything.
    pub fn cancel(&mut self) -> Option<K> {
        self.slot.take().map(|armed| armed.kind)
    }

    /// Whether a deadline is pending.
    pub fn is_armed(&self) -> bool {
        self.slot.is_some()
    }

    /// When the pending timer is due.
    pub fn deadline(&self) -> Option<Instant> {
        self.slot.as_ref().map(|armed| armed.deadline)
    }

    /// Waits for the pending deadline, then disarms and returns it.
    ///
    /// Pends forever while disarmed. Cancel-safe: dropping the future
    /// before it resolves leaves the timer untouched.
    pub async fn fired(&mut self) -> Fired<K> {
        let Some(deadline) = self.deadline() else {
            return std::future::pending().await;
        };

        time::sleep_until(deadline).await;

        match self.slot.take() {
            Some(armed) => {
                let late_by = Instant::now().saturating_duration_since(armed.deadline);
                trace!(generation = armed.generation, ?late_by, "phase timer fired");
                Fired {
                    kind: armed.kind,
                    generation: armed.generation,
                    late_by,
                }
            }
            // Only reachable if the slot changed while we held `&mut self`,
            // which the borrow rules rule out.
            None => std::future::pending().await,
        }
    }
}
