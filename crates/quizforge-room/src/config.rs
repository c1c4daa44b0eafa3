//! Quiz timing and limits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration shared by every room on a server.
///
/// Missing fields fall back to [`Default`], so a config file only needs
/// the values it changes. Durations use serde's `{"secs": .., "nanos": ..}`
/// form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizConfig {
    /// Players needed before `start` does anything.
    pub min_players: usize,

    /// First value of the pre-game countdown. The countdown runs down to
    /// zero inclusive, one tick per `countdown_interval`.
    pub countdown_from: u32,

    /// Time between countdown ticks.
    pub countdown_interval: Duration,

    /// How long players have to answer each question.
    pub question_time: Duration,

    /// Pause between a question's resolution and the next question.
    pub reveal_grace: Duration,

    /// How long an ended room stays listed (with its winner) before it is
    /// removed. Zero removes it as soon as the game ends.
    pub post_game_linger: Duration,

    /// Upper bound on `questionCount` in `create`.
    pub max_question_count: usize,

    /// Capacity of each room actor's command channel.
    pub command_channel_size: usize,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            countdown_from: 3,
            countdown_interval: Duration::from_secs(1),
            question_time: Duration::from_secs(10),
            reveal_grace: Duration::from_secs(3),
            post_game_linger: Duration::from_secs(5),
            max_question_count: 50,
            command_channel_size: 64,
        }
    }
}

impl QuizConfig {
    /// Clamps values the room actor can't work with.
    ///
    /// - `min_players` is at least 1.
    /// - `max_question_count` is at least 1.
    /// - `command_channel_size` is at least 1 (Tokio rejects empty
    ///   channels).
    /// - `question_time` is non-zero, so a question is always on screen
    ///   for some time.
    pub fn validated(mut self) -> Self {
        if self.min_players == 0 {
            tracing::warn!("min_players is 0, using 1");
            self.min_players = 1;
        }
        if self.max_question_count == 0 {
            tracing::warn!("max_question_count is 0, using 1");
            self.max_question_count = 1;
        }
        if self.command_channel_size == 0 {
            tracing::warn!("command_channel_size is 0, using 1");
            self.command_channel_size = 1;
        }
        if self.question_time.is_zero() {
            let fallback = Self::default().question_time;
            tracing::warn!(?fallback, "question_time is 0, using the default");
            self.question_time = fallback;
        }
        self
    }

    /// Parses a config from JSON. Unknown fields are ignored, missing ones
    /// take their defaults. The result is [`validated`](Self::validated).
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(json).map(Self::validated)
    }
}
