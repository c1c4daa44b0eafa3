//! Answer resolution: who, if anyone, gets the point for a question.
//!
//! The rule is "first correct answer wins, wrong answers lock you out".
//! Everything here is synchronous and runs inside the room actor, so two
//! answers can never be judged at the same time: whichever the actor
//! dequeues first is judged first, and once a round is resolved every
//! later answer is ignored.

use quizforge_protocol::{Question, ScoreEntry};

/// A player in a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Player {
    pub name: String,
    pub score: u32,
    /// Answered the current question wrong; can't answer it again.
    pub missed: bool,
}

impl Player {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            score: 0,
            missed: false,
        }
    }
}

/// Whether the current question still accepts answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RoundStatus {
    Open,
    Resolved,
}

/// One question's worth of play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Round {
    /// Index into the room's drawn questions.
    pub cursor: usize,
    pub status: RoundStatus,
}

impl Round {
    pub fn open(cursor: usize) -> Self {
        Self {
            cursor,
            status: RoundStatus::Open,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == RoundStatus::Open
    }
}

/// Why an answer had no effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Ignored {
    /// Someone already scored, or the question was revealed.
    Resolved,
    /// The answering player isn't on the roster.
    NotInRoom,
    /// The player already answered this question wrong.
    AlreadyMissed,
}

/// The result of judging one answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// The player scored and the round is now resolved.
    Correct,
    /// The player is locked out of this question. `exhausted` means
    /// nobody on the roster can still answer.
    Incorrect { exhausted: bool },
    /// Nothing changed.
    Ignored(Ignored),
}

/// Judges `answer` from `player` against `question`, updating the round
/// and roster.
pub(crate) fn submit_answer(
    round: &mut Round,
    roster: &mut [Player],
    question: &Question,
    player: &str,
    answer: &str,
) -> Outcome {
    if !round.is_open() {
        return Outcome::Ignored(Ignored::Resolved);
    }
    let Some(entry) = roster.iter_mut().find(|p| p.name == player) else {
        return Outcome::Ignored(Ignored::NotInRoom);
    };
    if entry.missed {
        return Outcome::Ignored(Ignored::AlreadyMissed);
    }

    if question.is_correct(answer) {
        entry.score += 1;
        round.status = RoundStatus::Resolved;
        Outcome::Correct
    } else {
        entry.missed = true;
        Outcome::Incorrect {
            exhausted: everyone_missed(roster),
        }
    }
}

/// Returns `true` if the roster is non-empty and every player has
/// answered the current question wrong.
pub(crate) fn everyone_missed(roster: &[Player]) -> bool {
    !roster.is_empty() && roster.iter().all(|p| p.missed)
}

/// Clears every player's lockout, ready for the next question.
pub(crate) fn clear_missed(roster: &mut [Player]) {
    for player in roster {
        player.missed = false;
    }
}

/// The player with the strictly highest score. On a tie the one who
/// joined first wins.
pub(crate) fn winner(roster: &[Player]) -> Option<&Player> {
    roster.iter().fold(None, |best: Option<&Player>, p| match best {
        Some(b) if b.score >= p.score => Some(b),
        _ => Some(p),
    })
}

/// Score table in roster order.
pub(crate) fn scores(roster: &[Player]) -> Vec<ScoreEntry> {
    roster
        .iter()
        .map(|p| ScoreEntry {
            name: p.name.clone(),
            score: p.score,
        })
        .collect()
}
