//! Levels and per-user level progress.

use chrono::{DateTime, Utc};
use derive_more::IsVariant;
use serde::{Deserialize, Serialize};
use shapelace_core::{LevelId, PuzzleId, UserId};

/// A gate of N required puzzle completions in the progression ladder.
///
/// Levels are ordered by `number`, 1-based and contiguous. Level 1 is always
/// unlocked; level N unlocks when the user completes level N−1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    /// Identifier.
    pub id: LevelId,
    /// 1-based position in the ladder.
    pub number: u32,
    /// Display name.
    pub name: String,
    /// Completions required before the level is done.
    pub puzzles_required: u32,
    /// Inactive levels are hidden from players but keep their data.
    pub is_active: bool,
}

/// Assignment of a puzzle to a level.
///
/// A puzzle sits in at most one slot; the slot is what gets credited when
/// the puzzle is completed, so replays cannot double-count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSlot {
    /// The level the puzzle belongs to.
    pub level: LevelId,
    /// The assigned puzzle.
    pub puzzle: PuzzleId,
    /// Display order within the level.
    pub order_in_level: u32,
}

/// Outcome of a completion check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IsVariant)]
pub enum CompletionTransition {
    /// The level was already completed; nothing changed.
    AlreadyCompleted,
    /// The quota is not yet met.
    Incomplete,
    /// This check completed the level. The caller performs the unlock
    /// cascade for the immediate next level.
    JustCompleted,
}

/// One user's progress through one level.
///
/// `puzzles_completed` only ever increases and `is_completed` only ever
/// flips false→true; no API exists to walk either back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelProgress {
    user: UserId,
    level: LevelId,
    puzzles_completed: u32,
    total_score: u64,
    is_completed: bool,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl LevelProgress {
    /// Creates a fresh progress row for a user entering a level.
    #[must_use]
    pub fn start(user: UserId, level: LevelId, now: DateTime<Utc>) -> Self {
        Self {
            user,
            level,
            puzzles_completed: 0,
            total_score: 0,
            is_completed: false,
            started_at: now,
            completed_at: None,
        }
    }

    /// Returns the owning user.
    #[must_use]
    pub const fn user(&self) -> UserId {
        self.user
    }

    /// Returns the level this row tracks.
    #[must_use]
    pub const fn level(&self) -> LevelId {
        self.level
    }

    /// Returns the number of credited puzzle completions.
    #[must_use]
    pub const fn puzzles_completed(&self) -> u32 {
        self.puzzles_completed
    }

    /// Returns the accumulated score within this level.
    #[must_use]
    pub const fn total_score(&self) -> u64 {
        self.total_score
    }

    /// Returns whether the level is completed.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        self.is_completed
    }

    /// Returns when the user entered the level.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Returns when the level was completed.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Credits one puzzle completion worth `score` points.
    ///
    /// The caller checks slot dedup first: a level-puzzle pair that was
    /// already credited for this user must not reach this method again.
    pub fn record_puzzle(&mut self, score: u32) {
        self.puzzles_completed = self.puzzles_completed.saturating_add(1);
        self.total_score = self.total_score.saturating_add(u64::from(score));
    }

    /// Checks the completion quota and transitions the row if it is met.
    ///
    /// Already-completed rows are left untouched (no restamp of
    /// `completed_at`), which makes repeated checks harmless. The unlock
    /// cascade is not performed here; the caller reacts to
    /// [`CompletionTransition::JustCompleted`].
    pub fn check_completion(&mut self, level: &Level, now: DateTime<Utc>) -> CompletionTransition {
        if self.is_completed {
            return CompletionTransition::AlreadyCompleted;
        }
        if self.puzzles_completed < level.puzzles_required {
            return CompletionTransition::Incomplete;
        }
        self.is_completed = true;
        self.completed_at = Some(now);
        CompletionTransition::JustCompleted
    }

    /// Returns completion as a percentage, capped at 100.
    #[must_use]
    pub fn completion_percentage(&self, level: &Level) -> f64 {
        if level.puzzles_required == 0 {
            return 100.0;
        }
        let pct = f64::from(self.puzzles_completed) / f64::from(level.puzzles_required) * 100.0;
        pct.min(100.0)
    }
}

/// Returns whether a level is unlocked for a user.
///
/// Level 1 is always unlocked. Level N (N>1) is unlocked iff the user's
/// progress row for level N−1 exists and is completed.
#[must_use]
pub fn is_unlocked(level_number: u32, previous: Option<&LevelProgress>) -> bool {
    level_number <= 1 || previous.is_some_and(LevelProgress::is_completed)
}
