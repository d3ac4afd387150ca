use std::{collections::HashSet, sync::Arc};

use chrono::{DateTime, Utc};
use shapelace_core::{AchievementId, LevelId, Puzzle, PuzzleId, UserId};
use shapelace_game::Attempt;
use shapelace_progress::{Achievement, Level, LevelProgress, LevelSlot, UserAchievement, UserStats};

use crate::StoreError;

/// The logical persistence operations the platform core consumes.
///
/// Every method takes `&self`; implementations are expected to be shareable
/// across request handlers. The check-and-set operations ([`credit_slot`],
/// [`grant_achievement`]) return whether the insert was new, which is how
/// the callers get their idempotence guarantees.
///
/// [`credit_slot`]: PlatformStore::credit_slot
/// [`grant_achievement`]: PlatformStore::grant_achievement
pub trait PlatformStore {
    /// Fetches a puzzle by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::PuzzleNotFound`] if the puzzle does not exist.
    fn puzzle(&self, id: PuzzleId) -> Result<Arc<Puzzle>, StoreError>;

    /// Fetches a level by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::LevelNotFound`] if the level does not exist.
    fn level(&self, id: LevelId) -> Result<Level, StoreError>;

    /// Fetches a level by its ladder position, if one exists.
    ///
    /// # Errors
    ///
    /// Returns a backend error; a missing number is `Ok(None)`, not an
    /// error, because the cascade probes for a next level that may not be
    /// authored yet.
    fn level_by_number(&self, number: u32) -> Result<Option<Level>, StoreError>;

    /// Returns the level slot a puzzle is assigned to, if any.
    ///
    /// # Errors
    ///
    /// Returns a backend error. Free-play puzzles yield `Ok(None)`.
    fn slot_for_puzzle(&self, puzzle: PuzzleId) -> Result<Option<LevelSlot>, StoreError>;

    /// Fetches the attempt for a (user, puzzle) pair, if one exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UserNotFound`] for an unregistered user.
    fn attempt(&self, user: UserId, puzzle: PuzzleId) -> Result<Option<Attempt>, StoreError>;

    /// Upserts the attempt for its (user, puzzle) pair.
    ///
    /// Implementations maintain the per-user aggregates (puzzles solved,
    /// streak, fastest solve) by observing the in-progress → completed
    /// transition here; replacing a completed attempt with a fresh
    /// in-progress one never decrements them.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UserNotFound`] for an unregistered user.
    fn put_attempt(&self, attempt: Attempt) -> Result<(), StoreError>;

    /// Fetches the progress row for a (user, level) pair, if one exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UserNotFound`] for an unregistered user.
    fn progress(&self, user: UserId, level: LevelId) -> Result<Option<LevelProgress>, StoreError>;

    /// Upserts a progress row for its (user, level) pair.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UserNotFound`] for an unregistered user.
    fn put_progress(&self, progress: LevelProgress) -> Result<(), StoreError>;

    /// Marks a (user, level, puzzle) slot as credited.
    ///
    /// Returns `true` if the slot was newly credited, `false` if it was
    /// already credited (in which case nothing changes).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UserNotFound`] for an unregistered user.
    fn credit_slot(
        &self,
        user: UserId,
        level: LevelId,
        puzzle: PuzzleId,
    ) -> Result<bool, StoreError>;

    /// Lists all active achievement definitions.
    ///
    /// # Errors
    ///
    /// Returns a backend error.
    fn active_achievements(&self) -> Result<Vec<Achievement>, StoreError>;

    /// Returns the achievements already granted to a user.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UserNotFound`] for an unregistered user.
    fn earned_achievements(&self, user: UserId) -> Result<HashSet<AchievementId>, StoreError>;

    /// Returns the user's grants with timestamps, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UserNotFound`] for an unregistered user.
    fn user_achievements(&self, user: UserId) -> Result<Vec<UserAchievement>, StoreError>;

    /// Grants an achievement to a user.
    ///
    /// Returns `true` if the grant was newly created, `false` if the pair
    /// already existed (grants are irrevocable and unique).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UserNotFound`] or
    /// [`StoreError::AchievementNotFound`] for dangling references.
    fn grant_achievement(
        &self,
        user: UserId,
        achievement: AchievementId,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Adds points to a user's running total and returns the new total.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UserNotFound`] for an unregistered user.
    fn add_user_score(&self, user: UserId, delta: u64) -> Result<u64, StoreError>;

    /// Gathers the user's aggregate metrics for achievement evaluation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UserNotFound`] for an unregistered user.
    fn user_stats(&self, user: UserId) -> Result<UserStats, StoreError>;

    /// Registers a user.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateUser`] if the id is taken.
    fn insert_user(&self, user: UserId) -> Result<(), StoreError>;

    /// Registers a puzzle.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicatePuzzle`] if the id is taken.
    fn insert_puzzle(&self, puzzle: Puzzle) -> Result<(), StoreError>;

    /// Registers a level.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateLevel`] if the id or ladder number is
    /// taken.
    fn insert_level(&self, level: Level) -> Result<(), StoreError>;

    /// Assigns a puzzle to a level slot.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateSlot`] if the puzzle is already
    /// assigned, and [`StoreError::LevelNotFound`] /
    /// [`StoreError::PuzzleNotFound`] for dangling references.
    fn insert_slot(&self, slot: LevelSlot) -> Result<(), StoreError>;

    /// Registers an achievement definition.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateAchievement`] if the id is taken.
    fn insert_achievement(&self, achievement: Achievement) -> Result<(), StoreError>;
}
