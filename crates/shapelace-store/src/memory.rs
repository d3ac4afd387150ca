//! In-memory reference store.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use chrono::{DateTime, Utc};
use shapelace_core::{AchievementId, LevelId, Puzzle, PuzzleId, UserId};
use shapelace_game::Attempt;
use shapelace_progress::{Achievement, Level, LevelProgress, LevelSlot, UserAchievement, UserStats};

use crate::{PlatformStore, StoreError};

#[derive(Debug, Default)]
struct UserRecord {
    total_score: u64,
    puzzles_solved: u64,
    current_streak: u64,
    best_streak: u64,
    fastest_solve_secs: Option<u64>,
}

#[derive(Debug, Default)]
struct Inner {
    puzzles: HashMap<PuzzleId, Arc<Puzzle>>,
    levels: HashMap<LevelId, Level>,
    level_numbers: HashMap<u32, LevelId>,
    slots: HashMap<PuzzleId, LevelSlot>,
    attempts: HashMap<(UserId, PuzzleId), Attempt>,
    progress: HashMap<(UserId, LevelId), LevelProgress>,
    credited_slots: HashSet<(UserId, LevelId, PuzzleId)>,
    achievements: HashMap<AchievementId, Achievement>,
    earned: HashMap<(UserId, AchievementId), DateTime<Utc>>,
    users: HashMap<UserId, UserRecord>,
}

impl Inner {
    fn user(&self, id: UserId) -> Result<&UserRecord, StoreError> {
        self.users.get(&id).ok_or(StoreError::UserNotFound { id })
    }

    fn user_mut(&mut self, id: UserId) -> Result<&mut UserRecord, StoreError> {
        self.users
            .get_mut(&id)
            .ok_or(StoreError::UserNotFound { id })
    }
}

/// An in-memory [`PlatformStore`].
///
/// Backs the integration tests and the runnable example. All state lives
/// behind one `RwLock`; the uniqueness guarantees (one attempt per
/// (user, puzzle), one grant per (user, achievement), one credit per
/// (user, level, puzzle)) come from the map and set keys, the same way a
/// database backend gets them from unique constraints.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PlatformStore for MemoryStore {
    fn puzzle(&self, id: PuzzleId) -> Result<Arc<Puzzle>, StoreError> {
        self.read()
            .puzzles
            .get(&id)
            .cloned()
            .ok_or(StoreError::PuzzleNotFound { id })
    }

    fn level(&self, id: LevelId) -> Result<Level, StoreError> {
        self.read()
            .levels
            .get(&id)
            .cloned()
            .ok_or(StoreError::LevelNotFound { id })
    }

    fn level_by_number(&self, number: u32) -> Result<Option<Level>, StoreError> {
        let inner = self.read();
        Ok(inner
            .level_numbers
            .get(&number)
            .and_then(|id| inner.levels.get(id))
            .cloned())
    }

    fn slot_for_puzzle(&self, puzzle: PuzzleId) -> Result<Option<LevelSlot>, StoreError> {
        Ok(self.read().slots.get(&puzzle).copied())
    }

    fn attempt(&self, user: UserId, puzzle: PuzzleId) -> Result<Option<Attempt>, StoreError> {
        let inner = self.read();
        inner.user(user)?;
        Ok(inner.attempts.get(&(user, puzzle)).cloned())
    }

    fn put_attempt(&self, attempt: Attempt) -> Result<(), StoreError> {
        let mut inner = self.write();
        inner.user(attempt.user())?;

        let key = (attempt.user(), attempt.puzzle());
        let was_completed = inner
            .attempts
            .get(&key)
            .is_some_and(|prior| prior.status().is_completed());

        // Aggregates advance exactly once per completion transition, so a
        // replay overwriting a completed attempt never walks them back.
        if !was_completed && attempt.status().is_completed()
            && let Some(result) = attempt.result()
        {
            let solve_secs = u64::try_from(result.time_taken_secs).unwrap_or(0);
            let is_perfect = result.is_perfect;
            let record = inner.user_mut(attempt.user())?;
            record.puzzles_solved += 1;
            if is_perfect {
                record.current_streak += 1;
                record.best_streak = record.best_streak.max(record.current_streak);
            } else {
                record.current_streak = 0;
            }
            record.fastest_solve_secs = Some(match record.fastest_solve_secs {
                Some(best) => best.min(solve_secs),
                None => solve_secs,
            });
        }

        inner.attempts.insert(key, attempt);
        Ok(())
    }

    fn progress(&self, user: UserId, level: LevelId) -> Result<Option<LevelProgress>, StoreError> {
        let inner = self.read();
        inner.user(user)?;
        Ok(inner.progress.get(&(user, level)).cloned())
    }

    fn put_progress(&self, progress: LevelProgress) -> Result<(), StoreError> {
        let mut inner = self.write();
        inner.user(progress.user())?;
        inner
            .progress
            .insert((progress.user(), progress.level()), progress);
        Ok(())
    }

    fn credit_slot(
        &self,
        user: UserId,
        level: LevelId,
        puzzle: PuzzleId,
    ) -> Result<bool, StoreError> {
        let mut inner = self.write();
        inner.user(user)?;
        Ok(inner.credited_slots.insert((user, level, puzzle)))
    }

    fn active_achievements(&self) -> Result<Vec<Achievement>, StoreError> {
        let mut achievements: Vec<_> = self
            .read()
            .achievements
            .values()
            .filter(|a| a.is_active)
            .cloned()
            .collect();
        achievements.sort_by_key(|a| a.id);
        Ok(achievements)
    }

    fn earned_achievements(&self, user: UserId) -> Result<HashSet<AchievementId>, StoreError> {
        let inner = self.read();
        inner.user(user)?;
        Ok(inner
            .earned
            .keys()
            .filter(|(u, _)| *u == user)
            .map(|&(_, achievement)| achievement)
            .collect())
    }

    fn user_achievements(&self, user: UserId) -> Result<Vec<UserAchievement>, StoreError> {
        let inner = self.read();
        inner.user(user)?;
        let mut grants: Vec<UserAchievement> = inner
            .earned
            .iter()
            .filter(|((u, _), _)| *u == user)
            .map(|(&(user, achievement), &earned_at)| UserAchievement {
                user,
                achievement,
                earned_at,
            })
            .collect();
        grants.sort_by(|a, b| b.earned_at.cmp(&a.earned_at).then(a.achievement.cmp(&b.achievement)));
        Ok(grants)
    }

    fn grant_achievement(
        &self,
        user: UserId,
        achievement: AchievementId,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut inner = self.write();
        inner.user(user)?;
        if !inner.achievements.contains_key(&achievement) {
            return Err(StoreError::AchievementNotFound { id: achievement });
        }
        let mut newly = false;
        inner.earned.entry((user, achievement)).or_insert_with(|| {
            newly = true;
            now
        });
        Ok(newly)
    }

    fn add_user_score(&self, user: UserId, delta: u64) -> Result<u64, StoreError> {
        let mut inner = self.write();
        let record = inner.user_mut(user)?;
        record.total_score = record.total_score.saturating_add(delta);
        Ok(record.total_score)
    }

    fn user_stats(&self, user: UserId) -> Result<UserStats, StoreError> {
        let inner = self.read();
        let record = inner.user(user)?;
        let completed_rows = inner
            .progress
            .iter()
            .filter(|((u, _), progress)| *u == user && progress.is_completed())
            .count();
        let levels_completed = u64::try_from(completed_rows).unwrap_or(u64::MAX);
        Ok(UserStats {
            levels_completed,
            puzzles_solved: record.puzzles_solved,
            total_score: record.total_score,
            best_streak: record.best_streak,
            fastest_solve_secs: record.fastest_solve_secs,
        })
    }

    fn insert_user(&self, user: UserId) -> Result<(), StoreError> {
        let mut inner = self.write();
        if inner.users.contains_key(&user) {
            return Err(StoreError::DuplicateUser { id: user });
        }
        inner.users.insert(user, UserRecord::default());
        Ok(())
    }

    fn insert_puzzle(&self, puzzle: Puzzle) -> Result<(), StoreError> {
        let mut inner = self.write();
        if inner.puzzles.contains_key(&puzzle.id()) {
            return Err(StoreError::DuplicatePuzzle { id: puzzle.id() });
        }
        inner.puzzles.insert(puzzle.id(), Arc::new(puzzle));
        Ok(())
    }

    fn insert_level(&self, level: Level) -> Result<(), StoreError> {
        let mut inner = self.write();
        if inner.levels.contains_key(&level.id) || inner.level_numbers.contains_key(&level.number)
        {
            return Err(StoreError::DuplicateLevel {
                id: level.id,
                number: level.number,
            });
        }
        inner.level_numbers.insert(level.number, level.id);
        inner.levels.insert(level.id, level);
        Ok(())
    }

    fn insert_slot(&self, slot: LevelSlot) -> Result<(), StoreError> {
        let mut inner = self.write();
        if !inner.levels.contains_key(&slot.level) {
            return Err(StoreError::LevelNotFound { id: slot.level });
        }
        if !inner.puzzles.contains_key(&slot.puzzle) {
            return Err(StoreError::PuzzleNotFound { id: slot.puzzle });
        }
        if inner.slots.contains_key(&slot.puzzle) {
            return Err(StoreError::DuplicateSlot {
                puzzle: slot.puzzle,
            });
        }
        inner.slots.insert(slot.puzzle, slot);
        Ok(())
    }

    fn insert_achievement(&self, achievement: Achievement) -> Result<(), StoreError> {
        let mut inner = self.write();
        if inner.achievements.contains_key(&achievement.id) {
            return Err(StoreError::DuplicateAchievement {
                id: achievement.id,
            });
        }
        inner.achievements.insert(achievement.id, achievement);
        Ok(())
    }
}
