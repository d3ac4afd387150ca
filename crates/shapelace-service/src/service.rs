//! The platform service and its completion pipeline.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use chrono::{DateTime, Utc};
use derive_more::{Display, Error, From};
use serde::Serialize;
use shapelace_core::{
    AchievementId, LevelId, Placements, Puzzle, PuzzleId, UserId,
    validate::{Hint, ValidationReport, next_hint, validate_placements},
};
use shapelace_game::{Attempt, AttemptError, AttemptId, AttemptStatus};
use shapelace_progress::{
    Achievement, Level, LevelProgress, LevelSlot, achievement::evaluate, is_unlocked,
};
use shapelace_store::{PlatformStore, StoreError};

use crate::Capabilities;

/// Error raised by a service operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error, From)]
pub enum ServiceError {
    /// The caller lacks the content-author capability.
    #[display("operation requires the content-author capability")]
    Forbidden,
    /// A persistence operation failed.
    #[display("{_0}")]
    Store(StoreError),
    /// An attempt transition was invalid.
    #[display("{_0}")]
    Attempt(AttemptError),
}

/// Level progress snapshot returned from a completion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelReport {
    /// The level that was credited.
    pub level: LevelId,
    /// Its ladder position.
    pub level_number: u32,
    /// Credited completions after this operation.
    pub puzzles_completed: u32,
    /// The level's quota.
    pub puzzles_required: u32,
    /// Progress percentage, capped at 100.
    pub completion_percentage: f64,
    /// Whether the level is completed.
    pub is_completed: bool,
    /// Whether this operation completed the level.
    pub newly_completed: bool,
}

/// Response of [`PlatformService::finalize_attempt`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalizeReport {
    /// The finalized attempt.
    pub attempt: AttemptId,
    /// Terminal status (always `completed` on success).
    pub status: AttemptStatus,
    /// Earned score.
    pub score: u32,
    /// Percentage accuracy.
    pub accuracy: f64,
    /// `false` when a duplicate finalize returned the stored result.
    pub newly_completed: bool,
    /// Level progress, present when the puzzle sits in a level slot and
    /// this call performed the completion.
    pub level: Option<LevelReport>,
    /// Achievements granted by this completion.
    pub granted_achievements: Vec<AchievementId>,
}

/// The request-facing platform service.
///
/// Wraps a [`PlatformStore`] and serializes all mutating operations per
/// user. See the crate docs for the pipeline walkthrough.
#[derive(Debug)]
pub struct PlatformService<S> {
    store: S,
    user_locks: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl<S: PlatformStore> PlatformService<S> {
    /// Creates a service over a store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    fn user_lock(&self, user: UserId) -> Arc<Mutex<()>> {
        let mut locks = self
            .user_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(user).or_default())
    }

    /// Runs `f` while holding the user's lock.
    ///
    /// This is the unit of serialization: everything that reads then writes
    /// a user's attempts, progress, or grants goes through here.
    fn with_user_lock<R>(&self, user: UserId, f: impl FnOnce() -> R) -> R {
        let lock = self.user_lock(user);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    // ---- play ----

    /// Validates placements against a puzzle without touching any state.
    ///
    /// Serves the live "check my board" endpoint; partial placements are
    /// fine.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::PuzzleNotFound`] for an unknown puzzle.
    pub fn validate_placement(
        &self,
        puzzle: PuzzleId,
        placements: &Placements,
    ) -> Result<ValidationReport, ServiceError> {
        let puzzle = self.store.puzzle(puzzle)?;
        Ok(validate_placements(&puzzle, placements))
    }

    /// Starts an attempt, or resumes the user's in-progress attempt on the
    /// same puzzle if one exists.
    ///
    /// A terminal (completed or abandoned) attempt is replaced by a fresh
    /// in-progress one; the stored aggregates keep their credit.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::PuzzleNotFound`] or
    /// [`StoreError::UserNotFound`] for dangling references.
    pub fn start_attempt(&self, user: UserId, puzzle: PuzzleId) -> Result<Attempt, ServiceError> {
        self.with_user_lock(user, || {
            self.store.puzzle(puzzle)?;
            if let Some(existing) = self.store.attempt(user, puzzle)?
                && existing.status().is_in_progress()
            {
                log::debug!("[ATTEMPT] resume user:{user} puzzle:{puzzle}");
                return Ok(existing);
            }
            let attempt = Attempt::start(AttemptId::random(), user, puzzle, Utc::now());
            self.store.put_attempt(attempt.clone())?;
            log::debug!("[ATTEMPT] start user:{user} puzzle:{puzzle}");
            Ok(attempt)
        })
    }

    /// Overwrites the attempt's placement state (last write wins).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AttemptNotFound`] if no attempt exists, and
    /// [`AttemptError::NotInProgress`] if the attempt is terminal.
    pub fn save_attempt_state(
        &self,
        user: UserId,
        puzzle: PuzzleId,
        placements: Placements,
    ) -> Result<(), ServiceError> {
        self.with_user_lock(user, || {
            let mut attempt = self
                .store
                .attempt(user, puzzle)?
                .ok_or(StoreError::AttemptNotFound { user, puzzle })?;
            attempt.save_state(placements)?;
            self.store.put_attempt(attempt)?;
            log::debug!("[ATTEMPT] save user:{user} puzzle:{puzzle}");
            Ok(())
        })
    }

    /// Suggests the next placement for the user's current attempt state.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AttemptNotFound`] if no attempt exists.
    pub fn hint(&self, user: UserId, puzzle: PuzzleId) -> Result<Option<Hint>, ServiceError> {
        let puzzle_def = self.store.puzzle(puzzle)?;
        let attempt = self
            .store
            .attempt(user, puzzle)?
            .ok_or(StoreError::AttemptNotFound { user, puzzle })?;
        Ok(next_hint(&puzzle_def, attempt.current_state()))
    }

    /// Finalizes an attempt and runs the downstream pipeline.
    ///
    /// When `placements` is supplied and the attempt is still in progress,
    /// the state is overwritten first, matching clients that submit their
    /// final board together with the completion request.
    ///
    /// The first finalize scores the attempt, credits the level slot (if the
    /// puzzle is assigned to one), updates level progress, cascades the
    /// unlock on level completion, and grants any newly qualifying
    /// achievements. A duplicate finalize returns the stored result and
    /// performs none of the side effects.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AttemptNotFound`] if the attempt does not
    /// exist, and [`AttemptError::AttemptAbandoned`] if it was abandoned.
    pub fn finalize_attempt(
        &self,
        user: UserId,
        puzzle: PuzzleId,
        placements: Option<Placements>,
    ) -> Result<FinalizeReport, ServiceError> {
        self.with_user_lock(user, || self.finalize_locked(user, puzzle, placements))
    }

    fn finalize_locked(
        &self,
        user: UserId,
        puzzle: PuzzleId,
        placements: Option<Placements>,
    ) -> Result<FinalizeReport, ServiceError> {
        let puzzle_def = self.store.puzzle(puzzle)?;
        let mut attempt = self
            .store
            .attempt(user, puzzle)?
            .ok_or(StoreError::AttemptNotFound { user, puzzle })?;

        if let Some(placements) = placements
            && attempt.status().is_in_progress()
        {
            attempt.save_state(placements)?;
        }

        let now = Utc::now();
        let outcome = attempt.finalize(&puzzle_def, now)?;
        self.store.put_attempt(attempt.clone())?;

        let mut report = FinalizeReport {
            attempt: attempt.id(),
            status: attempt.status(),
            score: outcome.result.score,
            accuracy: outcome.result.accuracy,
            newly_completed: outcome.newly_completed,
            level: None,
            granted_achievements: Vec::new(),
        };

        if outcome.newly_completed {
            log::info!(
                "[ATTEMPT] completed user:{user} puzzle:{puzzle} score:{} accuracy:{}",
                outcome.result.score,
                outcome.result.accuracy
            );
            if let Some(slot) = self.store.slot_for_puzzle(puzzle)? {
                report.level = Some(self.record_completion_locked(
                    user,
                    slot.level,
                    slot.puzzle,
                    outcome.result.score,
                    now,
                )?);
            }
            report.granted_achievements = self.evaluate_achievements_locked(user, now)?;
        } else {
            log::debug!("[ATTEMPT] duplicate finalize user:{user} puzzle:{puzzle}");
        }

        Ok(report)
    }

    /// Abandons the user's attempt on a puzzle.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AttemptNotFound`] if no attempt exists, and
    /// [`AttemptError::AlreadyCompleted`] if it was finalized.
    pub fn abandon_attempt(&self, user: UserId, puzzle: PuzzleId) -> Result<(), ServiceError> {
        self.with_user_lock(user, || {
            let mut attempt = self
                .store
                .attempt(user, puzzle)?
                .ok_or(StoreError::AttemptNotFound { user, puzzle })?;
            attempt.abandon(Utc::now())?;
            self.store.put_attempt(attempt)?;
            log::info!("[ATTEMPT] abandoned user:{user} puzzle:{puzzle}");
            Ok(())
        })
    }

    // ---- progression ----

    /// Records a scored completion of a level puzzle for a user.
    ///
    /// Fetches or creates the user's progress row, credits the
    /// (level, puzzle) slot at most once, updates the counters, checks level
    /// completion, and cascades the unlock to the immediate next level.
    /// Replays of an already-credited slot change nothing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::LevelNotFound`] or
    /// [`StoreError::UserNotFound`] for dangling references.
    pub fn record_level_completion(
        &self,
        user: UserId,
        level: LevelId,
        puzzle: PuzzleId,
        score: u32,
    ) -> Result<LevelReport, ServiceError> {
        self.with_user_lock(user, || {
            self.record_completion_locked(user, level, puzzle, score, Utc::now())
        })
    }

    fn record_completion_locked(
        &self,
        user: UserId,
        level_id: LevelId,
        puzzle: PuzzleId,
        score: u32,
        now: DateTime<Utc>,
    ) -> Result<LevelReport, ServiceError> {
        let level = self.store.level(level_id)?;
        let newly_credited = self.store.credit_slot(user, level_id, puzzle)?;
        let mut progress = match self.store.progress(user, level_id)? {
            Some(progress) => progress,
            None => LevelProgress::start(user, level_id, now),
        };

        let mut newly_completed = false;
        if newly_credited {
            progress.record_puzzle(score);
            self.store.add_user_score(user, u64::from(score))?;
            let transition = progress.check_completion(&level, now);
            self.store.put_progress(progress.clone())?;
            if transition.is_just_completed() {
                newly_completed = true;
                log::info!(
                    "[LEVEL] completed user:{user} level:{} total_score:{}",
                    level.number,
                    progress.total_score()
                );
                self.cascade_unlock(user, &level, now)?;
            }
        } else {
            log::debug!(
                "[LEVEL] slot already credited user:{user} level:{} puzzle:{puzzle}",
                level.number
            );
        }

        Ok(LevelReport {
            level: level_id,
            level_number: level.number,
            puzzles_completed: progress.puzzles_completed(),
            puzzles_required: level.puzzles_required,
            completion_percentage: progress.completion_percentage(&level),
            is_completed: progress.is_completed(),
            newly_completed,
        })
    }

    /// Creates the next level's progress row so it shows as started.
    ///
    /// Only the immediate next level is touched; deeper levels stay locked
    /// until their predecessors complete.
    fn cascade_unlock(
        &self,
        user: UserId,
        level: &Level,
        now: DateTime<Utc>,
    ) -> Result<(), ServiceError> {
        let Some(next) = self.store.level_by_number(level.number + 1)? else {
            return Ok(());
        };
        if self.store.progress(user, next.id)?.is_none() {
            self.store
                .put_progress(LevelProgress::start(user, next.id, now))?;
            log::info!("[LEVEL] unlocked user:{user} level:{}", next.number);
        }
        Ok(())
    }

    /// Returns whether a level is unlocked for a user.
    ///
    /// Level 1 is always unlocked; level N requires a completed progress row
    /// on level N−1.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UserNotFound`] for an unregistered user.
    pub fn is_level_unlocked(&self, user: UserId, level_number: u32) -> Result<bool, ServiceError> {
        if level_number <= 1 {
            return Ok(true);
        }
        let previous = match self.store.level_by_number(level_number - 1)? {
            Some(level) => self.store.progress(user, level.id)?,
            None => None,
        };
        Ok(is_unlocked(level_number, previous.as_ref()))
    }

    // ---- achievements ----

    /// Grants every active achievement the user newly qualifies for.
    ///
    /// Safe to call any number of times: the unique (user, achievement)
    /// constraint turns repeats into no-ops. Each grant adds the
    /// achievement's reward to the user's total score.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UserNotFound`] for an unregistered user.
    pub fn evaluate_achievements(
        &self,
        user: UserId,
    ) -> Result<Vec<AchievementId>, ServiceError> {
        self.with_user_lock(user, || self.evaluate_achievements_locked(user, Utc::now()))
    }

    fn evaluate_achievements_locked(
        &self,
        user: UserId,
        now: DateTime<Utc>,
    ) -> Result<Vec<AchievementId>, ServiceError> {
        let stats = self.store.user_stats(user)?;
        let achievements = self.store.active_achievements()?;
        let earned = self.store.earned_achievements(user)?;

        let mut granted = Vec::new();
        for achievement in evaluate(&achievements, &stats, &earned) {
            if self.store.grant_achievement(user, achievement.id, now)? {
                self.store
                    .add_user_score(user, u64::from(achievement.points_reward))?;
                log::info!(
                    "[ACHIEVEMENT] granted user:{user} achievement:{} name:{:?}",
                    achievement.id,
                    achievement.name
                );
                granted.push(achievement.id);
            }
        }
        Ok(granted)
    }

    // ---- content authoring ----

    /// Registers a user id with the platform.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateUser`] if the id is taken.
    pub fn register_user(&self, user: UserId) -> Result<(), ServiceError> {
        self.store.insert_user(user)?;
        Ok(())
    }

    /// Registers a puzzle. Requires the content-author capability.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Forbidden`] without it, or
    /// [`StoreError::DuplicatePuzzle`] for a taken id.
    pub fn register_puzzle(&self, caps: Capabilities, puzzle: Puzzle) -> Result<(), ServiceError> {
        require_author(caps)?;
        self.store.insert_puzzle(puzzle)?;
        Ok(())
    }

    /// Registers a level. Requires the content-author capability.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Forbidden`] without it, or
    /// [`StoreError::DuplicateLevel`] for a taken id or ladder number.
    pub fn register_level(&self, caps: Capabilities, level: Level) -> Result<(), ServiceError> {
        require_author(caps)?;
        self.store.insert_level(level)?;
        Ok(())
    }

    /// Assigns a puzzle to a level slot. Requires the content-author
    /// capability.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Forbidden`] without it, or a [`StoreError`]
    /// for dangling references and duplicate assignments.
    pub fn assign_puzzle_to_level(
        &self,
        caps: Capabilities,
        slot: LevelSlot,
    ) -> Result<(), ServiceError> {
        require_author(caps)?;
        self.store.insert_slot(slot)?;
        Ok(())
    }

    /// Registers an achievement. Requires the content-author capability.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Forbidden`] without it, or
    /// [`StoreError::DuplicateAchievement`] for a taken id.
    pub fn register_achievement(
        &self,
        caps: Capabilities,
        achievement: Achievement,
    ) -> Result<(), ServiceError> {
        require_author(caps)?;
        self.store.insert_achievement(achievement)?;
        Ok(())
    }
}

fn require_author(caps: Capabilities) -> Result<(), ServiceError> {
    if caps.can_author_content() {
        Ok(())
    } else {
        Err(ServiceError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use shapelace_store::MemoryStore;

    use super::*;
    use crate::Role;

    #[test]
    fn test_authoring_requires_capability() {
        let service = PlatformService::new(MemoryStore::new());
        let level = Level {
            id: LevelId::new(1),
            number: 1,
            name: "One".into(),
            puzzles_required: 1,
            is_active: true,
        };

        let player = Capabilities::for_role(Role::Player);
        assert_eq!(
            service.register_level(player, level.clone()).unwrap_err(),
            ServiceError::Forbidden
        );

        let admin = Capabilities::for_role(Role::Admin);
        service.register_level(admin, level).unwrap();
    }

    #[test]
    fn test_store_errors_pass_through() {
        let service = PlatformService::new(MemoryStore::new());
        let result = service.validate_placement(PuzzleId::new(404), &Placements::new());
        assert_eq!(
            result.unwrap_err(),
            ServiceError::Store(StoreError::PuzzleNotFound {
                id: PuzzleId::new(404)
            })
        );
    }
}
