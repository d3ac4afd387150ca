//! A user's play-through record for one puzzle.

use chrono::{DateTime, Utc};
use derive_more::{Display, Error, IsVariant};
use serde::{Deserialize, Serialize};
use shapelace_core::{
    Placements, Puzzle, PuzzleId, UserId, validate::validate_placements,
};
use uuid::Uuid;

/// Unique identifier of an attempt.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize,
)]
#[display("{_0}")]
#[serde(transparent)]
pub struct AttemptId(Uuid);

impl AttemptId {
    /// Generates a fresh random identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    #[must_use]
    pub const fn as_uuid(self) -> Uuid {
        self.0
    }
}

/// Lifecycle state of an attempt.
///
/// Wire strings match the existing store: `"in_progress"`, `"completed"`,
/// `"abandoned"`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IsVariant, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    /// The user is still playing.
    #[display("in_progress")]
    InProgress,
    /// The attempt was finalized and scored.
    #[display("completed")]
    Completed,
    /// The user walked away without finishing.
    #[display("abandoned")]
    Abandoned,
}

/// The frozen outcome of a finalized attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptResult {
    /// Earned score, floored at zero.
    pub score: u32,
    /// Percentage accuracy in [0, 100].
    pub accuracy: f64,
    /// Correct placements at finalization.
    pub correct_count: u32,
    /// Incorrect placements at finalization.
    pub incorrect_count: u32,
    /// Whether every blank was filled and no placement was wrong.
    pub is_perfect: bool,
    /// Wall-clock seconds from start to finalization, never negative.
    pub time_taken_secs: i64,
}

/// What a finalize call did.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizeOutcome {
    /// The scored result (stored, for a repeated call).
    pub result: AttemptResult,
    /// `true` if this call performed the scoring; `false` if the attempt was
    /// already completed and the stored result is returned.
    pub newly_completed: bool,
}

/// Error raised by an invalid lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum AttemptError {
    /// A mutation was attempted on a terminal attempt.
    #[display("attempt is {status}, not in progress")]
    NotInProgress {
        /// The terminal status.
        status: AttemptStatus,
    },
    /// A finalize was attempted on an abandoned attempt.
    #[display("attempt was abandoned")]
    AttemptAbandoned,
    /// An abandon was attempted on a completed attempt.
    #[display("attempt is already completed")]
    AlreadyCompleted,
    /// The supplied puzzle does not match the attempt.
    #[display("attempt belongs to puzzle {expected}, got {found}")]
    PuzzleMismatch {
        /// The puzzle the attempt belongs to.
        expected: PuzzleId,
        /// The puzzle that was supplied.
        found: PuzzleId,
    },
}

/// Completion carries the result, so a completed attempt always has one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum Phase {
    InProgress,
    Completed {
        result: AttemptResult,
    },
    Abandoned,
}

/// One user's play of one puzzle.
///
/// At most one attempt exists per (user, puzzle) pair; the persistence layer
/// keys attempts accordingly. Replays overwrite the stored record with a
/// fresh in-progress attempt.
///
/// # Example
///
/// ```
/// use std::collections::{BTreeMap, BTreeSet};
///
/// use chrono::{TimeDelta, Utc};
/// use shapelace_core::{
///     Cell, Coord, Difficulty, GridTemplate, Puzzle, PuzzleId, Scoring, ShapeId, UserId,
/// };
/// use shapelace_game::{Attempt, AttemptId};
///
/// let shape = ShapeId::new(1);
/// let template = GridTemplate::new(1, vec![vec![Cell::Blank]], Difficulty::Easy)?;
/// let puzzle = Puzzle::new(
///     PuzzleId::new(1),
///     template,
///     BTreeSet::from([shape]),
///     BTreeMap::from([(Coord::new(0, 0), shape)]),
///     Scoring::new(10, 5),
///     30,
/// )?;
///
/// let started = Utc::now();
/// let mut attempt = Attempt::start(AttemptId::random(), UserId::new(1), puzzle.id(), started);
/// attempt.save_state(BTreeMap::from([(Coord::new(0, 0), shape)]))?;
///
/// let outcome = attempt.finalize(&puzzle, started + TimeDelta::seconds(42))?;
/// assert!(outcome.newly_completed);
/// assert_eq!(outcome.result.score, 10);
/// assert_eq!(outcome.result.time_taken_secs, 42);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    id: AttemptId,
    user: UserId,
    puzzle: PuzzleId,
    current_state: Placements,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    phase: Phase,
}

impl Attempt {
    /// Starts a new in-progress attempt with an empty placement state.
    #[must_use]
    pub fn start(id: AttemptId, user: UserId, puzzle: PuzzleId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user,
            puzzle,
            current_state: Placements::new(),
            started_at: now,
            ended_at: None,
            phase: Phase::InProgress,
        }
    }

    /// Returns the attempt identifier.
    #[must_use]
    pub const fn id(&self) -> AttemptId {
        self.id
    }

    /// Returns the owning user.
    #[must_use]
    pub const fn user(&self) -> UserId {
        self.user
    }

    /// Returns the puzzle this attempt plays.
    #[must_use]
    pub const fn puzzle(&self) -> PuzzleId {
        self.puzzle
    }

    /// Returns the current placement state.
    #[must_use]
    pub const fn current_state(&self) -> &Placements {
        &self.current_state
    }

    /// Returns the start timestamp.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Returns the end timestamp, set when the attempt leaves `in_progress`.
    #[must_use]
    pub const fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> AttemptStatus {
        match self.phase {
            Phase::InProgress => AttemptStatus::InProgress,
            Phase::Completed { .. } => AttemptStatus::Completed,
            Phase::Abandoned => AttemptStatus::Abandoned,
        }
    }

    /// Returns the scored result, present once the attempt is completed.
    #[must_use]
    pub const fn result(&self) -> Option<&AttemptResult> {
        match &self.phase {
            Phase::Completed { result } => Some(result),
            Phase::InProgress | Phase::Abandoned => None,
        }
    }

    /// Replaces the placement state with the supplied mapping.
    ///
    /// The new mapping wins wholesale: entries absent from `placements` are
    /// dropped, not merged. Clients submit their complete board state on
    /// every save.
    ///
    /// # Errors
    ///
    /// Returns [`AttemptError::NotInProgress`] if the attempt is terminal.
    pub fn save_state(&mut self, placements: Placements) -> Result<(), AttemptError> {
        self.ensure_in_progress()?;
        self.current_state = placements;
        Ok(())
    }

    /// Finalizes the attempt, scoring the current placement state.
    ///
    /// The first call validates `current_state` against `puzzle`, stamps the
    /// end time, and transitions to `completed`. Any later call returns the
    /// stored result with `newly_completed = false` and performs no scoring,
    /// so duplicate completion requests cannot double-credit.
    ///
    /// # Errors
    ///
    /// Returns [`AttemptError::PuzzleMismatch`] if `puzzle` is not the
    /// puzzle this attempt plays, and [`AttemptError::AttemptAbandoned`] if
    /// the attempt was abandoned.
    pub fn finalize(
        &mut self,
        puzzle: &Puzzle,
        now: DateTime<Utc>,
    ) -> Result<FinalizeOutcome, AttemptError> {
        if puzzle.id() != self.puzzle {
            return Err(AttemptError::PuzzleMismatch {
                expected: self.puzzle,
                found: puzzle.id(),
            });
        }

        match &self.phase {
            Phase::Completed { result } => Ok(FinalizeOutcome {
                result: result.clone(),
                newly_completed: false,
            }),
            Phase::Abandoned => Err(AttemptError::AttemptAbandoned),
            Phase::InProgress => {
                let report = validate_placements(puzzle, &self.current_state);
                let result = AttemptResult {
                    score: report.score,
                    accuracy: report.accuracy,
                    correct_count: report.correct_count,
                    incorrect_count: report.incorrect_count,
                    is_perfect: report.is_perfect,
                    time_taken_secs: (now - self.started_at).num_seconds().max(0),
                };
                self.ended_at = Some(now);
                self.phase = Phase::Completed {
                    result: result.clone(),
                };
                Ok(FinalizeOutcome {
                    result,
                    newly_completed: true,
                })
            }
        }
    }

    /// Abandons an in-progress attempt.
    ///
    /// Abandoning an already abandoned attempt is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`AttemptError::AlreadyCompleted`] if the attempt was
    /// finalized.
    pub fn abandon(&mut self, now: DateTime<Utc>) -> Result<(), AttemptError> {
        match self.phase {
            Phase::InProgress => {
                self.ended_at = Some(now);
                self.phase = Phase::Abandoned;
                Ok(())
            }
            Phase::Abandoned => Ok(()),
            Phase::Completed { .. } => Err(AttemptError::AlreadyCompleted),
        }
    }

    fn ensure_in_progress(&self) -> Result<(), AttemptError> {
        match self.phase {
            Phase::InProgress => Ok(()),
            Phase::Completed { .. } | Phase::Abandoned => Err(AttemptError::NotInProgress {
                status: self.status(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use chrono::TimeDelta;
    use shapelace_core::{Cell, Coord, Difficulty, GridTemplate, Scoring, ShapeId};

    use super::*;

    const SHAPE_X: ShapeId = ShapeId::new(1);
    const SHAPE_Y: ShapeId = ShapeId::new(2);

    fn puzzle() -> Puzzle {
        let template = GridTemplate::new(
            2,
            vec![
                vec![Cell::Blank, Cell::Blank],
                vec![Cell::Empty, Cell::Empty],
            ],
            Difficulty::Easy,
        )
        .unwrap();
        Puzzle::new(
            PuzzleId::new(7),
            template,
            BTreeSet::from([SHAPE_X, SHAPE_Y]),
            BTreeMap::from([
                (Coord::new(0, 0), SHAPE_X),
                (Coord::new(0, 1), SHAPE_Y),
            ]),
            Scoring::new(10, 5),
            30,
        )
        .unwrap()
    }

    fn started_attempt() -> (Attempt, DateTime<Utc>) {
        let now = Utc::now();
        let attempt = Attempt::start(AttemptId::random(), UserId::new(1), PuzzleId::new(7), now);
        (attempt, now)
    }

    #[test]
    fn test_start_is_in_progress_and_empty() {
        let (attempt, now) = started_attempt();
        assert!(attempt.status().is_in_progress());
        assert!(attempt.current_state().is_empty());
        assert_eq!(attempt.started_at(), now);
        assert_eq!(attempt.ended_at(), None);
        assert_eq!(attempt.result(), None);
    }

    #[test]
    fn test_save_state_replaces_wholesale() {
        let (mut attempt, _) = started_attempt();
        attempt
            .save_state(BTreeMap::from([
                (Coord::new(0, 0), SHAPE_X),
                (Coord::new(0, 1), SHAPE_Y),
            ]))
            .unwrap();

        // A later save with fewer entries drops the missing ones.
        attempt
            .save_state(BTreeMap::from([(Coord::new(0, 1), SHAPE_Y)]))
            .unwrap();
        assert_eq!(attempt.current_state().len(), 1);
        assert!(!attempt.current_state().contains_key(&Coord::new(0, 0)));
    }

    #[test]
    fn test_finalize_scores_current_state() {
        let (mut attempt, started) = started_attempt();
        attempt
            .save_state(BTreeMap::from([
                (Coord::new(0, 0), SHAPE_X),
                (Coord::new(0, 1), SHAPE_X), // wrong
            ]))
            .unwrap();

        let outcome = attempt
            .finalize(&puzzle(), started + TimeDelta::seconds(90))
            .unwrap();
        assert!(outcome.newly_completed);
        assert_eq!(outcome.result.score, 5);
        assert_eq!(outcome.result.accuracy, 50.0);
        assert_eq!(outcome.result.correct_count, 1);
        assert_eq!(outcome.result.incorrect_count, 1);
        assert!(!outcome.result.is_perfect);
        assert_eq!(outcome.result.time_taken_secs, 90);
        assert!(attempt.status().is_completed());
        assert_eq!(attempt.result(), Some(&outcome.result));
    }

    #[test]
    fn test_finalize_twice_returns_stored_result() {
        let (mut attempt, started) = started_attempt();
        attempt
            .save_state(BTreeMap::from([(Coord::new(0, 0), SHAPE_X)]))
            .unwrap();

        let first = attempt
            .finalize(&puzzle(), started + TimeDelta::seconds(10))
            .unwrap();
        assert!(first.newly_completed);

        // The second call must not re-score, even with more time elapsed and
        // different state mutations attempted in between.
        let second = attempt
            .finalize(&puzzle(), started + TimeDelta::seconds(500))
            .unwrap();
        assert!(!second.newly_completed);
        assert_eq!(second.result, first.result);
    }

    #[test]
    fn test_finalize_empty_state_scores_zero() {
        let (mut attempt, started) = started_attempt();
        let outcome = attempt
            .finalize(&puzzle(), started + TimeDelta::seconds(1))
            .unwrap();
        assert_eq!(outcome.result.score, 0);
        assert_eq!(outcome.result.accuracy, 0.0);
        assert!(!outcome.result.is_perfect);
    }

    #[test]
    fn test_finalize_clamps_negative_duration() {
        let (mut attempt, started) = started_attempt();
        let outcome = attempt
            .finalize(&puzzle(), started - TimeDelta::seconds(5))
            .unwrap();
        assert_eq!(outcome.result.time_taken_secs, 0);
    }

    #[test]
    fn test_save_after_finalize_is_rejected() {
        let (mut attempt, started) = started_attempt();
        attempt.finalize(&puzzle(), started).unwrap();

        let result = attempt.save_state(BTreeMap::from([(Coord::new(0, 0), SHAPE_X)]));
        assert_eq!(
            result.unwrap_err(),
            AttemptError::NotInProgress {
                status: AttemptStatus::Completed
            }
        );
    }

    #[test]
    fn test_puzzle_mismatch_rejected_without_mutation() {
        let (mut attempt, started) = started_attempt();
        let template =
            GridTemplate::new(1, vec![vec![Cell::Blank]], Difficulty::Easy).unwrap();
        let other = Puzzle::new(
            PuzzleId::new(99),
            template,
            BTreeSet::from([SHAPE_X]),
            BTreeMap::from([(Coord::new(0, 0), SHAPE_X)]),
            Scoring::default(),
            30,
        )
        .unwrap();

        let result = attempt.finalize(&other, started);
        assert_eq!(
            result.unwrap_err(),
            AttemptError::PuzzleMismatch {
                expected: PuzzleId::new(7),
                found: PuzzleId::new(99)
            }
        );
        assert!(attempt.status().is_in_progress());
    }

    #[test]
    fn test_abandon_semantics() {
        let (mut attempt, started) = started_attempt();
        attempt.abandon(started).unwrap();
        assert!(attempt.status().is_abandoned());

        // Repeat abandon is a no-op.
        attempt.abandon(started).unwrap();

        // Abandoned attempts cannot be finalized.
        assert_eq!(
            attempt.finalize(&puzzle(), started).unwrap_err(),
            AttemptError::AttemptAbandoned
        );

        // Completed attempts cannot be abandoned.
        let (mut completed, now) = started_attempt();
        completed.finalize(&puzzle(), now).unwrap();
        assert_eq!(
            completed.abandon(now).unwrap_err(),
            AttemptError::AlreadyCompleted
        );
    }

    #[test]
    fn test_status_wire_strings() {
        assert_eq!(
            serde_json::to_string(&AttemptStatus::InProgress).unwrap(),
            r#""in_progress""#
        );
        assert_eq!(
            serde_json::to_string(&AttemptStatus::Completed).unwrap(),
            r#""completed""#
        );
        assert_eq!(
            serde_json::to_string(&AttemptStatus::Abandoned).unwrap(),
            r#""abandoned""#
        );
    }

    #[test]
    fn test_attempt_serde_round_trip() {
        let (mut attempt, started) = started_attempt();
        attempt
            .save_state(BTreeMap::from([(Coord::new(0, 0), SHAPE_X)]))
            .unwrap();
        attempt
            .finalize(&puzzle(), started + TimeDelta::seconds(3))
            .unwrap();

        let json = serde_json::to_string(&attempt).unwrap();
        let back: Attempt = serde_json::from_str(&json).unwrap();
        assert_eq!(back, attempt);
    }
}
