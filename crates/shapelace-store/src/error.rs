//! Storage error taxonomy.

use derive_more::{Display, Error};
use shapelace_core::{AchievementId, LevelId, PuzzleId, UserId};

/// Error raised by a store operation.
///
/// `*NotFound` variants surface dangling references without partial
/// mutation; `Duplicate*` variants reject re-registration of content that
/// already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum StoreError {
    /// No puzzle with the given id.
    #[display("puzzle {id} not found")]
    PuzzleNotFound {
        /// The missing id.
        id: PuzzleId,
    },
    /// No level with the given id.
    #[display("level {id} not found")]
    LevelNotFound {
        /// The missing id.
        id: LevelId,
    },
    /// No user with the given id.
    #[display("user {id} not found")]
    UserNotFound {
        /// The missing id.
        id: UserId,
    },
    /// No achievement with the given id.
    #[display("achievement {id} not found")]
    AchievementNotFound {
        /// The missing id.
        id: AchievementId,
    },
    /// No attempt exists for the (user, puzzle) pair.
    #[display("no attempt for user {user} on puzzle {puzzle}")]
    AttemptNotFound {
        /// The user.
        user: UserId,
        /// The puzzle.
        puzzle: PuzzleId,
    },
    /// A puzzle with this id is already registered.
    #[display("puzzle {id} already registered")]
    DuplicatePuzzle {
        /// The conflicting id.
        id: PuzzleId,
    },
    /// A level with this id or number is already registered.
    #[display("level {id} (number {number}) already registered")]
    DuplicateLevel {
        /// The conflicting id.
        id: LevelId,
        /// The conflicting ladder position.
        number: u32,
    },
    /// A user with this id is already registered.
    #[display("user {id} already registered")]
    DuplicateUser {
        /// The conflicting id.
        id: UserId,
    },
    /// An achievement with this id is already registered.
    #[display("achievement {id} already registered")]
    DuplicateAchievement {
        /// The conflicting id.
        id: AchievementId,
    },
    /// The puzzle is already assigned to a level slot.
    #[display("puzzle {puzzle} is already assigned to a level")]
    DuplicateSlot {
        /// The conflicting puzzle.
        puzzle: PuzzleId,
    },
}
