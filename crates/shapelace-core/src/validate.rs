//! Pure validation and scoring of player placements.
//!
//! The same function serves live "validate as you go" feedback on partial
//! placements and final scoring at completion; callers never special-case
//! one or the other.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{Coord, Puzzle, ShapeId};

/// A player's placements, keyed by blank-cell coordinate.
///
/// May be partial while a puzzle is in progress.
pub type Placements = BTreeMap<Coord, ShapeId>;

/// Per-coordinate outcome of a validation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlacementCheck {
    /// Whether the placed shape matches the solution.
    #[serde(rename = "correct")]
    pub is_correct: bool,
    /// The expected shape, or `None` for a coordinate outside the solution.
    pub expected: Option<ShapeId>,
    /// The shape the player placed.
    pub placed: ShapeId,
}

/// Result of validating a set of placements against a puzzle.
///
/// Serialized field names match the existing client protocol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    /// Number of placements matching the solution.
    pub correct_count: u32,
    /// Number of placements differing from the solution, including
    /// placements at coordinates the solution does not cover.
    pub incorrect_count: u32,
    /// Number of blank cells in the puzzle.
    #[serde(rename = "total_questions")]
    pub total_blanks: u32,
    /// Percentage of blanks answered correctly, in [0, 100], rounded to two
    /// decimal places.
    pub accuracy: f64,
    /// Earned score; never negative.
    #[serde(rename = "final_score")]
    pub score: u32,
    /// Whether every blank cell has a placement.
    pub is_complete: bool,
    /// Whether the puzzle is complete with no incorrect placements.
    pub is_perfect: bool,
    /// Per-coordinate outcomes for client-side highlighting.
    #[serde(rename = "validation_details")]
    pub details: BTreeMap<Coord, PlacementCheck>,
}

/// Validates placements against the puzzle's solution.
///
/// Placements at coordinates the solution does not cover are scored as
/// incorrect rather than rejected. That permissive-but-penalizing policy is
/// carried over from the original platform and is deliberate: clients that
/// submit a stray coordinate lose points instead of getting an error.
///
/// The score is `correct × points_per_correct − incorrect ×
/// penalty_per_wrong`, floored at zero.
///
/// # Example
///
/// ```
/// # use std::collections::{BTreeMap, BTreeSet};
/// # use shapelace_core::{
/// #     Cell, Coord, Difficulty, GridTemplate, Puzzle, PuzzleId, Scoring, ShapeId,
/// #     validate::validate_placements,
/// # };
/// # let shape = ShapeId::new(1);
/// # let template = GridTemplate::new(
/// #     1,
/// #     vec![vec![Cell::Blank]],
/// #     Difficulty::Easy,
/// # ).unwrap();
/// # let puzzle = Puzzle::new(
/// #     PuzzleId::new(1),
/// #     template,
/// #     BTreeSet::from([shape]),
/// #     BTreeMap::from([(Coord::new(0, 0), shape)]),
/// #     Scoring::new(10, 5),
/// #     30,
/// # ).unwrap();
/// let report = validate_placements(&puzzle, &BTreeMap::new());
/// assert_eq!(report.score, 0);
/// assert!(!report.is_complete);
///
/// let report = validate_placements(&puzzle, &BTreeMap::from([(Coord::new(0, 0), shape)]));
/// assert_eq!(report.score, 10);
/// assert!(report.is_perfect);
/// ```
#[must_use]
pub fn validate_placements(puzzle: &Puzzle, placements: &Placements) -> ValidationReport {
    let total_blanks = u32::try_from(puzzle.template().blank_count()).unwrap_or(u32::MAX);

    let mut correct_count = 0u32;
    let mut incorrect_count = 0u32;
    let mut details = BTreeMap::new();

    for (&coord, &placed) in placements {
        let expected = puzzle.expected(coord);
        let is_correct = expected == Some(placed);
        if is_correct {
            correct_count += 1;
        } else {
            incorrect_count += 1;
        }
        details.insert(
            coord,
            PlacementCheck {
                is_correct,
                expected,
                placed,
            },
        );
    }

    let accuracy = if total_blanks == 0 {
        0.0
    } else {
        round2(f64::from(correct_count) / f64::from(total_blanks) * 100.0)
    };

    let scoring = puzzle.scoring();
    let earned = i64::from(correct_count) * i64::from(scoring.points_per_correct())
        - i64::from(incorrect_count) * i64::from(scoring.penalty_per_wrong());
    let score = u32::try_from(earned.max(0)).unwrap_or(u32::MAX);

    let is_complete = placements.len() == puzzle.template().blank_count();
    let is_perfect = is_complete && incorrect_count == 0;

    ValidationReport {
        correct_count,
        incorrect_count,
        total_blanks,
        accuracy,
        score,
        is_complete,
        is_perfect,
        details,
    }
}

/// A suggested next placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Hint {
    /// The blank coordinate to fill.
    pub coord: Coord,
    /// The shape that belongs there.
    pub shape: ShapeId,
}

/// Returns the first (row-major) blank cell without a placement, together
/// with its expected shape.
///
/// Returns `None` once every blank cell has a placement.
#[must_use]
pub fn next_hint(puzzle: &Puzzle, placements: &Placements) -> Option<Hint> {
    puzzle.template().blank_cells().find_map(|coord| {
        if placements.contains_key(&coord) {
            return None;
        }
        puzzle
            .expected(coord)
            .map(|shape| Hint { coord, shape })
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
