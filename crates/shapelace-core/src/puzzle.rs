//! Puzzles: a grid template paired with its authoritative solution.

use std::collections::{BTreeMap, BTreeSet};

use derive_more::{Display, Error};
use serde::{Deserialize, Deserializer, Serialize, de};

use crate::{Coord, GridTemplate, PuzzleId, ShapeId};

/// Scoring parameters for a puzzle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoring {
    points_per_correct: u32,
    penalty_per_wrong: u32,
}

impl Scoring {
    /// Creates scoring parameters.
    #[must_use]
    pub const fn new(points_per_correct: u32, penalty_per_wrong: u32) -> Self {
        Self {
            points_per_correct,
            penalty_per_wrong,
        }
    }

    /// Points awarded per correct placement.
    #[must_use]
    pub const fn points_per_correct(self) -> u32 {
        self.points_per_correct
    }

    /// Points deducted per wrong placement.
    #[must_use]
    pub const fn penalty_per_wrong(self) -> u32 {
        self.penalty_per_wrong
    }
}

impl Default for Scoring {
    fn default() -> Self {
        Self::new(10, 5)
    }
}

/// A playable puzzle.
///
/// Owns one [`GridTemplate`], the set of shapes the player may place, and
/// the solution mapping each blank coordinate to its expected shape.
/// Construction verifies the solution covers the blank set exactly and only
/// references available shapes; afterwards the puzzle is read-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Puzzle {
    id: PuzzleId,
    template: GridTemplate,
    available_shapes: BTreeSet<ShapeId>,
    solution: BTreeMap<Coord, ShapeId>,
    scoring: Scoring,
    max_time_minutes: u32,
}

/// Error raised when a puzzle definition is inconsistent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum PuzzleError {
    /// A blank cell has no solution entry.
    #[display("solution has no entry for blank cell {coord}")]
    MissingSolutionEntry {
        /// The uncovered blank coordinate.
        coord: Coord,
    },
    /// A solution entry targets a cell that is not blank.
    #[display("solution entry {coord} does not target a blank cell")]
    SolutionTargetsNonBlank {
        /// The offending coordinate.
        coord: Coord,
    },
    /// The solution references a shape that is not available in this puzzle.
    #[display("solution places shape {shape} at {coord}, but that shape is not available")]
    UnavailableShape {
        /// The coordinate of the entry.
        coord: Coord,
        /// The unavailable shape.
        shape: ShapeId,
    },
}

impl Puzzle {
    /// Creates a puzzle, validating the solution against the template.
    ///
    /// # Errors
    ///
    /// Returns [`PuzzleError::MissingSolutionEntry`] if a blank cell is not
    /// covered, [`PuzzleError::SolutionTargetsNonBlank`] if an entry targets
    /// a fixed or empty cell, and [`PuzzleError::UnavailableShape`] if an
    /// entry references a shape outside `available_shapes`.
    pub fn new(
        id: PuzzleId,
        template: GridTemplate,
        available_shapes: BTreeSet<ShapeId>,
        solution: BTreeMap<Coord, ShapeId>,
        scoring: Scoring,
        max_time_minutes: u32,
    ) -> Result<Self, PuzzleError> {
        for coord in template.blank_cells() {
            if !solution.contains_key(&coord) {
                return Err(PuzzleError::MissingSolutionEntry { coord });
            }
        }
        for (&coord, &shape) in &solution {
            if !template.is_blank(coord) {
                return Err(PuzzleError::SolutionTargetsNonBlank { coord });
            }
            if !available_shapes.contains(&shape) {
                return Err(PuzzleError::UnavailableShape { coord, shape });
            }
        }

        Ok(Self {
            id,
            template,
            available_shapes,
            solution,
            scoring,
            max_time_minutes,
        })
    }

    /// Returns the puzzle identifier.
    #[must_use]
    pub const fn id(&self) -> PuzzleId {
        self.id
    }

    /// Returns the grid template.
    #[must_use]
    pub const fn template(&self) -> &GridTemplate {
        &self.template
    }

    /// Returns the shapes available for placement.
    #[must_use]
    pub const fn available_shapes(&self) -> &BTreeSet<ShapeId> {
        &self.available_shapes
    }

    /// Returns the expected shape for a coordinate, if it has a solution
    /// entry.
    #[must_use]
    pub fn expected(&self, coord: Coord) -> Option<ShapeId> {
        self.solution.get(&coord).copied()
    }

    /// Returns the solution mapping.
    #[must_use]
    pub const fn solution(&self) -> &BTreeMap<Coord, ShapeId> {
        &self.solution
    }

    /// Returns the scoring parameters.
    #[must_use]
    pub const fn scoring(&self) -> Scoring {
        self.scoring
    }

    /// Returns the time limit in minutes.
    ///
    /// The limit is advisory: it is shipped to clients for countdown display
    /// and is not enforced at finalization.
    #[must_use]
    pub const fn max_time_minutes(&self) -> u32 {
        self.max_time_minutes
    }

    /// Returns the maximum achievable score.
    #[must_use]
    pub fn max_score(&self) -> u32 {
        let blanks = u32::try_from(self.template.blank_count()).unwrap_or(u32::MAX);
        blanks.saturating_mul(self.scoring.points_per_correct)
    }
}

// Mirrors the `GridTemplate` pattern: stored puzzles re-validate on load.
impl<'de> Deserialize<'de> for Puzzle {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Wire {
            id: PuzzleId,
            template: GridTemplate,
            available_shapes: BTreeSet<ShapeId>,
            solution: BTreeMap<Coord, ShapeId>,
            scoring: Scoring,
            max_time_minutes: u32,
        }

        let wire = Wire::deserialize(deserializer)?;
        Self::new(
            wire.id,
            wire.template,
            wire.available_shapes,
            wire.solution,
            wire.scoring,
            wire.max_time_minutes,
        )
        .map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Cell, Difficulty};

    fn template() -> GridTemplate {
        GridTemplate::new(
            3,
            vec![
                vec![Cell::Fixed(ShapeId::new(1)), Cell::Empty, Cell::Empty],
                vec![Cell::Empty, Cell::Blank, Cell::Empty],
                vec![Cell::Empty, Cell::Blank, Cell::Fixed(ShapeId::new(1))],
            ],
            Difficulty::Easy,
        )
        .unwrap()
    }

    fn shapes() -> BTreeSet<ShapeId> {
        BTreeSet::from([ShapeId::new(1), ShapeId::new(2), ShapeId::new(3)])
    }

    #[test]
    fn test_valid_puzzle() {
        let solution = BTreeMap::from([
            (Coord::new(1, 1), ShapeId::new(2)),
            (Coord::new(2, 1), ShapeId::new(3)),
        ]);
        let puzzle = Puzzle::new(
            PuzzleId::new(1),
            template(),
            shapes(),
            solution,
            Scoring::default(),
            30,
        )
        .unwrap();

        assert_eq!(puzzle.expected(Coord::new(1, 1)), Some(ShapeId::new(2)));
        assert_eq!(puzzle.expected(Coord::new(0, 0)), None);
        assert_eq!(puzzle.max_score(), 20);
    }

    #[test]
    fn test_missing_solution_entry() {
        let solution = BTreeMap::from([(Coord::new(1, 1), ShapeId::new(2))]);
        let result = Puzzle::new(
            PuzzleId::new(1),
            template(),
            shapes(),
            solution,
            Scoring::default(),
            30,
        );
        assert_eq!(
            result.unwrap_err(),
            PuzzleError::MissingSolutionEntry {
                coord: Coord::new(2, 1)
            }
        );
    }

    #[test]
    fn test_solution_targets_non_blank() {
        let solution = BTreeMap::from([
            (Coord::new(1, 1), ShapeId::new(2)),
            (Coord::new(2, 1), ShapeId::new(3)),
            (Coord::new(0, 0), ShapeId::new(2)),
        ]);
        let result = Puzzle::new(
            PuzzleId::new(1),
            template(),
            shapes(),
            solution,
            Scoring::default(),
            30,
        );
        assert_eq!(
            result.unwrap_err(),
            PuzzleError::SolutionTargetsNonBlank {
                coord: Coord::new(0, 0)
            }
        );
    }

    #[test]
    fn test_unavailable_shape() {
        let solution = BTreeMap::from([
            (Coord::new(1, 1), ShapeId::new(9)),
            (Coord::new(2, 1), ShapeId::new(3)),
        ]);
        let result = Puzzle::new(
            PuzzleId::new(1),
            template(),
            shapes(),
            solution,
            Scoring::default(),
            30,
        );
        assert_eq!(
            result.unwrap_err(),
            PuzzleError::UnavailableShape {
                coord: Coord::new(1, 1),
                shape: ShapeId::new(9)
            }
        );
    }

    #[test]
    fn test_wire_solution_keys() {
        // Solution maps use "row,col" string keys in the stored format.
        let solution: BTreeMap<Coord, ShapeId> =
            serde_json::from_str(r#"{"1,1": 2, "2,1": 3}"#).unwrap();
        assert_eq!(solution[&Coord::new(1, 1)], ShapeId::new(2));
        assert_eq!(solution[&Coord::new(2, 1)], ShapeId::new(3));
    }
}
