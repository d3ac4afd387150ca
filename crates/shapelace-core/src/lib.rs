//! Core data structures for shape-placement puzzles.
//!
//! This crate provides the fundamental types for representing and validating
//! shape-placement puzzles: an N×N grid template with fixed, empty, and blank
//! cells; a puzzle pairing a template with an authoritative solution; and a
//! pure validator that scores a player's placements.
//!
//! # Overview
//!
//! The crate is organized around three main concepts:
//!
//! 1. **Identifiers** - Typed ids shared across the platform
//!    - [`id`]: newtypes for shapes, puzzles, users, levels, and achievements
//!    - [`coord`]: grid coordinates with the `"row,col"` wire encoding
//!
//! 2. **Grid model** - The authoritative puzzle definition
//!    - [`cell`]: the fixed/empty/blank cell vocabulary
//!    - [`grid`]: validated N×N grid templates
//!    - [`puzzle`]: a template plus solution mapping and scoring parameters
//!
//! 3. **Validation** - Pure scoring of player placements
//!    - [`validate`]: per-cell correctness, accuracy, score, and hints
//!
//! # Examples
//!
//! ```
//! use std::collections::{BTreeMap, BTreeSet};
//!
//! use shapelace_core::{
//!     Cell, Coord, Difficulty, GridTemplate, Puzzle, PuzzleId, Scoring, ShapeId,
//!     validate::validate_placements,
//! };
//!
//! let circle = ShapeId::new(1);
//! let template = GridTemplate::new(
//!     3,
//!     vec![
//!         vec![Cell::Fixed(circle), Cell::Empty, Cell::Empty],
//!         vec![Cell::Empty, Cell::Blank, Cell::Empty],
//!         vec![Cell::Empty, Cell::Empty, Cell::Fixed(circle)],
//!     ],
//!     Difficulty::Easy,
//! )?;
//!
//! let square = ShapeId::new(2);
//! let solution = BTreeMap::from([(Coord::new(1, 1), square)]);
//! let shapes = BTreeSet::from([circle, square]);
//! let puzzle = Puzzle::new(PuzzleId::new(1), template, shapes, solution, Scoring::default(), 10)?;
//!
//! let placements = BTreeMap::from([(Coord::new(1, 1), square)]);
//! let report = validate_placements(&puzzle, &placements);
//! assert!(report.is_perfect);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cell;
pub mod coord;
pub mod difficulty;
pub mod grid;
pub mod id;
pub mod puzzle;
pub mod validate;

// Re-export commonly used types
pub use self::{
    cell::Cell,
    coord::{Coord, ParseCoordError},
    difficulty::Difficulty,
    grid::{GridError, GridTemplate},
    id::{AchievementId, LevelId, PuzzleId, ShapeId, UserId},
    puzzle::{Puzzle, PuzzleError, Scoring},
    validate::{Placements, ValidationReport},
};
