//! Validated N×N grid templates.

use derive_more::{Display, Error};
use serde::{Deserialize, Deserializer, Serialize, de};

use crate::{Cell, Coord, Difficulty};

/// A grid layout authored by an administrator.
///
/// A template is an N×N matrix of [`Cell`]s with at least one blank cell.
/// Construction validates the matrix shape and the blank requirement;
/// afterwards the template is read-only.
///
/// # Example
///
/// ```
/// use shapelace_core::{Cell, Coord, Difficulty, GridTemplate, ShapeId};
///
/// let template = GridTemplate::new(
///     2,
///     vec![
///         vec![Cell::Fixed(ShapeId::new(1)), Cell::Blank],
///         vec![Cell::Empty, Cell::Blank],
///     ],
///     Difficulty::Easy,
/// )?;
///
/// assert_eq!(template.blank_count(), 2);
/// assert!(template.is_blank(Coord::new(0, 1)));
/// # Ok::<(), shapelace_core::GridError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridTemplate {
    size: u8,
    cells: Vec<Vec<Cell>>,
    difficulty: Difficulty,
    #[serde(skip)]
    blanks: Vec<Coord>,
}

// Deserialization funnels through `new` so a stored template cannot skip
// shape validation.
impl<'de> Deserialize<'de> for GridTemplate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Wire {
            size: u8,
            cells: Vec<Vec<Cell>>,
            #[serde(default)]
            difficulty: Difficulty,
        }

        let wire = Wire::deserialize(deserializer)?;
        Self::new(wire.size, wire.cells, wire.difficulty).map_err(de::Error::custom)
    }
}

/// Error raised when a grid template is malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum GridError {
    /// The matrix has the wrong number of rows.
    #[display("grid has {rows} rows, expected {expected}")]
    RowCountMismatch {
        /// Declared grid size.
        expected: u8,
        /// Actual row count.
        rows: usize,
    },
    /// A row has the wrong number of cells.
    #[display("row {row} has {found} cells, expected {expected}")]
    RowWidthMismatch {
        /// Index of the offending row.
        row: usize,
        /// Declared grid size.
        expected: u8,
        /// Actual cell count of the row.
        found: usize,
    },
    /// The template contains no blank cells, so there is nothing to play.
    #[display("grid has no blank cells")]
    NoBlankCells,
    /// A coordinate lies outside the grid.
    #[display("coordinate {coord} is outside the {size}x{size} grid")]
    OutOfBounds {
        /// The rejected coordinate.
        coord: Coord,
        /// Grid size.
        size: u8,
    },
}

impl GridTemplate {
    /// Creates a template, validating the matrix shape.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::RowCountMismatch`] or
    /// [`GridError::RowWidthMismatch`] if `cells` is not `size`×`size`, and
    /// [`GridError::NoBlankCells`] if no cell is [`Cell::Blank`].
    pub fn new(size: u8, cells: Vec<Vec<Cell>>, difficulty: Difficulty) -> Result<Self, GridError> {
        if cells.len() != usize::from(size) {
            return Err(GridError::RowCountMismatch {
                expected: size,
                rows: cells.len(),
            });
        }
        for (row, cells) in cells.iter().enumerate() {
            if cells.len() != usize::from(size) {
                return Err(GridError::RowWidthMismatch {
                    row,
                    expected: size,
                    found: cells.len(),
                });
            }
        }

        let blanks = collect_blanks(&cells);
        if blanks.is_empty() {
            return Err(GridError::NoBlankCells);
        }

        Ok(Self {
            size,
            cells,
            difficulty,
            blanks,
        })
    }

    /// Returns the grid size N (the grid is N×N).
    #[must_use]
    pub const fn size(&self) -> u8 {
        self.size
    }

    /// Returns the difficulty rating.
    #[must_use]
    pub const fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Returns the cell at the given coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::OutOfBounds`] if the coordinate lies outside the
    /// grid.
    pub fn cell(&self, coord: Coord) -> Result<Cell, GridError> {
        if coord.row() >= self.size || coord.col() >= self.size {
            return Err(GridError::OutOfBounds {
                coord,
                size: self.size,
            });
        }
        Ok(self.cells[usize::from(coord.row())][usize::from(coord.col())])
    }

    /// Returns whether the coordinate is a blank cell.
    ///
    /// Out-of-bounds coordinates are not blank.
    #[must_use]
    pub fn is_blank(&self, coord: Coord) -> bool {
        self.cell(coord).is_ok_and(|cell| cell.is_blank())
    }

    /// Returns the blank coordinates in row-major order.
    pub fn blank_cells(&self) -> impl Iterator<Item = Coord> + '_ {
        self.blanks.iter().copied()
    }

    /// Returns the number of blank cells.
    #[must_use]
    pub fn blank_count(&self) -> usize {
        self.blanks.len()
    }

    /// Returns the raw cell matrix.
    #[must_use]
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.cells
    }
}

fn collect_blanks(cells: &[Vec<Cell>]) -> Vec<Coord> {
    let mut blanks = Vec::new();
    for (row, cells) in cells.iter().enumerate() {
        for (col, cell) in cells.iter().enumerate() {
            // Matrix shape is checked before this runs, so the casts hold.
            #[expect(clippy::cast_possible_truncation)]
            if cell.is_blank() {
                blanks.push(Coord::new(row as u8, col as u8));
            }
        }
    }
    blanks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ShapeId;

    fn three_by_three() -> GridTemplate {
        GridTemplate::new(
            3,
            vec![
                vec![Cell::Fixed(ShapeId::new(1)), Cell::Empty, Cell::Empty],
                vec![Cell::Empty, Cell::Blank, Cell::Empty],
                vec![Cell::Fixed(ShapeId::new(2)), Cell::Empty, Cell::Blank],
            ],
            Difficulty::Easy,
        )
        .unwrap()
    }

    #[test]
    fn test_blank_cells_row_major() {
        let template = three_by_three();
        let blanks: Vec<_> = template.blank_cells().collect();
        assert_eq!(blanks, [Coord::new(1, 1), Coord::new(2, 2)]);
        assert_eq!(template.blank_count(), 2);
    }

    #[test]
    fn test_cell_lookup() {
        let template = three_by_three();
        assert_eq!(
            template.cell(Coord::new(0, 0)).unwrap(),
            Cell::Fixed(ShapeId::new(1))
        );
        assert_eq!(template.cell(Coord::new(1, 1)).unwrap(), Cell::Blank);
        assert!(template.is_blank(Coord::new(1, 1)));
        assert!(!template.is_blank(Coord::new(0, 0)));
    }

    #[test]
    fn test_out_of_bounds() {
        let template = three_by_three();
        assert!(matches!(
            template.cell(Coord::new(3, 0)),
            Err(GridError::OutOfBounds { .. })
        ));
        assert!(!template.is_blank(Coord::new(9, 9)));
    }

    #[test]
    fn test_row_count_mismatch() {
        let result = GridTemplate::new(2, vec![vec![Cell::Blank, Cell::Blank]], Difficulty::Easy);
        assert_eq!(
            result.unwrap_err(),
            GridError::RowCountMismatch {
                expected: 2,
                rows: 1
            }
        );
    }

    #[test]
    fn test_row_width_mismatch() {
        let result = GridTemplate::new(
            2,
            vec![vec![Cell::Blank, Cell::Blank], vec![Cell::Blank]],
            Difficulty::Easy,
        );
        assert_eq!(
            result.unwrap_err(),
            GridError::RowWidthMismatch {
                row: 1,
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_no_blank_cells() {
        let result = GridTemplate::new(
            1,
            vec![vec![Cell::Fixed(ShapeId::new(1))]],
            Difficulty::Easy,
        );
        assert_eq!(result.unwrap_err(), GridError::NoBlankCells);
    }

    #[test]
    fn test_wire_grid_data_loads() {
        // Matches the stored layout format: shape ids, nulls, "?" markers.
        let cells: Vec<Vec<Cell>> =
            serde_json::from_str(r#"[[5, null, null], [null, "?", null], [7, null, 5]]"#).unwrap();
        let template = GridTemplate::new(3, cells, Difficulty::Easy).unwrap();
        assert_eq!(template.blank_count(), 1);
        assert!(template.is_blank(Coord::new(1, 1)));
    }
}
