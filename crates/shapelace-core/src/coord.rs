//! Grid coordinates and their `"row,col"` wire encoding.

use std::{fmt, str::FromStr};

use derive_more::{Display, Error};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

/// A cell position within a grid, row-major.
///
/// Placement payloads and solution mappings key their entries by the string
/// `"row,col"` (no spaces), so `Coord` displays, parses, and serializes in
/// exactly that form.
///
/// # Example
///
/// ```
/// use shapelace_core::Coord;
///
/// let coord: Coord = "1,2".parse()?;
/// assert_eq!(coord, Coord::new(1, 2));
/// assert_eq!(coord.to_string(), "1,2");
/// # Ok::<(), shapelace_core::ParseCoordError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coord {
    row: u8,
    col: u8,
}

impl Coord {
    /// Creates a coordinate from row and column indices (0-based).
    #[must_use]
    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    /// Returns the row index.
    #[must_use]
    pub const fn row(self) -> u8 {
        self.row
    }

    /// Returns the column index.
    #[must_use]
    pub const fn col(self) -> u8 {
        self.col
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.row, self.col)
    }
}

/// Error returned when a coordinate string does not match `"row,col"`.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("invalid coordinate `{input}`: expected \"row,col\"")]
pub struct ParseCoordError {
    /// The rejected input.
    pub input: String,
}

impl FromStr for Coord {
    type Err = ParseCoordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseCoordError {
            input: s.to_owned(),
        };
        let (row, col) = s.split_once(',').ok_or_else(err)?;
        let row = row.parse().map_err(|_| err())?;
        let col = col.parse().map_err(|_| err())?;
        Ok(Self { row, col })
    }
}

impl Serialize for Coord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Coord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
