//! The grid cell vocabulary.

use std::fmt;

use derive_more::IsVariant;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::ShapeId;

/// The literal a grid row uses to mark a cell the player must fill.
pub const BLANK_MARKER: &str = "?";

/// A single cell of a grid template.
///
/// The JSON encoding is the one used by the existing content store and must
/// be preserved for migrated templates:
///
/// - a fixed cell is the shape id integer,
/// - an empty (decorative) cell is `null`,
/// - a blank cell the player must fill is the literal string `"?"`.
///
/// Any other value is rejected as outside the cell vocabulary.
///
/// # Example
///
/// ```
/// use shapelace_core::{Cell, ShapeId};
///
/// let row: Vec<Cell> = serde_json::from_str(r#"[3, null, "?"]"#)?;
/// assert_eq!(row, [Cell::Fixed(ShapeId::new(3)), Cell::Empty, Cell::Blank]);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, IsVariant)]
pub enum Cell {
    /// Pre-filled content the player cannot change.
    Fixed(ShapeId),
    /// A decorative hole that takes no placement.
    Empty,
    /// A cell the player must fill.
    Blank,
}

impl Cell {
    /// Returns the fixed shape id, if any.
    #[must_use]
    pub const fn as_fixed(self) -> Option<ShapeId> {
        match self {
            Self::Fixed(shape) => Some(shape),
            Self::Empty | Self::Blank => None,
        }
    }
}

impl Serialize for Cell {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Fixed(shape) => serializer.serialize_u32(shape.get()),
            Self::Empty => serializer.serialize_none(),
            Self::Blank => serializer.serialize_str(BLANK_MARKER),
        }
    }
}

struct CellVisitor;

impl de::Visitor<'_> for CellVisitor {
    type Value = Cell;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a shape id, null, or \"{BLANK_MARKER}\"")
    }

    fn visit_u64<E>(self, value: u64) -> Result<Cell, E>
    where
        E: de::Error,
    {
        let shape = u32::try_from(value)
            .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(value), &self))?;
        Ok(Cell::Fixed(ShapeId::new(shape)))
    }

    fn visit_i64<E>(self, value: i64) -> Result<Cell, E>
    where
        E: de::Error,
    {
        let shape = u32::try_from(value)
            .map_err(|_| E::invalid_value(de::Unexpected::Signed(value), &self))?;
        Ok(Cell::Fixed(ShapeId::new(shape)))
    }

    fn visit_str<E>(self, value: &str) -> Result<Cell, E>
    where
        E: de::Error,
    {
        if value == BLANK_MARKER {
            Ok(Cell::Blank)
        } else {
            Err(E::invalid_value(de::Unexpected::Str(value), &self))
        }
    }

    fn visit_none<E>(self) -> Result<Cell, E>
    where
        E: de::Error,
    {
        Ok(Cell::Empty)
    }

    fn visit_unit<E>(self) -> Result<Cell, E>
    where
        E: de::Error,
    {
        Ok(Cell::Empty)
    }
}

impl<'de> Deserialize<'de> for Cell {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(CellVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_encoding_round_trips() {
        let cells = vec![Cell::Fixed(ShapeId::new(12)), Cell::Empty, Cell::Blank];
        let json = serde_json::to_string(&cells).unwrap();
        assert_eq!(json, r#"[12,null,"?"]"#);

        let back: Vec<Cell> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cells);
    }

    #[test]
    fn test_unknown_string_rejected() {
        assert!(serde_json::from_str::<Cell>(r#""x""#).is_err());
        assert!(serde_json::from_str::<Cell>(r#""??""#).is_err());
    }

    #[test]
    fn test_out_of_range_shape_id_rejected() {
        assert!(serde_json::from_str::<Cell>("-1").is_err());
        assert!(serde_json::from_str::<Cell>("4294967296").is_err());
    }

    #[test]
    fn test_variant_helpers() {
        assert!(Cell::Blank.is_blank());
        assert!(!Cell::Empty.is_blank());
        assert_eq!(Cell::Fixed(ShapeId::new(2)).as_fixed(), Some(ShapeId::new(2)));
        assert_eq!(Cell::Blank.as_fixed(), None);
    }
}
