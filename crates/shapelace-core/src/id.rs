//! Typed identifiers shared across the platform.
//!
//! Each identifier wraps the raw integer used by the persistence layer. The
//! newtypes keep user/puzzle/level ids from being mixed up in call sites and
//! serialize transparently as their inner value.

use derive_more::Display;
use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident($inner:ty)) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize,
            Deserialize,
        )]
        #[display("{_0}")]
        #[serde(transparent)]
        pub struct $name($inner);

        impl $name {
            /// Creates an identifier from its raw value.
            #[must_use]
            pub const fn new(raw: $inner) -> Self {
                Self(raw)
            }

            /// Returns the raw value.
            #[must_use]
            pub const fn get(self) -> $inner {
                self.0
            }
        }
    };
}

define_id!(
    /// Identifier of a shape available for placement.
    ShapeId(u32)
);

define_id!(
    /// Identifier of a puzzle (a grid template plus solution).
    PuzzleId(u64)
);

define_id!(
    /// Identifier of a registered user.
    UserId(u64)
);

define_id!(
    /// Identifier of a progression level.
    LevelId(u64)
);

define_id!(
    /// Identifier of an achievement definition.
    AchievementId(u64)
);
