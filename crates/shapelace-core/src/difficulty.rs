//! Puzzle difficulty ratings.

use std::str::FromStr;

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};

/// Difficulty rating of a grid template.
///
/// The wire strings (`"easy"`, `"medium"`, `"hard"`, `"expert"`) match the
/// existing content store.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Introductory puzzles.
    #[default]
    #[display("easy")]
    Easy,
    /// Mid-tier puzzles.
    #[display("medium")]
    Medium,
    /// Challenging puzzles.
    #[display("hard")]
    Hard,
    /// The hardest tier.
    #[display("expert")]
    Expert,
}

/// Error returned when a difficulty string is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("unknown difficulty `{input}`")]
pub struct ParseDifficultyError {
    /// The rejected input.
    pub input: String,
}

impl FromStr for Difficulty {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            "expert" => Ok(Self::Expert),
            _ => Err(ParseDifficultyError {
                input: s.to_owned(),
            }),
        }
    }
}
