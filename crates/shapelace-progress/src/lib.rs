//! Level progression and achievements.
//!
//! Levels gate content: each level requires a number of puzzle completions,
//! and completing a level unlocks the next one. Achievements are one-time
//! rewards granted when a user's aggregate metrics cross a threshold.
//!
//! Both halves are pure transition logic. Persistence (progress rows, the
//! credited-slot set, the earned-achievement set) and the unlock cascade are
//! driven by the caller, which keeps every transition testable on plain
//! values:
//!
//! - [`LevelProgress::record_puzzle`] bumps the counters;
//! - [`LevelProgress::check_completion`] returns an explicit
//!   [`CompletionTransition`] the caller reacts to;
//! - [`achievement::evaluate`] returns the achievements to grant without
//!   granting them.

pub mod achievement;
pub mod level;

pub use self::{
    achievement::{Achievement, Requirement, RequirementKind, UserAchievement, UserStats},
    level::{CompletionTransition, Level, LevelProgress, LevelSlot, is_unlocked},
};
