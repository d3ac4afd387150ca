//! Achievement definitions and the threshold evaluator.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shapelace_core::{AchievementId, UserId};

/// The metric an achievement thresholds on.
///
/// Wire strings match the existing store (`"levels_completed"`,
/// `"puzzles_solved"`, `"score_reached"`, `"streak"`, `"speed"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementKind {
    /// Number of levels the user has completed.
    LevelsCompleted,
    /// Number of puzzles the user has completed.
    PuzzlesSolved,
    /// Total score the user has accumulated.
    ScoreReached,
    /// Longest run of consecutive perfect completions.
    Streak,
    /// Fastest completed solve, in seconds. Met when the user has solved a
    /// puzzle in at most the threshold time.
    Speed,
}

/// A threshold over one user metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    /// The metric to compare.
    #[serde(rename = "requirement_type")]
    pub kind: RequirementKind,
    /// The threshold value.
    #[serde(rename = "requirement_value")]
    pub value: u64,
}

impl Requirement {
    /// Creates a requirement.
    #[must_use]
    pub const fn new(kind: RequirementKind, value: u64) -> Self {
        Self { kind, value }
    }

    /// Returns whether the user's stats satisfy this requirement.
    #[must_use]
    pub fn is_met(&self, stats: &UserStats) -> bool {
        match self.kind {
            RequirementKind::LevelsCompleted => stats.levels_completed >= self.value,
            RequirementKind::PuzzlesSolved => stats.puzzles_solved >= self.value,
            RequirementKind::ScoreReached => stats.total_score >= self.value,
            RequirementKind::Streak => stats.best_streak >= self.value,
            RequirementKind::Speed => stats
                .fastest_solve_secs
                .is_some_and(|secs| secs <= self.value),
        }
    }
}

/// A one-time reward definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    /// Identifier.
    pub id: AchievementId,
    /// Display name.
    pub name: String,
    /// Display description.
    pub description: String,
    /// Points added to the user's total score when granted.
    pub points_reward: u32,
    /// The qualifying threshold.
    #[serde(flatten)]
    pub requirement: Requirement,
    /// Inactive achievements are never granted.
    pub is_active: bool,
}

/// A granted (user, achievement) pair. Created at most once per pair and
/// never revoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAchievement {
    /// The user holding the grant.
    pub user: UserId,
    /// The granted achievement.
    pub achievement: AchievementId,
    /// When the grant happened.
    pub earned_at: DateTime<Utc>,
}

/// A user's aggregate metrics, as gathered by the persistence layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserStats {
    /// Completed levels.
    pub levels_completed: u64,
    /// Completed puzzle attempts.
    pub puzzles_solved: u64,
    /// Running total score.
    pub total_score: u64,
    /// Longest run of consecutive perfect completions.
    pub best_streak: u64,
    /// Fastest completed solve in seconds, if any puzzle was completed.
    pub fastest_solve_secs: Option<u64>,
}

/// Selects the achievements to grant for the given stats.
///
/// Returns every active achievement whose requirement is met and which is
/// not in `already_earned`, in input order. The function is a pure filter:
/// granting (and the accompanying score reward) is the caller's job, guarded
/// by the unique (user, achievement) constraint so repeated evaluation stays
/// idempotent.
pub fn evaluate<'a, I>(
    achievements: I,
    stats: &UserStats,
    already_earned: &HashSet<AchievementId>,
) -> Vec<&'a Achievement>
where
    I: IntoIterator<Item = &'a Achievement>,
{
    achievements
        .into_iter()
        .filter(|a| a.is_active && !already_earned.contains(&a.id) && a.requirement.is_met(stats))
        .collect()
}
