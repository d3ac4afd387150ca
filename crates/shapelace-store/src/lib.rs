//! Persistence collaborator for the puzzle platform.
//!
//! The core never talks to a database directly; it consumes the
//! [`PlatformStore`] trait, which exposes the handful of logical operations
//! the completion pipeline needs: fetch puzzles and levels, upsert attempts
//! and progress rows, check-and-set slot credits and achievement grants, and
//! maintain per-user aggregates.
//!
//! [`MemoryStore`] is the reference implementation used by tests and
//! examples. A production backend implements the same trait over its
//! database; the uniqueness operations (`credit_slot`,
//! `grant_achievement`) map onto unique constraints there.

pub mod error;
pub mod memory;
mod store;

pub use self::{error::StoreError, memory::MemoryStore, store::PlatformStore};
