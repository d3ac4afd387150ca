//! Attempt lifecycle management for shape-placement puzzles.
//!
//! An [`Attempt`] records one user's play of one puzzle: the evolving
//! placement state while in progress, and the frozen result once finalized.
//! The state machine is deliberately small:
//!
//! ```text
//! in_progress ──finalize──▶ completed
//!      │
//!      └──────abandon─────▶ abandoned
//! ```
//!
//! Both `completed` and `abandoned` are terminal. Finalizing an already
//! completed attempt returns the stored result without re-scoring, which is
//! what makes duplicate completion requests harmless.
//!
//! Transitions are pure with respect to persistence and time: callers inject
//! `now` and store the mutated attempt themselves, so every transition is
//! testable in isolation.

pub mod attempt;

pub use self::attempt::{
    Attempt, AttemptError, AttemptId, AttemptResult, AttemptStatus, FinalizeOutcome,
};
