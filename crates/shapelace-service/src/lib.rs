//! Platform facade for the puzzle service.
//!
//! [`PlatformService`] is what a request/response layer calls. It wires the
//! completion pipeline together:
//!
//! ```text
//! finalize attempt ─▶ credit level slot ─▶ record score
//!        ─▶ check level completion ─▶ cascade unlock
//!        ─▶ evaluate & grant achievements
//! ```
//!
//! The whole pipeline runs under a per-user lock, giving the read-then-write
//! consistency that duplicate or racing completion requests need: two
//! concurrent finalizes of the same attempt, or two completions within the
//! same level, serialize per user and therefore cannot double-count
//! progress, double-grant achievements, or score twice. Requests for
//! different users never contend.
//!
//! Content authoring (registering puzzles, levels, achievements) requires a
//! [`Capabilities`] value resolved from the caller's [`Role`] at the
//! boundary; there is no ambient admin state.

pub mod capability;
pub mod service;

pub use self::{
    capability::{Capabilities, Role},
    service::{FinalizeReport, LevelReport, PlatformService, ServiceError},
};
