//! Shared type definitions for the Tempo action scheduler.
//!
//! This crate holds the plain data that flows between the scheduling kernel
//! (`tempo-core`), the induction and action pipeline (`tempo-actions`), and
//! the engine driver. Nothing here schedules or executes anything.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for actors and contests
//! - [`enums`] -- Stances, terrains, descriptor flags, queue names, outcomes
//! - [`percentile`] -- The normalized [`Percentile`] scalar
//! - [`actor`] -- Mutable per-actor state ([`ActorState`])

pub mod actor;
pub mod enums;
pub mod ids;
pub mod percentile;

// Re-export all public types at crate root for convenience.
pub use actor::ActorState;
pub use enums::{Flag, Outcome, QueueName, Stance, Terrain};
pub use ids::{ActorId, ContestId, ParseIdError};
pub use percentile::{OutOfRange, Percentile};

/// A point on the virtual clock, in virtual milliseconds.
///
/// Durations (delays, periods) are expressed in the same unit.
pub type Tick = u64;
