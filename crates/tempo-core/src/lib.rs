//! Virtual clock and deferred-event scheduling for the Tempo action scheduler.
//!
//! This crate is the time-keeping kernel every time-delayed world change runs
//! on: object decay, light expiry, ferries, NPC behaviour ticks, repair
//! completion, contest timeouts, and actor inductions. Nothing here blocks;
//! "waiting" is always a scheduled future firing.
//!
//! # Modules
//!
//! - [`clock`] -- Monotonic virtual clock advanced explicitly by the tick loop.
//! - [`config`] -- Configuration loading from `tempo-config.yaml` into
//!   strongly-typed structs.
//! - [`event`] -- The [`Event`] trait, [`Reschedule`] results, and the
//!   [`guarded`] wrapper that isolates a subsystem's failures.
//! - [`queue`] -- The ordered, cancellable [`Queue`] bound to one clock.
//! - [`manager`] -- The [`QueueManager`] registry of named queues sharing one
//!   clock.
//!
//! [`Event`]: event::Event
//! [`Reschedule`]: event::Reschedule
//! [`guarded`]: event::guarded
//! [`Queue`]: queue::Queue
//! [`QueueManager`]: manager::QueueManager

pub mod clock;
pub mod config;
pub mod event;
pub mod manager;
pub mod queue;

pub use clock::{ClockError, VirtualClock};
pub use config::{ConfigError, SchedulerConfig};
pub use event::{Event, EventError, EventResult, Guarded, Labeled, Reschedule, guarded, labeled};
pub use manager::{QueueManager, TickReport};
pub use queue::{AdvanceReport, EventFailure, Queue, QueueError, Reference};
