//! Timed actor actions for the Tempo action scheduler.
//!
//! This crate layers actor-facing behaviour over the deferred-event queues
//! of `tempo-core`: the per-actor induction state machine, the action
//! precondition pipeline, the shared skill-check gate, and contest races.
//!
//! # Modules
//!
//! - [`actor`] -- Actors, the [`Roster`], and the [`ActionHost`] seam.
//! - [`contest`] -- Contest timeouts racing judged completions.
//! - [`error`] -- Error types for every operation in this crate.
//! - [`executor`] -- The [`ActionExecutor`] precondition and dispatch
//!   pipeline.
//! - [`induction`] -- Descriptors, instances, and the [`InductionManager`].
//! - [`response`] -- Action step outcomes and delivered messages.
//! - [`skills`] -- The shared [`SkillGate`].
//! - [`world`] -- An in-memory [`World`] host.
//!
//! [`Roster`]: actor::Roster
//! [`ActionHost`]: actor::ActionHost
//! [`ActionExecutor`]: executor::ActionExecutor
//! [`InductionManager`]: induction::InductionManager
//! [`SkillGate`]: skills::SkillGate
//! [`World`]: world::World

pub mod actor;
pub mod contest;
pub mod error;
pub mod executor;
pub mod induction;
pub mod response;
pub mod skills;
pub mod world;

pub use actor::{ActionContext, ActionHost, Actor, Engaged, Roster};
pub use contest::{ContestBoard, ContestHost, ContestStatus, Settlement};
pub use error::{
    ActionError, ContestError, ExecuteError, InductionError, InvalidStateError, PerformError,
    RosterError,
};
pub use executor::{Action, ActionExecutor, Requirements};
pub use induction::{InductionDescriptor, InductionInstance, InductionManager, InductionState};
pub use response::{Delivery, Recipient, Response};
pub use skills::{SkillCheck, SkillGate};
pub use world::World;
