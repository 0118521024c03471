//! Timed actor actions: descriptors, instances, and the per-actor state
//! machine that schedules them.
//!
//! An induction is an action that takes time. The action method returns a
//! [`Response`](crate::response::Response) carrying an [`InductionInstance`];
//! the executor hands that instance to the actor's [`InductionManager`],
//! which schedules its completion on the inductions queue. When the entry
//! fires the body runs, and a repeating instance is scheduled again.

pub mod descriptor;
pub mod instance;
pub mod manager;

pub use descriptor::{DescriptorBuilder, InductionDescriptor};
pub use instance::{InductionBody, InductionInstance};
pub use manager::{Fired, InductionManager, InductionState, Progress};
