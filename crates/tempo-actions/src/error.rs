//! Error types for the tempo-actions crate.
//!
//! Three classes of failure flow through the action layer:
//!
//! - [`ActionError`]: recoverable and user-facing. Always converted into a
//!   failure [`Response`](crate::response::Response) at the executor boundary.
//! - [`InvalidStateError`]: caller misuse of an induction manager. Logged as
//!   a bug, never shown to the player.
//! - [`PerformError::Bug`]: a fatal error inside an action method or
//!   induction body. Propagated to the caller and logged with context.

use tempo_core::QueueError;
use tempo_types::{ActorId, ContestId, Stance, Terrain};

/// A recoverable, user-facing action failure.
///
/// The `Display` text is what the player sees.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    /// The actor is not physically present in the world.
    #[error("You are not really here.")]
    NotPresent,

    /// The actor's stance does not permit this action.
    #[error("You can't do that while {}.", .stance.as_str())]
    WrongStance {
        /// The actor's current stance.
        stance: Stance,
    },

    /// The terrain at the actor's position does not permit this action.
    #[error("You can't do that {}.", .terrain.as_str())]
    WrongTerrain {
        /// The terrain at the actor's position.
        terrain: Terrain,
    },

    /// It is too dark to see what you are doing.
    #[error("It's too dark to see.")]
    TooDark,

    /// A required object is not carried.
    #[error("You need a {object} to do that.")]
    MissingObject {
        /// Keyword of the missing object.
        object: String,
    },

    /// The actor is busy with an action that cannot be pre-empted.
    #[error("You are busy {label}.")]
    Busy {
        /// Label of the action in progress.
        label: String,
    },

    /// The actor lacks some consumable the action needs.
    #[error("You don't have enough {resource}.")]
    InsufficientResource {
        /// What is lacking.
        resource: String,
    },

    /// The action's target is not valid.
    #[error("You can't {verb} that.")]
    InvalidTarget {
        /// The verb that was attempted.
        verb: String,
    },

    /// Free-form failure produced by action content.
    #[error("{message}")]
    Failed {
        /// The message shown to the player.
        message: String,
    },

    /// "Stop" was requested but nothing is in progress.
    #[error("You aren't doing anything.")]
    NothingToStop,
}

/// Misuse of an induction manager by its caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidStateError {
    /// `start` was called while a PRIMARY induction is active.
    #[error("actor {actor} already has primary induction '{label}' active")]
    PrimaryActive {
        /// The actor.
        actor: ActorId,
        /// Label of the active induction.
        label: String,
    },

    /// `interrupt` was called while idle.
    #[error("actor {actor} has no active induction")]
    NotActive {
        /// The actor.
        actor: ActorId,
    },

    /// `start` or `interrupt` was called while the body is running.
    #[error("actor {actor} is completing induction '{label}'")]
    Completing {
        /// The actor.
        actor: ActorId,
        /// Label of the running induction.
        label: String,
    },
}

/// Errors from [`InductionManager::start`](crate::induction::InductionManager::start).
#[derive(Debug, thiserror::Error)]
pub enum InductionError {
    /// The manager's state does not allow a start.
    #[error("invalid induction state: {source}")]
    InvalidState {
        /// The underlying state error.
        #[from]
        source: InvalidStateError,
    },

    /// Scheduling the completion failed.
    #[error("failed to schedule induction: {source}")]
    Queue {
        /// The underlying queue error.
        #[from]
        source: QueueError,
    },
}

/// Errors an action method or induction body can produce.
#[derive(Debug, thiserror::Error)]
pub enum PerformError {
    /// Recoverable, user-facing failure.
    #[error(transparent)]
    Action(#[from] ActionError),

    /// A programming error. Never swallowed.
    #[error("bug: {reason}")]
    Bug {
        /// Description of what went wrong.
        reason: String,
    },
}

impl PerformError {
    /// Shorthand for [`PerformError::Bug`].
    pub fn bug(reason: impl Into<String>) -> Self {
        Self::Bug {
            reason: reason.into(),
        }
    }
}

/// Errors from [`ActionExecutor::execute`](crate::executor::ActionExecutor::execute).
#[derive(Debug, thiserror::Error)]
pub enum ExecuteError {
    /// The actor does not exist in the host.
    #[error("unknown actor: {0}")]
    UnknownActor(ActorId),

    /// The induction manager rejected the start (a bug in the caller).
    #[error("invalid induction state: {source}")]
    InvalidState {
        /// The underlying state error.
        #[from]
        source: InvalidStateError,
    },

    /// Scheduling failed.
    #[error("queue error: {source}")]
    Queue {
        /// The underlying queue error.
        #[from]
        source: QueueError,
    },

    /// The action method failed with a non-recoverable error.
    #[error("action '{action}' failed fatally: {reason}")]
    Fatal {
        /// Name of the action.
        action: String,
        /// Description of the failure.
        reason: String,
    },
}

impl From<InductionError> for ExecuteError {
    fn from(error: InductionError) -> Self {
        match error {
            InductionError::InvalidState { source } => Self::InvalidState { source },
            InductionError::Queue { source } => Self::Queue { source },
        }
    }
}

/// Errors from roster operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RosterError {
    /// An actor with this name already exists.
    #[error("duplicate actor name: {0}")]
    DuplicateName(String),

    /// No actor with this ID exists.
    #[error("actor not found: {0}")]
    NotFound(ActorId),
}

/// Errors from contest operations.
#[derive(Debug, thiserror::Error)]
pub enum ContestError {
    /// No open contest has this ID.
    #[error("contest not open: {0}")]
    NotOpen(ContestId),

    /// Scheduling the timeout or completion failed.
    #[error("queue error: {source}")]
    Queue {
        /// The underlying queue error.
        #[from]
        source: QueueError,
    },
}
