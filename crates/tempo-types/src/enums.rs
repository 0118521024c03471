//! Enumeration types shared across the scheduler, the action pipeline, and
//! configuration.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Posture and surroundings
// ---------------------------------------------------------------------------

/// The physical posture of an actor.
///
/// Actions default to requiring [`Stance::Standing`]; individual actions
/// widen the allowed set (e.g. permitting [`Stance::Resting`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    /// Upright and ready to act.
    Standing,
    /// Seated on the ground or a chair.
    Sitting,
    /// Lying down but awake.
    Resting,
    /// Asleep.
    Sleeping,
    /// Knocked down.
    Prone,
}

impl Stance {
    /// Lowercase word used in player-facing messages.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standing => "standing",
            Self::Sitting => "sitting",
            Self::Resting => "resting",
            Self::Sleeping => "sleeping",
            Self::Prone => "lying prone",
        }
    }
}

/// The kind of ground the actor is currently on.
///
/// Actions allow every terrain by default and narrow the set where the
/// action makes no sense (no camp-fires indoors, no digging on water).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    /// Inside a building.
    Indoors,
    /// Paved streets and squares.
    Urban,
    /// Open grassland or farmland.
    Field,
    /// Woodland.
    Forest,
    /// Rolling hills.
    Hills,
    /// Steep mountain slopes.
    Mountain,
    /// Open water (swimming or aboard a boat).
    Water,
    /// Caves and tunnels.
    Underground,
}

impl Terrain {
    /// Lowercase word used in player-facing messages.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Indoors => "indoors",
            Self::Urban => "in town",
            Self::Field => "in a field",
            Self::Forest => "in a forest",
            Self::Hills => "in the hills",
            Self::Mountain => "on a mountain",
            Self::Water => "on the water",
            Self::Underground => "underground",
        }
    }
}

// ---------------------------------------------------------------------------
// Descriptor flags
// ---------------------------------------------------------------------------

/// A named boolean property on an action or induction descriptor.
///
/// Flags alter precondition checks ([`Flag::Light`], [`Flag::Induction`],
/// [`Flag::Instant`]), scheduling ([`Flag::Repeating`], [`Flag::Primary`]), or presentation
/// ([`Flag::Spinner`], [`Flag::Broadcast`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flag {
    /// Reschedule the induction after each successful completion.
    Repeating,
    /// Claim exclusive ownership of the actor's turn; cannot be pre-empted.
    Primary,
    /// Show a progress indicator while the induction is pending.
    Spinner,
    /// Requires enough light to see.
    Light,
    /// Broadcast the immediate response text to observers.
    Broadcast,
    /// The action starts an induction. Always subject to the conflict check.
    Induction,
    /// The action completes immediately and never starts an induction, so it
    /// may run alongside a PRIMARY one. Every other action is conflict-checked.
    Instant,
}

// ---------------------------------------------------------------------------
// Queues
// ---------------------------------------------------------------------------

/// Name of a deferred-event queue owned by one subsystem.
///
/// All queues share one virtual clock through the queue manager, but each
/// keeps its own pending set so subsystems never disturb each other's counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueName {
    /// Actor induction completions.
    Inductions,
    /// Object decay and rot.
    Objects,
    /// Light source warnings and expiry.
    Lights,
    /// Repair completion.
    Repair,
    /// Weather changes.
    Weather,
    /// Ambient messages and NPC behaviour ticks.
    Ambient,
    /// Automated ferries and other scheduled transport.
    Ferries,
    /// Contest timeouts and judged completions.
    Contests,
}

impl QueueName {
    /// Every queue name, in registration order.
    pub const ALL: [Self; 8] = [
        Self::Inductions,
        Self::Objects,
        Self::Lights,
        Self::Repair,
        Self::Weather,
        Self::Ambient,
        Self::Ferries,
        Self::Contests,
    ];
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Classification of an action step's outcome as shown to the actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The step did what was asked.
    Success,
    /// The step was refused or failed; the text explains why.
    Failure,
    /// Neutral information (progress, observations).
    Info,
}
