//! The action precondition and dispatch pipeline.
//!
//! [`ActionExecutor::execute`] runs these stages in order, each
//! short-circuiting with a user-facing [`ActionError`]:
//!
//! 1. Presence -- is the actor in the world?
//! 2. Stance -- standing only, unless the action widens it.
//! 3. Terrain -- anywhere, unless the action narrows it.
//! 4. Light -- enough to see, when the action is flagged [`Flag::Light`].
//! 5. Objects -- every required object is carried.
//! 6. Induction conflict -- nothing but a [`Flag::Instant`] action runs
//!    while a PRIMARY induction is active or completing.
//! 7. Perform -- run the action method; action errors become responses,
//!    bugs propagate.
//! 8. Register -- hand any returned induction to the actor's manager and
//!    broadcast the immediate text when flagged [`Flag::Broadcast`].
//!
//! The conflict check runs before `perform`, so an action refused for being
//! busy never gets to change the actor.

use std::collections::BTreeSet;

use tempo_core::Queue;
use tempo_types::{ActorId, ActorState, Flag, Percentile, Stance, Terrain};
use tracing::{debug, error};

use crate::actor::{ActionContext, ActionHost, Engaged};
use crate::error::{ActionError, ExecuteError, InductionError, PerformError};
use crate::induction::{InductionManager, InductionState};
use crate::response::Response;

/// Light below which [`Flag::Light`] actions are refused.
pub const DEFAULT_MIN_LIGHT: u8 = 25;

/// What an action needs before it can run.
///
/// The default requires presence and a standing stance, allows every
/// terrain, needs no light, and requires no objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirements {
    presence: bool,
    stances: BTreeSet<Stance>,
    forbidden_terrains: BTreeSet<Terrain>,
    flags: BTreeSet<Flag>,
    objects: Vec<String>,
}

impl Default for Requirements {
    fn default() -> Self {
        Self {
            presence: true,
            stances: BTreeSet::from([Stance::Standing]),
            forbidden_terrains: BTreeSet::new(),
            flags: BTreeSet::new(),
            objects: Vec::new(),
        }
    }
}

impl Requirements {
    /// Default requirements.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow an absent actor (link-dead, in limbo) to run the action.
    #[must_use]
    pub const fn without_presence(mut self) -> Self {
        self.presence = false;
        self
    }

    /// Also permit `stance`.
    #[must_use]
    pub fn allow_stance(mut self, stance: Stance) -> Self {
        self.stances.insert(stance);
        self
    }

    /// Permit every stance.
    #[must_use]
    pub fn any_stance(mut self) -> Self {
        self.stances = BTreeSet::from([
            Stance::Standing,
            Stance::Sitting,
            Stance::Resting,
            Stance::Sleeping,
            Stance::Prone,
        ]);
        self
    }

    /// Refuse the action on `terrain`.
    #[must_use]
    pub fn forbid_terrain(mut self, terrain: Terrain) -> Self {
        self.forbidden_terrains.insert(terrain);
        self
    }

    /// Add a flag ([`Flag::Light`], [`Flag::Induction`], [`Flag::Broadcast`]).
    #[must_use]
    pub fn flag(mut self, flag: Flag) -> Self {
        self.flags.insert(flag);
        self
    }

    /// Shorthand for `flag(Flag::Instant)`.
    #[must_use]
    pub fn instant(self) -> Self {
        self.flag(Flag::Instant)
    }

    /// Require the actor to carry an object with this keyword.
    #[must_use]
    pub fn requires(mut self, object: impl Into<String>) -> Self {
        self.objects.push(object.into());
        self
    }

    /// Whether the requirements carry `flag`.
    pub fn has(&self, flag: Flag) -> bool {
        self.flags.contains(&flag)
    }

    /// Whether stage 6 applies. [`Flag::Induction`] wins over
    /// [`Flag::Instant`] when both are set.
    pub fn conflict_checked(&self) -> bool {
        self.has(Flag::Induction) || !self.has(Flag::Instant)
    }
}

/// An action the executor can dispatch.
///
/// Gameplay semantics live entirely in [`perform`](Self::perform); the
/// executor only enforces [`requirements`](Self::requirements) and routes
/// the result.
pub trait Action {
    /// The command word, for logs.
    fn name(&self) -> &str;

    /// Preconditions checked before `perform` runs.
    fn requirements(&self) -> Requirements {
        Requirements::default()
    }

    /// Do the action. Timed actions return a response carrying an
    /// induction instance.
    fn perform(
        &self,
        ctx: &mut ActionContext<'_>,
        args: &[String],
    ) -> Result<Response, PerformError>;
}

/// Validates and dispatches actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionExecutor {
    min_light: Percentile,
}

impl Default for ActionExecutor {
    fn default() -> Self {
        Self {
            min_light: Percentile::saturating(i32::from(DEFAULT_MIN_LIGHT)),
        }
    }
}

impl ActionExecutor {
    /// Create an executor with the default light threshold.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different light threshold for [`Flag::Light`] actions.
    #[must_use]
    pub const fn with_min_light(mut self, min_light: Percentile) -> Self {
        self.min_light = min_light;
        self
    }

    /// The single entry point from command dispatch.
    ///
    /// Returns the immediate response, which is a failure response when a
    /// precondition or the action itself refused.
    ///
    /// # Errors
    ///
    /// - [`ExecuteError::UnknownActor`] if the actor is not in the host.
    /// - [`ExecuteError::Fatal`] if the action method hit a bug, or an
    ///   unchecked instant action returned an induction.
    /// - [`ExecuteError::InvalidState`] / [`ExecuteError::Queue`] if the
    ///   returned induction could not be registered.
    pub fn execute<C: ActionHost>(
        self,
        host: &mut C,
        queue: &mut Queue<C>,
        actor: ActorId,
        action: &dyn Action,
        args: &[String],
    ) -> Result<Response, ExecuteError> {
        let requirements = action.requirements();
        let Engaged {
            mut ctx,
            induction,
        } = host
            .engage(actor, queue.now())
            .ok_or(ExecuteError::UnknownActor(actor))?;

        // Stages 1-6
        if let Err(refusal) = self.check(&requirements, ctx.actor, induction) {
            debug!(actor = %actor, action = action.name(), %refusal, "action refused");
            return Ok(refusal.into());
        }

        // Stage 7
        let mut response = match action.perform(&mut ctx, args) {
            Ok(response) => response,
            Err(PerformError::Action(failure)) => {
                debug!(actor = %actor, action = action.name(), %failure, "action failed");
                return Ok(failure.into());
            }
            Err(PerformError::Bug { reason }) => {
                error!(actor = %actor, action = action.name(), %reason, "action method failed");
                return Err(ExecuteError::Fatal {
                    action: action.name().to_owned(),
                    reason,
                });
            }
        };

        // Stage 8
        let mut broadcast = requirements.has(Flag::Broadcast);
        if let Some(instance) = response.take_induction() {
            if !requirements.conflict_checked() {
                error!(actor = %actor, action = action.name(), "instant action returned an induction");
                return Err(ExecuteError::Fatal {
                    action: action.name().to_owned(),
                    reason: format!(
                        "instant action returned induction '{}'",
                        instance.descriptor().label()
                    ),
                });
            }
            broadcast |= instance.descriptor().has(Flag::Broadcast);
            if let Err(failure) = induction.start(instance, queue) {
                if let InductionError::InvalidState { source } = &failure {
                    error!(actor = %actor, action = action.name(), error = %source, "induction start rejected");
                }
                return Err(failure.into());
            }
        }
        if broadcast {
            host.broadcast(actor, &response.text);
        }
        Ok(response)
    }

    /// The player-facing "stop": interrupt whatever the actor is doing.
    ///
    /// # Errors
    ///
    /// Returns [`ExecuteError::UnknownActor`] if the actor is not in the
    /// host, or [`ExecuteError::InvalidState`] if a body is running.
    pub fn interrupt<C: ActionHost>(
        self,
        host: &mut C,
        queue: &mut Queue<C>,
        actor: ActorId,
    ) -> Result<Response, ExecuteError> {
        let Engaged { induction, .. } = host
            .engage(actor, queue.now())
            .ok_or(ExecuteError::UnknownActor(actor))?;
        if !induction.is_active() {
            return Ok(ActionError::NothingToStop.into());
        }
        match induction.interrupt(queue) {
            Ok(stopped) => Ok(Response::info(format!("You stop {}.", stopped.label()))),
            Err(misuse) => {
                error!(actor = %actor, error = %misuse, "interrupt rejected");
                Err(misuse.into())
            }
        }
    }

    /// Stages 1-6 of the pipeline.
    ///
    /// # Errors
    ///
    /// Returns the first failing stage's [`ActionError`].
    pub fn check(
        self,
        requirements: &Requirements,
        actor: &ActorState,
        induction: &InductionManager,
    ) -> Result<(), ActionError> {
        if requirements.presence && !actor.present {
            return Err(ActionError::NotPresent);
        }
        if !requirements.stances.contains(&actor.stance) {
            return Err(ActionError::WrongStance {
                stance: actor.stance,
            });
        }
        if requirements.forbidden_terrains.contains(&actor.terrain) {
            return Err(ActionError::WrongTerrain {
                terrain: actor.terrain,
            });
        }
        if requirements.has(Flag::Light) && actor.light < self.min_light {
            return Err(ActionError::TooDark);
        }
        if let Some(missing) = requirements
            .objects
            .iter()
            .find(|object| !actor.carries(object))
        {
            return Err(ActionError::MissingObject {
                object: missing.clone(),
            });
        }
        if requirements.conflict_checked()
            && (induction.is_primary() || induction.state() == InductionState::Completing)
        {
            return Err(ActionError::Busy {
                label: induction.label().unwrap_or_default().to_owned(),
            });
        }
        Ok(())
    }
}
