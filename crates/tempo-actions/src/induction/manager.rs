//! The per-actor induction state machine.
//!
//! ```text
//!            start()                 entry fires
//!   IDLE ─────────────▶ ACTIVE ─────────────────▶ COMPLETING
//!    ▲  ◀───────────────  │ ▲                          │
//!    │     interrupt()    │ └── repeating / follow-up ─┤
//!    └────────────────────┴──── done / action error ───┘
//! ```
//!
//! An actor holds at most one live instance and at most one queue
//! [`Reference`]. `start` always cancels the prior reference before
//! scheduling, so two completions can never be pending for one actor.
//! The COMPLETING state covers the body's run: nothing can interrupt or
//! replace an instance whose body is executing.

use tempo_core::{Event, EventError, EventResult, Queue, Reference, Reschedule};
use tempo_types::{ActorId, Flag, Percentile, Tick};
use tracing::{debug, error, info};

use crate::actor::{ActionContext, ActionHost, Engaged};
use crate::error::{InductionError, InvalidStateError, PerformError};
use crate::response::Response;

use super::instance::InductionInstance;

/// Where an induction manager is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InductionState {
    /// Nothing in progress.
    #[default]
    Idle,
    /// An instance is scheduled to complete.
    Active,
    /// The instance's body is running.
    Completing,
}

/// What happened when an induction's queue entry fired.
#[derive(Debug)]
pub struct Fired {
    /// Response to deliver to the actor, if any.
    pub response: Option<Response>,
    /// What the queue should do with the entry.
    pub reschedule: Reschedule,
}

impl Fired {
    const fn dropped() -> Self {
        Self {
            response: None,
            reschedule: Reschedule::Done,
        }
    }
}

/// Progress of the active induction, for progress indicators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    /// The induction's label.
    pub label: String,
    /// When the current period completes.
    pub due_at: Tick,
    /// How much of the current period has elapsed.
    pub elapsed: Percentile,
    /// Whether the descriptor asks for a spinner.
    pub spinner: bool,
}

/// Per-actor holder of zero or one induction instance.
///
/// Created with the actor and dropped with it. Only the owning actor's
/// command processing calls [`start`](Self::start) and
/// [`interrupt`](Self::interrupt); only the queue reaches
/// [`on_fire`](Self::on_fire).
#[derive(Debug)]
pub struct InductionManager {
    actor: ActorId,
    state: InductionState,
    current: Option<InductionInstance>,
    reference: Option<Reference>,
    started_at: Tick,
    due_at: Tick,
    /// Bumped on every start so a superseded timer can recognise itself.
    generation: u64,
}

impl InductionManager {
    /// Create an idle manager for `actor`.
    pub const fn new(actor: ActorId) -> Self {
        Self {
            actor,
            state: InductionState::Idle,
            current: None,
            reference: None,
            started_at: 0,
            due_at: 0,
            generation: 0,
        }
    }

    /// The owning actor.
    pub const fn actor(&self) -> ActorId {
        self.actor
    }

    /// Current lifecycle state.
    pub const fn state(&self) -> InductionState {
        self.state
    }

    /// Whether anything is in progress.
    pub fn is_active(&self) -> bool {
        self.state != InductionState::Idle
    }

    /// Whether an active instance holds exclusive ownership of the turn.
    pub fn is_primary(&self) -> bool {
        self.state == InductionState::Active
            && self
                .current
                .as_ref()
                .is_some_and(|instance| instance.descriptor().has(Flag::Primary))
    }

    /// Label of the instance in progress.
    pub fn label(&self) -> Option<&str> {
        self.current.as_ref().map(InductionInstance::label)
    }

    /// Queue handle of the pending completion.
    pub const fn reference(&self) -> Option<Reference> {
        self.reference
    }

    /// Register `instance` and schedule its completion after its period.
    ///
    /// Allowed from IDLE, or from ACTIVE when the current instance is not
    /// PRIMARY; the current instance is then discarded without running.
    ///
    /// # Errors
    ///
    /// Returns [`InductionError::InvalidState`] if a PRIMARY instance is
    /// active or a body is running, and [`InductionError::Queue`] if the
    /// completion cannot be scheduled (the manager is then idle).
    pub fn start<C: ActionHost>(
        &mut self,
        instance: InductionInstance,
        queue: &mut Queue<C>,
    ) -> Result<Reference, InductionError> {
        match self.state {
            InductionState::Completing => {
                return Err(InvalidStateError::Completing {
                    actor: self.actor,
                    label: self.label().unwrap_or_default().to_owned(),
                }
                .into());
            }
            InductionState::Active if self.is_primary() => {
                return Err(InvalidStateError::PrimaryActive {
                    actor: self.actor,
                    label: self.label().unwrap_or_default().to_owned(),
                }
                .into());
            }
            InductionState::Active | InductionState::Idle => {}
        }

        if let Some(prior) = self.reference.take() {
            queue.cancel(prior);
            debug!(
                actor = %self.actor,
                replaced = self.label().unwrap_or_default(),
                "induction pre-empted"
            );
        }
        self.generation = self.generation.wrapping_add(1);

        let period = instance.descriptor().period();
        let timer = InductionTimer {
            actor: self.actor,
            generation: self.generation,
        };
        let reference = queue.add(timer, period).inspect_err(|_| self.reset())?;

        let now = queue.now();
        self.started_at = now;
        self.due_at = queue.fire_time(reference).unwrap_or(now);
        info!(
            actor = %self.actor,
            label = instance.label(),
            period,
            due_at = self.due_at,
            "induction started"
        );
        self.current = Some(instance);
        self.reference = Some(reference);
        self.state = InductionState::Active;
        Ok(reference)
    }

    /// Stop the active instance without running its body.
    ///
    /// Cancels the pending completion and returns the instance so the caller
    /// can word its own "you stop" message.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidStateError::NotActive`] when idle and
    /// [`InvalidStateError::Completing`] while the body runs.
    pub fn interrupt<C>(
        &mut self,
        queue: &mut Queue<C>,
    ) -> Result<InductionInstance, InvalidStateError> {
        match self.state {
            InductionState::Idle => Err(InvalidStateError::NotActive { actor: self.actor }),
            InductionState::Completing => Err(InvalidStateError::Completing {
                actor: self.actor,
                label: self.label().unwrap_or_default().to_owned(),
            }),
            InductionState::Active => {
                if let Some(reference) = self.reference.take() {
                    queue.cancel(reference);
                }
                let instance = self.current.take();
                self.reset();
                let instance = instance.ok_or(InvalidStateError::NotActive { actor: self.actor })?;
                info!(actor = %self.actor, label = instance.label(), "induction interrupted");
                Ok(instance)
            }
        }
    }

    /// Cancel whatever is pending, in any state. Used when the actor is
    /// destroyed. Returns `true` if something was in progress.
    pub fn abandon<C>(&mut self, queue: &mut Queue<C>) -> bool {
        let was_active = self.is_active();
        if let Some(reference) = self.reference.take() {
            queue.cancel(reference);
        }
        if was_active {
            debug!(
                actor = %self.actor,
                label = self.label().unwrap_or_default(),
                "induction abandoned"
            );
        }
        self.current = None;
        self.reset();
        was_active
    }

    /// Run the body of the active instance. Called by the queue at expiry.
    ///
    /// - Normal return: a follow-up induction carried by the response is
    ///   swapped in and scheduled; otherwise a repeating instance is
    ///   scheduled again; otherwise the manager goes idle.
    /// - [`PerformError::Action`]: the error becomes the response and the
    ///   manager goes idle, ending any repetition.
    /// - [`PerformError::Bug`]: the manager goes idle and the error is
    ///   returned.
    ///
    /// # Errors
    ///
    /// Returns [`PerformError::Bug`] from the body unchanged.
    pub fn on_fire(&mut self, ctx: &mut ActionContext<'_>) -> Result<Fired, PerformError> {
        if self.state != InductionState::Active {
            return Ok(Fired::dropped());
        }
        let Some(mut instance) = self.current.take() else {
            self.reset();
            return Ok(Fired::dropped());
        };

        self.state = InductionState::Completing;
        let result = instance.complete(ctx);

        match result {
            Ok(mut response) => {
                if let Some(follow_up) = response.take_induction() {
                    let period = follow_up.descriptor().period();
                    info!(
                        actor = %self.actor,
                        label = instance.label(),
                        next = follow_up.label(),
                        "induction handed off to follow-up"
                    );
                    self.resume(follow_up, period);
                    Ok(Fired {
                        response: Some(response),
                        reschedule: Reschedule::After(period),
                    })
                } else if instance.descriptor().has(Flag::Repeating) {
                    let period = instance.descriptor().period();
                    debug!(actor = %self.actor, label = instance.label(), "induction repeats");
                    self.resume(instance, period);
                    Ok(Fired {
                        response: Some(response),
                        reschedule: Reschedule::After(period),
                    })
                } else {
                    info!(actor = %self.actor, label = instance.label(), "induction completed");
                    self.reset();
                    Ok(Fired {
                        response: Some(response),
                        reschedule: Reschedule::Done,
                    })
                }
            }
            Err(PerformError::Action(action_error)) => {
                info!(
                    actor = %self.actor,
                    label = instance.label(),
                    error = %action_error,
                    "induction stopped by action error"
                );
                self.reset();
                Ok(Fired {
                    response: Some(action_error.into()),
                    reschedule: Reschedule::Done,
                })
            }
            Err(bug) => {
                error!(
                    actor = %self.actor,
                    label = instance.label(),
                    error = %bug,
                    "induction body failed"
                );
                self.reset();
                Err(bug)
            }
        }
    }

    /// Progress of the active induction at `now`.
    pub fn progress(&self, now: Tick) -> Option<Progress> {
        if self.state != InductionState::Active {
            return None;
        }
        let instance = self.current.as_ref()?;
        let whole = self.due_at.saturating_sub(self.started_at);
        let part = now.saturating_sub(self.started_at);
        Some(Progress {
            label: instance.label().to_owned(),
            due_at: self.due_at,
            elapsed: Percentile::ratio(part, whole),
            spinner: instance.descriptor().has(Flag::Spinner),
        })
    }

    /// Keep the queue entry and schedule `instance` for another period.
    fn resume(&mut self, instance: InductionInstance, period: Tick) {
        self.started_at = self.due_at;
        self.due_at = self.due_at.saturating_add(period);
        self.current = Some(instance);
        self.state = InductionState::Active;
    }

    fn reset(&mut self) {
        self.state = InductionState::Idle;
        self.current = None;
        self.reference = None;
    }
}

/// Queue entry that completes an actor's induction.
#[derive(Debug, Clone, Copy)]
struct InductionTimer {
    actor: ActorId,
    generation: u64,
}

impl<C: ActionHost> Event<C> for InductionTimer {
    fn fire(&mut self, host: &mut C, queue: &mut Queue<C>) -> EventResult {
        let now = queue.now();
        let Some(Engaged {
            mut ctx,
            induction,
        }) = host.engage(self.actor, now)
        else {
            // Actor left the world; an expected race.
            debug!(actor = %self.actor, now, "induction fired for absent actor; dropped");
            return Ok(Reschedule::Done);
        };
        if induction.generation != self.generation {
            debug!(actor = %self.actor, now, "superseded induction timer; dropped");
            return Ok(Reschedule::Done);
        }

        match induction.on_fire(&mut ctx) {
            Ok(Fired {
                response,
                reschedule,
            }) => {
                if let Some(response) = response {
                    host.deliver(self.actor, response);
                }
                Ok(reschedule)
            }
            Err(bug) => Err(EventError::failed(format!(
                "induction for actor {}: {bug}",
                self.actor
            ))),
        }
    }

    fn label(&self) -> &str {
        "induction"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tempo_types::{ActorState, QueueName};

    use super::*;
    use crate::induction::InductionDescriptor;
    use crate::world::World;

    fn instance(label: &str, period: Tick, primary: bool) -> InductionInstance {
        let mut builder = InductionDescriptor::builder(label, period);
        if primary {
            builder = builder.primary();
        }
        InductionInstance::new(builder.build().unwrap(), |_ctx: &mut ActionContext<'_>| {
            Ok(Response::success("Done."))
        })
    }

    fn setup() -> (World, Queue<World>, ActorId) {
        let mut world = World::default();
        let id = world.roster_mut().spawn(ActorState::new("Ilse")).unwrap();
        (world, Queue::new(QueueName::Inductions), id)
    }

    fn manager(world: &mut World, id: ActorId) -> &mut InductionManager {
        &mut world.roster_mut().get_mut(id).unwrap().induction
    }

    #[test]
    fn start_moves_idle_to_active() {
        let (mut world, mut queue, id) = setup();
        let induction = manager(&mut world, id);
        assert!(!induction.is_active());
        let reference = induction.start(instance("carving", 3_000, false), &mut queue).unwrap();
        assert_eq!(induction.state(), InductionState::Active);
        assert!(!induction.is_primary());
        assert_eq!(queue.fire_time(reference), Some(3_000));
    }

    #[test]
    fn primary_blocks_a_second_start() {
        let (mut world, mut queue, id) = setup();
        let induction = manager(&mut world, id);
        induction.start(instance("digging", 5_000, true), &mut queue).unwrap();
        assert!(induction.is_primary());
        let result = induction.start(instance("wandering", 1_000, false), &mut queue);
        assert!(matches!(
            result,
            Err(InductionError::InvalidState {
                source: InvalidStateError::PrimaryActive { .. }
            })
        ));
        assert_eq!(induction.label(), Some("digging"));
        assert_eq!(queue.size(), 1);
    }

    #[test]
    fn non_primary_is_replaced_and_its_entry_cancelled() {
        let (mut world, mut queue, id) = setup();
        let induction = manager(&mut world, id);
        let first = induction.start(instance("wandering", 1_000, false), &mut queue).unwrap();
        let second = induction.start(instance("digging", 5_000, true), &mut queue).unwrap();
        assert!(!queue.is_pending(first));
        assert!(queue.is_pending(second));
        assert_eq!(queue.size(), 1);
        assert_eq!(induction.label(), Some("digging"));
    }

    #[test]
    fn interrupt_requires_active() {
        let (mut world, mut queue, id) = setup();
        let induction = manager(&mut world, id);
        assert!(matches!(
            induction.interrupt(&mut queue),
            Err(InvalidStateError::NotActive { .. })
        ));
        induction.start(instance("sewing", 2_000, false), &mut queue).unwrap();
        let stopped = induction.interrupt(&mut queue).unwrap();
        assert_eq!(stopped.label(), "sewing");
        assert_eq!(induction.state(), InductionState::Idle);
        assert!(queue.is_empty());
    }

    #[test]
    fn completion_delivers_and_goes_idle() {
        let (mut world, mut queue, id) = setup();
        manager(&mut world, id)
            .start(instance("carving", 3_000, false), &mut queue)
            .unwrap();
        let report = queue.advance(3_000, &mut world).unwrap();
        assert_eq!(report.fired, 1);
        assert!(!manager(&mut world, id).is_active());
        let outbox = world.drain_outbox();
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox.first().map(|d| d.text.as_str()), Some("Done."));
    }

    #[test]
    fn progress_tracks_elapsed_share() {
        let (mut world, mut queue, id) = setup();
        let descriptor = InductionDescriptor::builder("weaving", 4_000)
            .flag(Flag::Spinner)
            .build()
            .unwrap();
        let induction = manager(&mut world, id);
        induction
            .start(
                InductionInstance::new(descriptor, |_ctx: &mut ActionContext<'_>| {
                    Ok(Response::success("Woven."))
                }),
                &mut queue,
            )
            .unwrap();
        let progress = induction.progress(1_000).unwrap();
        assert_eq!(progress.label, "weaving");
        assert_eq!(progress.due_at, 4_000);
        assert_eq!(progress.elapsed.value(), 25);
        assert!(progress.spinner);
    }

    #[test]
    fn abandon_cancels_in_any_active_state() {
        let (mut world, mut queue, id) = setup();
        let induction = manager(&mut world, id);
        assert!(!induction.abandon(&mut queue));
        induction.start(instance("digging", 5_000, true), &mut queue).unwrap();
        assert!(induction.abandon(&mut queue));
        assert!(queue.is_empty());
        assert!(!induction.is_active());
    }

    #[test]
    fn body_bug_is_reported_as_event_failure() {
        let (mut world, mut queue, id) = setup();
        let descriptor = InductionDescriptor::builder("brewing", 1_000)
            .repeating()
            .build()
            .unwrap();
        manager(&mut world, id)
            .start(
                InductionInstance::new(descriptor, |_ctx: &mut ActionContext<'_>| {
                    Err(PerformError::bug("cauldron index out of range"))
                }),
                &mut queue,
            )
            .unwrap();
        let report = queue.advance(1_000, &mut world).unwrap();
        assert_eq!(report.failures.len(), 1);
        assert!(queue.is_empty());
        assert!(!manager(&mut world, id).is_active());
    }
}
