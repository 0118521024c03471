//! Actors, the roster that owns them, and the seam through which queue
//! events reach an actor's state.

use std::collections::BTreeMap;

use rand::rngs::SmallRng;
use tempo_core::Queue;
use tempo_types::{ActorId, ActorState, Percentile, Tick};
use tracing::{debug, info};

use crate::error::RosterError;
use crate::induction::InductionManager;
use crate::response::Response;
use crate::skills::{SkillCheck, SkillGate};

/// An actor: its mutable state plus its induction manager.
///
/// The manager is created with the actor and dropped with it.
#[derive(Debug)]
pub struct Actor {
    /// Stance, terrain, inventory, skills.
    pub state: ActorState,
    /// The actor's timed-action state machine.
    pub induction: InductionManager,
}

impl Actor {
    /// Wrap `state` with an idle induction manager.
    pub const fn new(state: ActorState) -> Self {
        let induction = InductionManager::new(state.id);
        Self { state, induction }
    }
}

/// What an action method or induction body may touch while it runs.
#[derive(Debug)]
pub struct ActionContext<'a> {
    /// The acting actor.
    pub actor: &'a mut ActorState,
    /// Current virtual time.
    pub now: Tick,
    /// Shared roll generator.
    pub rng: &'a mut SmallRng,
    /// Shared skill-check contract.
    pub gate: &'a SkillGate,
}

impl ActionContext<'_> {
    /// Roll the actor's `skill` against `difficulty` through the shared gate.
    pub fn check(&mut self, skill: &str, difficulty: Percentile) -> SkillCheck {
        let score = self.actor.skill(skill);
        let outcome = self.gate.check(self.rng, score, difficulty);
        debug!(
            actor = %self.actor.id,
            skill,
            score = score.value(),
            difficulty = difficulty.value(),
            chance = outcome.chance.value(),
            roll = outcome.roll,
            success = outcome.success,
            "skill check"
        );
        outcome
    }
}

/// A live actor, split into the context a body sees and its manager.
#[derive(Debug)]
pub struct Engaged<'a> {
    /// Context for action methods and bodies.
    pub ctx: ActionContext<'a>,
    /// The actor's induction manager.
    pub induction: &'a mut InductionManager,
}

/// The world as the action layer sees it.
///
/// Implemented by whatever owns the actors. Queue events look actors up
/// through [`engage`](Self::engage) each time they fire rather than holding
/// on to them, so an actor that has left simply yields `None`.
pub trait ActionHost {
    /// Borrow a live actor for one action step or body run.
    fn engage(&mut self, actor: ActorId, now: Tick) -> Option<Engaged<'_>>;

    /// Send a response to the actor.
    fn deliver(&mut self, actor: ActorId, response: Response);

    /// Show text to everyone who can see `from`.
    fn broadcast(&mut self, from: ActorId, text: &str);
}

/// Owns every actor by ID.
#[derive(Debug, Default)]
pub struct Roster {
    actors: BTreeMap<ActorId, Actor>,
}

impl Roster {
    /// Create an empty roster.
    pub const fn new() -> Self {
        Self {
            actors: BTreeMap::new(),
        }
    }

    /// Add an actor. Names are unique.
    ///
    /// # Errors
    ///
    /// Returns [`RosterError::DuplicateName`] if the name is taken.
    pub fn spawn(&mut self, state: ActorState) -> Result<ActorId, RosterError> {
        if self.find_by_name(&state.name).is_some() {
            return Err(RosterError::DuplicateName(state.name));
        }
        let id = state.id;
        info!(actor = %id, name = %state.name, "actor spawned");
        self.actors.insert(id, Actor::new(state));
        Ok(id)
    }

    /// Remove an actor, force-cancelling any induction it has pending.
    ///
    /// # Errors
    ///
    /// Returns [`RosterError::NotFound`] if no actor has this ID.
    pub fn despawn<C>(&mut self, id: ActorId, queue: &mut Queue<C>) -> Result<Actor, RosterError> {
        let mut actor = self.actors.remove(&id).ok_or(RosterError::NotFound(id))?;
        let abandoned = actor.induction.abandon(queue);
        info!(actor = %id, name = %actor.state.name, abandoned, "actor despawned");
        Ok(actor)
    }

    /// Look up an actor.
    pub fn get(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    /// Look up an actor mutably.
    pub fn get_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(&id)
    }

    /// Find an actor by name.
    pub fn find_by_name(&self, name: &str) -> Option<&Actor> {
        self.actors.values().find(|actor| actor.state.name == name)
    }

    /// Number of actors.
    pub fn len(&self) -> usize {
        self.actors.len()
    }

    /// Whether the roster is empty.
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Iterate actors in ID order.
    pub fn iter(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values()
    }

    /// Iterate actors mutably in ID order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Actor> {
        self.actors.values_mut()
    }

    /// Every actor whose induction manager is not idle.
    ///
    /// A session layer consults this before serializing or logging actors
    /// out.
    pub fn busy(&self) -> impl Iterator<Item = ActorId> {
        self.actors
            .values()
            .filter(|actor| actor.induction.is_active())
            .map(|actor| actor.state.id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tempo_types::QueueName;

    use super::*;

    #[test]
    fn names_are_unique() {
        let mut roster = Roster::new();
        roster.spawn(ActorState::new("Ada")).unwrap();
        let result = roster.spawn(ActorState::new("Ada"));
        assert_eq!(result, Err(RosterError::DuplicateName("Ada".to_owned())));
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn despawn_unknown_actor_fails() {
        let mut roster = Roster::new();
        let mut queue: Queue<()> = Queue::new(QueueName::Inductions);
        let missing = ActorId::new();
        assert!(matches!(
            roster.despawn(missing, &mut queue),
            Err(RosterError::NotFound(id)) if id == missing
        ));
    }
}
