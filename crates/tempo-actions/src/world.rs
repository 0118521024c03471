//! An in-memory world implementing the action and contest seams.
//!
//! Owns the roster, the contest board, the shared skill gate and roll
//! generator, and an outbox of messages for the session layer to drain.

use rand::SeedableRng;
use rand::rngs::SmallRng;
use tempo_core::config::SkillsConfig;
use tempo_types::{ActorId, Outcome, Tick};

use crate::actor::{ActionContext, ActionHost, Engaged, Roster};
use crate::contest::{ContestBoard, ContestHost};
use crate::response::{Delivery, Recipient, Response};
use crate::skills::SkillGate;

/// The world every queue event and action step runs against.
#[derive(Debug)]
pub struct World {
    roster: Roster,
    contests: ContestBoard,
    gate: SkillGate,
    rng: SmallRng,
    outbox: Vec<Delivery>,
}

impl Default for World {
    fn default() -> Self {
        Self::from_config(&SkillsConfig::default())
    }
}

impl World {
    /// Create an empty world with the given gate and roll seed.
    pub fn new(gate: SkillGate, seed: u64) -> Self {
        Self {
            roster: Roster::new(),
            contests: ContestBoard::new(),
            gate,
            rng: SmallRng::seed_from_u64(seed),
            outbox: Vec::new(),
        }
    }

    /// Create an empty world from skill configuration.
    pub fn from_config(config: &SkillsConfig) -> Self {
        Self::new(SkillGate::from_config(config), config.seed)
    }

    /// The actors.
    pub const fn roster(&self) -> &Roster {
        &self.roster
    }

    /// The actors, mutably.
    pub const fn roster_mut(&mut self) -> &mut Roster {
        &mut self.roster
    }

    /// The contest board.
    pub const fn contest_board(&self) -> &ContestBoard {
        &self.contests
    }

    /// The shared skill gate.
    pub const fn gate(&self) -> SkillGate {
        self.gate
    }

    /// The shared roll generator, for ambient events.
    pub const fn rng_mut(&mut self) -> &mut SmallRng {
        &mut self.rng
    }

    /// Messages waiting for delivery.
    pub fn outbox(&self) -> &[Delivery] {
        &self.outbox
    }

    /// Take every waiting message.
    pub fn drain_outbox(&mut self) -> Vec<Delivery> {
        std::mem::take(&mut self.outbox)
    }

    /// Queue a message.
    pub fn post(&mut self, recipient: Recipient, text: impl Into<String>, outcome: Outcome) {
        self.outbox.push(Delivery {
            recipient,
            text: text.into(),
            outcome,
        });
    }
}

impl ActionHost for World {
    fn engage(&mut self, actor: ActorId, now: Tick) -> Option<Engaged<'_>> {
        let entry = self.roster.get_mut(actor)?;
        Some(Engaged {
            ctx: ActionContext {
                actor: &mut entry.state,
                now,
                rng: &mut self.rng,
                gate: &self.gate,
            },
            induction: &mut entry.induction,
        })
    }

    fn deliver(&mut self, actor: ActorId, response: Response) {
        self.post(Recipient::Actor(actor), response.text, response.outcome);
    }

    fn broadcast(&mut self, from: ActorId, text: &str) {
        self.post(Recipient::Observers(from), text, Outcome::Info);
    }
}

impl ContestHost for World {
    fn contests(&mut self) -> &mut ContestBoard {
        &mut self.contests
    }

    fn announce(&mut self, text: String) {
        self.post(Recipient::Everyone, text, Outcome::Info);
    }
}
