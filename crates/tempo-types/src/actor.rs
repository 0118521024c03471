//! Mutable per-actor state consulted by the precondition pipeline and
//! mutated by action methods and induction bodies.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::enums::{Stance, Terrain};
use crate::ids::ActorId;
use crate::percentile::Percentile;

/// The mutable state of one actor.
///
/// The scheduling kernel never interprets most of these fields; they exist
/// so the action pipeline can check stance, terrain, light, and carried
/// objects, and so content can run skill checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorState {
    /// The actor's identifier.
    pub id: ActorId,
    /// Display name, unique within a roster.
    pub name: String,
    /// Whether the actor is physically present in the world (not in limbo,
    /// not link-dead).
    pub present: bool,
    /// Current posture.
    pub stance: Stance,
    /// Terrain at the actor's position.
    pub terrain: Terrain,
    /// Ambient light at the actor's position.
    pub light: Percentile,
    /// Carried objects by keyword, with counts.
    pub inventory: BTreeMap<String, u32>,
    /// Skill scores by skill name.
    pub skills: BTreeMap<String, Percentile>,
}

impl ActorState {
    /// Create a present, standing actor in a lit field with nothing carried.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ActorId::new(),
            name: name.into(),
            present: true,
            stance: Stance::Standing,
            terrain: Terrain::Field,
            light: Percentile::MAX,
            inventory: BTreeMap::new(),
            skills: BTreeMap::new(),
        }
    }

    /// Whether the actor carries at least one object with this keyword.
    pub fn carries(&self, keyword: &str) -> bool {
        self.inventory.get(keyword).is_some_and(|count| *count > 0)
    }

    /// How many objects with this keyword the actor carries.
    pub fn count_of(&self, keyword: &str) -> u32 {
        self.inventory.get(keyword).copied().unwrap_or(0)
    }

    /// Add `count` objects with this keyword, saturating at `u32::MAX`.
    pub fn give(&mut self, keyword: &str, count: u32) {
        let entry = self.inventory.entry(keyword.to_owned()).or_insert(0);
        *entry = entry.saturating_add(count);
    }

    /// Remove one object with this keyword. Returns `false` if none carried.
    pub fn take_one(&mut self, keyword: &str) -> bool {
        match self.inventory.get_mut(keyword) {
            Some(count) if *count > 1 => {
                *count = count.saturating_sub(1);
                true
            }
            Some(_) => {
                self.inventory.remove(keyword);
                true
            }
            None => false,
        }
    }

    /// Skill score by name; unknown skills score zero.
    pub fn skill(&self, name: &str) -> Percentile {
        self.skills.get(name).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_actor_defaults() {
        let actor = ActorState::new("Mira");
        assert!(actor.present);
        assert_eq!(actor.stance, Stance::Standing);
        assert_eq!(actor.light, Percentile::MAX);
        assert!(actor.inventory.is_empty());
    }

    #[test]
    fn inventory_give_and_take() {
        let mut actor = ActorState::new("Mira");
        assert!(!actor.carries("shovel"));
        actor.give("berries", 2);
        assert_eq!(actor.count_of("berries"), 2);
        assert!(actor.take_one("berries"));
        assert!(actor.take_one("berries"));
        assert!(!actor.carries("berries"));
        assert!(!actor.take_one("berries"));
    }

    #[test]
    fn unknown_skill_scores_zero() {
        let mut actor = ActorState::new("Mira");
        assert_eq!(actor.skill("digging"), Percentile::ZERO);
        actor.skills.insert("digging".to_owned(), Percentile::saturating(60));
        assert_eq!(actor.skill("digging").value(), 60);
    }
}
