//! The shared skill-check gate.
//!
//! Every randomized success/failure outcome in the action layer goes through
//! one comparison: a skill score and a target difficulty, both
//! [`Percentile`]s, produce a success chance of `50 + skill - difficulty`,
//! clamped into the configured `[floor, ceiling]` band. A roll in `0..100`
//! below the chance succeeds. Keeping this in one place is what makes the
//! outcome of one timed induction comparable with another's.

use rand::Rng;
use serde::Serialize;
use tempo_core::config::SkillsConfig;
use tempo_types::Percentile;

/// Success chance when skill equals difficulty.
pub const EVEN_ODDS: i32 = 50;

/// The clamp applied to every success chance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkillGate {
    floor: Percentile,
    ceiling: Percentile,
}

impl Default for SkillGate {
    fn default() -> Self {
        Self::from_config(&SkillsConfig::default())
    }
}

/// The result of one skill check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SkillCheck {
    /// The clamped success chance.
    pub chance: Percentile,
    /// The roll, in `0..100`.
    pub roll: u8,
    /// Whether the roll beat the chance.
    pub success: bool,
}

impl SkillGate {
    /// Create a gate clamping chances into `[floor, ceiling]`. The bounds
    /// are swapped if given in the wrong order.
    pub fn new(floor: Percentile, ceiling: Percentile) -> Self {
        Self {
            floor: floor.min(ceiling),
            ceiling: floor.max(ceiling),
        }
    }

    /// Build the gate from configuration.
    pub fn from_config(config: &SkillsConfig) -> Self {
        Self::new(
            Percentile::saturating(i32::from(config.floor_pct)),
            Percentile::saturating(i32::from(config.ceiling_pct)),
        )
    }

    /// Lowest possible chance.
    pub const fn floor(self) -> Percentile {
        self.floor
    }

    /// Highest possible chance.
    pub const fn ceiling(self) -> Percentile {
        self.ceiling
    }

    /// Success chance for `skill` against `difficulty`.
    pub fn chance(self, skill: Percentile, difficulty: Percentile) -> Percentile {
        let raw = EVEN_ODDS
            .saturating_add(i32::from(skill.value()))
            .saturating_sub(i32::from(difficulty.value()));
        Percentile::saturating(raw).clamp(self.floor, self.ceiling)
    }

    /// Roll `skill` against `difficulty`.
    pub fn check<R: Rng + ?Sized>(
        self,
        rng: &mut R,
        skill: Percentile,
        difficulty: Percentile,
    ) -> SkillCheck {
        let chance = self.chance(skill, difficulty);
        let roll: u8 = rng.random_range(0..100);
        SkillCheck {
            chance,
            roll,
            success: roll < chance.value(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn pct(value: u8) -> Percentile {
        Percentile::new(value).unwrap()
    }

    #[test]
    fn even_match_is_even_odds() {
        let gate = SkillGate::default();
        assert_eq!(gate.chance(pct(40), pct(40)).value(), 50);
        assert_eq!(gate.chance(pct(70), pct(40)).value(), 80);
    }

    #[test]
    fn chance_is_clamped_to_band() {
        let gate = SkillGate::default();
        assert_eq!(gate.chance(Percentile::MAX, Percentile::ZERO), pct(95));
        assert_eq!(gate.chance(Percentile::ZERO, Percentile::MAX), pct(5));
    }

    #[test]
    fn inverted_bounds_are_swapped() {
        let gate = SkillGate::new(pct(90), pct(10));
        assert_eq!(gate.floor(), pct(10));
        assert_eq!(gate.ceiling(), pct(90));
    }

    #[test]
    fn rolls_are_reproducible_with_a_seed() {
        let gate = SkillGate::default();
        let mut first = SmallRng::seed_from_u64(42);
        let mut second = SmallRng::seed_from_u64(42);
        for _ in 0..20 {
            assert_eq!(
                gate.check(&mut first, pct(50), pct(60)),
                gate.check(&mut second, pct(50), pct(60))
            );
        }
    }

    #[test]
    fn success_rate_follows_chance() {
        let gate = SkillGate::default();
        let mut rng = SmallRng::seed_from_u64(7);
        let successes = (0..2_000)
            .filter(|_| gate.check(&mut rng, pct(80), pct(50)).success)
            .count();
        // Chance is 80%; allow a generous band.
        assert!((1_400..=1_800).contains(&successes), "got {successes}");
    }

    #[test]
    fn a_fixed_band_pins_the_outcome() {
        let gate = SkillGate::new(Percentile::MAX, Percentile::MAX);
        let mut rng = SmallRng::seed_from_u64(1);
        assert!(gate.check(&mut rng, Percentile::ZERO, Percentile::MAX).success);
    }
}
