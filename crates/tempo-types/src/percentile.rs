//! The normalized scalar used for skill, difficulty, and light comparisons.

use serde::{Deserialize, Serialize};

/// A whole-number percentile in `0..=100`.
///
/// Skill scores, target difficulties, and light levels are all expressed
/// as percentiles so that one comparison contract covers every check.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Percentile(u8);

/// A raw value outside `0..=100` was offered as a percentile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("percentile out of range: {0} (expected 0..=100)")]
pub struct OutOfRange(pub u8);

impl Percentile {
    /// The lowest percentile.
    pub const ZERO: Self = Self(0);

    /// The highest percentile.
    pub const MAX: Self = Self(100);

    /// Create a percentile, returning `None` if `value > 100`.
    pub const fn new(value: u8) -> Option<Self> {
        if value > 100 { None } else { Some(Self(value)) }
    }

    /// Create a percentile from a signed value, clamping into `0..=100`.
    pub fn saturating(value: i32) -> Self {
        let clamped = value.clamp(0, 100);
        // 0..=100 always fits in a u8.
        Self(u8::try_from(clamped).unwrap_or(100))
    }

    /// Return the raw value.
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Fraction of `part` over `whole` as a percentile, saturating at 100.
    ///
    /// Returns [`Percentile::MAX`] when `whole` is zero.
    pub fn ratio(part: u64, whole: u64) -> Self {
        if whole == 0 {
            return Self::MAX;
        }
        let scaled = part.saturating_mul(100).checked_div(whole).unwrap_or(100);
        Self(u8::try_from(scaled.min(100)).unwrap_or(100))
    }
}

impl TryFrom<u8> for Percentile {
    type Error = OutOfRange;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(OutOfRange(value))
    }
}

impl From<Percentile> for u8 {
    fn from(p: Percentile) -> Self {
        p.0
    }
}

impl core::fmt::Display for Percentile {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_values_above_hundred() {
        assert_eq!(Percentile::new(100), Some(Percentile::MAX));
        assert_eq!(Percentile::new(101), None);
        assert_eq!(Percentile::try_from(150), Err(OutOfRange(150)));
    }

    #[test]
    fn saturating_clamps_both_ends() {
        assert_eq!(Percentile::saturating(-20), Percentile::ZERO);
        assert_eq!(Percentile::saturating(250), Percentile::MAX);
        assert_eq!(Percentile::saturating(37).value(), 37);
    }

    #[test]
    fn ratio_handles_zero_whole_and_overshoot() {
        assert_eq!(Percentile::ratio(5, 0), Percentile::MAX);
        assert_eq!(Percentile::ratio(1, 4).value(), 25);
        assert_eq!(Percentile::ratio(9, 4), Percentile::MAX);
    }

    #[test]
    fn deserialize_rejects_out_of_range() {
        let ok: Result<Percentile, _> = serde_json::from_str("42");
        assert_eq!(ok.ok().map(Percentile::value), Some(42));
        let bad: Result<Percentile, _> = serde_json::from_str("101");
        assert!(bad.is_err());
    }
}
