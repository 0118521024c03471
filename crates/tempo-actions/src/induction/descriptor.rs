//! Immutable timing and behaviour configuration for an induction.

use std::collections::BTreeSet;

use tempo_types::{Flag, Tick};

use crate::error::PerformError;

/// How long an induction takes and how it behaves.
///
/// Built once with [`InductionDescriptor::builder`] and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InductionDescriptor {
    label: String,
    period: Tick,
    flags: BTreeSet<Flag>,
}

impl InductionDescriptor {
    /// Start building a descriptor. `label` is the gerund used in messages
    /// ("digging", "foraging").
    pub fn builder(label: impl Into<String>, period: Tick) -> DescriptorBuilder {
        DescriptorBuilder {
            label: label.into(),
            period,
            flags: BTreeSet::new(),
        }
    }

    /// The gerund used in messages.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Delay from start (or from the previous completion) to completion.
    pub const fn period(&self) -> Tick {
        self.period
    }

    /// Whether the descriptor carries `flag`.
    pub fn has(&self, flag: Flag) -> bool {
        self.flags.contains(&flag)
    }

    /// Every flag on the descriptor.
    pub const fn flags(&self) -> &BTreeSet<Flag> {
        &self.flags
    }
}

/// Builder for [`InductionDescriptor`].
#[derive(Debug, Clone)]
pub struct DescriptorBuilder {
    label: String,
    period: Tick,
    flags: BTreeSet<Flag>,
}

impl DescriptorBuilder {
    /// Add a flag.
    #[must_use]
    pub fn flag(mut self, flag: Flag) -> Self {
        self.flags.insert(flag);
        self
    }

    /// Shorthand for `flag(Flag::Repeating)`.
    #[must_use]
    pub fn repeating(self) -> Self {
        self.flag(Flag::Repeating)
    }

    /// Shorthand for `flag(Flag::Primary)`.
    #[must_use]
    pub fn primary(self) -> Self {
        self.flag(Flag::Primary)
    }

    /// Finish the descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`PerformError::Bug`] for a repeating descriptor with a zero
    /// period, which would fire once per tick forever.
    pub fn build(self) -> Result<InductionDescriptor, PerformError> {
        if self.period == 0 && self.flags.contains(&Flag::Repeating) {
            return Err(PerformError::bug(format!(
                "repeating induction '{}' has a zero period",
                self.label
            )));
        }
        Ok(InductionDescriptor {
            label: self.label,
            period: self.period,
            flags: self.flags,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_flags() {
        let descriptor = InductionDescriptor::builder("digging", 5_000)
            .repeating()
            .flag(Flag::Spinner)
            .build()
            .unwrap();
        assert_eq!(descriptor.label(), "digging");
        assert_eq!(descriptor.period(), 5_000);
        assert!(descriptor.has(Flag::Repeating));
        assert!(descriptor.has(Flag::Spinner));
        assert!(!descriptor.has(Flag::Primary));
    }

    #[test]
    fn zero_period_repeating_is_rejected() {
        let result = InductionDescriptor::builder("spinning", 0).repeating().build();
        assert!(matches!(result, Err(PerformError::Bug { .. })));
    }

    #[test]
    fn zero_period_one_shot_is_allowed() {
        assert!(InductionDescriptor::builder("blinking", 0).build().is_ok());
    }
}
