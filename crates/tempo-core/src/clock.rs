//! Virtual clock for the Tempo scheduler.
//!
//! The clock is logical time, not wall-clock time. It only moves when a
//! queue is advanced, and it never moves backwards.
//!
//! # Design Principles
//!
//! - All time arithmetic is checked (no silent overflow).
//! - The clock is monotonic: advancing to an earlier time is an error,
//!   advancing to the current time is a no-op.

use tempo_types::Tick;

/// Errors that can occur during clock operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    /// The caller asked the clock to move backwards.
    #[error("clock regression: now is {now}, requested {requested}")]
    Regression {
        /// The current time.
        now: Tick,
        /// The earlier time that was requested.
        requested: Tick,
    },

    /// Adding a delay to the current time would overflow.
    #[error("clock overflow: {now} + {delay} exceeds u64::MAX")]
    Overflow {
        /// The time the delay was added to.
        now: Tick,
        /// The delay that overflowed.
        delay: Tick,
    },
}

/// Monotonic logical time in virtual milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VirtualClock {
    /// Current time.
    now: Tick,
}

impl VirtualClock {
    /// Create a clock starting at `start`.
    pub const fn starting_at(start: Tick) -> Self {
        Self { now: start }
    }

    /// Return the current time.
    pub const fn now(&self) -> Tick {
        self.now
    }

    /// Move the clock forward to `target`. Returns the new time.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::Regression`] if `target` is earlier than now.
    pub const fn advance_to(&mut self, target: Tick) -> Result<Tick, ClockError> {
        if target < self.now {
            return Err(ClockError::Regression {
                now: self.now,
                requested: target,
            });
        }
        self.now = target;
        Ok(target)
    }

    /// Compute `now + delay`.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::Overflow`] if the sum exceeds `u64::MAX`.
    pub const fn deadline(&self, delay: Tick) -> Result<Tick, ClockError> {
        match self.now.checked_add(delay) {
            Some(at) => Ok(at),
            None => Err(ClockError::Overflow {
                now: self.now,
                delay,
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn clock_starts_where_told() {
        assert_eq!(VirtualClock::default().now(), 0);
        assert_eq!(VirtualClock::starting_at(1_000).now(), 1_000);
    }

    #[test]
    fn advance_moves_forward_and_allows_same_time() {
        let mut clock = VirtualClock::default();
        assert_eq!(clock.advance_to(500).unwrap(), 500);
        assert_eq!(clock.advance_to(500).unwrap(), 500);
        assert_eq!(clock.now(), 500);
    }

    #[test]
    fn advance_rejects_regression() {
        let mut clock = VirtualClock::starting_at(500);
        let err = clock.advance_to(499).unwrap_err();
        assert_eq!(
            err,
            ClockError::Regression {
                now: 500,
                requested: 499
            }
        );
        assert_eq!(clock.now(), 500);
    }

    #[test]
    fn deadline_is_checked() {
        let clock = VirtualClock::starting_at(u64::MAX - 1);
        assert_eq!(clock.deadline(1).unwrap(), u64::MAX);
        assert!(matches!(clock.deadline(2), Err(ClockError::Overflow { .. })));
    }
}
