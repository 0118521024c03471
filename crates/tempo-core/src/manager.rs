//! The registry of named queues sharing one virtual clock.
//!
//! Each world subsystem (object decay, lights, repair, weather, ambient
//! behaviour, ferries, contests, inductions) owns one [`Queue`] so that its
//! pending counts and cancellations never interfere with another's. The
//! [`QueueManager`] owns the shared clock and drives one global
//! `advance(now)` sweep across every queue per server tick.
//!
//! There is no ordering across queues beyond the shared monotonic clock:
//! queues are swept one after another in [`QueueName`] order.

use std::collections::BTreeMap;

use tempo_types::{QueueName, Tick};
use tracing::{debug, info};

use crate::clock::{ClockError, VirtualClock};
use crate::config::SchedulerConfig;
use crate::queue::{AdvanceReport, EventFailure, Queue, QueueError};

/// Summary of one global sweep.
#[derive(Debug, Default)]
pub struct TickReport {
    /// Clock time after the sweep.
    pub now: Tick,
    /// Per-queue results.
    pub queues: BTreeMap<QueueName, AdvanceReport>,
}

impl TickReport {
    /// Total events fired across all queues.
    pub fn fired(&self) -> usize {
        self.queues.values().map(|r| r.fired).sum()
    }

    /// Every failure recorded during the sweep.
    pub fn failures(&self) -> impl Iterator<Item = &EventFailure> {
        self.queues.values().flat_map(|r| r.failures.iter())
    }
}

/// Owns the virtual clock and every named queue.
pub struct QueueManager<C> {
    clock: VirtualClock,
    queues: BTreeMap<QueueName, Queue<C>>,
}

impl<C> core::fmt::Debug for QueueManager<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("QueueManager")
            .field("now", &self.clock.now())
            .field("queues", &self.queues)
            .finish()
    }
}

impl<C> QueueManager<C> {
    /// Create a manager with no queues and a clock starting at `start`.
    pub const fn new(start: Tick) -> Self {
        Self {
            clock: VirtualClock::starting_at(start),
            queues: BTreeMap::new(),
        }
    }

    /// Create a manager with the clock start and queues from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::DuplicateQueue`] if the configured queue list
    /// names a queue twice.
    pub fn from_config(config: &SchedulerConfig) -> Result<Self, QueueError> {
        let mut manager = Self::new(config.clock.start_ms);
        for name in &config.queues {
            manager.register(*name)?;
        }
        info!(
            start_ms = config.clock.start_ms,
            queues = manager.queues.len(),
            "Queue manager initialized"
        );
        Ok(manager)
    }

    /// Register a new empty queue bound to the shared clock.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::DuplicateQueue`] if the name is taken.
    pub fn register(&mut self, name: QueueName) -> Result<&mut Queue<C>, QueueError> {
        if self.queues.contains_key(&name) {
            return Err(QueueError::DuplicateQueue(name));
        }
        debug!(queue = ?name, now = self.clock.now(), "queue registered");
        Ok(self
            .queues
            .entry(name)
            .or_insert_with(|| Queue::starting_at(name, self.clock.now())))
    }

    /// Borrow a queue.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::UnknownQueue`] if no queue has this name.
    pub fn queue(&self, name: QueueName) -> Result<&Queue<C>, QueueError> {
        self.queues.get(&name).ok_or(QueueError::UnknownQueue(name))
    }

    /// Mutably borrow a queue (to add or cancel entries).
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::UnknownQueue`] if no queue has this name.
    pub fn queue_mut(&mut self, name: QueueName) -> Result<&mut Queue<C>, QueueError> {
        self.queues
            .get_mut(&name)
            .ok_or(QueueError::UnknownQueue(name))
    }

    /// Current shared time.
    pub const fn now(&self) -> Tick {
        self.clock.now()
    }

    /// Pending entry count per queue.
    pub fn pending_counts(&self) -> BTreeMap<QueueName, usize> {
        self.queues
            .iter()
            .map(|(name, queue)| (*name, queue.size()))
            .collect()
    }

    /// Pending entries across every queue.
    pub fn total_pending(&self) -> usize {
        self.queues.values().map(Queue::size).sum()
    }

    /// Earliest fire time across every queue.
    pub fn next_due(&self) -> Option<Tick> {
        self.queues.values().filter_map(Queue::next_due).min()
    }

    /// Advance the shared clock to `target` and sweep every queue.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Clock`] if `target` is earlier than now, or
    /// [`QueueError::OutOfStep`] if a queue was advanced on its own past
    /// `target`. Both are checked before anything moves, so a rejected
    /// sweep fires nothing and leaves every clock where it was.
    pub fn advance(&mut self, target: Tick, ctx: &mut C) -> Result<TickReport, QueueError> {
        let now = self.clock.now();
        if target < now {
            return Err(ClockError::Regression {
                now,
                requested: target,
            }
            .into());
        }
        if let Some((name, queue)) = self.queues.iter().find(|(_, queue)| queue.now() > target) {
            return Err(QueueError::OutOfStep {
                queue: *name,
                now: queue.now(),
                requested: target,
            });
        }
        self.clock.advance_to(target)?;
        let mut report = TickReport {
            now: target,
            queues: BTreeMap::new(),
        };
        for (name, queue) in &mut self.queues {
            let queue_report = queue.advance(target, ctx)?;
            report.queues.insert(*name, queue_report);
        }
        Ok(report)
    }

    /// Drop every pending entry in every queue (shutdown). Returns the
    /// number dropped.
    pub fn clear(&mut self) -> usize {
        self.queues.values_mut().map(Queue::clear).sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::event::{EventResult, Reschedule};

    type Log = Vec<(QueueName, Tick)>;

    fn stamp(name: QueueName) -> impl FnMut(&mut Log, &mut Queue<Log>) -> EventResult {
        move |log: &mut Log, queue: &mut Queue<Log>| -> EventResult {
            log.push((name, queue.now()));
            Ok(Reschedule::Done)
        }
    }

    #[test]
    fn from_config_registers_configured_queues() {
        let config = SchedulerConfig::default();
        let manager: QueueManager<Log> = QueueManager::from_config(&config).unwrap();
        assert_eq!(manager.pending_counts().len(), config.queues.len());
        assert!(manager.queue(QueueName::Inductions).is_ok());
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut manager: QueueManager<Log> = QueueManager::new(0);
        manager.register(QueueName::Lights).unwrap();
        assert!(matches!(
            manager.register(QueueName::Lights),
            Err(QueueError::DuplicateQueue(QueueName::Lights))
        ));
    }

    #[test]
    fn unknown_queue_is_an_error() {
        let mut manager: QueueManager<Log> = QueueManager::new(0);
        assert!(matches!(
            manager.queue_mut(QueueName::Ferries),
            Err(QueueError::UnknownQueue(QueueName::Ferries))
        ));
    }

    #[test]
    fn queues_keep_separate_counts_on_one_clock() {
        let mut manager: QueueManager<Log> = QueueManager::new(0);
        manager.register(QueueName::Objects).unwrap();
        manager.register(QueueName::Weather).unwrap();

        let objects = manager.queue_mut(QueueName::Objects).unwrap();
        let rot = objects.add(stamp(QueueName::Objects), 300).unwrap();
        let _ = objects.add(stamp(QueueName::Objects), 100).unwrap();
        let weather = manager.queue_mut(QueueName::Weather).unwrap();
        let _ = weather.add(stamp(QueueName::Weather), 200).unwrap();

        assert_eq!(manager.total_pending(), 3);
        assert_eq!(manager.next_due(), Some(100));

        // Weather cannot cancel an object's entry.
        assert!(!manager.queue_mut(QueueName::Weather).unwrap().cancel(rot));
        assert_eq!(manager.pending_counts().get(&QueueName::Objects), Some(&2));

        let mut log = Log::new();
        let report = manager.advance(250, &mut log).unwrap();
        assert_eq!(report.fired(), 2);
        assert_eq!(report.failures().count(), 0);
        assert_eq!(manager.now(), 250);
        assert_eq!(manager.queue(QueueName::Weather).unwrap().now(), 250);
        assert!(log.contains(&(QueueName::Objects, 100)));
        assert!(log.contains(&(QueueName::Weather, 200)));
        assert_eq!(manager.total_pending(), 1);
    }

    #[test]
    fn late_registered_queue_starts_at_shared_time() {
        let mut manager: QueueManager<Log> = QueueManager::new(0);
        let mut log = Log::new();
        manager.advance(1_000, &mut log).unwrap();
        let repair = manager.register(QueueName::Repair).unwrap();
        assert_eq!(repair.now(), 1_000);
        let reference = repair.add(stamp(QueueName::Repair), 500).unwrap();
        assert_eq!(repair.fire_time(reference), Some(1_500));
    }

    #[test]
    fn manager_rejects_regression_and_clears() {
        let mut manager: QueueManager<Log> = QueueManager::new(100);
        manager.register(QueueName::Ambient).unwrap();
        let ambient = manager.queue_mut(QueueName::Ambient).unwrap();
        let _ = ambient.add(stamp(QueueName::Ambient), 50).unwrap();
        let mut log = Log::new();
        assert!(matches!(
            manager.advance(99, &mut log),
            Err(QueueError::Clock {
                source: ClockError::Regression { .. }
            })
        ));
        assert_eq!(manager.clear(), 1);
        assert_eq!(manager.total_pending(), 0);
    }

    #[test]
    fn queue_ahead_of_the_sweep_rejects_it_before_anything_fires() {
        let mut manager: QueueManager<Log> = QueueManager::new(0);
        manager.register(QueueName::Inductions).unwrap();
        manager.register(QueueName::Objects).unwrap();
        let _ = manager
            .queue_mut(QueueName::Inductions)
            .unwrap()
            .add(stamp(QueueName::Inductions), 100)
            .unwrap();

        let mut log = Log::new();
        manager
            .queue_mut(QueueName::Objects)
            .unwrap()
            .advance(1_000, &mut log)
            .unwrap();

        let err = manager.advance(500, &mut log).unwrap_err();
        assert!(matches!(
            err,
            QueueError::OutOfStep {
                queue: QueueName::Objects,
                now: 1_000,
                requested: 500,
            }
        ));
        assert!(log.is_empty());
        assert_eq!(manager.now(), 0);
        assert_eq!(manager.queue(QueueName::Inductions).unwrap().now(), 0);
        assert_eq!(manager.total_pending(), 1);

        // Catching the whole manager up to the stray queue works.
        let report = manager.advance(1_000, &mut log).unwrap();
        assert_eq!(report.fired(), 1);
        assert_eq!(log, vec![(QueueName::Inductions, 100)]);
    }
}
