//! The ordered, cancellable deferred-event queue.
//!
//! A [`Queue`] holds `(fire-time, Event)` entries bound to one virtual clock
//! and is owned by exactly one subsystem. Entries fire in
//! `(fire-time, insertion-order)` order when the queue is advanced.
//!
//! # Guarantees
//!
//! - `add` returns a [`Reference`]: a weak handle to the entry's slot. It
//!   never keeps anything alive and becomes invalid once the entry finishes
//!   or is cancelled. A repeating entry keeps the same reference across
//!   every repetition.
//! - `cancel` is idempotent: cancelling a fired or already-cancelled entry
//!   is a no-op.
//! - Rescheduling is drift-free: the next fire time is the previous
//!   *scheduled* time plus the period.
//! - Entries added (or rescheduled) while `advance` is running are never
//!   fired by that same call, even if they are due.
//! - A failing event is logged and reported, and the remaining due events
//!   still fire.

use std::collections::BTreeMap;

use tempo_types::{QueueName, Tick};
use tracing::{debug, error, warn};

use crate::clock::{ClockError, VirtualClock};
use crate::event::{Event, EventError, Reschedule};

/// Errors that can occur during queue operations.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// `advance` was called from inside a firing event.
    #[error("queue {0:?} advanced re-entrantly from inside a firing event")]
    Reentrant(QueueName),

    /// A queue with this name is already registered.
    #[error("queue {0:?} is already registered")]
    DuplicateQueue(QueueName),

    /// No queue with this name is registered.
    #[error("queue {0:?} is not registered")]
    UnknownQueue(QueueName),

    /// A managed queue was advanced on its own past the shared clock.
    #[error("queue {queue:?} is at {now}, ahead of the shared sweep to {requested}")]
    OutOfStep {
        /// The queue that ran ahead.
        queue: QueueName,
        /// That queue's time.
        now: Tick,
        /// The sweep target.
        requested: Tick,
    },
}

/// Opaque cancellation handle for a queue entry.
///
/// Owned by the subsystem that registered the entry. Copying a reference
/// does not duplicate the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Reference {
    queue: QueueName,
    key: u64,
}

impl Reference {
    /// The queue this reference points into.
    pub const fn queue(&self) -> QueueName {
        self.queue
    }
}

/// A failure recorded while advancing a queue.
#[derive(Debug)]
pub struct EventFailure {
    /// Queue the event was in.
    pub queue: QueueName,
    /// The event's label.
    pub label: String,
    /// The event's scheduled fire time.
    pub fire_at: Tick,
    /// What went wrong.
    pub error: EventError,
}

/// Summary of one `advance` call on one queue.
#[derive(Debug, Default)]
pub struct AdvanceReport {
    /// Number of events invoked.
    pub fired: usize,
    /// Number of events that asked to fire again and were re-added.
    pub rescheduled: usize,
    /// Events that returned an error.
    pub failures: Vec<EventFailure>,
}

impl AdvanceReport {
    /// Whether every fired event succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A pending entry.
struct Pending<C> {
    fire_at: Tick,
    seq: u64,
    event: Box<dyn Event<C>>,
}

/// The entry currently being fired, if any.
#[derive(Debug, Clone, Copy)]
struct Firing {
    key: u64,
    cancelled: bool,
}

/// An ordered set of pending events bound to one clock.
///
/// `C` is the context handed to each event when it fires (usually the world
/// the owning subsystem mutates).
pub struct Queue<C> {
    name: QueueName,
    clock: VirtualClock,
    next_key: u64,
    next_seq: u64,
    /// `(fire_at, seq)` -> entry key. Iteration order is firing order.
    order: BTreeMap<(Tick, u64), u64>,
    entries: BTreeMap<u64, Pending<C>>,
    firing: Option<Firing>,
}

impl<C> core::fmt::Debug for Queue<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Queue")
            .field("name", &self.name)
            .field("now", &self.clock.now())
            .field("pending", &self.entries.len())
            .field("next_due", &self.next_due())
            .finish_non_exhaustive()
    }
}

impl<C> Queue<C> {
    /// Create an empty queue whose clock starts at zero.
    pub const fn new(name: QueueName) -> Self {
        Self::starting_at(name, 0)
    }

    /// Create an empty queue whose clock starts at `start`.
    pub const fn starting_at(name: QueueName, start: Tick) -> Self {
        Self {
            name,
            clock: VirtualClock::starting_at(start),
            next_key: 0,
            next_seq: 0,
            order: BTreeMap::new(),
            entries: BTreeMap::new(),
            firing: None,
        }
    }

    /// The queue's name.
    pub const fn name(&self) -> QueueName {
        self.name
    }

    /// The queue's current virtual time.
    pub const fn now(&self) -> Tick {
        self.clock.now()
    }

    /// Number of pending entries.
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fire time of the earliest pending entry.
    pub fn next_due(&self) -> Option<Tick> {
        self.order.keys().next().map(|(fire_at, _)| *fire_at)
    }

    /// Schedule `event` to fire `delay` milliseconds from now.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Clock`] if `now + delay` overflows.
    pub fn add<E>(&mut self, event: E, delay: Tick) -> Result<Reference, QueueError>
    where
        E: Event<C> + 'static,
    {
        let fire_at = self.clock.deadline(delay)?;
        let key = bump(&mut self.next_key);
        debug!(queue = ?self.name, label = event.label(), fire_at, "event added");
        self.insert(key, fire_at, Box::new(event));
        Ok(Reference {
            queue: self.name,
            key,
        })
    }

    /// Cancel a pending entry. Returns `true` if this call cancelled
    /// something: a pending entry was removed, or the entry that is
    /// currently firing had its reschedule request suppressed.
    ///
    /// Cancelling an entry that already fired, was already cancelled, or
    /// belongs to a different queue does nothing and returns `false`.
    pub fn cancel(&mut self, reference: Reference) -> bool {
        if reference.queue != self.name {
            warn!(
                queue = ?self.name,
                foreign = ?reference.queue,
                "ignoring cancel of a reference from another queue"
            );
            return false;
        }
        if let Some(firing) = self.firing.as_mut()
            && firing.key == reference.key
        {
            let first = !firing.cancelled;
            firing.cancelled = true;
            return first;
        }
        match self.entries.remove(&reference.key) {
            Some(pending) => {
                self.order.remove(&(pending.fire_at, pending.seq));
                debug!(queue = ?self.name, label = pending.event.label(), fire_at = pending.fire_at, "event cancelled");
                true
            }
            None => false,
        }
    }

    /// Whether the referenced entry is still waiting to fire.
    pub fn is_pending(&self, reference: Reference) -> bool {
        reference.queue == self.name && self.entries.contains_key(&reference.key)
    }

    /// Scheduled fire time of the referenced entry, if still pending.
    pub fn fire_time(&self, reference: Reference) -> Option<Tick> {
        if reference.queue != self.name {
            return None;
        }
        self.entries.get(&reference.key).map(|p| p.fire_at)
    }

    /// Drop every pending entry. Returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.entries.len();
        self.entries.clear();
        self.order.clear();
        dropped
    }

    /// Fire every entry due at or before `target`, then move the clock to
    /// `target`.
    ///
    /// Entries fire in `(fire-time, insertion-order)` order. While an entry
    /// fires, `now()` reports its scheduled time (or the queue's time, if
    /// that is already later).
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Clock`] if `target` is earlier than now, or
    /// [`QueueError::Reentrant`] if called from inside a firing event.
    /// Event failures are not errors here; they are collected in the
    /// returned [`AdvanceReport`].
    pub fn advance(&mut self, target: Tick, ctx: &mut C) -> Result<AdvanceReport, QueueError> {
        if self.firing.is_some() {
            return Err(QueueError::Reentrant(self.name));
        }
        let now = self.clock.now();
        if target < now {
            return Err(ClockError::Regression {
                now,
                requested: target,
            }
            .into());
        }

        // Snapshot what is due now; anything added while firing waits for
        // the next call.
        let due: Vec<((Tick, u64), u64)> = self
            .order
            .range(..=(target, u64::MAX))
            .map(|(slot, key)| (*slot, *key))
            .collect();

        let mut report = AdvanceReport::default();
        for ((fire_at, seq), key) in due {
            let Some(mut pending) = self.take_due(key, seq) else {
                // Cancelled by an earlier event in this sweep.
                continue;
            };
            if fire_at > self.clock.now() {
                self.clock.advance_to(fire_at)?;
            }

            let label = pending.event.label().to_owned();
            debug!(queue = ?self.name, label = %label, fire_at, "firing event");
            self.firing = Some(Firing {
                key,
                cancelled: false,
            });
            let result = pending.event.fire(ctx, self);
            let cancelled = self.firing.take().is_some_and(|f| f.cancelled);
            report.fired = report.fired.saturating_add(1);

            match result {
                Ok(Reschedule::Done) => {}
                Ok(Reschedule::After(_)) if cancelled => {
                    debug!(queue = ?self.name, label = %label, "reschedule suppressed by self-cancel");
                }
                Ok(Reschedule::After(period)) => match fire_at.checked_add(period) {
                    Some(next) => {
                        self.insert(key, next, pending.event);
                        report.rescheduled = report.rescheduled.saturating_add(1);
                    }
                    None => {
                        let error = EventError::from(ClockError::Overflow {
                            now: fire_at,
                            delay: period,
                        });
                        self.record_failure(&mut report, label, fire_at, error);
                    }
                },
                Err(error) => self.record_failure(&mut report, label, fire_at, error),
            }
        }

        self.clock.advance_to(target)?;
        Ok(report)
    }

    fn insert(&mut self, key: u64, fire_at: Tick, event: Box<dyn Event<C>>) {
        let seq = bump(&mut self.next_seq);
        self.order.insert((fire_at, seq), key);
        self.entries.insert(
            key,
            Pending {
                fire_at,
                seq,
                event,
            },
        );
    }

    fn take_due(&mut self, key: u64, seq: u64) -> Option<Pending<C>> {
        if self.entries.get(&key)?.seq != seq {
            return None;
        }
        let pending = self.entries.remove(&key)?;
        self.order.remove(&(pending.fire_at, pending.seq));
        Some(pending)
    }

    fn record_failure(
        &self,
        report: &mut AdvanceReport,
        label: String,
        fire_at: Tick,
        error: EventError,
    ) {
        error!(queue = ?self.name, label = %label, fire_at, %error, "event failed");
        report.failures.push(EventFailure {
            queue: self.name,
            label,
            fire_at,
            error,
        });
    }
}

/// Return the counter's value and increment it.
const fn bump(counter: &mut u64) -> u64 {
    let value = *counter;
    *counter = counter.wrapping_add(1);
    value
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::event::EventResult;

    /// Test context: a log of `(label, now)` pairs.
    type Log = Vec<(&'static str, Tick)>;

    fn note(label: &'static str) -> impl FnMut(&mut Log, &mut Queue<Log>) -> EventResult {
        move |log: &mut Log, queue: &mut Queue<Log>| -> EventResult {
            log.push((label, queue.now()));
            Ok(Reschedule::Done)
        }
    }

    fn every(label: &'static str, period: Tick) -> impl FnMut(&mut Log, &mut Queue<Log>) -> EventResult {
        move |log: &mut Log, queue: &mut Queue<Log>| -> EventResult {
            log.push((label, queue.now()));
            Ok(Reschedule::After(period))
        }
    }

    #[test]
    fn earlier_delay_fires_first() {
        let mut queue = Queue::new(QueueName::Objects);
        let mut log = Log::new();
        queue.add(note("late"), 200).unwrap();
        queue.add(note("early"), 100).unwrap();
        queue.advance(200, &mut log).unwrap();
        assert_eq!(log, vec![("early", 100), ("late", 200)]);
    }

    #[test]
    fn equal_delays_fire_in_insertion_order() {
        let mut queue = Queue::new(QueueName::Objects);
        let mut log = Log::new();
        queue.add(note("first"), 50).unwrap();
        queue.add(note("second"), 50).unwrap();
        queue.add(note("third"), 50).unwrap();
        let report = queue.advance(50, &mut log).unwrap();
        assert_eq!(report.fired, 3);
        let labels: Vec<_> = log.iter().map(|(l, _)| *l).collect();
        assert_eq!(labels, vec!["first", "second", "third"]);
    }

    #[test]
    fn nothing_fires_before_its_time() {
        let mut queue = Queue::new(QueueName::Objects);
        let mut log = Log::new();
        queue.add(note("rot"), 1_000).unwrap();
        queue.advance(999, &mut log).unwrap();
        assert!(log.is_empty());
        assert_eq!(queue.size(), 1);
        assert_eq!(queue.now(), 999);
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut queue = Queue::new(QueueName::Lights);
        let mut log = Log::new();
        let reference = queue.add(note("expire"), 10).unwrap();
        assert!(queue.cancel(reference));
        assert!(!queue.cancel(reference));
        queue.advance(100, &mut log).unwrap();
        assert!(log.is_empty());
        assert!(queue.is_empty());
    }

    #[test]
    fn cancel_after_fire_is_a_noop() {
        let mut queue = Queue::new(QueueName::Lights);
        let mut log = Log::new();
        let reference = queue.add(note("expire"), 10).unwrap();
        let other = queue.add(note("other"), 500).unwrap();
        queue.advance(10, &mut log).unwrap();
        assert!(!queue.cancel(reference));
        assert!(queue.is_pending(other));
        assert_eq!(queue.size(), 1);
    }

    #[test]
    fn repeating_entry_keeps_cadence_and_reference() {
        let mut queue = Queue::new(QueueName::Ambient);
        let mut log = Log::new();
        let reference = queue.add(every("chirp", 5_000), 5_000).unwrap();

        queue.advance(4_999, &mut log).unwrap();
        assert!(log.is_empty());

        queue.advance(5_000, &mut log).unwrap();
        assert_eq!(log, vec![("chirp", 5_000)]);
        assert_eq!(queue.fire_time(reference), Some(10_000));

        // Advancing late does not shift the cadence.
        queue.advance(12_000, &mut log).unwrap();
        assert_eq!(log.last(), Some(&("chirp", 10_000)));
        assert_eq!(queue.fire_time(reference), Some(15_000));

        assert!(queue.cancel(reference));
        assert!(queue.is_empty());
    }

    #[test]
    fn entries_added_while_firing_wait_for_next_advance() {
        let mut queue = Queue::new(QueueName::Ambient);
        let mut log = Log::new();
        queue
            .add(
                |log: &mut Log, queue: &mut Queue<Log>| -> EventResult {
                    log.push(("spawner", queue.now()));
                    queue.add(note("child"), 0).map_err(|e| EventError::failed(e.to_string()))?;
                    Ok(Reschedule::Done)
                },
                100,
            )
            .unwrap();

        queue.advance(1_000, &mut log).unwrap();
        assert_eq!(log, vec![("spawner", 100)]);
        assert_eq!(queue.size(), 1);
        assert_eq!(queue.next_due(), Some(100));

        queue.advance(1_000, &mut log).unwrap();
        assert_eq!(log.last(), Some(&("child", 1_000)));
        assert!(queue.is_empty());
    }

    #[test]
    fn late_reschedule_does_not_storm() {
        let mut queue = Queue::new(QueueName::Ambient);
        let mut log = Log::new();
        queue.add(every("tick", 10), 10).unwrap();
        let report = queue.advance(1_000, &mut log).unwrap();
        assert_eq!(report.fired, 1);
        assert_eq!(report.rescheduled, 1);
        assert_eq!(queue.next_due(), Some(20));
    }

    #[test]
    fn event_can_cancel_a_later_due_entry() {
        let mut queue = Queue::new(QueueName::Contests);
        let mut log = Log::new();
        let victim = queue.add(note("timeout"), 60).unwrap();
        queue
            .add(
                move |log: &mut Log, queue: &mut Queue<Log>| -> EventResult {
                    log.push(("answer", queue.now()));
                    queue.cancel(victim);
                    Ok(Reschedule::Done)
                },
                45,
            )
            .unwrap();
        queue.advance(60, &mut log).unwrap();
        assert_eq!(log, vec![("answer", 45)]);
        queue.advance(120, &mut log).unwrap();
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn self_cancel_suppresses_reschedule() {
        let mut queue: Queue<Log> = Queue::new(QueueName::Repair);
        let mut log = Log::new();
        let slot: std::rc::Rc<std::cell::Cell<Option<Reference>>> = std::rc::Rc::default();
        let handle = std::rc::Rc::clone(&slot);
        let outcomes: std::rc::Rc<std::cell::RefCell<Vec<bool>>> = std::rc::Rc::default();
        let seen = std::rc::Rc::clone(&outcomes);
        let reference = queue
            .add(
                move |log: &mut Log, queue: &mut Queue<Log>| -> EventResult {
                    log.push(("repair", queue.now()));
                    if let Some(me) = handle.get() {
                        seen.borrow_mut().push(queue.cancel(me));
                        seen.borrow_mut().push(queue.cancel(me));
                    }
                    Ok(Reschedule::After(100))
                },
                100,
            )
            .unwrap();
        slot.set(Some(reference));
        queue.advance(100, &mut log).unwrap();
        assert_eq!(log.len(), 1);
        // The first self-cancel counts; repeating it is a no-op.
        assert_eq!(*outcomes.borrow(), vec![true, false]);
        assert!(queue.is_empty());
        assert!(!queue.is_pending(reference));
    }

    #[test]
    fn failures_are_reported_and_do_not_stop_the_sweep() {
        let mut queue = Queue::new(QueueName::Objects);
        let mut log = Log::new();
        queue
            .add(
                |_: &mut Log, _: &mut Queue<Log>| -> EventResult {
                    Err(EventError::failed("corpse vanished"))
                },
                10,
            )
            .unwrap();
        queue.add(note("after"), 20).unwrap();
        let report = queue.advance(20, &mut log).unwrap();
        assert_eq!(report.fired, 2);
        assert_eq!(report.failures.len(), 1);
        assert!(!report.is_clean());
        assert_eq!(report.failures.first().map(|f| f.fire_at), Some(10));
        assert_eq!(log, vec![("after", 20)]);
    }

    #[test]
    fn advance_backwards_is_rejected() {
        let mut queue: Queue<Log> = Queue::starting_at(QueueName::Weather, 500);
        let mut log = Log::new();
        let err = queue.advance(100, &mut log).unwrap_err();
        assert!(matches!(
            err,
            QueueError::Clock {
                source: ClockError::Regression { .. }
            }
        ));
    }

    #[test]
    fn foreign_reference_is_ignored() {
        let mut lights: Queue<Log> = Queue::new(QueueName::Lights);
        let mut repair: Queue<Log> = Queue::new(QueueName::Repair);
        let reference = lights.add(note("expire"), 10).unwrap();
        let _ = repair.add(note("mend"), 10).unwrap();
        assert!(!repair.cancel(reference));
        assert_eq!(repair.size(), 1);
        assert_eq!(repair.fire_time(reference), None);
        assert!(lights.is_pending(reference));
    }

    #[test]
    fn reentrant_advance_is_rejected() {
        let mut queue = Queue::new(QueueName::Ambient);
        let mut log = Log::new();
        queue
            .add(
                |log: &mut Log, queue: &mut Queue<Log>| -> EventResult {
                    let nested = queue.advance(queue.now(), log);
                    if matches!(nested, Err(QueueError::Reentrant(_))) {
                        log.push(("rejected", queue.now()));
                    }
                    Ok(Reschedule::Done)
                },
                5,
            )
            .unwrap();
        queue.advance(5, &mut log).unwrap();
        assert_eq!(log, vec![("rejected", 5)]);
    }

    #[test]
    fn clear_drops_everything() {
        let mut queue = Queue::new(QueueName::Ferries);
        let _ = queue.add(note("a"), 1).unwrap();
        let _ = queue.add(note("b"), 2).unwrap();
        assert_eq!(queue.clear(), 2);
        assert_eq!(queue.next_due(), None);
    }
}
