//! Deferred events: the callbacks a [`Queue`] fires when their time comes.
//!
//! An event is any value implementing [`Event`]. Closures of the shape
//! `FnMut(&mut C, &mut Queue<C>) -> EventResult` implement it directly, so
//! most producers just hand the queue a closure capturing the IDs it needs.
//! The context `C` is the world the queue's owner operates on; the queue
//! itself is passed back in so a firing event can add or cancel entries.

use tempo_types::Tick;
use tracing::warn;

use crate::clock::ClockError;
use crate::queue::Queue;

/// What an event asks the queue to do after it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reschedule {
    /// The event is finished; drop it.
    Done,
    /// Fire again `period` milliseconds after this firing's scheduled time
    /// (not after the time `advance()` happened to be called).
    After(Tick),
}

/// Errors reported by a firing event.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// The event could not do its work.
    #[error("event failed: {reason}")]
    Failed {
        /// Description of the failure.
        reason: String,
    },

    /// A time computation inside the event failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

impl EventError {
    /// Shorthand for [`EventError::Failed`].
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }
}

/// Result of firing an event.
pub type EventResult = Result<Reschedule, EventError>;

/// A deferred callback owned by a [`Queue`] until it fires or is cancelled.
pub trait Event<C> {
    /// Run the event. `queue.now()` is the event's scheduled fire time (or
    /// the current time, if the queue was already past it).
    fn fire(&mut self, ctx: &mut C, queue: &mut Queue<C>) -> EventResult;

    /// Short name used in logs and failure reports.
    fn label(&self) -> &str {
        "event"
    }
}

impl<C, F> Event<C> for F
where
    F: FnMut(&mut C, &mut Queue<C>) -> EventResult,
{
    fn fire(&mut self, ctx: &mut C, queue: &mut Queue<C>) -> EventResult {
        self(ctx, queue)
    }
}

/// An event with a fixed label for logging.
#[derive(Debug, Clone)]
pub struct Labeled<E> {
    label: String,
    inner: E,
}

/// Attach a log label to an event.
pub fn labeled<E>(label: impl Into<String>, inner: E) -> Labeled<E> {
    Labeled {
        label: label.into(),
        inner,
    }
}

impl<C, E: Event<C>> Event<C> for Labeled<E> {
    fn fire(&mut self, ctx: &mut C, queue: &mut Queue<C>) -> EventResult {
        self.inner.fire(ctx, queue)
    }

    fn label(&self) -> &str {
        &self.label
    }
}

/// An event whose failures are logged and swallowed.
///
/// Each subsystem wraps its own events this way so a domain error in one
/// (a decayed object that no longer exists, a ferry with no route) retires
/// that event instead of surfacing in the tick report.
#[derive(Debug, Clone)]
pub struct Guarded<E> {
    label: String,
    inner: E,
}

/// Wrap an event so its errors are logged at `warn` and retire it.
pub fn guarded<E>(label: impl Into<String>, inner: E) -> Guarded<E> {
    Guarded {
        label: label.into(),
        inner,
    }
}

impl<C, E: Event<C>> Event<C> for Guarded<E> {
    fn fire(&mut self, ctx: &mut C, queue: &mut Queue<C>) -> EventResult {
        match self.inner.fire(ctx, queue) {
            Ok(reschedule) => Ok(reschedule),
            Err(error) => {
                warn!(
                    queue = ?queue.name(),
                    label = %self.label,
                    now = queue.now(),
                    %error,
                    "guarded event failed; retiring it"
                );
                Ok(Reschedule::Done)
            }
        }
    }

    fn label(&self) -> &str {
        &self.label
    }
}
