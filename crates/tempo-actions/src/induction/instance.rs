//! An induction descriptor paired with the body run at expiry.

use crate::actor::ActionContext;
use crate::error::PerformError;
use crate::response::Response;

use super::descriptor::InductionDescriptor;

/// The callback run when an induction expires.
///
/// A body owns whatever context it captured when the action started (the
/// arguments, the target keyword, counters it accumulates across
/// repetitions). It receives the acting actor through [`ActionContext`]
/// rather than capturing it, so nothing aliases the actor between firings.
pub trait InductionBody {
    /// Run the body once.
    fn complete(&mut self, ctx: &mut ActionContext<'_>) -> Result<Response, PerformError>;
}

impl<F> InductionBody for F
where
    F: FnMut(&mut ActionContext<'_>) -> Result<Response, PerformError>,
{
    fn complete(&mut self, ctx: &mut ActionContext<'_>) -> Result<Response, PerformError> {
        self(ctx)
    }
}

/// A descriptor plus body, owned by at most one induction manager.
pub struct InductionInstance {
    descriptor: InductionDescriptor,
    body: Box<dyn InductionBody>,
}

impl core::fmt::Debug for InductionInstance {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InductionInstance")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

impl InductionInstance {
    /// Pair a descriptor with a closure body.
    pub fn new<F>(descriptor: InductionDescriptor, body: F) -> Self
    where
        F: FnMut(&mut ActionContext<'_>) -> Result<Response, PerformError> + 'static,
    {
        Self::from_body(descriptor, Box::new(body))
    }

    /// Pair a descriptor with an already boxed body.
    pub fn from_body(descriptor: InductionDescriptor, body: Box<dyn InductionBody>) -> Self {
        Self { descriptor, body }
    }

    /// The timing and behaviour configuration.
    pub const fn descriptor(&self) -> &InductionDescriptor {
        &self.descriptor
    }

    /// The descriptor's label.
    pub fn label(&self) -> &str {
        self.descriptor.label()
    }

    /// Run the body once.
    pub(crate) fn complete(
        &mut self,
        ctx: &mut ActionContext<'_>,
    ) -> Result<Response, PerformError> {
        self.body.complete(ctx)
    }
}
