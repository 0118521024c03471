//! Action step outcomes and the messages they produce.

use serde::Serialize;
use tempo_types::{ActorId, Outcome};

use crate::error::ActionError;
use crate::induction::InductionInstance;

/// The outcome of one action step.
///
/// Instant actions answer with a plain response. Timed actions answer with
/// a response carrying an [`InductionInstance`]; the executor registers that
/// instance with the actor's induction manager and the text is shown
/// immediately ("You start digging.").
#[derive(Debug)]
pub struct Response {
    /// Text shown to the actor.
    pub text: String,
    /// How the text should be presented.
    pub outcome: Outcome,
    /// Follow-up induction to register, if any.
    pub induction: Option<InductionInstance>,
}

impl Response {
    /// A successful step.
    pub fn success(text: impl Into<String>) -> Self {
        Self::with_outcome(text, Outcome::Success)
    }

    /// A refused or failed step.
    pub fn failure(text: impl Into<String>) -> Self {
        Self::with_outcome(text, Outcome::Failure)
    }

    /// Neutral information.
    pub fn info(text: impl Into<String>) -> Self {
        Self::with_outcome(text, Outcome::Info)
    }

    fn with_outcome(text: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            text: text.into(),
            outcome,
            induction: None,
        }
    }

    /// Attach a follow-up induction.
    #[must_use]
    pub fn with_induction(mut self, induction: InductionInstance) -> Self {
        self.induction = Some(induction);
        self
    }

    /// Detach the follow-up induction, leaving `None` behind.
    pub const fn take_induction(&mut self) -> Option<InductionInstance> {
        self.induction.take()
    }

    /// Whether this response reports a failure.
    pub fn is_failure(&self) -> bool {
        self.outcome == Outcome::Failure
    }
}

impl From<ActionError> for Response {
    fn from(error: ActionError) -> Self {
        Self::failure(error.to_string())
    }
}

/// Who a delivered message is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "actor")]
pub enum Recipient {
    /// Only this actor.
    Actor(ActorId),
    /// Everyone who can see this actor, except the actor.
    Observers(ActorId),
    /// Everyone in the world.
    Everyone,
}

/// A message queued for output by the session layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delivery {
    /// Who receives the message.
    pub recipient: Recipient,
    /// The message text.
    pub text: String,
    /// How the text should be presented.
    pub outcome: Outcome,
}

#[cfg(test)]
mod tests {
    use tempo_types::Stance;

    use super::*;

    #[test]
    fn action_errors_become_failure_responses() {
        let response = Response::from(ActionError::WrongStance {
            stance: Stance::Sitting,
        });
        assert!(response.is_failure());
        assert_eq!(response.text, "You can't do that while sitting.");
        assert!(response.induction.is_none());
    }

    #[test]
    fn recipients_serialize_with_kind_tag() {
        let json = serde_json::to_value(Recipient::Everyone).ok();
        assert_eq!(
            json.and_then(|v| v.get("kind").cloned()),
            Some(serde_json::Value::from("everyone"))
        );
    }
}
