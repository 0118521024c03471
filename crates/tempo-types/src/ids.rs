//! Identifiers for actors and contests.
//!
//! These are the only long-lived identities the scheduler hands out. Queue
//! entries are addressed by a per-queue `Reference` instead, so nothing here
//! outlives the world that minted it. IDs are UUID v7: the roster and the
//! contest board key `BTreeMap`s by them, and time-ordered IDs make those
//! maps iterate in spawn/open order.
//!
//! Each ID type carries a short [`KIND`](ActorId::KIND) tag so log lines
//! and parse errors say which kind of identifier was involved.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A string that does not parse as an identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} id '{input}'")]
pub struct ParseIdError {
    /// Which identifier kind was expected.
    pub kind: &'static str,
    /// The rejected input.
    pub input: String,
    /// Why the UUID parser refused it.
    #[source]
    pub source: uuid::Error,
}

/// Defines a UUID v7 identifier newtype tagged with its kind.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident => $kind:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Kind tag used in logs and parse errors.
            pub const KIND: &'static str = $kind;

            /// Mint a fresh, time-ordered identifier.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// The underlying [`Uuid`].
            pub const fn into_inner(self) -> Uuid {
                self.0
            }

            /// `kind:xxxxxxxx`, the kind tag plus the last eight hex digits.
            ///
            /// The tail is used because v7 IDs minted close together share
            /// their leading timestamp digits.
            pub fn short(self) -> String {
                let simple = self.0.simple().to_string();
                let tail = simple.get(simple.len().saturating_sub(8)..).unwrap_or_default();
                format!("{}:{tail}", Self::KIND)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(input: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(input.trim())
                    .map(Self)
                    .map_err(|source| ParseIdError {
                        kind: Self::KIND,
                        input: input.to_owned(),
                        source,
                    })
            }
        }
    };
}

define_id! {
    /// Unique identifier for an actor (player character or NPC).
    ActorId => "actor"
}

define_id! {
    /// Unique identifier for a timed contest (trivia round, duel challenge).
    ContestId => "contest"
}
