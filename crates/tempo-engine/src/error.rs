//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure that stops the driver. Refused or
//! failed player actions are not errors here; they are responses.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: tempo_core::ConfigError,
    },

    /// A queue operation failed.
    #[error("queue error: {source}")]
    Queue {
        /// The underlying queue error.
        #[from]
        source: tempo_core::QueueError,
    },

    /// Spawning the demo cast failed.
    #[error("roster error: {source}")]
    Roster {
        /// The underlying roster error.
        #[from]
        source: tempo_actions::RosterError,
    },

    /// Opening or answering a contest failed.
    #[error("contest error: {source}")]
    Contest {
        /// The underlying contest error.
        #[from]
        source: tempo_actions::ContestError,
    },

    /// Serializing the run summary failed.
    #[error("summary serialization failed: {source}")]
    Summary {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}
