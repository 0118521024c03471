//! Configuration loading and typed config structures for the Tempo scheduler.
//!
//! The canonical configuration lives in `tempo-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure, and provides a loader that reads and validates the file.
//! Every field has a default, so an empty file is a valid configuration.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;
use tempo_types::QueueName;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but is not usable.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level scheduler configuration.
///
/// Mirrors the structure of `tempo-config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SchedulerConfig {
    /// Virtual clock settings.
    #[serde(default)]
    pub clock: ClockConfig,

    /// Queues registered with the queue manager at start-up.
    #[serde(default = "default_queues")]
    pub queues: Vec<QueueName>,

    /// Shared skill-check gate parameters.
    #[serde(default)]
    pub skills: SkillsConfig,

    /// Engine driver settings.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            clock: ClockConfig::default(),
            queues: default_queues(),
            skills: SkillsConfig::default(),
            engine: EngineConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl SchedulerConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `TEMPO_LOG` overrides `logging.level`
    /// - `TEMPO_RUN_FOR_MS` overrides `engine.run_for_ms`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, apply environment
    /// overrides, and validate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply `TEMPO_*` environment overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var("TEMPO_LOG") {
            self.logging.level = level;
        }
        if let Some(run_for) = std::env::var("TEMPO_RUN_FOR_MS")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
        {
            self.engine.run_for_ms = run_for;
        }
    }

    /// Check invariants that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.clock.tick_interval_ms == 0 {
            return Err(invalid("clock.tick_interval_ms must be at least 1"));
        }
        if self.skills.ceiling_pct > 100 {
            return Err(invalid("skills.ceiling_pct must be at most 100"));
        }
        if self.skills.floor_pct > self.skills.ceiling_pct {
            return Err(invalid("skills.floor_pct must not exceed skills.ceiling_pct"));
        }
        if self.queues.is_empty() {
            return Err(invalid("at least one queue must be configured"));
        }
        let unique: BTreeSet<QueueName> = self.queues.iter().copied().collect();
        if unique.len() != self.queues.len() {
            return Err(invalid("queue list contains duplicates"));
        }
        Ok(())
    }
}

fn invalid(reason: &str) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.to_owned(),
    }
}

/// Virtual clock configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClockConfig {
    /// Virtual time at start-up, in milliseconds.
    #[serde(default)]
    pub start_ms: u64,

    /// Virtual milliseconds added per engine tick.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Real milliseconds the driver waits between ticks.
    #[serde(default = "default_pace_ms")]
    pub pace_ms: u64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            start_ms: 0,
            tick_interval_ms: default_tick_interval_ms(),
            pace_ms: default_pace_ms(),
        }
    }
}

/// Shared skill-check gate configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SkillsConfig {
    /// Lowest success chance any check can have, in percent.
    #[serde(default = "default_floor_pct")]
    pub floor_pct: u8,

    /// Highest success chance any check can have, in percent.
    #[serde(default = "default_ceiling_pct")]
    pub ceiling_pct: u8,

    /// Seed for the deterministic roll generator.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for SkillsConfig {
    fn default() -> Self {
        Self {
            floor_pct: default_floor_pct(),
            ceiling_pct: default_ceiling_pct(),
            seed: default_seed(),
        }
    }
}

/// Engine driver configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// How long to run, in virtual milliseconds.
    #[serde(default = "default_run_for_ms")]
    pub run_for_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            run_for_ms: default_run_for_ms(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default `tracing` filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Serde defaults
// ---------------------------------------------------------------------------

fn default_queues() -> Vec<QueueName> {
    vec![
        QueueName::Inductions,
        QueueName::Objects,
        QueueName::Lights,
        QueueName::Repair,
        QueueName::Weather,
        QueueName::Ambient,
        QueueName::Contests,
    ]
}

const fn default_tick_interval_ms() -> u64 {
    250
}

const fn default_pace_ms() -> u64 {
    50
}

const fn default_floor_pct() -> u8 {
    5
}

const fn default_ceiling_pct() -> u8 {
    95
}

const fn default_seed() -> u64 {
    42
}

const fn default_run_for_ms() -> u64 {
    30_000
}

fn default_log_level() -> String {
    "info".to_owned()
}
