//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct JunctionConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Declared bot connections.
    #[serde(default)]
    pub bots: Vec<BotEntry>,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base log level (trace, debug, info, warn, error).
    #[serde(default)]
    pub level: LogLevel,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include thread ids in log output.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include file name and line number in log output.
    #[serde(default)]
    pub file_location: bool,

    /// Per-module level overrides, e.g. `junction_core = "trace"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            format: LogFormat::default(),
            thread_ids: false,
            file_location: false,
            filters: HashMap::new(),
        }
    }
}

/// Log verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose.
    Trace,
    /// Debugging detail.
    Debug,
    /// Normal operation.
    #[default]
    Info,
    /// Something looks wrong.
    Warn,
    /// Errors only.
    Error,
}

impl LogLevel {
    /// Returns the level as its lowercase directive string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Converts to a `tracing` level.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Single-line, terse output.
    #[default]
    Compact,
    /// Default `tracing_subscriber` formatting.
    Full,
    /// Multi-line human-oriented output.
    Pretty,
}

/// One declared bot connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotEntry {
    /// Unique identifier for this bot instance.
    pub id: String,

    /// Name of the manager to register under; `None` leaves the choice
    /// to the assembling application.
    #[serde(default)]
    pub manager: Option<String>,

    /// Whether this bot should be brought up.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Connector-specific settings, passed through untouched.
    #[serde(default)]
    pub settings: HashMap<String, serde_json::Value>,
}

fn default_enabled() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = JunctionConfig::default();
        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert!(config.bots.is_empty());
    }

    #[test]
    fn bot_entry_defaults_enabled() {
        let entry: BotEntry = serde_json::from_str(r#"{"id": "bot-1"}"#).unwrap();
        assert!(entry.enabled);
        assert!(entry.manager.is_none());
        assert!(entry.settings.is_empty());
    }
}
