//! Configuration module for the Junction runtime.
//!
//! TOML-file and environment-variable based configuration for logging
//! and declared bot connections.

pub mod error;
pub mod loader;
pub mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, load_config};
pub use schema::{BotEntry, JunctionConfig, LogFormat, LogLevel, LoggingConfig};
