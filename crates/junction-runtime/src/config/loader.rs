//! Configuration loader using figment.
//!
//! Sources are layered, later overriding earlier:
//!
//! 1. Built-in defaults
//! 2. Programmatic overrides ([`ConfigLoader::merge`])
//! 3. A TOML file ([`ConfigLoader::file`])
//! 4. Environment variables (`JUNCTION_*`)
//!
//! # Environment Variable Mapping
//!
//! Variables use the `JUNCTION_` prefix with `__` as the section
//! separator:
//!
//! - `JUNCTION_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//! - `JUNCTION_LOGGING__FORMAT=pretty` → `logging.format = "pretty"`
//!
//! # Example
//!
//! ```rust,ignore
//! use junction_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .file("junction.toml")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use tracing::{debug, trace};

use super::error::{ConfigError, ConfigResult};
use super::schema::JunctionConfig;

/// Layered configuration loader.
pub struct ConfigLoader {
    figment: Figment,
    config_file: Option<PathBuf>,
    load_env: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader with defaults and environment loading enabled.
    pub fn new() -> Self {
        Self {
            figment: Figment::new(),
            config_file: None,
            load_env: true,
        }
    }

    /// Sets the configuration file to load. Missing files are an error.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enables loading environment variables (default: true).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges configuration programmatically, overriding the defaults
    /// but not file or environment values.
    pub fn merge(mut self, config: JunctionConfig) -> Self {
        self.figment = self.figment.merge(Serialized::defaults(config));
        self
    }

    /// Loads and returns the configuration.
    pub fn load(self) -> ConfigResult<JunctionConfig> {
        let mut figment = Figment::from(Serialized::defaults(JunctionConfig::default()));
        figment = figment.merge(self.figment);

        if let Some(path) = &self.config_file {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.clone()));
            }
            debug!(path = %path.display(), "Loading configuration file");
            figment = figment.merge(Toml::file(path));
        }

        if self.load_env {
            trace!("Loading environment variables with JUNCTION_ prefix");
            figment = figment.merge(Env::prefixed("JUNCTION_").split("__"));
        }

        let config: JunctionConfig = figment.extract()?;
        debug!(
            logging_level = %config.logging.level,
            bots = config.bots.len(),
            "Configuration loaded"
        );
        Ok(config)
    }
}

/// Loads configuration from defaults and the environment only.
pub fn load_config() -> ConfigResult<JunctionConfig> {
    ConfigLoader::new().load()
}
