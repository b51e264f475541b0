//! Configuration management module for the object tracker.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base
//! - Configuration file support
//! - Environment variable overrides
//! - Component-wise validation
mod discovery;
mod filter;
mod notification;
pub use discovery::*;
pub use filter::*;
pub use notification::*;

use std::env;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::CONFIG_ENV_PREFIX;
use crate::constants::CONFIG_ENV_SEPARATOR;
use crate::constants::CONFIG_PATH_ENV;
use crate::Result;

/// Main configuration container for a tracker
///
/// Combines all section configurations with hierarchical override support:
/// 1. Default values from code implementation
/// 2. Configuration file specified by `CONFIG_PATH`
/// 3. Environment variables (highest priority)
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Which objects are tracked
    #[serde(default)]
    pub filter: FilterConfig,
    /// Where servers are discovered
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    /// How object notifications are relayed
    #[serde(default)]
    pub notification: NotificationConfig,
}

impl TrackerConfig {
    /// Loads configuration from hierarchical sources without validation.
    ///
    /// Configuration sources are merged in the following order (later sources override earlier):
    /// 1. Type defaults (lowest priority)
    /// 2. Configuration file from `CONFIG_PATH` environment variable (if set)
    /// 3. Environment variables with `TRACKER__` prefix (highest priority)
    ///
    /// # Examples
    /// ```ignore
    /// std::env::set_var("CONFIG_PATH", "config/tracker.toml");
    /// std::env::set_var("TRACKER__DISCOVERY__LOCAL_ONLY", "true");
    /// let cfg = TrackerConfig::new()?.validate()?;
    /// ```
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var(CONFIG_PATH_ENV) {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(env_source());

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Applies additional configuration overrides from file without validation.
    ///
    /// Merging order (later sources override earlier):
    /// 1. Current configuration values
    /// 2. New configuration file
    /// 3. Latest environment variables (highest priority)
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(env_source())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Validates configuration and returns validated instance.
    pub fn validate(self) -> Result<Self> {
        self.filter.validate()?;
        self.notification.validate()?;
        Ok(self)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(CONFIG_ENV_PREFIX)
        .separator(CONFIG_ENV_SEPARATOR)
        .ignore_empty(true)
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("filter.classes")
        .with_list_parse_key("notification.enabled_types")
}
