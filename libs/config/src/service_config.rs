//! Service Configuration Module
//!
//! Provides configuration loading for the UAC service.
//! Supports loading from TOML files with environment variable overrides.

use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::settings::{GeneratorSettings, LoggingSettings, StoreSettings};

/// Config file consulted when no explicit path is given
pub const DEFAULT_CONFIG_PATH: &str = "config/uac.toml";

/// Prefix for environment overrides, e.g. `UAC_GENERATOR__KIND=uac16`
pub const ENV_PREFIX: &str = "UAC";

/// Main service configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Code generation settings
    pub generator: GeneratorSettings,

    /// Backing store settings
    pub store: StoreSettings,

    /// Logging settings
    pub logging: LoggingSettings,
}

impl ServiceConfig {
    /// Load configuration from an optional file with `UAC_` environment overrides
    ///
    /// An explicit path must exist; the default path is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    /// Load configuration reading environment overrides under `prefix`
    pub fn load_with_prefix(path: Option<&Path>, prefix: &str) -> Result<Self> {
        let (file, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };

        if file.exists() {
            info!("Loading UAC config: {:?}", file);
        } else {
            debug!("No config file at {:?}, using defaults", file);
        }

        let config = Config::builder()
            .add_source(File::from(file.as_path()).required(required))
            .add_source(
                Environment::with_prefix(prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let mut service_config: ServiceConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        service_config.expand_env_vars()?;
        service_config.validate()?;
        Ok(service_config)
    }

    /// Expand environment variables in path values
    pub fn expand_env_vars(&mut self) -> Result<()> {
        if let Some(dir) = &self.store.snapshot_dir {
            let raw = dir.to_string_lossy().into_owned();
            let expanded =
                shellexpand::full(&raw).context("Failed to expand snapshot directory")?;
            self.store.snapshot_dir = Some(PathBuf::from(expanded.as_ref()));
        }
        Ok(())
    }

    /// Reject settings the generator cannot run with
    ///
    /// The code kind itself is not checked here: an unrecognized kind is
    /// reported by the generator on first use.
    pub fn validate(&self) -> Result<()> {
        if self.generator.kind.trim().is_empty() {
            bail!("generator.kind cannot be empty");
        }
        if self.generator.max_concurrent == 0 {
            bail!("generator.max_concurrent must be greater than 0");
        }
        if self.generator.max_attempts == 0 {
            bail!("generator.max_attempts must be greater than 0");
        }
        Ok(())
    }
}

/// Convenience function to load configuration with defaults
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig> {
    ServiceConfig::load(path)
}
