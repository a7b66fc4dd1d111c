//! # UAC Service Configuration
//!
//! Centralized configuration for the UAC generator and its backing store.
//!
//! ## Features
//!
//! - **Layered loading**: built-in defaults, an optional TOML file, then
//!   `UAC_`-prefixed environment variables
//! - **Settings sections**: generator (code kind, pool size, attempt bound),
//!   store (snapshot directory) and logging
//! - **Logging setup**: one call to install the tracing subscriber
//!
//! ## Usage
//!
//! ```rust,no_run
//! use uac_config::{load_config, logging};
//!
//! let config = load_config(None)?;
//! logging::init(&config.logging)?;
//! println!("issuing codes of kind {}", config.generator.kind);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod logging;
pub mod service_config;
pub mod settings;

// Re-export commonly used types
pub use service_config::{load_config, ServiceConfig, DEFAULT_CONFIG_PATH, ENV_PREFIX};
pub use settings::{GeneratorSettings, LoggingSettings, StoreSettings};
