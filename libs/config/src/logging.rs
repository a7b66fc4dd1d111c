//! Tracing subscriber setup

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::settings::LoggingSettings;

/// Build the filter: `RUST_LOG` wins, otherwise the configured level
pub fn env_filter(settings: &LoggingSettings) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new(&settings.level)?),
    }
}

/// Install the global subscriber
///
/// Returns `Ok(false)` when a subscriber was already installed, so tests
/// and embedding services can call this unconditionally.
pub fn init(settings: &LoggingSettings) -> Result<bool> {
    let filter = env_filter(settings)?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if settings.json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .is_ok()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .is_ok()
    };

    Ok(installed)
}
