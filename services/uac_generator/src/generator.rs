//! UAC generator handle
//!
//! Owns the store handle and settings shared by every operation. Cloning is
//! cheap; pooled tasks each take a clone.

use std::sync::Arc;
use tracing::{info, warn};
use uac_config::{GeneratorSettings, ServiceConfig};
use uac_store::{CodeFilter, CodeKey, CodeStore, MemoryStore};

use crate::error::{Result, UacError};
use crate::format::CodeFormat;
use crate::pool::WorkerPool;

/// Generation, import and lifecycle operations over one code-space
#[derive(Debug, Clone)]
pub struct UacGenerator {
    /// Backing key-value store
    store: Arc<dyn CodeStore>,

    /// Kind, pool bound and retry bound
    settings: GeneratorSettings,

    /// Format selected by the kind, `None` if unrecognized
    format: Option<CodeFormat>,
}

impl UacGenerator {
    /// Create a generator over `store`
    ///
    /// An unrecognized kind is accepted here and reported by every operation
    /// that needs to generate or validate a code.
    pub fn new(store: Arc<dyn CodeStore>, settings: GeneratorSettings) -> Self {
        let format = CodeFormat::for_kind(&settings.kind);
        if format.is_none() {
            warn!(kind = %settings.kind, "Unrecognized UAC kind, generation and validation will fail");
        }

        Self {
            store,
            settings,
            format,
        }
    }

    /// Create a generator backed by a [`MemoryStore`] built from configuration
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let store = match &config.store.snapshot_dir {
            Some(dir) => {
                info!("Opening code store with snapshot at {:?}", dir);
                MemoryStore::with_snapshot(dir, config.store.snapshot_delay())?
            }
            None => MemoryStore::new(),
        };
        Ok(Self::new(Arc::new(store), config.generator.clone()))
    }

    /// Code-space partition name
    pub fn kind(&self) -> &str {
        &self.settings.kind
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<dyn CodeStore> {
        &self.store
    }

    /// The configured format, or [`UacError::UnknownFormat`]
    pub fn format(&self) -> Result<CodeFormat> {
        self.format
            .ok_or_else(|| UacError::unknown_format(&self.settings.kind))
    }

    /// Whether `code` has the configured format's shape
    pub fn validate(&self, code: &str) -> Result<bool> {
        Ok(self.format()?.validate(code))
    }

    /// Store key of `code` in this code-space
    pub fn code_key(&self, code: &str) -> CodeKey {
        CodeKey::new(self.settings.kind.as_str(), code)
    }

    /// Filter matching every code of `instrument` in this code-space
    pub(crate) fn instrument_filter(&self, instrument: &str) -> CodeFilter {
        CodeFilter::kind(self.settings.kind.as_str()).with_instrument(instrument)
    }

    /// Fresh pool bounded by `max_concurrent`
    pub(crate) fn pool(&self) -> WorkerPool {
        WorkerPool::new(self.settings.max_concurrent)
    }
}
