//! UAC Generator
//!
//! Issues unique access codes to survey cases and manages their lifecycle.
//! Every uniqueness guarantee rests on the store's atomic insert-if-absent;
//! this crate adds collision retry, a per-case precheck and bounded
//! concurrency on top.
//!
//! Features:
//! - Twelve-digit and sixteen-character code formats selected by kind
//! - Batch generation with first-error-wins reporting
//! - Import of externally generated codes with conflict detection
//! - Enable/disable, listings by code or case, counts and admin delete
//! - Instrument-driven generation against a survey-metadata catalog
//!
//! ```no_run
//! use std::sync::Arc;
//! use uac_config::GeneratorSettings;
//! use uac_generator::UacGenerator;
//! use uac_store::MemoryStore;
//!
//! # async fn run() -> uac_generator::Result<()> {
//! let generator = UacGenerator::new(Arc::new(MemoryStore::new()), GeneratorSettings::default());
//! generator.generate("opn2101a", &["10001", "10002"]).await?;
//! let codes = generator.list_by_case_id("opn2101a").await?;
//! assert_eq!(codes.len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod allocator;
pub mod batch;
pub mod catalog;
pub mod codes;
pub mod error;
pub mod format;
pub mod generator;
pub mod import;
pub mod lifecycle;
mod pool;

pub use batch::GenerateSummary;
pub use catalog::{InstrumentCatalog, InstrumentModes, CAWI_MODE};
pub use codes::{chunk_code, CodeChunks, CodeInfo, Codes};
pub use error::{CatalogError, ImportError, Result, UacError};
pub use format::{CodeFormat, APPROVED_CHARACTERS};
pub use generator::UacGenerator;
pub use lifecycle::BulkToggleSummary;

#[cfg(test)]
mod tests;
