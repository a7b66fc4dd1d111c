//! UAC Code Store
//!
//! The storage contract the UAC generator runs against, plus an in-memory
//! implementation.
//!
//! Features:
//! - Atomic insert-if-absent, the only guarantee of code uniqueness
//! - Point reads, filtered scans and counts over one code-space partition
//! - Batched deletes for administrative cleanup
//! - `MemoryStore` with optional JSON snapshot persistence
//! - Call-recording and failure-scripting wrappers for tests

pub mod error;
pub mod memory;
pub mod record;
pub mod test_utils;

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::fmt::Debug;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use record::{CodeFilter, CodeKey, CodeRecord, StoredCode, UNKNOWN_INSTRUMENT};

/// Key-value store holding code records
///
/// Every operation is a single atomic step on the backend. Nothing here
/// spans more than one record transactionally.
#[async_trait]
pub trait CodeStore: Send + Sync + Debug {
    /// Insert a record, failing with [`StoreError::AlreadyExists`] if the key is taken
    async fn insert_if_absent(&self, key: &CodeKey, record: CodeRecord) -> Result<()>;

    /// Overwrite an existing record, failing with [`StoreError::NotFound`] if absent
    async fn update(&self, key: &CodeKey, record: CodeRecord) -> Result<()>;

    /// Read one record, failing with [`StoreError::NotFound`] if absent
    async fn get(&self, key: &CodeKey) -> Result<CodeRecord>;

    /// All records matching the filter
    async fn scan(&self, filter: &CodeFilter) -> Result<Vec<StoredCode>>;

    /// Number of records matching the filter
    async fn count(&self, filter: &CodeFilter) -> Result<usize>;

    /// Delete the given keys; absent keys are ignored
    async fn delete_many(&self, keys: &[CodeKey]) -> Result<()>;

    /// Keys of all records matching the filter
    async fn scan_keys(&self, filter: &CodeFilter) -> Result<Vec<CodeKey>> {
        Ok(self
            .scan(filter)
            .await?
            .into_iter()
            .map(|stored| stored.key)
            .collect())
    }

    /// Distinct instrument names in a code-space, sorted
    async fn distinct_instruments(&self, kind: &str) -> Result<Vec<String>> {
        let names: BTreeSet<String> = self
            .scan(&CodeFilter::kind(kind))
            .await?
            .into_iter()
            .map(|stored| stored.record.instrument_name)
            .collect();
        Ok(names.into_iter().collect())
    }
}
