//! In-memory code store with optional persistent snapshot
//!
//! Records live in a `DashMap`; the entry API gives per-key atomic
//! insert-if-absent. When a snapshot directory is configured, mutations mark
//! the snapshot dirty and a single background task rewrites `codes.json`
//! once the flush delay has passed. The write itself runs on the blocking
//! pool. A mutation's outcome never depends on the snapshot write: failed
//! flushes are logged and retried on the next flush, `force_snapshot`, or
//! drop.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::error::{Result, StoreError};
use crate::record::{CodeFilter, CodeKey, CodeRecord, StoredCode};
use crate::CodeStore;

/// Snapshot file name inside the snapshot directory
pub const SNAPSHOT_FILE: &str = "codes.json";

/// Time between the first unsaved mutation and the snapshot write
pub const DEFAULT_SNAPSHOT_DELAY: Duration = Duration::from_millis(100);

/// Snapshot target and flush bookkeeping
#[derive(Debug)]
struct Snapshot {
    path: PathBuf,
    delay: Duration,

    /// Mutations exist that no completed write contains
    dirty: AtomicBool,

    /// A background flush is pending
    scheduled: AtomicBool,

    /// Completed snapshot writes
    writes: AtomicU64,

    /// Serializes writes; the image is collected under it so a stale image
    /// never lands last
    lock: Mutex<()>,
}

#[derive(Debug, Default)]
struct Shared {
    /// Records keyed by (kind, code)
    codes: DashMap<CodeKey, CodeRecord>,

    /// Present when persistence is enabled
    snapshot: Option<Snapshot>,
}

/// Thread-safe in-memory code store
#[derive(Debug, Default)]
pub struct MemoryStore {
    shared: Arc<Shared>,
}

impl MemoryStore {
    /// Create an empty, purely in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a store persisted under `dir`, loading any existing snapshot
    pub fn with_snapshot_dir(dir: impl AsRef<Path>) -> Result<Self> {
        Self::with_snapshot(dir, DEFAULT_SNAPSHOT_DELAY)
    }

    /// Open a persisted store whose background flush waits `delay`
    pub fn with_snapshot(dir: impl AsRef<Path>, delay: Duration) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let shared = Shared {
            snapshot: Some(Snapshot {
                path: dir.join(SNAPSHOT_FILE),
                delay,
                dirty: AtomicBool::new(false),
                scheduled: AtomicBool::new(false),
                writes: AtomicU64::new(0),
                lock: Mutex::new(()),
            }),
            ..Shared::default()
        };
        shared.load_from_disk()?;
        Ok(Self {
            shared: Arc::new(shared),
        })
    }

    /// Total number of records across all code-spaces
    pub fn len(&self) -> usize {
        self.shared.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.codes.is_empty()
    }

    /// Whether mutations are written to disk
    pub fn is_persistent(&self) -> bool {
        self.shared.snapshot.is_some()
    }

    /// Number of snapshot writes completed since open
    pub fn snapshot_writes(&self) -> u64 {
        self.shared
            .snapshot
            .as_ref()
            .map_or(0, |snapshot| snapshot.writes.load(Ordering::Acquire))
    }

    /// Force a snapshot to disk (for graceful shutdown)
    pub fn force_snapshot(&self) -> Result<()> {
        let Some(snapshot) = &self.shared.snapshot else {
            return Ok(());
        };
        let _guard = snapshot.lock.lock();
        snapshot.dirty.store(false, Ordering::Release);
        let result = self.shared.write_locked(snapshot);
        if result.is_err() {
            snapshot.dirty.store(true, Ordering::Release);
        }
        result
    }

    /// Record a committed mutation and make sure a flush is pending
    fn mark_dirty(&self) {
        let Some(snapshot) = &self.shared.snapshot else {
            return;
        };
        snapshot.dirty.store(true, Ordering::Release);
        if snapshot.scheduled.swap(true, Ordering::AcqRel) {
            return;
        }

        match Handle::try_current() {
            Ok(handle) => {
                let shared = Arc::downgrade(&self.shared);
                handle.spawn(flush_after(shared, snapshot.delay));
            }
            Err(_) => self.shared.flush_dirty(),
        }
    }
}

/// Wait out the delay, then write the snapshot on the blocking pool
async fn flush_after(shared: Weak<Shared>, delay: Duration) {
    tokio::time::sleep(delay).await;
    // A dropped store has already flushed
    let Some(shared) = shared.upgrade() else {
        return;
    };
    if let Err(e) = tokio::task::spawn_blocking(move || shared.flush_dirty()).await {
        warn!(error = %e, "Snapshot flush task failed");
    }
}

impl Shared {
    /// Write the snapshot if anything changed since the last write
    fn flush_dirty(&self) {
        let Some(snapshot) = &self.snapshot else {
            return;
        };
        snapshot.scheduled.store(false, Ordering::Release);

        let _guard = snapshot.lock.lock();
        if !snapshot.dirty.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Err(e) = self.write_locked(snapshot) {
            snapshot.dirty.store(true, Ordering::Release);
            warn!(error = %e, "Failed to write code snapshot to {:?}", snapshot.path);
        }
    }

    fn load_from_disk(&self) -> Result<()> {
        let Some(snapshot) = &self.snapshot else {
            return Ok(());
        };
        let path = &snapshot.path;
        if !path.exists() {
            info!("No existing code snapshot found at {:?}", path);
            return Ok(());
        }

        let data = fs::read_to_string(path)?;
        let entries: Vec<StoredCode> = serde_json::from_str(&data)?;
        for entry in entries {
            self.codes.insert(entry.key, entry.record);
        }

        info!("Loaded {} codes from snapshot", self.codes.len());
        Ok(())
    }

    /// Collect the current image and replace the snapshot file
    ///
    /// Callers hold `snapshot.lock`.
    fn write_locked(&self, snapshot: &Snapshot) -> Result<()> {
        let mut entries: Vec<StoredCode> = self
            .codes
            .iter()
            .map(|entry| StoredCode {
                key: entry.key().clone(),
                record: entry.value().clone(),
            })
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));

        let data = serde_json::to_string_pretty(&entries)?;
        let tmp = snapshot.path.with_extension("json.tmp");
        fs::write(&tmp, data)?;
        fs::rename(&tmp, &snapshot.path)?;

        snapshot.writes.fetch_add(1, Ordering::AcqRel);
        debug!("Saved {} codes to snapshot", entries.len());
        Ok(())
    }
}

impl Drop for MemoryStore {
    fn drop(&mut self) {
        // Waits for an in-flight background write before checking
        self.shared.flush_dirty();
    }
}

#[async_trait]
impl CodeStore for MemoryStore {
    async fn insert_if_absent(&self, key: &CodeKey, record: CodeRecord) -> Result<()> {
        match self.shared.codes.entry(key.clone()) {
            Entry::Occupied(_) => return Err(StoreError::already_exists(&key.name)),
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
        }
        self.mark_dirty();
        Ok(())
    }

    async fn update(&self, key: &CodeKey, record: CodeRecord) -> Result<()> {
        match self.shared.codes.get_mut(key) {
            Some(mut existing) => *existing = record,
            None => return Err(StoreError::not_found(&key.name)),
        }
        self.mark_dirty();
        Ok(())
    }

    async fn get(&self, key: &CodeKey) -> Result<CodeRecord> {
        self.shared
            .codes
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::not_found(&key.name))
    }

    async fn scan(&self, filter: &CodeFilter) -> Result<Vec<StoredCode>> {
        let mut matches: Vec<StoredCode> = self
            .shared
            .codes
            .iter()
            .filter(|entry| filter.matches(entry.key(), entry.value()))
            .map(|entry| StoredCode {
                key: entry.key().clone(),
                record: entry.value().clone(),
            })
            .collect();
        matches.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(matches)
    }

    async fn count(&self, filter: &CodeFilter) -> Result<usize> {
        Ok(self
            .shared
            .codes
            .iter()
            .filter(|entry| filter.matches(entry.key(), entry.value()))
            .count())
    }

    async fn delete_many(&self, keys: &[CodeKey]) -> Result<()> {
        let mut removed = false;
        for key in keys {
            removed |= self.shared.codes.remove(key).is_some();
        }
        if removed {
            self.mark_dirty();
        }
        Ok(())
    }
}
