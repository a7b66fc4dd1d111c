//! Store wrappers for tests: call recording and failure injection

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{Result, StoreError};
use crate::record::{CodeFilter, CodeKey, CodeRecord, StoredCode};
use crate::CodeStore;

/// Store operations that can be counted or scripted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Insert,
    Update,
    Get,
    Scan,
    Count,
    Delete,
}

impl StoreOp {
    const ALL: [StoreOp; 6] = [
        StoreOp::Insert,
        StoreOp::Update,
        StoreOp::Get,
        StoreOp::Scan,
        StoreOp::Count,
        StoreOp::Delete,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Counts every call made against the wrapped store
#[derive(Debug)]
pub struct RecordingStore<S> {
    inner: S,
    calls: [AtomicUsize; 6],
    /// Sizes of each `delete_many` batch, in call order
    delete_batches: Mutex<Vec<usize>>,
}

impl<S: CodeStore> RecordingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            calls: Default::default(),
            delete_batches: Mutex::new(Vec::new()),
        }
    }

    /// Number of calls made for `op`
    pub fn calls(&self, op: StoreOp) -> usize {
        self.calls[op.index()].load(Ordering::Relaxed)
    }

    /// Key counts passed to each `delete_many` call
    pub fn delete_batches(&self) -> Vec<usize> {
        self.delete_batches.lock().clone()
    }

    /// The wrapped store
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Zero every counter
    pub fn reset(&self) {
        for op in StoreOp::ALL {
            self.calls[op.index()].store(0, Ordering::Relaxed);
        }
        self.delete_batches.lock().clear();
    }

    fn record(&self, op: StoreOp) {
        self.calls[op.index()].fetch_add(1, Ordering::Relaxed);
    }
}

#[async_trait]
impl<S: CodeStore> CodeStore for RecordingStore<S> {
    async fn insert_if_absent(&self, key: &CodeKey, record: CodeRecord) -> Result<()> {
        self.record(StoreOp::Insert);
        self.inner.insert_if_absent(key, record).await
    }

    async fn update(&self, key: &CodeKey, record: CodeRecord) -> Result<()> {
        self.record(StoreOp::Update);
        self.inner.update(key, record).await
    }

    async fn get(&self, key: &CodeKey) -> Result<CodeRecord> {
        self.record(StoreOp::Get);
        self.inner.get(key).await
    }

    async fn scan(&self, filter: &CodeFilter) -> Result<Vec<StoredCode>> {
        self.record(StoreOp::Scan);
        self.inner.scan(filter).await
    }

    async fn count(&self, filter: &CodeFilter) -> Result<usize> {
        self.record(StoreOp::Count);
        self.inner.count(filter).await
    }

    async fn delete_many(&self, keys: &[CodeKey]) -> Result<()> {
        self.record(StoreOp::Delete);
        self.delete_batches.lock().push(keys.len());
        self.inner.delete_many(keys).await
    }
}

#[derive(Debug, Default)]
struct Script {
    queued: HashMap<StoreOp, VecDeque<StoreError>>,
    always: HashMap<StoreOp, StoreError>,
}

/// Injects scripted failures in front of the wrapped store
///
/// Queued failures are consumed one per call, oldest first. A standing
/// failure applies once the queue for that operation is empty.
#[derive(Debug)]
pub struct ScriptedStore<S> {
    inner: S,
    script: Mutex<Script>,
}

impl<S: CodeStore> ScriptedStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            script: Mutex::new(Script::default()),
        }
    }

    /// Fail the next call of `op` with `err`
    pub fn fail_next(&self, op: StoreOp, err: StoreError) {
        self.script
            .lock()
            .queued
            .entry(op)
            .or_default()
            .push_back(err);
    }

    /// Fail the next `times` calls of `op` with `err`
    pub fn fail_times(&self, op: StoreOp, err: StoreError, times: usize) {
        for _ in 0..times {
            self.fail_next(op, err.clone());
        }
    }

    /// Fail every call of `op` with `err` until cleared
    pub fn fail_always(&self, op: StoreOp, err: StoreError) {
        self.script.lock().always.insert(op, err);
    }

    /// Drop every scripted failure
    pub fn clear(&self) {
        let mut script = self.script.lock();
        script.queued.clear();
        script.always.clear();
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn check(&self, op: StoreOp) -> Result<()> {
        let mut script = self.script.lock();
        if let Some(err) = script.queued.get_mut(&op).and_then(VecDeque::pop_front) {
            return Err(err);
        }
        match script.always.get(&op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl<S: CodeStore> CodeStore for ScriptedStore<S> {
    async fn insert_if_absent(&self, key: &CodeKey, record: CodeRecord) -> Result<()> {
        self.check(StoreOp::Insert)?;
        self.inner.insert_if_absent(key, record).await
    }

    async fn update(&self, key: &CodeKey, record: CodeRecord) -> Result<()> {
        self.check(StoreOp::Update)?;
        self.inner.update(key, record).await
    }

    async fn get(&self, key: &CodeKey) -> Result<CodeRecord> {
        self.check(StoreOp::Get)?;
        self.inner.get(key).await
    }

    async fn scan(&self, filter: &CodeFilter) -> Result<Vec<StoredCode>> {
        self.check(StoreOp::Scan)?;
        self.inner.scan(filter).await
    }

    async fn count(&self, filter: &CodeFilter) -> Result<usize> {
        self.check(StoreOp::Count)?;
        self.inner.count(filter).await
    }

    async fn delete_many(&self, keys: &[CodeKey]) -> Result<()> {
        self.check(StoreOp::Delete)?;
        self.inner.delete_many(keys).await
    }
}
