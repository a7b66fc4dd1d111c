//! Bounded task fan-out shared by the batch operations
//!
//! A permit is taken before each unit is spawned, so at most `limit` units
//! run at once and the rest wait in the submitting loop. Every spawned task
//! is joined before results are returned.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tracing::warn;

use crate::error::{Result, UacError};

/// Semaphore-bounded worker pool for one batch call
#[derive(Debug)]
pub(crate) struct WorkerPool {
    permits: Arc<Semaphore>,
}

impl WorkerPool {
    pub(crate) fn new(limit: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(limit.max(1))),
        }
    }

    /// Run `work` once per unit and collect the results in completion order
    ///
    /// A task that panics contributes a [`UacError::Worker`] after the
    /// results of every task that completed normally.
    pub(crate) async fn run<U, F, Fut, T>(&self, units: U, work: F) -> Vec<Result<T>>
    where
        U: IntoIterator,
        F: Fn(U::Item) -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let (result_tx, mut result_rx) = mpsc::unbounded_channel();
        let mut handles = Vec::new();
        let mut failures = Vec::new();

        for unit in units {
            let permit = match self.permits.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    failures.push(Err(UacError::Worker(e.to_string())));
                    break;
                }
            };

            let task = work(unit);
            let result_tx = result_tx.clone();
            handles.push(tokio::spawn(async move {
                let result = task.await;
                drop(permit);
                // Receiver outlives every task
                let _ = result_tx.send(result);
            }));
        }
        drop(result_tx);

        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Worker task failed: {}", e);
                failures.push(Err(UacError::Worker(e.to_string())));
            }
        }

        let mut results = Vec::with_capacity(failures.len());
        while let Some(result) = result_rx.recv().await {
            results.push(result);
        }
        results.extend(failures);
        results
    }
}
