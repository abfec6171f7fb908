//! Worker pool: concurrent execution of per-entry transfer tasks
//!
//! A fixed number of executors drain each batch via `buffer_unordered`, so
//! in-flight tasks never exceed the worker count and the connection pool
//! bounds in-flight requests below that. Every entry produces exactly one
//! [`TransferResult`], whatever its outcome.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use tracing::debug;

use super::entry::{TransferEntry, TransferKind, TransferOutcome, TransferResult};
use super::progress::{ProgressSink, ProgressTracker};
use super::retry::{with_backoff, RetryPolicy};
use super::scheduler::Batch;
use crate::store::{DeleteError, ObjectStore, BULK_DELETE_MAX_KEYS};

/// Default upper bound on concurrent workers
pub const DEFAULT_WORKERS: usize = 32;

/// Cooperative cancellation signal
///
/// Setting the flag stops new task dispatch; tasks already running finish
/// their current attempt so neither side is left in a torn state.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Clamp the requested worker count to what the host and the connection
/// pool can actually keep busy
pub fn effective_workers(requested: Option<usize>, entry_count: usize, pool_capacity: usize) -> usize {
    let cpu = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);

    requested
        .unwrap_or(DEFAULT_WORKERS)
        .min(cpu * 8)
        .min(pool_capacity)
        .min(entry_count)
        .max(1)
}

/// Fixed-size pool of concurrent transfer executors
pub struct WorkerPool {
    store: Arc<dyn ObjectStore>,
    retry: RetryPolicy,
    workers: usize,
    dry_run: bool,
    overwrite: bool,
    tracker: Arc<ProgressTracker>,
    sink: Arc<dyn ProgressSink>,
    cancel: CancelFlag,
}

impl WorkerPool {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn ObjectStore>,
        retry: RetryPolicy,
        workers: usize,
        dry_run: bool,
        overwrite: bool,
        tracker: Arc<ProgressTracker>,
        sink: Arc<dyn ProgressSink>,
        cancel: CancelFlag,
    ) -> Self {
        Self {
            store,
            retry,
            workers: workers.max(1),
            dry_run,
            overwrite,
            tracker,
            sink,
            cancel,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run one upload/download batch to completion
    pub async fn run_batch(&self, batch: Batch) -> Vec<TransferResult> {
        self.tracker.record_submitted(batch.entries.len() as u64);
        self.sink.on_submitted(&self.tracker.snapshot());

        stream::iter(batch.entries.into_iter().map(|entry| self.execute(entry)))
            .buffer_unordered(self.workers)
            .collect()
            .await
    }

    async fn execute(&self, entry: TransferEntry) -> TransferResult {
        let started = Instant::now();
        let (outcome, bytes) = self.execute_inner(&entry).await;

        let result = TransferResult {
            entry,
            outcome,
            bytes_transferred: bytes,
            elapsed: started.elapsed(),
        };

        self.tracker.record_result(&result);
        self.sink.on_completed(&self.tracker.snapshot());
        result
    }

    async fn execute_inner(&self, entry: &TransferEntry) -> (TransferOutcome, u64) {
        if self.cancel.is_cancelled() {
            return (TransferOutcome::Cancelled, 0);
        }

        if self.dry_run {
            debug!(
                kind = %entry.kind,
                source = %entry.source_key,
                dest = entry.destination_key.as_deref().unwrap_or("-"),
                "dry run"
            );
            return (TransferOutcome::Succeeded, 0);
        }

        match entry.kind {
            TransferKind::Upload => {
                let local = PathBuf::from(&entry.source_key);
                let key = entry.destination_key.clone().unwrap_or_default();
                let store = Arc::clone(&self.store);

                let (result, attempts) = with_backoff(&self.retry, move || {
                    let store = Arc::clone(&store);
                    let local = local.clone();
                    let key = key.clone();
                    async move { store.put_object(&local, &key).await }
                })
                .await;

                match result {
                    Ok(bytes) => (success_outcome(attempts), bytes),
                    Err(e) => (TransferOutcome::Failed(e.to_string()), 0),
                }
            }

            TransferKind::Download => {
                let key = entry.source_key.clone();
                let local = PathBuf::from(entry.destination_key.as_deref().unwrap_or_default());

                if local.exists() && !self.overwrite {
                    debug!(dest = %local.display(), "skipping existing file");
                    return (TransferOutcome::Skipped, 0);
                }

                let store = Arc::clone(&self.store);
                let (result, attempts) = with_backoff(&self.retry, move || {
                    let store = Arc::clone(&store);
                    let key = key.clone();
                    let local = local.clone();
                    async move { store.get_object(&key, &local).await }
                })
                .await;

                match result {
                    Ok(bytes) => (success_outcome(attempts), bytes),
                    Err(e) => (TransferOutcome::Failed(e.to_string()), 0),
                }
            }

            // Delete entries go through run_delete_batch; a stray one here
            // is a scheduling bug and must not vanish silently.
            TransferKind::Delete => (
                TransferOutcome::Failed("delete entries are processed in bulk batches".to_string()),
                0,
            ),
        }
    }

    /// Run one delete batch as bulk-delete calls, at most
    /// [`BULK_DELETE_MAX_KEYS`] keys per call
    pub async fn run_delete_batch(&self, batch: Batch) -> Vec<TransferResult> {
        self.tracker.record_submitted(batch.entries.len() as u64);
        self.sink.on_submitted(&self.tracker.snapshot());

        let mut results = Vec::with_capacity(batch.entries.len());

        for chunk in batch.entries.chunks(BULK_DELETE_MAX_KEYS) {
            if self.cancel.is_cancelled() {
                for entry in chunk {
                    results.push(self.finish(TransferResult::cancelled(entry.clone())));
                }
                continue;
            }

            if self.dry_run {
                for entry in chunk {
                    debug!(key = %entry.source_key, "dry run delete");
                    results.push(self.finish(TransferResult {
                        entry: entry.clone(),
                        outcome: TransferOutcome::Succeeded,
                        bytes_transferred: 0,
                        elapsed: std::time::Duration::ZERO,
                    }));
                }
                continue;
            }

            let started = Instant::now();
            let keys: Vec<String> = chunk.iter().map(|e| e.source_key.clone()).collect();
            let store = Arc::clone(&self.store);

            let (call_result, attempts) = with_backoff(&self.retry, move || {
                let store = Arc::clone(&store);
                let keys = keys.clone();
                async move { store.delete_objects(&keys).await }
            })
            .await;

            let elapsed = started.elapsed();

            match call_result {
                Ok(outcomes) => {
                    // Surface each key's outcome individually, never as one
                    // pass/fail flag for the whole call.
                    let mut by_key: HashMap<String, Option<DeleteError>> = outcomes
                        .into_iter()
                        .map(|o| (o.key, o.error))
                        .collect();

                    for entry in chunk {
                        let outcome = match by_key.remove(&entry.source_key) {
                            Some(None) => success_outcome(attempts),
                            Some(Some(err)) => {
                                TransferOutcome::Failed(format!("{}: {}", err.code, err.message))
                            }
                            None => TransferOutcome::Failed(
                                "store reported no outcome for key".to_string(),
                            ),
                        };

                        let bytes = if outcome.is_success() {
                            entry.size_bytes.unwrap_or(0)
                        } else {
                            0
                        };

                        results.push(self.finish(TransferResult {
                            entry: entry.clone(),
                            outcome,
                            bytes_transferred: bytes,
                            elapsed,
                        }));
                    }
                }
                Err(e) => {
                    for entry in chunk {
                        results.push(self.finish(TransferResult {
                            entry: entry.clone(),
                            outcome: TransferOutcome::Failed(e.to_string()),
                            bytes_transferred: 0,
                            elapsed,
                        }));
                    }
                }
            }
        }

        results
    }

    fn finish(&self, result: TransferResult) -> TransferResult {
        self.tracker.record_result(&result);
        self.sink.on_completed(&self.tracker.snapshot());
        result
    }

    /// Record cancelled results for entries that were never submitted
    pub fn mark_not_attempted(&self, entries: Vec<TransferEntry>) -> Vec<TransferResult> {
        self.tracker.record_submitted(entries.len() as u64);
        entries
            .into_iter()
            .map(|entry| self.finish(TransferResult::cancelled(entry)))
            .collect()
    }
}

fn success_outcome(attempts: u32) -> TransferOutcome {
    if attempts > 1 {
        TransferOutcome::Retried(attempts - 1)
    } else {
        TransferOutcome::Succeeded
    }
}
