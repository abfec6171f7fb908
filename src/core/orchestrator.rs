//! Transfer orchestration
//!
//! One orchestrator drives one run through its phases: resolve, schedule,
//! execute, aggregate. Each phase completes before the next begins, so a
//! failure before execution means no transfer call was ever made.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::progress::{NoopSink, ProgressSink, ProgressTracker};
use super::resolver::PathResolver;
use super::retry::RetryPolicy;
use super::scheduler::{BatchScheduler, DEFAULT_BATCH_SIZE};
use super::worker::{effective_workers, CancelFlag, WorkerPool};
use crate::error::{HaulError, Result};
use crate::stats::TransferReport;
use crate::store::ObjectStore;

/// The bulk operation a run performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Upload,
    Download,
    Delete,
    List,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Upload => write!(f, "upload"),
            Operation::Download => write!(f, "download"),
            Operation::Delete => write!(f, "deletion"),
            Operation::List => write!(f, "listing"),
        }
    }
}

/// Lifecycle of a run; `Failed` is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    Idle,
    Resolving,
    Scheduling,
    Running,
    Aggregating,
    Done,
    Failed,
}

/// Everything a single run needs to know
#[derive(Debug, Clone)]
pub struct JobSpec {
    pub operation: Operation,
    /// Local side of the transfer; unused for delete and list
    pub local_path: Option<PathBuf>,
    /// Key prefix on the store side
    pub prefix: String,
    pub recursive: bool,
    /// Glob applied to file names, e.g. `*.png`
    pub filter: Option<String>,
    /// Enumerate and report without making a single transfer call
    pub dry_run: bool,
    /// Replace local files that already exist on download
    pub overwrite: bool,
    /// Requested worker count; clamped to host and pool limits
    pub workers: Option<usize>,
    pub batch_size: usize,
}

impl JobSpec {
    pub fn new(operation: Operation, prefix: impl Into<String>) -> Self {
        Self {
            operation,
            local_path: None,
            prefix: prefix.into(),
            recursive: true,
            filter: None,
            dry_run: false,
            overwrite: false,
            workers: None,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Drives one run end to end
pub struct TransferOrchestrator {
    store: Arc<dyn ObjectStore>,
    spec: JobSpec,
    retry: RetryPolicy,
    pool_capacity: usize,
    sink: Arc<dyn ProgressSink>,
    cancel: CancelFlag,
    state: OrchestratorState,
}

impl TransferOrchestrator {
    pub fn new(store: Arc<dyn ObjectStore>, spec: JobSpec, pool_capacity: usize) -> Self {
        Self {
            store,
            spec,
            retry: RetryPolicy::default(),
            pool_capacity,
            sink: Arc::new(NoopSink),
            cancel: CancelFlag::new(),
            state: OrchestratorState::Idle,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Handle for requesting cancellation from another task
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    /// Run the job to completion
    ///
    /// Consumes the phases in order; any error leaves the orchestrator in
    /// `Failed`, and a new run needs a new orchestrator.
    pub async fn run(&mut self) -> Result<TransferReport> {
        match self.run_inner().await {
            Ok(report) => {
                self.state = OrchestratorState::Done;
                Ok(report)
            }
            Err(e) => {
                self.state = OrchestratorState::Failed;
                Err(e)
            }
        }
    }

    async fn run_inner(&mut self) -> Result<TransferReport> {
        if self.pool_capacity == 0 {
            return Err(HaulError::PoolExhaustion(
                "connection pool has no capacity".to_string(),
            ));
        }

        let started = Instant::now();
        let resolver = PathResolver::new(self.spec.filter.as_deref())?;

        self.state = OrchestratorState::Resolving;
        debug!(operation = %self.spec.operation, prefix = %self.spec.prefix, "resolving");

        if self.spec.operation == Operation::List {
            let listing = resolver
                .list_remote(self.store.as_ref(), &self.spec.prefix, self.spec.recursive)
                .await?;
            self.sink.on_resolved(listing.len() as u64);
            self.state = OrchestratorState::Aggregating;
            return Ok(TransferReport::from_listing(listing, started.elapsed()));
        }

        let entries = match self.spec.operation {
            Operation::Upload => {
                let source = self.local_path()?;
                resolver.resolve_upload(&source, &self.spec.prefix, self.spec.recursive)?
            }
            Operation::Download => {
                let destination = self.local_path()?;
                resolver
                    .resolve_download(
                        self.store.as_ref(),
                        &self.spec.prefix,
                        &destination,
                        self.spec.recursive,
                    )
                    .await?
            }
            Operation::Delete => {
                resolver
                    .resolve_delete(self.store.as_ref(), &self.spec.prefix, self.spec.recursive)
                    .await?
            }
            Operation::List => unreachable!("handled above"),
        };

        let total = entries.len();
        self.sink.on_resolved(total as u64);
        info!(operation = %self.spec.operation, entries = total, "resolution complete");

        self.state = OrchestratorState::Scheduling;
        let scheduler = BatchScheduler::new(self.spec.batch_size);
        let batches = scheduler.schedule(entries);

        let workers = effective_workers(self.spec.workers, total, self.pool_capacity);
        debug!(
            batches = batches.len(),
            workers,
            dry_run = self.spec.dry_run,
            "scheduled"
        );

        self.state = OrchestratorState::Running;
        let tracker = Arc::new(ProgressTracker::new(total as u64));
        let pool = WorkerPool::new(
            Arc::clone(&self.store),
            self.retry.clone(),
            workers,
            self.spec.dry_run,
            self.spec.overwrite,
            Arc::clone(&tracker),
            Arc::clone(&self.sink),
            self.cancel.clone(),
        );

        let mut results = Vec::with_capacity(total);
        for batch in batches {
            if self.cancel.is_cancelled() {
                // Unsubmitted entries still get a result each
                results.extend(pool.mark_not_attempted(batch.entries));
                continue;
            }

            let batch_results = match self.spec.operation {
                Operation::Delete => pool.run_delete_batch(batch).await,
                _ => pool.run_batch(batch).await,
            };
            results.extend(batch_results);
        }

        self.state = OrchestratorState::Aggregating;
        if results.len() != total {
            warn!(
                expected = total,
                got = results.len(),
                "result count does not match entry count"
            );
        }

        let report = TransferReport::from_results(
            self.spec.operation,
            total,
            results,
            started.elapsed(),
        );

        info!(
            operation = %self.spec.operation,
            succeeded = report.succeeded,
            failed = report.failed,
            skipped = report.skipped,
            cancelled = report.cancelled,
            "run complete"
        );

        Ok(report)
    }

    fn local_path(&self) -> Result<PathBuf> {
        self.spec.local_path.clone().ok_or_else(|| {
            HaulError::Config(format!(
                "{} requires a local path",
                self.spec.operation
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_display() {
        assert_eq!(Operation::Upload.to_string(), "upload");
        assert_eq!(Operation::Delete.to_string(), "deletion");
    }

    #[test]
    fn test_job_spec_defaults() {
        let spec = JobSpec::new(Operation::Upload, "data");
        assert_eq!(spec.batch_size, DEFAULT_BATCH_SIZE);
        assert!(spec.recursive);
        assert!(!spec.dry_run);
        assert!(!spec.overwrite);
    }
}
