//! Thread-safe progress accounting
//!
//! Two phases are tracked independently: submission (entries handed to the
//! pool) and completion (results returned), so a caller can render
//! "X of N submitted, Y of N complete". Counters are atomics; snapshots
//! never block writers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use super::entry::{TransferOutcome, TransferResult};

/// Point-in-time view of the counters
#[derive(Debug, Clone, Copy)]
pub struct ProgressSnapshot {
    /// Total entries resolved for this run
    pub total: u64,
    /// Entries handed to the worker pool
    pub submitted: u64,
    /// Entries with a result, regardless of outcome
    pub completed: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub skipped: u64,
    pub cancelled: u64,
    /// Bytes moved so far
    pub bytes_transferred: u64,
    pub elapsed: Duration,
}

impl ProgressSnapshot {
    pub fn is_complete(&self) -> bool {
        self.completed == self.total
    }
}

/// Accumulates results from all workers; counters only ever grow
pub struct ProgressTracker {
    total: u64,
    submitted: AtomicU64,
    completed: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    skipped: AtomicU64,
    cancelled: AtomicU64,
    bytes: AtomicU64,
    started: Instant,
}

impl ProgressTracker {
    /// Create a tracker for a run of `total` entries
    pub fn new(total: u64) -> Self {
        Self {
            total,
            submitted: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            succeeded: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            cancelled: AtomicU64::new(0),
            bytes: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    /// Record `count` entries handed to the pool
    pub fn record_submitted(&self, count: u64) {
        self.submitted.fetch_add(count, Ordering::Relaxed);
    }

    /// Record one finished entry
    pub fn record_result(&self, result: &TransferResult) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        self.bytes
            .fetch_add(result.bytes_transferred, Ordering::Relaxed);

        match &result.outcome {
            TransferOutcome::Succeeded | TransferOutcome::Retried(_) => {
                self.succeeded.fetch_add(1, Ordering::Relaxed);
            }
            TransferOutcome::Skipped => {
                self.skipped.fetch_add(1, Ordering::Relaxed);
            }
            TransferOutcome::Failed(_) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
            TransferOutcome::Cancelled => {
                self.cancelled.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Non-blocking snapshot of all counters
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            total: self.total,
            submitted: self.submitted.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            bytes_transferred: self.bytes.load(Ordering::Relaxed),
            elapsed: self.started.elapsed(),
        }
    }

    pub fn total(&self) -> u64 {
        self.total
    }
}

/// Sink for numeric progress events
///
/// The engine reports counts; rendering (progress bars, log lines) is the
/// sink's business. All methods have no-op defaults.
pub trait ProgressSink: Send + Sync {
    /// Resolution finished; `total` entries will be processed
    fn on_resolved(&self, _total: u64) {}

    /// A batch of entries was handed to the pool
    fn on_submitted(&self, _snapshot: &ProgressSnapshot) {}

    /// One entry completed
    fn on_completed(&self, _snapshot: &ProgressSnapshot) {}
}

/// Sink that ignores every event
pub struct NoopSink;

impl ProgressSink for NoopSink {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entry::TransferEntry;

    fn result(outcome: TransferOutcome, bytes: u64) -> TransferResult {
        TransferResult {
            entry: TransferEntry::delete("k".into(), None),
            outcome,
            bytes_transferred: bytes,
            elapsed: Duration::ZERO,
        }
    }

    #[test]
    fn test_phases_tracked_independently() {
        let tracker = ProgressTracker::new(4);
        tracker.record_submitted(4);

        let snap = tracker.snapshot();
        assert_eq!(snap.submitted, 4);
        assert_eq!(snap.completed, 0);
        assert!(!snap.is_complete());

        tracker.record_result(&result(TransferOutcome::Succeeded, 10));
        tracker.record_result(&result(TransferOutcome::Retried(1), 20));
        tracker.record_result(&result(TransferOutcome::Failed("x".into()), 0));
        tracker.record_result(&result(TransferOutcome::Skipped, 0));

        let snap = tracker.snapshot();
        assert_eq!(snap.completed, 4);
        assert_eq!(snap.succeeded, 2);
        assert_eq!(snap.failed, 1);
        assert_eq!(snap.skipped, 1);
        assert_eq!(snap.bytes_transferred, 30);
        assert!(snap.is_complete());
    }

    #[test]
    fn test_cancelled_counted() {
        let tracker = ProgressTracker::new(1);
        tracker.record_result(&result(TransferOutcome::Cancelled, 0));

        let snap = tracker.snapshot();
        assert_eq!(snap.cancelled, 1);
        assert_eq!(snap.completed, 1);
    }
}
