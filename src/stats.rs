//! Run reporting: aggregate per-entry results into one summary

use std::time::Duration;

use crate::core::entry::{TransferEntry, TransferOutcome, TransferResult};
use crate::core::orchestrator::Operation;
use crate::store::ObjectSummary;

/// Final accounting for one run
///
/// Holds one line item per failed or cancelled entry so the summary can
/// name them; the success path is counts only.
#[derive(Debug)]
pub struct TransferReport {
    pub operation: Operation,
    /// Entries the resolver produced
    pub total_entries: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub cancelled: usize,
    /// Successful entries that needed more than one attempt
    pub retried: usize,
    pub total_bytes: u64,
    pub duration: Duration,
    pub failed_entries: Vec<(TransferEntry, String)>,
    pub cancelled_entries: Vec<TransferEntry>,
    /// Populated only by the listing operation
    pub listing: Vec<ObjectSummary>,
}

impl TransferReport {
    /// Fold per-entry results into a report
    pub fn from_results(
        operation: Operation,
        total_entries: usize,
        results: Vec<TransferResult>,
        duration: Duration,
    ) -> Self {
        let mut report = Self::empty(operation, total_entries, duration);

        for result in results {
            report.total_bytes += result.bytes_transferred;
            match result.outcome {
                TransferOutcome::Succeeded => report.succeeded += 1,
                TransferOutcome::Retried(_) => {
                    report.succeeded += 1;
                    report.retried += 1;
                }
                TransferOutcome::Skipped => report.skipped += 1,
                TransferOutcome::Failed(reason) => {
                    report.failed += 1;
                    report.failed_entries.push((result.entry, reason));
                }
                TransferOutcome::Cancelled => {
                    report.cancelled += 1;
                    report.cancelled_entries.push(result.entry);
                }
            }
        }

        report
    }

    /// Report for a listing run; nothing was transferred
    pub fn from_listing(listing: Vec<ObjectSummary>, duration: Duration) -> Self {
        let total_bytes = listing.iter().map(|o| o.size).sum();
        let mut report = Self::empty(Operation::List, listing.len(), duration);
        report.succeeded = listing.len();
        report.total_bytes = total_bytes;
        report.listing = listing;
        report
    }

    fn empty(operation: Operation, total_entries: usize, duration: Duration) -> Self {
        Self {
            operation,
            total_entries,
            succeeded: 0,
            failed: 0,
            skipped: 0,
            cancelled: 0,
            retried: 0,
            total_bytes: 0,
            duration,
            failed_entries: Vec::new(),
            cancelled_entries: Vec::new(),
            listing: Vec::new(),
        }
    }

    /// Entries with a recorded outcome; must equal `total_entries` at the
    /// end of a run
    pub fn accounted(&self) -> usize {
        self.succeeded + self.failed + self.skipped + self.cancelled
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0 && self.cancelled == 0
    }

    pub fn bytes_per_sec(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.total_bytes as f64 / secs
        } else {
            0.0
        }
    }

    pub fn files_per_sec(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.accounted() as f64 / secs
        } else {
            0.0
        }
    }
}

/// Render a byte count as a human-readable size
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    let mut size = bytes as f64;
    let mut unit = 0;

    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", bytes, UNITS[unit])
    } else {
        format!("{:.2} {}", size, UNITS[unit])
    }
}

/// Render a duration as `1m 23.4s` / `12.3s`
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs_f64();
    if total >= 60.0 {
        let minutes = (total / 60.0).floor() as u64;
        format!("{}m {:.1}s", minutes, total - minutes as f64 * 60.0)
    } else {
        format!("{:.1}s", total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(outcome: TransferOutcome, bytes: u64) -> TransferResult {
        TransferResult {
            entry: TransferEntry::delete("k".into(), None),
            outcome,
            bytes_transferred: bytes,
            elapsed: Duration::ZERO,
        }
    }

    #[test]
    fn test_report_buckets_outcomes() {
        let results = vec![
            result(TransferOutcome::Succeeded, 100),
            result(TransferOutcome::Retried(2), 50),
            result(TransferOutcome::Skipped, 0),
            result(TransferOutcome::Failed("boom".into()), 0),
            result(TransferOutcome::Cancelled, 0),
        ];

        let report =
            TransferReport::from_results(Operation::Upload, 5, results, Duration::from_secs(2));

        assert_eq!(report.accounted(), 5);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.retried, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.cancelled, 1);
        assert_eq!(report.total_bytes, 150);
        assert_eq!(report.failed_entries.len(), 1);
        assert_eq!(report.failed_entries[0].1, "boom");
        assert_eq!(report.cancelled_entries.len(), 1);
        assert!(!report.all_succeeded());
    }

    #[test]
    fn test_listing_report() {
        let listing = vec![
            ObjectSummary {
                key: "a".into(),
                size: 10,
                last_modified: None,
            },
            ObjectSummary {
                key: "b".into(),
                size: 20,
                last_modified: None,
            },
        ];

        let report = TransferReport::from_listing(listing, Duration::from_secs(1));
        assert_eq!(report.total_entries, 2);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.total_bytes, 30);
        assert!(report.all_succeeded());
    }

    #[test]
    fn test_throughput_math() {
        let report = TransferReport::from_results(
            Operation::Download,
            1,
            vec![result(TransferOutcome::Succeeded, 2048)],
            Duration::from_secs(2),
        );
        assert!((report.bytes_per_sec() - 1024.0).abs() < f64::EPSILON);
        assert!((report.files_per_sec() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.00 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.00 GB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs_f64(12.34)), "12.3s");
        assert_eq!(format_duration(Duration::from_secs(83)), "1m 23.0s");
    }
}
