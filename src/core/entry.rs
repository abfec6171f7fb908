//! Transfer entries and per-entry results

use std::fmt;
use std::path::Path;
use std::time::Duration;

/// The kind of a single transfer unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    /// Local file to remote key
    Upload,
    /// Remote key to local file
    Download,
    /// Remote key removal (no destination)
    Delete,
}

impl fmt::Display for TransferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferKind::Upload => write!(f, "upload"),
            TransferKind::Download => write!(f, "download"),
            TransferKind::Delete => write!(f, "delete"),
        }
    }
}

/// One logical file-level transfer unit, fully resolved before scheduling
///
/// Immutable once created: the resolver computes both sides of the mapping
/// up front and workers only ever read it.
#[derive(Debug, Clone)]
pub struct TransferEntry {
    /// Local path (upload) or object key (download, delete)
    pub source_key: String,

    /// Object key (upload) or local path (download); absent for deletes
    pub destination_key: Option<String>,

    /// Size in bytes when known at resolution time
    pub size_bytes: Option<u64>,

    /// What to do with this entry
    pub kind: TransferKind,
}

impl TransferEntry {
    /// Entry for uploading a local file to `key`
    pub fn upload(local: &Path, key: String, size_bytes: Option<u64>) -> Self {
        Self {
            source_key: local.display().to_string(),
            destination_key: Some(key),
            size_bytes,
            kind: TransferKind::Upload,
        }
    }

    /// Entry for downloading `key` to a local path
    pub fn download(key: String, local: &Path, size_bytes: Option<u64>) -> Self {
        Self {
            source_key: key,
            destination_key: Some(local.display().to_string()),
            size_bytes,
            kind: TransferKind::Download,
        }
    }

    /// Entry for deleting `key`
    pub fn delete(key: String, size_bytes: Option<u64>) -> Self {
        Self {
            source_key: key,
            destination_key: None,
            size_bytes,
            kind: TransferKind::Delete,
        }
    }
}

/// Outcome of one entry after the worker is done with it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// Completed on the first attempt
    Succeeded,
    /// Completed after `n` retries
    Retried(u32),
    /// Nothing to do (e.g. download target exists and overwrite is off)
    Skipped,
    /// All attempts exhausted or a non-retryable error occurred
    Failed(String),
    /// Never dispatched because the run was cancelled
    Cancelled,
}

impl TransferOutcome {
    /// True for `Succeeded`, `Retried` and `Skipped`
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            TransferOutcome::Succeeded | TransferOutcome::Retried(_) | TransferOutcome::Skipped
        )
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, TransferOutcome::Failed(_))
    }
}

/// Result of processing one entry; exactly one exists per resolved entry
#[derive(Debug, Clone)]
pub struct TransferResult {
    pub entry: TransferEntry,
    pub outcome: TransferOutcome,
    pub bytes_transferred: u64,
    pub elapsed: Duration,
}

impl TransferResult {
    /// Result for an entry that was never dispatched
    pub fn cancelled(entry: TransferEntry) -> Self {
        Self {
            entry,
            outcome: TransferOutcome::Cancelled,
            bytes_transferred: 0,
            elapsed: Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_entry_constructors() {
        let entry = TransferEntry::upload(&PathBuf::from("/data/a.png"), "pre/a.png".into(), Some(42));
        assert_eq!(entry.kind, TransferKind::Upload);
        assert_eq!(entry.destination_key.as_deref(), Some("pre/a.png"));
        assert_eq!(entry.size_bytes, Some(42));

        let entry = TransferEntry::delete("pre/a.png".into(), None);
        assert_eq!(entry.kind, TransferKind::Delete);
        assert!(entry.destination_key.is_none());
    }

    #[test]
    fn test_outcome_classification() {
        assert!(TransferOutcome::Succeeded.is_success());
        assert!(TransferOutcome::Retried(2).is_success());
        assert!(TransferOutcome::Skipped.is_success());
        assert!(!TransferOutcome::Cancelled.is_success());
        assert!(TransferOutcome::Failed("boom".into()).is_failure());
        assert!(!TransferOutcome::Failed("boom".into()).is_success());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(TransferKind::Upload.to_string(), "upload");
        assert_eq!(TransferKind::Delete.to_string(), "delete");
    }
}
