/*!
 * Skyhaul - concurrent bulk transfer for object storage
 *
 * A batched S3 transfer engine with:
 * - Parallel uploads, downloads, and bulk deletions
 * - Up-front path resolution and fixed-size batch scheduling
 * - Per-entry retry with exponential backoff and jitter
 * - Bounded connection pooling
 * - Cooperative cancellation with full per-entry accounting
 */

pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod s3;
pub mod stats;
pub mod store;

// Re-export commonly used types
pub use crate::core::{
    CancelFlag, JobSpec, Operation, OrchestratorState, ProgressSink, ProgressSnapshot,
    RetryPolicy, TransferEntry, TransferKind, TransferOrchestrator, TransferOutcome,
    TransferResult,
};
pub use error::{HaulError, Result};
pub use s3::{ConnectionPool, S3Client, S3Config, S3Error, S3Uri};
pub use stats::TransferReport;
pub use store::{ObjectStore, ObjectSummary, BULK_DELETE_MAX_KEYS};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
