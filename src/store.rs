//! Object store abstraction
//!
//! `ObjectStore` is the seam between the transfer engine and the remote
//! store. The production implementation is [`crate::s3::S3Client`]; tests
//! drive the engine against an in-memory implementation.

use async_trait::async_trait;
use std::path::Path;
use std::time::SystemTime;

use crate::s3::S3Result;

/// Hard ceiling of the store's bulk-delete API: at most this many keys per
/// network call. This is a protocol limit, not a tuning knob.
pub const BULK_DELETE_MAX_KEYS: usize = 1000;

/// One object returned by a prefix listing
#[derive(Debug, Clone)]
pub struct ObjectSummary {
    /// Full object key
    pub key: String,

    /// Object size in bytes
    pub size: u64,

    /// Last-modified timestamp, if the store reported one
    pub last_modified: Option<SystemTime>,
}

/// Per-key outcome of a bulk-delete call
#[derive(Debug, Clone)]
pub struct DeleteOutcome {
    /// The key this outcome refers to
    pub key: String,

    /// Error code and message for this key, or `None` on success
    pub error: Option<DeleteError>,
}

/// Error reported by the store for a single key within a bulk delete
#[derive(Debug, Clone)]
pub struct DeleteError {
    pub code: String,
    pub message: String,
}

impl DeleteOutcome {
    /// Successful outcome for a key
    pub fn ok(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            error: None,
        }
    }

    /// Failed outcome for a key
    pub fn failed(key: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            error: Some(DeleteError {
                code: code.into(),
                message: message.into(),
            }),
        }
    }
}

/// Interface to a key-addressed object store
///
/// Implementations perform exactly one network call per method invocation
/// (listing may issue one call per page). Retry is owned by the engine's
/// retry layer, not by implementations.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload a local file to `key`. Returns bytes written.
    async fn put_object(&self, local: &Path, key: &str) -> S3Result<u64>;

    /// Download `key` to a local file, creating parent directories.
    /// Returns bytes written.
    async fn get_object(&self, key: &str, local: &Path) -> S3Result<u64>;

    /// Delete up to [`BULK_DELETE_MAX_KEYS`] keys in one call, returning one
    /// outcome per requested key. Implementations must reject larger inputs.
    async fn delete_objects(&self, keys: &[String]) -> S3Result<Vec<DeleteOutcome>>;

    /// List all objects under `prefix`. Non-recursive listings stop at the
    /// first key delimiter level.
    async fn list_objects(&self, prefix: &str, recursive: bool) -> S3Result<Vec<ObjectSummary>>;

    /// Cheap connectivity and credential check.
    async fn verify_connection(&self) -> S3Result<()>;
}
