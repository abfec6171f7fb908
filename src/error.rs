//! Top-level error types

use thiserror::Error;

use crate::s3::S3Error;

/// Result type alias using [`HaulError`]
pub type Result<T> = std::result::Result<T, HaulError>;

/// Errors that abort a run or prevent it from starting
///
/// Per-entry transfer failures are never represented here; they are recorded
/// in each `TransferResult` and surfaced through the final report.
#[derive(Error, Debug)]
pub enum HaulError {
    /// Source path or remote prefix could not be resolved; nothing was
    /// transferred.
    #[error("Resolution failed: {0}")]
    Resolution(String),

    /// The connection pool could not be established at all.
    #[error("Connection pool unavailable: {0}")]
    PoolExhaustion(String),

    /// Invalid configuration or arguments.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Store-level error outside the per-entry path (credential check,
    /// resolution listing).
    #[error("Store error: {0}")]
    Store(#[from] S3Error),

    /// Local I/O error outside the per-entry path.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HaulError {
    /// Fatal errors abort the run; they are never retried.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            HaulError::Resolution(_) | HaulError::PoolExhaustion(_) | HaulError::Config(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(HaulError::Resolution("missing".to_string()).is_fatal());
        assert!(HaulError::PoolExhaustion("no permits".to_string()).is_fatal());
        assert!(HaulError::Config("bad args".to_string()).is_fatal());
        assert!(!HaulError::Store(S3Error::Network("reset".to_string())).is_fatal());
    }

    #[test]
    fn test_display() {
        let err = HaulError::Resolution("source path does not exist: /nope".to_string());
        assert_eq!(
            err.to_string(),
            "Resolution failed: source path does not exist: /nope"
        );
    }
}
