//! Error types for S3 operations

use std::io;
use thiserror::Error;

/// Result type alias for S3 operations
pub type S3Result<T> = Result<T, S3Error>;

/// Errors that can occur while talking to the object store
#[derive(Error, Debug, Clone)]
pub enum S3Error {
    /// AWS SDK error
    #[error("AWS SDK error: {0}")]
    Sdk(String),

    /// S3 service error with specific error code
    #[error("S3 service error ({code}): {message}")]
    Service { code: String, message: String },

    /// Object not found in bucket
    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// Bucket not found or not accessible
    #[error("Bucket not found or not accessible: {0}")]
    BucketNotFound(String),

    /// Access denied error
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid object key
    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    /// Request rejected before it was sent (e.g. too many keys in one call)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// I/O error while reading or writing local files
    #[error("I/O error: {0}")]
    Io(String),

    /// Local file missing or unreadable; retrying cannot help
    #[error("Local file error: {0}")]
    LocalFile(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// Timeout error
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Request throttled by the service
    #[error("Throttled by service: {0}")]
    Throttled(String),
}

impl S3Error {
    /// Check if the error is transient and safe to retry
    pub fn is_retryable(&self) -> bool {
        match self {
            S3Error::Network(_) => true,
            S3Error::Timeout(_) => true,
            S3Error::Throttled(_) => true,
            S3Error::Io(_) => true,
            // SDK errors: check for network-related strings
            S3Error::Sdk(msg) => {
                let lower = msg.to_lowercase();
                lower.contains("connection reset")
                    || lower.contains("connection timed out")
                    || lower.contains("broken pipe")
                    || lower.contains("connection refused")
                    || lower.contains("temporarily unavailable")
            }
            S3Error::Service { code, .. } => is_retryable_code(code),
            _ => false,
        }
    }
}

impl From<io::Error> for S3Error {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            // A missing or forbidden local file stays that way across
            // attempts; burning retries on it only delays the failure
            io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
                S3Error::LocalFile(err.to_string())
            }
            _ => S3Error::Io(err.to_string()),
        }
    }
}

/// Check if an AWS error code is retryable
pub(crate) fn is_retryable_code(code: &str) -> bool {
    matches!(
        code,
        "RequestTimeout"
            | "ServiceUnavailable"
            | "InternalError"
            | "SlowDown"
            | "Throttling"
            | "ThrottlingException"
            | "RequestTimeTooSkewed"
    )
}

/// Convert AWS SDK errors to S3Error
impl<E> From<aws_sdk_s3::error::SdkError<E>> for S3Error
where
    E: std::error::Error + 'static,
{
    fn from(error: aws_sdk_s3::error::SdkError<E>) -> Self {
        match error {
            aws_sdk_s3::error::SdkError::TimeoutError(e) => {
                S3Error::Timeout(format!("{:?}", e))
            }
            aws_sdk_s3::error::SdkError::DispatchFailure(e) => {
                S3Error::Network(format!("Network dispatch failure: {:?}", e))
            }
            aws_sdk_s3::error::SdkError::ResponseError(e) => {
                S3Error::Network(format!("Response error: {:?}", e))
            }
            aws_sdk_s3::error::SdkError::ServiceError(e) => {
                let err_str = format!("{:?}", e);

                if err_str.contains("NoSuchKey") {
                    S3Error::Service {
                        code: "NoSuchKey".to_string(),
                        message: "The specified key does not exist".to_string(),
                    }
                } else if err_str.contains("NoSuchBucket") {
                    S3Error::Service {
                        code: "NoSuchBucket".to_string(),
                        message: "The specified bucket does not exist".to_string(),
                    }
                } else if err_str.contains("AccessDenied") {
                    S3Error::AccessDenied("Access denied to resource".to_string())
                } else if err_str.contains("SlowDown") || err_str.contains("Throttling") {
                    S3Error::Throttled(err_str)
                } else {
                    S3Error::Service {
                        code: "Unknown".to_string(),
                        message: err_str,
                    }
                }
            }
            _ => S3Error::Sdk(format!("{:?}", error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(S3Error::Network("connection lost".to_string()).is_retryable());
        assert!(S3Error::Timeout("timed out".to_string()).is_retryable());
        assert!(S3Error::Throttled("too many requests".to_string()).is_retryable());
        assert!(S3Error::Io("read failed".to_string()).is_retryable());
        assert!(!S3Error::InvalidKey("bad key".to_string()).is_retryable());
        assert!(!S3Error::AccessDenied("no perms".to_string()).is_retryable());
    }

    #[test]
    fn test_sdk_network_errors_retryable() {
        assert!(S3Error::Sdk("connection reset by peer".to_string()).is_retryable());
        assert!(S3Error::Sdk("Connection timed out".to_string()).is_retryable());
        assert!(S3Error::Sdk("broken pipe".to_string()).is_retryable());
        assert!(!S3Error::Sdk("invalid argument".to_string()).is_retryable());
    }

    #[test]
    fn test_retryable_codes() {
        assert!(is_retryable_code("RequestTimeout"));
        assert!(is_retryable_code("ServiceUnavailable"));
        assert!(is_retryable_code("SlowDown"));
        assert!(is_retryable_code("Throttling"));
        assert!(!is_retryable_code("NoSuchKey"));
        assert!(!is_retryable_code("AccessDenied"));
    }

    #[test]
    fn test_service_error_retryable() {
        let err = S3Error::Service {
            code: "SlowDown".to_string(),
            message: "slow".to_string(),
        };
        assert!(err.is_retryable());

        let err = S3Error::Service {
            code: "NoSuchKey".to_string(),
            message: "not found".to_string(),
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe");
        let s3_err: S3Error = io_err.into();
        assert!(matches!(s3_err, S3Error::Io(_)));
    }

    #[test]
    fn test_local_file_errors_not_retryable() {
        let err: S3Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, S3Error::LocalFile(_)));
        assert!(!err.is_retryable());

        let err: S3Error =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope").into();
        assert!(!err.is_retryable());

        // Other I/O kinds may be transient and stay retryable
        let err: S3Error =
            std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset").into();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_error_display_formats() {
        let err = S3Error::NotFound {
            bucket: "my-bucket".to_string(),
            key: "my-key".to_string(),
        };
        assert_eq!(format!("{}", err), "Object not found: my-bucket/my-key");

        let err = S3Error::Throttled("rate limited".to_string());
        assert_eq!(format!("{}", err), "Throttled by service: rate limited");

        let err = S3Error::Service {
            code: "SlowDown".to_string(),
            message: "rate limited".to_string(),
        };
        assert_eq!(
            format!("{}", err),
            "S3 service error (SlowDown): rate limited"
        );
    }
}
