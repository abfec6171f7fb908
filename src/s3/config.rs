//! S3 client configuration

use super::error::{S3Error, S3Result};

/// Default size of the connection pool shared by all workers
pub const DEFAULT_POOL_SIZE: usize = 100;

/// Default connect timeout in seconds
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Default per-operation timeout in seconds
pub const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 60;

/// Configuration for the S3 client
#[derive(Debug, Clone)]
pub struct S3Config {
    /// Bucket name
    pub bucket: String,

    /// AWS region (None = resolve from environment/profile)
    pub region: Option<String>,

    /// Custom endpoint URL (for MinIO, LocalStack, etc.)
    pub endpoint: Option<String>,

    /// Explicit access key (None = default credential chain)
    pub access_key: Option<String>,

    /// Explicit secret key
    pub secret_key: Option<String>,

    /// Optional session token for temporary credentials
    pub session_token: Option<String>,

    /// Force path-style addressing (required for MinIO, LocalStack)
    pub force_path_style: bool,

    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,

    /// Per-operation timeout in seconds
    pub operation_timeout_secs: u64,

    /// Capacity of the shared connection pool
    pub pool_size: usize,
}

impl S3Config {
    /// Create a configuration for the given bucket with defaults
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: None,
            endpoint: None,
            access_key: None,
            secret_key: None,
            session_token: None,
            force_path_style: false,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            operation_timeout_secs: DEFAULT_OPERATION_TIMEOUT_SECS,
            pool_size: DEFAULT_POOL_SIZE,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> S3Result<()> {
        if self.bucket.is_empty() {
            return Err(S3Error::InvalidConfig("bucket name is empty".to_string()));
        }

        if self.bucket.len() < 3 || self.bucket.len() > 63 {
            return Err(S3Error::InvalidConfig(format!(
                "bucket name '{}' must be 3-63 characters",
                self.bucket
            )));
        }

        if self.pool_size == 0 {
            return Err(S3Error::InvalidConfig(
                "connection pool size must be at least 1".to_string(),
            ));
        }

        // Only one of access_key/secret_key being set is a misconfiguration
        if self.access_key.is_some() != self.secret_key.is_some() {
            return Err(S3Error::InvalidConfig(
                "access key and secret key must be provided together".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = S3Config::new("my-bucket");
        assert!(config.validate().is_ok());
        assert_eq!(config.pool_size, DEFAULT_POOL_SIZE);
    }

    #[test]
    fn test_empty_bucket_rejected() {
        let config = S3Config::new("");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_short_bucket_rejected() {
        let config = S3Config::new("ab");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_pool_size_rejected() {
        let mut config = S3Config::new("my-bucket");
        config.pool_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_credentials_rejected() {
        let mut config = S3Config::new("my-bucket");
        config.access_key = Some("AKIA...".to_string());
        assert!(config.validate().is_err());

        config.secret_key = Some("secret".to_string());
        assert!(config.validate().is_ok());
    }
}
