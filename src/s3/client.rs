//! S3 client implementation

use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::Client as AwsS3Client;
use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::debug;

use super::config::S3Config;
use super::error::{S3Error, S3Result};
use super::pool::ConnectionPool;
use crate::store::{
    DeleteOutcome, ObjectStore, ObjectSummary, BULK_DELETE_MAX_KEYS,
};

/// S3 client for AWS S3 and S3-compatible storage
///
/// Wraps the AWS SDK client together with the shared [`ConnectionPool`].
/// Every operation holds one pool permit for its duration. SDK-level
/// automatic retry is disabled; the engine's retry layer is the single
/// authority on retries so attempt counts stay observable.
#[derive(Clone)]
pub struct S3Client {
    client: AwsS3Client,
    config: S3Config,
    pool: ConnectionPool,
}

impl S3Client {
    /// Create a new S3 client with the given configuration
    pub async fn new(config: S3Config) -> S3Result<Self> {
        config.validate()?;

        let client = Self::build_aws_client(&config).await?;
        let pool = ConnectionPool::new(config.pool_size);

        Ok(Self {
            client,
            config,
            pool,
        })
    }

    /// Build the AWS SDK S3 client from configuration
    async fn build_aws_client(config: &S3Config) -> S3Result<AwsS3Client> {
        let mut aws_config_loader = aws_config::defaults(BehaviorVersion::latest());

        let region_provider = if let Some(region_str) = &config.region {
            RegionProviderChain::first_try(Region::new(region_str.clone()))
        } else {
            RegionProviderChain::default_provider()
        };
        aws_config_loader = aws_config_loader.region(region_provider);

        if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
            let credentials = Credentials::new(
                access_key,
                secret_key,
                config.session_token.clone(),
                None,
                "skyhaul-explicit",
            );
            aws_config_loader = aws_config_loader.credentials_provider(credentials);
        }

        let aws_config = aws_config_loader.load().await;

        let mut s3_config_builder = aws_sdk_s3::config::Builder::from(&aws_config);

        if let Some(endpoint) = &config.endpoint {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint);
        }

        if config.force_path_style {
            s3_config_builder = s3_config_builder.force_path_style(true);
        }

        let timeout_config = aws_sdk_s3::config::timeout::TimeoutConfig::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .operation_timeout(Duration::from_secs(config.operation_timeout_secs))
            .build();
        s3_config_builder = s3_config_builder.timeout_config(timeout_config);

        // Retry lives in the engine, not in the SDK
        s3_config_builder =
            s3_config_builder.retry_config(aws_sdk_s3::config::retry::RetryConfig::disabled());

        Ok(AwsS3Client::from_conf(s3_config_builder.build()))
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &S3Config {
        &self.config
    }

    /// Get the bucket name
    pub fn bucket(&self) -> &str {
        &self.config.bucket
    }

    /// The shared connection pool
    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn put_object(&self, local: &Path, key: &str) -> S3Result<u64> {
        let _permit = self.pool.acquire().await?;

        let size = tokio::fs::metadata(local).await.map_err(S3Error::from)?.len();

        let body = aws_sdk_s3::primitives::ByteStream::from_path(local)
            .await
            .map_err(|e| S3Error::LocalFile(format!("cannot read {}: {}", local.display(), e)))?;

        debug!(key, size, "put object");

        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(S3Error::from)?;

        Ok(size)
    }

    async fn get_object(&self, key: &str, local: &Path) -> S3Result<u64> {
        let _permit = self.pool.acquire().await?;

        let output = self
            .client
            .get_object()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.to_string().contains("NoSuchKey") || e.to_string().contains("404") {
                    S3Error::NotFound {
                        bucket: self.config.bucket.clone(),
                        key: key.to_string(),
                    }
                } else {
                    S3Error::from(e)
                }
            })?;

        if let Some(parent) = local.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(S3Error::from)?;
        }

        debug!(key, dest = %local.display(), "get object");

        let mut reader = output.body.into_async_read();
        let mut file = tokio::fs::File::create(local)
            .await
            .map_err(S3Error::from)?;
        let bytes = tokio::io::copy(&mut reader, &mut file)
            .await
            .map_err(S3Error::from)?;

        Ok(bytes)
    }

    async fn delete_objects(&self, keys: &[String]) -> S3Result<Vec<DeleteOutcome>> {
        if keys.len() > BULK_DELETE_MAX_KEYS {
            return Err(S3Error::InvalidRequest(format!(
                "bulk delete limited to {} keys per call, got {}",
                BULK_DELETE_MAX_KEYS,
                keys.len()
            )));
        }

        let _permit = self.pool.acquire().await?;

        let identifiers = keys
            .iter()
            .map(|k| {
                aws_sdk_s3::types::ObjectIdentifier::builder()
                    .key(k)
                    .build()
                    .map_err(|_| S3Error::InvalidKey(k.clone()))
            })
            .collect::<S3Result<Vec<_>>>()?;

        let delete = aws_sdk_s3::types::Delete::builder()
            .set_objects(Some(identifiers))
            .build()
            .map_err(|e| S3Error::InvalidRequest(e.to_string()))?;

        debug!(count = keys.len(), "bulk delete");

        let output = self
            .client
            .delete_objects()
            .bucket(&self.config.bucket)
            .delete(delete)
            .send()
            .await
            .map_err(S3Error::from)?;

        // Index per-key errors, then emit exactly one outcome per requested
        // key so the caller never has to reconcile counts.
        let mut failed: HashMap<String, DeleteOutcome> = HashMap::new();
        for error in output.errors() {
            if let Some(key) = error.key() {
                failed.insert(
                    key.to_string(),
                    DeleteOutcome::failed(
                        key,
                        error.code().unwrap_or("Unknown"),
                        error.message().unwrap_or("unknown error"),
                    ),
                );
            }
        }

        Ok(keys
            .iter()
            .map(|k| match failed.remove(k.as_str()) {
                Some(outcome) => outcome,
                None => DeleteOutcome::ok(k.clone()),
            })
            .collect())
    }

    async fn list_objects(&self, prefix: &str, recursive: bool) -> S3Result<Vec<ObjectSummary>> {
        let prefix = listing_prefix(prefix, recursive);
        let mut objects = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let _permit = self.pool.acquire().await?;

            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.config.bucket)
                .prefix(&prefix);

            if !recursive {
                request = request.delimiter("/");
            }

            if let Some(token) = &continuation {
                request = request.continuation_token(token);
            }

            let response = request.send().await.map_err(S3Error::from)?;

            for object in response.contents() {
                let Some(key) = object.key() else { continue };

                // Zero-byte keys with a trailing slash are directory markers
                if key.ends_with('/') {
                    continue;
                }

                objects.push(ObjectSummary {
                    key: key.to_string(),
                    size: object.size().unwrap_or(0) as u64,
                    last_modified: object
                        .last_modified()
                        .and_then(|dt| SystemTime::try_from(*dt).ok()),
                });
            }

            match next_page_token(
                response.is_truncated().unwrap_or(false),
                response.next_continuation_token(),
            ) {
                Some(token) => continuation = Some(token),
                None => break,
            }
        }

        Ok(objects)
    }

    async fn verify_connection(&self) -> S3Result<()> {
        let _permit = self.pool.acquire().await?;

        self.client
            .head_bucket()
            .bucket(&self.config.bucket)
            .send()
            .await
            .map_err(|e| {
                if e.to_string().contains("404") || e.to_string().contains("NoSuchBucket") {
                    S3Error::BucketNotFound(self.config.bucket.clone())
                } else if e.to_string().contains("403") || e.to_string().contains("AccessDenied") {
                    S3Error::AccessDenied(format!("cannot access bucket: {}", self.config.bucket))
                } else {
                    S3Error::from(e)
                }
            })?;

        Ok(())
    }
}

/// Prefix actually sent on a listing request
///
/// Non-recursive listings use `/` as the delimiter, so a prefix that does
/// not end in `/` would group everything under it into common prefixes and
/// return no contents. Slash-terminate it so the keys directly under the
/// prefix come back as contents.
fn listing_prefix(prefix: &str, recursive: bool) -> String {
    if !recursive && !prefix.is_empty() && !prefix.ends_with('/') {
        format!("{}/", prefix)
    } else {
        prefix.to_string()
    }
}

/// Continuation token for the next listing page, or `None` when the
/// listing is done. A truncated response without a token would otherwise
/// re-fetch page one forever.
fn next_page_token(truncated: bool, token: Option<&str>) -> Option<String> {
    if truncated {
        token.map(str::to_string)
    } else {
        None
    }
}
