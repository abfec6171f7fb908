//! S3 transport layer
//!
//! The client, its configuration, the shared connection pool, and
//! `s3://bucket/prefix` URI handling.

pub mod client;
pub mod config;
pub mod error;
pub mod pool;
pub mod uri;

pub use client::S3Client;
pub use config::{S3Config, DEFAULT_POOL_SIZE};
pub use error::{S3Error, S3Result};
pub use pool::{ConnectionPermit, ConnectionPool};
pub use uri::S3Uri;
