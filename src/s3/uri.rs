//! Parsing of `s3://bucket/prefix` locations

use std::fmt;

/// A parsed S3 location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Uri {
    /// Bucket name
    pub bucket: String,

    /// Key prefix, without a trailing slash (may be empty)
    pub prefix: String,
}

impl S3Uri {
    /// Check whether a string looks like an S3 URI
    pub fn is_s3_uri(s: &str) -> bool {
        s.starts_with("s3://")
    }

    /// Parse an `s3://bucket/prefix` string
    ///
    /// Returns `None` for anything that does not start with `s3://` or has
    /// an empty bucket. A trailing slash on the prefix is trimmed so that
    /// key joining stays uniform.
    pub fn parse(s: &str) -> Option<Self> {
        let rest = s.strip_prefix("s3://")?;

        let (bucket, prefix) = match rest.split_once('/') {
            Some((bucket, prefix)) => (bucket, prefix.trim_end_matches('/')),
            None => (rest, ""),
        };

        if bucket.is_empty() {
            return None;
        }

        Some(Self {
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
        })
    }
}

impl fmt::Display for S3Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prefix.is_empty() {
            write!(f, "s3://{}", self.bucket)
        } else {
            write!(f, "s3://{}/{}", self.bucket, self.prefix)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bucket_and_prefix() {
        let uri = S3Uri::parse("s3://my-bucket/data/2024").unwrap();
        assert_eq!(uri.bucket, "my-bucket");
        assert_eq!(uri.prefix, "data/2024");
    }

    #[test]
    fn test_parse_bucket_only() {
        let uri = S3Uri::parse("s3://my-bucket").unwrap();
        assert_eq!(uri.bucket, "my-bucket");
        assert_eq!(uri.prefix, "");

        let uri = S3Uri::parse("s3://my-bucket/").unwrap();
        assert_eq!(uri.prefix, "");
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let uri = S3Uri::parse("s3://my-bucket/data/").unwrap();
        assert_eq!(uri.prefix, "data");
    }

    #[test]
    fn test_rejects_non_s3() {
        assert!(S3Uri::parse("/local/path").is_none());
        assert!(S3Uri::parse("http://example.com").is_none());
        assert!(S3Uri::parse("s3://").is_none());
    }

    #[test]
    fn test_display_round_trip() {
        let uri = S3Uri::parse("s3://my-bucket/data/2024").unwrap();
        assert_eq!(uri.to_string(), "s3://my-bucket/data/2024");

        let uri = S3Uri::parse("s3://my-bucket").unwrap();
        assert_eq!(uri.to_string(), "s3://my-bucket");
    }

    #[test]
    fn test_is_s3_uri() {
        assert!(S3Uri::is_s3_uri("s3://bucket/prefix"));
        assert!(!S3Uri::is_s3_uri("/local/path"));
    }
}
