//! Environment-backed defaults for CLI arguments
//!
//! Flags always win; the environment only fills in what the command line
//! left out. `.env` files are loaded by the binary before these are read.

use std::path::PathBuf;

/// Default local data directory when no source argument is given
pub const ENV_DATA_DIR: &str = "SKYHAUL_DATA_DIR";

/// Default `s3://bucket/prefix` destination when none is given
pub const ENV_UPLOAD_URL: &str = "SKYHAUL_UPLOAD_URL";

/// Source directory fallback from the environment
pub fn default_source_dir() -> Option<PathBuf> {
    lookup_source_dir(|k| std::env::var(k).ok())
}

/// Upload destination fallback from the environment
pub fn default_upload_uri() -> Option<String> {
    lookup_upload_uri(|k| std::env::var(k).ok())
}

fn lookup_source_dir(get: impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
    get(ENV_DATA_DIR)
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

fn lookup_upload_uri(get: impl Fn(&str) -> Option<String>) -> Option<String> {
    get(ENV_UPLOAD_URL).filter(|v| !v.trim().is_empty())
}
