//! Path resolution: enumerate sources and pre-compute both sides of every
//! transfer before anything is scheduled
//!
//! Resolution always completes (or fails) before the first worker runs, so
//! the total entry count is known up front for progress sizing and batch
//! counting.

use std::path::{Path, PathBuf};

use glob::Pattern as GlobPattern;
use tracing::warn;
use walkdir::WalkDir;

use super::entry::TransferEntry;
use crate::error::{HaulError, Result};
use crate::store::{ObjectStore, ObjectSummary};

/// Resolves source entries into fully mapped [`TransferEntry`] values
pub struct PathResolver {
    filter: Option<GlobPattern>,
}

impl PathResolver {
    /// Create a resolver with an optional glob filter (e.g. `*.png`)
    ///
    /// The filter matches against the file-name portion of a key or path.
    pub fn new(filter: Option<&str>) -> Result<Self> {
        let filter = match filter {
            Some(pattern) => Some(
                GlobPattern::new(pattern)
                    .map_err(|e| HaulError::Config(format!("invalid filter '{}': {}", pattern, e)))?,
            ),
            None => None,
        };

        Ok(Self { filter })
    }

    fn matches(&self, key: &str) -> bool {
        match &self.filter {
            Some(pattern) => {
                let name = key.rsplit('/').next().unwrap_or(key);
                pattern.matches(name)
            }
            None => true,
        }
    }

    /// Enumerate local files under `source` and map each to its object key
    ///
    /// A single-file source yields one entry keyed by its file name. A
    /// missing source fails fast; permission errors during the walk skip
    /// the entry, log it, and continue.
    pub fn resolve_upload(
        &self,
        source: &Path,
        prefix: &str,
        recursive: bool,
    ) -> Result<Vec<TransferEntry>> {
        if !source.exists() {
            return Err(HaulError::Resolution(format!(
                "source path does not exist: {}",
                source.display()
            )));
        }

        if source.is_file() {
            let name = source
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .ok_or_else(|| {
                    HaulError::Resolution(format!("unusable source path: {}", source.display()))
                })?;

            if !self.matches(&name) {
                return Ok(Vec::new());
            }

            let size = source.metadata().ok().map(|m| m.len());
            return Ok(vec![TransferEntry::upload(
                source,
                object_key(prefix, Path::new(&name)),
                size,
            )]);
        }

        let max_depth = if recursive { usize::MAX } else { 1 };
        let mut entries = Vec::new();

        for item in WalkDir::new(source).max_depth(max_depth) {
            let item = match item {
                Ok(item) => item,
                Err(e) => {
                    // Typically permission denied; the walk continues
                    warn!("skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if !item.file_type().is_file() {
                continue;
            }

            let name = item.file_name().to_string_lossy();
            if !self.matches(&name) {
                continue;
            }

            let relative = match item.path().strip_prefix(source) {
                Ok(rel) => rel,
                Err(_) => continue,
            };

            let size = item.metadata().ok().map(|m| m.len());
            entries.push(TransferEntry::upload(
                item.path(),
                object_key(prefix, relative),
                size,
            ));
        }

        Ok(entries)
    }

    /// List remote objects under `prefix`, applying the filter
    ///
    /// One network call per listing page. A listing failure is a resolution
    /// failure: nothing has been scheduled yet.
    pub async fn list_remote(
        &self,
        store: &dyn ObjectStore,
        prefix: &str,
        recursive: bool,
    ) -> Result<Vec<ObjectSummary>> {
        let objects = store
            .list_objects(prefix, recursive)
            .await
            .map_err(|e| HaulError::Resolution(format!("cannot list '{}': {}", prefix, e)))?;

        Ok(objects
            .into_iter()
            .filter(|o| self.matches(&o.key))
            .collect())
    }

    /// Resolve remote objects under `prefix` into download entries rooted
    /// at `destination`
    pub async fn resolve_download(
        &self,
        store: &dyn ObjectStore,
        prefix: &str,
        destination: &Path,
        recursive: bool,
    ) -> Result<Vec<TransferEntry>> {
        let objects = self.list_remote(store, prefix, recursive).await?;

        Ok(objects
            .into_iter()
            .map(|o| {
                let local = local_destination(destination, &o.key, prefix);
                TransferEntry::download(o.key, &local, Some(o.size))
            })
            .collect())
    }

    /// Resolve remote objects under `prefix` into delete entries
    pub async fn resolve_delete(
        &self,
        store: &dyn ObjectStore,
        prefix: &str,
        recursive: bool,
    ) -> Result<Vec<TransferEntry>> {
        let objects = self.list_remote(store, prefix, recursive).await?;

        Ok(objects
            .into_iter()
            .map(|o| TransferEntry::delete(o.key, Some(o.size)))
            .collect())
    }
}

/// Join a key prefix with a relative path, normalizing every separator to
/// the store's `/` delimiter
pub fn object_key(prefix: &str, relative: &Path) -> String {
    let rel = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");

    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        rel
    } else {
        format!("{}/{}", prefix, rel)
    }
}

/// Map an object key back to a local path under `destination`, stripping
/// the listing prefix
pub fn local_destination(destination: &Path, key: &str, prefix: &str) -> PathBuf {
    let prefix = prefix.trim_matches('/');
    let rel = key
        .strip_prefix(prefix)
        .unwrap_or(key)
        .trim_start_matches('/');

    let mut path = destination.to_path_buf();
    for part in rel.split('/').filter(|p| !p.is_empty()) {
        path.push(part);
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_object_key_joins_with_slash() {
        assert_eq!(object_key("data", Path::new("a/b.png")), "data/a/b.png");
        assert_eq!(object_key("", Path::new("a/b.png")), "a/b.png");
        assert_eq!(object_key("data/", Path::new("b.png")), "data/b.png");
    }

    #[test]
    fn test_local_destination_strips_prefix() {
        let dest = local_destination(Path::new("/out"), "data/a/b.png", "data");
        assert_eq!(dest, PathBuf::from("/out/a/b.png"));

        let dest = local_destination(Path::new("/out"), "data/a.png", "");
        assert_eq!(dest, PathBuf::from("/out/data/a.png"));
    }

    #[test]
    fn test_missing_source_fails_fast() {
        let resolver = PathResolver::new(None).unwrap();
        let err = resolver
            .resolve_upload(Path::new("/definitely/not/here"), "pre", true)
            .unwrap_err();
        assert!(matches!(err, HaulError::Resolution(_)));
    }

    #[test]
    fn test_invalid_filter_rejected() {
        assert!(PathResolver::new(Some("[")).is_err());
    }

    #[test]
    fn test_resolve_upload_recursive() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.png"), b"aa").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/b.png"), b"bbb").unwrap();

        let resolver = PathResolver::new(None).unwrap();
        let mut entries = resolver.resolve_upload(dir.path(), "pre", true).unwrap();
        entries.sort_by(|a, b| a.destination_key.cmp(&b.destination_key));

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].destination_key.as_deref(), Some("pre/a.png"));
        assert_eq!(entries[0].size_bytes, Some(2));
        assert_eq!(entries[1].destination_key.as_deref(), Some("pre/sub/b.png"));
        assert_eq!(entries[1].size_bytes, Some(3));
    }

    #[test]
    fn test_resolve_upload_non_recursive_skips_subdirs() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.png"), b"aa").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/b.png"), b"bbb").unwrap();

        let resolver = PathResolver::new(None).unwrap();
        let entries = resolver.resolve_upload(dir.path(), "pre", false).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].destination_key.as_deref(), Some("pre/a.png"));
    }

    #[test]
    fn test_resolve_upload_single_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("only.dat");
        fs::write(&file, b"data").unwrap();

        let resolver = PathResolver::new(None).unwrap();
        let entries = resolver.resolve_upload(&file, "pre", false).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].destination_key.as_deref(), Some("pre/only.dat"));
    }

    #[test]
    fn test_upload_filter_applies_to_file_name() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("keep.tmp"), b"x").unwrap();
        fs::write(dir.path().join("drop.png"), b"x").unwrap();

        let resolver = PathResolver::new(Some("*.tmp")).unwrap();
        let entries = resolver.resolve_upload(dir.path(), "", true).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].source_key.ends_with("keep.tmp"));
    }
}
