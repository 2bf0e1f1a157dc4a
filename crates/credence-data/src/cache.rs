//! On-disk cache of downloaded artifacts.
//!
//! Artifacts are immutable for a given revision, so entries never expire;
//! they are keyed by `<revision>/<file name>` below the cache root.

use crate::error::{DataError, Result};
use std::path::{Path, PathBuf};

/// Get the default cache directory path.
///
/// Uses platform-specific cache directories:
/// - Linux: `~/.cache/credence/`
/// - macOS: `~/Library/Caches/credence/`
/// - Windows: `%LOCALAPPDATA%\credence\`
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("credence")
}

/// Revision-keyed artifact cache rooted at a directory.
#[derive(Debug, Clone)]
pub struct ArtifactCache {
    root: PathBuf,
}

impl Default for ArtifactCache {
    fn default() -> Self {
        Self::new(default_cache_dir())
    }
}

impl ArtifactCache {
    /// Cache rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of an entry.
    pub fn entry_path(&self, revision: &str, file: &str) -> Result<PathBuf> {
        if [revision, file]
            .iter()
            .any(|part| part.is_empty() || part.contains("..") || part.contains('/'))
        {
            return Err(DataError::Cache(format!(
                "invalid cache key {revision}/{file}"
            )));
        }
        Ok(self.root.join(revision).join(file))
    }

    /// Read an entry, `None` when absent.
    pub async fn get(&self, revision: &str, file: &str) -> Result<Option<Vec<u8>>> {
        let path = self.entry_path(revision, file)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Store an entry, creating directories as needed.
    ///
    /// The bytes go to a temporary file next to the entry which is then
    /// renamed over it, so an interrupted write never leaves a truncated
    /// entry behind.
    pub async fn put(&self, revision: &str, file: &str, bytes: &[u8]) -> Result<()> {
        let path = self.entry_path(revision, file)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let partial = partial_path(&path);
        if let Err(e) = tokio::fs::write(&partial, bytes).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e.into());
        }
        tokio::fs::rename(&partial, &path).await?;
        Ok(())
    }
}

/// Temporary sibling an entry is written to before being moved into place.
fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{}.partial", std::process::id()));
    path.with_file_name(name)
}
