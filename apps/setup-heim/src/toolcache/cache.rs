//! Filesystem tool cache.
//!
//! Uses the hosted-runner layout so entries are shared with other setup
//! steps on the same machine:
//!
//! ```text
//! {root}/
//!   heim/
//!     1.1.1/
//!       x86_64/               # cached tree
//!       x86_64.complete       # written after the tree is fully copied
//! ```
//!
//! An entry without its `.complete` marker is treated as absent.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;
use walkdir::WalkDir;

use super::ToolCache;
use crate::errors::{Result, SetupError};

/// [`ToolCache`] rooted at a directory on disk.
#[derive(Debug, Clone)]
pub struct FsToolCache {
    root: PathBuf,
}

impl FsToolCache {
    /// Creates a cache rooted at `root`. The directory is created lazily.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory for one `(tool, version, arch)` entry.
    #[must_use]
    pub fn entry_dir(&self, tool: &str, version: &str, arch: &str) -> PathBuf {
        self.root.join(tool).join(version).join(arch)
    }

    fn marker_path(&self, tool: &str, version: &str, arch: &str) -> PathBuf {
        self.root.join(tool).join(version).join(format!("{arch}.complete"))
    }
}

#[async_trait]
impl ToolCache for FsToolCache {
    fn find(&self, tool: &str, version: &str, arch: &str) -> Option<PathBuf> {
        let entry = self.entry_dir(tool, version, arch);
        debug!("checking tool cache: {}", entry.display());
        if entry.is_dir() && self.marker_path(tool, version, arch).is_file() {
            Some(entry)
        } else {
            debug!("not found");
            None
        }
    }

    async fn cache_dir(
        &self,
        source: &Path,
        tool: &str,
        version: &str,
        arch: &str,
    ) -> Result<PathBuf> {
        debug!("Caching tool {tool} {version} {arch} from {}", source.display());

        let entry = self.entry_dir(tool, version, arch);
        let marker = self.marker_path(tool, version, arch);
        let source = source.to_path_buf();

        tokio::task::spawn_blocking(move || populate(&source, &entry, &marker))
            .await
            .map_err(|e| {
                SetupError::io(
                    "tool cache copy task failed",
                    std::io::Error::other(e.to_string()),
                )
            })?
    }
}

/// Replaces the entry with a copy of `source`, marker last.
fn populate(source: &Path, entry: &Path, marker: &Path) -> Result<PathBuf> {
    let write_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source: std::io::Error| SetupError::CacheWriteFailed { path, source }
    };

    if !source.is_dir() {
        return Err(SetupError::io(
            format!("sourceDir is not a directory: {}", source.display()),
            std::io::Error::from(std::io::ErrorKind::NotADirectory),
        ));
    }

    remove_if_exists(marker).map_err(write_err(marker))?;
    if entry.exists() {
        std::fs::remove_dir_all(entry).map_err(write_err(entry))?;
    }
    std::fs::create_dir_all(entry).map_err(write_err(entry))?;

    copy_tree(source, entry)?;

    std::fs::write(marker, b"").map_err(write_err(marker))?;
    debug!("finished caching tool");
    Ok(entry.to_path_buf())
}

fn remove_if_exists(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Recursively copies the contents of `source` into `dest`.
///
/// `std::fs::copy` carries permission bits across, so executables stay
/// executable.
fn copy_tree(source: &Path, dest: &Path) -> Result<()> {
    for entry in WalkDir::new(source).min_depth(1) {
        let entry = entry.map_err(|e| SetupError::CacheWriteFailed {
            path: dest.to_path_buf(),
            source: e.into(),
        })?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| SetupError::CacheWriteFailed {
                path: entry.path().to_path_buf(),
                source: std::io::Error::other(e),
            })?;
        let target = dest.join(relative);

        let result = if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)
        } else {
            std::fs::copy(entry.path(), &target).map(|_| ())
        };
        result.map_err(|source| SetupError::CacheWriteFailed {
            path: target.clone(),
            source,
        })?;
    }
    Ok(())
}
