//! Local filesystem backend.
//!
//! Read-only access to a real directory tree, with path security
//! to prevent escaping the root directory.

use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::rules::EntryRecord;
use crate::vfs::error::{VfsError, VfsResult};
use crate::vfs::types::FileAttr;

/// Local filesystem backend.
///
/// All operations are relative to `root`. For example, if `root` is
/// `/var/log`, then `read_all("nginx/access.log")` reads
/// `/var/log/nginx/access.log`.
///
/// Path security is enforced: `..` components are rejected outright, and
/// whole-file reads must land under the root after symlinks are resolved.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    /// Open a backend rooted at an existing directory.
    ///
    /// The root is canonicalized here so later containment checks compare
    /// like with like (e.g. macOS `/tmp` → `/private/tmp`).
    pub fn open(root: impl AsRef<Path>) -> VfsResult<Self> {
        let root = root.as_ref();
        let canonical = dunce::canonicalize(root).map_err(|e| VfsError::from_io(e, root))?;
        if !canonical.is_dir() {
            return Err(VfsError::not_a_directory(canonical.display().to_string()));
        }
        Ok(Self { root: canonical })
    }

    /// Get the root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a virtual path to a real path within the root.
    ///
    /// Pure path joining: no symlink resolution, no existence check.
    /// Any `..` (or a Windows prefix) is refused rather than normalized.
    pub fn resolve(&self, path: &Path) -> VfsResult<PathBuf> {
        let mut full = self.root.clone();
        for component in path.components() {
            match component {
                Component::RootDir | Component::CurDir => {}
                Component::Normal(part) => full.push(part),
                Component::ParentDir | Component::Prefix(_) => {
                    return Err(VfsError::path_escapes_root(path.display().to_string()));
                }
            }
        }
        Ok(full)
    }

    /// Canonical real path for `path`, verified to be under the root.
    pub fn real_path(&self, path: &Path) -> VfsResult<PathBuf> {
        let full = self.resolve(path)?;

        // Use dunce for clean canonical paths (no \\?\ on Windows)
        let canonical = dunce::canonicalize(&full).map_err(|e| VfsError::from_io(e, path))?;
        if !canonical.starts_with(&self.root) {
            return Err(VfsError::permission_denied(format!(
                "path escapes mount root: {}",
                path.display()
            )));
        }

        Ok(canonical)
    }

    /// Capture the entries of one directory.
    ///
    /// Entries come back sorted by name, so rule evaluation sees the
    /// same order on every call for an unchanged directory. Entries whose
    /// metadata cannot be read, or whose names are not UTF-8, are skipped.
    pub async fn snapshot(&self, path: &Path) -> VfsResult<Vec<EntryRecord>> {
        let full_path = self.resolve(path)?;
        let mut dir = fs::read_dir(&full_path)
            .await
            .map_err(|e| VfsError::from_io(e, path))?;

        let mut entries = Vec::new();
        while let Some(entry) = dir.next_entry().await.map_err(VfsError::from)? {
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    debug!(path = %path.display(), name = ?raw, "skipping non-UTF-8 entry");
                    continue;
                }
            };
            // DirEntry::metadata does not traverse symlinks.
            let meta = match entry.metadata().await {
                Ok(meta) => meta,
                Err(e) => {
                    debug!(path = %path.display(), %name, "skipping entry: {}", e);
                    continue;
                }
            };
            entries.push(EntryRecord::new(name, meta.len(), meta.is_dir()));
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// `lstat` attributes; a symlink reports itself, not its target.
    pub async fn getattr(&self, path: &Path) -> VfsResult<FileAttr> {
        let full_path = self.resolve(path)?;
        let meta = fs::symlink_metadata(&full_path)
            .await
            .map_err(|e| VfsError::from_io(e, path))?;
        Ok(FileAttr::from_metadata(&meta))
    }

    /// Whole contents of a file, following symlinks that stay in the root.
    pub async fn read_all(&self, path: &Path) -> VfsResult<Vec<u8>> {
        let real = self.real_path(path)?;
        if real.is_dir() {
            return Err(VfsError::is_a_directory(path.display().to_string()));
        }
        fs::read(&real).await.map_err(|e| VfsError::from_io(e, path))
    }
}

/// Reject names that are not a single normal path component.
pub(crate) fn check_component(name: &str) -> VfsResult<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') || name.contains('\0') {
        return Err(VfsError::not_found(name));
    }
    Ok(())
}
