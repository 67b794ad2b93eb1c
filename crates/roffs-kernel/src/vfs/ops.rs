//! The read-only operation set a mounted view answers.

use async_trait::async_trait;
use std::path::Path;

use super::VfsResult;
use super::types::{DirEntry, FileAttr};

/// Path-based reads against a tree rooted at `/`.
///
/// A leading `/` is optional. There is no write half: nothing
/// implementing this trait modifies the source tree.
#[async_trait]
pub trait VfsOps: Send + Sync {
    /// `lstat` attributes.
    async fn getattr(&self, path: &Path) -> VfsResult<FileAttr>;

    /// Every entry this tree shows for the directory, in name order.
    async fn readdir(&self, path: &Path) -> VfsResult<Vec<DirEntry>>;

    /// Resolve `name`, a single component, under `parent`.
    async fn lookup(&self, parent: &Path, name: &str) -> VfsResult<DirEntry>;

    /// Whole file contents.
    async fn read_all(&self, path: &Path) -> VfsResult<Vec<u8>>;
}
