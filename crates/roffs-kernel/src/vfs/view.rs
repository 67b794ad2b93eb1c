//! Rule-filtered view over a [`LocalBackend`].
//!
//! [`ViewFs`] answers the path-based [`VfsOps`] over the backend, but
//! every directory listing and lookup goes through the [`RuleSet`]:
//!
//! ```text
//! readdir/lookup(dir)
//!   └── LocalBackend::snapshot(dir)      one snapshot per request
//!         └── RuleSet::compose(snapshot) evaluate each rule, OR the results
//!               └── keep visible names
//! ```
//!
//! Nothing is cached between requests. Listing and lookup of the same
//! directory state always agree.
//!
//! [`DirNode`] and [`FileNode`] are the node-shaped face of the same
//! operations, for mount adapters that hand out one object per path.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use super::backends::{check_component, LocalBackend};
use super::error::{VfsError, VfsResult};
use super::ops::VfsOps;
use super::types::{DirEntry, FileAttr, FileType};
use crate::rules::{EntryRecord, RuleSet, Visibility};

/// A read-only, rule-filtered view of a directory tree.
#[derive(Debug)]
pub struct ViewFs {
    backend: LocalBackend,
    rules: RuleSet,
}

impl ViewFs {
    pub fn new(backend: LocalBackend, rules: RuleSet) -> Self {
        Self { backend, rules }
    }

    pub fn backend(&self) -> &LocalBackend {
        &self.backend
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// The directory node for the view's root.
    pub fn root(self: &Arc<Self>) -> DirNode {
        DirNode {
            fs: Arc::clone(self),
            path: PathBuf::from("/"),
        }
    }

    /// Virtual path → real path under the source root.
    pub fn resolve_path(&self, path: &Path) -> VfsResult<PathBuf> {
        self.backend.resolve(path)
    }

    /// Snapshot `path` and decide which of its entries are visible.
    ///
    /// Both halves come from the same snapshot, so they are consistent
    /// with each other.
    pub async fn visible_entries(
        &self,
        path: &Path,
    ) -> VfsResult<(Vec<EntryRecord>, Visibility)> {
        let entries = self.backend.snapshot(path).await?;
        let visibility = self.rules.compose(&entries);

        let errored = visibility.errored();
        if errored > 0 {
            warn!(
                path = %path.display(),
                errored,
                "filter evaluation failed for some entries; treated as not matching"
            );
        }
        debug!(
            path = %path.display(),
            total = entries.len(),
            visible = visibility.len(),
            "composed visibility"
        );

        Ok((entries, visibility))
    }

    /// Walk `path` from the root, one visible component at a time.
    ///
    /// Fails with NotFound as soon as a component is hidden, the way a
    /// mount client walking the tree would.
    pub async fn walk(self: &Arc<Self>, path: &Path) -> VfsResult<Node> {
        let mut node = Node::Directory(self.root());
        for component in path.components() {
            match component {
                std::path::Component::RootDir | std::path::Component::CurDir => {}
                std::path::Component::Normal(part) => {
                    let Node::Directory(dir) = node else {
                        return Err(VfsError::not_a_directory(path.display().to_string()));
                    };
                    let name = part
                        .to_str()
                        .ok_or_else(|| VfsError::not_found(path.display().to_string()))?;
                    node = dir.lookup(name).await?;
                }
                _ => return Err(VfsError::path_escapes_root(path.display().to_string())),
            }
        }
        Ok(node)
    }

    fn node_for(self: &Arc<Self>, path: PathBuf, kind: FileType) -> Node {
        let fs = Arc::clone(self);
        if kind.is_dir() {
            Node::Directory(DirNode { fs, path })
        } else {
            Node::File(FileNode { fs, path })
        }
    }
}

#[async_trait]
impl VfsOps for ViewFs {
    async fn getattr(&self, path: &Path) -> VfsResult<FileAttr> {
        self.backend.getattr(path).await
    }

    async fn readdir(&self, path: &Path) -> VfsResult<Vec<DirEntry>> {
        let (entries, visibility) = self.visible_entries(path).await?;
        Ok(visibility
            .filter(&entries)
            .map(DirEntry::from)
            .collect())
    }

    async fn lookup(&self, parent: &Path, name: &str) -> VfsResult<DirEntry> {
        check_component(name)?;
        let (entries, visibility) = self.visible_entries(parent).await?;

        let shown = || parent.join(name).display().to_string();
        let entry = entries
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| VfsError::not_found(shown()))?;

        if !visibility.is_visible(name) {
            debug!(parent = %parent.display(), %name, "lookup of hidden entry");
            return Err(VfsError::hidden(shown()));
        }
        Ok(DirEntry::from(entry))
    }

    async fn read_all(&self, path: &Path) -> VfsResult<Vec<u8>> {
        self.backend.read_all(path).await
    }
}

/// Any node in the view.
#[derive(Debug, Clone)]
pub enum Node {
    Directory(DirNode),
    File(FileNode),
}

impl Node {
    /// Virtual path of this node.
    pub fn path(&self) -> &Path {
        match self {
            Node::Directory(d) => d.path(),
            Node::File(f) => f.path(),
        }
    }

    pub fn kind(&self) -> FileType {
        match self {
            Node::Directory(_) => FileType::Directory,
            Node::File(_) => FileType::File,
        }
    }

    pub async fn attributes(&self) -> VfsResult<FileAttr> {
        match self {
            Node::Directory(d) => d.attributes().await,
            Node::File(f) => f.attributes().await,
        }
    }

    pub fn as_dir(&self) -> Option<&DirNode> {
        match self {
            Node::Directory(d) => Some(d),
            Node::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileNode> {
        match self {
            Node::File(f) => Some(f),
            Node::Directory(_) => None,
        }
    }
}

/// A directory in the view.
#[derive(Debug, Clone)]
pub struct DirNode {
    fs: Arc<ViewFs>,
    path: PathBuf,
}

impl DirNode {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn attributes(&self) -> VfsResult<FileAttr> {
        self.fs.getattr(&self.path).await
    }

    /// Visible children, in snapshot (name) order.
    pub async fn list_directory(&self) -> VfsResult<Vec<DirEntry>> {
        self.fs.readdir(&self.path).await
    }

    /// Resolve a visible child. Hidden names are NotFound even when they
    /// exist on disk.
    pub async fn lookup(&self, name: &str) -> VfsResult<Node> {
        let entry = self.fs.lookup(&self.path, name).await?;
        Ok(self.fs.node_for(self.path.join(&entry.name), entry.kind))
    }

    /// The node for a child that a listing just returned.
    pub fn child(&self, entry: &DirEntry) -> Node {
        self.fs.node_for(self.path.join(&entry.name), entry.kind)
    }
}

/// A file in the view.
#[derive(Debug, Clone)]
pub struct FileNode {
    fs: Arc<ViewFs>,
    path: PathBuf,
}

impl FileNode {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn attributes(&self) -> VfsResult<FileAttr> {
        self.fs.getattr(&self.path).await
    }

    /// Whole-file read. No ranges, no streaming.
    pub async fn read_all(&self) -> VfsResult<Vec<u8>> {
        self.fs.read_all(&self.path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::RhaiCompiler;
    use tempfile::TempDir;

    fn view(dir: &TempDir, pipelines: &[&str]) -> Arc<ViewFs> {
        let backend = LocalBackend::open(dir.path()).unwrap();
        let rules = RuleSet::from_pipelines(pipelines, &RhaiCompiler::new()).unwrap();
        Arc::new(ViewFs::new(backend, rules))
    }

    fn write(dir: &TempDir, name: &str, size: usize) {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, vec![b'x'; size]).unwrap();
    }

    fn names(entries: &[DirEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_readdir_filters() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.txt", 1);
        write(&dir, "b.md", 1);
        write(&dir, "c.txt", 1);
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let fs = view(&dir, &[r#"filter ext == ".txt""#]);
        let entries = fs.readdir(Path::new("/")).await.unwrap();
        assert_eq!(names(&entries), ["a.txt", "c.txt"]);
        assert!(entries.iter().all(|e| e.kind == FileType::File));
    }

    #[tokio::test]
    async fn test_readdir_kinds() {
        let dir = TempDir::new().unwrap();
        write(&dir, "f.txt", 1);
        std::fs::create_dir(dir.path().join("d")).unwrap();

        let fs = view(&dir, &["filter true"]);
        let entries = fs.readdir(Path::new("/")).await.unwrap();
        assert_eq!(entries, [DirEntry::directory("d"), DirEntry::file("f.txt")]);
    }

    #[tokio::test]
    async fn test_lookup_hidden_is_not_found() {
        let dir = TempDir::new().unwrap();
        write(&dir, "shown.log", 1);
        write(&dir, "hidden.txt", 1);

        let fs = view(&dir, &[r#"filter ext == ".log""#]);
        let root = fs.root();

        let node = root.lookup("shown.log").await.unwrap();
        assert_eq!(node.path(), Path::new("/shown.log"));
        assert_eq!(node.kind(), FileType::File);

        let err = root.lookup("hidden.txt").await.unwrap_err();
        assert!(matches!(err, VfsError::Hidden(_)));
        assert!(err.is_not_found());
        let err = root.lookup("missing.log").await.unwrap_err();
        assert!(matches!(err, VfsError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_lookup_rejects_traversal_names() {
        let dir = TempDir::new().unwrap();
        let fs = view(&dir, &["filter true"]);
        let root = fs.root();
        for name in ["..", ".", "", "a/b"] {
            assert!(root.lookup(name).await.unwrap_err().is_not_found());
        }
    }

    #[tokio::test]
    async fn test_nested_directories() {
        let dir = TempDir::new().unwrap();
        write(&dir, "logs/app.log", 10);
        write(&dir, "logs/app.txt", 10);

        let fs = view(&dir, &["filter isDir || ext == \".log\""]);
        let Node::Directory(logs) = fs.root().lookup("logs").await.unwrap() else {
            panic!("logs should be a directory");
        };
        assert_eq!(names(&logs.list_directory().await.unwrap()), ["app.log"]);

        let Node::File(file) = logs.lookup("app.log").await.unwrap() else {
            panic!("app.log should be a file");
        };
        assert_eq!(file.read_all().await.unwrap(), vec![b'x'; 10]);
        assert_eq!(file.attributes().await.unwrap().size, 10);
    }

    #[tokio::test]
    async fn test_hidden_directory_blocks_walk() {
        let dir = TempDir::new().unwrap();
        write(&dir, "private/keys.log", 1);

        let fs = view(&dir, &[r#"filter ext == ".log""#]);
        let err = fs.walk(Path::new("/private/keys.log")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_walk_through_file_fails() {
        let dir = TempDir::new().unwrap();
        write(&dir, "f.txt", 1);

        let fs = view(&dir, &["filter true"]);
        let err = fs.walk(Path::new("/f.txt/x")).await.unwrap_err();
        assert!(matches!(err, VfsError::NotADirectory(_)));
    }

    #[tokio::test]
    async fn test_root_attributes() {
        let dir = TempDir::new().unwrap();
        let fs = view(&dir, &["filter true"]);
        assert!(fs.root().attributes().await.unwrap().is_dir());
    }

    #[tokio::test]
    async fn test_resolve_path() {
        let dir = TempDir::new().unwrap();
        let fs = view(&dir, &["filter true"]);
        let real = fs.resolve_path(Path::new("/a/b.txt")).unwrap();
        assert!(real.ends_with("a/b.txt"));
        assert!(fs.resolve_path(Path::new("/../x")).is_err());
    }

    #[tokio::test]
    async fn test_child_matches_lookup() {
        let dir = TempDir::new().unwrap();
        write(&dir, "x.bin", 3);
        std::fs::create_dir(dir.path().join("y")).unwrap();

        let fs = view(&dir, &["filter true"]);
        let root = fs.root();
        for entry in root.list_directory().await.unwrap() {
            let listed = root.child(&entry);
            let looked_up = root.lookup(&entry.name).await.unwrap();
            assert_eq!(listed.path(), looked_up.path());
            assert_eq!(listed.kind(), looked_up.kind());
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_is_listed_as_file() {
        let dir = TempDir::new().unwrap();
        write(&dir, "target.txt", 42);
        std::os::unix::fs::symlink(dir.path().join("target.txt"), dir.path().join("link.txt"))
            .unwrap();

        let fs = view(&dir, &["filter true"]);
        let entries = fs.readdir(Path::new("/")).await.unwrap();
        assert!(entries.contains(&DirEntry::file("link.txt")));

        // Attributes are the link's own; content is the target's.
        let attr = fs.getattr(Path::new("/link.txt")).await.unwrap();
        assert!(attr.is_symlink());
        assert_eq!(fs.read_all(Path::new("/link.txt")).await.unwrap().len(), 42);
    }
}
