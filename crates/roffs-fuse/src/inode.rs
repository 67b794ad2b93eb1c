//! Inode ↔ node mapping.
//!
//! The kernel crate is path-based; FUSE speaks inode numbers. Every
//! successful lookup interns the child node and bumps its lookup count,
//! and `forget` drops the count again. An inode whose count reaches zero
//! is removed. The root is never removed.
//!
//! Only lookup allocates. Plain readdir entries are never forgotten by the
//! kernel, so listings reuse an existing number or hand out a transient
//! one that the table does not keep.

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::{Path, PathBuf};

use fuser::FUSE_ROOT_ID;
use roffs_kernel::{DirNode, Node};

/// What the table knows about one inode.
#[derive(Debug, Clone)]
pub struct Inode {
    /// The view node, as last seen by lookup.
    pub node: Node,
    /// Parent inode (the root is its own parent).
    pub parent: u64,
    lookups: u64,
}

impl Inode {
    pub fn path(&self) -> &Path {
        self.node.path()
    }
}

const TRANSIENT_BIT: u64 = 1 << 63;

#[derive(Debug)]
pub struct InodeTable {
    by_ino: HashMap<u64, Inode>,
    by_path: HashMap<PathBuf, u64>,
    next: u64,
}

impl InodeTable {
    pub fn new(root: DirNode) -> Self {
        let root = Node::Directory(root);
        let mut by_path = HashMap::new();
        by_path.insert(root.path().to_path_buf(), FUSE_ROOT_ID);
        let mut by_ino = HashMap::new();
        by_ino.insert(
            FUSE_ROOT_ID,
            Inode {
                node: root,
                parent: FUSE_ROOT_ID,
                lookups: 0,
            },
        );

        Self {
            by_ino,
            by_path,
            next: FUSE_ROOT_ID + 1,
        }
    }

    pub fn get(&self, ino: u64) -> Option<&Inode> {
        self.by_ino.get(&ino)
    }

    pub fn node(&self, ino: u64) -> Option<&Node> {
        self.by_ino.get(&ino).map(|i| &i.node)
    }

    pub fn ino_of(&self, path: &Path) -> Option<u64> {
        self.by_path.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.by_ino.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_ino.is_empty()
    }

    /// Number to report for `path` in a directory listing.
    ///
    /// The live inode if the kernel holds one, otherwise a number derived
    /// from the path with the top bit set, clear of anything `intern`
    /// allocates. Never zero: readdir consumers skip `d_ino == 0`.
    pub fn listing_ino(&self, path: &Path) -> u64 {
        if let Some(ino) = self.ino_of(path) {
            return ino;
        }
        let mut hasher = DefaultHasher::new();
        path.hash(&mut hasher);
        hasher.finish() | TRANSIENT_BIT
    }

    /// Inode for `node` under `parent`, allocating one if needed.
    fn intern(&mut self, parent: u64, node: Node) -> u64 {
        if let Some(&ino) = self.by_path.get(node.path()) {
            if let Some(inode) = self.by_ino.get_mut(&ino) {
                inode.node = node;
            }
            return ino;
        }

        let ino = self.next;
        self.next += 1;
        self.by_path.insert(node.path().to_path_buf(), ino);
        self.by_ino.insert(
            ino,
            Inode {
                node,
                parent,
                lookups: 0,
            },
        );
        ino
    }

    /// Intern and count one kernel lookup reference.
    pub fn lookup(&mut self, parent: u64, node: Node) -> u64 {
        let ino = self.intern(parent, node);
        if let Some(inode) = self.by_ino.get_mut(&ino) {
            inode.lookups += 1;
        }
        ino
    }

    /// Drop `nlookup` references; remove the inode once none remain.
    pub fn forget(&mut self, ino: u64, nlookup: u64) {
        if ino == FUSE_ROOT_ID {
            return;
        }
        let Some(inode) = self.by_ino.get_mut(&ino) else {
            return;
        };
        inode.lookups = inode.lookups.saturating_sub(nlookup);
        if inode.lookups == 0 {
            if let Some(inode) = self.by_ino.remove(&ino) {
                self.by_path.remove(inode.path());
            }
        }
    }
}
