//! `fuser::Filesystem` over a [`ViewFs`].
//!
//! fuser calls in on its own session thread; each callback resolves the
//! inode to a path and drives the async view to completion on the tokio
//! runtime behind `handle`.

use std::ffi::OsStr;
use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};

use fuser::{
    FileAttr as FuseAttr, FileType as FuseType, Filesystem, KernelConfig, ReplyAttr, ReplyData,
    ReplyDirectory, ReplyEmpty, ReplyEntry, ReplyOpen, Request, consts::FOPEN_DIRECT_IO,
};
use libc::c_int;
use roffs_kernel::{DirNode, FileAttr, FileNode, FileType, Node, VfsError, ViewFs};
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::errno::errno;
use crate::handle::HandleTable;
use crate::inode::InodeTable;

const BLOCK_SIZE: u32 = 4096;

/// One readdir row: inode, kind, name.
pub type ListingEntry = (u64, FuseType, String);

/// The mounted filesystem.
pub struct RoffsFs {
    view: Arc<ViewFs>,
    handle: Handle,
    inodes: InodeTable,
    files: HandleTable,
    ttl: Duration,
}

impl RoffsFs {
    pub fn new(view: Arc<ViewFs>, handle: Handle, ttl: Duration) -> Self {
        let inodes = InodeTable::new(view.root());
        Self {
            view,
            handle,
            inodes,
            files: HandleTable::new(),
            ttl,
        }
    }

    pub fn inodes(&self) -> &InodeTable {
        &self.inodes
    }

    pub fn open_files(&self) -> &HandleTable {
        &self.files
    }

    /// Attributes for `ino`, with the kind the view assigned to it.
    fn attr_of(&self, ino: u64) -> Result<FuseAttr, c_int> {
        let node = self.inodes.node(ino).ok_or(libc::ENOENT)?;
        let attr = self
            .handle
            .block_on(node.attributes())
            .map_err(|e| errno(&e))?;
        Ok(to_fuse_attr(ino, node.kind(), &attr))
    }

    fn dir(&self, ino: u64) -> Result<DirNode, c_int> {
        match self.inodes.node(ino) {
            Some(Node::Directory(dir)) => Ok(dir.clone()),
            Some(Node::File(_)) => Err(libc::ENOTDIR),
            None => Err(libc::ENOENT),
        }
    }

    fn file(&self, ino: u64) -> Result<FileNode, c_int> {
        match self.inodes.node(ino) {
            Some(Node::File(file)) => Ok(file.clone()),
            Some(Node::Directory(_)) => Err(libc::EISDIR),
            None => Err(libc::ENOENT),
        }
    }

    /// Resolve `name` under `parent` and count one kernel reference to it.
    ///
    /// Each call snapshots the parent and recomputes its visibility, so a
    /// lookup burst over N entries runs the rules N times. Nothing is
    /// cached: a stale answer would let lookup disagree with the listing.
    pub fn lookup_child(&mut self, parent: u64, name: &str) -> Result<(u64, FuseAttr), c_int> {
        let dir = self.dir(parent)?;
        debug!(parent = %dir.path().display(), %name, "lookup");

        let (node, attr) = self
            .handle
            .block_on(async {
                let node = dir.lookup(name).await?;
                let attr = node.attributes().await?;
                Ok::<_, VfsError>((node, attr))
            })
            .map_err(|e| errno(&e))?;

        let kind = node.kind();
        let ino = self.inodes.lookup(parent, node);
        Ok((ino, to_fuse_attr(ino, kind, &attr)))
    }

    /// Read the whole file once and park it under a new handle.
    ///
    /// Returns the handle and the FUSE open flags.
    pub fn open_file(&mut self, ino: u64, flags: i32) -> Result<(u64, u32), c_int> {
        if wants_write(flags) {
            return Err(errno(&VfsError::ReadOnly));
        }
        let file = self.file(ino)?;

        let (attr, data) = self
            .handle
            .block_on(async {
                let attr = file.attributes().await?;
                let data = file.read_all().await?;
                Ok::<_, VfsError>((attr, data))
            })
            .map_err(|e| errno(&e))?;

        // A symlink's own size is the link length; without direct I/O the
        // kernel would stop reading there.
        let open_flags = if attr.is_symlink() { FOPEN_DIRECT_IO } else { 0 };
        let fh = self.files.insert(data);
        debug!(path = %file.path().display(), fh, "opened");
        Ok((fh, open_flags))
    }

    /// Bytes `[offset, offset + size)` of an open handle.
    pub fn read_handle(&self, fh: u64, offset: i64, size: u32) -> Result<Vec<u8>, c_int> {
        let data = self.files.get(fh).ok_or(libc::EBADF)?;
        Ok(slice_at(&data, offset, size).to_vec())
    }

    pub fn release_handle(&mut self, fh: u64) {
        if !self.files.release(fh) {
            debug!(fh, "release of unknown handle");
        }
    }

    /// Full listing of `ino`, including `.` and `..`.
    ///
    /// Children the kernel has not looked up get transient numbers; the
    /// inode table is left as it was.
    pub fn listing(&self, ino: u64) -> Result<Vec<ListingEntry>, c_int> {
        let dir = self.dir(ino)?;
        let parent = self.inodes.get(ino).map_or(ino, |i| i.parent);

        let listing = self.handle.block_on(dir.list_directory()).map_err(|e| {
            warn!(path = %dir.path().display(), "readdir failed: {}", e);
            errno(&e)
        })?;

        let mut entries = Vec::with_capacity(listing.len() + 2);
        entries.push((ino, FuseType::Directory, ".".to_string()));
        entries.push((parent, FuseType::Directory, "..".to_string()));
        for entry in listing {
            let child = self.inodes.listing_ino(&dir.path().join(&entry.name));
            entries.push((child, fuse_kind(entry.kind), entry.name));
        }
        Ok(entries)
    }

    pub fn check_access(&self, ino: u64, mask: i32) -> Result<(), c_int> {
        if self.inodes.get(ino).is_none() {
            return Err(libc::ENOENT);
        }
        if mask & libc::W_OK != 0 {
            return Err(errno(&VfsError::ReadOnly));
        }
        Ok(())
    }
}

/// Kernel attributes → FUSE attributes.
///
/// `kind` is the node kind from the view, so a symlink is served as a
/// regular file. Write bits are cleared.
pub fn to_fuse_attr(ino: u64, kind: FileType, attr: &FileAttr) -> FuseAttr {
    FuseAttr {
        ino,
        size: attr.size,
        blocks: attr.size.div_ceil(512),
        atime: attr.atime,
        mtime: attr.mtime,
        ctime: attr.ctime,
        crtime: attr.crtime.unwrap_or(UNIX_EPOCH),
        kind: fuse_kind(kind),
        perm: (attr.perm & 0o7555) as u16,
        nlink: attr.nlink.max(1),
        uid: attr.uid,
        gid: attr.gid,
        rdev: 0,
        blksize: BLOCK_SIZE,
        flags: 0,
    }
}

fn fuse_kind(kind: FileType) -> FuseType {
    if kind.is_dir() {
        FuseType::Directory
    } else {
        FuseType::RegularFile
    }
}

/// Byte range `[offset, offset + size)` of `data`, clamped.
pub fn slice_at(data: &[u8], offset: i64, size: u32) -> &[u8] {
    let start = usize::try_from(offset).unwrap_or(0).min(data.len());
    let end = start.saturating_add(size as usize).min(data.len());
    &data[start..end]
}

fn wants_write(flags: i32) -> bool {
    let access = flags & libc::O_ACCMODE;
    access == libc::O_WRONLY
        || access == libc::O_RDWR
        || flags & (libc::O_APPEND | libc::O_TRUNC | libc::O_CREAT) != 0
}

impl Filesystem for RoffsFs {
    fn init(&mut self, _req: &Request<'_>, _config: &mut KernelConfig) -> Result<(), c_int> {
        info!(
            root = %self.view.backend().root().display(),
            rules = self.view.rules().len(),
            "filesystem initialized"
        );
        Ok(())
    }

    fn destroy(&mut self) {
        info!(open = self.files.len(), "filesystem unmounted");
    }

    fn lookup(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEntry) {
        let Some(name) = name.to_str() else {
            reply.error(libc::ENOENT);
            return;
        };
        match self.lookup_child(parent, name) {
            Ok((_, attr)) => reply.entry(&self.ttl, &attr, 0),
            Err(code) => reply.error(code),
        }
    }

    fn forget(&mut self, _req: &Request<'_>, ino: u64, nlookup: u64) {
        self.inodes.forget(ino, nlookup);
    }

    fn getattr(&mut self, _req: &Request<'_>, ino: u64, _fh: Option<u64>, reply: ReplyAttr) {
        match self.attr_of(ino) {
            Ok(attr) => reply.attr(&self.ttl, &attr),
            Err(code) => reply.error(code),
        }
    }

    fn open(&mut self, _req: &Request<'_>, ino: u64, flags: i32, reply: ReplyOpen) {
        match self.open_file(ino, flags) {
            Ok((fh, open_flags)) => reply.opened(fh, open_flags),
            Err(code) => reply.error(code),
        }
    }

    fn read(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        debug!(ino, fh, offset, size, "read");
        match self.read_handle(fh, offset, size) {
            Ok(data) => reply.data(&data),
            Err(code) => reply.error(code),
        }
    }

    fn release(
        &mut self,
        _req: &Request<'_>,
        _ino: u64,
        fh: u64,
        _flags: i32,
        _lock_owner: Option<u64>,
        _flush: bool,
        reply: ReplyEmpty,
    ) {
        self.release_handle(fh);
        reply.ok();
    }

    fn opendir(&mut self, _req: &Request<'_>, ino: u64, _flags: i32, reply: ReplyOpen) {
        match self.dir(ino) {
            Ok(_) => reply.opened(0, 0),
            Err(code) => reply.error(code),
        }
    }

    fn readdir(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        debug!(ino, offset, "readdir");
        let entries = match self.listing(ino) {
            Ok(entries) => entries,
            Err(code) => {
                reply.error(code);
                return;
            }
        };

        let skip = usize::try_from(offset).unwrap_or(0);
        for (i, (child, kind, name)) in entries.into_iter().enumerate().skip(skip) {
            // true means the reply buffer is full
            if reply.add(child, (i + 1) as i64, kind, &name) {
                break;
            }
        }
        reply.ok();
    }

    fn access(&mut self, _req: &Request<'_>, ino: u64, mask: i32, reply: ReplyEmpty) {
        match self.check_access(ino, mask) {
            Ok(()) => reply.ok(),
            Err(code) => reply.error(code),
        }
    }
}
