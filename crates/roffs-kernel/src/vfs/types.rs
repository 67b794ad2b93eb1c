//! Node kinds, attributes and listing entries.
//!
//! Path-based, no inodes. The FUSE adapter owns the inode mapping.

use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::rules::EntryRecord;

/// What a path is on disk.
///
/// Listings only ever hand out `File` and `Directory`; `Symlink` shows up
/// in attributes, which are taken with `lstat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    File,
    Directory,
    Symlink,
}

impl FileType {
    pub fn is_file(&self) -> bool {
        matches!(self, FileType::File)
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, FileType::Directory)
    }

    pub fn is_symlink(&self) -> bool {
        matches!(self, FileType::Symlink)
    }
}

/// `lstat` attributes of one source path.
#[derive(Debug, Clone)]
pub struct FileAttr {
    pub size: u64,
    pub kind: FileType,
    /// Mode bits without the file type (permissions plus setuid/setgid/sticky).
    pub perm: u32,
    pub mtime: SystemTime,
    pub atime: SystemTime,
    /// Status change time.
    pub ctime: SystemTime,
    /// Birth time, where the platform reports one.
    pub crtime: Option<SystemTime>,
    pub nlink: u32,
    pub uid: u32,
    pub gid: u32,
}

impl FileAttr {
    pub fn from_metadata(meta: &std::fs::Metadata) -> Self {
        let file_type = meta.file_type();
        let kind = if file_type.is_symlink() {
            FileType::Symlink
        } else if file_type.is_dir() {
            FileType::Directory
        } else {
            FileType::File
        };

        Self {
            size: meta.len(),
            kind,
            perm: meta.permissions().mode() & 0o7777,
            mtime: unix_time(meta.mtime(), meta.mtime_nsec()),
            atime: unix_time(meta.atime(), meta.atime_nsec()),
            ctime: unix_time(meta.ctime(), meta.ctime_nsec()),
            crtime: meta.created().ok(),
            nlink: u32::try_from(meta.nlink()).unwrap_or(u32::MAX),
            uid: meta.uid(),
            gid: meta.gid(),
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    pub fn is_symlink(&self) -> bool {
        self.kind.is_symlink()
    }
}

/// Seconds + nanoseconds since the epoch, either side of it.
fn unix_time(secs: i64, nsecs: i64) -> SystemTime {
    let nanos = Duration::from_nanos(nsecs.clamp(0, 999_999_999) as u64);
    if secs >= 0 {
        UNIX_EPOCH + Duration::from_secs(secs as u64) + nanos
    } else {
        UNIX_EPOCH - Duration::from_secs(secs.unsigned_abs()) + nanos
    }
}

/// One visible child in a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Single path component.
    pub name: String,
    /// `File` or `Directory`; a symlink lists as `File`.
    pub kind: FileType,
}

impl DirEntry {
    pub fn new(name: impl Into<String>, kind: FileType) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn file(name: impl Into<String>) -> Self {
        Self::new(name, FileType::File)
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self::new(name, FileType::Directory)
    }
}

impl From<&EntryRecord> for DirEntry {
    fn from(entry: &EntryRecord) -> Self {
        let kind = if entry.is_dir {
            FileType::Directory
        } else {
            FileType::File
        };
        Self::new(entry.name.clone(), kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_predicates() {
        assert!(FileType::File.is_file());
        assert!(!FileType::Symlink.is_file());
        assert!(FileType::Directory.is_dir());
        assert!(!FileType::File.is_dir());
        assert!(FileType::Symlink.is_symlink());
    }

    #[test]
    fn test_attr_from_metadata() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("data.bin");
        std::fs::write(&file, b"12345").unwrap();

        let attr = FileAttr::from_metadata(&std::fs::symlink_metadata(&file).unwrap());
        assert!(attr.is_file());
        assert_eq!(attr.size, 5);
        assert!(attr.perm <= 0o7777);
        assert!(attr.nlink >= 1);
        assert!(attr.mtime > UNIX_EPOCH);

        let attr = FileAttr::from_metadata(&std::fs::symlink_metadata(dir.path()).unwrap());
        assert!(attr.is_dir());
    }

    #[test]
    fn test_attr_of_symlink_is_lstat() {
        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join("target");
        std::fs::create_dir(&target).unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let attr = FileAttr::from_metadata(&std::fs::symlink_metadata(&link).unwrap());
        assert!(attr.is_symlink());
        assert!(!attr.is_dir());
    }

    #[test]
    fn test_unix_time() {
        assert_eq!(unix_time(0, 0), UNIX_EPOCH);
        assert_eq!(unix_time(10, 5), UNIX_EPOCH + Duration::new(10, 5));
        assert_eq!(
            unix_time(-10, 0),
            UNIX_EPOCH - Duration::from_secs(10)
        );
    }

    #[test]
    fn test_dir_entry_constructors() {
        assert_eq!(DirEntry::file("a.log"), DirEntry::new("a.log", FileType::File));
        assert_eq!(
            DirEntry::directory("logs"),
            DirEntry::new("logs", FileType::Directory)
        );
        assert_eq!(
            DirEntry::from(&EntryRecord::directory("logs")),
            DirEntry::directory("logs")
        );
        assert_eq!(DirEntry::from(&EntryRecord::file("a.log", 9)), DirEntry::file("a.log"));
    }
}
