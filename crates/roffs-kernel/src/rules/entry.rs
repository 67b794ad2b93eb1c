//! Entry records: the per-listing snapshot that rules are evaluated over.

/// One real directory entry, as seen by filter expressions.
///
/// Built fresh for every listing and dropped at its end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRecord {
    /// Entry name, unique within its parent.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Extension including the leading dot, or empty.
    pub ext: String,
    /// Whether the entry is a directory (symlinks are not followed).
    pub is_dir: bool,
}

impl EntryRecord {
    /// Create a record, deriving the extension from the name.
    pub fn new(name: impl Into<String>, size: u64, is_dir: bool) -> Self {
        let name = name.into();
        let ext = extension_of(&name).to_string();
        Self {
            name,
            size,
            ext,
            is_dir,
        }
    }

    /// Shorthand for a regular file record.
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self::new(name, size, false)
    }

    /// Shorthand for a directory record.
    pub fn directory(name: impl Into<String>) -> Self {
        Self::new(name, 0, true)
    }
}

/// The suffix starting at the final `.` of `name`, or `""`.
///
/// `archive.tar.gz` gives `.gz`; a dotfile such as `.bashrc` is all
/// extension.
pub fn extension_of(name: &str) -> &str {
    name.rfind('.').map(|i| &name[i..]).unwrap_or("")
}
