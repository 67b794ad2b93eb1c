//! Errors from the source tree and the filtered view.

use std::io;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VfsError {
    /// Nothing at this path in the source tree.
    #[error("no such entry: {0}")]
    NotFound(String),

    /// Present in the source tree, but no rule selects it.
    #[error("hidden by rules: {0}")]
    Hidden(String),

    #[error("access denied: {0}")]
    PermissionDenied(String),

    /// Any attempt to modify the view.
    #[error("view is read-only")]
    ReadOnly,

    #[error("not a directory: {0}")]
    NotADirectory(String),

    #[error("is a directory: {0}")]
    IsADirectory(String),

    /// A `..` or prefix component, or a symlink resolving outside the root.
    #[error("outside the source root: {0}")]
    PathEscapesRoot(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl VfsError {
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    pub fn hidden(path: impl Into<String>) -> Self {
        Self::Hidden(path.into())
    }

    pub fn permission_denied(path: impl Into<String>) -> Self {
        Self::PermissionDenied(path.into())
    }

    pub fn not_a_directory(path: impl Into<String>) -> Self {
        Self::NotADirectory(path.into())
    }

    pub fn is_a_directory(path: impl Into<String>) -> Self {
        Self::IsADirectory(path.into())
    }

    pub fn path_escapes_root(path: impl Into<String>) -> Self {
        Self::PathEscapesRoot(path.into())
    }

    /// Classify an I/O error against the path it happened on.
    ///
    /// The common kinds get their own variant so callers can match on
    /// them; everything else stays `Io` and keeps its raw OS error.
    pub fn from_io(err: io::Error, path: &Path) -> Self {
        let shown = path.display().to_string();
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(shown),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(shown),
            io::ErrorKind::NotADirectory => Self::NotADirectory(shown),
            io::ErrorKind::IsADirectory => Self::IsADirectory(shown),
            _ => Self::Io(err),
        }
    }

    /// Missing and hidden look the same to a client.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Hidden(_))
    }

    /// The `io::ErrorKind` a client should see.
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            Self::NotFound(_) | Self::Hidden(_) => io::ErrorKind::NotFound,
            Self::PermissionDenied(_) | Self::PathEscapesRoot(_) => {
                io::ErrorKind::PermissionDenied
            }
            Self::ReadOnly => io::ErrorKind::ReadOnlyFilesystem,
            Self::NotADirectory(_) => io::ErrorKind::NotADirectory,
            Self::IsADirectory(_) => io::ErrorKind::IsADirectory,
            Self::Io(e) => e.kind(),
        }
    }
}

impl From<VfsError> for io::Error {
    fn from(e: VfsError) -> Self {
        match e {
            VfsError::Io(inner) => inner,
            other => io::Error::new(other.kind(), other.to_string()),
        }
    }
}

pub type VfsResult<T> = Result<T, VfsError>;
