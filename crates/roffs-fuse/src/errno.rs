//! `VfsError` → errno for FUSE replies.

use libc::c_int;
use roffs_kernel::VfsError;

/// Map a VFS error to the errno the kernel should see.
pub fn errno(err: &VfsError) -> c_int {
    match err {
        VfsError::NotFound(_) | VfsError::Hidden(_) => libc::ENOENT,
        VfsError::PermissionDenied(_) | VfsError::PathEscapesRoot(_) => libc::EACCES,
        VfsError::ReadOnly => libc::EROFS,
        VfsError::NotADirectory(_) => libc::ENOTDIR,
        VfsError::IsADirectory(_) => libc::EISDIR,
        VfsError::Io(e) => e.raw_os_error().unwrap_or(libc::EIO),
    }
}
