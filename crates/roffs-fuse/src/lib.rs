//! # roffs-fuse
//!
//! FUSE front-end for roffs. Maps inode numbers onto the path-based
//! [`ViewFs`](roffs_kernel::ViewFs) and answers kernel requests read-only.

mod errno;
mod fs;
mod handle;
mod inode;
mod mount;

pub use errno::errno;
pub use fs::{ListingEntry, RoffsFs, slice_at, to_fuse_attr};
pub use handle::HandleTable;
pub use inode::{Inode, InodeTable};
pub use mount::{MountConfig, mount};
