//! Read-only virtual filesystem.
//!
//! Key components:
//!
//! - [`VfsOps`] - Path-based read operations
//! - [`LocalBackend`] - The source directory (with path security)
//! - [`ViewFs`] - The backend seen through a [`RuleSet`](crate::rules::RuleSet)
//!
//! ## Design Decisions
//!
//! - **Path-based, no inodes**: Operations use paths, not inode numbers.
//!   The mount adapter owns the inode ↔ path mapping.
//! - **Whole-file reads**: Files are read in full, once per open handle;
//!   the adapter slices.
//! - **No write surface**: The trait has no mutating operations at all.

pub mod backends;
mod error;
mod ops;
mod types;
pub mod view;

pub use backends::LocalBackend;
pub use error::{VfsError, VfsResult};
pub use ops::VfsOps;
pub use types::{DirEntry, FileAttr, FileType};
pub use view::{DirNode, FileNode, Node, ViewFs};
