//! VFS backend implementations.

mod local;

pub use local::LocalBackend;
pub(crate) use local::check_component;
