//! # roffs-kernel
//!
//! Rule evaluation and filtered directory views for roffs.
//!
//! A source directory is exposed read-only. For every directory it
//! contains, each configured rule (filter, optional sort, optional limit)
//! selects some entries from a fresh snapshot, and the entries selected
//! by at least one rule are the ones visible. Nothing about visibility is
//! remembered between requests.
//!
//! - [`expr`] compiles filter expressions against the entry schema
//! - [`rules`] parses rule pipelines and composes visibility
//! - [`vfs`] serves the filtered view over a local directory

pub mod expr;
pub mod rules;
pub mod vfs;

pub use expr::{CompileError, EvalError, Predicate, PredicateCompiler, RhaiCompiler};
pub use rules::{EntryRecord, Rule, RuleError, RuleResult, RuleSet, RuleSource, Visibility};
pub use vfs::{
    backends::LocalBackend, DirEntry, DirNode, FileAttr, FileNode, FileType, Node, VfsError,
    VfsOps, VfsResult, ViewFs,
};
