//! Filter expressions.
//!
//! The rule engine only needs two things from an expression language:
//! compile a source string once against a fixed field schema, and run the
//! compiled program against one [`EntryRecord`] at a time. Those two steps
//! are the [`PredicateCompiler`] and [`Predicate`] traits. [`RhaiCompiler`]
//! is the implementation used by the binary.
//!
//! ## Field schema
//!
//! | field   | type    |
//! |---------|---------|
//! | `name`  | string  |
//! | `size`  | integer |
//! | `ext`   | string  |
//! | `isDir` | bool    |

mod rhai_engine;

pub use rhai_engine::RhaiCompiler;

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::rules::EntryRecord;

/// Names a filter expression may reference.
pub const FIELDS: [&str; 4] = ["name", "size", "ext", "isDir"];

/// Rejected at configuration load.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompileError {
    /// No expression text after `filter`.
    #[error("empty filter expression")]
    Empty,

    /// Syntax error, unknown field, or other parse failure.
    #[error("{message}")]
    Invalid { message: String },
}

impl CompileError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

/// Failure evaluating a compiled predicate against one entry.
///
/// Never fatal: the entry simply does not match.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EvalError {
    /// The program failed while running (type mismatch, missing
    /// function, operation limit...).
    #[error("evaluation failed: {0}")]
    Runtime(String),

    /// The program ran but produced something other than a bool.
    #[error("expected bool, got {0}")]
    NotBoolean(String),
}

/// A compiled boolean expression over an entry's fields.
pub trait Predicate: Send + Sync + fmt::Debug {
    /// The expression text this predicate was compiled from.
    fn source(&self) -> &str;

    /// Run against one entry.
    fn evaluate(&self, entry: &EntryRecord) -> Result<bool, EvalError>;
}

/// Compiles expression source into a [`Predicate`].
pub trait PredicateCompiler: Send + Sync {
    fn compile(&self, source: &str) -> Result<Arc<dyn Predicate>, CompileError>;
}

/// Predicate backed by a plain Rust closure.
///
/// Handy for tests and for callers that build rules programmatically.
pub struct FnPredicate<F> {
    label: String,
    f: F,
}

impl<F> FnPredicate<F>
where
    F: Fn(&EntryRecord) -> Result<bool, EvalError> + Send + Sync,
{
    pub fn new(label: impl Into<String>, f: F) -> Self {
        Self {
            label: label.into(),
            f,
        }
    }
}

impl<F> fmt::Debug for FnPredicate<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnPredicate")
            .field("label", &self.label)
            .finish()
    }
}

impl<F> Predicate for FnPredicate<F>
where
    F: Fn(&EntryRecord) -> Result<bool, EvalError> + Send + Sync,
{
    fn source(&self) -> &str {
        &self.label
    }

    fn evaluate(&self, entry: &EntryRecord) -> Result<bool, EvalError> {
        (self.f)(entry)
    }
}
