//! Rule loading errors.

use std::path::PathBuf;
use thiserror::Error;

use crate::expr::CompileError;

/// Errors raised while turning pipeline text into a [`RuleSet`](super::RuleSet).
///
/// All of these are fatal at startup.
#[derive(Debug, Error)]
pub enum RuleError {
    /// The filter expression did not compile.
    #[error("invalid filter `{source_text}`: {error}")]
    Compile {
        source_text: String,
        #[source]
        error: CompileError,
    },

    /// A stage keyword other than filter/sort/limit.
    #[error("unknown stage `{0}` (expected filter, sort or limit)")]
    UnknownStage(String),

    /// `sort` or `limit` before any `filter`.
    #[error("`{0}` stage has no preceding filter")]
    MissingFilter(String),

    /// Bad sort arguments.
    #[error("invalid sort `{0}` (expected `sort <none|name|size> [asc|desc]`)")]
    InvalidSort(String),

    /// Bad limit argument.
    #[error("invalid limit `{0}` (expected a non-negative integer)")]
    InvalidLimit(String),

    /// A pipeline with no stages at all.
    #[error("empty rule pipeline")]
    EmptyPipeline,

    /// Neither a config file nor inline rules, or a config without rules.
    #[error("no rules defined")]
    NoRules,

    /// Wraps an error with where the pipeline came from.
    #[error("{origin}: {error}")]
    InPipeline {
        origin: String,
        #[source]
        error: Box<RuleError>,
    },

    /// Config file could not be read.
    #[error("failed to read {}: {error}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },
}

impl RuleError {
    /// Attach the pipeline's origin (file line, inline index).
    pub fn in_pipeline(self, origin: impl Into<String>) -> Self {
        Self::InPipeline {
            origin: origin.into(),
            error: Box::new(self),
        }
    }

    /// The innermost error, skipping origin wrappers.
    pub fn root(&self) -> &RuleError {
        match self {
            Self::InPipeline { error, .. } => error.root(),
            other => other,
        }
    }
}

/// Result type for rule loading.
pub type RuleResult<T> = Result<T, RuleError>;
