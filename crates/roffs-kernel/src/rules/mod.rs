//! Rule evaluation and visibility composition.
//!
//! A directory listing flows through this module as:
//!
//! 1. an [`EntryRecord`] snapshot of the real directory,
//! 2. [`evaluate`] once per [`Rule`] (filter, stable sort, limit),
//! 3. [`compose`] to OR the per-rule selections into a [`Visibility`].
//!
//! Rules come from pipeline text (see [`pipeline`]) via a [`RuleSet`].

mod composer;
mod entry;
mod error;
mod evaluator;
pub mod pipeline;
mod rule;
mod set;

pub use composer::{compose, RuleStats, Visibility};
pub use entry::{extension_of, EntryRecord};
pub use error::{RuleError, RuleResult};
pub use evaluator::{evaluate, Outcome, Selection};
pub use pipeline::{parse_pipeline, split_stages};
pub use rule::{Rule, SortKey, SortOrder};
pub use set::{RuleSet, RuleSource};
