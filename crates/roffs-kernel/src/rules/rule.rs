//! A single compiled rule: filter, optional sort, optional limit.

use std::str::FromStr;
use std::sync::Arc;

use strum::EnumString;

use crate::expr::Predicate;

/// What a rule orders its matches by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum SortKey {
    /// Keep filter-pass (snapshot) order.
    #[default]
    None,
    /// Byte-wise name comparison.
    Name,
    /// Numeric size comparison.
    Size,
}

impl SortKey {
    /// Parse from string (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::None => "none",
            SortKey::Name => "name",
            SortKey::Size => "size",
        }
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sort direction. Meaningless when the key is [`SortKey::None`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum SortOrder {
    #[default]
    #[strum(serialize = "asc", serialize = "ascending")]
    Ascending,
    #[strum(serialize = "desc", serialize = "descending")]
    Descending,
}

impl SortOrder {
    /// Parse from string (case-insensitive).
    ///
    /// Supports aliases: "ascending", "descending".
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One independent visibility rule.
///
/// Immutable once loaded. Rules never chain: each one sees the full
/// directory snapshot.
#[derive(Clone, Debug)]
pub struct Rule {
    pub(crate) predicate: Arc<dyn Predicate>,
    pub(crate) sort_key: SortKey,
    pub(crate) sort_order: SortOrder,
    pub(crate) limit: usize,
}

impl Rule {
    /// A rule that only filters.
    pub fn new(predicate: Arc<dyn Predicate>) -> Self {
        Self {
            predicate,
            sort_key: SortKey::None,
            sort_order: SortOrder::Ascending,
            limit: 0,
        }
    }

    /// Set the sort key and direction.
    pub fn with_sort(mut self, key: SortKey, order: SortOrder) -> Self {
        self.sort_key = key;
        self.sort_order = order;
        self
    }

    /// Cap the result; 0 means unlimited.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn predicate(&self) -> &dyn Predicate {
        self.predicate.as_ref()
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    /// Result cap, or `None` when unlimited.
    pub fn limit(&self) -> Option<usize> {
        (self.limit > 0).then_some(self.limit)
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "filter {}", self.predicate.source())?;
        if self.sort_key != SortKey::None {
            write!(f, " | sort {} {}", self.sort_key, self.sort_order)?;
        }
        if let Some(limit) = self.limit() {
            write!(f, " | limit {}", limit)?;
        }
        Ok(())
    }
}
