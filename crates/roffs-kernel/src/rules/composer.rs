//! Union of every rule's selection into one visibility decision.
//!
//! [`compose`] is a pure function of the rules and the snapshot. Nothing is
//! remembered between calls, so a name visible in one directory says
//! nothing about a same-named entry elsewhere, or about this directory
//! after its contents change.

use std::collections::HashSet;

use tracing::debug;

use super::entry::EntryRecord;
use super::evaluator::evaluate;
use super::rule::Rule;

/// Per-rule counters from one composition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleStats {
    /// Entries that passed the filter.
    pub matched: usize,
    /// Entries contributed after sort and limit.
    pub selected: usize,
    /// Entries whose filter evaluation failed.
    pub errored: usize,
}

/// Which names in one directory snapshot are visible.
#[derive(Debug, Clone, Default)]
pub struct Visibility {
    visible: HashSet<String>,
    stats: Vec<RuleStats>,
}

impl Visibility {
    pub fn is_visible(&self, name: &str) -> bool {
        self.visible.contains(name)
    }

    /// Number of visible names.
    pub fn len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    /// Visible names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.visible.iter().map(String::as_str)
    }

    /// Counters for each rule, in rule order.
    pub fn rule_stats(&self) -> &[RuleStats] {
        &self.stats
    }

    /// Total filter evaluation failures across all rules.
    pub fn errored(&self) -> usize {
        self.stats.iter().map(|s| s.errored).sum()
    }

    /// Keep only the snapshot entries that are visible, in snapshot order.
    pub fn filter<'a>(
        &'a self,
        entries: &'a [EntryRecord],
    ) -> impl Iterator<Item = &'a EntryRecord> + 'a {
        entries.iter().filter(|e| self.is_visible(&e.name))
    }
}

/// Run every rule over `entries` and OR the results together.
///
/// A name is visible iff at least one rule's selection contains it.
/// Directories get no special treatment.
pub fn compose(rules: &[Rule], entries: &[EntryRecord]) -> Visibility {
    let mut visibility = Visibility {
        visible: HashSet::new(),
        stats: Vec::with_capacity(rules.len()),
    };

    for (index, rule) in rules.iter().enumerate() {
        let selection = evaluate(rule, entries);

        if let Some((name, err)) = &selection.first_error {
            debug!(
                rule = index,
                errored = selection.errored,
                first = %name,
                "filter evaluation failed: {}",
                err
            );
        }

        visibility.stats.push(RuleStats {
            matched: selection.matched,
            selected: selection.entries.len(),
            errored: selection.errored,
        });
        visibility
            .visible
            .extend(selection.entries.iter().map(|e| e.name.clone()));
    }

    visibility
}
