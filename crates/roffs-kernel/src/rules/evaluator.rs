//! Applying one rule to one directory snapshot.
//!
//! Filter, then stable sort, then truncate. Evaluation never fails as a
//! whole: an entry whose predicate errors is counted and left out.

use std::cmp::Ordering;

use super::entry::EntryRecord;
use super::rule::{Rule, SortKey, SortOrder};
use crate::expr::{EvalError, Predicate};

/// How one entry fared against one rule's filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Matched,
    Excluded,
    Errored(EvalError),
}

impl Outcome {
    /// Run `predicate` on `entry` and classify the result.
    pub fn of(predicate: &dyn Predicate, entry: &EntryRecord) -> Self {
        match predicate.evaluate(entry) {
            Ok(true) => Outcome::Matched,
            Ok(false) => Outcome::Excluded,
            Err(e) => Outcome::Errored(e),
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, Outcome::Matched)
    }
}

/// Result of evaluating one rule over a snapshot.
#[derive(Debug, Default)]
pub struct Selection<'a> {
    /// Surviving entries, in sorted and truncated order.
    pub entries: Vec<&'a EntryRecord>,
    /// How many entries passed the filter before the limit applied.
    pub matched: usize,
    /// How many entries errored during filtering.
    pub errored: usize,
    /// The first error seen, with the entry name it happened on.
    pub first_error: Option<(String, EvalError)>,
}

impl Selection<'_> {
    /// Names of the surviving entries, in order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }
}

/// Evaluate `rule` against `entries`.
pub fn evaluate<'a>(rule: &Rule, entries: &'a [EntryRecord]) -> Selection<'a> {
    let mut selection = Selection::default();

    for entry in entries {
        match Outcome::of(rule.predicate(), entry) {
            Outcome::Matched => selection.entries.push(entry),
            Outcome::Excluded => {}
            Outcome::Errored(err) => {
                selection.errored += 1;
                if selection.first_error.is_none() {
                    selection.first_error = Some((entry.name.clone(), err));
                }
            }
        }
    }
    selection.matched = selection.entries.len();

    sort_entries(&mut selection.entries, rule.sort_key(), rule.sort_order());

    if let Some(limit) = rule.limit() {
        selection.entries.truncate(limit);
    }

    selection
}

/// Stable sort; ties keep snapshot order in both directions.
fn sort_entries(entries: &mut [&EntryRecord], key: SortKey, order: SortOrder) {
    let compare: fn(&EntryRecord, &EntryRecord) -> Ordering = match key {
        SortKey::None => return,
        SortKey::Name => |a, b| a.name.as_bytes().cmp(b.name.as_bytes()),
        SortKey::Size => |a, b| a.size.cmp(&b.size),
    };

    match order {
        SortOrder::Ascending => entries.sort_by(|a, b| compare(a, b)),
        SortOrder::Descending => entries.sort_by(|a, b| compare(a, b).reverse()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{FnPredicate, PredicateCompiler, RhaiCompiler};
    use std::sync::Arc;

    fn rule(expr: &str) -> Rule {
        Rule::new(RhaiCompiler::new().compile(expr).unwrap())
    }

    fn sized(pairs: &[(&str, u64)]) -> Vec<EntryRecord> {
        pairs
            .iter()
            .map(|(name, size)| EntryRecord::file(*name, *size))
            .collect()
    }

    #[test]
    fn test_filter_by_extension() {
        let entries = sized(&[("a.txt", 1), ("b.md", 1), ("c.txt", 1)]);
        let selection = evaluate(&rule(r#"ext == ".txt""#), &entries);
        assert_eq!(selection.names(), ["a.txt", "c.txt"]);
        assert_eq!(selection.matched, 2);
    }

    #[test]
    fn test_sort_size_desc_with_limit() {
        let entries = sized(&[("a", 10), ("b", 30), ("c", 20)]);
        let r = rule("true").with_sort(SortKey::Size, SortOrder::Descending).with_limit(2);
        let selection = evaluate(&r, &entries);
        assert_eq!(selection.names(), ["b", "c"]);
        assert_eq!(selection.matched, 3);
    }

    #[test]
    fn test_sort_size_asc() {
        let entries = sized(&[("a", 10), ("b", 30), ("c", 20)]);
        let r = rule("true").with_sort(SortKey::Size, SortOrder::Ascending);
        assert_eq!(evaluate(&r, &entries).names(), ["a", "c", "b"]);
    }

    #[test]
    fn test_sort_name_is_bytewise() {
        let entries = sized(&[("b", 0), ("B", 0), ("a", 0), ("_", 0)]);
        let r = rule("true").with_sort(SortKey::Name, SortOrder::Ascending);
        assert_eq!(evaluate(&r, &entries).names(), ["B", "_", "a", "b"]);

        let r = rule("true").with_sort(SortKey::Name, SortOrder::Descending);
        assert_eq!(evaluate(&r, &entries).names(), ["b", "a", "_", "B"]);
    }

    #[test]
    fn test_stable_ties_both_directions() {
        let entries = sized(&[("x", 5), ("y", 9), ("z", 5), ("w", 5)]);

        let r = rule("true").with_sort(SortKey::Size, SortOrder::Ascending);
        assert_eq!(evaluate(&r, &entries).names(), ["x", "z", "w", "y"]);

        let r = rule("true").with_sort(SortKey::Size, SortOrder::Descending);
        assert_eq!(evaluate(&r, &entries).names(), ["y", "x", "z", "w"]);
    }

    #[test]
    fn test_no_sort_keeps_snapshot_order() {
        let entries = sized(&[("c", 3), ("a", 1), ("b", 2)]);
        let r = rule("true").with_limit(2);
        assert_eq!(evaluate(&r, &entries).names(), ["c", "a"]);
    }

    #[test]
    fn test_limit_never_exceeded() {
        let entries: Vec<_> = (0..50).map(|i| EntryRecord::file(format!("f{i}"), i)).collect();
        for limit in 1..=60 {
            let r = rule("size % 2 == 0").with_limit(limit);
            let selection = evaluate(&r, &entries);
            assert!(selection.entries.len() <= limit);
            assert_eq!(selection.entries.len(), limit.min(25));
        }
    }

    #[test]
    fn test_errors_exclude_and_count() {
        let predicate = Arc::new(FnPredicate::new("flaky", |e: &EntryRecord| {
            if e.name.starts_with("bad") {
                Err(EvalError::Runtime("boom".into()))
            } else {
                Ok(true)
            }
        }));
        let entries = sized(&[("bad1", 0), ("good", 0), ("bad2", 0)]);
        let selection = evaluate(&Rule::new(predicate), &entries);

        assert_eq!(selection.names(), ["good"]);
        assert_eq!(selection.errored, 2);
        let (name, err) = selection.first_error.unwrap();
        assert_eq!(name, "bad1");
        assert_eq!(err, EvalError::Runtime("boom".into()));
    }

    #[test]
    fn test_non_boolean_excludes() {
        let entries = sized(&[("a", 1)]);
        let selection = evaluate(&rule("size"), &entries);
        assert!(selection.entries.is_empty());
        assert_eq!(selection.errored, 1);
    }

    #[test]
    fn test_outcome_of() {
        let r = rule("size > 5");
        assert_eq!(Outcome::of(r.predicate(), &EntryRecord::file("a", 6)), Outcome::Matched);
        assert_eq!(Outcome::of(r.predicate(), &EntryRecord::file("a", 5)), Outcome::Excluded);
        assert!(Outcome::of(r.predicate(), &EntryRecord::file("a", 6)).is_match());
    }
}
