//! Rule pipeline text → [`Rule`]s.
//!
//! ```text
//! filter ext == ".log" | sort size desc | limit 10
//! ```
//!
//! `filter` starts a new rule; `sort` and `limit` attach to the most
//! recent one. A single line may hold several `filter` stages and thus
//! several rules.

use super::error::{RuleError, RuleResult};
use super::rule::{Rule, SortKey, SortOrder};
use crate::expr::PredicateCompiler;

/// Split a pipeline on stage separators.
///
/// A `|` only separates stages outside string literals, and `||` is the
/// logical-or operator, never a separator.
pub fn split_stages(line: &str) -> Vec<&str> {
    let bytes = line.as_bytes();
    let mut stages = Vec::new();
    let mut start = 0;
    let mut quote: Option<u8> = None;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == b'\\' {
                    i += 1;
                } else if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'"' | b'\'' | b'`' => quote = Some(b),
                b'|' if bytes.get(i + 1) == Some(&b'|') => i += 1,
                b'|' => {
                    stages.push(&line[start..i]);
                    start = i + 1;
                }
                _ => {}
            },
        }
        i += 1;
    }
    stages.push(&line[start..]);

    stages
}

/// Parse one pipeline into the rules it defines.
pub fn parse_pipeline(line: &str, compiler: &dyn PredicateCompiler) -> RuleResult<Vec<Rule>> {
    let mut rules: Vec<Rule> = Vec::new();

    for stage in split_stages(line) {
        let stage = stage.trim();
        if stage.is_empty() {
            continue;
        }

        let (keyword, rest) = match stage.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword, rest.trim()),
            None => (stage, ""),
        };

        match keyword {
            "filter" => {
                let predicate = compiler.compile(rest).map_err(|error| RuleError::Compile {
                    source_text: rest.to_string(),
                    error,
                })?;
                rules.push(Rule::new(predicate));
            }
            "sort" => {
                let rule = rules
                    .last_mut()
                    .ok_or_else(|| RuleError::MissingFilter(stage.to_string()))?;
                let (key, order) = parse_sort(rest)
                    .ok_or_else(|| RuleError::InvalidSort(stage.to_string()))?;
                rule.sort_key = key;
                rule.sort_order = order;
            }
            "limit" => {
                let rule = rules
                    .last_mut()
                    .ok_or_else(|| RuleError::MissingFilter(stage.to_string()))?;
                rule.limit = rest
                    .parse::<usize>()
                    .map_err(|_| RuleError::InvalidLimit(rest.to_string()))?;
            }
            other => return Err(RuleError::UnknownStage(other.to_string())),
        }
    }

    if rules.is_empty() {
        return Err(RuleError::EmptyPipeline);
    }
    Ok(rules)
}

/// `<key> [order]`, order defaulting to ascending.
fn parse_sort(args: &str) -> Option<(SortKey, SortOrder)> {
    let mut parts = args.split_whitespace();
    let key = SortKey::from_str(parts.next()?)?;
    let order = match parts.next() {
        Some(order) => SortOrder::from_str(order)?,
        None => SortOrder::Ascending,
    };
    if parts.next().is_some() {
        return None;
    }
    Some((key, order))
}
