//! The configured rule set and where it comes from.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::composer::{compose, Visibility};
use super::entry::EntryRecord;
use super::error::{RuleError, RuleResult};
use super::pipeline::parse_pipeline;
use super::rule::Rule;
use crate::expr::PredicateCompiler;

/// Where rule pipelines are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleSource {
    /// A config file, one pipeline per line.
    File(PathBuf),
    /// Pipelines given on the command line.
    Inline(Vec<String>),
}

impl RuleSource {
    /// Pick the rule source from CLI input.
    ///
    /// Inline pipelines win over a config file when both are given.
    pub fn resolve(config: Option<PathBuf>, inline: Vec<String>) -> RuleResult<Self> {
        match (config, inline.is_empty()) {
            (Some(path), false) => {
                warn!(config = %path.display(), "inline rules override config file");
                Ok(Self::Inline(inline))
            }
            (None, false) => Ok(Self::Inline(inline)),
            (Some(path), true) => Ok(Self::File(path)),
            (None, true) => Err(RuleError::NoRules),
        }
    }
}

/// The ordered, immutable list of rules.
///
/// Safe to share across threads and read concurrently; composing a
/// visibility decision never mutates it.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Load and compile every rule from `source`.
    ///
    /// Either all rules compile or nothing is returned.
    pub fn load(source: &RuleSource, compiler: &dyn PredicateCompiler) -> RuleResult<Self> {
        match source {
            RuleSource::File(path) => Self::from_file(path, compiler),
            RuleSource::Inline(pipelines) => Self::from_pipelines(pipelines, compiler),
        }
    }

    /// Read a config file.
    pub fn from_file(path: &Path, compiler: &dyn PredicateCompiler) -> RuleResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|error| RuleError::Io {
            path: path.to_path_buf(),
            error,
        })?;
        Self::parse_config(&text, compiler).map_err(|e| match e {
            RuleError::NoRules => RuleError::NoRules,
            other => other.in_pipeline(path.display().to_string()),
        })
    }

    /// Parse config text: one pipeline per line, `#` comments, blank
    /// lines ignored.
    pub fn parse_config(text: &str, compiler: &dyn PredicateCompiler) -> RuleResult<Self> {
        let mut rules = Vec::new();
        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let parsed = parse_pipeline(line, compiler)
                .map_err(|e| e.in_pipeline(format!("line {}", index + 1)))?;
            debug!(line = index + 1, rules = parsed.len(), "parsed pipeline");
            rules.extend(parsed);
        }

        if rules.is_empty() {
            return Err(RuleError::NoRules);
        }
        Ok(Self { rules })
    }

    /// Parse inline pipelines, one rule pipeline per string.
    pub fn from_pipelines<S: AsRef<str>>(
        pipelines: &[S],
        compiler: &dyn PredicateCompiler,
    ) -> RuleResult<Self> {
        let mut rules = Vec::new();
        for (index, pipeline) in pipelines.iter().enumerate() {
            let parsed = parse_pipeline(pipeline.as_ref(), compiler)
                .map_err(|e| e.in_pipeline(format!("rule #{}", index + 1)))?;
            rules.extend(parsed);
        }

        if rules.is_empty() {
            return Err(RuleError::NoRules);
        }
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Visibility decision for one directory snapshot.
    pub fn compose(&self, entries: &[EntryRecord]) -> Visibility {
        compose(&self.rules, entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::RhaiCompiler;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_source() {
        let inline = vec!["filter true".to_string()];

        assert_eq!(
            RuleSource::resolve(None, inline.clone()).unwrap(),
            RuleSource::Inline(inline.clone())
        );
        assert_eq!(
            RuleSource::resolve(Some("r.conf".into()), vec![]).unwrap(),
            RuleSource::File("r.conf".into())
        );
        // Inline overrides the file.
        assert_eq!(
            RuleSource::resolve(Some("r.conf".into()), inline.clone()).unwrap(),
            RuleSource::Inline(inline)
        );
        assert!(matches!(
            RuleSource::resolve(None, vec![]),
            Err(RuleError::NoRules)
        ));
    }

    #[test]
    fn test_parse_config() {
        let text = r#"
# keep recent logs
filter ext == ".log" | sort size desc | limit 5

   # indented comment
filter isDir
"#;
        let set = RuleSet::parse_config(text, &RhaiCompiler::new()).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(
            set.rules()[0].to_string(),
            r#"filter ext == ".log" | sort size desc | limit 5"#
        );
        assert_eq!(set.rules()[1].to_string(), "filter isDir");
    }

    #[test]
    fn test_config_error_reports_line() {
        let text = "filter true\n\nfilter size >\n";
        let err = RuleSet::parse_config(text, &RhaiCompiler::new()).unwrap_err();
        assert!(err.to_string().starts_with("line 3: invalid filter"));
        assert!(matches!(err.root(), RuleError::Compile { .. }));
    }

    #[test]
    fn test_config_without_rules() {
        let err = RuleSet::parse_config("# nothing\n\n", &RhaiCompiler::new()).unwrap_err();
        assert!(matches!(err, RuleError::NoRules));
    }

    #[test]
    fn test_from_pipelines() {
        let compiler = RhaiCompiler::new();
        let set = RuleSet::from_pipelines(&["filter isDir", "filter size > 5 | limit 1"], &compiler)
            .unwrap();
        assert_eq!(set.len(), 2);

        let err = RuleSet::from_pipelines(&["filter true", "limit 3"], &compiler).unwrap_err();
        assert!(err.to_string().starts_with("rule #2:"));
        assert!(matches!(err.root(), RuleError::MissingFilter(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("roffs.conf");
        std::fs::write(&path, "filter ext == \".txt\"\n").unwrap();

        let set = RuleSet::load(&RuleSource::File(path), &RhaiCompiler::new()).unwrap();
        assert_eq!(set.len(), 1);

        let entries = vec![
            EntryRecord::file("a.txt", 1),
            EntryRecord::file("b.md", 1),
            EntryRecord::file("c.txt", 1),
        ];
        let visibility = set.compose(&entries);
        assert!(visibility.is_visible("a.txt"));
        assert!(!visibility.is_visible("b.md"));
        assert!(visibility.is_visible("c.txt"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let source = RuleSource::File(dir.path().join("absent.conf"));
        let err = RuleSet::load(&source, &RhaiCompiler::new()).unwrap_err();
        assert!(matches!(err, RuleError::Io { .. }));
    }

    #[test]
    fn test_file_error_names_file_and_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.conf");
        std::fs::write(&path, "filter true\nsort size\n").unwrap();

        let err = RuleSet::from_file(&path, &RhaiCompiler::new()).unwrap_err();
        let shown = err.to_string();
        assert!(shown.contains("bad.conf"));
        assert!(shown.contains("line 2"));
        assert!(matches!(err.root(), RuleError::MissingFilter(_)));
    }
}
