//! Rhai-backed filter expressions.
//!
//! Filters are compiled with `compile_expression`, so statements,
//! assignments and function definitions are rejected at load time. Strict
//! variables mode turns any reference outside the field schema into a
//! compile error as well.
//!
//! # Example
//!
//! ```
//! use roffs_kernel::expr::{PredicateCompiler, RhaiCompiler};
//! use roffs_kernel::rules::EntryRecord;
//!
//! let compiler = RhaiCompiler::new();
//! let logs = compiler.compile(r#"ext == ".log" && size > 1000"#).unwrap();
//! assert_eq!(logs.evaluate(&EntryRecord::file("app.log", 4096)), Ok(true));
//! assert!(compiler.compile("owner == \"root\"").is_err());
//! ```

use rhai::{Dynamic, Engine, ImmutableString, Scope, AST};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use super::{CompileError, EvalError, Predicate, PredicateCompiler};
use crate::rules::EntryRecord;

/// Compiles filter expressions with a shared, sandboxed Rhai engine.
#[derive(Clone)]
pub struct RhaiCompiler {
    engine: Arc<Engine>,
}

impl Default for RhaiCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RhaiCompiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RhaiCompiler").finish_non_exhaustive()
    }
}

impl RhaiCompiler {
    pub fn new() -> Self {
        Self {
            engine: Arc::new(Self::create_engine()),
        }
    }

    /// Create a configured Rhai engine.
    fn create_engine() -> Engine {
        let mut engine = Engine::new();

        engine.set_strict_variables(true);

        // Filters run inside the daemon; stdout is not theirs to write to.
        engine.on_print(|text| debug!(target: "roffs_kernel::expr", "filter print: {}", text));
        engine.on_debug(|text, _source, pos| {
            debug!(target: "roffs_kernel::expr", %pos, "filter debug: {}", text)
        });

        // Filters run once per entry per listing; keep each run cheap.
        engine.set_max_expr_depths(64, 64);
        engine.set_max_operations(10_000);
        engine.set_max_string_size(64 * 1024);
        engine.set_max_array_size(1_000);
        engine.set_max_map_size(1_000);

        engine
    }

    /// Scope binding the four schema fields.
    ///
    /// Pushed as plain variables rather than constants: constants would be
    /// folded into the AST at compile time.
    fn bind(entry: &EntryRecord) -> Scope<'static> {
        let mut scope = Scope::new();
        scope.push("name", ImmutableString::from(entry.name.as_str()));
        scope.push("size", i64::try_from(entry.size).unwrap_or(i64::MAX));
        scope.push("ext", ImmutableString::from(entry.ext.as_str()));
        scope.push("isDir", entry.is_dir);
        scope
    }
}

impl PredicateCompiler for RhaiCompiler {
    fn compile(&self, source: &str) -> Result<Arc<dyn Predicate>, CompileError> {
        let source = source.trim();
        if source.is_empty() {
            return Err(CompileError::Empty);
        }

        let schema = Self::bind(&EntryRecord::file("", 0));
        let ast = self
            .engine
            .compile_expression_with_scope(&schema, source)
            .map_err(|e| CompileError::invalid(e.to_string()))?;

        Ok(Arc::new(RhaiPredicate {
            engine: Arc::clone(&self.engine),
            ast,
            source: source.to_string(),
        }))
    }
}

/// One compiled filter expression.
pub struct RhaiPredicate {
    engine: Arc<Engine>,
    ast: AST,
    source: String,
}

impl fmt::Debug for RhaiPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RhaiPredicate")
            .field("source", &self.source)
            .finish()
    }
}

impl Predicate for RhaiPredicate {
    fn source(&self) -> &str {
        &self.source
    }

    fn evaluate(&self, entry: &EntryRecord) -> Result<bool, EvalError> {
        let mut scope = RhaiCompiler::bind(entry);
        let value: Dynamic = self
            .engine
            .eval_ast_with_scope(&mut scope, &self.ast)
            .map_err(|e| EvalError::Runtime(e.to_string()))?;

        value
            .as_bool()
            .map_err(|type_name| EvalError::NotBoolean(type_name.to_string()))
    }
}
