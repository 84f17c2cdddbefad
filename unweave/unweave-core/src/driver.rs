//! Per-file pipeline: parse, strip instrumentation, print, tidy imports.

use std::fmt;
use std::io::{Cursor, Read};

use tracing::{debug, debug_span, trace, warn};
use unweave_syntax::{Block, Emit, Expr, GoParser, SourceEditor, StmtKind};

use crate::config::EngineConfig;
use crate::error::{Result, UninstrumentError};
use crate::markers::count_markers;
use crate::region::remove_regions;
use crate::report::Report;
use crate::rules::{
    RuleApplier, RuleContext, StatementRule, UnwrapRule, default_statement_rules,
    default_unwrap_rules, remove_statements,
};
use crate::span::remove_spans;

/// Where a declaration (or, for `Serialized`, the file) is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Parsed,
    RegionsRemoved,
    SpansRemoved,
    NestedWalked,
    Serialized,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Parsed => "parsed",
            Stage::RegionsRemoved => "regions-removed",
            Stage::SpansRemoved => "spans-removed",
            Stage::NestedWalked => "nested-walked",
            Stage::Serialized => "serialized",
        };
        f.write_str(name)
    }
}

/// Rewritten source plus what was done to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uninstrumented {
    pub source: String,
    pub report: Report,
}

impl Uninstrumented {
    pub fn into_reader(self) -> Cursor<Vec<u8>> {
        Cursor::new(self.source.into_bytes())
    }
}

/// Removes instrumentation from Go files.
///
/// Holds no per-file state, so one instance can serve many threads.
pub struct Uninstrumenter {
    config: EngineConfig,
    unwrap_rules: Vec<Box<dyn UnwrapRule>>,
    statement_rules: Vec<Box<dyn StatementRule>>,
}

impl Default for Uninstrumenter {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl fmt::Debug for Uninstrumenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unwrap: Vec<_> = self.unwrap_rules.iter().map(|r| r.name()).collect();
        let statements: Vec<_> = self.statement_rules.iter().map(|r| r.name()).collect();
        f.debug_struct("Uninstrumenter")
            .field("config", &self.config)
            .field("unwrap_rules", &unwrap)
            .field("statement_rules", &statements)
            .finish()
    }
}

impl Uninstrumenter {
    /// Engine with the default rule sets.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            unwrap_rules: default_unwrap_rules(),
            statement_rules: default_statement_rules(),
        }
    }

    pub fn builder() -> UninstrumenterBuilder {
        UninstrumenterBuilder::default()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Uninstrument `source`. `name` is only used in errors and logs.
    pub fn uninstrument_source(&self, name: &str, source: &str) -> Result<Uninstrumented> {
        let _span = debug_span!("uninstrument", file = name).entered();

        let mut parser = GoParser::new().map_err(|e| UninstrumentError::parse(name, e))?;
        let mut file = parser
            .parse_file(source)
            .map_err(|e| UninstrumentError::parse(name, e))?;
        trace!(stage = %Stage::Parsed, "stage reached");

        let imports = file.imports.clone();
        let ctx = RuleContext::new(&imports, &self.config.instrument_packages);
        let mut report = Report::new(name);

        for decl in file.funcs_mut() {
            let Some(body) = decl.body.as_mut() else {
                continue;
            };
            let _decl = debug_span!("decl", name = decl.name.as_str()).entered();
            self.process_body(body, &ctx, &mut report);
            report.markers_left += count_markers(body);
        }

        let printed = file.to_source();
        trace!(stage = %Stage::Serialized, "stage reached");

        let source = self.finish(name, printed, &mut report)?;
        debug!(
            regions = report.regions,
            spans = report.spans,
            unwrapped = report.total_unwrapped(),
            statements = report.total_statements_removed(),
            "uninstrumented"
        );
        Ok(Uninstrumented { source, report })
    }

    /// Read a whole file from `reader` and return the rewritten text as a
    /// reader.
    pub fn uninstrument_reader<R: Read>(&self, name: &str, mut reader: R) -> Result<Cursor<Vec<u8>>> {
        let mut source = String::new();
        reader
            .read_to_string(&mut source)
            .map_err(|e| UninstrumentError::io(name, e))?;
        Ok(self.uninstrument_source(name, &source)?.into_reader())
    }

    fn process_body(&self, body: &mut Block, ctx: &RuleContext<'_>, report: &mut Report) {
        self.strip_block(body, ctx, report);

        for closure in closure_bodies(body) {
            self.strip_block(closure, ctx, report);
            report.closures_walked += 1;
        }
        trace!(stage = %Stage::NestedWalked, "stage reached");
    }

    /// Regions, then spans. Statement and unwrap rules only see the
    /// statements of removed regions.
    fn strip_block(&self, block: &mut Block, ctx: &RuleContext<'_>, report: &mut Report) {
        let mut applier = RuleApplier::new(&self.unwrap_rules, *ctx);
        let regions = remove_regions(block, |region| {
            let removed = remove_statements(region, &self.statement_rules, ctx);
            report.add_statements_removed(&removed);
            applier.apply(region);
        });
        report.regions += regions;
        report.add_unwrapped(&applier.applied);
        trace!(stage = %Stage::RegionsRemoved, "stage reached");

        let spans = remove_spans(block);
        report.spans += spans.spans;
        report.tags_stripped += spans.tags;
        trace!(stage = %Stage::SpansRemoved, "stage reached");
    }

    fn finish(&self, name: &str, printed: String, report: &mut Report) -> Result<String> {
        let prune = self.config.prune_imports && !report.is_clean();
        if !prune && !self.config.validate_output {
            return Ok(printed);
        }

        let mut editor = SourceEditor::new(printed).map_err(|e| UninstrumentError::serialize(name, e))?;
        if prune {
            report.imports_pruned = editor
                .prune_unused_imports(&self.config.instrument_packages)
                .map_err(|e| UninstrumentError::serialize(name, e))?;
        }
        if self.config.validate_output {
            if let Some(err) = editor.first_error() {
                warn!(file = name, error = %err, "rewritten source no longer parses");
                return Err(UninstrumentError::serialize(name, err));
            }
        }
        Ok(editor.into_source())
    }
}

/// Bodies of the function literals directly inside `block`: values of
/// key/value elements of an assigned composite literal, an assigned function
/// literal, and a function literal called as a statement.
///
/// Function literals nested inside those are not included.
fn closure_bodies(block: &mut Block) -> Vec<&mut Block> {
    let mut out = Vec::new();
    for stmt in &mut block.stmts {
        match &mut stmt.kind {
            StmtKind::Assign(assign) => {
                for rhs in &mut assign.rhs {
                    match rhs {
                        Expr::CompositeLit(lit) => {
                            for elt in &mut lit.elts {
                                if let Expr::KeyValue(kv) = elt {
                                    if let Expr::FuncLit(func) = kv.value.as_mut() {
                                        out.push(&mut func.body);
                                    }
                                }
                            }
                        }
                        Expr::FuncLit(func) => out.push(&mut func.body),
                        _ => {}
                    }
                }
            }
            StmtKind::Expr(expr) => {
                if let Expr::Call(call) = &mut expr.x {
                    if let Expr::FuncLit(func) = call.fun.as_mut() {
                        out.push(&mut func.body);
                    }
                }
            }
            StmtKind::Return(_) | StmtKind::Other(_) => {}
        }
    }
    out
}

/// Builder for [`Uninstrumenter`]
#[derive(Default)]
pub struct UninstrumenterBuilder {
    config: EngineConfig,
    unwrap_rules: Option<Vec<Box<dyn UnwrapRule>>>,
    statement_rules: Option<Vec<Box<dyn StatementRule>>>,
}

impl UninstrumenterBuilder {
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the unwrap rules.
    pub fn unwrap_rules(mut self, rules: Vec<Box<dyn UnwrapRule>>) -> Self {
        self.unwrap_rules = Some(rules);
        self
    }

    /// Append an unwrap rule, after the defaults unless they were replaced.
    pub fn add_unwrap_rule(mut self, rule: impl UnwrapRule + 'static) -> Self {
        self.unwrap_rules
            .get_or_insert_with(default_unwrap_rules)
            .push(Box::new(rule));
        self
    }

    /// Replace the statement rules.
    pub fn statement_rules(mut self, rules: Vec<Box<dyn StatementRule>>) -> Self {
        self.statement_rules = Some(rules);
        self
    }

    /// Append a statement rule, after the defaults unless they were replaced.
    pub fn add_statement_rule(mut self, rule: impl StatementRule + 'static) -> Self {
        self.statement_rules
            .get_or_insert_with(default_statement_rules)
            .push(Box::new(rule));
        self
    }

    /// Validate the configuration and build the engine.
    pub fn build(self) -> Result<Uninstrumenter> {
        self.config.validate()?;
        Ok(Uninstrumenter {
            config: self.config,
            unwrap_rules: self.unwrap_rules.unwrap_or_else(default_unwrap_rules),
            statement_rules: self.statement_rules.unwrap_or_else(default_statement_rules),
        })
    }
}

/// Uninstrument one file read from `reader` with `config`.
pub fn uninstrument_file<R: Read>(name: &str, reader: R, config: &EngineConfig) -> Result<Cursor<Vec<u8>>> {
    Uninstrumenter::new(config.clone()).uninstrument_reader(name, reader)
}
