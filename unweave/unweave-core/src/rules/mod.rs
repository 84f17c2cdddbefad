//! Rewrite rules for instrumentation that has no statement boundary.
//!
//! Two kinds of rules exist:
//! - [`UnwrapRule`]s replace a wrapper call such as
//!   `instrument.WrapHandler(h)` with its original argument `h`.
//! - [`StatementRule`]s pick out whole statements the instrumentation pass
//!   inserted, such as `r.Use(instrument.GinMiddleware())`, for deletion.
//!
//! Both recognize the instrumentation package through the file's imports, so
//! an aliased import matches as well.

use std::collections::BTreeMap;

use tracing::debug;
use unweave_syntax::{Expr, ImportTable, Stmt, StmtKind, VisitMut, walk_expr_mut, walk_stmt_mut};

pub mod remove;
pub mod unwrap;

pub use remove::{UseMiddlewareRule, remove_statements};
pub use unwrap::{
    ClientRule, GrpcRule, HandlerAssignRule, HandlerExprRule, SqlAssignRule, SqlExprRule,
    SqlReturnRule,
};

/// A node an [`UnwrapRule`] may rewrite in place.
#[derive(Debug)]
pub enum NodeMut<'a> {
    Stmt(&'a mut StmtKind),
    Expr(&'a mut Expr),
}

impl NodeMut<'_> {
    /// Borrow the same node again for a shorter lifetime.
    pub fn reborrow(&mut self) -> NodeMut<'_> {
        match self {
            NodeMut::Stmt(stmt) => NodeMut::Stmt(&mut **stmt),
            NodeMut::Expr(expr) => NodeMut::Expr(&mut **expr),
        }
    }
}

/// What rules need to know about the file being rewritten.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    imports: &'a ImportTable,
    packages: &'a [String],
}

impl<'a> RuleContext<'a> {
    pub fn new(imports: &'a ImportTable, packages: &'a [String]) -> Self {
        Self { imports, packages }
    }

    /// Whether `expr` is `pkg.Name` with `pkg` an instrumentation package
    /// and `Name` one of `names`.
    pub fn is_instrument_ref(&self, expr: &Expr, names: &[&str]) -> bool {
        self.imports.resolve(expr).is_some_and(|q| {
            names.contains(&q.name) && self.packages.iter().any(|p| p == q.path)
        })
    }

    /// The single argument of `expr` when it is a call to one of `names`.
    pub fn wrapper_arg<'e>(&self, expr: &'e Expr, names: &[&str]) -> Option<&'e Expr> {
        let call = expr.as_call()?;
        match call.args.as_slice() {
            [arg] if self.is_instrument_ref(&call.fun, names) => Some(arg),
            _ => None,
        }
    }

    /// Replace `slot` with the wrapped argument if it is a call to one of
    /// `names`. The argument keeps its text exactly.
    pub fn unwrap_slot(&self, slot: &mut Expr, names: &[&str]) -> bool {
        if self.wrapper_arg(slot, names).is_none() {
            return false;
        }
        let Expr::Call(call) = slot else {
            return false;
        };
        let Some(inner) = call.args.pop() else {
            return false;
        };
        *slot = inner;
        true
    }
}

/// Rewrites one wrapper shape back to the original expression.
pub trait UnwrapRule: Send + Sync {
    /// Stable name, used in reports and logs.
    fn name(&self) -> &'static str;

    /// Rewrite `node` if it has this rule's shape. Returns whether it did.
    fn try_apply(&self, node: NodeMut<'_>, ctx: &RuleContext<'_>) -> bool;
}

/// Recognizes a statement inserted by the instrumentation pass.
pub trait StatementRule: Send + Sync {
    fn name(&self) -> &'static str;

    fn matches(&self, stmt: &Stmt, ctx: &RuleContext<'_>) -> bool;
}

/// Unwrap rules in the order they are tried.
pub fn default_unwrap_rules() -> Vec<Box<dyn UnwrapRule>> {
    vec![
        Box::new(ClientRule),
        Box::new(HandlerExprRule),
        Box::new(HandlerAssignRule),
        Box::new(SqlExprRule),
        Box::new(SqlAssignRule),
        Box::new(SqlReturnRule),
        Box::new(GrpcRule),
    ]
}

/// Statement rules in the order they are tried.
pub fn default_statement_rules() -> Vec<Box<dyn StatementRule>> {
    vec![
        Box::new(UseMiddlewareRule::gin()),
        Box::new(UseMiddlewareRule::echo_v4()),
        Box::new(UseMiddlewareRule::chi_v5()),
    ]
}

/// Runs unwrap rules over every statement and expression it visits.
///
/// At each node the rules are tried in order and the first that applies
/// wins; the walk then continues into the node as rewritten.
pub struct RuleApplier<'r> {
    rules: &'r [Box<dyn UnwrapRule>],
    ctx: RuleContext<'r>,
    /// Rewrites per rule name.
    pub applied: BTreeMap<&'static str, usize>,
}

impl<'r> RuleApplier<'r> {
    pub fn new(rules: &'r [Box<dyn UnwrapRule>], ctx: RuleContext<'r>) -> Self {
        Self {
            rules,
            ctx,
            applied: BTreeMap::new(),
        }
    }

    /// Apply the rules to each statement of `stmts` and everything below it.
    pub fn apply(&mut self, stmts: &mut [Stmt]) {
        for stmt in stmts {
            self.visit_stmt_mut(stmt);
        }
    }

    fn try_rules(&mut self, mut node: NodeMut<'_>) {
        for rule in self.rules {
            if rule.try_apply(node.reborrow(), &self.ctx) {
                debug!(rule = rule.name(), "unwrapped instrumentation call");
                *self.applied.entry(rule.name()).or_default() += 1;
                return;
            }
        }
    }
}

impl VisitMut for RuleApplier<'_> {
    fn visit_stmt_mut(&mut self, stmt: &mut Stmt) {
        self.try_rules(NodeMut::Stmt(&mut stmt.kind));
        walk_stmt_mut(self, stmt);
    }

    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        self.try_rules(NodeMut::Expr(expr));
        walk_expr_mut(self, expr);
    }
}
