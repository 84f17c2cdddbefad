//! Statements the instrumentation pass adds outright.

use std::collections::BTreeMap;

use tracing::debug;
use unweave_syntax::{Stmt, StmtKind};

use super::{RuleContext, StatementRule};

/// `router.Use(instrument.XMiddleware(...))` for one web framework.
///
/// The call must have exactly one argument: either a call whose callee is
/// the middleware constructor, or a bare reference to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UseMiddlewareRule {
    name: &'static str,
    middleware: &'static str,
}

impl UseMiddlewareRule {
    pub const fn new(name: &'static str, middleware: &'static str) -> Self {
        Self { name, middleware }
    }

    pub const fn gin() -> Self {
        Self::new("gin", "GinMiddleware")
    }

    pub const fn echo_v4() -> Self {
        Self::new("echo-v4", "EchoV4Middleware")
    }

    pub const fn chi_v5() -> Self {
        Self::new("chi-v5", "ChiV5Middleware")
    }
}

impl StatementRule for UseMiddlewareRule {
    fn name(&self) -> &'static str {
        self.name
    }

    fn matches(&self, stmt: &Stmt, ctx: &RuleContext<'_>) -> bool {
        let StmtKind::Expr(stmt) = &stmt.kind else {
            return false;
        };
        let Some(call) = stmt.x.as_call() else {
            return false;
        };
        let is_use = call
            .fun
            .as_selector()
            .is_some_and(|sel| sel.sel.name == "Use");
        let [arg] = call.args.as_slice() else {
            return false;
        };
        let target = arg.as_call().map(|c| c.fun.as_ref()).unwrap_or(arg);
        is_use && ctx.is_instrument_ref(target, &[self.middleware])
    }
}

/// Delete the statements of `stmts` matched by any of `rules`, returning
/// counts per rule name.
///
/// The driver hands this the statements of each removed region.
pub fn remove_statements(
    stmts: &mut Vec<Stmt>,
    rules: &[Box<dyn StatementRule>],
    ctx: &RuleContext<'_>,
) -> BTreeMap<&'static str, usize> {
    let mut removed = BTreeMap::new();
    stmts.retain(|stmt| match rules.iter().find(|rule| rule.matches(stmt, ctx)) {
        Some(rule) => {
            debug!(rule = rule.name(), line = stmt.line, "removing inserted statement");
            *removed.entry(rule.name()).or_default() += 1;
            false
        }
        None => true,
    });
    removed
}
