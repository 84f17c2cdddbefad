//! The wrapper shapes the instrumentation pass produces, and their undoing.
//!
//! | rule | node | shape |
//! |---|---|---|
//! | `client` | assignment | `c := instrument.WrapHTTPClient(orig)` |
//! | `handler-expr` | expression statement | `mux.Handle(p, instrument.WrapHandler(orig))` |
//! | `handler-assign` | assignment | `h = instrument.WrapHandler(orig)`, `&http.Server{Handler: instrument.WrapHandler(orig)}` |
//! | `sql-expr` | expression statement | `instrument.WrapSQLDB(orig)`, `f(instrument.WrapSQLDriver(orig))` |
//! | `sql-assign` | assignment | `db := instrument.WrapSQLDB(orig)` |
//! | `sql-return` | return | `return instrument.WrapSQLDB(orig), nil` |
//! | `grpc` | any expression | `instrument.WrapGRPCClientConn(orig)` |

use unweave_syntax::{AssignStmt, CompositeLit, Expr, StmtKind};

use super::{NodeMut, RuleContext, UnwrapRule};

const HTTP_CLIENT: &[&str] = &["WrapHTTPClient"];
const HANDLER: &[&str] = &["WrapHandler"];
const HANDLER_FUNC: &[&str] = &["WrapHandlerFunc"];
const HANDLERS: &[&str] = &["WrapHandler", "WrapHandlerFunc"];
const SQL: &[&str] = &["WrapSQLDB", "WrapSQLDriver"];
const GRPC: &[&str] = &["WrapGRPCClientConn"];

fn unwrap_all<'a>(slots: impl IntoIterator<Item = &'a mut Expr>, names: &[&str], ctx: &RuleContext<'_>) -> bool {
    let mut changed = false;
    for slot in slots {
        changed |= ctx.unwrap_slot(slot, names);
    }
    changed
}

fn assign(node: NodeMut<'_>) -> Option<&mut AssignStmt> {
    match node {
        NodeMut::Stmt(StmtKind::Assign(stmt)) => Some(stmt),
        _ => None,
    }
}

/// `c := instrument.WrapHTTPClient(orig)`
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientRule;

impl UnwrapRule for ClientRule {
    fn name(&self) -> &'static str {
        "client"
    }

    fn try_apply(&self, node: NodeMut<'_>, ctx: &RuleContext<'_>) -> bool {
        assign(node).is_some_and(|stmt| unwrap_all(&mut stmt.rhs, HTTP_CLIENT, ctx))
    }
}

/// `mux.Handle(p, instrument.WrapHandler(orig))` and the `HandleFunc` /
/// `WrapHandlerFunc` pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct HandlerExprRule;

impl UnwrapRule for HandlerExprRule {
    fn name(&self) -> &'static str {
        "handler-expr"
    }

    fn try_apply(&self, node: NodeMut<'_>, ctx: &RuleContext<'_>) -> bool {
        let NodeMut::Stmt(StmtKind::Expr(stmt)) = node else {
            return false;
        };
        let Expr::Call(call) = &mut stmt.x else {
            return false;
        };
        let names = match call.fun.as_selector().map(|sel| sel.sel.name.as_str()) {
            Some("Handle") => HANDLER,
            Some("HandleFunc") => HANDLER_FUNC,
            _ => return false,
        };
        match call.args.as_mut_slice() {
            [_, handler] => ctx.unwrap_slot(handler, names),
            _ => false,
        }
    }
}

/// A handler wrapper on the right of an assignment, directly or as the
/// `Handler` field of a (possibly address-taken) composite literal.
#[derive(Debug, Clone, Copy, Default)]
pub struct HandlerAssignRule;

impl HandlerAssignRule {
    fn handler_field(expr: &mut Expr, ctx: &RuleContext<'_>) -> bool {
        let Some(lit) = composite_lit(expr) else {
            return false;
        };
        let mut changed = false;
        for elt in &mut lit.elts {
            if let Expr::KeyValue(kv) = elt {
                if kv.key.as_ident() == Some("Handler") {
                    changed |= ctx.unwrap_slot(&mut kv.value, HANDLERS);
                }
            }
        }
        changed
    }
}

/// `T{...}` or `&T{...}`.
fn composite_lit(expr: &mut Expr) -> Option<&mut CompositeLit> {
    match expr {
        Expr::CompositeLit(lit) => Some(lit),
        Expr::Other(other)
            if other.kind == "unary_expression" && other.layout.gap(0).trim() == "&" =>
        {
            match other.children.as_mut_slice() {
                [Expr::CompositeLit(lit)] => Some(lit),
                _ => None,
            }
        }
        _ => None,
    }
}

impl UnwrapRule for HandlerAssignRule {
    fn name(&self) -> &'static str {
        "handler-assign"
    }

    fn try_apply(&self, node: NodeMut<'_>, ctx: &RuleContext<'_>) -> bool {
        let Some(stmt) = assign(node) else {
            return false;
        };
        let mut changed = false;
        for rhs in &mut stmt.rhs {
            changed |= ctx.unwrap_slot(rhs, HANDLERS) || Self::handler_field(rhs, ctx);
        }
        changed
    }
}

/// A SQL wrapper as an expression statement, or as one of its arguments.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlExprRule;

impl UnwrapRule for SqlExprRule {
    fn name(&self) -> &'static str {
        "sql-expr"
    }

    fn try_apply(&self, node: NodeMut<'_>, ctx: &RuleContext<'_>) -> bool {
        let NodeMut::Stmt(StmtKind::Expr(stmt)) = node else {
            return false;
        };
        if ctx.unwrap_slot(&mut stmt.x, SQL) {
            return true;
        }
        match &mut stmt.x {
            Expr::Call(call) => unwrap_all(&mut call.args, SQL, ctx),
            _ => false,
        }
    }
}

/// `db := instrument.WrapSQLDB(orig)`
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlAssignRule;

impl UnwrapRule for SqlAssignRule {
    fn name(&self) -> &'static str {
        "sql-assign"
    }

    fn try_apply(&self, node: NodeMut<'_>, ctx: &RuleContext<'_>) -> bool {
        assign(node).is_some_and(|stmt| unwrap_all(&mut stmt.rhs, SQL, ctx))
    }
}

/// `return instrument.WrapSQLDB(orig), err`
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlReturnRule;

impl UnwrapRule for SqlReturnRule {
    fn name(&self) -> &'static str {
        "sql-return"
    }

    fn try_apply(&self, node: NodeMut<'_>, ctx: &RuleContext<'_>) -> bool {
        match node {
            NodeMut::Stmt(StmtKind::Return(stmt)) => unwrap_all(&mut stmt.results, SQL, ctx),
            _ => false,
        }
    }
}

/// `instrument.WrapGRPCClientConn(orig)` anywhere in an expression.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrpcRule;

impl UnwrapRule for GrpcRule {
    fn name(&self) -> &'static str {
        "grpc"
    }

    fn try_apply(&self, node: NodeMut<'_>, ctx: &RuleContext<'_>) -> bool {
        match node {
            NodeMut::Expr(expr) => ctx.unwrap_slot(expr, GRPC),
            NodeMut::Stmt(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::super::test_support::*;
    use super::super::{RuleApplier, default_unwrap_rules};
    use super::*;
    use unweave_syntax::Emit;

    const IMPORTS: &str = "import (\n\t\"database/sql\"\n\t\"net/http\"\n\n\t\"github.com/datadog/orchestrion/instrument\"\n)\n";

    fn unwrap(stmts: &str) -> (String, BTreeMap<&'static str, usize>) {
        unwrap_with(IMPORTS, stmts)
    }

    fn unwrap_with(imports: &str, stmts: &str) -> (String, BTreeMap<&'static str, usize>) {
        let (mut file, _) = parse_body(imports, stmts);
        let table = file.imports.clone();
        let packages = packages();
        let rules = default_unwrap_rules();
        let mut applier = RuleApplier::new(&rules, RuleContext::new(&table, &packages));
        applier.apply(&mut body_mut(&mut file).stmts);
        let out = body_mut(&mut file).to_source();
        let inner = out
            .strip_prefix("{\n")
            .and_then(|s| s.strip_suffix("}"))
            .unwrap_or(&out)
            .to_string();
        (inner, applier.applied)
    }

    fn only(rule: &'static str) -> BTreeMap<&'static str, usize> {
        BTreeMap::from([(rule, 1)])
    }

    #[test]
    fn test_client() {
        let (out, applied) = unwrap("\tclient := instrument.WrapHTTPClient(&http.Client{Timeout: t})\n");
        assert_eq!(out, "\tclient := &http.Client{Timeout: t}\n");
        assert_eq!(applied, only("client"));
    }

    #[test]
    fn test_handler_expr() {
        let (out, applied) = unwrap(
            "\thttp.Handle(\"/\", instrument.WrapHandler(h))\n\tmux.HandleFunc(\"/x\", instrument.WrapHandlerFunc(func(w http.ResponseWriter, r *http.Request) {}))\n",
        );
        assert_eq!(
            out,
            "\thttp.Handle(\"/\", h)\n\tmux.HandleFunc(\"/x\", func(w http.ResponseWriter, r *http.Request) {})\n"
        );
        assert_eq!(applied, BTreeMap::from([("handler-expr", 2)]));
    }

    #[test]
    fn test_handler_expr_needs_matching_pair() {
        let source = "\thttp.Handle(\"/\", instrument.WrapHandlerFunc(h))\n";
        let (out, applied) = unwrap(source);
        assert_eq!(out, source);
        assert!(applied.is_empty());
    }

    #[test]
    fn test_handler_assign() {
        let (out, applied) = unwrap("\tvar_h = instrument.WrapHandler(mux)\n");
        assert_eq!(out, "\tvar_h = mux\n");
        assert_eq!(applied, only("handler-assign"));
    }

    #[test]
    fn test_handler_assign_struct_field() {
        let (out, applied) = unwrap(
            "\tsrv := &http.Server{\n\t\tAddr:    \":8080\",\n\t\tHandler: instrument.WrapHandler(mux),\n\t}\n",
        );
        assert_eq!(
            out,
            "\tsrv := &http.Server{\n\t\tAddr:    \":8080\",\n\t\tHandler: mux,\n\t}\n"
        );
        assert_eq!(applied, only("handler-assign"));
    }

    #[test]
    fn test_sql_expr() {
        let (out, applied) = unwrap(
            "\tsql.Register(\"pg\", instrument.WrapSQLDriver(&pq.Driver{}))\n\tinstrument.WrapSQLDB(db)\n",
        );
        assert_eq!(out, "\tsql.Register(\"pg\", &pq.Driver{})\n\tdb\n");
        assert_eq!(applied, BTreeMap::from([("sql-expr", 2)]));
    }

    #[test]
    fn test_sql_assign() {
        let (out, applied) = unwrap("\tdb, err := instrument.WrapSQLDB(sql.Open(\"pg\", dsn)), nil\n");
        assert_eq!(out, "\tdb, err := sql.Open(\"pg\", dsn), nil\n");
        assert_eq!(applied, only("sql-assign"));
    }

    #[test]
    fn test_sql_return() {
        let (out, applied) = unwrap("\treturn instrument.WrapSQLDB(db), nil\n");
        assert_eq!(out, "\treturn db, nil\n");
        assert_eq!(applied, only("sql-return"));
    }

    #[test]
    fn test_grpc_anywhere() {
        let (out, applied) = unwrap("\tdial(instrument.WrapGRPCClientConn(opts(a, b)))\n");
        assert_eq!(out, "\tdial(opts(a, b))\n");
        assert_eq!(applied, only("grpc"));
    }

    #[test]
    fn test_aliased_import() {
        let imports = "import (\n\tdd \"github.com/datadog/orchestrion/instrument\"\n)\n";
        let (out, applied) = unwrap_with(imports, "\tc := dd.WrapHTTPClient(orig)\n");
        assert_eq!(out, "\tc := orig\n");
        assert_eq!(applied, only("client"));

        let (out, applied) = unwrap_with(imports, "\tc := instrument.WrapHTTPClient(orig)\n");
        assert_eq!(out, "\tc := instrument.WrapHTTPClient(orig)\n");
        assert!(applied.is_empty());
    }

    #[test]
    fn test_wrapper_with_two_arguments_is_left_alone() {
        let source = "\tdb := instrument.WrapSQLDB(db, opts)\n";
        let (out, applied) = unwrap(source);
        assert_eq!(out, source);
        assert!(applied.is_empty());
    }
}
