//! Mutable traversal over statements and expressions.
//!
//! Implementors override the `visit_*` hooks they care about and call the
//! matching `walk_*` function to keep descending.

use crate::tree::*;

pub trait VisitMut {
    fn visit_block_mut(&mut self, block: &mut Block) {
        walk_block_mut(self, block);
    }

    fn visit_stmt_mut(&mut self, stmt: &mut Stmt) {
        walk_stmt_mut(self, stmt);
    }

    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        walk_expr_mut(self, expr);
    }
}

pub fn walk_block_mut<V: VisitMut + ?Sized>(v: &mut V, block: &mut Block) {
    for stmt in &mut block.stmts {
        v.visit_stmt_mut(stmt);
    }
}

pub fn walk_stmt_mut<V: VisitMut + ?Sized>(v: &mut V, stmt: &mut Stmt) {
    match &mut stmt.kind {
        StmtKind::Expr(s) => v.visit_expr_mut(&mut s.x),
        StmtKind::Assign(s) => {
            for expr in s.lhs.iter_mut().chain(s.rhs.iter_mut()) {
                v.visit_expr_mut(expr);
            }
        }
        StmtKind::Return(s) => {
            for expr in &mut s.results {
                v.visit_expr_mut(expr);
            }
        }
        StmtKind::Other(_) => {}
    }
}

pub fn walk_expr_mut<V: VisitMut + ?Sized>(v: &mut V, expr: &mut Expr) {
    match expr {
        Expr::Call(call) => {
            v.visit_expr_mut(&mut call.fun);
            for arg in &mut call.args {
                v.visit_expr_mut(arg);
            }
        }
        Expr::CompositeLit(lit) => {
            if let Some(typ) = &mut lit.typ {
                v.visit_expr_mut(typ);
            }
            for elt in &mut lit.elts {
                v.visit_expr_mut(elt);
            }
        }
        Expr::KeyValue(kv) => {
            v.visit_expr_mut(&mut kv.key);
            v.visit_expr_mut(&mut kv.value);
        }
        Expr::FuncLit(lit) => v.visit_block_mut(&mut lit.body),
        Expr::Selector(sel) => v.visit_expr_mut(&mut sel.x),
        Expr::Ident(_) => {}
        Expr::Other(other) => {
            for child in &mut other.children {
                v.visit_expr_mut(child);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::GoParser;

    struct IdentCounter(usize);

    impl VisitMut for IdentCounter {
        fn visit_expr_mut(&mut self, expr: &mut Expr) {
            if matches!(expr, Expr::Ident(_)) {
                self.0 += 1;
            }
            walk_expr_mut(self, expr);
        }
    }

    #[test]
    fn test_visit_reaches_closure_bodies() {
        let mut file = GoParser::new()
            .unwrap()
            .parse_file("package p\n\nfunc f() {\n\tgo1(func() { a(b) })\n}\n")
            .unwrap();
        let mut counter = IdentCounter(0);
        for decl in file.funcs_mut() {
            if let Some(body) = &mut decl.body {
                counter.visit_block_mut(body);
            }
        }
        // go1, a, b
        assert_eq!(counter.0, 3);
    }
}
