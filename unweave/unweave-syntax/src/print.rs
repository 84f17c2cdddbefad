//! Serialization of the tree back to source text.

use std::fmt;

use crate::tree::*;

/// Writes a node's source text.
pub trait Emit {
    fn emit(&self, out: &mut String);

    fn to_source(&self) -> String {
        let mut out = String::new();
        self.emit(&mut out);
        out
    }
}

impl Emit for File {
    fn emit(&self, out: &mut String) {
        for item in &self.items {
            match item {
                Item::Text(text) => out.push_str(text),
                Item::Func(decl) => decl.emit(out),
            }
        }
    }
}

impl Emit for FuncDecl {
    fn emit(&self, out: &mut String) {
        out.push_str(&self.head);
        if let Some(body) = &self.body {
            body.emit(out);
        }
    }
}

impl Emit for Block {
    fn emit(&self, out: &mut String) {
        out.push_str(&self.open);
        for stmt in &self.stmts {
            stmt.emit(out);
        }
        out.push_str(&self.close);
    }
}

impl Emit for Stmt {
    fn emit(&self, out: &mut String) {
        for dec in &self.decs.start {
            out.push_str(dec);
        }
        out.push_str(&self.space);
        self.kind.emit(out);
        out.push_str(&self.terminator);
        for dec in &self.decs.end {
            out.push_str(dec);
        }
    }
}

impl Emit for StmtKind {
    fn emit(&self, out: &mut String) {
        match self {
            StmtKind::Expr(stmt) => stmt.layout.weave(out, &[&stmt.x], Expr::emit),
            StmtKind::Assign(stmt) => {
                let children: Vec<&Expr> = stmt.lhs.iter().chain(&stmt.rhs).collect();
                stmt.layout.weave(out, &children, Expr::emit);
            }
            StmtKind::Return(stmt) => {
                let children: Vec<&Expr> = stmt.results.iter().collect();
                stmt.layout.weave(out, &children, Expr::emit);
            }
            StmtKind::Other(text) => out.push_str(text),
        }
    }
}

impl Emit for Expr {
    fn emit(&self, out: &mut String) {
        match self {
            Expr::Call(call) => {
                let children: Vec<&Expr> = std::iter::once(call.fun.as_ref())
                    .chain(&call.args)
                    .collect();
                call.layout.weave(out, &children, Expr::emit);
            }
            Expr::CompositeLit(lit) => {
                let children: Vec<&Expr> = lit.typ.as_deref().into_iter().chain(&lit.elts).collect();
                lit.layout.weave(out, &children, Expr::emit);
            }
            Expr::KeyValue(kv) => {
                kv.layout
                    .weave(out, &[kv.key.as_ref(), kv.value.as_ref()], Expr::emit);
            }
            Expr::FuncLit(lit) => {
                out.push_str(&lit.head);
                lit.body.emit(out);
            }
            Expr::Selector(sel) => {
                out.push_str(sel.layout.gap(0));
                sel.x.emit(out);
                out.push_str(sel.layout.gap(1));
                out.push_str(&sel.sel.name);
                out.push_str(sel.layout.gap(2));
            }
            Expr::Ident(ident) => out.push_str(&ident.name),
            Expr::Other(other) => {
                let children: Vec<&Expr> = other.children.iter().collect();
                other.layout.weave(out, &children, Expr::emit);
            }
        }
    }
}

impl fmt::Display for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_source())
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_source())
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_source())
    }
}
