//! Owned, full-fidelity Go syntax tree.
//!
//! Every structured node keeps the verbatim source text between its children
//! (see [`Layout`]), and every statement keeps the comments and whitespace in
//! front of and behind it (see [`Decorations`]). Printing a freshly built tree
//! therefore reproduces the input byte for byte; only the parts a caller
//! mutates change.

use crate::imports::ImportTable;
use crate::layout::Layout;
use crate::trivia::comment_text;

/// A parsed Go source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    /// Top-level items in source order.
    pub items: Vec<Item>,
    /// Import specs of the file, used to resolve `pkg.Name` references.
    pub imports: ImportTable,
}

impl File {
    /// Iterate over the function and method declarations of the file.
    pub fn funcs(&self) -> impl Iterator<Item = &FuncDecl> {
        self.items.iter().filter_map(|item| match item {
            Item::Func(decl) => Some(decl),
            Item::Text(_) => None,
        })
    }

    /// Mutable variant of [`File::funcs`].
    pub fn funcs_mut(&mut self) -> impl Iterator<Item = &mut FuncDecl> {
        self.items.iter_mut().filter_map(|item| match item {
            Item::Func(decl) => Some(decl),
            Item::Text(_) => None,
        })
    }
}

/// A top-level item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    /// Anything that is not a function declaration: package clause, imports,
    /// types, top-level vars and the whitespace between declarations.
    Text(String),
    /// A function or method declaration.
    Func(FuncDecl),
}

/// A function or method declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncDecl {
    /// Declared name (`Type.method` for methods when the receiver type is known).
    pub name: String,
    /// Text from `func` up to the opening brace of the body.
    pub head: String,
    /// Body, absent for declarations implemented outside Go.
    pub body: Option<Block>,
}

/// A `{ ... }` statement list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// The opening brace plus any comments on the same line.
    pub open: String,
    pub stmts: Vec<Stmt>,
    /// Everything after the last statement, closing brace included.
    pub close: String,
}

/// Comments attached to a statement.
///
/// Each entry holds one comment together with the whitespace preceding it,
/// so concatenating the entries reproduces the source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decorations {
    /// Comments on the lines above the statement.
    pub start: Vec<String>,
    /// Comments after the statement on its last line.
    pub end: Vec<String>,
}

impl Decorations {
    /// Whether any leading comment starts with `prefix`.
    pub fn start_has(&self, prefix: &str) -> bool {
        self.start.iter().any(|d| comment_text(d).starts_with(prefix))
    }

    /// Whether any trailing comment starts with `prefix`.
    pub fn end_has(&self, prefix: &str) -> bool {
        self.end.iter().any(|d| comment_text(d).starts_with(prefix))
    }

    /// Drop trailing comments starting with `prefix`, returning how many went.
    pub fn strip_end(&mut self, prefix: &str) -> usize {
        let before = self.end.len();
        self.end.retain(|d| !comment_text(d).starts_with(prefix));
        before - self.end.len()
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_empty() && self.end.is_empty()
    }
}

/// A statement inside a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stmt {
    pub decs: Decorations,
    /// Whitespace between the last leading comment (or the previous statement)
    /// and the statement itself.
    pub space: String,
    pub kind: StmtKind,
    /// An explicit `;` after the statement, with the spaces before it.
    pub terminator: String,
    /// 1-based line of the statement in the parsed source.
    pub line: usize,
}

impl Stmt {
    /// Drop leading comments starting with `prefix`, returning how many went.
    ///
    /// Blank lines in front of a dropped comment are carried over to whatever
    /// follows it, so paragraph breaks survive.
    pub fn strip_start(&mut self, prefix: &str) -> usize {
        let mut removed = 0;
        let mut i = 0;
        while i < self.decs.start.len() {
            if !comment_text(&self.decs.start[i]).starts_with(prefix) {
                i += 1;
                continue;
            }
            let entry = self.decs.start.remove(i);
            removed += 1;
            let blank = blank_lines(&entry);
            if blank > 0 {
                let next = self.decs.start.get_mut(i).unwrap_or(&mut self.space);
                if next.starts_with('\n') || next.starts_with("\r\n") {
                    next.insert_str(0, &"\n".repeat(blank));
                }
            }
        }
        removed
    }

    /// Drop comments starting with `prefix` from both decoration lists.
    pub fn strip_decoration(&mut self, prefix: &str) -> usize {
        self.strip_start(prefix) + self.decs.strip_end(prefix)
    }
}

fn blank_lines(entry: &str) -> usize {
    let ws_len = entry.len() - entry.trim_start().len();
    entry[..ws_len].matches('\n').count().saturating_sub(1)
}

/// Statement shapes the engine distinguishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StmtKind {
    /// A bare expression, usually a call.
    Expr(ExprStmt),
    /// `lhs = rhs`, `lhs := rhs` and compound assignments.
    Assign(AssignStmt),
    /// `return results...`.
    Return(ReturnStmt),
    /// Any other statement, kept verbatim.
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExprStmt {
    pub x: Expr,
    pub layout: Layout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignStmt {
    pub lhs: Vec<Expr>,
    pub rhs: Vec<Expr>,
    /// Children are `lhs` followed by `rhs`.
    pub layout: Layout,
}

impl AssignStmt {
    /// The assignment operator, e.g. `:=` or `+=`.
    pub fn op(&self) -> &str {
        self.layout.gap(self.lhs.len()).trim()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnStmt {
    pub results: Vec<Expr>,
    pub layout: Layout,
}

/// Expression shapes the engine distinguishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Call(CallExpr),
    CompositeLit(CompositeLit),
    KeyValue(KeyValueExpr),
    FuncLit(FuncLit),
    Selector(SelectorExpr),
    Ident(Ident),
    /// Anything else. Sub-expressions are still reachable through `children`.
    Other(OtherExpr),
}

impl Expr {
    /// Convenience constructor for an identifier.
    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Ident(Ident { name: name.into() })
    }

    pub fn as_call(&self) -> Option<&CallExpr> {
        match self {
            Expr::Call(call) => Some(call),
            _ => None,
        }
    }

    pub fn as_ident(&self) -> Option<&str> {
        match self {
            Expr::Ident(ident) => Some(&ident.name),
            _ => None,
        }
    }

    pub fn as_selector(&self) -> Option<&SelectorExpr> {
        match self {
            Expr::Selector(sel) => Some(sel),
            _ => None,
        }
    }
}

/// `fun(args...)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallExpr {
    pub fun: Box<Expr>,
    pub args: Vec<Expr>,
    /// Children are `fun` followed by `args`.
    pub layout: Layout,
}

/// `Type{elts...}`, or `{elts...}` when the type is elided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeLit {
    pub typ: Option<Box<Expr>>,
    pub elts: Vec<Expr>,
    /// Children are `typ` (when present) followed by `elts`.
    pub layout: Layout,
}

/// `key: value` inside a composite literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValueExpr {
    pub key: Box<Expr>,
    pub value: Box<Expr>,
    pub layout: Layout,
}

/// `func(params) results { body }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncLit {
    /// Text from `func` up to the opening brace of the body.
    pub head: String,
    pub body: Block,
}

/// `x.sel`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorExpr {
    pub x: Box<Expr>,
    pub sel: Ident,
    pub layout: Layout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
}

/// An expression the engine does not look into, apart from its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtherExpr {
    /// Grammar node kind, e.g. `unary_expression`.
    pub kind: String,
    pub children: Vec<Expr>,
    pub layout: Layout,
}
