//! Full-fidelity Go syntax trees.
//!
//! Go source is parsed with tree-sitter and converted into an owned tree in
//! which every statement carries its surrounding comments and whitespace.
//! Statements can be removed, reordered or rewritten and the tree printed
//! back; text the caller did not touch comes out byte for byte.
//!
//! ```
//! use unweave_syntax::{Emit, GoParser};
//!
//! # fn main() -> unweave_syntax::Result<()> {
//! let source = "package main\n\nfunc main() {\n\t// hello\n\tprintln(1)\n}\n";
//! let mut parser = GoParser::new()?;
//! let mut file = parser.parse_file(source)?;
//! assert_eq!(file.to_source(), source);
//!
//! let body = file.funcs_mut().next().and_then(|f| f.body.as_mut()).unwrap();
//! body.stmts.clear();
//! assert_eq!(file.to_source(), "package main\n\nfunc main() {\n}\n");
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//! - [`parser`] - tree-sitter wrapper
//! - [`tree`] - the owned tree
//! - [`print`] - serialization back to text
//! - [`visit`] - mutable traversal
//! - [`imports`] - resolving `pkg.Name` to import paths
//! - [`editor`] - byte-range editing of printed source

mod build;
pub mod editor;
pub mod error;
pub mod imports;
pub mod layout;
pub mod parser;
pub mod print;
pub mod tree;
pub mod trivia;
pub mod visit;

pub use editor::{Edit, SourceEditor};
pub use error::{Result, SyntaxError};
pub use imports::{ImportSpec, ImportTable, QualifiedName, assumed_package_name};
pub use layout::Layout;
pub use parser::{GoParser, first_error};
pub use print::Emit;
pub use tree::{
    AssignStmt, Block, CallExpr, CompositeLit, Decorations, Expr, ExprStmt, File, FuncDecl,
    FuncLit, Ident, Item, KeyValueExpr, OtherExpr, ReturnStmt, SelectorExpr, Stmt, StmtKind,
};
pub use trivia::comment_text;
pub use visit::{VisitMut, walk_block_mut, walk_expr_mut, walk_stmt_mut};
