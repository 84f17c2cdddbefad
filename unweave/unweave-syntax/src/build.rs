//! Conversion of a tree-sitter Go tree into the owned full-fidelity tree.

use std::ops::Range;

use tree_sitter::Node;

use crate::error::{Result, SyntaxError};
use crate::imports::ImportTable;
use crate::layout::Layout;
use crate::tree::*;
use crate::trivia::{split_leading, split_trailing};

/// Builds [`File`]s from tree-sitter nodes, slicing text out of `source`.
pub(crate) struct TreeBuilder<'s> {
    source: &'s str,
}

/// Named children of `node`, comments excluded.
fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

/// Items of an `expression_list`, or the node itself.
fn list_items<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    if node.kind() == "expression_list" {
        named_children(node)
    } else {
        vec![node]
    }
}

fn ranges(nodes: &[Node<'_>]) -> Vec<Range<usize>> {
    nodes.iter().map(Node::byte_range).collect()
}

fn field<'t>(node: Node<'t>, name: &str) -> Result<Node<'t>> {
    node.child_by_field_name(name)
        .ok_or_else(|| SyntaxError::malformed(node.kind(), format!("missing `{name}`")))
}

impl<'s> TreeBuilder<'s> {
    pub fn new(source: &'s str) -> Self {
        Self { source }
    }

    fn text(&self, node: Node<'_>) -> &'s str {
        &self.source[node.byte_range()]
    }

    fn layout(&self, node: Node<'_>, children: &[Node<'_>]) -> Layout {
        Layout::from_ranges(self.source, node.byte_range(), &ranges(children))
    }

    pub fn file(&self, root: Node<'_>) -> Result<File> {
        let mut items = Vec::new();
        let mut imports = ImportTable::default();
        let mut consumed = 0;

        for child in named_children(root) {
            match child.kind() {
                "function_declaration" | "method_declaration" => {
                    if child.start_byte() > consumed {
                        items.push(Item::Text(
                            self.source[consumed..child.start_byte()].to_string(),
                        ));
                    }
                    let (decl, end) = self.func_decl(child)?;
                    items.push(Item::Func(decl));
                    consumed = end;
                }
                "import_declaration" => imports.collect(child, self.source),
                _ => {}
            }
        }
        if consumed < self.source.len() {
            items.push(Item::Text(self.source[consumed..].to_string()));
        }

        Ok(File { items, imports })
    }

    /// Returns the declaration and the byte offset where it ends.
    fn func_decl(&self, node: Node<'_>) -> Result<(FuncDecl, usize)> {
        let name = self.decl_name(node);
        match node.child_by_field_name("body") {
            Some(body) => {
                let decl = FuncDecl {
                    name,
                    head: self.source[node.start_byte()..body.start_byte()].to_string(),
                    body: Some(self.block(body)?),
                };
                Ok((decl, body.end_byte()))
            }
            None => {
                let decl = FuncDecl {
                    name,
                    head: self.text(node).to_string(),
                    body: None,
                };
                Ok((decl, node.end_byte()))
            }
        }
    }

    fn decl_name(&self, node: Node<'_>) -> String {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n))
            .unwrap_or_default();
        let receiver = node
            .child_by_field_name("receiver")
            .and_then(|recv| self.first_of_kind(recv, "type_identifier"));
        match receiver {
            Some(recv) => format!("{recv}.{name}"),
            None => name.to_string(),
        }
    }

    fn first_of_kind(&self, node: Node<'_>, kind: &str) -> Option<&'s str> {
        if node.kind() == kind {
            return Some(self.text(node));
        }
        let mut cursor = node.walk();
        let children: Vec<_> = node.named_children(&mut cursor).collect();
        children.into_iter().find_map(|child| self.first_of_kind(child, kind))
    }

    fn block(&self, node: Node<'_>) -> Result<Block> {
        let range = node.byte_range();
        let text = self.text(node);
        if !text.starts_with('{') || !text.ends_with('}') {
            return Err(SyntaxError::malformed(node.kind(), "expected braces"));
        }
        let inner_start = range.start + 1;
        let inner_end = range.end - 1;

        let nodes = self.statements(node);
        let first_start = nodes.first().map(Node::start_byte).unwrap_or(inner_end);
        let opening = split_trailing(&self.source[inner_start..first_start]);
        let open = format!("{{{}{}", opening.terminator, opening.comments.concat());

        let mut stmts = Vec::with_capacity(nodes.len());
        let mut pending = opening.rest;
        for (i, stmt) in nodes.iter().enumerate() {
            let leading = split_leading(pending);
            let next_start = nodes.get(i + 1).map(Node::start_byte).unwrap_or(inner_end);
            let trailing = split_trailing(&self.source[stmt.end_byte()..next_start]);
            stmts.push(Stmt {
                decs: Decorations {
                    start: leading.comments,
                    end: trailing.comments,
                },
                space: leading.space.to_string(),
                kind: self.stmt_kind(*stmt)?,
                terminator: trailing.terminator.to_string(),
                line: stmt.start_position().row + 1,
            });
            pending = trailing.rest;
        }

        // Comments between the last statement and `}` belong to that statement
        if let Some(last) = stmts.last_mut() {
            let dangling = split_leading(pending);
            last.decs.end.extend(dangling.comments);
            pending = dangling.space;
        }

        Ok(Block {
            open,
            stmts,
            close: format!("{pending}}}"),
        })
    }

    /// Statement nodes of a block, looking through `statement_list`.
    fn statements<'t>(&self, block: Node<'t>) -> Vec<Node<'t>> {
        let mut out = Vec::new();
        for child in named_children(block) {
            if child.kind() == "statement_list" {
                out.extend(named_children(child));
            } else {
                out.push(child);
            }
        }
        out
    }

    fn stmt_kind(&self, node: Node<'_>) -> Result<StmtKind> {
        let kind = match node.kind() {
            "expression_statement" => {
                let inner = named_children(node)
                    .into_iter()
                    .next()
                    .ok_or_else(|| SyntaxError::malformed(node.kind(), "no expression"))?;
                StmtKind::Expr(ExprStmt {
                    x: self.expr(inner)?,
                    layout: self.layout(node, &[inner]),
                })
            }
            "call_expression" => StmtKind::Expr(ExprStmt {
                x: self.expr(node)?,
                layout: self.layout(node, &[node]),
            }),
            "assignment_statement" | "short_var_declaration" => {
                let lhs = list_items(field(node, "left")?);
                let rhs = list_items(field(node, "right")?);
                let children: Vec<_> = lhs.iter().chain(rhs.iter()).copied().collect();
                StmtKind::Assign(AssignStmt {
                    lhs: self.exprs(&lhs)?,
                    rhs: self.exprs(&rhs)?,
                    layout: self.layout(node, &children),
                })
            }
            "return_statement" => {
                let results: Vec<_> = named_children(node)
                    .into_iter()
                    .flat_map(list_items)
                    .collect();
                StmtKind::Return(ReturnStmt {
                    results: self.exprs(&results)?,
                    layout: self.layout(node, &results),
                })
            }
            _ => StmtKind::Other(self.text(node).to_string()),
        };
        Ok(kind)
    }

    fn exprs(&self, nodes: &[Node<'_>]) -> Result<Vec<Expr>> {
        nodes.iter().map(|n| self.expr(*n)).collect()
    }

    fn expr(&self, node: Node<'_>) -> Result<Expr> {
        let expr = match node.kind() {
            "identifier" | "field_identifier" | "package_identifier" | "type_identifier" => {
                Expr::ident(self.text(node))
            }
            "selector_expression" => {
                let operand = field(node, "operand")?;
                let sel = field(node, "field")?;
                Expr::Selector(SelectorExpr {
                    x: Box::new(self.expr(operand)?),
                    sel: Ident {
                        name: self.text(sel).to_string(),
                    },
                    layout: self.layout(node, &[operand, sel]),
                })
            }
            "call_expression" => {
                let fun = field(node, "function")?;
                let args = named_children(field(node, "arguments")?);
                let mut children = vec![fun];
                children.extend(args.iter().copied());
                Expr::Call(CallExpr {
                    fun: Box::new(self.expr(fun)?),
                    args: self.exprs(&args)?,
                    layout: self.layout(node, &children),
                })
            }
            "composite_literal" => {
                let typ = field(node, "type")?;
                let elts = named_children(field(node, "body")?);
                let mut children = vec![typ];
                children.extend(elts.iter().copied());
                Expr::CompositeLit(CompositeLit {
                    typ: Some(Box::new(self.expr(typ)?)),
                    elts: self.exprs(&elts)?,
                    layout: self.layout(node, &children),
                })
            }
            "literal_value" => {
                let elts = named_children(node);
                Expr::CompositeLit(CompositeLit {
                    typ: None,
                    elts: self.exprs(&elts)?,
                    layout: self.layout(node, &elts),
                })
            }
            "keyed_element" => match named_children(node).as_slice() {
                [key, value] => Expr::KeyValue(KeyValueExpr {
                    key: Box::new(self.expr(*key)?),
                    value: Box::new(self.expr(*value)?),
                    layout: self.layout(node, &[*key, *value]),
                }),
                _ => self.other(node)?,
            },
            "literal_element" => match named_children(node).as_slice() {
                // Transparent wrapper around a single element
                [inner] if inner.byte_range() == node.byte_range() => self.expr(*inner)?,
                _ => self.other(node)?,
            },
            "func_literal" => {
                let body = field(node, "body")?;
                if body.end_byte() != node.end_byte() {
                    return self.other(node);
                }
                Expr::FuncLit(FuncLit {
                    head: self.source[node.start_byte()..body.start_byte()].to_string(),
                    body: self.block(body)?,
                })
            }
            _ => self.other(node)?,
        };
        Ok(expr)
    }

    fn other(&self, node: Node<'_>) -> Result<Expr> {
        let children = named_children(node);
        Ok(Expr::Other(OtherExpr {
            kind: node.kind().to_string(),
            children: self.exprs(&children)?,
            layout: self.layout(node, &children),
        }))
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::GoParser;
    use crate::print::Emit;
    use crate::tree::*;

    fn parse(source: &str) -> File {
        GoParser::new().unwrap().parse_file(source).unwrap()
    }

    fn body(file: &File) -> &Block {
        file.funcs().next().unwrap().body.as_ref().unwrap()
    }

    #[test]
    fn test_statement_shapes() {
        let file = parse(
            "package p\n\nfunc f() error {\n\tx := g(1)\n\th(x)\n\tif x {\n\t}\n\treturn nil\n}\n",
        );
        let stmts = &body(&file).stmts;
        assert_eq!(stmts.len(), 4);
        assert!(matches!(stmts[0].kind, StmtKind::Assign(_)));
        assert!(matches!(stmts[1].kind, StmtKind::Expr(_)));
        assert!(matches!(stmts[2].kind, StmtKind::Other(_)));
        assert!(matches!(stmts[3].kind, StmtKind::Return(_)));
        assert_eq!(stmts[1].line, 5);
    }

    #[test]
    fn test_decorations_attach_to_statements() {
        let file = parse(
            "package p\n\nfunc f() {\n\t// lead\n\ta() // trail\n\n\t/* next */\n\tb()\n\t// dangling\n}\n",
        );
        let stmts = &body(&file).stmts;
        assert_eq!(stmts[0].decs.start, vec!["\n\t// lead"]);
        assert_eq!(stmts[0].decs.end, vec![" // trail"]);
        assert_eq!(stmts[0].space, "\n\t");
        assert_eq!(stmts[1].decs.start, vec!["\n\n\t/* next */"]);
        assert_eq!(stmts[1].decs.end, vec!["\n\t// dangling"]);
        assert_eq!(body(&file).close, "\n}");
    }

    #[test]
    fn test_call_and_selector() {
        let file = parse("package p\n\nfunc f() {\n\tmux.Handle(\"/\", h)\n}\n");
        let StmtKind::Expr(stmt) = &body(&file).stmts[0].kind else {
            panic!("expected expression statement");
        };
        let call = stmt.x.as_call().unwrap();
        let sel = call.fun.as_selector().unwrap();
        assert_eq!(sel.x.as_ident(), Some("mux"));
        assert_eq!(sel.sel.name, "Handle");
        assert_eq!(call.args.len(), 2);
        assert_eq!(call.args[1].as_ident(), Some("h"));
    }

    #[test]
    fn test_composite_literal_with_func_values() {
        let file = parse(
            "package p\n\nfunc f() {\n\tm := map[string]func(){\n\t\t\"a\": func() { a() },\n\t}\n\t_ = m\n}\n",
        );
        let StmtKind::Assign(assign) = &body(&file).stmts[0].kind else {
            panic!("expected assignment");
        };
        let Expr::CompositeLit(lit) = &assign.rhs[0] else {
            panic!("expected composite literal");
        };
        let Expr::KeyValue(kv) = &lit.elts[0] else {
            panic!("expected key/value element");
        };
        assert!(matches!(kv.value.as_ref(), Expr::FuncLit(_)));
        assert_eq!(assign.op(), ":=");
    }

    #[test]
    fn test_method_names_include_receiver() {
        let file = parse("package p\n\nfunc (t *T) Run() {}\n\nfunc plain() {}\n");
        let names: Vec<_> = file.funcs().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["T.Run", "plain"]);
    }

    #[test]
    fn test_round_trip_is_exact() {
        let source = "package p\n\nimport \"fmt\"\n\n// f does things.\nfunc f(a, b int) (int, error) {\n\tx, y := a+b, fmt.Sprint( a ) // sum\n\tfunc() { _ = y }()\n\tm := &T{Name: \"n\", H: func() {}}\n\n\treturn x, nil;\n}\n\nvar v = 1\n";
        assert_eq!(parse(source).to_source(), source);
    }
}
