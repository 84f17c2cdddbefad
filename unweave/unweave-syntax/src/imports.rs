//! Import resolution: mapping `pkg.Name` references to import paths.

use tree_sitter::Node;

use crate::tree::Expr;

/// One `import` spec of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    /// Explicit name (`alias`, `_` or `.`), if any.
    pub name: Option<String>,
    /// Unquoted import path.
    pub path: String,
}

impl ImportSpec {
    pub fn new(name: Option<&str>, path: &str) -> Self {
        Self {
            name: name.map(str::to_string),
            path: path.to_string(),
        }
    }

    /// The identifier the file uses to refer to the package.
    ///
    /// `None` for blank and dot imports, which introduce no qualifier.
    pub fn local_name(&self) -> Option<String> {
        match self.name.as_deref() {
            Some("_") | Some(".") => None,
            Some(name) => Some(name.to_string()),
            None => Some(assumed_package_name(&self.path)),
        }
    }
}

/// A package-qualified identifier, e.g. `net/http` + `Handle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualifiedName<'a> {
    pub path: &'a str,
    pub name: &'a str,
}

/// The imports of one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportTable {
    specs: Vec<ImportSpec>,
}

impl ImportTable {
    pub fn new(specs: Vec<ImportSpec>) -> Self {
        Self { specs }
    }

    pub fn specs(&self) -> &[ImportSpec] {
        &self.specs
    }

    pub fn push(&mut self, spec: ImportSpec) {
        self.specs.push(spec);
    }

    /// Import path bound to the local package name `local`.
    pub fn path_of(&self, local: &str) -> Option<&str> {
        self.specs
            .iter()
            .rev()
            .find(|spec| spec.local_name().as_deref() == Some(local))
            .map(|spec| spec.path.as_str())
    }

    /// Resolve a `pkg.Name` selector to its qualified identity.
    pub fn resolve<'a>(&'a self, expr: &'a Expr) -> Option<QualifiedName<'a>> {
        let sel = expr.as_selector()?;
        let pkg = sel.x.as_ident()?;
        let path = self.path_of(pkg)?;
        Some(QualifiedName {
            path,
            name: &sel.sel.name,
        })
    }

    /// Record every spec of an `import_declaration` node.
    pub(crate) fn collect(&mut self, decl: Node<'_>, source: &str) {
        for spec in import_specs(decl) {
            let name = spec
                .child_by_field_name("name")
                .map(|n| &source[n.byte_range()]);
            let Some(path) = spec.child_by_field_name("path") else {
                continue;
            };
            self.push(ImportSpec::new(name, unquote(&source[path.byte_range()])));
        }
    }
}

/// `import_spec` nodes of an `import_declaration`, looking through spec lists.
pub(crate) fn import_specs<'t>(decl: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = decl.walk();
    let mut out = Vec::new();
    for child in decl.named_children(&mut cursor) {
        match child.kind() {
            "import_spec" => out.push(child),
            "import_spec_list" => {
                let mut inner = child.walk();
                out.extend(
                    child
                        .named_children(&mut inner)
                        .filter(|n| n.kind() == "import_spec"),
                );
            }
            _ => {}
        }
    }
    out
}

pub(crate) fn unquote(literal: &str) -> &str {
    literal.trim_matches(|c| c == '"' || c == '`')
}

/// Package name Go tooling assumes for an import path without an alias.
///
/// The last path element is used, except that a trailing major-version
/// element (`v2`, `v7`, ...) defers to the one before it. A `go-` prefix is
/// dropped and the name is cut at the first character that cannot appear in
/// an identifier, so `gopkg.in/yaml.v3` yields `yaml`.
pub fn assumed_package_name(path: &str) -> String {
    let mut elems = path.rsplit('/');
    let mut base = elems.next().unwrap_or(path);
    let is_version = base.len() > 1
        && base.starts_with('v')
        && base[1..].chars().all(|c| c.is_ascii_digit());
    if is_version {
        if let Some(prev) = elems.next() {
            base = prev;
        }
    }
    let base = base.strip_prefix("go-").unwrap_or(base);
    let end = base
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(base.len());
    base[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Layout;
    use crate::tree::{Ident, SelectorExpr};

    fn selector(pkg: &str, name: &str) -> Expr {
        Expr::Selector(SelectorExpr {
            x: Box::new(Expr::ident(pkg)),
            sel: Ident {
                name: name.to_string(),
            },
            layout: Layout::from_ranges(".", 0..1, &[0..0, 1..1]),
        })
    }

    #[test]
    fn test_assumed_package_name() {
        assert_eq!(assumed_package_name("net/http"), "http");
        assert_eq!(assumed_package_name("github.com/elastic/go-elasticsearch/v7"), "elasticsearch");
        assert_eq!(assumed_package_name("gopkg.in/yaml.v3"), "yaml");
        assert_eq!(assumed_package_name("github.com/go-chi/chi/v5"), "chi");
        assert_eq!(assumed_package_name("fmt"), "fmt");
    }

    #[test]
    fn test_local_names() {
        assert_eq!(ImportSpec::new(None, "net/http").local_name().as_deref(), Some("http"));
        assert_eq!(ImportSpec::new(Some("dd"), "x/y").local_name().as_deref(), Some("dd"));
        assert_eq!(ImportSpec::new(Some("_"), "x/y").local_name(), None);
        assert_eq!(ImportSpec::new(Some("."), "x/y").local_name(), None);
    }

    #[test]
    fn test_resolve_selector() {
        let table = ImportTable::new(vec![
            ImportSpec::new(None, "github.com/datadog/orchestrion/instrument"),
            ImportSpec::new(Some("nethttp"), "net/http"),
        ]);
        let expr = selector("instrument", "WrapHandler");
        let resolved = table.resolve(&expr).unwrap();
        assert_eq!(resolved.path, "github.com/datadog/orchestrion/instrument");
        assert_eq!(resolved.name, "WrapHandler");

        assert!(table.resolve(&selector("http", "Handle")).is_none());
        assert_eq!(
            table.resolve(&selector("nethttp", "Handle")).map(|q| q.path),
            Some("net/http")
        );
    }
}
