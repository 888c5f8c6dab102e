//! `use` declarations: what a module brings into scope.

use std::fmt;

use tree_sitter::Node;

use crate::treesitter::{named_children, SourceFile};

/// An importable path, optionally renamed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Import {
    pub path: String,
    pub alias: Option<String>,
}

impl Import {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            alias: None,
        }
    }

    pub fn aliased(path: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            alias: Some(alias.into()),
        }
    }

    /// Name the import binds in scope.
    pub fn name(&self) -> &str {
        match &self.alias {
            Some(a) => a,
            None => self.path.rsplit("::").next().unwrap_or(&self.path),
        }
    }

    pub fn root(&self) -> &str {
        self.path.split("::").next().unwrap_or(&self.path)
    }

    /// Standard-library imports (`std`, `core`, `alloc`).
    pub fn is_std(&self) -> bool {
        is_std_root(self.root())
    }

    /// `use path;` or `use path as alias;`.
    pub fn render(&self) -> String {
        format!("use {self};")
    }
}

impl fmt::Display for Import {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alias {
            Some(a) => write!(f, "{} as {a}", self.path),
            None => write!(f, "{}", self.path),
        }
    }
}

pub fn is_std_root(root: &str) -> bool {
    matches!(root, "std" | "core" | "alloc")
}

/// One binding introduced by a `use` declaration. For glob imports the
/// path names the module whose items are imported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UseItem {
    pub import: Import,
    pub glob: bool,
}

/// Extracts the top-level `use` declarations of `file`, flattening use
/// trees.
pub fn extract_uses(file: &SourceFile) -> Vec<UseItem> {
    let mut out = Vec::new();
    for node in named_children(file.root()) {
        if node.kind() != "use_declaration" {
            continue;
        }
        if let Some(arg) = node.child_by_field_name("argument") {
            collect(file, arg, "", &mut out);
        }
    }
    out
}

fn collect(file: &SourceFile, node: Node<'_>, prefix: &str, out: &mut Vec<UseItem>) {
    match node.kind() {
        "use_as_clause" => {
            let (Some(path), Some(alias)) = (
                node.child_by_field_name("path"),
                node.child_by_field_name("alias"),
            ) else {
                return;
            };
            let path = join(prefix, &path_text(file, path));
            if path.rsplit("::").next() == Some("self") {
                let module = path.trim_end_matches("self").trim_end_matches("::");
                out.push(item(Import::aliased(module, file.text(alias)), false));
            } else {
                out.push(item(Import::aliased(path, file.text(alias)), false));
            }
        }
        "use_wildcard" => {
            let text = path_text(file, node);
            let module = text.trim_end_matches('*').trim_end_matches("::");
            out.push(item(Import::new(join(prefix, module)), true));
        }
        "use_list" => {
            for child in named_children(node) {
                collect(file, child, prefix, out);
            }
        }
        "scoped_use_list" => {
            let scope = node
                .child_by_field_name("path")
                .map(|p| join(prefix, &path_text(file, p)))
                .unwrap_or_else(|| prefix.to_string());
            if let Some(list) = node.child_by_field_name("list") {
                collect(file, list, &scope, out);
            }
        }
        "self" if !prefix.is_empty() => {
            out.push(item(Import::new(prefix), false));
        }
        "identifier" | "scoped_identifier" | "crate" | "super" | "self" => {
            out.push(item(Import::new(join(prefix, &path_text(file, node))), false));
        }
        _ => {}
    }
}

fn item(import: Import, glob: bool) -> UseItem {
    UseItem { import, glob }
}

fn path_text(file: &SourceFile, node: Node<'_>) -> String {
    let text: String = file.text(node).split_whitespace().collect();
    text.trim_start_matches("::").to_string()
}

fn join(prefix: &str, path: &str) -> String {
    match (prefix.is_empty(), path.is_empty()) {
        (true, _) => path.to_string(),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{prefix}::{path}"),
    }
}
