//! Resolve `mod foo;` declarations to filesystem paths.
//!
//! Handles:
//! - `mod foo;` → `foo.rs` (preferred) or `foo/mod.rs`
//! - `#[path = "custom.rs"] mod foo;` → `custom.rs` relative to the declaring file
//! - children of `a.rs` living in `a/`, children of `lib.rs`/`main.rs`/`mod.rs` next to them

use std::path::{Path, PathBuf};

use crate::treesitter::{named_children, SourceFile};

/// A `mod` item of a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModDeclaration {
    pub name: String,
    /// `None` for inline `mod foo { .. }` blocks.
    pub resolved_path: Option<PathBuf>,
}

/// Extracts the top-level `mod` items of `file`.
pub fn extract_mod_declarations(file: &SourceFile) -> Vec<ModDeclaration> {
    let dir = child_dir(&file.path);
    let mut mods = Vec::new();
    let mut path_attr: Option<String> = None;

    for node in named_children(file.root()) {
        match node.kind() {
            "attribute_item" => {
                if let Some(p) = extract_path_attribute(file.text(node)) {
                    path_attr = Some(p.to_string());
                }
                continue;
            }
            "mod_item" => {
                let Some(name) = node.child_by_field_name("name") else {
                    path_attr = None;
                    continue;
                };
                let name = file.text(name).to_string();
                let resolved_path = if node.child_by_field_name("body").is_some() {
                    None
                } else if let Some(custom) = path_attr.take() {
                    let base = file.path.parent().unwrap_or(Path::new(""));
                    Some(base.join(custom))
                } else {
                    Some(resolve_mod_to_path(&dir, &name))
                };
                mods.push(ModDeclaration {
                    name,
                    resolved_path,
                });
            }
            _ => {}
        }
        path_attr = None;
    }

    mods
}

/// Extracts the path string from `#[path = "..."]`.
fn extract_path_attribute(attr: &str) -> Option<&str> {
    let inner = attr.strip_prefix("#[")?.trim_start();
    let rest = inner.strip_prefix("path")?.trim_start();
    let rest = rest.strip_prefix('=')?.trim_start();
    let rest = rest.strip_prefix('"')?;
    let end = rest.find('"')?;
    Some(&rest[..end])
}

/// Resolves a module name to a filesystem path, preferring `name.rs` over
/// `name/mod.rs`.
pub fn resolve_mod_to_path(dir: &Path, name: &str) -> PathBuf {
    let as_file = dir.join(format!("{name}.rs"));
    let as_dir = dir.join(name).join("mod.rs");

    if as_file.exists() {
        as_file
    } else if as_dir.exists() {
        as_dir
    } else {
        as_file
    }
}

/// Whether `file` owns its directory (`lib.rs`, `main.rs`, `mod.rs`).
pub fn is_mod_rs(file: &Path) -> bool {
    matches!(
        file.file_name().and_then(|n| n.to_str()),
        Some("lib.rs" | "main.rs" | "mod.rs")
    )
}

/// Directory holding the child module files of `file`.
pub fn child_dir(file: &Path) -> PathBuf {
    let parent = file.parent().unwrap_or(Path::new("")).to_path_buf();
    if is_mod_rs(file) {
        return parent;
    }
    match file.file_stem() {
        Some(stem) => parent.join(stem),
        None => parent,
    }
}
