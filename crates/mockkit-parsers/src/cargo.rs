//! Crate discovery: `cargo metadata` first, manifest walking as a fallback.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use ignore::WalkBuilder;
use serde::Deserialize;
use walkdir::WalkDir;

/// A library or binary target of a Cargo package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrateTarget {
    pub package: String,
    /// Name used in paths (`-` replaced with `_`).
    pub crate_name: String,
    pub kind: TargetKind,
    pub manifest_dir: PathBuf,
    /// `src/lib.rs`, `src/main.rs` or the target's custom path.
    pub root_file: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Lib,
    Bin,
}

impl CrateTarget {
    /// Directory holding the crate's top-level modules.
    pub fn src_dir(&self) -> &Path {
        self.root_file.parent().unwrap_or(&self.manifest_dir)
    }
}

#[derive(Deserialize)]
struct Metadata {
    packages: Vec<MetaPackage>,
}

#[derive(Deserialize)]
struct MetaPackage {
    name: String,
    manifest_path: PathBuf,
    targets: Vec<MetaTarget>,
}

#[derive(Deserialize)]
struct MetaTarget {
    name: String,
    kind: Vec<String>,
    src_path: PathBuf,
}

/// Runs `cargo metadata --no-deps` in `dir`. The error carries cargo's
/// stderr.
pub fn metadata(dir: &Path) -> Result<Vec<CrateTarget>, String> {
    let output = Command::new("cargo")
        .args(["metadata", "--format-version", "1", "--no-deps"])
        .current_dir(dir)
        .output()
        .map_err(|e| format!("failed to run cargo: {e}"))?;
    if !output.status.success() {
        return Err(String::from_utf8_lossy(&output.stderr).into_owned());
    }
    let json = String::from_utf8_lossy(&output.stdout);
    from_metadata_json(&json).map_err(|e| format!("invalid cargo metadata: {e}"))
}

/// Extracts library and binary targets from `cargo metadata` output.
pub fn from_metadata_json(json: &str) -> Result<Vec<CrateTarget>, serde_json::Error> {
    let meta: Metadata = serde_json::from_str(json)?;
    let mut out = Vec::new();
    for pkg in meta.packages {
        let manifest_dir = pkg
            .manifest_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        for target in pkg.targets {
            let kind = if target.kind.iter().any(|k| k == "bin") {
                TargetKind::Bin
            } else if target
                .kind
                .iter()
                .any(|k| matches!(k.as_str(), "lib" | "rlib" | "proc-macro" | "cdylib" | "dylib" | "staticlib"))
            {
                TargetKind::Lib
            } else {
                continue;
            };
            out.push(CrateTarget {
                package: pkg.name.clone(),
                crate_name: target.name.replace('-', "_"),
                kind,
                manifest_dir: manifest_dir.clone(),
                root_file: target.src_path,
            });
        }
    }
    Ok(out)
}

/// Finds crates without cargo: the package enclosing `dir`, the members of
/// the enclosing workspace, then every manifest below `dir`.
pub fn discover(dir: &Path) -> Vec<CrateTarget> {
    let mut manifests: Vec<PathBuf> = Vec::new();

    if let Some(pkg) = enclosing_manifest_dir(dir) {
        manifests.push(pkg);
    }
    if let Some(root) = find_workspace_root(dir) {
        tracing::debug!(root = %root.display(), "walking cargo workspace members");
        manifests.push(root.clone());
        if let Ok(content) = fs::read_to_string(root.join("Cargo.toml")) {
            for member in extract_toml_array(&content, "members").unwrap_or_default() {
                expand_member(&root, &member, &mut manifests);
            }
        }
    }
    manifests.extend(walk_manifests(dir));

    let mut seen = std::collections::HashSet::new();
    manifests
        .into_iter()
        .filter(|d| seen.insert(d.clone()))
        .flat_map(|d| read_manifest(&d))
        .collect()
}

/// Nearest directory at or above `dir` holding a `Cargo.toml`.
pub fn enclosing_manifest_dir(dir: &Path) -> Option<PathBuf> {
    dir.ancestors()
        .find(|d| d.join("Cargo.toml").is_file())
        .map(Path::to_path_buf)
}

/// Nearest directory at or above `dir` whose manifest has a `[workspace]`
/// section.
fn find_workspace_root(dir: &Path) -> Option<PathBuf> {
    dir.ancestors()
        .find(|d| {
            fs::read_to_string(d.join("Cargo.toml"))
                .map(|c| c.lines().any(|l| l.trim() == "[workspace]"))
                .unwrap_or(false)
        })
        .map(Path::to_path_buf)
}

/// Expands a workspace member entry. Supports literal paths and trailing
/// `*` / `**` globs.
fn expand_member(root: &Path, pattern: &str, out: &mut Vec<PathBuf>) {
    let clean = pattern.trim_end_matches('/');
    if let Some(prefix) = clean.strip_suffix("/**") {
        for entry in WalkDir::new(root.join(prefix))
            .min_depth(1)
            .into_iter()
            .filter_entry(|e| !is_skipped_dir(e.file_name().to_str().unwrap_or("")))
            .flatten()
        {
            if entry.file_type().is_dir() && entry.path().join("Cargo.toml").is_file() {
                out.push(entry.into_path());
            }
        }
    } else if let Some(prefix) = clean.strip_suffix("/*") {
        if let Ok(entries) = fs::read_dir(root.join(prefix)) {
            let mut dirs: Vec<PathBuf> = entries
                .flatten()
                .map(|e| e.path())
                .filter(|p| p.join("Cargo.toml").is_file())
                .collect();
            dirs.sort();
            out.extend(dirs);
        }
    } else {
        let dir = root.join(clean);
        if dir.join("Cargo.toml").is_file() {
            out.push(dir);
        }
    }
}

fn is_skipped_dir(name: &str) -> bool {
    name == "target" || name.starts_with('.')
}

/// Directories below `dir` holding a `Cargo.toml`, honouring `.gitignore`.
fn walk_manifests(dir: &Path) -> Vec<PathBuf> {
    let walker = WalkBuilder::new(dir)
        .hidden(true)
        .git_ignore(true)
        .git_global(false)
        .git_exclude(true)
        .filter_entry(|e| e.file_name() != "target")
        .build();

    let mut out = Vec::new();
    for entry in walker.flatten() {
        if entry.file_name() == "Cargo.toml" && entry.file_type().is_some_and(|t| t.is_file()) {
            if let Some(parent) = entry.path().parent() {
                out.push(parent.to_path_buf());
            }
        }
    }
    out.sort();
    out
}

/// Reads the targets of the package in `manifest_dir`. Virtual manifests
/// yield nothing.
fn read_manifest(manifest_dir: &Path) -> Vec<CrateTarget> {
    let Ok(content) = fs::read_to_string(manifest_dir.join("Cargo.toml")) else {
        return Vec::new();
    };
    let Some(package) = section_value(&content, "package", "name") else {
        return Vec::new();
    };

    let mut out = Vec::new();
    let lib_path = section_value(&content, "lib", "path")
        .map(|p| manifest_dir.join(p))
        .unwrap_or_else(|| manifest_dir.join("src").join("lib.rs"));
    if lib_path.is_file() {
        let name = section_value(&content, "lib", "name").unwrap_or_else(|| package.clone());
        out.push(CrateTarget {
            package: package.clone(),
            crate_name: name.replace('-', "_"),
            kind: TargetKind::Lib,
            manifest_dir: manifest_dir.to_path_buf(),
            root_file: lib_path,
        });
    }
    let main_path = manifest_dir.join("src").join("main.rs");
    if main_path.is_file() {
        out.push(CrateTarget {
            package: package.clone(),
            crate_name: package.replace('-', "_"),
            kind: TargetKind::Bin,
            manifest_dir: manifest_dir.to_path_buf(),
            root_file: main_path,
        });
    }
    out
}

/// Value of a string `key` inside a `[section]` table.
fn section_value(content: &str, section: &str, key: &str) -> Option<String> {
    let header = format!("[{section}]");
    let mut in_section = false;
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('[') {
            in_section = trimmed == header;
            continue;
        }
        if !in_section {
            continue;
        }
        let Some((k, v)) = trimmed.split_once('=') else {
            continue;
        };
        if k.trim() == key {
            let v = v.trim();
            if let Some(unquoted) = v.strip_prefix('"').and_then(|s| s.split('"').next()) {
                return Some(unquoted.to_string());
            }
        }
    }
    None
}

/// Extracts a TOML string array for `key`. Handles inline and multi-line
/// arrays.
fn extract_toml_array(content: &str, key: &str) -> Option<Vec<String>> {
    let mut values = Vec::new();
    let mut in_array = false;

    for line in content.lines() {
        let trimmed = line.split('#').next().unwrap_or("").trim();
        if !in_array {
            let Some((k, v)) = trimmed.split_once('=') else {
                continue;
            };
            if k.trim() != key {
                continue;
            }
            let v = v.trim();
            if !v.starts_with('[') {
                return None;
            }
            push_quoted(v, &mut values);
            if v.ends_with(']') {
                return Some(values);
            }
            in_array = true;
            continue;
        }
        push_quoted(trimmed, &mut values);
        if trimmed.ends_with(']') {
            return Some(values);
        }
    }

    in_array.then_some(values)
}

fn push_quoted(s: &str, out: &mut Vec<String>) {
    let inner = s.trim_start_matches('[').trim_end_matches(']');
    for part in inner.split(',') {
        let cleaned = part.trim().trim_matches('"').trim_matches('\'');
        if !cleaned.is_empty() {
            out.push(cleaned.to_string());
        }
    }
}
