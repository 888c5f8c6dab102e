//! Package resolution: maps a path or module path to a module record.
//!
//! Accepted inputs:
//! - an existing file or directory, absolute or relative to the working directory
//! - a module path: `crate_name`, `crate_name::a::b`, or `crate::a::b` for the
//!   package enclosing the working directory

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::cargo::{self, CrateTarget, TargetKind};
use crate::error::GenError;
use crate::mod_resolution::{child_dir, extract_mod_declarations, is_mod_rs, resolve_mod_to_path};
use crate::treesitter::SourceFile;

/// A resolved module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    /// Canonical module path, `crate_name::a::b`.
    pub spec: String,
    /// Directory holding the module file.
    pub dir: PathBuf,
    /// The module file.
    pub file: PathBuf,
    /// Identifier that qualifies the module's items from elsewhere.
    pub ident: String,
    pub crate_name: String,
    pub manifest_dir: PathBuf,
    /// Root file of the crate (`lib.rs`, `main.rs` or a custom path).
    pub crate_root: PathBuf,
    /// Module segments below the crate root.
    pub module_path: Vec<String>,
}

impl Package {
    fn new(target: &CrateTarget, file: PathBuf, module_path: Vec<String>) -> Self {
        let spec = std::iter::once(target.crate_name.as_str())
            .chain(module_path.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join("::");
        Self {
            spec,
            dir: file.parent().map(Path::to_path_buf).unwrap_or_default(),
            ident: module_path
                .last()
                .cloned()
                .unwrap_or_else(|| target.crate_name.clone()),
            file,
            crate_name: target.crate_name.clone(),
            manifest_dir: target.manifest_dir.clone(),
            crate_root: canonical(&target.root_file),
            module_path,
        }
    }

    pub fn is_crate_root(&self) -> bool {
        self.module_path.is_empty()
    }

    pub fn same_crate(&self, other: &Package) -> bool {
        self.crate_name == other.crate_name && self.manifest_dir == other.manifest_dir
    }

    /// Path naming this module from code in `from`'s crate: `crate::a::b`
    /// within the same crate, `crate_name::a::b` otherwise.
    pub fn path_from(&self, from: &Package) -> String {
        let root = if self.same_crate(from) {
            "crate"
        } else {
            self.crate_name.as_str()
        };
        std::iter::once(root)
            .chain(self.module_path.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join("::")
    }

    /// Directory holding this module's child module files.
    pub fn child_dir(&self) -> PathBuf {
        child_dir(&self.file)
    }
}

/// Resolves and caches [`Package`] records for one generation run.
pub struct Resolver {
    cwd: PathBuf,
    use_cargo: bool,
    targets: Option<Vec<CrateTarget>>,
    cargo_error: Option<String>,
    cache: HashMap<String, Package>,
}

impl Resolver {
    /// A resolver consulting `cargo metadata`, then walking manifests.
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            use_cargo: true,
            targets: None,
            cargo_error: None,
            cache: HashMap::new(),
        }
    }

    /// A resolver that only walks manifests.
    pub fn offline(cwd: impl Into<PathBuf>) -> Self {
        Self {
            use_cargo: false,
            ..Self::new(cwd)
        }
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Resolves `input`, a path or a module path.
    pub fn resolve(&mut self, input: &str) -> Result<Package, GenError> {
        if let Some(hit) = self.cache.get(input) {
            return Ok(hit.clone());
        }
        let candidate = self.cwd.join(input);
        let pkg = if !input.is_empty() && candidate.exists() {
            self.resolve_path(&candidate)?
        } else {
            self.resolve_spec(input)?
        };
        tracing::debug!(input, spec = %pkg.spec, file = %pkg.file.display(), "resolved package");
        self.cache.insert(input.to_string(), pkg.clone());
        self.cache.insert(pkg.spec.clone(), pkg.clone());
        Ok(pkg)
    }

    fn resolve_path(&mut self, path: &Path) -> Result<Package, GenError> {
        let path = path.canonicalize().map_err(|source| GenError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file = if path.is_dir() {
            self.module_file_for_dir(&path)?
        } else {
            path.clone()
        };

        let target = self
            .targets()
            .iter()
            .filter(|t| {
                let root = canonical(t.src_dir());
                file.starts_with(&root)
            })
            .max_by_key(|t| {
                (
                    canonical(t.src_dir()).components().count(),
                    t.kind == TargetKind::Lib,
                )
            })
            .cloned()
            .ok_or_else(|| GenError::NotInModule(path.clone()))?;

        let root_file = canonical(&target.root_file);
        let module_path = if file == root_file {
            Vec::new()
        } else {
            module_path_of(&canonical(target.src_dir()), &file)
        };
        Ok(Package::new(&target, file, module_path))
    }

    fn module_file_for_dir(&mut self, dir: &Path) -> Result<PathBuf, GenError> {
        if dir.join("Cargo.toml").is_file() {
            let target = self
                .targets()
                .iter()
                .filter(|t| canonical(&t.manifest_dir) == dir)
                .min_by_key(|t| t.kind == TargetKind::Bin)
                .cloned();
            if let Some(t) = target {
                return Ok(canonical(&t.root_file));
            }
        }
        let candidates = [
            dir.join("mod.rs"),
            dir.join("lib.rs"),
            dir.join("main.rs"),
            dir.with_extension("rs"),
        ];
        candidates
            .into_iter()
            .find(|p| p.is_file())
            .ok_or_else(|| GenError::UnknownPackage {
                spec: dir.display().to_string(),
                detail: None,
            })
    }

    fn resolve_spec(&mut self, spec: &str) -> Result<Package, GenError> {
        let segments = parse_spec(spec)?;
        let (first, rest) = segments
            .split_first()
            .ok_or_else(|| GenError::InvalidImportSpec(spec.to_string()))?;

        let target = if first == "crate" {
            let cwd = canonical(&self.cwd);
            self.targets()
                .iter()
                .filter(|t| cwd.starts_with(canonical(&t.manifest_dir)))
                .max_by_key(|t| {
                    (
                        canonical(&t.manifest_dir).components().count(),
                        t.kind == TargetKind::Lib,
                    )
                })
                .cloned()
        } else {
            self.crate_target(first)
        };
        let Some(target) = target else {
            return Err(GenError::UnknownPackage {
                spec: spec.to_string(),
                detail: self.cargo_error.clone(),
            });
        };

        let mut file = target.root_file.clone();
        for seg in rest {
            file = find_child_module(&file, seg)?.ok_or_else(|| GenError::UnknownPackage {
                spec: spec.to_string(),
                detail: None,
            })?;
        }
        Ok(Package::new(&target, canonical(&file), rest.to_vec()))
    }

    /// Module `module_path` of the crate `base` belongs to.
    pub fn module_in(&mut self, base: &Package, module_path: &[String]) -> Result<Package, GenError> {
        let spec = std::iter::once(base.crate_name.as_str())
            .chain(module_path.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join("::");
        if let Some(hit) = self.cache.get(&spec) {
            if hit.crate_root == base.crate_root {
                return Ok(hit.clone());
            }
        }
        let mut file = base.crate_root.clone();
        for seg in module_path {
            file = find_child_module(&file, seg)?.ok_or_else(|| GenError::UnknownPackage {
                spec: spec.clone(),
                detail: None,
            })?;
        }
        let file = canonical(&file);
        let pkg = Package {
            spec: spec.clone(),
            dir: file.parent().map(Path::to_path_buf).unwrap_or_default(),
            ident: module_path
                .last()
                .cloned()
                .unwrap_or_else(|| base.crate_name.clone()),
            file,
            crate_name: base.crate_name.clone(),
            manifest_dir: base.manifest_dir.clone(),
            crate_root: base.crate_root.clone(),
            module_path: module_path.to_vec(),
        };
        self.cache.insert(spec, pkg.clone());
        Ok(pkg)
    }

    /// The crate target named `name`, libraries first.
    pub fn crate_target(&mut self, name: &str) -> Option<CrateTarget> {
        let targets = self.targets();
        targets
            .iter()
            .find(|t| t.kind == TargetKind::Lib && t.crate_name == name)
            .or_else(|| targets.iter().find(|t| t.crate_name == name))
            .cloned()
    }

    fn targets(&mut self) -> &[CrateTarget] {
        if self.targets.is_none() {
            let found = self.load_targets();
            self.targets = Some(found);
        }
        self.targets.as_deref().unwrap_or_default()
    }

    fn load_targets(&mut self) -> Vec<CrateTarget> {
        if self.use_cargo {
            match cargo::metadata(&self.cwd) {
                Ok(targets) if !targets.is_empty() => return targets,
                Ok(_) => {}
                Err(stderr) => {
                    tracing::warn!("cargo metadata failed, walking manifests instead");
                    self.cargo_error = Some(stderr);
                }
            }
        }
        cargo::discover(&self.cwd)
    }
}

/// Validates a module path and splits it into segments.
fn parse_spec(spec: &str) -> Result<Vec<String>, GenError> {
    let trimmed = spec.strip_prefix("::").unwrap_or(spec);
    let segments: Vec<String> = trimmed.split("::").map(|s| s.trim().to_string()).collect();
    let valid = !trimmed.is_empty()
        && segments.iter().enumerate().all(|(i, s)| {
            is_identifier(s) && (i == 0 || !matches!(s.as_str(), "crate" | "self" | "super"))
        })
        && !matches!(segments[0].as_str(), "self" | "super");
    if !valid {
        return Err(GenError::InvalidImportSpec(spec.to_string()));
    }
    Ok(segments)
}

pub(crate) fn is_identifier(s: &str) -> bool {
    let s = s.strip_prefix("r#").unwrap_or(s);
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_alphabetic() => {}
        _ => return false,
    }
    s != "_" && chars.all(|c| c == '_' || c.is_alphanumeric())
}

/// Finds the file of child module `name` declared in `file`.
fn find_child_module(file: &Path, name: &str) -> Result<Option<PathBuf>, GenError> {
    let source = SourceFile::read(file)?;
    let declared = extract_mod_declarations(&source)
        .into_iter()
        .find(|m| m.name == name)
        .and_then(|m| m.resolved_path);
    let path = declared.unwrap_or_else(|| resolve_mod_to_path(&child_dir(file), name));
    Ok(path.is_file().then_some(path))
}

/// Module segments of `file` below `src_dir`.
fn module_path_of(src_dir: &Path, file: &Path) -> Vec<String> {
    let Ok(rel) = file.strip_prefix(src_dir) else {
        return Vec::new();
    };
    let mut segments: Vec<String> = rel
        .parent()
        .map(|p| {
            p.components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    if !is_mod_rs(file) {
        if let Some(stem) = file.file_stem() {
            segments.push(stem.to_string_lossy().into_owned());
        }
    }
    segments
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests;
