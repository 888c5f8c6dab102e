//! Type expressions found in trait signatures, with every path rewritten
//! for the module a mock is generated into.

use std::collections::{BTreeSet, HashSet};

use tree_sitter::Node;

use crate::error::GenError;
use crate::imports::{extract_uses, Import, UseItem};
use crate::mod_resolution::extract_mod_declarations;
use crate::package::{Package, Resolver};
use crate::treesitter::{named_children, squash, SourceFile};

/// A resolved type expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ty {
    /// A named type: `i32`, `store::Item`, `Vec<u8>`.
    Path { path: String, args: Vec<GenericArg> },
    Ref {
        lifetime: Option<String>,
        mutable: bool,
        inner: Box<Ty>,
    },
    Ptr { mutable: bool, inner: Box<Ty> },
    Array { elem: Box<Ty>, len: String },
    Slice(Box<Ty>),
    Tuple(Vec<Ty>),
    /// `(dyn A + Send)` behind a reference.
    Paren(Box<Ty>),
    Dyn(Vec<Bound>),
    Impl(Vec<Bound>),
    /// A function pointer or `Fn`-family sugar: `fn(i32) -> u8`, `FnMut(&str)`.
    Fn {
        head: String,
        params: Vec<Ty>,
        ret: Option<Box<Ty>>,
    },
    Never,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenericArg {
    Ty(Ty),
    Lifetime(String),
    /// `Item = u8`
    Binding { name: String, ty: Ty },
    Const(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bound {
    Trait {
        /// `for<'a>`
        for_lifetimes: Option<String>,
        /// `?Sized`
        maybe: bool,
        ty: Ty,
    },
    Lifetime(String),
}

/// How lifetimes are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// As written in the trait.
    Signature,
    /// Non-`'static` lifetimes elided, for the `dyn Fn` types of return
    /// producers.
    Closure,
}

/// How generated code records an argument in the mock's argument list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    /// A clone of the owned argument.
    Clone,
    /// An owned copy of the borrowed value.
    ToOwned,
    /// A placeholder naming the type.
    Opaque,
}

impl Ty {
    pub fn named(path: impl Into<String>) -> Self {
        Ty::Path {
            path: path.into(),
            args: Vec::new(),
        }
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, Ty::Tuple(elems) if elems.is_empty())
    }

    pub fn render(&self, mode: Mode) -> String {
        let mut out = String::new();
        self.write(mode, &mut out);
        out
    }

    fn write(&self, mode: Mode, out: &mut String) {
        match self {
            Ty::Path { path, args } => {
                out.push_str(path);
                if !args.is_empty() {
                    out.push('<');
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        arg.write(mode, out);
                    }
                    out.push('>');
                }
            }
            Ty::Ref {
                lifetime,
                mutable,
                inner,
            } => {
                out.push('&');
                if let Some(l) = lifetime {
                    if mode == Mode::Signature || l == "'static" {
                        out.push_str(l);
                        out.push(' ');
                    }
                }
                if *mutable {
                    out.push_str("mut ");
                }
                inner.write(mode, out);
            }
            Ty::Ptr { mutable, inner } => {
                out.push_str(if *mutable { "*mut " } else { "*const " });
                inner.write(mode, out);
            }
            Ty::Array { elem, len } => {
                out.push('[');
                elem.write(mode, out);
                out.push_str("; ");
                out.push_str(len);
                out.push(']');
            }
            Ty::Slice(elem) => {
                out.push('[');
                elem.write(mode, out);
                out.push(']');
            }
            Ty::Tuple(elems) => {
                out.push('(');
                write_list(elems, mode, out);
                if elems.len() == 1 {
                    out.push(',');
                }
                out.push(')');
            }
            Ty::Paren(inner) => {
                out.push('(');
                inner.write(mode, out);
                out.push(')');
            }
            Ty::Dyn(bounds) => {
                out.push_str("dyn ");
                write_bounds(bounds, mode, out);
            }
            Ty::Impl(bounds) => {
                out.push_str("impl ");
                write_bounds(bounds, mode, out);
            }
            Ty::Fn { head, params, ret } => {
                out.push_str(head);
                out.push('(');
                write_list(params, mode, out);
                out.push(')');
                if let Some(ret) = ret {
                    out.push_str(" -> ");
                    ret.write(mode, out);
                }
            }
            Ty::Never => out.push('!'),
        }
    }

    /// Whether this type or any type nested in it satisfies `f`.
    pub fn any(&self, f: &dyn Fn(&Ty) -> bool) -> bool {
        if f(self) {
            return true;
        }
        match self {
            Ty::Path { args, .. } => args.iter().any(|a| match a {
                GenericArg::Ty(t) | GenericArg::Binding { ty: t, .. } => t.any(f),
                _ => false,
            }),
            Ty::Ref { inner, .. } | Ty::Ptr { inner, .. } | Ty::Paren(inner) => inner.any(f),
            Ty::Array { elem, .. } | Ty::Slice(elem) => elem.any(f),
            Ty::Tuple(elems) => elems.iter().any(|t| t.any(f)),
            Ty::Dyn(bounds) | Ty::Impl(bounds) => bounds.iter().any(|b| match b {
                Bound::Trait { ty, .. } => ty.any(f),
                Bound::Lifetime(_) => false,
            }),
            Ty::Fn { params, ret, .. } => {
                params.iter().any(|t| t.any(f)) || ret.as_ref().is_some_and(|r| r.any(f))
            }
            Ty::Never => false,
        }
    }

    pub fn has_impl(&self) -> bool {
        self.any(&|t| matches!(t, Ty::Impl(_)))
    }

    pub fn has_ref(&self) -> bool {
        self.any(&|t| matches!(t, Ty::Ref { .. }))
    }

    /// Whether the type mentions a lifetime other than `'static`, elided
    /// reference lifetimes included.
    pub fn borrows(&self) -> bool {
        self.any(&|t| match t {
            Ty::Ref { lifetime, .. } => lifetime.as_deref() != Some("'static"),
            Ty::Path { args, .. } => args
                .iter()
                .any(|a| matches!(a, GenericArg::Lifetime(l) if l != "'static")),
            Ty::Dyn(bounds) | Ty::Impl(bounds) => bounds
                .iter()
                .any(|b| matches!(b, Bound::Lifetime(l) if l != "'static")),
            _ => false,
        })
    }

    /// How an argument of this type is recorded.
    pub fn capture(&self) -> Capture {
        match self {
            Ty::Ref { inner, .. } => {
                let unsized_dyn = matches!(**inner, Ty::Dyn(_))
                    || matches!(&**inner, Ty::Paren(t) if matches!(**t, Ty::Dyn(_)));
                if unsized_dyn || inner.has_impl() || inner.borrows() {
                    Capture::Opaque
                } else {
                    Capture::ToOwned
                }
            }
            _ if self.has_impl() || self.borrows() => Capture::Opaque,
            _ => Capture::Clone,
        }
    }
}

impl GenericArg {
    fn write(&self, mode: Mode, out: &mut String) {
        match self {
            GenericArg::Ty(t) => t.write(mode, out),
            GenericArg::Lifetime(l) => out.push_str(lifetime_for(l, mode)),
            GenericArg::Binding { name, ty } => {
                out.push_str(name);
                out.push_str(" = ");
                ty.write(mode, out);
            }
            GenericArg::Const(c) => out.push_str(c),
        }
    }
}

fn lifetime_for(l: &str, mode: Mode) -> &str {
    if mode == Mode::Closure && l != "'static" {
        "'_"
    } else {
        l
    }
}

fn write_list(tys: &[Ty], mode: Mode, out: &mut String) {
    for (i, t) in tys.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        t.write(mode, out);
    }
}

fn write_bounds(bounds: &[Bound], mode: Mode, out: &mut String) {
    for (i, b) in bounds.iter().enumerate() {
        if i > 0 {
            out.push_str(" + ");
        }
        match b {
            Bound::Trait {
                for_lifetimes,
                maybe,
                ty,
            } => {
                if let Some(f) = for_lifetimes {
                    out.push_str(f);
                    out.push(' ');
                }
                if *maybe {
                    out.push('?');
                }
                ty.write(mode, out);
            }
            Bound::Lifetime(l) => out.push_str(lifetime_for(l, mode)),
        }
    }
}

/// Names the prelude brings into every module.
const PRELUDE: &[&str] = &[
    "AsMut", "AsRef", "Box", "Clone", "Copy", "Default", "DoubleEndedIterator", "Drop", "Eq",
    "ExactSizeIterator", "Extend", "Fn", "FnMut", "FnOnce", "From", "FromIterator", "Into",
    "IntoIterator", "Iterator", "Option", "Ord", "PartialEq", "PartialOrd", "Result", "Send",
    "Sized", "String", "Sync", "ToOwned", "ToString", "TryFrom", "TryInto", "Unpin", "Vec",
];

pub fn is_prelude(name: &str) -> bool {
    PRELUDE.contains(&name)
}

/// Where a path written in a module leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Norm {
    /// Segments below the root of the module's own crate.
    Internal(Vec<String>),
    /// A std or external crate path, kept as written.
    External(String),
}

/// An item declared in a workspace module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRef {
    pub module: Package,
    pub name: String,
}

/// The names visible in one module file.
pub struct ModuleScope {
    pub pkg: Package,
    pub file: SourceFile,
    uses: Vec<UseItem>,
    declared: HashSet<String>,
    child_mods: HashSet<String>,
    globs: Vec<(Package, HashSet<String>)>,
}

impl ModuleScope {
    /// Parses `pkg`'s module file and the modules its glob imports name.
    pub fn load(resolver: &mut Resolver, pkg: &Package) -> Result<Self, GenError> {
        let file = SourceFile::read(&pkg.file)?;
        let mut scope = Self {
            pkg: pkg.clone(),
            uses: extract_uses(&file),
            declared: declared_items(&file),
            child_mods: extract_mod_declarations(&file)
                .into_iter()
                .map(|m| m.name)
                .collect(),
            file,
            globs: Vec::new(),
        };

        let glob_paths: Vec<String> = scope
            .uses
            .iter()
            .filter(|u| u.glob)
            .map(|u| u.import.path.clone())
            .collect();
        for path in glob_paths {
            let Norm::Internal(segments) = scope.normalize(&path)? else {
                continue;
            };
            let loaded = resolver.module_in(&scope.pkg, &segments).and_then(|m| {
                let f = SourceFile::read(&m.file)?;
                Ok((m, declared_items(&f)))
            });
            match loaded {
                Ok(found) => scope.globs.push(found),
                Err(e) => tracing::debug!(glob = %path, error = %e, "skipping glob import"),
            }
        }
        Ok(scope)
    }

    pub fn declares(&self, name: &str) -> bool {
        self.declared.contains(name)
    }

    /// Rewrites a path written in this module relative to its crate root.
    pub fn normalize(&self, path: &str) -> Result<Norm, GenError> {
        let segments: Vec<&str> = path.split("::").collect();
        let here = &self.pkg.module_path;
        let tail = |from: usize| segments[from..].iter().map(|s| s.to_string());
        let norm = match segments[0] {
            "crate" => Norm::Internal(tail(1).collect()),
            "self" => Norm::Internal(here.iter().cloned().chain(tail(1)).collect()),
            "super" => {
                let ups = segments.iter().take_while(|s| **s == "super").count();
                if ups > here.len() {
                    return Err(GenError::InvalidImportInstance {
                        path: path.to_string(),
                        module: self.pkg.spec.clone(),
                    });
                }
                Norm::Internal(
                    here[..here.len() - ups]
                        .iter()
                        .cloned()
                        .chain(tail(ups))
                        .collect(),
                )
            }
            first if self.child_mods.contains(first) => {
                Norm::Internal(here.iter().cloned().chain(tail(0)).collect())
            }
            _ => Norm::External(path.to_string()),
        };
        Ok(norm)
    }

    /// Absolute path of `segments` (below this crate's root) as written in
    /// `dst`.
    fn internal_path(&self, segments: &[String], dst: &Package) -> String {
        let root = if self.pkg.same_crate(dst) {
            "crate"
        } else {
            self.pkg.crate_name.as_str()
        };
        std::iter::once(root)
            .chain(segments.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join("::")
    }

    /// `import` rewritten for `dst`.
    fn carry(&self, import: &Import, dst: &Package) -> Result<Import, GenError> {
        let path = match self.normalize(&import.path)? {
            Norm::Internal(segments) => self.internal_path(&segments, dst),
            Norm::External(p) => p,
        };
        Ok(Import {
            path,
            alias: import.alias.clone(),
        })
    }

    /// The non-glob import binding `name`.
    pub fn import_named(&self, name: &str) -> Option<&Import> {
        self.uses
            .iter()
            .filter(|u| !u.glob)
            .map(|u| &u.import)
            .find(|i| i.name() == name)
    }

    /// Finds the module item a single name refers to: declared here or
    /// found through a glob import.
    pub fn local_item(&self, name: &str) -> Option<ItemRef> {
        if self.declared.contains(name) {
            return Some(ItemRef {
                module: self.pkg.clone(),
                name: name.to_string(),
            });
        }
        if self.import_named(name).is_some() {
            return None;
        }
        self.globs
            .iter()
            .find(|(_, names)| names.contains(name))
            .map(|(module, _)| ItemRef {
                module: module.clone(),
                name: name.to_string(),
            })
    }

    /// Resolves the type node `node` of this module's file for `dst`,
    /// collecting the imports the rendered type needs.
    pub fn resolve_type(
        &self,
        node: Node<'_>,
        dst: &Package,
        imports: &mut BTreeSet<Import>,
    ) -> Result<Ty, GenError> {
        Lower {
            scope: self,
            dst,
            imports,
        }
        .ty(node)
    }

    /// Resolves a path written in this module (a type or trait) to the text
    /// naming it from `dst`.
    pub fn resolve_path(
        &self,
        path: &str,
        dst: &Package,
        imports: &mut BTreeSet<Import>,
    ) -> Result<String, GenError> {
        Lower {
            scope: self,
            dst,
            imports,
        }
        .path_text(path)
    }
}

/// Renders `item` as seen from the generated file, a child module of
/// `dst`.
pub fn item_path(item: &ItemRef, dst: &Package, imports: &mut BTreeSet<Import>) -> String {
    let module = &item.module;
    if module.file == dst.file {
        imports.insert(Import::new(format!("super::{}", item.name)));
        item.name.clone()
    } else if module.is_crate_root() {
        format!("{}::{}", module.path_from(dst), item.name)
    } else {
        imports.insert(Import::new(module.path_from(dst)));
        format!("{}::{}", module.ident, item.name)
    }
}

/// Names of the type-like items declared at the top level of `file`.
fn declared_items(file: &SourceFile) -> HashSet<String> {
    named_children(file.root())
        .into_iter()
        .filter(|n| {
            matches!(
                n.kind(),
                "struct_item" | "enum_item" | "union_item" | "type_item" | "trait_item"
            )
        })
        .filter_map(|n| n.child_by_field_name("name"))
        .map(|n| file.text(n).to_string())
        .collect()
}

fn has_kind(node: Node<'_>, kind: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|c| c.kind() == kind);
    found
}

fn flatten_bounded<'t>(node: Node<'t>, out: &mut Vec<Node<'t>>) {
    for child in named_children(node) {
        if child.kind() == "bounded_type" {
            flatten_bounded(child, out);
        } else {
            out.push(child);
        }
    }
}

fn unsupported(what: impl Into<String>) -> GenError {
    GenError::Unsupported(what.into())
}

struct Lower<'s, 'i> {
    scope: &'s ModuleScope,
    dst: &'s Package,
    imports: &'i mut BTreeSet<Import>,
}

impl Lower<'_, '_> {
    fn text(&self, node: Node<'_>) -> String {
        squash(self.scope.file.text(node))
    }

    fn field_ty(&mut self, node: Node<'_>, field: &str) -> Result<Ty, GenError> {
        let child = node
            .child_by_field_name(field)
            .ok_or_else(|| unsupported(format!("type `{}`", self.text(node))))?;
        self.ty(child)
    }

    fn ty(&mut self, node: Node<'_>) -> Result<Ty, GenError> {
        match node.kind() {
            "primitive_type" => Ok(Ty::named(self.text(node))),
            "type_identifier" | "identifier" => {
                let name = self.text(node);
                Ok(Ty::named(self.name(&name)?))
            }
            "scoped_type_identifier" | "scoped_identifier" => {
                let path = self.text(node);
                Ok(Ty::named(self.path_text(&path)?))
            }
            "generic_type" => {
                let base = node
                    .child_by_field_name("type")
                    .ok_or_else(|| unsupported(format!("type `{}`", self.text(node))))?;
                let base_text = self.text(base);
                let path = if base.kind() == "type_identifier" {
                    self.name(&base_text)?
                } else {
                    self.path_text(&base_text)?
                };
                let mut args = Vec::new();
                if let Some(list) = node.child_by_field_name("type_arguments") {
                    for arg in named_children(list) {
                        args.push(self.generic_arg(arg)?);
                    }
                }
                Ok(Ty::Path { path, args })
            }
            "reference_type" => {
                let lifetime = named_children(node)
                    .into_iter()
                    .find(|c| c.kind() == "lifetime")
                    .map(|c| self.text(c));
                Ok(Ty::Ref {
                    lifetime,
                    mutable: has_kind(node, "mutable_specifier"),
                    inner: Box::new(self.field_ty(node, "type")?),
                })
            }
            "pointer_type" => Ok(Ty::Ptr {
                mutable: has_kind(node, "mutable_specifier"),
                inner: Box::new(self.field_ty(node, "type")?),
            }),
            "array_type" => {
                let elem = Box::new(self.field_ty(node, "element")?);
                Ok(match node.child_by_field_name("length") {
                    Some(len) => Ty::Array {
                        elem,
                        len: self.text(len),
                    },
                    None => Ty::Slice(elem),
                })
            }
            "tuple_type" => {
                let mut elems = Vec::new();
                for child in named_children(node) {
                    elems.push(self.ty(child)?);
                }
                if elems.len() == 1 && !has_kind(node, ",") {
                    return Ok(Ty::Paren(Box::new(elems.remove(0))));
                }
                Ok(Ty::Tuple(elems))
            }
            "unit_type" => Ok(Ty::Tuple(Vec::new())),
            "never_type" => Ok(Ty::Never),
            "dynamic_type" | "abstract_type" | "bounded_type" => self.bounded(node),
            "function_type" => {
                let (ty, extra) = self.function(node)?;
                if !extra.is_empty() {
                    return Err(unsupported(format!("type `{}`", self.text(node))));
                }
                Ok(ty)
            }
            _ => Err(unsupported(format!("type `{}`", self.text(node)))),
        }
    }

    fn generic_arg(&mut self, node: Node<'_>) -> Result<GenericArg, GenError> {
        match node.kind() {
            "lifetime" => Ok(GenericArg::Lifetime(self.text(node))),
            "type_binding" => {
                if node.child_by_field_name("type_arguments").is_some() {
                    return Err(unsupported(format!(
                        "generic associated type binding `{}`",
                        self.text(node)
                    )));
                }
                let name = node
                    .child_by_field_name("name")
                    .map(|n| self.text(n))
                    .unwrap_or_default();
                Ok(GenericArg::Binding {
                    name,
                    ty: self.field_ty(node, "type")?,
                })
            }
            "block" | "integer_literal" | "string_literal" | "char_literal" | "boolean_literal"
            | "float_literal" | "negative_literal" => Ok(GenericArg::Const(self.text(node))),
            "trait_bounds" => Err(unsupported(format!(
                "bounds in generic arguments `{}`",
                self.text(node)
            ))),
            _ => Ok(GenericArg::Ty(self.ty(node)?)),
        }
    }

    fn bounded(&mut self, node: Node<'_>) -> Result<Ty, GenError> {
        let mut bounds = Vec::new();
        let mut is_impl = false;
        self.collect_bounds(node, &mut bounds, &mut is_impl)?;
        Ok(if is_impl {
            Ty::Impl(bounds)
        } else {
            Ty::Dyn(bounds)
        })
    }

    fn collect_bounds(
        &mut self,
        node: Node<'_>,
        out: &mut Vec<Bound>,
        is_impl: &mut bool,
    ) -> Result<(), GenError> {
        match node.kind() {
            "bounded_type" | "trait_bounds" => {
                for child in named_children(node) {
                    self.collect_bounds(child, out, is_impl)?;
                }
            }
            "dynamic_type" | "abstract_type" => {
                if node.kind() == "abstract_type" {
                    *is_impl = true;
                }
                if let Some(t) = node.child_by_field_name("trait") {
                    self.collect_bounds(t, out, is_impl)?;
                }
            }
            "lifetime" => out.push(Bound::Lifetime(self.text(node))),
            "function_type" => {
                let (ty, extra) = self.function(node)?;
                out.push(Bound::Trait {
                    for_lifetimes: None,
                    maybe: false,
                    ty,
                });
                out.extend(extra);
            }
            "removed_trait_bound" => {
                let inner = named_children(node)
                    .into_iter()
                    .next()
                    .ok_or_else(|| unsupported(format!("bound `{}`", self.text(node))))?;
                out.push(Bound::Trait {
                    for_lifetimes: None,
                    maybe: true,
                    ty: self.ty(inner)?,
                });
            }
            "higher_ranked_trait_bound" => {
                let params = node
                    .child_by_field_name("type_parameters")
                    .map(|p| self.text(p))
                    .unwrap_or_default();
                out.push(Bound::Trait {
                    for_lifetimes: Some(format!("for{params}")),
                    maybe: false,
                    ty: self.field_ty(node, "type")?,
                });
            }
            _ => out.push(Bound::Trait {
                for_lifetimes: None,
                maybe: false,
                ty: self.ty(node)?,
            }),
        }
        Ok(())
    }

    /// A function type. In `dyn Fn() -> R + Send` the parser may attach
    /// `+ Send` to the return type; those bounds are split off and returned
    /// separately.
    fn function(&mut self, node: Node<'_>) -> Result<(Ty, Vec<Bound>), GenError> {
        let params_node = node
            .child_by_field_name("parameters")
            .ok_or_else(|| unsupported(format!("type `{}`", self.text(node))))?;
        let head = match node.child_by_field_name("trait") {
            Some(t) => {
                let text = self.text(t);
                let path = if t.kind() == "type_identifier" {
                    self.name(&text)?
                } else {
                    self.path_text(&text)?
                };
                match named_children(node)
                    .into_iter()
                    .find(|c| c.kind() == "for_lifetimes")
                {
                    Some(f) => format!("{} {path}", self.text(f)),
                    None => path,
                }
            }
            None => {
                let source = &self.scope.file.source;
                let prefix = source
                    .get(node.start_byte()..params_node.start_byte())
                    .unwrap_or("fn");
                squash(prefix)
            }
        };

        let mut params = Vec::new();
        for p in named_children(params_node) {
            match p.kind() {
                "attribute_item" => {}
                "parameter" => params.push(self.field_ty(p, "type")?),
                "variadic_parameter" => {
                    return Err(unsupported(format!(
                        "C variadic function type `{}`",
                        self.text(node)
                    )))
                }
                _ => params.push(self.ty(p)?),
            }
        }
        let mut extra = Vec::new();
        let ret = match node.child_by_field_name("return_type") {
            Some(r) if r.kind() == "bounded_type" => {
                let mut parts = Vec::new();
                flatten_bounded(r, &mut parts);
                let (first, rest) = parts
                    .split_first()
                    .ok_or_else(|| unsupported(format!("type `{}`", self.text(node))))?;
                let mut ignored = false;
                for part in rest {
                    self.collect_bounds(*part, &mut extra, &mut ignored)?;
                }
                Some(Box::new(self.ty(*first)?))
            }
            Some(r) => Some(Box::new(self.ty(r)?)),
            None => None,
        };
        Ok((Ty::Fn { head, params, ret }, extra))
    }

    /// A single-segment name.
    fn name(&mut self, name: &str) -> Result<String, GenError> {
        if name == "Self" {
            return Ok(name.to_string());
        }
        if let Some(item) = self.scope.local_item(name) {
            return Ok(item_path(&item, self.dst, self.imports));
        }
        if let Some(import) = self.scope.import_named(name) {
            let carried = self.scope.carry(import, self.dst)?;
            self.imports.insert(carried);
            return Ok(name.to_string());
        }
        if is_prelude(name) {
            return Ok(name.to_string());
        }
        Err(GenError::UnknownType {
            name: name.to_string(),
            module: self.scope.pkg.spec.clone(),
        })
    }

    /// A path that may span several segments.
    fn path_text(&mut self, text: &str) -> Result<String, GenError> {
        let compact: String = text.split_whitespace().collect();
        if compact.contains('<') {
            return Err(unsupported(format!("qualified path `{compact}`")));
        }
        let path = compact.trim_start_matches("::");
        let segments: Vec<&str> = path.split("::").collect();
        if segments.len() == 1 {
            return self.name(path);
        }

        let first = segments[0];
        if first == "Self" {
            return Err(unsupported(format!("associated type `{path}`")));
        }
        if matches!(first, "crate" | "self" | "super") {
            return match self.scope.normalize(path)? {
                Norm::Internal(segments) => Ok(self.scope.internal_path(&segments, self.dst)),
                Norm::External(p) => Ok(p),
            };
        }
        if let Some(import) = self.scope.import_named(first) {
            let carried = self.scope.carry(import, self.dst)?;
            self.imports.insert(carried);
            return Ok(path.to_string());
        }
        if self.scope.child_mods.contains(first) {
            if let Norm::Internal(segments) = self.scope.normalize(path)? {
                return Ok(self.scope.internal_path(&segments, self.dst));
            }
        }
        if self.scope.declared.contains(first) {
            return Err(unsupported(format!("associated item path `{path}`")));
        }
        Ok(path.to_string())
    }
}
