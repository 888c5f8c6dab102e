//! Trait lookup and the method model mocks are generated from.
//!
//! [`parse_interface`] finds a trait in a module, expands its supertraits
//! depth-first and resolves every signature for the module the mock is
//! generated into.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::PathBuf;
use std::rc::Rc;

use tree_sitter::Node;

use crate::error::GenError;
use crate::imports::{is_std_root, Import};
use crate::package::{Package, Resolver};
use crate::treesitter::{named_children, squash, SourceFile};
use crate::types::{item_path, is_prelude, Bound, Capture, GenericArg, ItemRef, ModuleScope, Mode, Norm, Ty};

/// Supertraits a mock satisfies without an impl block of its own.
const SKIPPED_SUPERTRAITS: &[&str] = &[
    "Any",
    "Clone",
    "Debug",
    "RefUnwindSafe",
    "Send",
    "Sized",
    "Sync",
    "Unpin",
    "UnwindSafe",
];

#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Treat a trailing `&[T]` parameter as variadic.
    pub variadic_slices: bool,
}

/// A trait to mock, with its supertraits expanded.
#[derive(Debug, Clone)]
pub struct Interface {
    pub name: String,
    /// The trait itself first, then its supertraits in depth-first order.
    pub traits: Vec<TraitImpl>,
    /// Methods of every trait, the first declaration of a name winning.
    pub methods: Vec<Method>,
    /// Imports the rendered signatures and trait paths need.
    pub imports: BTreeSet<Import>,
}

/// One `impl` block of a generated mock.
#[derive(Debug, Clone)]
pub struct TraitImpl {
    pub name: String,
    /// The trait as named from the generated file.
    pub path: String,
    pub is_unsafe: bool,
    /// Attribute to repeat on the impl block, e.g. `#[async_trait::async_trait]`.
    pub attribute: Option<String>,
    pub methods: Vec<Method>,
}

#[derive(Debug, Clone)]
pub struct Method {
    pub name: String,
    pub trait_path: String,
    /// `async`, `unsafe`, `extern "C"`, in source order.
    pub modifiers: Option<String>,
    /// Lifetime parameters, `<'a>`.
    pub lifetimes: Option<String>,
    /// `&self`, `&mut self`, `self: Box<Self>`, ...
    pub receiver: String,
    pub params: Vec<Param>,
    pub ret: Option<Ty>,
    pub where_clause: Option<String>,
    /// The last parameter is a `&[T]` whose elements are recorded one by one.
    pub variadic: bool,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    /// The trait left the parameter unnamed and `name` was made up.
    pub anonymous: bool,
    pub ty: Ty,
    pub capture: Capture,
}

impl Interface {
    pub fn method(&self, name: &str) -> Result<&Method, GenError> {
        self.methods
            .iter()
            .find(|m| m.name == name)
            .ok_or_else(|| GenError::UnknownMethod {
                interface: self.name.clone(),
                method: name.to_string(),
            })
    }
}

impl Method {
    pub fn is_async(&self) -> bool {
        self.modifiers
            .as_deref()
            .is_some_and(|m| m.split_whitespace().any(|w| w == "async"))
    }

    /// Types of the return positions: one per tuple element, none for `()`.
    pub fn returns(&self) -> Vec<&Ty> {
        match &self.ret {
            None => Vec::new(),
            Some(Ty::Tuple(elems)) => elems.iter().collect(),
            Some(t) => vec![t],
        }
    }

    /// Element type of the variadic parameter.
    pub fn variadic_elem(&self) -> Option<&Ty> {
        if !self.variadic {
            return None;
        }
        match self.params.last().map(|p| &p.ty) {
            Some(Ty::Ref { inner, .. }) => match &**inner {
                Ty::Slice(elem) => Some(elem),
                _ => None,
            },
            _ => None,
        }
    }

    /// Whether configured returns may be produced by a function of the
    /// arguments. `impl Trait` arguments cannot be named in its type.
    pub fn forwards(&self) -> bool {
        !self.params.iter().any(|p| p.ty.has_impl())
    }

    /// `dyn Fn(<args>) -> <ret> + Send + Sync`
    pub fn producer_type(&self, ret: &Ty) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|p| p.ty.render(Mode::Closure))
            .collect();
        format!(
            "dyn Fn({}) -> {} + Send + Sync",
            params.join(", "),
            ret.render(Mode::Closure)
        )
    }

    /// The method's signature as written in the generated impl.
    pub fn signature(&self) -> String {
        let mut out = String::new();
        if let Some(m) = &self.modifiers {
            out.push_str(m);
            out.push(' ');
        }
        out.push_str("fn ");
        out.push_str(&self.name);
        if let Some(l) = &self.lifetimes {
            out.push_str(l);
        }
        out.push('(');
        out.push_str(&self.receiver);
        for p in &self.params {
            out.push_str(", ");
            out.push_str(&p.name);
            out.push_str(": ");
            out.push_str(&p.ty.render(Mode::Signature));
        }
        out.push(')');
        if let Some(ret) = &self.ret {
            out.push_str(" -> ");
            out.push_str(&ret.render(Mode::Signature));
        }
        if let Some(w) = &self.where_clause {
            out.push(' ');
            out.push_str(w);
        }
        out
    }
}

/// Finds trait `name` in `src` and builds its model for a mock generated
/// into `dst`.
pub fn parse_interface(
    resolver: &mut Resolver,
    src: &Package,
    dst: &Package,
    name: &str,
    opts: &ParseOptions,
) -> Result<Interface, GenError> {
    let mut walker = Walker {
        resolver,
        dst,
        opts,
        scopes: HashMap::new(),
        visited: HashSet::new(),
        traits: Vec::new(),
        imports: BTreeSet::new(),
    };
    walker.visit(&ItemRef {
        module: src.clone(),
        name: name.to_string(),
    })?;

    let mut seen = HashSet::new();
    let methods: Vec<Method> = walker
        .traits
        .iter()
        .flat_map(|t| t.methods.iter())
        .filter(|m| seen.insert(m.name.clone()))
        .cloned()
        .collect();
    if methods.is_empty() {
        return Err(GenError::NoMethods(name.to_string()));
    }
    tracing::debug!(
        trait_name = name,
        traits = walker.traits.len(),
        methods = methods.len(),
        "parsed trait"
    );
    Ok(Interface {
        name: name.to_string(),
        traits: walker.traits,
        methods,
        imports: walker.imports,
    })
}

struct Walker<'r> {
    resolver: &'r mut Resolver,
    dst: &'r Package,
    opts: &'r ParseOptions,
    scopes: HashMap<PathBuf, Rc<ModuleScope>>,
    visited: HashSet<(PathBuf, String)>,
    traits: Vec<TraitImpl>,
    imports: BTreeSet<Import>,
}

impl Walker<'_> {
    fn scope(&mut self, pkg: &Package) -> Result<Rc<ModuleScope>, GenError> {
        if let Some(s) = self.scopes.get(&pkg.file) {
            return Ok(s.clone());
        }
        let scope = Rc::new(ModuleScope::load(self.resolver, pkg)?);
        self.scopes.insert(pkg.file.clone(), scope.clone());
        Ok(scope)
    }

    fn visit(&mut self, item: &ItemRef) -> Result<(), GenError> {
        if !self
            .visited
            .insert((item.module.file.clone(), item.name.clone()))
        {
            return Ok(());
        }
        let scope = self.scope(&item.module)?;
        let file = &scope.file;
        let node = find_trait(file, &item.name).ok_or_else(|| GenError::UnknownInterface {
            name: item.name.clone(),
            module: item.module.spec.clone(),
        })?;
        if let Some(params) = node.child_by_field_name("type_parameters") {
            return Err(GenError::Unsupported(format!(
                "generic trait {}{}",
                item.name,
                squash(file.text(params))
            )));
        }

        let path = item_path(item, self.dst, &mut self.imports);
        let mut methods = Vec::new();
        if let Some(body) = node.child_by_field_name("body") {
            for child in named_children(body) {
                match child.kind() {
                    "function_signature_item" | "function_item" => {
                        methods.push(self.method(&scope, child, &path)?);
                    }
                    "attribute_item" | "inner_attribute_item" | "empty_statement" => {}
                    "associated_type" => {
                        return Err(GenError::Unsupported(format!(
                            "associated type in trait {}",
                            item.name
                        )))
                    }
                    "const_item" => {
                        return Err(GenError::Unsupported(format!(
                            "associated const in trait {}",
                            item.name
                        )))
                    }
                    other => {
                        return Err(GenError::Unsupported(format!(
                            "{other} in trait {}",
                            item.name
                        )))
                    }
                }
            }
        }

        self.traits.push(TraitImpl {
            name: item.name.clone(),
            path,
            is_unsafe: has_token(node, "unsafe"),
            attribute: async_trait_attribute(file, node),
            methods,
        });

        if let Some(bounds) = node.child_by_field_name("bounds") {
            for bound in named_children(bounds) {
                if let Some(next) = self.supertrait(&scope, bound, &item.name)? {
                    self.visit(&next)?;
                }
            }
        }
        Ok(())
    }

    /// Resolves a supertrait bound. `None` for bounds the mock satisfies
    /// without an impl block.
    fn supertrait(
        &mut self,
        scope: &ModuleScope,
        node: Node<'_>,
        trait_name: &str,
    ) -> Result<Option<ItemRef>, GenError> {
        let text = squash(scope.file.text(node));
        match node.kind() {
            "lifetime" | "removed_trait_bound" => Ok(None),
            "type_identifier" => {
                if let Some(item) = scope.local_item(&text) {
                    return Ok(Some(item));
                }
                if let Some(import) = scope.import_named(&text) {
                    return self.workspace_item(scope, &import.path);
                }
                if SKIPPED_SUPERTRAITS.contains(&text.as_str()) {
                    return Ok(None);
                }
                if is_prelude(&text) {
                    return Err(GenError::Unsupported(format!(
                        "supertrait {text} of {trait_name}"
                    )));
                }
                Err(GenError::UnknownInterface {
                    name: text,
                    module: scope.pkg.spec.clone(),
                })
            }
            "scoped_type_identifier" => {
                let compact: String = text.split_whitespace().collect();
                let path = compact.trim_start_matches("::");
                let (first, rest) = path.split_once("::").unwrap_or((path, ""));
                match scope.import_named(first) {
                    Some(import) => {
                        let full = format!("{}::{rest}", import.path);
                        self.workspace_item(scope, &full)
                    }
                    None => self.workspace_item(scope, path),
                }
            }
            _ => Err(GenError::Unsupported(format!(
                "supertrait {text} of {trait_name}"
            ))),
        }
    }

    /// The trait at `path`, written in `scope`'s module.
    fn workspace_item(&mut self, scope: &ModuleScope, path: &str) -> Result<Option<ItemRef>, GenError> {
        match scope.normalize(path)? {
            Norm::Internal(mut segments) => {
                let Some(name) = segments.pop() else {
                    return Err(GenError::InvalidImportInstance {
                        path: path.to_string(),
                        module: scope.pkg.spec.clone(),
                    });
                };
                let module = self.resolver.module_in(&scope.pkg, &segments)?;
                Ok(Some(ItemRef { module, name }))
            }
            Norm::External(p) => {
                let root = p.split("::").next().unwrap_or_default();
                let last = p.rsplit("::").next().unwrap_or_default();
                if is_std_root(root) && SKIPPED_SUPERTRAITS.contains(&last) {
                    return Ok(None);
                }
                Err(GenError::Unsupported(format!(
                    "supertrait {p} outside the workspace"
                )))
            }
        }
    }

    fn method(&mut self, scope: &ModuleScope, node: Node<'_>, trait_path: &str) -> Result<Method, GenError> {
        let file = &scope.file;
        let name = node
            .child_by_field_name("name")
            .map(|n| file.text(n).to_string())
            .unwrap_or_default();
        let qualified = format!("{trait_path}::{name}");

        let modifiers = named_children(node)
            .into_iter()
            .find(|c| c.kind() == "function_modifiers")
            .map(|c| squash(file.text(c)));
        if modifiers
            .as_deref()
            .is_some_and(|m| m.split_whitespace().any(|w| w == "const"))
        {
            return Err(GenError::Unsupported(format!("const method {qualified}")));
        }

        let lifetimes = match node.child_by_field_name("type_parameters") {
            Some(tp) => {
                let only_lifetimes = named_children(tp)
                    .iter()
                    .all(|p| p.kind() == "attribute_item" || file.text(*p).starts_with('\''));
                if !only_lifetimes {
                    return Err(GenError::Unsupported(format!(
                        "generic method {qualified}{}",
                        squash(file.text(tp))
                    )));
                }
                Some(squash(file.text(tp)))
            }
            None => None,
        };

        let mut receiver = None;
        let mut params = Vec::new();
        if let Some(list) = node.child_by_field_name("parameters") {
            for p in named_children(list) {
                match p.kind() {
                    "attribute_item" => {}
                    "self_parameter" => receiver = Some(squash(file.text(p))),
                    "variadic_parameter" => {
                        return Err(GenError::Unsupported(format!(
                            "C variadic method {qualified}"
                        )))
                    }
                    "parameter" => {
                        let pattern = p.child_by_field_name("pattern");
                        let pattern_text = pattern.map(|n| file.text(n)).unwrap_or("");
                        if receiver.is_none() && params.is_empty() && pattern_text == "self" {
                            receiver = Some(squash(file.text(p)));
                            continue;
                        }
                        let ty_node = p.child_by_field_name("type").ok_or_else(|| {
                            GenError::Unsupported(format!("parameter of {qualified}"))
                        })?;
                        let named = pattern.filter(|n| n.kind() == "identifier" && file.text(*n) != "_");
                        params.push(self.param(scope, ty_node, named.map(|n| file.text(n)), params.len())?);
                    }
                    _ => params.push(self.param(scope, p, None, params.len())?),
                }
            }
        }
        let receiver = receiver.ok_or_else(|| {
            GenError::Unsupported(format!("method {qualified} has no self receiver"))
        })?;

        let ret = match node.child_by_field_name("return_type") {
            Some(r) => {
                let ty = scope.resolve_type(r, self.dst, &mut self.imports)?;
                if ty.has_impl() || borrows_outside_fn(&ty) || ty == Ty::Never {
                    return Err(GenError::Unsupported(format!(
                        "return type {} of {qualified}",
                        ty.render(Mode::Signature)
                    )));
                }
                (!ty.is_unit()).then_some(ty)
            }
            None => None,
        };

        let where_clause = named_children(node)
            .into_iter()
            .find(|c| c.kind() == "where_clause")
            .map(|c| squash(file.text(c)));

        let variadic = self.opts.variadic_slices
            && matches!(
                params.last().map(|p: &Param| &p.ty),
                Some(Ty::Ref { mutable: false, inner, .. }) if matches!(**inner, Ty::Slice(_))
            );

        Ok(Method {
            name,
            trait_path: trait_path.to_string(),
            modifiers,
            lifetimes,
            receiver,
            params,
            ret,
            where_clause,
            variadic,
        })
    }

    fn param(
        &mut self,
        scope: &ModuleScope,
        ty_node: Node<'_>,
        name: Option<&str>,
        index: usize,
    ) -> Result<Param, GenError> {
        let ty = scope.resolve_type(ty_node, self.dst, &mut self.imports)?;
        let (name, anonymous) = match name {
            Some(n) => (n.to_string(), false),
            None => (format!("_a{index}"), true),
        };
        Ok(Param {
            name,
            anonymous,
            capture: ty.capture(),
            ty,
        })
    }
}

fn find_trait<'f>(file: &'f SourceFile, name: &str) -> Option<Node<'f>> {
    named_children(file.root()).into_iter().find(|n| {
        n.kind() == "trait_item"
            && n.child_by_field_name("name")
                .is_some_and(|id| file.text(id) == name)
    })
}

fn has_token(node: Node<'_>, kind: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|c| c.kind() == kind);
    found
}

/// `#[async_trait::async_trait]` (with any arguments kept) when the trait
/// carries an `async_trait` attribute.
fn async_trait_attribute(file: &SourceFile, node: Node<'_>) -> Option<String> {
    let mut prev = node.prev_named_sibling();
    while let Some(attr) = prev {
        if attr.kind() != "attribute_item" {
            break;
        }
        let text: String = file.text(attr).split_whitespace().collect();
        if let Some(at) = text.rfind("async_trait") {
            let args = text[at + "async_trait".len()..].trim_end_matches(']');
            return Some(format!("#[async_trait::async_trait{args}]"));
        }
        prev = attr.prev_named_sibling();
    }
    None
}

/// Whether a return type borrows. Lifetimes inside function types are
/// bound by the function type itself and do not count.
fn borrows_outside_fn(ty: &Ty) -> bool {
    match ty {
        Ty::Fn { .. } => false,
        Ty::Ref { .. } => true,
        Ty::Path { args, .. } => args.iter().any(|a| match a {
            GenericArg::Lifetime(l) => l != "'static",
            GenericArg::Ty(t) | GenericArg::Binding { ty: t, .. } => borrows_outside_fn(t),
            GenericArg::Const(_) => false,
        }),
        Ty::Ptr { inner, .. } | Ty::Paren(inner) => borrows_outside_fn(inner),
        Ty::Array { elem, .. } | Ty::Slice(elem) => borrows_outside_fn(elem),
        Ty::Tuple(elems) => elems.iter().any(borrows_outside_fn),
        Ty::Dyn(bounds) | Ty::Impl(bounds) => bounds.iter().any(|b| match b {
            Bound::Lifetime(l) => l != "'static",
            Bound::Trait { ty, .. } => borrows_outside_fn(ty),
        }),
        Ty::Never => false,
    }
}

#[cfg(test)]
mod tests;
