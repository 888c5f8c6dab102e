//! Rendering a parsed trait as mock source.
//!
//! The generated type wraps a `Mock` and the test manager. Each trait
//! method records its arguments, dispatches to the mock and turns the
//! configured returns back into typed values:
//!
//! ```text
//! fn get(&self, key: &str) -> u32 {
//!     self.t.helper();
//!     let mut _args: Vec<mock::Value> = Vec::with_capacity(1);
//!     _args.push(mock::capture_ref!(key, str));
//!     let _rets = self.mock.call("get", mock::Arguments::from(_args));
//!     ...
//! }
//! ```

use mockkit_parsers::{Capture, GenError, Import, Interface, Method, Mode, TraitImpl, Ty};

use crate::imports;

pub const HEADER: &str = "// Code generated by mockkit. DO NOT EDIT.";

const RETURN_COUNT_MISMATCH: &str = "the number of mocked method returns does not match";

/// Locals of generated method bodies; parameters with these names are
/// renamed.
const RESERVED: &[&str] = &["_args", "_rets", "_f", "_v", "e"];

#[derive(Debug, Clone)]
pub struct EmitOptions {
    pub mock_name: String,
    /// Emit `on_<method>` helpers registering expectations.
    pub on_helpers: bool,
    pub runtime_crate: String,
    pub tester_path: String,
    pub tester_alias: Option<String>,
}

impl EmitOptions {
    fn tester_import(&self) -> Import {
        match &self.tester_alias {
            Some(alias) => Import::aliased(&self.tester_path, alias),
            None => Import::new(&self.tester_path),
        }
    }
}

/// Renders the mock source for `iface`.
pub fn emit(iface: &Interface, opts: &EmitOptions) -> Result<String, GenError> {
    let tester_import = opts.tester_import();
    if let Some(clash) = iface.imports.iter().find(|i| i.name() == opts.mock_name) {
        return Err(GenError::Unsupported(format!(
            "import {clash} shadows the mock type {}",
            opts.mock_name
        )));
    }
    let all = imports::collect(&iface.imports, &opts.runtime_crate, &tester_import)?;

    let mut w = Writer {
        out: String::new(),
        name: &opts.mock_name,
        tester: tester_import.name(),
    };
    w.out.push_str(HEADER);
    w.out.push_str("\n\n");
    w.out.push_str(&imports::render(&all));
    w.declaration(iface, opts.on_helpers);
    for t in &iface.traits {
        w.trait_impl(t);
    }
    Ok(w.out)
}

struct Writer<'a> {
    out: String,
    name: &'a str,
    tester: &'a str,
}

impl Writer<'_> {
    fn line(&mut self, indent: usize, text: &str) {
        if !text.is_empty() {
            for _ in 0..indent {
                self.out.push_str("    ");
            }
            self.out.push_str(text);
        }
        self.out.push('\n');
    }

    fn declaration(&mut self, iface: &Interface, on_helpers: bool) {
        let (name, tester) = (self.name, self.tester);
        let root = iface
            .traits
            .first()
            .map(|t| t.path.as_str())
            .unwrap_or(iface.name.as_str());

        self.line(0, "");
        self.line(0, &format!("/// Mock implementation of [`{root}`]."));
        self.line(0, "#[derive(Clone)]");
        self.line(0, &format!("pub struct {name} {{"));
        self.line(1, "pub mock: mock::Mock,");
        self.line(1, &format!("t: Arc<dyn {tester}::TestingT>,"));
        self.line(0, "}");
        self.line(0, "");
        self.line(0, &format!("impl {name} {{"));
        self.line(1, &format!("pub fn new(t: Arc<dyn {tester}::TestingT>) -> Self {{"));
        self.line(2, "Self {");
        self.line(3, "mock: mock::Mock::new(t.clone()),");
        self.line(3, "t,");
        self.line(2, "}");
        self.line(1, "}");
        if on_helpers {
            for m in &iface.methods {
                self.on_helper(&renamed(m));
            }
        }
        self.line(0, "}");
        self.line(0, "");
        self.line(0, &format!("impl std::fmt::Debug for {name} {{"));
        self.line(
            1,
            "fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {",
        );
        self.line(2, &format!("f.debug_struct(\"{name}\").finish_non_exhaustive()"));
        self.line(1, "}");
        self.line(0, "}");
    }

    fn on_helper(&mut self, m: &Method) {
        let mut params = vec!["&self".to_string()];
        let fixed = if m.variadic { m.params.len() - 1 } else { m.params.len() };
        for p in &m.params[..fixed] {
            params.push(format!("{}: impl mock::IntoValue", p.name));
        }
        let rest = m.variadic.then(|| &m.params[fixed].name);
        if let Some(rest) = rest {
            params.push(format!("{rest}: Vec<mock::Value>"));
        }
        let values: Vec<String> = m.params[..fixed]
            .iter()
            .map(|p| format!("mock::IntoValue::into_value({})", p.name))
            .collect();

        self.line(0, "");
        self.line(1, "#[track_caller]");
        self.line(
            1,
            &format!("pub fn on_{}({}) -> mock::Call {{", m.name, params.join(", ")),
        );
        match rest {
            Some(rest) => {
                self.line(2, &format!("let mut _args = vec![{}];", values.join(", ")));
                self.line(2, &format!("_args.extend({rest});"));
                self.line(
                    2,
                    &format!("self.mock.on(\"{}\", mock::Arguments::from(_args))", m.name),
                );
            }
            None if values.is_empty() => self.line(
                2,
                &format!("self.mock.on(\"{}\", mock::Arguments::new())", m.name),
            ),
            None => self.line(
                2,
                &format!(
                    "self.mock.on(\"{}\", mock::Arguments::from(vec![{}]))",
                    m.name,
                    values.join(", ")
                ),
            ),
        }
        self.line(1, "}");
    }

    fn trait_impl(&mut self, t: &TraitImpl) {
        self.line(0, "");
        if let Some(attr) = &t.attribute {
            self.line(0, attr);
        }
        let unsafety = if t.is_unsafe { "unsafe " } else { "" };
        if t.methods.is_empty() {
            self.line(0, &format!("{unsafety}impl {} for {} {{}}", t.path, self.name));
            return;
        }
        self.line(0, &format!("{unsafety}impl {} for {} {{", t.path, self.name));
        for (i, m) in t.methods.iter().enumerate() {
            if i > 0 {
                self.line(0, "");
            }
            self.method(&renamed(m));
        }
        self.line(0, "}");
    }

    fn method(&mut self, m: &Method) {
        let returns = m.returns();
        // Opaque arguments are only used when forwarded to a producer.
        let opaque = m.params.iter().any(|p| p.capture == Capture::Opaque);
        if opaque && (returns.is_empty() || !m.forwards()) {
            self.line(1, "#[allow(unused_variables)]");
        }
        self.line(1, &format!("{} {{", m.signature()));
        self.line(2, "self.t.helper();");
        self.record_args(m);

        let args = if m.params.is_empty() {
            "mock::Arguments::new()"
        } else {
            "mock::Arguments::from(_args)"
        };
        if returns.is_empty() {
            self.line(2, &format!("self.mock.call(\"{}\", {args});", m.name));
            self.line(1, "}");
            return;
        }
        self.line(2, &format!("let _rets = self.mock.call(\"{}\", {args});", m.name));
        self.line(2, &format!("if _rets.len() != {} {{", returns.len()));
        self.line(3, &format!("self.t.fatal(\"{RETURN_COUNT_MISMATCH}\");"));
        self.line(2, "}");
        for (i, ty) in returns.iter().enumerate() {
            self.return_position(m, i, ty, returns.len() > 1);
        }
        let names: Vec<String> = (0..returns.len()).map(|i| format!("_r{i}")).collect();
        match m.ret {
            Some(Ty::Tuple(_)) => self.line(2, &format!("({})", names.join(", "))),
            _ => self.line(2, &names.join(", ")),
        }
        self.line(1, "}");
    }

    fn record_args(&mut self, m: &Method) {
        let n = m.params.len();
        if n == 0 {
            return;
        }
        let capacity = match m.variadic_elem() {
            Some(_) => format!("{} + {}.len()", n - 1, m.params[n - 1].name),
            None => n.to_string(),
        };
        self.line(
            2,
            &format!("let mut _args: Vec<mock::Value> = Vec::with_capacity({capacity});"),
        );
        for (i, p) in m.params.iter().enumerate() {
            if i == n - 1 {
                if let Some(elem) = m.variadic_elem() {
                    self.line(2, &format!("for _v in {}.iter() {{", p.name));
                    self.line(3, &format!("_args.push({});", capture_expr("_v", elem, true)));
                    self.line(2, "}");
                    continue;
                }
            }
            self.line(2, &format!("_args.push({});", capture_expr(&p.name, &p.ty, false)));
        }
    }

    fn return_position(&mut self, m: &Method, i: usize, ty: &Ty, multiple: bool) {
        let ty_text = ty.render(Mode::Signature);
        let extract = format!("mock::returned!(_rets, {i}, {ty_text}).unwrap_or_else(|e| self.t.fatal(&e))");
        if !m.forwards() {
            self.line(2, &format!("let _r{i}: {ty_text} = {extract};"));
            return;
        }

        let producer = m.producer_type(ty);
        let call_args: Vec<String> = m.params.iter().map(|p| forward_arg(&p.name, &p.ty)).collect();
        let call = format!("_f({})", call_args.join(", "));
        let owned: Vec<_> = m
            .params
            .iter()
            .filter(|p| !matches!(p.ty, Ty::Ref { .. }))
            .collect();

        if multiple && !owned.is_empty() {
            // Each position needs its own copy of the owned arguments.
            let mut pattern = vec!["Some(_f)".to_string()];
            self.line(2, &format!("let _r{i}: {ty_text} = match ("));
            self.line(3, &format!("_rets.func::<{producer}>({i}),"));
            for p in &owned {
                self.line(
                    3,
                    &format!(
                        "mock::try_clone!(&{}, {}),",
                        p.name,
                        p.ty.render(Mode::Signature)
                    ),
                );
                pattern.push(format!("Some({})", p.name));
            }
            self.line(2, ") {");
            self.line(3, &format!("({}) => {call},", pattern.join(", ")));
            self.line(3, &format!("_ => {extract},"));
        } else {
            self.line(
                2,
                &format!("let _r{i}: {ty_text} = match _rets.func::<{producer}>({i}) {{"),
            );
            self.line(3, &format!("Some(_f) => {call},"));
            self.line(3, &format!("None => {extract},"));
        }
        self.line(2, "};");
    }
}

/// Expression recording one argument. `elem` marks a variadic element,
/// which is a reference to the declared type.
fn capture_expr(name: &str, ty: &Ty, elem: bool) -> String {
    let value_ref = if elem { name.to_string() } else { format!("&{name}") };
    match ty.capture() {
        Capture::Clone => format!("mock::capture!({value_ref}, {})", ty.render(Mode::Signature)),
        Capture::ToOwned => {
            let Ty::Ref { mutable, inner, .. } = ty else {
                return format!("mock::capture!({value_ref}, {})", ty.render(Mode::Signature));
            };
            let target = inner.render(Mode::Signature);
            if elem {
                format!("mock::capture_ref!(&**{name}, {target})")
            } else if *mutable {
                format!("mock::capture_ref!(&*{name}, {target})")
            } else {
                format!("mock::capture_ref!({name}, {target})")
            }
        }
        Capture::Opaque => format!("mock::Value::opaque({:?})", ty.render(Mode::Closure)),
    }
}

/// How an argument is passed on to a return producer.
fn forward_arg(name: &str, ty: &Ty) -> String {
    match ty {
        Ty::Ref { mutable: true, .. } => format!("&mut *{name}"),
        _ => name.to_string(),
    }
}

/// `m` with parameters that clash with body locals renamed.
fn renamed(m: &Method) -> Method {
    let mut m = m.clone();
    let taken: Vec<String> = m.params.iter().map(|p| p.name.clone()).collect();
    for (i, p) in m.params.iter_mut().enumerate() {
        let clashes = RESERVED.contains(&p.name.as_str())
            || (p.name.starts_with("_r") && p.name[2..].chars().all(|c| c.is_ascii_digit()));
        if clashes {
            let mut fresh = format!("_a{i}");
            while taken.contains(&fresh) {
                fresh.push('_');
            }
            p.name = fresh;
        }
    }
    m
}
