//! The import block of a generated file.

use std::collections::BTreeSet;

use mockkit_parsers::{GenError, Import};

/// Name the runtime crate is imported under in generated files.
pub const RUNTIME_ALIAS: &str = "mock";

/// Collects the imports of a generated file: those the signatures need plus
/// the runtime crate, the tester module and `Arc`.
pub fn collect(
    types: &BTreeSet<Import>,
    runtime_crate: &str,
    tester: &Import,
) -> Result<BTreeSet<Import>, GenError> {
    let runtime = Import::aliased(runtime_crate, RUNTIME_ALIAS);
    let arc = Import::new("std::sync::Arc");
    for own in [&runtime, tester, &arc] {
        if let Some(clash) = types
            .iter()
            .find(|i| i.name() == own.name() && i.path != own.path)
        {
            return Err(GenError::Unsupported(format!(
                "import {clash} shadows {own} used by the generated mock"
            )));
        }
    }

    let mut all = types.clone();
    all.insert(runtime);
    all.insert(tester.clone());
    all.insert(arc);
    Ok(all)
}

/// Renders `use` lines: standard library first, then everything else, each
/// group sorted and the groups separated by a blank line.
pub fn render(imports: &BTreeSet<Import>) -> String {
    let (mut std, mut other): (Vec<String>, Vec<String>) = (Vec::new(), Vec::new());
    for i in imports {
        if i.is_std() {
            std.push(i.render());
        } else {
            other.push(i.render());
        }
    }
    std.sort();
    std.dedup();
    other.sort();
    other.dedup();

    let mut out = String::new();
    for group in [std, other] {
        if group.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        for line in group {
            out.push_str(&line);
            out.push('\n');
        }
    }
    out
}
