//! Rust code generators for grammar families

mod closed_union;
pub mod idents;
mod open_polymorphic;

pub use closed_union::ClosedUnionGenerator;
pub use open_polymorphic::OpenPolymorphicGenerator;

use crate::generators::resolver::Policy;
use crate::generators::{GeneratorConfig, Strategy};
use crate::ir::{ResolvedFamily, ResolvedField};
use idents::{module_name, sanitize_ident};
use std::collections::{BTreeSet, HashSet};

const BANNER_RULE: &str = "////////////////////////////////////////";

/// Banner, prelude and imports shared by every generated file
fn generate_header(
    family: &ResolvedFamily,
    strategy: Strategy,
    policy: Policy,
    prelude: &[String],
    required_imports: BTreeSet<String>,
) -> String {
    let mut code = String::new();

    code.push_str(BANNER_RULE);
    code.push('\n');
    code.push_str(&format!("// `{}` family\n", family.name));
    code.push_str(&format!(
        "// auto-generated by astgen ({}, {} policy)\n",
        strategy, policy
    ));
    code.push_str("// Do not edit by hand.\n");
    code.push_str(BANNER_RULE);
    code.push_str("\n\n");

    let declared: HashSet<&str> = prelude.iter().map(|line| line.trim()).collect();
    for line in prelude {
        code.push_str(line.trim_end());
        code.push('\n');
    }

    let mut wrote_import = false;
    for import in required_imports {
        if declared.contains(import.as_str()) {
            continue;
        }
        code.push_str(&import);
        code.push('\n');
        wrote_import = true;
    }

    if wrote_import || !prelude.is_empty() {
        code.push('\n');
    }

    code
}

/// `use` lines for the families this one references
fn dependency_imports(family: &ResolvedFamily, config: &GeneratorConfig) -> BTreeSet<String> {
    let Some(prefix) = &config.module_prefix else {
        return BTreeSet::new();
    };

    family
        .dependencies
        .iter()
        .map(|dep| format!("use {}::{}::{};", prefix, module_name(dep), dep))
        .collect()
}

/// Comma-separated `name: Type` list
fn typed_fields(fields: &[ResolvedField]) -> String {
    fields
        .iter()
        .map(|f| format!("{}: {}", sanitize_ident(&f.name), f.rust_type))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Comma-separated field names, for struct literal shorthand
fn field_names(fields: &[ResolvedField]) -> String {
    fields
        .iter()
        .map(|f| sanitize_ident(&f.name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Struct literal body, `{}` when there are no fields
fn struct_literal(fields: &[ResolvedField]) -> String {
    if fields.is_empty() {
        "{}".to_string()
    } else {
        format!("{{ {} }}", field_names(fields))
    }
}
