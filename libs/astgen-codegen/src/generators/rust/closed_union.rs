//! Closed tagged-union generation: one enum per family

use super::idents::constructor_name;
use super::{dependency_imports, generate_header, struct_literal, typed_fields};
use crate::error::{Error, Result};
use crate::generators::resolver::{Policy, TypeResolver};
use crate::generators::{Generator, GeneratorConfig, Strategy};
use crate::ir::{Family, ResolvedFamily};
use std::collections::BTreeSet;
use tracing::warn;

/// Renders a family as a single enum with constructors and a `Display` impl
pub struct ClosedUnionGenerator {
    config: GeneratorConfig,
}

impl ClosedUnionGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn new_default() -> Self {
        Self::new(GeneratorConfig::default())
    }
}

impl Generator for ClosedUnionGenerator {
    fn generate(
        &self,
        family: &Family,
        resolver: &TypeResolver,
        prelude: &[String],
    ) -> Result<String> {
        let policy = resolver.policy();
        if !Strategy::ClosedUnion.supports(policy) {
            return Err(Error::Config(format!(
                "the closed-union strategy cannot use the {} policy",
                policy
            )));
        }

        let resolved = resolver.resolve_family(family)?;
        if resolved.variants.is_empty() {
            warn!(family = %family.name, "family has no variants");
        }

        let mut code = generate_header(
            &resolved,
            Strategy::ClosedUnion,
            policy,
            prelude,
            self.required_imports(&resolved, resolver),
        );

        code.push_str(&self.generate_enum(&resolved));
        code.push_str("\n\n");
        code.push_str(&self.generate_constructors(&resolved, resolver));
        code.push_str("\n\n");
        code.push_str(&self.generate_display(&resolved));
        code.push('\n');

        Ok(code)
    }
}

impl ClosedUnionGenerator {
    fn required_imports(
        &self,
        family: &ResolvedFamily,
        resolver: &TypeResolver,
    ) -> BTreeSet<String> {
        let mut imports = dependency_imports(family, &self.config);
        imports.insert("use std::fmt;".to_string());

        // Constructors return a handle under `Shared` even without handle fields
        if resolver.policy() == Policy::Shared
            || family.has_family_references()
            || family.has_dynamic_fields()
        {
            imports.insert(resolver.handle().import().to_string());
        }

        if family.has_dynamic_fields() {
            imports.insert("use std::any::Any;".to_string());
        }

        imports
    }

    /// Derive list, `Debug` first since the formatter relies on it
    fn derives(&self) -> String {
        let mut derives = vec!["Debug"];
        for derive in &self.config.derives {
            let derive = derive.trim();
            if !derive.is_empty() && !derives.contains(&derive) {
                derives.push(derive);
            }
        }
        derives.join(", ")
    }

    fn generate_enum(&self, family: &ResolvedFamily) -> String {
        let mut code = String::new();

        if self.config.generate_docs {
            code.push_str(&format!("/// `{}` syntax tree node.\n", family.name));
        }

        code.push_str(&format!("#[derive({})]\n", self.derives()));
        code.push_str(&format!("pub enum {} {{\n", family.name));

        for variant in &family.variants {
            if variant.fields.is_empty() {
                code.push_str(&format!("    {} {{}},\n", variant.name));
            } else {
                code.push_str(&format!(
                    "    {} {{ {} }},\n",
                    variant.name,
                    typed_fields(&variant.fields)
                ));
            }
        }

        code.push('}');
        code
    }

    fn generate_constructors(&self, family: &ResolvedFamily, resolver: &TypeResolver) -> String {
        let mut code = String::new();
        let shared = resolver.policy() == Policy::Shared;
        let handle = resolver.handle();

        let return_type = if shared {
            handle.wrap(&family.name)
        } else {
            family.name.clone()
        };

        code.push_str(&format!("impl {} {{\n", family.name));

        for (i, variant) in family.variants.iter().enumerate() {
            if i > 0 {
                code.push('\n');
            }

            if self.config.generate_docs {
                code.push_str(&format!(
                    "    /// Builds a [`{}::{}`].\n",
                    family.name, variant.name
                ));
            }

            code.push_str(&format!(
                "    pub fn {}({}) -> {} {{\n",
                constructor_name(&variant.name),
                typed_fields(&variant.fields),
                return_type
            ));

            let value = format!(
                "{}::{} {}",
                family.name,
                variant.name,
                struct_literal(&variant.fields)
            );
            if shared {
                code.push_str(&format!("        {}::new({})\n", handle.type_name(), value));
            } else {
                code.push_str(&format!("        {}\n", value));
            }

            code.push_str("    }\n");
        }

        code.push('}');
        code
    }

    fn generate_display(&self, family: &ResolvedFamily) -> String {
        let mut code = String::new();

        code.push_str(&format!("impl fmt::Display for {} {{\n", family.name));
        code.push_str("    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {\n");
        code.push_str("        write!(f, \"{:?}\", self)\n");
        code.push_str("    }\n");
        code.push('}');

        code
    }
}
