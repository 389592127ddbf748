//! Open polymorphic generation: a marker trait and one struct per variant

use super::idents::sanitize_ident;
use super::{dependency_imports, generate_header, struct_literal, typed_fields};
use crate::error::{Error, Result};
use crate::generators::resolver::TypeResolver;
use crate::generators::{Generator, GeneratorConfig, Strategy};
use crate::ir::{Family, ResolvedFamily, ResolvedVariant};
use tracing::warn;

/// Renders a family as an empty marker trait implemented by per-variant structs
///
/// No formatter is generated for this layout.
pub struct OpenPolymorphicGenerator {
    config: GeneratorConfig,
}

impl OpenPolymorphicGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn new_default() -> Self {
        Self::new(GeneratorConfig::default())
    }
}

impl Generator for OpenPolymorphicGenerator {
    fn generate(
        &self,
        family: &Family,
        resolver: &TypeResolver,
        prelude: &[String],
    ) -> Result<String> {
        let policy = resolver.policy();
        if !Strategy::OpenPolymorphic.supports(policy) {
            return Err(Error::Config(format!(
                "the open-polymorphic strategy cannot use the {} policy",
                policy
            )));
        }

        let resolved = resolver.resolve_family(family)?;
        if resolved.variants.is_empty() {
            warn!(family = %family.name, "family has no variants");
        }

        let mut imports = dependency_imports(&resolved, &self.config);
        if resolved.has_dynamic_fields() {
            imports.insert("use std::any::Any;".to_string());
        }

        let mut code = generate_header(
            &resolved,
            Strategy::OpenPolymorphic,
            policy,
            prelude,
            imports,
        );

        code.push_str(&self.generate_marker(&resolved));

        for variant in &resolved.variants {
            code.push_str("\n\n");
            code.push_str(&self.generate_variant(&resolved.name, variant));
        }

        code.push('\n');
        Ok(code)
    }
}

impl OpenPolymorphicGenerator {
    fn generate_marker(&self, family: &ResolvedFamily) -> String {
        let mut code = String::new();

        if self.config.generate_docs {
            code.push_str(&format!(
                "/// Marker implemented by every `{}` node.\n",
                family.name
            ));
        }
        code.push_str(&format!("pub trait {} {{}}", family.name));

        code
    }

    fn generate_variant(&self, family: &str, variant: &ResolvedVariant) -> String {
        let mut code = String::new();

        if self.config.generate_docs {
            code.push_str(&format!("/// `{}` node of the `{}` family.\n", variant.name, family));
        }

        // Struct definition
        if variant.fields.is_empty() {
            code.push_str(&format!("pub struct {} {{}}\n", variant.name));
        } else {
            code.push_str(&format!("pub struct {} {{\n", variant.name));
            for field in &variant.fields {
                code.push_str(&format!(
                    "    pub {}: {},\n",
                    sanitize_ident(&field.name),
                    field.rust_type
                ));
            }
            code.push_str("}\n");
        }

        // Constructor
        code.push('\n');
        code.push_str(&format!("impl {} {{\n", variant.name));
        code.push_str(&format!(
            "    pub fn new({}) -> Self {{\n",
            typed_fields(&variant.fields)
        ));
        code.push_str(&format!("        Self {}\n", struct_literal(&variant.fields)));
        code.push_str("    }\n");
        code.push_str("}\n");

        // Marker
        code.push('\n');
        code.push_str(&format!("impl {} for {} {{}}", family, variant.name));

        code
    }
}
