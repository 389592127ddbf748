//! AST Code Generator
//!
//! This library generates Rust source for tagged-union syntax trees from a
//! compact grammar schema, so that the grammar stays the single source of
//! truth for the `Expr`/`Stmt` types of a parser or interpreter.
//!
//! ## Architecture
//!
//! The generator uses a three-stage pipeline:
//! 1. **Parser**: Turns schema entries like `Binary : Expr left, Token operator, Expr right`
//!    into variant and field records
//! 2. **IR (Intermediate Representation)**: Families, variants and fields, plus their
//!    resolved form once a type-mapping policy has been applied
//! 3. **Generators**: Strategy-specific rendering (closed enum or open trait + structs)
//!
//! The `Driver` ties the stages to the file system and writes outputs all-or-nothing.
//!
//! ```no_run
//! use astgen_codegen::{config::DriverConfig, driver::Driver};
//! use std::path::Path;
//!
//! let config = DriverConfig::load(Path::new("astgen.toml"))?;
//! Driver::new(config).run()?;
//! # Ok::<(), astgen_codegen::Error>(())
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod generators;
pub mod ir;
pub mod parser;
pub mod utils;

pub use error::{Error, MalformedReason, Result};

use generators::resolver::TypeResolver;
use generators::Generator;
use ir::{Family, SchemaDocument};

/// Main entry point for in-memory generation
pub struct CodeGenerator {
    families: Vec<Family>,
}

impl CodeGenerator {
    /// Parse every family of a schema document
    pub fn from_document(document: &SchemaDocument) -> Result<Self> {
        let families = parser::parse_schema(document)?;
        Ok(Self { families })
    }

    /// Parse a schema given as JSON text
    pub fn from_json_str(text: &str) -> Result<Self> {
        Self::from_document(&SchemaDocument::from_json_str("<inline>", text)?)
    }

    /// All parsed families, in schema order
    pub fn families(&self) -> &[Family] {
        &self.families
    }

    pub fn family(&self, name: &str) -> Result<&Family> {
        self.families
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| Error::UnknownFamily(name.to_string()))
    }

    /// Names of the parsed families, for registering with a `TypeResolver`
    pub fn family_names(&self) -> Vec<String> {
        self.families.iter().map(|f| f.name.clone()).collect()
    }

    /// Render one family with the given generator
    pub fn generate<G: Generator + ?Sized>(
        &self,
        generator: &G,
        family: &str,
        resolver: &TypeResolver,
        prelude: &[String],
    ) -> Result<String> {
        generator.generate(self.family(family)?, resolver, prelude)
    }
}
