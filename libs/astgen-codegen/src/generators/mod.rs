//! Code generators for the supported emission strategies
//!
//! Each strategy implements the `Generator` trait. The parser and the type
//! resolver are shared, so a strategy only decides how a resolved family is
//! laid out as source text.

pub mod resolver;
pub mod rust;

use crate::error::Result;
use crate::ir::Family;
use resolver::{Policy, TypeResolver};
use serde::Deserialize;
use std::fmt;

/// Trait that all generators must implement
pub trait Generator {
    /// Render one family as a self-contained source fragment
    ///
    /// `prelude` lines are emitted verbatim after the banner. Resolution
    /// failures abort before any text is produced.
    fn generate(&self, family: &Family, resolver: &TypeResolver, prelude: &[String])
        -> Result<String>;
}

/// Layout of the generated family
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// One enum with a case per variant, constructors and a formatter
    #[default]
    ClosedUnion,
    /// One marker trait plus one struct per variant
    OpenPolymorphic,
}

impl Strategy {
    /// Policy used when the configuration does not name one
    pub fn default_policy(self) -> Policy {
        match self {
            Strategy::ClosedUnion => Policy::Shared,
            Strategy::OpenPolymorphic => Policy::Owned,
        }
    }

    /// Whether this strategy can render fields under `policy`
    pub fn supports(self, policy: Policy) -> bool {
        match self {
            Strategy::ClosedUnion => policy.uses_shared_handle(),
            Strategy::OpenPolymorphic => policy == Policy::Owned,
        }
    }

    /// Build the generator implementing this strategy
    pub fn generator(self, config: GeneratorConfig) -> Box<dyn Generator> {
        match self {
            Strategy::ClosedUnion => Box::new(rust::ClosedUnionGenerator::new(config)),
            Strategy::OpenPolymorphic => Box::new(rust::OpenPolymorphicGenerator::new(config)),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Strategy::ClosedUnion => "closed-union",
            Strategy::OpenPolymorphic => "open-polymorphic",
        };
        f.write_str(s)
    }
}

/// Configuration options for code generation
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Whether to generate documentation comments
    pub generate_docs: bool,
    /// Extra derives for the closed union (`Debug` is always derived)
    pub derives: Vec<String>,
    /// Module path prefix for importing other families (e.g., "crate")
    pub module_prefix: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            generate_docs: true,
            derives: Vec::new(),
            module_prefix: None,
        }
    }
}
