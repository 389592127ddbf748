//! Generation run configuration
//!
//! Loaded from a TOML file through the `config` crate, with `ASTGEN_`-prefixed
//! environment variables layered on top (`ASTGEN_POLICY=value`,
//! `ASTGEN_GENERATOR__GENERATE_DOCS=false`).

use crate::error::{Error, Result};
use crate::generators::resolver::{Policy, SharedHandle};
use crate::generators::{GeneratorConfig, Strategy};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "ASTGEN";

/// Everything the driver needs for one run
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DriverConfig {
    /// Path of the JSON schema document
    pub schema: PathBuf,
    #[serde(default)]
    pub strategy: Strategy,
    /// Ownership policy; the strategy's default when absent
    #[serde(default)]
    pub policy: Option<Policy>,
    #[serde(default)]
    pub shared_handle: SharedHandle,
    /// Types defined outside the generated modules (e.g., "Token")
    #[serde(default)]
    pub extern_types: Vec<String>,
    #[serde(default)]
    pub generator: GeneratorConfig,
    /// Families to generate, in generation order
    #[serde(default)]
    pub families: Vec<FamilyTarget>,
}

/// One family to generate and where to put it
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FamilyTarget {
    pub name: String,
    pub output: PathBuf,
    /// Lines emitted verbatim after the banner
    #[serde(default)]
    pub prelude: Vec<String>,
}

impl FamilyTarget {
    pub fn new(name: impl Into<String>, output: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            output: output.into(),
            prelude: Vec::new(),
        }
    }

    pub fn with_prelude<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prelude.extend(lines.into_iter().map(Into::into));
        self
    }
}

impl DriverConfig {
    /// A configuration with defaults and no targets
    pub fn new(schema: impl Into<PathBuf>) -> Self {
        Self {
            schema: schema.into(),
            strategy: Strategy::default(),
            policy: None,
            shared_handle: SharedHandle::default(),
            extern_types: Vec::new(),
            generator: GeneratorConfig::default(),
            families: Vec::new(),
        }
    }

    /// Load a configuration file and apply environment overrides
    ///
    /// Relative paths are resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Toml))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

        let mut loaded: DriverConfig = settings
            .try_deserialize()
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

        if let Some(base) = path.parent() {
            loaded.resolve_paths(base);
        }
        loaded.validate()?;

        Ok(loaded)
    }

    /// Make relative schema and output paths relative to `base`
    pub fn resolve_paths(&mut self, base: &Path) {
        if self.schema.is_relative() {
            self.schema = base.join(&self.schema);
        }
        for target in &mut self.families {
            if target.output.is_relative() {
                target.output = base.join(&target.output);
            }
        }
    }

    /// The policy in effect for this run
    pub fn effective_policy(&self) -> Policy {
        self.policy
            .unwrap_or_else(|| self.strategy.default_policy())
    }

    pub fn validate(&self) -> Result<()> {
        if self.families.is_empty() {
            return Err(Error::Config("no families requested".into()));
        }

        let mut outputs = HashSet::new();
        for target in &self.families {
            if target.name.trim().is_empty() {
                return Err(Error::Config("family target with an empty name".into()));
            }
            if !outputs.insert(&target.output) {
                return Err(Error::Config(format!(
                    "output {} is used by more than one family",
                    target.output.display()
                )));
            }
        }

        let policy = self.effective_policy();
        if !self.strategy.supports(policy) {
            return Err(Error::Config(format!(
                "the {} strategy cannot use the {} policy",
                self.strategy, policy
            )));
        }

        Ok(())
    }
}
