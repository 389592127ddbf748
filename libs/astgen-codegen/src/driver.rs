//! Orchestrates one generation run: load, parse, resolve, render, write.

use crate::config::{DriverConfig, FamilyTarget};
use crate::error::{Error, Result};
use crate::generators::resolver::TypeResolver;
use crate::ir::SchemaDocument;
use crate::parser;
use crate::utils::{self, WriteStatus};
use std::path::PathBuf;
use tracing::{debug, info};

/// Generated text for one family target, not yet written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFamily {
    pub family: String,
    pub output: PathBuf,
    pub contents: String,
}

/// Outcome of writing one family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFamily {
    pub family: String,
    pub output: PathBuf,
    pub status: WriteStatus,
}

pub struct Driver {
    config: DriverConfig,
}

impl Driver {
    pub fn new(config: DriverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Render every requested family in memory
    ///
    /// Fails on the first error; nothing is written either way.
    pub fn render(&self) -> Result<Vec<RenderedFamily>> {
        self.config.validate()?;

        let document = SchemaDocument::load(&self.config.schema)?;
        debug!(
            schema = %self.config.schema.display(),
            families = ?document.family_names(),
            "loaded schema"
        );

        let policy = self.config.effective_policy();
        let resolver = TypeResolver::new(policy, self.config.shared_handle)
            .with_families(document.family_names())
            .with_extern_types(self.config.extern_types.iter().cloned());
        let generator = self.config.strategy.generator(self.config.generator.clone());

        self.config
            .families
            .iter()
            .map(|target| -> Result<RenderedFamily> {
                let raw = document
                    .family(&target.name)
                    .ok_or_else(|| Error::UnknownFamily(target.name.clone()))?;
                let family = parser::parse_family(&raw.name, &raw.entries)?;
                let contents = generator.generate(&family, &resolver, &target.prelude)?;

                info!(
                    family = %family.name,
                    variants = family.variants.len(),
                    strategy = %self.config.strategy,
                    policy = %policy,
                    "rendered family"
                );

                Ok(rendered(target, contents))
            })
            .collect()
    }

    /// Render every family, then write all outputs or none
    pub fn run(&self) -> Result<Vec<WrittenFamily>> {
        let rendered = self.render()?;

        let outputs: Vec<(PathBuf, String)> = rendered
            .iter()
            .map(|r| (r.output.clone(), r.contents.clone()))
            .collect();
        let statuses = utils::write_outputs(&outputs)?;

        let written = rendered
            .into_iter()
            .zip(statuses)
            .map(|(r, (_, status))| {
                info!(family = %r.family, output = %r.output.display(), ?status, "output");
                WrittenFamily {
                    family: r.family,
                    output: r.output,
                    status,
                }
            })
            .collect();

        Ok(written)
    }

    /// Outputs whose file content differs from a fresh rendering
    pub fn check(&self) -> Result<Vec<RenderedFamily>> {
        let stale = self
            .render()?
            .into_iter()
            .filter(|r| !utils::is_up_to_date(&r.output, &r.contents))
            .collect::<Vec<_>>();

        for r in &stale {
            info!(family = %r.family, output = %r.output.display(), "output is stale");
        }

        Ok(stale)
    }
}

fn rendered(target: &FamilyTarget, contents: String) -> RenderedFamily {
    RenderedFamily {
        family: target.name.clone(),
        output: target.output.clone(),
        contents,
    }
}
