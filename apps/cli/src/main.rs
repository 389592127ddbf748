//! astgen - AST source generator
//!
//! Generates tagged-union syntax tree types from a grammar schema.
//! Runs are described by an `astgen.toml` file or by command line flags.

mod logging;

use anyhow::{bail, Context};
use astgen_codegen::config::{DriverConfig, FamilyTarget};
use astgen_codegen::driver::Driver;
use astgen_codegen::generators::resolver::{Policy, SharedHandle};
use astgen_codegen::generators::rust::idents;
use astgen_codegen::generators::Strategy;
use astgen_codegen::ir::SchemaDocument;
use astgen_codegen::utils::WriteStatus;
use astgen_codegen::CodeGenerator;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const DEFAULT_CONFIG: &str = "astgen.toml";

#[derive(Parser)]
#[command(name = "astgen", version, about = "Generate AST types from a grammar schema")]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Log as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate and write the configured families
    Generate {
        #[command(flatten)]
        run: RunArgs,

        /// Print the generated source instead of writing files
        #[arg(long)]
        stdout: bool,
    },
    /// Exit with status 1 when a generated file is out of date
    Check {
        #[command(flatten)]
        run: RunArgs,
    },
    /// List the variants parsed from a schema
    Describe {
        /// Schema document (JSON)
        #[arg(long)]
        schema: PathBuf,

        /// Only describe this family
        #[arg(long)]
        family: Option<String>,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Configuration file (defaults to ./astgen.toml when no schema is given)
    #[arg(short, long, conflicts_with_all = ["schema", "family", "output", "prelude"])]
    config: Option<PathBuf>,

    /// Schema document (JSON), for a single-family run without a config file
    #[arg(long, requires = "family")]
    schema: Option<PathBuf>,

    /// Family to generate
    #[arg(long, requires = "schema")]
    family: Option<String>,

    /// Output file (defaults to `<family>.rs`)
    #[arg(short, long, requires = "schema")]
    output: Option<PathBuf>,

    #[arg(long, value_enum)]
    strategy: Option<Strategy>,

    #[arg(long, value_enum)]
    policy: Option<Policy>,

    /// Reference-counting handle for the shared policies
    #[arg(long, value_enum)]
    handle: Option<SharedHandle>,

    /// Type defined outside the generated module (repeatable)
    #[arg(long = "extern-type")]
    extern_types: Vec<String>,

    /// Line emitted after the banner (repeatable)
    #[arg(long, requires = "schema")]
    prelude: Vec<String>,

    /// Import referenced families from `<prefix>::<family>`
    #[arg(long)]
    module_prefix: Option<String>,

    /// Do not emit doc comments
    #[arg(long)]
    no_docs: bool,
}

impl RunArgs {
    fn into_config(self) -> anyhow::Result<DriverConfig> {
        let mut config = match (&self.config, &self.schema) {
            (Some(path), _) => load_config(path)?,
            (None, Some(schema)) => {
                let family = self.family.clone().context("--family is required")?;
                let output = self
                    .output
                    .clone()
                    .unwrap_or_else(|| default_output(&family));

                let mut config = DriverConfig::new(schema);
                config.families =
                    vec![FamilyTarget::new(family, output).with_prelude(self.prelude.clone())];
                config
            }
            (None, None) => {
                let default = Path::new(DEFAULT_CONFIG);
                if !default.exists() {
                    bail!("no {DEFAULT_CONFIG} found; pass --config or --schema/--family");
                }
                load_config(default)?
            }
        };

        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }
        if let Some(policy) = self.policy {
            config.policy = Some(policy);
        }
        if let Some(handle) = self.handle {
            config.shared_handle = handle;
        }
        config.extern_types.extend(self.extern_types);
        if let Some(prefix) = self.module_prefix {
            config.generator.module_prefix = Some(prefix);
        }
        if self.no_docs {
            config.generator.generate_docs = false;
        }

        config.validate()?;
        Ok(config)
    }
}

/// `<family module>.rs`, the file `--module-prefix` imports expect
fn default_output(family: &str) -> PathBuf {
    PathBuf::from(format!("{}.rs", idents::module_name(family)))
}

fn load_config(path: &Path) -> anyhow::Result<DriverConfig> {
    DriverConfig::load(path).with_context(|| format!("loading {}", path.display()))
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    logging::init_logging(&logging::LoggingConfig {
        verbosity: cli.verbose,
        json: cli.json_logs,
    })
    .context("initializing logging")?;

    match cli.command {
        Command::Generate { run, stdout } => generate(run, stdout),
        Command::Check { run } => check(run),
        Command::Describe { schema, family } => describe(&schema, family.as_deref()),
    }
}

fn generate(run: RunArgs, stdout: bool) -> anyhow::Result<ExitCode> {
    let driver = Driver::new(run.into_config()?);

    if stdout {
        for rendered in driver.render().context("rendering families")? {
            print!("{}", rendered.contents);
        }
        return Ok(ExitCode::SUCCESS);
    }

    for written in driver.run().context("generating families")? {
        let verb = match written.status {
            WriteStatus::Written => "wrote",
            WriteStatus::Unchanged => "unchanged",
        };
        println!("{:>9} {} ({})", verb, written.output.display(), written.family);
    }

    Ok(ExitCode::SUCCESS)
}

fn check(run: RunArgs) -> anyhow::Result<ExitCode> {
    let driver = Driver::new(run.into_config()?);
    let stale = driver.check().context("checking generated files")?;

    if stale.is_empty() {
        return Ok(ExitCode::SUCCESS);
    }

    for rendered in &stale {
        println!("stale {} ({})", rendered.output.display(), rendered.family);
    }
    Ok(ExitCode::from(1))
}

fn describe(schema: &Path, family: Option<&str>) -> anyhow::Result<ExitCode> {
    let document = SchemaDocument::load(schema)?;
    let codegen = CodeGenerator::from_document(&document)
        .with_context(|| format!("parsing {}", schema.display()))?;

    let families = match family {
        Some(name) => vec![codegen.family(name)?],
        None => codegen.families().iter().collect(),
    };

    for family in families {
        println!("{}:", family.name);
        for variant in &family.variants {
            println!("  {}", variant);
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_uses_module_name() {
        assert_eq!(default_output("Expr"), PathBuf::from("expr.rs"));
        assert_eq!(default_output("VarDecl"), PathBuf::from("var_decl.rs"));
    }
}
