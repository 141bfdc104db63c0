//! # edm-cli
//!
//! Command line for compiling education data models.
//!
//! `edm compile` turns parse-event files into API schemas. `edm check` runs the same
//! compilation and only reports diagnostics.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use edm_builder::BuilderConfig;
use edm_pipeline::{AcceptancePolicy, CompileOutput, Pipeline, PipelineConfig};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "edm")]
#[command(about = "Education data model compiler")]
#[command(version)]
struct Cli {
    /// Path to a YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile event files into API schemas
    Compile {
        #[command(flatten)]
        model: ModelArgs,

        /// Write schemas to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Compile event files and report diagnostics only
    Check {
        #[command(flatten)]
        model: ModelArgs,
    },
}

#[derive(Args)]
struct ModelArgs {
    /// Event files or directories, core model first
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Which diagnostics reject the model
    #[arg(long, value_enum)]
    fail_on: Option<FailOn>,

    /// Name of the core namespace
    #[arg(long)]
    core_namespace: Option<String>,

    /// Stop the enhancer pipeline after this stage
    #[arg(long)]
    stop_after: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FailOn {
    Never,
    Errors,
    Warnings,
}

impl From<FailOn> for AcceptancePolicy {
    fn from(fail_on: FailOn) -> Self {
        match fail_on {
            FailOn::Never => Self::AcceptAll,
            FailOn::Errors => Self::FailOnErrors,
            FailOn::Warnings => Self::FailOnWarnings,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

/// Settings read from `--config`; command line flags take precedence.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    core_namespace: Option<String>,
    acceptance_policy: Option<AcceptancePolicy>,
    stop_after: Option<String>,
    format: Option<OutputFormat>,
}

impl ConfigFile {
    fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    fn pipeline_config(&self, model: &ModelArgs) -> PipelineConfig {
        let mut builder = BuilderConfig::default();
        if let Some(core) = model.core_namespace.as_ref().or(self.core_namespace.as_ref()) {
            builder.core_namespace.clone_from(core);
        }
        PipelineConfig {
            builder,
            acceptance_policy: model
                .fail_on
                .map(AcceptancePolicy::from)
                .or(self.acceptance_policy)
                .unwrap_or_default(),
            stop_after: model.stop_after.clone().or_else(|| self.stop_after.clone()),
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn compile(config: PipelineConfig, model: &ModelArgs) -> anyhow::Result<CompileOutput> {
    let pipeline = Pipeline::new(config).context("Invalid pipeline configuration")?;
    let output = pipeline
        .compile_files(&model.inputs)
        .context("Compilation failed")?;

    for diagnostic in &output.diagnostics {
        eprintln!("{diagnostic}");
    }
    Ok(output)
}

fn reject(output: &CompileOutput, policy: AcceptancePolicy) -> anyhow::Result<()> {
    if !output.accepted {
        bail!(
            "Model rejected under {policy:?}: {} errors, {} warnings",
            output.stats.diagnostics.errors,
            output.stats.diagnostics.warnings
        );
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_file = match &cli.config {
        Some(path) => ConfigFile::load(path)?,
        None => ConfigFile::default(),
    };

    match cli.command {
        Commands::Compile {
            model,
            output,
            format,
        } => {
            let config = config_file.pipeline_config(&model);
            let policy = config.acceptance_policy;
            let compiled = compile(config, &model)?;
            reject(&compiled, policy)?;

            let rendered = match format.or(config_file.format).unwrap_or_default() {
                OutputFormat::Json => edm_api_schema::to_json(&compiled.api_schemas)?,
                OutputFormat::Yaml => edm_api_schema::to_yaml(&compiled.api_schemas)?,
            };
            match output {
                Some(path) => {
                    fs::write(&path, rendered)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    tracing::info!(
                        file = %path.display(),
                        schemas = compiled.api_schemas.len(),
                        "wrote api schemas"
                    );
                }
                None => println!("{rendered}"),
            }
        }
        Commands::Check { model } => {
            let config = config_file.pipeline_config(&model);
            let policy = config.acceptance_policy;
            let compiled = compile(config, &model)?;
            let stats = &compiled.stats;
            println!(
                "{} namespaces, {} entities, {} properties: {} errors, {} warnings",
                stats.namespaces,
                stats.entities,
                stats.properties,
                stats.diagnostics.errors,
                stats.diagnostics.warnings
            );
            reject(&compiled, policy)?;
        }
    }
    Ok(())
}
