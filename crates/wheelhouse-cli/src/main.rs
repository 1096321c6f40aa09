//! # wheelhouse
//!
//! Command-line dependency resolver for Python packages. Parses package
//! specifications, resolves their dependency closure against a
//! PyPI-compatible registry, reports conflicts, and generates installation
//! scripts for the resolved set.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use camino::Utf8PathBuf;
use clap::{ArgAction, Parser};
use tracing::info;

use wheelhouse_core::{Environment, StrategyMode};
use wheelhouse_registry::{RegistryClient, RegistryConfig};
use wheelhouse_resolver::{Resolver, ResolverOptions};

mod output;
mod scripts;

use output::OutputHandler;
use scripts::ScriptGenerator;

/// Resolve Python package dependencies against PyPI
#[derive(Parser, Debug)]
#[command(name = "wheelhouse", version, about = "Resolve Python package dependencies")]
pub struct Cli {
    /// Package specifications, comma separated (e.g. "requests>=2.31,flask")
    #[arg(short, long, value_delimiter = ',')]
    pub packages: Vec<String>,

    /// Requirements-style input file; # comments and blank lines are skipped
    #[arg(short = 'f', long)]
    pub input_file: Option<Utf8PathBuf>,

    /// Target Python version
    #[arg(long, default_value = "3.9")]
    pub python_version: String,

    /// Target platform
    #[arg(long, default_value = "any")]
    pub platform: String,

    /// Conflict handling: auto, manual, ignore or fail
    #[arg(long, default_value = "auto")]
    pub strategy: StrategyMode,

    /// Walk conflict-repair candidates newest-first
    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    pub prefer_latest: bool,

    /// Concurrent registry fetch limit
    #[arg(long, default_value_t = 4)]
    pub max_workers: usize,

    /// Registry request timeout in seconds
    #[arg(long, default_value_t = 15)]
    pub timeout: u64,

    /// Resolve sequentially instead of in parallel waves
    #[arg(long)]
    pub sequential: bool,

    /// Directory for generated scripts
    #[arg(long, default_value = "wheelhouse-out")]
    pub output_dir: Utf8PathBuf,

    /// Virtual environment name used in generated scripts
    #[arg(long, default_value = "venv")]
    pub venv_name: String,

    /// Generate only requirements.txt
    #[arg(long)]
    pub requirements_only: bool,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let output = OutputHandler::new(cli.quiet);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(error) => {
            output.error(&format!("Failed to create async runtime: {error}"));
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(&cli, &output)) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            output.error(&format!("{error:#}"));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli, output: &OutputHandler) -> anyhow::Result<bool> {
    let specs = gather_specs(cli)?;
    info!(count = specs.len(), "resolving package specifications");

    let environment =
        Environment::new(cli.python_version.clone()).with_platform(cli.platform.clone());

    let registry = Arc::new(RegistryClient::new(RegistryConfig {
        timeout: Duration::from_secs(cli.timeout),
        ..RegistryConfig::default()
    })?);

    let mut options = ResolverOptions {
        max_workers: cli.max_workers,
        ..ResolverOptions::default()
    };
    options.strategy.mode = cli.strategy;
    options.strategy.prefer_latest = cli.prefer_latest;

    let resolver = Resolver::new(Arc::clone(&registry), options);
    let result = if cli.sequential {
        resolver.resolve(&specs, &environment).await?
    } else {
        resolver.resolve_parallel(&specs, &environment).await?
    };

    output.render_result(&result);

    let stats = registry.stats().snapshot();
    info!(
        api_calls = stats.api_calls,
        cache_hits = stats.cache_hits,
        versions_checked = stats.versions_checked,
        "registry statistics"
    );

    if result.success && !result.packages.is_empty() {
        let generator = ScriptGenerator::new(cli.output_dir.clone(), cli.venv_name.clone());
        let written = if cli.requirements_only {
            vec![generator.write_requirements(&result)?]
        } else {
            generator.generate_all(&result, &environment)?
        };
        for path in &written {
            output.success(&format!("Wrote {path}"));
        }
    }

    Ok(result.success)
}

/// Collect package specifications from exactly one of the two sources
fn gather_specs(cli: &Cli) -> anyhow::Result<Vec<String>> {
    match (!cli.packages.is_empty(), &cli.input_file) {
        (true, Some(_)) => bail!("Use either --packages or --input-file, not both"),
        (false, None) => bail!("No packages given; use --packages or --input-file"),
        (true, None) => {
            let specs: Vec<String> = cli
                .packages
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if specs.is_empty() {
                bail!("The package list is empty");
            }
            Ok(specs)
        }
        (false, Some(path)) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read input file '{path}'"))?;
            let specs = parse_requirements(&contents);
            if specs.is_empty() {
                bail!("Input file '{path}' contains no package specifications");
            }
            Ok(specs)
        }
    }
}

/// Parse requirements-file contents: one spec per line, `#` comments and
/// blank lines skipped
fn parse_requirements(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "wheelhouse={level},wheelhouse_core={level},wheelhouse_registry={level},wheelhouse_resolver={level}"
        ))
        .with_target(false)
        .init();
}
