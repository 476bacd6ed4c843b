//! markcheck command-line front end.
//!
//! Lints HTML files against the recommended rule preset or a JSON
//! configuration, and exposes the engine's diagnostic dumps.
//!
//! Logging goes to stderr and is controlled with `MARKCHECK_LOG`
//! (e.g. `MARKCHECK_LOG=markcheck=debug`).

mod output;

use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use markcheck_engine::{Config, Engine};
use markcheck_html::Source;
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use output::Formatter;

/// markcheck - static analysis for HTML markup
#[derive(Parser, Debug)]
#[command(name = "markcheck")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    # Lint with every built-in rule enabled
    markcheck index.html about.html

    # Lint with a configuration file
    markcheck --config markcheck.json index.html

    # Add custom elements to the metadata catalog
    markcheck --elements elements.json index.html

    # Machine readable output
    markcheck --formatter json index.html

    # Inspect how a document is tokenized and parsed
    markcheck --dump-tokens index.html
    markcheck --dump-tree index.html
"#)]
struct Cli {
    /// HTML files to lint
    #[arg(value_name = "FILE", required = true)]
    files: Vec<PathBuf>,

    /// JSON configuration (default: every built-in rule as error)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Extra metadata catalog merged over the bundled one (repeatable)
    #[arg(long, value_name = "FILE")]
    elements: Vec<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Formatter::Text)]
    formatter: Formatter,

    /// Print the token stream instead of linting
    #[arg(long, group = "dump")]
    dump_tokens: bool,

    /// Print parser events instead of linting
    #[arg(long, group = "dump")]
    dump_events: bool,

    /// Print the element tree instead of linting
    #[arg(long, group = "dump")]
    dump_tree: bool,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging();

    let engine = Engine::new(load_config(&cli)?).context("invalid configuration")?;
    let sources = cli
        .files
        .iter()
        .map(PathBuf::as_path)
        .map(read_source)
        .collect::<Result<Vec<_>>>()?;
    let color = std::io::stdout().is_terminal();

    if cli.dump_tokens {
        let tokens = engine.dump_tokens(&sources)?;
        print!("{}", output::render_tokens(&tokens, cli.formatter)?);
        return Ok(ExitCode::SUCCESS);
    }
    if cli.dump_events {
        let events = engine.dump_events(&sources)?;
        print!("{}", output::render_events(&events, cli.formatter)?);
        return Ok(ExitCode::SUCCESS);
    }
    if cli.dump_tree {
        let lines = engine.dump_tree(&sources)?;
        print!("{}", output::render_tree(&lines, cli.formatter)?);
        return Ok(ExitCode::SUCCESS);
    }

    let report = engine.lint(&sources)?;
    print!("{}", output::render_report(&report, cli.formatter, color)?);
    debug!(
        target: "markcheck::cli",
        errors = report.error_count,
        warnings = report.warning_count,
        "lint finished"
    );
    Ok(if report.valid { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("MARKCHECK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// The configuration file when given, otherwise the recommended preset,
/// with every `--elements` catalog appended.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("failed to read configuration {}", path.display()))?;
            Config::from_json(&json).with_context(|| format!("invalid configuration {}", path.display()))?
        }
        None => Config::recommended(),
    };
    for path in &cli.elements {
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read metadata {}", path.display()))?;
        let catalog: Value = serde_json::from_str(&json)
            .with_context(|| format!("metadata {} is not valid JSON", path.display()))?;
        config.add_elements(catalog);
    }
    Ok(config)
}

fn read_source(path: &Path) -> Result<Source> {
    let data = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(Source::new(data, path.display().to_string()))
}
