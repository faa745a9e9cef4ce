//! migrate-gen CLI
//!
//! Entry point for the command-line tool.
//!
//! Exit codes:
//! - 0: All fragments generated
//! - 1: Fatal error (bad filename, missing dialect coverage, I/O error, etc.).
//!   The message is printed to stdout and the target directory should be
//!   regenerated from scratch.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use migrate_gen::config::is_valid_dialect;
use migrate_gen::{Config, DirSink, DirTree, Generator};

/// Default config file name used when --config is not explicitly provided.
const DEFAULT_CONFIG_FILE: &str = "migrate-gen.toml";

#[derive(Parser, Debug)]
#[command(name = "migrate-gen")]
#[command(
    about = "Expands migration sources into balanced per-dialect fragment files",
    long_about = None
)]
struct Args {
    /// Directory containing the authored migration sources
    source: PathBuf,

    /// Directory receiving the generated fragments
    target: PathBuf,

    /// Comma-separated list of expected dialects; pass "" to disable validation
    #[arg(long, value_delimiter = ',')]
    dialects: Option<Vec<String>>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log every fragment written
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            // --help also arrives here and must still exit 0.
            let code = if err.use_stderr() { 1 } else { 0 };
            let _ = err.print();
            std::process::exit(code);
        }
    };
    init_tracing(args.verbose);

    if let Err(err) = run(args) {
        println!("{:#}", err);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn run(args: Args) -> Result<()> {
    let config = load_config(&args.config)?;
    let dialects = resolve_dialects(args.dialects, config.generate.dialects)?;

    let command_line = std::env::args().collect::<Vec<_>>().join(" ");
    let tree = DirTree::open(&args.source).context("Failed to open source directory")?;
    let mut sink = DirSink::create(&args.target).context("Failed to prepare target directory")?;

    let summary = Generator::new(&tree, command_line)
        .with_dialects(dialects)
        .run(&mut sink)
        .with_context(|| {
            format!(
                "Failed to generate migrations from {} into {}",
                args.source.display(),
                args.target.display()
            )
        })?;

    eprintln!(
        "migrate-gen: {} fragment(s) written for {} group(s) ({} blank)",
        summary.file_count(),
        summary.group_count(),
        summary.blank_count()
    );
    Ok(())
}

/// Load configuration from file.
///
/// If `config_path` is `Some`, the user explicitly passed `--config` and the file
/// must exist (error if not found). If `None`, the default config path is used;
/// a missing default config file falls back to defaults.
fn load_config(config_path: &Option<PathBuf>) -> Result<Config> {
    match config_path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            Config::from_file(path).context("Failed to load configuration")
        }
        None => {
            let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                Config::from_file(&default_path).context("Failed to load configuration")
            } else {
                tracing::debug!("{} not found, using defaults", DEFAULT_CONFIG_FILE);
                Ok(Config::default())
            }
        }
    }
}

/// `--dialects` wins over the config file. Empty entries are dropped, so
/// `--dialects ""` disables validation.
fn resolve_dialects(cli: Option<Vec<String>>, configured: Vec<String>) -> Result<Vec<String>> {
    let Some(cli) = cli else {
        return Ok(configured);
    };

    let dialects: Vec<String> = cli
        .into_iter()
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .collect();
    if let Some(bad) = dialects.iter().find(|d| !is_valid_dialect(d)) {
        anyhow::bail!(
            "Invalid dialect '{}'. Dialects use lowercase letters and digits only",
            bad
        );
    }
    Ok(dialects)
}
