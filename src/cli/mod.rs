//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod audit;
mod batch;
mod generate;
mod inspect;
mod slice;
mod validate;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::catalog::{builtin, load_library, AssetIndex, CatalogError};
use crate::config::{load_config, merge_cli_overrides, CliOverrides, ForgeConfig};
use crate::generator::GenerateError;

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// Spriteforge - deterministic layered sprite sheet generator
#[derive(Parser)]
#[command(name = "forge")]
#[command(about = "Spriteforge - deterministic layered sprite sheet generator")]
#[command(version)]
pub struct Cli {
    /// Debug logging on stderr (otherwise RUST_LOG, default warn)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Use this forge.toml instead of searching for one
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate one sprite sheet from a seed
    Generate {
        /// Numeric or text seed
        seed: String,

        /// Pin a trait (repeatable), e.g. -t dragonType=fire
        #[arg(short = 't', long = "trait", value_name = "CATEGORY=VALUE", value_parser = parse_trait)]
        traits: Vec<(String, String)>,

        /// Output file (default: <output dir>/sheet_<seed>.png)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Asset library directory (default: config, then built-in dragons)
        #[arg(long)]
        library: Option<PathBuf>,

        /// Print the JSON response body instead of writing files
        #[arg(long)]
        json: bool,

        /// Also write the metadata JSON
        #[arg(long)]
        metadata: bool,
    },

    /// Generate a collection, one sheet per seed
    Batch {
        /// Number of items
        #[arg(short = 'n', long)]
        count: Option<u64>,

        /// First seed
        #[arg(long)]
        start: Option<u64>,

        /// Worker threads (0 = all cores)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Output directory
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Asset library directory
        #[arg(long)]
        library: Option<PathBuf>,

        /// Pin a trait for every item (repeatable)
        #[arg(short = 't', long = "trait", value_name = "CATEGORY=VALUE", value_parser = parse_trait)]
        traits: Vec<(String, String)>,

        /// Skip metadata JSON files
        #[arg(long)]
        no_metadata: bool,
    },

    /// Show PNG dimensions and tile grid
    Inspect {
        /// PNG files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Tile edge in pixels
        #[arg(long, default_value = "64")]
        tile: u32,
    },

    /// Extract one tile from a sheet
    Slice {
        /// Sheet PNG
        sheet: PathBuf,

        /// Row index or built-in row name (idle, walk_south, ...)
        #[arg(long)]
        row: String,

        /// Frame column
        #[arg(long, default_value = "0")]
        col: u32,

        /// Tile edge in pixels
        #[arg(long, default_value = "64")]
        tile: u32,

        /// Output PNG
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Check generated metadata for required traits
    Audit {
        /// Directory of metadata JSON (default: output dir)
        dir: Option<PathBuf>,

        /// Required trait type (repeatable; default: config)
        #[arg(long = "require", value_name = "TRAIT")]
        require: Vec<String>,
    },

    /// Load an asset library and list its traits
    Validate {
        /// Library directory (default: config, then built-in dragons)
        library: Option<PathBuf>,
    },
}

/// Parse a `CATEGORY=VALUE` argument.
pub fn parse_trait(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((category, value)) if !category.trim().is_empty() && !value.trim().is_empty() => {
            Ok((category.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected CATEGORY=VALUE, got '{}'", s)),
    }
}

/// Install the tracing subscriber for this process.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    };
    // A second init (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Load forge.toml (explicit or discovered) with CLI overrides applied.
fn load_settings(config: Option<&Path>, overrides: &CliOverrides) -> Result<ForgeConfig, ExitCode> {
    match load_config(config) {
        Ok(mut settings) => {
            merge_cli_overrides(&mut settings, overrides);
            Ok(settings)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            Err(ExitCode::from(EXIT_ERROR))
        }
    }
}

/// The configured library, or the built-in dragons.
fn load_index(settings: &ForgeConfig) -> Result<AssetIndex, CatalogError> {
    match &settings.library.path {
        Some(dir) => load_library(dir),
        None => builtin::dragon_index(),
    }
}

/// Exit code for a failed generation: bad options are invalid arguments.
fn generate_exit_code(e: &GenerateError) -> ExitCode {
    match e.kind() {
        "unknown_category" | "asset_not_found" | "incompatible_traits" => {
            ExitCode::from(EXIT_INVALID_ARGS)
        }
        _ => ExitCode::from(EXIT_ERROR),
    }
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Generate { seed, traits, output, library, json, metadata } => {
            generate::run_generate(config, &seed, traits, output.as_deref(), library, json, metadata)
        }
        Commands::Batch { count, start, jobs, out, library, traits, no_metadata } => {
            let overrides = CliOverrides {
                library,
                out,
                metadata: no_metadata.then_some(false),
                count,
                start_seed: start,
                jobs,
            };
            batch::run_batch(config, &overrides, traits)
        }
        Commands::Inspect { files, tile } => inspect::run_inspect(&files, tile),
        Commands::Slice { sheet, row, col, tile, output } => {
            slice::run_slice(&sheet, &row, col, tile, &output)
        }
        Commands::Audit { dir, require } => audit::run_audit(config, dir.as_deref(), &require),
        Commands::Validate { library } => validate::run_validate(config, library),
    }
}
