//! # Transit - Light Curve Transit Inspector
//!
//! Headless front end for `transit-core`. Each subcommand loads one light
//! curve, drives the session the way the interactive viewer would, and
//! prints the result as plain text (CSV for series output).
//!
//! ```bash
//! transit info kplr011446443-2009131105131_llc.csv
//! transit fold kplr011446443-2009131105131_llc.csv --epoch 131.51 --period 3.54 --detrend
//! transit markers kplr011446443-2009131105131_llc.csv --epoch 131.51 --period 3.54
//! transit catalog kplr011446443-2009131105131_llc.csv add --epoch 131.51 --period 3.54
//! ```
//!
//! `.fits` files need the `fits` feature.

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use transit_core::{Session, TransitConfig};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON config file; defaults are used when it does not exist
    #[arg(long, default_value = "transit.json")]
    config: PathBuf,

    /// Override the catalog cache directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Log debug output from the transit crates
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Summarise a light curve and its saved transits
    Info {
        file: PathBuf,
    },
    /// Print the phase-folded light curve as `folded_time,flux`
    Fold {
        file: PathBuf,
        #[arg(long, allow_hyphen_values = true)]
        epoch: f64,
        #[arg(long)]
        period: f64,
        /// Use detrended flux
        #[arg(long, default_value_t = false)]
        detrend: bool,
    },
    /// Print the detrended light curve as `time,flux`
    Detrend {
        file: PathBuf,
    },
    /// Print the first transit marker and its periodic repeats
    Markers {
        file: PathBuf,
        #[arg(long, allow_hyphen_values = true)]
        epoch: f64,
        #[arg(long)]
        period: Option<f64>,
    },
    /// List or edit the saved transits of a light curve
    Catalog {
        file: PathBuf,
        #[command(subcommand)]
        action: CatalogAction,
    },
}

#[derive(Subcommand, Debug)]
enum CatalogAction {
    /// Print every saved entry with its index
    List,
    /// Save a candidate
    Add {
        #[arg(long, allow_hyphen_values = true)]
        epoch: f64,
        #[arg(long)]
        period: Option<f64>,
    },
    /// Delete the entry at an index
    Remove {
        index: usize,
    },
}

/// Quiet for dependencies, louder for our own crates.
fn init_logging(verbose: bool) {
    let my_code_level = if verbose {
        log::LevelFilter::Debug
    } else if cfg!(debug_assertions) {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Warn
    };

    env_logger::Builder::new()
        .filter(None, log::LevelFilter::Warn)
        .filter(Some("transit_core"), my_code_level)
        .filter(Some("transit"), my_code_level)
        .parse_default_env()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = TransitConfig::load(&cli.config)
        .with_context(|| format!("Failed to read config {}", cli.config.display()))?;
    if let Some(cache_dir) = cli.cache_dir {
        config.cache_dir = cache_dir;
    }

    let mut session = Session::new(config);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let result = commands::run(&mut session, cli.command, &mut out);

    // Flush saved transits even when the command failed part way.
    session.close().context("Failed to write the transit catalog")?;
    out.flush()?;
    result
}
