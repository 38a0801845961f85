//! tileseeder CLI - seed the QGIS Server tile, legend and thumbnail cache.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::cache::CacheAction;
use commands::layers::LayersAction;
use commands::seed::SeedArgs;
use error::CliError;
use runner::CliRunner;

#[derive(Parser)]
#[command(name = "tileseeder")]
#[command(version, about = "Seed the QGIS Server tile, legend and thumbnail cache", long_about = None)]
struct Cli {
    /// Config file [default: ~/.tileseeder/config.ini]
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable debug logging, mirrored to stderr
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clear a layer's cache and seed its legend, thumbnail and tiles
    Seed(SeedArgs),

    /// Cache maintenance
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Inspect the layer catalog
    Layers {
        #[command(subcommand)]
        action: LayersAction,
    },

    /// Write a default configuration file
    Init,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Init => commands::init::run(config_path),
        Commands::Seed(args) => commands::seed::run(&CliRunner::new(config_path, cli.debug)?, args),
        Commands::Cache { action } => {
            commands::cache::run(&CliRunner::new(config_path, cli.debug)?, action)
        }
        Commands::Layers { action } => {
            commands::layers::run(&CliRunner::new(config_path, cli.debug)?, action)
        }
    }
}
