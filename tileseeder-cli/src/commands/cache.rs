//! Cache management CLI commands.

use clap::Subcommand;
use tileseeder::cache::{clear_layer, layer_stats, CacheStats};
use tileseeder::layer::{Layer, LayerCatalog};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Cache action subcommands.
#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Remove a layer's cached tiles and legends
    Clear {
        /// Layer name or alternate name
        layer: String,
        /// Also remove the layer's thumbnail
        #[arg(long)]
        thumbnail: bool,
    },
    /// Show cache statistics for one layer or for every layer in the catalog
    Stats {
        /// Layer name or alternate name
        layer: Option<String>,
    },
}

/// Run a cache subcommand.
pub fn run(runner: &CliRunner, action: CacheAction) -> Result<(), CliError> {
    match action {
        CacheAction::Clear { layer, thumbnail } => clear(runner, &layer, thumbnail),
        CacheAction::Stats { layer: Some(name) } => {
            let layer = runner.layer(&name)?;
            print_stats(&layer, &stats(runner, &layer)?);
            Ok(())
        }
        CacheAction::Stats { layer: None } => {
            let layers = runner.catalog()?.layers();
            let mut total = CacheStats::default();
            for layer in &layers {
                let layer_stats = stats(runner, layer)?;
                if !layer_stats.is_empty() {
                    print_stats(layer, &layer_stats);
                }
                total.tiles += layer_stats.tiles;
                total.legends += layer_stats.legends;
                total.bytes += layer_stats.bytes;
            }
            println!();
            println!(
                "Total: {} tiles, {} legends, {} bytes across {} layer(s)",
                total.tiles,
                total.legends,
                total.bytes,
                layers.len()
            );
            Ok(())
        }
    }
}

fn clear(runner: &CliRunner, name: &str, thumbnail: bool) -> Result<(), CliError> {
    let layer = runner.layer(name)?;
    let layout = runner.config().cache_layout();
    let layer_dir = layout.layer_dir(&layer);

    println!("Clearing cache at: {}", layer_dir.display());
    let removed = clear_layer(&layout, &layer).map_err(|error| CliError::Cache {
        path: layer_dir.clone(),
        error,
    })?;
    println!("{}", if removed { "Removed." } else { "Nothing cached." });

    if thumbnail {
        let path = layout.thumbnail_path(&layer);
        match std::fs::remove_file(&path) {
            Ok(()) => println!("Removed thumbnail {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(error) => return Err(CliError::Cache { path, error }),
        }
    }
    Ok(())
}

fn stats(runner: &CliRunner, layer: &Layer) -> Result<CacheStats, CliError> {
    let layout = runner.config().cache_layout();
    layer_stats(&layout, layer).map_err(|error| CliError::Cache {
        path: layout.layer_dir(layer),
        error,
    })
}

fn print_stats(layer: &Layer, stats: &CacheStats) {
    println!("{}: {}", layer.name, stats);
    for (zoom, count) in &stats.tiles_per_zoom {
        println!("  z{:<2} {}", zoom, count);
    }
}
