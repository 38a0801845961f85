//! Layer catalog CLI commands.

use clap::Subcommand;
use console::style;
use tileseeder::cache::layer_stats;
use tileseeder::layer::LayerCatalog;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Layer subcommands.
#[derive(Debug, Subcommand)]
pub enum LayersAction {
    /// List every layer in the catalog
    List,
    /// Show one layer's metadata, backend and cache state
    Show {
        /// Layer name or alternate name
        layer: String,
    },
}

/// Run a layers subcommand.
pub fn run(runner: &CliRunner, action: LayersAction) -> Result<(), CliError> {
    match action {
        LayersAction::List => list(runner),
        LayersAction::Show { layer } => show(runner, &layer),
    }
}

fn list(runner: &CliRunner) -> Result<(), CliError> {
    let catalog = runner.catalog()?;
    let layers = catalog.layers();

    println!("Layer catalog: {}", catalog.directory().display());
    if layers.is_empty() {
        println!("No layers found.");
        return Ok(());
    }

    println!();
    println!("{:<24} {:<8} {:<10} {}", "NAME", "TYPE", "SRS", "TITLE");
    for layer in &layers {
        println!(
            "{:<24} {:<8} {:<10} {}",
            layer.name,
            layer.store_type,
            layer.srs,
            layer.title.as_deref().unwrap_or("-")
        );
    }
    println!();
    println!("{} layer(s)", layers.len());
    Ok(())
}

fn show(runner: &CliRunner, name: &str) -> Result<(), CliError> {
    let layer = runner.layer(name)?;
    let layout = runner.config().cache_layout();

    println!("{}", style(&layer.name).bold());
    if let Some(alternate) = &layer.alternate {
        println!("  Alternate:   {}", alternate);
    }
    if let Some(title) = &layer.title {
        println!("  Title:       {}", title);
    }
    println!("  Type:        {}", layer.store_type);
    println!("  SRS:         {}", layer.srs);
    if let Err(e) = layer.spatial_ref() {
        println!("               {}", style(format!("{}; cannot be seeded", e)).yellow());
    }
    println!("  Extent:      {}", layer.bbox);
    if let Some(provider) = &layer.provider {
        println!("  Provider:    {}", provider);
    }
    if let Some(datasource) = &layer.datasource {
        println!("  Datasource:  {}", datasource);
    }
    println!("  QGIS layer:  {}", layer.backend.qgis_layer_name);
    println!("  Project:     {}", layer.backend.project.display());
    println!("  Cache:       {}", layout.layer_dir(&layer).display());

    let stats = layer_stats(&layout, &layer).map_err(|error| CliError::Cache {
        path: layout.layer_dir(&layer),
        error,
    })?;
    println!("  Cached:      {}", stats);
    Ok(())
}
