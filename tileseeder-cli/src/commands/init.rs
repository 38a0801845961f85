//! Init command - write a default configuration file.

use std::path::Path;

use console::style;
use tileseeder::config::{resolve_config_path, ConfigFile};

use crate::error::CliError;

/// Run the init command.
pub fn run(config_path: Option<&Path>) -> Result<(), CliError> {
    let path = resolve_config_path(config_path);

    if ConfigFile::ensure_exists_at(&path)? {
        println!("{} {}", style("Created").green(), path.display());
    } else {
        println!(
            "{} {}",
            style("Configuration already exists:").yellow(),
            path.display()
        );
    }

    let config = ConfigFile::load_from(&path)?;
    std::fs::create_dir_all(&config.catalog.directory).map_err(|error| CliError::Cache {
        path: config.catalog.directory.clone(),
        error,
    })?;

    println!();
    println!("QGIS Server:     {}", style(&config.qgis_server.url).cyan());
    println!("Layer catalog:   {}", config.catalog.directory.display());
    println!("Tile cache:      {}", config.cache.tiles_directory.display());
    println!("Thumbnails:      {}", config.cache.thumbnails_directory.display());
    println!();
    println!("Place .qlr layer definitions (or a layers.json) in the layer catalog,");
    println!("then run: {} seed <LAYER>", style("tileseeder").cyan());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_writes_config_once() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.ini");
        let catalog = temp_dir.path().join("layers");

        let mut config = ConfigFile::default();
        config.catalog.directory = catalog.clone();
        config.save_to(&path).unwrap();

        run(Some(&path)).unwrap();

        assert!(catalog.is_dir());
        assert_eq!(ConfigFile::load_from(&path).unwrap().catalog.directory, catalog);
    }
}
