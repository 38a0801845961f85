//! Layer cache cleanup and statistics.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, info};

use super::layout::{CacheLayout, LEGEND_FILE};
use crate::layer::Layer;

/// Removes a layer's legend and tiles.
///
/// Returns `false` if there was nothing to remove. Thumbnails are kept.
pub fn clear_layer(layout: &CacheLayout, layer: &Layer) -> io::Result<bool> {
    let dir = layout.layer_dir(layer);
    match fs::remove_dir_all(&dir) {
        Ok(()) => {
            info!(layer = %layer.name, path = %dir.display(), "Cleared layer cache");
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(layer = %layer.name, path = %dir.display(), "No layer cache to clear");
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

/// On-disk footprint of one layer's cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub tiles: u64,
    pub legends: u64,
    pub thumbnail: bool,
    pub bytes: u64,
    /// Tile count per zoom level, across styles.
    pub tiles_per_zoom: BTreeMap<u8, u64>,
}

impl CacheStats {
    pub fn is_empty(&self) -> bool {
        self.tiles == 0 && self.legends == 0 && !self.thumbnail
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tiles, {} legends, thumbnail: {}, {} bytes",
            self.tiles,
            self.legends,
            if self.thumbnail { "yes" } else { "no" },
            self.bytes
        )
    }
}

/// Walks a layer's cache directory and thumbnail.
pub fn layer_stats(layout: &CacheLayout, layer: &Layer) -> io::Result<CacheStats> {
    let mut stats = CacheStats::default();

    let thumbnail = layout.thumbnail_path(layer);
    if let Ok(meta) = fs::metadata(&thumbnail) {
        stats.thumbnail = meta.is_file();
        stats.bytes += meta.len();
    }

    let layer_dir = layout.layer_dir(layer);
    if !layer_dir.is_dir() {
        return Ok(stats);
    }

    for entry in fs::read_dir(&layer_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if let Ok(meta) = fs::metadata(entry.path().join(LEGEND_FILE)) {
            if meta.is_file() {
                stats.legends += 1;
                stats.bytes += meta.len();
            }
        }
        count_style_tiles(&entry.path(), &mut stats)?;
    }

    Ok(stats)
}

/// Counts `<style>/<zoom>/<x>/<y>.png`, skipping anything that does not
/// fit the layout.
fn count_style_tiles(style_dir: &Path, stats: &mut CacheStats) -> io::Result<()> {
    for zoom_entry in fs::read_dir(style_dir)? {
        let zoom_entry = zoom_entry?;
        let Some(zoom) = zoom_entry
            .file_name()
            .to_str()
            .and_then(|z| z.parse::<u8>().ok())
        else {
            continue;
        };
        if !zoom_entry.file_type()?.is_dir() {
            continue;
        }

        for x_entry in fs::read_dir(zoom_entry.path())? {
            let x_entry = x_entry?;
            if !x_entry.file_type()?.is_dir() {
                continue;
            }
            for tile in fs::read_dir(x_entry.path())? {
                let tile = tile?;
                let meta = tile.metadata()?;
                if meta.is_file() {
                    stats.tiles += 1;
                    stats.bytes += meta.len();
                    *stats.tiles_per_zoom.entry(zoom).or_insert(0) += 1;
                }
            }
        }
    }
    Ok(())
}
