//! Cache key to file path mapping.
//!
//! Every path is a pure function of its logical key:
//!
//! ```text
//! <tiles_dir>/<layer>/<style>/<zoom>/<x>/<y>.png   tile
//! <tiles_dir>/<layer>/<style>/legend.png           legend
//! <thumbnails_dir>/<layer>.png                     thumbnail
//! ```
//!
//! Zoom directories are always numeric, so the legend file never shares a
//! name with tile data whatever the style is called.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::coord::TileCoord;
use crate::layer::Layer;

/// File name of the legend image inside a style directory.
pub const LEGEND_FILE: &str = "legend.png";

/// Replaces every character outside `[A-Za-z0-9_.-]` with `_`.
///
/// An empty name, `.` or `..` becomes `_` so a segment can never escape
/// its parent directory.
pub fn sanitize_segment(name: &str) -> String {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| Regex::new(r"[^A-Za-z0-9_.-]").unwrap());

    let cleaned = pattern.replace_all(name, "_");
    match cleaned.as_ref() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned.into_owned(),
    }
}

/// Roots of the on-disk cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLayout {
    tiles_dir: PathBuf,
    thumbnails_dir: PathBuf,
}

impl CacheLayout {
    pub fn new(tiles_dir: impl Into<PathBuf>, thumbnails_dir: impl Into<PathBuf>) -> Self {
        Self {
            tiles_dir: tiles_dir.into(),
            thumbnails_dir: thumbnails_dir.into(),
        }
    }

    pub fn tiles_dir(&self) -> &Path {
        &self.tiles_dir
    }

    pub fn thumbnails_dir(&self) -> &Path {
        &self.thumbnails_dir
    }

    /// Cache segment for a layer, derived from its backend layer name.
    pub fn layer_key(layer: &Layer) -> String {
        sanitize_segment(&layer.backend.qgis_layer_name)
    }

    /// Directory holding a layer's legend and tiles.
    pub fn layer_dir(&self, layer: &Layer) -> PathBuf {
        self.tiles_dir.join(Self::layer_key(layer))
    }

    /// Directory holding one style's legend and tiles.
    pub fn style_dir(&self, layer: &Layer, style: &str) -> PathBuf {
        self.layer_dir(layer).join(sanitize_segment(style))
    }

    pub fn tile_path(&self, layer: &Layer, style: &str, tile: &TileCoord) -> PathBuf {
        self.style_dir(layer, style)
            .join(tile.zoom.to_string())
            .join(tile.x.to_string())
            .join(format!("{}.png", tile.y))
    }

    pub fn legend_path(&self, layer: &Layer, style: &str) -> PathBuf {
        self.style_dir(layer, style).join(LEGEND_FILE)
    }

    pub fn thumbnail_path(&self, layer: &Layer) -> PathBuf {
        self.thumbnails_dir
            .join(format!("{}.png", Self::layer_key(layer)))
    }
}
