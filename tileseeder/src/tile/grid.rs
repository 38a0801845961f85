//! Tile coordinate generation over a bounding box and zoom range.
//!
//! A [`TileGrid`] covers an EPSG:4326 bounding box with one [`TileRange`]
//! per zoom level. The total tile count is known before iteration starts,
//! so progress can be reported up front, and [`TileGrid::iter`] can be
//! called any number of times to restart the sequence.
//!
//! # Example
//!
//! ```
//! use tileseeder::coord::BoundingBox;
//! use tileseeder::tile::TileGrid;
//!
//! let bbox = BoundingBox::new(106.7, -6.3, 106.9, -6.1);
//! let grid = TileGrid::new(bbox, 10, 12).unwrap();
//! assert_eq!(grid.iter().count() as u64, grid.count());
//! ```

use crate::coord::{
    lat_to_tile_y, lon_to_tile_x, tiles_per_axis, transform_bbox, BoundingBox, CoordError,
    SpatialRef, TileCoord, MAX_ZOOM,
};
use crate::layer::Layer;

/// Tolerance, in tile units, for an edge that lands on a tile boundary.
const EDGE_EPSILON: f64 = 1e-9;

/// Inclusive column/row bounds of the tiles covering a bbox at one zoom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    pub zoom: u8,
    pub x_min: u32,
    pub x_max: u32,
    pub y_min: u32,
    pub y_max: u32,
}

impl TileRange {
    /// Computes the covering range of `bbox` (EPSG:4326) at `zoom`.
    ///
    /// The east and south edges are exclusive: a bbox that ends exactly on a
    /// tile boundary does not pull in the neighbouring tile.
    pub fn covering(bbox: &BoundingBox, zoom: u8) -> Self {
        let max_index = tiles_per_axis(zoom) - 1;

        let x_min = clamp_index(inclusive_edge(lon_to_tile_x(bbox.xmin, zoom)), max_index);
        let x_max = clamp_index(exclusive_edge(lon_to_tile_x(bbox.xmax, zoom)), max_index);
        // Rows grow southward, so the north edge gives the first row.
        let y_min = clamp_index(inclusive_edge(lat_to_tile_y(bbox.ymax, zoom)), max_index);
        let y_max = clamp_index(exclusive_edge(lat_to_tile_y(bbox.ymin, zoom)), max_index);

        Self {
            zoom,
            x_min,
            x_max: x_max.max(x_min),
            y_min,
            y_max: y_max.max(y_min),
        }
    }

    pub fn columns(&self) -> u64 {
        (self.x_max - self.x_min) as u64 + 1
    }

    pub fn rows(&self) -> u64 {
        (self.y_max - self.y_min) as u64 + 1
    }

    /// Number of tiles in this range.
    pub fn count(&self) -> u64 {
        self.columns() * self.rows()
    }

    pub fn contains(&self, tile: &TileCoord) -> bool {
        tile.zoom == self.zoom
            && (self.x_min..=self.x_max).contains(&tile.x)
            && (self.y_min..=self.y_max).contains(&tile.y)
    }
}

fn inclusive_edge(value: f64) -> f64 {
    (value + EDGE_EPSILON).floor()
}

fn exclusive_edge(value: f64) -> f64 {
    (value - EDGE_EPSILON).ceil() - 1.0
}

fn clamp_index(value: f64, max_index: u32) -> u32 {
    if value <= 0.0 {
        0
    } else {
        (value as u64).min(max_index as u64) as u32
    }
}

/// Every tile address covering a bounding box over an inclusive zoom range.
#[derive(Debug, Clone, PartialEq)]
pub struct TileGrid {
    bbox: BoundingBox,
    ranges: Vec<TileRange>,
    count: u64,
}

impl TileGrid {
    /// Builds the grid for an EPSG:4326 bounding box.
    ///
    /// # Arguments
    ///
    /// * `bbox` - Area to cover, in degrees
    /// * `min_zoom` - First zoom level, inclusive
    /// * `max_zoom` - Last zoom level, inclusive
    ///
    /// An empty bbox or `min_zoom > max_zoom` gives an empty grid rather
    /// than an error.
    ///
    /// # Errors
    ///
    /// [`CoordError::InvalidZoom`] if either zoom is above [`MAX_ZOOM`].
    pub fn new(bbox: BoundingBox, min_zoom: u8, max_zoom: u8) -> Result<Self, CoordError> {
        if max_zoom > MAX_ZOOM {
            return Err(CoordError::InvalidZoom(max_zoom));
        }
        if min_zoom > MAX_ZOOM {
            return Err(CoordError::InvalidZoom(min_zoom));
        }

        let ranges: Vec<TileRange> = if bbox.is_empty() || min_zoom > max_zoom {
            Vec::new()
        } else {
            (min_zoom..=max_zoom)
                .map(|zoom| TileRange::covering(&bbox, zoom))
                .collect()
        };
        let count = ranges.iter().map(TileRange::count).sum();

        Ok(Self {
            bbox,
            ranges,
            count,
        })
    }

    /// Builds the grid for a layer, reprojecting its bbox to EPSG:4326.
    ///
    /// # Errors
    ///
    /// [`CoordError::UnsupportedSrs`] when the layer's native spatial
    /// reference cannot be reprojected, plus the zoom errors of [`TileGrid::new`].
    pub fn for_layer(layer: &Layer, min_zoom: u8, max_zoom: u8) -> Result<Self, CoordError> {
        let bbox = transform_bbox(&layer.bbox, layer.spatial_ref()?, SpatialRef::Wgs84);
        Self::new(bbox, min_zoom, max_zoom)
    }

    /// Total number of tiles, computed without iterating.
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The EPSG:4326 bbox the grid was built from.
    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    pub fn ranges(&self) -> &[TileRange] {
        &self.ranges
    }

    /// Lazily iterates tiles, zoom ascending then row-major.
    pub fn iter(&self) -> TileIter<'_> {
        TileIter {
            ranges: &self.ranges,
            range_index: 0,
            next_x: self.ranges.first().map(|r| r.x_min).unwrap_or(0),
            next_y: self.ranges.first().map(|r| r.y_min).unwrap_or(0),
            remaining: self.count,
        }
    }
}

impl<'a> IntoIterator for &'a TileGrid {
    type Item = TileCoord;
    type IntoIter = TileIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over a [`TileGrid`].
#[derive(Debug, Clone)]
pub struct TileIter<'a> {
    ranges: &'a [TileRange],
    range_index: usize,
    next_x: u32,
    next_y: u32,
    remaining: u64,
}

impl Iterator for TileIter<'_> {
    type Item = TileCoord;

    fn next(&mut self) -> Option<Self::Item> {
        let range = self.ranges.get(self.range_index)?;
        let tile = TileCoord::new(range.zoom, self.next_x, self.next_y);

        if self.next_x < range.x_max {
            self.next_x += 1;
        } else if self.next_y < range.y_max {
            self.next_x = range.x_min;
            self.next_y += 1;
        } else {
            self.range_index += 1;
            if let Some(next) = self.ranges.get(self.range_index) {
                self.next_x = next.x_min;
                self.next_y = next.y_min;
            }
        }

        self.remaining = self.remaining.saturating_sub(1);
        Some(tile)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.remaining).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}
