//! Coordinate type definitions

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Web Mercator valid latitude range
pub const MIN_LAT: f64 = -85.05112878;
pub const MAX_LAT: f64 = 85.05112878;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Zoom levels accepted by the tile grid
pub const MIN_ZOOM: u8 = 0;
pub const MAX_ZOOM: u8 = 24;

/// Earth radius used by spherical Web Mercator (EPSG:3857), in metres.
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Half the width of the Web Mercator square, in metres.
pub const MERCATOR_HALF_EXTENT: f64 = std::f64::consts::PI * EARTH_RADIUS;

/// Errors raised by coordinate conversions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    #[error("invalid zoom level {0} (expected 0..=24)")]
    InvalidZoom(u8),

    #[error("unsupported spatial reference '{0}' (expected EPSG:4326 or EPSG:3857)")]
    UnsupportedSrs(String),

    #[error("invalid zoom range {min}..={max}")]
    InvalidRange { min: u8, max: u8 },
}

/// Spatial references the pipeline knows how to reproject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SpatialRef {
    /// Geographic WGS 84, degrees.
    Wgs84,
    /// Spherical Web Mercator, metres.
    WebMercator,
}

impl SpatialRef {
    /// Canonical authority identifier.
    pub fn authid(&self) -> &'static str {
        match self {
            Self::Wgs84 => "EPSG:4326",
            Self::WebMercator => "EPSG:3857",
        }
    }
}

impl fmt::Display for SpatialRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.authid())
    }
}

impl FromStr for SpatialRef {
    type Err = CoordError;

    /// Parses an authority id such as `EPSG:3857`. Bare SRIDs (`4326`) are
    /// accepted too.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let code = trimmed
            .rsplit_once(':')
            .map(|(_, code)| code)
            .unwrap_or(trimmed);
        match code {
            "4326" => Ok(Self::Wgs84),
            "3857" | "900913" | "102100" | "102113" => Ok(Self::WebMercator),
            _ => Err(CoordError::UnsupportedSrs(trimmed.to_string())),
        }
    }
}

impl TryFrom<String> for SpatialRef {
    type Error = CoordError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SpatialRef> for String {
    fn from(srs: SpatialRef) -> Self {
        srs.authid().to_string()
    }
}

/// Rectangular extent `(xmin, ymin, xmax, ymax)` in some spatial reference.
///
/// For EPSG:4326 the x axis is longitude and the y axis latitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl BoundingBox {
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// Builds a bounding box from a `[xmin, ymin, xmax, ymax]` array.
    pub fn from_array(values: [f64; 4]) -> Self {
        Self::new(values[0], values[1], values[2], values[3])
    }

    /// True when the box covers nothing: inverted axes or non-finite values.
    ///
    /// A degenerate box (a point or a line) is not empty.
    pub fn is_empty(&self) -> bool {
        let finite = [self.xmin, self.ymin, self.xmax, self.ymax]
            .iter()
            .all(|v| v.is_finite());
        !finite || self.xmin > self.xmax || self.ymin > self.ymax
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.xmin, self.ymin, self.xmax, self.ymax
        )
    }
}

/// Tile address in the slippy-map scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    /// Zoom level
    pub zoom: u8,
    /// Column, 0 at the antimeridian, increasing eastward
    pub x: u32,
    /// Row, 0 at the north edge, increasing southward
    pub y: u32,
}

impl TileCoord {
    pub fn new(zoom: u8, x: u32, y: u32) -> Self {
        Self { zoom, x, y }
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_spatial_ref() {
        assert_eq!("EPSG:4326".parse::<SpatialRef>(), Ok(SpatialRef::Wgs84));
        assert_eq!("4326".parse::<SpatialRef>(), Ok(SpatialRef::Wgs84));
        assert_eq!(
            "EPSG:900913".parse::<SpatialRef>(),
            Ok(SpatialRef::WebMercator)
        );
        assert_eq!(
            " epsg:3857 ".parse::<SpatialRef>(),
            Ok(SpatialRef::WebMercator)
        );
    }

    #[test]
    fn test_parse_unsupported_spatial_ref() {
        let err = "EPSG:32748".parse::<SpatialRef>().unwrap_err();
        assert_eq!(err, CoordError::UnsupportedSrs("EPSG:32748".to_string()));
    }

    #[test]
    fn test_empty_bbox() {
        assert!(BoundingBox::new(1.0, 0.0, 0.0, 1.0).is_empty());
        assert!(BoundingBox::new(0.0, 1.0, 1.0, 0.0).is_empty());
        assert!(BoundingBox::new(f64::NAN, 0.0, 1.0, 1.0).is_empty());
        assert!(!BoundingBox::new(5.0, 5.0, 5.0, 5.0).is_empty());
    }

    #[test]
    fn test_tile_coord_display() {
        assert_eq!(TileCoord::new(10, 512, 300).to_string(), "10/512/300");
    }
}
