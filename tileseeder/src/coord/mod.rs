//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (EPSG:4326),
//! spherical Web Mercator (EPSG:3857) and slippy-map tile addresses.

mod types;

pub use types::{
    BoundingBox, CoordError, SpatialRef, TileCoord, EARTH_RADIUS, MAX_LAT, MAX_LON,
    MAX_ZOOM, MERCATOR_HALF_EXTENT, MIN_LAT, MIN_LON, MIN_ZOOM,
};

use std::f64::consts::PI;

/// Number of tiles along one axis at the given zoom.
#[inline]
pub fn tiles_per_axis(zoom: u8) -> u32 {
    1u32 << zoom
}

/// Fractional tile column of a longitude.
#[inline]
pub fn lon_to_tile_x(lon: f64, zoom: u8) -> f64 {
    let n = tiles_per_axis(zoom) as f64;
    (lon.clamp(MIN_LON, MAX_LON) + 180.0) / 360.0 * n
}

/// Fractional tile row of a latitude (Web Mercator).
#[inline]
pub fn lat_to_tile_y(lat: f64, zoom: u8) -> f64 {
    let n = tiles_per_axis(zoom) as f64;
    let lat_rad = lat.clamp(MIN_LAT, MAX_LAT).to_radians();
    (1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n
}

/// Converts geographic coordinates to the tile that contains them.
#[inline]
pub fn to_tile_coords(lat: f64, lon: f64, zoom: u8) -> Result<TileCoord, CoordError> {
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }
    let max_index = tiles_per_axis(zoom) - 1;
    let x = (lon_to_tile_x(lon, zoom).floor() as u32).min(max_index);
    let y = (lat_to_tile_y(lat, zoom).floor() as u32).min(max_index);
    Ok(TileCoord { zoom, x, y })
}

/// Returns the latitude/longitude of the tile's northwest corner.
#[inline]
pub fn tile_to_lat_lon(tile: &TileCoord) -> (f64, f64) {
    let n = tiles_per_axis(tile.zoom) as f64;
    let lon = tile.x as f64 / n * 360.0 - 180.0;
    let y = tile.y as f64 / n;
    let lat = (PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees();
    (lat, lon)
}

/// Geographic extent of a tile in EPSG:4326.
pub fn tile_bounds_wgs84(tile: &TileCoord) -> BoundingBox {
    let (north, west) = tile_to_lat_lon(tile);
    let (south, east) = tile_to_lat_lon(&TileCoord::new(tile.zoom, tile.x + 1, tile.y + 1));
    BoundingBox::new(west, south, east, north)
}

/// Extent of a tile in EPSG:3857 metres.
pub fn tile_bounds_mercator(tile: &TileCoord) -> BoundingBox {
    let size = 2.0 * MERCATOR_HALF_EXTENT / tiles_per_axis(tile.zoom) as f64;
    let west = -MERCATOR_HALF_EXTENT + tile.x as f64 * size;
    let north = MERCATOR_HALF_EXTENT - tile.y as f64 * size;
    BoundingBox::new(west, north - size, west + size, north)
}

/// Projects a longitude/latitude pair to Web Mercator metres.
#[inline]
pub fn lon_lat_to_mercator(lon: f64, lat: f64) -> (f64, f64) {
    let lat = lat.clamp(MIN_LAT, MAX_LAT);
    let x = EARTH_RADIUS * lon.to_radians();
    let y = EARTH_RADIUS * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();
    (x, y)
}

/// Unprojects Web Mercator metres to a longitude/latitude pair.
#[inline]
pub fn mercator_to_lon_lat(x: f64, y: f64) -> (f64, f64) {
    let lon = (x / EARTH_RADIUS).to_degrees();
    let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();
    (lon.clamp(MIN_LON, MAX_LON), lat)
}

/// Reprojects a bounding box between the supported spatial references.
///
/// Both projections are monotonic per axis, so transforming the two corners
/// gives the exact extent.
pub fn transform_bbox(bbox: &BoundingBox, from: SpatialRef, to: SpatialRef) -> BoundingBox {
    if from == to || bbox.is_empty() {
        return *bbox;
    }
    match (from, to) {
        (SpatialRef::WebMercator, SpatialRef::Wgs84) => {
            let (xmin, ymin) = mercator_to_lon_lat(bbox.xmin, bbox.ymin);
            let (xmax, ymax) = mercator_to_lon_lat(bbox.xmax, bbox.ymax);
            BoundingBox::new(xmin, ymin, xmax, ymax)
        }
        (SpatialRef::Wgs84, SpatialRef::WebMercator) => {
            let (xmin, ymin) = lon_lat_to_mercator(bbox.xmin, bbox.ymin);
            let (xmax, ymax) = lon_lat_to_mercator(bbox.xmax, bbox.ymax);
            BoundingBox::new(xmin, ymin, xmax, ymax)
        }
        _ => *bbox,
    }
}
