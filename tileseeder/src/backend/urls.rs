//! OGC WMS request URLs for QGIS Server.
//!
//! Tiles are requested as 256x256 transparent PNGs in EPSG:3857. WMS 1.3.0
//! uses latitude/longitude axis order for EPSG:4326, so thumbnail boxes
//! are written as `ymin,xmin,ymax,xmax`.

use reqwest::Url;
use thiserror::Error;

use crate::coord::{tile_bounds_mercator, BoundingBox, TileCoord};
use crate::layer::BackendHandle;

pub const WMS_VERSION: &str = "1.3.0";
pub const TILE_SIZE: u32 = 256;
pub const PNG_FORMAT: &str = "image/png";

/// Style name that maps to the layer's default QGIS style.
pub const DEFAULT_STYLE: &str = "default";

pub const DEFAULT_THUMBNAIL_WIDTH: u32 = 240;
pub const DEFAULT_THUMBNAIL_HEIGHT: u32 = 180;

#[derive(Debug, Error)]
#[error("invalid QGIS Server URL '{url}': {reason}")]
pub struct EndpointError {
    pub url: String,
    pub reason: String,
}

/// Builds OGC request URLs against one QGIS Server endpoint.
#[derive(Debug, Clone)]
pub struct QgisServerUrls {
    endpoint: Url,
    thumbnail_width: u32,
    thumbnail_height: u32,
}

impl QgisServerUrls {
    pub fn new(endpoint: &str) -> Result<Self, EndpointError> {
        let endpoint = Url::parse(endpoint).map_err(|e| EndpointError {
            url: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        if endpoint.cannot_be_a_base() {
            return Err(EndpointError {
                url: endpoint.to_string(),
                reason: "not an http(s) URL".to_string(),
            });
        }
        Ok(Self {
            endpoint,
            thumbnail_width: DEFAULT_THUMBNAIL_WIDTH,
            thumbnail_height: DEFAULT_THUMBNAIL_HEIGHT,
        })
    }

    pub fn with_thumbnail_size(mut self, width: u32, height: u32) -> Self {
        self.thumbnail_width = width;
        self.thumbnail_height = height;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// GetMap for one slippy tile.
    pub fn tile(&self, backend: &BackendHandle, style: &str, tile: &TileCoord) -> String {
        let map = backend.project.to_string_lossy();
        let bbox = xy_bbox(&tile_bounds_mercator(tile));
        let size = TILE_SIZE.to_string();
        self.build(&[
            ("SERVICE", "WMS"),
            ("VERSION", WMS_VERSION),
            ("REQUEST", "GetMap"),
            ("MAP", &*map),
            ("LAYERS", backend.qgis_layer_name.as_str()),
            ("STYLES", wms_style(style)),
            ("CRS", "EPSG:3857"),
            ("BBOX", bbox.as_str()),
            ("WIDTH", size.as_str()),
            ("HEIGHT", size.as_str()),
            ("FORMAT", PNG_FORMAT),
            ("TRANSPARENT", "true"),
        ])
    }

    /// GetLegendGraphic without the layer title.
    pub fn legend(&self, backend: &BackendHandle, style: &str) -> String {
        let map = backend.project.to_string_lossy();
        self.build(&[
            ("SERVICE", "WMS"),
            ("VERSION", WMS_VERSION),
            ("REQUEST", "GetLegendGraphic"),
            ("MAP", &*map),
            ("LAYER", backend.qgis_layer_name.as_str()),
            ("STYLE", wms_style(style)),
            ("FORMAT", PNG_FORMAT),
            ("LAYERTITLE", "False"),
        ])
    }

    /// GetMap for a thumbnail covering `bbox` (EPSG:4326).
    pub fn thumbnail(&self, backend: &BackendHandle, bbox: &BoundingBox) -> String {
        let map = backend.project.to_string_lossy();
        let bbox = format!("{},{},{},{}", bbox.ymin, bbox.xmin, bbox.ymax, bbox.xmax);
        let width = self.thumbnail_width.to_string();
        let height = self.thumbnail_height.to_string();
        self.build(&[
            ("SERVICE", "WMS"),
            ("VERSION", WMS_VERSION),
            ("REQUEST", "GetMap"),
            ("MAP", &*map),
            ("LAYERS", backend.qgis_layer_name.as_str()),
            ("STYLES", ""),
            ("CRS", "EPSG:4326"),
            ("BBOX", bbox.as_str()),
            ("WIDTH", width.as_str()),
            ("HEIGHT", height.as_str()),
            ("FORMAT", PNG_FORMAT),
            ("TRANSPARENT", "true"),
        ])
    }

    fn build(&self, params: &[(&str, &str)]) -> String {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().extend_pairs(params.iter().copied());
        url.into()
    }
}

fn wms_style(style: &str) -> &str {
    if style == DEFAULT_STYLE {
        ""
    } else {
        style
    }
}

fn xy_bbox(bbox: &BoundingBox) -> String {
    format!("{},{},{},{}", bbox.xmin, bbox.ymin, bbox.xmax, bbox.ymax)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn backend() -> BackendHandle {
        BackendHandle {
            qgis_layer_name: "roads".to_string(),
            project: PathBuf::from("/data/roads.qgs"),
        }
    }

    fn query(url: &str) -> HashMap<String, String> {
        Url::parse(url)
            .unwrap()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn test_rejects_bad_endpoint() {
        assert!(QgisServerUrls::new("not a url").is_err());
        assert!(QgisServerUrls::new("mailto:ops@example.com").is_err());
    }

    #[test]
    fn test_tile_url() {
        let urls = QgisServerUrls::new("http://qgis:8080/ows/").unwrap();
        let url = urls.tile(&backend(), "default", &TileCoord::new(0, 0, 0));
        assert!(url.starts_with("http://qgis:8080/ows/?"));

        let q = query(&url);
        assert_eq!(q["REQUEST"], "GetMap");
        assert_eq!(q["MAP"], "/data/roads.qgs");
        assert_eq!(q["LAYERS"], "roads");
        assert_eq!(q["STYLES"], "");
        assert_eq!(q["CRS"], "EPSG:3857");
        assert_eq!(q["WIDTH"], "256");
        assert_eq!(q["TRANSPARENT"], "true");

        let bbox: Vec<f64> = q["BBOX"].split(',').map(|v| v.parse().unwrap()).collect();
        assert_eq!(bbox.len(), 4);
        assert!((bbox[0] + 20037508.342789244).abs() < 1e-3);
        assert!((bbox[3] - 20037508.342789244).abs() < 1e-3);
    }

    #[test]
    fn test_named_style_passes_through() {
        let urls = QgisServerUrls::new("http://qgis/ows").unwrap();
        let q = query(&urls.tile(&backend(), "flood_depth", &TileCoord::new(3, 1, 2)));
        assert_eq!(q["STYLES"], "flood_depth");

        let q = query(&urls.legend(&backend(), "flood_depth"));
        assert_eq!(q["STYLE"], "flood_depth");
    }

    #[test]
    fn test_legend_url() {
        let urls = QgisServerUrls::new("http://qgis/ows").unwrap();
        let q = query(&urls.legend(&backend(), "default"));
        assert_eq!(q["REQUEST"], "GetLegendGraphic");
        assert_eq!(q["LAYER"], "roads");
        assert_eq!(q["STYLE"], "");
        assert_eq!(q["LAYERTITLE"], "False");
        assert_eq!(q["FORMAT"], "image/png");
    }

    #[test]
    fn test_thumbnail_url_uses_lat_lon_order() {
        let urls = QgisServerUrls::new("http://qgis/ows")
            .unwrap()
            .with_thumbnail_size(400, 300);
        let bbox = BoundingBox::new(106.5, -6.5, 107.0, -6.0);
        let q = query(&urls.thumbnail(&backend(), &bbox));
        assert_eq!(q["CRS"], "EPSG:4326");
        assert_eq!(q["BBOX"], "-6.5,106.5,-6,107");
        assert_eq!(q["WIDTH"], "400");
        assert_eq!(q["HEIGHT"], "300");
    }

    #[test]
    fn test_existing_query_is_kept() {
        let urls = QgisServerUrls::new("http://qgis/ows?token=abc").unwrap();
        let q = query(&urls.legend(&backend(), "default"));
        assert_eq!(q["token"], "abc");
        assert_eq!(q["LAYER"], "roads");
    }
}
