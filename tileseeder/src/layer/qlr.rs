//! QGIS layer definition (`.qlr`) parsing.
//!
//! A QLR file is the XML export of a single QGIS map layer. Only the
//! fields the seeder needs are read: layer name, spatial reference,
//! extent, layer type, provider and datasource.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};
use thiserror::Error;

use crate::coord::BoundingBox;

/// Errors raised while reading a QLR file.
#[derive(Debug, Error)]
pub enum QlrError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid XML in {path}: {reason}")]
    Xml { path: PathBuf, reason: String },

    #[error("{path} has no <{element}> element")]
    MissingElement {
        path: PathBuf,
        element: &'static str,
    },

    #[error("{path}: <{element}> is not a number: '{value}'")]
    InvalidNumber {
        path: PathBuf,
        element: &'static str,
        value: String,
    },
}

/// Layer kind as declared by `<maplayer type="...">`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreType {
    Vector,
    Raster,
    #[default]
    Unknown,
}

impl StoreType {
    fn from_layer_type(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "vector" => Self::Vector,
            "raster" => Self::Raster,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for StoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vector => "vector",
            Self::Raster => "raster",
            Self::Unknown => "unknown",
        })
    }
}

/// Parsed contents of a QLR file.
#[derive(Debug, Clone, PartialEq)]
pub struct QlrFile {
    pub path: PathBuf,
    pub layername: String,
    /// Authority id of the layer CRS, e.g. `EPSG:4326`.
    pub authid: String,
    pub srid: Option<u32>,
    pub proj4: Option<String>,
    pub provider: Option<String>,
    pub store_type: StoreType,
    pub datasource: Option<String>,
    /// Extent in the layer CRS.
    pub extent: BoundingBox,
}

impl QlrFile {
    /// Reads and parses a QLR file from disk.
    pub fn open(path: &Path) -> Result<Self, QlrError> {
        let content = fs::read_to_string(path).map_err(|source| QlrError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &content)
    }

    /// Parses QLR XML; `path` is only used for error messages and the result.
    pub fn parse(path: &Path, content: &str) -> Result<Self, QlrError> {
        let doc = Document::parse(content).map_err(|e| QlrError::Xml {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let root = doc.root_element();

        let required = |element: &'static str| {
            find_text(root, element).ok_or_else(|| QlrError::MissingElement {
                path: path.to_path_buf(),
                element,
            })
        };

        let layername = required("layername")?;

        let srs = find_element(root, "spatialrefsys").ok_or_else(|| QlrError::MissingElement {
            path: path.to_path_buf(),
            element: "spatialrefsys",
        })?;
        let authid = find_text(srs, "authid").ok_or_else(|| QlrError::MissingElement {
            path: path.to_path_buf(),
            element: "authid",
        })?;
        let srid = find_text(srs, "srid").and_then(|v| v.parse().ok());
        let proj4 = find_text(srs, "proj4");

        let extent_node = find_element(root, "extent").ok_or_else(|| QlrError::MissingElement {
            path: path.to_path_buf(),
            element: "extent",
        })?;
        let number = |element: &'static str| -> Result<f64, QlrError> {
            let value =
                find_text(extent_node, element).ok_or_else(|| QlrError::MissingElement {
                    path: path.to_path_buf(),
                    element,
                })?;
            value.parse().map_err(|_| QlrError::InvalidNumber {
                path: path.to_path_buf(),
                element,
                value,
            })
        };
        let extent = BoundingBox::new(
            number("xmin")?,
            number("ymin")?,
            number("xmax")?,
            number("ymax")?,
        );

        let store_type = find_element(root, "maplayer")
            .and_then(|n| n.attribute("type"))
            .map(StoreType::from_layer_type)
            .unwrap_or_default();

        Ok(Self {
            path: path.to_path_buf(),
            layername,
            authid,
            srid,
            proj4,
            provider: find_text(root, "provider"),
            store_type,
            datasource: find_text(root, "datasource"),
            extent,
        })
    }
}

/// Returns true if the file has a `.qlr` extension (any case).
pub fn is_qlr(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("qlr"))
        .unwrap_or(false)
}

fn find_element<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.descendants()
        .find(|n| n.is_element() && n.tag_name().name() == tag)
}

fn find_text(node: Node<'_, '_>, tag: &str) -> Option<String> {
    find_element(node, tag)
        .and_then(|n| n.text())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const ROADS_QLR: &str = r#"<!DOCTYPE qgis-layer-definition>
<qlr>
  <layer-tree-group expanded="1" checked="Qt::Checked" name="">
    <layer-tree-layer expanded="1" providerKey="ogr" checked="Qt::Checked" name="roads"/>
  </layer-tree-group>
  <maplayers>
    <maplayer type="vector" geometry="Line" minScale="1e+08" maxScale="0">
      <extent>
        <xmin>106.68</xmin>
        <ymin>-6.37</ymin>
        <xmax>106.97</xmax>
        <ymax>-6.08</ymax>
      </extent>
      <id>roads20180312</id>
      <datasource>./roads.shp</datasource>
      <layername>roads</layername>
      <srs>
        <spatialrefsys>
          <proj4>+proj=longlat +datum=WGS84 +no_defs</proj4>
          <srsid>3452</srsid>
          <srid>4326</srid>
          <authid>EPSG:4326</authid>
          <description>WGS 84</description>
        </spatialrefsys>
      </srs>
      <provider encoding="UTF-8">ogr</provider>
    </maplayer>
  </maplayers>
</qlr>
"#;

    #[test]
    fn test_parse_roads() {
        let qlr = QlrFile::parse(Path::new("roads.qlr"), ROADS_QLR).unwrap();
        assert_eq!(qlr.layername, "roads");
        assert_eq!(qlr.authid, "EPSG:4326");
        assert_eq!(qlr.srid, Some(4326));
        assert_eq!(
            qlr.proj4.as_deref(),
            Some("+proj=longlat +datum=WGS84 +no_defs")
        );
        assert_eq!(qlr.provider.as_deref(), Some("ogr"));
        assert_eq!(qlr.datasource.as_deref(), Some("./roads.shp"));
        assert_eq!(qlr.store_type, StoreType::Vector);
        assert_eq!(qlr.extent, BoundingBox::new(106.68, -6.37, 106.97, -6.08));
    }

    #[test]
    fn test_missing_extent() {
        let content = ROADS_QLR.replace("<extent>", "<bounds>").replace("</extent>", "</bounds>");
        let err = QlrFile::parse(Path::new("roads.qlr"), &content).unwrap_err();
        assert!(matches!(
            err,
            QlrError::MissingElement {
                element: "extent",
                ..
            }
        ));
    }

    #[test]
    fn test_bad_extent_number() {
        let content = ROADS_QLR.replace("<xmin>106.68</xmin>", "<xmin>west</xmin>");
        let err = QlrFile::parse(Path::new("roads.qlr"), &content).unwrap_err();
        assert!(err.to_string().contains("west"));
    }

    #[test]
    fn test_invalid_xml() {
        let err = QlrFile::parse(Path::new("broken.qlr"), "<qlr><maplayer>").unwrap_err();
        assert!(matches!(err, QlrError::Xml { .. }));
    }

    #[test]
    fn test_raster_type() {
        let content = ROADS_QLR.replace("type=\"vector\"", "type=\"raster\"");
        let qlr = QlrFile::parse(Path::new("dem.qlr"), &content).unwrap();
        assert_eq!(qlr.store_type, StoreType::Raster);
    }

    #[test]
    fn test_is_qlr() {
        assert!(is_qlr(Path::new("/data/roads.qlr")));
        assert!(is_qlr(Path::new("ROADS.QLR")));
        assert!(!is_qlr(Path::new("roads.qgs")));
        assert!(!is_qlr(Path::new("roads")));
    }
}
