//! Layer catalogs.
//!
//! The seeder resolves layers through the [`LayerCatalog`] trait. Two
//! implementations are provided:
//!
//! - [`InMemoryCatalog`] - a fixed list of layers
//! - [`DirectoryCatalog`] - `*.qlr` files plus an optional `layers.json`

use std::fs;
use std::path::{Path, PathBuf};

use glob::MatchOptions;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::qlr::{is_qlr, QlrFile, StoreType};
use super::{BackendHandle, Layer};
use crate::coord::BoundingBox;

/// Name of the optional JSON layer list inside a catalog directory.
pub const LAYERS_JSON: &str = "layers.json";

/// Errors raised by layer catalogs.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No layer with this name or alternate name.
    #[error("layer '{0}' not found")]
    NotFound(String),

    #[error("catalog directory {0} does not exist")]
    DirectoryMissing(PathBuf),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },
}

/// Resolves layers by name.
pub trait LayerCatalog: Send + Sync {
    /// Looks a layer up by name, then by alternate name.
    fn resolve(&self, name: &str) -> Result<Layer, CatalogError>;

    /// All layers in the catalog.
    fn layers(&self) -> Vec<Layer>;
}

/// Resolves by exact name first so a layer whose alternate equals another
/// layer's name never shadows it.
fn resolve_in(layers: &[Layer], name: &str) -> Result<Layer, CatalogError> {
    layers
        .iter()
        .find(|l| l.name == name)
        .or_else(|| layers.iter().find(|l| l.alternate.as_deref() == Some(name)))
        .cloned()
        .ok_or_else(|| CatalogError::NotFound(name.to_string()))
}

/// Catalog over a fixed set of layers.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    layers: Vec<Layer>,
}

impl InMemoryCatalog {
    pub fn new(layers: Vec<Layer>) -> Self {
        Self { layers }
    }

    pub fn insert(&mut self, layer: Layer) {
        self.layers.retain(|l| l.name != layer.name);
        self.layers.push(layer);
    }
}

impl LayerCatalog for InMemoryCatalog {
    fn resolve(&self, name: &str) -> Result<Layer, CatalogError> {
        resolve_in(&self.layers, name)
    }

    fn layers(&self) -> Vec<Layer> {
        self.layers.clone()
    }
}

/// One entry of `layers.json`.
///
/// ```json
/// [{"name": "roads", "alternate": "geonode:roads", "srs": "EPSG:3857",
///   "bbox": [11880000.0, -700000.0, 11910000.0, -680000.0],
///   "project": "/data/roads.qgs"}]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerRecord {
    pub name: String,
    #[serde(default)]
    pub alternate: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    pub srs: String,
    /// `[xmin, ymin, xmax, ymax]` in `srs`.
    pub bbox: [f64; 4],
    /// Defaults to `name`.
    #[serde(default)]
    pub qgis_layer_name: Option<String>,
    pub project: PathBuf,
    #[serde(default)]
    pub store_type: StoreType,
}

impl From<LayerRecord> for Layer {
    fn from(record: LayerRecord) -> Self {
        Layer {
            backend: BackendHandle {
                qgis_layer_name: record
                    .qgis_layer_name
                    .unwrap_or_else(|| record.name.clone()),
                project: record.project,
            },
            name: record.name,
            alternate: record.alternate,
            title: record.title,
            srs: record.srs,
            bbox: BoundingBox::from_array(record.bbox),
            store_type: record.store_type,
            provider: None,
            datasource: None,
        }
    }
}

/// Catalog loaded from a directory of QLR files and an optional
/// `layers.json`.
///
/// Files that fail to parse are logged and skipped so one broken layer
/// does not hide the rest. A malformed `layers.json` is an error. Layers
/// keep their published spatial reference whether or not it can be
/// reprojected; that is checked when a layer is seeded.
#[derive(Debug, Clone)]
pub struct DirectoryCatalog {
    directory: PathBuf,
    layers: Vec<Layer>,
}

impl DirectoryCatalog {
    /// Scans `directory` and loads every layer it describes.
    pub fn open(directory: impl Into<PathBuf>) -> Result<Self, CatalogError> {
        let directory = directory.into();
        if !directory.is_dir() {
            return Err(CatalogError::DirectoryMissing(directory));
        }

        let mut layers = load_qlr_layers(&directory);

        let json_path = directory.join(LAYERS_JSON);
        if json_path.exists() {
            for layer in load_json_layers(&json_path)? {
                layers.retain(|l| l.name != layer.name);
                layers.push(layer);
            }
        }

        layers.sort_by(|a, b| a.name.cmp(&b.name));
        debug!(
            directory = %directory.display(),
            count = layers.len(),
            "Loaded layer catalog"
        );

        Ok(Self { directory, layers })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl LayerCatalog for DirectoryCatalog {
    fn resolve(&self, name: &str) -> Result<Layer, CatalogError> {
        resolve_in(&self.layers, name)
    }

    fn layers(&self) -> Vec<Layer> {
        self.layers.clone()
    }
}

fn load_qlr_layers(directory: &Path) -> Vec<Layer> {
    let pattern = directory.join("*.qlr");
    let options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };

    let paths = match glob::glob_with(&pattern.to_string_lossy(), options) {
        Ok(paths) => paths,
        Err(e) => {
            warn!(pattern = %pattern.display(), error = %e, "Invalid catalog glob pattern");
            return Vec::new();
        }
    };

    let mut layers = Vec::new();
    for entry in paths {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable catalog entry");
                continue;
            }
        };
        if !path.is_file() || !is_qlr(&path) {
            continue;
        }
        match QlrFile::open(&path) {
            Ok(qlr) => layers.push(Layer::from_qlr(&qlr)),
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping layer definition"),
        }
    }
    layers
}

fn load_json_layers(path: &Path) -> Result<Vec<Layer>, CatalogError> {
    let content = fs::read_to_string(path).map_err(|source| CatalogError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let records: Vec<LayerRecord> =
        serde_json::from_str(&content).map_err(|e| CatalogError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    Ok(records.into_iter().map(Layer::from).collect())
}

#[cfg(test)]
mod tests {
    use super::super::qlr::tests::ROADS_QLR;
    use super::*;
    use crate::coord::{CoordError, SpatialRef};
    use tempfile::TempDir;

    #[test]
    fn test_in_memory_resolves_name_then_alternate() {
        let catalog = InMemoryCatalog::new(vec![
            Layer::builder("roads").alternate("geonode:roads").build(),
            Layer::builder("rivers").alternate("roads_old").build(),
        ]);

        assert_eq!(catalog.resolve("roads").unwrap().name, "roads");
        assert_eq!(catalog.resolve("geonode:roads").unwrap().name, "roads");
        assert_eq!(catalog.resolve("roads_old").unwrap().name, "rivers");
    }

    #[test]
    fn test_in_memory_not_found() {
        let catalog = InMemoryCatalog::default();
        let err = catalog.resolve("missing").unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(name) if name == "missing"));
    }

    #[test]
    fn test_in_memory_insert_replaces() {
        let mut catalog = InMemoryCatalog::default();
        catalog.insert(Layer::builder("roads").title("Old").build());
        catalog.insert(Layer::builder("roads").title("New").build());
        assert_eq!(catalog.layers().len(), 1);
        assert_eq!(catalog.resolve("roads").unwrap().title.as_deref(), Some("New"));
    }

    #[test]
    fn test_directory_missing() {
        let temp = TempDir::new().unwrap();
        let err = DirectoryCatalog::open(temp.path().join("nope")).unwrap_err();
        assert!(matches!(err, CatalogError::DirectoryMissing(_)));
    }

    #[test]
    fn test_directory_loads_qlr_and_json() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("jakarta_roads.qlr"), ROADS_QLR).unwrap();
        fs::write(temp.path().join("broken.qlr"), "<qlr>").unwrap();
        fs::write(temp.path().join("notes.txt"), "ignored").unwrap();
        fs::write(
            temp.path().join(LAYERS_JSON),
            r#"[{"name": "flood", "alternate": "geonode:flood", "srs": "EPSG:3857",
                 "bbox": [11880000.0, -700000.0, 11910000.0, -680000.0],
                 "project": "/data/flood.qgs", "store_type": "raster"}]"#,
        )
        .unwrap();

        let catalog = DirectoryCatalog::open(temp.path()).unwrap();
        let names: Vec<_> = catalog.layers().into_iter().map(|l| l.name).collect();
        assert_eq!(names, vec!["flood", "jakarta_roads"]);

        let flood = catalog.resolve("geonode:flood").unwrap();
        assert_eq!(flood.spatial_ref(), Ok(SpatialRef::WebMercator));
        assert_eq!(flood.backend.qgis_layer_name, "flood");
        assert_eq!(flood.store_type, StoreType::Raster);

        let roads = catalog.resolve("roads").unwrap();
        assert_eq!(roads.name, "jakarta_roads");
    }

    #[test]
    fn test_directory_rejects_bad_json() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(LAYERS_JSON), "{not json").unwrap();
        let err = DirectoryCatalog::open(temp.path()).unwrap_err();
        assert!(matches!(err, CatalogError::Parse { .. }));
    }

    #[test]
    fn test_directory_lists_layers_in_other_reference_systems() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("parcels.qlr"),
            ROADS_QLR.replace("EPSG:4326", "EPSG:2154"),
        )
        .unwrap();
        fs::write(
            temp.path().join(LAYERS_JSON),
            r#"[{"name": "utm", "srs": "EPSG:32748", "bbox": [0, 0, 1, 1], "project": "u.qgs"}]"#,
        )
        .unwrap();

        let catalog = DirectoryCatalog::open(temp.path()).unwrap();

        let parcels = catalog.resolve("parcels").unwrap();
        assert_eq!(parcels.srs, "EPSG:2154");
        assert_eq!(
            parcels.spatial_ref(),
            Err(CoordError::UnsupportedSrs("EPSG:2154".to_string()))
        );
        assert_eq!(catalog.resolve("utm").unwrap().srs, "EPSG:32748");
    }

    #[test]
    fn test_directory_ignores_qlr_named_directories() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("archive.qlr")).unwrap();
        fs::write(temp.path().join("ROADS.QLR"), ROADS_QLR).unwrap();

        let catalog = DirectoryCatalog::open(temp.path()).unwrap();
        let names: Vec<_> = catalog.layers().into_iter().map(|l| l.name).collect();
        assert_eq!(names, vec!["ROADS"]);
    }
}
