//! Layers and the catalog that resolves them by name.
//!
//! A [`Layer`] is owned by whatever publishes it; the seeder only reads
//! its extent, spatial reference and [`BackendHandle`].

mod catalog;
mod qlr;

pub use catalog::{CatalogError, DirectoryCatalog, InMemoryCatalog, LayerCatalog, LayerRecord};
pub use qlr::{is_qlr, QlrError, QlrFile, StoreType};

use std::path::PathBuf;

use crate::coord::{BoundingBox, CoordError, SpatialRef};

/// Where the rendering backend finds a layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendHandle {
    /// Layer name inside the QGIS project.
    pub qgis_layer_name: String,
    /// QGIS project file the server renders from (`MAP` parameter).
    pub project: PathBuf,
}

/// A published geospatial layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub name: String,
    pub alternate: Option<String>,
    pub title: Option<String>,
    /// Authority id of the native spatial reference, as published.
    pub srs: String,
    /// Extent in `srs`.
    pub bbox: BoundingBox,
    pub store_type: StoreType,
    pub provider: Option<String>,
    pub datasource: Option<String>,
    pub backend: BackendHandle,
}

impl Layer {
    pub fn builder(name: impl Into<String>) -> LayerBuilder {
        LayerBuilder::new(name)
    }

    /// Builds a layer from a parsed QLR file.
    ///
    /// The file stem becomes the layer name, the QLR `layername` the
    /// alternate name and backend layer, and the sibling `.qgs` file the
    /// backend project. The spatial reference is kept as published, even
    /// when it cannot be reprojected.
    pub fn from_qlr(qlr: &QlrFile) -> Self {
        let name = qlr
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| qlr.layername.clone());

        Self {
            name,
            alternate: Some(qlr.layername.clone()),
            title: None,
            srs: qlr.authid.clone(),
            bbox: qlr.extent,
            store_type: qlr.store_type,
            provider: qlr.provider.clone(),
            datasource: qlr.datasource.clone(),
            backend: BackendHandle {
                qgis_layer_name: qlr.layername.clone(),
                project: qlr.path.with_extension("qgs"),
            },
        }
    }

    /// Resolves the native spatial reference.
    ///
    /// # Errors
    ///
    /// [`CoordError::UnsupportedSrs`] when the layer is published in a
    /// reference system other than EPSG:4326 or EPSG:3857.
    pub fn spatial_ref(&self) -> Result<SpatialRef, CoordError> {
        self.srs.parse()
    }

    /// True if `name` is this layer's name or alternate name.
    pub fn matches(&self, name: &str) -> bool {
        self.name == name || self.alternate.as_deref() == Some(name)
    }
}

/// Builder for [`Layer`], mostly used by embedders and tests.
#[derive(Debug, Clone)]
pub struct LayerBuilder {
    layer: Layer,
}

impl LayerBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            layer: Layer {
                alternate: None,
                title: None,
                srs: SpatialRef::Wgs84.into(),
                bbox: BoundingBox::new(0.0, 0.0, 0.0, 0.0),
                store_type: StoreType::Unknown,
                provider: None,
                datasource: None,
                backend: BackendHandle {
                    qgis_layer_name: name.clone(),
                    project: PathBuf::from(format!("{}.qgs", name)),
                },
                name,
            },
        }
    }

    pub fn alternate(mut self, alternate: impl Into<String>) -> Self {
        self.layer.alternate = Some(alternate.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.layer.title = Some(title.into());
        self
    }

    /// Sets the native spatial reference from a [`SpatialRef`] or an authid.
    pub fn srs(mut self, srs: impl Into<String>) -> Self {
        self.layer.srs = srs.into();
        self
    }

    pub fn bbox(mut self, bbox: BoundingBox) -> Self {
        self.layer.bbox = bbox;
        self
    }

    pub fn store_type(mut self, store_type: StoreType) -> Self {
        self.layer.store_type = store_type;
        self
    }

    pub fn qgis_layer_name(mut self, qgis_layer_name: impl Into<String>) -> Self {
        self.layer.backend.qgis_layer_name = qgis_layer_name.into();
        self
    }

    pub fn project(mut self, project: impl Into<PathBuf>) -> Self {
        self.layer.backend.project = project.into();
        self
    }

    pub fn build(self) -> Layer {
        self.layer
    }
}
