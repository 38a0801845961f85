//! Seeding orchestrator.
//!
//! [`TileSeeder::seed`] drives one layer through
//!
//! ```text
//! Found -> Confirmed -> CacheCleared -> LegendSeeded -> ThumbnailSeeded
//!       -> TilesSeeding -> Done
//! ```
//!
//! or stops at `Cancelled` when the operator declines. Tasks are submitted
//! one at a time and awaited before the next is submitted.
//!
//! Failure policy:
//!
//! - legend and thumbnail failures are recorded in the report
//! - tile HTTP and invalid-image failures are counted and skipped
//! - a missing layer, an unreachable backend or a cache I/O error aborts

mod observer;
mod types;

pub use observer::{is_affirmative, Confirmation, LogObserver, SeedObserver};
pub use types::{
    SeedError, SeedOptions, SeedOutcome, SeedReport, SeedState, StepOutcome, DEFAULT_MAX_ZOOM,
    DEFAULT_MIN_ZOOM,
};

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::backend::{HttpClient, QgisServerUrls, ReqwestClient};
use crate::cache::{clear_layer, CacheLayout};
use crate::coord::{transform_bbox, SpatialRef};
use crate::config::ConfigFile;
use crate::executor::{Task, TaskQueue};
use crate::layer::{DirectoryCatalog, Layer, LayerCatalog};
use crate::tasks::{CacheRequestTask, ThumbnailTask};
use crate::tile::TileGrid;

/// Seeds the tile, legend and thumbnail cache of one layer at a time.
pub struct TileSeeder {
    catalog: Arc<dyn LayerCatalog>,
    client: Arc<dyn HttpClient>,
    urls: QgisServerUrls,
    layout: CacheLayout,
    queue: Arc<TaskQueue>,
}

impl TileSeeder {
    pub fn new(
        catalog: Arc<dyn LayerCatalog>,
        client: Arc<dyn HttpClient>,
        urls: QgisServerUrls,
        layout: CacheLayout,
        queue: Arc<TaskQueue>,
    ) -> Self {
        Self {
            catalog,
            client,
            urls,
            layout,
            queue,
        }
    }

    /// Wires a seeder from a loaded config: the catalog directory, QGIS
    /// Server over HTTP and a fresh task queue.
    ///
    /// # Errors
    ///
    /// * [`Error::Catalog`](crate::Error::Catalog) if the catalog directory is missing
    /// * [`Error::Endpoint`](crate::Error::Endpoint) if the server URL is unusable
    /// * [`Error::Fetch`](crate::Error::Fetch) if the HTTP client cannot be built
    /// * [`Error::Io`](crate::Error::Io) if the queue runtime cannot start
    pub fn from_config(config: &ConfigFile) -> crate::Result<Self> {
        let catalog = DirectoryCatalog::open(&config.catalog.directory)?;
        let urls = config.server_urls()?;
        let client = ReqwestClient::with_timeout(config.request_timeout())?;
        let queue = TaskQueue::new(config.queue_config())?;

        info!(
            endpoint = %urls.endpoint(),
            workers = config.queue.workers,
            catalog = %catalog.directory().display(),
            "Seeder ready"
        );

        Ok(Self::new(
            Arc::new(catalog),
            Arc::new(client),
            urls,
            config.cache_layout(),
            Arc::new(queue),
        ))
    }

    pub fn layout(&self) -> &CacheLayout {
        &self.layout
    }

    pub fn catalog(&self) -> &dyn LayerCatalog {
        self.catalog.as_ref()
    }

    /// Seeds `layer_name` with `options`.
    ///
    /// # Arguments
    ///
    /// * `layer_name` - Layer name or alternate name, resolved through the catalog
    /// * `options` - Zoom range, style, thumbnail extent and retry policy
    /// * `observer` - Receives state changes, the tile count and per-tile progress
    /// * `confirmation` - Asked once the tile count is known, unless
    ///   `options.no_input` is set
    ///
    /// # Returns
    ///
    /// A [`SeedReport`] for completed and cancelled runs alike. Legend,
    /// thumbnail and skippable tile failures are recorded in it.
    ///
    /// # Errors
    ///
    /// * [`SeedError::Coord`] for an invalid zoom range or a layer whose
    ///   spatial reference cannot be reprojected
    /// * [`SeedError::LayerNotFound`] if the catalog has no such layer
    /// * [`SeedError::Cleanup`] if the old cache cannot be removed
    /// * [`SeedError::Task`] when the backend is unreachable or a cache
    ///   write fails
    pub fn seed(
        &self,
        layer_name: &str,
        options: &SeedOptions,
        observer: &dyn SeedObserver,
        confirmation: &dyn Confirmation,
    ) -> Result<SeedReport, SeedError> {
        let started_at = Utc::now();
        options.validate()?;

        let layer = self.catalog.resolve(layer_name)?;
        observer.on_state(&layer, SeedState::Found);

        let grid = TileGrid::for_layer(&layer, options.min_zoom, options.max_zoom)?;
        observer.on_tile_count(&layer, grid.count());
        let mut report = SeedReport::new(&layer.name, &options.style, grid.count(), started_at);

        if !options.no_input && !confirmation.confirm(&layer, grid.count()) {
            info!(layer = %layer.name, "Seeding cancelled by operator");
            report.outcome = SeedOutcome::Cancelled;
            report.finished_at = Utc::now();
            observer.on_state(&layer, SeedState::Cancelled);
            observer.on_finished(&report);
            return Ok(report);
        }
        observer.on_state(&layer, SeedState::Confirmed);

        clear_layer(&self.layout, &layer).map_err(|source| SeedError::Cleanup {
            path: self.layout.layer_dir(&layer),
            source,
        })?;
        observer.on_state(&layer, SeedState::CacheCleared);

        report.legend = self.seed_legend(&layer, options)?;
        observer.on_state(&layer, SeedState::LegendSeeded);

        report.thumbnail = self.seed_thumbnail(&layer, options)?;
        observer.on_state(&layer, SeedState::ThumbnailSeeded);

        observer.on_state(&layer, SeedState::TilesSeeding);
        for tile in &grid {
            let task = CacheRequestTask::new(
                format!("tile {} {}", layer.name, tile),
                Arc::clone(&self.client),
                self.urls.tile(&layer.backend, &options.style, &tile),
                self.layout.tile_path(&layer, &options.style, &tile),
            )
            .with_retry(options.retry.clone());

            match self.queue.submit(task)?.wait() {
                Ok(_) => {
                    report.processed += 1;
                    observer.on_tile_done(&tile, true);
                }
                Err(err) if err.fetch_error().is_some_and(|e| e.is_skippable()) => {
                    warn!(layer = %layer.name, tile = %tile, error = %err, "Tile not cached");
                    report.failed += 1;
                    report.failed_tiles.push(tile);
                    observer.on_tile_done(&tile, false);
                }
                Err(err) => return Err(err.into()),
            }
        }

        report.finished_at = Utc::now();
        observer.on_state(&layer, SeedState::Done);
        observer.on_finished(&report);
        Ok(report)
    }

    fn seed_legend(&self, layer: &Layer, options: &SeedOptions) -> Result<StepOutcome, SeedError> {
        let task = CacheRequestTask::new(
            format!("legend {}", layer.name),
            Arc::clone(&self.client),
            self.urls.legend(&layer.backend, &options.style),
            self.layout.legend_path(layer, &options.style),
        )
        .with_retry(options.retry.clone());
        self.run_step(task)
    }

    fn seed_thumbnail(
        &self,
        layer: &Layer,
        options: &SeedOptions,
    ) -> Result<StepOutcome, SeedError> {
        let bbox = match options.thumbnail_bbox {
            Some(bbox) => bbox,
            None => transform_bbox(&layer.bbox, layer.spatial_ref()?, SpatialRef::Wgs84),
        };
        debug!(layer = %layer.name, bbox = %bbox, "Thumbnail extent");

        let task = ThumbnailTask::new(
            format!("thumbnail {}", layer.name),
            Arc::clone(&self.client),
            self.urls.thumbnail(&layer.backend, &bbox),
            self.layout.thumbnail_path(layer),
        )
        .with_retry(options.retry.clone());
        self.run_step(task)
    }

    /// Runs a non-fatal step: skippable fetch failures become
    /// [`StepOutcome::Failed`].
    fn run_step<T: Task>(&self, task: T) -> Result<StepOutcome, SeedError> {
        match self.queue.submit(task)?.wait() {
            Ok(bytes) => Ok(StepOutcome::Cached { bytes }),
            Err(err) if err.fetch_error().is_some_and(|e| e.is_skippable()) => {
                warn!(task = %err.task(), error = %err, "Step failed, continuing");
                Ok(StepOutcome::Failed {
                    reason: err.to_string(),
                })
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockHttpClient;
    use crate::coord::{BoundingBox, CoordError};
    use crate::executor::{QueueConfig, RetryPolicy};
    use crate::layer::InMemoryCatalog;
    use std::cell::RefCell;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Recorder {
        states: RefCell<Vec<SeedState>>,
        counts: RefCell<Vec<u64>>,
    }

    impl SeedObserver for Recorder {
        fn on_state(&self, _layer: &Layer, state: SeedState) {
            self.states.borrow_mut().push(state);
        }

        fn on_tile_count(&self, _layer: &Layer, count: u64) {
            self.counts.borrow_mut().push(count);
        }
    }

    fn yes(_: &Layer, _: u64) -> bool {
        true
    }

    fn no(_: &Layer, _: u64) -> bool {
        false
    }

    fn roads() -> Layer {
        // Inside tile 10/815/529 (central Jakarta).
        Layer::builder("roads")
            .bbox(BoundingBox::new(106.82, -6.20, 106.83, -6.19))
            .build()
    }

    fn seeder(client: MockHttpClient, temp: &TempDir) -> (TileSeeder, Arc<TaskQueue>) {
        let queue = Arc::new(
            TaskQueue::new(QueueConfig {
                workers: 2,
                capacity: 4,
            })
            .unwrap(),
        );
        let seeder = TileSeeder::new(
            Arc::new(InMemoryCatalog::new(vec![roads()])),
            Arc::new(client),
            QgisServerUrls::new("http://qgis/ows").unwrap(),
            CacheLayout::new(temp.path().join("tiles"), temp.path().join("thumbs")),
            Arc::clone(&queue),
        );
        (seeder, queue)
    }

    fn options() -> SeedOptions {
        SeedOptions {
            retry: RetryPolicy::None,
            ..SeedOptions::default().zoom(10, 10)
        }
    }

    fn png() -> Vec<u8> {
        let img = image::RgbaImage::new(4, 3);
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn healthy() -> MockHttpClient {
        MockHttpClient::default()
            .route("GetLegendGraphic", 200, b"legend")
            .route("CRS=EPSG%3A4326", 200, &png())
            .route("GetMap", 200, b"tile")
    }

    #[test]
    fn test_full_run_walks_every_state() {
        let temp = TempDir::new().unwrap();
        let (seeder, queue) = seeder(healthy(), &temp);
        let recorder = Recorder::default();

        let report = seeder.seed("roads", &options(), &recorder, &yes).unwrap();

        assert_eq!(
            *recorder.states.borrow(),
            vec![
                SeedState::Found,
                SeedState::Confirmed,
                SeedState::CacheCleared,
                SeedState::LegendSeeded,
                SeedState::ThumbnailSeeded,
                SeedState::TilesSeeding,
                SeedState::Done,
            ]
        );
        assert_eq!(*recorder.counts.borrow(), vec![1]);
        assert_eq!(report.expected, 1);
        assert_eq!(report.processed, 1);
        assert!(report.is_clean(), "{report}");
        assert_eq!(queue.submitted(), 3);

        let layer = roads();
        let tile = seeder
            .layout()
            .tile_path(&layer, "default", &crate::coord::TileCoord::new(10, 815, 529));
        assert!(tile.exists(), "missing {}", tile.display());
    }

    #[test]
    fn test_declined_submits_nothing() {
        let temp = TempDir::new().unwrap();
        let (seeder, queue) = seeder(healthy(), &temp);
        let stale = temp.path().join("tiles/roads/default/10/0/0.png");
        std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
        std::fs::write(&stale, b"old").unwrap();

        let report = seeder.seed("roads", &options(), &LogObserver, &no).unwrap();

        assert!(report.is_cancelled());
        assert_eq!(queue.submitted(), 0);
        assert!(stale.exists());
    }

    #[test]
    fn test_no_input_skips_confirmation() {
        let temp = TempDir::new().unwrap();
        let (seeder, _queue) = seeder(healthy(), &temp);
        let options = SeedOptions {
            no_input: true,
            ..options()
        };
        let report = seeder.seed("roads", &options, &LogObserver, &no).unwrap();
        assert_eq!(report.outcome, SeedOutcome::Completed);
    }

    #[test]
    fn test_unknown_layer_submits_nothing() {
        let temp = TempDir::new().unwrap();
        let (seeder, queue) = seeder(healthy(), &temp);
        let err = seeder.seed("rivers", &options(), &LogObserver, &yes).unwrap_err();
        assert!(matches!(err, SeedError::LayerNotFound(name) if name == "rivers"));
        assert_eq!(queue.submitted(), 0);
    }

    #[test]
    fn test_legend_and_thumbnail_failures_are_not_fatal() {
        let temp = TempDir::new().unwrap();
        let client = MockHttpClient::default()
            .route("GetLegendGraphic", 500, b"no legend")
            .route("CRS=EPSG%3A4326", 200, b"<ServiceExceptionReport/>")
            .route("GetMap", 200, b"tile");
        let (seeder, _queue) = seeder(client, &temp);

        let report = seeder.seed("roads", &options(), &LogObserver, &yes).unwrap();
        assert!(matches!(report.legend, StepOutcome::Failed { .. }));
        assert!(matches!(report.thumbnail, StepOutcome::Failed { .. }));
        assert_eq!(report.processed, 1);
    }

    #[test]
    fn test_connection_failure_aborts() {
        let temp = TempDir::new().unwrap();
        let (seeder, queue) = seeder(MockHttpClient::refusing(), &temp);
        let err = seeder.seed("roads", &options(), &LogObserver, &yes).unwrap_err();
        assert!(matches!(err, SeedError::Task(_)));
        assert_eq!(queue.submitted(), 1);
    }

    #[test]
    fn test_invalid_zoom_rejected_before_lookup() {
        let temp = TempDir::new().unwrap();
        let (seeder, queue) = seeder(healthy(), &temp);
        let options = SeedOptions::default().zoom(12, 10);
        let err = seeder.seed("missing", &options, &LogObserver, &yes).unwrap_err();
        assert!(matches!(err, SeedError::Coord(_)));
        assert_eq!(queue.submitted(), 0);
    }

    #[test]
    fn test_from_config_opens_catalog() {
        let temp = TempDir::new().unwrap();
        let mut config = ConfigFile::default();
        config.catalog.directory = temp.path().join("layers");
        config.cache.tiles_directory = temp.path().join("tiles");
        config.queue.workers = 1;

        let err = TileSeeder::from_config(&config).err().unwrap();
        assert!(matches!(
            err,
            crate::Error::Catalog(crate::layer::CatalogError::DirectoryMissing(_))
        ));

        std::fs::create_dir(&config.catalog.directory).unwrap();
        let seeder = TileSeeder::from_config(&config).unwrap();
        assert!(seeder.catalog().layers().is_empty());
        assert_eq!(seeder.layout(), &config.cache_layout());
    }

    #[test]
    fn test_from_config_rejects_bad_endpoint() {
        let temp = TempDir::new().unwrap();
        let mut config = ConfigFile::default();
        config.catalog.directory = temp.path().to_path_buf();
        config.qgis_server.url = "not a url".to_string();

        let err = TileSeeder::from_config(&config).err().unwrap();
        assert!(matches!(err, crate::Error::Endpoint(_)), "{err}");
    }

    #[test]
    fn test_unsupported_layer_srs_reported_at_seed_time() {
        let temp = TempDir::new().unwrap();
        let queue = Arc::new(TaskQueue::new(QueueConfig::default()).unwrap());
        let parcels = Layer::builder("parcels")
            .srs("EPSG:2154")
            .bbox(BoundingBox::new(650_000.0, 6_860_000.0, 651_000.0, 6_861_000.0))
            .build();
        let seeder = TileSeeder::new(
            Arc::new(InMemoryCatalog::new(vec![parcels])),
            Arc::new(healthy()),
            QgisServerUrls::new("http://qgis/ows").unwrap(),
            CacheLayout::new(temp.path().join("tiles"), temp.path().join("thumbs")),
            Arc::clone(&queue),
        );
        let recorder = Recorder::default();

        let err = seeder.seed("parcels", &options(), &recorder, &yes).unwrap_err();

        assert!(matches!(
            err,
            SeedError::Coord(CoordError::UnsupportedSrs(ref srs)) if srs == "EPSG:2154"
        ));
        assert_eq!(*recorder.states.borrow(), vec![SeedState::Found]);
        assert_eq!(queue.submitted(), 0);
    }
}
