//! Seeder options, states, reports and errors.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::backend::DEFAULT_STYLE;
use crate::coord::{BoundingBox, CoordError, TileCoord, MAX_ZOOM};
use crate::executor::{QueueClosed, RetryPolicy, TaskError};
use crate::layer::CatalogError;

/// Default zoom range when none is given.
pub const DEFAULT_MIN_ZOOM: u8 = 10;
pub const DEFAULT_MAX_ZOOM: u8 = 12;

/// Errors that abort a seeding run.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("layer '{0}' not found")]
    LayerNotFound(String),

    #[error(transparent)]
    Coord(#[from] CoordError),

    #[error("layer catalog error: {0}")]
    Catalog(CatalogError),

    #[error(transparent)]
    Task(#[from] TaskError),

    #[error("failed to clear cache at {path}: {source}")]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    QueueClosed(#[from] QueueClosed),
}

impl From<CatalogError> for SeedError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::NotFound(name) => Self::LayerNotFound(name),
            other => Self::Catalog(other),
        }
    }
}

/// What to seed.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedOptions {
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub style: String,
    /// Thumbnail extent in EPSG:4326; the layer extent when `None`.
    pub thumbnail_bbox: Option<BoundingBox>,
    /// Skip the confirmation prompt.
    pub no_input: bool,
    pub retry: RetryPolicy,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            style: DEFAULT_STYLE.to_string(),
            thumbnail_bbox: None,
            no_input: false,
            retry: RetryPolicy::fetch_default(),
        }
    }
}

impl SeedOptions {
    pub fn zoom(mut self, min_zoom: u8, max_zoom: u8) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self
    }

    pub fn validate(&self) -> Result<(), CoordError> {
        for zoom in [self.min_zoom, self.max_zoom] {
            if zoom > MAX_ZOOM {
                return Err(CoordError::InvalidZoom(zoom));
            }
        }
        if self.min_zoom > self.max_zoom {
            return Err(CoordError::InvalidRange {
                min: self.min_zoom,
                max: self.max_zoom,
            });
        }
        Ok(())
    }
}

/// Progress of a seeding run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedState {
    Found,
    Confirmed,
    CacheCleared,
    LegendSeeded,
    ThumbnailSeeded,
    TilesSeeding,
    Done,
    Cancelled,
}

impl fmt::Display for SeedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Found => "layer found",
            Self::Confirmed => "confirmed",
            Self::CacheCleared => "cache cleared",
            Self::LegendSeeded => "legend seeded",
            Self::ThumbnailSeeded => "thumbnail seeded",
            Self::TilesSeeding => "seeding tiles",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Result of the legend or thumbnail step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Cached { bytes: u64 },
    Failed { reason: String },
    Skipped,
}

impl StepOutcome {
    pub fn is_cached(&self) -> bool {
        matches!(self, Self::Cached { .. })
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cached { bytes } => write!(f, "cached ({} bytes)", bytes),
            Self::Failed { reason } => write!(f, "failed: {}", reason),
            Self::Skipped => f.write_str("skipped"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Completed,
    Cancelled,
}

/// Summary of a seeding run.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedReport {
    pub layer: String,
    pub style: String,
    /// Tiles in the grid.
    pub expected: u64,
    /// Tiles cached successfully.
    pub processed: u64,
    /// Tiles that failed after all retries.
    pub failed: u64,
    pub failed_tiles: Vec<TileCoord>,
    pub legend: StepOutcome,
    pub thumbnail: StepOutcome,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcome: SeedOutcome,
}

impl SeedReport {
    pub(crate) fn new(layer: &str, style: &str, expected: u64, started_at: DateTime<Utc>) -> Self {
        Self {
            layer: layer.to_string(),
            style: style.to_string(),
            expected,
            processed: 0,
            failed: 0,
            failed_tiles: Vec::new(),
            legend: StepOutcome::Skipped,
            thumbnail: StepOutcome::Skipped,
            started_at,
            finished_at: started_at,
            outcome: SeedOutcome::Completed,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.outcome == SeedOutcome::Cancelled
    }

    /// Completed with every tile, the legend and the thumbnail cached.
    pub fn is_clean(&self) -> bool {
        self.outcome == SeedOutcome::Completed
            && self.failed == 0
            && self.legend.is_cached()
            && self.thumbnail.is_cached()
    }

    pub fn duration(&self) -> Duration {
        self.finished_at - self.started_at
    }
}

impl fmt::Display for SeedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_cancelled() {
            return write!(f, "Seeding of {} cancelled", self.layer);
        }
        write!(
            f,
            "{}: {}/{} tiles processed, {} failed, legend {}, thumbnail {} in {}s",
            self.layer,
            self.processed,
            self.expected,
            self.failed,
            self.legend,
            self.thumbnail,
            self.duration().num_seconds()
        )
    }
}
