//! Hooks for progress reporting and operator confirmation.

use tracing::{info, warn};

use super::types::{SeedReport, SeedState};
use crate::coord::TileCoord;
use crate::layer::Layer;

/// Receives progress from a seeding run. All methods default to no-ops.
pub trait SeedObserver {
    fn on_state(&self, _layer: &Layer, _state: SeedState) {}

    /// Called once the tile grid is known, before confirmation.
    fn on_tile_count(&self, _layer: &Layer, _count: u64) {}

    fn on_tile_done(&self, _tile: &TileCoord, _ok: bool) {}

    fn on_finished(&self, _report: &SeedReport) {}
}

/// Observer that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl SeedObserver for LogObserver {
    fn on_state(&self, layer: &Layer, state: SeedState) {
        info!(layer = %layer.name, state = %state, "Seeding state");
    }

    fn on_tile_count(&self, layer: &Layer, count: u64) {
        info!(layer = %layer.name, tiles = count, "Tile grid computed");
    }

    fn on_tile_done(&self, tile: &TileCoord, ok: bool) {
        if !ok {
            warn!(tile = %tile, "Tile failed");
        }
    }

    fn on_finished(&self, report: &SeedReport) {
        info!(
            layer = %report.layer,
            expected = report.expected,
            processed = report.processed,
            failed = report.failed,
            "{}",
            report
        );
    }
}

/// Asks the operator whether to go ahead with a run.
pub trait Confirmation {
    /// Returns `false` only if the operator explicitly declined.
    fn confirm(&self, layer: &Layer, tile_count: u64) -> bool;
}

impl<F> Confirmation for F
where
    F: Fn(&Layer, u64) -> bool,
{
    fn confirm(&self, layer: &Layer, tile_count: u64) -> bool {
        self(layer, tile_count)
    }
}

/// Interprets an answer to "Proceed (Y/n)?". Anything but a no proceeds.
pub fn is_affirmative(answer: &str) -> bool {
    !matches!(answer.trim().to_lowercase().as_str(), "n" | "no")
}
