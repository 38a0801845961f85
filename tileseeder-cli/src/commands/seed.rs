//! Seed command - warm a layer's cache.

use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tileseeder::coord::{BoundingBox, TileCoord, MAX_ZOOM};
use tileseeder::layer::Layer;
use tileseeder::seeder::{
    is_affirmative, Confirmation, SeedObserver, SeedOptions, SeedReport, SeedState,
};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for `tileseeder seed`.
#[derive(Debug, Args)]
pub struct SeedArgs {
    /// Layer name or alternate name
    pub layer: String,

    /// Inclusive zoom range [default: from config, 10 12]
    #[arg(
        short = 'z',
        long = "zoom",
        visible_alias = "zoom-level",
        num_args = 2,
        value_names = ["MIN", "MAX"],
        value_parser = clap::value_parser!(u8).range(0..=MAX_ZOOM as i64)
    )]
    pub zoom: Option<Vec<u8>>,

    /// Thumbnail extent in EPSG:4326 [default: layer extent]
    #[arg(
        short = 't',
        long = "thumbnail-bbox",
        visible_alias = "thumbnail-extent",
        num_args = 4,
        value_names = ["X0", "Y0", "X1", "Y1"],
        allow_negative_numbers = true
    )]
    pub thumbnail_bbox: Option<Vec<f64>>,

    /// Do not ask for confirmation
    #[arg(long)]
    pub noinput: bool,

    /// Style to seed [default: from config]
    #[arg(long)]
    pub style: Option<String>,
}

impl SeedArgs {
    /// Overlay command-line arguments on the configured defaults.
    fn options(&self, defaults: SeedOptions) -> SeedOptions {
        let mut options = defaults;
        if let Some([min, max]) = self.zoom.as_deref() {
            options.min_zoom = *min;
            options.max_zoom = *max;
        }
        if let Some([x0, y0, x1, y1]) = self.thumbnail_bbox.as_deref() {
            options.thumbnail_bbox = Some(BoundingBox::new(*x0, *y0, *x1, *y1));
        }
        if let Some(style) = &self.style {
            options.style = style.clone();
        }
        options.no_input = self.noinput;
        options
    }
}

/// Run the seed command.
pub fn run(runner: &CliRunner, args: SeedArgs) -> Result<(), CliError> {
    runner.log_startup("seed");

    let options = args.options(runner.config().seed_options());
    let seeder = runner.seeder()?;
    let progress = ProgressObserver::new();

    let report = seeder.seed(&args.layer, &options, &progress, &ConsoleConfirmation)?;

    print_report(&report);
    Ok(())
}

fn print_report(report: &SeedReport) {
    if report.is_cancelled() {
        println!("{}", style("Cancelled.").yellow());
        return;
    }

    let summary = format!(
        "{}/{} tiles cached for {} ({}) in {}s",
        report.processed,
        report.expected,
        report.layer,
        report.style,
        report.duration().num_seconds()
    );
    if report.is_clean() {
        println!("{} {}", style("✓").green(), summary);
    } else {
        println!("{} {}", style("!").yellow(), summary);
    }
    println!("  Legend:    {}", report.legend);
    println!("  Thumbnail: {}", report.thumbnail);

    if report.failed > 0 {
        println!("  Failed:    {} tile(s)", report.failed);
        for tile in report.failed_tiles.iter().take(10) {
            println!("    {}", tile);
        }
        if report.failed_tiles.len() > 10 {
            println!("    ... and {} more (see log)", report.failed_tiles.len() - 10);
        }
    }
}

/// Progress bar over the tile phase, with step messages before it.
struct ProgressObserver {
    bar: ProgressBar,
    failed: AtomicU64,
}

impl ProgressObserver {
    fn new() -> Self {
        let bar = ProgressBar::hidden();
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} tiles ({eta}) {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
        );
        Self {
            bar,
            failed: AtomicU64::new(0),
        }
    }
}

impl SeedObserver for ProgressObserver {
    fn on_state(&self, layer: &Layer, state: SeedState) {
        match state {
            SeedState::Found => println!("Layer {} found", style(&layer.name).bold()),
            SeedState::CacheCleared => println!("Cleared existing cache"),
            SeedState::LegendSeeded => println!("Legend done"),
            SeedState::ThumbnailSeeded => println!("Thumbnail done"),
            SeedState::TilesSeeding => {
                self.bar.set_draw_target(indicatif::ProgressDrawTarget::stderr());
                self.bar.enable_steady_tick(Duration::from_millis(120));
            }
            _ => {}
        }
    }

    fn on_tile_count(&self, _layer: &Layer, count: u64) {
        self.bar.set_length(count);
    }

    fn on_tile_done(&self, _tile: &TileCoord, ok: bool) {
        if !ok {
            let failed = self.failed.fetch_add(1, Ordering::Relaxed) + 1;
            self.bar.set_message(format!("{} failed", failed));
        }
        self.bar.inc(1);
    }

    fn on_finished(&self, _report: &SeedReport) {
        self.bar.finish_and_clear();
    }
}

/// Asks on stdin; an empty answer proceeds.
struct ConsoleConfirmation;

impl Confirmation for ConsoleConfirmation {
    fn confirm(&self, layer: &Layer, tile_count: u64) -> bool {
        println!(
            "This will clear the cache of {} and seed {} tile(s).",
            style(&layer.name).bold(),
            tile_count
        );
        print!("Proceed (Y/n)? ");
        io::stdout().flush().ok();

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => is_affirmative(&answer),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: SeedArgs,
    }

    fn parse(argv: &[&str]) -> Result<SeedArgs, clap::Error> {
        Harness::try_parse_from(std::iter::once("seed").chain(argv.iter().copied()))
            .map(|h| h.args)
    }

    #[test]
    fn test_defaults_come_from_config() {
        let args = parse(&["roads"]).unwrap();
        let options = args.options(SeedOptions::default());
        assert_eq!(options, SeedOptions::default());
    }

    #[test]
    fn test_overrides() {
        let args = parse(&[
            "roads", "-z", "3", "5", "-t", "-10.5", "-5", "10", "5", "--noinput", "--style",
            "flood",
        ])
        .unwrap();
        let options = args.options(SeedOptions::default());

        assert_eq!((options.min_zoom, options.max_zoom), (3, 5));
        assert_eq!(
            options.thumbnail_bbox,
            Some(BoundingBox::new(-10.5, -5.0, 10.0, 5.0))
        );
        assert!(options.no_input);
        assert_eq!(options.style, "flood");
    }

    #[test]
    fn test_long_names_and_aliases_agree() {
        let long = parse(&["roads", "--zoom", "4", "6", "--thumbnail-bbox", "1", "2", "3", "4"])
            .unwrap()
            .options(SeedOptions::default());
        let alias = parse(&[
            "roads",
            "--zoom-level",
            "4",
            "6",
            "--thumbnail-extent",
            "1",
            "2",
            "3",
            "4",
        ])
        .unwrap()
        .options(SeedOptions::default());

        assert_eq!((alias.min_zoom, alias.max_zoom), (4, 6));
        assert_eq!(alias.thumbnail_bbox, Some(BoundingBox::new(1.0, 2.0, 3.0, 4.0)));
        assert_eq!(alias, long);
    }

    #[test]
    fn test_zoom_above_max_rejected() {
        assert!(parse(&["roads", "-z", "10", "25"]).is_err());
    }

    #[test]
    fn test_zoom_needs_two_values() {
        assert!(parse(&["roads", "-z", "10"]).is_err());
    }
}
