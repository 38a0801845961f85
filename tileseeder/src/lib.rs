//! tileseeder - cache seeding for QGIS Server layers
//!
//! Pre-renders the tile pyramid, legend and thumbnail of a layer by issuing
//! OGC WMS requests against QGIS Server and writing the responses into a
//! deterministic on-disk cache.
//!
//! The entry point is [`seeder::TileSeeder`]:
//!
//! ```no_run
//! use tileseeder::config::ConfigFile;
//! use tileseeder::layer::Layer;
//! use tileseeder::seeder::{LogObserver, SeedOptions, TileSeeder};
//!
//! # fn main() -> tileseeder::Result<()> {
//! let config = ConfigFile::load()?;
//! let seeder = TileSeeder::from_config(&config)?;
//! let options = SeedOptions { no_input: true, ..config.seed_options() };
//! let report = seeder.seed("roads", &options, &LogObserver, &|_: &Layer, _: u64| true)?;
//! println!("{}", report);
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod cache;
pub mod config;
pub mod coord;
pub mod error;
pub mod executor;
pub mod layer;
pub mod logging;
pub mod seeder;
pub mod tasks;
pub mod tile;

pub use error::{Error, Result};

/// Version of the tileseeder library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
