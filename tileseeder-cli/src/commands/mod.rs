//! CLI command implementations.
//!
//! - [`seed`] - Seed a layer's tile, legend and thumbnail cache
//! - [`cache`] - Cache maintenance (clear, stats)
//! - [`layers`] - Inspect the layer catalog
//! - [`init`] - Write a default configuration file

pub mod cache;
pub mod init;
pub mod layers;
pub mod seed;
