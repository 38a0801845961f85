//! Slippy-map tile enumeration.
//!
//! See [`TileGrid`] for computing every tile address that covers a layer
//! over a zoom range.

mod grid;

pub use grid::{TileGrid, TileIter, TileRange};
