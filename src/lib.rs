//! # terr50 - Flat-Region Detection over Terrain 50 Grids
//!
//! Library for reading OS Terrain 50 style elevation tiles, stitching them
//! into one combined grid, and classifying each sample as part of a flat
//! region — a contiguous area of effectively constant altitude, used as a
//! heuristic indicator of water (lakes, estuaries, slow rivers) versus land
//! relief.
//!
//! ## Pipeline
//!
//! Data flows strictly forward:
//!
//! 1. [`AscTile`] parses one tile — a 5-line header plus row-major altitude
//!    samples — flipping the file's north-first row order so grid row 0 is
//!    the south edge.
//! 2. [`assemble`] arranges a rectangular [`SquareLayout`] of tile names,
//!    loads each through a [`TileSource`] (such as [`TileStore`]), checks
//!    shape consistency, and stitches the samples into one
//!    [`ElevationGrid`] with [`NO_ALTITUDE`] filling the gaps.
//! 3. [`detect_flat_regions`] runs the two-phase flatness classification
//!    and returns a [`StatusGrid`] plus seed and total counts.
//!
//! ## Quick Start
//!
//! ```ignore
//! use terr50::{assemble, detect_flat_regions, SquareLayout, TileStore};
//!
//! let store = TileStore::new("./OSData/Altitudes/terr50_gagg_gb/data", 100);
//!
//! let mut layout = SquareLayout::new(2, 2);
//! layout.set(0, 0, "NY10");
//! layout.set(0, 1, "NY20");
//! layout.set(1, 0, "NY11");
//! layout.set(1, 1, "NY21");
//!
//! let assembly = assemble(&store, &layout);
//! if let Some(grid) = &assembly.grid {
//!     let regions = detect_flat_regions(grid);
//!     println!("{} of {} cells are flat", regions.total_flat, grid.len());
//! }
//! ```
//!
//! ## Tile format
//!
//! Each tile is an `.asc` text file: five `<field> <integer>` header lines
//! (`ncols`, `nrows`, `xllcorner`, `yllcorner`, `cellsize`) followed by
//! `nrows` lines of `ncols` altitude values in metres, ordered north to
//! south. The sentinel value `-1000.0` ([`NO_ALTITUDE`]) stands in wherever
//! no real sample exists.
//!
//! ## Features
//!
//! - `threading`: parallelise the detector's seed pass across rows with
//!   rayon.

pub mod assemble;
pub mod error;
pub mod flat;
pub mod grid;
pub mod squares;
pub mod store;
pub mod tile;

// Re-export main types at crate root for convenience
pub use assemble::{
    assemble, Assembly, AssemblyStatus, AssemblySummary, SquareLayout, TileFailure, TileSource,
    TileStatus, TileStatusGrid,
};
pub use error::{Result, Terr50Error};
pub use flat::{
    detect_flat_regions, same_altitude, CellStatus, FlatRegions, StatusGrid, ALTITUDE_TOLERANCE,
};
pub use grid::ElevationGrid;
pub use store::{CacheStats, TileStore};
pub use tile::{AscTile, TileHeader, NO_ALTITUDE};
