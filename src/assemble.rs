//! Stitching tile squares into one combined elevation grid.
//!
//! An assembly takes a rectangular layout of tile identifiers (with `None`
//! marking positions beyond the grid), loads each tile through a
//! [`TileSource`], checks that every loaded tile shares the same shape, and
//! copies the samples into a single [`ElevationGrid`] covering the whole
//! area. Positions without data are filled with [`NO_ALTITUDE`].
//!
//! One bad tile does not abort the assembly: failures are recorded per tile
//! and the rest of the area is still processed, so callers can tell "no land
//! here" apart from "something is wrong with the data".

use std::sync::Arc;

use crate::error::{Result, Terr50Error};
use crate::grid::ElevationGrid;
use crate::tile::{AscTile, NO_ALTITUDE};

/// Anything that can produce tiles by square name.
///
/// `Ok(None)` means there is no source data for the square — by convention
/// the square is entirely sea. Errors are reported per tile by the
/// assembler, not propagated.
pub trait TileSource {
    fn load_square(&self, square: &str) -> Result<Option<Arc<AscTile>>>;
}

/// A rectangular layout of tile identifiers, `tiles_north x tiles_east`,
/// indexed `[north, east]` with `[0, 0]` the south-west corner. `None`
/// marks a position beyond the national grid.
#[derive(Debug, Clone)]
pub struct SquareLayout {
    names: Vec<Option<String>>,
    tiles_north: usize,
    tiles_east: usize,
}

impl SquareLayout {
    /// Create a layout with every position off-grid.
    pub fn new(tiles_north: usize, tiles_east: usize) -> Self {
        Self {
            names: vec![None; tiles_north * tiles_east],
            tiles_north,
            tiles_east,
        }
    }

    pub fn tiles_north(&self) -> usize {
        self.tiles_north
    }

    pub fn tiles_east(&self) -> usize {
        self.tiles_east
    }

    pub fn set(&mut self, north: usize, east: usize, name: impl Into<String>) {
        self.names[north * self.tiles_east + east] = Some(name.into());
    }

    pub fn name(&self, north: usize, east: usize) -> Option<&str> {
        self.names[north * self.tiles_east + east].as_deref()
    }
}

/// Per-tile outcome of an assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileStatus {
    /// The position is beyond the grid; no data exists.
    OffGrid,
    /// No data file for the square; the whole square is sea.
    Sea,
    /// Tile loaded and stitched in.
    Ok,
    /// The tile failed to load or disagreed with the expected shape.
    Error,
}

/// Tile statuses arranged like the [`SquareLayout`] they were derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileStatusGrid {
    data: Vec<TileStatus>,
    tiles_north: usize,
    tiles_east: usize,
}

impl TileStatusGrid {
    fn new(tiles_north: usize, tiles_east: usize) -> Self {
        Self {
            data: vec![TileStatus::OffGrid; tiles_north * tiles_east],
            tiles_north,
            tiles_east,
        }
    }

    pub fn tiles_north(&self) -> usize {
        self.tiles_north
    }

    pub fn tiles_east(&self) -> usize {
        self.tiles_east
    }

    pub fn get(&self, north: usize, east: usize) -> TileStatus {
        self.data[north * self.tiles_east + east]
    }

    fn set(&mut self, north: usize, east: usize, status: TileStatus) {
        self.data[north * self.tiles_east + east] = status;
    }

    /// Number of tiles with the given status.
    pub fn count(&self, status: TileStatus) -> usize {
        self.data.iter().filter(|&&s| s == status).count()
    }
}

/// Overall outcome of an assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyStatus {
    /// At least one tile loaded and none failed.
    Ok,
    /// Nothing loaded and nothing failed: the whole area is off GB land.
    Sea,
    /// At least one tile failed; see [`Assembly::failures`].
    Error,
}

/// A tile that could not be stitched in, with the reason.
#[derive(Debug)]
pub struct TileFailure {
    pub square: String,
    pub error: Terr50Error,
}

/// Shape and altitude statistics for a completed assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblySummary {
    /// Metres between samples, shared by every tile.
    pub cellsize: u32,
    /// Data rows per tile.
    pub rows_per_square: usize,
    /// Data columns per tile.
    pub cols_per_square: usize,
    /// Lowest altitude across all loaded tiles.
    pub min_altitude: f64,
    /// Highest altitude across all loaded tiles.
    pub max_altitude: f64,
}

/// Result of [`assemble`].
///
/// `grid` and `summary` are populated whenever at least one tile loaded,
/// including assemblies that finish with status [`AssemblyStatus::Error`] —
/// the good tiles remain usable next to the failure report.
#[derive(Debug)]
pub struct Assembly {
    pub status: AssemblyStatus,
    pub tile_status: TileStatusGrid,
    pub failures: Vec<TileFailure>,
    pub grid: Option<ElevationGrid>,
    pub summary: Option<AssemblySummary>,
}

/// Load every square of `layout` from `source` and stitch the results into
/// one combined grid.
///
/// The first successfully loaded tile fixes the expected
/// `(cellsize, nrows, ncols)`; any later tile that disagrees is recorded as
/// a [`Terr50Error::TileConsistency`] failure and skipped — mixed tile
/// resolutions are rejected, not resampled. The combined grid is pre-filled
/// with [`NO_ALTITUDE`] and each loaded tile is copied into its block at
/// `(north_index * nrows, east_index * ncols)`.
pub fn assemble<S: TileSource>(source: &S, layout: &SquareLayout) -> Assembly {
    let (tiles_north, tiles_east) = (layout.tiles_north(), layout.tiles_east());

    let mut tile_status = TileStatusGrid::new(tiles_north, tiles_east);
    let mut failures: Vec<TileFailure> = Vec::new();
    let mut expected: Option<(u32, usize, usize)> = None;
    let mut grid: Option<ElevationGrid> = None;
    let mut min_altitude = f64::INFINITY;
    let mut max_altitude = f64::NEG_INFINITY;

    for east in 0..tiles_east {
        for north in 0..tiles_north {
            let status = match layout.name(north, east) {
                None => TileStatus::OffGrid,
                Some(square) => match source.load_square(square) {
                    Err(error) => {
                        failures.push(TileFailure {
                            square: square.to_string(),
                            error,
                        });
                        TileStatus::Error
                    }
                    Ok(None) => TileStatus::Sea,
                    Ok(Some(tile)) => {
                        let shape = tile.header.shape();
                        match expected {
                            Some(exp) if exp != shape => {
                                failures.push(TileFailure {
                                    square: square.to_string(),
                                    error: Terr50Error::TileConsistency {
                                        square: square.to_string(),
                                        expected: exp,
                                        actual: shape,
                                    },
                                });
                                TileStatus::Error
                            }
                            _ => {
                                let combined = grid.get_or_insert_with(|| {
                                    expected = Some(shape);
                                    ElevationGrid::new(
                                        shape.1 * tiles_north,
                                        shape.2 * tiles_east,
                                        NO_ALTITUDE,
                                    )
                                });
                                blit(combined, &tile, north, east);
                                if let Some((lo, hi)) = tile.grid.min_max() {
                                    min_altitude = min_altitude.min(lo);
                                    max_altitude = max_altitude.max(hi);
                                }
                                TileStatus::Ok
                            }
                        }
                    }
                },
            };
            tile_status.set(north, east, status);
        }
    }

    let summary = expected.map(|(cellsize, nrows, ncols)| AssemblySummary {
        cellsize,
        rows_per_square: nrows,
        cols_per_square: ncols,
        min_altitude,
        max_altitude,
    });

    let status = if !failures.is_empty() {
        AssemblyStatus::Error
    } else if grid.is_some() {
        AssemblyStatus::Ok
    } else {
        AssemblyStatus::Sea
    };

    Assembly {
        status,
        tile_status,
        failures,
        grid,
        summary,
    }
}

/// Copy one tile's samples into its block of the combined grid.
fn blit(combined: &mut ElevationGrid, tile: &AscTile, north: usize, east: usize) {
    let nrows = tile.header.nrows;
    let ncols = tile.header.ncols;
    let row_offset = north * nrows;
    let col_offset = east * ncols;

    for row in 0..nrows {
        combined.row_mut(row_offset + row)[col_offset..col_offset + ncols]
            .copy_from_slice(tile.grid.row(row));
    }
}
