//! Flat-region detection.
//!
//! This module classifies every cell of an [`ElevationGrid`] as belonging to
//! a flat region or not — a contiguous area of effectively constant altitude,
//! used as a heuristic for water (lakes, estuaries, slow rivers) versus land
//! relief.
//!
//! Detection runs in two phases over a read-only grid:
//!
//! 1. **Seed classification** — a cell whose whole Moore neighbourhood (all
//!    8 surrounding cells) is in bounds and at least 6 of them match its
//!    altitude becomes a [`CellStatus::Seed`]. `NO_ALTITUDE` cells are seeds
//!    by definition. Corner and edge cells can never qualify.
//! 2. **Region growing** — starting from the seeds, any not-yet-classified
//!    neighbour matching a frontier cell's altitude becomes
//!    [`CellStatus::Extended`], pass after pass, until no growth remains.
//!
//! Altitude equality is tolerance-based ([`ALTITUDE_TOLERANCE`]) and
//! therefore not transitive: chains of adjacent, slightly drifting values
//! can connect cells whose extremes differ by much more than the tolerance.
//! That is an inherent property of tolerance-based flood fill, kept as is.
//!
//! The detector performs no I/O and cannot fail; it is a pure function of
//! its input grid.

use crate::grid::ElevationGrid;
use crate::tile::NO_ALTITUDE;

#[cfg(feature = "threading")]
use rayon::prelude::*;

/// Absolute tolerance in metres under which two altitudes count as equal.
pub const ALTITUDE_TOLERANCE: f64 = 0.01;

/// Are two altitudes practically the same for flatness purposes?
#[inline]
pub fn same_altitude(a: f64, b: f64) -> bool {
    (a - b).abs() < ALTITUDE_TOLERANCE
}

/// Per-cell classification produced by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CellStatus {
    /// Not part of any flat region.
    NotFlat = 0,
    /// Classified flat in the seed pass (includes `NO_ALTITUDE` cells).
    Seed = 1,
    /// Reached from a seed by region growing.
    Extended = 2,
}

/// A grid of [`CellStatus`] values with the same shape as the elevation grid
/// it was computed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusGrid {
    data: Vec<CellStatus>,
    rows: usize,
    cols: usize,
}

impl StatusGrid {
    fn new(rows: usize, cols: usize) -> Self {
        Self {
            data: vec![CellStatus::NotFlat; rows * cols],
            rows,
            cols,
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> CellStatus {
        self.data[row * self.cols + col]
    }

    #[inline]
    fn set(&mut self, row: usize, col: usize, status: CellStatus) {
        self.data[row * self.cols + col] = status;
    }

    /// Whether the cell belongs to a flat region (seed or extended).
    pub fn is_flat(&self, row: usize, col: usize) -> bool {
        self.get(row, col) != CellStatus::NotFlat
    }

    /// Number of cells with the given status.
    pub fn count(&self, status: CellStatus) -> usize {
        self.data.iter().filter(|&&s| s == status).count()
    }
}

/// Result of a detection run.
#[derive(Debug, Clone)]
pub struct FlatRegions {
    /// Per-cell classification, same shape as the input grid.
    pub status: StatusGrid,
    /// Cells classified flat by the seed pass, `NO_ALTITUDE` cells included.
    pub seed_count: usize,
    /// All flat cells: seeds plus every cell reached by region growing.
    pub total_flat: usize,
    /// Number of growth passes that claimed at least one new cell.
    pub growth_passes: usize,
}

/// Classify every cell of `grid` as flat or not.
///
/// A degenerate grid (zero rows or zero columns) yields an empty
/// [`StatusGrid`] and zero counts. Running the detector twice on the same
/// grid produces identical results.
///
/// With the `threading` feature enabled the seed pass is parallelised
/// across rows; each worker writes a disjoint row of the status grid while
/// reading the shared immutable elevation grid. The growth pass stays
/// single-threaded: its claims read statuses written earlier in the same
/// pass, so rows are not independent there.
pub fn detect_flat_regions(grid: &ElevationGrid) -> FlatRegions {
    let (rows, cols) = (grid.rows(), grid.cols());
    let mut status = StatusGrid::new(rows, cols);

    if rows == 0 || cols == 0 {
        return FlatRegions {
            status,
            seed_count: 0,
            total_flat: 0,
            growth_passes: 0,
        };
    }

    classify_seeds(grid, &mut status);

    // The initial frontier is every seed, in row-major order.
    let mut frontier: Vec<(usize, usize)> = Vec::new();
    for row in 0..rows {
        for col in 0..cols {
            if status.get(row, col) == CellStatus::Seed {
                frontier.push((row, col));
            }
        }
    }

    let seed_count = frontier.len();
    let mut total_flat = seed_count;
    let mut growth_passes = 0;

    // Grow until a pass claims nothing. Statuses only ever move from
    // NotFlat to a flat value, and every flat cell has its neighbourhood
    // examined in the pass after it is claimed, so an exhausted frontier
    // means no reachable cell remains.
    while !frontier.is_empty() {
        let mut next: Vec<(usize, usize)> = Vec::new();

        for &(row, col) in &frontier {
            let alt = grid.get(row, col);
            // NO_ALTITUDE cells are flat but never spread.
            if alt == NO_ALTITUDE {
                continue;
            }
            claim_matching_neighbours(grid, &mut status, row, col, alt, &mut next);
        }

        if next.is_empty() {
            break;
        }
        growth_passes += 1;
        total_flat += next.len();
        frontier = next;
    }

    FlatRegions {
        status,
        seed_count,
        total_flat,
        growth_passes,
    }
}

/// Phase 1: assign `Seed`/`NotFlat` to every cell.
fn classify_seeds(grid: &ElevationGrid, status: &mut StatusGrid) {
    let cols = grid.cols();

    #[cfg(feature = "threading")]
    status
        .data
        .par_chunks_mut(cols)
        .enumerate()
        .for_each(|(row, out)| classify_row(grid, row, out));

    #[cfg(not(feature = "threading"))]
    status
        .data
        .chunks_mut(cols)
        .enumerate()
        .for_each(|(row, out)| classify_row(grid, row, out));
}

fn classify_row(grid: &ElevationGrid, row: usize, out: &mut [CellStatus]) {
    for (col, slot) in out.iter_mut().enumerate() {
        *slot = classify_cell(grid, row, col);
    }
}

/// Seed test for one cell: `NO_ALTITUDE` is automatically a seed; otherwise
/// at least 6 of the 8 Moore neighbours must match the cell's altitude, and
/// every out-of-bounds neighbour position counts against it. The scan bails
/// out as soon as more than two neighbours are absent or different, which
/// rules out corner and edge cells before any values are compared.
fn classify_cell(grid: &ElevationGrid, row: usize, col: usize) -> CellStatus {
    let alt = grid.get(row, col);
    if alt == NO_ALTITUDE {
        return CellStatus::Seed;
    }

    let (rows, cols) = (grid.rows() as isize, grid.cols() as isize);
    let mut same = 0u32;
    let mut not_same = 0u32;

    for dr in -1..=1isize {
        for dc in -1..=1isize {
            if dr == 0 && dc == 0 {
                continue;
            }
            if not_same > 2 {
                return CellStatus::NotFlat;
            }

            let (nr, nc) = (row as isize + dr, col as isize + dc);
            if nr < 0 || nr >= rows || nc < 0 || nc >= cols {
                not_same += 1;
            } else if same_altitude(alt, grid.get(nr as usize, nc as usize)) {
                same += 1;
            } else {
                not_same += 1;
            }
        }
    }

    if same >= 6 {
        CellStatus::Seed
    } else {
        CellStatus::NotFlat
    }
}

/// Phase 2 step: mark every still-unclassified neighbour matching `alt` as
/// `Extended` and record it for the next pass.
fn claim_matching_neighbours(
    grid: &ElevationGrid,
    status: &mut StatusGrid,
    row: usize,
    col: usize,
    alt: f64,
    next: &mut Vec<(usize, usize)>,
) {
    let (rows, cols) = (grid.rows() as isize, grid.cols() as isize);

    for dr in -1..=1isize {
        for dc in -1..=1isize {
            if dr == 0 && dc == 0 {
                continue;
            }
            let (nr, nc) = (row as isize + dr, col as isize + dc);
            if nr < 0 || nr >= rows || nc < 0 || nc >= cols {
                continue;
            }
            let (nr, nc) = (nr as usize, nc as usize);
            if status.get(nr, nc) != CellStatus::NotFlat {
                continue;
            }
            if same_altitude(alt, grid.get(nr, nc)) {
                status.set(nr, nc, CellStatus::Extended);
                next.push((nr, nc));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(rows: usize, cols: usize, alt: f64) -> ElevationGrid {
        ElevationGrid::new(rows, cols, alt)
    }

    #[test]
    fn test_uniform_5x5_grows_to_full_grid() {
        let grid = uniform(5, 5, 10.0);
        let result = detect_flat_regions(&grid);

        // Every cell with all 8 neighbours in bounds is a seed: the 3x3
        // interior block.
        assert_eq!(result.seed_count, 9);
        for row in 1..4 {
            for col in 1..4 {
                assert_eq!(result.status.get(row, col), CellStatus::Seed);
            }
        }

        // Growth reaches the whole grid; the border arrives as Extended.
        assert_eq!(result.total_flat, 25);
        assert_eq!(result.status.count(CellStatus::Extended), 16);
        assert_eq!(result.status.get(0, 0), CellStatus::Extended);
        assert_eq!(result.status.get(4, 2), CellStatus::Extended);
    }

    #[test]
    fn test_no_interior_cells_means_no_seeds() {
        // Fewer than 3 rows or columns leaves no cell with 8 in-bounds
        // neighbours, so nothing seeds and nothing grows.
        for (rows, cols) in [(2, 2), (2, 5), (1, 9)] {
            let result = detect_flat_regions(&uniform(rows, cols, 10.0));
            assert_eq!(result.seed_count, 0, "{}x{}", rows, cols);
            assert_eq!(result.total_flat, 0);
            assert_eq!(result.status.count(CellStatus::NotFlat), rows * cols);
        }
    }

    #[test]
    fn test_uniform_3x3_center_is_a_seed() {
        // The centre of a 3x3 grid has all 8 neighbours in bounds.
        let result = detect_flat_regions(&uniform(3, 3, 10.0));
        assert_eq!(result.seed_count, 1);
        assert_eq!(result.status.get(1, 1), CellStatus::Seed);
        assert_eq!(result.total_flat, 9);
    }

    #[test]
    fn test_seed_threshold_boundary() {
        // Interior cell (1,1) of a 3x3 grid: with exactly 2 differing
        // neighbours (6 matching) it is a seed ...
        let mut grid = uniform(3, 3, 10.0);
        grid.set(0, 0, 50.0);
        grid.set(2, 2, 50.0);
        let result = detect_flat_regions(&grid);
        assert_eq!(result.status.get(1, 1), CellStatus::Seed);

        // ... with 3 differing (5 matching) it is not.
        grid.set(0, 1, 50.0);
        let result = detect_flat_regions(&grid);
        assert_eq!(result.status.get(1, 1), CellStatus::NotFlat);
        assert_eq!(result.seed_count, 0);
    }

    #[test]
    fn test_sentinel_cells_are_seeds_but_do_not_spread() {
        // Centre is NO_ALTITUDE, ring is uniform land. The ring cells are
        // all edge/corner cells so none seeds, and the sentinel must not
        // extend into them.
        let mut grid = uniform(3, 3, 10.0);
        grid.set(1, 1, NO_ALTITUDE);
        let result = detect_flat_regions(&grid);

        assert_eq!(result.status.get(1, 1), CellStatus::Seed);
        assert_eq!(result.seed_count, 1);
        assert_eq!(result.total_flat, 1);
        for (row, col) in [(0, 0), (0, 1), (0, 2), (1, 0), (1, 2), (2, 0), (2, 1), (2, 2)] {
            assert_eq!(result.status.get(row, col), CellStatus::NotFlat);
        }
    }

    #[test]
    fn test_sentinel_invariant_holds_everywhere() {
        let mut grid = uniform(4, 4, 25.0);
        grid.set(0, 0, NO_ALTITUDE);
        grid.set(3, 3, NO_ALTITUDE);
        grid.set(2, 1, NO_ALTITUDE);
        let result = detect_flat_regions(&grid);

        for (row, col) in [(0, 0), (3, 3), (2, 1)] {
            assert_eq!(result.status.get(row, col), CellStatus::Seed);
        }
    }

    #[test]
    fn test_region_growth_stops_at_different_altitude() {
        // A 5x5 plateau of 10.0 inside a 7x7 grid whose outer ring has
        // distinct values: the plateau fills in, the ring stays untouched.
        let mut grid = uniform(7, 7, 10.0);
        for i in 0..7 {
            grid.set(0, i, 100.0 + i as f64);
            grid.set(6, i, 200.0 + i as f64);
            grid.set(i, 0, 300.0 + i as f64);
            grid.set(i, 6, 400.0 + i as f64);
        }
        let result = detect_flat_regions(&grid);

        assert_eq!(result.total_flat, 25);
        for row in 1..6 {
            for col in 1..6 {
                assert!(result.status.is_flat(row, col), "({}, {})", row, col);
            }
        }
        for i in 0..7 {
            assert!(!result.status.is_flat(0, i));
            assert!(!result.status.is_flat(6, i));
            assert!(!result.status.is_flat(i, 0));
            assert!(!result.status.is_flat(i, 6));
        }
    }

    #[test]
    fn test_tolerance_chains_across_drifting_values() {
        // Adjacent columns drift by 0.005 — within tolerance of their
        // neighbours even though the extremes differ by 0.02.
        let mut grid = uniform(5, 5, 0.0);
        for row in 0..5 {
            for col in 0..5 {
                grid.set(row, col, 10.0 + col as f64 * 0.005);
            }
        }
        let result = detect_flat_regions(&grid);
        assert_eq!(result.total_flat, 25);
    }

    #[test]
    fn test_two_separate_plateaus() {
        // Two 3-wide bands of constant altitude separated by a band of
        // sloping ground; each plateau is claimed, the slope is not.
        let mut grid = uniform(9, 5, 0.0);
        for row in 0..9 {
            for col in 0..5 {
                let alt = match row {
                    0..=2 => 10.0,
                    6..=8 => 40.0,
                    _ => 20.0 + row as f64 + col as f64 * 0.5,
                };
                grid.set(row, col, alt);
            }
        }
        let result = detect_flat_regions(&grid);

        for col in 0..5 {
            assert!(result.status.is_flat(1, col));
            assert!(result.status.is_flat(7, col));
            assert!(!result.status.is_flat(4, col));
        }
        assert_eq!(result.total_flat, 30);
    }

    #[test]
    fn test_idempotent() {
        let mut grid = uniform(6, 6, 5.0);
        grid.set(0, 0, NO_ALTITUDE);
        grid.set(3, 3, 7.0);
        let first = detect_flat_regions(&grid);
        let second = detect_flat_regions(&grid);
        assert_eq!(first.status, second.status);
        assert_eq!(first.seed_count, second.seed_count);
        assert_eq!(first.total_flat, second.total_flat);
    }

    #[test]
    fn test_degenerate_grids() {
        for (rows, cols) in [(0, 0), (0, 4), (4, 0)] {
            let result = detect_flat_regions(&ElevationGrid::new(rows, cols, 0.0));
            assert_eq!(result.seed_count, 0);
            assert_eq!(result.total_flat, 0);
            assert_eq!(result.status.rows(), rows);
            assert_eq!(result.status.cols(), cols);
        }
    }

    #[test]
    fn test_same_altitude_tolerance() {
        assert!(same_altitude(10.0, 10.0));
        assert!(same_altitude(10.0, 10.009));
        assert!(same_altitude(10.009, 10.0));
        assert!(!same_altitude(10.0, 10.011));
        assert!(!same_altitude(10.0, NO_ALTITUDE));
    }
}
