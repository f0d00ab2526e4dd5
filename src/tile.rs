//! Terrain 50 tile parsing.
//!
//! This module provides the [`AscTile`] struct for reading one `.asc` tile —
//! a fixed 5-line header followed by row-major altitude samples — into a
//! header record and an [`ElevationGrid`].
//!
//! # Tile format
//!
//! ```text
//! ncols 200
//! nrows 200
//! xllcorner 320000
//! yllcorner 520000
//! cellsize 50
//! 317.2 324.9 332.7 ...     (nrows lines of ncols values, north first)
//! ```
//!
//! The file presents rows north-to-south; the parsed grid is flipped so that
//! `[0, 0]` is the south-west corner of the square.

use crate::error::{Result, Terr50Error};
use crate::grid::ElevationGrid;

/// Value used where no real altitude measurement exists (off-grid or sea).
pub const NO_ALTITUDE: f64 = -1000.0;

/// The five required header fields, in their conventional file order.
const HEADER_FIELDS: [&str; 5] = ["ncols", "nrows", "xllcorner", "yllcorner", "cellsize"];

/// Parsed tile header.
///
/// All field values are integers in the source format. `name` is the tile
/// identifier the file was loaded for (upper-cased grid square name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileHeader {
    /// Tile identifier, e.g. "NY12".
    pub name: String,
    /// Samples per data line.
    pub ncols: usize,
    /// Number of data lines.
    pub nrows: usize,
    /// Easting of the south-west corner, in metres.
    pub xllcorner: i64,
    /// Northing of the south-west corner, in metres.
    pub yllcorner: i64,
    /// Metres between adjacent samples.
    pub cellsize: u32,
}

impl TileHeader {
    /// The `(cellsize, nrows, ncols)` triple checked for consistency across
    /// tiles of one assembly.
    pub fn shape(&self) -> (u32, usize, usize) {
        (self.cellsize, self.nrows, self.ncols)
    }
}

/// One parsed Terrain 50 tile: header plus altitude samples.
///
/// # Example
///
/// ```
/// use terr50::AscTile;
///
/// let text = "ncols 2\nnrows 2\nxllcorner 0\nyllcorner 0\ncellsize 50\n1.0 2.0\n3.0 4.0\n";
/// let tile = AscTile::parse("NY12", text).unwrap();
/// // First file line is the northern edge, so it lands in the top grid row.
/// assert_eq!(tile.grid.get(1, 0), 1.0);
/// assert_eq!(tile.grid.get(0, 0), 3.0);
/// ```
#[derive(Debug, Clone)]
pub struct AscTile {
    pub header: TileHeader,
    pub grid: ElevationGrid,
}

impl AscTile {
    /// Parse a complete tile from its file contents.
    ///
    /// # Errors
    ///
    /// - [`Terr50Error::HeaderFormat`] if a header line does not split into
    ///   exactly two tokens, a value is not an integer, a required field is
    ///   missing, or `ncols`/`nrows`/`cellsize` is not positive.
    /// - [`Terr50Error::DataShape`] if the number of data lines or values per
    ///   line does not match the header.
    /// - [`Terr50Error::DataParse`] if an altitude value is not numeric.
    pub fn parse(square: &str, text: &str) -> Result<Self> {
        Self::from_lines(square, text.lines())
    }

    /// Parse a tile from an iterator of lines (header first).
    pub fn from_lines<'a, I>(square: &str, lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut lines = lines.into_iter();
        let header = parse_header(square, &mut lines)?;

        let (nrows, ncols) = (header.nrows, header.ncols);
        let mut grid = ElevationGrid::new(nrows, ncols, 0.0);

        let mut data_line_count = 0usize;
        for line in lines {
            let line_no = data_line_count + 1;
            data_line_count += 1;
            if data_line_count > nrows {
                // Keep counting so the error can report the real total.
                continue;
            }

            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() != ncols {
                return Err(Terr50Error::DataShape {
                    square: square.to_string(),
                    reason: format!(
                        "data line {} has {} values instead of {}",
                        line_no,
                        tokens.len(),
                        ncols
                    ),
                });
            }

            // Flip: file rows run north-to-south, grid row 0 is the south edge.
            let row = grid.row_mut(nrows - data_line_count);
            for (col, token) in tokens.iter().enumerate() {
                row[col] = token.parse().map_err(|_| Terr50Error::DataParse {
                    square: square.to_string(),
                    line: line_no,
                    value: token.to_string(),
                })?;
            }
        }

        if data_line_count != nrows {
            return Err(Terr50Error::DataShape {
                square: square.to_string(),
                reason: format!("{} data lines instead of {}", data_line_count, nrows),
            });
        }

        Ok(Self { header, grid })
    }
}

/// Read and validate the 5 header lines.
///
/// Fields may appear in any order; each line must be `<field> <integer>`.
fn parse_header<'a, I>(square: &str, lines: &mut I) -> Result<TileHeader>
where
    I: Iterator<Item = &'a str>,
{
    let mut values: [Option<i64>; 5] = [None; 5];

    for line_no in 1..=HEADER_FIELDS.len() {
        let line = lines.next().ok_or_else(|| Terr50Error::HeaderFormat {
            square: square.to_string(),
            reason: "too few lines for a tile header".to_string(),
        })?;

        let mut tokens = line.split_whitespace();
        let (field, value) = match (tokens.next(), tokens.next(), tokens.next()) {
            (Some(f), Some(v), None) => (f, v),
            _ => {
                return Err(Terr50Error::HeaderFormat {
                    square: square.to_string(),
                    reason: format!("header line {} is not `<field> <value>`", line_no),
                })
            }
        };

        let value: i64 = value.parse().map_err(|_| Terr50Error::HeaderFormat {
            square: square.to_string(),
            reason: format!("field {} has non-integer value {:?}", field, value),
        })?;

        // Unknown field names are skipped here; with only five header lines
        // an unknown name always leaves a required field missing below.
        if let Some(idx) = HEADER_FIELDS.iter().position(|f| *f == field) {
            values[idx] = Some(value);
        }
    }

    let field = |idx: usize| -> Result<i64> {
        values[idx].ok_or_else(|| Terr50Error::HeaderFormat {
            square: square.to_string(),
            reason: format!("missing {} field", HEADER_FIELDS[idx]),
        })
    };

    let positive = |idx: usize| -> Result<i64> {
        let v = field(idx)?;
        if v > 0 {
            Ok(v)
        } else {
            Err(Terr50Error::HeaderFormat {
                square: square.to_string(),
                reason: format!("field {} must be positive, got {}", HEADER_FIELDS[idx], v),
            })
        }
    };

    Ok(TileHeader {
        name: square.to_uppercase(),
        ncols: positive(0)? as usize,
        nrows: positive(1)? as usize,
        xllcorner: field(2)?,
        yllcorner: field(3)?,
        cellsize: positive(4)? as u32,
    })
}
