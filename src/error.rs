//! Error types for the terr50 library.

use thiserror::Error;

/// Errors that can occur when working with Terrain 50 data.
#[derive(Error, Debug)]
pub enum Terr50Error {
    /// IO error when reading tile files or archives.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A tile header line is not in the expected `<field> <integer>` format,
    /// or a required header field is missing or out of range.
    #[error("Invalid header for square {square}: {reason}")]
    HeaderFormat { square: String, reason: String },

    /// The tile body has the wrong number of data lines, or a data line has
    /// the wrong number of values.
    #[error("Unexpected data shape for square {square}: {reason}")]
    DataShape { square: String, reason: String },

    /// A data value could not be parsed as a number.
    #[error("Non-numeric altitude value {value:?} on data line {line} of square {square}")]
    DataParse {
        square: String,
        line: usize,
        value: String,
    },

    /// A tile's dimensions disagree with the first tile loaded into the same
    /// assembly. Values are `(cellsize, nrows, ncols)`.
    #[error("Square {square} has shape {actual:?}, expected {expected:?} (cellsize, nrows, ncols)")]
    TileConsistency {
        square: String,
        expected: (u32, usize, usize),
        actual: (u32, usize, usize),
    },

    /// The tile identifier is not a valid 10x10km grid square name.
    #[error("Invalid grid square name: {name}")]
    SquareName { name: String },

    /// More than one data archive matched a tile identifier.
    #[error("Found {count} data archives for square {square}, expected one")]
    AmbiguousArchive { square: String, count: usize },
}

/// Result type alias using [`Terr50Error`].
pub type Result<T> = std::result::Result<T, Terr50Error>;
