//! Error types for gridcalc-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building or manipulating references and sheet names
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Text that is not a valid address
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Row index outside `1..=MAX_ROWS`
    #[error("Row {0} out of bounds (valid: 1..={1})")]
    RowOutOfBounds(i64, u32),

    /// Column index outside `1..=MAX_COLUMNS`
    #[error("Column {0} out of bounds (valid: 1..={1})")]
    ColumnOutOfBounds(i64, u32),

    /// Offset requested inside a range falls outside it
    #[error("Position ({row}, {column}) is outside a {rows}x{columns} range")]
    OutsideRange {
        row: u32,
        column: u32,
        rows: u32,
        columns: u32,
    },

    /// Height or width smaller than one
    #[error("Invalid size {height}x{width}")]
    InvalidSize { height: i64, width: i64 },

    /// Two corners of a range on different sheets
    #[error("Range corners are on different sheets: {0} and {1}")]
    SheetMismatch(String, String),

    /// Sheet not found by name
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// Invalid sheet name
    #[error("Invalid sheet name: {0}")]
    InvalidSheetName(String),

    /// Duplicate sheet name
    #[error("Sheet name already exists: {0}")]
    DuplicateSheetName(String),

    /// Invalid defined name
    #[error("Invalid defined name: {0}")]
    InvalidName(String),
}
