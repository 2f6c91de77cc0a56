//! # gridcalc-core
//!
//! Core data types for the gridcalc formula engine.
//!
//! This crate provides the types every other gridcalc crate builds on:
//! - [`TypedValue`] and [`ErrorKind`] - the result of any formula expression
//! - [`CellReference`], [`RangeReference`], [`ColumnSpan`], [`RowSpan`] - addresses
//!   that point at cells without holding any pointer into a cell store
//! - [`Reference`] - the sum of all reference shapes, with A1 and R1C1 parsing
//! - [`SheetName`] - a validated, cheaply cloned sheet name
//!
//! ## Example
//!
//! ```rust
//! use gridcalc_core::CellReference;
//!
//! let b2 = CellReference::parse("B2", "Sheet1").unwrap();
//! let c3 = b2.offset(1, 1).unwrap();
//! assert_eq!(c3.to_string(), "Sheet1!C3");
//! ```

pub mod error;
pub mod reference;
pub mod sheet;
pub mod value;

pub use error::{Error, Result};
pub use reference::{
    column_to_letters, letters_to_column, parse_r1c1, CellKey, CellReference, ColumnSpan,
    RangeReference, Reference, RowSpan,
};
pub use sheet::SheetName;
pub use value::{compare_values, format_number, parse_number, ErrorKind, TypedValue};

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLUMNS: u32 = 16_384;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// Error value assigned to every cell caught in a dependency cycle.
pub const CIRCULAR_REFERENCE: ErrorKind = ErrorKind::Ref;
