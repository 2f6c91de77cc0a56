//! Single-cell references

use super::address::{
    check_column, check_row, column_to_letters, letters_to_column, parse_row, shift_column,
    shift_row, split_column, split_row,
};
use super::split_sheet;
use crate::error::{Error, Result};
use crate::sheet::SheetName;
use std::fmt;

/// A reference to one cell (e.g. `B2`, `$A$1`, `'My Sheet'!C3`)
///
/// Rows and columns are 1-based and always within the sheet limits; any
/// operation that would leave them fails instead of producing a reference.
/// The `$` flags record how the reference was written and do not affect
/// which cell it points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellReference {
    sheet: SheetName,
    row: u32,
    column: u32,
    absolute_row: bool,
    absolute_column: bool,
}

impl CellReference {
    /// Create a relative reference, checking bounds
    pub fn new(sheet: SheetName, row: u32, column: u32) -> Result<Self> {
        Ok(Self {
            sheet,
            row: check_row(row as i64)?,
            column: check_column(column as i64)?,
            absolute_row: false,
            absolute_column: false,
        })
    }

    /// Build a relative reference from coordinates already known to be in bounds
    pub(crate) fn unchecked(sheet: SheetName, row: u32, column: u32) -> Self {
        Self {
            sheet,
            row,
            column,
            absolute_row: false,
            absolute_column: false,
        }
    }

    /// Set the absolute ($) flags
    pub fn with_absolute(mut self, absolute_row: bool, absolute_column: bool) -> Self {
        self.absolute_row = absolute_row;
        self.absolute_column = absolute_column;
        self
    }

    /// Move the reference to another sheet
    pub fn with_sheet(mut self, sheet: SheetName) -> Self {
        self.sheet = sheet;
        self
    }

    /// Parse a cell reference from A1-style notation
    ///
    /// Unqualified addresses land on `default_sheet`.
    ///
    /// # Examples
    /// ```
    /// use gridcalc_core::CellReference;
    ///
    /// let cell = CellReference::parse("$B$2", "Sheet1").unwrap();
    /// assert_eq!(cell.row(), 2);
    /// assert_eq!(cell.column(), 2);
    /// assert!(cell.absolute_row() && cell.absolute_column());
    ///
    /// let cell = CellReference::parse("'Q1 Sales'!C10", "Sheet1").unwrap();
    /// assert_eq!(cell.sheet().as_str(), "Q1 Sales");
    /// ```
    pub fn parse(text: &str, default_sheet: &str) -> Result<Self> {
        Self::parse_in(text, &SheetName::new(default_sheet)?)
    }

    /// Parse a cell reference, defaulting to an already validated sheet name
    pub fn parse_in(text: &str, default_sheet: &SheetName) -> Result<Self> {
        let text = text.trim();
        let (sheet, body) = split_sheet(text)?;
        Self::parse_a1(body, sheet.unwrap_or_else(|| default_sheet.clone()))
    }

    /// Parse the sheet-less part of an address (`$A$1`)
    pub(crate) fn parse_a1(text: &str, sheet: SheetName) -> Result<Self> {
        let (absolute_column, letters, rest) = split_column(text);
        if letters.is_empty() {
            return Err(Error::InvalidAddress(format!(
                "no column letters in '{}'",
                text
            )));
        }
        let column = letters_to_column(letters)?;

        let (absolute_row, digits) = split_row(rest);
        if digits.is_empty() {
            return Err(Error::InvalidAddress(format!("no row number in '{}'", text)));
        }
        let row = parse_row(digits)?;

        Ok(Self {
            sheet,
            row,
            column,
            absolute_row,
            absolute_column,
        })
    }

    /// Sheet the reference points into
    pub fn sheet(&self) -> &SheetName {
        &self.sheet
    }

    /// 1-based row
    pub fn row(&self) -> u32 {
        self.row
    }

    /// 1-based column
    pub fn column(&self) -> u32 {
        self.column
    }

    /// Whether the row was written with `$`
    pub fn absolute_row(&self) -> bool {
        self.absolute_row
    }

    /// Whether the column was written with `$`
    pub fn absolute_column(&self) -> bool {
        self.absolute_column
    }

    /// Shift by `d_row` rows and `d_column` columns
    ///
    /// Fails if the result would leave the sheet.
    pub fn offset(&self, d_row: i64, d_column: i64) -> Result<Self> {
        Ok(Self {
            sheet: self.sheet.clone(),
            row: shift_row(self.row, d_row)?,
            column: shift_column(self.column, d_column)?,
            absolute_row: self.absolute_row,
            absolute_column: self.absolute_column,
        })
    }

    /// Identity of the cell, ignoring the `$` flags
    pub fn key(&self) -> CellKey {
        CellKey {
            sheet: self.sheet.clone(),
            row: self.row,
            column: self.column,
        }
    }

    /// Whether both references point at the same cell
    pub fn same_cell(&self, other: &CellReference) -> bool {
        self.row == other.row && self.column == other.column && self.sheet == other.sheet
    }

    /// Format as A1-style string without the sheet
    pub fn to_a1_string(&self) -> String {
        let mut result = String::new();

        if self.absolute_column {
            result.push('$');
        }
        result.push_str(&column_to_letters(self.column));

        if self.absolute_row {
            result.push('$');
        }
        result.push_str(&self.row.to_string());

        result
    }
}

impl fmt::Display for CellReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.sheet.to_prefix(), self.to_a1_string())
    }
}

/// Identity of a cell: sheet, row, and column
///
/// Used to key evaluation caches and the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    pub sheet: SheetName,
    pub row: u32,
    pub column: u32,
}

impl CellKey {
    /// Turn the key back into a relative reference
    pub fn reference(&self) -> CellReference {
        CellReference {
            sheet: self.sheet.clone(),
            row: self.row,
            column: self.column,
            absolute_row: false,
            absolute_column: false,
        }
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.sheet.to_prefix(),
            column_to_letters(self.column),
            self.row
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MAX_COLUMNS, MAX_ROWS};
    use pretty_assertions::assert_eq;

    fn cell(text: &str) -> CellReference {
        CellReference::parse(text, "Sheet1").unwrap()
    }

    #[test]
    fn test_cell_reference_parse() {
        let addr = cell("A1");
        assert_eq!((addr.row(), addr.column()), (1, 1));
        assert!(!addr.absolute_row());
        assert!(!addr.absolute_column());
        assert_eq!(addr.sheet().as_str(), "Sheet1");

        let addr = cell("$A1");
        assert!(addr.absolute_column());
        assert!(!addr.absolute_row());

        let addr = cell("A$1");
        assert!(!addr.absolute_column());
        assert!(addr.absolute_row());

        let addr = cell("XFD1048576");
        assert_eq!((addr.row(), addr.column()), (MAX_ROWS, MAX_COLUMNS));

        let addr = cell("Data!b7");
        assert_eq!(addr.sheet().as_str(), "Data");
        assert_eq!((addr.row(), addr.column()), (7, 2));

        let addr = cell("'Bob''s Sheet'!C3");
        assert_eq!(addr.sheet().as_str(), "Bob's Sheet");
    }

    #[test]
    fn test_cell_reference_parse_errors() {
        assert!(CellReference::parse("", "Sheet1").is_err());
        assert!(CellReference::parse("A", "Sheet1").is_err());
        assert!(CellReference::parse("1", "Sheet1").is_err());
        assert!(CellReference::parse("A0", "Sheet1").is_err()); // Row 0 is invalid
        assert!(CellReference::parse("A1048577", "Sheet1").is_err()); // Row too large
        assert!(CellReference::parse("XFE1", "Sheet1").is_err()); // Column too large
        assert!(CellReference::parse("A1B", "Sheet1").is_err());
        assert!(CellReference::parse("'Open!A1", "Sheet1").is_err());
    }

    #[test]
    fn test_cell_reference_display() {
        assert_eq!(cell("c100").to_string(), "Sheet1!C100");
        assert_eq!(cell("$A$1").to_string(), "Sheet1!$A$1");
        assert_eq!(cell("'My Sheet'!A1").to_string(), "'My Sheet'!A1");
        assert_eq!(cell("$B7").to_a1_string(), "$B7");
    }

    #[test]
    fn test_offset() {
        let b2 = cell("B2");
        assert_eq!(b2.offset(1, 1).unwrap().to_string(), "Sheet1!C3");
        assert_eq!(b2.offset(-1, -1).unwrap().to_string(), "Sheet1!A1");
        assert!(b2.offset(-2, 0).is_err());
        assert!(b2.offset(0, -2).is_err());

        let bottom = cell(&format!("A{}", MAX_ROWS));
        assert_eq!(
            bottom.offset(1, 0),
            Err(Error::RowOutOfBounds(MAX_ROWS as i64 + 1, MAX_ROWS))
        );
    }

    #[test]
    fn test_offset_extreme_deltas() {
        let b2 = cell("B2");
        assert_eq!(
            b2.offset(i64::MAX, 0),
            Err(Error::RowOutOfBounds(i64::MAX, MAX_ROWS))
        );
        assert_eq!(
            b2.offset(0, i64::MIN),
            Err(Error::ColumnOutOfBounds(i64::MIN + 2, MAX_COLUMNS))
        );
        assert!(b2.offset(i64::MIN, i64::MAX).is_err());
    }

    #[test]
    fn test_key_ignores_absolute_flags() {
        assert_eq!(cell("$A$1").key(), cell("A1").key());
        assert!(cell("$A$1").same_cell(&cell("sheet1!A1")));
        assert_ne!(cell("$A$1"), cell("A1"));
        assert_eq!(cell("B3").key().to_string(), "Sheet1!B3");
    }
}
