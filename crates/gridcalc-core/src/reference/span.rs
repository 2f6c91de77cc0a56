//! Full-column (`A:C`) and full-row (`1:3`) references
//!
//! A span names whole columns or rows without fixing how many cells it
//! covers. Its bounds are materialized only when it is resolved, by calling
//! [`ColumnSpan::bounded`] or [`RowSpan::bounded`] with the extent the
//! resolver is willing to enumerate.

use super::address::{
    check_column, check_row, column_to_letters, letters_to_column, parse_row, shift_column,
    shift_row, split_column, split_row,
};
use super::cell::CellReference;
use super::range::RangeReference;
use super::split_sheet;
use crate::error::{Error, Result};
use crate::sheet::SheetName;
use crate::{MAX_COLUMNS, MAX_ROWS};
use std::fmt;

/// One or more whole columns (e.g. `A:A`, `$B:$D`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColumnSpan {
    sheet: SheetName,
    start: u32,
    end: u32,
    absolute_start: bool,
    absolute_end: bool,
}

impl ColumnSpan {
    /// Create a span of columns `start..=end` (1-based, any order)
    pub fn new(sheet: SheetName, start: u32, end: u32) -> Result<Self> {
        let start = check_column(start as i64)?;
        let end = check_column(end as i64)?;
        Ok(Self {
            sheet,
            start: start.min(end),
            end: start.max(end),
            absolute_start: false,
            absolute_end: false,
        })
    }

    /// Parse `A:C` style text
    pub fn parse(text: &str, default_sheet: &str) -> Result<Self> {
        Self::parse_in(text, &SheetName::new(default_sheet)?)
    }

    /// Parse `A:C` style text, defaulting to an already validated sheet name
    pub fn parse_in(text: &str, default_sheet: &SheetName) -> Result<Self> {
        let (sheet, body) = split_sheet(text.trim())?;
        Self::parse_body(body, sheet.unwrap_or_else(|| default_sheet.clone()))
    }

    pub(crate) fn parse_body(body: &str, sheet: SheetName) -> Result<Self> {
        let (first, second) = body
            .split_once(':')
            .ok_or_else(|| Error::InvalidAddress(format!("expected 'A:B' in '{}'", body)))?;
        let (abs_first, first) = column_part(first)?;
        let (abs_second, second) = column_part(second)?;

        let mut span = Self::new(sheet, first, second)?;
        (span.absolute_start, span.absolute_end) = if first <= second {
            (abs_first, abs_second)
        } else {
            (abs_second, abs_first)
        };
        Ok(span)
    }

    /// Sheet the span is on
    pub fn sheet(&self) -> &SheetName {
        &self.sheet
    }

    /// First column (1-based)
    pub fn start(&self) -> u32 {
        self.start
    }

    /// Last column (1-based)
    pub fn end(&self) -> u32 {
        self.end
    }

    /// Nominal size: every row of the sheet by the spanned columns
    pub fn dimensions(&self) -> (u32, u32) {
        (MAX_ROWS, self.end - self.start + 1)
    }

    /// Shift the span sideways
    pub fn offset(&self, d_column: i64) -> Result<Self> {
        Ok(Self {
            start: shift_column(self.start, d_column)?,
            end: shift_column(self.end, d_column)?,
            ..self.clone()
        })
    }

    /// Keep the first column and change the number of columns
    pub fn resize(&self, width: i64) -> Result<Self> {
        if width < 1 {
            return Err(Error::InvalidSize {
                height: MAX_ROWS as i64,
                width,
            });
        }
        Ok(Self {
            end: shift_column(self.start, width - 1)?,
            ..self.clone()
        })
    }

    /// Whether the cell lies in one of the spanned columns
    pub fn contains(&self, cell: &CellReference) -> bool {
        cell.sheet() == &self.sheet && (self.start..=self.end).contains(&cell.column())
    }

    /// Materialize rows `1..=rows` of the span (clamped to the sheet)
    pub fn bounded(&self, rows: u32) -> RangeReference {
        let rows = rows.clamp(1, MAX_ROWS);
        RangeReference::single(CellReference::unchecked(self.sheet.clone(), 1, self.start))
            .bounding(&RangeReference::single(CellReference::unchecked(
                self.sheet.clone(),
                rows,
                self.end,
            )))
            .unwrap_or_else(|_| {
                RangeReference::single(CellReference::unchecked(self.sheet.clone(), 1, self.start))
            })
    }

    /// Format as `A:C` without the sheet
    pub fn to_a1_string(&self) -> String {
        format!(
            "{}{}:{}{}",
            if self.absolute_start { "$" } else { "" },
            column_to_letters(self.start),
            if self.absolute_end { "$" } else { "" },
            column_to_letters(self.end)
        )
    }
}

impl fmt::Display for ColumnSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.sheet.to_prefix(), self.to_a1_string())
    }
}

/// One or more whole rows (e.g. `1:1`, `$3:$7`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RowSpan {
    sheet: SheetName,
    start: u32,
    end: u32,
    absolute_start: bool,
    absolute_end: bool,
}

impl RowSpan {
    /// Create a span of rows `start..=end` (1-based, any order)
    pub fn new(sheet: SheetName, start: u32, end: u32) -> Result<Self> {
        let start = check_row(start as i64)?;
        let end = check_row(end as i64)?;
        Ok(Self {
            sheet,
            start: start.min(end),
            end: start.max(end),
            absolute_start: false,
            absolute_end: false,
        })
    }

    /// Parse `1:3` style text
    pub fn parse(text: &str, default_sheet: &str) -> Result<Self> {
        Self::parse_in(text, &SheetName::new(default_sheet)?)
    }

    /// Parse `1:3` style text, defaulting to an already validated sheet name
    pub fn parse_in(text: &str, default_sheet: &SheetName) -> Result<Self> {
        let (sheet, body) = split_sheet(text.trim())?;
        Self::parse_body(body, sheet.unwrap_or_else(|| default_sheet.clone()))
    }

    pub(crate) fn parse_body(body: &str, sheet: SheetName) -> Result<Self> {
        let (first, second) = body
            .split_once(':')
            .ok_or_else(|| Error::InvalidAddress(format!("expected '1:2' in '{}'", body)))?;
        let (abs_first, digits) = split_row(first);
        let first = parse_row(digits)?;
        let (abs_second, digits) = split_row(second);
        let second = parse_row(digits)?;

        let mut span = Self::new(sheet, first, second)?;
        (span.absolute_start, span.absolute_end) = if first <= second {
            (abs_first, abs_second)
        } else {
            (abs_second, abs_first)
        };
        Ok(span)
    }

    /// Sheet the span is on
    pub fn sheet(&self) -> &SheetName {
        &self.sheet
    }

    /// First row (1-based)
    pub fn start(&self) -> u32 {
        self.start
    }

    /// Last row (1-based)
    pub fn end(&self) -> u32 {
        self.end
    }

    /// Nominal size: the spanned rows by every column of the sheet
    pub fn dimensions(&self) -> (u32, u32) {
        (self.end - self.start + 1, MAX_COLUMNS)
    }

    /// Shift the span up or down
    pub fn offset(&self, d_row: i64) -> Result<Self> {
        Ok(Self {
            start: shift_row(self.start, d_row)?,
            end: shift_row(self.end, d_row)?,
            ..self.clone()
        })
    }

    /// Keep the first row and change the number of rows
    pub fn resize(&self, height: i64) -> Result<Self> {
        if height < 1 {
            return Err(Error::InvalidSize {
                height,
                width: MAX_COLUMNS as i64,
            });
        }
        Ok(Self {
            end: shift_row(self.start, height - 1)?,
            ..self.clone()
        })
    }

    /// Whether the cell lies in one of the spanned rows
    pub fn contains(&self, cell: &CellReference) -> bool {
        cell.sheet() == &self.sheet && (self.start..=self.end).contains(&cell.row())
    }

    /// Materialize columns `1..=columns` of the span (clamped to the sheet)
    pub fn bounded(&self, columns: u32) -> RangeReference {
        let columns = columns.clamp(1, MAX_COLUMNS);
        RangeReference::single(CellReference::unchecked(self.sheet.clone(), self.start, 1))
            .bounding(&RangeReference::single(CellReference::unchecked(
                self.sheet.clone(),
                self.end,
                columns,
            )))
            .unwrap_or_else(|_| {
                RangeReference::single(CellReference::unchecked(self.sheet.clone(), self.start, 1))
            })
    }

    /// Format as `1:3` without the sheet
    pub fn to_a1_string(&self) -> String {
        format!(
            "{}{}:{}{}",
            if self.absolute_start { "$" } else { "" },
            self.start,
            if self.absolute_end { "$" } else { "" },
            self.end
        )
    }
}

impl fmt::Display for RowSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.sheet.to_prefix(), self.to_a1_string())
    }
}

fn column_part(text: &str) -> Result<(bool, u32)> {
    let (absolute, letters, rest) = split_column(text);
    if letters.is_empty() || !rest.is_empty() {
        return Err(Error::InvalidAddress(format!("invalid column '{}'", text)));
    }
    Ok((absolute, letters_to_column(letters)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sheet() -> SheetName {
        SheetName::default()
    }

    #[test]
    fn test_column_span_parse() {
        let span = ColumnSpan::parse("A:A", "Sheet1").unwrap();
        assert_eq!((span.start(), span.end()), (1, 1));
        assert_eq!(span.dimensions(), (MAX_ROWS, 1));
        assert_eq!(span.to_string(), "Sheet1!A:A");

        let span = ColumnSpan::parse("$D:b", "Sheet1").unwrap();
        assert_eq!((span.start(), span.end()), (2, 4));
        assert_eq!(span.to_a1_string(), "B:$D");

        assert!(ColumnSpan::parse("A1:B", "Sheet1").is_err());
        assert!(ColumnSpan::parse("A", "Sheet1").is_err());
    }

    #[test]
    fn test_row_span_parse() {
        let span = RowSpan::parse("Data!$3:$1", "Sheet1").unwrap();
        assert_eq!((span.start(), span.end()), (1, 3));
        assert_eq!(span.dimensions(), (3, MAX_COLUMNS));
        assert_eq!(span.to_string(), "Data!$1:$3");

        assert!(RowSpan::parse("0:1", "Sheet1").is_err());
    }

    #[test]
    fn test_bounded() {
        let span = ColumnSpan::new(sheet(), 2, 3).unwrap();
        assert_eq!(span.bounded(10).to_a1_string(), "B1:C10");
        assert_eq!(span.bounded(0).to_a1_string(), "B1:C1");

        let span = RowSpan::new(sheet(), 5, 5).unwrap();
        assert_eq!(span.bounded(4).to_a1_string(), "A5:D5");
    }

    #[test]
    fn test_span_offset_and_contains() {
        let span = ColumnSpan::new(sheet(), 1, 2).unwrap();
        assert_eq!(span.offset(2).unwrap().to_a1_string(), "C:D");
        assert!(span.offset(-1).is_err());
        assert_eq!(span.resize(3).unwrap().to_a1_string(), "A:C");
        assert!(span.offset(i64::MAX).is_err());
        assert!(span.resize(i64::MAX).is_err());
        assert!(RowSpan::new(sheet(), 1, 2).unwrap().offset(i64::MIN).is_err());

        let cell = CellReference::parse("B99", "Sheet1").unwrap();
        assert!(span.contains(&cell));
        assert!(!RowSpan::new(sheet(), 1, 2).unwrap().contains(&cell));
    }
}
