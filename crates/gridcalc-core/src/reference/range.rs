//! Rectangular range references

use super::cell::CellReference;
use super::split_sheet;
use crate::error::{Error, Result};
use crate::sheet::SheetName;
use std::fmt;

/// A rectangular range of cells (e.g. `A1:B10`)
///
/// Both corners are on the same sheet and the range is normalized so that
/// `start` is the top-left corner and `end` the bottom-right.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RangeReference {
    start: CellReference,
    end: CellReference,
}

impl RangeReference {
    /// Create a range from two corners given in any order
    pub fn new(start: CellReference, end: CellReference) -> Result<Self> {
        if start.sheet() != end.sheet() {
            return Err(Error::SheetMismatch(
                start.sheet().to_string(),
                end.sheet().to_string(),
            ));
        }

        // Swap coordinates (and their $ flags) so start is top-left
        let (top, top_abs, bottom, bottom_abs) = if start.row() <= end.row() {
            (start.row(), start.absolute_row(), end.row(), end.absolute_row())
        } else {
            (end.row(), end.absolute_row(), start.row(), start.absolute_row())
        };
        let (left, left_abs, right, right_abs) = if start.column() <= end.column() {
            (
                start.column(),
                start.absolute_column(),
                end.column(),
                end.absolute_column(),
            )
        } else {
            (
                end.column(),
                end.absolute_column(),
                start.column(),
                start.absolute_column(),
            )
        };

        let sheet = start.sheet().clone();
        Ok(Self {
            start: CellReference::unchecked(sheet.clone(), top, left)
                .with_absolute(top_abs, left_abs),
            end: CellReference::unchecked(sheet, bottom, right)
                .with_absolute(bottom_abs, right_abs),
        })
    }

    /// Create a single-cell range
    pub fn single(cell: CellReference) -> Self {
        Self {
            start: cell.clone(),
            end: cell,
        }
    }

    /// Create a range from 1-based bounds, checking them against the sheet limits
    pub fn from_bounds(
        sheet: SheetName,
        top: u32,
        left: u32,
        bottom: u32,
        right: u32,
    ) -> Result<Self> {
        Self::new(
            CellReference::new(sheet.clone(), top, left)?,
            CellReference::new(sheet, bottom, right)?,
        )
    }

    /// Parse a range from `A1:B10` notation; a lone address is a 1x1 range
    ///
    /// ```
    /// use gridcalc_core::RangeReference;
    ///
    /// let range = RangeReference::parse("Sheet2!C3:A1", "Sheet1").unwrap();
    /// assert_eq!(range.to_string(), "Sheet2!A1:C3");
    /// assert_eq!(range.dimensions(), (3, 3));
    /// ```
    pub fn parse(text: &str, default_sheet: &str) -> Result<Self> {
        Self::parse_in(text, &SheetName::new(default_sheet)?)
    }

    /// Parse a range, defaulting to an already validated sheet name
    pub fn parse_in(text: &str, default_sheet: &SheetName) -> Result<Self> {
        let text = text.trim();
        let (sheet, body) = split_sheet(text)?;
        let sheet = sheet.unwrap_or_else(|| default_sheet.clone());

        match body.split_once(':') {
            Some((first, second)) => {
                let start = CellReference::parse_a1(first, sheet.clone())?;
                let end = CellReference::parse_in(second, &sheet)?;
                Self::new(start, end)
            }
            None => Ok(Self::single(CellReference::parse_a1(body, sheet)?)),
        }
    }

    /// Top-left corner
    pub fn start(&self) -> &CellReference {
        &self.start
    }

    /// Bottom-right corner
    pub fn end(&self) -> &CellReference {
        &self.end
    }

    /// Sheet the range is on
    pub fn sheet(&self) -> &SheetName {
        self.start.sheet()
    }

    /// Number of rows and columns
    pub fn dimensions(&self) -> (u32, u32) {
        (
            self.end.row() - self.start.row() + 1,
            self.end.column() - self.start.column() + 1,
        )
    }

    /// Total number of cells
    pub fn cell_count(&self) -> u64 {
        let (rows, columns) = self.dimensions();
        rows as u64 * columns as u64
    }

    /// Whether the range covers exactly one cell
    pub fn is_single_cell(&self) -> bool {
        self.start.same_cell(&self.end)
    }

    /// Shift the whole range; fails if any corner leaves the sheet
    pub fn offset(&self, d_row: i64, d_column: i64) -> Result<Self> {
        Ok(Self {
            start: self.start.offset(d_row, d_column)?,
            end: self.end.offset(d_row, d_column)?,
        })
    }

    /// Keep the top-left corner and change the size
    pub fn resize(&self, height: i64, width: i64) -> Result<Self> {
        if height < 1 || width < 1 {
            return Err(Error::InvalidSize { height, width });
        }
        let end = self.start.offset(height - 1, width - 1)?.with_absolute(
            self.end.absolute_row(),
            self.end.absolute_column(),
        );
        Ok(Self {
            start: self.start.clone(),
            end,
        })
    }

    /// Cell at a 0-based position inside the range
    ///
    /// Bounds are checked against the range, not the whole sheet.
    pub fn cell_at(&self, row_offset: u32, column_offset: u32) -> Result<CellReference> {
        let (rows, columns) = self.dimensions();
        if row_offset >= rows || column_offset >= columns {
            return Err(Error::OutsideRange {
                row: row_offset,
                column: column_offset,
                rows,
                columns,
            });
        }
        Ok(CellReference::unchecked(
            self.sheet().clone(),
            self.start.row() + row_offset,
            self.start.column() + column_offset,
        ))
    }

    /// Check if a cell is within this range
    pub fn contains(&self, cell: &CellReference) -> bool {
        cell.sheet() == self.sheet()
            && cell.row() >= self.start.row()
            && cell.row() <= self.end.row()
            && cell.column() >= self.start.column()
            && cell.column() <= self.end.column()
    }

    /// Get the intersection of two ranges, if any
    pub fn intersect(&self, other: &RangeReference) -> Option<RangeReference> {
        if self.sheet() != other.sheet()
            || self.start.row() > other.end.row()
            || self.end.row() < other.start.row()
            || self.start.column() > other.end.column()
            || self.end.column() < other.start.column()
        {
            return None;
        }

        let sheet = self.sheet().clone();
        Some(Self {
            start: CellReference::unchecked(
                sheet.clone(),
                self.start.row().max(other.start.row()),
                self.start.column().max(other.start.column()),
            ),
            end: CellReference::unchecked(
                sheet,
                self.end.row().min(other.end.row()),
                self.end.column().min(other.end.column()),
            ),
        })
    }

    /// Smallest range covering both ranges
    pub fn bounding(&self, other: &RangeReference) -> Result<RangeReference> {
        if self.sheet() != other.sheet() {
            return Err(Error::SheetMismatch(
                self.sheet().to_string(),
                other.sheet().to_string(),
            ));
        }

        let sheet = self.sheet().clone();
        Ok(Self {
            start: CellReference::unchecked(
                sheet.clone(),
                self.start.row().min(other.start.row()),
                self.start.column().min(other.start.column()),
            ),
            end: CellReference::unchecked(
                sheet,
                self.end.row().max(other.end.row()),
                self.end.column().max(other.end.column()),
            ),
        })
    }

    /// Iterate over all cells in the range (row by row)
    pub fn cells(&self) -> RangeCells {
        RangeCells {
            range: self.clone(),
            row: self.start.row(),
            column: self.start.column(),
        }
    }

    /// Format as `A1:B10` without the sheet
    pub fn to_a1_string(&self) -> String {
        format!("{}:{}", self.start.to_a1_string(), self.end.to_a1_string())
    }
}

impl fmt::Display for RangeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.sheet().to_prefix(), self.to_a1_string())
    }
}

/// Iterator over cells in a range
pub struct RangeCells {
    range: RangeReference,
    row: u32,
    column: u32,
}

impl Iterator for RangeCells {
    type Item = CellReference;

    fn next(&mut self) -> Option<Self::Item> {
        if self.row > self.range.end.row() {
            return None;
        }

        let cell = CellReference::unchecked(self.range.sheet().clone(), self.row, self.column);

        // Move to next cell
        self.column += 1;
        if self.column > self.range.end.column() {
            self.column = self.range.start.column();
            self.row += 1;
        }

        Some(cell)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.row > self.range.end.row() {
            return (0, Some(0));
        }
        let (_, columns) = self.range.dimensions();
        let full_rows = (self.range.end.row() - self.row) as u64;
        let in_row = (self.range.end.column() - self.column + 1) as u64;
        let remaining = (full_rows * columns as u64 + in_row) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for RangeCells {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn range(text: &str) -> RangeReference {
        RangeReference::parse(text, "Sheet1").unwrap()
    }

    fn cell(text: &str) -> CellReference {
        CellReference::parse(text, "Sheet1").unwrap()
    }

    #[test]
    fn test_range_parse() {
        let r = range("A1:B2");
        assert_eq!(r.start(), &cell("A1"));
        assert_eq!(r.end(), &cell("B2"));

        // Single cell
        let r = range("C3");
        assert!(r.is_single_cell());
        assert_eq!(r.to_string(), "Sheet1!C3:C3");

        // Corners on the same explicit sheet
        let r = range("Data!A1:Data!B2");
        assert_eq!(r.sheet().as_str(), "Data");

        assert!(RangeReference::parse("Data!A1:Other!B2", "Sheet1").is_err());
    }

    #[test]
    fn test_range_normalization() {
        let r = range("$C$3:A1");
        assert_eq!(r.to_a1_string(), "A1:$C$3");

        let r = range("C1:A3");
        assert_eq!(r.to_a1_string(), "A1:C3");
        assert_eq!(r.dimensions(), (3, 3));
    }

    #[test]
    fn test_range_contains() {
        let r = range("B2:D4");

        assert!(r.contains(&cell("B2")));
        assert!(r.contains(&cell("D4")));
        assert!(r.contains(&cell("C3")));

        assert!(!r.contains(&cell("A1")));
        assert!(!r.contains(&cell("B5")));
        assert!(!r.contains(&cell("Other!C3")));
    }

    #[test]
    fn test_range_iterator() {
        let cells: Vec<_> = range("A1:B2").cells().collect();

        assert_eq!(
            cells,
            vec![cell("A1"), cell("B1"), cell("A2"), cell("B2")]
        );
        assert_eq!(range("A1:C5").cells().len(), 15);
    }

    #[test]
    fn test_offset_and_resize() {
        let r = range("A1:B2");
        assert_eq!(r.offset(2, 1).unwrap().to_a1_string(), "B3:C4");
        assert!(r.offset(-1, 0).is_err());

        assert_eq!(r.resize(3, 1).unwrap().to_a1_string(), "A1:A3");
        assert_eq!(
            r.resize(0, 2),
            Err(Error::InvalidSize {
                height: 0,
                width: 2
            })
        );
        assert!(range("A1048576").resize(2, 1).is_err());
        assert!(r.resize(i64::MAX, i64::MAX).is_err());
        assert!(r.offset(i64::MIN, 0).is_err());
    }

    #[test]
    fn test_cell_at() {
        let r = range("B2:D4");
        assert_eq!(r.cell_at(0, 0).unwrap(), cell("B2"));
        assert_eq!(r.cell_at(2, 1).unwrap(), cell("C4"));
        assert!(matches!(r.cell_at(3, 0), Err(Error::OutsideRange { .. })));
        assert!(r.cell_at(0, 3).is_err());
    }

    #[test]
    fn test_intersect_and_bounding() {
        let a = range("A1:C3");
        let b = range("B2:D4");
        assert_eq!(a.intersect(&b).unwrap().to_a1_string(), "B2:C3");
        assert_eq!(a.intersect(&range("E5:F6")), None);
        assert_eq!(a.bounding(&b).unwrap().to_a1_string(), "A1:D4");
        assert!(a.bounding(&range("Other!A1:A2")).is_err());
    }
}
