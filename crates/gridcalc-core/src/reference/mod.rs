//! References: addresses that point at cells without touching their data
//!
//! Every shape is an immutable value checked against the sheet limits when
//! it is built. Looking up the values behind a reference is the cell
//! store's job.

mod address;
mod cell;
mod range;
mod span;

pub use address::{column_to_letters, letters_to_column};
pub use cell::{CellKey, CellReference};
pub use range::{RangeCells, RangeReference};
pub use span::{ColumnSpan, RowSpan};

use crate::error::{Error, Result};
use crate::sheet::SheetName;
use crate::{MAX_COLUMNS, MAX_ROWS};
use address::{check_column, check_row};
use std::fmt;

/// Any reference a formula can name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Reference {
    /// `B2`
    Cell(CellReference),
    /// `A1:C3`
    Range(RangeReference),
    /// `A:C`
    Columns(ColumnSpan),
    /// `1:3`
    Rows(RowSpan),
}

impl Reference {
    /// Parse any A1-style reference
    ///
    /// ```
    /// use gridcalc_core::Reference;
    ///
    /// assert!(matches!(Reference::parse("B2", "Sheet1"), Ok(Reference::Cell(_))));
    /// assert!(matches!(Reference::parse("A1:B2", "Sheet1"), Ok(Reference::Range(_))));
    /// assert!(matches!(Reference::parse("'My Data'!$A:$A", "Sheet1"), Ok(Reference::Columns(_))));
    /// assert!(matches!(Reference::parse("3:5", "Sheet1"), Ok(Reference::Rows(_))));
    /// ```
    pub fn parse(text: &str, default_sheet: &str) -> Result<Self> {
        Self::parse_in(text, &SheetName::new(default_sheet)?)
    }

    /// Parse any A1-style reference, defaulting to an already validated sheet name
    pub fn parse_in(text: &str, default_sheet: &SheetName) -> Result<Self> {
        let (sheet, body) = split_sheet(text.trim())?;
        let sheet = sheet.unwrap_or_else(|| default_sheet.clone());

        let Some((first, second)) = body.split_once(':') else {
            return Ok(Reference::Cell(CellReference::parse_a1(body, sheet)?));
        };

        match Part::classify(first) {
            Part::Column => Ok(Reference::Columns(ColumnSpan::parse_body(body, sheet)?)),
            Part::Row => Ok(Reference::Rows(RowSpan::parse_body(body, sheet)?)),
            Part::Cell => {
                let start = CellReference::parse_a1(first, sheet.clone())?;
                let end = CellReference::parse_in(second, &sheet)?;
                Ok(Reference::Range(RangeReference::new(start, end)?))
            }
        }
    }

    /// Wrap a range, collapsing a single cell to [`Reference::Cell`]
    pub fn from_range(range: RangeReference) -> Self {
        if range.is_single_cell() {
            Reference::Cell(range.start().clone())
        } else {
            Reference::Range(range)
        }
    }

    /// Sheet the reference points into
    pub fn sheet(&self) -> &SheetName {
        match self {
            Reference::Cell(cell) => cell.sheet(),
            Reference::Range(range) => range.sheet(),
            Reference::Columns(span) => span.sheet(),
            Reference::Rows(span) => span.sheet(),
        }
    }

    /// Nominal rows and columns (spans count the whole sheet dimension)
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Reference::Cell(_) => (1, 1),
            Reference::Range(range) => range.dimensions(),
            Reference::Columns(span) => span.dimensions(),
            Reference::Rows(span) => span.dimensions(),
        }
    }

    /// Top-left cell
    pub fn top_left(&self) -> CellReference {
        match self {
            Reference::Cell(cell) => cell.clone(),
            Reference::Range(range) => range.start().clone(),
            Reference::Columns(span) => {
                CellReference::unchecked(span.sheet().clone(), 1, span.start())
            }
            Reference::Rows(span) => {
                CellReference::unchecked(span.sheet().clone(), span.start(), 1)
            }
        }
    }

    /// Whether the reference names exactly one cell
    pub fn is_single_cell(&self) -> bool {
        match self {
            Reference::Cell(_) => true,
            Reference::Range(range) => range.is_single_cell(),
            Reference::Columns(_) | Reference::Rows(_) => false,
        }
    }

    /// Shift the reference; fails if any part leaves the sheet
    ///
    /// Column spans cannot move vertically and row spans cannot move
    /// sideways, since they already cover the whole dimension.
    pub fn offset(&self, d_row: i64, d_column: i64) -> Result<Self> {
        match self {
            Reference::Cell(cell) => Ok(Reference::Cell(cell.offset(d_row, d_column)?)),
            Reference::Range(range) => Ok(Reference::Range(range.offset(d_row, d_column)?)),
            Reference::Columns(span) => {
                if d_row != 0 {
                    return Err(Error::RowOutOfBounds(
                        if d_row > 0 {
                            (MAX_ROWS as i64).saturating_add(d_row)
                        } else {
                            d_row.saturating_add(1)
                        },
                        MAX_ROWS,
                    ));
                }
                Ok(Reference::Columns(span.offset(d_column)?))
            }
            Reference::Rows(span) => {
                if d_column != 0 {
                    return Err(Error::ColumnOutOfBounds(
                        if d_column > 0 {
                            (MAX_COLUMNS as i64).saturating_add(d_column)
                        } else {
                            d_column.saturating_add(1)
                        },
                        MAX_COLUMNS,
                    ));
                }
                Ok(Reference::Rows(span.offset(d_row)?))
            }
        }
    }

    /// Keep the top-left cell and change the size
    ///
    /// A span keeps its shape when the spanned dimension is left at the
    /// sheet limit; otherwise it becomes an ordinary range.
    pub fn resize(&self, height: i64, width: i64) -> Result<Self> {
        match self {
            Reference::Columns(span) if height == MAX_ROWS as i64 => {
                Ok(Reference::Columns(span.resize(width)?))
            }
            Reference::Rows(span) if width == MAX_COLUMNS as i64 => {
                Ok(Reference::Rows(span.resize(height)?))
            }
            _ => Ok(Self::from_range(
                RangeReference::single(self.top_left()).resize(height, width)?,
            )),
        }
    }

    /// The rectangle this reference covers at the sheet limits
    pub fn to_range(&self) -> RangeReference {
        match self {
            Reference::Cell(cell) => RangeReference::single(cell.clone()),
            Reference::Range(range) => range.clone(),
            Reference::Columns(span) => span.bounded(MAX_ROWS),
            Reference::Rows(span) => span.bounded(MAX_COLUMNS),
        }
    }

    /// Whether the cell lies inside the reference
    pub fn contains(&self, cell: &CellReference) -> bool {
        match self {
            Reference::Cell(c) => c.same_cell(cell),
            Reference::Range(range) => range.contains(cell),
            Reference::Columns(span) => span.contains(cell),
            Reference::Rows(span) => span.contains(cell),
        }
    }

    /// Format without the sheet prefix
    pub fn to_a1_string(&self) -> String {
        match self {
            Reference::Cell(cell) => cell.to_a1_string(),
            Reference::Range(range) => range.to_a1_string(),
            Reference::Columns(span) => span.to_a1_string(),
            Reference::Rows(span) => span.to_a1_string(),
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.sheet().to_prefix(), self.to_a1_string())
    }
}

impl From<CellReference> for Reference {
    fn from(cell: CellReference) -> Self {
        Reference::Cell(cell)
    }
}

impl From<RangeReference> for Reference {
    fn from(range: RangeReference) -> Self {
        Reference::Range(range)
    }
}

impl From<ColumnSpan> for Reference {
    fn from(span: ColumnSpan) -> Self {
        Reference::Columns(span)
    }
}

impl From<RowSpan> for Reference {
    fn from(span: RowSpan) -> Self {
        Reference::Rows(span)
    }
}

/// Shape of one side of an `x:y` pair
enum Part {
    Cell,
    Column,
    Row,
}

impl Part {
    fn classify(text: &str) -> Part {
        let text = text.strip_prefix('$').unwrap_or(text);
        if !text.is_empty() && text.bytes().all(|b| b.is_ascii_alphabetic()) {
            Part::Column
        } else if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
            Part::Row
        } else {
            Part::Cell
        }
    }
}

/// Split an optional `Sheet!` or `'Quoted Sheet'!` prefix from an address
///
/// Only the part before the first `:` is searched, so the second corner of
/// a range may carry its own prefix.
pub(crate) fn split_sheet(text: &str) -> Result<(Option<SheetName>, &str)> {
    if let Some(rest) = text.strip_prefix('\'') {
        let mut name = String::new();
        let mut chars = rest.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            if c != '\'' {
                name.push(c);
                continue;
            }
            if matches!(chars.peek(), Some((_, '\''))) {
                chars.next();
                name.push('\'');
                continue;
            }
            let body = rest[i + 1..].strip_prefix('!').ok_or_else(|| {
                Error::InvalidAddress(format!("expected '!' after sheet name in '{}'", text))
            })?;
            return Ok((Some(SheetName::new(name)?), body));
        }
        return Err(Error::InvalidAddress(format!(
            "unterminated sheet name in '{}'",
            text
        )));
    }

    let head = text.split(':').next().unwrap_or(text);
    match head.find('!') {
        Some(i) => Ok((Some(SheetName::new(&text[..i])?), &text[i + 1..])),
        None => Ok((None, text)),
    }
}

/// Parse an R1C1-style reference relative to `origin`
///
/// `R2C3` is absolute, `R[-1]C[2]` is relative to `origin`, a bare `R` or
/// `C` means the origin's own row or column. `R2` and `C3` alone name whole
/// rows and columns.
///
/// ```
/// use gridcalc_core::{parse_r1c1, CellReference};
///
/// let origin = CellReference::parse("C5", "Sheet1").unwrap();
/// let target = parse_r1c1("R[-1]C[2]", &origin).unwrap();
/// assert_eq!(target.to_string(), "Sheet1!E4");
/// ```
pub fn parse_r1c1(text: &str, origin: &CellReference) -> Result<Reference> {
    let (sheet, body) = split_sheet(text.trim())?;
    let sheet = sheet.unwrap_or_else(|| origin.sheet().clone());

    let Some((first, second)) = body.split_once(':') else {
        let part = R1c1Part::parse(body, origin)?;
        return part.into_reference(sheet, body);
    };

    let start = R1c1Part::parse(first, origin)?;
    let end = R1c1Part::parse(second, origin)?;
    match (start.row, start.column, end.row, end.column) {
        (Some(r1), Some(c1), Some(r2), Some(c2)) => {
            let start = CellReference::new(sheet.clone(), r1.index, c1.index)?
                .with_absolute(r1.absolute, c1.absolute);
            let end = CellReference::new(sheet, r2.index, c2.index)?
                .with_absolute(r2.absolute, c2.absolute);
            Ok(Reference::Range(RangeReference::new(start, end)?))
        }
        (Some(r1), None, Some(r2), None) => {
            Ok(Reference::Rows(RowSpan::new(sheet, r1.index, r2.index)?))
        }
        (None, Some(c1), None, Some(c2)) => {
            Ok(Reference::Columns(ColumnSpan::new(sheet, c1.index, c2.index)?))
        }
        _ => Err(Error::InvalidAddress(format!(
            "mismatched R1C1 range '{}'",
            body
        ))),
    }
}

#[derive(Clone, Copy)]
struct Axis {
    index: u32,
    absolute: bool,
}

struct R1c1Part {
    row: Option<Axis>,
    column: Option<Axis>,
}

impl R1c1Part {
    fn parse(text: &str, origin: &CellReference) -> Result<Self> {
        let invalid = || Error::InvalidAddress(format!("invalid R1C1 reference '{}'", text));

        let mut rest = text;
        let mut row = None;
        let mut column = None;

        if let Some(after) = rest.strip_prefix(['R', 'r']) {
            let (value, absolute, after) = axis(after, origin.row()).ok_or_else(invalid)?;
            row = Some(Axis {
                index: check_row(value)?,
                absolute,
            });
            rest = after;
        }
        if let Some(after) = rest.strip_prefix(['C', 'c']) {
            let (value, absolute, after) = axis(after, origin.column()).ok_or_else(invalid)?;
            column = Some(Axis {
                index: check_column(value)?,
                absolute,
            });
            rest = after;
        }

        if !rest.is_empty() || (row.is_none() && column.is_none()) {
            return Err(invalid());
        }
        Ok(Self { row, column })
    }

    fn into_reference(self, sheet: SheetName, text: &str) -> Result<Reference> {
        match (self.row, self.column) {
            (Some(row), Some(column)) => Ok(Reference::Cell(
                CellReference::new(sheet, row.index, column.index)?
                    .with_absolute(row.absolute, column.absolute),
            )),
            (Some(row), None) => Ok(Reference::Rows(RowSpan::new(sheet, row.index, row.index)?)),
            (None, Some(column)) => Ok(Reference::Columns(ColumnSpan::new(
                sheet,
                column.index,
                column.index,
            )?)),
            (None, None) => Err(Error::InvalidAddress(format!(
                "invalid R1C1 reference '{}'",
                text
            ))),
        }
    }
}

/// Read `[n]`, `n`, or nothing after an `R`/`C` marker
fn axis(text: &str, base: u32) -> Option<(i64, bool, &str)> {
    if let Some(inner) = text.strip_prefix('[') {
        let close = inner.find(']')?;
        let delta: i64 = inner[..close].parse().ok()?;
        return Some((i64::from(base).checked_add(delta)?, false, &inner[close + 1..]));
    }

    let end = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    if end == 0 {
        return Some((base as i64, false, text));
    }
    let value: i64 = text[..end].parse().ok()?;
    Some((value, true, &text[end..]))
}
