//! Cell storage
//!
//! The evaluator reads cells through the [`CellStore`] trait. [`Workbook`]
//! is the in-memory implementation.

mod cell;
mod names;
mod workbook;
mod worksheet;

pub use cell::Cell;
pub use names::{is_valid_name, DefinedName, DefinedNames, NameScope};
pub use workbook::Workbook;
pub use worksheet::Worksheet;

use crate::error::FormulaResult;
use gridcalc_core::{CellReference, SheetName, TypedValue};

/// Read and write access to cells
///
/// Evaluation only reads. Writes happen between evaluation passes, never
/// while an evaluator holds the store.
pub trait CellStore {
    /// The cell at `cell`, if it has been populated
    fn get_cell(&self, cell: &CellReference) -> Option<&Cell>;

    /// The store's own spelling of a sheet name, if the sheet exists
    fn resolve_sheet(&self, sheet: &SheetName) -> Option<&SheetName>;

    fn sheet_exists(&self, sheet: &SheetName) -> bool {
        self.resolve_sheet(sheet).is_some()
    }

    /// Last populated (row, column) of a sheet
    fn used_extent(&self, sheet: &SheetName) -> Option<(u32, u32)>;

    /// A defined name as seen from formulas on `sheet`
    fn defined_name(&self, _name: &str, _sheet: &SheetName) -> Option<&DefinedName> {
        None
    }

    fn set_value(&mut self, cell: &CellReference, value: TypedValue) -> FormulaResult<()>;

    /// Parse `formula` relative to the cell's sheet and store it
    fn set_formula(&mut self, cell: &CellReference, formula: &str) -> FormulaResult<()>;

    /// Record the calculated result of a formula cell
    fn set_cached_value(&mut self, cell: &CellReference, value: TypedValue) -> FormulaResult<()>;
}
