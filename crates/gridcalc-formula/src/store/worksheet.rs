//! Worksheet implementation

use super::Cell;
use crate::error::FormulaResult;
use crate::formula::Formula;
use gridcalc_core::{CellReference, Error, SheetName, TypedValue};
use std::collections::BTreeMap;

/// A worksheet: a sparse grid of cells
#[derive(Debug, Clone)]
pub struct Worksheet {
    name: SheetName,
    /// Populated cells keyed by (row, column), row-major
    cells: BTreeMap<(u32, u32), Cell>,
    /// Last populated (row, column), kept as an upper bound
    extent: Option<(u32, u32)>,
}

impl Worksheet {
    /// Create an empty worksheet
    pub fn new(name: SheetName) -> Self {
        Self {
            name,
            cells: BTreeMap::new(),
            extent: None,
        }
    }

    pub fn name(&self) -> &SheetName {
        &self.name
    }

    /// Resolve an address such as `"B2"` against this sheet
    fn address(&self, address: &str) -> FormulaResult<CellReference> {
        let cell = CellReference::parse_in(address, &self.name)?;
        if cell.sheet() != &self.name {
            return Err(
                Error::SheetMismatch(self.name.to_string(), cell.sheet().to_string()).into(),
            );
        }
        Ok(cell)
    }

    // === Cell access ===

    /// Get a cell by address (e.g. "A1")
    pub fn cell(&self, address: &str) -> FormulaResult<Option<&Cell>> {
        let cell = self.address(address)?;
        Ok(self.cell_at(cell.row(), cell.column()))
    }

    /// Get a cell by 1-based row and column
    pub fn cell_at(&self, row: u32, column: u32) -> Option<&Cell> {
        self.cells.get(&(row, column))
    }

    /// Value at an address; blank when the cell is empty or not yet calculated
    pub fn get_value(&self, address: &str) -> FormulaResult<TypedValue> {
        let cell = self.address(address)?;
        Ok(self.get_value_at(cell.row(), cell.column()))
    }

    pub fn get_value_at(&self, row: u32, column: u32) -> TypedValue {
        self.cell_at(row, column)
            .and_then(Cell::value)
            .cloned()
            .unwrap_or_default()
    }

    // === Cell modification ===

    /// Set a plain value (e.g. `set_cell_value("A1", 10)`)
    pub fn set_cell_value<V: Into<TypedValue>>(
        &mut self,
        address: &str,
        value: V,
    ) -> FormulaResult<()> {
        let cell = self.address(address)?;
        self.set_value_at(cell, value.into());
        Ok(())
    }

    /// Parse and set a formula (e.g. `set_cell_formula("A3", "=A1+A2")`)
    pub fn set_cell_formula(&mut self, address: &str, formula: &str) -> FormulaResult<()> {
        let cell = self.address(address)?;
        let formula = Formula::parse(formula, &self.name)?;
        self.set_formula_at(cell, formula);
        Ok(())
    }

    pub(crate) fn set_value_at(&mut self, address: CellReference, value: TypedValue) {
        match self.cells.get_mut(&(address.row(), address.column())) {
            Some(cell) => cell.set_value(value),
            None => {
                let address = self.normalize(address);
                self.insert(Cell::with_value(address, value));
            }
        }
    }

    pub(crate) fn set_formula_at(&mut self, address: CellReference, formula: Formula) {
        match self.cells.get_mut(&(address.row(), address.column())) {
            Some(cell) => cell.set_formula(formula),
            None => {
                let address = self.normalize(address);
                self.insert(Cell::with_formula(address, formula));
            }
        }
    }

    /// Store a calculated result; ignored for cells without a formula
    pub(crate) fn set_cached_value_at(&mut self, row: u32, column: u32, value: TypedValue) {
        if let Some(cell) = self.cells.get_mut(&(row, column)) {
            if cell.has_formula() {
                cell.set_cached_value(value);
            }
        }
    }

    /// This sheet's spelling of the name, without `$` markers
    fn normalize(&self, address: CellReference) -> CellReference {
        address
            .with_sheet(self.name.clone())
            .with_absolute(false, false)
    }

    fn insert(&mut self, cell: Cell) {
        let (row, column) = (cell.address().row(), cell.address().column());
        self.extent = Some(match self.extent {
            Some((max_row, max_column)) => (max_row.max(row), max_column.max(column)),
            None => (row, column),
        });
        self.cells.insert((row, column), cell);
    }

    /// Remove a cell; later lookups see a blank
    pub fn clear_cell(&mut self, address: &str) -> FormulaResult<()> {
        let cell = self.address(address)?;
        self.clear_cell_at(cell.row(), cell.column());
        Ok(())
    }

    pub fn clear_cell_at(&mut self, row: u32, column: u32) {
        if self.cells.remove(&(row, column)).is_some() {
            self.extent = self.compute_extent();
        }
    }

    fn compute_extent(&self) -> Option<(u32, u32)> {
        let max_row = self.cells.keys().next_back()?.0;
        let max_column = self.cells.keys().map(|&(_, column)| column).max()?;
        Some((max_row, max_column))
    }

    // === Queries ===

    /// Last populated row and column, if the sheet has any cells
    pub fn used_extent(&self) -> Option<(u32, u32)> {
        self.extent
    }

    /// All populated cells, row by row
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }

    /// Cells holding a formula, row by row
    pub fn formula_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values().filter(|cell| cell.has_formula())
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}
