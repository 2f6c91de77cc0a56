//! Workbook type - the in-memory cell store

use super::names::{DefinedName, DefinedNames, NameScope};
use super::{Cell, CellStore, Worksheet};
use crate::error::FormulaResult;
use crate::formula::Formula;
use gridcalc_core::{CellReference, Error, SheetName, TypedValue};

/// A workbook: ordered worksheets plus defined names
#[derive(Debug, Clone)]
pub struct Workbook {
    worksheets: Vec<Worksheet>,
    names: DefinedNames,
}

impl Workbook {
    /// Create a workbook with one empty worksheet named `Sheet1`
    pub fn new() -> Self {
        Self {
            worksheets: vec![Worksheet::new(SheetName::default())],
            names: DefinedNames::new(),
        }
    }

    /// Create a workbook with no worksheets
    pub fn empty() -> Self {
        Self {
            worksheets: Vec::new(),
            names: DefinedNames::new(),
        }
    }

    pub fn sheet_count(&self) -> usize {
        self.worksheets.len()
    }

    pub fn worksheet(&self, index: usize) -> Option<&Worksheet> {
        self.worksheets.get(index)
    }

    pub fn worksheet_mut(&mut self, index: usize) -> Option<&mut Worksheet> {
        self.worksheets.get_mut(index)
    }

    /// Get a worksheet by name, ignoring case
    pub fn worksheet_by_name(&self, name: &str) -> Option<&Worksheet> {
        self.sheet_index(name).and_then(|index| self.worksheets.get(index))
    }

    pub fn worksheet_by_name_mut(&mut self, name: &str) -> Option<&mut Worksheet> {
        self.sheet_index(name)
            .and_then(move |index| self.worksheets.get_mut(index))
    }

    /// Position of a worksheet, ignoring case
    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        let name = SheetName::new(name).ok()?;
        self.position(&name)
    }

    fn position(&self, name: &SheetName) -> Option<usize> {
        self.worksheets.iter().position(|ws| ws.name() == name)
    }

    pub fn worksheets(&self) -> impl Iterator<Item = &Worksheet> {
        self.worksheets.iter()
    }

    /// Append a worksheet; names must be unique regardless of case
    pub fn add_worksheet(&mut self, name: &str) -> FormulaResult<usize> {
        let name = SheetName::new(name)?;
        if self.position(&name).is_some() {
            return Err(Error::DuplicateSheetName(name.to_string()).into());
        }
        self.worksheets.push(Worksheet::new(name));
        Ok(self.worksheets.len() - 1)
    }

    fn sheet_for(&self, cell: &CellReference) -> FormulaResult<usize> {
        self.position(cell.sheet())
            .ok_or_else(|| Error::SheetNotFound(cell.sheet().to_string()).into())
    }

    /// Value of a cell; blank when it is empty or not yet calculated
    pub fn value(&self, cell: &CellReference) -> TypedValue {
        self.get_cell(cell)
            .and_then(Cell::value)
            .cloned()
            .unwrap_or_default()
    }

    /// Every formula cell, sheet by sheet, row by row
    pub fn formula_cells(&self) -> Vec<CellReference> {
        self.worksheets
            .iter()
            .flat_map(Worksheet::formula_cells)
            .map(|cell| cell.address().clone())
            .collect()
    }

    // === Defined names ===

    /// Define a name
    ///
    /// `refers_to` is formula text, with or without the leading `=`.
    /// Unqualified references in it resolve against the scoped sheet, or the
    /// first worksheet for workbook-scoped names.
    ///
    /// # Example
    /// ```
    /// use gridcalc_formula::{NameScope, Workbook};
    ///
    /// let mut wb = Workbook::new();
    /// wb.define_name("TaxRate", NameScope::Workbook, "=Sheet1!$B$1").unwrap();
    /// ```
    pub fn define_name(
        &mut self,
        name: &str,
        scope: NameScope,
        refers_to: &str,
    ) -> FormulaResult<()> {
        let sheet = match &scope {
            NameScope::Sheet(sheet) => {
                let index = self
                    .position(sheet)
                    .ok_or_else(|| Error::SheetNotFound(sheet.to_string()))?;
                self.worksheets[index].name().clone()
            }
            NameScope::Workbook => self
                .worksheets
                .first()
                .map(|ws| ws.name().clone())
                .unwrap_or_default(),
        };
        let formula = Formula::parse(refers_to, &sheet)?;
        self.names.define(DefinedName::new(name, scope, formula)?)?;
        Ok(())
    }

    /// Look up a name as seen from `sheet`
    pub fn get_defined_name(&self, name: &str, sheet: &SheetName) -> Option<&DefinedName> {
        self.names.get(name, sheet)
    }

    pub fn remove_name(&mut self, name: &str, scope: &NameScope) -> Option<DefinedName> {
        self.names.remove(name, scope)
    }

    pub fn defined_names(&self) -> &DefinedNames {
        &self.names
    }
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

impl CellStore for Workbook {
    fn get_cell(&self, cell: &CellReference) -> Option<&Cell> {
        let index = self.position(cell.sheet())?;
        self.worksheets[index].cell_at(cell.row(), cell.column())
    }

    fn resolve_sheet(&self, sheet: &SheetName) -> Option<&SheetName> {
        self.position(sheet).map(|index| self.worksheets[index].name())
    }

    fn used_extent(&self, sheet: &SheetName) -> Option<(u32, u32)> {
        let index = self.position(sheet)?;
        self.worksheets[index].used_extent()
    }

    fn defined_name(&self, name: &str, sheet: &SheetName) -> Option<&DefinedName> {
        self.names.get(name, sheet)
    }

    fn set_value(&mut self, cell: &CellReference, value: TypedValue) -> FormulaResult<()> {
        let index = self.sheet_for(cell)?;
        self.worksheets[index].set_value_at(cell.clone(), value);
        Ok(())
    }

    fn set_formula(&mut self, cell: &CellReference, formula: &str) -> FormulaResult<()> {
        let index = self.sheet_for(cell)?;
        let worksheet = &mut self.worksheets[index];
        let formula = Formula::parse(formula, worksheet.name())?;
        worksheet.set_formula_at(cell.clone(), formula);
        Ok(())
    }

    fn set_cached_value(&mut self, cell: &CellReference, value: TypedValue) -> FormulaResult<()> {
        let index = self.sheet_for(cell)?;
        self.worksheets[index].set_cached_value_at(cell.row(), cell.column(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn at(text: &str) -> CellReference {
        CellReference::parse(text, "Sheet1").unwrap()
    }

    #[test]
    fn test_new_workbook() {
        let wb = Workbook::new();
        assert_eq!(wb.sheet_count(), 1);
        assert_eq!(wb.worksheet(0).unwrap().name().as_str(), "Sheet1");
        assert_eq!(Workbook::empty().sheet_count(), 0);
    }

    #[test]
    fn test_sheet_names_ignore_case() {
        let mut wb = Workbook::new();
        assert_eq!(wb.add_worksheet("Data").unwrap(), 1);
        assert_eq!(wb.sheet_index("DATA"), Some(1));
        assert!(matches!(
            wb.add_worksheet("data"),
            Err(crate::FormulaError::Core(Error::DuplicateSheetName(_)))
        ));

        let spelled = SheetName::new("dAtA").unwrap();
        assert_eq!(wb.resolve_sheet(&spelled).unwrap().as_str(), "Data");
    }

    #[test]
    fn test_cell_store_writes() {
        let mut wb = Workbook::new();
        wb.set_value(&at("A1"), TypedValue::Number(5.0)).unwrap();
        wb.set_formula(&at("A2"), "=A1*2").unwrap();

        assert_eq!(wb.value(&at("A1")), TypedValue::Number(5.0));
        assert!(wb.get_cell(&at("A2")).unwrap().has_formula());
        assert_eq!(wb.formula_cells(), vec![at("A2")]);

        wb.set_cached_value(&at("A2"), TypedValue::Number(10.0)).unwrap();
        assert_eq!(wb.value(&at("A2")), TypedValue::Number(10.0));

        let missing = CellReference::parse("Nope!A1", "Sheet1").unwrap();
        assert!(wb.set_value(&missing, TypedValue::Blank).is_err());
        assert_eq!(wb.used_extent(&SheetName::default()), Some((2, 1)));
    }

    #[test]
    fn test_define_name() {
        let mut wb = Workbook::new();
        wb.add_worksheet("Data").unwrap();
        wb.define_name("Rate", NameScope::Workbook, "=$B$1").unwrap();
        let data = NameScope::Sheet(SheetName::new("data").unwrap());
        wb.define_name("Rate", data, "=0.5").unwrap();

        let global = wb.get_defined_name("rate", &SheetName::default()).unwrap();
        assert_eq!(global.formula().to_string(), "=Sheet1!$B$1");

        let local = wb
            .get_defined_name("RATE", &SheetName::new("Data").unwrap())
            .unwrap();
        assert_eq!(local.formula().to_string(), "=0.5");

        assert!(wb.define_name("Rate", NameScope::Workbook, "=1").is_err());
        assert!(wb.define_name("A1", NameScope::Workbook, "=1").is_err());
        let missing = NameScope::Sheet(SheetName::new("Missing").unwrap());
        assert!(wb.define_name("X", missing, "=1").is_err());
    }
}
