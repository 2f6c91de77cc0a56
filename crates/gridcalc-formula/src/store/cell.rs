//! Cell storage

use crate::formula::Formula;
use gridcalc_core::{CellReference, TypedValue};

/// A single populated cell
///
/// A cell holds either a plain value or a formula. For a formula cell the
/// value is the result of the last calculation, if there has been one.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    address: CellReference,
    value: Option<TypedValue>,
    formula: Option<Formula>,
}

impl Cell {
    /// Create a value cell
    pub fn with_value(address: CellReference, value: TypedValue) -> Self {
        Self {
            address,
            value: Some(value),
            formula: None,
        }
    }

    /// Create a formula cell that has not been calculated yet
    pub fn with_formula(address: CellReference, formula: Formula) -> Self {
        Self {
            address,
            value: None,
            formula: Some(formula),
        }
    }

    pub fn address(&self) -> &CellReference {
        &self.address
    }

    /// Stored value, or the cached result of a formula
    pub fn value(&self) -> Option<&TypedValue> {
        self.value.as_ref()
    }

    pub fn formula(&self) -> Option<&Formula> {
        self.formula.as_ref()
    }

    pub fn has_formula(&self) -> bool {
        self.formula.is_some()
    }

    /// Replace the contents with a plain value, dropping any formula
    pub fn set_value(&mut self, value: TypedValue) {
        self.value = Some(value);
        self.formula = None;
    }

    /// Replace the contents with a formula; the old result is discarded
    pub fn set_formula(&mut self, formula: Formula) {
        self.formula = Some(formula);
        self.value = None;
    }

    /// Store a calculated result without touching the formula
    pub fn set_cached_value(&mut self, value: TypedValue) {
        self.value = Some(value);
    }
}
