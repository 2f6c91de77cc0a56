//! # gridcalc
//!
//! A spreadsheet formula engine: cells, formulas, references and
//! recalculation, without any file format attached.
//!
//! ## Features
//!
//! - A1 and R1C1 references, ranges, whole rows and columns, unions and
//!   intersections
//! - Formula parsing with operator precedence matching spreadsheet rules
//! - Lazy evaluation with circular-reference detection
//! - Reference functions (`OFFSET`, `INDEX`, `INDIRECT`) that produce
//!   references at evaluation time
//! - Defined names at workbook and sheet scope
//! - Whole-workbook and incremental recalculation, optionally in parallel
//!
//! ## Example
//!
//! ```rust
//! use gridcalc::prelude::*;
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//!
//! sheet.set_cell_value("A1", 3).unwrap();
//! sheet.set_cell_value("A2", 4).unwrap();
//! sheet.set_cell_formula("B1", "=SUM(A1:A2)*2").unwrap();
//!
//! workbook.calculate().unwrap();
//! assert_eq!(
//!     workbook.worksheet(0).unwrap().get_value("B1").unwrap(),
//!     TypedValue::Number(14.0)
//! );
//! ```

pub mod calculation;
pub mod prelude;

// Re-export calculation types
pub use calculation::{
    CalculationEngine, CalculationOptions, CalculationStats, WorkbookCalculationExt,
};

// Re-export core types
pub use gridcalc_core::{
    compare_values, format_number, parse_number, parse_r1c1, CellKey, CellReference, ColumnSpan,
    Error, ErrorKind, RangeReference, Reference, Result, RowSpan, SheetName, TypedValue,
    CIRCULAR_REFERENCE, MAX_COLUMNS, MAX_ROWS,
};

// Re-export formula types
pub use gridcalc_formula::{
    parse_formula, Cell, CellStore, DefinedName, DependencyGraph, EvaluationConfig,
    EvaluationContext, Evaluator, Expr, Formula, FormulaError, FormulaResult, FullReferencePolicy,
    FunctionDef, FunctionRegistry, NameScope, Workbook, Worksheet,
};
