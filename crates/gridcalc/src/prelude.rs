//! Prelude module - common imports for gridcalc users
//!
//! ```rust
//! use gridcalc::prelude::*;
//! ```

pub use crate::{
    // Calculation types
    CalculationOptions,
    CalculationStats,
    // References
    CellReference,
    // Store trait
    CellStore,
    ErrorKind,
    EvaluationConfig,
    Evaluator,
    FormulaError,
    FormulaResult,
    NameScope,
    RangeReference,
    Reference,
    SheetName,
    // Values
    TypedValue,
    // Main types
    Workbook,
    // Extension traits
    WorkbookCalculationExt,
    Worksheet,
};
