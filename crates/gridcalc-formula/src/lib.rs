//! # gridcalc-formula
//!
//! Formula parser and evaluator for gridcalc.
//!
//! This crate provides:
//! - Formula tokenizing and parsing (text → [`Expr`])
//! - An in-memory cell store ([`Workbook`]) behind the [`CellStore`] trait
//! - Formula evaluation with on-demand dependency resolution and
//!   circular-reference detection ([`Evaluator`])
//! - A registry of built-in functions, open to custom functions
//! - Dependency tracking for recalculation
//!
//! ## Example
//!
//! ```rust
//! use gridcalc_core::{CellReference, TypedValue};
//! use gridcalc_formula::{Evaluator, Workbook};
//!
//! let mut wb = Workbook::new();
//! let sheet = wb.worksheet_mut(0).unwrap();
//! sheet.set_cell_value("A1", 1).unwrap();
//! sheet.set_cell_value("A2", 2).unwrap();
//! sheet.set_cell_value("A3", 3).unwrap();
//! sheet.set_cell_formula("B1", "=SUM(A1:A3)").unwrap();
//!
//! let b1 = CellReference::parse("B1", "Sheet1").unwrap();
//! assert_eq!(Evaluator::new(&wb).evaluate(&b1), TypedValue::Number(6.0));
//! ```

pub mod ast;
pub mod config;
pub mod dependency;
pub mod error;
pub mod evaluator;
pub mod formula;
pub mod functions;
pub mod parser;
pub mod store;
pub mod tokenizer;

mod stack;

pub use ast::{BinaryOperator, Expr, UnaryOperator};
pub use config::{EvaluationConfig, FullReferencePolicy};
pub use dependency::DependencyGraph;
pub use error::{FormulaError, FormulaResult, ParseError, TokenizeError};
pub use evaluator::{EvaluationContext, Evaluator};
pub use formula::Formula;
pub use functions::{FunctionDef, FunctionImpl, FunctionRegistry};
pub use parser::{parse_formula, MAX_NESTING};
pub use store::{Cell, CellStore, DefinedName, NameScope, Workbook, Worksheet};
pub use tokenizer::{tokenize, Token, TokenKind};
