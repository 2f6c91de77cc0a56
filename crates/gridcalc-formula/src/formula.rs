//! Parsed formulas

use crate::ast::Expr;
use crate::error::FormulaResult;
use crate::functions::FunctionRegistry;
use crate::parser::parse_with;
use crate::tokenizer::tokenize;
use gridcalc_core::{Reference, SheetName};
use std::fmt;

/// Formula text together with its parsed AST
///
/// The AST and the references it mentions are derived once when the formula
/// is parsed; editing a cell's formula replaces the whole `Formula`.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source_text: String,
    sheet_context: SheetName,
    ast: Expr,
    references: Vec<Reference>,
}

impl Formula {
    /// Parse `text` (with or without a leading `=`) for a cell on `sheet`
    ///
    /// # Example
    /// ```
    /// use gridcalc_core::SheetName;
    /// use gridcalc_formula::Formula;
    ///
    /// let formula = Formula::parse("=A1+Data!B2", &SheetName::default()).unwrap();
    /// assert_eq!(formula.references().len(), 2);
    /// assert_eq!(formula.to_string(), "=Sheet1!A1+Data!B2");
    /// ```
    pub fn parse(text: &str, sheet: &SheetName) -> FormulaResult<Self> {
        Self::parse_with(text, sheet, FunctionRegistry::builtin())
    }

    /// Parse against a custom function registry
    pub fn parse_with(
        text: &str,
        sheet: &SheetName,
        registry: &FunctionRegistry,
    ) -> FormulaResult<Self> {
        let tokens = tokenize(text.trim())?;
        let ast = parse_with(tokens, sheet, registry)?;

        let mut references = Vec::new();
        for reference in ast.references() {
            if !references.contains(&reference) {
                references.push(reference);
            }
        }

        Ok(Self {
            source_text: text.to_string(),
            sheet_context: sheet.clone(),
            ast,
            references,
        })
    }

    /// The text the formula was parsed from
    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    /// Sheet that unqualified references resolve against
    pub fn sheet_context(&self) -> &SheetName {
        &self.sheet_context
    }

    pub fn ast(&self) -> &Expr {
        &self.ast
    }

    /// Distinct static references in source order
    ///
    /// Whole-column and whole-row spans are kept as spans; references built at
    /// evaluation time (`OFFSET`, `INDIRECT`) are not included.
    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    /// Defined names the formula mentions
    pub fn names(&self) -> Vec<&str> {
        self.ast.names()
    }

    /// Whether the formula calls a function `registry` marks volatile
    pub fn is_volatile(&self, registry: &FunctionRegistry) -> bool {
        self.ast
            .functions()
            .iter()
            .any(|name| registry.get(name).map_or(false, |def| def.volatile))
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "={}", self.ast)
    }
}
