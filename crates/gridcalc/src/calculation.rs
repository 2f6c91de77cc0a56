//! Workbook calculation engine
//!
//! Recalculates every formula in a workbook, or only the cells affected by
//! an edit, and stores the results back as the cells' cached values.
//!
//! # Example
//!
//! ```rust
//! use gridcalc::prelude::*;
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//! sheet.set_cell_value("A1", 10.0).unwrap();
//! sheet.set_cell_value("A2", 20.0).unwrap();
//! sheet.set_cell_formula("A3", "=A1+A2").unwrap();
//!
//! let stats = workbook.calculate().unwrap();
//! assert_eq!(stats.cells_calculated, 1);
//! assert_eq!(
//!     workbook.worksheet(0).unwrap().get_value("A3").unwrap(),
//!     TypedValue::Number(30.0)
//! );
//! ```

use gridcalc_core::{CellKey, CellReference, TypedValue};
use gridcalc_formula::{
    CellStore, DependencyGraph, EvaluationConfig, Evaluator, FormulaResult, FunctionRegistry,
    Workbook,
};
use tracing::{debug, debug_span, warn};

/// Options for workbook calculation
#[derive(Debug, Clone, Default)]
pub struct CalculationOptions {
    /// Limits and policies passed to every evaluator
    pub evaluation: EvaluationConfig,
    /// Evaluate independent cells on a thread pool (needs the `parallel`
    /// feature; ignored otherwise)
    pub parallel: bool,
}

/// Statistics from a calculation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalculationStats {
    /// Total number of formula cells
    pub formula_count: usize,
    /// Number of cells calculated
    pub cells_calculated: usize,
    /// Number of cells found on circular references
    pub circular_references: usize,
    /// Number of volatile cells recalculated
    pub volatile_cells: usize,
    /// Number of calculated cells holding an error value
    pub errors: usize,
}

/// Extension trait for Workbook to add calculation methods
pub trait WorkbookCalculationExt {
    /// Calculate all formulas in the workbook with default options
    fn calculate(&mut self) -> FormulaResult<CalculationStats>;

    /// Calculate all formulas with custom options
    fn calculate_with_options(
        &mut self,
        options: &CalculationOptions,
    ) -> FormulaResult<CalculationStats>;

    /// Recalculate the formulas affected by edits to `changed`, plus every
    /// volatile formula
    fn calculate_dirty(&mut self, changed: &[CellReference]) -> FormulaResult<CalculationStats>;
}

impl WorkbookCalculationExt for Workbook {
    fn calculate(&mut self) -> FormulaResult<CalculationStats> {
        self.calculate_with_options(&CalculationOptions::default())
    }

    fn calculate_with_options(
        &mut self,
        options: &CalculationOptions,
    ) -> FormulaResult<CalculationStats> {
        CalculationEngine::new(options.clone()).calculate_all(self)
    }

    fn calculate_dirty(&mut self, changed: &[CellReference]) -> FormulaResult<CalculationStats> {
        CalculationEngine::new(CalculationOptions::default()).calculate_dirty(self, changed)
    }
}

/// Values computed in one pass, before they are written back
struct Evaluated {
    values: Vec<TypedValue>,
    circular: Vec<CellReference>,
}

/// The calculation engine
pub struct CalculationEngine<'r> {
    options: CalculationOptions,
    registry: &'r FunctionRegistry,
}

impl CalculationEngine<'static> {
    /// Engine using the built-in functions
    pub fn new(options: CalculationOptions) -> Self {
        Self::with_registry(options, FunctionRegistry::builtin())
    }
}

impl<'r> CalculationEngine<'r> {
    pub fn with_registry(options: CalculationOptions, registry: &'r FunctionRegistry) -> Self {
        Self { options, registry }
    }

    /// Calculate all formulas in the workbook
    ///
    /// All cells share one evaluation cache, so each formula is computed once.
    pub fn calculate_all(&self, workbook: &mut Workbook) -> FormulaResult<CalculationStats> {
        let cells = workbook.formula_cells();
        let span = debug_span!("recalculate", formulas = cells.len());
        let _guard = span.enter();

        let mut stats = CalculationStats {
            formula_count: cells.len(),
            ..CalculationStats::default()
        };
        if cells.is_empty() {
            return Ok(stats);
        }

        let graph = DependencyGraph::from_workbook(workbook, self.registry);
        stats.volatile_cells = graph.volatile_cells().count();

        let evaluated = self.evaluate_cells(workbook, &cells);
        stats.circular_references = circular_count(&graph, &cells, &evaluated.circular);
        self.store(workbook, &cells, evaluated.values, &mut stats)?;
        Ok(stats)
    }

    /// Recalculate the transitive dependents of `changed` and every volatile
    /// formula, leaving other cached values untouched
    pub fn calculate_dirty(
        &self,
        workbook: &mut Workbook,
        changed: &[CellReference],
    ) -> FormulaResult<CalculationStats> {
        let graph = DependencyGraph::from_workbook(workbook, self.registry);
        let changed: Vec<CellKey> = changed.iter().map(CellReference::key).collect();
        let cells: Vec<CellReference> = graph
            .get_recalc_order(&changed)
            .iter()
            .map(CellKey::reference)
            .collect();

        let formula_count = workbook.formula_cells().len();
        let span = debug_span!("recalculate", formulas = formula_count, dirty = cells.len());
        let _guard = span.enter();

        let mut stats = CalculationStats {
            formula_count,
            volatile_cells: graph.volatile_cells().count(),
            ..CalculationStats::default()
        };
        if cells.is_empty() {
            return Ok(stats);
        }

        let evaluated = self.evaluate_cells(workbook, &cells);
        stats.circular_references = circular_count(&graph, &cells, &evaluated.circular);
        self.store(workbook, &cells, evaluated.values, &mut stats)?;
        Ok(stats)
    }

    fn evaluator<'w>(&self, workbook: &'w Workbook) -> Evaluator<'w>
    where
        'r: 'w,
    {
        Evaluator::with_registry(workbook, self.registry)
            .with_config(self.options.evaluation.clone())
    }

    fn evaluate_cells(&self, workbook: &Workbook, cells: &[CellReference]) -> Evaluated {
        #[cfg(feature = "parallel")]
        {
            if self.options.parallel {
                return self.evaluate_parallel(workbook, cells);
            }
        }
        #[cfg(not(feature = "parallel"))]
        if self.options.parallel {
            debug!("parallel calculation requested without the `parallel` feature");
        }

        let evaluator = self.evaluator(workbook);
        let values = evaluator.evaluate_all(cells);
        Evaluated {
            values,
            circular: evaluator.circular_cells(),
        }
    }

    /// One evaluator per cell on the rayon pool; the workbook is only read
    #[cfg(feature = "parallel")]
    fn evaluate_parallel(&self, workbook: &Workbook, cells: &[CellReference]) -> Evaluated {
        use rayon::prelude::*;

        let results: Vec<(TypedValue, Vec<CellReference>)> = cells
            .par_iter()
            .map(|cell| {
                let evaluator = self.evaluator(workbook);
                let value = evaluator.evaluate(cell);
                (value, evaluator.circular_cells())
            })
            .collect();

        let mut circular = Vec::new();
        let mut values = Vec::with_capacity(results.len());
        for (value, cycle) in results {
            values.push(value);
            circular.extend(cycle);
        }
        circular.sort_by_key(CellReference::key);
        circular.dedup_by_key(|cell| cell.key());
        Evaluated { values, circular }
    }

    /// Write results back as cached values
    fn store(
        &self,
        workbook: &mut Workbook,
        cells: &[CellReference],
        values: Vec<TypedValue>,
        stats: &mut CalculationStats,
    ) -> FormulaResult<()> {
        for (cell, value) in cells.iter().zip(values) {
            if value.is_error() {
                stats.errors += 1;
            }
            workbook.set_cached_value(cell, value)?;
            stats.cells_calculated += 1;
        }
        debug!(
            cells = stats.cells_calculated,
            errors = stats.errors,
            "recalculation finished"
        );
        Ok(())
    }
}

/// Formula cells lying on a dependency cycle
///
/// Counted from the dependency graph so the figure does not depend on the
/// order cells were evaluated in. Cycles the graph cannot see (through
/// `INDIRECT` or `OFFSET`) fall back to what the evaluator reported.
fn circular_count(
    graph: &DependencyGraph,
    cells: &[CellReference],
    found: &[CellReference],
) -> usize {
    if found.is_empty() {
        return 0;
    }
    let on_cycle = cells
        .iter()
        .filter(|cell| graph.is_on_cycle(&cell.key()))
        .count();
    let count = if on_cycle > 0 { on_cycle } else { found.len() };

    let path: Vec<String> = found.iter().map(ToString::to_string).collect();
    warn!(count, cells = ?path, "circular references found");
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridcalc_core::{ErrorKind, CIRCULAR_REFERENCE};
    use gridcalc_formula::{EvaluationContext, FunctionDef};
    use pretty_assertions::assert_eq;

    fn at(text: &str) -> CellReference {
        CellReference::parse(text, "Sheet1").unwrap()
    }

    #[test]
    fn test_calculate_stores_results() {
        let mut wb = Workbook::new();
        let sheet = wb.worksheet_mut(0).unwrap();
        sheet.set_cell_value("A1", 2).unwrap();
        sheet.set_cell_formula("A2", "=A1*3").unwrap();
        sheet.set_cell_formula("A3", "=A2+A1").unwrap();
        sheet.set_cell_formula("A4", "=A1/0").unwrap();

        let stats = wb.calculate().unwrap();
        assert_eq!(
            stats,
            CalculationStats {
                formula_count: 3,
                cells_calculated: 3,
                circular_references: 0,
                volatile_cells: 0,
                errors: 1,
            }
        );
        assert_eq!(wb.value(&at("A2")), TypedValue::Number(6.0));
        assert_eq!(wb.value(&at("A3")), TypedValue::Number(8.0));
        assert_eq!(wb.value(&at("A4")), TypedValue::Error(ErrorKind::Div0));
    }

    #[test]
    fn test_circular_reference_detection() {
        let mut wb = Workbook::new();
        let sheet = wb.worksheet_mut(0).unwrap();
        sheet.set_cell_formula("A1", "=B1+1").unwrap();
        sheet.set_cell_formula("B1", "=A1+1").unwrap();
        sheet.set_cell_formula("C1", "=A1*2").unwrap();
        sheet.set_cell_formula("D1", "=5").unwrap();

        let stats = wb.calculate().unwrap();
        assert_eq!(stats.circular_references, 2);
        assert_eq!(stats.errors, 3);
        assert_eq!(wb.value(&at("A1")), TypedValue::Error(CIRCULAR_REFERENCE));
        assert_eq!(wb.value(&at("B1")), TypedValue::Error(CIRCULAR_REFERENCE));
        assert_eq!(wb.value(&at("C1")), TypedValue::Error(CIRCULAR_REFERENCE));
        assert_eq!(wb.value(&at("D1")), TypedValue::Number(5.0));
    }

    #[test]
    fn test_cycle_through_indirect() {
        let mut wb = Workbook::new();
        let sheet = wb.worksheet_mut(0).unwrap();
        sheet.set_cell_formula("A1", "=INDIRECT(\"B1\")").unwrap();
        sheet.set_cell_formula("B1", "=A1").unwrap();

        let stats = wb.calculate().unwrap();
        assert_eq!(stats.circular_references, 2);
        assert_eq!(stats.volatile_cells, 1);
    }

    #[test]
    fn test_multiple_sheets() {
        let mut wb = Workbook::new();
        wb.add_worksheet("Rates").unwrap();
        wb.worksheet_by_name_mut("Rates")
            .unwrap()
            .set_cell_value("A1", 0.25)
            .unwrap();
        let sheet = wb.worksheet_mut(0).unwrap();
        sheet.set_cell_value("A1", 200).unwrap();
        sheet.set_cell_formula("B1", "=A1*Rates!A1").unwrap();

        wb.calculate().unwrap();
        assert_eq!(wb.value(&at("B1")), TypedValue::Number(50.0));
    }

    #[test]
    fn test_calculate_dirty() {
        let mut wb = Workbook::new();
        let sheet = wb.worksheet_mut(0).unwrap();
        sheet.set_cell_value("A1", 1).unwrap();
        sheet.set_cell_value("C1", 1).unwrap();
        sheet.set_cell_formula("A2", "=A1+1").unwrap();
        sheet.set_cell_formula("A3", "=SUM(A1:A2)").unwrap();
        sheet.set_cell_formula("C2", "=C1+1").unwrap();
        sheet.set_cell_formula("D1", "=OFFSET(C1,0,0)").unwrap();
        wb.calculate().unwrap();

        let sheet = wb.worksheet_mut(0).unwrap();
        sheet.set_cell_value("A1", 10).unwrap();
        sheet.set_cell_value("C1", 5).unwrap();

        let stats = wb.calculate_dirty(&[at("A1")]).unwrap();
        assert_eq!(stats.formula_count, 4);
        assert_eq!(stats.cells_calculated, 3);
        assert_eq!(stats.volatile_cells, 1);
        assert_eq!(wb.value(&at("A2")), TypedValue::Number(11.0));
        assert_eq!(wb.value(&at("A3")), TypedValue::Number(21.0));
        assert_eq!(wb.value(&at("D1")), TypedValue::Number(5.0));
        // C2 does not depend on A1 and keeps its previous value
        assert_eq!(wb.value(&at("C2")), TypedValue::Number(2.0));
    }

    #[test]
    fn test_custom_registry() {
        fn fn_answer(_args: &[TypedValue], _ctx: &EvaluationContext) -> TypedValue {
            TypedValue::Number(42.0)
        }

        let mut registry = FunctionRegistry::new();
        registry.register(FunctionDef::values("ANSWER", 0, Some(0), fn_answer));

        let mut wb = Workbook::new();
        wb.worksheet_mut(0)
            .unwrap()
            .set_cell_formula("A1", "=ANSWER()+1")
            .unwrap();

        CalculationEngine::with_registry(CalculationOptions::default(), &registry)
            .calculate_all(&mut wb)
            .unwrap();
        assert_eq!(wb.value(&at("A1")), TypedValue::Number(43.0));
    }

    #[test]
    fn test_depth_limit_from_options() {
        let mut wb = Workbook::new();
        let sheet = wb.worksheet_mut(0).unwrap();
        sheet.set_cell_value("A1", 0).unwrap();
        for row in 2..=20 {
            sheet
                .set_cell_formula(&format!("A{}", row), &format!("=A{}+1", row - 1))
                .unwrap();
        }

        let options = CalculationOptions {
            evaluation: EvaluationConfig::default().with_max_depth(5),
            ..CalculationOptions::default()
        };
        wb.calculate_with_options(&options).unwrap();

        // Cells are calculated top-down with a shared cache, so each chain
        // step is shallow
        assert_eq!(wb.value(&at("A20")), TypedValue::Number(19.0));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_serial() {
        let mut serial = Workbook::new();
        let sheet = serial.worksheet_mut(0).unwrap();
        for row in 1..=50 {
            sheet.set_cell_value(&format!("A{}", row), row).unwrap();
            sheet
                .set_cell_formula(&format!("B{}", row), &format!("=SUM($A$1:A{})", row))
                .unwrap();
        }
        sheet.set_cell_formula("C1", "=C2").unwrap();
        sheet.set_cell_formula("C2", "=C1").unwrap();
        let mut parallel = serial.clone();

        let serial_stats = serial.calculate().unwrap();
        let options = CalculationOptions {
            parallel: true,
            ..CalculationOptions::default()
        };
        let parallel_stats = parallel.calculate_with_options(&options).unwrap();

        assert_eq!(serial_stats, parallel_stats);
        for cell in serial.formula_cells() {
            assert_eq!(serial.value(&cell), parallel.value(&cell));
        }
    }
}
