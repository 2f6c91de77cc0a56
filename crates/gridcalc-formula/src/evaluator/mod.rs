//! Formula evaluator
//!
//! Evaluates formula ASTs against a [`CellStore`]. Referenced cells are
//! evaluated on demand and memoised for the rest of the evaluation call, so
//! a dependency diamond is computed once. A reference back to a cell that is
//! still being evaluated is a circular reference: every cell on the current
//! path receives [`CIRCULAR_REFERENCE`] and evaluation unwinds.

mod operators;
mod reference;

use crate::ast::Expr;
use crate::config::EvaluationConfig;
use crate::formula::Formula;
use crate::functions::{FunctionImpl, FunctionRegistry};
use crate::stack::ensure_sufficient_stack;
use crate::store::CellStore;
use ahash::{AHashMap, AHashSet};
use gridcalc_core::{
    CellKey, CellReference, ErrorKind, Reference, SheetName, TypedValue, CIRCULAR_REFERENCE,
};
use std::cell::RefCell;
use tracing::{debug, trace};

#[derive(Debug, Clone)]
enum CellState {
    InProgress,
    Done(TypedValue),
}

#[derive(Debug, Default)]
struct EvaluationState {
    states: AHashMap<CellKey, CellState>,
    /// Cells whose formulas are being evaluated, outermost first
    visit_stack: Vec<CellReference>,
    circular: AHashSet<CellKey>,
    /// Defined names being expanded, lowercase
    name_stack: Vec<String>,
}

/// Evaluates cells of one store
///
/// The cache lives as long as the evaluator but [`Evaluator::evaluate`]
/// clears it first; [`Evaluator::evaluate_all`] shares it across cells.
/// An evaluator is used from one thread; run one per thread to evaluate
/// independent cells concurrently.
pub struct Evaluator<'a> {
    store: &'a dyn CellStore,
    registry: &'a FunctionRegistry,
    config: EvaluationConfig,
    state: RefCell<EvaluationState>,
}

impl<'a> Evaluator<'a> {
    /// Evaluator using the built-in functions and default limits
    pub fn new(store: &'a dyn CellStore) -> Self {
        Self::with_registry(store, FunctionRegistry::builtin())
    }

    /// Evaluator calling functions from `registry`
    pub fn with_registry(store: &'a dyn CellStore, registry: &'a FunctionRegistry) -> Self {
        Self {
            store,
            registry,
            config: EvaluationConfig::default(),
            state: RefCell::new(EvaluationState::default()),
        }
    }

    /// Replace the default limits and policies
    pub fn with_config(mut self, config: EvaluationConfig) -> Self {
        self.config = config;
        self
    }

    /// Limits and policies in effect
    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Evaluate one cell with a fresh cache
    ///
    /// # Example
    /// ```
    /// use gridcalc_core::{CellReference, TypedValue};
    /// use gridcalc_formula::{Evaluator, Workbook};
    ///
    /// let mut wb = Workbook::new();
    /// let sheet = wb.worksheet_mut(0).unwrap();
    /// sheet.set_cell_value("A1", 10).unwrap();
    /// sheet.set_cell_value("A2", 20).unwrap();
    /// sheet.set_cell_formula("A3", "=A1+A2").unwrap();
    ///
    /// let a3 = CellReference::parse("A3", "Sheet1").unwrap();
    /// assert_eq!(Evaluator::new(&wb).evaluate(&a3), TypedValue::Number(30.0));
    /// ```
    pub fn evaluate(&self, cell: &CellReference) -> TypedValue {
        self.reset();
        self.cell_value(cell)
    }

    /// Evaluate many cells with one shared cache
    pub fn evaluate_all<'c>(
        &self,
        cells: impl IntoIterator<Item = &'c CellReference>,
    ) -> Vec<TypedValue> {
        self.reset();
        cells.into_iter().map(|cell| self.cell_value(cell)).collect()
    }

    /// Evaluate a formula as if it were entered at `at`
    ///
    /// The result is not reduced to a scalar, so `=A1:B2` yields an array.
    pub fn evaluate_formula(&self, formula: &Formula, at: &CellReference) -> TypedValue {
        self.evaluate_expr(formula.ast(), at)
    }

    /// Evaluate an expression as if it were entered at `at`
    pub fn evaluate_expr(&self, expr: &Expr, at: &CellReference) -> TypedValue {
        self.reset();
        let ctx = EvaluationContext {
            current_cell: at.clone(),
            evaluator: self,
        };
        ctx.evaluate(expr)
    }

    /// Cells found on a dependency cycle since the cache was last cleared
    pub fn circular_cells(&self) -> Vec<CellReference> {
        let mut cells: Vec<_> = self
            .state
            .borrow()
            .circular
            .iter()
            .map(CellKey::reference)
            .collect();
        cells.sort_by(|a, b| a.key().cmp(&b.key()));
        cells
    }

    fn reset(&self) {
        *self.state.borrow_mut() = EvaluationState::default();
    }

    /// Value of a cell, evaluating its formula if needed
    fn cell_value(&self, cell: &CellReference) -> TypedValue {
        let Some(sheet) = self.store.resolve_sheet(cell.sheet()) else {
            return TypedValue::Error(ErrorKind::Ref);
        };
        let key = CellKey {
            sheet: sheet.clone(),
            row: cell.row(),
            column: cell.column(),
        };

        let cached = self.state.borrow().states.get(&key).cloned();
        match cached {
            Some(CellState::Done(value)) => return value,
            Some(CellState::InProgress) => {
                self.mark_cycle(&key);
                return TypedValue::Error(CIRCULAR_REFERENCE);
            }
            None => {}
        }

        let Some(stored) = self.store.get_cell(cell) else {
            return TypedValue::Blank;
        };
        let Some(formula) = stored.formula() else {
            return stored.value().cloned().unwrap_or_default();
        };

        let depth = self.state.borrow().visit_stack.len();
        if depth >= self.config.max_depth {
            debug!(cell = %key, depth, "evaluation depth ceiling reached");
            return TypedValue::Error(ErrorKind::Num);
        }

        // Name guards belong to the cell whose formula expands them
        let outer_names = {
            let mut state = self.state.borrow_mut();
            state.states.insert(key.clone(), CellState::InProgress);
            state.visit_stack.push(key.reference());
            std::mem::take(&mut state.name_stack)
        };

        trace!(cell = %key, formula = %formula, "evaluating cell");
        let ctx = EvaluationContext {
            current_cell: key.reference(),
            evaluator: self,
        };
        let value = ensure_sufficient_stack(|| ctx.evaluate(formula.ast()));

        // A cell holds one value: an array result keeps its top-left element
        let value = match value {
            TypedValue::Array(rows) => rows
                .into_iter()
                .next()
                .and_then(|row| row.into_iter().next())
                .unwrap_or_default(),
            value => value,
        };

        let mut state = self.state.borrow_mut();
        state.visit_stack.pop();
        state.name_stack = outer_names;
        let value = if state.circular.contains(&key) {
            TypedValue::Error(CIRCULAR_REFERENCE)
        } else {
            value
        };
        state.states.insert(key, CellState::Done(value.clone()));
        value
    }

    fn mark_cycle(&self, key: &CellKey) {
        let mut state = self.state.borrow_mut();
        let path: Vec<String> = state.visit_stack.iter().map(|c| c.to_string()).collect();
        debug!(cell = %key, path = ?path, "circular reference");

        let keys: Vec<CellKey> = state.visit_stack.iter().map(CellReference::key).collect();
        state.circular.extend(keys);
    }
}

/// Everything a formula sees while it is evaluated
///
/// Passed to context functions, which use it to evaluate their arguments
/// lazily, resolve references, or read the coordinates of the cell being
/// evaluated.
pub struct EvaluationContext<'e> {
    current_cell: CellReference,
    evaluator: &'e Evaluator<'e>,
}

impl<'e> EvaluationContext<'e> {
    /// The cell whose formula is being evaluated
    pub fn current_cell(&self) -> &CellReference {
        &self.current_cell
    }

    /// Sheet of the current cell
    pub fn sheet(&self) -> &SheetName {
        self.current_cell.sheet()
    }

    pub fn store(&self) -> &dyn CellStore {
        self.evaluator.store
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.evaluator.config
    }

    pub fn registry(&self) -> &FunctionRegistry {
        self.evaluator.registry
    }

    /// Cells being evaluated, outermost first
    pub fn visit_stack(&self) -> Vec<CellReference> {
        self.evaluator.state.borrow().visit_stack.clone()
    }

    /// Evaluate an expression to a value
    ///
    /// A single-cell reference yields the cell's value; larger references
    /// yield an array.
    pub fn evaluate(&self, expr: &Expr) -> TypedValue {
        ensure_sufficient_stack(|| self.evaluate_inner(expr))
    }

    fn evaluate_inner(&self, expr: &Expr) -> TypedValue {
        match expr {
            Expr::Number(n) => TypedValue::Number(*n),
            Expr::Text(s) => TypedValue::Text(s.clone()),
            Expr::Boolean(b) => TypedValue::Boolean(*b),
            Expr::Error(e) => TypedValue::Error(*e),
            Expr::Array(rows) => TypedValue::Array(rows.clone()),
            Expr::Missing => TypedValue::Blank,

            Expr::Reference(reference) => self.resolve(reference),

            Expr::Name(name) => self
                .with_name(name, |ctx, formula| ctx.evaluate(formula.ast()))
                .unwrap_or_else(TypedValue::Error),

            Expr::UnaryOp { op, operand } => operators::unary(*op, self.evaluate(operand)),

            Expr::BinaryOp { op, left, right } => {
                let left = self.evaluate(left);
                if left.is_error() {
                    return left;
                }
                let right = self.evaluate(right);
                operators::binary(*op, &left, &right)
            }

            Expr::Range { .. } | Expr::Intersection { .. } => match self.reference(expr) {
                Ok(reference) => self.resolve(&reference),
                Err(e) => TypedValue::Error(e),
            },

            // Several areas cannot become one value
            Expr::Union(_) => TypedValue::Error(ErrorKind::Value),

            Expr::Function { name, args } => self.call(name, args),
        }
    }

    /// Evaluate to a single value; arrays larger than one cell are `#VALUE!`
    pub fn evaluate_scalar(&self, expr: &Expr) -> TypedValue {
        self.evaluate(expr).into_scalar()
    }

    /// Resolve an expression that must denote a reference
    ///
    /// Non-reference expressions yield `#VALUE!`, unknown names `#NAME?`,
    /// and empty intersections `#NULL!`.
    pub fn reference(&self, expr: &Expr) -> Result<Reference, ErrorKind> {
        match expr {
            Expr::Reference(reference) => Ok(reference.clone()),
            Expr::Range { start, end } => {
                let start = self.reference(start)?;
                let end = self.reference(end)?;
                reference::bounding(&start, &end)
            }
            Expr::Intersection { left, right } => {
                let left = self.reference(left)?;
                let right = self.reference(right)?;
                reference::intersect(&left, &right)
            }
            Expr::Name(name) => self.with_name(name, |ctx, formula| ctx.reference(formula.ast()))?,
            Expr::Function { name, args } => {
                let def = self.registry().get(name).ok_or(ErrorKind::Name)?;
                let hook = def.reference.ok_or(ErrorKind::Value)?;
                hook(args, self)
            }
            Expr::Error(e) => Err(*e),
            _ => Err(ErrorKind::Value),
        }
    }

    /// Resolve an expression to its areas: each member of a union, or the
    /// single reference
    pub fn areas(&self, expr: &Expr) -> Result<Vec<Reference>, ErrorKind> {
        match expr {
            Expr::Union(items) => {
                let mut areas = Vec::with_capacity(items.len());
                for item in items {
                    areas.extend(self.areas(item)?);
                }
                Ok(areas)
            }
            Expr::Name(name) => self.with_name(name, |ctx, formula| ctx.areas(formula.ast()))?,
            other => Ok(vec![self.reference(other)?]),
        }
    }

    /// Values behind a reference: the value of a single cell, or an array
    pub fn resolve(&self, reference: &Reference) -> TypedValue {
        match reference {
            Reference::Cell(cell) => self.evaluator.cell_value(cell),
            _ => self.resolve_array(reference),
        }
    }

    /// Values behind a reference as an array, even for a single cell
    pub fn resolve_array(&self, reference: &Reference) -> TypedValue {
        if !self.store().sheet_exists(reference.sheet()) {
            return TypedValue::Error(ErrorKind::Ref);
        }
        let range = match reference::materialize(reference, self.store(), self.config()) {
            Ok(range) => range,
            Err(e) => return TypedValue::Error(e),
        };

        let (rows, columns) = range.dimensions();
        let mut cells = range.cells();
        let values = (0..rows)
            .map(|_| {
                (&mut cells)
                    .take(columns as usize)
                    .map(|cell| self.evaluator.cell_value(&cell))
                    .collect()
            })
            .collect();
        TypedValue::Array(values)
    }

    /// Whether `expr` denotes a reference rather than a plain value
    pub fn is_reference(&self, expr: &Expr) -> bool {
        match expr {
            Expr::Reference(_)
            | Expr::Range { .. }
            | Expr::Intersection { .. }
            | Expr::Union(_) => true,
            Expr::Function { name, .. } => self
                .registry()
                .get(name)
                .map_or(false, |def| def.reference.is_some()),
            Expr::Name(name) => self
                .store()
                .defined_name(name, self.sheet())
                .map_or(false, |def| {
                    matches!(
                        def.formula().ast(),
                        Expr::Reference(_)
                            | Expr::Range { .. }
                            | Expr::Intersection { .. }
                            | Expr::Union(_)
                    )
                }),
            _ => false,
        }
    }

    /// Evaluate the arguments of a value function
    ///
    /// Omitted arguments are blank, each union member is its own argument,
    /// and references arrive as arrays so functions can tell them apart from
    /// values typed directly into the call.
    fn argument_values(&self, args: &[Expr]) -> Vec<TypedValue> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            match arg {
                Expr::Missing => values.push(TypedValue::Blank),
                Expr::Union(_) => match self.areas(arg) {
                    Ok(areas) => values.extend(areas.iter().map(|area| self.resolve_array(area))),
                    Err(e) => values.push(TypedValue::Error(e)),
                },
                // Functions such as CHOOSE may or may not return a reference
                Expr::Function { .. } if self.is_reference(arg) => {
                    values.push(match self.reference(arg) {
                        Ok(reference) => self.resolve_array(&reference),
                        Err(_) => self.evaluate(arg),
                    })
                }
                _ if self.is_reference(arg) => values.push(match self.reference(arg) {
                    Ok(reference) => self.resolve_array(&reference),
                    Err(e) => TypedValue::Error(e),
                }),
                _ => values.push(self.evaluate(arg)),
            }
        }
        values
    }

    fn call(&self, name: &str, args: &[Expr]) -> TypedValue {
        let Some(def) = self.registry().get(name) else {
            return TypedValue::Error(ErrorKind::Name);
        };
        let too_many = def.max_args.map_or(false, |max| args.len() > max);
        if args.len() < def.min_args || too_many {
            return TypedValue::Error(ErrorKind::Value);
        }

        match def.implementation {
            FunctionImpl::Values(f) => f(&self.argument_values(args), self),
            FunctionImpl::Context(f) => f(args, self),
        }
    }

    /// Run `f` on the formula of a defined name
    fn with_name<T>(
        &self,
        name: &str,
        f: impl FnOnce(&Self, &Formula) -> T,
    ) -> Result<T, ErrorKind> {
        let def = self
            .store()
            .defined_name(name, self.sheet())
            .ok_or(ErrorKind::Name)?;

        let folded = name.to_lowercase();
        {
            let mut state = self.evaluator.state.borrow_mut();
            if state.name_stack.contains(&folded) {
                debug!(name, "circular defined name");
                return Err(CIRCULAR_REFERENCE);
            }
            state.name_stack.push(folded);
        }

        let result = f(self, def.formula());
        self.evaluator.state.borrow_mut().name_stack.pop();
        Ok(result)
    }
}
