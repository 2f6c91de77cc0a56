//! Built-in functions
//!
//! Functions come in two flavours. Value functions receive their arguments
//! already evaluated. Context functions receive the raw argument
//! expressions together with the [`EvaluationContext`], so they can evaluate
//! lazily (`IF`) or inspect references instead of values (`ROW`, `OFFSET`).

pub mod aggregate;
pub mod info;
pub mod logical;
pub mod reference;
pub mod text;

use crate::ast::Expr;
use crate::evaluator::EvaluationContext;
use ahash::AHashMap;
use gridcalc_core::{ErrorKind, Reference, TypedValue};
use std::sync::OnceLock;

/// Function over evaluated arguments
pub type ValueFunction = fn(&[TypedValue], &EvaluationContext) -> TypedValue;

/// Function over unevaluated arguments
pub type ContextFunction = fn(&[Expr], &EvaluationContext) -> TypedValue;

/// Reference-returning form of a function, used where a reference is
/// required, e.g. `OFFSET(A1,1,0):B5` or `ROW(INDEX(A1:A5,3))`
pub type ReferenceFunction = fn(&[Expr], &EvaluationContext) -> Result<Reference, ErrorKind>;

/// How a function receives its arguments
#[derive(Clone, Copy)]
pub enum FunctionImpl {
    Values(ValueFunction),
    Context(ContextFunction),
}

/// Function definition
#[derive(Clone)]
pub struct FunctionDef {
    /// Function name (uppercase)
    pub name: &'static str,
    /// Minimum arguments
    pub min_args: usize,
    /// Maximum arguments (None = unlimited)
    pub max_args: Option<usize>,
    /// Implementation
    pub implementation: FunctionImpl,
    /// Reference-returning hook
    pub reference: Option<ReferenceFunction>,
    /// Is volatile (recalculates every time)
    pub volatile: bool,
}

impl FunctionDef {
    /// A value function taking `min_args..=max_args` arguments
    pub fn values(
        name: &'static str,
        min_args: usize,
        max_args: Option<usize>,
        implementation: ValueFunction,
    ) -> Self {
        Self {
            name,
            min_args,
            max_args,
            implementation: FunctionImpl::Values(implementation),
            reference: None,
            volatile: false,
        }
    }

    /// A context function taking `min_args..=max_args` arguments
    pub fn context(
        name: &'static str,
        min_args: usize,
        max_args: Option<usize>,
        implementation: ContextFunction,
    ) -> Self {
        Self {
            name,
            min_args,
            max_args,
            implementation: FunctionImpl::Context(implementation),
            reference: None,
            volatile: false,
        }
    }

    pub fn with_reference(mut self, reference: ReferenceFunction) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn volatile(mut self) -> Self {
        self.volatile = true;
        self
    }
}

static BUILTIN_REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();

/// Function registry
pub struct FunctionRegistry {
    functions: AHashMap<String, FunctionDef>,
}

impl FunctionRegistry {
    /// Create a new registry with all built-in functions
    pub fn new() -> Self {
        let mut registry = Self::empty();

        registry.register_aggregate_functions();
        registry.register_logical_functions();
        registry.register_info_functions();
        registry.register_text_functions();
        registry.register_reference_functions();

        registry
    }

    /// Create a registry with no functions
    pub fn empty() -> Self {
        Self {
            functions: AHashMap::new(),
        }
    }

    /// Shared registry of the built-in functions
    pub fn builtin() -> &'static FunctionRegistry {
        BUILTIN_REGISTRY.get_or_init(FunctionRegistry::new)
    }

    /// Look up a function by name
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(&name.to_uppercase())
    }

    /// Register a function, replacing any previous definition of the name
    pub fn register(&mut self, def: FunctionDef) {
        self.functions.insert(def.name.to_uppercase(), def);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    fn register_aggregate_functions(&mut self) {
        self.register(FunctionDef::values("SUM", 1, None, aggregate::fn_sum));
        self.register(FunctionDef::values("AVERAGE", 1, None, aggregate::fn_average));
        self.register(FunctionDef::values("MIN", 1, None, aggregate::fn_min));
        self.register(FunctionDef::values("MAX", 1, None, aggregate::fn_max));
        self.register(FunctionDef::values("COUNT", 1, None, aggregate::fn_count));
        self.register(FunctionDef::values("COUNTA", 1, None, aggregate::fn_counta));
    }

    fn register_logical_functions(&mut self) {
        self.register(FunctionDef::values("AND", 1, None, logical::fn_and));
        self.register(FunctionDef::values("OR", 1, None, logical::fn_or));
        self.register(FunctionDef::values("NOT", 1, Some(1), logical::fn_not));

        // Lazy: only the chosen branch is evaluated
        self.register(FunctionDef::context("IF", 2, Some(3), logical::fn_if));
        self.register(FunctionDef::context("IFERROR", 2, Some(2), logical::fn_iferror));
        self.register(FunctionDef::context("IFNA", 2, Some(2), logical::fn_ifna));
        self.register(
            FunctionDef::context("CHOOSE", 2, None, logical::fn_choose)
                .with_reference(logical::ref_choose),
        );
    }

    fn register_info_functions(&mut self) {
        self.register(FunctionDef::values("ISERROR", 1, Some(1), info::fn_iserror));
        self.register(FunctionDef::values("ISNA", 1, Some(1), info::fn_isna));
        self.register(FunctionDef::values("ISBLANK", 1, Some(1), info::fn_isblank));
        self.register(FunctionDef::values("ISNUMBER", 1, Some(1), info::fn_isnumber));
        self.register(FunctionDef::values("ISTEXT", 1, Some(1), info::fn_istext));
        self.register(FunctionDef::values("NA", 0, Some(0), info::fn_na));
        self.register(FunctionDef::context("ISREF", 1, Some(1), info::fn_isref));
    }

    fn register_text_functions(&mut self) {
        self.register(FunctionDef::values("CONCAT", 1, None, text::fn_concat));
        self.register(FunctionDef::values("CONCATENATE", 1, None, text::fn_concatenate));
        self.register(FunctionDef::values("LEN", 1, Some(1), text::fn_len));
    }

    fn register_reference_functions(&mut self) {
        self.register(FunctionDef::context("ROW", 0, Some(1), reference::fn_row));
        self.register(FunctionDef::context("COLUMN", 0, Some(1), reference::fn_column));
        self.register(FunctionDef::context("ROWS", 1, Some(1), reference::fn_rows));
        self.register(FunctionDef::context("COLUMNS", 1, Some(1), reference::fn_columns));
        self.register(FunctionDef::context("AREAS", 1, Some(1), reference::fn_areas));

        // OFFSET and INDIRECT build references at evaluation time
        self.register(
            FunctionDef::context("OFFSET", 3, Some(5), reference::fn_offset)
                .with_reference(reference::ref_offset)
                .volatile(),
        );
        self.register(
            FunctionDef::context("INDIRECT", 1, Some(2), reference::fn_indirect)
                .with_reference(reference::ref_indirect)
                .volatile(),
        );
        self.register(
            FunctionDef::context("INDEX", 2, Some(4), reference::fn_index)
                .with_reference(reference::ref_index),
        );
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a numeric argument, truncating toward zero
pub(crate) fn integer_arg(value: &TypedValue) -> Result<i64, ErrorKind> {
    let n = value.to_number()?;
    if !n.is_finite() || n.abs() > i64::MAX as f64 {
        return Err(ErrorKind::Num);
    }
    Ok(n.trunc() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = FunctionRegistry::new();
        assert!(registry.get("sum").is_some());
        assert!(registry.get("Offset").map_or(false, |def| def.volatile));
        assert!(registry.get("INDEX").map_or(false, |def| def.reference.is_some()));
        assert!(registry.get("NOSUCH").is_none());
    }

    #[test]
    fn test_register_custom_function() {
        fn fn_double(args: &[TypedValue], _ctx: &EvaluationContext) -> TypedValue {
            match args[0].to_number() {
                Ok(n) => TypedValue::Number(n * 2.0),
                Err(e) => TypedValue::Error(e),
            }
        }

        let mut registry = FunctionRegistry::empty();
        registry.register(FunctionDef::values("double", 1, Some(1), fn_double));
        assert_eq!(registry.get("DOUBLE").map(|def| def.name), Some("double"));
        assert_eq!(registry.names().count(), 1);
    }

    #[test]
    fn test_integer_arg() {
        assert_eq!(integer_arg(&TypedValue::Number(2.9)), Ok(2));
        assert_eq!(integer_arg(&TypedValue::Number(-2.9)), Ok(-2));
        assert_eq!(integer_arg(&TypedValue::text("x")), Err(ErrorKind::Value));
        assert_eq!(integer_arg(&TypedValue::Number(f64::INFINITY)), Err(ErrorKind::Num));
    }
}
