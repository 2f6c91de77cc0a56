//! Information functions

use crate::ast::Expr;
use crate::evaluator::EvaluationContext;
use gridcalc_core::{ErrorKind, TypedValue};

/// Apply a type test to the single value of the argument
fn is(args: &[TypedValue], test: impl Fn(&TypedValue) -> bool) -> TypedValue {
    TypedValue::Boolean(test(&args[0].clone().into_scalar()))
}

/// ISERROR function
pub fn fn_iserror(args: &[TypedValue], _ctx: &EvaluationContext) -> TypedValue {
    is(args, TypedValue::is_error)
}

/// ISNA function
pub fn fn_isna(args: &[TypedValue], _ctx: &EvaluationContext) -> TypedValue {
    is(args, |v| v.error() == Some(ErrorKind::Na))
}

/// ISBLANK function
pub fn fn_isblank(args: &[TypedValue], _ctx: &EvaluationContext) -> TypedValue {
    is(args, TypedValue::is_blank)
}

/// ISNUMBER function
pub fn fn_isnumber(args: &[TypedValue], _ctx: &EvaluationContext) -> TypedValue {
    is(args, |v| matches!(v, TypedValue::Number(_)))
}

/// ISTEXT function
pub fn fn_istext(args: &[TypedValue], _ctx: &EvaluationContext) -> TypedValue {
    is(args, |v| matches!(v, TypedValue::Text(_)))
}

/// NA function
pub fn fn_na(_args: &[TypedValue], _ctx: &EvaluationContext) -> TypedValue {
    TypedValue::Error(ErrorKind::Na)
}

/// ISREF function
///
/// TRUE when the argument resolves to a reference. The argument is never
/// evaluated, so `ISREF(A1)` holds even when A1 contains an error.
pub fn fn_isref(args: &[Expr], ctx: &EvaluationContext) -> TypedValue {
    TypedValue::Boolean(ctx.areas(&args[0]).is_ok())
}

#[cfg(test)]
mod tests {
    use crate::store::{NameScope, Workbook};
    use crate::{Evaluator, Formula};
    use gridcalc_core::{CellReference, SheetName, TypedValue};
    use pretty_assertions::assert_eq;

    fn eval(formula: &str) -> TypedValue {
        let mut wb = Workbook::new();
        let sheet = wb.worksheet_mut(0).unwrap();
        sheet.set_cell_value("A1", 1).unwrap();
        sheet.set_cell_value("A2", "").unwrap();
        sheet.set_cell_formula("A3", "=1/0").unwrap();
        wb.define_name("Cell", NameScope::Workbook, "=$A$1").unwrap();
        wb.define_name("Constant", NameScope::Workbook, "=42").unwrap();

        let formula = Formula::parse(formula, &SheetName::default()).unwrap();
        let at = CellReference::parse("Z1", "Sheet1").unwrap();
        Evaluator::new(&wb).evaluate_formula(&formula, &at)
    }

    fn b(value: bool) -> TypedValue {
        TypedValue::Boolean(value)
    }

    #[test]
    fn test_type_tests() {
        assert_eq!(eval("=ISNUMBER(A1)"), b(true));
        assert_eq!(eval("=ISNUMBER(\"1\")"), b(false));
        assert_eq!(eval("=ISTEXT(A2)"), b(true));
        assert_eq!(eval("=ISBLANK(A2)"), b(false));
        assert_eq!(eval("=ISBLANK(B1)"), b(true));
        assert_eq!(eval("=ISERROR(A3)"), b(true));
        assert_eq!(eval("=ISERROR(A1)"), b(false));
        assert_eq!(eval("=ISNA(A3)"), b(false));
        assert_eq!(eval("=ISNA(NA())"), b(true));
    }

    #[test]
    fn test_multi_cell_argument_is_value_error() {
        assert_eq!(eval("=ISERROR(A1:A2)"), b(true));
        assert_eq!(eval("=ISNUMBER(A1:A2)"), b(false));
    }

    #[test]
    fn test_isref() {
        assert_eq!(eval("=ISREF(A3)"), b(true));
        assert_eq!(eval("=ISREF(A1:B2 B2)"), b(true));
        assert_eq!(eval("=ISREF((A1,B2))"), b(true));
        assert_eq!(eval("=ISREF(Cell)"), b(true));
        assert_eq!(eval("=ISREF(OFFSET(A1,1,1))"), b(true));
        assert_eq!(eval("=ISREF(1)"), b(false));
        assert_eq!(eval("=ISREF(Constant)"), b(false));
        assert_eq!(eval("=ISREF(Unknown)"), b(false));
        assert_eq!(eval("=ISREF(A1 B2)"), b(false));
    }
}
