//! Logical functions

use super::integer_arg;
use crate::ast::Expr;
use crate::evaluator::EvaluationContext;
use gridcalc_core::{ErrorKind, Reference, TypedValue};

/// Truth values of the arguments
///
/// Direct arguments are coerced; inside ranges and arrays only numbers and
/// booleans take part. `#VALUE!` when nothing takes part.
fn truth_values(args: &[TypedValue]) -> Result<Vec<bool>, ErrorKind> {
    let mut values = Vec::new();
    for arg in args {
        match arg {
            TypedValue::Array(rows) => {
                for value in rows.iter().flatten() {
                    match value {
                        TypedValue::Boolean(b) => values.push(*b),
                        TypedValue::Number(n) => values.push(*n != 0.0),
                        TypedValue::Error(e) => return Err(*e),
                        _ => {}
                    }
                }
            }
            TypedValue::Blank => {}
            other => values.push(other.to_bool()?),
        }
    }
    if values.is_empty() {
        return Err(ErrorKind::Value);
    }
    Ok(values)
}

/// AND function
pub fn fn_and(args: &[TypedValue], _ctx: &EvaluationContext) -> TypedValue {
    match truth_values(args) {
        Ok(values) => TypedValue::Boolean(values.into_iter().all(|b| b)),
        Err(e) => TypedValue::Error(e),
    }
}

/// OR function
pub fn fn_or(args: &[TypedValue], _ctx: &EvaluationContext) -> TypedValue {
    match truth_values(args) {
        Ok(values) => TypedValue::Boolean(values.into_iter().any(|b| b)),
        Err(e) => TypedValue::Error(e),
    }
}

/// NOT function
pub fn fn_not(args: &[TypedValue], _ctx: &EvaluationContext) -> TypedValue {
    match args[0].to_bool() {
        Ok(b) => TypedValue::Boolean(!b),
        Err(e) => TypedValue::Error(e),
    }
}

/// IF function; only the selected branch is evaluated
pub fn fn_if(args: &[Expr], ctx: &EvaluationContext) -> TypedValue {
    let condition = match ctx.evaluate_scalar(&args[0]).to_bool() {
        Ok(b) => b,
        Err(e) => return TypedValue::Error(e),
    };

    if condition {
        ctx.evaluate(&args[1])
    } else {
        match args.get(2) {
            Some(branch) => ctx.evaluate(branch),
            None => TypedValue::Boolean(false),
        }
    }
}

/// IFERROR function
pub fn fn_iferror(args: &[Expr], ctx: &EvaluationContext) -> TypedValue {
    let value = ctx.evaluate(&args[0]);
    if value.is_error() {
        ctx.evaluate(&args[1])
    } else {
        value
    }
}

/// IFNA function
pub fn fn_ifna(args: &[Expr], ctx: &EvaluationContext) -> TypedValue {
    let value = ctx.evaluate(&args[0]);
    if value.error() == Some(ErrorKind::Na) {
        ctx.evaluate(&args[1])
    } else {
        value
    }
}

/// Argument picked by CHOOSE's index
fn chosen<'a>(args: &'a [Expr], ctx: &EvaluationContext) -> Result<&'a Expr, ErrorKind> {
    let index = integer_arg(&ctx.evaluate_scalar(&args[0]))?;
    if index < 1 {
        return Err(ErrorKind::Value);
    }
    args.get(index as usize).ok_or(ErrorKind::Value)
}

/// CHOOSE function
pub fn fn_choose(args: &[Expr], ctx: &EvaluationContext) -> TypedValue {
    match chosen(args, ctx) {
        Ok(choice) => ctx.evaluate(choice),
        Err(e) => TypedValue::Error(e),
    }
}

/// CHOOSE where a reference is expected, e.g. `SUM(CHOOSE(2,A1:A3,B1:B3))`
pub fn ref_choose(args: &[Expr], ctx: &EvaluationContext) -> Result<Reference, ErrorKind> {
    ctx.reference(chosen(args, ctx)?)
}
