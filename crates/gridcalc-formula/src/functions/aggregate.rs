//! Aggregate functions
//!
//! Values typed directly into the call are coerced (`SUM("2", TRUE)` is 3),
//! while values read through a reference count only when they are numbers.
//! The first error met in either position is the result.

use crate::evaluator::EvaluationContext;
use gridcalc_core::{ErrorKind, TypedValue};

/// Numeric operands of an aggregate, in argument order
fn numbers(args: &[TypedValue]) -> Result<Vec<f64>, ErrorKind> {
    let mut values = Vec::new();
    for arg in args {
        match arg {
            TypedValue::Array(rows) => {
                for value in rows.iter().flatten() {
                    match value {
                        TypedValue::Number(n) => values.push(*n),
                        TypedValue::Error(e) => return Err(*e),
                        _ => {} // Text, booleans and blanks in ranges are skipped
                    }
                }
            }
            other => values.push(other.to_number()?),
        }
    }
    Ok(values)
}

fn aggregate(args: &[TypedValue], f: impl FnOnce(Vec<f64>) -> TypedValue) -> TypedValue {
    match numbers(args) {
        Ok(values) => f(values),
        Err(e) => TypedValue::Error(e),
    }
}

/// SUM function
pub fn fn_sum(args: &[TypedValue], _ctx: &EvaluationContext) -> TypedValue {
    aggregate(args, |values| TypedValue::Number(values.iter().sum()))
}

/// AVERAGE function
pub fn fn_average(args: &[TypedValue], _ctx: &EvaluationContext) -> TypedValue {
    aggregate(args, |values| {
        if values.is_empty() {
            return TypedValue::Error(ErrorKind::Div0);
        }
        TypedValue::Number(values.iter().sum::<f64>() / values.len() as f64)
    })
}

/// MIN function; 0 when there is nothing to compare
pub fn fn_min(args: &[TypedValue], _ctx: &EvaluationContext) -> TypedValue {
    aggregate(args, |values| {
        TypedValue::Number(values.into_iter().reduce(f64::min).unwrap_or(0.0))
    })
}

/// MAX function; 0 when there is nothing to compare
pub fn fn_max(args: &[TypedValue], _ctx: &EvaluationContext) -> TypedValue {
    aggregate(args, |values| {
        TypedValue::Number(values.into_iter().reduce(f64::max).unwrap_or(0.0))
    })
}

/// COUNT function
///
/// Counts numbers. Errors are not counted and do not propagate.
pub fn fn_count(args: &[TypedValue], _ctx: &EvaluationContext) -> TypedValue {
    let count = args
        .iter()
        .map(|arg| match arg {
            TypedValue::Array(rows) => rows
                .iter()
                .flatten()
                .filter(|v| matches!(v, TypedValue::Number(_)))
                .count(),
            TypedValue::Error(_) | TypedValue::Blank => 0,
            other => usize::from(other.to_number().is_ok()),
        })
        .sum::<usize>();
    TypedValue::Number(count as f64)
}

/// COUNTA function
///
/// Counts non-empty values, errors included.
pub fn fn_counta(args: &[TypedValue], _ctx: &EvaluationContext) -> TypedValue {
    let count = args
        .iter()
        .map(|arg| match arg {
            TypedValue::Array(rows) => rows.iter().flatten().filter(|v| !v.is_blank()).count(),
            // An omitted argument still counts
            _ => 1,
        })
        .sum::<usize>();
    TypedValue::Number(count as f64)
}
