//! Text functions

use crate::evaluator::EvaluationContext;
use gridcalc_core::TypedValue;

/// CONCAT function; ranges contribute every cell, row by row
pub fn fn_concat(args: &[TypedValue], _ctx: &EvaluationContext) -> TypedValue {
    let mut result = String::new();
    for value in args.iter().flat_map(TypedValue::iter_scalars) {
        match value.to_text() {
            Ok(text) => result.push_str(&text),
            Err(e) => return TypedValue::Error(e),
        }
    }
    TypedValue::Text(result)
}

/// CONCATENATE function; every argument must be a single value
pub fn fn_concatenate(args: &[TypedValue], _ctx: &EvaluationContext) -> TypedValue {
    let mut result = String::new();
    for arg in args {
        match arg.to_text() {
            Ok(text) => result.push_str(&text),
            Err(e) => return TypedValue::Error(e),
        }
    }
    TypedValue::Text(result)
}

/// LEN function, counting characters
pub fn fn_len(args: &[TypedValue], _ctx: &EvaluationContext) -> TypedValue {
    match args[0].to_text() {
        Ok(text) => TypedValue::Number(text.chars().count() as f64),
        Err(e) => TypedValue::Error(e),
    }
}
