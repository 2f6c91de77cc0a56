//! Operator semantics over typed values
//!
//! Operands are already evaluated. Errors propagate (the left operand's
//! error wins), and arrays are processed element by element.

use crate::ast::{BinaryOperator, UnaryOperator};
use gridcalc_core::{compare_values, ErrorKind, TypedValue};
use std::cmp::Ordering;

/// Apply a prefix or postfix operator
pub(crate) fn unary(op: UnaryOperator, value: TypedValue) -> TypedValue {
    match value {
        TypedValue::Array(rows) => TypedValue::Array(
            rows.into_iter()
                .map(|row| row.into_iter().map(|v| unary(op, v)).collect())
                .collect(),
        ),
        TypedValue::Error(e) => TypedValue::Error(e),
        value => match op {
            UnaryOperator::Plus => value,
            UnaryOperator::Negate => number(value.to_number().map(|n| -n)),
            UnaryOperator::Percent => number(value.to_number().map(|n| n / 100.0)),
        },
    }
}

/// Apply a binary operator, broadcasting over arrays
pub(crate) fn binary(op: BinaryOperator, left: &TypedValue, right: &TypedValue) -> TypedValue {
    if !left.is_array() && !right.is_array() {
        return scalar(op, left, right);
    }

    let (left_rows, left_columns) = left.dimensions();
    let (right_rows, right_columns) = right.dimensions();
    let rows = left_rows.max(right_rows);
    let columns = left_columns.max(right_columns);

    let result = (0..rows)
        .map(|row| {
            (0..columns)
                .map(|column| match (element(left, row, column), element(right, row, column)) {
                    (Some(l), Some(r)) => scalar(op, l, r),
                    _ => TypedValue::Error(ErrorKind::Na),
                })
                .collect()
        })
        .collect();
    TypedValue::Array(result)
}

/// Element of an operand at a broadcast position
///
/// A scalar stands for every position; a single row or column is stretched
/// along the other dimension. Positions past the end are missing.
fn element(value: &TypedValue, row: usize, column: usize) -> Option<&TypedValue> {
    match value {
        TypedValue::Array(rows) => {
            let (height, width) = value.dimensions();
            let row = if height == 1 { 0 } else { row };
            let column = if width == 1 { 0 } else { column };
            rows.get(row).and_then(|r| r.get(column))
        }
        scalar => Some(scalar),
    }
}

fn scalar(op: BinaryOperator, left: &TypedValue, right: &TypedValue) -> TypedValue {
    if let TypedValue::Error(e) = left {
        return TypedValue::Error(*e);
    }
    if let TypedValue::Error(e) = right {
        return TypedValue::Error(*e);
    }

    match op {
        BinaryOperator::Add
        | BinaryOperator::Subtract
        | BinaryOperator::Multiply
        | BinaryOperator::Divide
        | BinaryOperator::Power => {
            let operands = left.to_number().and_then(|l| Ok((l, right.to_number()?)));
            number(operands.and_then(|(l, r)| arithmetic(op, l, r)))
        }
        BinaryOperator::Concat => match (left.to_text(), right.to_text()) {
            (Ok(l), Ok(r)) => TypedValue::Text(l + &r),
            (Err(e), _) | (_, Err(e)) => TypedValue::Error(e),
        },
        _ => {
            let ordering = compare_values(left, right);
            TypedValue::Boolean(match op {
                BinaryOperator::Equal => ordering == Ordering::Equal,
                BinaryOperator::NotEqual => ordering != Ordering::Equal,
                BinaryOperator::LessThan => ordering == Ordering::Less,
                BinaryOperator::LessEqual => ordering != Ordering::Greater,
                BinaryOperator::GreaterThan => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            })
        }
    }
}

fn arithmetic(op: BinaryOperator, l: f64, r: f64) -> Result<f64, ErrorKind> {
    let result = match op {
        BinaryOperator::Add => l + r,
        BinaryOperator::Subtract => l - r,
        BinaryOperator::Multiply => l * r,
        BinaryOperator::Divide => {
            if r == 0.0 {
                return Err(ErrorKind::Div0);
            }
            l / r
        }
        _ => {
            if l == 0.0 && r == 0.0 {
                return Err(ErrorKind::Num);
            }
            if l == 0.0 && r < 0.0 {
                return Err(ErrorKind::Div0);
            }
            l.powf(r)
        }
    };

    if result.is_finite() {
        Ok(result)
    } else {
        Err(ErrorKind::Num)
    }
}

fn number(result: Result<f64, ErrorKind>) -> TypedValue {
    match result {
        Ok(n) => TypedValue::Number(n),
        Err(e) => TypedValue::Error(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn n(v: f64) -> TypedValue {
        TypedValue::Number(v)
    }

    fn apply(
        op: BinaryOperator,
        l: impl Into<TypedValue>,
        r: impl Into<TypedValue>,
    ) -> TypedValue {
        binary(op, &l.into(), &r.into())
    }

    fn error(kind: ErrorKind) -> TypedValue {
        TypedValue::Error(kind)
    }

    #[test]
    fn test_arithmetic_coercion() {
        assert_eq!(apply(BinaryOperator::Add, "5", 3), n(8.0));
        assert_eq!(apply(BinaryOperator::Add, true, 1), n(2.0));
        assert_eq!(apply(BinaryOperator::Add, TypedValue::Blank, 1), n(1.0));
        assert_eq!(
            apply(BinaryOperator::Add, "abc", 1),
            TypedValue::Error(ErrorKind::Value)
        );
    }

    #[test]
    fn test_numeric_errors() {
        assert_eq!(apply(BinaryOperator::Divide, 1, 0), error(ErrorKind::Div0));
        assert_eq!(apply(BinaryOperator::Power, 0, 0), error(ErrorKind::Num));
        assert_eq!(apply(BinaryOperator::Power, 0, -1), error(ErrorKind::Div0));
        assert_eq!(apply(BinaryOperator::Power, -8, 0.5), error(ErrorKind::Num));
        assert_eq!(apply(BinaryOperator::Multiply, 1e300, 1e300), error(ErrorKind::Num));
        assert_eq!(apply(BinaryOperator::Power, 2, 10), n(1024.0));
    }

    #[test]
    fn test_left_error_wins() {
        assert_eq!(
            apply(
                BinaryOperator::Add,
                TypedValue::Error(ErrorKind::Na),
                TypedValue::Error(ErrorKind::Div0)
            ),
            TypedValue::Error(ErrorKind::Na)
        );
    }

    #[test]
    fn test_concat() {
        assert_eq!(apply(BinaryOperator::Concat, "a", 1.5), TypedValue::text("a1.5"));
        assert_eq!(
            apply(BinaryOperator::Concat, true, TypedValue::Blank),
            TypedValue::text("TRUE")
        );
    }

    #[test]
    fn test_comparison() {
        assert_eq!(apply(BinaryOperator::Equal, "abc", "ABC"), TypedValue::Boolean(true));
        assert_eq!(apply(BinaryOperator::LessThan, 1, "1"), TypedValue::Boolean(true));
        assert_eq!(apply(BinaryOperator::GreaterEqual, 2, 2), TypedValue::Boolean(true));
        assert_eq!(
            apply(BinaryOperator::NotEqual, TypedValue::Blank, 0),
            TypedValue::Boolean(false)
        );
    }

    #[test]
    fn test_unary() {
        assert_eq!(unary(UnaryOperator::Negate, TypedValue::text("2")), n(-2.0));
        assert_eq!(unary(UnaryOperator::Percent, n(50.0)), n(0.5));
        assert_eq!(unary(UnaryOperator::Plus, TypedValue::text("x")), TypedValue::text("x"));
        assert_eq!(
            unary(UnaryOperator::Negate, TypedValue::text("x")),
            TypedValue::Error(ErrorKind::Value)
        );
    }

    #[test]
    fn test_broadcasting() {
        let column = TypedValue::Array(vec![vec![n(1.0)], vec![n(2.0)]]);
        let row = TypedValue::Array(vec![vec![n(10.0), n(20.0)]]);

        assert_eq!(
            binary(BinaryOperator::Multiply, &column, &n(3.0)),
            TypedValue::Array(vec![vec![n(3.0)], vec![n(6.0)]])
        );
        assert_eq!(
            binary(BinaryOperator::Add, &column, &row),
            TypedValue::Array(vec![vec![n(11.0), n(21.0)], vec![n(12.0), n(22.0)]])
        );

        let pair = TypedValue::Array(vec![vec![n(1.0), n(2.0)]]);
        let triple = TypedValue::Array(vec![vec![n(1.0), n(1.0), n(1.0)]]);
        assert_eq!(
            binary(BinaryOperator::Add, &pair, &triple),
            TypedValue::Array(vec![vec![n(2.0), n(3.0), TypedValue::Error(ErrorKind::Na)]])
        );
    }
}
