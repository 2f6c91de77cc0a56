//! Comparison rules for the `=`, `<>`, `<`, `<=`, `>`, `>=` operators

use super::TypedValue;
use std::cmp::Ordering;

/// Compare two values the way Excel's comparison operators do
///
/// Numbers sort before text, text before booleans. Text compares
/// case-insensitively. A blank takes the type of the other operand (0, "",
/// or FALSE). Errors are expected to be handled by the caller; they sort
/// after everything else.
pub fn compare_values(left: &TypedValue, right: &TypedValue) -> Ordering {
    let blank_as = |other: &TypedValue| match other {
        TypedValue::Text(_) => TypedValue::Text(String::new()),
        TypedValue::Boolean(_) => TypedValue::Boolean(false),
        _ => TypedValue::Number(0.0),
    };

    let (left, right) = match (left, right) {
        (TypedValue::Blank, TypedValue::Blank) => return Ordering::Equal,
        (TypedValue::Blank, other) => (blank_as(other), other.clone()),
        (other, TypedValue::Blank) => (other.clone(), blank_as(other)),
        (l, r) => (l.clone(), r.clone()),
    };

    match (&left, &right) {
        (TypedValue::Number(l), TypedValue::Number(r)) => {
            l.partial_cmp(r).unwrap_or(Ordering::Equal)
        }
        (TypedValue::Text(l), TypedValue::Text(r)) => l.to_lowercase().cmp(&r.to_lowercase()),
        (TypedValue::Boolean(l), TypedValue::Boolean(r)) => l.cmp(r),
        (TypedValue::Error(l), TypedValue::Error(r)) => l.cmp(r),
        _ => rank(&left).cmp(&rank(&right)),
    }
}

fn rank(value: &TypedValue) -> u8 {
    match value {
        TypedValue::Blank | TypedValue::Number(_) => 0,
        TypedValue::Text(_) => 1,
        TypedValue::Boolean(_) => 2,
        TypedValue::Array(_) | TypedValue::Error(_) => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmp(l: impl Into<TypedValue>, r: impl Into<TypedValue>) -> Ordering {
        compare_values(&l.into(), &r.into())
    }

    #[test]
    fn test_compare_same_type() {
        assert_eq!(cmp(1.0, 2.0), Ordering::Less);
        assert_eq!(cmp("apple", "APPLE"), Ordering::Equal);
        assert_eq!(cmp("b", "A"), Ordering::Greater);
        assert_eq!(cmp(false, true), Ordering::Less);
    }

    #[test]
    fn test_compare_mixed_types() {
        // number < text < boolean
        assert_eq!(cmp(1000.0, "1"), Ordering::Less);
        assert_eq!(cmp("zzz", false), Ordering::Less);
        assert_eq!(cmp(true, 5.0), Ordering::Greater);
    }

    #[test]
    fn test_compare_blank() {
        assert_eq!(cmp(TypedValue::Blank, 0.0), Ordering::Equal);
        assert_eq!(cmp(TypedValue::Blank, ""), Ordering::Equal);
        assert_eq!(cmp(TypedValue::Blank, false), Ordering::Equal);
        assert_eq!(cmp(TypedValue::Blank, -1.0), Ordering::Greater);
        assert_eq!(cmp("a", TypedValue::Blank), Ordering::Greater);
        assert_eq!(cmp(TypedValue::Blank, TypedValue::Blank), Ordering::Equal);
    }
}
