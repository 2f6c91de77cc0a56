//! Typed values produced by formula evaluation

mod coerce;
mod compare;
mod error;

pub use coerce::{format_number, parse_number};
pub use compare::compare_values;
pub use error::ErrorKind;

use std::fmt;

/// The result of evaluating any formula expression
///
/// Arrays are stored row-major: the outer `Vec` holds rows, each inner `Vec`
/// holds that row's columns. All rows of an array have the same length.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TypedValue {
    /// Numeric value (IEEE-754 double)
    Number(f64),
    /// Text value
    Text(String),
    /// Boolean value (TRUE/FALSE)
    Boolean(bool),
    /// Empty cell or omitted argument
    #[default]
    Blank,
    /// Rectangular grid of values
    Array(Vec<Vec<TypedValue>>),
    /// Error value (#VALUE!, #REF!, etc.)
    Error(ErrorKind),
}

impl TypedValue {
    /// Create a new text value
    pub fn text<S: Into<String>>(s: S) -> Self {
        TypedValue::Text(s.into())
    }

    /// Check if the value is blank
    pub fn is_blank(&self) -> bool {
        matches!(self, TypedValue::Blank)
    }

    /// Check if the value is an error
    pub fn is_error(&self) -> bool {
        matches!(self, TypedValue::Error(_))
    }

    /// Check if the value is an array
    pub fn is_array(&self) -> bool {
        matches!(self, TypedValue::Array(_))
    }

    /// Get the error if this is one
    pub fn error(&self) -> Option<ErrorKind> {
        match self {
            TypedValue::Error(e) => Some(*e),
            _ => None,
        }
    }

    /// Rows and columns of the value; scalars are 1x1
    pub fn dimensions(&self) -> (usize, usize) {
        match self {
            TypedValue::Array(rows) => (rows.len(), rows.first().map_or(0, Vec::len)),
            _ => (1, 1),
        }
    }

    /// Collapse a 1x1 array to its only element
    ///
    /// Larger arrays cannot stand in for a scalar and become `#VALUE!`;
    /// scalars are returned unchanged.
    pub fn into_scalar(self) -> TypedValue {
        match self {
            TypedValue::Array(mut rows) => {
                if rows.len() == 1 && rows[0].len() == 1 {
                    rows.pop()
                        .and_then(|mut row| row.pop())
                        .unwrap_or(TypedValue::Blank)
                } else {
                    TypedValue::Error(ErrorKind::Value)
                }
            }
            other => other,
        }
    }

    /// Iterate over the scalar values: the elements of an array in row-major
    /// order, or the value itself
    pub fn iter_scalars(&self) -> Box<dyn Iterator<Item = &TypedValue> + '_> {
        match self {
            TypedValue::Array(rows) => Box::new(rows.iter().flatten()),
            other => Box::new(std::iter::once(other)),
        }
    }

    /// Get the type name for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            TypedValue::Number(_) => "number",
            TypedValue::Text(_) => "text",
            TypedValue::Boolean(_) => "boolean",
            TypedValue::Blank => "blank",
            TypedValue::Array(_) => "array",
            TypedValue::Error(_) => "error",
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::Number(n) => f.write_str(&format_number(*n)),
            TypedValue::Text(s) => f.write_str(s),
            TypedValue::Boolean(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            TypedValue::Blank => Ok(()),
            TypedValue::Error(e) => write!(f, "{}", e),
            TypedValue::Array(rows) => {
                f.write_str("{")?;
                for (r, row) in rows.iter().enumerate() {
                    if r > 0 {
                        f.write_str(";")?;
                    }
                    for (c, value) in row.iter().enumerate() {
                        if c > 0 {
                            f.write_str(",")?;
                        }
                        match value {
                            TypedValue::Text(s) => write!(f, "\"{}\"", s.replace('"', "\"\""))?,
                            other => write!(f, "{}", other)?,
                        }
                    }
                }
                f.write_str("}")
            }
        }
    }
}

impl From<bool> for TypedValue {
    fn from(b: bool) -> Self {
        TypedValue::Boolean(b)
    }
}

impl From<i32> for TypedValue {
    fn from(n: i32) -> Self {
        TypedValue::Number(n as f64)
    }
}

impl From<i64> for TypedValue {
    fn from(n: i64) -> Self {
        TypedValue::Number(n as f64)
    }
}

impl From<u32> for TypedValue {
    fn from(n: u32) -> Self {
        TypedValue::Number(n as f64)
    }
}

impl From<f64> for TypedValue {
    fn from(n: f64) -> Self {
        TypedValue::Number(n)
    }
}

impl From<&str> for TypedValue {
    fn from(s: &str) -> Self {
        TypedValue::text(s)
    }
}

impl From<String> for TypedValue {
    fn from(s: String) -> Self {
        TypedValue::Text(s)
    }
}

impl From<ErrorKind> for TypedValue {
    fn from(e: ErrorKind) -> Self {
        TypedValue::Error(e)
    }
}

impl From<Vec<Vec<TypedValue>>> for TypedValue {
    fn from(rows: Vec<Vec<TypedValue>>) -> Self {
        TypedValue::Array(rows)
    }
}
