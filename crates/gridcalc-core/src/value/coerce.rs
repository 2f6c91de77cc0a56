//! Type coercion rules
//!
//! Booleans become 0/1 in arithmetic, blanks become 0 (or "" in text
//! context), and text takes part in arithmetic only when it reads as a
//! number. Anything else is `#VALUE!`.

use super::{ErrorKind, TypedValue};
use lazy_regex::regex_captures;

impl TypedValue {
    /// Coerce to a number for arithmetic
    ///
    /// ```
    /// use gridcalc_core::{ErrorKind, TypedValue};
    ///
    /// assert_eq!(TypedValue::text("5").to_number(), Ok(5.0));
    /// assert_eq!(TypedValue::Boolean(true).to_number(), Ok(1.0));
    /// assert_eq!(TypedValue::text("abc").to_number(), Err(ErrorKind::Value));
    /// ```
    pub fn to_number(&self) -> Result<f64, ErrorKind> {
        match self {
            TypedValue::Number(n) => Ok(*n),
            TypedValue::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
            TypedValue::Blank => Ok(0.0),
            TypedValue::Text(s) => parse_number(s).ok_or(ErrorKind::Value),
            TypedValue::Error(e) => Err(*e),
            TypedValue::Array(_) => self.clone().into_scalar().to_number(),
        }
    }

    /// Coerce to text for concatenation and text functions
    pub fn to_text(&self) -> Result<String, ErrorKind> {
        match self {
            TypedValue::Number(n) => Ok(format_number(*n)),
            TypedValue::Text(s) => Ok(s.clone()),
            TypedValue::Boolean(b) => Ok(if *b { "TRUE" } else { "FALSE" }.to_string()),
            TypedValue::Blank => Ok(String::new()),
            TypedValue::Error(e) => Err(*e),
            TypedValue::Array(_) => self.clone().into_scalar().to_text(),
        }
    }

    /// Coerce to a boolean for logical tests
    pub fn to_bool(&self) -> Result<bool, ErrorKind> {
        match self {
            TypedValue::Boolean(b) => Ok(*b),
            TypedValue::Number(n) => Ok(*n != 0.0),
            TypedValue::Blank => Ok(false),
            TypedValue::Text(s) => {
                if s.eq_ignore_ascii_case("TRUE") {
                    Ok(true)
                } else if s.eq_ignore_ascii_case("FALSE") {
                    Ok(false)
                } else {
                    Err(ErrorKind::Value)
                }
            }
            TypedValue::Error(e) => Err(*e),
            TypedValue::Array(_) => self.clone().into_scalar().to_bool(),
        }
    }
}

/// Read text as a number the way arithmetic does
///
/// Accepts surrounding whitespace, a sign, decimal and exponent forms, and a
/// trailing percent sign. Empty text is not a number.
pub fn parse_number(text: &str) -> Option<f64> {
    let (_, digits, percent) = regex_captures!(
        r"^\s*([+-]?(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][+-]?[0-9]+)?)\s*(%?)\s*$",
        text
    )?;
    let n: f64 = digits.parse().ok()?;
    let n = if percent.is_empty() { n } else { n / 100.0 };
    n.is_finite().then_some(n)
}

/// Format a number in its shortest round-trip decimal form
///
/// Negative zero prints as `0`.
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        "0".to_string()
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_number() {
        assert_eq!(TypedValue::Number(2.5).to_number(), Ok(2.5));
        assert_eq!(TypedValue::Boolean(false).to_number(), Ok(0.0));
        assert_eq!(TypedValue::Blank.to_number(), Ok(0.0));
        assert_eq!(TypedValue::text(" 5 ").to_number(), Ok(5.0));
        assert_eq!(TypedValue::text("").to_number(), Err(ErrorKind::Value));
        assert_eq!(
            TypedValue::Error(ErrorKind::Div0).to_number(),
            Err(ErrorKind::Div0)
        );
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("42"), Some(42.0));
        assert_eq!(parse_number("-1.5"), Some(-1.5));
        assert_eq!(parse_number("+.5"), Some(0.5));
        assert_eq!(parse_number("1e3"), Some(1000.0));
        assert_eq!(parse_number("2.5E-1"), Some(0.25));
        assert_eq!(parse_number("50%"), Some(0.5));
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("1e"), None);
        assert_eq!(parse_number("1,000"), None);
        assert_eq!(parse_number("1e999"), None);
    }

    #[test]
    fn test_to_text() {
        assert_eq!(TypedValue::Number(3.0).to_text(), Ok("3".to_string()));
        assert_eq!(TypedValue::Number(0.5).to_text(), Ok("0.5".to_string()));
        assert_eq!(TypedValue::Boolean(true).to_text(), Ok("TRUE".to_string()));
        assert_eq!(TypedValue::Blank.to_text(), Ok(String::new()));
        assert_eq!(
            TypedValue::Error(ErrorKind::Na).to_text(),
            Err(ErrorKind::Na)
        );
    }

    #[test]
    fn test_to_bool() {
        assert_eq!(TypedValue::Number(2.0).to_bool(), Ok(true));
        assert_eq!(TypedValue::Number(0.0).to_bool(), Ok(false));
        assert_eq!(TypedValue::text("true").to_bool(), Ok(true));
        assert_eq!(TypedValue::text("yes").to_bool(), Err(ErrorKind::Value));
        assert_eq!(TypedValue::Blank.to_bool(), Ok(false));
    }

    #[test]
    fn test_format_number_round_trip() {
        for n in [0.1, 1.0 / 3.0, 123456789.125, 1e-7, 2.0f64.powi(60)] {
            let text = format_number(n);
            assert_eq!(text.parse::<f64>().unwrap(), n);
        }
    }
}
