//! Formula error types
//!
//! Only turning text into a formula can fail. Once a formula parses, every
//! evaluation problem is an error *value* (see `gridcalc_core::ErrorKind`).

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors raised while splitting formula text into tokens
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenizeError {
    /// A `"` string literal was never closed
    #[error("Unterminated string literal starting at position {0}")]
    UnterminatedString(usize),

    /// A `'` quoted sheet name was never closed
    #[error("Unterminated sheet name starting at position {0}")]
    UnterminatedSheetName(usize),

    /// A character that cannot start any token
    #[error("Unrecognized character '{character}' at position {position}")]
    UnrecognizedCharacter { character: char, position: usize },
}

/// Errors raised while building the syntax tree
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A token that cannot appear here
    #[error("Unexpected token '{text}' at position {position}")]
    UnexpectedToken { text: String, position: usize },

    /// The formula ended where an operand was required
    #[error("Unexpected end of formula")]
    UnexpectedEnd,

    /// An opening parenthesis or brace without its partner
    #[error("Unmatched parenthesis at position {0}")]
    UnmatchedParen(usize),

    /// Tokens left over after a complete expression
    #[error("Unexpected '{text}' after expression at position {position}")]
    TrailingTokens { text: String, position: usize },

    /// An empty operand where a value is mandatory, e.g. `=1+` or `=()`
    #[error("Missing operand at position {0}")]
    EmptyOperand(usize),

    /// Wrong number of arguments for a known function
    #[error("{name} takes {} arguments, got {actual}", arity(.min, .max))]
    ArgumentCount {
        name: String,
        min: usize,
        max: Option<usize>,
        actual: usize,
    },

    /// Ragged rows or a non-constant element in an array literal
    #[error("Invalid array constant: {0}")]
    InvalidArray(String),

    /// An identifier that is neither a function, a reference, nor a valid name
    #[error("Invalid name '{0}'")]
    InvalidName(String),

    /// Text that looks like a reference but is not a valid one
    #[error("Invalid reference '{text}': {source}")]
    InvalidReference {
        text: String,
        source: gridcalc_core::Error,
    },

    /// Nesting beyond the configured depth
    #[error("Formula nested deeper than {0} levels")]
    NestingTooDeep(usize),
}

fn arity(min: &usize, max: &Option<usize>) -> String {
    match max {
        Some(max) if max == min => format!("exactly {}", min),
        Some(max) => format!("{} to {}", min, max),
        None => format!("at least {}", min),
    }
}

/// Any error that can surface from formula text or from the cell store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    /// Tokenizer failure
    #[error("Tokenize error: {0}")]
    Tokenize(#[from] TokenizeError),

    /// Parser failure
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Address, sheet, or name failure from the core types
    #[error(transparent)]
    Core(#[from] gridcalc_core::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_count_message() {
        let err = ParseError::ArgumentCount {
            name: "NOT".into(),
            min: 1,
            max: Some(1),
            actual: 2,
        };
        assert_eq!(err.to_string(), "NOT takes exactly 1 arguments, got 2");

        let err = ParseError::ArgumentCount {
            name: "SUM".into(),
            min: 1,
            max: None,
            actual: 0,
        };
        assert_eq!(err.to_string(), "SUM takes at least 1 arguments, got 0");
    }

    #[test]
    fn test_error_conversion() {
        let err: FormulaError = TokenizeError::UnterminatedString(3).into();
        assert!(matches!(err, FormulaError::Tokenize(_)));
        assert_eq!(
            err.to_string(),
            "Tokenize error: Unterminated string literal starting at position 3"
        );
    }
}
