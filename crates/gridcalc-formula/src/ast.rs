//! Formula abstract syntax tree

use gridcalc_core::{format_number, ErrorKind, Reference, TypedValue};
use std::fmt;

/// Formula expression AST
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // === Literals ===
    /// Numeric literal
    Number(f64),
    /// String literal
    Text(String),
    /// Boolean literal
    Boolean(bool),
    /// Error literal
    Error(ErrorKind),
    /// Array constant, e.g. `{1,2;3,4}`
    Array(Vec<Vec<TypedValue>>),

    // === References ===
    /// Static reference, sheet already resolved
    Reference(Reference),
    /// Defined name
    Name(String),

    /// Omitted function argument, as in `F(a,,b)`
    Missing,

    // === Operators ===
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expr>,
    },
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `:` between operands that are not both plain cells,
    /// e.g. `OFFSET(A1,1,0):B5`
    Range {
        start: Box<Expr>,
        end: Box<Expr>,
    },
    /// Space between two references
    Intersection {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Parenthesized list of references, `(A1:A5,C1:C5)`
    Union(Vec<Expr>),

    // === Function call ===
    Function {
        /// Uppercase name
        name: String,
        args: Vec<Expr>,
    },
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,

    // Text
    Concat,

    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
}

impl BinaryOperator {
    /// Operator from its formula symbol
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "+" => BinaryOperator::Add,
            "-" => BinaryOperator::Subtract,
            "*" => BinaryOperator::Multiply,
            "/" => BinaryOperator::Divide,
            "^" => BinaryOperator::Power,
            "&" => BinaryOperator::Concat,
            "=" => BinaryOperator::Equal,
            "<>" => BinaryOperator::NotEqual,
            "<" => BinaryOperator::LessThan,
            "<=" => BinaryOperator::LessEqual,
            ">" => BinaryOperator::GreaterThan,
            ">=" => BinaryOperator::GreaterEqual,
            _ => return None,
        })
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Power => "^",
            BinaryOperator::Concat => "&",
            BinaryOperator::Equal => "=",
            BinaryOperator::NotEqual => "<>",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterEqual => ">=",
        }
    }

    /// Whether the operator produces a boolean
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOperator::Equal
                | BinaryOperator::NotEqual
                | BinaryOperator::LessThan
                | BinaryOperator::LessEqual
                | BinaryOperator::GreaterThan
                | BinaryOperator::GreaterEqual
        )
    }

    fn precedence(self) -> u8 {
        match self {
            BinaryOperator::Power => PRECEDENCE_POWER,
            BinaryOperator::Multiply | BinaryOperator::Divide => 4,
            BinaryOperator::Add | BinaryOperator::Subtract => 3,
            BinaryOperator::Concat => 2,
            _ => 1,
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    /// Prefix `-`
    Negate,
    /// Prefix `+` (no-op on the value)
    Plus,
    /// Postfix `%`
    Percent,
}

const PRECEDENCE_POWER: u8 = 5;
const PRECEDENCE_PERCENT: u8 = 6;
const PRECEDENCE_PREFIX: u8 = 7;
const PRECEDENCE_INTERSECTION: u8 = 8;
const PRECEDENCE_RANGE: u8 = 9;
const PRECEDENCE_PRIMARY: u8 = 10;

impl Expr {
    /// Visit this node and all its descendants, parents first
    pub fn walk<'e>(&'e self, visit: &mut impl FnMut(&'e Expr)) {
        visit(self);
        match self {
            Expr::UnaryOp { operand, .. } => operand.walk(visit),
            Expr::BinaryOp { left, right, .. }
            | Expr::Range {
                start: left,
                end: right,
            }
            | Expr::Intersection { left, right } => {
                left.walk(visit);
                right.walk(visit);
            }
            Expr::Union(items) | Expr::Function { args: items, .. } => {
                for item in items {
                    item.walk(visit);
                }
            }
            _ => {}
        }
    }

    /// Static references anywhere in the expression, in source order
    pub fn references(&self) -> Vec<Reference> {
        let mut found = Vec::new();
        self.walk(&mut |expr| {
            if let Expr::Reference(reference) = expr {
                found.push(reference.clone());
            }
        });
        found
    }

    /// Defined names anywhere in the expression, in source order
    pub fn names<'e>(&'e self) -> Vec<&'e str> {
        let mut found = Vec::new();
        self.walk(&mut |expr: &'e Expr| {
            if let Expr::Name(name) = expr {
                found.push(name.as_str());
            }
        });
        found
    }

    /// Function names anywhere in the expression
    pub fn functions<'e>(&'e self) -> Vec<&'e str> {
        let mut found = Vec::new();
        self.walk(&mut |expr: &'e Expr| {
            if let Expr::Function { name, .. } = expr {
                found.push(name.as_str());
            }
        });
        found
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::BinaryOp { op, .. } => op.precedence(),
            Expr::UnaryOp {
                op: UnaryOperator::Percent,
                ..
            } => PRECEDENCE_PERCENT,
            Expr::UnaryOp { .. } => PRECEDENCE_PREFIX,
            Expr::Intersection { .. } => PRECEDENCE_INTERSECTION,
            Expr::Range { .. } => PRECEDENCE_RANGE,
            Expr::Number(n) if *n < 0.0 => PRECEDENCE_PREFIX,
            _ => PRECEDENCE_PRIMARY,
        }
    }

    fn write_operand(&self, f: &mut fmt::Formatter<'_>, min_precedence: u8) -> fmt::Result {
        if self.precedence() < min_precedence {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

fn write_text_literal(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    write!(f, "\"{}\"", text.replace('"', "\"\""))
}

fn write_constant(f: &mut fmt::Formatter<'_>, value: &TypedValue) -> fmt::Result {
    match value {
        TypedValue::Text(s) => write_text_literal(f, s),
        other => write!(f, "{}", other),
    }
}

impl fmt::Display for Expr {
    /// Formula text without the leading `=`; references are always sheet-qualified
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => f.write_str(&format_number(*n)),
            Expr::Text(s) => write_text_literal(f, s),
            Expr::Boolean(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            Expr::Error(e) => write!(f, "{}", e),
            Expr::Array(rows) => {
                f.write_str("{")?;
                for (r, row) in rows.iter().enumerate() {
                    if r > 0 {
                        f.write_str(";")?;
                    }
                    for (c, value) in row.iter().enumerate() {
                        if c > 0 {
                            f.write_str(",")?;
                        }
                        write_constant(f, value)?;
                    }
                }
                f.write_str("}")
            }
            Expr::Reference(reference) => write!(f, "{}", reference),
            Expr::Name(name) => f.write_str(name),
            Expr::Missing => Ok(()),
            Expr::UnaryOp { op, operand } => match op {
                UnaryOperator::Negate => {
                    f.write_str("-")?;
                    operand.write_operand(f, PRECEDENCE_PREFIX)
                }
                UnaryOperator::Plus => {
                    f.write_str("+")?;
                    operand.write_operand(f, PRECEDENCE_PREFIX)
                }
                UnaryOperator::Percent => {
                    operand.write_operand(f, PRECEDENCE_PERCENT)?;
                    f.write_str("%")
                }
            },
            Expr::BinaryOp { op, left, right } => {
                let precedence = op.precedence();
                // Power is right-associative, everything else left-associative
                let (left_min, right_min) = if *op == BinaryOperator::Power {
                    (precedence + 1, precedence)
                } else {
                    (precedence, precedence + 1)
                };
                left.write_operand(f, left_min)?;
                f.write_str(op.symbol())?;
                right.write_operand(f, right_min)
            }
            Expr::Range { start, end } => {
                start.write_operand(f, PRECEDENCE_RANGE)?;
                f.write_str(":")?;
                end.write_operand(f, PRECEDENCE_RANGE + 1)
            }
            Expr::Intersection { left, right } => {
                left.write_operand(f, PRECEDENCE_INTERSECTION)?;
                f.write_str(" ")?;
                right.write_operand(f, PRECEDENCE_INTERSECTION + 1)
            }
            Expr::Union(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str(")")
            }
            Expr::Function { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridcalc_core::Reference;

    fn reference(text: &str) -> Expr {
        Expr::Reference(Reference::parse(text, "Sheet1").unwrap())
    }

    fn binary(op: BinaryOperator, left: Expr, right: Expr) -> Expr {
        Expr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    #[test]
    fn test_display_parenthesizes_by_precedence() {
        let expr = binary(
            BinaryOperator::Multiply,
            binary(BinaryOperator::Add, Expr::Number(1.0), Expr::Number(2.0)),
            Expr::Number(3.0),
        );
        assert_eq!(expr.to_string(), "(1+2)*3");

        let expr = binary(
            BinaryOperator::Add,
            Expr::Number(1.0),
            binary(BinaryOperator::Multiply, Expr::Number(2.0), Expr::Number(3.0)),
        );
        assert_eq!(expr.to_string(), "1+2*3");

        let expr = binary(
            BinaryOperator::Power,
            Expr::Number(2.0),
            binary(BinaryOperator::Power, Expr::Number(3.0), Expr::Number(2.0)),
        );
        assert_eq!(expr.to_string(), "2^3^2");

        let expr = binary(
            BinaryOperator::Subtract,
            Expr::Number(1.0),
            binary(BinaryOperator::Subtract, Expr::Number(2.0), Expr::Number(3.0)),
        );
        assert_eq!(expr.to_string(), "1-(2-3)");
    }

    #[test]
    fn test_display_literals_and_calls() {
        let expr = Expr::Function {
            name: "CONCAT".into(),
            args: vec![
                Expr::Text("say \"hi\"".into()),
                Expr::Missing,
                reference("'My Sheet'!A1:B2"),
            ],
        };
        assert_eq!(expr.to_string(), "CONCAT(\"say \"\"hi\"\"\",,'My Sheet'!A1:B2)");

        let expr = Expr::Array(vec![
            vec![TypedValue::Number(1.0), TypedValue::text("x")],
            vec![TypedValue::Boolean(true), TypedValue::Error(ErrorKind::Na)],
        ]);
        assert_eq!(expr.to_string(), "{1,\"x\";TRUE,#N/A}");
    }

    #[test]
    fn test_references_and_names() {
        let expr = binary(
            BinaryOperator::Add,
            Expr::Function {
                name: "SUM".into(),
                args: vec![reference("A1:A3"), Expr::Name("Rate".into())],
            },
            reference("Data!B2"),
        );
        let refs: Vec<String> = expr.references().iter().map(|r| r.to_string()).collect();
        assert_eq!(refs, vec!["Sheet1!A1:A3", "Data!B2"]);
        assert_eq!(expr.names(), vec!["Rate"]);
        assert_eq!(expr.functions(), vec!["SUM"]);
    }
}
