//! Formula parser
//!
//! A recursive descent parser over the token stream. Precedence, lowest to
//! highest:
//!
//! 1. Comparison: `=`, `<>`, `<`, `<=`, `>`, `>=`
//! 2. Concatenation: `&`
//! 3. Addition/Subtraction: `+`, `-`
//! 4. Multiplication/Division: `*`, `/`
//! 5. Exponentiation: `^` (right-associative)
//! 6. Percent: postfix `%`
//! 7. Prefix `-` and `+`
//! 8. Intersection: a space between references
//! 9. Range: `:`
//! 10. Primary: literals, references, names, calls, parentheses, arrays

use crate::ast::{BinaryOperator, Expr, UnaryOperator};
use crate::error::{FormulaResult, ParseError};
use crate::functions::FunctionRegistry;
use crate::stack::ensure_sufficient_stack;
use crate::tokenizer::{tokenize, OperandKind, SeparatorKind, Token, TokenKind};
use gridcalc_core::{ErrorKind, RangeReference, Reference, SheetName, TypedValue};

/// Deepest nesting of parentheses, calls, and prefix operators accepted
pub const MAX_NESTING: usize = 4096;

/// Parse formula text into an AST using the built-in function registry
///
/// # Example
/// ```rust
/// use gridcalc_core::SheetName;
/// use gridcalc_formula::parse_formula;
///
/// let sheet = SheetName::default();
/// let ast = parse_formula("=1+2", &sheet).unwrap();
/// let ast = parse_formula("=SUM(A1:A10)", &sheet).unwrap();
/// let ast = parse_formula("=IF(A1>0,\"Yes\",\"No\")", &sheet).unwrap();
/// ```
pub fn parse_formula(formula: &str, default_sheet: &SheetName) -> FormulaResult<Expr> {
    let tokens = tokenize(formula.trim())?;
    Ok(parse(tokens, default_sheet)?)
}

/// Build an AST from tokens, checking calls against the built-in registry
pub fn parse(tokens: Vec<Token>, default_sheet: &SheetName) -> Result<Expr, ParseError> {
    parse_with(tokens, default_sheet, FunctionRegistry::builtin())
}

/// Build an AST from tokens, checking calls against `registry`
///
/// Unqualified references land on `default_sheet`. Calls to functions the
/// registry knows are checked for argument count; unknown names are
/// accepted and evaluate to `#NAME?`.
pub fn parse_with(
    tokens: Vec<Token>,
    default_sheet: &SheetName,
    registry: &FunctionRegistry,
) -> Result<Expr, ParseError> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        sheet: default_sheet.clone(),
        registry,
        depth: 0,
    };

    let expr = parser.parse_expression()?;

    // Make sure we consumed all input
    parser.skip_whitespace();
    if let Some(token) = parser.tokens.get(parser.pos) {
        return Err(match token.kind {
            TokenKind::CloseParen => ParseError::UnmatchedParen(token.position),
            _ => ParseError::TrailingTokens {
                text: token.text.clone(),
                position: token.position,
            },
        });
    }

    Ok(expr)
}

struct Parser<'r> {
    tokens: Vec<Token>,
    pos: usize,
    sheet: SheetName,
    registry: &'r FunctionRegistry,
    depth: usize,
}

impl<'r> Parser<'r> {
    // === Token helpers ===

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while matches!(
            self.tokens.get(self.pos),
            Some(Token {
                kind: TokenKind::Whitespace,
                ..
            })
        ) {
            self.pos += 1;
        }
        self.pos > start
    }

    /// Next significant token, without consuming it
    fn peek(&mut self) -> Option<&Token> {
        self.skip_whitespace();
        self.tokens.get(self.pos)
    }

    fn peek_kind(&mut self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn next(&mut self) -> Option<Token> {
        self.skip_whitespace();
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn unexpected(token: &Token) -> ParseError {
        ParseError::UnexpectedToken {
            text: token.text.clone(),
            position: token.position,
        }
    }

    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(ParseError::NestingTooDeep(MAX_NESTING));
        }
        self.depth += 1;
        let result = ensure_sufficient_stack(|| f(self));
        self.depth -= 1;
        result
    }

    // === Expression parsing with precedence ===

    fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.nested(Self::parse_comparison)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_concatenation()?;

        while let Some(op) = self.peek_infix(BinaryOperator::is_comparison) {
            self.next();
            let right = self.parse_concatenation()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_concatenation(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_additive()?;

        while let Some(op) = self.peek_infix(|op| op == BinaryOperator::Concat) {
            self.next();
            let right = self.parse_additive()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_multiplicative()?;

        while let Some(op) = self.peek_infix(|op| {
            matches!(op, BinaryOperator::Add | BinaryOperator::Subtract)
        }) {
            self.next();
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_exponent()?;

        while let Some(op) = self.peek_infix(|op| {
            matches!(op, BinaryOperator::Multiply | BinaryOperator::Divide)
        }) {
            self.next();
            let right = self.parse_exponent()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_exponent(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_percent()?;

        if let Some(op) = self.peek_infix(|op| op == BinaryOperator::Power) {
            self.next();
            let right = self.nested(Self::parse_exponent)?; // Right associative
            return Ok(binary(op, left, right));
        }

        Ok(left)
    }

    fn parse_percent(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_unary()?;

        while self.peek_kind() == Some(TokenKind::PostfixOperator) {
            self.next();
            expr = Expr::UnaryOp {
                op: UnaryOperator::Percent,
                operand: Box::new(expr),
            };
        }

        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let Some(token) = self.peek() else {
            return Err(ParseError::UnexpectedEnd);
        };

        // A `+`/`-` the tokenizer saw as infix is still a prefix here
        let op = match (token.kind, token.text.as_str()) {
            (TokenKind::PrefixOperator | TokenKind::InfixOperator, "-") => {
                Some(UnaryOperator::Negate)
            }
            (TokenKind::PrefixOperator | TokenKind::InfixOperator, "+") => {
                Some(UnaryOperator::Plus)
            }
            _ => None,
        };
        let Some(op) = op else {
            return self.parse_intersection();
        };

        self.next();
        let operand = self.nested(Self::parse_unary)?;
        Ok(Expr::UnaryOp {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_intersection(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_range()?;

        // Whitespace between two references is the intersection operator
        loop {
            let checkpoint = self.pos;
            if !self.skip_whitespace() || !self.is_reference_like(&left) {
                self.pos = checkpoint;
                break;
            }
            let starts_reference = match self.tokens.get(self.pos) {
                Some(token) => match token.kind {
                    TokenKind::Operand(OperandKind::Reference | OperandKind::Name) => true,
                    TokenKind::Function => self.returns_reference(&token.text),
                    _ => false,
                },
                None => false,
            };
            if !starts_reference {
                self.pos = checkpoint;
                break;
            }

            let right = self.parse_range()?;
            left = Expr::Intersection {
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_range(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_primary()?;

        while self.peek_range_operator() {
            self.next();

            // An unqualified end corner stays on the start corner's sheet
            let right = match &left {
                Expr::Reference(reference) => {
                    let sheet = reference.sheet().clone();
                    self.parse_primary_on(&sheet)?
                }
                _ => self.parse_primary()?,
            };

            left = match (left, right) {
                (Expr::Reference(start), Expr::Reference(end)) => fold_range(start, end)?,
                (start, end) => Expr::Range {
                    start: Box::new(start),
                    end: Box::new(end),
                },
            };
        }

        Ok(left)
    }

    /// `:` directly after an operand (no whitespace in between)
    fn peek_range_operator(&self) -> bool {
        matches!(
            self.tokens.get(self.pos),
            Some(Token {
                kind: TokenKind::Range,
                ..
            })
        )
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let sheet = self.sheet.clone();
        self.parse_primary_on(&sheet)
    }

    fn parse_primary_on(&mut self, sheet: &SheetName) -> Result<Expr, ParseError> {
        let Some(token) = self.next() else {
            return Err(ParseError::UnexpectedEnd);
        };

        match token.kind {
            TokenKind::Operand(OperandKind::Number) => {
                let n: f64 = token.text.parse().map_err(|_| Self::unexpected(&token))?;
                Ok(Expr::Number(n))
            }

            TokenKind::Operand(OperandKind::Text) => Ok(Expr::Text(token.text)),

            TokenKind::Operand(OperandKind::Logical) => {
                Ok(Expr::Boolean(token.text.eq_ignore_ascii_case("TRUE")))
            }

            TokenKind::Operand(OperandKind::Error) => ErrorKind::from_str(&token.text)
                .map(Expr::Error)
                .ok_or_else(|| Self::unexpected(&token)),

            TokenKind::Operand(OperandKind::Reference) => Reference::parse_in(&token.text, sheet)
                .map(Expr::Reference)
                .map_err(|source| ParseError::InvalidReference {
                    text: token.text,
                    source,
                }),

            TokenKind::Operand(OperandKind::Name) => {
                if token.text.contains('$') {
                    return Err(ParseError::InvalidName(token.text));
                }
                Ok(Expr::Name(token.text))
            }

            TokenKind::Function => self.nested(|parser| parser.parse_function_call(token)),

            TokenKind::OpenParen => self.nested(|parser| parser.parse_parenthesized(token)),

            TokenKind::OpenBrace => self.parse_array(token),

            TokenKind::CloseParen | TokenKind::CloseBrace | TokenKind::Separator(_) => {
                Err(ParseError::EmptyOperand(token.position))
            }

            _ => Err(Self::unexpected(&token)),
        }
    }

    /// `(expr)` or a union `(ref, ref, ...)`
    fn parse_parenthesized(&mut self, open: Token) -> Result<Expr, ParseError> {
        let first = self.parse_expression()?;

        // A comma list in parentheses is a union; every member is a reference
        let mut items = Vec::new();
        while let Some(comma) = self
            .peek()
            .filter(|t| t.kind == TokenKind::Separator(SeparatorKind::Comma))
            .cloned()
        {
            if items.is_empty() && !self.is_reference_like(&first) {
                return Err(Self::unexpected(&comma));
            }
            self.next();
            let item_start = self.peek().cloned();
            let item = self.parse_expression()?;
            if !self.is_reference_like(&item) {
                return Err(match item_start {
                    Some(token) => Self::unexpected(&token),
                    None => ParseError::UnexpectedEnd,
                });
            }
            items.push(item);
        }

        match self.next() {
            Some(Token {
                kind: TokenKind::CloseParen,
                ..
            }) => {}
            Some(token) => return Err(Self::unexpected(&token)),
            None => return Err(ParseError::UnmatchedParen(open.position)),
        }

        if items.is_empty() {
            return Ok(first);
        }
        items.insert(0, first);
        Ok(Expr::Union(items))
    }

    fn parse_function_call(&mut self, name_token: Token) -> Result<Expr, ParseError> {
        let name = name_token.text.to_uppercase();
        let open = match self.next() {
            Some(token) if token.kind == TokenKind::OpenParen => token,
            Some(token) => return Err(Self::unexpected(&token)),
            None => return Err(ParseError::UnexpectedEnd),
        };

        let mut args = Vec::new();

        // Parse arguments
        if self.peek_kind() == Some(TokenKind::CloseParen) {
            self.next();
        } else {
            loop {
                let arg = match self.peek_kind() {
                    Some(TokenKind::Separator(_) | TokenKind::CloseParen) => Expr::Missing,
                    None => return Err(ParseError::UnmatchedParen(open.position)),
                    _ => self.parse_expression()?,
                };
                args.push(arg);

                match self.next() {
                    Some(Token {
                        kind: TokenKind::Separator(_),
                        ..
                    }) => continue,
                    Some(Token {
                        kind: TokenKind::CloseParen,
                        ..
                    }) => break,
                    Some(token) => return Err(Self::unexpected(&token)),
                    None => return Err(ParseError::UnmatchedParen(open.position)),
                }
            }
        }

        if let Some(def) = self.registry.get(&name) {
            let too_many = def.max_args.map_or(false, |max| args.len() > max);
            if args.len() < def.min_args || too_many {
                return Err(ParseError::ArgumentCount {
                    name,
                    min: def.min_args,
                    max: def.max_args,
                    actual: args.len(),
                });
            }
        }

        Ok(Expr::Function { name, args })
    }

    fn parse_array(&mut self, open: Token) -> Result<Expr, ParseError> {
        let mut rows: Vec<Vec<TypedValue>> = Vec::new();
        let mut current_row = Vec::new();

        loop {
            current_row.push(self.parse_array_element(&open)?);

            match self.next() {
                Some(Token {
                    kind: TokenKind::Separator(SeparatorKind::Comma),
                    ..
                }) => {}
                Some(Token {
                    kind: TokenKind::Separator(SeparatorKind::Semicolon),
                    ..
                }) => rows.push(std::mem::take(&mut current_row)),
                Some(Token {
                    kind: TokenKind::CloseBrace,
                    ..
                }) => {
                    rows.push(current_row);
                    break;
                }
                Some(token) => return Err(Self::unexpected(&token)),
                None => return Err(ParseError::UnmatchedParen(open.position)),
            }
        }

        let width = rows[0].len();
        if rows.iter().any(|row| row.len() != width) {
            return Err(ParseError::InvalidArray(
                "rows have different lengths".into(),
            ));
        }

        Ok(Expr::Array(rows))
    }

    fn parse_array_element(&mut self, open: &Token) -> Result<TypedValue, ParseError> {
        let Some(token) = self.next() else {
            return Err(ParseError::UnmatchedParen(open.position));
        };

        let negate = token.kind == TokenKind::PrefixOperator && token.text == "-";
        let token = if token.kind == TokenKind::PrefixOperator {
            let next = self.next().ok_or(ParseError::UnexpectedEnd)?;
            if next.kind != TokenKind::Operand(OperandKind::Number) {
                return Err(ParseError::InvalidArray(format!(
                    "'{}' cannot follow a sign",
                    next.text
                )));
            }
            next
        } else {
            token
        };

        match token.kind {
            TokenKind::Operand(OperandKind::Number) => {
                let n: f64 = token.text.parse().map_err(|_| Self::unexpected(&token))?;
                Ok(TypedValue::Number(if negate { -n } else { n }))
            }
            TokenKind::Operand(OperandKind::Text) => Ok(TypedValue::Text(token.text)),
            TokenKind::Operand(OperandKind::Logical) => Ok(TypedValue::Boolean(
                token.text.eq_ignore_ascii_case("TRUE"),
            )),
            TokenKind::Operand(OperandKind::Error) => ErrorKind::from_str(&token.text)
                .map(TypedValue::Error)
                .ok_or_else(|| Self::unexpected(&token)),
            _ => Err(ParseError::InvalidArray(format!(
                "'{}' is not a constant",
                token.text
            ))),
        }
    }

    // === Helpers ===

    fn peek_infix(&mut self, accept: impl Fn(BinaryOperator) -> bool) -> Option<BinaryOperator> {
        let token = self.peek()?;
        if token.kind != TokenKind::InfixOperator {
            return None;
        }
        BinaryOperator::from_symbol(&token.text).filter(|op| accept(*op))
    }

    fn returns_reference(&self, function: &str) -> bool {
        self.registry
            .get(function)
            .map_or(false, |def| def.reference.is_some())
    }

    fn is_reference_like(&self, expr: &Expr) -> bool {
        match expr {
            Expr::Reference(_)
            | Expr::Name(_)
            | Expr::Range { .. }
            | Expr::Intersection { .. }
            | Expr::Union(_) => true,
            Expr::Function { name, .. } => self.returns_reference(name),
            _ => false,
        }
    }
}

fn binary(op: BinaryOperator, left: Expr, right: Expr) -> Expr {
    Expr::BinaryOp {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// Combine two static references joined by `:`
///
/// Cells and ranges on one sheet fold into their bounding range; anything
/// else (spans, mixed shapes) stays a dynamic range node.
fn fold_range(start: Reference, end: Reference) -> Result<Expr, ParseError> {
    let (first, second) = match (&start, &end) {
        (
            Reference::Cell(_) | Reference::Range(_),
            Reference::Cell(_) | Reference::Range(_),
        ) => (start.to_range(), end.to_range()),
        _ => {
            return Ok(Expr::Range {
                start: Box::new(Expr::Reference(start)),
                end: Box::new(Expr::Reference(end)),
            })
        }
    };

    let folded = match (&start, &end) {
        (Reference::Cell(a), Reference::Cell(b)) => RangeReference::new(a.clone(), b.clone()),
        _ => first.bounding(&second),
    };
    folded
        .map(|range| Expr::Reference(Reference::Range(range)))
        .map_err(|source| ParseError::InvalidReference {
            text: format!("{}:{}", start, end),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse_text(formula: &str) -> Result<Expr, crate::error::FormulaError> {
        parse_formula(formula, &SheetName::default())
    }

    fn ast(formula: &str) -> Expr {
        parse_text(formula).unwrap()
    }

    fn parse_error(formula: &str) -> ParseError {
        match parse_text(formula) {
            Err(crate::error::FormulaError::Parse(err)) => err,
            other => panic!("expected parse error for {}, got {:?}", formula, other),
        }
    }

    fn reference(text: &str) -> Expr {
        Expr::Reference(Reference::parse(text, "Sheet1").unwrap())
    }

    #[test]
    fn test_parse_literals() {
        assert_eq!(ast("=42"), Expr::Number(42.0));
        assert_eq!(ast("=1e10"), Expr::Number(1e10));
        assert_eq!(
            ast("=\"Hello \"\"World\"\"\""),
            Expr::Text("Hello \"World\"".into())
        );
        assert_eq!(ast("=TRUE"), Expr::Boolean(true));
        assert_eq!(ast("=false"), Expr::Boolean(false));
        assert_eq!(ast("=#DIV/0!"), Expr::Error(ErrorKind::Div0));
    }

    #[test]
    fn test_parse_precedence() {
        assert_eq!(ast("=1+2*3").to_string(), "1+2*3");
        assert_eq!(ast("=(1+2)*3").to_string(), "(1+2)*3");
        assert_eq!(ast("=1-2-3").to_string(), "1-2-3");

        // Right-associative exponent: 2^(3^2)
        let Expr::BinaryOp { op, left, right } = ast("=2^3^2") else {
            panic!("expected BinaryOp");
        };
        assert_eq!(op, BinaryOperator::Power);
        assert_eq!(*left, Expr::Number(2.0));
        assert!(matches!(
            *right,
            Expr::BinaryOp {
                op: BinaryOperator::Power,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_unary_binds_tighter_than_power() {
        // -2^2 is (-2)^2
        let Expr::BinaryOp { op, left, .. } = ast("=-2^2") else {
            panic!("expected BinaryOp");
        };
        assert_eq!(op, BinaryOperator::Power);
        assert!(matches!(
            *left,
            Expr::UnaryOp {
                op: UnaryOperator::Negate,
                ..
            }
        ));

        assert!(matches!(
            ast("=50%"),
            Expr::UnaryOp {
                op: UnaryOperator::Percent,
                ..
            }
        ));
        assert_eq!(ast("=1*-2").to_string(), "1*-2");
        assert_eq!(ast("=--A1").to_string(), "--Sheet1!A1");
    }

    #[test]
    fn test_parse_comparison_and_concat() {
        let Expr::BinaryOp { op, left, .. } = ast("=\"a\"&\"b\"=\"ab\"") else {
            panic!("expected BinaryOp");
        };
        assert_eq!(op, BinaryOperator::Equal);
        assert!(matches!(
            *left,
            Expr::BinaryOp {
                op: BinaryOperator::Concat,
                ..
            }
        ));
        assert!(matches!(
            ast("=A1<>B1"),
            Expr::BinaryOp {
                op: BinaryOperator::NotEqual,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_references() {
        assert_eq!(ast("=$B$2"), reference("$B$2"));
        assert_eq!(ast("=A1:B10"), reference("A1:B10"));
        assert_eq!(ast("=B10:A1"), reference("A1:B10"));
        assert_eq!(ast("=Data!A1:B2"), reference("Data!A1:B2"));
        assert_eq!(ast("=A:A"), reference("A:A"));
        assert_eq!(ast("='My Sheet'!3:4"), reference("'My Sheet'!3:4"));

        // Bounding range of a chained range
        assert_eq!(ast("=A1:B2:C3"), reference("A1:C3"));

        assert!(matches!(
            parse_error("=A1:Other!B2"),
            ParseError::InvalidReference { .. }
        ));
        assert!(matches!(
            parse_error("=XFE1:A1"),
            ParseError::InvalidReference { .. }
        ));
    }

    #[test]
    fn test_parse_dynamic_range_and_intersection() {
        let expr = ast("=OFFSET(A1,1,0):B5");
        assert!(matches!(expr, Expr::Range { .. }));

        let expr = ast("=SUM(A1:C3 B2:D4)");
        let Expr::Function { args, .. } = expr else {
            panic!("expected Function");
        };
        assert!(matches!(args[0], Expr::Intersection { .. }));

        // Whitespace around operators is not an intersection
        assert!(matches!(
            ast("=A1 + B1"),
            Expr::BinaryOp {
                op: BinaryOperator::Add,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_union() {
        let expr = ast("=INDEX((A1:A5,C1:C5),1,1,2)");
        let Expr::Function { name, args } = expr else {
            panic!("expected Function");
        };
        assert_eq!(name, "INDEX");
        assert_eq!(
            args[0],
            Expr::Union(vec![reference("A1:A5"), reference("C1:C5")])
        );

        assert_eq!(
            ast("=(A1:A2,OFFSET(C1,1,0))"),
            Expr::Union(vec![
                reference("A1:A2"),
                Expr::Function {
                    name: "OFFSET".to_string(),
                    args: vec![reference("C1"), Expr::Number(1.0), Expr::Number(0.0)],
                },
            ])
        );
        assert_eq!(
            parse_error("=(1,2)"),
            ParseError::UnexpectedToken {
                text: ",".to_string(),
                position: 3,
            }
        );
        assert_eq!(
            parse_error("=(A1,\"x\")"),
            ParseError::UnexpectedToken {
                text: "x".to_string(),
                position: 5,
            }
        );
        assert!(matches!(
            parse_error("=SUM((A1,1+2))"),
            ParseError::UnexpectedToken { .. }
        ));
    }

    #[test]
    fn test_parse_function() {
        let Expr::Function { name, args } = ast("=sum(1,2,3)") else {
            panic!("expected Function");
        };
        assert_eq!(name, "SUM");
        assert_eq!(args.len(), 3);

        let Expr::Function { args, .. } = ast("=IF(A1,,2)") else {
            panic!("expected Function");
        };
        assert_eq!(args[1], Expr::Missing);

        let Expr::Function { args, .. } = ast("=NA()") else {
            panic!("expected Function");
        };
        assert!(args.is_empty());

        // Unknown functions parse
        assert!(matches!(ast("=NOSUCH(1)"), Expr::Function { .. }));
    }

    #[test]
    fn test_parse_argument_count() {
        assert_eq!(
            parse_error("=NOT(1,2)"),
            ParseError::ArgumentCount {
                name: "NOT".into(),
                min: 1,
                max: Some(1),
                actual: 2
            }
        );
        assert!(matches!(
            parse_error("=SUM()"),
            ParseError::ArgumentCount { actual: 0, .. }
        ));
    }

    #[test]
    fn test_parse_array() {
        assert_eq!(
            ast("={1,2;-3,\"x\"}"),
            Expr::Array(vec![
                vec![TypedValue::Number(1.0), TypedValue::Number(2.0)],
                vec![TypedValue::Number(-3.0), TypedValue::text("x")],
            ])
        );
        assert!(matches!(
            parse_error("={1,2;3}"),
            ParseError::InvalidArray(_)
        ));
        assert!(matches!(
            parse_error("={A1}"),
            ParseError::InvalidArray(_)
        ));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_error("="), ParseError::UnexpectedEnd);
        assert_eq!(parse_error("=1+"), ParseError::UnexpectedEnd);
        assert_eq!(parse_error("=(1+2"), ParseError::UnmatchedParen(1));
        assert_eq!(parse_error("=1+2)"), ParseError::UnmatchedParen(4));
        assert_eq!(parse_error("=SUM(1"), ParseError::UnmatchedParen(4));
        assert_eq!(parse_error("=()"), ParseError::EmptyOperand(2));
        assert!(matches!(
            parse_error("=1 2"),
            ParseError::TrailingTokens { position: 3, .. }
        ));
        assert!(matches!(
            parse_error("=*2"),
            ParseError::UnexpectedToken { .. }
        ));
    }

    #[test]
    fn test_nesting_limit() {
        let deep = format!("={}1{}", "(".repeat(MAX_NESTING + 1), ")".repeat(MAX_NESTING + 1));
        assert_eq!(parse_error(&deep), ParseError::NestingTooDeep(MAX_NESTING));

        let fine = format!("={}1{}", "(".repeat(200), ")".repeat(200));
        assert_eq!(ast(&fine), Expr::Number(1.0));
    }
}
