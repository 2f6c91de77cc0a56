//! Formula tokenizer
//!
//! Splits formula text into a flat token stream. The tokenizer only fails on
//! input it cannot classify at all (an unterminated literal or a stray
//! character); whether the tokens form a valid formula is decided by the
//! parser.

use crate::error::TokenizeError;
use gridcalc_core::ErrorKind;
use std::fmt;

/// One lexical unit of a formula
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text; for string literals, the unescaped contents
    pub text: String,
    /// Byte offset in the formula text
    pub position: usize,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>, position: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            position,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Token classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Operand(OperandKind),
    /// Unary `+` or `-`
    PrefixOperator,
    /// `+ - * / ^ & = <> < <= > >=`
    InfixOperator,
    /// `%`
    PostfixOperator,
    /// A function name; the `(` follows as its own token
    Function,
    OpenParen,
    CloseParen,
    OpenBrace,
    CloseBrace,
    Separator(SeparatorKind),
    /// `:`
    Range,
    Whitespace,
}

/// Kinds of operand tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    Number,
    Text,
    Logical,
    Error,
    /// A cell, sheet-qualified cell, or whole column/row span
    Reference,
    /// A defined name (or an identifier the parser will reject)
    Name,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeparatorKind {
    /// `,` between arguments or array columns
    Comma,
    /// `;` between array rows (also accepted between arguments)
    Semicolon,
}

/// Tokenize a formula; a leading `=` is skipped
///
/// # Example
/// ```
/// use gridcalc_formula::tokenizer::{tokenize, OperandKind, TokenKind};
///
/// let tokens = tokenize("=SUM(A1:B2)").unwrap();
/// assert_eq!(tokens[0].kind, TokenKind::Function);
/// assert_eq!(tokens[2].kind, TokenKind::Operand(OperandKind::Reference));
/// assert_eq!(tokens[3].kind, TokenKind::Range);
/// ```
pub fn tokenize(formula: &str) -> Result<Vec<Token>, TokenizeError> {
    let start = if formula.starts_with('=') { 1 } else { 0 };
    let mut tokenizer = Tokenizer {
        input: formula,
        pos: start,
        tokens: Vec::new(),
    };
    tokenizer.run()?;
    Ok(tokenizer.tokens)
}

struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
    tokens: Vec<Token>,
}

impl<'a> Tokenizer<'a> {
    fn run(&mut self) -> Result<(), TokenizeError> {
        while let Some(c) = self.peek() {
            let start = self.pos;
            match c {
                c if c.is_whitespace() => {
                    let len = self.rest().find(|c: char| !c.is_whitespace());
                    self.emit_len(TokenKind::Whitespace, len.unwrap_or(self.rest().len()));
                }
                '"' => self.scan_string()?,
                '\'' => self.scan_quoted_reference()?,
                '#' => self.scan_error()?,
                '+' | '-' => {
                    let kind = if self.expects_operand() {
                        TokenKind::PrefixOperator
                    } else {
                        TokenKind::InfixOperator
                    };
                    self.emit_len(kind, 1);
                }
                '*' | '/' | '^' | '&' | '=' => self.emit_len(TokenKind::InfixOperator, 1),
                '<' => {
                    let len = if self.rest().starts_with("<=") || self.rest().starts_with("<>") {
                        2
                    } else {
                        1
                    };
                    self.emit_len(TokenKind::InfixOperator, len);
                }
                '>' => {
                    let len = if self.rest().starts_with(">=") { 2 } else { 1 };
                    self.emit_len(TokenKind::InfixOperator, len);
                }
                '%' => self.emit_len(TokenKind::PostfixOperator, 1),
                ':' => self.emit_len(TokenKind::Range, 1),
                ',' => self.emit_len(TokenKind::Separator(SeparatorKind::Comma), 1),
                ';' => self.emit_len(TokenKind::Separator(SeparatorKind::Semicolon), 1),
                '(' => self.emit_len(TokenKind::OpenParen, 1),
                ')' => self.emit_len(TokenKind::CloseParen, 1),
                '{' => self.emit_len(TokenKind::OpenBrace, 1),
                '}' => self.emit_len(TokenKind::CloseBrace, 1),
                c if c.is_ascii_digit() || c == '.' || c == '$' => {
                    if let Some(len) = span_len(self.rest()) {
                        self.emit_len(TokenKind::Operand(OperandKind::Reference), len);
                    } else if c == '$' {
                        self.scan_word()?;
                    } else {
                        self.scan_number(start)?;
                    }
                }
                c if c.is_alphabetic() || c == '_' || c == '\\' => {
                    if let Some(len) = span_len(self.rest()) {
                        self.emit_len(TokenKind::Operand(OperandKind::Reference), len);
                    } else {
                        self.scan_word()?;
                    }
                }
                character => {
                    return Err(TokenizeError::UnrecognizedCharacter {
                        character,
                        position: start,
                    })
                }
            }
        }
        Ok(())
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn emit_len(&mut self, kind: TokenKind, len: usize) {
        let text = &self.input[self.pos..self.pos + len];
        self.tokens.push(Token::new(kind, text, self.pos));
        self.pos += len;
    }

    /// Whether a `+`/`-` here starts an operand rather than joining two
    fn expects_operand(&self) -> bool {
        match self
            .tokens
            .iter()
            .rev()
            .find(|t| t.kind != TokenKind::Whitespace)
        {
            None => true,
            Some(token) => matches!(
                token.kind,
                TokenKind::PrefixOperator
                    | TokenKind::InfixOperator
                    | TokenKind::OpenParen
                    | TokenKind::OpenBrace
                    | TokenKind::Separator(_)
                    | TokenKind::Range
            ),
        }
    }

    fn scan_string(&mut self) -> Result<(), TokenizeError> {
        let start = self.pos;
        let mut value = String::new();
        let mut chars = self.rest().char_indices().skip(1).peekable();

        while let Some((i, c)) = chars.next() {
            if c != '"' {
                value.push(c);
                continue;
            }
            if matches!(chars.peek(), Some((_, '"'))) {
                chars.next();
                value.push('"');
                continue;
            }
            self.tokens
                .push(Token::new(TokenKind::Operand(OperandKind::Text), value, start));
            self.pos += i + 1;
            return Ok(());
        }

        Err(TokenizeError::UnterminatedString(start))
    }

    /// `'Sheet Name'!A1`, `'Sheet Name'!A:C`, ...
    fn scan_quoted_reference(&mut self) -> Result<(), TokenizeError> {
        let start = self.pos;
        let mut chars = self.rest().char_indices().skip(1).peekable();

        let mut close = None;
        while let Some((i, c)) = chars.next() {
            if c == '\'' {
                if matches!(chars.peek(), Some((_, '\''))) {
                    chars.next();
                    continue;
                }
                close = Some(i);
                break;
            }
        }
        let close = close.ok_or(TokenizeError::UnterminatedSheetName(start))?;

        let after = &self.rest()[close + 1..];
        if !after.starts_with('!') {
            return Err(TokenizeError::UnrecognizedCharacter {
                character: '\'',
                position: start,
            });
        }
        let body = &after[1..];
        let len = close + 2 + reference_body_len(body);
        self.emit_len(TokenKind::Operand(OperandKind::Reference), len);
        Ok(())
    }

    fn scan_error(&mut self) -> Result<(), TokenizeError> {
        let rest = self.rest();
        for kind in ErrorKind::ALL {
            let text = kind.as_str();
            if rest.len() >= text.len()
                && rest.is_char_boundary(text.len())
                && rest[..text.len()].eq_ignore_ascii_case(text)
            {
                self.tokens.push(Token::new(
                    TokenKind::Operand(OperandKind::Error),
                    text,
                    self.pos,
                ));
                self.pos += text.len();
                return Ok(());
            }
        }
        Err(TokenizeError::UnrecognizedCharacter {
            character: '#',
            position: self.pos,
        })
    }

    fn scan_number(&mut self, start: usize) -> Result<(), TokenizeError> {
        let bytes = self.rest().as_bytes();
        let digits = |from: usize| {
            bytes[from..]
                .iter()
                .take_while(|b| b.is_ascii_digit())
                .count()
        };

        let mut len = digits(0);
        if bytes.get(len) == Some(&b'.') {
            len += 1 + digits(len + 1);
        }
        if len == 1 && bytes[0] == b'.' {
            return Err(TokenizeError::UnrecognizedCharacter {
                character: '.',
                position: start,
            });
        }
        if matches!(bytes.get(len), Some(b'e' | b'E')) {
            let sign = usize::from(matches!(bytes.get(len + 1), Some(b'+' | b'-')));
            let exponent = digits(len + 1 + sign);
            if exponent > 0 {
                len += 1 + sign + exponent;
            }
        }

        self.emit_len(TokenKind::Operand(OperandKind::Number), len);
        Ok(())
    }

    /// Identifiers: function names, booleans, cell addresses, sheet-qualified
    /// references, and defined names
    fn scan_word(&mut self) -> Result<(), TokenizeError> {
        let rest = self.rest();
        let len = word_len(rest);
        if len == 0 {
            return Err(TokenizeError::UnrecognizedCharacter {
                character: rest.chars().next().unwrap_or('$'),
                position: self.pos,
            });
        }
        let word = &rest[..len];
        let next = rest[len..].chars().next();

        if next == Some('!') {
            let body = &rest[len + 1..];
            let total = len + 1 + reference_body_len(body);
            self.emit_len(TokenKind::Operand(OperandKind::Reference), total);
            return Ok(());
        }

        let kind = if next == Some('(') {
            TokenKind::Function
        } else if word.eq_ignore_ascii_case("TRUE") || word.eq_ignore_ascii_case("FALSE") {
            TokenKind::Operand(OperandKind::Logical)
        } else if is_cell_address(word) {
            TokenKind::Operand(OperandKind::Reference)
        } else {
            TokenKind::Operand(OperandKind::Name)
        };
        self.emit_len(kind, len);
        Ok(())
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | '$' | '\\')
}

fn word_len(text: &str) -> usize {
    text.find(|c: char| !is_word_char(c)).unwrap_or(text.len())
}

/// Length of the address after `Sheet!`: a span, or a single word
fn reference_body_len(body: &str) -> usize {
    span_len(body).unwrap_or_else(|| word_len(body))
}

fn is_cell_address(word: &str) -> bool {
    lazy_regex::regex_is_match!(r"^\$?[A-Za-z]{1,3}\$?[0-9]+$", word)
}

/// Length of a whole-column (`A:C`) or whole-row (`1:3`) span at the start
/// of `text`, if there is one
fn span_len(text: &str) -> Option<usize> {
    let found = lazy_regex::regex_find!(
        r"^(?:\$?[A-Za-z]{1,3}:\$?[A-Za-z]{1,3}|\$?[0-9]+:\$?[0-9]+)",
        text
    )?;
    let len = found.len();
    match text[len..].chars().next() {
        Some(c) if is_word_char(c) || c == '(' || c == '!' => None,
        _ => Some(len),
    }
}
