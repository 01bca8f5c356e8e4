//! Scene script tokenizer and parser.
//!
//! # Syntax
//!
//! - `(` opens a list, `)` closes it
//! - `;` starts a comment that runs to the end of the line
//! - whitespace separates tokens
//! - `"..."` is a quoted string and may contain delimiters
//! - any other run of characters is a token: a number if it parses as one,
//!   otherwise a string
//!
//! The whole program is wrapped in a `(begin ...)` list so top-level forms
//! run in sequence.

use std::iter::Peekable;
use std::str::Chars;

use thiserror::Error;

use super::value::Value;

/// Errors that can occur while parsing a script.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("unexpected ')' at line {line}, column {column}")]
    UnexpectedClose { line: usize, column: usize },

    #[error("unclosed '(' opened at line {line}, column {column}")]
    UnclosedList { line: usize, column: usize },

    #[error("unterminated string starting at line {line}, column {column}")]
    UnterminatedString { line: usize, column: usize },
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Parse a whole program into a `(begin ...)` list.
pub fn parse(source: &str) -> ParseResult<Value> {
    let mut parser = Parser::new(source);
    let mut forms = vec![Value::str("begin")];
    forms.extend(parser.parse_list(None)?);
    Ok(Value::List(forms))
}

/// Classify a finished bare token.
fn recognize_token(token: &str) -> Value {
    let numeric_start = token
        .starts_with(|c: char| c.is_ascii_digit() || matches!(c, '+' | '-' | '.'));
    match token.parse::<f64>() {
        Ok(n) if numeric_start => Value::Number(n),
        _ => Value::str(token),
    }
}

struct Parser<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            column: 0,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Parse list items until the matching `)`, or until end of input at
    /// the top level (`open` is `None`).
    fn parse_list(&mut self, open: Option<(usize, usize)>) -> ParseResult<Vec<Value>> {
        let mut items = Vec::new();
        let mut token = String::new();

        while let Some(c) = self.bump() {
            let delimiter = c.is_whitespace() || matches!(c, '(' | ')' | ';');
            if delimiter && !token.is_empty() {
                items.push(recognize_token(&token));
                token.clear();
            }

            match c {
                c if c.is_whitespace() => {}
                ';' => self.skip_comment(),
                '(' => {
                    let at = (self.line, self.column);
                    items.push(Value::List(self.parse_list(Some(at))?));
                }
                ')' => {
                    return match open {
                        Some(_) => Ok(items),
                        None => Err(ParseError::UnexpectedClose {
                            line: self.line,
                            column: self.column,
                        }),
                    };
                }
                '"' if token.is_empty() => items.push(self.parse_quoted()?),
                c => token.push(c),
            }
        }

        if !token.is_empty() {
            items.push(recognize_token(&token));
        }

        match open {
            Some((line, column)) => Err(ParseError::UnclosedList { line, column }),
            None => Ok(items),
        }
    }

    fn skip_comment(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c == '\n' {
                break;
            }
            self.bump();
        }
    }

    /// Read the rest of a quoted string; the opening quote is consumed.
    fn parse_quoted(&mut self) -> ParseResult<Value> {
        let (line, column) = (self.line, self.column);
        let mut text = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(Value::Str(text)),
                Some(c) => text.push(c),
                None => return Err(ParseError::UnterminatedString { line, column }),
            }
        }
    }
}
