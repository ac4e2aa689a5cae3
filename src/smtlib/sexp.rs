//! S-expressions and their parser.
//!
//! The parser keeps open lists on an explicit stack, so nesting depth is bounded
//! only by memory. Dropping and printing an [`SExpr`] walk it the same way.

use std::fmt;

use logos::Logos;

use super::lexer::Token;

pub enum SExpr {
    Symbol(String),
    Keyword(String),
    Numeral(String),
    Decimal(String),
    BitVector(String),
    String(String),
    List(Vec<SExpr>),
}

impl SExpr {
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            SExpr::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[SExpr]> {
        match self {
            SExpr::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_numeral(&self) -> Option<&str> {
        match self {
            SExpr::Numeral(n) => Some(n),
            _ => None,
        }
    }
}

impl Drop for SExpr {
    fn drop(&mut self) {
        let items = match self {
            SExpr::List(items) => items,
            _ => return,
        };
        let mut pending = std::mem::take(items);
        while let Some(mut item) = pending.pop() {
            if let SExpr::List(children) = &mut item {
                pending.append(children);
            }
        }
    }
}

impl fmt::Display for SExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Lists being written, with their remaining items and whether one was written yet.
        let mut open: Vec<(std::slice::Iter<'_, SExpr>, bool)> = Vec::new();
        let mut current = self;
        loop {
            match current {
                SExpr::Symbol(s)
                | SExpr::Keyword(s)
                | SExpr::Numeral(s)
                | SExpr::Decimal(s)
                | SExpr::BitVector(s)
                | SExpr::String(s) => f.write_str(s)?,
                SExpr::List(items) => {
                    f.write_str("(")?;
                    open.push((items.iter(), false));
                }
            }
            loop {
                let (items, started) = match open.last_mut() {
                    Some(top) => top,
                    None => return Ok(()),
                };
                match items.next() {
                    Some(item) => {
                        if *started {
                            f.write_str(" ")?;
                        }
                        *started = true;
                        current = item;
                        break;
                    }
                    None => {
                        f.write_str(")")?;
                        open.pop();
                    }
                }
            }
        }
    }
}

impl fmt::Debug for SExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SExpr({})", self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    /// Byte offset in the input, if known.
    pub position: Option<usize>,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        ParseError {
            message: message.into(),
            position: None,
        }
    }

    pub fn with_position(message: impl Into<String>, position: usize) -> Self {
        ParseError {
            message: message.into(),
            position: Some(position),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(pos) => write!(f, "Parse error at position {}: {}", pos, self.message),
            None => write!(f, "Parse error: {}", self.message),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parses every top-level S-expression of `input`.
pub fn parse_all(input: &str) -> Result<Vec<SExpr>, ParseError> {
    let mut lexer = Token::lexer(input);
    let mut top = Vec::new();
    // Open lists: position of '(' and the items read so far.
    let mut open: Vec<(usize, Vec<SExpr>)> = Vec::new();

    while let Some(token) = lexer.next() {
        let start = lexer.span().start;
        let token = token.map_err(|_| ParseError::with_position("Invalid token", start))?;
        let expr = match token {
            Token::LParen => {
                open.push((start, Vec::new()));
                continue;
            }
            Token::RParen => {
                let (_, items) = open
                    .pop()
                    .ok_or_else(|| ParseError::with_position("Unexpected ')'", start))?;
                SExpr::List(items)
            }
            Token::Numeral(n) => SExpr::Numeral(n.to_string()),
            Token::Decimal(d) => SExpr::Decimal(d.to_string()),
            Token::BitVector(b) => SExpr::BitVector(b.to_string()),
            Token::String(s) => SExpr::String(s.to_string()),
            Token::Symbol(s) => SExpr::Symbol(s.to_string()),
            Token::QuotedSymbol(s) => SExpr::Symbol(s[1..s.len() - 1].to_string()),
            Token::Keyword(k) => SExpr::Keyword(k.to_string()),
        };
        match open.last_mut() {
            Some((_, items)) => items.push(expr),
            None => top.push(expr),
        }
    }

    if let Some(&(pos, _)) = open.last() {
        return Err(ParseError::with_position("Unclosed '('", pos));
    }
    Ok(top)
}
