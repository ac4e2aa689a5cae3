//! A small SMT-LIB reader for quantifier-free formulas over uninterpreted sorts
//! and functions.
//!
//! The pipeline is [`lexer`] → [`sexp`] → [`elaborate`] (into a hash-consed
//! [`TermStore`]) → [`normalize`] (clauses). It checks sorts but decides
//! nothing: the result is handed to the [analyzer](crate::analyzer) through
//! [`ExprView`](crate::analyzer::ExprView).

use std::fmt;

pub mod elaborate;
pub mod lexer;
pub mod normalize;
pub mod sexp;
pub mod term;

pub use elaborate::{elaborate, Script};
pub use normalize::{normalize, to_cnf, Goal, Normalized};
pub use sexp::{parse_all, ParseError, SExpr};
pub use term::{Op, Sort, TermId, TermStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrontEndError {
    /// Malformed input.
    Parse(ParseError),
    /// Well-formed input outside the supported fragment.
    Unsupported(String),
    /// Use of an undeclared symbol or sort.
    Undeclared(String),
    /// Sort mismatch or conflicting declaration.
    Sort(String),
}

impl From<ParseError> for FrontEndError {
    fn from(e: ParseError) -> Self {
        FrontEndError::Parse(e)
    }
}

impl fmt::Display for FrontEndError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrontEndError::Parse(e) => write!(f, "{}", e),
            FrontEndError::Unsupported(what) => write!(f, "Unsupported: {}", what),
            FrontEndError::Undeclared(name) => write!(f, "Undeclared symbol: {}", name),
            FrontEndError::Sort(msg) => write!(f, "Sort error: {}", msg),
        }
    }
}

impl std::error::Error for FrontEndError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FrontEndError::Parse(e) => Some(e),
            _ => None,
        }
    }
}
