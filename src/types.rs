//! Type-safe wrappers for symbols, edges and literals.
//!
//! A formula over an uninterpreted sort is described by which pairs of
//! constants it relates. These newtypes keep symbol identities, unordered
//! symbol pairs and signed pairs apart at compile time.

use std::fmt;

/// A constant of the uninterpreted sort (0-indexed).
///
/// Symbols of a formula occupy the contiguous range `0..num_symbols`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Symbol(u32);

impl Symbol {
    /// Creates a symbol with the given index.
    pub fn new(index: u32) -> Self {
        Symbol(index)
    }

    /// Returns the raw symbol index.
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

impl From<u32> for Symbol {
    fn from(index: u32) -> Self {
        Symbol(index)
    }
}

impl From<Symbol> for u32 {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

/// An unordered pair of distinct symbols: a candidate equality.
///
/// # Invariants
///
/// - The two endpoints differ.
/// - The pair is stored canonically with `row > column`, so the derived
///   `Eq` and `Hash` do not depend on the order the endpoints were given in.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Edge {
    row: Symbol,
    column: Symbol,
}

impl Edge {
    /// Creates the edge between `a` and `b`.
    ///
    /// # Panics
    ///
    /// Panics if `a == b`.
    pub fn new(a: Symbol, b: Symbol) -> Self {
        assert_ne!(a, b, "Edge endpoints must be distinct");
        if a > b {
            Edge { row: a, column: b }
        } else {
            Edge { row: b, column: a }
        }
    }

    /// The larger endpoint.
    pub fn row(self) -> Symbol {
        self.row
    }

    /// The smaller endpoint.
    pub fn column(self) -> Symbol {
        self.column
    }

    /// Returns whether `symbol` is one of the endpoints.
    pub fn touches(self, symbol: Symbol) -> bool {
        self.row == symbol || self.column == symbol
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}~{}", self.row, self.column)
    }
}

/// An edge with a polarity: `a = b` or `a != b`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Literal {
    edge: Edge,
    is_eq: bool,
}

impl Literal {
    pub fn new(edge: Edge, is_eq: bool) -> Self {
        Literal { edge, is_eq }
    }

    /// The equality `a = b`.
    pub fn equality(edge: Edge) -> Self {
        Literal { edge, is_eq: true }
    }

    /// The disequality `a != b`.
    pub fn disequality(edge: Edge) -> Self {
        Literal { edge, is_eq: false }
    }

    pub fn edge(self) -> Edge {
        self.edge
    }

    /// Returns `true` for an equality, `false` for a disequality.
    pub fn is_eq(self) -> bool {
        self.is_eq
    }
}

impl std::ops::Neg for Literal {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Literal {
            edge: self.edge,
            is_eq: !self.is_eq,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = if self.is_eq { "=" } else { "!=" };
        write!(f, "{} {} {}", self.edge.row, op, self.edge.column)
    }
}
