//! Clauses and formulas over equality literals.

use std::collections::BTreeSet;
use std::fmt;

use crate::codec::min_symbols;
use crate::types::{Edge, Literal, Symbol};

/// A disjunction of literals. Literal order is kept for deterministic rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Clause {
    literals: Vec<Literal>,
}

impl Clause {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, literal: Literal) {
        self.literals.push(literal);
    }

    pub fn literals(&self) -> &[Literal] {
        &self.literals
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }
}

impl FromIterator<Literal> for Clause {
    fn from_iter<I: IntoIterator<Item = Literal>>(iter: I) -> Self {
        Self {
            literals: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, lit) in self.literals.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{}", lit)?;
        }
        write!(f, ")")
    }
}

/// A conjunction of clauses over the symbols `0..num_symbols`.
///
/// Sparseness and the requested constant factor are fixed at construction;
/// a formula is never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    clauses: Vec<Clause>,
    num_symbols: u32,
    sparseness: f64,
    const_factor: f64,
}

impl Formula {
    pub fn new(clauses: Vec<Clause>, num_symbols: u32, sparseness: f64, const_factor: f64) -> Self {
        Self {
            clauses,
            num_symbols,
            sparseness,
            const_factor,
        }
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    pub fn num_symbols(&self) -> u32 {
        self.num_symbols
    }

    /// Declared symbols, in index order.
    pub fn symbols(&self) -> impl Iterator<Item = Symbol> {
        (0..self.num_symbols).map(Symbol::new)
    }

    /// Sparseness recorded at generation time.
    pub fn sparseness(&self) -> f64 {
        self.sparseness
    }

    /// Constant factor requested at generation time.
    pub fn const_factor(&self) -> f64 {
        self.const_factor
    }

    /// Total number of literals, counting repeats.
    pub fn num_literals(&self) -> usize {
        self.clauses.iter().map(|c| c.len()).sum()
    }

    /// Size of the largest clause.
    pub fn max_clause_len(&self) -> usize {
        self.clauses.iter().map(|c| c.len()).max().unwrap_or(0)
    }

    /// Distinct edges appearing anywhere in the formula, in canonical order.
    pub fn edges(&self) -> Vec<Edge> {
        let edges: BTreeSet<Edge> = self
            .clauses
            .iter()
            .flat_map(|c| c.literals().iter().map(|lit| lit.edge()))
            .collect();
        edges.into_iter().collect()
    }

    /// Constant factor measured from the formula itself.
    ///
    /// ```text
    /// (num_symbols - min_symbols(V)) / (2 * num_literals - min_symbols(V))
    /// ```
    ///
    /// where `V` is the number of distinct edges. This is the value the analyzer
    /// derives for the rendered formula. The requested factor is scaled against
    /// `2V` instead and rounded to a whole symbol count, so the two differ.
    ///
    /// Returns `None` when the denominator vanishes.
    pub fn measured_const_factor(&self) -> Option<f64> {
        let factor_min = min_symbols(self.edges().len() as u64) as f64;
        let factor_max = 2.0 * self.num_literals() as f64;
        if factor_max == factor_min {
            return None;
        }
        Some((self.num_symbols as f64 - factor_min) / (factor_max - factor_min))
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                write!(f, " & ")?;
            }
            write!(f, "{}", clause)?;
        }
        Ok(())
    }
}
