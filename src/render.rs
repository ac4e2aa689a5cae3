//! Formula to SMT-LIB conversion.
//!
//! The output has the following shape:
//!
//! ```text
//! (declare-sort U 0)
//! (declare-fun x2 () U)
//! (declare-fun x0 () U)
//! (declare-fun x1 () U)
//! (assert (and (or (= x2 x0) (not (= x1 x0))) (or (= x1 x2))))
//! (check-sat)
//! (exit)
//! ```
//!
//! Symbols are relabelled by a random permutation before printing, and
//! declarations appear in a random order, so neither names nor positions leak
//! how the generator numbered the symbols.
//!
//! [`write_benchmark`] renders a whole batch into a directory, next to a
//! `meta.csv` table of the generation parameters.

use std::fmt::Write;
use std::path::Path;

use log::info;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::analyzer::Measurement;
use crate::error;
use crate::formula::{Clause, Formula};
use crate::generator::Generator;
use crate::table::{ResultsTable, Row};
use crate::types::{Literal, Symbol};

/// Name of the metadata table written by [`write_benchmark`].
pub const META_FILE: &str = "meta.csv";

/// Name of the uninterpreted sort.
pub const SORT_NAME: &str = "U";

/// A rendered formula together with the relabelling used to print it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// SMT-LIB script.
    pub text: String,
    /// `labels[s]` is the index printed for symbol `s`.
    pub labels: Vec<u32>,
}

impl Rendered {
    /// Printed name of the given symbol.
    pub fn name(&self, symbol: Symbol) -> String {
        format!("x{}", self.labels[symbol.index() as usize])
    }
}

/// Renders the formula with a freshly shuffled relabelling.
pub fn render<R: Rng + ?Sized>(formula: &Formula, rng: &mut R) -> Result<Rendered, std::fmt::Error> {
    let mut labels: Vec<u32> = (0..formula.num_symbols()).collect();
    labels.shuffle(rng);
    let mut order: Vec<u32> = (0..formula.num_symbols()).collect();
    order.shuffle(rng);

    let mut text = String::new();
    write_script(&mut text, formula, &labels, &order)?;
    Ok(Rendered { text, labels })
}

/// Writes the script for `formula`, printing symbol `s` as `x{labels[s]}` and
/// declaring symbols in the order given by `order`.
pub fn write_script<W: Write>(out: &mut W, formula: &Formula, labels: &[u32], order: &[u32]) -> std::fmt::Result {
    writeln!(out, "(declare-sort {} 0)", SORT_NAME)?;
    for &s in order {
        writeln!(out, "(declare-fun x{} () {})", labels[s as usize], SORT_NAME)?;
    }
    write!(out, "(assert (and")?;
    for clause in formula.clauses() {
        write!(out, " ")?;
        write_clause(out, clause, labels)?;
    }
    writeln!(out, "))")?;
    writeln!(out, "(check-sat)")?;
    writeln!(out, "(exit)")
}

fn write_clause<W: Write>(out: &mut W, clause: &Clause, labels: &[u32]) -> std::fmt::Result {
    write!(out, "(or")?;
    for &lit in clause.literals() {
        write!(out, " ")?;
        write_literal(out, lit, labels)?;
    }
    write!(out, ")")
}

fn write_literal<W: Write>(out: &mut W, lit: Literal, labels: &[u32]) -> std::fmt::Result {
    let edge = lit.edge();
    let row = labels[edge.row().index() as usize];
    let column = labels[edge.column().index() as usize];
    if lit.is_eq() {
        write!(out, "(= x{} x{})", row, column)
    } else {
        write!(out, "(not (= x{} x{}))", row, column)
    }
}

/// Generates `num_formulas` formulas into `dir` as `problem_<i>.smt2`, and
/// records the sparseness and requested constant factor of each in a fresh
/// `meta.csv`. Rows of an earlier run in the same directory are discarded.
pub fn write_benchmark<R: Rng>(generator: &mut Generator<R>, dir: &Path, num_formulas: usize) -> error::Result<ResultsTable> {
    let meta = ResultsTable::create(dir.join(META_FILE))?;
    for i in 0..num_formulas {
        let formula = generator.generate()?;
        let rendered = render(&formula, generator.rng())?;
        let name = format!("problem_{}.smt2", i);
        std::fs::write(dir.join(&name), &rendered.text)?;
        meta.append(&Row::new(
            name.as_str(),
            Measurement {
                sparseness: Some(formula.sparseness()),
                const_factor: Some(formula.const_factor()),
            },
        ))?;
        info!(
            "{}: {} symbols, {} distinct equalities, sparseness = {}",
            name,
            formula.num_symbols(),
            formula.edges().len(),
            formula.sparseness()
        );
    }
    Ok(meta)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::types::Edge;

    fn sample_formula() -> Formula {
        let e10 = Edge::new(Symbol::new(1), Symbol::new(0));
        let e21 = Edge::new(Symbol::new(2), Symbol::new(1));
        let c1: Clause = [Literal::equality(e10), Literal::disequality(e21)].into_iter().collect();
        let c2: Clause = [Literal::equality(e21)].into_iter().collect();
        Formula::new(vec![c1, c2], 3, 0.5, 0.0)
    }

    #[test]
    fn test_write_script_identity_labels() {
        let formula = sample_formula();
        let mut text = String::new();
        write_script(&mut text, &formula, &[0, 1, 2], &[0, 1, 2]).unwrap();
        let expected = "\
(declare-sort U 0)
(declare-fun x0 () U)
(declare-fun x1 () U)
(declare-fun x2 () U)
(assert (and (or (= x1 x0) (not (= x2 x1))) (or (= x2 x1))))
(check-sat)
(exit)
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_write_script_relabelled() {
        let formula = sample_formula();
        let mut text = String::new();
        write_script(&mut text, &formula, &[2, 0, 1], &[1, 2, 0]).unwrap();
        assert!(text.contains("(declare-fun x0 () U)\n(declare-fun x1 () U)\n(declare-fun x2 () U)\n"));
        assert!(text.contains("(assert (and (or (= x0 x2) (not (= x1 x0))) (or (= x1 x0))))"));
    }

    #[test]
    fn test_render_is_deterministic_per_seed() {
        let formula = sample_formula();
        let a = render(&formula, &mut ChaCha8Rng::seed_from_u64(5)).unwrap();
        let b = render(&formula, &mut ChaCha8Rng::seed_from_u64(5)).unwrap();
        assert_eq!(a, b);

        let mut labels = a.labels.clone();
        labels.sort_unstable();
        assert_eq!(labels, vec![0, 1, 2]);
        for s in formula.symbols() {
            assert!(a.text.contains(&format!("(declare-fun {} () U)", a.name(s))));
        }
    }
}
