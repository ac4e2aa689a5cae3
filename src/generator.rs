//! Random generation of sparse equality formulas.
//!
//! A formula is generated in three steps:
//! 1. Pick the number `V` of distinct edges (equalities) the formula will mention,
//!    which fixes its sparseness.
//! 2. Build an [`EqualityGraph`] with exactly `V` edges over a symbol budget
//!    derived from the requested constant factor. Every symbol is covered by a
//!    base edge; the rest are sampled as ranks and decoded with the [`codec`].
//! 3. Partition the edges into clauses of `edge_size` literals. Each clause mixes
//!    edges already placed in an earlier clause (*covered*) with edges placed for
//!    the first time (*uncovered*), so that every edge appears at least once.
//!
//! All randomness comes from the caller-provided [`Rng`], so a seeded generator
//! replays exactly.
//!
//! [`codec`]: crate::codec

use std::ops::RangeInclusive;

use log::{debug, trace};
use rand::seq::index;
use rand::Rng;

use crate::codec::{decode, max_symbols, min_symbols, pair_count};
use crate::error::{Error, Result};
use crate::formula::{Clause, Formula};
use crate::graph::EqualityGraph;
use crate::types::{Edge, Literal, Symbol};

/// Parameters of generated formulas.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Number of clauses, at least 2.
    pub num_clauses: usize,
    /// Literals per clause, at least 1.
    pub edge_size: usize,
    /// Position of the symbol count between its minimum and maximum, in `[0, 1]`.
    pub const_factor: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            num_clauses: 4,
            edge_size: 3,
            const_factor: 0.5,
        }
    }
}

impl GeneratorConfig {
    pub fn new(num_clauses: usize, edge_size: usize, const_factor: f64) -> Self {
        Self {
            num_clauses,
            edge_size,
            const_factor,
        }
    }

    /// Checks the parameters. Must pass before any sampling takes place.
    pub fn validate(&self) -> Result<()> {
        if self.num_clauses < 2 {
            return Err(Error::InvalidArgument(format!(
                "number of clauses must be at least 2, got {}",
                self.num_clauses
            )));
        }
        if self.edge_size < 1 {
            return Err(Error::InvalidArgument(format!(
                "clause size must be at least 1, got {}",
                self.edge_size
            )));
        }
        if !(0.0..=1.0).contains(&self.const_factor) {
            return Err(Error::InvalidArgument(format!(
                "constant factor must be in [0, 1], got {}",
                self.const_factor
            )));
        }
        self.num_clauses.checked_mul(self.edge_size).ok_or_else(|| {
            Error::InvalidArgument(format!(
                "{} clauses of size {} overflow the literal count",
                self.num_clauses, self.edge_size
            ))
        })?;
        Ok(())
    }

    /// Total number of literals, counting repeats.
    pub fn num_literals(&self) -> usize {
        self.num_clauses * self.edge_size
    }

    /// Admissible numbers of distinct edges: from one clause worth to all literals distinct.
    pub fn visible_edge_range(&self) -> RangeInclusive<usize> {
        self.edge_size..=self.num_literals()
    }
}

/// Generator of random formulas for a fixed configuration.
pub struct Generator<R: Rng> {
    config: GeneratorConfig,
    rng: R,
}

impl<R: Rng> Generator<R> {
    /// Creates a generator, rejecting invalid configurations.
    pub fn new(config: GeneratorConfig, rng: R) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, rng })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// The random source, e.g. for rendering with the same stream.
    pub fn rng(&mut self) -> &mut R {
        &mut self.rng
    }

    /// Generates a formula with a uniformly sampled number of distinct edges.
    pub fn generate(&mut self) -> Result<Formula> {
        let num_visible = self.rng.random_range(self.config.visible_edge_range());
        self.generate_with_visible_edges(num_visible)
    }

    /// Generates a formula with exactly `num_visible` distinct edges.
    pub fn generate_with_visible_edges(&mut self, num_visible: usize) -> Result<Formula> {
        let num_clauses = self.config.num_clauses;
        let edge_size = self.config.edge_size;
        let const_factor = self.config.const_factor;

        if !self.config.visible_edge_range().contains(&num_visible) {
            return Err(Error::InvalidArgument(format!(
                "number of distinct edges must be in {:?}, got {}",
                self.config.visible_edge_range(),
                num_visible
            )));
        }

        let num_literals = self.config.num_literals();
        let sparseness = (num_visible - edge_size) as f64 / (num_literals - edge_size) as f64;

        let num_symbols = symbol_budget(num_visible, const_factor);
        let num_symbols = u32::try_from(num_symbols)
            .map_err(|_| Error::InvalidArgument(format!("symbol budget {} does not fit in u32", num_symbols)))?;
        debug!(
            "generate: visible = {}, literals = {}, sparseness = {}, symbols = {}",
            num_visible, num_literals, sparseness, num_symbols
        );

        let graph = build_edge_graph(num_visible, num_symbols, &mut self.rng)?;
        let clauses = partition(graph.edges(), num_clauses, edge_size, &mut self.rng)?;

        let formula = Formula::new(clauses, num_symbols, sparseness, const_factor);
        debug!(
            "generate: requested factor = {}, measured factor = {:?}",
            const_factor,
            formula.measured_const_factor()
        );
        Ok(formula)
    }
}

/// Number of symbols for `num_visible` edges at the given constant factor.
///
/// ```text
/// min + round(factor * (max - min)),   min = min_symbols(V), max = 2V
/// ```
///
/// Rounds half to even.
pub fn symbol_budget(num_visible: usize, const_factor: f64) -> usize {
    let lo = min_symbols(num_visible as u64);
    let hi = max_symbols(num_visible as u64).max(lo);
    let delta = (const_factor * (hi - lo) as f64).round_ties_even() as u64;
    (lo + delta) as usize
}

/// Builds a graph over `num_symbols` symbols with exactly `num_visible` edges,
/// in which every symbol has at least one incident edge.
pub fn build_edge_graph<R: Rng + ?Sized>(num_visible: usize, num_symbols: u32, rng: &mut R) -> Result<EqualityGraph> {
    let mut graph = EqualityGraph::new(num_visible);

    // Base edges: (1,0), (3,2), ..., with a trailing odd symbol tied to 0.
    for i in (0..num_symbols).step_by(2) {
        let j = if i + 1 == num_symbols { 0 } else { i + 1 };
        graph.add_edge(Symbol::new(j), Symbol::new(i));
    }
    debug!("build_edge_graph: {} base edges over {} symbols", graph.num_edges(), num_symbols);

    if !graph.is_saturated() {
        let pool = pair_count(num_symbols as u64);
        if pool < num_visible as u64 {
            return Err(Error::InvariantViolation(format!(
                "{} symbols host only {} edges, {} needed",
                num_symbols, pool, num_visible
            )));
        }
        let pool = usize::try_from(pool)
            .map_err(|_| Error::InvariantViolation(format!("edge pool of size {} is not addressable", pool)))?;
        for rank in index::sample(rng, pool, num_visible).into_iter() {
            let (row, column) = decode(rank as u64 + 1);
            graph.add_edge(Symbol::new(row as u32), Symbol::new(column as u32));
            if graph.is_saturated() {
                break;
            }
        }
    }

    if graph.num_edges() != num_visible {
        return Err(Error::InvariantViolation(format!(
            "built {} distinct edges, {} required",
            graph.num_edges(),
            num_visible
        )));
    }
    Ok(graph)
}

/// Distributes `edges` over `num_clauses` clauses of exactly `edge_size` literals.
///
/// Every edge is placed at least once, and no clause mentions an edge twice.
/// Polarities are fair coin flips.
pub fn partition<R: Rng + ?Sized>(
    edges: Vec<Edge>,
    num_clauses: usize,
    edge_size: usize,
    rng: &mut R,
) -> Result<Vec<Clause>> {
    let mut uncovered = edges;
    let mut covered: Vec<Edge> = Vec::with_capacity(uncovered.len());
    let mut remaining = num_clauses * edge_size;
    let mut clauses = Vec::with_capacity(num_clauses);

    for i in 0..num_clauses {
        // Slots left after every uncovered edge gets one.
        let slack = remaining.checked_sub(uncovered.len()).ok_or_else(|| {
            Error::InvariantViolation(format!(
                "clause {}: {} uncovered edges left for {} slots",
                i,
                uncovered.len(),
                remaining
            ))
        })?;
        let low = edge_size.saturating_sub(uncovered.len());
        let high = slack.min(edge_size).min(covered.len());
        if low > high {
            return Err(Error::InvariantViolation(format!(
                "clause {}: empty range {}..={} for covered literals",
                i, low, high
            )));
        }
        let num_covered = rng.random_range(low..=high);
        let num_uncovered = edge_size - num_covered;
        trace!(
            "partition: clause {}, covered {} in {}..={}, uncovered {} of {}",
            i,
            num_covered,
            low,
            high,
            num_uncovered,
            uncovered.len()
        );

        let mut clause = Clause::new();
        for j in index::sample(rng, covered.len(), num_covered).into_iter() {
            clause.push(Literal::new(covered[j], rng.random_bool(0.5)));
        }
        let mut picked = index::sample(rng, uncovered.len(), num_uncovered).into_vec();
        for &j in picked.iter() {
            clause.push(Literal::new(uncovered[j], rng.random_bool(0.5)));
        }
        // Remove from the back so pending indices stay valid.
        picked.sort_unstable();
        for j in picked.into_iter().rev() {
            covered.push(uncovered.swap_remove(j));
        }

        remaining -= edge_size;
        clauses.push(clause);
    }

    if !uncovered.is_empty() {
        return Err(Error::InvariantViolation(format!(
            "{} edges were never placed in a clause",
            uncovered.len()
        )));
    }
    Ok(clauses)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use test_log::test;

    use super::*;

    fn rng(seed: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(seed)
    }

    #[test]
    fn test_validate() {
        assert!(GeneratorConfig::default().validate().is_ok());
        assert!(GeneratorConfig::new(2, 1, 0.0).validate().is_ok());
        assert!(GeneratorConfig::new(2, 1, 1.0).validate().is_ok());
        for bad in [
            GeneratorConfig::new(1, 3, 0.5),
            GeneratorConfig::new(0, 3, 0.5),
            GeneratorConfig::new(4, 0, 0.5),
            GeneratorConfig::new(4, 3, -0.1),
            GeneratorConfig::new(4, 3, 1.5),
            GeneratorConfig::new(4, 3, f64::NAN),
        ] {
            assert!(
                matches!(bad.validate(), Err(Error::InvalidArgument(_))),
                "{:?} must be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_single_clause_rejected_before_generation() {
        let res = Generator::new(GeneratorConfig::new(1, 3, 0.5), rng(0));
        assert!(matches!(res, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_symbol_budget() {
        // V = 6: min = 4, max = 12
        assert_eq!(symbol_budget(6, 0.0), 4);
        assert_eq!(symbol_budget(6, 1.0), 12);
        assert_eq!(symbol_budget(6, 0.5), 8);
        // 0.25 * 8 = 2, 0.3125 * 8 = 2.5 -> 2 (ties to even)
        assert_eq!(symbol_budget(6, 0.25), 6);
        assert_eq!(symbol_budget(6, 0.3125), 6);
        // V = 1: min = max = 2
        assert_eq!(symbol_budget(1, 0.0), 2);
        assert_eq!(symbol_budget(1, 1.0), 2);
    }

    #[test]
    fn test_build_edge_graph_exact_and_covering() {
        let mut rng = rng(42);
        for num_visible in 1..40usize {
            for factor in [0.0, 0.25, 0.5, 0.75, 1.0] {
                let num_symbols = symbol_budget(num_visible, factor) as u32;
                let graph = build_edge_graph(num_visible, num_symbols, &mut rng).unwrap();
                assert_eq!(graph.num_edges(), num_visible);
                assert_eq!(graph.num_vertices(), num_symbols as usize);
                for e in graph.edges() {
                    assert!(e.row().index() < num_symbols);
                }
            }
        }
    }

    #[test]
    fn test_build_edge_graph_rejects_small_pool() {
        // 3 symbols host at most 3 edges.
        let res = build_edge_graph(5, 3, &mut rng(0));
        assert!(matches!(res, Err(Error::InvariantViolation(_))));
    }

    #[test]
    fn test_partition_places_every_edge() {
        let mut rng = rng(7);
        let edges: Vec<Edge> = (1..8u32).map(|i| Edge::new(Symbol::new(i), Symbol::new(0))).collect();
        let clauses = partition(edges.clone(), 5, 3, &mut rng).unwrap();
        assert_eq!(clauses.len(), 5);
        let mut seen = HashSet::new();
        for clause in &clauses {
            assert_eq!(clause.len(), 3);
            let in_clause: HashSet<Edge> = clause.literals().iter().map(|l| l.edge()).collect();
            assert_eq!(in_clause.len(), 3, "clause repeats an edge: {}", clause);
            seen.extend(in_clause);
        }
        assert_eq!(seen, edges.into_iter().collect());
    }

    #[test]
    fn test_partition_rejects_impossible_layout() {
        // 7 distinct edges cannot fit into 2 clauses of 3 literals.
        let edges: Vec<Edge> = (1..8u32).map(|i| Edge::new(Symbol::new(i), Symbol::new(0))).collect();
        let res = partition(edges, 2, 3, &mut rng(0));
        assert!(matches!(res, Err(Error::InvariantViolation(_))));
    }

    #[test]
    fn test_generate_exact_visible_edges() {
        let mut generator = Generator::new(GeneratorConfig::new(4, 3, 0.5), rng(1)).unwrap();
        for num_visible in 3..=12 {
            let formula = generator.generate_with_visible_edges(num_visible).unwrap();
            assert_eq!(formula.edges().len(), num_visible);
            assert_eq!(formula.num_clauses(), 4);
            assert_eq!(formula.num_literals(), 12);
            let expected = (num_visible - 3) as f64 / 9.0;
            assert_eq!(formula.sparseness(), expected);
            assert!((0.0..=1.0).contains(&formula.sparseness()));
            assert_eq!(formula.num_symbols() as usize, symbol_budget(num_visible, 0.5));
        }
    }

    #[test]
    fn test_generate_rejects_visible_out_of_range() {
        let mut generator = Generator::new(GeneratorConfig::new(4, 3, 0.5), rng(1)).unwrap();
        assert!(matches!(
            generator.generate_with_visible_edges(2),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            generator.generate_with_visible_edges(13),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_generate_minimal_config() {
        let mut generator = Generator::new(GeneratorConfig::new(2, 1, 0.5), rng(3)).unwrap();
        for _ in 0..50 {
            let formula = generator.generate().unwrap();
            assert_eq!(formula.num_clauses(), 2);
            assert_eq!(formula.num_literals(), 2);
            assert!(formula.sparseness() == 0.0 || formula.sparseness() == 1.0);
        }
    }

    #[test]
    fn test_generate_is_reproducible() {
        let config = GeneratorConfig::new(6, 4, 0.75);
        let mut g1 = Generator::new(config.clone(), rng(99)).unwrap();
        let mut g2 = Generator::new(config, rng(99)).unwrap();
        for _ in 0..10 {
            assert_eq!(g1.generate().unwrap(), g2.generate().unwrap());
        }
    }
}
