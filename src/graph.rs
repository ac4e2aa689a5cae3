//! Equality graph with an edge-count ceiling.
//!
//! Undirected simple graph over [`Symbol`]s. Insertion is idempotent, self-loops
//! are ignored, and once the number of edges reaches the threshold the graph is
//! *saturated* and silently rejects further insertions. There is no removal.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::types::{Edge, Symbol};

#[derive(Clone, PartialEq, Eq)]
pub struct EqualityGraph {
    adjacency: BTreeMap<Symbol, BTreeSet<Symbol>>,
    num_edges: usize,
    threshold: usize,
}

impl EqualityGraph {
    /// Creates an empty graph accepting at most `threshold` edges.
    pub fn new(threshold: usize) -> Self {
        Self {
            adjacency: BTreeMap::new(),
            num_edges: 0,
            threshold,
        }
    }

    /// Creates an empty graph without a practical edge ceiling.
    pub fn unbounded() -> Self {
        Self::new(usize::MAX)
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Number of distinct edges.
    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    /// Number of symbols incident to at least one edge.
    pub fn num_vertices(&self) -> usize {
        self.adjacency.len()
    }

    /// Returns `true` once the edge count has reached the threshold.
    pub fn is_saturated(&self) -> bool {
        self.num_edges >= self.threshold
    }

    /// Inserts the edge `a ~ b`.
    ///
    /// Does nothing if the graph is saturated, if `a == b`, or if the edge is
    /// already present. Returns `true` if the edge was inserted.
    pub fn add_edge(&mut self, a: Symbol, b: Symbol) -> bool {
        if self.is_saturated() || a == b {
            return false;
        }
        let fresh = self.adjacency.entry(a).or_default().insert(b);
        self.adjacency.entry(b).or_default().insert(a);
        if fresh {
            self.num_edges += 1;
        }
        fresh
    }

    /// Returns whether `a ~ b` is present.
    pub fn contains(&self, a: Symbol, b: Symbol) -> bool {
        self.adjacency.get(&a).is_some_and(|ns| ns.contains(&b))
    }

    /// All edges, each reported once with `row > column`, ordered by row then column.
    pub fn edges(&self) -> Vec<Edge> {
        let mut edges = Vec::with_capacity(self.num_edges);
        for (&row, neighbors) in self.adjacency.iter() {
            for &column in neighbors.range(..row) {
                edges.push(Edge::new(row, column));
            }
        }
        edges
    }
}

impl fmt::Debug for EqualityGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EqualityGraph")
            .field("vertices", &self.num_vertices())
            .field("edges", &self.num_edges)
            .field("threshold", &self.threshold)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(i: u32) -> Symbol {
        Symbol::new(i)
    }

    #[test]
    fn test_add_edge() {
        let mut g = EqualityGraph::new(10);
        assert!(g.add_edge(s(0), s(1)));
        assert!(g.add_edge(s(2), s(1)));
        assert_eq!(g.num_edges(), 2);
        assert_eq!(g.num_vertices(), 3);
        assert!(g.contains(s(1), s(0)));
        assert!(g.contains(s(0), s(1)));
        assert!(!g.contains(s(0), s(2)));
        assert_eq!(g.edges(), vec![Edge::new(s(1), s(0)), Edge::new(s(2), s(1))]);
    }

    #[test]
    fn test_readding_does_not_count() {
        let mut g = EqualityGraph::new(10);
        g.add_edge(s(3), s(4));
        assert!(!g.add_edge(s(3), s(4)));
        assert!(!g.add_edge(s(4), s(3)));
        assert_eq!(g.num_edges(), 1);
    }

    #[test]
    fn test_self_loop_ignored() {
        let mut g = EqualityGraph::new(10);
        assert!(!g.add_edge(s(5), s(5)));
        assert_eq!(g.num_edges(), 0);
        assert_eq!(g.num_vertices(), 0);
    }

    #[test]
    fn test_saturation() {
        let mut g = EqualityGraph::new(3);
        for i in 0..10 {
            g.add_edge(s(i), s(i + 1));
            assert!(g.num_edges() <= 3);
        }
        assert!(g.is_saturated());
        assert_eq!(g.num_edges(), 3);
        assert!(!g.add_edge(s(0), s(9)));
        assert!(!g.contains(s(0), s(9)));
        // Saturated graph still answers about existing edges.
        assert!(g.contains(s(1), s(2)));
    }

    #[test]
    fn test_zero_threshold_is_saturated() {
        let mut g = EqualityGraph::new(0);
        assert!(g.is_saturated());
        assert!(!g.add_edge(s(0), s(1)));
    }

    #[test]
    fn test_edges_canonical_order() {
        let mut g = EqualityGraph::unbounded();
        g.add_edge(s(0), s(3));
        g.add_edge(s(2), s(1));
        g.add_edge(s(3), s(1));
        g.add_edge(s(1), s(3));
        let edges = g.edges();
        assert_eq!(edges.len(), g.num_edges());
        assert_eq!(
            edges,
            vec![
                Edge::new(s(2), s(1)),
                Edge::new(s(3), s(0)),
                Edge::new(s(3), s(1)),
            ]
        );
        for e in edges {
            assert!(e.row() > e.column());
        }
    }
}
