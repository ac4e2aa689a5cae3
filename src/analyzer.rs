//! Recovery of sparseness and constant factor from a normalized formula.
//!
//! The analyzer rebuilds an [`EqualityGraph`] from the equalities of a clause
//! list: every equality `(= s t)` becomes an edge between the identities of `s`
//! and `t`, where an identity is whatever the front-end uses to tell terms apart
//! (a hash-consed term id for the bundled [`smtlib`](crate::smtlib) reader).
//! Applications of uninterpreted functions are then merged pairwise:
//!
//! ```text
//! f(a1..an), f(b1..bn)
//!     => edge f(a..) ~ f(b..), edges ai ~ bi, synthetic clause of size n+1
//! ```
//!
//! Every pair of distinct applications of the same function is merged, whatever
//! their arguments. The merge is a single pass over the pairs collected from the
//! clauses and adds no applications of its own.
//!
//! From the graph and the recorded clause sizes:
//!
//! | value       | definition                                               |
//! |-------------|----------------------------------------------------------|
//! | sparseness  | `(visible - min) / (total - min)`                        |
//! | factor      | `(vars - min_symbols(visible)) / (2 total - min_symbols(visible))` |
//!
//! where `visible` is the number of edges, `vars` the number of vertices,
//! `total` the sum and `min` the maximum of the clause sizes.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;

use log::{debug, info, trace, warn};
use walkdir::WalkDir;

use crate::codec::min_symbols;
use crate::error::Result;
use crate::graph::EqualityGraph;
use crate::smtlib::{self, FrontEndError};
use crate::table::{ClauseCount, ClauseTable, Record, ResultsTable, Row, Table};
use crate::types::Symbol;

// ─── Expression view ───

/// What the analyzer needs to know about a node.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum NodeKind {
    /// Equality between its two children.
    Equality,
    /// Application of the given uninterpreted function (or constant) to the children.
    Application(u32),
    /// Any other connective.
    Other,
}

/// Read-only access to the expression nodes produced by a front-end.
pub trait ExprView {
    type Node: Copy;

    /// Identity of a node. Structurally equal terms must share an identity.
    fn id(&self, node: Self::Node) -> u32;
    fn kind(&self, node: Self::Node) -> NodeKind;
    fn children(&self, node: Self::Node) -> &[Self::Node];
}

// ─── Collection ───

/// A collected application `f(args)` with at least one argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    pub id: u32,
    pub args: Vec<u32>,
}

impl Application {
    pub fn arity(&self) -> usize {
        self.args.len()
    }
}

/// Accumulates equalities and applications clause by clause.
#[derive(Debug, Clone)]
pub struct EqualityCollector {
    graph: EqualityGraph,
    /// Applications by function, then by identity.
    applications: BTreeMap<u32, BTreeMap<u32, Application>>,
    clause_sizes: Vec<usize>,
}

impl Default for EqualityCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl EqualityCollector {
    pub fn new() -> Self {
        Self {
            graph: EqualityGraph::unbounded(),
            applications: BTreeMap::new(),
            clause_sizes: Vec::new(),
        }
    }

    pub fn graph(&self) -> &EqualityGraph {
        &self.graph
    }

    /// Collects the equalities of one clause and records its size, the number
    /// of equalities found.
    pub fn collect_clause<V: ExprView>(&mut self, view: &V, clause: V::Node) {
        let mut size = 0;
        let mut stack = vec![clause];
        while let Some(node) = stack.pop() {
            match view.kind(node) {
                NodeKind::Equality => {
                    size += 1;
                    let sides = view.children(node);
                    for &side in sides {
                        self.collect_applications(view, side);
                    }
                    if let [lhs, rhs] = *sides {
                        let (a, b) = (view.id(lhs), view.id(rhs));
                        if a != b {
                            self.graph.add_edge(Symbol::new(a), Symbol::new(b));
                        }
                    }
                }
                _ => stack.extend(view.children(node).iter().rev().copied()),
            }
        }
        trace!("collect_clause: {} equalities", size);
        self.clause_sizes.push(size);
    }

    /// Records `node` and nested applications below it, following applications only.
    fn collect_applications<V: ExprView>(&mut self, view: &V, node: V::Node) {
        let mut stack = vec![node];
        while let Some(node) = stack.pop() {
            let NodeKind::Application(func) = view.kind(node) else {
                continue;
            };
            let args = view.children(node);
            if args.is_empty() {
                continue;
            }
            let id = view.id(node);
            let apps = self.applications.entry(func).or_default();
            if apps.contains_key(&id) {
                continue;
            }
            apps.insert(
                id,
                Application {
                    id,
                    args: args.iter().map(|&a| view.id(a)).collect(),
                },
            );
            stack.extend(args.iter().copied());
        }
    }

    /// Merges every pair of applications of the same function and arity.
    /// Returns the synthetic clause sizes, one per merged pair.
    ///
    /// Calling this again does not change the graph.
    pub fn merge_congruent(&mut self) -> Vec<usize> {
        let mut merges = Vec::new();
        for apps in self.applications.values() {
            let apps: Vec<&Application> = apps.values().collect();
            for (i, f) in apps.iter().enumerate() {
                for g in &apps[i + 1..] {
                    if f.arity() == g.arity() {
                        merges.push((f.id, g.id, f.args.clone(), g.args.clone()));
                    }
                }
            }
        }

        let mut sizes = Vec::with_capacity(merges.len());
        for (f, g, f_args, g_args) in merges {
            sizes.push(f_args.len() + 1);
            self.graph.add_edge(Symbol::new(f), Symbol::new(g));
            for (a, b) in f_args.into_iter().zip(g_args) {
                self.graph.add_edge(Symbol::new(a), Symbol::new(b));
            }
        }
        sizes
    }

    /// The counts derived from what has been collected so far.
    pub fn counts(&self) -> Counts {
        Counts {
            num_visible: self.graph.num_edges(),
            num_var: self.graph.num_vertices(),
            num_total: self.clause_sizes.iter().sum(),
            num_min: self.clause_sizes.iter().copied().max().unwrap_or(0),
        }
    }
}

// ─── Metrics ───

/// Graph and clause-size counts of an analyzed formula.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Counts {
    /// Distinct edges.
    pub num_visible: usize,
    /// Vertices.
    pub num_var: usize,
    /// Sum of clause sizes.
    pub num_total: usize,
    /// Largest clause size.
    pub num_min: usize,
}

impl Counts {
    pub fn sparseness(&self) -> Option<f64> {
        let den = self.num_total as f64 - self.num_min as f64;
        if den == 0.0 {
            return None;
        }
        Some((self.num_visible as f64 - self.num_min as f64) / den)
    }

    pub fn const_factor(&self) -> Option<f64> {
        let factor_min = min_symbols(self.num_visible as u64) as f64;
        let factor_max = 2.0 * self.num_total as f64;
        if factor_max == factor_min {
            return None;
        }
        Some((self.num_var as f64 - factor_min) / (factor_max - factor_min))
    }
}

/// Sparseness and constant factor. `None` means undefined.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Measurement {
    pub sparseness: Option<f64>,
    pub const_factor: Option<f64>,
}

impl Measurement {
    pub fn undefined() -> Self {
        Self::default()
    }

    pub fn from_counts(counts: &Counts) -> Self {
        Self {
            sparseness: counts.sparseness(),
            const_factor: counts.const_factor(),
        }
    }

    pub fn is_defined(&self) -> bool {
        self.sparseness.is_some() && self.const_factor.is_some()
    }
}

/// Formats a metric value, with `*` for undefined.
pub fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "*".to_string(),
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", format_value(self.sparseness), format_value(self.const_factor))
    }
}

// ─── Entry points ───

/// Collects, merges and counts a single clause list.
pub fn count<V: ExprView>(view: &V, clauses: &[V::Node]) -> Counts {
    let mut collector = EqualityCollector::new();
    for &clause in clauses {
        collector.collect_clause(view, clause);
    }
    let merged = collector.merge_congruent();
    debug!("count: {} clauses, {} congruent pairs", clauses.len(), merged.len());
    collector.clause_sizes.extend(merged);
    collector.counts()
}

/// Analyzes the goals produced by a front-end. Anything but exactly one goal is undefined.
pub fn analyze<V: ExprView, G: AsRef<[V::Node]>>(view: &V, goals: &[G]) -> Measurement {
    match goals {
        [goal] => {
            let counts = count(view, goal.as_ref());
            debug!("analyze: {:?}", counts);
            Measurement::from_counts(&counts)
        }
        _ => {
            debug!("analyze: {} goals, result undefined", goals.len());
            Measurement::undefined()
        }
    }
}

/// Normalizes an SMT-LIB script and analyzes it.
pub fn analyze_script(text: &str) -> std::result::Result<Measurement, FrontEndError> {
    let normalized = smtlib::normalize(text)?;
    Ok(analyze(&normalized.store, &normalized.goals))
}

/// Reads, normalizes and analyzes an SMT-LIB file.
pub fn analyze_file<P: AsRef<Path>>(path: P) -> Result<Measurement> {
    let text = std::fs::read_to_string(path)?;
    Ok(analyze_script(&text)?)
}

/// Number of normalized clauses of an SMT-LIB script, `None` unless there is
/// exactly one goal.
pub fn count_clauses(text: &str) -> std::result::Result<Option<usize>, FrontEndError> {
    Ok(smtlib::normalize(text)?.num_clauses())
}

/// Analyzes every `.smt2` file below `dir` that has no row in `table` yet, and
/// appends one row per file. Files that cannot be read or that the front-end
/// rejects get an undefined row.
///
/// Returns the number of rows appended.
pub fn evaluate_dir<P: AsRef<Path>>(dir: P, table: &ResultsTable) -> Result<usize> {
    process_dir(dir.as_ref(), table, |file, text| {
        let measurement = text
            .and_then(|text| analyze_script(text).map_err(|e| warn!("{}: {}", file, e)).ok())
            .unwrap_or_else(Measurement::undefined);
        Row::new(file, measurement)
    })
}

/// Counts the normalized clauses of every `.smt2` file below `dir` that has no
/// row in `table` yet. Files that cannot be read or that the front-end rejects
/// get `-1`, as do files without exactly one goal.
///
/// Returns the number of rows appended.
pub fn count_clauses_dir<P: AsRef<Path>>(dir: P, table: &ClauseTable) -> Result<usize> {
    process_dir(dir.as_ref(), table, |file, text| {
        let clauses = text.and_then(|text| count_clauses(text).unwrap_or_else(|e| {
            warn!("{}: {}", file, e);
            None
        }));
        ClauseCount::new(file, clauses)
    })
}

/// Walks `dir` in file-name order and appends `record(file, text)` for every
/// pending `.smt2` file. `text` is `None` when the file could not be read.
fn process_dir<R: Record>(
    dir: &Path,
    table: &Table<R>,
    mut record: impl FnMut(&str, Option<&str>) -> R,
) -> Result<usize> {
    let done: HashSet<String> = table.rows()?.iter().map(|row| row.file().to_string()).collect();
    let mut appended = 0;
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(std::io::Error::from(e).into()),
            Err(e) => {
                warn!("{}", e);
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().and_then(|ext| ext.to_str()) != Some("smt2") {
            continue;
        }
        let file = path.display().to_string();
        if file.contains(['\n', '\r']) {
            warn!("{}: line breaks in the name, skipping", file.escape_debug());
            continue;
        }
        if done.contains(&file) {
            debug!("process_dir: skipping {}", file);
            continue;
        }
        info!("{}", file);
        let text = std::fs::read_to_string(path)
            .map_err(|e| warn!("{}: {}", file, e))
            .ok();
        table.append(&record(&file, text.as_deref()))?;
        appended += 1;
    }
    Ok(appended)
}
