//! Conversion of asserted formulas into clause lists.
//!
//! All assertions of a script form one goal. Top-level conjunctions are split,
//! disjunctions of literals are kept as they are, and any other Boolean
//! structure is clausified with the Tseitin encoding: every non-literal
//! sub-formula gets a fresh atom `a` and defining clauses for `a <-> f`.

use std::collections::HashMap;

use log::debug;

use super::elaborate::{elaborate, Script};
use super::sexp::parse_all;
use super::term::{Op, TermId, TermStore};
use super::FrontEndError;

/// A conjunction of clauses. Each clause is a literal or a disjunction of literals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Goal {
    pub clauses: Vec<TermId>,
}

impl AsRef<[TermId]> for Goal {
    fn as_ref(&self) -> &[TermId] {
        &self.clauses
    }
}

/// A normalized script.
#[derive(Debug)]
pub struct Normalized {
    pub store: TermStore,
    /// Empty when nothing was asserted, otherwise a single goal.
    pub goals: Vec<Goal>,
}

impl Normalized {
    /// Number of clauses, if the script normalized to exactly one goal.
    pub fn num_clauses(&self) -> Option<usize> {
        match self.goals.as_slice() {
            [goal] => Some(goal.clauses.len()),
            _ => None,
        }
    }
}

/// Parses, elaborates and normalizes an SMT-LIB script.
pub fn normalize(text: &str) -> Result<Normalized, FrontEndError> {
    let commands = parse_all(text)?;
    let Script { mut store, assertions } = elaborate(&commands)?;
    let goals = if assertions.is_empty() {
        Vec::new()
    } else {
        vec![to_cnf(&mut store, &assertions)?]
    };
    debug!(
        "normalize: {} assertions, {} terms, {:?} clauses",
        assertions.len(),
        store.len(),
        goals.iter().map(|g| g.clauses.len()).collect::<Vec<_>>()
    );
    Ok(Normalized { store, goals })
}

/// Clausifies the conjunction of `assertions`.
pub fn to_cnf(store: &mut TermStore, assertions: &[TermId]) -> Result<Goal, FrontEndError> {
    let mut cnf = Clausifier {
        store,
        defs: HashMap::new(),
        clauses: Vec::new(),
    };
    for &t in assertions {
        cnf.add_conjunct(t)?;
    }
    Ok(Goal { clauses: cnf.clauses })
}

struct Clausifier<'s> {
    store: &'s mut TermStore,
    /// Literal standing for each clausified non-literal sub-formula.
    defs: HashMap<TermId, TermId>,
    clauses: Vec<TermId>,
}

impl Clausifier<'_> {
    fn emit(&mut self, clause: TermId) {
        if clause != self.store.mk_true() {
            self.clauses.push(clause);
        }
    }

    fn add_conjunct(&mut self, root: TermId) -> Result<(), FrontEndError> {
        let mut stack = vec![root];
        while let Some(t) = stack.pop() {
            if self.store.is_clause(t) {
                self.emit(t);
                continue;
            }
            match self.store.op(t) {
                Op::And => stack.extend(self.store.args(t).iter().rev().copied()),
                Op::Or => {
                    let args = self.store.args(t).to_vec();
                    let lits = args
                        .into_iter()
                        .map(|a| self.literal(a))
                        .collect::<Result<Vec<_>, _>>()?;
                    let clause = self.store.mk_or(lits)?;
                    self.emit(clause);
                }
                Op::Not => {
                    let inner = self.store.args(t)[0];
                    let args = self.store.args(inner).to_vec();
                    match self.store.op(inner) {
                        // not (a | b) = !a & !b
                        Op::Or => {
                            for &a in args.iter().rev() {
                                let neg = self.store.mk_not(a)?;
                                stack.push(neg);
                            }
                        }
                        // not (a & b) = !a | !b
                        _ => {
                            let mut lits = Vec::with_capacity(args.len());
                            for a in args {
                                let lit = self.literal(a)?;
                                lits.push(self.store.mk_not(lit)?);
                            }
                            let clause = self.store.mk_or(lits)?;
                            self.emit(clause);
                        }
                    }
                }
                _ => {
                    let lit = self.literal(t)?;
                    self.emit(lit);
                }
            }
        }
        Ok(())
    }

    /// A literal equivalent to `root`, defining fresh atoms as needed.
    fn literal(&mut self, root: TermId) -> Result<TermId, FrontEndError> {
        let mut stack = vec![(root, false)];
        while let Some((t, expanded)) = stack.pop() {
            if self.store.is_literal(t) || self.defs.contains_key(&t) {
                continue;
            }
            if !expanded {
                stack.push((t, true));
                stack.extend(self.store.args(t).iter().map(|&a| (a, false)));
                continue;
            }
            let args = self.store.args(t).to_vec();
            let lits: Vec<TermId> = args.iter().map(|&a| self.resolved(a)).collect();
            let def = match self.store.op(t) {
                Op::Not => self.store.mk_not(lits[0])?,
                op @ (Op::And | Op::Or) => self.define(op, &lits)?,
                op => unreachable!("{:?} is a literal", op),
            };
            self.defs.insert(t, def);
        }
        Ok(self.resolved(root))
    }

    fn resolved(&self, t: TermId) -> TermId {
        if self.store.is_literal(t) {
            t
        } else {
            self.defs[&t]
        }
    }

    /// Introduces `a <-> op(lits)` and returns `a`.
    fn define(&mut self, op: Op, lits: &[TermId]) -> Result<TermId, FrontEndError> {
        let a = self.store.fresh_atom();
        let not_a = self.store.mk_not(a)?;
        let negated = lits
            .iter()
            .map(|&l| self.store.mk_not(l))
            .collect::<Result<Vec<_>, _>>()?;

        // For `or`: (!a | l1 | .. | ln) and (a | !li). For `and`: the dual.
        let (long_head, long_body, short_head, short_body) = match op {
            Op::Or => (not_a, lits, a, negated.as_slice()),
            _ => (a, negated.as_slice(), not_a, lits),
        };
        let mut long = Vec::with_capacity(lits.len() + 1);
        long.push(long_head);
        long.extend_from_slice(long_body);
        let clause = self.store.mk_or(long)?;
        self.emit(clause);
        for &l in short_body {
            let clause = self.store.mk_or(vec![short_head, l])?;
            self.emit(clause);
        }
        Ok(a)
    }
}
