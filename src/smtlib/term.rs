//! Hash-consed terms.
//!
//! Every structurally distinct term gets exactly one [`TermId`], which serves as
//! its identity for the analyzer. Constructors apply light simplifications
//! (double negation, neutral and absorbing constants, flattening of nested
//! connectives, complementary literals) and reduce derived connectives to
//! `not`/`and`/`or`/`=`.

use std::collections::HashMap;
use std::fmt;

use super::FrontEndError;
use crate::analyzer::{ExprView, NodeKind};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TermId(u32);

impl TermId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FuncId(u32);

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Sort {
    Bool,
    /// Uninterpreted sort of arity 0.
    Named(String),
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sort::Bool => write!(f, "Bool"),
            Sort::Named(name) => write!(f, "{}", name),
        }
    }
}

/// An uninterpreted function symbol. Constants have an empty domain.
#[derive(Debug, Clone)]
pub struct FuncDecl {
    pub name: String,
    pub domain: Vec<Sort>,
    pub range: Sort,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Op {
    True,
    False,
    App(FuncId),
    Eq,
    Not,
    And,
    Or,
    /// Fresh proposition introduced by clausification.
    Atom(u32),
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
struct Node {
    op: Op,
    args: Vec<TermId>,
}

pub struct TermStore {
    nodes: Vec<Node>,
    sorts: Vec<Sort>,
    index: HashMap<Node, TermId>,
    funcs: Vec<FuncDecl>,
    func_names: HashMap<String, FuncId>,
    num_atoms: u32,
    num_fresh: u32,
}

impl Default for TermStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TermStore {
    pub fn new() -> Self {
        let mut store = Self {
            nodes: Vec::new(),
            sorts: Vec::new(),
            index: HashMap::new(),
            funcs: Vec::new(),
            func_names: HashMap::new(),
            num_atoms: 0,
            num_fresh: 0,
        };
        store.intern(Op::True, vec![], Sort::Bool);
        store.intern(Op::False, vec![], Sort::Bool);
        store
    }

    fn intern(&mut self, op: Op, args: Vec<TermId>, sort: Sort) -> TermId {
        let node = Node { op, args };
        if let Some(&id) = self.index.get(&node) {
            return id;
        }
        let id = TermId(self.nodes.len() as u32);
        self.nodes.push(node.clone());
        self.sorts.push(sort);
        self.index.insert(node, id);
        id
    }

    /// Number of distinct terms.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn op(&self, t: TermId) -> Op {
        self.nodes[t.index()].op
    }

    pub fn args(&self, t: TermId) -> &[TermId] {
        &self.nodes[t.index()].args
    }

    pub fn sort(&self, t: TermId) -> &Sort {
        &self.sorts[t.index()]
    }

    pub fn func(&self, f: FuncId) -> &FuncDecl {
        &self.funcs[f.0 as usize]
    }

    pub fn lookup_func(&self, name: &str) -> Option<FuncId> {
        self.func_names.get(name).copied()
    }

    // ─── Declarations ───

    pub fn declare_fun(&mut self, name: &str, domain: Vec<Sort>, range: Sort) -> Result<FuncId, FrontEndError> {
        if self.func_names.contains_key(name) {
            return Err(FrontEndError::Sort(format!("function '{}' declared twice", name)));
        }
        let id = FuncId(self.funcs.len() as u32);
        self.funcs.push(FuncDecl {
            name: name.to_string(),
            domain,
            range,
        });
        self.func_names.insert(name.to_string(), id);
        Ok(id)
    }

    /// Declares a constant with a name that cannot clash with user symbols.
    pub fn fresh_const(&mut self, prefix: &str, sort: Sort) -> TermId {
        let name = format!("{}!{}", prefix, self.num_fresh);
        self.num_fresh += 1;
        let id = FuncId(self.funcs.len() as u32);
        self.funcs.push(FuncDecl {
            name: name.clone(),
            domain: vec![],
            range: sort.clone(),
        });
        self.func_names.insert(name, id);
        self.intern(Op::App(id), vec![], sort)
    }

    /// A fresh proposition.
    pub fn fresh_atom(&mut self) -> TermId {
        let n = self.num_atoms;
        self.num_atoms += 1;
        self.intern(Op::Atom(n), vec![], Sort::Bool)
    }

    // ─── Constructors ───

    pub fn mk_true(&self) -> TermId {
        TermId(0)
    }

    pub fn mk_false(&self) -> TermId {
        TermId(1)
    }

    pub fn mk_app(&mut self, f: FuncId, args: Vec<TermId>) -> Result<TermId, FrontEndError> {
        let decl = &self.funcs[f.0 as usize];
        if decl.domain.len() != args.len() {
            return Err(FrontEndError::Sort(format!(
                "'{}' expects {} arguments, got {}",
                decl.name,
                decl.domain.len(),
                args.len()
            )));
        }
        for (i, (&arg, expected)) in args.iter().zip(decl.domain.iter()).enumerate() {
            if self.sort(arg) != expected {
                return Err(FrontEndError::Sort(format!(
                    "argument {} of '{}' has sort {}, expected {}",
                    i,
                    decl.name,
                    self.sort(arg),
                    expected
                )));
            }
        }
        let range = decl.range.clone();
        Ok(self.intern(Op::App(f), args, range))
    }

    fn expect_bool(&self, t: TermId, context: &str) -> Result<(), FrontEndError> {
        if *self.sort(t) != Sort::Bool {
            return Err(FrontEndError::Sort(format!(
                "'{}' expects Bool arguments, got {}",
                context,
                self.sort(t)
            )));
        }
        Ok(())
    }

    /// The negation of `t`, if it already exists as a term.
    fn existing_negation(&self, t: TermId) -> Option<TermId> {
        if self.op(t) == Op::Not {
            return Some(self.args(t)[0]);
        }
        self.index
            .get(&Node {
                op: Op::Not,
                args: vec![t],
            })
            .copied()
    }

    pub fn mk_not(&mut self, t: TermId) -> Result<TermId, FrontEndError> {
        self.expect_bool(t, "not")?;
        Ok(match self.op(t) {
            Op::True => self.mk_false(),
            Op::False => self.mk_true(),
            Op::Not => self.args(t)[0],
            _ => self.intern(Op::Not, vec![t], Sort::Bool),
        })
    }

    pub fn mk_and(&mut self, args: Vec<TermId>) -> Result<TermId, FrontEndError> {
        self.mk_junction(Op::And, args)
    }

    pub fn mk_or(&mut self, args: Vec<TermId>) -> Result<TermId, FrontEndError> {
        self.mk_junction(Op::Or, args)
    }

    /// Builds `and`/`or`, flattening nested occurrences of the same connective.
    ///
    /// Repeated arguments are kept: they count towards the clause sizes the
    /// analyzer measures.
    fn mk_junction(&mut self, op: Op, args: Vec<TermId>) -> Result<TermId, FrontEndError> {
        let (unit, zero) = match op {
            Op::And => (self.mk_true(), self.mk_false()),
            Op::Or => (self.mk_false(), self.mk_true()),
            _ => unreachable!("not a junction: {:?}", op),
        };
        let context = if op == Op::And { "and" } else { "or" };

        let mut out: Vec<TermId> = Vec::with_capacity(args.len());
        let mut pending: Vec<TermId> = args;
        pending.reverse();
        while let Some(t) = pending.pop() {
            self.expect_bool(t, context)?;
            if t == unit {
                continue;
            }
            if t == zero {
                return Ok(zero);
            }
            if self.op(t) == op {
                pending.extend(self.args(t).iter().rev().copied());
                continue;
            }
            if let Some(neg) = self.existing_negation(t) {
                if out.contains(&neg) {
                    return Ok(zero);
                }
            }
            out.push(t);
        }

        Ok(match out.len() {
            0 => unit,
            1 => out[0],
            _ => self.intern(op, out, Sort::Bool),
        })
    }

    /// Equality. On Bool arguments this is the biconditional.
    pub fn mk_eq(&mut self, a: TermId, b: TermId) -> Result<TermId, FrontEndError> {
        if self.sort(a) != self.sort(b) {
            return Err(FrontEndError::Sort(format!(
                "'=' between sorts {} and {}",
                self.sort(a),
                self.sort(b)
            )));
        }
        if a == b {
            return Ok(self.mk_true());
        }
        if *self.sort(a) == Sort::Bool {
            return self.mk_iff(a, b);
        }
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        Ok(self.intern(Op::Eq, vec![lo, hi], Sort::Bool))
    }

    pub fn mk_iff(&mut self, a: TermId, b: TermId) -> Result<TermId, FrontEndError> {
        let not_a = self.mk_not(a)?;
        let not_b = self.mk_not(b)?;
        let fwd = self.mk_or(vec![not_a, b])?;
        let bwd = self.mk_or(vec![a, not_b])?;
        self.mk_and(vec![fwd, bwd])
    }

    pub fn mk_xor(&mut self, a: TermId, b: TermId) -> Result<TermId, FrontEndError> {
        let iff = self.mk_iff(a, b)?;
        self.mk_not(iff)
    }

    pub fn mk_implies(&mut self, a: TermId, b: TermId) -> Result<TermId, FrontEndError> {
        let not_a = self.mk_not(a)?;
        self.mk_or(vec![not_a, b])
    }

    /// Boolean if-then-else.
    pub fn mk_ite(&mut self, c: TermId, t: TermId, e: TermId) -> Result<TermId, FrontEndError> {
        let not_c = self.mk_not(c)?;
        let then = self.mk_or(vec![not_c, t])?;
        let other = self.mk_or(vec![c, e])?;
        self.mk_and(vec![then, other])
    }

    /// Pairwise disequality of all arguments.
    pub fn mk_distinct(&mut self, args: &[TermId]) -> Result<TermId, FrontEndError> {
        let mut diseqs = Vec::new();
        for i in 0..args.len() {
            for j in (i + 1)..args.len() {
                let eq = self.mk_eq(args[i], args[j])?;
                diseqs.push(self.mk_not(eq)?);
            }
        }
        self.mk_and(diseqs)
    }

    // ─── Classification ───

    /// Atoms: constants, equalities, Bool-valued applications, fresh propositions.
    pub fn is_atom(&self, t: TermId) -> bool {
        matches!(self.op(t), Op::True | Op::False | Op::App(_) | Op::Eq | Op::Atom(_))
    }

    pub fn is_literal(&self, t: TermId) -> bool {
        match self.op(t) {
            Op::Not => self.is_atom(self.args(t)[0]),
            _ => self.is_atom(t),
        }
    }

    /// A literal, or a disjunction of literals.
    pub fn is_clause(&self, t: TermId) -> bool {
        match self.op(t) {
            Op::Or => self.args(t).iter().all(|&a| self.is_literal(a)),
            _ => self.is_literal(t),
        }
    }
}

impl fmt::Debug for TermStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TermStore")
            .field("terms", &self.nodes.len())
            .field("funcs", &self.funcs.len())
            .field("atoms", &self.num_atoms)
            .finish()
    }
}

impl ExprView for TermStore {
    type Node = TermId;

    fn id(&self, node: TermId) -> u32 {
        node.0
    }

    fn kind(&self, node: TermId) -> NodeKind {
        match self.op(node) {
            Op::Eq => NodeKind::Equality,
            Op::App(f) => NodeKind::Application(f.0),
            _ => NodeKind::Other,
        }
    }

    fn children(&self, node: TermId) -> &[TermId] {
        self.args(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_consts(n: usize) -> (TermStore, Vec<TermId>) {
        let mut store = TermStore::new();
        let u = Sort::Named("U".to_string());
        let mut consts = Vec::new();
        for i in 0..n {
            let f = store.declare_fun(&format!("x{}", i), vec![], u.clone()).unwrap();
            consts.push(store.mk_app(f, vec![]).unwrap());
        }
        (store, consts)
    }

    #[test]
    fn test_hash_consing() {
        let (mut store, x) = store_with_consts(2);
        let e1 = store.mk_eq(x[0], x[1]).unwrap();
        let e2 = store.mk_eq(x[1], x[0]).unwrap();
        assert_eq!(e1, e2);
        let n1 = store.mk_not(e1).unwrap();
        let n2 = store.mk_not(e2).unwrap();
        assert_eq!(n1, n2);
        assert_eq!(store.mk_not(n1).unwrap(), e1);
        assert_eq!(store.mk_eq(x[0], x[0]).unwrap(), store.mk_true());
    }

    #[test]
    fn test_junction_simplification() {
        let (mut store, x) = store_with_consts(3);
        let a = store.mk_eq(x[0], x[1]).unwrap();
        let b = store.mk_eq(x[1], x[2]).unwrap();
        let not_a = store.mk_not(a).unwrap();
        let t = store.mk_true();
        let f = store.mk_false();

        assert_eq!(store.mk_or(vec![a, not_a]).unwrap(), t);
        assert_eq!(store.mk_and(vec![a, not_a]).unwrap(), f);
        assert_eq!(store.mk_or(vec![f, a]).unwrap(), a);
        assert_eq!(store.mk_and(vec![]).unwrap(), t);

        let inner = store.mk_or(vec![a, b]).unwrap();
        let outer = store.mk_or(vec![inner, not_a]).unwrap();
        assert_eq!(outer, t);

        let ab = store.mk_and(vec![a, b]).unwrap();
        let nested = store.mk_and(vec![ab, a]).unwrap();
        assert_eq!(store.args(nested), &[a, b, a]);
    }

    #[test]
    fn test_sort_errors() {
        let (mut store, x) = store_with_consts(1);
        let p = store.declare_fun("p", vec![], Sort::Bool).unwrap();
        let p = store.mk_app(p, vec![]).unwrap();
        assert!(store.mk_eq(x[0], p).is_err());
        assert!(store.mk_not(x[0]).is_err());
        assert!(store.mk_and(vec![p, x[0]]).is_err());
        assert!(store.declare_fun("p", vec![], Sort::Bool).is_err());

        let f = store.declare_fun("f", vec![Sort::Named("U".into())], Sort::Named("U".into())).unwrap();
        assert!(store.mk_app(f, vec![]).is_err());
        assert!(store.mk_app(f, vec![p]).is_err());
        assert!(store.mk_app(f, vec![x[0]]).is_ok());
    }

    #[test]
    fn test_bool_eq_is_iff() {
        let mut store = TermStore::new();
        let p = store.declare_fun("p", vec![], Sort::Bool).unwrap();
        let q = store.declare_fun("q", vec![], Sort::Bool).unwrap();
        let p = store.mk_app(p, vec![]).unwrap();
        let q = store.mk_app(q, vec![]).unwrap();
        let iff = store.mk_eq(p, q).unwrap();
        assert_eq!(store.op(iff), Op::And);
        assert_eq!(store.args(iff).len(), 2);
        for &c in store.args(iff) {
            assert!(store.is_clause(c));
        }
    }

    #[test]
    fn test_distinct() {
        let (mut store, x) = store_with_consts(3);
        let d = store.mk_distinct(&x).unwrap();
        assert_eq!(store.op(d), Op::And);
        assert_eq!(store.args(d).len(), 3);
        for &c in store.args(d) {
            assert_eq!(store.op(c), Op::Not);
            assert!(store.is_literal(c));
        }
    }

    #[test]
    fn test_expr_view() {
        let (mut store, x) = store_with_consts(2);
        let u = Sort::Named("U".into());
        let f = store.declare_fun("f", vec![u.clone()], u).unwrap();
        let fx = store.mk_app(f, vec![x[0]]).unwrap();
        let eq = store.mk_eq(fx, x[1]).unwrap();
        assert_eq!(store.kind(eq), NodeKind::Equality);
        assert_eq!(store.kind(fx), NodeKind::Application(f.0));
        assert_eq!(ExprView::children(&store, fx), &[x[0]]);
        assert_eq!(store.kind(store.mk_true()), NodeKind::Other);
    }
}
