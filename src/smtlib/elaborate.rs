//! Elaboration of SMT-LIB commands into hash-consed terms.
//!
//! Terms are elaborated with an explicit task stack: `Visit` tasks push their
//! operands' tasks, `Apply` tasks pop operand values and build the term. Scopes
//! for `let` and for `define-fun` bodies live on a separate stack; a macro body
//! only sees its own parameters and global names.
//!
//! Non-Boolean `ite` terms are replaced by a fresh constant `k` and the side
//! assertions `(or (not c) (= k t))` and `(or c (= k e))`.

use std::collections::HashMap;

use log::trace;

use super::sexp::SExpr;
use super::term::{Sort, TermId, TermStore};
use super::FrontEndError;

/// Sorts and operators of interpreted theories, rejected with `Unsupported`.
const INTERPRETED: &[&str] = &[
    "Int", "Real", "String", "BitVec", "Array", "FloatingPoint", "+", "-", "*", "/", "div", "mod", "abs", "<", "<=",
    ">", ">=", "to_real", "to_int", "is_int", "select", "store", "concat", "extract", "bvadd", "bvmul", "bvand",
    "bvor", "bvnot", "bvult", "bvule", "str.++", "str.len",
];

/// The result of elaborating a script: the term store and the asserted formulas.
#[derive(Debug)]
pub struct Script {
    pub store: TermStore,
    pub assertions: Vec<TermId>,
}

/// Elaborates a sequence of top-level commands.
pub fn elaborate(commands: &[SExpr]) -> Result<Script, FrontEndError> {
    let mut elaborator = Elaborator::new();
    for command in commands {
        if !elaborator.command(command)? {
            break;
        }
    }
    Ok(Script {
        store: elaborator.store,
        assertions: elaborator.assertions,
    })
}

struct Macro<'a> {
    params: Vec<(&'a str, Sort)>,
    body: &'a SExpr,
}

struct Scope<'a> {
    vars: HashMap<&'a str, TermId>,
    /// Lookups do not continue past a barrier.
    barrier: bool,
}

enum Task<'a> {
    Visit(&'a SExpr),
    Apply(&'a str, usize),
    BindLet(Vec<&'a str>),
    Name(&'a str),
    PopScope,
}

struct Elaborator<'a> {
    store: TermStore,
    sorts: HashMap<&'a str, Sort>,
    macros: HashMap<&'a str, Macro<'a>>,
    named: HashMap<&'a str, TermId>,
    scopes: Vec<Scope<'a>>,
    assertions: Vec<TermId>,
    /// Side conditions of lifted `ite` terms, flushed after each assertion.
    side: Vec<TermId>,
}

fn expect_symbol<'a>(expr: &'a SExpr, what: &str) -> Result<&'a str, FrontEndError> {
    expr.as_symbol()
        .ok_or_else(|| FrontEndError::Parse(super::ParseError::new(format!("expected {}, got '{}'", what, expr))))
}

fn expect_list<'a>(expr: &'a SExpr, what: &str) -> Result<&'a [SExpr], FrontEndError> {
    expr.as_list()
        .ok_or_else(|| FrontEndError::Parse(super::ParseError::new(format!("expected {}, got '{}'", what, expr))))
}

fn malformed(command: &SExpr) -> FrontEndError {
    FrontEndError::Parse(super::ParseError::new(format!("malformed command '{}'", command)))
}

impl<'a> Elaborator<'a> {
    fn new() -> Self {
        Self {
            store: TermStore::new(),
            sorts: HashMap::new(),
            macros: HashMap::new(),
            named: HashMap::new(),
            scopes: Vec::new(),
            assertions: Vec::new(),
            side: Vec::new(),
        }
    }

    /// Processes one command. Returns `false` on `exit`.
    fn command(&mut self, command: &'a SExpr) -> Result<bool, FrontEndError> {
        let items = expect_list(command, "a command")?;
        let head = items.first().ok_or_else(|| malformed(command))?;
        let head = expect_symbol(head, "a command name")?;
        trace!("command '{}'", head);

        match (head, &items[1..]) {
            ("set-logic" | "set-info" | "set-option" | "get-info" | "get-option" | "echo", _) => {}
            ("check-sat" | "get-model" | "get-value" | "get-assignment" | "get-unsat-core" | "push" | "pop", _) => {}
            ("exit", _) => return Ok(false),
            ("declare-sort", [name, rest @ ..]) => {
                let name = expect_symbol(name, "a sort name")?;
                match rest {
                    [] => {}
                    [arity] if arity.as_numeral() == Some("0") => {}
                    _ => {
                        return Err(FrontEndError::Unsupported(format!(
                            "parametric sort '{}'",
                            name
                        )))
                    }
                }
                self.add_sort(name, Sort::Named(name.to_string()))?;
            }
            ("define-sort", [name, params, sort]) => {
                let name = expect_symbol(name, "a sort name")?;
                if !expect_list(params, "sort parameters")?.is_empty() {
                    return Err(FrontEndError::Unsupported(format!("parametric sort '{}'", name)));
                }
                let sort = self.sort(sort)?;
                self.add_sort(name, sort)?;
            }
            ("declare-fun", [name, domain, range]) => {
                let name = expect_symbol(name, "a function name")?;
                let domain = expect_list(domain, "a list of sorts")?
                    .iter()
                    .map(|s| self.sort(s))
                    .collect::<Result<Vec<_>, _>>()?;
                let range = self.sort(range)?;
                self.check_fresh(name)?;
                self.store.declare_fun(name, domain, range)?;
            }
            ("declare-const", [name, sort]) => {
                let name = expect_symbol(name, "a constant name")?;
                let sort = self.sort(sort)?;
                self.check_fresh(name)?;
                self.store.declare_fun(name, vec![], sort)?;
            }
            ("define-fun", [name, params, range, body]) => {
                let name = expect_symbol(name, "a function name")?;
                let mut bound = Vec::new();
                for param in expect_list(params, "a parameter list")? {
                    match expect_list(param, "a sorted variable")? {
                        [var, sort] => bound.push((expect_symbol(var, "a variable")?, self.sort(sort)?)),
                        _ => return Err(malformed(command)),
                    }
                }
                let range = self.sort(range)?;
                self.check_fresh(name)?;
                self.check_macro_body(name, &bound, &range, body)?;
                self.macros.insert(name, Macro { params: bound, body });
            }
            ("assert", [term]) => {
                let t = self.term(term)?;
                if *self.store.sort(t) != Sort::Bool {
                    return Err(FrontEndError::Sort(format!("asserted term '{}' is not Bool", term)));
                }
                self.assertions.push(t);
                self.assertions.append(&mut self.side);
            }
            (
                "declare-sort" | "define-sort" | "declare-fun" | "declare-const" | "define-fun" | "assert",
                _,
            ) => return Err(malformed(command)),
            (other, _) => return Err(FrontEndError::Unsupported(format!("command '{}'", other))),
        }
        Ok(true)
    }

    fn add_sort(&mut self, name: &'a str, sort: Sort) -> Result<(), FrontEndError> {
        if name == "Bool" || self.sorts.contains_key(name) {
            return Err(FrontEndError::Sort(format!("sort '{}' declared twice", name)));
        }
        self.sorts.insert(name, sort);
        Ok(())
    }

    fn check_fresh(&self, name: &str) -> Result<(), FrontEndError> {
        if self.store.lookup_func(name).is_some() || self.macros.contains_key(name) || self.named.contains_key(name) {
            return Err(FrontEndError::Sort(format!("'{}' declared twice", name)));
        }
        Ok(())
    }

    /// Elaborates a macro body once over placeholder parameters. The macro is
    /// not yet defined at this point, so the body cannot refer to itself.
    fn check_macro_body(
        &mut self,
        name: &str,
        params: &[(&'a str, Sort)],
        range: &Sort,
        body: &'a SExpr,
    ) -> Result<(), FrontEndError> {
        let mut vars = HashMap::with_capacity(params.len());
        for (param, sort) in params {
            vars.insert(*param, self.store.fresh_const("param", sort.clone()));
        }
        let num_side = self.side.len();
        self.scopes.push(Scope { vars, barrier: true });
        let result = self.term(body);
        self.scopes.pop();
        self.side.truncate(num_side);

        let t = result?;
        if self.store.sort(t) != range {
            return Err(FrontEndError::Sort(format!(
                "body of '{}' has sort {}, declared {}",
                name,
                self.store.sort(t),
                range
            )));
        }
        Ok(())
    }

    fn sort(&self, expr: &SExpr) -> Result<Sort, FrontEndError> {
        match expr {
            SExpr::Symbol(name) if name == "Bool" => Ok(Sort::Bool),
            SExpr::Symbol(name) => match self.sorts.get(name.as_str()) {
                Some(sort) => Ok(sort.clone()),
                None if INTERPRETED.contains(&name.as_str()) => {
                    Err(FrontEndError::Unsupported(format!("sort '{}'", name)))
                }
                None => Err(FrontEndError::Undeclared(format!("sort '{}'", name))),
            },
            _ => Err(FrontEndError::Unsupported(format!("sort '{}'", expr))),
        }
    }

    fn lookup_var(&self, name: &str) -> Option<TermId> {
        for scope in self.scopes.iter().rev() {
            if let Some(&t) = scope.vars.get(name) {
                return Some(t);
            }
            if scope.barrier {
                break;
            }
        }
        self.named.get(name).copied()
    }

    /// Elaborates one term.
    fn term(&mut self, expr: &'a SExpr) -> Result<TermId, FrontEndError> {
        let base_scopes = self.scopes.len();
        let result = self.run(expr);
        self.scopes.truncate(base_scopes);
        result
    }

    fn run(&mut self, expr: &'a SExpr) -> Result<TermId, FrontEndError> {
        let mut tasks: Vec<Task<'a>> = vec![Task::Visit(expr)];
        let mut values: Vec<TermId> = Vec::new();

        while let Some(task) = tasks.pop() {
            match task {
                Task::Visit(expr) => self.visit(expr, &mut tasks, &mut values)?,
                Task::Apply(op, n) => {
                    let args = values.split_off(values.len() - n);
                    self.apply(op, args, &mut tasks, &mut values)?;
                }
                Task::BindLet(names) => {
                    let bound = values.split_off(values.len() - names.len());
                    let vars = names.into_iter().zip(bound).collect();
                    self.scopes.push(Scope { vars, barrier: false });
                }
                Task::Name(name) => {
                    let t = *values
                        .last()
                        .ok_or_else(|| FrontEndError::Parse(super::ParseError::new("missing annotated term")))?;
                    if self.named.contains_key(name) || self.store.lookup_func(name).is_some() {
                        return Err(FrontEndError::Sort(format!("'{}' declared twice", name)));
                    }
                    self.named.insert(name, t);
                }
                Task::PopScope => {
                    self.scopes.pop();
                }
            }
        }

        debug_assert_eq!(values.len(), 1);
        values.pop().ok_or_else(|| FrontEndError::Parse(super::ParseError::new("empty term")))
    }

    fn visit(&mut self, expr: &'a SExpr, tasks: &mut Vec<Task<'a>>, values: &mut Vec<TermId>) -> Result<(), FrontEndError> {
        match expr {
            SExpr::Symbol(name) => {
                let name = name.as_str();
                match name {
                    "true" => values.push(self.store.mk_true()),
                    "false" => values.push(self.store.mk_false()),
                    _ => tasks.push(Task::Apply(name, 0)),
                }
            }
            SExpr::Numeral(_) | SExpr::Decimal(_) | SExpr::BitVector(_) | SExpr::String(_) => {
                return Err(FrontEndError::Unsupported(format!("literal '{}'", expr)));
            }
            SExpr::Keyword(k) => {
                return Err(FrontEndError::Parse(super::ParseError::new(format!(
                    "unexpected keyword '{}'",
                    k
                ))));
            }
            SExpr::List(items) => {
                let (head, args) = items
                    .split_first()
                    .ok_or_else(|| FrontEndError::Parse(super::ParseError::new("empty application")))?;
                let head = match head {
                    SExpr::Symbol(s) => s.as_str(),
                    _ => return Err(FrontEndError::Unsupported(format!("indexed or qualified term '{}'", expr))),
                };
                match head {
                    "let" => {
                        let (bindings, body) = match args {
                            [bindings, body] => (expect_list(bindings, "let bindings")?, body),
                            _ => return Err(FrontEndError::Parse(super::ParseError::new("malformed let"))),
                        };
                        let mut names = Vec::with_capacity(bindings.len());
                        let mut terms = Vec::with_capacity(bindings.len());
                        for binding in bindings {
                            match expect_list(binding, "a let binding")? {
                                [name, term] => {
                                    names.push(expect_symbol(name, "a variable")?);
                                    terms.push(term);
                                }
                                _ => return Err(FrontEndError::Parse(super::ParseError::new("malformed let binding"))),
                            }
                        }
                        tasks.push(Task::PopScope);
                        tasks.push(Task::Visit(body));
                        tasks.push(Task::BindLet(names));
                        tasks.extend(terms.into_iter().rev().map(Task::Visit));
                    }
                    "!" => {
                        let (term, attrs) = args
                            .split_first()
                            .ok_or_else(|| FrontEndError::Parse(super::ParseError::new("empty annotation")))?;
                        let mut i = 0;
                        while i < attrs.len() {
                            if matches!(&attrs[i], SExpr::Keyword(k) if k == ":named") {
                                let name = attrs
                                    .get(i + 1)
                                    .ok_or_else(|| FrontEndError::Parse(super::ParseError::new("missing name")))?;
                                tasks.push(Task::Name(expect_symbol(name, "a name")?));
                                i += 1;
                            }
                            i += 1;
                        }
                        tasks.push(Task::Visit(term));
                    }
                    "forall" | "exists" | "match" | "_" | "as" => {
                        return Err(FrontEndError::Unsupported(format!("'{}' terms", head)));
                    }
                    _ => {
                        if args.is_empty() {
                            return Err(FrontEndError::Parse(super::ParseError::new(format!(
                                "application of '{}' without arguments",
                                head
                            ))));
                        }
                        tasks.push(Task::Apply(head, args.len()));
                        tasks.extend(args.iter().rev().map(Task::Visit));
                    }
                }
            }
        }
        Ok(())
    }

    fn apply(
        &mut self,
        op: &'a str,
        args: Vec<TermId>,
        tasks: &mut Vec<Task<'a>>,
        values: &mut Vec<TermId>,
    ) -> Result<(), FrontEndError> {
        if args.is_empty() {
            if let Some(t) = self.lookup_var(op) {
                values.push(t);
                return Ok(());
            }
        }

        let store = &mut self.store;
        let arity = args.len();
        let t = match op {
            "not" if arity == 1 => store.mk_not(args[0])?,
            "and" if arity >= 1 => store.mk_and(args)?,
            "or" if arity >= 1 => store.mk_or(args)?,
            "=>" if arity >= 2 => {
                let mut acc = args[arity - 1];
                for &premise in args[..arity - 1].iter().rev() {
                    acc = store.mk_implies(premise, acc)?;
                }
                acc
            }
            "xor" if arity >= 2 => {
                let mut acc = args[0];
                for &next in &args[1..] {
                    acc = store.mk_xor(acc, next)?;
                }
                acc
            }
            "=" if arity >= 2 => {
                let eqs = args
                    .windows(2)
                    .map(|w| store.mk_eq(w[0], w[1]))
                    .collect::<Result<Vec<_>, _>>()?;
                store.mk_and(eqs)?
            }
            "distinct" if arity >= 2 => store.mk_distinct(&args)?,
            "ite" if arity == 3 => {
                if *store.sort(args[1]) == Sort::Bool {
                    store.mk_ite(args[0], args[1], args[2])?
                } else {
                    self.lift_ite(args[0], args[1], args[2])?
                }
            }
            "not" | "and" | "or" | "=>" | "xor" | "=" | "distinct" | "ite" => {
                return Err(FrontEndError::Sort(format!("wrong number of arguments to '{}'", op)));
            }
            _ => {
                if let Some(m) = self.macros.get(op) {
                    if m.params.len() != args.len() {
                        return Err(FrontEndError::Sort(format!(
                            "'{}' expects {} arguments, got {}",
                            op,
                            m.params.len(),
                            args.len()
                        )));
                    }
                    let mut vars = HashMap::with_capacity(args.len());
                    for (&(name, ref sort), &arg) in m.params.iter().zip(args.iter()) {
                        if self.store.sort(arg) != sort {
                            return Err(FrontEndError::Sort(format!(
                                "argument '{}' of '{}' must have sort {}",
                                name, op, sort
                            )));
                        }
                        vars.insert(name, arg);
                    }
                    self.scopes.push(Scope { vars, barrier: true });
                    tasks.push(Task::PopScope);
                    tasks.push(Task::Visit(m.body));
                    return Ok(());
                }
                match self.store.lookup_func(op) {
                    Some(f) => self.store.mk_app(f, args)?,
                    None if INTERPRETED.contains(&op) => {
                        return Err(FrontEndError::Unsupported(format!("interpreted symbol '{}'", op)))
                    }
                    None => return Err(FrontEndError::Undeclared(op.to_string())),
                }
            }
        };
        values.push(t);
        Ok(())
    }

    fn lift_ite(&mut self, c: TermId, t: TermId, e: TermId) -> Result<TermId, FrontEndError> {
        let store = &mut self.store;
        let sort = store.sort(t).clone();
        if *store.sort(e) != sort {
            return Err(FrontEndError::Sort(format!(
                "'ite' branches have sorts {} and {}",
                store.sort(t),
                store.sort(e)
            )));
        }
        let k = store.fresh_const("ite", sort);
        let k_then = store.mk_eq(k, t)?;
        let k_else = store.mk_eq(k, e)?;
        let then = store.mk_implies(c, k_then)?;
        let not_c = store.mk_not(c)?;
        let other = store.mk_implies(not_c, k_else)?;
        self.side.push(then);
        self.side.push(other);
        Ok(k)
    }
}
