//! # eqbench: sparse equality-logic benchmarks
//!
//! **`eqbench`** generates random CNF formulas over equalities between constants
//! of one uninterpreted sort, with two structural knobs, and measures the same
//! two quantities on arbitrary SMT-LIB formulas.
//!
//! - **Sparseness** is the share of literal occurrences that introduce a new
//!   equality, between `0` (every clause reuses the first clause's equalities)
//!   and `1` (every literal mentions a distinct pair).
//! - **Constant factor** places the number of constants between the fewest that
//!   can host the formula's equalities and twice the number of literals.
//!
//! ## Generating
//!
//! ```rust
//! use eqbench::generator::{Generator, GeneratorConfig};
//! use eqbench::render::render;
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let config = GeneratorConfig::new(4, 3, 0.5);
//! let mut generator = Generator::new(config, ChaCha8Rng::seed_from_u64(42)).unwrap();
//! let formula = generator.generate().unwrap();
//! assert_eq!(formula.num_clauses(), 4);
//! assert!((0.0..=1.0).contains(&formula.sparseness()));
//!
//! let rendered = render(&formula, generator.rng()).unwrap();
//! assert!(rendered.text.starts_with("(declare-sort U 0)"));
//! ```
//!
//! ## Analyzing
//!
//! ```rust
//! use eqbench::analyzer::analyze_script;
//!
//! let m = analyze_script(
//!     "(declare-sort U 0) (declare-fun a () U) (declare-fun b () U) (declare-fun c () U)
//!      (assert (and (or (= a b) (not (= b c))) (or (= b c) (= a c))))",
//! )
//! .unwrap();
//! assert_eq!(m.to_string(), "0.5,0");
//! ```
//!
//! ## Core Components
//!
//! - **[`codec`]**: ranks of symbol pairs.
//! - **[`graph`]**: the equality graph shared by generator and analyzer.
//! - **[`generator`]** and **[`render`]**: formula generation and SMT-LIB output.
//! - **[`smtlib`]**: reading and clausifying SMT-LIB scripts.
//! - **[`analyzer`]**: metric recovery.
//! - **[`table`]**: append-only results files.

pub mod analyzer;
pub mod codec;
pub mod error;
pub mod formula;
pub mod generator;
pub mod graph;
pub mod render;
pub mod smtlib;
pub mod table;
pub mod types;
