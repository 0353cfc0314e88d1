//! # Glide
//!
//! Generalized LL (GLL) parsing for arbitrary context-free grammars, extended
//! with data-dependent constraints.
//!
//! ## Overview
//!
//! - **Grammars**: nonterminals with parameters, alternatives built from
//!   terminals, calls, blocks and control symbols (`if`, `while`, code and
//!   conditions) through [`GrammarBuilder`]
//! - **Grammar graph**: a grammar compiles once into a [`GrammarGraph`] of
//!   slots and transitions that any number of parsers can share
//! - **Parsing**: [`GllParser`] handles left recursion and ambiguity and
//!   builds a shared packed parse forest ([`Sppf`]) holding every derivation
//! - **Data dependence**: labels bind parsed spans, variables carry values
//!   and return expressions pass values back to callers
//!
//! ## Quick Start
//!
//! ```rust
//! use glide::{GllParser, Grammar, Input, ParserConfig, Symbol};
//! use glide::sppf::visit::count_derivations;
//!
//! let grammar = Grammar::builder()
//!     .start("S")
//!     .rule("S", [Symbol::nonterminal("S"), Symbol::nonterminal("S")])
//!     .rule("S", [Symbol::literal("a")])
//!     .build()
//!     .unwrap();
//! let mut parser = GllParser::from_grammar(&grammar, ParserConfig::default()).unwrap();
//!
//! let (forest, root) = parser.parse(&Input::new("aaa")).into_result().unwrap();
//! assert_eq!(count_derivations(&forest, root), Some(2));
//! ```
//!
//! ## Features
//!
//! - `serialize`: serde support for configuration, statistics and ids
//! - `diagnostics`: [`miette`](https://docs.rs/miette) diagnostics for
//!   grammar and parse errors

pub mod datadep;
pub mod error;
pub mod grammar;
pub mod graph;
pub mod gss;
pub mod input;
pub mod parser;
pub mod sppf;
pub mod terminal;

// Re-export commonly used types
pub use datadep::{Expression, Statement, Value};
pub use error::{EvalError, GrammarError, ParseError, ParseResult, ParseStatistics};
pub use grammar::{Condition, Grammar, GrammarBuilder, Rule, Symbol};
pub use graph::GrammarGraph;
pub use input::Input;
pub use parser::{GllParser, ParserConfig};
pub use sppf::{Sppf, SppfNodeId};

pub(crate) type FastMap<K, V> = hashbrown::HashMap<K, V, ahash::RandomState>;
pub(crate) type FastSet<T> = hashbrown::HashSet<T, ahash::RandomState>;
