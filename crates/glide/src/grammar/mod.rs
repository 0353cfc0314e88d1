//! # Grammar
//!
//! The grammar model: nonterminals with ordered parameter lists, rules built
//! from [`Symbol`]s, conditions and control symbols.
//!
//! A [`Grammar`] is built once through [`GrammarBuilder`] and is immutable
//! afterwards. It is the input of the graph compiler
//! ([`GrammarGraph::compile`](crate::graph::GrammarGraph::compile)).
//!
//! ## Example
//!
//! ```rust
//! use glide::datadep::Expression;
//! use glide::grammar::{Condition, Grammar, Symbol};
//!
//! // E(p) ::= [p >= 1] E(1) '+' 'a' | 'a'
//! let grammar = Grammar::builder()
//!     .start("S")
//!     .rule("S", [Symbol::call("E", [Expression::int(0)])])
//!     .parameters("E", ["p"])
//!     .rule(
//!         "E",
//!         [
//!             Symbol::call("E", [Expression::int(1)])
//!                 .precondition(Condition::when(Expression::var("p").ge(1.into()))),
//!             Symbol::literal("+"),
//!             Symbol::literal("a"),
//!         ],
//!     )
//!     .rule("E", [Symbol::literal("a")])
//!     .build()
//!     .unwrap();
//! assert_eq!(grammar.nonterminal_count(), 2);
//! ```

mod builder;
mod symbol;
pub mod validate;

pub use builder::{Grammar, GrammarBuilder, NonterminalDecl, NonterminalId};
pub use symbol::{Condition, Rule, Symbol, SymbolKind};
