//! # GLL Parser
//!
//! A generalized LL parser over a compiled [`GrammarGraph`]. It accepts every
//! context-free grammar, including left-recursive and ambiguous ones, and
//! builds a [`Sppf`](crate::sppf::Sppf) holding all derivations of the
//! input. Data-dependent conditions prune derivations while parsing.
//!
//! ## Example
//!
//! ```rust
//! use glide::grammar::{Grammar, Symbol};
//! use glide::input::Input;
//! use glide::parser::{GllParser, ParserConfig};
//!
//! let grammar = Grammar::builder()
//!     .start("E")
//!     .rule("E", [Symbol::nonterminal("E"), Symbol::literal("+"), Symbol::nonterminal("E")])
//!     .rule("E", [Symbol::literal("a")])
//!     .build()
//!     .unwrap();
//! let mut parser = GllParser::from_grammar(&grammar, ParserConfig::default()).unwrap();
//!
//! let result = parser.parse(&Input::new("a+a+a"));
//! assert!(result.is_success());
//! assert_eq!(result.statistics().ambiguous_nodes, 1);
//! ```

mod config;
mod descriptor;
mod driver;

pub use config::{GssIdentity, LookupDistribution, ParserConfig, WorklistOrder};
pub use descriptor::{Descriptor, Worklist};
pub use driver::GllParserState;

use std::sync::Arc;

use crate::error::{GrammarError, ParseResult};
use crate::grammar::Grammar;
use crate::graph::GrammarGraph;
use crate::input::Input;

/// GLL parser for one grammar graph
///
/// The graph is shared; the parse tables are owned and reused between
/// parses. A parser is not meant to be shared between threads: give each
/// thread its own parser over the same `Arc<GrammarGraph>`.
pub struct GllParser {
    graph: Arc<GrammarGraph>,
    config: ParserConfig,
    state: GllParserState,
}

impl GllParser {
    #[must_use]
    pub fn new(graph: Arc<GrammarGraph>, config: ParserConfig) -> Self {
        Self {
            graph,
            config,
            state: GllParserState::new(),
        }
    }

    /// Compile `grammar` and create a parser for it
    ///
    /// # Errors
    ///
    /// Any [`GrammarError`] raised by [`GrammarGraph::compile`].
    pub fn from_grammar(grammar: &Grammar, config: ParserConfig) -> Result<Self, GrammarError> {
        Ok(Self::new(Arc::new(GrammarGraph::compile(grammar)?), config))
    }

    /// Parse `input` from the start symbol
    ///
    /// Every per-input table is reset first. On success the forest is moved
    /// into the result.
    pub fn parse(&mut self, input: &Input) -> ParseResult {
        driver::parse(&self.graph, input, &self.config, &mut self.state)
    }

    /// Release the tables of the last parse
    pub fn reset(&mut self) {
        self.state = GllParserState::new();
    }

    #[must_use]
    pub const fn graph(&self) -> &Arc<GrammarGraph> {
        &self.graph
    }

    #[must_use]
    pub const fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Tables of the last parse, for inspection
    #[must_use]
    pub const fn state(&self) -> &GllParserState {
        &self.state
    }
}

impl std::fmt::Debug for GllParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GllParser")
            .field("graph", &self.graph)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
