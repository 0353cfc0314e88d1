//! # Grammar Graph
//!
//! The compiled form of a [`Grammar`]: grammar slots connected by
//! transitions. The parser walks this graph; it never looks at the grammar
//! model again.
//!
//! ## Overview
//!
//! - Every nonterminal has an entry slot. GSS nodes are keyed by it.
//! - Every alternative is a chain of slots, one per dotted position, ending
//!   in an end-of-rule slot where the GSS is popped.
//! - Control symbols (blocks, code, conditionals, loops) are lowered into
//!   epsilon, conditional and code transitions over inner slots.
//!
//! A `GrammarGraph` is immutable once compiled. It is `Send + Sync` and can be
//! shared between parsers through an `Arc`.
//!
//! ## Example
//!
//! ```rust
//! use glide::grammar::{Grammar, Symbol};
//! use glide::graph::GrammarGraph;
//!
//! let grammar = Grammar::builder()
//!     .start("S")
//!     .rule("S", [Symbol::literal("a"), Symbol::nonterminal("S")])
//!     .rule("S", [])
//!     .build()
//!     .unwrap();
//! let graph = GrammarGraph::compile(&grammar).unwrap();
//! assert!(graph.slot_by_name("S ::= 'a' . S").is_some());
//! ```

mod compiler;
pub mod first;
pub mod slot;
pub mod transition;

pub use first::FirstSet;
pub use slot::{GrammarSlot, SlotId, SlotKind};
pub use transition::{
    CallTransition, EpsilonAction, ExitBinding, Guard, Position, ReturnSite, TerminalTransition,
    Transition, TransitionKind,
};

use compact_str::CompactString;
use smallvec::SmallVec;

use crate::FastMap;
use crate::error::GrammarError;
use crate::grammar::{Grammar, NonterminalId};
use crate::terminal::{Terminal, TerminalId};

/// A nonterminal as seen by the parser
#[derive(Debug, Clone)]
pub struct NonterminalInfo {
    pub id: NonterminalId,
    pub name: CompactString,
    pub parameters: SmallVec<[CompactString; 2]>,
    /// Slot identifying the nonterminal's GSS nodes
    pub entry: SlotId,
    /// First slot of every alternative, in declaration order
    pub first_slots: SmallVec<[SlotId; 4]>,
    pub first: FirstSet,
}

/// Size of a compiled grammar graph
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct GraphStatistics {
    pub nonterminals: usize,
    pub slots: usize,
    pub transitions: usize,
    pub terminals: usize,
    /// Names of directly left-recursive nonterminals
    pub left_recursive: Vec<String>,
}

/// The compiled slot graph of a grammar
pub struct GrammarGraph {
    pub(crate) slots: Vec<GrammarSlot>,
    pub(crate) terminals: Vec<Terminal>,
    pub(crate) nonterminals: Vec<NonterminalInfo>,
    pub(crate) names: FastMap<CompactString, SlotId>,
    pub(crate) nonterminal_names: FastMap<CompactString, NonterminalId>,
    pub(crate) start: NonterminalId,
    pub(crate) left_recursive: Vec<NonterminalId>,
}

impl GrammarGraph {
    /// Compile a grammar
    ///
    /// # Errors
    ///
    /// - [`GrammarError::ArityMismatch`] for a call with the wrong number of
    ///   arguments, or a start symbol that takes parameters
    /// - [`GrammarError::UndeclaredVariable`] for a name not in scope
    /// - [`GrammarError::InvalidRegex`] and [`GrammarError::EmptyCharClass`]
    ///   for terminals that cannot be compiled
    pub fn compile(grammar: &Grammar) -> Result<Self, GrammarError> {
        compiler::compile(grammar)
    }

    #[must_use]
    pub fn slot(&self, id: SlotId) -> &GrammarSlot {
        &self.slots[id.index()]
    }

    #[must_use]
    pub fn slots(&self) -> &[GrammarSlot] {
        &self.slots
    }

    /// Look up a slot by its display name
    #[must_use]
    pub fn slot_by_name(&self, name: &str) -> Option<&GrammarSlot> {
        self.names.get(name).map(|&id| self.slot(id))
    }

    #[must_use]
    pub fn terminal(&self, id: TerminalId) -> &Terminal {
        &self.terminals[id.index()]
    }

    #[must_use]
    pub fn terminals(&self) -> &[Terminal] {
        &self.terminals
    }

    #[must_use]
    pub fn nonterminal(&self, id: NonterminalId) -> &NonterminalInfo {
        &self.nonterminals[id.index()]
    }

    #[must_use]
    pub fn nonterminals(&self) -> &[NonterminalInfo] {
        &self.nonterminals
    }

    #[must_use]
    pub fn nonterminal_by_name(&self, name: &str) -> Option<&NonterminalInfo> {
        self.nonterminal_names
            .get(name)
            .map(|&id| self.nonterminal(id))
    }

    #[must_use]
    pub const fn start(&self) -> NonterminalId {
        self.start
    }

    #[must_use]
    pub fn statistics(&self) -> GraphStatistics {
        GraphStatistics {
            nonterminals: self.nonterminals.len(),
            slots: self.slots.len(),
            transitions: self.slots.iter().map(|slot| slot.transitions().len()).sum(),
            terminals: self.terminals.len(),
            left_recursive: self
                .left_recursive
                .iter()
                .map(|&id| self.nonterminal(id).name.to_string())
                .collect(),
        }
    }
}

impl std::fmt::Debug for GrammarGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrammarGraph")
            .field("start", &self.nonterminal(self.start).name)
            .field("slots", &self.slots.len())
            .field("terminals", &self.terminals.len())
            .finish_non_exhaustive()
    }
}
