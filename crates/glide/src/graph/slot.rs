//! Grammar slots: the parsing states of the grammar graph.

use compact_str::CompactString;
use smallvec::SmallVec;

use super::transition::{ReturnSite, Transition};
use crate::datadep::Expression;
use crate::grammar::NonterminalId;

/// Dense identifier of a grammar slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct SlotId(u32);

impl SlotId {
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index as u32)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// The role of a slot
#[derive(Debug, Clone)]
pub enum SlotKind {
    /// One per nonterminal; identifies GSS nodes
    Entry,
    /// A position inside a rule body
    Body,
    /// The end of an alternative; reaching it pops the GSS
    End {
        rule: usize,
        /// Value of the call, evaluated in the callee's environment
        returns: Option<Expression>,
    },
}

/// A parsing state: a dotted position in a rule
#[derive(Debug, Clone)]
pub struct GrammarSlot {
    pub(crate) id: SlotId,
    pub(crate) nonterminal: NonterminalId,
    pub(crate) kind: SlotKind,
    pub(crate) name: CompactString,
    pub(crate) transitions: SmallVec<[Transition; 1]>,
    pub(crate) return_site: Option<ReturnSite>,
}

impl GrammarSlot {
    #[must_use]
    pub const fn id(&self) -> SlotId {
        self.id
    }

    /// The nonterminal whose rule contains this slot
    #[must_use]
    pub const fn nonterminal(&self) -> NonterminalId {
        self.nonterminal
    }

    #[must_use]
    pub const fn kind(&self) -> &SlotKind {
        &self.kind
    }

    /// Display name, e.g. `S ::= A . B 'c'`
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Set when this slot is where a call returns to
    #[must_use]
    pub const fn return_site(&self) -> Option<&ReturnSite> {
        self.return_site.as_ref()
    }

    #[must_use]
    pub const fn is_end(&self) -> bool {
        matches!(self.kind, SlotKind::End { .. })
    }

    #[must_use]
    pub const fn is_entry(&self) -> bool {
        matches!(self.kind, SlotKind::Entry)
    }
}
