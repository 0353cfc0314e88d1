use smallvec::SmallVec;

use crate::grammar::NonterminalId;
use crate::graph::SlotId;
use crate::terminal::TerminalId;

/// Identifier of an SPPF node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct SppfNodeId(u32);

impl SppfNodeId {
    /// Stands for "nothing parsed yet" in descriptors and GSS edges
    pub const DUMMY: Self = Self(0);

    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index as u32)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[must_use]
    pub const fn is_dummy(self) -> bool {
        self.0 == 0
    }
}

/// Interned argument tuple of the call a node was derived under
///
/// Nonterminal and intermediate nodes of the same span but different call
/// arguments are different nodes. Leaves and argument-free calls use
/// [`ContextId::EMPTY`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ContextId(u32);

impl ContextId {
    /// The empty argument tuple
    pub const EMPTY: Self = Self(0);

    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index as u32)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// What an SPPF node derives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeLabel {
    Dummy,
    Epsilon,
    Terminal(TerminalId),
    Nonterminal(NonterminalId),
    /// A binarized prefix of a rule, named by the slot after it
    Intermediate(SlotId),
}

/// One way of deriving a symbol or intermediate node
///
/// `pivot` is where the right child starts. `left` is absent when the right
/// child is the first thing the rule produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PackedNode {
    pub slot: SlotId,
    pub pivot: usize,
    pub left: Option<SppfNodeId>,
    pub right: SppfNodeId,
}

impl PackedNode {
    /// Children, left to right
    pub fn children(&self) -> impl Iterator<Item = SppfNodeId> {
        self.left.into_iter().chain(std::iter::once(self.right))
    }
}

/// A node of the shared packed parse forest
#[derive(Debug, Clone)]
pub struct SppfNode {
    pub(crate) label: NodeLabel,
    pub(crate) context: ContextId,
    pub(crate) left: usize,
    pub(crate) right: usize,
    pub(crate) packed: SmallVec<[PackedNode; 1]>,
}

impl SppfNode {
    #[must_use]
    pub const fn label(&self) -> NodeLabel {
        self.label
    }

    /// Arguments of the call the node belongs to, see [`Sppf::arguments`]
    ///
    /// [`Sppf::arguments`]: super::Sppf::arguments
    #[must_use]
    pub const fn context(&self) -> ContextId {
        self.context
    }

    /// Input index the node starts at
    #[must_use]
    pub const fn left(&self) -> usize {
        self.left
    }

    /// Input index the node ends at
    #[must_use]
    pub const fn right(&self) -> usize {
        self.right
    }

    #[must_use]
    pub fn packed(&self) -> &[PackedNode] {
        &self.packed
    }

    /// More than one derivation
    #[must_use]
    pub fn is_ambiguous(&self) -> bool {
        self.packed.len() > 1
    }

    /// Terminals, epsilon and the dummy have no packed nodes
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        matches!(
            self.label,
            NodeLabel::Dummy | NodeLabel::Epsilon | NodeLabel::Terminal(_)
        )
    }
}
