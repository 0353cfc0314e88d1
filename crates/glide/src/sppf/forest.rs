use std::fmt;

use smallvec::SmallVec;

use super::node::{ContextId, NodeLabel, PackedNode, SppfNode, SppfNodeId};
use crate::datadep::Value;
use crate::grammar::NonterminalId;
use crate::gss::Arguments;
use crate::graph::{GrammarGraph, Position, SlotId};
use crate::terminal::TerminalId;
use crate::{FastMap, FastSet};

/// How SPPF nodes are found by their key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum LookupDistribution {
    /// One map keyed by `(label, context, left, right)`
    Global,
    /// One map per terminal, nonterminal and slot, keyed by extent
    #[default]
    Distributed,
}

/// Context and extent of a node within its per-label table
type Extent = (ContextId, usize, usize);

#[derive(Debug)]
enum NodeIndex {
    Global(FastMap<(NodeLabel, ContextId, usize, usize), SppfNodeId>),
    Distributed {
        epsilon: FastMap<usize, SppfNodeId>,
        terminals: Vec<FastMap<Extent, SppfNodeId>>,
        nonterminals: Vec<FastMap<Extent, SppfNodeId>>,
        intermediates: Vec<FastMap<Extent, SppfNodeId>>,
    },
}

fn table<V>(tables: &mut Vec<FastMap<Extent, V>>, index: usize) -> &mut FastMap<Extent, V> {
    if index >= tables.len() {
        tables.resize_with(index + 1, FastMap::default);
    }
    &mut tables[index]
}

impl NodeIndex {
    fn new(distribution: LookupDistribution, terminals: usize, nonterminals: usize, slots: usize) -> Self {
        match distribution {
            LookupDistribution::Global => Self::Global(FastMap::default()),
            LookupDistribution::Distributed => Self::Distributed {
                epsilon: FastMap::default(),
                terminals: (0..terminals).map(|_| FastMap::default()).collect(),
                nonterminals: (0..nonterminals).map(|_| FastMap::default()).collect(),
                intermediates: (0..slots).map(|_| FastMap::default()).collect(),
            },
        }
    }

    fn get(&self, label: NodeLabel, context: ContextId, left: usize, right: usize) -> Option<SppfNodeId> {
        let key = (context, left, right);
        match self {
            Self::Global(map) => map.get(&(label, context, left, right)).copied(),
            Self::Distributed {
                epsilon,
                terminals,
                nonterminals,
                intermediates,
            } => match label {
                NodeLabel::Dummy => Some(SppfNodeId::DUMMY),
                NodeLabel::Epsilon => epsilon.get(&left).copied(),
                NodeLabel::Terminal(id) => terminals.get(id.index())?.get(&key).copied(),
                NodeLabel::Nonterminal(id) => nonterminals.get(id.index())?.get(&key).copied(),
                NodeLabel::Intermediate(id) => intermediates.get(id.index())?.get(&key).copied(),
            },
        }
    }

    fn insert(&mut self, label: NodeLabel, context: ContextId, left: usize, right: usize, node: SppfNodeId) {
        match self {
            Self::Global(map) => {
                map.insert((label, context, left, right), node);
            }
            Self::Distributed {
                epsilon,
                terminals,
                nonterminals,
                intermediates,
            } => {
                match label {
                    NodeLabel::Dummy => return,
                    NodeLabel::Epsilon => {
                        epsilon.insert(left, node);
                        return;
                    }
                    NodeLabel::Terminal(id) => table(terminals, id.index()),
                    NodeLabel::Nonterminal(id) => table(nonterminals, id.index()),
                    NodeLabel::Intermediate(id) => table(intermediates, id.index()),
                }
                .insert((context, left, right), node);
            }
        }
    }
}

/// A shared packed parse forest
///
/// Every node is unique for its `(label, context, left, right)` key, and
/// every packed node is unique within its parent. Node `0` is the dummy node.
pub struct Sppf {
    nodes: Vec<SppfNode>,
    index: NodeIndex,
    /// Argument tuples by context; entry `0` is the empty tuple
    contexts: Vec<Arguments>,
    context_ids: FastMap<Arguments, ContextId>,
    packed_set: FastSet<(SppfNodeId, PackedNode)>,
    packed_count: usize,
    ambiguous: usize,
}

impl Default for Sppf {
    fn default() -> Self {
        Self::new(LookupDistribution::default(), 0, 0, 0)
    }
}

impl Sppf {
    fn new(distribution: LookupDistribution, terminals: usize, nonterminals: usize, slots: usize) -> Self {
        Self {
            nodes: vec![SppfNode {
                label: NodeLabel::Dummy,
                context: ContextId::EMPTY,
                left: 0,
                right: 0,
                packed: SmallVec::new(),
            }],
            index: NodeIndex::new(distribution, terminals, nonterminals, slots),
            contexts: vec![Arguments::new()],
            context_ids: FastMap::default(),
            packed_set: FastSet::default(),
            packed_count: 0,
            ambiguous: 0,
        }
    }

    /// An empty forest with lookup tables sized for `graph`
    #[must_use]
    pub fn for_graph(graph: &GrammarGraph, distribution: LookupDistribution) -> Self {
        Self::new(
            distribution,
            graph.terminals().len(),
            graph.nonterminals().len(),
            graph.slots().len(),
        )
    }

    fn get_or_insert(&mut self, label: NodeLabel, context: ContextId, left: usize, right: usize) -> SppfNodeId {
        if let Some(id) = self.index.get(label, context, left, right) {
            return id;
        }
        let id = SppfNodeId::new(self.nodes.len());
        self.nodes.push(SppfNode {
            label,
            context,
            left,
            right,
            packed: SmallVec::new(),
        });
        self.index.insert(label, context, left, right, id);
        id
    }

    /// The context for a call with `arguments`
    pub fn intern_arguments(&mut self, arguments: &[Value]) -> ContextId {
        if arguments.is_empty() {
            return ContextId::EMPTY;
        }
        let arguments = Arguments::from(arguments);
        if let Some(&context) = self.context_ids.get(&arguments) {
            return context;
        }
        let context = ContextId::new(self.contexts.len());
        self.contexts.push(arguments.clone());
        self.context_ids.insert(arguments, context);
        context
    }

    /// The argument tuple behind `context`
    #[must_use]
    pub fn arguments(&self, context: ContextId) -> &[Value] {
        self.contexts
            .get(context.index())
            .map(|arguments| arguments.as_slice())
            .unwrap_or_default()
    }

    /// The node for a terminal matched over `left..right`
    pub fn terminal_node(&mut self, terminal: TerminalId, left: usize, right: usize) -> SppfNodeId {
        self.get_or_insert(NodeLabel::Terminal(terminal), ContextId::EMPTY, left, right)
    }

    /// The empty derivation at `index`
    pub fn epsilon_node(&mut self, index: usize) -> SppfNodeId {
        self.get_or_insert(NodeLabel::Epsilon, ContextId::EMPTY, index, index)
    }

    pub fn nonterminal_node(
        &mut self,
        nonterminal: NonterminalId,
        context: ContextId,
        left: usize,
        right: usize,
    ) -> SppfNodeId {
        self.get_or_insert(NodeLabel::Nonterminal(nonterminal), context, left, right)
    }

    pub fn intermediate_node(&mut self, slot: SlotId, context: ContextId, left: usize, right: usize) -> SppfNodeId {
        self.get_or_insert(NodeLabel::Intermediate(slot), context, left, right)
    }

    /// Attach a packed node to `parent`; returns `false` if it was already
    /// there
    pub fn add_packed(&mut self, parent: SppfNodeId, packed: PackedNode) -> bool {
        if !self.packed_set.insert((parent, packed)) {
            return false;
        }
        let node = &mut self.nodes[parent.index()];
        node.packed.push(packed);
        if node.packed.len() == 2 {
            self.ambiguous += 1;
        }
        self.packed_count += 1;
        true
    }

    /// Extend what has been parsed so far, `w`, with the node of the symbol
    /// just parsed, `z`
    ///
    /// `slot` is the slot after the symbol, `head` the rule's nonterminal
    /// and `context` the arguments the rule was called with. The position
    /// decides the shape:
    ///
    /// | position | `w` | result |
    /// |---|---|---|
    /// | `First` | dummy | `z` itself |
    /// | `Last`, `FirstAndLast` | any | `head` node over `w`'s left to `z`'s right |
    /// | `Middle`, or `First` after something | any | intermediate node for `slot` |
    ///
    /// Every new node gets the packed node `(slot, z.left, w, z)`, with no
    /// left child when `w` is the dummy.
    pub fn combine(
        &mut self,
        position: Position,
        slot: SlotId,
        head: NonterminalId,
        context: ContextId,
        w: SppfNodeId,
        z: SppfNodeId,
    ) -> SppfNodeId {
        if position == Position::First && w.is_dummy() {
            return z;
        }
        let pivot = self.nodes[z.index()].left;
        let right = self.nodes[z.index()].right;
        let (left, left_child) = if w.is_dummy() {
            (pivot, None)
        } else {
            (self.nodes[w.index()].left, Some(w))
        };
        let parent = if position.is_last() {
            self.nonterminal_node(head, context, left, right)
        } else {
            self.intermediate_node(slot, context, left, right)
        };
        self.add_packed(
            parent,
            PackedNode {
                slot,
                pivot,
                left: left_child,
                right: z,
            },
        );
        parent
    }

    /// Wrap what reached the end slot `end` into the rule's nonterminal node
    ///
    /// Used when the last transition of a rule builds no node itself. With
    /// nothing parsed the rule derived the empty string at `index`.
    pub fn finish_rule(
        &mut self,
        end: SlotId,
        head: NonterminalId,
        context: ContextId,
        w: SppfNodeId,
        index: usize,
    ) -> SppfNodeId {
        let (child, left, right) = if w.is_dummy() {
            (self.epsilon_node(index), index, index)
        } else {
            let node = &self.nodes[w.index()];
            (w, node.left, node.right)
        };
        let parent = self.nonterminal_node(head, context, left, right);
        self.add_packed(
            parent,
            PackedNode {
                slot: end,
                pivot: left,
                left: None,
                right: child,
            },
        );
        parent
    }

    /// The nonterminal node for `left..right` under `context`, if one was
    /// built
    #[must_use]
    pub fn find_nonterminal(
        &self,
        nonterminal: NonterminalId,
        context: ContextId,
        left: usize,
        right: usize,
    ) -> Option<SppfNodeId> {
        self.index.get(NodeLabel::Nonterminal(nonterminal), context, left, right)
    }

    #[must_use]
    pub fn node(&self, id: SppfNodeId) -> &SppfNode {
        &self.nodes[id.index()]
    }

    /// Number of nodes, the dummy excluded
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    #[must_use]
    pub const fn packed_count(&self) -> usize {
        self.packed_count
    }

    /// Nodes with more than one packed node
    #[must_use]
    pub const fn ambiguous_count(&self) -> usize {
        self.ambiguous
    }
}

impl fmt::Debug for Sppf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sppf")
            .field("nodes", &self.len())
            .field("packed", &self.packed_count)
            .field("ambiguous", &self.ambiguous)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const S: NonterminalId = NonterminalId::new(0);
    const E: ContextId = ContextId::EMPTY;

    fn check_sharing(distribution: LookupDistribution) {
        let mut sppf = Sppf::new(distribution, 1, 1, 4);
        let t = TerminalId::new(0);
        let a = sppf.terminal_node(t, 0, 1);
        assert_eq!(sppf.terminal_node(t, 0, 1), a);
        assert_ne!(sppf.terminal_node(t, 1, 2), a);
        let n = sppf.nonterminal_node(S, E, 0, 1);
        assert_eq!(sppf.nonterminal_node(S, E, 0, 1), n);
        let i = sppf.intermediate_node(SlotId::new(2), E, 0, 1);
        assert_ne!(i, n);
        assert_eq!(sppf.epsilon_node(3), sppf.epsilon_node(3));
        assert_eq!(sppf.find_nonterminal(S, E, 0, 1), Some(n));
        assert_eq!(sppf.find_nonterminal(S, E, 0, 2), None);
        // tables grow for ids past the sizing hint
        let late = sppf.terminal_node(TerminalId::new(5), 0, 1);
        assert_eq!(sppf.terminal_node(TerminalId::new(5), 0, 1), late);
        assert_eq!(sppf.len(), 6);
    }

    #[test]
    fn test_node_sharing_global() {
        check_sharing(LookupDistribution::Global);
    }

    #[test]
    fn test_node_sharing_distributed() {
        check_sharing(LookupDistribution::Distributed);
    }

    #[test]
    fn test_packed_nodes_are_deduplicated_per_parent() {
        let mut sppf = Sppf::default();
        let parent = sppf.nonterminal_node(S, E, 0, 1);
        let child = sppf.terminal_node(TerminalId::new(0), 0, 1);
        let packed = PackedNode {
            slot: SlotId::new(1),
            pivot: 0,
            left: None,
            right: child,
        };
        assert!(sppf.add_packed(parent, packed));
        assert!(!sppf.add_packed(parent, packed));
        assert_eq!(sppf.ambiguous_count(), 0);
        assert!(sppf.add_packed(parent, PackedNode { slot: SlotId::new(2), ..packed }));
        assert!(sppf.node(parent).is_ambiguous());
        assert_eq!(sppf.ambiguous_count(), 1);
        assert_eq!(sppf.packed_count(), 2);
    }

    #[test]
    fn test_combine_table() {
        let mut sppf = Sppf::default();
        let slot = SlotId::new(7);
        let a = sppf.terminal_node(TerminalId::new(0), 0, 1);
        let b = sppf.terminal_node(TerminalId::new(1), 1, 3);

        assert_eq!(sppf.combine(Position::First, slot, S, E, SppfNodeId::DUMMY, a), a);

        let middle = sppf.combine(Position::Middle, slot, S, E, a, b);
        assert_eq!(sppf.node(middle).label(), NodeLabel::Intermediate(slot));
        assert_eq!((sppf.node(middle).left(), sppf.node(middle).right()), (0, 3));
        assert_eq!(
            sppf.node(middle).packed(),
            &[PackedNode {
                slot,
                pivot: 1,
                left: Some(a),
                right: b
            }]
        );

        let last = sppf.combine(Position::Last, slot, S, E, a, b);
        assert_eq!(sppf.node(last).label(), NodeLabel::Nonterminal(S));

        let alone = sppf.combine(Position::FirstAndLast, slot, S, E, SppfNodeId::DUMMY, b);
        assert_eq!((sppf.node(alone).left(), sppf.node(alone).right()), (1, 3));
        assert_eq!(sppf.node(alone).packed()[0].left, None);

        // a first symbol inside a loop may follow earlier nodes
        let fallback = sppf.combine(Position::First, slot, S, E, a, b);
        assert_eq!(fallback, middle);
    }

    #[test]
    fn test_finish_rule() {
        let mut sppf = Sppf::default();
        let end = SlotId::new(3);
        let empty = sppf.finish_rule(end, S, E, SppfNodeId::DUMMY, 4);
        assert_eq!((sppf.node(empty).left(), sppf.node(empty).right()), (4, 4));
        let child = sppf.node(empty).packed()[0].right;
        assert_eq!(sppf.node(child).label(), NodeLabel::Epsilon);

        let a = sppf.terminal_node(TerminalId::new(0), 0, 1);
        let wrapped = sppf.finish_rule(end, S, E, a, 1);
        assert_eq!(sppf.node(wrapped).label(), NodeLabel::Nonterminal(S));
        assert_eq!(sppf.node(wrapped).packed()[0].right, a);
    }

    #[test]
    fn test_call_arguments_separate_nodes() {
        let mut sppf = Sppf::default();
        assert_eq!(sppf.intern_arguments(&[]), E);
        let zero = sppf.intern_arguments(&[Value::Int(0)]);
        let one = sppf.intern_arguments(&[Value::Int(1)]);
        assert_ne!(zero, one);
        assert_ne!(zero, E);
        assert_eq!(sppf.intern_arguments(&[Value::Int(0)]), zero);
        assert_eq!(sppf.arguments(one), &[Value::Int(1)]);
        assert!(sppf.arguments(E).is_empty());

        for distribution in [LookupDistribution::Global, LookupDistribution::Distributed] {
            let mut sppf = Sppf::new(distribution, 1, 1, 4);
            let a = sppf.nonterminal_node(S, zero, 0, 1);
            let b = sppf.nonterminal_node(S, one, 0, 1);
            assert_ne!(a, b);
            assert_eq!(sppf.node(b).context(), one);
            assert_eq!(sppf.find_nonterminal(S, one, 0, 1), Some(b));
            assert_eq!(sppf.find_nonterminal(S, E, 0, 1), None);
            let slot = SlotId::new(2);
            assert_ne!(
                sppf.intermediate_node(slot, zero, 0, 1),
                sppf.intermediate_node(slot, one, 0, 1)
            );
        }
    }
}
