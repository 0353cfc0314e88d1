//! # Graph-Structured Stack
//!
//! The GSS shares call stacks between all parse branches. A node stands for
//! a call of one nonterminal at one input index with one argument tuple;
//! its edges lead back to the callers, each carrying the return slot, the
//! SPPF node built before the call and the caller's environment.
//!
//! Nodes also remember every result they have been popped with, so that an
//! edge added after a pop can be replayed against it. Both edges and pops are
//! sets: adding either twice is a no-op.

use smallvec::SmallVec;

use crate::datadep::{Environment, Value};
use crate::graph::SlotId;
use crate::grammar::NonterminalId;
use crate::sppf::{ContextId, SppfNodeId};
use crate::{FastMap, FastSet};

/// Identifier of a GSS node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct GssNodeId(u32);

impl GssNodeId {
    /// The bottom of every stack
    pub const ROOT: Self = Self(0);

    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index as u32)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Argument values a nonterminal was called with
pub type Arguments = SmallVec<[Value; 2]>;

/// How GSS nodes are found by their key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum GssIdentity {
    /// One table per entry slot, indexed by input position; argument tuples
    /// fall back to a map
    #[default]
    Array,
    /// One global hash map
    HashMap,
}

/// An edge from a callee node back to its caller
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GssEdge {
    /// Where the caller continues
    pub return_slot: SlotId,
    /// What the caller had parsed before the call
    pub sppf: SppfNodeId,
    pub caller: GssNodeId,
    /// The caller's environment at the call
    pub environment: Environment,
}

/// A result a node has been popped with
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pop {
    /// The callee's nonterminal node
    pub sppf: SppfNodeId,
    /// Value of the return expression
    pub value: Value,
}

#[derive(Debug, Clone)]
pub struct GssNode {
    entry: Option<SlotId>,
    nonterminal: Option<NonterminalId>,
    index: usize,
    arguments: Arguments,
    context: ContextId,
    edges: Vec<GssEdge>,
    edge_set: FastSet<GssEdge>,
    pops: Vec<Pop>,
    pop_set: FastSet<Pop>,
}

impl GssNode {
    fn new(
        entry: Option<SlotId>,
        nonterminal: Option<NonterminalId>,
        index: usize,
        arguments: Arguments,
        context: ContextId,
    ) -> Self {
        Self {
            entry,
            nonterminal,
            index,
            arguments,
            context,
            edges: Vec::new(),
            edge_set: FastSet::default(),
            pops: Vec::new(),
            pop_set: FastSet::default(),
        }
    }

    /// Entry slot of the called nonterminal; `None` for the root
    #[must_use]
    pub const fn entry(&self) -> Option<SlotId> {
        self.entry
    }

    #[must_use]
    pub const fn nonterminal(&self) -> Option<NonterminalId> {
        self.nonterminal
    }

    /// Input index the call started at
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }

    /// The arguments as interned by the forest, keying the nodes this call
    /// builds
    #[must_use]
    pub const fn context(&self) -> ContextId {
        self.context
    }

    #[must_use]
    pub fn edges(&self) -> &[GssEdge] {
        &self.edges
    }

    #[must_use]
    pub fn pops(&self) -> &[Pop] {
        &self.pops
    }
}

type NodeKey = (SlotId, usize, Arguments);

#[derive(Debug)]
enum Lookup {
    Array {
        /// `tables[entry][index]` for calls without arguments
        tables: Vec<Vec<Option<GssNodeId>>>,
        parameterized: FastMap<NodeKey, GssNodeId>,
        width: usize,
    },
    HashMap(FastMap<NodeKey, GssNodeId>),
}

impl Lookup {
    fn new(identity: GssIdentity, slot_count: usize, input_len: usize) -> Self {
        match identity {
            GssIdentity::Array => Self::Array {
                tables: vec![Vec::new(); slot_count],
                parameterized: FastMap::default(),
                width: input_len + 1,
            },
            GssIdentity::HashMap => Self::HashMap(FastMap::default()),
        }
    }

    /// Whether the key lives in the per-slot tables
    fn dense(
        tables: &[Vec<Option<GssNodeId>>],
        width: usize,
        entry: SlotId,
        index: usize,
        arguments: &Arguments,
    ) -> bool {
        arguments.is_empty() && entry.index() < tables.len() && index < width
    }

    fn get(&self, entry: SlotId, index: usize, arguments: &Arguments) -> Option<GssNodeId> {
        match self {
            Self::Array { tables, width, .. } if Self::dense(tables, *width, entry, index, arguments) => {
                tables[entry.index()].get(index).copied().flatten()
            }
            Self::Array { parameterized, .. } | Self::HashMap(parameterized) => parameterized
                .get(&(entry, index, arguments.clone()))
                .copied(),
        }
    }

    fn insert(&mut self, entry: SlotId, index: usize, arguments: Arguments, id: GssNodeId) {
        match self {
            Self::Array { tables, width, .. } if Self::dense(tables, *width, entry, index, &arguments) => {
                let table = &mut tables[entry.index()];
                if table.is_empty() {
                    table.resize(*width, None);
                }
                table[index] = Some(id);
            }
            Self::Array { parameterized, .. } | Self::HashMap(parameterized) => {
                parameterized.insert((entry, index, arguments), id);
            }
        }
    }
}

/// The graph-structured stack of one parse
#[derive(Debug)]
pub struct Gss {
    nodes: Vec<GssNode>,
    lookup: Lookup,
    edge_count: usize,
    pop_count: usize,
}

impl Default for Gss {
    fn default() -> Self {
        Self::new(GssIdentity::default(), 0, 0)
    }
}

impl Gss {
    /// An empty GSS holding only the root
    #[must_use]
    pub fn new(identity: GssIdentity, slot_count: usize, input_len: usize) -> Self {
        Self {
            nodes: vec![GssNode::new(None, None, 0, Arguments::new(), ContextId::EMPTY)],
            lookup: Lookup::new(identity, slot_count, input_len),
            edge_count: 0,
            pop_count: 0,
        }
    }

    /// Drop every node except the root, sizing tables for a new input
    pub fn reset(&mut self, identity: GssIdentity, slot_count: usize, input_len: usize) {
        *self = Self::new(identity, slot_count, input_len);
    }

    #[must_use]
    pub const fn root(&self) -> GssNodeId {
        GssNodeId::ROOT
    }

    /// Find the node for a call, creating it if needed
    ///
    /// `context` is the forest's id for `arguments`. Returns the node and
    /// whether it was created.
    pub fn find_or_create(
        &mut self,
        entry: SlotId,
        nonterminal: NonterminalId,
        index: usize,
        arguments: Arguments,
        context: ContextId,
    ) -> (GssNodeId, bool) {
        if let Some(id) = self.lookup.get(entry, index, &arguments) {
            return (id, false);
        }
        let id = GssNodeId::new(self.nodes.len());
        self.nodes.push(GssNode::new(
            Some(entry),
            Some(nonterminal),
            index,
            arguments.clone(),
            context,
        ));
        self.lookup.insert(entry, index, arguments, id);
        (id, true)
    }

    /// Add an edge; returns `false` if it was already there
    pub fn add_edge(&mut self, node: GssNodeId, edge: GssEdge) -> bool {
        let node = &mut self.nodes[node.index()];
        if !node.edge_set.insert(edge.clone()) {
            return false;
        }
        node.edges.push(edge);
        self.edge_count += 1;
        true
    }

    /// Record a pop; returns `false` if it was already recorded
    pub fn record_pop(&mut self, node: GssNodeId, pop: Pop) -> bool {
        let node = &mut self.nodes[node.index()];
        if !node.pop_set.insert(pop.clone()) {
            return false;
        }
        node.pops.push(pop);
        self.pop_count += 1;
        true
    }

    #[must_use]
    pub fn node(&self, id: GssNodeId) -> &GssNode {
        &self.nodes[id.index()]
    }

    #[must_use]
    pub fn edges(&self, id: GssNodeId) -> &[GssEdge] {
        &self.nodes[id.index()].edges
    }

    #[must_use]
    pub fn pops(&self, id: GssNodeId) -> &[Pop] {
        &self.nodes[id.index()].pops
    }

    /// Number of nodes, the root included
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    #[must_use]
    pub const fn edge_count(&self) -> usize {
        self.edge_count
    }

    #[must_use]
    pub const fn pop_count(&self) -> usize {
        self.pop_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn edge(caller: GssNodeId, environment: Environment) -> GssEdge {
        GssEdge {
            return_slot: SlotId::new(3),
            sppf: SppfNodeId::DUMMY,
            caller,
            environment,
        }
    }

    fn check_identity(identity: GssIdentity) {
        let mut gss = Gss::new(identity, 8, 4);
        let entry = SlotId::new(1);
        let nt = NonterminalId::new(0);

        let (a, created) = gss.find_or_create(entry, nt, 2, Arguments::new(), ContextId::EMPTY);
        assert!(created);
        assert_eq!(gss.find_or_create(entry, nt, 2, Arguments::new(), ContextId::EMPTY), (a, false));

        let (b, created) = gss.find_or_create(entry, nt, 2, smallvec![Value::Int(1)], ContextId::new(1));
        assert!(created);
        assert_ne!(a, b);
        assert_eq!(gss.find_or_create(entry, nt, 2, smallvec![Value::Int(1)], ContextId::new(1)), (b, false));

        let (c, _) = gss.find_or_create(SlotId::new(2), nt, 2, Arguments::new(), ContextId::EMPTY);
        assert_ne!(a, c);
        assert_eq!(gss.len(), 4);
        assert_eq!(gss.node(b).arguments(), &[Value::Int(1)]);
        assert_eq!(gss.node(b).context(), ContextId::new(1));
        assert_eq!(gss.node(GssNodeId::ROOT).context(), ContextId::EMPTY);
        assert_eq!(gss.node(a).index(), 2);
    }

    #[test]
    fn test_node_identity_array() {
        check_identity(GssIdentity::Array);
    }

    #[test]
    fn test_node_identity_hashmap() {
        check_identity(GssIdentity::HashMap);
    }

    #[test]
    fn test_edges_and_pops_are_sets() {
        let mut gss = Gss::new(GssIdentity::Array, 4, 2);
        let (node, _) = gss.find_or_create(SlotId::new(0), NonterminalId::new(0), 0, Arguments::new(), ContextId::EMPTY);
        let env = Environment::root([("n", Value::Int(1))]);

        assert!(gss.add_edge(node, edge(GssNodeId::ROOT, env.clone())));
        assert!(!gss.add_edge(node, edge(GssNodeId::ROOT, env.clone())));
        assert!(gss.add_edge(node, edge(GssNodeId::ROOT, Environment::empty())));
        assert_eq!(gss.edges(node).len(), 2);
        assert_eq!(gss.edge_count(), 2);

        let pop = Pop {
            sppf: SppfNodeId::new(4),
            value: Value::Null,
        };
        assert!(gss.record_pop(node, pop.clone()));
        assert!(!gss.record_pop(node, pop));
        assert!(gss.record_pop(
            node,
            Pop {
                sppf: SppfNodeId::new(4),
                value: Value::Int(2)
            }
        ));
        assert_eq!(gss.pops(node).len(), 2);
        assert_eq!(gss.pop_count(), 2);
    }

    #[test]
    fn test_reset_keeps_only_the_root() {
        let mut gss = Gss::default();
        gss.find_or_create(SlotId::new(0), NonterminalId::new(0), 0, Arguments::new(), ContextId::EMPTY);
        assert!(!gss.is_empty());
        gss.reset(GssIdentity::HashMap, 2, 0);
        assert!(gss.is_empty());
        assert_eq!(gss.len(), 1);
        assert_eq!(gss.node(gss.root()).nonterminal(), None);
    }
}
