//! Queries over a finished forest.
//!
//! All walks are iterative; deep forests do not recurse on the call stack.

use std::fmt::Write as _;

use super::forest::Sppf;
use super::node::{NodeLabel, PackedNode, SppfNodeId};
use crate::graph::GrammarGraph;
use crate::input::Input;
use crate::{FastMap, FastSet};

/// Children of every packed node of `id`, left to right
pub fn children(sppf: &Sppf, id: SppfNodeId) -> impl Iterator<Item = SppfNodeId> + '_ {
    sppf.node(id).packed().iter().flat_map(PackedNode::children)
}

/// The input text a node spans
#[must_use]
pub fn yield_text<'i>(sppf: &Sppf, id: SppfNodeId, input: &'i Input) -> &'i str {
    let node = sppf.node(id);
    input.slice(node.left(), node.right())
}

/// Every node reachable from `root`, in depth-first preorder
#[must_use]
pub fn reachable(sppf: &Sppf, root: SppfNodeId) -> Vec<SppfNodeId> {
    let mut seen: FastSet<SppfNodeId> = FastSet::default();
    let mut order = Vec::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }
        order.push(id);
        let mut next: Vec<SppfNodeId> = children(sppf, id).collect();
        next.reverse();
        stack.extend(next);
    }
    order
}

/// Counts over the part of a forest reachable from a root
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ForestStats {
    pub nodes: usize,
    pub packed: usize,
    pub ambiguous: usize,
}

impl ForestStats {
    #[must_use]
    pub fn collect(sppf: &Sppf, root: SppfNodeId) -> Self {
        reachable(sppf, root)
            .into_iter()
            .map(|id| sppf.node(id))
            .fold(Self::default(), |stats, node| Self {
                nodes: stats.nodes + 1,
                packed: stats.packed + node.packed().len(),
                ambiguous: stats.ambiguous + usize::from(node.is_ambiguous()),
            })
    }
}

/// Number of distinct derivation trees below `root`
///
/// `None` when the forest has a cycle, i.e. infinitely many trees. Large
/// counts saturate.
#[must_use]
pub fn count_derivations(sppf: &Sppf, root: SppfNodeId) -> Option<u128> {
    let mut counts: FastMap<SppfNodeId, u128> = FastMap::default();
    let mut in_progress: FastSet<SppfNodeId> = FastSet::default();
    let mut stack = vec![(root, false)];

    while let Some((id, expanded)) = stack.pop() {
        if counts.contains_key(&id) {
            continue;
        }
        let node = sppf.node(id);
        if expanded {
            let count = if node.packed().is_empty() {
                1
            } else {
                node.packed().iter().fold(0u128, |total, packed| {
                    let left = packed.left.map_or(1, |left| counts[&left]);
                    total.saturating_add(left.saturating_mul(counts[&packed.right]))
                })
            };
            counts.insert(id, count);
            in_progress.remove(&id);
            continue;
        }
        if !in_progress.insert(id) {
            return None;
        }
        stack.push((id, true));
        stack.extend(children(sppf, id).map(|child| (child, false)));
    }
    counts.get(&root).copied()
}

/// Label of a node followed by its call arguments, if any
fn label_text(sppf: &Sppf, id: SppfNodeId, graph: &GrammarGraph) -> String {
    let node = sppf.node(id);
    let mut text = match node.label() {
        NodeLabel::Dummy => "$".to_string(),
        NodeLabel::Epsilon => "ε".to_string(),
        NodeLabel::Terminal(id) => graph.terminal(id).name().to_string(),
        NodeLabel::Nonterminal(id) => graph.nonterminal(id).name.to_string(),
        NodeLabel::Intermediate(slot) => format!("[{}]", graph.slot(slot).name()),
    };
    let arguments = sppf.arguments(node.context());
    if !arguments.is_empty() {
        text.push('(');
        for (i, argument) in arguments.iter().enumerate() {
            if i > 0 {
                text.push_str(", ");
            }
            let _ = write!(text, "{argument}");
        }
        text.push(')');
    }
    text
}

/// A textual form of the forest below `root` that does not depend on node
/// ids or construction order
///
/// Nodes are numbered breadth-first, visiting packed nodes in a canonical
/// order. Two forests render the same exactly when they have the same
/// structure.
#[must_use]
pub fn render(sppf: &Sppf, root: SppfNodeId, graph: &GrammarGraph, input: &Input) -> String {
    let key = |id: SppfNodeId| {
        let node = sppf.node(id);
        (label_text(sppf, id, graph), node.left(), node.right())
    };
    let sorted_packed = |id: SppfNodeId| {
        let mut packed: Vec<(_, PackedNode)> = sppf
            .node(id)
            .packed()
            .iter()
            .map(|packed| {
                let canonical = (
                    graph.slot(packed.slot).name().to_string(),
                    packed.pivot,
                    packed.left.map(key),
                    key(packed.right),
                );
                (canonical, *packed)
            })
            .collect();
        packed.sort_by(|a, b| a.0.cmp(&b.0));
        packed.into_iter().map(|(_, packed)| packed).collect::<Vec<_>>()
    };

    let mut numbers: FastMap<SppfNodeId, usize> = FastMap::default();
    let mut order = vec![root];
    numbers.insert(root, 0);
    let mut out = String::new();
    let mut next = 0;
    while next < order.len() {
        let id = order[next];
        next += 1;
        let node = sppf.node(id);
        let _ = write!(
            out,
            "{}: {} {}..{}",
            numbers[&id],
            label_text(sppf, id, graph),
            node.left(),
            node.right()
        );
        if node.is_leaf() {
            let _ = write!(out, " {:?}", input.slice(node.left(), node.right()));
        }
        out.push('\n');
        for packed in sorted_packed(id) {
            let mut number = |child: SppfNodeId| {
                let fresh = numbers.len();
                *numbers.entry(child).or_insert_with(|| {
                    order.push(child);
                    fresh
                })
            };
            let left = packed.left.map(&mut number);
            let right = number(packed.right);
            let left = left.map_or_else(|| "_".to_string(), |left| left.to_string());
            let _ = writeln!(
                out,
                "    {} @{} -> {left}, {right}",
                graph.slot(packed.slot).name(),
                packed.pivot
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::NonterminalId;
    use crate::sppf::ContextId;
    use crate::graph::SlotId;
    use crate::terminal::TerminalId;

    const S: NonterminalId = NonterminalId::new(0);

    /// `S(0,2)` with two packed nodes over shared children
    fn ambiguous() -> (Sppf, SppfNodeId) {
        let mut sppf = Sppf::default();
        let a = sppf.terminal_node(TerminalId::new(0), 0, 1);
        let b = sppf.terminal_node(TerminalId::new(0), 1, 2);
        let ab = sppf.combine(crate::graph::Position::Last, SlotId::new(1), S, ContextId::EMPTY, a, b);
        let other = sppf.intermediate_node(SlotId::new(2), ContextId::EMPTY, 0, 1);
        sppf.add_packed(
            other,
            PackedNode {
                slot: SlotId::new(2),
                pivot: 0,
                left: None,
                right: a,
            },
        );
        sppf.add_packed(
            ab,
            PackedNode {
                slot: SlotId::new(3),
                pivot: 1,
                left: Some(other),
                right: b,
            },
        );
        (sppf, ab)
    }

    #[test]
    fn test_reachable_and_stats() {
        let (sppf, root) = ambiguous();
        let nodes = reachable(&sppf, root);
        assert_eq!(nodes.len(), 4);
        assert_eq!(nodes[0], root);
        let stats = ForestStats::collect(&sppf, root);
        assert_eq!(
            stats,
            ForestStats {
                nodes: 4,
                packed: 3,
                ambiguous: 1
            }
        );
    }

    #[test]
    fn test_count_derivations() {
        let (sppf, root) = ambiguous();
        assert_eq!(count_derivations(&sppf, root), Some(2));
        let leaf = sppf.node(root).packed()[0].right;
        assert_eq!(count_derivations(&sppf, leaf), Some(1));
    }

    #[test]
    fn test_cycle_has_no_count() {
        let mut sppf = Sppf::default();
        let a = sppf.terminal_node(TerminalId::new(0), 0, 1);
        let s = sppf.finish_rule(SlotId::new(1), S, ContextId::EMPTY, a, 1);
        sppf.add_packed(
            s,
            PackedNode {
                slot: SlotId::new(2),
                pivot: 0,
                left: None,
                right: s,
            },
        );
        assert_eq!(count_derivations(&sppf, s), None);
        assert_eq!(reachable(&sppf, s).len(), 2);
    }
}
