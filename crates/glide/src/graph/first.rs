//! First-set analysis over the compiled grammar graph.
//!
//! The sets are conservative: conditions and code are ignored and both
//! branches of every conditional are followed, so a set may admit input the
//! nonterminal cannot derive but never rejects input it can.

use smallvec::SmallVec;

use super::slot::{GrammarSlot, SlotId};
use super::transition::TransitionKind;
use crate::FastSet;
use crate::input::Input;
use crate::terminal::{Terminal, TerminalId};

/// Terminals that may begin a derivation of a nonterminal
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FirstSet {
    /// Sorted, without duplicates
    pub terminals: Vec<TerminalId>,
    /// The nonterminal may derive the empty string
    pub nullable: bool,
    /// A zero-width terminal was crossed; nothing can be ruled out
    pub any: bool,
}

impl FirstSet {
    /// Whether a derivation of the whole `input` may exist
    #[must_use]
    pub fn admits(&self, terminals: &[Terminal], input: &Input) -> bool {
        match input.char_at(0) {
            None => self.nullable || self.any,
            Some(c) => {
                self.any
                    || self
                        .terminals
                        .iter()
                        .any(|id| terminals[id.index()].may_start_with(c))
            }
        }
    }

    fn merge(&mut self, other: &Self) -> bool {
        let before = (self.terminals.len(), self.any);
        self.terminals.extend_from_slice(&other.terminals);
        self.terminals.sort_unstable();
        self.terminals.dedup();
        self.any |= other.any;
        before != (self.terminals.len(), self.any)
    }

    fn insert(&mut self, terminal: TerminalId) -> bool {
        match self.terminals.binary_search(&terminal) {
            Ok(_) => false,
            Err(at) => {
                self.terminals.insert(at, terminal);
                true
            }
        }
    }
}

/// Compute the first set of every nonterminal
///
/// `first_slots[n]` lists the first slots of the alternatives of nonterminal
/// `n`. Iterates to a fixpoint, so mutual and left recursion are fine.
pub(crate) fn compute(
    slots: &[GrammarSlot],
    terminals: &[Terminal],
    first_slots: &[SmallVec<[SlotId; 4]>],
) -> Vec<FirstSet> {
    let mut sets = vec![FirstSet::default(); first_slots.len()];
    let mut changed = true;
    while changed {
        changed = false;
        for (nonterminal, starts) in first_slots.iter().enumerate() {
            let mut set = sets[nonterminal].clone();
            let mut visited: FastSet<SlotId> = FastSet::default();
            let mut stack: Vec<SlotId> = starts.to_vec();

            while let Some(slot) = stack.pop() {
                if !visited.insert(slot) {
                    continue;
                }
                let slot = &slots[slot.index()];
                if slot.is_end() {
                    set.nullable = true;
                }
                for transition in slot.transitions() {
                    match &transition.kind {
                        TransitionKind::Terminal(terminal) => {
                            set.insert(terminal.terminal);
                            if terminals[terminal.terminal.index()].is_nullable() {
                                set.any = true;
                                stack.push(transition.destination);
                            }
                        }
                        TransitionKind::Call(call) => {
                            let callee = &sets[call.callee.index()];
                            set.merge(callee);
                            if callee.nullable {
                                stack.push(transition.destination);
                            }
                        }
                        TransitionKind::Conditional { otherwise, .. } => {
                            stack.push(transition.destination);
                            stack.extend(*otherwise);
                        }
                        TransitionKind::Epsilon(_) | TransitionKind::Code(_) => {
                            stack.push(transition.destination);
                        }
                    }
                }
            }

            if set != sets[nonterminal] {
                sets[nonterminal] = set;
                changed = true;
            }
        }
    }
    sets
}
