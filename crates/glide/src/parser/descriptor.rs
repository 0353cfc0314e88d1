//! Descriptors and the worklist.

use std::collections::VecDeque;

use super::config::WorklistOrder;
use crate::FastSet;
use crate::datadep::Environment;
use crate::graph::SlotId;
use crate::gss::GssNodeId;
use crate::sppf::SppfNodeId;

/// A unit of pending work: continue at `slot` from input `index`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Descriptor {
    pub slot: SlotId,
    pub gss: GssNodeId,
    pub index: usize,
    /// What the current rule has parsed so far
    pub sppf: SppfNodeId,
    pub environment: Environment,
}

/// Pending descriptors, each scheduled at most once per parse
#[derive(Debug, Default)]
pub struct Worklist {
    pending: VecDeque<Descriptor>,
    seen: FastSet<Descriptor>,
    order: WorklistOrder,
}

impl Worklist {
    #[must_use]
    pub fn new(order: WorklistOrder) -> Self {
        Self {
            order,
            ..Self::default()
        }
    }

    /// Schedule a descriptor unless it was scheduled before
    pub fn add(&mut self, descriptor: Descriptor) -> bool {
        if !self.seen.insert(descriptor.clone()) {
            return false;
        }
        self.pending.push_back(descriptor);
        true
    }

    pub fn next(&mut self) -> Option<Descriptor> {
        match self.order {
            WorklistOrder::Fifo => self.pending.pop_front(),
            WorklistOrder::Lifo => self.pending.pop_back(),
        }
    }

    /// Forget every descriptor, including the seen ones
    pub fn reset(&mut self, order: WorklistOrder) {
        self.pending.clear();
        self.seen.clear();
        self.order = order;
    }

    /// Descriptors scheduled since the last reset
    #[must_use]
    pub fn total(&self) -> usize {
        self.seen.len()
    }

    /// Descriptors still waiting
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(index: usize) -> Descriptor {
        Descriptor {
            slot: SlotId::new(1),
            gss: GssNodeId::ROOT,
            index,
            sppf: SppfNodeId::DUMMY,
            environment: Environment::empty(),
        }
    }

    #[test]
    fn test_descriptors_are_scheduled_once() {
        let mut worklist = Worklist::new(WorklistOrder::Fifo);
        assert!(worklist.add(descriptor(0)));
        assert!(!worklist.add(descriptor(0)));
        assert_eq!(worklist.next(), Some(descriptor(0)));
        assert!(!worklist.add(descriptor(0)));
        assert_eq!(worklist.next(), None);
        assert_eq!(worklist.total(), 1);
    }

    #[test]
    fn test_order() {
        let mut fifo = Worklist::new(WorklistOrder::Fifo);
        let mut lifo = Worklist::new(WorklistOrder::Lifo);
        for index in 0..3 {
            fifo.add(descriptor(index));
            lifo.add(descriptor(index));
        }
        assert_eq!(fifo.next().map(|d| d.index), Some(0));
        assert_eq!(lifo.next().map(|d| d.index), Some(2));
        assert_eq!(lifo.len(), 2);

        lifo.reset(WorklistOrder::Fifo);
        assert!(lifo.is_empty());
        assert!(lifo.add(descriptor(2)));
    }
}
