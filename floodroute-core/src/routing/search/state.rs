use std::cmp::Ordering;

use crate::NodeId;

#[derive(Copy, Clone, Debug, PartialEq)]
pub(super) struct State {
    /// Estimated total cost through this node (g + h)
    pub(super) estimate: f64,
    pub(super) cost: f64,
    /// Push order, so equal estimates pop first-in first-out
    pub(super) seq: u64,
    pub(super) node: NodeId,
}

impl Eq for State {}

// Implement Ord for State to use in BinaryHeap
impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap by estimate (reversed from standard Rust BinaryHeap)
        other
            .estimate
            .total_cmp(&self.estimate)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BinaryHeap;

    use super::*;

    #[test]
    fn equal_estimates_pop_in_insertion_order() {
        let mut heap = BinaryHeap::new();
        for (seq, estimate) in [(0, 5.0), (1, 3.0), (2, 5.0), (3, 3.0)] {
            heap.push(State {
                estimate,
                cost: 0.0,
                seq,
                node: NodeId::new(seq as usize),
            });
        }
        let order: Vec<u64> = std::iter::from_fn(|| heap.pop().map(|s| s.seq)).collect();
        assert_eq!(order, vec![1, 3, 0, 2]);
    }
}
