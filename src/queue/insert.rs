//! Lock-coupled sift-down-on-insert.
//!
//! The new element enters at the root and is carried downward. At each level
//! it either lands in an empty slot (done) or is compared with the occupant:
//! the larger of the two stays, the smaller continues down into the child
//! with the most room. Every slot passed on the way gives up one unit of
//! free capacity, since the element will end up somewhere in its subtree.

use crate::compare::Comparator;
use crate::error::InsertError;
use crate::heap;
use crate::level::{Coupling, Level};
use crate::node::Node;
use crate::ordering::SIZE_WRITE;
use crate::tracing_helpers::{error_log, trace_log};

use super::PipelinedQueue;

/// Outcome of one insert step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InsertStep {
    /// The carried element was stored; the traversal is over.
    Placed,
    /// The carried element is parked at the next level.
    Descend,
}

impl<E, C: Comparator<E>> PipelinedQueue<E, C> {
    /// Insert `element`. Never blocks beyond the brief level handoffs, and
    /// grows the heap when the tree is full.
    ///
    /// # Errors
    /// [`QueueError::CapacityExhausted`](crate::QueueError::CapacityExhausted)
    /// if the tree is full and may not grow further. The element is handed
    /// back inside the error.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip_all))]
    pub fn insert(&self, element: E) -> Result<(), InsertError<E>> {
        let mut coupling: Coupling<E> = Coupling::enter(&self.table);

        let root_full: bool = coupling
            .current()
            .node(0)
            .is_none_or(|root| root.free_capacity() == 0);

        if root_full {
            if let Err(error) = self.grow(&mut coupling) {
                return Err(InsertError::new(element, error));
            }
        }

        // Counted while the root is held, so extractions, which uncount
        // under the root too, never see the counter go below zero.
        self.size.fetch_add(1, SIZE_WRITE);
        coupling.current().token().park(Some(element), 0);

        loop {
            match self.insert_step(&mut coupling) {
                InsertStep::Placed => break,
                InsertStep::Descend => {
                    if !coupling.advance() {
                        break;
                    }
                }
            }
        }

        drop(coupling);

        self.not_empty.notify();
        Ok(())
    }

    /// Alias of [`insert`](Self::insert), named after the queue convention.
    ///
    /// # Errors
    /// Same as [`insert`](Self::insert).
    #[inline]
    pub fn offer(&self, element: E) -> Result<(), InsertError<E>> {
        self.insert(element)
    }

    /// Work on the level the coupling currently holds.
    fn insert_step(&self, coupling: &mut Coupling<E>) -> InsertStep {
        let depth: usize = coupling.depth();
        let (current, ahead) = coupling.pair();

        let position: usize = current.token().position();
        let Some(mut carried) = current.token().take() else {
            error_log!(depth, position, "insert: no element parked at level");
            debug_assert!(false, "insert step without a carried element");
            return InsertStep::Placed;
        };

        let Some(node) = current.node_mut(heap::offset_in_level(position)) else {
            error_log!(depth, position, "insert: parked position outside the level");
            debug_assert!(false, "insert position {position} outside level {depth}");
            return InsertStep::Placed;
        };

        if !node.is_occupied() {
            node.fill(carried);
            node.consume_capacity();
            trace_log!(depth, position, "insert: placed");
            return InsertStep::Placed;
        }

        let displaces: bool = node
            .element()
            .is_some_and(|occupant| self.comparator.greater(&carried, occupant));
        if displaces {
            node.swap(&mut carried);
        }
        node.consume_capacity();

        let Some(child) = ahead.and_then(|below| {
            choose_child(below, position).map(|child| (below, child))
        }) else {
            // Unreachable while the free-capacity counts are right: an
            // occupied slot with room below always has a child with room.
            error_log!(depth, position, "insert: no child to descend into, element dropped");
            debug_assert!(false, "insert ran out of tree at index {position}");
            return InsertStep::Placed;
        };

        let (below, child_position) = child;
        below.token().park(Some(carried), child_position);
        InsertStep::Descend
    }
}

/// Pick the child of `position` to carry an element into.
///
/// Prefers an empty child, then the child with strictly more free capacity;
/// ties go left. Returns `None` when `position` has no children.
fn choose_child<E>(below: &Level<E>, position: usize) -> Option<usize> {
    let offset: usize = heap::offset_in_level(position);
    let left_index: usize = 2 * position + 1;
    let right_index: usize = left_index + 1;

    let left: Option<&Node<E>> = below.node(2 * offset);
    let right: Option<&Node<E>> = below.node(2 * offset + 1);

    match (left, right) {
        (None, None) => None,
        (Some(_), None) => Some(left_index),
        (None, Some(_)) => Some(right_index),
        (Some(left), Some(right)) => {
            let go_right: bool = match (left.is_occupied(), right.is_occupied()) {
                (true, false) => true,
                (false, true) => false,
                _ => right.free_capacity() > left.free_capacity(),
            };

            Some(if go_right { right_index } else { left_index })
        }
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Fail fast in tests")]
mod tests {
    use super::*;
    use crate::compare::NaturalOrder;
    use crate::config::QueueConfig;
    use crate::error::QueueError;

    fn level_with(depth: usize, nodes: Vec<Node<u32>>) -> Level<u32> {
        Level::new(depth, nodes)
    }

    fn occupied(value: u32, free: u64) -> Node<u32> {
        let mut node = Node::empty();
        node.fill(value);
        node.set_free_capacity(free);
        node
    }

    #[test]
    fn test_choose_child_prefers_empty() {
        let below = level_with(1, vec![occupied(5, 1), Node::empty()]);
        assert_eq!(choose_child(&below, 0), Some(2));

        let below = level_with(1, vec![Node::empty(), occupied(5, 2)]);
        assert_eq!(choose_child(&below, 0), Some(1));
    }

    #[test]
    fn test_choose_child_balances_capacity() {
        let below = level_with(1, vec![occupied(5, 1), occupied(4, 3)]);
        assert_eq!(choose_child(&below, 0), Some(2));

        let below = level_with(1, vec![occupied(5, 2), occupied(4, 2)]);
        assert_eq!(choose_child(&below, 0), Some(1), "ties go left");
    }

    #[test]
    fn test_choose_child_single_and_none() {
        let below = level_with(2, vec![Node::empty(), Node::empty(), Node::empty()]);
        assert_eq!(choose_child(&below, 2), Some(5));
        assert_eq!(choose_child(&below, 1), Some(3));

        let below = level_with(2, vec![Node::empty()]);
        assert_eq!(choose_child(&below, 2), None);
    }

    #[test]
    fn test_insert_keeps_larger_on_top() {
        let queue: PipelinedQueue<u32> = PipelinedQueue::with_capacity(7).unwrap();

        for value in [1, 2, 3, 4, 5, 6, 7] {
            queue.insert(value).unwrap();
            queue.validate().unwrap();
        }

        assert_eq!(queue.peek(), Some(7));
        assert_eq!(queue.growth_count(), 0);
    }

    #[test]
    fn test_insert_fills_tree_before_growing() {
        let queue: PipelinedQueue<u32> = PipelinedQueue::with_capacity(15).unwrap();

        for value in 0..15 {
            queue.insert(value).unwrap();
        }
        assert_eq!(queue.capacity(), 15);
        assert_eq!(queue.growth_count(), 0);

        queue.insert(15).unwrap();
        assert_eq!(queue.growth_count(), 1);
        assert_eq!(queue.capacity(), 32);
        assert_eq!(queue.height(), 6);
        queue.validate().unwrap();
    }

    #[test]
    fn test_insert_duplicates() {
        let queue: PipelinedQueue<u32> = PipelinedQueue::with_capacity(2).unwrap();

        for _ in 0..9 {
            queue.insert(4).unwrap();
        }

        queue.validate().unwrap();
        assert_eq!(queue.drain_up_to(usize::MAX), vec![4; 9]);
    }

    #[test]
    fn test_insert_capacity_exhausted_returns_element() {
        let config = QueueConfig::default().initial_capacity(3).max_capacity(3);
        let queue = PipelinedQueue::with_config(config, NaturalOrder).unwrap();

        for value in [10, 20, 30] {
            queue.insert(value).unwrap();
        }

        let err = queue.insert(40).unwrap_err();
        assert_eq!(err.error(), &QueueError::CapacityExhausted { capacity: 3 });
        assert_eq!(err.into_element(), 40);

        // Still usable for extraction and for inserts that fit.
        assert_eq!(queue.try_extract_max(), Some(30));
        queue.insert(25).unwrap();
        assert_eq!(queue.len(), 3);
        queue.validate().unwrap();
        assert_eq!(queue.drain_up_to(3), vec![25, 20, 10]);
    }
}
