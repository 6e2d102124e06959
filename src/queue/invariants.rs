//! Whole-tree validation.
//!
//! [`PipelinedQueue::validate`] locks every level in order, which waits out
//! all in-flight traversals, and then checks the structure slot by slot. The
//! size counter is only compared when no traversal is in flight, which is
//! what holding every level lock guarantees here.

use std::fmt as StdFmt;

use crate::compare::Comparator;
use crate::heap;
use crate::level::LevelGuard;
use crate::node::Node;
use crate::ordering::{GROWTH_ORD, SIZE_READ};

use super::PipelinedQueue;

/// A broken structural invariant found by [`PipelinedQueue::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// A child orders strictly above its parent.
    HeapOrder {
        /// Global index of the parent.
        parent: usize,
        /// Global index of the offending child.
        child: usize,
    },

    /// A slot's recorded free capacity disagrees with its subtree.
    FreeCapacity {
        /// Global index of the slot.
        index: usize,
        /// Value stored in the slot.
        recorded: u64,
        /// Value recomputed from the children.
        actual: u64,
    },

    /// An occupied slot sits below an empty parent.
    OrphanedElement {
        /// Global index of the occupied slot.
        index: usize,
    },

    /// The occupied flag and the element presence disagree.
    OccupiedFlag {
        /// Global index of the slot.
        index: usize,
    },

    /// A level holds the wrong number of slots for the current capacity.
    PartitionWidth {
        /// Depth of the level.
        level: usize,
        /// Slots the capacity calls for.
        expected: usize,
        /// Slots the level holds.
        actual: usize,
    },

    /// The size counter disagrees with the occupied slot count.
    SizeMismatch {
        /// Occupied slots found.
        counted: usize,
        /// Value of the size counter.
        recorded: usize,
    },
}

impl StdFmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        match self {
            Self::HeapOrder { parent, child } => {
                write!(f, "heap order broken: slot {child} orders above its parent {parent}")
            }
            Self::FreeCapacity {
                index,
                recorded,
                actual,
            } => write!(
                f,
                "slot {index} records free capacity {recorded}, subtree has {actual}"
            ),
            Self::OrphanedElement { index } => {
                write!(f, "slot {index} is occupied under an empty parent")
            }
            Self::OccupiedFlag { index } => {
                write!(f, "slot {index} occupied flag disagrees with its contents")
            }
            Self::PartitionWidth {
                level,
                expected,
                actual,
            } => write!(f, "level {level} holds {actual} slots, expected {expected}"),
            Self::SizeMismatch { counted, recorded } => {
                write!(f, "size counter is {recorded}, tree holds {counted}")
            }
        }
    }
}

impl std::error::Error for InvariantViolation {}

impl<E, C: Comparator<E>> PipelinedQueue<E, C> {
    /// Check every structural invariant of the tree.
    ///
    /// Blocks until all in-flight operations have left the tree, and keeps
    /// new ones out while it runs. Intended for tests and debugging.
    ///
    /// # Errors
    /// The first [`InvariantViolation`] found, scanning levels top-down.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip_all))]
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        let guards: Vec<LevelGuard<E>> = self.table.lock_all();
        let capacity: usize = self.capacity.load(GROWTH_ORD);

        let result = self.check_levels(&guards, capacity);
        #[cfg(feature = "tracing")]
        if let Err(violation) = &result {
            tracing::error!(%violation, capacity, "validate: invariant broken");
        }

        result
    }

    fn check_levels(
        &self,
        guards: &[LevelGuard<E>],
        capacity: usize,
    ) -> Result<(), InvariantViolation> {
        let height: usize = heap::height_for(capacity);
        if guards.len() != height {
            return Err(InvariantViolation::PartitionWidth {
                level: guards.len().min(height),
                expected: heap::level_width(guards.len().min(height), capacity),
                actual: 0,
            });
        }

        let mut counted: usize = 0;

        for (depth, guard) in guards.iter().enumerate() {
            let nodes: &[Node<E>] = guard.nodes();
            let expected: usize = heap::level_width(depth, capacity);
            if nodes.len() != expected {
                return Err(InvariantViolation::PartitionWidth {
                    level: depth,
                    expected,
                    actual: nodes.len(),
                });
            }

            let upper: Option<&[Node<E>]> = depth.checked_sub(1).map(|above| guards[above].nodes());
            let lower: Option<&[Node<E>]> = guards.get(depth + 1).map(|below| below.nodes());

            for (offset, node) in nodes.iter().enumerate() {
                let index: usize = heap::level_start(depth) + offset;

                if node.is_occupied() != node.element().is_some() {
                    return Err(InvariantViolation::OccupiedFlag { index });
                }
                counted += usize::from(node.is_occupied());

                if let Some(parent) = upper.and_then(|above| above.get(offset / 2)) {
                    self.check_parent(parent, node, index)?;
                }

                let children: u64 = lower.map_or(0, |below| {
                    let left: u64 = below.get(2 * offset).map_or(0, Node::free_capacity);
                    let right: u64 = below.get(2 * offset + 1).map_or(0, Node::free_capacity);
                    left + right
                });
                let actual: u64 = node.own_capacity() + children;
                if node.free_capacity() != actual {
                    return Err(InvariantViolation::FreeCapacity {
                        index,
                        recorded: node.free_capacity(),
                        actual,
                    });
                }
            }
        }

        let recorded: usize = self.size.load(SIZE_READ);
        if counted != recorded {
            return Err(InvariantViolation::SizeMismatch { counted, recorded });
        }

        Ok(())
    }

    fn check_parent(
        &self,
        parent: &Node<E>,
        child: &Node<E>,
        index: usize,
    ) -> Result<(), InvariantViolation> {
        let Some(child_element) = child.element() else {
            return Ok(());
        };

        let Some(parent_element) = parent.element() else {
            return Err(InvariantViolation::OrphanedElement { index });
        };

        if self.comparator.greater(child_element, parent_element) {
            let parent: usize = heap::parent(index).unwrap_or_default();
            return Err(InvariantViolation::HeapOrder {
                parent,
                child: index,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Fail fast in tests")]
mod tests {
    use super::*;
    use crate::ordering::RELAXED;

    fn corrupt<F>(queue: &PipelinedQueue<u32>, depth: usize, offset: usize, f: F)
    where
        F: FnOnce(&mut Node<u32>),
    {
        let levels = queue.table.snapshot();
        let mut level = levels[depth].lock();
        f(level.node_mut(offset).unwrap());
    }

    fn filled() -> PipelinedQueue<u32> {
        let queue: PipelinedQueue<u32> = PipelinedQueue::with_capacity(7).unwrap();
        for value in [50, 40, 30, 20, 10] {
            queue.insert(value).unwrap();
        }
        queue
    }

    #[test]
    fn test_valid_queue_passes() {
        filled().validate().unwrap();
    }

    #[test]
    fn test_detects_heap_order() {
        let queue = filled();
        corrupt(&queue, 0, 0, |root| {
            root.vacate();
            root.fill(1);
        });

        let err = queue.validate().unwrap_err();
        assert!(matches!(err, InvariantViolation::HeapOrder { parent: 0, .. }));
    }

    #[test]
    fn test_detects_free_capacity() {
        let queue = filled();
        corrupt(&queue, 0, 0, |root| root.set_free_capacity(9));

        let err = queue.validate().unwrap_err();
        assert_eq!(
            err,
            InvariantViolation::FreeCapacity {
                index: 0,
                recorded: 9,
                actual: 2,
            }
        );
    }

    #[test]
    fn test_detects_orphan() {
        let queue: PipelinedQueue<u32> = PipelinedQueue::with_capacity(3).unwrap();
        corrupt(&queue, 1, 1, |node| {
            node.fill(5);
            node.set_free_capacity(0);
        });
        corrupt(&queue, 0, 0, |root| root.set_free_capacity(2));

        let err = queue.validate().unwrap_err();
        assert_eq!(err, InvariantViolation::OrphanedElement { index: 2 });
    }

    #[test]
    fn test_detects_size_mismatch() {
        let queue = filled();
        queue.size.fetch_add(1, RELAXED);

        let err = queue.validate().unwrap_err();
        assert_eq!(
            err,
            InvariantViolation::SizeMismatch {
                counted: 5,
                recorded: 6,
            }
        );
    }

    #[test]
    fn test_display() {
        let violation = InvariantViolation::PartitionWidth {
            level: 2,
            expected: 4,
            actual: 3,
        };

        assert_eq!(violation.to_string(), "level 2 holds 3 slots, expected 4");
    }
}
