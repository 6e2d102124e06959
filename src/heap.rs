//! Heap array geometry and bulk capacity maintenance.
//!
//! The heap is a complete binary tree stored in array order: slot `i` has
//! children `2i + 1` and `2i + 2`. The array is partitioned by tree level,
//! level `L` owning the global indices `[2^L - 1, 2^(L+1) - 1)` clipped to
//! the capacity, so that each partition can sit behind its own level lock.
//! Within a level, the node at offset `o` has its children at offsets `2o`
//! and `2o + 1` of the next level.
//!
//! Nothing here locks. The bulk operations take the level partitions as
//! `&mut Vec<Node<E>>`, which growth obtains from the level guards it holds.

use crate::node::Node;

// ============================================================================
//  Index Arithmetic
// ============================================================================

/// Number of levels of a complete tree with `capacity` slots:
/// `ceil(log2(capacity + 1))`.
#[inline]
#[must_use]
pub const fn height_for(capacity: usize) -> usize {
    (usize::BITS - capacity.leading_zeros()) as usize
}

/// Level of global index `i`: `floor(log2(i + 1))`.
#[inline]
#[must_use]
pub const fn level_of(i: usize) -> usize {
    (usize::BITS - 1 - (i + 1).leading_zeros()) as usize
}

/// First global index of `level`.
#[inline]
#[must_use]
pub const fn level_start(level: usize) -> usize {
    (1 << level) - 1
}

/// Slots of `level` that exist in an array of `capacity` slots.
#[inline]
#[must_use]
pub const fn level_width(level: usize, capacity: usize) -> usize {
    let full: usize = 1 << level;
    let available: usize = capacity.saturating_sub(level_start(level));

    if available < full { available } else { full }
}

/// Position of global index `i` within its level partition.
#[inline]
#[must_use]
pub const fn offset_in_level(i: usize) -> usize {
    i - level_start(level_of(i))
}

/// Global index of the left child of `i`, or `None` past the end of the array.
#[inline]
#[must_use]
pub const fn left_child(i: usize, capacity: usize) -> Option<usize> {
    let child: usize = 2 * i + 1;
    if child < capacity { Some(child) } else { None }
}

/// Global index of the right child of `i`, or `None` past the end of the array.
#[inline]
#[must_use]
pub const fn right_child(i: usize, capacity: usize) -> Option<usize> {
    let child: usize = 2 * i + 2;
    if child < capacity { Some(child) } else { None }
}

/// Global index of the parent of `i`. The root has none.
#[inline]
#[must_use]
pub const fn parent(i: usize) -> Option<usize> {
    if i == 0 { None } else { Some((i - 1) / 2) }
}

// ============================================================================
//  Bulk Operations
// ============================================================================

/// Append empty slots for the global indices `[from, to)`.
///
/// `levels` must already contain a (possibly empty) partition for every level
/// of a `to`-slot tree, and every partition must be exactly as long as a
/// `from`-slot tree gives it. New slots start with free capacity 1; run
/// [`recompute_capacities`] afterwards to propagate them upward.
pub fn init_range<E>(levels: &mut [&mut Vec<Node<E>>], from: usize, to: usize) {
    debug_assert!(levels.len() >= height_for(to), "missing level partitions");

    for index in from..to {
        let level: usize = level_of(index);
        debug_assert_eq!(levels[level].len(), offset_in_level(index));
        levels[level].push(Node::empty());
    }
}

/// Recompute every slot's free capacity from the leaves upward.
///
/// Equivalent to a recursive post-order walk from the root: each level is
/// finished before the level above reads it, so children are always final
/// before their parent is summed.
pub fn recompute_capacities<E>(levels: &mut [&mut Vec<Node<E>>]) {
    for level in (0..levels.len()).rev() {
        let (upper, lower) = levels.split_at_mut(level + 1);
        let current: &mut Vec<Node<E>> = &mut upper[level];
        let below: Option<&Vec<Node<E>>> = lower.first().map(|nodes| &**nodes);

        for (offset, node) in current.iter_mut().enumerate() {
            let children: u64 = below.map_or(0, |nodes| {
                let left: u64 = nodes.get(2 * offset).map_or(0, Node::free_capacity);
                let right: u64 = nodes.get(2 * offset + 1).map_or(0, Node::free_capacity);
                left + right
            });

            node.set_free_capacity(node.own_capacity() + children);
        }
    }
}
