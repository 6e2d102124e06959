//! `PipelinedQueue` - a concurrent max-priority queue pipelined over tree levels.
//!
//! This module owns the queue type, its construction, and the small
//! accessors. The traversals live in submodules:
//!
//! - `insert`: lock-coupled sift-down-on-insert
//! - `extract`: lock-coupled sift-down-on-remove
//! - `grow`: enlarging the node array and the level-lock array together
//! - `invariants`: quiescent validation of heap order and free capacity

use std::fmt as StdFmt;
use std::sync::atomic::AtomicUsize;

use parking_lot::Mutex;

use crate::blocking::NotEmpty;
use crate::compare::{Comparator, NaturalOrder};
use crate::config::QueueConfig;
use crate::error::QueueError;
use crate::heap;
use crate::level::LevelTable;
use crate::node::Node;
use crate::ordering::{GROWTH_ORD, RELAXED};

mod extract;
mod grow;
mod insert;
mod invariants;



pub use invariants::InvariantViolation;

// ============================================================================
//  PipelinedQueue
// ============================================================================

/// A concurrent max-priority queue with one lock per heap level.
///
/// `insert` and `try_extract_max` walk the tree top-down holding at most two
/// adjacent level locks, so operations at different depths proceed in
/// parallel. The queue is unbounded up to [`QueueConfig::max_capacity`],
/// growing on demand.
///
/// # Type Parameters
///
/// - `E` - The element type
/// - `C` - The ordering (defaults to `E`'s [`Ord`])
///
/// # Example
///
/// ```rust
/// use pipeheap::PipelinedQueue;
///
/// let queue: PipelinedQueue<u32> = PipelinedQueue::with_capacity(1)?;
/// for value in [5, 3, 9, 1] {
///     queue.insert(value)?;
/// }
///
/// assert_eq!(queue.try_extract_max(), Some(9));
/// assert_eq!(queue.try_extract_max(), Some(5));
/// assert_eq!(queue.len(), 2);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct PipelinedQueue<E, C = NaturalOrder> {
    /// Level locks; each owns its level's slice of the heap array.
    table: LevelTable<E>,

    /// Element ordering.
    comparator: C,

    /// Elements in the queue. Updated while level 0 is held, so it matches the
    /// order in which operations pass the root; readers get a snapshot.
    size: AtomicUsize,

    /// Slots in the heap array. Written only by growth.
    capacity: AtomicUsize,

    /// Growth refuses to go past this.
    max_capacity: usize,

    /// Completed growth steps.
    growths: AtomicUsize,

    /// Wakes consumers blocked in the blocking façade.
    pub(crate) not_empty: NotEmpty,

    /// Serializes drains with each other.
    drain_lock: Mutex<()>,
}

impl<E, C> StdFmt::Debug for PipelinedQueue<E, C> {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        f.debug_struct("PipelinedQueue")
            .field("len", &self.size.load(RELAXED))
            .field("capacity", &self.capacity.load(RELAXED))
            .field("height", &self.table.height())
            .field("max_capacity", &self.max_capacity)
            .finish_non_exhaustive()
    }
}

impl<E: Ord> PipelinedQueue<E> {
    /// Create an empty queue with the default capacity (15 slots, 4 levels).
    #[must_use]
    pub fn new() -> Self {
        Self::assemble(QueueConfig::default(), NaturalOrder, Vec::new())
    }

    /// Create an empty queue with `capacity` slots.
    ///
    /// # Errors
    /// [`QueueError::InvalidArgument`] if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Result<Self, QueueError> {
        Self::with_config(
            QueueConfig::default().initial_capacity(capacity),
            NaturalOrder,
        )
    }
}

impl<E: Ord> Default for PipelinedQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, C: Comparator<E>> PipelinedQueue<E, C> {
    /// Create an empty queue with `capacity` slots ordered by `comparator`.
    ///
    /// # Errors
    /// [`QueueError::InvalidArgument`] if `capacity` is zero.
    pub fn with_comparator(capacity: usize, comparator: C) -> Result<Self, QueueError> {
        Self::with_config(QueueConfig::default().initial_capacity(capacity), comparator)
    }

    /// Create an empty queue from a full configuration.
    ///
    /// # Errors
    /// [`QueueError::InvalidArgument`] if the configuration does not validate.
    pub fn with_config(config: QueueConfig, comparator: C) -> Result<Self, QueueError> {
        config.validate()?;
        Ok(Self::assemble(config, comparator, Vec::new()))
    }

    /// Build a queue holding `elements`.
    ///
    /// The capacity is the larger of the configured one and the element
    /// count. Elements are sorted once, and a descending array is already a
    /// valid heap.
    ///
    /// # Errors
    /// [`QueueError::InvalidArgument`] if the configuration does not validate,
    /// [`QueueError::CapacityExhausted`] if the elements do not fit under the
    /// maximum capacity.
    pub fn from_elements(
        config: QueueConfig,
        comparator: C,
        mut elements: Vec<E>,
    ) -> Result<Self, QueueError> {
        config.validate()?;
        if elements.len() > config.max_capacity {
            return Err(QueueError::CapacityExhausted {
                capacity: config.max_capacity,
            });
        }

        elements.sort_by(|a, b| comparator.compare(b, a));
        Ok(Self::assemble(config, comparator, elements))
    }

    /// Lay out `sorted` (descending) into fresh level partitions.
    fn assemble(config: QueueConfig, comparator: C, sorted: Vec<E>) -> Self {
        let capacity: usize = config.initial_capacity.max(sorted.len()).max(1);
        let height: usize = heap::height_for(capacity);
        let size: usize = sorted.len();

        let mut partitions: Vec<Vec<Node<E>>> = (0..height)
            .map(|level| Vec::with_capacity(heap::level_width(level, capacity)))
            .collect();

        {
            let mut refs: Vec<&mut Vec<Node<E>>> = partitions.iter_mut().collect();
            heap::init_range(&mut refs, 0, capacity);

            for (index, element) in sorted.into_iter().enumerate() {
                let level: usize = heap::level_of(index);
                refs[level][heap::offset_in_level(index)].fill(element);
            }

            heap::recompute_capacities(&mut refs);
        }

        Self {
            table: LevelTable::new(partitions),
            comparator,
            size: AtomicUsize::new(size),
            capacity: AtomicUsize::new(capacity),
            max_capacity: config.max_capacity.max(capacity),
            growths: AtomicUsize::new(0),
            not_empty: NotEmpty::new(),
            drain_lock: Mutex::new(()),
        }
    }
}

impl<E, C> PipelinedQueue<E, C> {
    /// Elements currently in the queue.
    ///
    /// Best effort: operations in flight are not reflected until they finish.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.size.load(RELAXED)
    }

    /// Whether the queue currently holds no elements.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slots in the heap array.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity.load(GROWTH_ORD)
    }

    /// Levels in the tree (and level locks).
    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        self.table.height()
    }

    /// Largest slot count growth may reach.
    #[inline]
    #[must_use]
    pub const fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    /// How many more elements fit before inserts start failing.
    #[inline]
    #[must_use]
    pub fn remaining_capacity(&self) -> usize {
        self.max_capacity.saturating_sub(self.len())
    }

    /// Completed growth steps since construction.
    #[inline]
    #[must_use]
    pub fn growth_count(&self) -> usize {
        self.growths.load(RELAXED)
    }

    /// The ordering in use.
    #[inline]
    #[must_use]
    pub const fn comparator(&self) -> &C {
        &self.comparator
    }

    /// A copy of the current maximum without removing it.
    #[must_use]
    pub fn peek(&self) -> Option<E>
    where
        E: Clone,
    {
        let (root, _) = self.table.lock_root();
        root.node(0).and_then(Node::element).cloned()
    }
}

impl<E, C: Comparator<E>> PipelinedQueue<E, C> {
    /// Move up to `max` elements out of the queue, largest first.
    ///
    /// Stops early when the queue runs empty. Drains are serialized with each
    /// other; concurrent inserts and extractions still interleave.
    #[must_use]
    pub fn drain_up_to(&self, max: usize) -> Vec<E> {
        let mut drained: Vec<E> = Vec::new();
        self.drain_into(&mut drained, max);
        drained
    }

    /// Move up to `max` elements into `sink`, largest first. Returns how many
    /// were moved.
    pub fn drain_into<X: Extend<E>>(&self, sink: &mut X, max: usize) -> usize {
        let _drain = self.drain_lock.lock();
        let mut moved: usize = 0;

        while moved < max {
            let Some(element) = self.try_extract_max() else {
                break;
            };

            sink.extend(Some(element));
            moved += 1;
        }

        moved
    }
}

impl<E: Ord> FromIterator<E> for PipelinedQueue<E> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        let mut elements: Vec<E> = iter.into_iter().collect();
        elements.sort_by(|a, b| b.cmp(a));

        let config = QueueConfig::default().initial_capacity(elements.len().max(1));
        Self::assemble(config, NaturalOrder, elements)
    }
}

// ============================================================================
//  Tests
// ============================================================================
