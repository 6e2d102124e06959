//! Growth: enlarging the heap array and the level-lock array together.
//!
//! Growth runs inside an insert that found the root subtree full. The insert
//! already holds levels 0 and 1; growth locks every remaining level in
//! increasing order, which waits out every traversal still in flight and makes
//! this the one point where the pipeline collapses to a single operation.
//!
//! Existing slots keep their indices. New slots are appended to the partial
//! last level and to fresh levels, every free capacity is recomputed
//! bottom-up, and a new lock array is published that reuses the existing lock
//! handles and appends locks for the new levels.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::compare::Comparator;
use crate::config;
use crate::error::QueueError;
use crate::heap;
use crate::level::{Coupling, Level, LevelGuard, LevelLock};
use crate::node::Node;
use crate::ordering::{GROWTH_ORD, RELAXED};
use crate::tracing_helpers::{info_log, warn_log};

use super::PipelinedQueue;

impl<E, C: Comparator<E>> PipelinedQueue<E, C> {
    /// Grow the tree by one step while `coupling` holds levels 0 and 1.
    ///
    /// On success the coupling is switched to the new lock array and still
    /// holds levels 0 and 1 (level 1 is acquired here if the tree used to be a
    /// single level).
    ///
    /// # Errors
    /// [`QueueError::CapacityExhausted`] if the array is already at the
    /// maximum. Nothing is changed in that case.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip_all))]
    pub(super) fn grow(&self, coupling: &mut Coupling<E>) -> Result<(), QueueError> {
        debug_assert_eq!(coupling.depth(), 0, "growth away from the root");

        let mut rest: Vec<LevelGuard<E>> = coupling.lock_remaining();

        let old_capacity: usize = self.capacity.load(GROWTH_ORD);
        let new_capacity: usize = match config::next_capacity(old_capacity, self.max_capacity) {
            Ok(capacity) => capacity,
            Err(error) => {
                warn_log!(old_capacity, max = self.max_capacity, "grow: refused");
                return Err(error);
            }
        };

        let old_height: usize = coupling.height();
        let new_height: usize = heap::height_for(new_capacity);

        let mut fresh: Vec<Vec<Node<E>>> = (old_height..new_height)
            .map(|level| Vec::with_capacity(heap::level_width(level, new_capacity)))
            .collect();

        {
            let (current, ahead) = coupling.pair();

            let mut partitions: Vec<&mut Vec<Node<E>>> = Vec::with_capacity(new_height);
            partitions.push(current.nodes_mut());
            partitions.extend(ahead.map(Level::nodes_mut));
            partitions.extend(rest.iter_mut().map(|guard| guard.nodes_mut()));
            partitions.extend(fresh.iter_mut());

            heap::init_range(&mut partitions, old_capacity, new_capacity);
            heap::recompute_capacities(&mut partitions);
        }

        let levels: Arc<[LevelLock<E>]> = coupling
            .levels()
            .iter()
            .cloned()
            .chain(fresh.into_iter().enumerate().map(|(index, nodes)| {
                Arc::new(Mutex::new(Level::new(old_height + index, nodes)))
            }))
            .collect();

        self.table.publish(Arc::clone(&levels));
        self.capacity.store(new_capacity, GROWTH_ORD);
        self.growths.fetch_add(1, RELAXED);

        info_log!(
            old_capacity,
            new_capacity,
            old_height,
            new_height,
            "grow: heap enlarged"
        );

        drop(rest);
        coupling.refresh(levels);
        Ok(())
    }
}
