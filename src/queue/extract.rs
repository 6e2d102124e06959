//! Lock-coupled sift-down-on-remove.
//!
//! Taking the root leaves a vacancy at index 0. Each step pulls the greater
//! occupied child up into the vacancy, which moves the vacancy one level down,
//! until the vacancy has no occupied children. Every slot the vacancy passes
//! through gains one unit of free capacity.

use crate::compare::Comparator;
use crate::heap;
use crate::level::Coupling;
use crate::node::Node;
use crate::ordering::SIZE_WRITE;
use crate::tracing_helpers::{error_log, trace_log};

use super::PipelinedQueue;

/// Outcome of one extraction step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtractStep {
    /// The vacancy has no occupied children; the traversal is over.
    Settled,
    /// The vacancy moved into the next level.
    Descend,
}

impl<E, C: Comparator<E>> PipelinedQueue<E, C> {
    /// Remove and return the maximum element, or `None` if the queue is empty.
    ///
    /// Never waits for elements; see [`take`](Self::take) for that.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip_all))]
    pub fn try_extract_max(&self) -> Option<E> {
        let mut coupling: Coupling<E> = Coupling::enter(&self.table);

        let root: &mut Node<E> = coupling.current().node_mut(0)?;
        if !root.is_occupied() {
            return None;
        }

        let max: Option<E> = root.vacate();
        root.release_capacity();
        self.size.fetch_sub(1, SIZE_WRITE);
        coupling.current().token().park(None, 0);

        while self.extract_step(&mut coupling) == ExtractStep::Descend {
            if !coupling.advance() {
                break;
            }
        }

        drop(coupling);
        max
    }

    /// Alias of [`try_extract_max`](Self::try_extract_max).
    #[inline]
    pub fn poll(&self) -> Option<E> {
        self.try_extract_max()
    }

    /// Move the vacancy parked at the current level one level down.
    fn extract_step(&self, coupling: &mut Coupling<E>) -> ExtractStep {
        let (current, ahead) = coupling.pair();
        let Some(below) = ahead else {
            return ExtractStep::Settled;
        };

        let position: usize = current.token().position();
        let offset: usize = heap::offset_in_level(position);

        let left: Option<&E> = below.node(2 * offset).and_then(Node::element);
        let right: Option<&E> = below.node(2 * offset + 1).and_then(Node::element);

        let take_right: bool = match (left, right) {
            (None, None) => {
                trace_log!(position, "extract: settled");
                return ExtractStep::Settled;
            }
            (Some(_), None) => false,
            (None, Some(_)) => true,
            (Some(left), Some(right)) => self.comparator.greater(right, left),
        };

        let child_offset: usize = 2 * offset + usize::from(take_right);
        let child_position: usize = 2 * position + 1 + usize::from(take_right);

        let promoted: Option<E> = below.node_mut(child_offset).and_then(|child| {
            let element = child.vacate();
            child.release_capacity();
            element
        });

        match (promoted, current.node_mut(offset)) {
            (Some(element), Some(vacancy)) => vacancy.fill(element),
            _ => {
                error_log!(position, child_position, "extract: promotion lost its source or target");
                debug_assert!(false, "extract could not promote {child_position} into {position}");
                return ExtractStep::Settled;
            }
        }

        below.token().park(None, child_position);
        ExtractStep::Descend
    }
}
