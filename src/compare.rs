//! Element ordering used by the heap.
//!
//! The queue is a max-queue under its [`Comparator`]. [`NaturalOrder`] uses
//! `E: Ord`; any `Fn(&E, &E) -> Ordering` closure works as a custom total
//! order (reverse it to get a min-queue).

use std::cmp;

/// A total order over `E`.
///
/// Shared by every thread operating on the queue, hence `Send + Sync`.
pub trait Comparator<E>: Send + Sync {
    /// Compare two elements.
    fn compare(&self, a: &E, b: &E) -> cmp::Ordering;

    /// True if `a` sorts strictly after `b`, i.e. `a` belongs closer to the root.
    #[inline]
    fn greater(&self, a: &E, b: &E) -> bool {
        self.compare(a, b) == cmp::Ordering::Greater
    }
}

/// Orders elements by their [`Ord`] implementation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NaturalOrder;

impl<E: Ord> Comparator<E> for NaturalOrder {
    #[inline]
    fn compare(&self, a: &E, b: &E) -> cmp::Ordering {
        a.cmp(b)
    }
}

impl<E, F> Comparator<E> for F
where
    F: Fn(&E, &E) -> cmp::Ordering + Send + Sync,
{
    #[inline]
    fn compare(&self, a: &E, b: &E) -> cmp::Ordering {
        self(a, b)
    }
}

/// Inverts another comparator. `PipelinedQueue<E, Reversed<NaturalOrder>>`
/// is a min-queue.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Reversed<C>(pub C);

impl<E, C: Comparator<E>> Comparator<E> for Reversed<C> {
    #[inline]
    fn compare(&self, a: &E, b: &E) -> cmp::Ordering {
        self.0.compare(b, a)
    }
}
