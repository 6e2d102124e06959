//! Standard memory orderings for the queue's shared counters.
//!
//! Node contents never need explicit orderings: they live inside the level
//! mutexes, and the lock handoff provides the happens-before edges. Only the
//! counters read outside any level lock use these constants.

use std::sync::atomic::Ordering;

/// Ordering for publishing a size change after an operation completes.
/// Pairs with [`SIZE_READ`] in the not-empty wait predicate.
pub const SIZE_WRITE: Ordering = Ordering::Release;

/// Ordering for reading the size counter where the caller acts on the value
/// (blocking façade, drain bound).
pub const SIZE_READ: Ordering = Ordering::Acquire;

/// Ordering for best-effort snapshots (`len()`, `is_empty()`, statistics).
pub const RELAXED: Ordering = Ordering::Relaxed;

/// Ordering for the growth counter. Written while every level lock is held,
/// so relaxed is enough.
pub const GROWTH_ORD: Ordering = Ordering::Relaxed;

/// Ordering for the blocked-waiter count. A waiter registers before it polls
/// and an inserter reads the count after it publishes, so the two must not be
/// reordered against each other.
pub const WAITERS_ORD: Ordering = Ordering::SeqCst;
