//! Blocking façade over the non-blocking queue operations.
//!
//! Consumers that want to wait for an element park on a single
//! `parking_lot::Condvar`. Inserters pay for the wakeup only when somebody is
//! actually parked: [`NotEmpty::notify`] reads a waiter count first and skips
//! the mutex entirely when it is zero.
//!
//! # Wakeup Protocol
//! A waiter registers in the count while holding the not-empty mutex, and only
//! then re-polls the queue. An inserter publishes its element (root level
//! lock released) before it reads the count. So either the waiter's poll sees
//! the element, or the inserter sees the waiter and signals it under the same
//! mutex, after the waiter is parked. Every insert signals at most one waiter;
//! a woken waiter that leaves elements behind passes the signal on.
//!
//! Inserters take the not-empty mutex only after every level lock is
//! released, so it never nests inside the level locks.

use std::sync::atomic::AtomicUsize;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::compare::Comparator;
use crate::error::InsertError;
use crate::ordering::WAITERS_ORD;
use crate::queue::PipelinedQueue;
use crate::tracing_helpers::{debug_log, trace_log};

// ============================================================================
//  NotEmpty
// ============================================================================

/// The not-empty condition: a mutex, its condvar, and the parked-waiter count.
#[derive(Debug, Default)]
pub(crate) struct NotEmpty {
    lock: Mutex<()>,
    ready: Condvar,
    waiters: AtomicUsize,
}

impl NotEmpty {
    pub(crate) const fn new() -> Self {
        Self {
            lock: Mutex::new(()),
            ready: Condvar::new(),
            waiters: AtomicUsize::new(0),
        }
    }

    /// Signal one parked waiter, if any.
    #[inline]
    pub(crate) fn notify(&self) {
        if self.waiters.load(WAITERS_ORD) == 0 {
            return;
        }

        let _guard = self.lock.lock();
        self.ready.notify_one();
    }

    /// Consumers currently parked (or about to park).
    #[inline]
    pub(crate) fn waiters(&self) -> usize {
        self.waiters.load(WAITERS_ORD)
    }
}

// ============================================================================
//  Blocking Operations
// ============================================================================

impl<E, C: Comparator<E>> PipelinedQueue<E, C> {
    /// Remove and return the maximum element, waiting for one to arrive if the
    /// queue is empty.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip_all))]
    pub fn take(&self) -> E {
        if let Some(element) = self.try_extract_max() {
            return element;
        }

        let mut guard = self.not_empty.lock.lock();
        self.not_empty.waiters.fetch_add(1, WAITERS_ORD);

        let element: E = loop {
            if let Some(element) = self.try_extract_max() {
                break element;
            }

            trace_log!("take: parking");
            self.not_empty.ready.wait(&mut guard);
        };

        self.not_empty.waiters.fetch_sub(1, WAITERS_ORD);
        drop(guard);

        self.pass_signal();
        element
    }

    /// Like [`take`](Self::take), but gives up after `timeout`.
    ///
    /// Returns `None` if no element could be taken before the deadline.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip_all))]
    pub fn take_timeout(&self, timeout: Duration) -> Option<E> {
        if let Some(element) = self.try_extract_max() {
            return Some(element);
        }

        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return Some(self.take());
        };

        let mut guard = self.not_empty.lock.lock();
        self.not_empty.waiters.fetch_add(1, WAITERS_ORD);

        let element: Option<E> = loop {
            if let Some(element) = self.try_extract_max() {
                break Some(element);
            }

            if self.not_empty.ready.wait_until(&mut guard, deadline).timed_out() {
                // One last look: an insert may have landed just as the wait
                // expired.
                break self.try_extract_max();
            }
        };

        self.not_empty.waiters.fetch_sub(1, WAITERS_ORD);
        drop(guard);

        if element.is_some() {
            self.pass_signal();
        } else {
            debug_log!(?timeout, "take_timeout: deadline passed");
        }

        element
    }

    /// Insert `element`. The queue grows instead of filling up, so this never
    /// waits; it exists for symmetry with [`take`](Self::take).
    ///
    /// # Errors
    /// Same as [`insert`](Self::insert).
    #[inline]
    pub fn put(&self, element: E) -> Result<(), InsertError<E>> {
        self.insert(element)
    }

    /// Insert `element`. Never waits, so the timeout is not consulted.
    ///
    /// # Errors
    /// Same as [`insert`](Self::insert).
    #[inline]
    pub fn offer_timeout(&self, element: E, _timeout: Duration) -> Result<(), InsertError<E>> {
        self.insert(element)
    }

    /// Consumers currently parked in [`take`](Self::take) or
    /// [`take_timeout`](Self::take_timeout).
    #[must_use]
    pub fn blocked_consumers(&self) -> usize {
        self.not_empty.waiters()
    }

    /// Hand the wakeup on when elements remain after a successful take.
    fn pass_signal(&self) {
        if !self.is_empty() {
            self.not_empty.notify();
        }
    }
}
