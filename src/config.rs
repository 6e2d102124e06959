//! Queue construction parameters and the growth policy.

use crate::error::QueueError;
use crate::heap;

/// Slot count used by [`QueueConfig::default`]: a full tree of four levels.
pub const DEFAULT_CAPACITY: usize = 15;

/// Upper bound on the slot count of any queue.
///
/// Keeps the tree at most 62 levels deep on 64-bit targets, and keeps every
/// capacity and free-capacity count well inside `u64`.
pub const MAX_CAPACITY: usize = usize::MAX >> 2;

/// Below this slot count growth roughly doubles the array; above it the
/// array grows by half.
pub const SMALL_CAPACITY_THRESHOLD: usize = 64;

/// Configuration for a [`PipelinedQueue`](crate::PipelinedQueue).
///
/// ```rust
/// use pipeheap::QueueConfig;
///
/// let config = QueueConfig::default()
///     .initial_capacity(1)
///     .max_capacity(1024);
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueConfig {
    /// Number of heap slots allocated up front. Must be greater than zero.
    pub initial_capacity: usize,

    /// Growth never takes the slot count past this value.
    pub max_capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_CAPACITY,
            max_capacity: MAX_CAPACITY,
        }
    }
}

impl QueueConfig {
    /// Set the initial slot count.
    #[must_use]
    pub const fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Set the maximum slot count.
    #[must_use]
    pub const fn max_capacity(mut self, capacity: usize) -> Self {
        self.max_capacity = capacity;
        self
    }

    /// Check the parameters.
    ///
    /// # Errors
    /// [`QueueError::InvalidArgument`] if the initial capacity is zero, if
    /// the maximum is smaller than the initial capacity, or if the maximum
    /// exceeds [`MAX_CAPACITY`].
    pub const fn validate(&self) -> Result<(), QueueError> {
        if self.initial_capacity == 0 {
            return Err(QueueError::InvalidArgument(
                "initial capacity must be greater than zero",
            ));
        }

        if self.max_capacity > MAX_CAPACITY {
            return Err(QueueError::InvalidArgument(
                "maximum capacity exceeds the supported tree height",
            ));
        }

        if self.max_capacity < self.initial_capacity {
            return Err(QueueError::InvalidArgument(
                "maximum capacity is smaller than the initial capacity",
            ));
        }

        Ok(())
    }

    /// Height of the tree this configuration starts with.
    #[must_use]
    pub const fn initial_height(&self) -> usize {
        heap::height_for(self.initial_capacity)
    }
}

/// Slot count after one growth step from `current`.
///
/// Small arrays grow by `current + 2`, larger ones by half, and the result is
/// clamped to `max`.
///
/// # Errors
/// [`QueueError::CapacityExhausted`] if not even one more slot fits under `max`.
pub const fn next_capacity(current: usize, max: usize) -> Result<usize, QueueError> {
    let step: usize = if current < SMALL_CAPACITY_THRESHOLD {
        current + 2
    } else {
        current >> 1
    };

    let wanted: usize = current.saturating_add(step);
    if wanted <= max {
        return Ok(wanted);
    }

    if current >= max {
        return Err(QueueError::CapacityExhausted { capacity: current });
    }

    Ok(max)
}
