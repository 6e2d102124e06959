//! Error types returned by the queue.

use std::fmt as StdFmt;

// ============================================================================
//  QueueError
// ============================================================================

/// Errors that can occur while building or growing a queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// A construction parameter was rejected.
    ///
    /// Raised for a zero initial capacity or a maximum capacity smaller than
    /// the initial one.
    InvalidArgument(&'static str),

    /// The backing array cannot grow past the configured maximum.
    ///
    /// Fatal only for the insert that needed the growth. Extraction, and
    /// inserts that find free capacity, keep working.
    CapacityExhausted {
        /// Slot count at the time growth was refused.
        capacity: usize,
    },
}

impl StdFmt::Display for QueueError {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        match self {
            Self::InvalidArgument(reason) => write!(f, "invalid argument: {reason}"),

            Self::CapacityExhausted { capacity } => {
                write!(f, "capacity exhausted: cannot grow beyond {capacity} slots")
            }
        }
    }
}

impl std::error::Error for QueueError {}

// ============================================================================
//  InsertError
// ============================================================================

/// A rejected insert. Hands the element back to the caller.
#[derive(Clone, PartialEq, Eq)]
pub struct InsertError<E> {
    element: E,
    error: QueueError,
}

impl<E> InsertError<E> {
    pub(crate) const fn new(element: E, error: QueueError) -> Self {
        Self { element, error }
    }

    /// The reason the insert was rejected.
    #[must_use]
    pub const fn error(&self) -> &QueueError {
        &self.error
    }

    /// Take back the element that was not inserted.
    #[must_use]
    pub fn into_element(self) -> E {
        self.element
    }

    /// Split into the element and the reason.
    #[must_use]
    pub fn into_parts(self) -> (E, QueueError) {
        (self.element, self.error)
    }
}

// Manual impl: the element type need not be Debug.
impl<E> StdFmt::Debug for InsertError<E> {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        f.debug_struct("InsertError")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<E> StdFmt::Display for InsertError<E> {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        write!(f, "insert rejected: {}", self.error)
    }
}

impl<E> std::error::Error for InsertError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl<E> From<InsertError<E>> for QueueError {
    fn from(err: InsertError<E>) -> Self {
        err.error
    }
}
