//! Error types for queue construction and queue operations.
//!
//! Errors produced by an operation that was handed an item carry that item
//! back, so the caller keeps ownership of anything the queue did not accept.

use std::collections::TryReserveError;
use std::fmt;

use thiserror::Error;

/// Errors that can occur when constructing a queue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// The requested capacity was zero or negative.
    #[error("queue capacity must be positive, got {0}")]
    InvalidCapacity(i128),
    /// Slot storage could not be reserved.
    #[error("failed to allocate queue storage: {0}")]
    Alloc(#[from] TryReserveError),
}

/// The queue has been shut down; the rejected item is returned.
#[derive(Clone, Copy, PartialEq, Eq, Error)]
#[error("queue is shut down")]
pub struct Closed<T>(pub T);

impl<T> Closed<T> {
    /// Takes back the item that was not enqueued.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.0
    }
}

// Manual Debug: the item is opaque to the queue and need not be Debug.
impl<T> fmt::Debug for Closed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closed").finish_non_exhaustive()
    }
}

/// Failure of a non-blocking or time-bounded enqueue.
#[derive(Clone, Copy, PartialEq, Eq, Error)]
pub enum TryEnqueueError<T> {
    /// The queue stayed full.
    #[error("queue is full")]
    Full(T),
    /// The queue has been shut down.
    #[error("queue is shut down")]
    Closed(T),
}

impl<T> TryEnqueueError<T> {
    /// Takes back the item that was not enqueued.
    #[must_use]
    pub fn into_inner(self) -> T {
        match self {
            Self::Full(item) | Self::Closed(item) => item,
        }
    }

    /// Returns `true` if the queue was full rather than shut down.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        matches!(self, Self::Full(_))
    }

    /// Returns `true` if the queue was shut down.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Closed(_))
    }
}

impl<T> From<Closed<T>> for TryEnqueueError<T> {
    fn from(closed: Closed<T>) -> Self {
        Self::Closed(closed.0)
    }
}

impl<T> fmt::Debug for TryEnqueueError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full(_) => f.write_str("Full(..)"),
            Self::Closed(_) => f.write_str("Closed(..)"),
        }
    }
}

/// Failure of a non-blocking or time-bounded dequeue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TryDequeueError {
    /// The queue stayed empty but may still receive items.
    #[error("queue is empty")]
    Empty,
    /// The queue is shut down and fully drained; no item will ever arrive.
    #[error("queue is shut down and drained")]
    Closed,
}
