//! Bounded blocking FIFO queue for in-process (inter-thread) communication.
//!
//! A fixed-size ring buffer guarded by a single mutex, with two condition
//! variables: producers wait on `not_full`, consumers on `not_empty`.
//!
//! # Overview
//!
//! - [`BoundedQueue::enqueue`] blocks while the queue is full (backpressure)
//! - [`BoundedQueue::dequeue`] blocks while the queue is empty
//! - [`BoundedQueue::shutdown`] wakes every blocked thread; afterwards
//!   enqueues are rejected and dequeues drain what is left, then return `None`
//!
//! Share the queue between threads with an [`Arc`](std::sync::Arc).
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::thread;
//!
//! use ringlock::BoundedQueue;
//!
//! let queue = Arc::new(BoundedQueue::new(2).unwrap());
//!
//! let consumer = {
//!     let queue = Arc::clone(&queue);
//!     thread::spawn(move || {
//!         let mut seen = Vec::new();
//!         while let Some(item) = queue.dequeue() {
//!             seen.push(item);
//!         }
//!         seen
//!     })
//! };
//!
//! for i in 0..10 {
//!     queue.enqueue(i).unwrap();
//! }
//! queue.shutdown();
//!
//! assert_eq!(consumer.join().unwrap(), (0..10).collect::<Vec<_>>());
//! ```
//!
//! # Shutdown
//!
//! Shutdown is one-way and idempotent. It does not clear the buffer: items
//! enqueued before shutdown are still handed out in order, so consumers can
//! loop on `dequeue()` until `None` without losing work.

use std::sync::PoisonError;
#[cfg(not(loom))]
use std::time::Duration;

#[cfg(not(loom))]
use minstant::Instant;

use crate::capacity::Capacity;
use crate::error::{Closed, QueueError, TryDequeueError, TryEnqueueError};
use crate::ring::Ring;
use crate::sync::{Condvar, Mutex, MutexGuard};
use crate::trace::{debug, trace};

/// How long a time-bounded operation may wait.
#[cfg(not(loom))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    /// Wait indefinitely.
    Infinite,
    /// Wait for at most the specified duration.
    Duration(Duration),
}

#[cfg(not(loom))]
impl From<Duration> for Timeout {
    fn from(d: Duration) -> Self {
        Self::Duration(d)
    }
}

#[cfg(not(loom))]
impl Timeout {
    fn deadline(self) -> Option<Instant> {
        match self {
            Self::Infinite => None,
            Self::Duration(d) => Some(Instant::now() + d),
        }
    }
}

/// Everything the mutex protects.
struct State<T> {
    ring: Ring<T>,
    /// Monotonic: set once by `shutdown` (or drop), never cleared.
    shutdown: bool,
}

/// Fixed-capacity, multi-producer multi-consumer blocking FIFO queue.
///
/// All operations take `&self`; the queue is `Sync` whenever `T: Send`.
pub struct BoundedQueue<T> {
    state: Mutex<State<T>>,
    /// Signalled when a slot frees up (and broadcast on shutdown).
    not_full: Condvar,
    /// Signalled when an item arrives (and broadcast on shutdown).
    not_empty: Condvar,
    capacity: Capacity,
}

impl<T> BoundedQueue<T> {
    /// Creates an empty queue with `capacity` slots.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::InvalidCapacity`] if `capacity` is zero and
    /// [`QueueError::Alloc`] if the slot storage cannot be allocated.
    pub fn new(capacity: usize) -> Result<Self, QueueError> {
        Self::with_capacity(Capacity::try_from(capacity)?)
    }

    /// Creates an empty queue from an already validated capacity.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Alloc`] if the slot storage cannot be allocated.
    pub fn with_capacity(capacity: Capacity) -> Result<Self, QueueError> {
        let ring = Ring::with_capacity(capacity)?;
        debug_assert_eq!(ring.capacity(), capacity.get());
        debug!(capacity = capacity.get(), "queue created");

        Ok(Self {
            state: Mutex::new(State {
                ring,
                shutdown: false,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            capacity,
        })
    }

    /// Number of slots, fixed at construction.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity.get()
    }

    // No user code runs while the lock is held, so the state is consistent
    // even if another thread panicked with the guard alive.
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait<'a>(
        &self,
        cond: &Condvar,
        guard: MutexGuard<'a, State<T>>,
    ) -> MutexGuard<'a, State<T>> {
        cond.wait(guard).unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts into a non-full ring and wakes one consumer.
    fn insert(&self, state: &mut State<T>, item: T) -> Result<(), TryEnqueueError<T>> {
        if state.shutdown {
            trace!("enqueue rejected: queue is shut down");
            return Err(TryEnqueueError::Closed(item));
        }
        state.ring.push(item).map_err(TryEnqueueError::Full)?;
        self.not_empty.notify_one();
        Ok(())
    }

    /// Removes the head item and wakes one producer.
    fn remove(&self, state: &mut State<T>) -> Result<T, TryDequeueError> {
        match state.ring.pop() {
            Some(item) => {
                self.not_full.notify_one();
                Ok(item)
            }
            None if state.shutdown => Err(TryDequeueError::Closed),
            None => Err(TryDequeueError::Empty),
        }
    }

    /// Appends `item` at the tail, blocking while the queue is full.
    ///
    /// # Errors
    ///
    /// Returns `Err(Closed(item))` if the queue is shut down on entry or
    /// while waiting for space. The item is not enqueued and ownership goes
    /// back to the caller.
    pub fn enqueue(&self, item: T) -> Result<(), Closed<T>> {
        let mut state = self.lock();
        while state.ring.is_full() && !state.shutdown {
            state = self.wait(&self.not_full, state);
        }
        match self.insert(&mut state, item) {
            Ok(()) => Ok(()),
            Err(TryEnqueueError::Closed(item)) => Err(Closed(item)),
            Err(TryEnqueueError::Full(_)) => {
                unreachable!("wait loop exits only with a free slot or after shutdown")
            }
        }
    }

    /// Removes the head item, blocking while the queue is empty.
    ///
    /// Returns `None` only once the queue is shut down *and* drained; this is
    /// the consumer's termination signal.
    #[must_use]
    pub fn dequeue(&self) -> Option<T> {
        let mut state = self.lock();
        while state.ring.is_empty() && !state.shutdown {
            state = self.wait(&self.not_empty, state);
        }
        self.remove(&mut state).ok()
    }

    /// Appends `item` without blocking.
    ///
    /// # Errors
    ///
    /// Returns `Full(item)` if no slot is free and `Closed(item)` if the
    /// queue is shut down.
    pub fn try_enqueue(&self, item: T) -> Result<(), TryEnqueueError<T>> {
        let mut state = self.lock();
        self.insert(&mut state, item)
    }

    /// Removes the head item without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`TryDequeueError::Empty`] if no item is queued and
    /// [`TryDequeueError::Closed`] if the queue is shut down and drained.
    pub fn try_dequeue(&self) -> Result<T, TryDequeueError> {
        let mut state = self.lock();
        self.remove(&mut state)
    }

    /// Shuts the queue down and wakes every blocked producer and consumer.
    ///
    /// Idempotent. Queued items stay available to `dequeue`.
    pub fn shutdown(&self) {
        let mut state = self.lock();
        if !state.shutdown {
            state.shutdown = true;
            debug!(remaining = state.ring.len(), "queue shut down");
        }
        self.not_full.notify_all();
        self.not_empty.notify_all();
    }

    /// Snapshot: `true` if no item is queued.
    ///
    /// The answer may be stale as soon as it is returned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().ring.is_empty()
    }

    /// Snapshot: `true` if every slot is occupied.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.lock().ring.is_full()
    }

    /// Snapshot: number of queued items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().ring.len()
    }

    /// Snapshot: `true` once [`shutdown`](Self::shutdown) has been called.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.lock().shutdown
    }

    /// Shuts the queue down and returns the undelivered items, oldest first.
    #[must_use]
    pub fn into_remaining(self) -> Vec<T> {
        let mut state = self.lock();
        state.shutdown = true;
        let items = state.ring.drain();
        drop(state);
        items
    }
}

#[cfg(not(loom))]
impl<T> BoundedQueue<T> {
    /// Waits on `cond` until notified or `deadline` passes.
    ///
    /// Returns `None` once the deadline has passed, with the guard dropped.
    fn wait_until<'a>(
        &self,
        cond: &Condvar,
        guard: MutexGuard<'a, State<T>>,
        deadline: Option<Instant>,
    ) -> Option<MutexGuard<'a, State<T>>> {
        let Some(deadline) = deadline else {
            return Some(self.wait(cond, guard));
        };
        let now = Instant::now();
        if now >= deadline {
            return None;
        }
        let (guard, _) = cond
            .wait_timeout(guard, deadline - now)
            .unwrap_or_else(PoisonError::into_inner);
        Some(guard)
    }

    /// Appends `item`, waiting at most `timeout` for a free slot.
    ///
    /// # Errors
    ///
    /// Returns `Full(item)` on timeout and `Closed(item)` if the queue is or
    /// becomes shut down.
    pub fn enqueue_timeout(&self, item: T, timeout: Timeout) -> Result<(), TryEnqueueError<T>> {
        let deadline = timeout.deadline();
        let mut state = self.lock();
        while state.ring.is_full() && !state.shutdown {
            match self.wait_until(&self.not_full, state, deadline) {
                Some(guard) => state = guard,
                None => return Err(TryEnqueueError::Full(item)),
            }
        }
        self.insert(&mut state, item)
    }

    /// Removes the head item, waiting at most `timeout` for one to arrive.
    ///
    /// # Errors
    ///
    /// Returns [`TryDequeueError::Empty`] on timeout and
    /// [`TryDequeueError::Closed`] if the queue is shut down and drained.
    pub fn dequeue_timeout(&self, timeout: Timeout) -> Result<T, TryDequeueError> {
        let deadline = timeout.deadline();
        let mut state = self.lock();
        while state.ring.is_empty() && !state.shutdown {
            match self.wait_until(&self.not_empty, state, deadline) {
                Some(guard) => state = guard,
                None => return Err(TryDequeueError::Empty),
            }
        }
        self.remove(&mut state)
    }
}

impl<T> Drop for BoundedQueue<T> {
    fn drop(&mut self) {
        // Exclusive access means no thread can be parked here, but keep the
        // shutdown state and wakeups consistent with an explicit shutdown.
        let mut state = self.lock();
        state.shutdown = true;
        debug!(undelivered = state.ring.len(), "queue dropped");
        drop(state);
        self.not_full.notify_all();
        self.not_empty.notify_all();
    }
}

impl<T> std::fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("BoundedQueue")
            .field("capacity", &self.capacity())
            .field("len", &state.ring.len())
            .field("shutdown", &state.shutdown)
            .finish()
    }
}
