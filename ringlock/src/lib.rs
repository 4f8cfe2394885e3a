//! Fixed-capacity blocking FIFO queue with cooperative shutdown.
//!
//! [`BoundedQueue`] is a ring buffer behind one mutex and two condition
//! variables. Producers block while it is full, consumers block while it is
//! empty, and [`BoundedQueue::shutdown`] releases everyone: producers get
//! their item back, consumers drain what is left and then see `None`.
//!
//! The [`driver`] module runs a configurable producer/consumer workload on
//! top of the queue; the `ringlock-driver` binary is its command-line front
//! end.

pub mod capacity;
pub mod driver;
pub mod error;
pub mod queue;

mod ring;
mod sync;
mod trace;

pub use capacity::Capacity;
pub use error::{Closed, QueueError, TryDequeueError, TryEnqueueError};
#[cfg(not(loom))]
pub use queue::Timeout;
pub use queue::BoundedQueue;
pub use trace::init_tracing;
