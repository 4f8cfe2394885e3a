//! Lock and condition-variable types used by the queue.
//!
//! Under `--cfg loom` these resolve to `loom`'s model-checked versions so the
//! blocking protocol can be explored exhaustively; otherwise they are the
//! standard library's.

#[cfg(loom)]
pub(crate) use loom::sync::{Condvar, Mutex, MutexGuard};

#[cfg(not(loom))]
pub(crate) use std::sync::{Condvar, Mutex, MutexGuard};
