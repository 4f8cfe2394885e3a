//! Fixed-size ring buffer holding the queued items.
//!
//! Not synchronized: the queue keeps the ring behind its mutex and never
//! touches it otherwise.
//!
//! Occupied slots are exactly `head, head + 1, .., head + len - 1` modulo the
//! capacity; every other slot is `None`.

use crate::capacity::Capacity;
use crate::error::QueueError;

pub(crate) struct Ring<T> {
    slots: Box<[Option<T>]>,
    /// Next slot to remove from.
    head: usize,
    /// Next slot to fill.
    tail: usize,
    len: usize,
}

impl<T> Ring<T> {
    /// Allocates `capacity` empty slots.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Alloc`] if the slot storage cannot be reserved.
    pub(crate) fn with_capacity(capacity: Capacity) -> Result<Self, QueueError> {
        let slots_len = capacity.get();
        let mut slots = Vec::new();
        slots.try_reserve_exact(slots_len)?;
        slots.resize_with(slots_len, || None);

        Ok(Self {
            slots: slots.into_boxed_slice(),
            head: 0,
            tail: 0,
            len: 0,
        })
    }

    /// Advances a cursor by one slot, wrapping to 0 at capacity.
    #[inline]
    fn bump(&self, cursor: usize) -> usize {
        let next = cursor + 1;
        if next == self.slots.len() { 0 } else { next }
    }

    #[inline]
    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub(crate) const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }

    /// Stores `item` at the tail.
    ///
    /// # Errors
    ///
    /// Returns `Err(item)` if every slot is occupied.
    pub(crate) fn push(&mut self, item: T) -> Result<(), T> {
        if self.is_full() {
            return Err(item);
        }
        let slot = &mut self.slots[self.tail];
        debug_assert!(slot.is_none(), "tail slot must be vacant");
        *slot = Some(item);
        self.tail = self.bump(self.tail);
        self.len += 1;
        Ok(())
    }

    /// Removes the item at the head.
    pub(crate) fn pop(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let item = self.slots[self.head].take();
        debug_assert!(item.is_some(), "head slot must be occupied");
        self.head = self.bump(self.head);
        self.len -= 1;
        item
    }

    /// Removes every item, oldest first.
    pub(crate) fn drain(&mut self) -> Vec<T> {
        let mut items = Vec::with_capacity(self.len);
        while let Some(item) = self.pop() {
            items.push(item);
        }
        items
    }
}
