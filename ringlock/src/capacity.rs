//! Validated queue capacity.

use std::num::NonZeroUsize;

use crate::error::QueueError;

/// Number of slots in a queue. Always at least one.
///
/// Built from unsigned or signed integers; zero and negative values are
/// rejected with [`QueueError::InvalidCapacity`], so a zero-length ring can
/// never be constructed.
///
/// ```
/// use ringlock::Capacity;
///
/// assert_eq!(Capacity::try_from(5usize).unwrap().get(), 5);
/// assert!(Capacity::try_from(0i64).is_err());
/// assert!(Capacity::try_from(-5i32).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Capacity(NonZeroUsize);

impl Capacity {
    /// Returns `None` for zero.
    #[must_use]
    pub const fn new(slots: usize) -> Option<Self> {
        match NonZeroUsize::new(slots) {
            Some(n) => Some(Self(n)),
            None => None,
        }
    }

    #[must_use]
    pub const fn get(self) -> usize {
        self.0.get()
    }
}

impl From<NonZeroUsize> for Capacity {
    fn from(n: NonZeroUsize) -> Self {
        Self(n)
    }
}

impl From<Capacity> for usize {
    fn from(capacity: Capacity) -> Self {
        capacity.get()
    }
}

impl TryFrom<usize> for Capacity {
    type Error = QueueError;

    fn try_from(slots: usize) -> Result<Self, QueueError> {
        Self::new(slots).ok_or(QueueError::InvalidCapacity(slots as i128))
    }
}

macro_rules! capacity_from_signed {
    ($($int:ty),* $(,)?) => {
        $(
            impl TryFrom<$int> for Capacity {
                type Error = QueueError;

                fn try_from(slots: $int) -> Result<Self, QueueError> {
                    usize::try_from(slots)
                        .ok()
                        .and_then(Self::new)
                        .ok_or(QueueError::InvalidCapacity(slots as i128))
                }
            }
        )*
    };
}

capacity_from_signed!(i32, i64, isize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_capacity() {
        assert_eq!(Capacity::try_from(1usize).map(Capacity::get), Ok(1));
        assert_eq!(Capacity::try_from(10i64).map(Capacity::get), Ok(10));
        assert_eq!(Capacity::try_from(3i32).map(Capacity::get), Ok(3));
        assert_eq!(Capacity::try_from(7isize).map(Capacity::get), Ok(7));
    }

    #[test]
    fn test_zero_rejected() {
        assert_eq!(Capacity::new(0), None);
        assert_eq!(
            Capacity::try_from(0usize),
            Err(QueueError::InvalidCapacity(0))
        );
        assert_eq!(Capacity::try_from(0i64), Err(QueueError::InvalidCapacity(0)));
    }

    #[test]
    fn test_negative_rejected() {
        assert_eq!(
            Capacity::try_from(-5i32),
            Err(QueueError::InvalidCapacity(-5))
        );
        assert_eq!(
            Capacity::try_from(i64::MIN),
            Err(QueueError::InvalidCapacity(i128::from(i64::MIN)))
        );
    }
}
