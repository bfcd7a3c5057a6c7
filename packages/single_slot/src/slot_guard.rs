use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::MutexGuard;

use crate::constants::ERR_GUARD_EMPTY;

/// Exclusive access to the instance held by a [`SingleSlot`][crate::SingleSlot].
///
/// Returned by [`access()`][crate::SingleSlot::access]. The slot's lock is
/// held for the guard's entire lifetime, so the caller can perform several
/// operations on the instance without interleaving from other threads.
/// Dropping the guard releases the lock; [`release()`](Self::release) does
/// the same with an explicit name.
///
/// A guard can never outlive its slot and can never exist for an empty slot,
/// which is what makes "unlock without a matching lock" and "use after
/// destroy" unrepresentable.
///
/// # Example
///
/// ```rust
/// use single_slot::SingleSlot;
///
/// let slot = SingleSlot::new();
/// slot.create(vec![1, 2]);
///
/// let mut guard = slot.access();
/// guard.push(3);
/// assert_eq!(guard.len(), 3);
/// guard.release();
/// ```
#[must_use = "the slot stays locked until the guard is dropped"]
pub struct SlotGuard<'s, T> {
    /// Lock over the slot storage. Invariant: `Some` for as long as the
    /// guard exists - the lock is held, so nothing can empty the slot.
    inner: MutexGuard<'s, Option<T>>,
}

impl<'s, T> SlotGuard<'s, T> {
    /// Wraps an acquired lock whose slot has already been verified occupied.
    pub(crate) fn new(inner: MutexGuard<'s, Option<T>>) -> Self {
        debug_assert!(inner.is_some(), "{ERR_GUARD_EMPTY}");

        Self { inner }
    }

    /// Releases the guard, unlocking the slot.
    ///
    /// Equivalent to dropping the guard; provided so the unlock reads as an
    /// explicit step at call sites that want one.
    ///
    /// # Example
    ///
    /// ```rust
    /// use single_slot::SingleSlot;
    ///
    /// let slot = SingleSlot::new();
    /// slot.create(42_u64);
    ///
    /// let guard = slot.access();
    /// assert_eq!(*guard, 42);
    /// guard.release();
    ///
    /// // The slot is unlocked again; lifecycle operations proceed.
    /// slot.destroy();
    /// ```
    #[inline]
    pub fn release(self) {
        drop(self);
    }
}

impl<T> Deref for SlotGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref().expect(ERR_GUARD_EMPTY)
    }
}

impl<T> DerefMut for SlotGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.inner.as_mut().expect(ERR_GUARD_EMPTY)
    }
}

impl<T: fmt::Debug> fmt::Debug for SlotGuard<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SlotGuard").field(&**self).finish()
    }
}

#[cfg(test)]
mod tests {
    use static_assertions::assert_not_impl_any;

    use crate::{SingleSlot, SlotGuard};

    // The guard pins the lock to the acquiring thread.
    assert_not_impl_any!(SlotGuard<'static, u64>: Send);

    #[test]
    fn deref_reads_the_instance() {
        let slot = SingleSlot::new();
        slot.create(String::from("value"));

        let guard = slot.access();
        assert_eq!(guard.as_str(), "value");
    }

    #[test]
    fn deref_mut_writes_the_instance() {
        let slot = SingleSlot::new();
        slot.create(10_u64);

        let mut guard = slot.access();
        *guard += 1;
        drop(guard);

        assert_eq!(*slot.access(), 11);
    }

    #[test]
    fn debug_shows_the_instance() {
        let slot = SingleSlot::new();
        slot.create(7_u64);

        let guard = slot.access();
        assert_eq!(format!("{guard:?}"), "SlotGuard(7)");
    }
}
