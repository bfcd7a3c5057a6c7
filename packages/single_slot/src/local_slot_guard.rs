use std::cell::RefMut;
use std::fmt;
use std::ops::{Deref, DerefMut};

use crate::constants::ERR_GUARD_EMPTY;

/// Exclusive access to the instance held by a
/// [`LocalSingleSlot`][crate::LocalSingleSlot].
///
/// Returned by [`access()`][crate::LocalSingleSlot::access]. The slot is
/// exclusively borrowed for the guard's lifetime; dropping the guard (or
/// calling [`release()`](Self::release)) ends the borrow.
///
/// # Example
///
/// ```rust
/// use single_slot::LocalSingleSlot;
///
/// let slot = LocalSingleSlot::new();
/// slot.create(vec![1, 2]);
///
/// let mut guard = slot.access();
/// guard.push(3);
/// assert_eq!(guard.len(), 3);
/// guard.release();
/// ```
#[must_use = "the slot stays borrowed until the guard is dropped"]
pub struct LocalSlotGuard<'s, T> {
    /// Borrow of the slot storage. Invariant: `Some` for as long as the
    /// guard exists - the exclusive borrow keeps the slot from emptying.
    inner: RefMut<'s, Option<T>>,
}

impl<'s, T> LocalSlotGuard<'s, T> {
    /// Wraps an exclusive borrow whose slot has already been verified
    /// occupied.
    pub(crate) fn new(inner: RefMut<'s, Option<T>>) -> Self {
        debug_assert!(inner.is_some(), "{ERR_GUARD_EMPTY}");

        Self { inner }
    }

    /// Releases the guard, ending the borrow of the slot.
    ///
    /// Equivalent to dropping the guard.
    ///
    /// # Example
    ///
    /// ```rust
    /// use single_slot::LocalSingleSlot;
    ///
    /// let slot = LocalSingleSlot::new();
    /// slot.create(42_u64);
    ///
    /// let guard = slot.access();
    /// assert_eq!(*guard, 42);
    /// guard.release();
    ///
    /// slot.destroy();
    /// ```
    #[inline]
    pub fn release(self) {
        drop(self);
    }
}

impl<T> Deref for LocalSlotGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref().expect(ERR_GUARD_EMPTY)
    }
}

impl<T> DerefMut for LocalSlotGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.inner.as_mut().expect(ERR_GUARD_EMPTY)
    }
}

impl<T: fmt::Debug> fmt::Debug for LocalSlotGuard<'_, T> {
    #[cfg_attr(test, mutants::skip)] // Same shape as the SlotGuard impl, which is tested.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LocalSlotGuard").field(&**self).finish()
    }
}

#[cfg(test)]
mod tests {
    use static_assertions::assert_not_impl_any;

    use crate::{LocalSingleSlot, LocalSlotGuard};

    // The guard is a single-threaded borrow and may not leave its thread.
    assert_not_impl_any!(LocalSlotGuard<'static, u64>: Send);

    #[test]
    fn deref_reads_the_instance() {
        let slot = LocalSingleSlot::new();
        slot.create(String::from("value"));

        let guard = slot.access();
        assert_eq!(guard.as_str(), "value");
    }

    #[test]
    fn deref_mut_writes_the_instance() {
        let slot = LocalSingleSlot::new();
        slot.create(10_u64);

        let mut guard = slot.access();
        *guard += 1;
        drop(guard);

        assert_eq!(*slot.access(), 11);
    }
}
