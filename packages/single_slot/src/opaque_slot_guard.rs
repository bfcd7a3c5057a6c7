use std::any::Any;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::MutexGuard;

use crate::constants::ERR_GUARD_EMPTY;
use crate::opaque_slot::OpaqueInstance;

/// Exclusive access to the instance held by an
/// [`OpaqueSlot`][crate::OpaqueSlot].
///
/// Returned by [`access()`][crate::OpaqueSlot::access]. Dereferences to
/// `dyn Any + Send`; use `downcast_ref()` and `downcast_mut()` to reach the
/// concrete type. The slot's lock is held until the guard is dropped or
/// [`release()`](Self::release)d.
///
/// # Example
///
/// ```rust
/// use std::any::Any;
///
/// use single_slot::OpaqueSlot;
///
/// let slot = OpaqueSlot::new();
/// slot.create(
///     |_| {
///         let instance: Box<dyn Any + Send> = Box::new(vec![1_u32, 2]);
///         Some(instance)
///     },
///     drop,
///     Box::new(()),
/// )
/// .unwrap();
///
/// let mut guard = slot.access();
/// guard.downcast_mut::<Vec<u32>>().unwrap().push(3);
/// assert_eq!(guard.downcast_ref::<Vec<u32>>().unwrap().len(), 3);
/// guard.release();
/// # slot.destroy();
/// ```
#[must_use = "the slot stays locked until the guard is dropped"]
pub struct OpaqueSlotGuard<'s> {
    /// Lock over the slot storage. Invariant: `Some` for as long as the
    /// guard exists - the lock is held, so nothing can empty the slot.
    inner: MutexGuard<'s, Option<OpaqueInstance>>,
}

impl<'s> OpaqueSlotGuard<'s> {
    /// Wraps an acquired lock whose slot has already been verified occupied.
    pub(crate) fn new(inner: MutexGuard<'s, Option<OpaqueInstance>>) -> Self {
        debug_assert!(inner.is_some(), "{ERR_GUARD_EMPTY}");

        Self { inner }
    }

    /// Releases the guard, unlocking the slot.
    ///
    /// Equivalent to dropping the guard.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::any::Any;
    ///
    /// use single_slot::OpaqueSlot;
    ///
    /// let slot = OpaqueSlot::new();
    /// slot.create(
    ///     |_| {
    ///         let instance: Box<dyn Any + Send> = Box::new(42_u64);
    ///         Some(instance)
    ///     },
    ///     drop,
    ///     Box::new(()),
    /// )
    /// .unwrap();
    ///
    /// let guard = slot.access();
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

impl Deref for OpaqueSlotGuard<'_> {
    type Target = dyn Any + Send;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref().expect(ERR_GUARD_EMPTY).data.as_ref()
    }
}

impl DerefMut for OpaqueSlotGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.inner.as_mut().expect(ERR_GUARD_EMPTY).data.as_mut()
    }
}

impl fmt::Debug for OpaqueSlotGuard<'_> {
    #[cfg_attr(test, mutants::skip)] // The instance is type-erased; there is nothing to show.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpaqueSlotGuard").finish_non_exhaustive()
    }
}
