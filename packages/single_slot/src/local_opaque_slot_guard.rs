use std::any::Any;
use std::cell::RefMut;
use std::fmt;
use std::ops::{Deref, DerefMut};

use crate::constants::ERR_GUARD_EMPTY;
use crate::local_opaque_slot::LocalOpaqueInstance;

/// Exclusive access to the instance held by a
/// [`LocalOpaqueSlot`][crate::LocalOpaqueSlot].
///
/// Returned by [`access()`][crate::LocalOpaqueSlot::access]. Dereferences
/// to `dyn Any`; use `downcast_ref()` and `downcast_mut()` to reach the
/// concrete type. The slot is exclusively borrowed until the guard is
/// dropped or [`release()`](Self::release)d.
///
/// # Example
///
/// ```rust
/// use std::any::Any;
///
/// use single_slot::LocalOpaqueSlot;
///
/// let slot = LocalOpaqueSlot::new();
/// slot.create(
///     |_| {
///         let instance: Box<dyn Any> = Box::new(vec![1_u32, 2]);
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
#[must_use = "the slot stays borrowed until the guard is dropped"]
pub struct LocalOpaqueSlotGuard<'s> {
    /// Borrow of the slot storage. Invariant: `Some` for as long as the
    /// guard exists.
    inner: RefMut<'s, Option<LocalOpaqueInstance>>,
}

impl<'s> LocalOpaqueSlotGuard<'s> {
    /// Wraps an exclusive borrow whose slot has already been verified
    /// occupied.
    pub(crate) fn new(inner: RefMut<'s, Option<LocalOpaqueInstance>>) -> Self {
        debug_assert!(inner.is_some(), "{ERR_GUARD_EMPTY}");

        Self { inner }
    }

    /// Releases the guard, ending the borrow of the slot.
    ///
    /// Equivalent to dropping the guard.
    #[inline]
    pub fn release(self) {
        drop(self);
    }
}

impl Deref for LocalOpaqueSlotGuard<'_> {
    type Target = dyn Any;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref().expect(ERR_GUARD_EMPTY).data.as_ref()
    }
}

impl DerefMut for LocalOpaqueSlotGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.inner.as_mut().expect(ERR_GUARD_EMPTY).data.as_mut()
    }
}

impl fmt::Debug for LocalOpaqueSlotGuard<'_> {
    #[cfg_attr(test, mutants::skip)] // The instance is type-erased; there is nothing to show.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalOpaqueSlotGuard").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use static_assertions::assert_not_impl_any;

    use crate::{LocalOpaqueSlot, LocalOpaqueSlotGuard, LocalOpaqueValue};

    // The guard is a single-threaded borrow and may not leave its thread.
    assert_not_impl_any!(LocalOpaqueSlotGuard<'static>: Send);

    #[test]
    fn downcast_reaches_the_instance() {
        let slot = LocalOpaqueSlot::new();
        slot.create(
            |_| {
                let instance: LocalOpaqueValue = Box::new(String::from("value"));
                Some(instance)
            },
            drop,
            Box::new(()),
        )
        .unwrap();

        let mut guard = slot.access();
        assert_eq!(guard.downcast_ref::<String>().unwrap(), "value");

        guard.downcast_mut::<String>().unwrap().push('!');
        assert_eq!(guard.downcast_ref::<String>().unwrap(), "value!");

        drop(guard);
        slot.destroy();
    }
}
