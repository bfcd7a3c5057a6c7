use std::any::Any;
use std::cell::RefCell;
use std::fmt;

use crate::LocalOpaqueSlotGuard;
use crate::constants::{ERR_ALREADY_CREATED, ERR_NOT_CREATED};
use crate::error::ConstructError;

/// The owned, type-erased instance stored by a [`LocalOpaqueSlot`].
pub type LocalOpaqueValue = Box<dyn Any>;

/// The opaque construction-argument payload handed to a construct closure
/// of a [`LocalOpaqueSlot`].
pub type LocalConstructArgs = Box<dyn Any>;

/// The construct closure stored by a [`LocalOpaqueSlot`].
///
/// Returning `None` signals construction failure; the slot is then left
/// empty.
pub type LocalConstructFn = Box<dyn Fn(LocalConstructArgs) -> Option<LocalOpaqueValue>>;

/// The destroy closure stored by a [`LocalOpaqueSlot`], invoked on every
/// destroy with the owned instance.
pub type LocalDestroyFn = Box<dyn Fn(LocalOpaqueValue)>;

/// The occupied state: the owned instance together with the closures
/// captured at first create.
pub(crate) struct LocalOpaqueInstance {
    pub(crate) data: LocalOpaqueValue,
    pub(crate) construct: LocalConstructFn,
    pub(crate) destroy: LocalDestroyFn,
}

/// A single-threaded slot holding at most one type-erased instance, with
/// caller-supplied construct and destroy operations.
///
/// This is the no-locking variant of [`OpaqueSlot`][crate::OpaqueSlot]: the
/// same lifecycle contract, but no mutex exists, no operation ever blocks,
/// and neither the instance nor the closures need to be [`Send`].
/// Single-threaded use is enforced by the slot not being [`Sync`].
///
/// Misuse that would deadlock the thread-safe variant is *detected* here:
/// calling any slot operation while an access guard is still alive panics
/// with a borrow error instead of hanging.
///
/// # Example
///
/// ```rust
/// use std::any::Any;
/// use std::rc::Rc;
///
/// use single_slot::LocalOpaqueSlot;
///
/// let slot = LocalOpaqueSlot::new();
///
/// // Non-Send instances are fine in the single-threaded variant.
/// slot.create(
///     |args| {
///         let value = *args.downcast::<u64>().ok()?;
///         let instance: Box<dyn Any> = Box::new(Rc::new(value));
///         Some(instance)
///     },
///     drop,
///     Box::new(42_u64),
/// )
/// .unwrap();
///
/// {
///     let guard = slot.access();
///     assert_eq!(**guard.downcast_ref::<Rc<u64>>().unwrap(), 42);
/// }
///
/// slot.destroy();
/// ```
pub struct LocalOpaqueSlot {
    /// The slot storage. `None` means empty. `RefCell` stands in for the
    /// mutex of the thread-safe variant.
    inner: RefCell<Option<LocalOpaqueInstance>>,
}

impl LocalOpaqueSlot {
    /// Creates a new, empty slot.
    ///
    /// This is a `const fn`, so a slot can be placed in a `thread_local!`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use single_slot::LocalOpaqueSlot;
    ///
    /// let slot = LocalOpaqueSlot::new();
    /// assert!(!slot.is_occupied());
    /// ```
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: RefCell::new(None),
        }
    }

    /// Constructs the slot's instance with `construct(args)`, capturing both
    /// closures for the lifetime of the slot.
    ///
    /// On success the instance and both closures are stored: the destroy
    /// closure runs on every [`destroy()`](Self::destroy) and the construct
    /// closure is reused by every [`reset()`](Self::reset).
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::any::Any;
    ///
    /// use single_slot::LocalOpaqueSlot;
    ///
    /// let slot = LocalOpaqueSlot::new();
    ///
    /// slot.create(
    ///     |args| {
    ///         let greeting = *args.downcast::<&str>().ok()?;
    ///         let instance: Box<dyn Any> = Box::new(greeting.to_uppercase());
    ///         Some(instance)
    ///     },
    ///     drop,
    ///     Box::new("hello"),
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(slot.access().downcast_ref::<String>().unwrap(), "HELLO");
    /// # slot.destroy();
    /// ```
    ///
    /// # Errors
    ///
    /// [`ConstructError::NoInstance`] if the construct closure returns
    /// `None`; the slot is left empty and both closures are released.
    ///
    /// # Panics
    ///
    /// Panics if the slot already holds an instance, or if an access guard
    /// from this slot is still alive.
    pub fn create<C, D>(
        &self,
        construct: C,
        destroy: D,
        args: LocalConstructArgs,
    ) -> Result<(), ConstructError>
    where
        C: Fn(LocalConstructArgs) -> Option<LocalOpaqueValue> + 'static,
        D: Fn(LocalOpaqueValue) + 'static,
    {
        let mut slot = self.inner.borrow_mut();
        assert!(slot.is_none(), "{ERR_ALREADY_CREATED}");

        let construct: LocalConstructFn = Box::new(construct);
        let destroy: LocalDestroyFn = Box::new(destroy);

        match construct(args) {
            Some(data) => {
                *slot = Some(LocalOpaqueInstance {
                    data,
                    construct,
                    destroy,
                });
                Ok(())
            }
            None => Err(ConstructError::NoInstance),
        }
    }

    /// Replaces the current instance, reusing the closures captured at
    /// create.
    ///
    /// The stored destroy closure runs on the current instance, then the
    /// stored construct closure runs with the new `args`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::any::Any;
    ///
    /// use single_slot::LocalOpaqueSlot;
    ///
    /// let slot = LocalOpaqueSlot::new();
    ///
    /// let make_counter = |args: Box<dyn Any>| {
    ///     let start = *args.downcast::<u64>().ok()?;
    ///     let instance: Box<dyn Any> = Box::new(start);
    ///     Some(instance)
    /// };
    ///
    /// slot.create(make_counter, drop, Box::new(1_u64)).unwrap();
    /// slot.reset(Box::new(2_u64)).unwrap();
    ///
    /// assert_eq!(*slot.access().downcast_ref::<u64>().unwrap(), 2);
    /// # slot.destroy();
    /// ```
    ///
    /// # Errors
    ///
    /// [`ConstructError::NoInstance`] if the construct closure returns
    /// `None`. The prior instance has already been destroyed at that point,
    /// so the slot is left empty - the same post-state as a failed create.
    ///
    /// # Panics
    ///
    /// Panics if the slot does not hold an instance, or if an access guard
    /// from this slot is still alive.
    pub fn reset(&self, args: LocalConstructArgs) -> Result<(), ConstructError> {
        let mut slot = self.inner.borrow_mut();

        let LocalOpaqueInstance {
            data,
            construct,
            destroy,
        } = slot.take().expect(ERR_NOT_CREATED);

        destroy(data);

        match construct(args) {
            Some(data) => {
                *slot = Some(LocalOpaqueInstance {
                    data,
                    construct,
                    destroy,
                });
                Ok(())
            }
            None => Err(ConstructError::NoInstance),
        }
    }

    /// Returns a guard dereferencing to the instance as `dyn Any`.
    ///
    /// The slot is exclusively borrowed for the guard's lifetime. Calling
    /// `access()` again before the first guard is dropped panics.
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
    ///         let instance: Box<dyn Any> = Box::new(42_u64);
    ///         Some(instance)
    ///     },
    ///     drop,
    ///     Box::new(()),
    /// )
    /// .unwrap();
    ///
    /// let mut guard = slot.access();
    /// *guard.downcast_mut::<u64>().unwrap() += 1;
    /// assert_eq!(*guard.downcast_ref::<u64>().unwrap(), 43);
    /// guard.release();
    /// # slot.destroy();
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the slot does not hold an instance, or if an access guard
    /// from this slot is still alive.
    #[must_use]
    pub fn access(&self) -> LocalOpaqueSlotGuard<'_> {
        let slot = self.inner.borrow_mut();
        assert!(slot.is_some(), "{ERR_NOT_CREATED}");

        LocalOpaqueSlotGuard::new(slot)
    }

    /// Invokes the stored destroy closure on the instance and marks the
    /// slot empty.
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
    ///         let instance: Box<dyn Any> = Box::new(42_u64);
    ///         Some(instance)
    ///     },
    ///     drop,
    ///     Box::new(()),
    /// )
    /// .unwrap();
    ///
    /// slot.destroy();
    /// assert!(!slot.is_occupied());
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the slot does not hold an instance, or if an access guard
    /// from this slot is still alive.
    pub fn destroy(&self) {
        let mut slot = self.inner.borrow_mut();

        let LocalOpaqueInstance { data, destroy, .. } = slot.take().expect(ERR_NOT_CREATED);

        destroy(data);
    }

    /// Whether the slot currently holds an instance.
    ///
    /// # Example
    ///
    /// ```rust
    /// use single_slot::LocalOpaqueSlot;
    ///
    /// let slot = LocalOpaqueSlot::new();
    /// assert!(!slot.is_occupied());
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if an access guard from this slot is still alive.
    #[must_use]
    pub fn is_occupied(&self) -> bool {
        self.inner.borrow().is_some()
    }
}

impl Default for LocalOpaqueSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LocalOpaqueSlot {
    #[cfg_attr(test, mutants::skip)] // Same shape as the SingleSlot impl, which is tested.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Debug must not panic on a borrowed slot; report what we can see.
        let occupied = self.inner.try_borrow().map(|slot| slot.is_some()).ok();

        f.debug_struct("LocalOpaqueSlot")
            .field("occupied", &occupied)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;

    // Single-threaded only: sharing across threads must not compile. The
    // stored closures need not be Send either, so the slot is not Send.
    assert_not_impl_any!(LocalOpaqueSlot: Send, Sync, Clone);
    assert_impl_all!(LocalOpaqueSlot: Default);

    #[test]
    fn create_then_access_yields_value() {
        let slot = LocalOpaqueSlot::new();

        slot.create(
            |args| {
                let value = *args.downcast::<u64>().ok()?;
                let instance: LocalOpaqueValue = Box::new(value);
                Some(instance)
            },
            drop,
            Box::new(42_u64),
        )
        .unwrap();

        assert_eq!(*slot.access().downcast_ref::<u64>().unwrap(), 42);
        slot.destroy();
    }

    #[test]
    fn holds_non_send_instances_and_closures() {
        let destroys = Rc::new(Cell::new(0_u32));

        let slot = LocalOpaqueSlot::new();
        slot.create(
            |_| {
                let instance: LocalOpaqueValue = Box::new(Rc::new(5_u64));
                Some(instance)
            },
            {
                let destroys = Rc::clone(&destroys);
                move |data| {
                    destroys.set(destroys.get() + 1);
                    drop(data);
                }
            },
            Box::new(()),
        )
        .unwrap();

        assert_eq!(**slot.access().downcast_ref::<Rc<u64>>().unwrap(), 5);

        slot.destroy();
        assert_eq!(destroys.get(), 1);
    }

    #[test]
    fn reset_reuses_captured_closures() {
        let constructs = Rc::new(Cell::new(0_u32));

        let slot = LocalOpaqueSlot::new();
        slot.create(
            {
                let constructs = Rc::clone(&constructs);
                move |args| {
                    constructs.set(constructs.get() + 1);
                    let value = *args.downcast::<u64>().ok()?;
                    let instance: LocalOpaqueValue = Box::new(value);
                    Some(instance)
                }
            },
            drop,
            Box::new(1_u64),
        )
        .unwrap();

        slot.reset(Box::new(2_u64)).unwrap();

        assert_eq!(constructs.get(), 2);
        assert_eq!(*slot.access().downcast_ref::<u64>().unwrap(), 2);
        slot.destroy();
    }

    #[test]
    fn failed_construction_leaves_slot_empty() {
        let slot = LocalOpaqueSlot::new();

        let result = slot.create(|_| None, drop, Box::new(()));

        assert!(matches!(result, Err(ConstructError::NoInstance)));
        assert!(!slot.is_occupied());
    }

    #[test]
    #[should_panic(expected = "already holds an instance")]
    fn create_twice_panics() {
        let slot = LocalOpaqueSlot::new();
        slot.create(
            |_| {
                let instance: LocalOpaqueValue = Box::new(1_u64);
                Some(instance)
            },
            drop,
            Box::new(()),
        )
        .unwrap();

        _ = slot.create(
            |_| {
                let instance: LocalOpaqueValue = Box::new(2_u64);
                Some(instance)
            },
            drop,
            Box::new(()),
        );
    }

    #[test]
    #[should_panic(expected = "does not hold an instance")]
    fn access_on_empty_panics() {
        let slot = LocalOpaqueSlot::new();
        _ = slot.access();
    }

    #[test]
    #[should_panic(expected = "does not hold an instance")]
    fn destroy_on_empty_panics() {
        let slot = LocalOpaqueSlot::new();
        slot.destroy();
    }

    #[test]
    #[should_panic(expected = "already borrowed")]
    fn destroy_under_guard_is_detected() {
        let slot = LocalOpaqueSlot::new();
        slot.create(
            |_| {
                let instance: LocalOpaqueValue = Box::new(1_u64);
                Some(instance)
            },
            drop,
            Box::new(()),
        )
        .unwrap();

        let guard = slot.access();
        slot.destroy();
        drop(guard);
    }
}
