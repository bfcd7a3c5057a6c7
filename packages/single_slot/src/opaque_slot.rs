use std::any::Any;
use std::fmt;
use std::sync::Mutex;

use crate::OpaqueSlotGuard;
use crate::constants::{ERR_ALREADY_CREATED, ERR_NOT_CREATED, ERR_POISONED_LOCK};
use crate::error::ConstructError;

/// The owned, type-erased instance stored by an [`OpaqueSlot`].
pub type OpaqueValue = Box<dyn Any + Send>;

/// The opaque construction-argument payload handed to a construct closure.
///
/// The slot does not interpret the payload; its layout is entirely defined
/// by the caller-supplied construct closure that receives it.
pub type ConstructArgs = Box<dyn Any + Send>;

/// The construct closure stored by an [`OpaqueSlot`].
///
/// Returning `None` signals construction failure; the slot is then left
/// empty.
pub type ConstructFn = Box<dyn Fn(ConstructArgs) -> Option<OpaqueValue> + Send>;

/// The destroy closure stored by an [`OpaqueSlot`], invoked on every
/// destroy with the owned instance.
pub type DestroyFn = Box<dyn Fn(OpaqueValue) + Send>;

/// The occupied state: the owned instance together with the closures
/// captured at first create. The construct closure is reused by every
/// reset, the destroy closure by every destroy.
pub(crate) struct OpaqueInstance {
    pub(crate) data: OpaqueValue,
    pub(crate) construct: ConstructFn,
    pub(crate) destroy: DestroyFn,
}

/// A thread-safe slot holding at most one type-erased instance, with
/// caller-supplied construct and destroy operations.
///
/// This is the non-generic counterpart of [`SingleSlot`][crate::SingleSlot],
/// for places where generic parameterization is unavailable - plugin
/// registries, C-style subsystem handles, heterogeneous configuration. The
/// slot stores the instance as a [`Box<dyn Any + Send>`] plus the two
/// closures supplied at [`create()`](Self::create); construction arguments
/// travel as an opaque [`ConstructArgs`] payload that only the construct
/// closure knows how to unpack.
///
/// The lifecycle contract is identical to the typed form: create into an
/// empty slot, guarded access, reset, destroy, with precondition violations
/// panicking. The one recoverable condition is the construct closure
/// returning `None`, which leaves the slot empty.
///
/// # Example
///
/// ```rust
/// use single_slot::OpaqueSlot;
///
/// struct Database {
///     connections: u32,
/// }
///
/// static DATABASE: OpaqueSlot = OpaqueSlot::new();
///
/// DATABASE
///     .create(
///         |args| {
///             let connections = *args.downcast::<u32>().ok()?;
///             let instance: Box<dyn std::any::Any + Send> =
///                 Box::new(Database { connections });
///             Some(instance)
///         },
///         drop,
///         Box::new(8_u32),
///     )
///     .unwrap();
///
/// {
///     let guard = DATABASE.access();
///     let database = guard.downcast_ref::<Database>().unwrap();
///     assert_eq!(database.connections, 8);
/// }
///
/// DATABASE.destroy();
/// ```
///
/// # Thread Safety
///
/// The slot is [`Send`] and [`Sync`]; the stored instance and both closures
/// must be [`Send`] so any thread may destroy or reset. For a variant
/// without those bounds (and without a mutex), see
/// [`LocalOpaqueSlot`][crate::LocalOpaqueSlot].
pub struct OpaqueSlot {
    /// The slot storage. `None` means empty. The mutex orders every
    /// create/reset/destroy/access sequence.
    inner: Mutex<Option<OpaqueInstance>>,
}

impl OpaqueSlot {
    /// Creates a new, empty slot.
    ///
    /// This is a `const fn`, so a slot can be placed in a `static`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use single_slot::OpaqueSlot;
    ///
    /// let slot = OpaqueSlot::new();
    /// assert!(!slot.is_occupied());
    /// ```
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }

    /// Constructs the slot's instance with `construct(args)`, capturing both
    /// closures for the lifetime of the slot.
    ///
    /// The construct closure runs while the slot is locked. On success the
    /// instance and both closures are stored: the destroy closure runs on
    /// every [`destroy()`](Self::destroy) and the construct closure is
    /// reused by every [`reset()`](Self::reset).
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::any::Any;
    ///
    /// use single_slot::OpaqueSlot;
    ///
    /// let slot = OpaqueSlot::new();
    ///
    /// slot.create(
    ///     |args| {
    ///         let greeting = *args.downcast::<&str>().ok()?;
    ///         let instance: Box<dyn Any + Send> = Box::new(greeting.to_uppercase());
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
    /// `None`; the slot is left empty and both closures are released, so a
    /// subsequent create is legal.
    ///
    /// # Panics
    ///
    /// Panics if the slot already holds an instance.
    pub fn create<C, D>(
        &self,
        construct: C,
        destroy: D,
        args: ConstructArgs,
    ) -> Result<(), ConstructError>
    where
        C: Fn(ConstructArgs) -> Option<OpaqueValue> + Send + 'static,
        D: Fn(OpaqueValue) + Send + 'static,
    {
        let mut slot = self.inner.lock().expect(ERR_POISONED_LOCK);
        assert!(slot.is_none(), "{ERR_ALREADY_CREATED}");

        let construct: ConstructFn = Box::new(construct);
        let destroy: DestroyFn = Box::new(destroy);

        match construct(args) {
            Some(data) => {
                *slot = Some(OpaqueInstance {
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
    /// Under a single lock acquisition the stored destroy closure runs on
    /// the current instance and the stored construct closure runs with the
    /// new `args`; no other thread can observe an empty slot in between.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::any::Any;
    ///
    /// use single_slot::OpaqueSlot;
    ///
    /// let slot = OpaqueSlot::new();
    ///
    /// let make_counter = |args: Box<dyn Any + Send>| {
    ///     let start = *args.downcast::<u64>().ok()?;
    ///     let instance: Box<dyn Any + Send> = Box::new(start);
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
    /// Panics if the slot does not hold an instance.
    pub fn reset(&self, args: ConstructArgs) -> Result<(), ConstructError> {
        let mut slot = self.inner.lock().expect(ERR_POISONED_LOCK);

        let OpaqueInstance {
            data,
            construct,
            destroy,
        } = slot.take().expect(ERR_NOT_CREATED);

        destroy(data);

        match construct(args) {
            Some(data) => {
                *slot = Some(OpaqueInstance {
                    data,
                    construct,
                    destroy,
                });
                Ok(())
            }
            None => Err(ConstructError::NoInstance),
        }
    }

    /// Locks the slot and returns a guard dereferencing to the instance as
    /// `dyn Any + Send`.
    ///
    /// The lock is held until the returned [`OpaqueSlotGuard`] is dropped
    /// or [`release()`](OpaqueSlotGuard::release)d; downcasting to the
    /// concrete type is the caller's business. Calling `access()` again on
    /// the same thread before that deadlocks: the mutex is not re-entrant.
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
    /// let mut guard = slot.access();
    /// *guard.downcast_mut::<u64>().unwrap() += 1;
    /// assert_eq!(*guard.downcast_ref::<u64>().unwrap(), 43);
    /// guard.release();
    /// # slot.destroy();
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the slot does not hold an instance.
    #[must_use]
    pub fn access(&self) -> OpaqueSlotGuard<'_> {
        let slot = self.inner.lock().expect(ERR_POISONED_LOCK);
        assert!(slot.is_some(), "{ERR_NOT_CREATED}");

        OpaqueSlotGuard::new(slot)
    }

    /// Invokes the stored destroy closure on the instance and marks the
    /// slot empty.
    ///
    /// Blocks until any outstanding access guard on another thread has been
    /// released. Afterwards, [`create()`](Self::create) is legal again.
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
    /// slot.destroy();
    /// assert!(!slot.is_occupied());
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the slot does not hold an instance.
    pub fn destroy(&self) {
        let mut slot = self.inner.lock().expect(ERR_POISONED_LOCK);

        let OpaqueInstance { data, destroy, .. } = slot.take().expect(ERR_NOT_CREATED);

        destroy(data);
    }

    /// Whether the slot currently holds an instance.
    ///
    /// Briefly acquires the lock; the answer may be stale by the time the
    /// caller acts on it.
    ///
    /// # Example
    ///
    /// ```rust
    /// use single_slot::OpaqueSlot;
    ///
    /// let slot = OpaqueSlot::new();
    /// assert!(!slot.is_occupied());
    /// ```
    #[must_use]
    pub fn is_occupied(&self) -> bool {
        self.inner.lock().expect(ERR_POISONED_LOCK).is_some()
    }
}

impl Default for OpaqueSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for OpaqueSlot {
    #[cfg_attr(test, mutants::skip)] // Same shape as the SingleSlot impl, which is tested.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Debug must never block; if the slot is locked we report that instead.
        let occupied = self.inner.try_lock().map(|slot| slot.is_some()).ok();

        f.debug_struct("OpaqueSlot")
            .field("occupied", &occupied)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;

    assert_impl_all!(OpaqueSlot: Send, Sync);
    assert_not_impl_any!(OpaqueSlot: Clone, Copy);

    /// A construct closure that unpacks a `u64` payload and counts its
    /// invocations, so tests can observe closure reuse across resets.
    fn counting_construct(
        invocations: Arc<AtomicUsize>,
    ) -> impl Fn(ConstructArgs) -> Option<OpaqueValue> + Send + 'static {
        move |args| {
            invocations.fetch_add(1, Ordering::SeqCst);
            let value = *args.downcast::<u64>().ok()?;
            let instance: OpaqueValue = Box::new(value);
            Some(instance)
        }
    }

    /// A destroy closure that counts its invocations.
    fn counting_destroy(invocations: Arc<AtomicUsize>) -> impl Fn(OpaqueValue) + Send + 'static {
        move |data| {
            invocations.fetch_add(1, Ordering::SeqCst);
            drop(data);
        }
    }

    #[test]
    fn create_then_access_yields_value() {
        let slot = OpaqueSlot::new();

        slot.create(
            counting_construct(Arc::new(AtomicUsize::new(0))),
            drop,
            Box::new(42_u64),
        )
        .unwrap();

        assert_eq!(*slot.access().downcast_ref::<u64>().unwrap(), 42);
        slot.destroy();
    }

    #[test]
    fn construct_sees_its_args_payload() {
        let slot = OpaqueSlot::new();

        // The payload layout is whatever the construct closure expects.
        slot.create(
            |args| {
                let (label, count) = *args.downcast::<(&str, u32)>().ok()?;
                let instance: OpaqueValue = Box::new(format!("{label}:{count}"));
                Some(instance)
            },
            drop,
            Box::new(("workers", 4_u32)),
        )
        .unwrap();

        assert_eq!(
            slot.access().downcast_ref::<String>().unwrap(),
            "workers:4"
        );
        slot.destroy();
    }

    #[test]
    fn failed_construction_leaves_slot_empty() {
        let slot = OpaqueSlot::new();

        let result = slot.create(|_| None, drop, Box::new(()));

        assert!(matches!(result, Err(ConstructError::NoInstance)));
        assert!(!slot.is_occupied());

        // The failure is recoverable: create is legal again.
        slot.create(
            counting_construct(Arc::new(AtomicUsize::new(0))),
            drop,
            Box::new(1_u64),
        )
        .unwrap();
        assert!(slot.is_occupied());
        slot.destroy();
    }

    #[test]
    fn destroy_invokes_stored_destroy_closure_once() {
        let destroys = Arc::new(AtomicUsize::new(0));

        let slot = OpaqueSlot::new();
        slot.create(
            counting_construct(Arc::new(AtomicUsize::new(0))),
            counting_destroy(Arc::clone(&destroys)),
            Box::new(1_u64),
        )
        .unwrap();

        assert_eq!(destroys.load(Ordering::SeqCst), 0);
        slot.destroy();
        assert_eq!(destroys.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reset_reuses_captured_closures() {
        let constructs = Arc::new(AtomicUsize::new(0));
        let destroys = Arc::new(AtomicUsize::new(0));

        let slot = OpaqueSlot::new();
        slot.create(
            counting_construct(Arc::clone(&constructs)),
            counting_destroy(Arc::clone(&destroys)),
            Box::new(1_u64),
        )
        .unwrap();

        slot.reset(Box::new(2_u64)).unwrap();

        // The construct closure captured at create ran again and the
        // captured destroy ran on the replaced instance.
        assert_eq!(constructs.load(Ordering::SeqCst), 2);
        assert_eq!(destroys.load(Ordering::SeqCst), 1);
        assert_eq!(*slot.access().downcast_ref::<u64>().unwrap(), 2);

        slot.destroy();
        assert_eq!(destroys.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn failed_reset_leaves_slot_empty() {
        let slot = OpaqueSlot::new();

        // Constructs only from a u64 payload; anything else fails.
        slot.create(
            counting_construct(Arc::new(AtomicUsize::new(0))),
            drop,
            Box::new(1_u64),
        )
        .unwrap();

        let result = slot.reset(Box::new("wrong payload"));

        assert!(matches!(result, Err(ConstructError::NoInstance)));
        assert!(!slot.is_occupied());
    }

    #[test]
    #[should_panic(expected = "already holds an instance")]
    fn create_twice_panics() {
        let slot = OpaqueSlot::new();
        slot.create(
            counting_construct(Arc::new(AtomicUsize::new(0))),
            drop,
            Box::new(1_u64),
        )
        .unwrap();

        _ = slot.create(
            counting_construct(Arc::new(AtomicUsize::new(0))),
            drop,
            Box::new(2_u64),
        );
    }

    #[test]
    #[should_panic(expected = "does not hold an instance")]
    fn access_on_empty_panics() {
        let slot = OpaqueSlot::new();
        _ = slot.access();
    }

    #[test]
    #[should_panic(expected = "does not hold an instance")]
    fn destroy_on_empty_panics() {
        let slot = OpaqueSlot::new();
        slot.destroy();
    }

    #[test]
    #[should_panic(expected = "does not hold an instance")]
    fn reset_on_empty_panics() {
        let slot = OpaqueSlot::new();
        _ = slot.reset(Box::new(1_u64));
    }

    #[test]
    fn guard_mutation_is_visible_after_release() {
        let slot = OpaqueSlot::new();
        slot.create(
            counting_construct(Arc::new(AtomicUsize::new(0))),
            drop,
            Box::new(1_u64),
        )
        .unwrap();

        {
            let mut guard = slot.access();
            *guard.downcast_mut::<u64>().unwrap() = 9;
        }

        assert_eq!(*slot.access().downcast_ref::<u64>().unwrap(), 9);
        slot.destroy();
    }

    #[test]
    fn shared_across_threads() {
        let slot = Arc::new(OpaqueSlot::new());
        slot.create(
            counting_construct(Arc::new(AtomicUsize::new(0))),
            drop,
            Box::new(0_u64),
        )
        .unwrap();

        let threads: Vec<_> = (0..4)
            .map(|_| {
                let slot = Arc::clone(&slot);
                thread::spawn(move || {
                    for _ in 0..50 {
                        let mut guard = slot.access();
                        *guard.downcast_mut::<u64>().unwrap() += 1;
                    }
                })
            })
            .collect();

        for thread in threads {
            thread.join().unwrap();
        }

        assert_eq!(*slot.access().downcast_ref::<u64>().unwrap(), 200);
        slot.destroy();
    }

    #[test]
    fn default_is_empty() {
        let slot = OpaqueSlot::default();
        assert!(!slot.is_occupied());
    }
}
