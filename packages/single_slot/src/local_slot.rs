use std::cell::RefCell;
use std::fmt;

use crate::LocalSlotGuard;
use crate::constants::{ERR_ALREADY_CREATED, ERR_NOT_CREATED};

/// A single-threaded slot holding at most one instance of `T`.
///
/// This is the no-locking variant of [`SingleSlot`][crate::SingleSlot]: the
/// same lifecycle contract (create, guarded access, reset, destroy, with
/// precondition violations panicking), but no mutex exists at all and no
/// operation ever blocks. Single-threaded use is enforced by the type system
/// rather than left to the caller: the slot is not [`Sync`], so sharing it
/// across threads is a compile error.
///
/// Misuse that would deadlock the thread-safe variant is *detected* here:
/// calling any slot operation while an access guard is still alive panics
/// with a borrow error instead of hanging.
///
/// # Example
///
/// ```rust
/// use single_slot::LocalSingleSlot;
///
/// let slot = LocalSingleSlot::new();
///
/// slot.create(String::from("hello"));
///
/// {
///     let mut guard = slot.access();
///     guard.push_str(", world");
/// }
///
/// slot.reset(String::from("fresh"));
/// assert_eq!(*slot.access(), "fresh");
///
/// slot.destroy();
/// assert!(!slot.is_occupied());
/// ```
pub struct LocalSingleSlot<T> {
    /// The slot storage. `None` means empty. `RefCell` stands in for the
    /// mutex of the thread-safe variant; a conflicting borrow is a caller
    /// bug and panics.
    value: RefCell<Option<T>>,
}

impl<T> LocalSingleSlot<T> {
    /// Creates a new, empty slot.
    ///
    /// This is a `const fn`, so a slot can be placed in a `thread_local!`
    /// or any other single-threaded home without lazy initialization.
    ///
    /// # Example
    ///
    /// ```rust
    /// use single_slot::LocalSingleSlot;
    ///
    /// let slot = LocalSingleSlot::<u64>::new();
    /// assert!(!slot.is_occupied());
    /// ```
    #[must_use]
    pub const fn new() -> Self {
        Self {
            value: RefCell::new(None),
        }
    }

    /// Stores `value` as the slot's instance.
    ///
    /// # Example
    ///
    /// ```rust
    /// use single_slot::LocalSingleSlot;
    ///
    /// let slot = LocalSingleSlot::new();
    /// slot.create(42_u64);
    ///
    /// assert_eq!(*slot.access(), 42);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the slot already holds an instance, or if an access guard
    /// from this slot is still alive.
    pub fn create(&self, value: T) {
        self.create_with(|| value);
    }

    /// Constructs the slot's instance by running `factory`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use single_slot::LocalSingleSlot;
    ///
    /// let slot = LocalSingleSlot::new();
    /// slot.create_with(|| vec![1, 2, 3]);
    ///
    /// assert_eq!(slot.access().len(), 3);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the slot already holds an instance, or if an access guard
    /// from this slot is still alive.
    pub fn create_with<F>(&self, factory: F)
    where
        F: FnOnce() -> T,
    {
        let mut slot = self.value.borrow_mut();
        assert!(slot.is_none(), "{ERR_ALREADY_CREATED}");

        *slot = Some(factory());
    }

    /// Constructs the slot's instance with a fallible factory.
    ///
    /// On error the slot remains empty, the error is returned to the caller
    /// and a subsequent create call is legal.
    ///
    /// # Example
    ///
    /// ```rust
    /// use single_slot::LocalSingleSlot;
    ///
    /// let slot = LocalSingleSlot::<u32>::new();
    ///
    /// assert!(slot.try_create_with(|| "oops".parse::<u32>()).is_err());
    /// assert!(!slot.is_occupied());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns whatever error `factory` returns; the slot is left empty.
    ///
    /// # Panics
    ///
    /// Panics if the slot already holds an instance, or if an access guard
    /// from this slot is still alive.
    pub fn try_create_with<F, E>(&self, factory: F) -> Result<(), E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let mut slot = self.value.borrow_mut();
        assert!(slot.is_none(), "{ERR_ALREADY_CREATED}");

        *slot = Some(factory()?);
        Ok(())
    }

    /// Replaces the current instance with `value`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use single_slot::LocalSingleSlot;
    ///
    /// let slot = LocalSingleSlot::new();
    /// slot.create(1_u64);
    /// slot.reset(2_u64);
    ///
    /// assert_eq!(*slot.access(), 2);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the slot does not hold an instance, or if an access guard
    /// from this slot is still alive.
    pub fn reset(&self, value: T) {
        self.reset_with(|| value);
    }

    /// Replaces the current instance with one produced by `factory`.
    ///
    /// The old instance is dropped before the factory runs.
    ///
    /// # Example
    ///
    /// ```rust
    /// use single_slot::LocalSingleSlot;
    ///
    /// let slot = LocalSingleSlot::new();
    /// slot.create(vec![1]);
    /// slot.reset_with(|| vec![1, 2, 3]);
    ///
    /// assert_eq!(slot.access().len(), 3);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the slot does not hold an instance, or if an access guard
    /// from this slot is still alive.
    pub fn reset_with<F>(&self, factory: F)
    where
        F: FnOnce() -> T,
    {
        let mut slot = self.value.borrow_mut();
        assert!(slot.is_some(), "{ERR_NOT_CREATED}");

        *slot = None;
        *slot = Some(factory());
    }

    /// Returns a guard dereferencing to the instance.
    ///
    /// The slot is exclusively borrowed for the guard's lifetime. Calling
    /// `access()` again before the first guard is dropped panics - the
    /// single-threaded variant detects the re-entrant access that would
    /// deadlock [`SingleSlot`][crate::SingleSlot].
    ///
    /// # Example
    ///
    /// ```rust
    /// use single_slot::LocalSingleSlot;
    ///
    /// let slot = LocalSingleSlot::new();
    /// slot.create(String::from("data"));
    ///
    /// let mut guard = slot.access();
    /// guard.make_ascii_uppercase();
    /// assert_eq!(*guard, "DATA");
    /// guard.release();
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the slot does not hold an instance, or if an access guard
    /// from this slot is still alive.
    #[must_use]
    pub fn access(&self) -> LocalSlotGuard<'_, T> {
        let slot = self.value.borrow_mut();
        assert!(slot.is_some(), "{ERR_NOT_CREATED}");

        LocalSlotGuard::new(slot)
    }

    /// Drops the current instance and marks the slot empty.
    ///
    /// # Example
    ///
    /// ```rust
    /// use single_slot::LocalSingleSlot;
    ///
    /// let slot = LocalSingleSlot::new();
    /// slot.create(42_u64);
    /// slot.destroy();
    ///
    /// assert!(!slot.is_occupied());
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the slot does not hold an instance, or if an access guard
    /// from this slot is still alive.
    pub fn destroy(&self) {
        let mut slot = self.value.borrow_mut();
        assert!(slot.is_some(), "{ERR_NOT_CREATED}");

        *slot = None;
    }

    /// Whether the slot currently holds an instance.
    ///
    /// # Example
    ///
    /// ```rust
    /// use single_slot::LocalSingleSlot;
    ///
    /// let slot = LocalSingleSlot::<u64>::new();
    /// assert!(!slot.is_occupied());
    ///
    /// slot.create(42);
    /// assert!(slot.is_occupied());
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if an access guard from this slot is still alive.
    #[must_use]
    pub fn is_occupied(&self) -> bool {
        self.value.borrow().is_some()
    }
}

impl<T> Default for LocalSingleSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for LocalSingleSlot<T> {
    #[cfg_attr(test, mutants::skip)] // Same shape as the SingleSlot impl, which is tested.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Debug must not panic on a borrowed slot; report what we can see.
        let occupied = self.value.try_borrow().map(|slot| slot.is_some()).ok();

        f.debug_struct("LocalSingleSlot")
            .field("occupied", &occupied)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;

    // Single-threaded only: sharing across threads must not compile.
    assert_not_impl_any!(LocalSingleSlot<u64>: Sync, Clone);
    // The slot itself may still move to another thread as a whole.
    assert_impl_all!(LocalSingleSlot<u64>: Send);

    #[test]
    fn create_then_access_yields_value() {
        let slot = LocalSingleSlot::new();
        slot.create(42_u64);

        assert_eq!(*slot.access(), 42);
    }

    #[test]
    fn holds_non_send_values() {
        // No Send bound anywhere: Rc is fine here.
        let slot = LocalSingleSlot::new();
        slot.create(Rc::new(5_u64));

        assert_eq!(**slot.access(), 5);
        slot.destroy();
    }

    #[test]
    #[should_panic(expected = "already holds an instance")]
    fn create_twice_panics() {
        let slot = LocalSingleSlot::new();
        slot.create(1_u64);
        slot.create(2_u64);
    }

    #[test]
    #[should_panic(expected = "does not hold an instance")]
    fn access_on_empty_panics() {
        let slot = LocalSingleSlot::<u64>::new();
        _ = slot.access();
    }

    #[test]
    #[should_panic(expected = "does not hold an instance")]
    fn destroy_on_empty_panics() {
        let slot = LocalSingleSlot::<u64>::new();
        slot.destroy();
    }

    #[test]
    #[should_panic(expected = "does not hold an instance")]
    fn reset_on_empty_panics() {
        let slot = LocalSingleSlot::<u64>::new();
        slot.reset(1);
    }

    #[test]
    #[should_panic(expected = "already borrowed")]
    fn reentrant_access_is_detected() {
        let slot = LocalSingleSlot::new();
        slot.create(1_u64);

        let guard = slot.access();
        // Second access while the first guard is alive. The thread-safe
        // variant would deadlock; this one panics.
        let second = slot.access();

        drop(second);
        drop(guard);
    }

    #[test]
    #[should_panic(expected = "already borrowed")]
    fn destroy_under_guard_is_detected() {
        let slot = LocalSingleSlot::new();
        slot.create(1_u64);

        let guard = slot.access();
        slot.destroy();
        drop(guard);
    }

    #[test]
    fn lifecycle_cycles() {
        let slot = LocalSingleSlot::new();

        for round in 0..3_u64 {
            slot.create(round);
            assert_eq!(*slot.access(), round);
            slot.reset(round + 10);
            assert_eq!(*slot.access(), round + 10);
            slot.destroy();
            assert!(!slot.is_occupied());
        }
    }

    #[test]
    fn try_create_with_failure_leaves_slot_empty() {
        let slot = LocalSingleSlot::<u32>::new();

        assert!(slot.try_create_with(|| "oops".parse::<u32>()).is_err());
        assert!(!slot.is_occupied());

        slot.try_create_with(|| "7".parse::<u32>()).unwrap();
        assert_eq!(*slot.access(), 7);
    }

    #[test]
    fn default_is_empty() {
        let slot = LocalSingleSlot::<u64>::default();
        assert!(!slot.is_occupied());
    }
}
