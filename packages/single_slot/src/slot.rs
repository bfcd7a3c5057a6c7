use std::fmt;
use std::sync::Mutex;

use crate::SlotGuard;
use crate::constants::{ERR_ALREADY_CREATED, ERR_NOT_CREATED, ERR_POISONED_LOCK};

/// A thread-safe slot holding at most one instance of `T`, with exclusive
/// guarded access and an explicit create/reset/destroy lifecycle.
///
/// Unlike a lazily initialized cell, the slot's lifecycle is entirely in the
/// caller's hands: the instance is created, replaced and destroyed by
/// explicit calls, and every operation states its precondition. Violating a
/// precondition (creating into an occupied slot, accessing an empty one) is a
/// caller bug and panics; see the individual methods.
///
/// The slot is an ordinary value. Create it where the lifetime should be
/// visible and pass it by reference, or place it in a `static` when one
/// process-wide instance is genuinely wanted - [`new()`](Self::new) is
/// `const`, so no lazy initialization machinery is needed.
///
/// # Access model
///
/// [`access()`](Self::access) locks the slot and returns a [`SlotGuard`] that
/// dereferences to the instance. The lock is held until the guard is dropped
/// (or explicitly [`release()`](SlotGuard::release)d), so a caller can
/// perform several operations on the instance without interleaving from
/// other threads. [`destroy()`](Self::destroy) and [`reset()`](Self::reset)
/// calls from other threads block until the guard is gone.
///
/// # Example
///
/// ```rust
/// use single_slot::SingleSlot;
///
/// let slot = SingleSlot::new();
///
/// slot.create(String::from("hello"));
///
/// {
///     let mut guard = slot.access();
///     guard.push_str(", world");
///     assert_eq!(*guard, "hello, world");
/// } // guard dropped, slot unlocked
///
/// slot.reset(String::from("fresh"));
/// assert_eq!(*slot.access(), "fresh");
///
/// slot.destroy();
/// assert!(!slot.is_occupied());
/// ```
///
/// As a process-wide instance:
///
/// ```rust
/// use single_slot::SingleSlot;
///
/// static CONFIG: SingleSlot<String> = SingleSlot::new();
///
/// CONFIG.create(String::from("verbose=1"));
/// assert_eq!(*CONFIG.access(), "verbose=1");
/// # CONFIG.destroy();
/// ```
///
/// # Thread Safety
///
/// The slot is thread-safe ([`Sync`] when `T: Send`) and serializes all
/// lifecycle operations and accesses through one mutex. The slot itself
/// cannot be cloned or copied; the single instance stays exclusively owned
/// by the slot. For single-threaded use without any locking, see
/// [`LocalSingleSlot`][crate::LocalSingleSlot].
pub struct SingleSlot<T> {
    /// The slot storage. `None` means empty. The mutex orders every
    /// create/reset/destroy/access sequence; no two critical sections
    /// interleave.
    value: Mutex<Option<T>>,
}

impl<T> SingleSlot<T> {
    /// Creates a new, empty slot.
    ///
    /// This is a `const fn`, so a slot can be placed in a `static`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use single_slot::SingleSlot;
    ///
    /// let slot = SingleSlot::<u64>::new();
    /// assert!(!slot.is_occupied());
    /// ```
    #[must_use]
    pub const fn new() -> Self {
        Self {
            value: Mutex::new(None),
        }
    }

    /// Stores `value` as the slot's instance.
    ///
    /// # Example
    ///
    /// ```rust
    /// use single_slot::SingleSlot;
    ///
    /// let slot = SingleSlot::new();
    /// slot.create(42_u64);
    ///
    /// assert_eq!(*slot.access(), 42);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the slot already holds an instance. Use
    /// [`reset()`](Self::reset) to replace an existing instance.
    pub fn create(&self, value: T) {
        self.create_with(|| value);
    }

    /// Constructs the slot's instance by running `factory` while the slot is
    /// locked.
    ///
    /// Use this instead of [`create()`](Self::create) when construction
    /// itself must be ordered against concurrent lifecycle operations.
    ///
    /// # Example
    ///
    /// ```rust
    /// use single_slot::SingleSlot;
    ///
    /// let slot = SingleSlot::new();
    /// slot.create_with(|| vec![1, 2, 3]);
    ///
    /// assert_eq!(slot.access().len(), 3);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the slot already holds an instance.
    pub fn create_with<F>(&self, factory: F)
    where
        F: FnOnce() -> T,
    {
        let mut slot = self.value.lock().expect(ERR_POISONED_LOCK);
        assert!(slot.is_none(), "{ERR_ALREADY_CREATED}");

        *slot = Some(factory());
    }

    /// Constructs the slot's instance with a fallible factory.
    ///
    /// Construction failure is the one recoverable condition of the slot
    /// lifecycle: on error the slot remains empty, the error is returned to
    /// the caller and a subsequent create call is legal.
    ///
    /// # Example
    ///
    /// ```rust
    /// use single_slot::SingleSlot;
    ///
    /// let slot = SingleSlot::<u32>::new();
    ///
    /// let result = slot.try_create_with(|| "not a number".parse::<u32>());
    /// assert!(result.is_err());
    /// assert!(!slot.is_occupied());
    ///
    /// slot.try_create_with(|| "7".parse::<u32>()).unwrap();
    /// assert_eq!(*slot.access(), 7);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns whatever error `factory` returns; the slot is left empty.
    ///
    /// # Panics
    ///
    /// Panics if the slot already holds an instance.
    pub fn try_create_with<F, E>(&self, factory: F) -> Result<(), E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let mut slot = self.value.lock().expect(ERR_POISONED_LOCK);
        assert!(slot.is_none(), "{ERR_ALREADY_CREATED}");

        *slot = Some(factory()?);
        Ok(())
    }

    /// Replaces the current instance with `value`.
    ///
    /// The old instance is dropped and the new one stored under a single
    /// lock acquisition, so no other thread can observe an empty slot in
    /// between.
    ///
    /// # Example
    ///
    /// ```rust
    /// use single_slot::SingleSlot;
    ///
    /// let slot = SingleSlot::new();
    /// slot.create(1_u64);
    /// slot.reset(2_u64);
    ///
    /// assert_eq!(*slot.access(), 2);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the slot does not hold an instance. Use
    /// [`create()`](Self::create) for the first instance.
    pub fn reset(&self, value: T) {
        self.reset_with(|| value);
    }

    /// Replaces the current instance with one produced by `factory`, run
    /// while the slot is locked.
    ///
    /// The old instance is dropped before the factory runs; both steps
    /// happen inside one lock acquisition.
    ///
    /// # Example
    ///
    /// ```rust
    /// use single_slot::SingleSlot;
    ///
    /// let slot = SingleSlot::new();
    /// slot.create(vec![1]);
    /// slot.reset_with(|| vec![1, 2, 3]);
    ///
    /// assert_eq!(slot.access().len(), 3);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the slot does not hold an instance.
    pub fn reset_with<F>(&self, factory: F)
    where
        F: FnOnce() -> T,
    {
        let mut slot = self.value.lock().expect(ERR_POISONED_LOCK);
        assert!(slot.is_some(), "{ERR_NOT_CREATED}");

        // Old instance is dropped first; the lock stays held throughout.
        *slot = None;
        *slot = Some(factory());
    }

    /// Locks the slot and returns a guard dereferencing to the instance.
    ///
    /// The lock is held until the returned [`SlotGuard`] is dropped or
    /// [`release()`](SlotGuard::release)d. While the guard exists, every
    /// other lifecycle operation and access on this slot blocks.
    ///
    /// Calling `access()` again on the same thread while a guard from this
    /// slot is still alive deadlocks: the underlying mutex is not
    /// re-entrant.
    ///
    /// # Example
    ///
    /// ```rust
    /// use single_slot::SingleSlot;
    ///
    /// let slot = SingleSlot::new();
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
    /// Panics if the slot does not hold an instance.
    #[must_use]
    pub fn access(&self) -> SlotGuard<'_, T> {
        let slot = self.value.lock().expect(ERR_POISONED_LOCK);
        assert!(slot.is_some(), "{ERR_NOT_CREATED}");

        SlotGuard::new(slot)
    }

    /// Drops the current instance and marks the slot empty.
    ///
    /// Blocks until any outstanding access guard on another thread has been
    /// released. Afterwards, [`create()`](Self::create) is legal again.
    ///
    /// # Example
    ///
    /// ```rust
    /// use single_slot::SingleSlot;
    ///
    /// let slot = SingleSlot::new();
    /// slot.create(42_u64);
    /// slot.destroy();
    ///
    /// assert!(!slot.is_occupied());
    /// slot.create(43_u64);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the slot does not hold an instance.
    pub fn destroy(&self) {
        let mut slot = self.value.lock().expect(ERR_POISONED_LOCK);
        assert!(slot.is_some(), "{ERR_NOT_CREATED}");

        *slot = None;
    }

    /// Whether the slot currently holds an instance.
    ///
    /// This briefly acquires the lock, so it may block while another thread
    /// holds an access guard. The answer may be stale by the time the caller
    /// acts on it; it is a diagnostic, not a synchronization primitive.
    ///
    /// # Example
    ///
    /// ```rust
    /// use single_slot::SingleSlot;
    ///
    /// let slot = SingleSlot::<u64>::new();
    /// assert!(!slot.is_occupied());
    ///
    /// slot.create(42);
    /// assert!(slot.is_occupied());
    /// ```
    #[must_use]
    pub fn is_occupied(&self) -> bool {
        self.value.lock().expect(ERR_POISONED_LOCK).is_some()
    }
}

impl<T> Default for SingleSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SingleSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Debug must never block; if the slot is locked we report that instead.
        let occupied = self.value.try_lock().map(|slot| slot.is_some()).ok();

        f.debug_struct("SingleSlot")
            .field("occupied", &occupied)
            .finish()
    }
}

#[cfg(test)]
#[allow(
    clippy::items_after_statements,
    reason = "tests focus on succinct code and do not need to tick all the boxes"
)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, mpsc};
    use std::thread;
    use std::time::Duration;

    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;

    assert_impl_all!(SingleSlot<u64>: Send, Sync);
    assert_not_impl_any!(SingleSlot<u64>: Clone, Copy);

    #[test]
    fn create_then_access_yields_value() {
        let slot = SingleSlot::new();
        slot.create(42_u64);

        assert_eq!(*slot.access(), 42);
    }

    #[test]
    fn create_with_runs_factory() {
        let slot = SingleSlot::new();
        slot.create_with(|| String::from("made"));

        assert_eq!(*slot.access(), "made");
    }

    #[test]
    #[should_panic(expected = "already holds an instance")]
    fn create_twice_panics() {
        let slot = SingleSlot::new();
        slot.create(1_u64);
        slot.create(2_u64);
    }

    #[test]
    #[should_panic(expected = "does not hold an instance")]
    fn access_on_empty_panics() {
        let slot = SingleSlot::<u64>::new();
        _ = slot.access();
    }

    #[test]
    #[should_panic(expected = "does not hold an instance")]
    fn access_after_destroy_panics() {
        let slot = SingleSlot::new();
        slot.create(1_u64);
        slot.destroy();
        _ = slot.access();
    }

    #[test]
    #[should_panic(expected = "does not hold an instance")]
    fn destroy_on_empty_panics() {
        let slot = SingleSlot::<u64>::new();
        slot.destroy();
    }

    #[test]
    #[should_panic(expected = "does not hold an instance")]
    fn reset_on_empty_panics() {
        let slot = SingleSlot::<u64>::new();
        slot.reset(1);
    }

    #[test]
    fn destroy_then_create_again() {
        let slot = SingleSlot::new();

        // The lifecycle has no terminal state; cycling is legal.
        for round in 0..3_u64 {
            slot.create(round);
            assert_eq!(*slot.access(), round);
            slot.destroy();
            assert!(!slot.is_occupied());
        }
    }

    #[test]
    fn reset_replaces_value() {
        let slot = SingleSlot::new();
        slot.create(1_u64);
        slot.reset(2);

        assert_eq!(*slot.access(), 2);
        assert!(slot.is_occupied());
    }

    #[test]
    fn reset_drops_old_instance() {
        let drops = Arc::new(AtomicUsize::new(0));

        struct CountsDrops(Arc<AtomicUsize>);
        impl Drop for CountsDrops {
            fn drop(&mut self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let slot = SingleSlot::new();
        slot.create(CountsDrops(Arc::clone(&drops)));
        slot.reset(CountsDrops(Arc::clone(&drops)));

        assert_eq!(drops.load(Ordering::SeqCst), 1);

        slot.destroy();
        assert_eq!(drops.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn try_create_with_failure_leaves_slot_empty() {
        let slot = SingleSlot::<u32>::new();

        let result = slot.try_create_with(|| "oops".parse::<u32>());
        assert!(result.is_err());
        assert!(!slot.is_occupied());

        // A failed construction makes a later create legal again.
        slot.try_create_with(|| "7".parse::<u32>()).unwrap();
        assert_eq!(*slot.access(), 7);
    }

    #[test]
    fn guard_mutation_is_visible_after_release() {
        let slot = SingleSlot::new();
        slot.create(vec![1_u32]);

        {
            let mut guard = slot.access();
            guard.push(2);
        }

        assert_eq!(slot.access().len(), 2);
    }

    #[test]
    fn explicit_release_unlocks() {
        let slot = SingleSlot::new();
        slot.create(0_u64);

        let guard = slot.access();
        guard.release();

        // Would deadlock here if release() had not unlocked the slot.
        slot.destroy();
    }

    #[test]
    fn works_in_static() {
        static SLOT: SingleSlot<u64> = SingleSlot::new();

        SLOT.create(5);
        assert_eq!(*SLOT.access(), 5);
        SLOT.destroy();
    }

    #[test]
    fn concurrent_access_is_serialized() {
        const THREADS: u64 = 8;
        const ITERATIONS: u64 = 100;

        let slot = Arc::new(SingleSlot::new());
        slot.create(0_u64);

        let in_critical_section = Arc::new(AtomicBool::new(false));

        let threads: Vec<_> = (0..THREADS)
            .map(|_| {
                let slot = Arc::clone(&slot);
                let in_critical_section = Arc::clone(&in_critical_section);

                thread::spawn(move || {
                    for _ in 0..ITERATIONS {
                        let mut guard = slot.access();

                        // If another thread were inside its critical section
                        // right now, the sections would be interleaved.
                        assert!(!in_critical_section.swap(true, Ordering::SeqCst));
                        *guard += 1;
                        in_critical_section.store(false, Ordering::SeqCst);

                        drop(guard);
                    }
                })
            })
            .collect();

        for thread in threads {
            thread.join().unwrap();
        }

        assert_eq!(*slot.access(), THREADS * ITERATIONS);
    }

    #[test]
    fn reset_never_exposes_empty_slot() {
        let slot = Arc::new(SingleSlot::new());
        slot.create(0_u64);

        let done = Arc::new(AtomicBool::new(false));

        let observer = {
            let slot = Arc::clone(&slot);
            let done = Arc::clone(&done);

            thread::spawn(move || {
                while !done.load(Ordering::SeqCst) {
                    // access() panics on an empty slot, so this thread acts
                    // as the probe: a reset exposing an intermediate empty
                    // state would fail the test.
                    let guard = slot.access();
                    drop(guard);
                }
            })
        };

        for round in 1..500_u64 {
            slot.reset(round);
        }

        done.store(true, Ordering::SeqCst);
        observer.join().unwrap();
    }

    #[test]
    fn destroy_blocks_until_guard_released() {
        let slot = Arc::new(SingleSlot::new());
        slot.create(0_u64);

        let guard_finished = Arc::new(AtomicBool::new(false));
        let (guard_taken_tx, guard_taken_rx) = mpsc::channel();

        let holder = {
            let slot = Arc::clone(&slot);
            let guard_finished = Arc::clone(&guard_finished);

            thread::spawn(move || {
                let guard = slot.access();
                guard_taken_tx.send(()).unwrap();

                thread::sleep(Duration::from_millis(50));

                guard_finished.store(true, Ordering::SeqCst);
                drop(guard);
            })
        };

        guard_taken_rx.recv().unwrap();

        // Must block until the holder thread drops its guard.
        slot.destroy();
        assert!(guard_finished.load(Ordering::SeqCst));

        holder.join().unwrap();
    }

    #[test]
    fn full_lifecycle_across_threads() {
        let slot = Arc::new(SingleSlot::new());

        slot.create(42_u64);

        {
            let slot = Arc::clone(&slot);
            thread::spawn(move || {
                let guard = slot.access();
                assert_eq!(*guard, 42);
                guard.release();
            })
            .join()
            .unwrap();
        }

        slot.reset(99);

        {
            let slot = Arc::clone(&slot);
            thread::spawn(move || {
                let guard = slot.access();
                assert_eq!(*guard, 99);
                guard.release();
            })
            .join()
            .unwrap();
        }

        slot.destroy();
        assert!(!slot.is_occupied());
    }

    #[test]
    fn default_is_empty() {
        let slot = SingleSlot::<u64>::default();
        assert!(!slot.is_occupied());
    }

    #[test]
    fn debug_output_reports_occupancy() {
        let slot = SingleSlot::<u64>::new();
        assert_eq!(format!("{slot:?}"), "SingleSlot { occupied: Some(false) }");

        slot.create(1);
        assert_eq!(format!("{slot:?}"), "SingleSlot { occupied: Some(true) }");

        let guard = slot.access();
        assert_eq!(format!("{slot:?}"), "SingleSlot { occupied: None }");
        drop(guard);
    }
}
