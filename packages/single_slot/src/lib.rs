//! This package provides [`SingleSlot<T>`], a guarded slot that holds at
//! most one instance of a value, with exclusive access and an explicit
//! create/reset/destroy lifecycle.
//!
//! Unlike lazily initialized cells, the whole lifecycle is in the caller's
//! hands: the instance is created, replaced and destroyed by explicit
//! calls, every operation states its precondition, and violating a
//! precondition is treated as a caller bug that panics rather than as a
//! recoverable error.
//!
//! # Features
//!
//! - **Explicit lifecycle**: create, reset (replace without ever exposing an
//!   empty slot), destroy; the cycle may repeat any number of times.
//! - **Exclusive guarded access**: `access()` returns a guard that keeps the
//!   slot locked until dropped, so several operations on the instance run
//!   without interleaving from other threads.
//! - **Thread-safe and single-threaded variants**: [`SingleSlot`] for
//!   multi-threaded use, [`LocalSingleSlot`] when no locking is wanted and
//!   single-threaded use should be enforced by the compiler.
//! - **Typed and type-erased forms**: [`OpaqueSlot`] and [`LocalOpaqueSlot`]
//!   store a `Box<dyn Any>` plus caller-supplied construct/destroy closures,
//!   for places where generic parameterization is unavailable.
//! - **Fail-fast contract**: precondition violations panic with distinct
//!   messages; the only recoverable condition is a constructor that
//!   produces no instance.
//! - **`const` construction**: every slot type can live in a `static`.
//!
//! # Variant matrix
//!
//! | | thread-safe | single-threaded |
//! |---|---|---|
//! | typed | [`SingleSlot<T>`] | [`LocalSingleSlot<T>`] |
//! | type-erased | [`OpaqueSlot`] | [`LocalOpaqueSlot`] |
//!
//! # Example
//!
//! ```rust
//! use single_slot::SingleSlot;
//!
//! let slot = SingleSlot::new();
//!
//! slot.create(String::from("hello"));
//!
//! {
//!     let mut guard = slot.access();
//!     guard.push_str(", world");
//!     assert_eq!(*guard, "hello, world");
//! } // guard dropped, slot unlocked
//!
//! slot.reset(String::from("fresh"));
//! slot.destroy();
//! ```
//!
//! For single-threaded use:
//!
//! ```rust
//! use single_slot::LocalSingleSlot;
//!
//! let slot = LocalSingleSlot::new();
//!
//! slot.create(vec![1, 2, 3]);
//! assert_eq!(slot.access().len(), 3);
//! slot.destroy();
//! ```
//!
//! For type-erased storage with caller-defined construction:
//!
//! ```rust
//! use std::any::Any;
//!
//! use single_slot::OpaqueSlot;
//!
//! let slot = OpaqueSlot::new();
//!
//! slot.create(
//!     |args| {
//!         let value = *args.downcast::<u64>().ok()?;
//!         let instance: Box<dyn Any + Send> = Box::new(value);
//!         Some(instance)
//!     },
//!     drop,
//!     Box::new(42_u64),
//! )
//! .unwrap();
//!
//! assert_eq!(*slot.access().downcast_ref::<u64>().unwrap(), 42);
//! slot.destroy();
//! ```

mod constants;
mod error;
mod local_opaque_slot;
mod local_opaque_slot_guard;
mod local_slot;
mod local_slot_guard;
mod opaque_slot;
mod opaque_slot_guard;
mod slot;
mod slot_guard;

pub use error::*;
pub use local_opaque_slot::{
    LocalConstructArgs, LocalConstructFn, LocalDestroyFn, LocalOpaqueSlot, LocalOpaqueValue,
};
pub use local_opaque_slot_guard::*;
pub use local_slot::*;
pub use local_slot_guard::*;
pub use opaque_slot::{ConstructArgs, ConstructFn, DestroyFn, OpaqueSlot, OpaqueValue};
pub use opaque_slot_guard::*;
pub use slot::*;
pub use slot_guard::*;
