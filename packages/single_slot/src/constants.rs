// A poisoned lock means the process is in an unrecoverable/unsafe state and must exit (we panic).
pub(crate) const ERR_POISONED_LOCK: &str = "encountered poisoned lock";

// Precondition failures of the slot lifecycle are caller bugs, not environmental
// conditions. They terminate the process instead of returning an error.
pub(crate) const ERR_ALREADY_CREATED: &str =
    "slot already holds an instance - destroy() or reset() it first";
pub(crate) const ERR_NOT_CREATED: &str = "slot does not hold an instance - create() one first";

// A guard can only be constructed from an occupied slot and holds the lock for
// its entire lifetime, so the slot cannot empty underneath it.
pub(crate) const ERR_GUARD_EMPTY: &str = "slot emptied while an access guard existed";
