//! Single-threaded usage example for `LocalSingleSlot`.
//!
//! No mutex exists in this variant; misuse that would deadlock the
//! thread-safe slot is detected as a borrow panic instead.

use std::rc::Rc;

use single_slot::LocalSingleSlot;

fn main() {
    let slot = LocalSingleSlot::new();

    // Non-Send values are fine here.
    slot.create(Rc::new(vec![1_u32, 2, 3]));

    {
        let guard = slot.access();
        println!("Instance has {} elements", guard.len());
    }

    slot.reset_with(|| Rc::new(vec![4, 5]));
    println!("After reset: {} elements", slot.access().len());

    slot.destroy();
    println!("Slot occupied after destroy: {}", slot.is_occupied());
}
