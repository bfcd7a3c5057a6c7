//! Basic usage example for `SingleSlot`.
//!
//! This example demonstrates the full lifecycle of a shared instance across
//! threads: create, guarded access, reset and destroy.

use std::sync::Arc;
use std::thread;

use single_slot::SingleSlot;

#[derive(Debug)]
struct AppConfig {
    verbosity: u8,
    name: String,
}

fn main() {
    let slot = Arc::new(SingleSlot::new());

    // The first and only instance.
    slot.create(AppConfig {
        verbosity: 1,
        name: String::from("alpha"),
    });

    println!("Created instance: {:?}", *slot.access());

    // Readers on other threads serialize through the slot's lock.
    let readers: Vec<_> = (0..4)
        .map(|i| {
            let slot = Arc::clone(&slot);
            thread::spawn(move || {
                let guard = slot.access();
                println!("Reader {i} sees config for {:?}", guard.name);
            })
        })
        .collect();

    for reader in readers {
        reader.join().unwrap();
    }

    // Replace the instance in one step; no thread can observe an empty slot.
    slot.reset(AppConfig {
        verbosity: 3,
        name: String::from("beta"),
    });

    {
        let mut guard = slot.access();
        guard.verbosity += 1;
        println!("After reset and tweak: {:?}", *guard);
    }

    // Explicit teardown; the slot may be reused afterwards.
    slot.destroy();
    println!("Slot occupied after destroy: {}", slot.is_occupied());
}
