//! Type-erased usage example for `OpaqueSlot`.
//!
//! This example wires a "plugin" whose concrete type the slot never learns:
//! construction arguments travel as an opaque payload and cleanup goes
//! through the caller-supplied destroy closure.

use std::any::Any;

use single_slot::OpaqueSlot;

struct AudioEngine {
    sample_rate: u32,
    channels: u16,
}

fn main() {
    let slot = OpaqueSlot::new();

    // The construct closure alone knows the payload layout.
    slot.create(
        |args| {
            let (sample_rate, channels) = *args.downcast::<(u32, u16)>().ok()?;
            let instance: Box<dyn Any + Send> = Box::new(AudioEngine {
                sample_rate,
                channels,
            });
            Some(instance)
        },
        |instance| {
            println!("Destroying audio engine");
            drop(instance);
        },
        Box::new((48_000_u32, 2_u16)),
    )
    .expect("constructor produced no instance");

    {
        let guard = slot.access();
        let engine = guard
            .downcast_ref::<AudioEngine>()
            .expect("slot holds an AudioEngine");
        println!(
            "Engine running at {} Hz, {} channels",
            engine.sample_rate, engine.channels
        );
    }

    // Reset reuses the closures captured at create.
    slot.reset(Box::new((44_100_u32, 2_u16)))
        .expect("constructor produced no instance");

    {
        let guard = slot.access();
        let engine = guard.downcast_ref::<AudioEngine>().unwrap();
        println!("Engine now running at {} Hz", engine.sample_rate);
    }

    slot.destroy();
    println!("Slot occupied after destroy: {}", slot.is_occupied());
}
