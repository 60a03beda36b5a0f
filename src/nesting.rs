use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::thread::{self, ThreadId};

use parking_lot::RwLock;

/// Nesting depth per calling thread, owned by one dispatcher.
///
/// A thread only ever touches its own slot, so the counters themselves need
/// no ordering beyond `Relaxed`; the map lock only guards insertion of new
/// threads. Slots are created on first use and live as long as the owner.
#[derive(Debug, Default)]
pub(crate) struct NestingCounters {
    slots: RwLock<HashMap<ThreadId, AtomicU32>>,
}

impl NestingCounters {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Depth of the calling thread; zero for threads that never opened a block.
    pub(crate) fn current(&self) -> u32 {
        self.slots
            .read()
            .get(&thread::current().id())
            .map_or(0, |slot| slot.load(Ordering::Relaxed))
    }

    pub(crate) fn increment(&self) -> u32 {
        self.update(|depth| depth.saturating_add(1))
    }

    /// Never goes below zero, however unbalanced the calls are.
    pub(crate) fn decrement(&self) -> u32 {
        self.update(|depth| depth.saturating_sub(1))
    }

    fn update(&self, step: impl Fn(u32) -> u32) -> u32 {
        let id = thread::current().id();
        {
            let slots = self.slots.read();
            if let Some(slot) = slots.get(&id) {
                return apply(slot, step);
            }
        }
        let mut slots = self.slots.write();
        let slot = slots.entry(id).or_insert_with(|| AtomicU32::new(0));
        apply(slot, step)
    }
}

fn apply(slot: &AtomicU32, step: impl Fn(u32) -> u32) -> u32 {
    // Only the owning thread writes its slot, so a plain load/store is enough.
    let depth = step(slot.load(Ordering::Relaxed));
    slot.store(depth, Ordering::Relaxed);
    depth
}
