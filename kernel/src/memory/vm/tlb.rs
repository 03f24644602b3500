//! Whole-TLB invalidation and the (unsupported) cross-CPU variant.

use super::platform::{InterruptGuard, Platform};

/// Invalidates every TLB slot, each under its own distinct sentinel
/// `entry_hi` so no two invalidated slots can alias a real mapping.
/// Raises interrupt priority for the duration, matching the original
/// design's `splhigh`/`splx` bracket around the write loop.
pub fn flush_all<P: Platform>(platform: &P) {
    let guard = InterruptGuard::enter(platform);
    let lo = platform.invalid_lo();
    for slot in 0..platform.num_slots() {
        let hi = platform.invalid_hi(slot);
        platform.write_slot(slot, hi, lo);
    }
    drop(guard);
}

/// Invalidates this TLB's entries for one address space on every other
/// CPU. Not supported: this core targets a single CPU, so there is never
/// another TLB to shoot down.
pub fn shootdown() -> ! {
    log::error!("tlb shootdown requested on a single-CPU target");
    panic!("tlb shootdown requested on a single-CPU target");
}
