// =============================================================================
// teachos — Kernel Synchronization Primitives
// =============================================================================
//
// This module provides synchronization primitives for the kernel.
// In a kernel, we can't use std::sync (there is no std). We need our own
// primitives that work in a bare-metal, multi-core, interrupt-driven
// environment.
//
// IMPORTANT: Lock ordering rules:
//   Level 1 (innermost): PMM bitmap lock
//   Level 2 (outermost): Page table lock
//
// NEVER acquire a lower-level lock while holding a higher-level lock.
// Violating this WILL cause deadlocks on multi-core.
// =============================================================================

pub mod spinlock;

