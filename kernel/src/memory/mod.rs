// =============================================================================
// teachos — Memory Subsystem
// =============================================================================
//
// The memory subsystem manages all physical and virtual memory in the kernel.
// It's organized into layers:
//
//   address.rs  — PhysAddr/VirtAddr newtypes (type safety for addresses)
//   pmm.rs      — Physical Memory Manager (bitmap allocator for frames)
//   paging.rs   — hardware page table operations (this kernel's own x86_64 MMU)
//   vmm.rs      — Virtual Memory Manager built on paging.rs
//   heap.rs     — Kernel heap allocator (Box, Vec, etc.)
//   vm/         — the per-process virtual memory core (software-managed TLB)
//
// This module only exposes what's needed. Internal details stay private.
// =============================================================================

pub mod address;
pub mod heap;
pub mod paging;
pub mod pmm;
pub mod vm;
pub mod vmm;
