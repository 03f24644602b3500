//! Per-process virtual memory: declared regions, the three-level
//! software page table backing them, and the fault handler that
//! populates it lazily on first touch.
//!
//! This module owns the *portable* half of the story — the data model and
//! the algorithms that walk it. The hardware-facing half (the actual
//! frame allocator, the TLB control registers, interrupt priority) is
//! reached only through the traits in [`platform`], so the logic here
//! builds and tests the same way whether it's linked into the real kernel
//! or into a hosted `cargo test` binary.

mod addr;
mod addrspace;
mod alloc_util;
mod config;
mod error;
mod fault;
mod load;
mod pagetable;
mod platform;
mod pte;
mod region;
mod tlb;

pub use addr::VirtAddr;
pub use addrspace::AddressSpace;
pub use config::{PAGE_SHIFT, PAGE_SIZE, USERSTACK, USERSTACKSIZE};
pub use error::{VmError, VmResult};
pub use fault::{fault, CurrentProcess, FaultType};
pub use load::{load_elf, Segment};
pub use platform::{FrameSource, InterruptControl, InterruptGuard, PhysFrame, Platform, Tlb};
pub use pte::{PageTableEntry, RegionPerm};
pub use region::{Region, RegionList};
pub use tlb::{flush_all as tlb_flush_all, shootdown as tlb_shootdown};

#[cfg(test)]
mod tests;
