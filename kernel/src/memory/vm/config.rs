//! Compile-time layout constants for the virtual memory core.
//!
//! Kept as `pub const` items in one place, matching how the rest of this
//! crate's memory code (`memory::address`) treats page size and similar
//! quantities as compile-time facts rather than runtime configuration.

/// Page size in bytes for this target.
pub const PAGE_SIZE: u32 = 4096;

/// Number of low bits that form the in-page offset.
pub const PAGE_SHIFT: u32 = 12;

/// Mask that isolates the page-aligned portion of an address.
pub const PAGE_FRAME_MASK: u32 = !(PAGE_SIZE - 1);

/// Top (exclusive, highest address) of the fixed user stack region; also
/// the initial stack pointer handed back by `define_stack`.
pub const USERSTACK: u32 = 0x8000_0000;

/// Size of the user stack region in bytes.
pub const USERSTACKSIZE: u32 = 16 * PAGE_SIZE;

/// Rounds `addr` down to the start of its containing page.
#[inline]
pub const fn page_align_down(addr: u32) -> u32 {
    addr & PAGE_FRAME_MASK
}

/// Rounds `size` up to the next multiple of the page size.
#[inline]
pub const fn page_align_up(size: u32) -> u32 {
    (size + PAGE_SIZE - 1) & PAGE_FRAME_MASK
}
