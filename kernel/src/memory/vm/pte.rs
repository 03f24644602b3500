//! The 32-bit leaf word and the region-permission flags it's built from.
//!
//! `PageTableEntry` follows the same `repr(transparent)` newtype-over-an-
//! integer idiom this crate already uses for its (64-bit, hardware-walked)
//! `PageTableEntry` in `memory::vmm` — here applied to the narrower 32-bit
//! encoding this target's software TLB actually uses.

use super::platform::PhysFrame;

bitflags::bitflags! {
    /// Permission bits carried by a [`Region`](super::region::Region).
    #[derive(Clone, Copy, Debug)]
    pub struct RegionPerm: u8 {
        const READ  = 0b100;
        const WRITE = 0b010;
        const EXEC  = 0b001;
    }
}

impl RegionPerm {
    /// Recovers the permission bits a page-table leaf *can* express.
    ///
    /// Only DIRTY and VALID survive in a [`PageTableEntry`]; EXEC is not
    /// separately recoverable, so an executable-only region decodes back
    /// as read-only.
    pub fn from_pte(entry: PageTableEntry) -> Self {
        let mut perm = RegionPerm::empty();
        if entry.dirty() {
            perm |= RegionPerm::WRITE;
        }
        if entry.valid() {
            perm |= RegionPerm::READ;
        }
        perm
    }
}

/// One leaf of the three-level page table: a physical frame number plus
/// DIRTY/VALID status bits, packed into 32 bits.
///
/// Bit layout:
/// - `31..12` — physical frame number (page-aligned).
/// - `11`     — NOCACHE, unused, always zero.
/// - `10`     — DIRTY ("writable").
/// - `9`      — VALID ("present, readable or executable").
/// - `8..0`   — reserved, zero.
///
/// The all-zero value means "unmapped"; no valid mapping is ever
/// all-zero, because a present PFN is never zero-paged in this design and
/// VALID is never set without one.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct PageTableEntry(u32);

impl PageTableEntry {
    const PFN_MASK: u32 = 0xFFFF_F000;
    const DIRTY_BIT: u32 = 1 << 10;
    const VALID_BIT: u32 = 1 << 9;

    /// The unmapped sentinel.
    pub const EMPTY: Self = Self(0);

    /// Builds a leaf mapping `frame` with DIRTY/VALID derived from `perm`.
    pub fn from_frame(frame: PhysFrame, perm: RegionPerm) -> Self {
        let mut bits = frame.base() & Self::PFN_MASK;
        if perm.contains(RegionPerm::WRITE) {
            bits |= Self::DIRTY_BIT;
        }
        if perm.intersects(RegionPerm::READ | RegionPerm::EXEC) {
            bits |= Self::VALID_BIT;
        }
        Self(bits)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn pfn(&self) -> u32 {
        self.0 & Self::PFN_MASK
    }

    #[inline]
    pub const fn dirty(&self) -> bool {
        self.0 & Self::DIRTY_BIT != 0
    }

    #[inline]
    pub const fn valid(&self) -> bool {
        self.0 & Self::VALID_BIT != 0
    }

    /// The raw 32-bit encoding, as handed to the TLB as `entry_lo`.
    #[inline]
    pub const fn raw(&self) -> u32 {
        self.0
    }
}

impl core::fmt::Debug for PageTableEntry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.is_empty() {
            write!(f, "PTE(empty)")
        } else {
            write!(
                f,
                "PTE(pfn={:#010x} dirty={} valid={})",
                self.pfn(),
                self.dirty(),
                self.valid()
            )
        }
    }
}
