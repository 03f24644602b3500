//! The boundary between this module's portable logic and the concrete
//! kernel it runs inside.
//!
//! Every external collaborator the design calls out as "consumed" (the
//! frame allocator, the TLB control registers, the current-process lookup,
//! interrupt-priority control) is a trait here instead of a free function.
//! The real kernel binary wires in hardware-backed implementations; the
//! test module in this crate wires in hosted fakes and exercises the exact
//! same code paths.

/// A physical page frame, already page-aligned.
///
/// Carries only the base address — any kernel-virtual/physical translation
/// a frame needs is folded into whatever implements [`FrameSource`], the
/// same way this crate's `PhysAddr` newtype hides its own address-space
/// translation behind a constructor.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PhysFrame(u32);

impl PhysFrame {
    /// Wraps a page-aligned physical base address.
    #[inline]
    pub const fn from_base(base: u32) -> Self {
        debug_assert!(base & (super::config::PAGE_SIZE - 1) == 0);
        Self(base)
    }

    /// The frame's page-aligned base address.
    #[inline]
    pub const fn base(&self) -> u32 {
        self.0
    }
}

/// Physical frame allocation, `n = 1` only — the core never requests a
/// multi-page run. Models `alloc_kpages`/`free_kpages`.
pub trait FrameSource {
    /// Allocates one physical frame, or `None` on exhaustion.
    fn alloc_one(&self) -> Option<PhysFrame>;

    /// Returns a previously allocated frame.
    fn free_one(&self, frame: PhysFrame);

    /// Zeroes the frame's contents.
    fn zero(&self, frame: PhysFrame);

    /// Writes `bytes` into the frame starting at `offset`. Used only by
    /// the ELF-loading path to populate freshly demand-paged frames.
    fn write(&self, frame: PhysFrame, offset: usize, bytes: &[u8]);
}

/// The software-managed TLB. Models `tlb_random`/`tlb_write`/
/// `TLBHI_INVALID`/`TLBLO_INVALID`/`NUM_TLB`.
pub trait Tlb {
    /// Number of hardware TLB slots (`NUM_TLB`).
    fn num_slots(&self) -> usize;

    /// Installs `(entry_hi, entry_lo)` at a specific slot.
    fn write_slot(&self, slot: usize, entry_hi: u32, entry_lo: u32);

    /// Installs `(entry_hi, entry_lo)` at a hardware-chosen slot.
    fn write_random(&self, entry_hi: u32, entry_lo: u32);

    /// The sentinel `entry_hi` for an invalidated slot (`TLBHI_INVALID(i)`).
    /// Distinct per slot so no two invalidated entries alias.
    fn invalid_hi(&self, slot: usize) -> u32;

    /// The sentinel `entry_lo` for an invalidated slot (`TLBLO_INVALID()`).
    fn invalid_lo(&self) -> u32;
}

/// Interrupt-priority control. Models `splhigh`/`splx`.
pub trait InterruptControl {
    /// The saved-priority token returned by [`splhigh`](Self::splhigh).
    type Priority: Copy;

    /// Raises interrupt priority to mask all maskable interrupts, returning
    /// the previous priority.
    fn splhigh(&self) -> Self::Priority;

    /// Restores a previously saved priority.
    fn splx(&self, old: Self::Priority);
}

/// RAII wrapper around [`InterruptControl::splhigh`]/`splx`: raises
/// priority in [`enter`](Self::enter), restores it on drop. Same
/// acquire-in-constructor, release-in-`Drop` shape as this crate's ticket
/// spinlock guard, applied to a critical section instead of a lock.
pub struct InterruptGuard<'a, C: InterruptControl> {
    ctrl: &'a C,
    old: C::Priority,
}

impl<'a, C: InterruptControl> InterruptGuard<'a, C> {
    /// Raises interrupt priority and returns a guard that restores it when
    /// dropped.
    #[inline]
    pub fn enter(ctrl: &'a C) -> Self {
        let old = ctrl.splhigh();
        Self { ctrl, old }
    }
}

impl<'a, C: InterruptControl> Drop for InterruptGuard<'a, C> {
    #[inline]
    fn drop(&mut self) {
        self.ctrl.splx(self.old);
    }
}

/// Everything the virtual memory core needs from its host environment.
///
/// Blanket-implemented for any type satisfying the three constituent
/// traits, so callers only ever need to name `Platform`.
pub trait Platform: FrameSource + Tlb + InterruptControl {}

impl<T: FrameSource + Tlb + InterruptControl> Platform for T {}
