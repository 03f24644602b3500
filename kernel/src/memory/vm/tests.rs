//! Hosted fakes for the platform traits, plus behavioral tests against the
//! scenarios and invariants this module is designed around. Modeled on
//! this crate's closest precedent for testing an otherwise `no_std` memory
//! module against an in-memory fake rather than real hardware.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use super::addrspace::AddressSpace;
use super::config::{PAGE_SIZE, USERSTACK, USERSTACKSIZE};
use super::error::VmError;
use super::fault::{fault, CurrentProcess, FaultType};
use super::platform::{FrameSource, InterruptControl, PhysFrame, Tlb};
use super::pte::RegionPerm;

/// A bump frame allocator backed by a fixed arena of page-sized buffers,
/// plus a fake TLB array and an interrupt-nesting counter. Frames are
/// never actually reused across a test (no free list) — tests only care
/// whether `free_one` was *called* the right number of times, not about
/// exhaustion-then-reuse.
struct TestPlatform {
    arena: RefCell<Vec<Box<[u8; PAGE_SIZE as usize]>>>,
    next_base: Cell<u32>,
    cap_frames: usize,
    freed: RefCell<Vec<u32>>,
    tlb: RefCell<[(u32, u32); 4]>,
    irq_depth: Cell<u32>,
}

impl TestPlatform {
    fn new(cap_frames: usize) -> Self {
        Self {
            arena: RefCell::new(Vec::new()),
            next_base: Cell::new(0x1000),
            cap_frames,
            freed: RefCell::new(Vec::new()),
            tlb: RefCell::new([(0, 0); 4]),
            irq_depth: Cell::new(0),
        }
    }
}

impl FrameSource for TestPlatform {
    fn alloc_one(&self) -> Option<PhysFrame> {
        if self.arena.borrow().len() >= self.cap_frames {
            return None;
        }
        let base = self.next_base.get();
        self.next_base.set(base + PAGE_SIZE);
        self.arena.borrow_mut().push(Box::new([0u8; PAGE_SIZE as usize]));
        Some(PhysFrame::from_base(base))
    }

    fn free_one(&self, frame: PhysFrame) {
        self.freed.borrow_mut().push(frame.base());
    }

    fn zero(&self, frame: PhysFrame) {
        if let Some(buf) = self.frame_buf(frame) {
            buf.fill(0);
        }
    }

    fn write(&self, frame: PhysFrame, offset: usize, bytes: &[u8]) {
        if let Some(buf) = self.frame_buf(frame) {
            buf[offset..offset + bytes.len()].copy_from_slice(bytes);
        }
    }
}

impl TestPlatform {
    /// Test-only accessor for asserting on a frame's written contents.
    /// Unsafe-free: indexes by the (base - start) / PAGE_SIZE arithmetic
    /// this fake itself assigned at `alloc_one` time.
    fn frame_buf(&self, frame: PhysFrame) -> Option<core::cell::RefMut<'_, [u8]>> {
        let idx = ((frame.base() - 0x1000) / PAGE_SIZE) as usize;
        let arena = self.arena.borrow_mut();
        if idx >= arena.len() {
            return None;
        }
        Some(core::cell::RefMut::map(arena, |a| &mut a[idx][..]))
    }
}

impl Tlb for TestPlatform {
    fn num_slots(&self) -> usize {
        self.tlb.borrow().len()
    }

    fn write_slot(&self, slot: usize, entry_hi: u32, entry_lo: u32) {
        self.tlb.borrow_mut()[slot] = (entry_hi, entry_lo);
    }

    fn write_random(&self, entry_hi: u32, entry_lo: u32) {
        self.tlb.borrow_mut()[0] = (entry_hi, entry_lo);
    }

    fn invalid_hi(&self, slot: usize) -> u32 {
        0xFFFF_F000 | (slot as u32)
    }

    fn invalid_lo(&self) -> u32 {
        0
    }
}

impl InterruptControl for TestPlatform {
    type Priority = u32;

    fn splhigh(&self) -> u32 {
        let d = self.irq_depth.get();
        self.irq_depth.set(d + 1);
        d
    }

    fn splx(&self, old: u32) {
        self.irq_depth.set(old);
    }
}

/// Wraps a [`TestPlatform`] but forces allocation failure, to exercise the
/// rollback-on-`OutOfMemory` paths.
struct OomPlatform(TestPlatform);

impl FrameSource for OomPlatform {
    fn alloc_one(&self) -> Option<PhysFrame> {
        None
    }
    fn free_one(&self, frame: PhysFrame) {
        self.0.free_one(frame)
    }
    fn zero(&self, frame: PhysFrame) {
        self.0.zero(frame)
    }
    fn write(&self, frame: PhysFrame, offset: usize, bytes: &[u8]) {
        self.0.write(frame, offset, bytes)
    }
}

impl Tlb for OomPlatform {
    fn num_slots(&self) -> usize {
        self.0.num_slots()
    }
    fn write_slot(&self, slot: usize, entry_hi: u32, entry_lo: u32) {
        self.0.write_slot(slot, entry_hi, entry_lo)
    }
    fn write_random(&self, entry_hi: u32, entry_lo: u32) {
        self.0.write_random(entry_hi, entry_lo)
    }
    fn invalid_hi(&self, slot: usize) -> u32 {
        self.0.invalid_hi(slot)
    }
    fn invalid_lo(&self) -> u32 {
        self.0.invalid_lo()
    }
}

impl InterruptControl for OomPlatform {
    type Priority = u32;
    fn splhigh(&self) -> u32 {
        self.0.splhigh()
    }
    fn splx(&self, old: u32) {
        self.0.splx(old)
    }
}

struct TestProc(Option<AddressSpace>);

impl CurrentProcess for TestProc {
    fn address_space_mut(&mut self) -> Option<&mut AddressSpace> {
        self.0.as_mut()
    }
}

#[test]
fn create_is_empty() {
    let space = AddressSpace::create().unwrap();
    assert!(space.regions().is_empty());
}

#[test]
fn define_region_rejects_overlap() {
    let mut space = AddressSpace::create().unwrap();
    space
        .define_region(0x1000, 0x2000, RegionPerm::READ | RegionPerm::WRITE)
        .unwrap();
    let err = space
        .define_region(0x1000, 0x1000, RegionPerm::READ)
        .unwrap_err();
    assert_eq!(err, VmError::OutOfMemory);
}

#[test]
fn define_region_aligns_outward() {
    let mut space = AddressSpace::create().unwrap();
    space
        .define_region(0x1010, 0x10, RegionPerm::READ)
        .unwrap();
    let region = space.regions().search(0x1010, 0).unwrap();
    assert_eq!(region.vaddr, 0x1000);
    assert_eq!(region.memsize, PAGE_SIZE);
}

#[test]
fn define_stack_places_fixed_region() {
    let mut space = AddressSpace::create().unwrap();
    let sp = space.define_stack().unwrap();
    assert_eq!(sp, USERSTACK);
    let region = space.regions().search(USERSTACK - USERSTACKSIZE, 0).unwrap();
    assert_eq!(region.memsize, USERSTACKSIZE);
    assert_eq!(region.vaddr, USERSTACK - USERSTACKSIZE);
}

#[test]
fn fault_populates_leaf_and_installs_tlb_entry() {
    let platform = TestPlatform::new(8);
    let mut space = AddressSpace::create().unwrap();
    space
        .define_region(0x2000, PAGE_SIZE, RegionPerm::READ | RegionPerm::WRITE)
        .unwrap();
    let mut proc = TestProc(Some(space));

    fault(&mut proc, &platform, FaultType::Write, 0x2000).unwrap();

    let space = proc.0.as_ref().unwrap();
    let leaves = space.pgtable().leaves();
    assert_eq!(leaves.len(), 1);
    assert!(leaves[0].3.dirty());
    assert!(leaves[0].3.valid());
}

#[test]
fn fault_outside_any_region_leaves_table_unchanged() {
    let platform = TestPlatform::new(8);
    let mut space = AddressSpace::create().unwrap();
    space
        .define_region(0x2000, PAGE_SIZE, RegionPerm::READ)
        .unwrap();
    let mut proc = TestProc(Some(space));

    let err = fault(&mut proc, &platform, FaultType::Read, 0x9000).unwrap_err();
    assert_eq!(err, VmError::BadAddress);

    let space = proc.0.as_ref().unwrap();
    assert!(space.pgtable().leaves().is_empty());
    for i in 0..256 {
        assert!(space.pgtable().l1_is_absent(i));
    }
}

#[test]
fn read_only_violation_is_always_rejected() {
    let platform = TestPlatform::new(8);
    let mut space = AddressSpace::create().unwrap();
    space
        .define_region(0x2000, PAGE_SIZE, RegionPerm::READ)
        .unwrap();
    let mut proc = TestProc(Some(space));

    let err = fault(&mut proc, &platform, FaultType::ReadOnlyViolation, 0x2000).unwrap_err();
    assert_eq!(err, VmError::BadAddress);
}

#[test]
fn fault_out_of_memory_rolls_back_to_empty_table() {
    let platform = OomPlatform(TestPlatform::new(8));
    let mut space = AddressSpace::create().unwrap();
    space
        .define_region(0x2000, PAGE_SIZE, RegionPerm::READ)
        .unwrap();
    let mut proc = TestProc(Some(space));

    let err = fault(&mut proc, &platform, FaultType::Read, 0x2000).unwrap_err();
    assert_eq!(err, VmError::OutOfMemory);

    let space = proc.0.as_ref().unwrap();
    assert!(space.pgtable().leaves().is_empty());
    assert!(space.pgtable().l1_is_absent(0));
}

#[test]
fn copy_preserves_regions_and_remaps_distinct_frames() {
    let platform = TestPlatform::new(8);
    let mut space = AddressSpace::create().unwrap();
    space
        .define_region(0x2000, PAGE_SIZE, RegionPerm::READ | RegionPerm::WRITE)
        .unwrap();
    let mut proc = TestProc(Some(space));
    fault(&mut proc, &platform, FaultType::Write, 0x2000).unwrap();
    let src = proc.0.take().unwrap();

    let dst = src.copy(&platform).unwrap();

    assert_eq!(dst.regions().len(), 1);
    let src_leaves = src.pgtable().leaves();
    let dst_leaves = dst.pgtable().leaves();
    assert_eq!(src_leaves.len(), 1);
    assert_eq!(dst_leaves.len(), 1);
    assert_ne!(src_leaves[0].3.pfn(), dst_leaves[0].3.pfn());
    assert_eq!(src_leaves[0].3.dirty(), dst_leaves[0].3.dirty());

    src.destroy(&platform);
    dst.destroy(&platform);
}

#[test]
fn prepare_and_complete_load_restores_permissions() {
    let mut space = AddressSpace::create().unwrap();
    space.define_region(0x2000, PAGE_SIZE, RegionPerm::READ).unwrap();
    let platform = TestPlatform::new(8);

    space.prepare_load().unwrap();
    {
        let region = space.regions().search(0x2000, 0).unwrap();
        assert_eq!(
            region.cur_perm,
            RegionPerm::READ | RegionPerm::WRITE | RegionPerm::EXEC
        );
    }

    space.complete_load(&platform).unwrap();
    let region = space.regions().search(0x2000, 0).unwrap();
    assert_eq!(region.cur_perm, RegionPerm::READ);
}

#[test]
fn prepare_load_on_empty_address_space_fails() {
    let mut space = AddressSpace::create().unwrap();
    assert_eq!(space.prepare_load().unwrap_err(), VmError::BadAddress);
}

#[test]
fn destroy_frees_every_mapped_frame() {
    let platform = TestPlatform::new(8);
    let mut space = AddressSpace::create().unwrap();
    space
        .define_region(0x2000, PAGE_SIZE * 2, RegionPerm::READ | RegionPerm::WRITE)
        .unwrap();
    let mut proc = TestProc(Some(space));
    fault(&mut proc, &platform, FaultType::Write, 0x2000).unwrap();
    fault(&mut proc, &platform, FaultType::Write, 0x2000 + PAGE_SIZE).unwrap();

    let space = proc.0.take().unwrap();
    space.destroy(&platform);
    assert_eq!(platform.freed.borrow().len(), 2);
}
