//! A process's complete virtual memory state: its declared regions plus
//! the page table backing them.

use super::config::{page_align_down, page_align_up, USERSTACK, USERSTACKSIZE};
use super::error::{VmError, VmResult};
use super::pagetable::PageTable;
use super::platform::{FrameSource, Platform};
use super::pte::{PageTableEntry, RegionPerm};
use super::region::{Region, RegionList};
use super::tlb;

/// One process's address space: its declared regions and the page table
/// mapping them. Mirrors this crate's `memory::vmm` split between "what is
/// mapped" and "the table that maps it", narrowed to the software-TLB
/// target and the coarser region-level bookkeeping this design calls for.
pub struct AddressSpace {
    regions: RegionList,
    pgtable: PageTable,
}

impl AddressSpace {
    /// Builds an empty address space: no regions, an empty page table.
    /// Fails (and leaves nothing behind to clean up) only if the eager
    /// level-0 array can't be allocated.
    pub fn create() -> VmResult<Self> {
        Ok(Self {
            regions: RegionList::new(),
            pgtable: PageTable::new()?,
        })
    }

    pub fn regions(&self) -> &RegionList {
        &self.regions
    }

    /// Splits this address space into its region list and page table as
    /// disjoint borrows, so a caller (the fault handler) can hold an
    /// immutable borrow of one and a mutable borrow of the other at once.
    pub(crate) fn fields_mut(&mut self) -> (&RegionList, &mut PageTable) {
        (&self.regions, &mut self.pgtable)
    }

    pub(crate) fn pgtable(&self) -> &PageTable {
        &self.pgtable
    }

    /// Declares a new region `[vaddr, vaddr+memsize)`, page-aligning both
    /// ends outward (growing, never shrinking, the requested range) and
    /// rejecting any overlap with an existing region.
    pub fn define_region(&mut self, vaddr: u32, memsize: u32, perm: RegionPerm) -> VmResult<()> {
        if self.regions.search(vaddr, memsize).is_some() {
            log::warn!(
                "region overlap rejected: vaddr={:#010x} memsize={:#x}",
                vaddr,
                memsize
            );
            return Err(VmError::OutOfMemory);
        }

        let aligned_vaddr = page_align_down(vaddr);
        let grown = memsize + (vaddr - aligned_vaddr);
        let aligned_memsize = page_align_up(grown);

        self.regions.try_add(Region {
            vaddr: aligned_vaddr,
            memsize: aligned_memsize,
            cur_perm: perm,
            old_perm: perm,
        })
    }

    /// Declares the fixed-location, fixed-size user stack region
    /// `[USERSTACK - USERSTACKSIZE, USERSTACK)` and returns `USERSTACK` as
    /// the initial stack pointer.
    pub fn define_stack(&mut self) -> VmResult<u32> {
        self.define_region(
            USERSTACK - USERSTACKSIZE,
            USERSTACKSIZE,
            RegionPerm::READ | RegionPerm::WRITE,
        )?;
        Ok(USERSTACK)
    }

    /// Temporarily relaxes every region to full READ | WRITE | EXEC,
    /// saving its prior permissions in `old_perm`, so a loader can write
    /// segment contents into regions that are normally read-only or
    /// non-writable. Fails with `BadAddress` if there are no regions yet.
    pub fn prepare_load(&mut self) -> VmResult<()> {
        if self.regions.is_empty() {
            return Err(VmError::BadAddress);
        }
        for region in self.regions.iter_mut() {
            region.old_perm = region.cur_perm;
            region.cur_perm = RegionPerm::READ | RegionPerm::WRITE | RegionPerm::EXEC;
        }
        Ok(())
    }

    /// Restores the permissions `prepare_load` saved, then flushes the TLB
    /// under elevated interrupt priority so stale, over-permissive entries
    /// cannot outlive the region they were relaxed for. Fails with
    /// `BadAddress` if there are no regions.
    pub fn complete_load<P: Platform>(&mut self, platform: &P) -> VmResult<()> {
        if self.regions.is_empty() {
            return Err(VmError::BadAddress);
        }
        for region in self.regions.iter_mut() {
            region.cur_perm = region.old_perm;
        }
        tlb::flush_all(platform);
        Ok(())
    }

    /// Deep-copies this address space: every region verbatim, and a fresh,
    /// independently-allocated and zeroed frame for every mapped leaf.
    ///
    /// Frame *contents* are not copied — only DIRTY/VALID status is
    /// recoverable from a leaf, so a purely write-protected COW scheme
    /// cannot reconstruct an executable-only mapping's permissions. This
    /// copies verbatim instead: a fresh zeroed frame per mapped leaf, with
    /// permissions reapplied from the (fully preserved) region list.
    pub fn copy<P: FrameSource>(&self, platform: &P) -> VmResult<Self> {
        let mut dst = Self::create()?;

        for region in self.regions.iter() {
            if let Err(e) = dst.regions.try_add(*region) {
                return Err(e);
            }
        }

        for (i, j, k, entry) in self.pgtable.leaves() {
            if let Err(e) = Self::copy_one_leaf(&mut dst.pgtable, platform, i, j, k, entry) {
                dst.destroy(platform);
                return Err(e);
            }
        }

        Ok(dst)
    }

    fn copy_one_leaf<P: FrameSource>(
        pgtable: &mut PageTable,
        platform: &P,
        i: usize,
        j: usize,
        k: usize,
        src_entry: PageTableEntry,
    ) -> VmResult<()> {
        let allocated_l1 = pgtable.ensure_l1(i)?;
        let allocated_l2 = match pgtable.ensure_l2(i, j) {
            Ok(a) => a,
            Err(e) => {
                if allocated_l1 {
                    pgtable.free_l1(i);
                }
                return Err(e);
            }
        };

        let frame = match platform.alloc_one() {
            Some(f) => f,
            None => {
                if allocated_l2 {
                    pgtable.free_l2(i, j);
                }
                if allocated_l1 {
                    pgtable.free_l1(i);
                }
                return Err(VmError::OutOfMemory);
            }
        };
        platform.zero(frame);

        let perm = RegionPerm::from_pte(src_entry);
        *pgtable.leaf_mut(i, j, k) = PageTableEntry::from_frame(frame, perm);
        Ok(())
    }

    /// Tears down this address space: every region, then every mapped
    /// frame at every level. Consumes `self` — there is no valid state to
    /// return to afterward.
    pub fn destroy<P: FrameSource>(mut self, platform: &P) {
        self.regions.free_all();
        for (_, _, _, entry) in self.pgtable.leaves() {
            let frame = super::platform::PhysFrame::from_base(entry.pfn());
            platform.free_one(frame);
        }
    }

    /// Makes this address space the one the TLB resolves against. Flushes
    /// the TLB to discard any entries the previously active address space
    /// left behind.
    pub fn activate<P: Platform>(&self, platform: &P) {
        tlb::flush_all(platform);
    }

    /// Leaves this address space's entries behind for the TLB's benefit
    /// when another address space becomes active. Kept as a distinct
    /// operation from `activate`, even though both currently just flush,
    /// so an eventual per-address-space ASID tag has a natural home on
    /// either side without reshaping the call sites.
    pub fn deactivate<P: Platform>(&self, platform: &P) {
        tlb::flush_all(platform);
    }
}
