//! Demand-paging fault handling: classifying the fault, lazily populating
//! the page table on first touch, and installing the resulting mapping
//! into the TLB.

use super::addrspace::AddressSpace;
use super::error::{VmError, VmResult};
use super::pagetable::{split_vpn, PageTable};
use super::platform::{FrameSource, InterruptGuard, Platform};
use super::pte::PageTableEntry;
use super::region::RegionList;

/// Why the TLB trapped into software.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FaultType {
    Read,
    Write,
    /// A write was attempted against a mapping the hardware itself marked
    /// read-only (DIRTY clear). Always a hard fault — never lazily
    /// resolved, unlike a first-touch read or write.
    ReadOnlyViolation,
}

/// How the current process's address space is reached from a platform's
/// own process/thread bookkeeping. Kept separate from [`Platform`] because
/// only the fault entry point needs it — `AddressSpace`'s own methods
/// never do.
pub trait CurrentProcess {
    fn address_space_mut(&mut self) -> Option<&mut AddressSpace>;
}

/// Ensures the leaf at `(i, j, k)` is mapped, allocating and zeroing a
/// fresh frame under the permissions `regions` report for `vaddr` if it
/// isn't already. Shared between the fault handler and the ELF loader so
/// both get the same rollback-on-failure behavior from one place.
///
/// On any failure the page table is left exactly as it was on entry: any
/// level-1/level-2 node this call allocated is freed before returning.
pub(crate) fn ensure_leaf<P: FrameSource>(
    regions: &RegionList,
    pgtable: &mut PageTable,
    platform: &P,
    vaddr: u32,
) -> VmResult<PageTableEntry> {
    let (i, j, k) = split_vpn(vaddr);

    let existing = pgtable.leaf(i, j, k);
    if !existing.is_empty() {
        return Ok(existing);
    }

    let region = regions.search(vaddr, 0).ok_or(VmError::BadAddress)?;
    let perm = region.cur_perm;

    let allocated_l1 = match pgtable.ensure_l1(i) {
        Ok(a) => a,
        Err(e) => {
            log::warn!("out of memory allocating level-1 page table node for idx0={}", i);
            return Err(e);
        }
    };
    let allocated_l2 = match pgtable.ensure_l2(i, j) {
        Ok(a) => a,
        Err(e) => {
            log::warn!(
                "out of memory allocating level-2 page table node for idx0={} idx1={}",
                i,
                j
            );
            if allocated_l1 {
                pgtable.free_l1(i);
            }
            return Err(e);
        }
    };

    let frame = match platform.alloc_one() {
        Some(f) => f,
        None => {
            log::warn!("out of memory allocating a frame for vaddr={:#010x}", vaddr);
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

    let entry = PageTableEntry::from_frame(frame, perm);
    *pgtable.leaf_mut(i, j, k) = entry;
    Ok(entry)
}

/// Resolves a TLB miss or protection trap for `fault_address` in the
/// current process's address space, installing a fresh TLB entry on
/// success.
///
/// A `ReadOnlyViolation` is always rejected with `BadAddress` (EFAULT) —
/// it never triggers lazy population, since the mapping it names already
/// exists and is simply not writable.
pub fn fault<P: Platform, C: CurrentProcess>(
    proc: &mut C,
    platform: &P,
    fault_type: FaultType,
    fault_address: u32,
) -> VmResult<()> {
    if fault_type == FaultType::ReadOnlyViolation {
        return Err(VmError::BadAddress);
    }

    let address_space = proc.address_space_mut().ok_or(VmError::BadAddress)?;
    let (regions, pgtable) = address_space.fields_mut();

    let entry = ensure_leaf(regions, pgtable, platform, fault_address)?;

    let entry_hi = fault_address & !(super::config::PAGE_SIZE - 1);
    let guard = InterruptGuard::enter(platform);
    platform.write_random(entry_hi, entry.raw());
    drop(guard);

    log::trace!(
        "vm fault: addr={:#010x} type={:?} pfn={:#010x}",
        fault_address,
        fault_type,
        entry.pfn()
    );

    Ok(())
}
