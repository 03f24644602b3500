//! Copying loaded-program segments into a freshly built address space.
//!
//! Binary parsing itself stays out of scope here: the caller hands in
//! already-parsed segment descriptors (vaddr/size/permissions/bytes), the
//! same division of labor this crate's own `fs` module keeps between
//! reading an archive's directory and acting on one entry's bytes.

use super::addrspace::AddressSpace;
use super::config::page_align_down;
use super::error::VmResult;
use super::fault::ensure_leaf;
use super::platform::{Platform, PhysFrame};
use super::pte::RegionPerm;

/// One loadable segment: the region it belongs in, how much of it comes
/// from the image (`data`, may be shorter than `memsize` for bss), and the
/// permissions the region should end up with once loading completes.
pub struct Segment<'a> {
    pub vaddr: u32,
    pub memsize: u32,
    pub perm: RegionPerm,
    pub data: &'a [u8],
}

/// Defines a region for each segment, temporarily relaxes permissions so
/// segment bytes can be written even into a read-only or non-writable
/// region, copies each segment's bytes page by page, restores permissions,
/// and returns `entry_point` unchanged for the caller to jump to.
pub fn load_elf<P: Platform>(
    address_space: &mut AddressSpace,
    platform: &P,
    segments: &[Segment<'_>],
    entry_point: u32,
) -> VmResult<u32> {
    for seg in segments {
        address_space.define_region(seg.vaddr, seg.memsize, seg.perm)?;
    }

    address_space.prepare_load()?;

    for seg in segments {
        copy_segment(address_space, platform, seg)?;
    }

    address_space.complete_load(platform)?;

    Ok(entry_point)
}

fn copy_segment<P: Platform>(
    address_space: &mut AddressSpace,
    platform: &P,
    seg: &Segment<'_>,
) -> VmResult<()> {
    let mut remaining = seg.data;
    let mut page_vaddr = page_align_down(seg.vaddr);
    let mut offset_in_page = (seg.vaddr - page_vaddr) as usize;

    let (regions, pgtable) = address_space.fields_mut();

    while !remaining.is_empty() {
        let entry = ensure_leaf(regions, pgtable, platform, page_vaddr)?;
        let frame = PhysFrame::from_base(entry.pfn());

        let space_in_page = (super::config::PAGE_SIZE as usize) - offset_in_page;
        let take = space_in_page.min(remaining.len());
        platform.write(frame, offset_in_page, &remaining[..take]);

        remaining = &remaining[take..];
        page_vaddr += super::config::PAGE_SIZE;
        offset_in_page = 0;
    }

    Ok(())
}
