//! The three-level sparse page table.
//!
//! The level-0 node owns 256 optional level-1 nodes; each level-1 node
//! owns 64 optional level-2 nodes; each level-2 node stores 64 leaf words
//! directly (no further indirection). Fixed-size arrays throughout, not
//! hash maps — the indices are bounded and dense within an active
//! process's working set, the same reasoning this crate's hardware paging
//! layer (`memory::vmm`) applies to its own (4-level, 9/9/9/9-split) table
//! walk; only the split and allocation eagerness differ here.
//!
//! Level 0 is allocated eagerly (256 pointers, all empty) when the table
//! is created. Levels 1 and 2 are allocated lazily, the first time a VPN
//! beneath them is touched — eager allocation of the full tree would cost
//! 256 * 64 * 64 * 4 bytes = 4 MiB per address space.

use alloc::boxed::Box;

use super::alloc_util::try_box_new;
use super::error::VmResult;
use super::pte::PageTableEntry;

pub const L0_BITS: u32 = 8;
pub const L1_BITS: u32 = 6;
pub const L2_BITS: u32 = 6;

pub const L0_SIZE: usize = 1 << L0_BITS;
pub const L1_SIZE: usize = 1 << L1_BITS;
pub const L2_SIZE: usize = 1 << L2_BITS;

/// A level-2 node: 64 leaf words.
pub type L2Table = [PageTableEntry; L2_SIZE];

/// A level-1 node: 64 optional level-2 nodes.
pub type L1Table = [Option<Box<L2Table>>; L1_SIZE];

fn new_l1() -> L1Table {
    core::array::from_fn(|_| None)
}

fn new_l2() -> L2Table {
    [PageTableEntry::EMPTY; L2_SIZE]
}

/// Splits a virtual (fault) address's 20-bit VPN into `(idx0, idx1, idx2)`.
/// Derived directly from the VPN, with no kernel-virtual detour needed.
pub fn split_vpn(addr: u32) -> (usize, usize, usize) {
    super::addr::VirtAddr::new(addr).split()
}

/// The three-level trie rooted at an address space's level-0 array.
pub struct PageTable {
    l0: Box<[Option<Box<L1Table>>; L0_SIZE]>,
}

impl PageTable {
    /// Allocates and zero-fills the eager level-0 array.
    pub fn new() -> VmResult<Self> {
        let l0 = try_box_new(core::array::from_fn(|_| None))?;
        Ok(Self { l0 })
    }

    /// Ensures the level-1 node at `i` exists, allocating it if absent.
    /// Returns whether this call performed the allocation — the caller
    /// uses this to decide whether to roll the allocation back later.
    pub fn ensure_l1(&mut self, i: usize) -> VmResult<bool> {
        if self.l0[i].is_some() {
            return Ok(false);
        }
        self.l0[i] = Some(try_box_new(new_l1())?);
        Ok(true)
    }

    /// Frees the level-1 node at `i` unconditionally. Used only to roll
    /// back an allocation this invocation just performed.
    pub fn free_l1(&mut self, i: usize) {
        self.l0[i] = None;
    }

    pub fn l1_is_absent(&self, i: usize) -> bool {
        self.l0[i].is_none()
    }

    fn l1_mut(&mut self, i: usize) -> &mut L1Table {
        self.l0[i]
            .as_deref_mut()
            .expect("level-1 node must be ensured before use")
    }

    /// Ensures the level-2 node at `(i, j)` exists (level-1 must already
    /// exist). Returns whether this call performed the allocation.
    pub fn ensure_l2(&mut self, i: usize, j: usize) -> VmResult<bool> {
        let l1 = self.l1_mut(i);
        if l1[j].is_some() {
            return Ok(false);
        }
        l1[j] = Some(try_box_new(new_l2())?);
        Ok(true)
    }

    /// Frees the level-2 node at `(i, j)` unconditionally.
    pub fn free_l2(&mut self, i: usize, j: usize) {
        self.l1_mut(i)[j] = None;
    }

    /// Reads the leaf at `(i, j, k)`, or `PageTableEntry::EMPTY` if either
    /// intermediate node is absent.
    pub fn leaf(&self, i: usize, j: usize, k: usize) -> PageTableEntry {
        self.l0[i]
            .as_deref()
            .and_then(|l1| l1[j].as_deref())
            .map(|l2| l2[k])
            .unwrap_or(PageTableEntry::EMPTY)
    }

    /// Mutable access to the leaf at `(i, j, k)`. Both intermediate nodes
    /// must already be ensured.
    pub fn leaf_mut(&mut self, i: usize, j: usize, k: usize) -> &mut PageTableEntry {
        &mut self.l1_mut(i)[j]
            .as_deref_mut()
            .expect("level-2 node must be ensured before use")[k]
    }

    /// Every non-empty leaf, as `(idx0, idx1, idx2, entry)`.
    pub fn leaves(&self) -> alloc::vec::Vec<(usize, usize, usize, PageTableEntry)> {
        let mut out = alloc::vec::Vec::new();
        for (i, l1) in self.l0.iter().enumerate() {
            let Some(l1) = l1.as_deref() else { continue };
            for (j, l2) in l1.iter().enumerate() {
                let Some(l2) = l2.as_deref() else { continue };
                for (k, entry) in l2.iter().enumerate() {
                    if !entry.is_empty() {
                        out.push((i, j, k, *entry));
                    }
                }
            }
        }
        out
    }
}
