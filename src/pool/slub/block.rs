//! Block format: a `B`-byte, `B`-aligned region holding a small header and
//! an array of fixed-size slots, with a classic intrusive free list
//! threaded through the unused slots.

use core::ptr::NonNull;

/// Sentinel `free_head` value meaning "block is full".
pub(super) const SENTINEL: u32 = u32::MAX;

/// Per-block header. `repr(C)` for a predictable, self-describing layout.
/// The header carries its own slot size so that a bare interior pointer is
/// enough to recover everything needed to free it (block-base recovery).
#[repr(C)]
pub(super) struct BlockHdr {
    pub prev: Option<NonNull<BlockHdr>>,
    pub next: Option<NonNull<BlockHdr>>,
    free_head: u32,
    slot_size: u32,
}

/// Slot arrays start at this fixed, bucket-independent offset from the
/// block base, rounded up so slots of any alignment up to 16 bytes start
/// correctly aligned.
pub(super) const HEADER_SIZE: usize = {
    let sz = core::mem::size_of::<BlockHdr>();
    (sz + 15) & !15
};

impl BlockHdr {
    /// Recovers the block base of an interior pointer by masking off the
    /// low `log2(block_size)` bits. Sound because every block is allocated
    /// `block_size`-aligned.
    #[inline]
    pub unsafe fn block_base(addr: *mut u8, block_size: usize) -> NonNull<BlockHdr> {
        debug_assert!(block_size.is_power_of_two());
        let base = (addr as usize) & !(block_size - 1);
        NonNull::new_unchecked(base as *mut BlockHdr)
    }

    #[inline]
    fn slots_begin(block: NonNull<BlockHdr>) -> *mut u8 {
        unsafe { (block.as_ptr() as *mut u8).add(HEADER_SIZE) }
    }

    /// Number of slots of `slot_size` that fit in a block of `block_size`.
    pub fn capacity(block_size: usize, slot_size: usize) -> usize {
        (block_size - HEADER_SIZE) / slot_size
    }

    unsafe fn slot_ptr(block: NonNull<BlockHdr>, index: u32) -> *mut u8 {
        let slot_size = (*block.as_ptr()).slot_size as usize;
        Self::slots_begin(block).add(index as usize * slot_size)
    }

    #[inline]
    pub unsafe fn is_full(block: NonNull<BlockHdr>) -> bool {
        (*block.as_ptr()).free_head == SENTINEL
    }

    /// Initializes a freshly-acquired block: writes the slot size and links
    /// the free list `0 -> 1 -> ... -> capacity-1 -> SENTINEL`.
    pub unsafe fn init_free_list(block: NonNull<BlockHdr>, slot_size: usize, capacity: usize) {
        debug_assert!(slot_size >= core::mem::size_of::<u32>());
        debug_assert!(capacity >= 1);
        let hdr = block.as_ptr();
        (*hdr).slot_size = slot_size as u32;
        (*hdr).free_head = 0;
        for i in 0..capacity {
            let next = if i + 1 == capacity {
                SENTINEL
            } else {
                (i + 1) as u32
            };
            (Self::slot_ptr(block, i as u32) as *mut u32).write_unaligned(next);
        }
    }

    /// Pops the head of the free list. Caller must have checked `!is_full`.
    pub unsafe fn pop_free(block: NonNull<BlockHdr>) -> NonNull<u8> {
        let hdr = block.as_ptr();
        debug_assert!((*hdr).free_head != SENTINEL);
        let idx = (*hdr).free_head;
        let slot = Self::slot_ptr(block, idx);
        (*hdr).free_head = (slot as *mut u32).read_unaligned();
        NonNull::new_unchecked(slot)
    }

    /// Pushes `slot` back onto the block's free list.
    pub unsafe fn push_free(block: NonNull<BlockHdr>, slot: NonNull<u8>) {
        let hdr = block.as_ptr();
        (slot.as_ptr() as *mut u32).write_unaligned((*hdr).free_head);
        (*hdr).free_head = Self::slot_index(block, slot);
    }

    unsafe fn slot_index(block: NonNull<BlockHdr>, slot: NonNull<u8>) -> u32 {
        let slot_size = (*block.as_ptr()).slot_size as usize;
        let offset = slot.as_ptr() as usize - Self::slots_begin(block) as usize;
        (offset / slot_size) as u32
    }

    /// Enumerates the indices currently on the free list, in list order.
    /// Test-only: used to verify free-list correctness.
    #[cfg(test)]
    pub unsafe fn free_indices(block: NonNull<BlockHdr>) -> alloc::vec::Vec<u32> {
        let mut out = alloc::vec::Vec::new();
        let mut cur = (*block.as_ptr()).free_head;
        while cur != SENTINEL {
            out.push(cur);
            cur = (Self::slot_ptr(block, cur) as *mut u32).read_unaligned();
        }
        out
    }
}
