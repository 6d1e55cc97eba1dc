//! Bucket algorithm: an intrusive doubly-linked list of same-size-class
//! blocks, kept so the head is never full while any block in the bucket
//! has room.

use core::{alloc::Layout, ptr::NonNull};

use crate::{resource::Resource, vendor::Vendor};

use super::block::BlockHdr;

pub(super) struct Bucket {
    head: Option<NonNull<BlockHdr>>,
    slot_size: usize,
    capacity: usize,
}

impl Bucket {
    pub fn new(slot_size: usize, capacity: usize) -> Self {
        Self {
            head: None,
            slot_size,
            capacity,
        }
    }

    pub fn slot_size(&self) -> usize {
        self.slot_size
    }

    #[cfg(test)]
    pub fn head_for_test(&self) -> NonNull<BlockHdr> {
        self.head.unwrap()
    }

    #[cfg(test)]
    pub fn block_count(&self) -> usize {
        let mut n = 0;
        let mut cur = self.head;
        while let Some(b) = cur {
            n += 1;
            cur = unsafe { (*b.as_ptr()).next };
        }
        n
    }

    /// Per-block free-list contents, one entry per block in list order.
    /// Test-only: used to verify free-list correctness across every block
    /// in the bucket.
    #[cfg(test)]
    pub fn blocks_free_indices(&self) -> alloc::vec::Vec<alloc::vec::Vec<u32>> {
        let mut out = alloc::vec::Vec::new();
        let mut cur = self.head;
        while let Some(b) = cur {
            out.push(unsafe { BlockHdr::free_indices(b) });
            cur = unsafe { (*b.as_ptr()).next };
        }
        out
    }

    /// Pops a free slot, acquiring a new block from `vendor` first if the
    /// head is missing or full.
    pub unsafe fn alloc<R: Resource>(
        &mut self,
        block_size: usize,
        vendor: Vendor<'_, R>,
    ) -> Option<NonNull<u8>> {
        let head = match self.head {
            Some(h) if !BlockHdr::is_full(h) => h,
            _ => self.acquire_block(block_size, vendor)?,
        };
        Some(BlockHdr::pop_free(head))
    }

    unsafe fn acquire_block<R: Resource>(
        &mut self,
        block_size: usize,
        vendor: Vendor<'_, R>,
    ) -> Option<NonNull<BlockHdr>> {
        let layout = Layout::from_size_align(block_size, block_size).ok()?;
        let raw = vendor.alloc(layout)?;
        let block = raw.cast::<BlockHdr>();
        BlockHdr::init_free_list(block, self.slot_size, self.capacity);
        self.push_front(block);
        Some(block)
    }

    unsafe fn push_front(&mut self, block: NonNull<BlockHdr>) {
        (*block.as_ptr()).prev = None;
        (*block.as_ptr()).next = self.head;
        if let Some(h) = self.head {
            (*h.as_ptr()).prev = Some(block);
        }
        self.head = Some(block);
    }

    unsafe fn unlink(&mut self, block: NonNull<BlockHdr>) {
        let (prev, next) = ((*block.as_ptr()).prev, (*block.as_ptr()).next);
        match prev {
            Some(p) => (*p.as_ptr()).next = next,
            None => self.head = next,
        }
        if let Some(n) = next {
            (*n.as_ptr()).prev = prev;
        }
    }

    /// Recovers `ptr`'s block and returns the slot to its free list,
    /// promoting the block to the head.
    pub unsafe fn dealloc(&mut self, block_size: usize, ptr: NonNull<u8>) {
        let block = BlockHdr::block_base(ptr.as_ptr(), block_size);
        BlockHdr::push_free(block, ptr);
        if self.head != Some(block) {
            self.unlink(block);
            self.push_front(block);
        }
    }

    /// Releases every block in the bucket back to `vendor`.
    pub unsafe fn clear<R: Resource>(&mut self, block_size: usize, vendor: Vendor<'_, R>) {
        let layout = Layout::from_size_align_unchecked(block_size, block_size);
        let mut cur = self.head.take();
        while let Some(block) = cur {
            cur = (*block.as_ptr()).next;
            vendor.dealloc(block.cast(), layout);
        }
    }
}
