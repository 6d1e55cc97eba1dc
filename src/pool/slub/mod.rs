//! SLUB-style size-classed slab pool.

mod block;
mod bucket;

use core::{alloc::Layout, mem, ptr::NonNull};

use crate::{
    pool::{overflow::OverflowTable, Pool},
    resource::Resource,
    vendor::{Vendor, VendorAllocator},
};

use bucket::Bucket;

/// A size-classed slab pool.
///
/// `B` is the block size (power of two); `K` is the number of size classes.
/// The slot sizes themselves are supplied at construction as a strictly
/// increasing `[usize; K]` rather than encoded in the type: stable Rust has
/// no `generic_const_exprs`, so slot-size well-formedness is checked eagerly
/// in [`SlubPool::new`] instead of at the type-instantiation boundary.
/// Misconfiguration still cannot reach an allocation call: `new` panics
/// immediately.
///
/// `V_res` supplies block memory; `V_log` (defaults to `V_res`) backs the
/// overflow table's own storage.
pub struct SlubPool<'a, const B: usize, const K: usize, VRes: Resource, VLog: Resource = VRes> {
    buckets: [Bucket; K],
    overflow: OverflowTable<'a, VLog>,
    resource_vendor: Vendor<'a, VRes>,
}

impl<'a, const B: usize, const K: usize, VRes: Resource, VLog: Resource>
    SlubPool<'a, B, K, VRes, VLog>
{
    pub fn new(sizes: [usize; K], resource_vendor: Vendor<'a, VRes>, logic_vendor: Vendor<'a, VLog>) -> Self {
        assert!(B.is_power_of_two(), "block size must be a power of two");
        assert!(K >= 1, "at least one slot size is required");
        for i in 0..K {
            assert!(
                sizes[i] >= mem::size_of::<u32>(),
                "slot size {} is smaller than the free-link word size",
                sizes[i]
            );
            assert!(
                block::HEADER_SIZE + sizes[i] <= B,
                "slot size {} does not fit in a block of size {}",
                sizes[i],
                B
            );
            if i > 0 {
                assert!(sizes[i - 1] < sizes[i], "slot sizes must be strictly increasing");
            }
        }
        let buckets = core::array::from_fn(|i| Bucket::new(sizes[i], block::BlockHdr::capacity(B, sizes[i])));
        Self {
            buckets,
            overflow: OverflowTable::new(VendorAllocator::new(logic_vendor)),
            resource_vendor,
        }
    }

    /// Index of the smallest size class `>= bytes`, or `None` if oversize.
    fn bucket_for(&self, bytes: usize, align: usize) -> Option<usize> {
        self.buckets
            .iter()
            .position(|b| b.slot_size() >= bytes && b.slot_size() % align.max(1) == 0)
    }

    unsafe fn alloc_raw(&mut self, layout: Layout) -> Option<NonNull<u8>> {
        if let Some(idx) = self.bucket_for(layout.size().max(1), layout.align()) {
            self.buckets[idx].alloc(B, self.resource_vendor)
        } else {
            let ptr = self.resource_vendor.alloc(layout)?;
            self.overflow
                .insert(ptr.as_ptr() as usize, layout.size(), layout.align());
            Some(ptr)
        }
    }

    unsafe fn dealloc_raw(&mut self, ptr: NonNull<u8>, layout: Layout) {
        if let Some(idx) = self.bucket_for(layout.size().max(1), layout.align()) {
            self.buckets[idx].dealloc(B, ptr);
        } else {
            let (size, align) = self
                .overflow
                .remove(ptr.as_ptr() as usize)
                .expect("dealloc address not found in overflow table");
            let layout = Layout::from_size_align_unchecked(size, align);
            self.resource_vendor.dealloc(ptr, layout);
        }
    }
}

impl<'a, const B: usize, const K: usize, VRes: Resource, VLog: Resource> Pool
    for SlubPool<'a, B, K, VRes, VLog>
{
    const IN_MEMORY_OPTIMIZATION: bool = true;

    unsafe fn discrete_alloc<T>(&mut self) -> Option<NonNull<T>> {
        let layout = Layout::new::<T>();
        self.alloc_raw(layout).map(NonNull::cast)
    }

    unsafe fn discrete_dealloc<T>(&mut self, ptr: NonNull<T>) {
        let layout = Layout::new::<T>();
        self.dealloc_raw(ptr.cast(), layout);
    }

    unsafe fn continuous_alloc<T>(&mut self, n: usize) -> Option<NonNull<T>> {
        let layout = Layout::array::<T>(n).ok()?;
        self.alloc_raw(layout).map(NonNull::cast)
    }

    unsafe fn continuous_dealloc<T>(&mut self, ptr: NonNull<T>, n: usize) {
        let layout = Layout::array::<T>(n).expect("invalid layout on dealloc");
        self.dealloc_raw(ptr.cast(), layout);
    }

    fn clear(&mut self) {
        unsafe {
            for bucket in &mut self.buckets {
                bucket.clear(B, self.resource_vendor);
            }
            for (addr, size, align) in self.overflow.iter() {
                let layout = Layout::from_size_align_unchecked(size, align);
                self.resource_vendor
                    .dealloc(NonNull::new_unchecked(addr as *mut u8), layout);
            }
        }
        self.overflow.clear();
    }
}

#[cfg(test)]
mod tests;
