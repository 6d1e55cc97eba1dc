//! Best-fit free-list pool.

mod free_map;

use core::{alloc::Layout, ptr::NonNull};

use allocator_api2::vec::Vec as AVec;

use crate::{
    pool::{overflow::OverflowTable, Pool},
    resource::Resource,
    vendor::{Vendor, VendorAllocator},
};

use free_map::FreeMap;

/// A single pool-wide free-list allocator serviced by best fit.
///
/// `B` is both the internal block-acquisition unit and the oversize
/// threshold. `V_res` supplies block memory; `V_log` (defaults to `V_res`)
/// backs this pool's own bookkeeping: the block-tracking vector (needed so
/// `clear()` can return every acquired block even though fully-occupied
/// blocks leave no trace in the free map) and the overflow table.
pub struct BestFitPool<'a, const B: usize, VRes: Resource, VLog: Resource = VRes> {
    free_map: FreeMap,
    overflow: OverflowTable<'a, VLog>,
    blocks: AVec<usize, VendorAllocator<'a, usize, VLog>>,
    resource_vendor: Vendor<'a, VRes>,
}

impl<'a, const B: usize, VRes: Resource, VLog: Resource> BestFitPool<'a, B, VRes, VLog> {
    pub fn new(resource_vendor: Vendor<'a, VRes>, logic_vendor: Vendor<'a, VLog>) -> Self {
        assert!(B.is_power_of_two(), "block size must be a power of two");
        Self {
            free_map: FreeMap::new(),
            overflow: OverflowTable::new(VendorAllocator::new(logic_vendor)),
            blocks: AVec::new_in(VendorAllocator::new(logic_vendor)),
            resource_vendor,
        }
    }

    unsafe fn acquire_block(&mut self) -> Option<usize> {
        let layout = Layout::from_size_align(B, B).ok()?;
        let ptr = self.resource_vendor.alloc(layout)?;
        let base = ptr.as_ptr() as usize;
        self.blocks.push(base);
        Some(base)
    }

    unsafe fn alloc_raw(&mut self, layout: Layout) -> Option<NonNull<u8>> {
        if layout.size() > B {
            let ptr = self.resource_vendor.alloc(layout)?;
            self.overflow
                .insert(ptr.as_ptr() as usize, layout.size(), layout.align());
            return Some(ptr);
        }

        let size = layout.size().max(1);
        let align = layout.align();

        if let Some(addr) = self.free_map.take_best_fit(size, align) {
            return NonNull::new(addr as *mut u8);
        }

        let base = self.acquire_block()?;
        if align <= B {
            self.free_map.insert_free(base + size, B - size);
            return NonNull::new(base as *mut u8);
        }
        // The fresh block might not itself satisfy an over-B alignment at
        // its very start, so register it whole and re-run the scan.
        self.free_map.insert_free(base, B);
        self.free_map
            .take_best_fit(size, align)
            .and_then(|addr| NonNull::new(addr as *mut u8))
    }

    unsafe fn dealloc_raw(&mut self, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() > B {
            let (size, align) = self
                .overflow
                .remove(ptr.as_ptr() as usize)
                .expect("dealloc address not found in overflow table");
            let layout = Layout::from_size_align_unchecked(size, align);
            self.resource_vendor.dealloc(ptr, layout);
            return;
        }
        self.free_map.free(ptr.as_ptr() as usize, layout.size().max(1));
    }
}

impl<'a, const B: usize, VRes: Resource, VLog: Resource> Pool for BestFitPool<'a, B, VRes, VLog> {
    const IN_MEMORY_OPTIMIZATION: bool = false;

    unsafe fn discrete_alloc<T>(&mut self) -> Option<NonNull<T>> {
        self.alloc_raw(Layout::new::<T>()).map(NonNull::cast)
    }

    unsafe fn discrete_dealloc<T>(&mut self, ptr: NonNull<T>) {
        self.dealloc_raw(ptr.cast(), Layout::new::<T>());
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
            let layout = Layout::from_size_align_unchecked(B, B);
            for &base in self.blocks.iter() {
                self.resource_vendor
                    .dealloc(NonNull::new_unchecked(base as *mut u8), layout);
            }
            for (addr, size, align) in self.overflow.iter() {
                let layout = Layout::from_size_align_unchecked(size, align);
                self.resource_vendor
                    .dealloc(NonNull::new_unchecked(addr as *mut u8), layout);
            }
        }
        self.blocks.clear();
        self.overflow.clear();
        self.free_map = FreeMap::new();
    }
}
