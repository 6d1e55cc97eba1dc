//! Shared test helpers: a counting mock `Resource` that tracks its own
//! alloc/dealloc call counts, and a `ShadowAllocator`-style byte-range
//! tracker used to check the non-overlap and round-trip properties.
#![cfg(test)]

extern crate std;

use core::{
    alloc::Layout,
    cell::Cell,
    ptr::NonNull,
};
use std::collections::BTreeMap;

use crate::resource::Resource;

/// A `Resource` backed by the system allocator that additionally counts
/// calls, for tests that assert on `alloc`/`dealloc` call counts.
pub struct CountingResource {
    alive: Cell<bool>,
    alloc_count: Cell<usize>,
    dealloc_count: Cell<usize>,
}

impl CountingResource {
    pub fn new() -> Self {
        Self {
            alive: Cell::new(true),
            alloc_count: Cell::new(0),
            dealloc_count: Cell::new(0),
        }
    }

    pub fn alloc_count(&self) -> usize {
        self.alloc_count.get()
    }

    pub fn dealloc_count(&self) -> usize {
        self.dealloc_count.get()
    }
}

impl Resource for CountingResource {
    unsafe fn alloc(&self, layout: Layout) -> Option<NonNull<u8>> {
        self.alloc_count.set(self.alloc_count.get() + 1);
        let ptr = std::alloc::alloc(layout);
        NonNull::new(ptr)
    }

    unsafe fn dealloc(&self, ptr: NonNull<u8>, layout: Layout) {
        self.dealloc_count.set(self.dealloc_count.get() + 1);
        std::alloc::dealloc(ptr.as_ptr(), layout);
    }

    #[cfg(feature = "std")]
    fn close(&self) -> Result<(), crate::error::CloseError> {
        self.alive.set(false);
        Ok(())
    }

    fn is_alive(&self) -> bool {
        self.alive.get()
    }
}

/// Tracks which byte ranges are currently live, to assert non-overlap and
/// alignment across arbitrary alloc/free sequences.
#[derive(Default)]
pub struct ShadowAllocator {
    live: BTreeMap<usize, usize>, // start -> len
}

impl ShadowAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_alloc(&mut self, ptr: NonNull<u8>, layout: Layout) {
        let start = ptr.as_ptr() as usize;
        assert_eq!(start % layout.align(), 0, "misaligned allocation");
        let len = layout.size();
        if let Some((&other_start, &other_len)) = self.live.range(..start + len).next_back() {
            assert!(
                other_start >= start + len || other_start + other_len <= start,
                "overlapping allocation: [{:#x}, {:#x}) vs [{:#x}, {:#x})",
                start,
                start + len,
                other_start,
                other_start + other_len
            );
        }
        assert!(self.live.insert(start, len).is_none(), "double allocation at same address");
    }

    pub fn record_dealloc(&mut self, ptr: NonNull<u8>, layout: Layout) {
        let start = ptr.as_ptr() as usize;
        let len = self
            .live
            .remove(&start)
            .expect("deallocating an address never recorded as allocated");
        assert_eq!(len, layout.size(), "deallocation size mismatch");
    }
}
