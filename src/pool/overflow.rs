//! The overflow table shared by both pool variants: a content-addressed map
//! from an oversize allocation's address to the `(size, align)` it must be
//! freed with.
//!
//! Backed by a `Vec` kept sorted by address instead of a hash map: oversize
//! requests are the cold path by design (they bypass the pool's fast paths
//! entirely), so a sorted vector's O(log n) lookup and O(n) insert/remove
//! are an acceptable trade for using the logic vendor's own allocator
//! (`allocator_api2::vec::Vec` is the stable-Rust way to parameterize a
//! growable buffer by a custom allocator; `std`'s own `Vec<T, A>` requires
//! the unstable `allocator_api` feature).

use allocator_api2::vec::Vec as AVec;

use crate::{resource::Resource, vendor::VendorAllocator};

type Entry = (usize, usize, usize); // (addr, size, align)

pub(crate) struct OverflowTable<'a, VLog: Resource> {
    entries: AVec<Entry, VendorAllocator<'a, Entry, VLog>>,
}

impl<'a, VLog: Resource> OverflowTable<'a, VLog> {
    pub fn new(alloc: VendorAllocator<'a, Entry, VLog>) -> Self {
        Self {
            entries: AVec::new_in(alloc),
        }
    }

    fn search(&self, addr: usize) -> Result<usize, usize> {
        self.entries.binary_search_by(|&(a, _, _)| a.cmp(&addr))
    }

    pub fn insert(&mut self, addr: usize, size: usize, align: usize) {
        match self.search(addr) {
            Ok(i) => self.entries[i] = (addr, size, align),
            Err(i) => self.entries.insert(i, (addr, size, align)),
        }
    }

    /// Removes and returns the `(size, align)` previously recorded for
    /// `addr`. A missing entry is a contract violation: the caller is
    /// expected to have allocated `addr` from this pool's overflow path.
    pub fn remove(&mut self, addr: usize) -> Option<(usize, usize)> {
        let i = self.search(addr).ok()?;
        let (_, size, align) = self.entries.remove(i);
        Some((size, align))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        self.entries.iter().copied()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
