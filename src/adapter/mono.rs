use core::{
    alloc::Layout,
    cell::UnsafeCell,
    marker::PhantomData,
    ptr::NonNull,
};

use allocator_api2::alloc::{AllocError, Allocator};

use crate::pool::Pool;

/// A single-object adapter for node-based containers.
///
/// `allocate(n)` only ever succeeds for `n = 1`; any other count is a
/// misuse this adapter must detect, so it fails cleanly instead of
/// forwarding a malformed request to the pool.
///
/// A pool has no internal synchronization and is meant for a single
/// conceptual caller. The `UnsafeCell` here gives multiple adapter copies
/// (as containers expect to freely clone/move their allocator) a shared,
/// mutable handle onto the same pool without claiming thread safety it
/// doesn't have.
pub struct MonoAllocator<'a, T, P: Pool> {
    pool: &'a UnsafeCell<P>,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T, P: Pool> MonoAllocator<'a, T, P> {
    pub fn new(pool: &'a UnsafeCell<P>) -> Self {
        Self {
            pool,
            _marker: PhantomData,
        }
    }

    /// Rebinds to a different element type, preserving the pool reference.
    pub fn rebind<U>(&self) -> MonoAllocator<'a, U, P> {
        MonoAllocator::new(self.pool)
    }

    #[allow(clippy::mut_from_ref)]
    unsafe fn pool_mut(&self) -> &mut P {
        &mut *self.pool.get()
    }

    /// Allocates one `T`. Returns `None` if `n != 1`.
    pub fn allocate(&self, n: usize) -> Option<NonNull<T>> {
        if n != 1 {
            return None;
        }
        unsafe { self.pool_mut().discrete_alloc::<T>() }
    }

    /// Releases one `T`. A no-op if `n != 1`.
    pub fn deallocate(&self, ptr: NonNull<T>, n: usize) {
        if n != 1 {
            return;
        }
        unsafe { self.pool_mut().discrete_dealloc(ptr) };
    }
}

impl<'a, T, P: Pool> Clone for MonoAllocator<'a, T, P> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<'a, T, P: Pool> Copy for MonoAllocator<'a, T, P> {}

impl<'a, T, P: Pool> PartialEq for MonoAllocator<'a, T, P> {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self.pool, other.pool)
    }
}
impl<'a, T, P: Pool> Eq for MonoAllocator<'a, T, P> {}

unsafe impl<'a, T, P: Pool> Allocator for MonoAllocator<'a, T, P> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        if layout != Layout::new::<T>() {
            return Err(AllocError);
        }
        let ptr = self.allocate(1).ok_or(AllocError)?;
        Ok(NonNull::slice_from_raw_parts(ptr.cast(), layout.size()))
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        if layout != Layout::new::<T>() {
            return;
        }
        self.deallocate(ptr.cast(), 1)
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use crate::{pool::SlubPool, resource::OsResource, vendor::Vendor};

    #[test]
    fn mono_allocator_rejects_n_ne_1() {
        let res = OsResource::new();
        let v = Vendor::new(&res);
        let pool: SlubPool<'_, 256, 1, OsResource> = SlubPool::new([16], v, v);
        let cell = UnsafeCell::new(pool);
        let adapter: MonoAllocator<'_, [u8; 8], _> = MonoAllocator::new(&cell);

        let p = adapter.allocate(1).expect("allocate(1) must succeed");
        assert!(adapter.allocate(2).is_none(), "allocate(2) must fail");
        adapter.deallocate(p, 1);
        // deallocate with the wrong count is a documented no-op, not UB.
        adapter.deallocate(p, 2);
    }

    #[test]
    fn equality_is_pool_identity() {
        let res = OsResource::new();
        let v = Vendor::new(&res);
        let pool_a: SlubPool<'_, 256, 1, OsResource> = SlubPool::new([16], v, v);
        let pool_b: SlubPool<'_, 256, 1, OsResource> = SlubPool::new([16], v, v);
        let cell_a = UnsafeCell::new(pool_a);
        let cell_b = UnsafeCell::new(pool_b);

        let a1: MonoAllocator<'_, u8, _> = MonoAllocator::new(&cell_a);
        let a2: MonoAllocator<'_, u8, _> = MonoAllocator::new(&cell_a);
        let b: MonoAllocator<'_, u8, _> = MonoAllocator::new(&cell_b);

        assert_eq!(a1, a2);
        assert_ne!(a1, b);
    }
}
