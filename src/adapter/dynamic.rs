use core::{
    alloc::Layout,
    cell::UnsafeCell,
    marker::PhantomData,
    ptr::NonNull,
};

use allocator_api2::alloc::{AllocError, Allocator};

use crate::pool::Pool;

/// An array-capable adapter for contiguous containers: `allocate(n)`
/// requests `n` contiguous `T`s via the pool's
/// `continuous_alloc`/`continuous_dealloc` operations.
///
/// See [`MonoAllocator`](super::MonoAllocator) for why a shared handle to
/// the pool is built on `UnsafeCell` rather than `&mut`.
pub struct DynAllocator<'a, T, P: Pool> {
    pool: &'a UnsafeCell<P>,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T, P: Pool> DynAllocator<'a, T, P> {
    pub fn new(pool: &'a UnsafeCell<P>) -> Self {
        Self {
            pool,
            _marker: PhantomData,
        }
    }

    /// Rebinds to a different element type, preserving the pool reference.
    pub fn rebind<U>(&self) -> DynAllocator<'a, U, P> {
        DynAllocator::new(self.pool)
    }

    #[allow(clippy::mut_from_ref)]
    unsafe fn pool_mut(&self) -> &mut P {
        &mut *self.pool.get()
    }

    pub fn allocate(&self, n: usize) -> Option<NonNull<T>> {
        unsafe { self.pool_mut().continuous_alloc::<T>(n) }
    }

    pub fn deallocate(&self, ptr: NonNull<T>, n: usize) {
        unsafe { self.pool_mut().continuous_dealloc(ptr, n) };
    }
}

impl<'a, T, P: Pool> Clone for DynAllocator<'a, T, P> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<'a, T, P: Pool> Copy for DynAllocator<'a, T, P> {}

impl<'a, T, P: Pool> PartialEq for DynAllocator<'a, T, P> {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self.pool, other.pool)
    }
}
impl<'a, T, P: Pool> Eq for DynAllocator<'a, T, P> {}

unsafe impl<'a, T, P: Pool> Allocator for DynAllocator<'a, T, P> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        if layout.size() == 0 {
            return Ok(NonNull::slice_from_raw_parts(NonNull::dangling(), 0));
        }
        let n = layout.size() / core::mem::size_of::<T>().max(1);
        let ptr = self.allocate(n).ok_or(AllocError)?;
        Ok(NonNull::slice_from_raw_parts(ptr.cast(), layout.size()))
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() == 0 {
            return;
        }
        let n = layout.size() / core::mem::size_of::<T>().max(1);
        self.deallocate(ptr.cast(), n)
    }
}
