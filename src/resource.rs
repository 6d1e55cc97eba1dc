//! The bottom of the stack: the raw memory source a [`Vendor`] hands to
//! pools.
//!
//! [`Vendor`]: crate::vendor::Vendor

use core::{alloc::Layout, ptr::NonNull};

#[cfg(feature = "std")]
use crate::error::CloseError;

/// A single-owner source of raw memory.
///
/// A `Resource` is constructed alive, may be [`close`](Resource::close)d
/// (idempotently) at any time, and is closed automatically on drop. Once
/// dead, further allocation requests are a contract violation. The trait
/// does not attempt to detect this on the hot path; it is a diagnostic
/// concern, not a safety-load-bearing one.
///
/// Implementors are move-only; a moved-from instance must behave as if
/// already closed.
pub trait Resource {
    /// Allocates a region satisfying `layout`. Returns `None` on resource
    /// exhaustion: the "out of memory" case bubbles up as a null sentinel.
    ///
    /// # Safety
    ///
    /// `layout` must have a non-zero size. The caller must eventually pass
    /// the returned pointer to [`Resource::dealloc`] with the same layout,
    /// unless the resource is dropped first.
    unsafe fn alloc(&self, layout: Layout) -> Option<NonNull<u8>>;

    /// Returns a region previously handed out by [`Resource::alloc`] with
    /// the identical `layout`.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by a prior `alloc(layout)` call on this
    /// same resource and not already deallocated.
    unsafe fn dealloc(&self, ptr: NonNull<u8>, layout: Layout);

    /// Idempotently releases the backing store. On success, the resource is
    /// marked dead.
    #[cfg(feature = "std")]
    fn close(&self) -> Result<(), CloseError>;

    /// Whether the resource still accepts allocations.
    fn is_alive(&self) -> bool;
}

#[cfg(feature = "std")]
mod os {
    use super::*;
    use core::cell::Cell;

    /// A [`Resource`] backed directly by the host's aligned heap allocator.
    ///
    /// A general-purpose heap source rather than a page-granularity arena,
    /// so it goes through `libc::posix_memalign`/`libc::free` on unix and
    /// falls back to `std::alloc::{alloc, dealloc}` elsewhere.
    pub struct OsResource {
        alive: Cell<bool>,
    }

    impl OsResource {
        pub fn new() -> Self {
            log::trace!("OsResource::new");
            Self {
                alive: Cell::new(true),
            }
        }
    }

    impl Default for OsResource {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Resource for OsResource {
        unsafe fn alloc(&self, layout: Layout) -> Option<NonNull<u8>> {
            debug_assert!(self.is_alive(), "alloc on a closed resource");
            log::trace!("OsResource::alloc({:?})", layout);
            let ptr = os_alloc(layout)?;
            log::trace!("OsResource::alloc({:?}) -> {:?}", layout, ptr);
            Some(ptr)
        }

        unsafe fn dealloc(&self, ptr: NonNull<u8>, layout: Layout) {
            log::trace!("OsResource::dealloc({:?}, {:?})", ptr, layout);
            os_dealloc(ptr, layout);
        }

        fn close(&self) -> Result<(), CloseError> {
            log::trace!("OsResource::close");
            self.alive.set(false);
            Ok(())
        }

        fn is_alive(&self) -> bool {
            self.alive.get()
        }
    }

    impl Drop for OsResource {
        fn drop(&mut self) {
            if self.alive.get() {
                let _ = self.close();
            }
        }
    }

    #[cfg(unix)]
    unsafe fn os_alloc(layout: Layout) -> Option<NonNull<u8>> {
        let align = layout.align().max(core::mem::size_of::<usize>());
        let mut ptr: *mut core::ffi::c_void = core::ptr::null_mut();
        let rc = libc::posix_memalign(&mut ptr, align, layout.size());
        if rc != 0 || ptr.is_null() {
            return None;
        }
        NonNull::new(ptr as *mut u8)
    }

    #[cfg(unix)]
    unsafe fn os_dealloc(ptr: NonNull<u8>, _layout: Layout) {
        libc::free(ptr.as_ptr() as *mut core::ffi::c_void);
    }

    #[cfg(not(unix))]
    unsafe fn os_alloc(layout: Layout) -> Option<NonNull<u8>> {
        NonNull::new(std::alloc::alloc(layout))
    }

    #[cfg(not(unix))]
    unsafe fn os_dealloc(ptr: NonNull<u8>, layout: Layout) {
        std::alloc::dealloc(ptr.as_ptr(), layout);
    }
}

#[cfg(feature = "std")]
pub use os::OsResource;

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    #[test]
    fn alloc_dealloc_roundtrip() {
        let res = OsResource::new();
        assert!(res.is_alive());
        unsafe {
            let layout = Layout::from_size_align(64, 8).unwrap();
            let ptr = res.alloc(layout).expect("alloc failed");
            assert_eq!(ptr.as_ptr() as usize % 8, 0);
            res.dealloc(ptr, layout);
        }
    }

    #[test]
    fn close_is_idempotent_and_marks_dead() {
        let res = OsResource::new();
        assert!(res.close().is_ok());
        assert!(!res.is_alive());
        assert!(res.close().is_ok());
    }
}
