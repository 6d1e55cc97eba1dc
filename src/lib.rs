//! CrystalMem implements a family of embeddable memory pools: user-space
//! allocators that sit between a host program and a low-level memory
//! *resource* (OS heap, file mapping, fixed region, …) and hand out typed
//! memory with substantially lower per-request cost than the resource
//! itself.
//!
//! The stack, leaves-first:
//!
//!  - [`resource`]: the raw memory source ([`Resource`](resource::Resource)).
//!  - [`vendor`]: a cheap, copyable handle onto a `Resource`
//!    ([`Vendor`](vendor::Vendor)), and the typed allocator adapter built on
//!    top of it ([`VendorAllocator`](vendor::VendorAllocator)).
//!  - [`pool`]: the two pooling strategies. [`SlubPool`](pool::SlubPool) is a
//!    size-classed slab allocator with O(1) alloc/free on the fast path, and
//!    [`BestFitPool`](pool::BestFitPool) is a single free-list pool serviced
//!    by best fit.
//!  - [`adapter`]: thin typed shells over a pool for node-based
//!    ([`MonoAllocator`](adapter::MonoAllocator)) and contiguous
//!    ([`DynAllocator`](adapter::DynAllocator)) containers.
//!
//! # Example
//!
//! ```rust
//! use crystalmem::{pool::{Pool, SlubPool}, resource::OsResource, vendor::Vendor};
//!
//! let resource = OsResource::new();
//! let vendor = Vendor::new(&resource);
//! let mut pool: SlubPool<'_, 4096, 2, OsResource> = SlubPool::new([8, 32], vendor, vendor);
//!
//! unsafe {
//!     let ptr = pool.new_obj(42u32).unwrap();
//!     assert_eq!(*ptr.as_ref(), 42);
//!     pool.del_obj(ptr);
//! }
//! ```
//!
//! Out of scope: process-wide logging/tracing wrappers, concrete
//! resource backends beyond the OS resource, a demo executable, build
//! packaging. Non-goals: thread-safety of a single pool instance (pools are
//! single-owner), defragmentation/compaction, leak-tracking, cross-pool
//! pointer portability.
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod adapter;
pub mod error;
pub mod pool;
pub mod resource;
pub mod vendor;

#[cfg(test)]
mod test_support;
