//! Typed allocator adapters over a [`Pool`](crate::pool::Pool): thin shells
//! that translate the standard "allocate(n)/deallocate(p,n)" contract onto
//! a pool's `discrete_*`/`continuous_*` operations. All the engineering
//! lives in the pool; these are deliberately narrow.

mod dynamic;
mod mono;

pub use dynamic::DynAllocator;
pub use mono::MonoAllocator;
