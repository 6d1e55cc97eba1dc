//! Property-based tests: round-trip, non-overlap, and alignment across
//! arbitrary alloc/free traces, for both pool kinds.
//!
//! Each property drives a `#[quickcheck] fn ... -> quickcheck::TestResult`
//! over an `Arbitrary`-derived trace of alloc/dealloc steps rather than a
//! single size/align pair, since what needs fuzzing is pool *state* over a
//! sequence, not one call.

extern crate std;

use core::ptr::NonNull;
use std::vec::Vec;

use quickcheck::{Arbitrary, Gen, TestResult};
use quickcheck_macros::quickcheck;

use crate::{
    pool::{BestFitPool, Pool, SlubPool},
    test_support::{CountingResource, ShadowAllocator},
    vendor::Vendor,
};

/// One step of a randomized alloc/dealloc trace. `Alloc` carries a seed used
/// to pick a size class; `Dealloc` carries a seed used to pick which live
/// allocation to release.
#[derive(Clone, Debug)]
enum Op {
    Alloc(u8),
    Dealloc(u8),
}

impl Arbitrary for Op {
    fn arbitrary(g: &mut Gen) -> Self {
        if bool::arbitrary(g) {
            Op::Alloc(u8::arbitrary(g))
        } else {
            Op::Dealloc(u8::arbitrary(g))
        }
    }
}

#[derive(Clone, Copy)]
enum SlubTag {
    T4,
    T20,
    T100,
    T300,
}

unsafe fn slub_alloc(
    pool: &mut SlubPool<'_, 512, 3, CountingResource>,
    seed: u8,
) -> Option<(NonNull<u8>, core::alloc::Layout, SlubTag)> {
    match seed % 4 {
        0 => pool
            .discrete_alloc::<[u8; 4]>()
            .map(|p| (p.cast(), core::alloc::Layout::new::<[u8; 4]>(), SlubTag::T4)),
        1 => pool
            .discrete_alloc::<[u8; 20]>()
            .map(|p| (p.cast(), core::alloc::Layout::new::<[u8; 20]>(), SlubTag::T20)),
        2 => pool
            .discrete_alloc::<[u8; 100]>()
            .map(|p| (p.cast(), core::alloc::Layout::new::<[u8; 100]>(), SlubTag::T100)),
        _ => pool
            .discrete_alloc::<[u8; 300]>()
            .map(|p| (p.cast(), core::alloc::Layout::new::<[u8; 300]>(), SlubTag::T300)),
    }
}

unsafe fn slub_dealloc(pool: &mut SlubPool<'_, 512, 3, CountingResource>, ptr: NonNull<u8>, tag: SlubTag) {
    match tag {
        SlubTag::T4 => pool.discrete_dealloc::<[u8; 4]>(ptr.cast()),
        SlubTag::T20 => pool.discrete_dealloc::<[u8; 20]>(ptr.cast()),
        SlubTag::T100 => pool.discrete_dealloc::<[u8; 100]>(ptr.cast()),
        SlubTag::T300 => pool.discrete_dealloc::<[u8; 300]>(ptr.cast()),
    }
}

#[quickcheck]
fn slub_trace_round_trips_and_stays_disjoint(ops: Vec<Op>) -> TestResult {
    if ops.len() > 400 {
        return TestResult::discard();
    }
    let res = CountingResource::new();
    let v = Vendor::new(&res);
    let mut pool: SlubPool<'_, 512, 3, CountingResource> = SlubPool::new([8, 32, 128], v, v);
    let mut shadow = ShadowAllocator::new();
    let mut live: Vec<(NonNull<u8>, core::alloc::Layout, SlubTag)> = Vec::new();

    for op in ops {
        match op {
            Op::Alloc(seed) => {
                if let Some((ptr, layout, tag)) = unsafe { slub_alloc(&mut pool, seed) } {
                    shadow.record_alloc(ptr, layout);
                    live.push((ptr, layout, tag));
                }
            }
            Op::Dealloc(seed) => {
                if live.is_empty() {
                    continue;
                }
                let idx = seed as usize % live.len();
                let (ptr, layout, tag) = live.swap_remove(idx);
                shadow.record_dealloc(ptr, layout);
                unsafe { slub_dealloc(&mut pool, ptr, tag) };
            }
        }
    }

    for (ptr, layout, tag) in live {
        shadow.record_dealloc(ptr, layout);
        unsafe { slub_dealloc(&mut pool, ptr, tag) };
    }

    pool.clear();
    assert_eq!(res.alloc_count(), res.dealloc_count(), "clear() must release every block taken");
    TestResult::passed()
}

unsafe fn best_fit_alloc(
    pool: &mut BestFitPool<'_, 256, CountingResource>,
    seed: u8,
) -> Option<(NonNull<u8>, usize)> {
    let n = 1 + (seed as usize % 64);
    pool.continuous_alloc::<u8>(n).map(|p| (p, n))
}

#[quickcheck]
fn best_fit_trace_round_trips_and_stays_disjoint(ops: Vec<Op>) -> TestResult {
    if ops.len() > 400 {
        return TestResult::discard();
    }
    let res = CountingResource::new();
    let v = Vendor::new(&res);
    let mut pool: BestFitPool<'_, 256, CountingResource> = BestFitPool::new(v, v);
    let mut shadow = ShadowAllocator::new();
    let mut live: Vec<(NonNull<u8>, usize)> = Vec::new();

    for op in ops {
        match op {
            Op::Alloc(seed) => {
                if let Some((ptr, n)) = unsafe { best_fit_alloc(&mut pool, seed) } {
                    let layout = core::alloc::Layout::array::<u8>(n).unwrap();
                    shadow.record_alloc(ptr, layout);
                    live.push((ptr, n));
                }
            }
            Op::Dealloc(seed) => {
                if live.is_empty() {
                    continue;
                }
                let idx = seed as usize % live.len();
                let (ptr, n) = live.swap_remove(idx);
                let layout = core::alloc::Layout::array::<u8>(n).unwrap();
                shadow.record_dealloc(ptr, layout);
                unsafe { pool.continuous_dealloc::<u8>(ptr, n) };
            }
        }
    }

    for (ptr, n) in live {
        let layout = core::alloc::Layout::array::<u8>(n).unwrap();
        shadow.record_dealloc(ptr, layout);
        unsafe { pool.continuous_dealloc::<u8>(ptr, n) };
    }

    pool.clear();
    assert_eq!(res.alloc_count(), res.dealloc_count(), "clear() must release every block taken");
    TestResult::passed()
}
