extern crate std;

use core::alloc::Layout;

use crate::{
    pool::Pool,
    test_support::{CountingResource, ShadowAllocator},
    vendor::Vendor,
};

use super::SlubPool;

#[test]
fn hundred_small_objects_land_in_8_byte_bucket() {
    let res = CountingResource::new();
    let v = Vendor::new(&res);
    let mut pool: SlubPool<'_, 4096, 2, CountingResource> = SlubPool::new([8, 32], v, v);

    let mut ptrs = std::vec::Vec::new();
    for _ in 0..100 {
        let p = unsafe { pool.discrete_alloc::<[u8; 4]>() }.expect("alloc failed");
        ptrs.push(p);
    }
    let capacity = (4096 - super::block::HEADER_SIZE) / 8;
    let expected_max_blocks = (100 + capacity - 1) / capacity + 1;
    assert!(res.alloc_count() <= expected_max_blocks);

    for p in ptrs {
        unsafe { pool.discrete_dealloc(p) };
    }
}

#[test]
fn block_exhaustion_spans_multiple_blocks_and_clear_balances_counts() {
    let res = CountingResource::new();
    let v = Vendor::new(&res);
    let mut pool: SlubPool<'_, 128, 1, CountingResource> = SlubPool::new([4], v, v);

    let mut ptrs = std::vec::Vec::new();
    for _ in 0..35 {
        ptrs.push(unsafe { pool.discrete_alloc::<[u8; 4]>() }.expect("alloc failed"));
    }
    assert!(res.alloc_count() >= 2, "35 objects of 4 bytes must span >= 2 blocks of 128 bytes");

    pool.clear();
    assert_eq!(res.alloc_count(), res.dealloc_count());
}

#[test]
fn oversize_goes_to_overflow_and_clear_does_not_double_free() {
    let res = CountingResource::new();
    let v = Vendor::new(&res);
    let mut pool: SlubPool<'_, 64, 2, CountingResource> = SlubPool::new([8, 32], v, v);

    let p = unsafe { pool.discrete_alloc::<[u8; 100]>() }.expect("oversize alloc failed");
    assert_eq!(pool.overflow.len(), 1);
    unsafe { pool.discrete_dealloc::<[u8; 100]>(p) };
    assert_eq!(pool.overflow.len(), 0);

    pool.clear();
    assert_eq!(res.alloc_count(), res.dealloc_count());
}

#[test]
fn non_overlap_and_alignment_under_random_traffic() {
    let res = CountingResource::new();
    let v = Vendor::new(&res);
    let mut pool: SlubPool<'_, 256, 3, CountingResource> = SlubPool::new([8, 16, 64], v, v);
    let mut shadow = ShadowAllocator::new();
    let mut live = std::vec::Vec::new();

    let mut seed = 0x1234_5678u32;
    let mut next = || {
        seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        seed
    };

    for _ in 0..500 {
        if live.len() < 2 || next() % 2 == 0 {
            let layout = Layout::from_size_align(8, 8).unwrap();
            if let Some(ptr) = unsafe { pool.discrete_alloc::<u64>() } {
                let ptr = ptr.cast::<u8>();
                shadow.record_alloc(ptr, layout);
                live.push(ptr);
            }
        } else {
            let idx = (next() as usize) % live.len();
            let ptr = live.swap_remove(idx);
            let layout = Layout::from_size_align(8, 8).unwrap();
            shadow.record_dealloc(ptr, layout);
            unsafe { pool.discrete_dealloc::<u64>(ptr.cast()) };
        }
    }

    for ptr in live {
        unsafe { pool.discrete_dealloc::<u64>(ptr.cast()) };
    }
}

#[test]
fn block_head_non_full_invariant() {
    let res = CountingResource::new();
    let v = Vendor::new(&res);
    let mut pool: SlubPool<'_, 256, 1, CountingResource> = SlubPool::new([16], v, v);

    let cap = super::block::BlockHdr::capacity(256, 16);
    let mut ptrs = std::vec::Vec::new();
    for _ in 0..(cap * 2) {
        ptrs.push(unsafe { pool.discrete_alloc::<[u8; 16]>() }.unwrap());
    }
    // Free one slot from the first block so it becomes non-full, while the
    // second (head) block stays full.
    let victim = ptrs[0];
    unsafe { pool.discrete_dealloc::<[u8; 16]>(victim) };

    let head = pool.buckets[0].head_for_test();
    assert!(unsafe { !super::block::BlockHdr::is_full(head) });

    ptrs.remove(0);
    for p in ptrs {
        unsafe { pool.discrete_dealloc::<[u8; 16]>(p) };
    }
}

#[test]
fn free_list_recovers_fully_after_burst_dealloc_in_arbitrary_order() {
    let res = CountingResource::new();
    let v = Vendor::new(&res);
    let mut pool: SlubPool<'_, 256, 1, CountingResource> = SlubPool::new([16], v, v);

    let cap = super::block::BlockHdr::capacity(256, 16);
    let mut ptrs = std::vec::Vec::new();
    for _ in 0..(cap * 3) {
        ptrs.push(unsafe { pool.discrete_alloc::<[u8; 16]>() }.unwrap());
    }
    let block_count_before = pool.buckets[0].block_count();
    assert_eq!(block_count_before, 3);

    // Shuffle the release order with a small LCG so deallocation doesn't
    // simply retrace allocation order.
    let mut seed = 0x9e37_79b9u32;
    let mut next = || {
        seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        seed
    };
    for i in (1..ptrs.len()).rev() {
        let j = (next() as usize) % (i + 1);
        ptrs.swap(i, j);
    }

    for p in ptrs {
        unsafe { pool.discrete_dealloc::<[u8; 16]>(p) };
    }

    assert_eq!(
        pool.buckets[0].block_count(),
        block_count_before,
        "dealloc must never return blocks to the resource outside of clear()"
    );

    let expected: std::vec::Vec<u32> = (0..cap as u32).collect();
    for mut block_indices in pool.buckets[0].blocks_free_indices() {
        block_indices.sort_unstable();
        assert_eq!(
            block_indices, expected,
            "each block's free list must enumerate every slot exactly once"
        );
    }
}
