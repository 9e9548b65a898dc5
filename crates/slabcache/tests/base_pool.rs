//! Integration tests for the slab pool engine.

use slabcache::config::{total_block_size, MAX_USER_SIZE, MIN_USER_SIZE, PAGE_SIZE};
use slabcache::pool::BasePool;

#[test]
fn freed_block_is_reused_lifo() {
    let mut pool = BasePool::new();

    let p = pool.allocate(64).expect("allocation failed");
    pool.deallocate(p.as_ptr());
    let q = pool.allocate(64).expect("allocation failed");

    assert_eq!(p, q, "the most recently freed block must be handed out next");
    pool.deallocate(q.as_ptr());
}

#[test]
fn requests_round_up_to_their_class() {
    let mut pool = BasePool::new();
    let total = total_block_size(15);
    assert_eq!(total, 24);
    let blocks = PAGE_SIZE / total;

    let p = pool.allocate(15).expect("allocation failed");
    let before = pool.free_blocks(total);
    assert_eq!(before, blocks - 1);

    pool.deallocate(p.as_ptr());
    assert_eq!(pool.free_blocks(total), before + 1);
}

#[test]
fn zero_size_uses_the_minimum_class() {
    let mut pool = BasePool::new();
    let total = total_block_size(0);
    assert_eq!(total, total_block_size(MIN_USER_SIZE));

    let p = pool.allocate(0).expect("allocation failed");
    // The payload must hold at least MIN_USER_SIZE bytes.
    unsafe { core::ptr::write_bytes(p.as_ptr(), 0x5A, MIN_USER_SIZE) };
    assert_eq!(pool.free_blocks(total), PAGE_SIZE / total - 1);

    pool.deallocate(p.as_ptr());
}

#[test]
fn free_bytes_matches_per_class_accounting() {
    let mut pool = BasePool::new();
    let small = total_block_size(64);
    let large = total_block_size(1024);

    let a = pool.allocate(64).expect("allocation failed");
    let b = pool.allocate(1024).expect("allocation failed");
    let c = pool.allocate(1024).expect("allocation failed");
    pool.deallocate(b.as_ptr());

    let stats = pool.stats();
    assert_eq!(
        stats.free_bytes,
        pool.free_blocks(small) * small + pool.free_blocks(large) * large
    );
    assert_eq!(stats.host_bytes % PAGE_SIZE, 0);
    assert_eq!(stats.used_bytes, stats.host_bytes - stats.free_bytes);
    assert!(stats.allocate_count >= stats.deallocate_count);

    pool.deallocate(a.as_ptr());
    pool.deallocate(c.as_ptr());
}

#[test]
fn reclaim_releases_whole_pages_and_is_idempotent() {
    let mut pool = BasePool::new();
    // user 56 -> total 64: exactly 64 blocks per page, no carved tail.
    let total = total_block_size(56);
    assert_eq!(total, 64);
    let per_page = PAGE_SIZE / total;

    let ptrs: Vec<_> = (0..2 * per_page + 1)
        .map(|_| pool.allocate(56).expect("allocation failed"))
        .collect();
    assert_eq!(pool.owned_pages(), 3);
    for p in &ptrs {
        pool.deallocate(p.as_ptr());
    }
    assert_eq!(pool.free_blocks(total), 3 * per_page);

    // Budget: (192 - 4) / 64 = 2 pages, all three fully free.
    let released = pool.reclaim_idle();
    assert_eq!(released, 2 * per_page * total);
    assert_eq!(pool.free_blocks(total), per_page);
    assert_eq!(pool.owned_pages(), 1);
    assert_eq!(pool.stats().host_bytes, PAGE_SIZE);
    assert_eq!(pool.stats().free_bytes, per_page * total);
    assert_eq!(pool.stats().used_bytes, 0);

    assert_eq!(pool.reclaim_idle(), 0, "second reclaim must be a no-op");
}

#[test]
fn reclaim_skips_pages_with_live_blocks() {
    let mut pool = BasePool::new();
    let total = total_block_size(56);
    let per_page = PAGE_SIZE / total;

    // Two pages; the last allocation is the first block of the second page.
    let ptrs: Vec<_> = (0..per_page + 1)
        .map(|_| pool.allocate(56).expect("allocation failed"))
        .collect();
    let straggler = *ptrs.last().unwrap();
    for p in &ptrs[..per_page] {
        pool.deallocate(p.as_ptr());
    }

    let released = pool.reclaim_idle();
    assert_eq!(released, per_page * total, "only the fully free page goes");
    assert_eq!(pool.owned_pages(), 1);
    assert_eq!(pool.free_blocks(total), per_page - 1);

    pool.deallocate(straggler.as_ptr());
    assert_eq!(pool.reclaim_idle(), 0, "remaining page is within the budget");
}

#[test]
fn oversize_requests_return_none_without_side_effects() {
    let mut pool = BasePool::new();
    assert!(pool.allocate(MAX_USER_SIZE + 1).is_none());
    let stats = pool.stats();
    assert_eq!(stats.allocate_count, 0);
    assert_eq!(stats.host_bytes, 0);
    assert_eq!(stats.free_bytes, 0);
}

#[test]
fn transfer_moves_blocks_pages_and_counters() {
    let mut source = BasePool::new();
    let mut dest = BasePool::new();
    let total = total_block_size(56);
    let per_page = PAGE_SIZE / total;

    let ptrs: Vec<_> = (0..per_page)
        .map(|_| source.allocate(56).expect("allocation failed"))
        .collect();
    for p in &ptrs {
        source.deallocate(p.as_ptr());
    }

    source.transfer_to(&mut dest);

    let drained = source.stats();
    assert_eq!(drained.free_bytes, 0);
    assert_eq!(drained.host_bytes, 0);
    assert_eq!(source.free_blocks(total), 0);
    assert_eq!(source.owned_pages(), 0);

    let gained = dest.stats();
    assert_eq!(gained.free_bytes, per_page * total);
    assert_eq!(gained.host_bytes, PAGE_SIZE);
    assert_eq!(gained.used_bytes, 0);
    assert_eq!(dest.free_blocks(total), per_page);
    assert_eq!(dest.owned_pages(), 1);

    // The destination serves from the transferred blocks without a new page.
    let p = dest.allocate(56).expect("allocation failed");
    assert_eq!(dest.owned_pages(), 1);
    assert_eq!(dest.stats().host_bytes, PAGE_SIZE);
    dest.deallocate(p.as_ptr());
}

#[test]
fn destination_can_reclaim_transferred_pages() {
    let mut source = BasePool::new();
    let mut dest = BasePool::new();
    let total = total_block_size(56);
    let per_page = PAGE_SIZE / total;

    let ptrs: Vec<_> = (0..2 * per_page)
        .map(|_| source.allocate(56).expect("allocation failed"))
        .collect();
    for p in &ptrs {
        source.deallocate(p.as_ptr());
    }
    source.transfer_to(&mut dest);

    // Budget (128 - 4) / 64 = 1: the destination owns the pages now and can
    // hand one back to the host.
    let released = dest.reclaim_idle();
    assert_eq!(released, per_page * total);
    assert_eq!(dest.owned_pages(), 1);
    assert_eq!(dest.stats().host_bytes, PAGE_SIZE);
}

#[test]
fn source_keeps_serving_after_transfer() {
    let mut source = BasePool::new();
    let mut dest = BasePool::new();

    let p = source.allocate(64).expect("allocation failed");
    source.deallocate(p.as_ptr());
    source.transfer_to(&mut dest);

    let q = source.allocate(64).expect("allocation failed");
    assert_eq!(source.owned_pages(), 1, "a fresh page backs the new request");
    source.deallocate(q.as_ptr());
}

#[test]
fn counters_never_decrease() {
    let mut pool = BasePool::new();
    let mut last_allocs = 0;
    let mut last_deallocs = 0;

    for round in 0..8 {
        let ptrs: Vec<_> = (0..16)
            .map(|_| pool.allocate(round * 8 + 8).expect("allocation failed"))
            .collect();
        for p in ptrs {
            pool.deallocate(p.as_ptr());
        }
        pool.reclaim_idle();

        let stats = pool.stats();
        assert!(stats.allocate_count >= last_allocs);
        assert!(stats.deallocate_count >= last_deallocs);
        last_allocs = stats.allocate_count;
        last_deallocs = stats.deallocate_count;
    }
}
