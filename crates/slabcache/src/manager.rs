//! Process-wide facade: the tier router.
//!
//! Allocation walks thread cache → global pool → host. A pool tier answers
//! `None` for oversize requests and for page-fill failures, so the cascade
//! needs no error plumbing; the host is the always-available last resort.
//! Deallocation always lands on the calling thread's cache, which recognizes
//! pool blocks by their header and hands anything else back to the host;
//! that is what makes cross-thread frees work.

use core::ptr;

use crate::cache;
use crate::config::BLOCK_ALIGNMENT;
use crate::global::GlobalPool;
use crate::host::HostAllocator;
use crate::stats::MemoryStats;
use crate::util::align_up;

/// Allocates `user_size` bytes, aligned to [`BLOCK_ALIGNMENT`].
///
/// Returns null only when the host allocator itself is exhausted. Requests
/// above the pool ceiling are served directly by the host; their pointers
/// still go through [`deallocate`].
pub fn allocate(user_size: usize) -> *mut u8 {
    if let Some(payload) = cache::with_local(|cache| cache.allocate(user_size)).flatten() {
        return payload.as_ptr();
    }
    if let Some(payload) = GlobalPool::instance().allocate(user_size) {
        return payload.as_ptr();
    }
    let size = align_up(user_size.max(1), BLOCK_ALIGNMENT);
    HostAllocator::new()
        .alloc(size)
        .map_or(ptr::null_mut(), |payload| payload.as_ptr())
}

/// Releases a pointer obtained from [`allocate`]. Null is a no-op;
/// double-free is undefined.
///
/// The pointer may come from any thread: the receiving cache is the calling
/// thread's, and the block's header carries its size class.
pub fn deallocate(ptr: *mut u8) {
    if ptr.is_null() {
        return;
    }
    if cache::with_local(|cache| cache.deallocate(ptr)).is_none() {
        // TLS already torn down on this thread; route through the global
        // pool instead.
        GlobalPool::instance().deallocate(ptr);
    }
}

/// Statistics of the process-wide pool.
pub fn global_stats() -> MemoryStats {
    GlobalPool::instance().stats()
}

/// Statistics of the calling thread's cache. Zeroes once the thread's TLS
/// has been torn down.
pub fn local_stats() -> MemoryStats {
    cache::with_local(|cache| cache.stats()).unwrap_or_default()
}
