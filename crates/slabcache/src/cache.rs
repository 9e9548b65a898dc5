//! Per-thread cache tier.
//!
//! Each OS thread owns one cache, reached only through thread-local storage,
//! so its pool needs no lock. The one cross-thread touch point is teardown:
//! the TLS destructor runs after application code on the thread has finished
//! and drains everything into the global pool under that pool's lock.

use core::cell::RefCell;
use core::ptr::NonNull;

use tracing::trace;

use crate::global::GlobalPool;
use crate::pool::BasePool;
use crate::stats::MemoryStats;

thread_local! {
    static LOCAL_CACHE: RefCell<ThreadCache> = RefCell::new(ThreadCache::new());
}

/// Unsynchronized pool wrapper living in thread-local storage.
pub(crate) struct ThreadCache {
    pool: BasePool,
}

impl ThreadCache {
    fn new() -> Self {
        Self {
            pool: BasePool::new(),
        }
    }

    pub fn allocate(&mut self, user_size: usize) -> Option<NonNull<u8>> {
        self.pool.allocate(user_size)
    }

    pub fn deallocate(&mut self, payload: *mut u8) {
        self.pool.deallocate(payload);
    }

    pub fn stats(&self) -> MemoryStats {
        self.pool.stats()
    }
}

impl Drop for ThreadCache {
    fn drop(&mut self) {
        let free_bytes = self.pool.stats().free_bytes;
        GlobalPool::instance().transfer_from(&mut self.pool);
        trace!(free_bytes, "thread cache drained into global pool");
    }
}

/// Runs `f` against the calling thread's cache. Returns `None` once the
/// thread's TLS has been torn down; callers fall through to the global pool.
pub(crate) fn with_local<R>(f: impl FnOnce(&mut ThreadCache) -> R) -> Option<R> {
    LOCAL_CACHE
        .try_with(|cache| f(&mut cache.borrow_mut()))
        .ok()
}
