//! Process-wide fallback pool.

use core::ptr::NonNull;
use std::sync::OnceLock;

use parking_lot::Mutex;
use tracing::debug;

use crate::config::MAX_GLOBAL_FREE_MEMORY;
use crate::pool::BasePool;
use crate::stats::MemoryStats;

/// The shared tier: one [`BasePool`] behind a mutex.
///
/// Serves allocations when a thread cache comes up empty and absorbs the
/// free lists of caches whose threads have exited. Crossing the
/// [`MAX_GLOBAL_FREE_MEMORY`] ceiling on any return path triggers page
/// reclamation, which bounds steady-state free memory under bursty return
/// traffic.
pub struct GlobalPool {
    inner: Mutex<BasePool>,
}

impl GlobalPool {
    fn new() -> Self {
        Self {
            inner: Mutex::new(BasePool::new()),
        }
    }

    /// The process-wide instance, created on first use and never destroyed.
    /// Statics do not drop, so the global pool structurally outlives every
    /// thread cache that will transfer into it.
    pub fn instance() -> &'static GlobalPool {
        static GLOBAL: OnceLock<GlobalPool> = OnceLock::new();
        GLOBAL.get_or_init(GlobalPool::new)
    }

    /// Serves `user_size` bytes from the shared pool. Same contract as
    /// [`BasePool::allocate`], under the lock.
    pub fn allocate(&self, user_size: usize) -> Option<NonNull<u8>> {
        self.inner.lock().allocate(user_size)
    }

    /// Returns a payload to the shared pool, then reclaims idle pages if the
    /// free-byte ceiling was crossed.
    pub fn deallocate(&self, payload: *mut u8) {
        let mut pool = self.inner.lock();
        pool.deallocate(payload);
        Self::enforce_ceiling(&mut pool);
    }

    /// Absorbs all free memory and page ownership of `src`, then reclaims
    /// idle pages if the free-byte ceiling was crossed.
    pub fn transfer_from(&self, src: &mut BasePool) {
        let mut pool = self.inner.lock();
        src.transfer_to(&mut pool);
        Self::enforce_ceiling(&mut pool);
    }

    /// Snapshot of the shared pool's counters, taken under the lock.
    pub fn stats(&self) -> MemoryStats {
        self.inner.lock().stats()
    }

    fn enforce_ceiling(pool: &mut BasePool) {
        if pool.stats().free_bytes > MAX_GLOBAL_FREE_MEMORY {
            let released = pool.reclaim_idle();
            if released > 0 {
                debug!(released, "global pool crossed free-memory ceiling, reclaimed idle pages");
            }
        }
    }
}
