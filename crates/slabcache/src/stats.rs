//! Allocation statistics.
//!
//! Counters live on pools that are otherwise unsynchronized (a thread cache
//! has no lock), so they are relaxed atomics: writers are single-threaded per
//! pool, readers take snapshots. A snapshot may be torn across fields; no
//! cross-field consistency is promised.

use core::fmt;
use core::sync::atomic::{AtomicUsize, Ordering};

/// Point-in-time view of one pool's activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryStats {
    /// Cumulative allocations served from the pool.
    pub allocate_count: usize,
    /// Cumulative deallocations accepted by the pool.
    pub deallocate_count: usize,
    /// Bytes currently sitting on free lists.
    pub free_bytes: usize,
    /// Bytes currently handed out to callers: host bytes minus free bytes.
    pub used_bytes: usize,
    /// Bytes currently held from the host, in whole pages.
    pub host_bytes: usize,
}

impl fmt::Display for MemoryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pool statistics:")?;
        writeln!(f, "  Allocate count: {}", self.allocate_count)?;
        writeln!(f, "  Deallocate count: {}", self.deallocate_count)?;
        writeln!(f, "  Free memory: {} bytes", self.free_bytes)?;
        writeln!(f, "  Used memory: {} bytes", self.used_bytes)?;
        write!(f, "  Host memory: {} bytes", self.host_bytes)
    }
}

/// Relaxed atomic counters backing [`MemoryStats`].
#[derive(Debug)]
pub(crate) struct PoolCounters {
    allocations: AtomicUsize,
    deallocations: AtomicUsize,
    free_bytes: AtomicUsize,
    host_bytes: AtomicUsize,
}

impl PoolCounters {
    pub const fn new() -> Self {
        Self {
            allocations: AtomicUsize::new(0),
            deallocations: AtomicUsize::new(0),
            free_bytes: AtomicUsize::new(0),
            host_bytes: AtomicUsize::new(0),
        }
    }

    /// A page arrived from the host and `carved_bytes` of it became free
    /// blocks.
    pub fn record_batch_fill(&self, carved_bytes: usize, page_bytes: usize) {
        self.free_bytes.fetch_add(carved_bytes, Ordering::Relaxed);
        self.host_bytes.fetch_add(page_bytes, Ordering::Relaxed);
    }

    /// A block of `total_size` bytes left a free list for a caller.
    pub fn record_allocation(&self, total_size: usize) {
        self.allocations.fetch_add(1, Ordering::Relaxed);
        self.free_bytes.fetch_sub(total_size, Ordering::Relaxed);
    }

    /// A block of `total_size` bytes came back onto a free list.
    pub fn record_deallocation(&self, total_size: usize) {
        self.deallocations.fetch_add(1, Ordering::Relaxed);
        self.free_bytes.fetch_add(total_size, Ordering::Relaxed);
    }

    /// Whole pages went back to the host: `block_bytes` of free blocks gone,
    /// `page_bytes` of host memory released.
    pub fn record_release(&self, block_bytes: usize, page_bytes: usize) {
        self.free_bytes.fetch_sub(block_bytes, Ordering::Relaxed);
        self.host_bytes.fetch_sub(page_bytes, Ordering::Relaxed);
    }

    /// Free bytes moved out of this pool by a transfer.
    pub fn sub_free(&self, bytes: usize) {
        self.free_bytes.fetch_sub(bytes, Ordering::Relaxed);
    }

    /// Free bytes moved into this pool by a transfer.
    pub fn add_free(&self, bytes: usize) {
        self.free_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Page ownership moved out of this pool by a transfer.
    pub fn sub_host(&self, bytes: usize) {
        self.host_bytes.fetch_sub(bytes, Ordering::Relaxed);
    }

    /// Page ownership moved into this pool by a transfer.
    pub fn add_host(&self, bytes: usize) {
        self.host_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MemoryStats {
        let free_bytes = self.free_bytes.load(Ordering::Relaxed);
        let host_bytes = self.host_bytes.load(Ordering::Relaxed);
        MemoryStats {
            allocate_count: self.allocations.load(Ordering::Relaxed),
            deallocate_count: self.deallocations.load(Ordering::Relaxed),
            free_bytes,
            used_bytes: host_bytes.saturating_sub(free_bytes),
            host_bytes,
        }
    }
}

impl Default for PoolCounters {
    fn default() -> Self {
        Self::new()
    }
}
