//! The size-classed slab pool engine.
//!
//! # Safety
//!
//! The pool owns raw memory outright:
//! - Every block reachable from a free list lies inside a page recorded in
//!   this pool's directory or inside a page another pool carved and whose
//!   blocks migrated here through deallocation or transfer.
//! - A block is either on exactly one free list or held by exactly one
//!   caller; the tiers never share a block.
//! - Pages go back to the host only whole, and only when every block carved
//!   from them sits on this pool's lists.
//!
//! The engine is single-threaded by contract (`&mut self` everywhere): the
//! thread cache embeds one per thread, the global pool serializes one behind
//! a mutex.

use core::ptr::NonNull;
use std::collections::HashMap;

use tracing::trace;

use crate::config::{
    HEADER_SIZE, MAX_USER_SIZE, PAGE_SIZE, RESERVE_BLOCK_COUNT, total_block_size,
};
use crate::host::HostAllocator;
use crate::stats::{MemoryStats, PoolCounters};

use super::classes::ClassTable;
use super::free_list::FreeBlock;
use super::pages::{PageDirectory, PageRecord};

/// Slab pool with segregated size classes.
///
/// Serves requests up to [`MAX_USER_SIZE`] from per-class free lists,
/// batch-filling a class with a whole host page when its list runs dry.
/// Dropping the pool returns every owned page to the host; payloads still
/// outstanding from it must not be used afterwards.
pub struct BasePool {
    classes: ClassTable,
    pages: PageDirectory,
    counters: PoolCounters,
    host: HostAllocator,
}

// SAFETY: BasePool owns every block reachable from its free lists and every
// page in its directory outright; the raw pointers never alias another pool's
// state, so moving the pool to another thread moves that ownership with it.
unsafe impl Send for BasePool {}

impl BasePool {
    /// Creates a pool with every size class pre-populated and all lists
    /// empty. No pages are fetched until the first allocation.
    pub fn new() -> Self {
        Self {
            classes: ClassTable::new(),
            pages: PageDirectory::new(),
            counters: PoolCounters::new(),
            host: HostAllocator::new(),
        }
    }

    /// Serves `user_size` bytes from the pool.
    ///
    /// Returns `None` for requests above [`MAX_USER_SIZE`] and when the host
    /// refuses a page during batch fill; the caller routes those to the next
    /// tier. The returned pointer is the block payload, `HEADER_SIZE` past
    /// the block base and aligned to the block alignment.
    pub fn allocate(&mut self, user_size: usize) -> Option<NonNull<u8>> {
        if user_size > MAX_USER_SIZE {
            return None;
        }
        let total_size = total_block_size(user_size);
        let index = self.classes.index_for(total_size);

        if self.classes.get(index).free.is_empty() {
            self.batch_fill(index, total_size)?;
        }

        let class = self.classes.get_mut(index);
        let block = class.free.pop()?;
        class.free_count -= 1;
        self.counters.record_allocation(total_size);

        // SAFETY: the block spans `total_size >= HEADER_SIZE` bytes, so the
        // payload offset stays inside it.
        let payload = unsafe { block.cast::<u8>().as_ptr().add(HEADER_SIZE) };
        // SAFETY: offsetting a non-null block base by HEADER_SIZE cannot wrap
        // to null.
        Some(unsafe { NonNull::new_unchecked(payload) })
    }

    /// Returns a payload pointer to its class's free list.
    ///
    /// Null is a no-op. Blocks this pool family never issued (a zero or
    /// sub-minimum size word, or a size no class matches) are forwarded to
    /// the host's free on the payload pointer itself. That round-trips
    /// exactly for oversize pointers the facade handed out; any other foreign
    /// pointer is outside the supported contract.
    pub fn deallocate(&mut self, payload: *mut u8) {
        let Some(payload) = NonNull::new(payload) else {
            return;
        };
        // SAFETY: for a pool payload the header word precedes it inside the
        // same block; for an oversize host pointer the word before it is heap
        // metadata that is readable on the supported hosts and whose value
        // fails the class checks below, sending the pointer back to the host
        // untouched.
        let block = unsafe { payload.as_ptr().sub(HEADER_SIZE) }.cast::<FreeBlock>();
        let total_size = unsafe { (*block).total_size };

        if total_size == 0 || total_size < self.classes.smallest_total_size() {
            // SAFETY: not a pool block; per the escape-hatch contract the
            // payload pointer is exactly what the host handed out.
            unsafe { self.host.free(payload) };
            return;
        }
        let Some(index) = self.classes.lookup(total_size) else {
            // SAFETY: as above, unmatched sizes take the escape hatch.
            unsafe { self.host.free(payload) };
            return;
        };

        let class = self.classes.get_mut(index);
        // SAFETY: the header matched class `index`, so this is a pool block
        // of that class returning to exclusive pool ownership.
        unsafe { class.free.push(NonNull::new_unchecked(block)) };
        class.free_count += 1;
        self.counters.record_deallocation(total_size);
    }

    /// Obtains one page from the host and carves it into blocks for class
    /// `index`. Any tail shorter than a block stays unused until the page is
    /// released. Returns `None` when the host refuses the page.
    fn batch_fill(&mut self, index: usize, total_size: usize) -> Option<()> {
        let blocks = PAGE_SIZE / total_size;
        let page = self.host.alloc(PAGE_SIZE)?;
        let base = page.as_ptr() as usize;

        let class = self.classes.get_mut(index);
        // Reverse order so the page's first block ends up as the list head.
        for i in (0..blocks).rev() {
            // SAFETY: `(i + 1) * total_size <= PAGE_SIZE`, so every block
            // lies inside the fresh page; the page base is host-aligned and
            // `total_size` is a multiple of the block alignment, so each
            // block address is aligned for `FreeBlock`. Nothing else
            // references the page yet.
            unsafe {
                let block = page.as_ptr().add(i * total_size).cast::<FreeBlock>();
                (*block).total_size = total_size;
                class.free.push(NonNull::new_unchecked(block));
            }
        }
        class.free_count += blocks;

        self.pages.insert(base, PageRecord { total_size });
        self.counters
            .record_batch_fill(blocks * total_size, PAGE_SIZE);
        trace!(total_size, blocks, "batch-filled size class from host page");
        Some(())
    }

    /// Releases idle whole pages back to the host, keeping at least
    /// [`RESERVE_BLOCK_COUNT`] free blocks per class. Returns the released
    /// block bytes.
    ///
    /// Only pages whose full contingent of blocks sits on this pool's lists,
    /// and whose record this pool owns, are touched: the host sees exactly
    /// the allocations it handed out, never a mid-page pointer.
    pub fn reclaim_idle(&mut self) -> usize {
        let mut released = 0;
        for index in 0..self.classes.len() {
            released += self.reclaim_class(index);
        }
        released
    }

    fn reclaim_class(&mut self, index: usize) -> usize {
        let class = self.classes.get(index);
        let total_size = class.total_size;
        let free_count = class.free_count;
        if free_count <= RESERVE_BLOCK_COUNT {
            return 0;
        }
        let blocks_per_page = PAGE_SIZE / total_size;
        let budget = (free_count - RESERVE_BLOCK_COUNT) / blocks_per_page;
        if budget == 0 {
            return 0;
        }

        // First pass: attribute each free block to its owning page.
        let mut free_per_page: HashMap<usize, usize> = HashMap::new();
        for block in class.free.iter() {
            if let Some(base) = self.pages.owner_of(block.as_ptr() as usize) {
                *free_per_page.entry(base).or_insert(0) += 1;
            }
        }

        // Pages with every block back on the list, capped by the budget.
        let mut victims: Vec<usize> = free_per_page
            .into_iter()
            .filter(|&(_, count)| count == blocks_per_page)
            .map(|(base, _)| base)
            .collect();
        victims.sort_unstable();
        victims.truncate(budget);
        if victims.is_empty() {
            return 0;
        }

        // Second pass: unlink every block living on a victim page.
        let pages = &self.pages;
        let class = self.classes.get_mut(index);
        let removed = class.free.retain(|block| {
            match pages.owner_of(block.as_ptr() as usize) {
                Some(base) => victims.binary_search(&base).is_err(),
                None => true,
            }
        });
        debug_assert_eq!(removed, victims.len() * blocks_per_page);
        class.free_count -= removed;

        for &base in &victims {
            let record = self.pages.remove(base);
            debug_assert_eq!(record.map(|page| page.total_size), Some(total_size));
            // SAFETY: `base` is a page this pool obtained from the host, and
            // every block carved from it has just been unlinked, so nothing
            // references the page any more.
            unsafe {
                self.host.free(NonNull::new_unchecked(base as *mut u8));
            }
        }

        let block_bytes = removed * total_size;
        self.counters
            .record_release(block_bytes, victims.len() * PAGE_SIZE);
        trace!(
            total_size,
            pages = victims.len(),
            "released idle pages to host"
        );
        block_bytes
    }

    /// Splices every free chain and every owned page into `dest`, leaving
    /// this pool empty of free memory.
    ///
    /// Page ownership travels with the blocks: records for pages whose
    /// remaining blocks are still held by callers move too, so those pages
    /// can be reclaimed by the destination once the stragglers drain back to
    /// it.
    pub fn transfer_to(&mut self, dest: &mut BasePool) {
        for class in self.classes.iter_mut() {
            if class.free.is_empty() {
                continue;
            }
            let total_size = class.total_size;
            let count = class.free_count;

            let dest_index = dest.classes.index_for(total_size);
            let dest_class = dest.classes.get_mut(dest_index);
            class.free.splice_into(&mut dest_class.free);
            dest_class.free_count += count;
            class.free_count = 0;

            let bytes = count * total_size;
            self.counters.sub_free(bytes);
            dest.counters.add_free(bytes);
        }

        let moved = self.pages.drain_into(&mut dest.pages);
        let page_bytes = moved * PAGE_SIZE;
        self.counters.sub_host(page_bytes);
        dest.counters.add_host(page_bytes);
    }

    /// Snapshot of the pool's counters.
    pub fn stats(&self) -> MemoryStats {
        self.counters.snapshot()
    }

    /// Free blocks currently listed for the class of exactly `total_size`
    /// bytes. Zero for unknown sizes. Diagnostic accessor.
    pub fn free_blocks(&self, total_size: usize) -> usize {
        self.classes
            .lookup(total_size)
            .map_or(0, |index| self.classes.get(index).free_count)
    }

    /// Host pages this pool currently owns. Diagnostic accessor.
    pub fn owned_pages(&self) -> usize {
        self.pages.len()
    }
}

impl Default for BasePool {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BasePool {
    fn drop(&mut self) {
        for base in self.pages.take_all() {
            // SAFETY: the page came from the host and is owned by this pool;
            // after drop nothing can reach blocks carved from it through the
            // pool. Outstanding payloads are the caller's contract violation,
            // as documented on the type.
            unsafe {
                self.host.free(NonNull::new_unchecked(base as *mut u8));
            }
        }
    }
}
