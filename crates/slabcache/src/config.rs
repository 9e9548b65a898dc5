//! Compile-time configuration of the pool geometry.
//!
//! Every knob is a constant: the allocator reads no environment variables and
//! no files. Changing a value here reshapes the size-class table for the
//! whole process.

use core::mem;

use crate::util::align_up;

/// Smallest user request that gets its own bucket; smaller requests (including
/// zero) round up to it.
pub const MIN_USER_SIZE: usize = 8;

/// Largest request served from the pool. Anything larger bypasses the tiers
/// and goes straight to the host allocator.
pub const MAX_USER_SIZE: usize = 2048;

/// Alignment of every block and of every payload pointer handed out.
pub const BLOCK_ALIGNMENT: usize = mem::align_of::<usize>();

/// Bytes reserved at the start of every block for the size word. The
/// free-list link lives past it and is overlapped by user payload while the
/// block is in use, so the header proper survives the block's whole lifetime.
pub const HEADER_SIZE: usize = mem::size_of::<usize>();

/// Granularity of batch fill from the host and of release back to it.
pub const PAGE_SIZE: usize = 4096;

/// Free blocks retained per size class by [`reclaim_idle`].
///
/// [`reclaim_idle`]: crate::pool::BasePool::reclaim_idle
pub const RESERVE_BLOCK_COUNT: usize = 4;

/// Ceiling on the global pool's free bytes. Crossing it on a deallocation or
/// a thread-cache hand-off triggers page reclamation.
pub const MAX_GLOBAL_FREE_MEMORY: usize = 10 * 1024 * 1024;

/// Total block size (header included) of the class serving a `user_size`
/// request.
#[inline]
pub const fn total_block_size(user_size: usize) -> usize {
    let user = if user_size < MIN_USER_SIZE {
        MIN_USER_SIZE
    } else {
        user_size
    };
    align_up(user + HEADER_SIZE, BLOCK_ALIGNMENT)
}

const _: () = {
    assert!(BLOCK_ALIGNMENT.is_power_of_two());
    assert!(HEADER_SIZE == BLOCK_ALIGNMENT);
    // The free-list link must fit in the smallest payload.
    assert!(MIN_USER_SIZE >= mem::size_of::<*mut u8>());
    assert!(MIN_USER_SIZE <= MAX_USER_SIZE);
    assert!(PAGE_SIZE % BLOCK_ALIGNMENT == 0);
    // Every class must carve at least one block per page.
    assert!(total_block_size(MAX_USER_SIZE) <= PAGE_SIZE);
};
