//! # slabcache
//!
//! A tiered, thread-caching slab allocator for small-to-medium objects.
//!
//! Requests up to a configured ceiling are served from per-thread free lists
//! backed by segregated size classes; oversize requests fall back to the host
//! allocator; and when a thread exits, its cached free memory is recycled
//! into a shared global pool. The design target is the hot path:
//!
//! - **Zero-contention common case**: allocation and deallocation touch only
//!   thread-local state.
//! - **Bounded free memory**: the global pool reclaims idle whole pages once
//!   its free bytes cross a ceiling.
//! - **Safe hand-off**: dying threads transfer their free lists, and the
//!   ownership of the pages behind them, to the global pool.
//!
//! ## Quick start
//!
//! ```
//! let p = slabcache::allocate(64);
//! assert!(!p.is_null());
//!
//! unsafe { core::ptr::write_bytes(p, 0x42, 64) };
//! slabcache::deallocate(p);
//!
//! let local = slabcache::local_stats();
//! assert!(local.allocate_count >= 1);
//! ```
//!
//! ## Tiers
//!
//! [`allocate`] tries the calling thread's cache first, then the global
//! pool, then the host allocator; a pool tier signals "not mine" by
//! returning nothing, so the cascade needs no error plumbing.
//! [`deallocate`] always hands the pointer to the calling thread's cache:
//! the per-block header carries the size class, so any cache can recycle any
//! pool block, and anything the pool never issued is forwarded to the host.
//!
//! Configuration is compile-time only; see the [`config`] module.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all)]

pub mod config;
pub mod global;
pub mod manager;
pub mod pool;
pub mod stats;

mod cache;
mod host;
mod util;

pub use manager::{allocate, deallocate, global_stats, local_stats};
pub use stats::MemoryStats;
