//! The slab pool engine and its parts.
//!
//! ## Modules
//! - `base` - the pool engine (`BasePool`)
//! - `classes` - ordered size-class table
//! - `free_list` - intrusive LIFO free lists
//! - `pages` - page ownership directory

mod base;
mod classes;
mod free_list;
mod pages;

pub use base::BasePool;
