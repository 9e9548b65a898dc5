//! Segregated size-class table.
//!
//! One record per supported total block size, kept strictly sorted so class
//! lookup is a binary search and the defensive insert path keeps the order.

use crate::config::{BLOCK_ALIGNMENT, MAX_USER_SIZE, MIN_USER_SIZE, total_block_size};

use super::free_list::FreeList;

/// One size class: a total block size, its free chain, and the chain length.
#[derive(Debug)]
pub(crate) struct SizeClass {
    pub total_size: usize,
    pub free: FreeList,
    pub free_count: usize,
}

impl SizeClass {
    fn new(total_size: usize) -> Self {
        Self {
            total_size,
            free: FreeList::new(),
            free_count: 0,
        }
    }
}

/// Ordered table of size classes, strictly ascending by total size.
#[derive(Debug)]
pub(crate) struct ClassTable {
    classes: Vec<SizeClass>,
}

impl ClassTable {
    /// Builds the table with every class the configuration produces: one per
    /// aligned user size from `MIN_USER_SIZE` through `MAX_USER_SIZE`.
    pub fn new() -> Self {
        let mut table = Self {
            classes: Vec::with_capacity((MAX_USER_SIZE - MIN_USER_SIZE) / BLOCK_ALIGNMENT + 1),
        };
        for user in (MIN_USER_SIZE..=MAX_USER_SIZE).step_by(BLOCK_ALIGNMENT) {
            table.index_for(total_block_size(user));
        }
        table
    }

    /// Index of the class with exactly `total_size`, if present.
    pub fn lookup(&self, total_size: usize) -> Option<usize> {
        self.classes
            .binary_search_by_key(&total_size, |class| class.total_size)
            .ok()
    }

    /// Index of the class with `total_size`, inserting it in sorted order if
    /// absent. The insert arm is defensive: the constructor pre-populates
    /// every class the configuration can produce, so it only fires for sizes
    /// introduced by a transfer from a differently-shaped peer.
    pub fn index_for(&mut self, total_size: usize) -> usize {
        match self
            .classes
            .binary_search_by_key(&total_size, |class| class.total_size)
        {
            Ok(index) => index,
            Err(index) => {
                self.classes.insert(index, SizeClass::new(total_size));
                index
            }
        }
    }

    pub fn get(&self, index: usize) -> &SizeClass {
        &self.classes[index]
    }

    pub fn get_mut(&mut self, index: usize) -> &mut SizeClass {
        &mut self.classes[index]
    }

    /// Total size of the smallest class. The table is never empty, so this
    /// is the floor below which a header's size word marks a foreign block.
    pub fn smallest_total_size(&self) -> usize {
        self.classes[0].total_size
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SizeClass> {
        self.classes.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SizeClass> {
        self.classes.iter_mut()
    }
}
