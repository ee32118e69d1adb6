//! Address-ordered block list partitioning an arena.
//!
//! Blocks live in a slab (`Vec<Option<Block>>`) and link to their
//! address-adjacent neighbors by [`BlockId`]. Splitting and coalescing are
//! index rewrites; vacated slots are recycled by later splits. A side table
//! maps each block's start offset to its id so that `free` does not walk
//! the list.
//!
//! # Invariants
//!
//! Between public operations the list satisfies:
//!
//! - blocks are in strictly increasing address order
//! - each block starts where its predecessor ends; the head starts at 0 and
//!   the tail ends at the arena capacity
//! - every block size is a positive multiple of [`GRANULE`]
//! - the list is never empty
//!
//! [`BlockList::coalesce`] additionally leaves no two adjacent free blocks
//! around the block it is called on.
//!
//! [`GRANULE`]: crate::align::GRANULE

use std::fmt;
use std::ops::Index;

use fxhash::FxBuildHasher;
#[cfg(feature = "address-index")]
use hashbrown::HashMap;
#[cfg(not(feature = "address-index"))]
use std::collections::HashMap;

use crate::align::{GRANULE, is_aligned};
use crate::error::{Error, Result};

/// Largest arena a [`BlockList`] can partition.
///
/// Every block is at least one granule, so this bound keeps the number of
/// slots within the `u32` range of [`BlockId`].
pub const MAX_CAPACITY: usize = (u32::MAX as usize).saturating_mul(GRANULE);

/// Handle to a block record inside a [`BlockList`].
///
/// Ids are slot indices. A slot is recycled after its block is absorbed by
/// a merge, so an id is only meaningful until the next `coalesce`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(u32);

impl BlockId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Whether a block is available for placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockStatus {
    /// Available to the placement policies.
    Free,
    /// Handed out by `alloc` and not yet freed.
    Used,
}

impl fmt::Display for BlockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockStatus::Free => f.write_str("free"),
            BlockStatus::Used => f.write_str("used"),
        }
    }
}

/// One contiguous run of the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    start: usize,
    size: usize,
    status: BlockStatus,
    prev: Option<BlockId>,
    next: Option<BlockId>,
}

impl Block {
    /// Offset of the first byte of the block.
    #[inline]
    #[must_use]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Size of the block in bytes.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Offset one past the last byte of the block.
    #[inline]
    #[must_use]
    pub fn end(&self) -> usize {
        self.start + self.size
    }

    /// Current status.
    #[inline]
    #[must_use]
    pub fn status(&self) -> BlockStatus {
        self.status
    }

    /// Returns `true` if the block is free.
    #[inline]
    #[must_use]
    pub fn is_free(&self) -> bool {
        self.status == BlockStatus::Free
    }

    /// Address-order predecessor.
    #[inline]
    #[must_use]
    pub fn prev(&self) -> Option<BlockId> {
        self.prev
    }

    /// Address-order successor.
    #[inline]
    #[must_use]
    pub fn next(&self) -> Option<BlockId> {
        self.next
    }
}

/// The ordered block records of one arena.
pub struct BlockList {
    /// Block records; `None` marks a vacant slot.
    slots: Vec<Option<Block>>,
    /// Vacant slot ids available for reuse.
    vacant: Vec<BlockId>,
    /// Lowest-addressed block. Always present.
    head: BlockId,
    /// Number of live blocks.
    len: usize,
    /// Bytes partitioned by the list.
    capacity: usize,
    /// Start offset to block id, for every live block.
    by_start: HashMap<usize, BlockId, FxBuildHasher>,
}

impl BlockList {
    /// Creates a list holding one free block spanning `capacity` bytes.
    ///
    /// `capacity` must be a positive multiple of the block granule no larger
    /// than [`MAX_CAPACITY`].
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0 && is_aligned(capacity));
        debug_assert!(capacity <= MAX_CAPACITY);

        let head = BlockId(0);
        let mut by_start = HashMap::with_hasher(FxBuildHasher::default());
        by_start.insert(0, head);

        BlockList {
            slots: vec![Some(Block {
                start: 0,
                size: capacity,
                status: BlockStatus::Free,
                prev: None,
                next: None,
            })],
            vacant: Vec::new(),
            head,
            len: 1,
            capacity,
            by_start,
        }
    }

    /// Number of blocks, free and used.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always `false`; a list partitions a non-empty arena.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes partitioned by the list.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Lowest-addressed block.
    #[inline]
    #[must_use]
    pub fn head(&self) -> BlockId {
        self.head
    }

    /// Returns the block for `id`, or `None` if its slot is vacant.
    #[inline]
    #[must_use]
    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    /// Returns `true` if `id` names a live block.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: BlockId) -> bool {
        self.get(id).is_some()
    }

    fn block_mut(&mut self, id: BlockId) -> &mut Block {
        self.slots[id.index()]
            .as_mut()
            .expect("block id refers to a vacant slot")
    }

    /// Iterates over every block in address order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            list: self,
            current: Some(self.head),
        }
    }

    /// Lazily yields free blocks with `size >= requested`, head to tail.
    ///
    /// The scan is restartable: calling `scan` again starts a fresh pass.
    pub fn scan(&self, requested: usize) -> Scan<'_> {
        Scan {
            list: self,
            current: Some(self.head),
            origin: self.head,
            wrap: false,
            requested,
            visited: 0,
        }
    }

    /// Like [`scan`](Self::scan), but starts at `origin`, wraps past the
    /// tail to the head once, and stops on arriving back at `origin`.
    pub fn scan_from(&self, origin: BlockId, requested: usize) -> Scan<'_> {
        debug_assert!(self.contains(origin));
        Scan {
            list: self,
            current: Some(origin),
            origin,
            wrap: true,
            requested,
            visited: 0,
        }
    }

    /// Finds the block whose start offset is exactly `addr`.
    #[must_use]
    pub fn locate_by_address(&self, addr: usize) -> Option<BlockId> {
        self.by_start.get(&addr).copied()
    }

    /// Marks a matched free block used, splitting off any leftover.
    ///
    /// The block shrinks to `requested` bytes and a new free block covering
    /// the remainder is linked directly after it. Returns the id of that
    /// leftover block, or `None` when the fit was exact.
    ///
    /// `requested` must be a positive multiple of the granule no larger
    /// than the block.
    pub fn split(&mut self, id: BlockId, requested: usize) -> Option<BlockId> {
        let block = self.block_mut(id);
        debug_assert!(block.is_free());
        debug_assert!(requested > 0 && is_aligned(requested));
        debug_assert!(block.size >= requested);

        block.status = BlockStatus::Used;
        let leftover = block.size - requested;
        if leftover == 0 {
            return None;
        }

        block.size = requested;
        let start = block.start + requested;
        let next = block.next;

        let tail = self.insert(Block {
            start,
            size: leftover,
            status: BlockStatus::Free,
            prev: Some(id),
            next,
        });
        self.block_mut(id).next = Some(tail);
        if let Some(next) = next {
            self.block_mut(next).prev = Some(tail);
        }

        fitpool_log::trace!(
            "split {:#x}: used {} bytes, leftover {} bytes at {:#x}",
            start - requested,
            requested,
            leftover,
            start
        );

        Some(tail)
    }

    /// Marks a block free without merging it.
    pub fn mark_free(&mut self, id: BlockId) {
        self.block_mut(id).status = BlockStatus::Free;
    }

    /// Merges a free block with every free neighbor.
    ///
    /// Absorbs free predecessors and successors one at a time until both
    /// neighbors are used or absent. Returns the surviving block, which is
    /// the lowest-addressed block of the merged run.
    pub fn coalesce(&mut self, id: BlockId) -> BlockId {
        let mut survivor = id;

        loop {
            let block = self[survivor];
            debug_assert!(block.is_free());

            if let Some(prev) = block.prev.filter(|&p| self[p].is_free()) {
                self.absorb_next(prev);
                survivor = prev;
            } else if block.next.is_some_and(|n| self[n].is_free()) {
                self.absorb_next(survivor);
            } else {
                return survivor;
            }
        }
    }

    /// Folds the successor of `id` into `id` and vacates its slot.
    fn absorb_next(&mut self, id: BlockId) {
        let Some(victim_id) = self[id].next else {
            return;
        };
        let victim = self.remove(victim_id);

        let block = self.block_mut(id);
        block.size += victim.size;
        block.next = victim.next;

        if let Some(next) = victim.next {
            self.block_mut(next).prev = Some(id);
        }

        fitpool_log::trace!(
            "merged {:#x} ({} bytes) into {:#x}",
            victim.start,
            victim.size,
            self[id].start
        );
    }

    fn insert(&mut self, block: Block) -> BlockId {
        let start = block.start;
        let id = match self.vacant.pop() {
            Some(id) => {
                self.slots[id.index()] = Some(block);
                id
            }
            None => {
                let raw = u32::try_from(self.slots.len())
                    .expect("MAX_CAPACITY bounds the slot count");
                self.slots.push(Some(block));
                BlockId(raw)
            }
        };
        self.by_start.insert(start, id);
        self.len += 1;
        id
    }

    fn remove(&mut self, id: BlockId) -> Block {
        let block = self.slots[id.index()]
            .take()
            .expect("block id refers to a vacant slot");
        self.by_start.remove(&block.start);
        self.vacant.push(id);
        self.len -= 1;
        block
    }

    /// Checks every structural invariant.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvariantViolation`] describing the first problem
    /// found.
    pub fn validate(&self) -> Result<()> {
        let violation = |detail: String| Err(Error::InvariantViolation { detail });

        let mut expected_start = 0;
        let mut prev: Option<BlockId> = None;
        let mut prev_free = false;
        let mut count = 0;

        let mut current = Some(self.head);
        while let Some(id) = current {
            let Some(block) = self.get(id) else {
                return violation(format!("link to vacant slot {}", id.0));
            };
            count += 1;
            if count > self.slots.len() {
                return violation("cycle in block links".into());
            }
            if block.prev != prev {
                return violation(format!("bad back link at {:#x}", block.start));
            }
            if block.start != expected_start {
                return violation(format!(
                    "block at {:#x}, expected {:#x}",
                    block.start, expected_start
                ));
            }
            if block.size == 0 || !is_aligned(block.size) {
                return violation(format!(
                    "block at {:#x} has size {}",
                    block.start, block.size
                ));
            }
            if prev_free && block.is_free() {
                return violation(format!(
                    "adjacent free blocks at {:#x}",
                    block.start
                ));
            }
            if self.by_start.get(&block.start) != Some(&id) {
                return violation(format!(
                    "address index misses {:#x}",
                    block.start
                ));
            }

            expected_start = block.end();
            prev_free = block.is_free();
            prev = Some(id);
            current = block.next;
        }

        if expected_start != self.capacity {
            return violation(format!(
                "blocks cover {} of {} bytes",
                expected_start, self.capacity
            ));
        }
        if count != self.len || self.by_start.len() != self.len {
            return violation(format!(
                "{} linked blocks, {} counted, {} indexed",
                count,
                self.len,
                self.by_start.len()
            ));
        }
        Ok(())
    }
}

impl Index<BlockId> for BlockList {
    type Output = Block;

    fn index(&self, id: BlockId) -> &Block {
        self.get(id).expect("block id refers to a vacant slot")
    }
}

impl fmt::Debug for BlockList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter().map(|(_, b)| b)).finish()
    }
}

/// Address-order iterator over all blocks.
pub struct Iter<'a> {
    list: &'a BlockList,
    current: Option<BlockId>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (BlockId, &'a Block);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        let block = &self.list[id];
        self.current = block.next;
        Some((id, block))
    }
}

/// Lazy search for free blocks large enough for a request.
///
/// Produced by [`BlockList::scan`] and [`BlockList::scan_from`]. Counts
/// every block record it steps over, matching or not.
#[derive(Clone)]
pub struct Scan<'a> {
    list: &'a BlockList,
    current: Option<BlockId>,
    origin: BlockId,
    wrap: bool,
    requested: usize,
    visited: usize,
}

impl Scan<'_> {
    /// Number of block records examined so far.
    #[must_use]
    pub fn visited(&self) -> usize {
        self.visited
    }
}

impl<'a> Iterator for Scan<'a> {
    type Item = (BlockId, &'a Block);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.current {
            let block = &self.list[id];
            self.visited += 1;

            self.current = match block.next {
                Some(next) => Some(next),
                None if self.wrap => Some(self.list.head),
                None => None,
            };
            if self.current == Some(self.origin) {
                self.current = None;
            }

            if block.is_free() && block.size >= self.requested {
                return Some((id, block));
            }
        }
        None
    }
}
