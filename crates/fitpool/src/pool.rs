//! A fixed-capacity pool: arena, block list and active placement.
//!
//! # Allocation
//!
//! 1. Round the request up to the block granule
//! 2. Ask the placement policy for a free block (read-only scan)
//! 3. Split the block, mark it used, and return its start offset
//!
//! # Deallocation
//!
//! 1. Look up the used block starting at the address
//! 2. Mark it free
//! 3. Merge it with every free neighbor
//!
//! # Example
//!
//! ```
//! use fitpool::{Address, Placement, Pool};
//!
//! let mut pool = Pool::new(100, Placement::FirstFit)?;
//!
//! let a = pool.alloc(20)?;
//! let b = pool.alloc(30)?;
//! assert_eq!((a.offset(), b.offset()), (0, 20));
//!
//! pool.free(a)?;
//! assert_eq!(pool.alloc(10)?, Address::new(0));
//! # Ok::<(), fitpool::Error>(())
//! ```

use std::fmt;

use crate::align::align_up;
use crate::arena::Arena;
use crate::block::{Block, BlockId, BlockList, MAX_CAPACITY};
use crate::config::PoolConfig;
use crate::error::{Error, Result};
use crate::placement::Placement;

/// Level for rejected requests. They already surface as `Err`, so they stay
/// below the default `Info` filter.
const REJECTION_LEVEL: fitpool_log::Level = fitpool_log::Level::Debug;

/// Offset of an allocation within its pool's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(usize);

impl Address {
    /// Wraps an arena offset.
    #[inline]
    #[must_use]
    pub const fn new(offset: usize) -> Self {
        Address(offset)
    }

    /// Returns the arena offset.
    #[inline]
    #[must_use]
    pub const fn offset(self) -> usize {
        self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl From<Address> for usize {
    fn from(addr: Address) -> usize {
        addr.0
    }
}

/// Operation counters kept across the pool's lifetime.
#[derive(Debug, Clone, Copy, Default)]
struct Counters {
    allocations: usize,
    frees: usize,
    failed_allocations: usize,
    blocks_examined: usize,
}

/// Point-in-time view of pool occupancy and search cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Arena size in bytes.
    pub capacity: usize,
    /// Number of blocks, free and used.
    pub block_count: usize,
    /// Number of free blocks.
    pub free_blocks: usize,
    /// Number of used blocks.
    pub used_blocks: usize,
    /// Bytes in free blocks.
    pub free_bytes: usize,
    /// Bytes in used blocks.
    pub used_bytes: usize,
    /// Size of the largest free block.
    pub largest_free: usize,
    /// Successful allocations.
    pub allocations: usize,
    /// Successful frees.
    pub frees: usize,
    /// Allocations rejected with [`Error::PoolExhausted`].
    pub failed_allocations: usize,
    /// Block records examined by placement searches.
    pub blocks_examined: usize,
}

impl PoolStats {
    /// Share of free space outside the largest free block.
    ///
    /// `0.0` means all free space is one block. Returns `None` when nothing
    /// is free.
    #[must_use]
    pub fn fragmentation(&self) -> Option<f64> {
        if self.free_bytes == 0 {
            None
        } else {
            #[allow(clippy::cast_precision_loss)]
            Some(1.0 - self.largest_free as f64 / self.free_bytes as f64)
        }
    }

    /// Mean block records examined per allocation attempt.
    #[must_use]
    pub fn average_scan_length(&self) -> Option<f64> {
        let attempts = self.allocations + self.failed_allocations;
        if attempts == 0 {
            None
        } else {
            #[allow(clippy::cast_precision_loss)]
            Some(self.blocks_examined as f64 / attempts as f64)
        }
    }
}

/// A fixed-capacity memory pool.
///
/// Owns its arena and block list exclusively. Every mutating operation
/// takes `&mut self`; a pool can move between threads but is never shared.
/// Dropping the pool releases the arena and all block records.
pub struct Pool {
    arena: Arena,
    blocks: BlockList,
    placement: Placement,
    /// Block of the last successful allocation, for next-fit.
    cursor: Option<BlockId>,
    counters: Counters,
}

impl Pool {
    /// Creates a pool of `capacity` bytes rounded up to the block granule.
    ///
    /// The pool starts as a single free block spanning the whole arena.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidCapacity`] if `capacity` is zero, larger than
    ///   [`MAX_CAPACITY`] after rounding, or cannot be allocated
    /// - [`Error::ArenaAllocationFailed`] if the arena cannot be obtained
    pub fn new(capacity: usize, placement: Placement) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity);
        }
        let capacity = align_up(capacity)
            .filter(|&c| c <= MAX_CAPACITY)
            .ok_or(Error::InvalidCapacity)?;
        let arena = Arena::new(capacity)?;

        fitpool_log::debug!(
            "pool created: {} bytes, {} placement",
            capacity,
            placement
        );

        Ok(Pool {
            arena,
            blocks: BlockList::new(capacity),
            placement,
            cursor: None,
            counters: Counters::default(),
        })
    }

    /// Creates a pool from a [`PoolConfig`].
    ///
    /// # Errors
    ///
    /// As for [`Pool::new`].
    pub fn with_config(config: &PoolConfig) -> Result<Self> {
        Self::new(config.capacity, config.placement)
    }

    /// Reserves `size` bytes, rounded up to the block granule.
    ///
    /// A zero-byte request reserves one granule so that every live
    /// allocation has a distinct address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PoolExhausted`] if no free block is large enough.
    /// The block list is unchanged on failure.
    pub fn alloc(&mut self, size: usize) -> Result<Address> {
        let Some(requested) = align_up(size.max(1)) else {
            return Err(self.exhausted(size));
        };

        let selection = self.placement.select(&self.blocks, requested, self.cursor);
        self.counters.blocks_examined += selection.examined;

        let Some(id) = selection.block else {
            return Err(self.exhausted(size));
        };

        self.blocks.split(id, requested);
        self.cursor = Some(id);
        self.counters.allocations += 1;

        let start = self.blocks[id].start();
        fitpool_log::trace!(
            "alloc {} -> {} bytes at {:#x} ({} examined)",
            size,
            requested,
            start,
            selection.examined
        );
        Ok(Address(start))
    }

    #[cold]
    fn exhausted(&mut self, size: usize) -> Error {
        self.counters.failed_allocations += 1;
        let largest_free = self.largest_free();
        fitpool_log::log!(
            level: REJECTION_LEVEL,
            "pool exhausted: {} bytes requested, largest free block {} bytes",
            size,
            largest_free
        );
        Error::PoolExhausted {
            requested: size,
            largest_free,
        }
    }

    /// Releases the allocation starting at `addr`.
    ///
    /// The block is merged with any free neighbors, so after this returns
    /// no two adjacent blocks are free.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AddressNotFound`] if no used block starts at
    /// `addr`; nothing changes in that case.
    pub fn free(&mut self, addr: Address) -> Result<()> {
        let id = self.live_block(addr)?;

        self.blocks.mark_free(id);
        let survivor = self.blocks.coalesce(id);

        if self.cursor.is_some_and(|c| !self.blocks.contains(c)) {
            self.cursor = Some(survivor);
        }
        self.counters.frees += 1;

        fitpool_log::trace!(
            "free {} -> free run {:#x}..{:#x}",
            addr,
            self.blocks[survivor].start(),
            self.blocks[survivor].end()
        );
        Ok(())
    }

    fn live_block(&self, addr: Address) -> Result<BlockId> {
        match self.blocks.locate_by_address(addr.0) {
            Some(id) if !self.blocks[id].is_free() => Ok(id),
            _ => {
                fitpool_log::log!(
                    level: REJECTION_LEVEL,
                    "no live allocation at {}",
                    addr
                );
                Err(Error::AddressNotFound { addr: addr.0 })
            }
        }
    }

    /// Number of blocks, free and used.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.blocks.len()
    }

    /// Arena size in bytes, after rounding.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// The active placement policy.
    #[inline]
    #[must_use]
    pub fn placement(&self) -> Placement {
        self.placement
    }

    /// Iterates over every block in address order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> + '_ {
        self.blocks.iter().map(|(_, block)| block)
    }

    /// Size of the largest free block, or 0 if none is free.
    #[must_use]
    pub fn largest_free(&self) -> usize {
        self.blocks()
            .filter(|b| b.is_free())
            .map(Block::size)
            .max()
            .unwrap_or(0)
    }

    /// Borrows the bytes of the live allocation at `addr`.
    ///
    /// The slice covers the whole block, including alignment padding.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AddressNotFound`] if no used block starts at `addr`.
    pub fn payload(&self, addr: Address) -> Result<&[u8]> {
        let block = self.blocks[self.live_block(addr)?];
        self.arena
            .slice(block.start(), block.size())
            .ok_or(Error::AddressNotFound { addr: addr.0 })
    }

    /// Mutably borrows the bytes of the live allocation at `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AddressNotFound`] if no used block starts at `addr`.
    pub fn payload_mut(&mut self, addr: Address) -> Result<&mut [u8]> {
        let block = self.blocks[self.live_block(addr)?];
        self.arena
            .slice_mut(block.start(), block.size())
            .ok_or(Error::AddressNotFound { addr: addr.0 })
    }

    /// Returns occupancy and search-cost statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        let mut stats = PoolStats {
            capacity: self.capacity(),
            block_count: self.size(),
            free_blocks: 0,
            used_blocks: 0,
            free_bytes: 0,
            used_bytes: 0,
            largest_free: 0,
            allocations: self.counters.allocations,
            frees: self.counters.frees,
            failed_allocations: self.counters.failed_allocations,
            blocks_examined: self.counters.blocks_examined,
        };

        for block in self.blocks() {
            if block.is_free() {
                stats.free_blocks += 1;
                stats.free_bytes += block.size();
                stats.largest_free = stats.largest_free.max(block.size());
            } else {
                stats.used_blocks += 1;
                stats.used_bytes += block.size();
            }
        }
        stats
    }

    /// Checks that the block list still partitions the arena.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvariantViolation`] describing the first broken
    /// invariant.
    pub fn validate(&self) -> Result<()> {
        if self.blocks.capacity() != self.arena.capacity() {
            return Err(Error::InvariantViolation {
                detail: format!(
                    "block list spans {} bytes, arena holds {}",
                    self.blocks.capacity(),
                    self.arena.capacity()
                ),
            });
        }
        if let Some(cursor) = self.cursor
            && !self.blocks.contains(cursor)
        {
            return Err(Error::InvariantViolation {
                detail: "next-fit cursor names a vacant slot".into(),
            });
        }
        self.blocks.validate()
    }

    /// Releases the arena and every block record.
    ///
    /// Equivalent to dropping the pool; every address it returned becomes
    /// meaningless.
    pub fn destroy(self) {
        fitpool_log::debug!(
            "pool destroyed: {} bytes, {} blocks",
            self.capacity(),
            self.size()
        );
    }
}

impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("arena", &self.arena)
            .field("placement", &self.placement)
            .field("blocks", &self.blocks)
            .field("cursor", &self.cursor)
            .finish()
    }
}

impl fmt::Display for Pool {
    /// One line per block:
    ///
    /// ```text
    /// [0x0000..0x0014)     20 used
    /// [0x0014..0x0064)     80 free
    /// ```
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "pool: {} bytes, {} blocks, {}",
            self.capacity(),
            self.size(),
            self.placement
        )?;
        for block in self.blocks() {
            writeln!(
                f,
                "[{:#06x}..{:#06x}) {:>6} {}",
                block.start(),
                block.end(),
                block.size(),
                block.status()
            )?;
        }
        Ok(())
    }
}
