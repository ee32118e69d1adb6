//! Lifecycle façade over a [`Pool`].
//!
//! [`Allocator`] exposes the classic four-call interface (`init`, `alloc`,
//! `free`, `destroy`) plus `size`, holding at most one pool at a time.
//! Unlike a process-wide singleton, any number of allocators can coexist.
//!
//! # Example
//!
//! ```
//! use fitpool::{Allocator, Error, Placement};
//!
//! let mut allocator = Allocator::new();
//! assert_eq!(allocator.init(-1, Placement::FirstFit), Err(Error::InvalidCapacity));
//!
//! allocator.init(1024, Placement::BestFit)?;
//! let addr = allocator.alloc(24)?;
//! assert_eq!(allocator.size(), 2);
//!
//! allocator.free(addr)?;
//! assert_eq!(allocator.size(), 1);
//!
//! allocator.destroy();
//! assert_eq!(allocator.alloc(8), Err(Error::Uninitialized));
//! # Ok::<(), Error>(())
//! ```

use crate::error::{Error, Result};
use crate::placement::Placement;
use crate::pool::{Address, Pool};

/// Holds an optional pool and forwards the four pool operations to it.
#[derive(Debug, Default)]
pub struct Allocator {
    pool: Option<Pool>,
}

impl Allocator {
    /// Creates an uninitialized allocator.
    #[must_use]
    pub const fn new() -> Self {
        Allocator { pool: None }
    }

    /// Reserves a pool of `capacity` bytes managed by `placement`.
    ///
    /// Any integer type is accepted; negative or unrepresentable values
    /// fail. A pool from an earlier `init` is destroyed only once the new
    /// one exists, so a failed `init` leaves the allocator as it was.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidCapacity`] for a negative, zero or oversized capacity
    /// - [`Error::ArenaAllocationFailed`] if the arena cannot be obtained
    pub fn init<C>(&mut self, capacity: C, placement: Placement) -> Result<()>
    where
        C: TryInto<usize>,
    {
        let capacity = capacity.try_into().map_err(|_| Error::InvalidCapacity)?;
        let pool = Pool::new(capacity, placement)?;

        if let Some(old) = self.pool.replace(pool) {
            old.destroy();
        }
        Ok(())
    }

    /// Reserves `size` bytes from the pool.
    ///
    /// # Errors
    ///
    /// - [`Error::Uninitialized`] before `init` or after `destroy`
    /// - [`Error::PoolExhausted`] if no free block is large enough
    pub fn alloc(&mut self, size: usize) -> Result<Address> {
        self.pool_mut()?.alloc(size)
    }

    /// Releases the allocation at `addr`.
    ///
    /// # Errors
    ///
    /// - [`Error::Uninitialized`] before `init` or after `destroy`
    /// - [`Error::AddressNotFound`] if no live allocation starts at `addr`
    pub fn free(&mut self, addr: Address) -> Result<()> {
        self.pool_mut()?.free(addr)
    }

    /// Releases the pool, returning to the uninitialized state.
    ///
    /// Does nothing if no pool is held.
    pub fn destroy(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.destroy();
        }
    }

    /// Number of blocks in the pool, or 0 when uninitialized.
    #[must_use]
    pub fn size(&self) -> usize {
        self.pool.as_ref().map_or(0, Pool::size)
    }

    /// Returns `true` while a pool is held.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.pool.is_some()
    }

    /// Borrows the underlying pool, if any.
    #[must_use]
    pub fn pool(&self) -> Option<&Pool> {
        self.pool.as_ref()
    }

    fn pool_mut(&mut self) -> Result<&mut Pool> {
        self.pool.as_mut().ok_or(Error::Uninitialized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uninitialized_allocator() {
        let mut allocator = Allocator::new();
        assert!(!allocator.is_initialized());
        assert_eq!(allocator.size(), 0);
        assert_eq!(allocator.alloc(4), Err(Error::Uninitialized));
        assert_eq!(
            allocator.free(Address::new(0)),
            Err(Error::Uninitialized)
        );
        allocator.destroy();
    }

    #[test]
    fn test_init_rejects_invalid_capacity() {
        let mut allocator = Allocator::new();
        assert_eq!(
            allocator.init(-4i64, Placement::NextFit),
            Err(Error::InvalidCapacity)
        );
        assert_eq!(
            allocator.init(0u8, Placement::NextFit),
            Err(Error::InvalidCapacity)
        );
        assert!(!allocator.is_initialized());
    }

    #[test]
    fn test_failed_reinit_keeps_pool() {
        let mut allocator = Allocator::new();
        allocator.init(64u32, Placement::FirstFit).unwrap();
        let addr = allocator.alloc(8).unwrap();

        assert!(allocator.init(-1i32, Placement::BestFit).is_err());
        assert_eq!(allocator.size(), 2);
        allocator.free(addr).unwrap();
    }

    #[test]
    fn test_reinit_replaces_pool() {
        let mut allocator = Allocator::new();
        allocator.init(64, Placement::FirstFit).unwrap();
        allocator.alloc(8).unwrap();

        allocator.init(128, Placement::WorstFit).unwrap();
        let pool = allocator.pool().unwrap();
        assert_eq!(pool.capacity(), 128);
        assert_eq!(pool.placement(), Placement::WorstFit);
        assert_eq!(allocator.size(), 1);
    }

    #[test]
    fn test_destroy_resets_state() {
        let mut allocator = Allocator::new();
        allocator.init(32usize, Placement::BestFit).unwrap();
        allocator.alloc(4).unwrap();

        allocator.destroy();

        assert!(!allocator.is_initialized());
        assert_eq!(allocator.size(), 0);
        assert_eq!(allocator.alloc(4), Err(Error::Uninitialized));
    }
}
