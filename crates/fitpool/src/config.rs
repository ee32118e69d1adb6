//! Pool construction settings.

use crate::placement::Placement;

/// Default pool capacity (64 KiB).
pub const DEFAULT_CAPACITY: usize = 64 * 1024;

/// Capacity and placement for a new [`Pool`](crate::Pool).
///
/// ```
/// use fitpool::{Placement, Pool, PoolConfig};
///
/// let config = PoolConfig::default()
///     .with_capacity(4096)
///     .with_placement(Placement::BestFit);
///
/// let pool = Pool::with_config(&config)?;
/// assert_eq!(pool.capacity(), 4096);
/// assert_eq!(pool.placement(), Placement::BestFit);
/// # Ok::<(), fitpool::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Requested arena size in bytes, rounded up on construction.
    pub capacity: usize,
    /// Placement policy used for every allocation.
    pub placement: Placement,
}

impl PoolConfig {
    /// Creates a configuration.
    #[must_use]
    pub const fn new(capacity: usize, placement: Placement) -> Self {
        PoolConfig {
            capacity,
            placement,
        }
    }

    /// Replaces the capacity.
    #[must_use]
    pub const fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Replaces the placement policy.
    #[must_use]
    pub const fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig::new(DEFAULT_CAPACITY, Placement::FirstFit)
    }
}
