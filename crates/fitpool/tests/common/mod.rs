// Common test utilities for integration tests
//
// Shared fixtures and invariant checks used across the pool test suites.

#![allow(dead_code)]

use fitpool::{Address, BlockStatus, Placement, Pool};

/// `(start, size, status)` for every block, in address order.
pub fn layout(pool: &Pool) -> Vec<(usize, usize, BlockStatus)> {
    pool.blocks()
        .map(|b| (b.start(), b.size(), b.status()))
        .collect()
}

/// Total bytes held by free blocks.
pub fn free_bytes(pool: &Pool) -> usize {
    pool.blocks()
        .filter(|b| b.is_free())
        .map(|b| b.size())
        .sum()
}

/// Asserts the partition, ordering and coalescing invariants.
pub fn assert_invariants(pool: &Pool) {
    if let Err(err) = pool.validate() {
        panic!("{err}\n{pool}");
    }

    let total: usize = pool.blocks().map(|b| b.size()).sum();
    assert_eq!(total, pool.capacity(), "blocks must partition the arena");

    let mut expected = 0;
    for block in pool.blocks() {
        assert_eq!(block.start(), expected, "blocks must be contiguous");
        assert_eq!(block.size() % 4, 0, "block sizes are 4-byte multiples");
        expected = block.end();
    }

    let statuses: Vec<bool> = pool.blocks().map(|b| b.is_free()).collect();
    assert!(
        !statuses.windows(2).any(|w| w[0] && w[1]),
        "adjacent free blocks survived a free:\n{pool}"
    );
}

/// Asserts that the live allocations do not overlap.
pub fn assert_disjoint(live: &[(Address, usize)]) {
    let mut ranges: Vec<(usize, usize)> = live
        .iter()
        .map(|&(addr, size)| (addr.offset(), addr.offset() + size))
        .collect();
    ranges.sort_unstable();
    for pair in ranges.windows(2) {
        assert!(
            pair[0].1 <= pair[1].0,
            "allocations {:?} and {:?} overlap",
            pair[0],
            pair[1]
        );
    }
}

/// A pool holding free holes of 52, 12 and 32 bytes at offsets 0, 56 and
/// 72, each followed by a used 4-byte spacer.
pub fn three_holes(placement: Placement) -> Pool {
    let mut pool = Pool::new(112, placement).expect("pool");
    let holes = [52, 12, 32];
    let mut hole_addrs = Vec::new();
    for size in holes {
        hole_addrs.push(pool.alloc(size).expect("hole"));
        pool.alloc(4).expect("spacer");
    }
    pool.alloc(4).expect("tail");
    assert_eq!(pool.largest_free(), 0);

    for addr in hole_addrs {
        pool.free(addr).expect("free hole");
    }
    pool
}

/// Deterministic xorshift generator for reproducible churn.
pub struct Rng(u64);

impl Rng {
    pub fn new(seed: u64) -> Self {
        Rng(seed.max(1))
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    /// Uniform value in `0..bound`.
    pub fn below(&mut self, bound: usize) -> usize {
        (self.next_u64() % bound as u64) as usize
    }
}
