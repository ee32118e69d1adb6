//! Lifecycle tests for the `Allocator` façade and pool ownership.

mod common;

use common::{assert_invariants, layout};
use fitpool::{
    Address, Allocator,
    BlockStatus::{Free, Used},
    Error, Placement, Pool, PoolConfig,
};

#[test]
fn test_init_alloc_free_destroy() {
    let mut allocator = Allocator::new();
    allocator.init(100, Placement::FirstFit).unwrap();
    assert_eq!(allocator.size(), 1);

    let a = allocator.alloc(20).unwrap();
    let b = allocator.alloc(30).unwrap();
    assert_eq!(allocator.size(), 3);

    allocator.free(a).unwrap();
    allocator.free(b).unwrap();
    assert_eq!(allocator.size(), 1);

    allocator.destroy();
    assert_eq!(allocator.size(), 0);
    assert_eq!(allocator.free(b), Err(Error::Uninitialized));
}

#[test]
fn test_init_with_negative_capacity() {
    let mut allocator = Allocator::new();
    assert_eq!(
        allocator.init(-100, Placement::BestFit),
        Err(Error::InvalidCapacity)
    );
    assert!(!allocator.is_initialized());
    assert_eq!(allocator.alloc(4), Err(Error::Uninitialized));
}

#[test]
fn test_destroy_twice_is_harmless() {
    let mut allocator = Allocator::new();
    allocator.init(64, Placement::NextFit).unwrap();
    allocator.destroy();
    allocator.destroy();
    assert!(!allocator.is_initialized());

    // Usable again after a fresh init.
    allocator.init(32, Placement::NextFit).unwrap();
    assert_eq!(allocator.alloc(32).unwrap(), Address::new(0));
}

#[test]
fn test_independent_allocators() {
    let mut first = Allocator::new();
    let mut second = Allocator::new();
    first.init(64, Placement::FirstFit).unwrap();
    second.init(64, Placement::WorstFit).unwrap();

    let a = first.alloc(16).unwrap();
    second.alloc(8).unwrap();
    second.alloc(8).unwrap();

    assert_eq!(first.size(), 2);
    assert_eq!(second.size(), 3);

    // An address from one allocator means nothing to the other.
    first.free(a).unwrap();
    assert_eq!(
        first.free(Address::new(8)),
        Err(Error::AddressNotFound { addr: 8 })
    );
    assert_eq!(second.size(), 3);
}

#[test]
fn test_pools_move_between_threads() {
    let mut pool = Pool::new(256, Placement::BestFit).unwrap();
    let addr = pool.alloc(16).unwrap();
    pool.payload_mut(addr).unwrap().copy_from_slice(b"sent across tids");

    let pool = std::thread::spawn(move || {
        assert_eq!(pool.payload(addr).unwrap(), b"sent across tids");
        pool
    })
    .join()
    .unwrap();

    assert_eq!(pool.size(), 2);
}

#[test]
fn test_pool_from_config() {
    let config = PoolConfig::default()
        .with_capacity(30)
        .with_placement(Placement::WorstFit);
    let mut pool = Pool::with_config(&config).unwrap();

    assert_eq!(pool.capacity(), 32);
    assert_eq!(pool.placement(), Placement::WorstFit);

    pool.alloc(10).unwrap();
    assert_eq!(layout(&pool), vec![(0, 12, Used), (12, 20, Free)]);
}

#[test]
fn test_placement_from_config_string() {
    let placement: Placement = "Best_Fit".parse().unwrap();
    let mut allocator = Allocator::new();
    allocator.init(64u16, placement).unwrap();
    assert_eq!(allocator.pool().unwrap().placement(), Placement::BestFit);

    assert_eq!(
        "buddy".parse::<Placement>(),
        Err(Error::UnknownAlgorithm {
            name: "buddy".to_string()
        })
    );
}

#[test]
fn test_stats_through_lifecycle() {
    let mut allocator = Allocator::new();
    allocator.init(128, Placement::FirstFit).unwrap();

    let addrs: Vec<Address> = (0..4).map(|_| allocator.alloc(16).unwrap()).collect();
    allocator.free(addrs[0]).unwrap();
    allocator.free(addrs[2]).unwrap();

    let pool = allocator.pool().unwrap();
    assert_invariants(pool);

    let stats = pool.stats();
    assert_eq!(stats.used_blocks, 2);
    assert_eq!(stats.free_blocks, 3);
    assert_eq!(stats.free_bytes, 96);
    assert_eq!(stats.largest_free, 64);
    let frag = stats.fragmentation().unwrap();
    assert!((frag - 1.0 / 3.0).abs() < 1e-9);

    allocator.free(addrs[1]).unwrap();
    allocator.free(addrs[3]).unwrap();
    let stats = allocator.pool().unwrap().stats();
    assert_eq!(stats.block_count, 1);
    assert_eq!(stats.fragmentation(), Some(0.0));
}
