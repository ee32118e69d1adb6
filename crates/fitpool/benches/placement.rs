//! Placement policy benchmarks.
//!
//! Compares the four policies on:
//! - Sequential allocation into an empty pool
//! - Allocation into a fragmented pool (many small holes)
//! - Mixed alloc/free churn with a fixed pseudo-random sequence

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use fitpool::{Address, Placement, Pool};

const CAPACITY: usize = 64 * 1024;

/// Fixed request sizes cycled by every benchmark.
const SIZES: [usize; 8] = [8, 24, 16, 64, 12, 128, 40, 4];

fn fragmented(placement: Placement, holes: usize) -> Pool {
    let mut pool = Pool::new(CAPACITY, placement).unwrap();
    let addrs: Vec<Address> = (0..holes * 2)
        .map(|i| pool.alloc(SIZES[i % SIZES.len()]).unwrap())
        .collect();
    for addr in addrs.into_iter().step_by(2) {
        pool.free(addr).unwrap();
    }
    pool
}

fn bench_sequential_alloc(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequential_alloc");

    for placement in Placement::ALL {
        group.bench_with_input(
            BenchmarkId::from_parameter(placement),
            &placement,
            |b, &placement| {
                b.iter(|| {
                    let mut pool = Pool::new(CAPACITY, placement).unwrap();
                    for i in 0..512 {
                        black_box(pool.alloc(SIZES[i % SIZES.len()]).unwrap());
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_fragmented_alloc(c: &mut Criterion) {
    let mut group = c.benchmark_group("fragmented_alloc");

    for holes in [16, 256] {
        for placement in Placement::ALL {
            let id = BenchmarkId::new(placement.as_str(), holes);
            group.bench_with_input(id, &holes, |b, &holes| {
                b.iter_batched_ref(
                    || fragmented(placement, holes),
                    |pool| {
                        for size in [4, 32, 100] {
                            let _ = black_box(pool.alloc(size));
                        }
                    },
                    BatchSize::SmallInput,
                );
            });
        }
    }

    group.finish();
}

fn bench_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("churn");

    for placement in Placement::ALL {
        group.bench_with_input(
            BenchmarkId::from_parameter(placement),
            &placement,
            |b, &placement| {
                b.iter(|| {
                    let mut pool = Pool::new(CAPACITY, placement).unwrap();
                    let mut live = Vec::with_capacity(256);
                    let mut state = 0x2545_f491_u64;

                    for i in 0..2_000 {
                        state ^= state << 13;
                        state ^= state >> 7;
                        state ^= state << 17;

                        if live.is_empty() || state % 3 != 0 {
                            if let Ok(addr) = pool.alloc(SIZES[i % SIZES.len()] * 4) {
                                live.push(addr);
                            }
                        } else {
                            let victim = (state as usize) % live.len();
                            pool.free(live.swap_remove(victim)).unwrap();
                        }
                    }
                    black_box(pool.stats())
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_sequential_alloc,
    bench_fragmented_alloc,
    bench_churn
);
criterion_main!(benches);
