//! Fixed-capacity memory pool with pluggable block placement.
//!
//! A [`Pool`] reserves one arena up front and carves it into an
//! address-ordered list of free and used blocks. Requests are rounded up to
//! 4 bytes and placed by one of four policies:
//!
//! - **First-fit**: lowest-addressed block that fits
//! - **Next-fit**: first block that fits after the previous allocation
//! - **Best-fit**: block leaving the smallest remainder
//! - **Worst-fit**: block leaving the largest remainder
//!
//! Freed blocks merge with free neighbors, so the list never holds two
//! adjacent free blocks after a `free`. [`PoolStats`] reports fragmentation
//! and how many block records each policy had to examine.
//!
//! ```
//! use fitpool::{Placement, Pool};
//!
//! let mut pool = Pool::new(256, Placement::BestFit)?;
//! let addr = pool.alloc(10)?;
//! pool.payload_mut(addr)?[..5].copy_from_slice(b"hello");
//! pool.free(addr)?;
//! assert_eq!(pool.size(), 1);
//! # Ok::<(), fitpool::Error>(())
//! ```
//!
//! # Crate Structure
//!
//! ```text
//!   fitpool
//!   ├── align      - 4-byte granule rounding
//!   ├── arena      - backing buffer
//!   ├── block      - block list: scan, split, locate, coalesce
//!   ├── placement  - first/next/best/worst-fit selection
//!   ├── pool       - Pool, Address, PoolStats
//!   ├── allocator  - init/alloc/free/destroy façade
//!   ├── config     - PoolConfig
//!   └── error      - Error, Result
//! ```
//!
//! # Features
//!
//! - `address-index` (default): back the start-address lookup table with
//!   `hashbrown` instead of `std::collections::HashMap`

pub mod align;
pub mod allocator;
pub mod arena;
pub mod block;
pub mod config;
pub mod error;
pub mod placement;
pub mod pool;

pub use allocator::Allocator;
pub use block::{Block, BlockId, BlockStatus, MAX_CAPACITY};
pub use config::PoolConfig;
pub use error::{Error, Result};
pub use placement::Placement;
pub use pool::{Address, Pool, PoolStats};
