//! Error types for `fitpool`.
//!
//! Every fallible pool operation reports through [`Error`]; no operation
//! retries internally and a failed call leaves the block list unchanged.

use std::fmt;

/// Errors that can occur while managing a pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Pool capacity is zero, negative, or too large to represent once
    /// rounded up to the block granularity.
    InvalidCapacity,

    /// The backing buffer for the arena could not be obtained.
    ArenaAllocationFailed {
        /// The requested arena size in bytes.
        size: usize,
    },

    /// No free block can satisfy the request under the active placement.
    PoolExhausted {
        /// The requested size in bytes, before alignment.
        requested: usize,
        /// The largest free block at the time of the request.
        largest_free: usize,
    },

    /// The address is not the start of a live allocation.
    AddressNotFound {
        /// The offending arena offset.
        addr: usize,
    },

    /// A placement name outside the supported set.
    UnknownAlgorithm {
        /// The name that failed to parse.
        name: String,
    },

    /// The allocator has not been initialized, or was destroyed.
    Uninitialized,

    /// The block list no longer partitions the arena.
    InvariantViolation {
        /// What was found to be inconsistent.
        detail: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidCapacity => write!(f, "Invalid pool capacity"),
            Error::ArenaAllocationFailed { size } => {
                write!(f, "Failed to allocate arena of {size} bytes")
            }
            Error::PoolExhausted {
                requested,
                largest_free,
            } => {
                write!(
                    f,
                    "Pool exhausted: requested {requested} bytes, largest free block {largest_free} bytes"
                )
            }
            Error::AddressNotFound { addr } => {
                write!(f, "No live allocation starts at {addr:#x}")
            }
            Error::UnknownAlgorithm { name } => {
                write!(f, "Unknown placement algorithm: {name:?}")
            }
            Error::Uninitialized => write!(f, "Allocator is not initialized"),
            Error::InvariantViolation { detail } => {
                write!(f, "Block list invariant violated: {detail}")
            }
        }
    }
}

impl std::error::Error for Error {}

/// Result type for pool operations.
pub type Result<T> = std::result::Result<T, Error>;
