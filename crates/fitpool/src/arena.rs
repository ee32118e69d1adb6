//! Fixed-capacity backing buffer for a pool.
//!
//! The arena is obtained from the global allocator once, zero-filled, and
//! released in one shot when dropped. It never grows or shrinks; the block
//! list addresses it purely by offset.

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use crate::error::{Error, Result};

/// Alignment of the arena base pointer.
///
/// Every block start is a multiple of 4 from the base, so payloads are at
/// least 4-byte aligned.
const ARENA_ALIGNMENT: usize = 8;

/// A contiguous, fixed-size byte region.
///
/// # Safety
///
/// - `start` points to `capacity` bytes obtained from `alloc::alloc_zeroed`
///   with `layout`, and is released exactly once in `Drop`
/// - Slices handed out borrow the arena, so they cannot outlive it
pub struct Arena {
    /// Start of the region.
    start: NonNull<u8>,
    /// Layout the region was allocated with.
    layout: Layout,
}

// SAFETY: the arena exclusively owns its buffer and exposes it only through
// `&self`/`&mut self` borrows, so moving it across threads is sound.
unsafe impl Send for Arena {}

impl Arena {
    /// Acquires a zeroed arena of exactly `capacity` bytes.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidCapacity`] if `capacity` is zero or exceeds what a
    ///   [`Layout`] can describe
    /// - [`Error::ArenaAllocationFailed`] if the global allocator refuses
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity);
        }

        let layout = Layout::from_size_align(capacity, ARENA_ALIGNMENT)
            .map_err(|_| Error::InvalidCapacity)?;

        // SAFETY: layout has a non-zero size (checked above).
        let start = unsafe { alloc::alloc_zeroed(layout) };
        let start = NonNull::new(start)
            .ok_or(Error::ArenaAllocationFailed { size: capacity })?;

        Ok(Arena { start, layout })
    }

    /// Returns the size of the region in bytes.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.layout.size()
    }

    /// Returns the base pointer of the region.
    #[inline]
    #[must_use]
    pub fn base(&self) -> NonNull<u8> {
        self.start
    }

    /// Borrows `len` bytes starting at `offset`.
    ///
    /// Returns `None` if the range does not lie inside the arena.
    #[must_use]
    pub fn slice(&self, offset: usize, len: usize) -> Option<&[u8]> {
        self.check_range(offset, len)?;
        // SAFETY: the range is in bounds (checked above), the buffer is
        // initialized (zeroed on allocation) and the borrow is tied to
        // `&self`.
        unsafe {
            Some(std::slice::from_raw_parts(
                self.base().as_ptr().add(offset),
                len,
            ))
        }
    }

    /// Mutably borrows `len` bytes starting at `offset`.
    ///
    /// Returns `None` if the range does not lie inside the arena.
    #[must_use]
    pub fn slice_mut(&mut self, offset: usize, len: usize) -> Option<&mut [u8]> {
        self.check_range(offset, len)?;
        // SAFETY: as in `slice`; `&mut self` guarantees exclusivity.
        unsafe {
            Some(std::slice::from_raw_parts_mut(
                self.base().as_ptr().add(offset),
                len,
            ))
        }
    }

    fn check_range(&self, offset: usize, len: usize) -> Option<()> {
        let end = offset.checked_add(len)?;
        (end <= self.capacity()).then_some(())
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        // SAFETY: start was allocated with self.layout and is freed once.
        unsafe {
            alloc::dealloc(self.start.as_ptr(), self.layout);
        }
    }
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("base", &self.start)
            .field("capacity", &self.capacity())
            .finish()
    }
}
