//! Block granularity arithmetic.
//!
//! Pool capacities and request sizes are both rounded up to a multiple of
//! [`GRANULE`] before use. `align_up(5)` is `Some(8)`.

/// Size granularity of every block, in bytes.
pub const GRANULE: usize = 4;

/// Rounds `value` up to the next multiple of [`GRANULE`].
///
/// Returns `None` if the rounded value does not fit in a `usize`.
///
/// ```
/// use fitpool::align::align_up;
///
/// assert_eq!(align_up(0), Some(0));
/// assert_eq!(align_up(5), Some(8));
/// assert_eq!(align_up(12), Some(12));
/// assert_eq!(align_up(usize::MAX), None);
/// ```
#[inline]
#[must_use]
pub const fn align_up(value: usize) -> Option<usize> {
    match value.checked_add(GRANULE - 1) {
        Some(bumped) => Some(bumped & !(GRANULE - 1)),
        None => None,
    }
}

/// Returns `true` if `value` is a multiple of [`GRANULE`].
#[inline]
#[must_use]
pub const fn is_aligned(value: usize) -> bool {
    value & (GRANULE - 1) == 0
}
