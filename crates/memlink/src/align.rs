// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Alignment arithmetic shared by blocks and cursors.
//!
//! All functions require `alignment` to be a non-zero power of two.

/// Rounds `n` up to the next multiple of `alignment`.
///
/// Returns `None` if the result does not fit in `usize`.
///
/// # Example
///
/// ```
/// use memlink::align::align_up;
///
/// assert_eq!(align_up(0, 8), Some(0));
/// assert_eq!(align_up(1, 8), Some(8));
/// assert_eq!(align_up(8, 8), Some(8));
/// assert_eq!(align_up(9, 8), Some(16));
/// assert_eq!(align_up(usize::MAX, 8), None);
/// ```
#[inline]
#[must_use]
pub fn align_up(n: usize, alignment: usize) -> Option<usize> {
    debug_assert!(alignment.is_power_of_two());
    let mask = alignment - 1;
    n.checked_add(mask).map(|x| x & !mask)
}

/// Rounds `n` down to the previous multiple of `alignment`.
///
/// # Example
///
/// ```
/// use memlink::align::align_down;
///
/// assert_eq!(align_down(7, 8), 0);
/// assert_eq!(align_down(15, 8), 8);
/// assert_eq!(align_down(16, 8), 16);
/// ```
#[inline]
#[must_use]
pub fn align_down(n: usize, alignment: usize) -> usize {
    debug_assert!(alignment.is_power_of_two());
    n & !(alignment - 1)
}

/// Whether `n` is a multiple of `alignment`.
///
/// # Example
///
/// ```
/// use memlink::align::is_aligned;
///
/// assert!(is_aligned(0, 8));
/// assert!(!is_aligned(4, 8));
/// assert!(is_aligned(24, 8));
/// ```
#[inline]
#[must_use]
pub fn is_aligned(n: usize, alignment: usize) -> bool {
    debug_assert!(alignment.is_power_of_two());
    n & (alignment - 1) == 0
}

/// The number of bytes needed to advance `n` to the next multiple of `alignment`.
///
/// Unlike [`align_up()`], this never overflows.
///
/// # Example
///
/// ```
/// use memlink::align::padding;
///
/// assert_eq!(padding(0, 8), 0);
/// assert_eq!(padding(5, 8), 3);
/// assert_eq!(padding(usize::MAX, 2), 1);
/// ```
#[inline]
#[must_use]
pub fn padding(n: usize, alignment: usize) -> usize {
    debug_assert!(alignment.is_power_of_two());
    n.wrapping_neg() & (alignment - 1)
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_up_is_smallest_multiple() {
        for alignment in [1, 2, 4, 8, 16, 64] {
            for n in 0..200 {
                let aligned = align_up(n, alignment).unwrap();
                assert!(aligned >= n);
                assert!(aligned - n < alignment);
                assert!(is_aligned(aligned, alignment));
            }
        }
    }

    #[test]
    fn align_down_is_largest_multiple() {
        for alignment in [1, 2, 4, 8, 16, 64] {
            for n in 0..200 {
                let aligned = align_down(n, alignment);
                assert!(aligned <= n);
                assert!(n - aligned < alignment);
                assert!(is_aligned(aligned, alignment));
            }
        }
    }

    #[test]
    fn padding_matches_align_up() {
        for alignment in [1, 2, 4, 8] {
            for n in 0..100 {
                assert_eq!(n + padding(n, alignment), align_up(n, alignment).unwrap());
            }
        }
    }

    #[test]
    fn align_up_overflow() {
        assert_eq!(align_up(usize::MAX - 2, 4), None);
        assert_eq!(align_up(usize::MAX, 1), Some(usize::MAX));
    }
}
