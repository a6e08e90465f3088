/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Basic traits for succinct operations on bit vectors, including [`Rank`] and [`Select`].

*/

use impl_tools::autoimpl;

/// A trait for succinct data structures that expose the
/// length of the underlying bit vector.
#[allow(clippy::len_without_is_empty)]
#[autoimpl(for<T: trait + ?Sized> &T, &mut T, Box<T>)]
pub trait BitLength {
    /// Return the length in bits of the underlying bit vector.
    fn len(&self) -> usize;
}

/// A trait for succinct data structures that expose the
/// number of ones of the underlying bit vector.
#[autoimpl(for<T: trait + ?Sized> &T, &mut T, Box<T>)]
pub trait BitCount {
    /// Return the number of ones in the underlying bit vector.
    fn count(&self) -> usize;
}

/// Rank over a bit vector.
#[autoimpl(for<T: trait + ?Sized> &T, &mut T, Box<T>)]
pub trait Rank: BitLength {
    /// Return the number of ones preceding the specified position.
    ///
    /// # Panics
    /// If `pos` is greater than the [length of the underlying bit
    /// vector](`BitLength::len`).
    fn rank(&self, pos: usize) -> usize {
        assert!(pos <= self.len(), "Rank index out of bounds: {}", pos);
        unsafe { self.rank_unchecked(pos) }
    }

    /// Return the number of ones preceding the specified position.
    ///
    /// # Safety
    /// `pos` must be between 0 (included) and the [length of the underlying bit
    /// vector](`BitLength::len`) (included).
    unsafe fn rank_unchecked(&self, pos: usize) -> usize;
}

/// One-based select over a bit vector.
///
/// `select(k)` returns the position of the `k`-th one, counting from one;
/// `select(0)` is defined and returns the position conceptually preceding
/// the first one, that is, `usize::MAX` (`0_usize.wrapping_sub(1)`), so that
/// `select(k) + 1` is always the first position to scan after the `k`-th one.
#[autoimpl(for<T: trait + ?Sized> &T, &mut T, Box<T>)]
pub trait Select: BitCount {
    /// Return the position of the one of given one-based rank, or the
    /// before-the-first sentinel for rank zero.
    ///
    /// # Panics
    /// If `rank` is greater than the [number of ones](`BitCount::count`).
    fn select(&self, rank: usize) -> usize {
        assert!(rank <= self.count(), "Select rank out of bounds: {}", rank);
        unsafe { self.select_unchecked(rank) }
    }

    /// Return the position of the one of given one-based rank.
    ///
    /// # Safety
    /// `rank` must be between 0 (included) and the [number of
    /// ones](`BitCount::count`) (included).
    unsafe fn select_unchecked(&self, rank: usize) -> usize;
}
