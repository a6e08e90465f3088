/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

A growable LSB-first bit vector over a `Vec<u64>` backend, used both as
construction scratch by the trie builder and as the backing store of the
rank/select structures in [`crate::rank_sel`].

Bit `p` lives in word `p / 64` at bit `p % 64`.

*/

use crate::traits::*;
use epserde::*;
use mem_dbg::*;

#[derive(Epserde, Debug, Clone, MemDbg, MemSize)]
pub struct BitVec {
    data: Vec<u64>,
    len: usize,
}

macro_rules! panic_if_out_of_bounds {
    ($index: expr, $len: expr) => {
        if $index >= $len {
            panic!("Bit index out of bounds: {} >= {}", $index, $len)
        }
    };
}

impl BitVec {
    /// Create a new bit vector of length `len`, all zeros.
    pub fn new(len: usize) -> Self {
        Self {
            data: vec![0; len.div_ceil(64)],
            len,
        }
    }

    /// Create an empty bit vector with space preallocated for `len` bits.
    pub fn with_capacity(len: usize) -> Self {
        Self {
            data: Vec::with_capacity(len.div_ceil(64)),
            len: 0,
        }
    }

    #[inline(always)]
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.len
    }

    /// # Safety
    /// `len` must be between 0 (included) and the number of
    /// bits in `data` (included).
    #[inline(always)]
    pub unsafe fn from_raw_parts(data: Vec<u64>, len: usize) -> Self {
        Self { data, len }
    }

    #[inline(always)]
    pub fn into_raw_parts(self) -> (Vec<u64>, usize) {
        (self.data, self.len)
    }

    /// Return the backing words, including any bits past `len`.
    #[inline(always)]
    pub fn words(&self) -> &[u64] {
        &self.data
    }

    #[inline(always)]
    pub fn get(&self, index: usize) -> bool {
        panic_if_out_of_bounds!(index, self.len);
        unsafe { self.get_unchecked(index) }
    }

    /// # Safety
    /// `index` must be smaller than the length of the bit vector.
    #[inline(always)]
    pub unsafe fn get_unchecked(&self, index: usize) -> bool {
        let word = self.data.get_unchecked(index / 64);
        (word >> (index % 64)) & 1 != 0
    }

    #[inline(always)]
    pub fn set(&mut self, index: usize, value: bool) {
        panic_if_out_of_bounds!(index, self.len);
        let word = index / 64;
        let bit = index % 64;
        if value {
            self.data[word] |= 1 << bit;
        } else {
            self.data[word] &= !(1 << bit);
        }
    }

    /// Append a bit.
    pub fn push(&mut self, value: bool) {
        if self.len % 64 == 0 {
            self.data.push(0);
        }
        if value {
            self.data[self.len / 64] |= 1 << (self.len % 64);
        }
        self.len += 1;
    }

    /// Append all the bits of `other`.
    pub fn extend_from(&mut self, other: &BitVec) {
        for i in 0..other.len() {
            self.push(unsafe { other.get_unchecked(i) });
        }
    }

    /// Return the number of bits set to 1 in this bit vector.
    pub fn count_ones(&self) -> usize {
        self.data.iter().map(|x| x.count_ones() as usize).sum()
    }
}

impl BitLength for BitVec {
    #[inline(always)]
    fn len(&self) -> usize {
        self.len
    }
}

impl FromIterator<bool> for BitVec {
    fn from_iter<T: IntoIterator<Item = bool>>(iter: T) -> Self {
        let mut bits = BitVec::new(0);
        for bit in iter {
            bits.push(bit);
        }
        bits
    }
}
