/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use epserde::*;
use mem_dbg::*;

use crate::bits::BitVec;
use crate::traits::{BitCount, BitLength, Rank};

/// A rank structure with one 32-bit cumulative counter per 64-bit word.
/// Twice the counter overhead of [`Rank512`](crate::rank_sel::Rank512), but a
/// query is a single masked popcount; the dense trie layer answers a rank per
/// visited level, so it pays for the extra space.
#[derive(Epserde, Debug, Clone, MemDbg, MemSize)]
pub struct Rank64 {
    bits: BitVec,
    counts: Vec<u32>,
    num_ones: usize,
}

impl Rank64 {
    /// Creates a new structure from a given bit vector, taking ownership and
    /// padding the storage to a 2048-bit multiple.
    pub fn new(bits: BitVec) -> Self {
        let bits = super::pad_to_block(bits);
        let words = bits.words();

        let mut counts = Vec::with_capacity(words.len() + 1);
        let mut num_ones = 0_usize;
        for word in words {
            counts.push(num_ones as u32);
            num_ones += word.count_ones() as usize;
        }
        counts.push(num_ones as u32);

        Self {
            bits,
            counts,
            num_ones,
        }
    }

    /// Return the bit at the given position. Positions past the logical end
    /// of the original data read the zero padding.
    #[inline(always)]
    pub fn get(&self, pos: usize) -> bool {
        self.bits.get(pos)
    }

    #[inline(always)]
    pub fn words(&self) -> &[u64] {
        self.bits.words()
    }

    /// Heap size of the backing storage and the counters, in bytes.
    pub fn mem_bytes(&self) -> u64 {
        (self.bits.words().len() * 8 + self.counts.len() * 4) as u64
    }
}

impl Rank for Rank64 {
    #[inline(always)]
    unsafe fn rank_unchecked(&self, pos: usize) -> usize {
        let word = pos / 64;
        let mut rank = *self.counts.get_unchecked(word) as usize;
        if pos % 64 != 0 {
            rank += (self.bits.words().get_unchecked(word) & ((1_u64 << (pos % 64)) - 1))
                .count_ones() as usize;
        }
        rank
    }
}

impl BitCount for Rank64 {
    #[inline(always)]
    fn count(&self) -> usize {
        self.num_ones
    }
}

impl BitLength for Rank64 {
    #[inline(always)]
    fn len(&self) -> usize {
        self.bits.len()
    }
}
