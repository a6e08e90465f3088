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

/// A rank structure with one 32-bit cumulative counter per 512-bit basic
/// block. Answering a query pops at most eight words: the block counter plus
/// up to seven full words and one masked word.
#[derive(Epserde, Debug, Clone, MemDbg, MemSize)]
pub struct Rank512 {
    bits: BitVec,
    counts: Vec<u32>,
    num_ones: usize,
}

impl Rank512 {
    const WORDS_PER_BLOCK: usize = 8;

    /// Creates a new structure from a given bit vector, taking ownership and
    /// padding the storage to a 2048-bit multiple.
    pub fn new(bits: BitVec) -> Self {
        let bits = super::pad_to_block(bits);
        let words = bits.words();
        let num_blocks = words.len() / Self::WORDS_PER_BLOCK;

        let mut counts = Vec::with_capacity(num_blocks + 1);
        let mut num_ones = 0_usize;
        for block in 0..num_blocks {
            counts.push(num_ones as u32);
            for w in 0..Self::WORDS_PER_BLOCK {
                num_ones += words[block * Self::WORDS_PER_BLOCK + w].count_ones() as usize;
            }
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

impl Rank for Rank512 {
    #[inline(always)]
    unsafe fn rank_unchecked(&self, pos: usize) -> usize {
        let words = self.bits.words();
        let block = pos >> 9;
        let mut rank = *self.counts.get_unchecked(block) as usize;
        for w in block * Self::WORDS_PER_BLOCK..pos / 64 {
            rank += words.get_unchecked(w).count_ones() as usize;
        }
        if pos % 64 != 0 {
            rank += (words.get_unchecked(pos / 64) & ((1_u64 << (pos % 64)) - 1)).count_ones()
                as usize;
        }
        rank
    }
}

impl BitCount for Rank512 {
    #[inline(always)]
    fn count(&self) -> usize {
        self.num_ones
    }
}

impl BitLength for Rank512 {
    #[inline(always)]
    fn len(&self) -> usize {
        self.bits.len()
    }
}
