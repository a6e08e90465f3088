/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use common_traits::SelectInWord;
use epserde::*;
use mem_dbg::*;

use crate::bits::BitVec;
use crate::traits::{BitCount, BitLength, Select};

/// Sampled one-based select: the position of every
/// [`SAMPLE`](SelectSampled::SAMPLE)-th one is stored, and a query scans
/// forward word by word from the nearest sample, finishing with an in-word
/// select. The per-word cumulative table used during construction is
/// transient and dropped before the structure is returned.
///
/// `select(0)` returns the before-the-first sentinel `usize::MAX`, so
/// `select(k) + 1` is always the first position after the `k`-th one; the
/// trie exploits this to map a node number to the start of its slots with a
/// single query.
#[derive(Epserde, Debug, Clone, MemDbg, MemSize)]
pub struct SelectSampled {
    bits: BitVec,
    samples: Vec<u32>,
    num_ones: usize,
}

impl SelectSampled {
    /// Ones per stored sample.
    pub const SAMPLE: usize = 64;

    /// Creates a new structure from a given bit vector, taking ownership and
    /// padding the storage to a 2048-bit multiple.
    pub fn new(bits: BitVec) -> Self {
        let bits = super::pad_to_block(bits);
        let words = bits.words();

        let mut cum = Vec::with_capacity(words.len() + 1);
        cum.push(0_usize);
        let mut num_ones = 0_usize;
        for word in words {
            num_ones += word.count_ones() as usize;
            cum.push(num_ones);
        }

        // samples[k] = select(k * SAMPLE) + 1; samples[0] is the sentinel + 1 = 0
        let mut samples = vec![0_u32; num_ones / Self::SAMPLE + 1];
        let mut idx = 1;
        for i in 1..=words.len() {
            while idx * Self::SAMPLE <= cum[i] {
                let rank_in_word = idx * Self::SAMPLE - cum[i - 1];
                let pos = (i - 1) * 64 + words[i - 1].select_in_word(rank_in_word - 1);
                samples[idx] = (pos + 1) as u32;
                idx += 1;
            }
        }

        Self {
            bits,
            samples,
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

    /// Heap size of the backing storage and the samples, in bytes.
    pub fn mem_bytes(&self) -> u64 {
        (self.bits.words().len() * 8 + self.samples.len() * 4) as u64
    }
}

impl Select for SelectSampled {
    #[inline(always)]
    unsafe fn select_unchecked(&self, rank: usize) -> usize {
        let start = *self.samples.get_unchecked(rank / Self::SAMPLE) as usize;
        let rank_left = rank % Self::SAMPLE;
        if rank_left == 0 {
            // exactly on a sample (or the rank-zero sentinel)
            return start.wrapping_sub(1);
        }

        let words = self.bits.words();
        let mut word_idx = start / 64;
        let bit = start % 64;
        let mut word = (words.get_unchecked(word_idx) >> bit) << bit;
        let mut rank_left = rank_left;
        loop {
            let ones = word.count_ones() as usize;
            if ones >= rank_left {
                break;
            }
            rank_left -= ones;
            word_idx += 1;
            word = *words.get_unchecked(word_idx);
        }
        word_idx * 64 + word.select_in_word(rank_left - 1)
    }
}

impl BitCount for SelectSampled {
    #[inline(always)]
    fn count(&self) -> usize {
        self.num_ones
    }
}

impl BitLength for SelectSampled {
    #[inline(always)]
    fn len(&self) -> usize {
        self.bits.len()
    }
}
