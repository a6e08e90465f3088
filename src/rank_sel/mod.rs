/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Rank/select structures over a [`BitVec`](crate::bits::BitVec): two rank
flavors ([`Rank512`] with one counter per 512-bit block, [`Rank64`] with one
counter per word) and a sampled one-based select ([`SelectSampled`]).

All three take ownership of the bit vector and round its backing storage up
to a multiple of 2048 bits; the padding is all zeros and the reported
[length](crate::traits::BitLength::len) includes it, so positions slightly
past the logical end of the data rank/scan safely.

*/

use crate::bits::BitVec;

pub mod rank512;
pub mod rank64;
pub mod select_sampled;

pub use rank512::*;
pub use rank64::*;
pub use select_sampled::*;

/// Words per 2048-bit padding block.
pub(crate) const PAD_WORDS: usize = 32;

/// Round the backing storage up to a multiple of [`PAD_WORDS`] words,
/// extending the logical length over the zero padding.
pub(crate) fn pad_to_block(bits: BitVec) -> BitVec {
    let (mut data, _) = bits.into_raw_parts();
    let padded = (data.len() / PAD_WORDS + 1) * PAD_WORDS;
    data.resize(padded, 0);
    let len = padded * 64;
    unsafe { BitVec::from_raw_parts(data, len) }
}
