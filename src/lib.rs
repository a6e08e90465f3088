/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

A fast succinct trie: a static, ordered key-value index over a sorted
sequence of byte-string (or fixed-width integer) keys.

The trie is bulk-loaded once and then queried with [`lookup`](trie::Trie::lookup),
[`lower_bound`](trie::Trie::lower_bound) and [`upper_bound`](trie::Trie::upper_bound);
the bound queries return a pointer-free [iterator](trie::TrieIter) that steps
through the keys in order in both directions. Upper trie levels are encoded as
per-node 256-bit bitmaps, lower levels as flat label arrays, both navigated
through the rank/select primitives in [`rank_sel`].

*/
#![deny(unconditional_recursion)]

pub mod bits;
pub mod rank_sel;
pub mod traits;
pub mod trie;

pub mod prelude {
    pub use crate::bits::*;
    pub use crate::rank_sel::*;
    pub use crate::traits::*;
    pub use crate::trie::*;
}
