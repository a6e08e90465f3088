/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

The sparse (lower) trie layer.

All levels below the cutoff are flattened, in level order, into one label
byte per slot plus two bitmaps: `has_child` marks the slots that continue
one level down, `boundaries` marks the first slot of each node. A node is a
maximal run of slots between boundaries, holding the sorted outgoing labels
of one trie node (at most 256 of them, plus one terminator slot).

*/

use epserde::*;
use mem_dbg::*;

use crate::bits::BitVec;
use crate::rank_sel::{Rank512, SelectSampled};
use crate::traits::{BitCount, Rank, Select};

#[derive(Epserde, Debug, Clone, MemDbg, MemSize)]
pub struct SparseLayer {
    labels: Vec<u8>,
    has_child: Rank512,
    boundaries: SelectSampled,
    values: Vec<u64>,
}

impl SparseLayer {
    pub fn new(labels: Vec<u8>, has_child: BitVec, boundaries: BitVec, values: Vec<u64>) -> Self {
        Self {
            labels,
            has_child: Rank512::new(has_child),
            boundaries: SelectSampled::new(boundaries),
            values,
        }
    }

    /// Number of slots.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    #[inline(always)]
    pub fn label(&self, pos: usize) -> u8 {
        self.labels[pos]
    }

    #[inline(always)]
    pub fn has_child(&self, pos: usize) -> bool {
        self.has_child.get(pos)
    }

    /// Whether `pos` is the first slot of a node. Positions slightly past the
    /// end read the bitmap's zero padding.
    #[inline(always)]
    pub fn is_boundary(&self, pos: usize) -> bool {
        self.boundaries.get(pos)
    }

    /// Number of continuing slots up to and including `pos`; combined with
    /// the dense layer's child count this is the global child number of the
    /// node entered through `pos`.
    #[inline(always)]
    pub fn child_node(&self, pos: usize) -> usize {
        self.has_child.rank(pos + 1)
    }

    /// First slot of the `node_rank`-th node (one-based across the layer).
    #[inline(always)]
    pub fn child_pos(&self, node_rank: usize) -> usize {
        self.boundaries.select(node_rank)
    }

    /// Index into the sparse value array for the terminal at `pos`: the
    /// number of non-continuing slots before it.
    #[inline(always)]
    pub fn value_pos(&self, pos: usize) -> usize {
        pos - self.has_child.rank(pos + 1)
    }

    #[inline(always)]
    pub fn value(&self, idx: usize) -> u64 {
        self.values[idx]
    }

    /// Number of slots of the node starting at `pos`: the distance to the
    /// next boundary bit. A node has at most 257 slots, so the scan looks at
    /// five words at most; with no boundary there, the node runs to the end
    /// of the layer.
    pub fn node_size(&self, pos: usize) -> usize {
        let from = pos + 1;
        let words = self.boundaries.words();
        let start = from / 64;
        let bit = from % 64;
        if start < words.len() {
            let word = (words[start] >> bit) << bit;
            if word != 0 {
                return start * 64 + word.trailing_zeros() as usize - pos;
            }
            for i in 1..5 {
                if start + i >= words.len() {
                    break;
                }
                let word = words[start + i];
                if word != 0 {
                    return (start + i) * 64 + word.trailing_zeros() as usize - pos;
                }
            }
        }
        self.labels.len() - pos
    }

    /// Exact search for `key` among the `size` slots of the node starting at
    /// `pos`. Three tiers by node size: linear scan, binary search, 16-byte
    /// vector compare.
    pub fn search(&self, pos: usize, size: usize, key: u8) -> Option<usize> {
        let node = &self.labels[pos..pos + size];
        if size < 3 {
            return node.iter().position(|&b| b == key).map(|i| pos + i);
        }
        if size < 12 {
            return node.binary_search(&key).ok().map(|i| pos + i);
        }
        self.vector_search(pos, size, key)
    }

    /// Smallest slot of the node with a label `>= key`. On failure the
    /// returned position is one past the node, i.e., the first slot of the
    /// next node in the layer, which is what the iterator caches expect.
    pub fn search_lower(&self, pos: usize, size: usize, key: u8) -> (usize, bool) {
        let node = &self.labels[pos..pos + size];
        if size < 3 {
            for (i, &b) in node.iter().enumerate() {
                if b >= key {
                    return (pos + i, true);
                }
            }
            (pos + size, false)
        } else {
            let i = node.partition_point(|&b| b < key);
            (pos + i, i < size)
        }
    }

    /// Largest slot of the node with a label `<= key`. On failure the
    /// returned position is one before the node (possibly -1), i.e., the
    /// last slot of the previous node in the layer.
    pub fn search_upper(&self, pos: usize, size: usize, key: u8) -> (i64, bool) {
        let node = &self.labels[pos..pos + size];
        if size < 3 {
            let mut last = None;
            for (i, &b) in node.iter().enumerate() {
                if b > key {
                    break;
                }
                last = Some(i);
            }
            match last {
                Some(i) => ((pos + i) as i64, true),
                None => (pos as i64 - 1, false),
            }
        } else {
            let i = node.partition_point(|&b| b <= key);
            if i == 0 {
                (pos as i64 - 1, false)
            } else {
                ((pos + i - 1) as i64, true)
            }
        }
    }

    #[cfg(target_arch = "x86_64")]
    fn vector_search(&self, pos: usize, size: usize, key: u8) -> Option<usize> {
        use core::arch::x86_64::*;
        // SSE2 is part of the x86_64 baseline
        unsafe {
            let needle = _mm_set1_epi8(key as i8);
            let mut s = 0;
            while s + 16 <= size {
                let chunk = _mm_loadu_si128(self.labels.as_ptr().add(pos + s) as *const __m128i);
                let mask = _mm_movemask_epi8(_mm_cmpeq_epi8(needle, chunk)) as u32;
                if mask != 0 {
                    return Some(pos + s + mask.trailing_zeros() as usize);
                }
                s += 16;
            }
            let rem = size - s;
            if rem > 0 {
                let mut buf = [0_u8; 16];
                buf[..rem].copy_from_slice(&self.labels[pos + s..pos + size]);
                let chunk = _mm_loadu_si128(buf.as_ptr() as *const __m128i);
                let mask = (_mm_movemask_epi8(_mm_cmpeq_epi8(needle, chunk)) as u32)
                    & ((1 << rem) - 1);
                if mask != 0 {
                    return Some(pos + s + mask.trailing_zeros() as usize);
                }
            }
            None
        }
    }

    #[cfg(not(target_arch = "x86_64"))]
    fn vector_search(&self, pos: usize, size: usize, key: u8) -> Option<usize> {
        self.labels[pos..pos + size]
            .iter()
            .position(|&b| b == key)
            .map(|i| pos + i)
    }

    pub fn mem_bytes(&self) -> u64 {
        self.labels.len() as u64
            + self.has_child.mem_bytes()
            + self.boundaries.mem_bytes()
            + self.values.len() as u64 * 8
    }

    pub fn num_values(&self) -> usize {
        self.values.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_node(labels: &[u8]) -> SparseLayer {
        let n = labels.len();
        let mut boundaries = BitVec::new(n);
        boundaries.set(0, true);
        SparseLayer::new(labels.to_vec(), BitVec::new(n), boundaries, vec![0; n])
    }

    #[test]
    fn test_search_tiers() {
        // linear, binary and vector tiers, including the masked tail
        for labels in [
            b"bd".to_vec(),
            b"abcdefgh".to_vec(),
            (0..40).map(|i| (i * 5) as u8).collect::<Vec<_>>(),
        ] {
            let layer = single_node(&labels);
            let size = labels.len();
            assert_eq!(layer.node_size(0), size);
            for (i, &b) in labels.iter().enumerate() {
                assert_eq!(layer.search(0, size, b), Some(i));
            }
            assert_eq!(layer.search(0, size, 201), None);
        }
    }

    #[test]
    fn test_search_tail_has_no_false_match() {
        // a zero byte beyond the node must not match in the vector tail
        let labels: Vec<u8> = (1..=20).collect();
        let layer = single_node(&labels);
        assert_eq!(layer.search(0, 20, 0), None);
    }

    #[test]
    fn test_search_bounds() {
        let layer = single_node(b"bdfh");
        assert_eq!(layer.search_lower(0, 4, b'a'), (0, true));
        assert_eq!(layer.search_lower(0, 4, b'd'), (1, true));
        assert_eq!(layer.search_lower(0, 4, b'e'), (2, true));
        // failure lands one past the node
        assert_eq!(layer.search_lower(0, 4, b'i'), (4, false));

        assert_eq!(layer.search_upper(0, 4, b'h'), (3, true));
        assert_eq!(layer.search_upper(0, 4, b'e'), (1, true));
        assert_eq!(layer.search_upper(0, 4, b'b'), (0, true));
        // failure lands one before the node
        assert_eq!(layer.search_upper(0, 4, b'a'), (-1, false));

        let layer = single_node(b"bd");
        assert_eq!(layer.search_lower(0, 2, b'c'), (1, true));
        assert_eq!(layer.search_lower(0, 2, b'e'), (2, false));
        assert_eq!(layer.search_upper(0, 2, b'c'), (0, true));
        assert_eq!(layer.search_upper(0, 2, b'a'), (-1, false));
    }

    #[test]
    fn test_node_size_multiple_nodes() {
        let labels = b"abcxy".to_vec();
        let mut boundaries = BitVec::new(5);
        boundaries.set(0, true);
        boundaries.set(3, true);
        let layer = SparseLayer::new(labels, BitVec::new(5), boundaries, vec![0; 5]);
        assert_eq!(layer.node_size(0), 3);
        assert_eq!(layer.node_size(3), 2);
    }
}
