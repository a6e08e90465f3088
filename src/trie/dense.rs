/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

The dense (upper) trie layer.

Each node owns 256 bit positions, one per possible label byte, in two
bitmaps: `labels` marks the outgoing edges, `children` the edges that
continue to a deeper level. A third bitmap, `terminals`, has one bit per
node and marks nodes that end a key themselves (the key whose last byte is
the parent edge). Global bit position `pos = node * 256 + byte` doubles as
the edge identifier everywhere in the trie.

*/

use epserde::*;
use mem_dbg::*;

use crate::rank_sel::Rank64;
use crate::traits::{BitCount, Rank};

/// A borrowed view over the 256 label bits of one dense node.
#[derive(Debug, Clone, Copy)]
pub struct DenseNodeView<'a> {
    words: &'a [u64],
}

impl DenseNodeView<'_> {
    #[inline(always)]
    pub fn has(&self, byte: u8) -> bool {
        (self.words[byte as usize / 64] >> (byte % 64)) & 1 != 0
    }

    /// Smallest label of the node that is `>= from`.
    pub fn next_label(&self, from: u8) -> Option<u8> {
        let mut w = from as usize / 64;
        let bit = from as usize % 64;
        let mut word = (self.words[w] >> bit) << bit;
        loop {
            if word != 0 {
                return Some((w * 64 + word.trailing_zeros() as usize) as u8);
            }
            w += 1;
            if w == 4 {
                return None;
            }
            word = self.words[w];
        }
    }

    /// Largest label of the node that is `<= from`.
    pub fn prev_label(&self, from: u8) -> Option<u8> {
        let mut w = from as usize / 64;
        let bit = from as usize % 64;
        let mut word = (self.words[w] << (63 - bit)) >> (63 - bit);
        loop {
            if word != 0 {
                return Some((w * 64 + 63 - word.leading_zeros() as usize) as u8);
            }
            if w == 0 {
                return None;
            }
            w -= 1;
            word = self.words[w];
        }
    }
}

#[derive(Epserde, Debug, Clone, MemDbg, MemSize)]
pub struct DenseLayer {
    labels: Rank64,
    children: Rank64,
    terminals: Rank64,
    values: Vec<u64>,
    num_nodes: usize,
    num_children: usize,
}

impl DenseLayer {
    pub fn new(
        labels: Rank64,
        children: Rank64,
        terminals: Rank64,
        values: Vec<u64>,
        num_nodes: usize,
        num_children: usize,
    ) -> Self {
        Self {
            labels,
            children,
            terminals,
            values,
            num_nodes,
            num_children,
        }
    }

    /// Number of nodes across all dense levels.
    #[inline(always)]
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Number of continuing edges across all dense levels, i.e., the number
    /// of child nodes the layer hands over to deeper levels.
    #[inline(always)]
    pub fn num_children(&self) -> usize {
        self.num_children
    }

    /// View over the label bitmap of one node. The node number may point one
    /// past the layer during speculative sibling scans; such views read the
    /// zero padding.
    #[inline(always)]
    pub fn node(&self, node: usize) -> DenseNodeView<'_> {
        DenseNodeView {
            words: &self.labels.words()[node * 4..node * 4 + 4],
        }
    }

    #[inline(always)]
    pub fn has_label(&self, node: usize, byte: u8) -> bool {
        self.labels.get((node << 8) + byte as usize)
    }

    #[inline(always)]
    pub fn has_child_at(&self, node: usize, byte: u8) -> bool {
        self.children.get((node << 8) + byte as usize)
    }

    /// Whether the node itself ends a key (an empty-suffix terminal, ordered
    /// before every edge of the node).
    #[inline(always)]
    pub fn is_terminal(&self, node: usize) -> bool {
        self.terminals.get(node)
    }

    #[inline(always)]
    pub fn next_label(&self, node: usize, from: u8) -> Option<u8> {
        self.node(node).next_label(from)
    }

    #[inline(always)]
    pub fn prev_label(&self, node: usize, from: u8) -> Option<u8> {
        self.node(node).prev_label(from)
    }

    /// Global node number of the child reached through edge `pos`.
    ///
    /// Edges are numbered level by level, so the rank of the continuing
    /// edges up to `pos` is exactly the creation number of the child node.
    #[inline(always)]
    pub fn child_node(&self, pos: usize) -> usize {
        self.children.rank(pos + 1)
    }

    /// Index into the dense value array for the terminal at edge `pos` of
    /// `node` (or at the node's own terminal, with `pos = node << 8`).
    ///
    /// Terminals up to `pos` are the labels that do not continue plus the
    /// node terminals, all in position order.
    #[inline(always)]
    pub fn value_pos(&self, node: usize, pos: usize) -> usize {
        self.labels.rank(pos + 1) - self.children.rank(pos + 1) + self.terminals.rank(node + 1) - 1
    }

    #[inline(always)]
    pub fn value(&self, idx: usize) -> u64 {
        self.values[idx]
    }

    /// Total number of bit positions; cursor positions at or past this bound
    /// are stale speculative leftovers.
    #[inline(always)]
    pub fn pos_bound(&self) -> usize {
        self.num_nodes << 8
    }

    pub fn mem_bytes(&self) -> u64 {
        self.labels.mem_bytes()
            + self.children.mem_bytes()
            + self.terminals.mem_bytes()
            + self.values.len() as u64 * 8
    }

    pub fn num_values(&self) -> usize {
        self.values.len()
    }
}

#[cfg(test)]
mod tests {
    use super::DenseNodeView;

    #[test]
    fn test_node_view_scans() {
        let mut words = [0_u64; 4];
        for byte in [0_usize, 3, 63, 64, 130, 255] {
            words[byte / 64] |= 1 << (byte % 64);
        }
        let view = DenseNodeView { words: &words };

        assert!(view.has(0));
        assert!(view.has(130));
        assert!(!view.has(131));

        assert_eq!(view.next_label(0), Some(0));
        assert_eq!(view.next_label(1), Some(3));
        assert_eq!(view.next_label(4), Some(63));
        assert_eq!(view.next_label(65), Some(130));
        assert_eq!(view.next_label(131), Some(255));

        assert_eq!(view.prev_label(255), Some(255));
        assert_eq!(view.prev_label(254), Some(130));
        assert_eq!(view.prev_label(129), Some(64));
        assert_eq!(view.prev_label(2), Some(0));

        let empty = [0_u64; 4];
        let view = DenseNodeView { words: &empty };
        assert_eq!(view.next_label(0), None);
        assert_eq!(view.prev_label(255), None);
    }
}
