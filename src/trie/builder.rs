/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Bulk loader.

Keys are inserted in one pass in ascending order, building per-level scratch
arrays; each key is truncated to its shortest distinguishing prefix, i.e., it
is materialized only down to the level where it diverges from both its
predecessor and its successor. A key that is a proper prefix of its successor
gets a [`TERM`] slot instead. After the pass the level node counts fix the
dense/sparse cutoff, the dense levels are re-encoded into 256-bit node
bitmaps, and the sparse levels are flattened.

*/

use dsi_progress_logger::*;

use super::{DenseLayer, SparseLayer, Trie, TERM};
use crate::bits::BitVec;
use crate::rank_sel::Rank64;

/// Nodes-per-level ratio steering the dense/sparse split: a level is dense
/// while the cumulative node count above it stays under a 1/64th of the
/// total.
const CUTOFF_RATIO: usize = 64;

/// Per-level construction scratch. Slots are appended strictly left to
/// right, so the last slot is always the previous key's slot at this level.
struct LevelScratch {
    labels: Vec<u8>,
    has_child: BitVec,
    boundary: BitVec,
    values: Vec<u64>,
    nodes: usize,
}

impl LevelScratch {
    fn new() -> Self {
        Self {
            labels: Vec::new(),
            has_child: BitVec::new(0),
            boundary: BitVec::new(0),
            values: Vec::new(),
            nodes: 0,
        }
    }

    /// Extends the current node with `ch`, or returns `false` when the last
    /// slot already carries it, marking that slot as continuing.
    fn append(&mut self, ch: u8) -> bool {
        if self.labels.last() != Some(&ch) {
            self.labels.push(ch);
            self.has_child.push(false);
            let level_first = self.labels.len() == 1;
            self.boundary.push(level_first);
            if level_first {
                self.nodes += 1;
            }
            true
        } else {
            let last = self.labels.len() - 1;
            self.has_child.set(last, true);
            false
        }
    }

    /// Opens a new node with `ch` as its first slot.
    fn append_new(&mut self, ch: u8, terminal: bool) {
        self.labels.push(ch);
        self.has_child.push(!terminal);
        self.boundary.push(true);
        self.nodes += 1;
    }

    fn mark_child_last(&mut self) {
        let last = self.labels.len() - 1;
        self.has_child.set(last, true);
    }
}

fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Bulk loader for [`Trie`]; see [`TrieBuilder::from_sorted_with`].
pub struct TrieBuilder;

impl TrieBuilder {
    pub fn from_sorted<K: AsRef<[u8]>>(keys: &[K], values: &[u64]) -> Trie {
        Self::from_sorted_with(keys, values, no_logging![])
    }

    pub fn from_u64(keys: &[u64], values: &[u64]) -> Trie {
        Self::from_u64_with(keys, values, no_logging![])
    }

    /// Builds a trie from big-endian-encoded `u64` keys, so that byte order
    /// agrees with integer order.
    pub fn from_u64_with(keys: &[u64], values: &[u64], pl: &mut impl ProgressLog) -> Trie {
        let bytes = keys.iter().map(|k| k.to_be_bytes()).collect::<Vec<_>>();
        Self::from_sorted_with(&bytes, values, pl)
    }

    /// Builds a trie from keys in ascending byte order, one value per key.
    ///
    /// The first occurrence of a duplicate key wins. If any key is a proper
    /// prefix of another, no key may contain a zero byte, as zero is the
    /// in-trie terminator.
    ///
    /// Panics if `keys` and `values` differ in length; sortedness is checked
    /// by debug assertions only.
    pub fn from_sorted_with<K: AsRef<[u8]>>(
        keys: &[K],
        values: &[u64],
        pl: &mut impl ProgressLog,
    ) -> Trie {
        assert_eq!(keys.len(), values.len(), "one value per key required");
        if keys.is_empty() {
            return Self::empty();
        }
        let max_len = keys.iter().fold(0, |m, k| m.max(k.as_ref().len()));
        let height = max_len.max(1);
        let mut levels = (0..height).map(|_| LevelScratch::new()).collect::<Vec<_>>();
        let mut terminated = false;
        let mut num_keys = 0_usize;
        let mut first_value_level = 0_usize;
        let mut last_value_level = 0_usize;

        pl.item_name("key");
        pl.start(format!("Loading {} keys...", keys.len()));

        for k in 0..keys.len() {
            let key = keys[k].as_ref();
            if k > 0 {
                let prev = keys[k - 1].as_ref();
                debug_assert!(prev <= key, "keys are not sorted");
                if prev == key {
                    pl.light_update();
                    continue;
                }
            }
            num_keys += 1;

            // the divergence from the successor decides how deep this key
            // must be materialized; duplicates ahead are not successors
            let next = keys[k + 1..]
                .iter()
                .map(|n| n.as_ref())
                .find(|&n| n != key);

            let value_level;
            if key.is_empty() {
                debug_assert_eq!(k, 0, "the empty key must come first");
                levels[0].append(TERM);
                terminated = true;
                value_level = 0;
            } else {
                let mut i = 0;
                while i < key.len() && !levels[i].append(key[i]) {
                    i += 1;
                }
                assert!(i < key.len(), "key is a prefix of its predecessor");
                if let Some(next) = next {
                    let cpl = common_prefix_len(key, next);
                    if i < cpl {
                        levels[i].mark_child_last();
                        while i < cpl {
                            i += 1;
                            if i < cpl {
                                levels[i].append_new(key[i], false);
                            } else if i < key.len() {
                                levels[i].append_new(key[i], true);
                            } else {
                                levels[i].append_new(TERM, true);
                                terminated = true;
                            }
                        }
                    }
                }
                value_level = i;
            }

            levels[value_level].values.push(values[k]);
            if num_keys == 1 {
                first_value_level = value_level;
            }
            last_value_level = value_level;
            pl.light_update();
        }
        pl.done();

        let total_nodes = levels.iter().map(|l| l.nodes).sum::<usize>();
        let mut cutoff = 0_usize;
        let mut upper_nodes = 0_usize;
        while upper_nodes * CUTOFF_RATIO < total_nodes {
            upper_nodes += levels[cutoff].nodes;
            cutoff += 1;
        }
        cutoff -= 1;

        let value_counts = |ls: &[LevelScratch]| {
            ls.iter().map(|l| l.values.len() as u64).sum::<u64>()
        };
        let first_value_in_upper = first_value_level < cutoff;
        let first_value_idx = if first_value_in_upper {
            value_counts(&levels[..first_value_level])
        } else {
            value_counts(&levels[cutoff..first_value_level])
        };
        let last_value_in_upper = last_value_level < cutoff;
        let last_value_idx = if last_value_in_upper {
            value_counts(&levels[..=last_value_level]) - 1
        } else {
            value_counts(&levels[cutoff..=last_value_level]) - 1
        };

        let dense = Self::encode_dense(&levels[..cutoff], terminated);
        let sparse = Self::encode_sparse(&levels[cutoff..]);

        let trie = Trie {
            height,
            cutoff,
            num_keys,
            terminated,
            first_value_in_upper,
            first_value_idx,
            last_value_in_upper,
            last_value_idx,
            dense,
            sparse,
        };
        log::debug!(
            "loaded {} keys: height {}, cutoff {}, {} dense nodes, {} sparse slots, {} bytes",
            trie.num_keys,
            trie.height,
            trie.cutoff,
            trie.dense.num_nodes(),
            trie.sparse.len(),
            trie.memory_bytes()
        );
        trie
    }

    /// Re-encodes the upper levels into per-node 256-bit label and child
    /// bitmaps, plus one terminal bit per node for [`TERM`] slots, which
    /// sort first and are always node-initial.
    fn encode_dense(levels: &[LevelScratch], terminated: bool) -> DenseLayer {
        let mut label_words = Vec::<u64>::new();
        let mut child_words = Vec::<u64>::new();
        let mut terminals = BitVec::new(0);
        let mut values = Vec::<u64>::new();
        let mut num_nodes = 0_usize;
        let mut num_children = 0_usize;

        for level in levels {
            for (slot, &ch) in level.labels.iter().enumerate() {
                if level.boundary.get(slot) {
                    label_words.extend_from_slice(&[0; 4]);
                    child_words.extend_from_slice(&[0; 4]);
                    num_nodes += 1;
                    if terminated && ch == TERM {
                        terminals.push(true);
                        continue;
                    }
                    terminals.push(false);
                }
                let word = (num_nodes - 1) * 4 + ch as usize / 64;
                label_words[word] |= 1 << (ch % 64);
                if level.has_child.get(slot) {
                    child_words[word] |= 1 << (ch % 64);
                    num_children += 1;
                }
            }
            values.extend_from_slice(&level.values);
        }

        let bits = num_nodes << 8;
        // the words are exactly bits/64 long by construction
        let labels = Rank64::new(unsafe { BitVec::from_raw_parts(label_words, bits) });
        let children = Rank64::new(unsafe { BitVec::from_raw_parts(child_words, bits) });
        let terminals = Rank64::new(terminals);
        DenseLayer::new(labels, children, terminals, values, num_nodes, num_children)
    }

    fn encode_sparse(levels: &[LevelScratch]) -> SparseLayer {
        let mut labels = Vec::<u8>::new();
        let mut has_child = BitVec::new(0);
        let mut boundaries = BitVec::new(0);
        let mut values = Vec::<u64>::new();
        for level in levels {
            labels.extend_from_slice(&level.labels);
            has_child.extend_from(&level.has_child);
            boundaries.extend_from(&level.boundary);
            values.extend_from_slice(&level.values);
        }
        SparseLayer::new(labels, has_child, boundaries, values)
    }

    fn empty() -> Trie {
        Trie {
            height: 1,
            cutoff: 0,
            num_keys: 0,
            terminated: false,
            first_value_in_upper: false,
            first_value_idx: 0,
            last_value_in_upper: false,
            last_value_idx: 0,
            dense: DenseLayer::new(
                Rank64::new(BitVec::new(0)),
                Rank64::new(BitVec::new(0)),
                Rank64::new(BitVec::new(0)),
                Vec::new(),
                0,
                0,
            ),
            sparse: SparseLayer::new(Vec::new(), BitVec::new(0), BitVec::new(0), Vec::new()),
        }
    }
}
