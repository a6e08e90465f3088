/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

A bulk-loaded fast succinct trie mapping byte-string keys to `u64` values.

Keys are truncated at load time to their shortest distinguishing prefix, so
[`lookup`](Trie::lookup) answers are one-sided: a present key always returns
its value, but a query that shares a stored prefix may return the value of
the key it collides with. Bound queries and iteration are defined over the
stored byte strings.

Levels are split at a cutoff: levels above it (holding at most 64 times
fewer nodes than the whole trie) are encoded densely, with a 256-bit label
bitmap per node, the rest sparsely as flat label arrays. See [`dense`] and
[`sparse`].

*/

use epserde::*;
use mem_dbg::*;

pub mod builder;
pub mod dense;
pub mod iter;
pub mod sparse;

pub use builder::TrieBuilder;
pub use dense::DenseLayer;
pub use iter::TrieIter;
pub use sparse::SparseLayer;

/// Terminator label for keys that are proper prefixes of other keys. Zero
/// sorts before every other byte, keeping node slots ordered; keys must not
/// contain it.
pub(crate) const TERM: u8 = 0;

/// A static, ordered map from byte-string keys to `u64` values.
///
/// Built with [`Trie::from_sorted`] (or [`Trie::from_u64`]) from keys in
/// ascending order; the first occurrence of a duplicate key wins.
#[derive(Epserde, Debug, Clone, MemDbg, MemSize)]
pub struct Trie {
    pub(crate) height: usize,
    pub(crate) cutoff: usize,
    pub(crate) num_keys: usize,
    /// Whether any stored key is a proper prefix of another, i.e., whether
    /// any [`TERM`] slot exists.
    pub(crate) terminated: bool,
    pub(crate) first_value_in_upper: bool,
    pub(crate) first_value_idx: u64,
    pub(crate) last_value_in_upper: bool,
    pub(crate) last_value_idx: u64,
    pub(crate) dense: DenseLayer,
    pub(crate) sparse: SparseLayer,
}

impl Trie {
    /// Builds a trie from keys sorted in ascending byte order. Panics if
    /// `keys` and `values` differ in length; out-of-order keys are caught by
    /// a debug assertion only.
    pub fn from_sorted<K: AsRef<[u8]>>(keys: &[K], values: &[u64]) -> Self {
        TrieBuilder::from_sorted(keys, values)
    }

    /// Builds a trie from ascending `u64` keys, stored big-endian so that
    /// byte order matches integer order.
    pub fn from_u64(keys: &[u64], values: &[u64]) -> Self {
        TrieBuilder::from_u64(keys, values)
    }

    /// Number of keys.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.num_keys
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.num_keys == 0
    }

    /// Number of levels, i.e., the length of the longest stored key
    /// (terminators included).
    #[inline(always)]
    pub fn height(&self) -> usize {
        self.height
    }

    /// First sparse level; levels before it are dense.
    #[inline(always)]
    pub fn cutoff(&self) -> usize {
        self.cutoff
    }

    /// Heap bytes of the index structures and values.
    pub fn memory_bytes(&self) -> u64 {
        self.dense.mem_bytes() + self.sparse.mem_bytes()
    }

    /// First sparse slot of the node with the given global number.
    #[inline(always)]
    pub(crate) fn sparse_child_pos(&self, node: usize) -> usize {
        self.sparse.child_pos(node - self.dense.num_nodes() + 1)
    }

    /// First slot of the child node entered through sparse slot `pos`.
    #[inline(always)]
    pub(crate) fn sparse_child_of(&self, pos: usize) -> usize {
        self.sparse_child_pos(self.sparse.child_node(pos) + self.dense.num_children())
    }

    /// Looks up a key.
    ///
    /// The answer is one-sided: a stored key always returns its value, but
    /// because keys are truncated to distinguishing prefixes, a query that
    /// is absent yet extends a stored prefix returns that key's value, and
    /// the remaining query bytes are not checked.
    pub fn lookup(&self, key: &[u8]) -> Option<u64> {
        if self.num_keys == 0 {
            return None;
        }
        let mut node = 0_usize;
        let mut keypos = 0_usize;

        while keypos < self.cutoff {
            if keypos == key.len() {
                // query consumed at a node: only its empty-suffix terminal matches
                return if self.dense.is_terminal(node) {
                    Some(self.dense.value(self.dense.value_pos(node, node << 8)))
                } else {
                    None
                };
            }
            let kc = key[keypos];
            if !self.dense.has_label(node, kc) {
                return None;
            }
            let pos = (node << 8) + kc as usize;
            if !self.dense.has_child_at(node, kc) {
                return Some(self.dense.value(self.dense.value_pos(node, pos)));
            }
            node = self.dense.child_node(pos);
            keypos += 1;
        }

        let mut pos = if self.cutoff == 0 {
            0
        } else {
            self.sparse_child_pos(node)
        };
        loop {
            if keypos == key.len() {
                return if self.terminated
                    && self.sparse.label(pos) == TERM
                    && !self.sparse.has_child(pos)
                {
                    Some(self.sparse.value(self.sparse.value_pos(pos)))
                } else {
                    None
                };
            }
            let size = self.sparse.node_size(pos);
            let found = self.sparse.search(pos, size, key[keypos])?;
            if !self.sparse.has_child(found) {
                return Some(self.sparse.value(self.sparse.value_pos(found)));
            }
            pos = self.sparse_child_of(found);
            keypos += 1;
        }
    }

    /// Looks up a big-endian-encoded integer key.
    #[inline(always)]
    pub fn lookup_u64(&self, key: u64) -> Option<u64> {
        self.lookup(&key.to_be_bytes())
    }

    /// Returns an iterator on the smallest stored key `>=` the query, or
    /// `None` when every stored key is smaller. An empty query yields the
    /// first entry.
    pub fn lower_bound(&self, key: &[u8]) -> Option<TrieIter<'_>> {
        let mut iter = TrieIter::new(self);
        if self.lower_bound_into(key, &mut iter) {
            Some(iter)
        } else {
            None
        }
    }

    /// Returns an iterator on the largest stored key `<=` the query, or
    /// `None` when every stored key is larger.
    pub fn upper_bound(&self, key: &[u8]) -> Option<TrieIter<'_>> {
        let mut iter = TrieIter::new(self);
        if self.upper_bound_into(key, &mut iter) {
            Some(iter)
        } else {
            None
        }
    }

    #[inline(always)]
    pub fn lower_bound_u64(&self, key: u64) -> Option<TrieIter<'_>> {
        self.lower_bound(&key.to_be_bytes())
    }

    #[inline(always)]
    pub fn upper_bound_u64(&self, key: u64) -> Option<TrieIter<'_>> {
        self.upper_bound(&key.to_be_bytes())
    }

    pub(crate) fn lower_bound_into(&self, key: &[u8], iter: &mut TrieIter<'_>) -> bool {
        iter.clear();
        if self.num_keys == 0 {
            return false;
        }
        if key.is_empty() {
            return self.seek_first(iter);
        }
        let mut keypos = 0_usize;
        let mut node = 0_usize;

        while keypos < key.len() && keypos < self.cutoff {
            let kc = key[keypos];
            let pos = (node << 8) + kc as usize;
            match self.dense.next_label(node, kc) {
                None => {
                    // every label of this node is smaller than the query byte
                    return self.dense_successor(keypos, node, iter);
                }
                Some(cc) if cc != kc => {
                    let pos = (node << 8) + cc as usize;
                    iter.set_key_pos(keypos, pos as i64);
                    return iter.next_left_dense(keypos, pos);
                }
                Some(_) => {}
            }
            iter.set_key_pos(keypos, pos as i64);
            if !self.dense.has_child_at(node, kc) {
                // the stored key is a prefix of the query; if query bytes
                // remain it is strictly smaller and the successor is wanted
                iter.finish_at_dense(keypos, node, pos);
                return if keypos + 1 < key.len() {
                    iter.advance()
                } else {
                    true
                };
            }
            node = self.dense.child_node(pos);
            keypos += 1;
        }

        if keypos < self.cutoff {
            // query consumed at a dense node
            if self.dense.is_terminal(node) {
                iter.set_kv_dense_o(keypos, node);
                return true;
            }
            // every key through this node extends the query
            let pos = iter.key_pos(keypos - 1);
            return iter.next_left_dense(keypos - 1, pos);
        }

        let mut pos = if self.cutoff == 0 {
            0
        } else {
            self.sparse_child_pos(node)
        };
        while keypos < key.len() {
            let kc = key[keypos];
            let size = self.sparse.node_size(pos);
            let (found, in_node) = self.sparse.search_lower(pos, size, kc);
            iter.set_key_pos(keypos, found as i64);
            if !in_node {
                return iter.next_node(keypos);
            }
            let cc = self.sparse.label(found);
            if cc != kc {
                return iter.next_left(keypos, found);
            }
            if !self.sparse.has_child(found) {
                iter.finish_at_sparse(keypos, found);
                return if keypos + 1 < key.len() {
                    iter.advance()
                } else {
                    true
                };
            }
            pos = self.sparse_child_of(found);
            keypos += 1;
        }

        if self.terminated && self.sparse.label(pos) == TERM && !self.sparse.has_child(pos) {
            iter.set_key_pos(keypos, pos as i64);
            iter.finish_at_sparse(keypos, pos);
            return true;
        }
        iter.next_left(keypos, pos)
    }

    pub(crate) fn upper_bound_into(&self, key: &[u8], iter: &mut TrieIter<'_>) -> bool {
        iter.clear();
        iter.seed_backward();
        if self.num_keys == 0 {
            return false;
        }
        if key.is_empty() {
            // only the empty key is <= an empty query
            return self.seek_empty_key(iter);
        }
        let mut keypos = 0_usize;
        let mut node = 0_usize;

        while keypos < key.len() && keypos < self.cutoff {
            let kc = key[keypos];
            let pos = (node << 8) + kc as usize;
            match self.dense.prev_label(node, kc) {
                None => {
                    // the node's empty-suffix terminal orders before every label
                    if self.dense.is_terminal(node) {
                        iter.set_kv_dense_o(keypos, node);
                        return true;
                    }
                    return self.dense_predecessor(keypos, node, iter);
                }
                Some(cc) if cc != kc => {
                    let pos = (node << 8) + cc as usize;
                    iter.set_key_pos(keypos, pos as i64);
                    return iter.next_right_dense(keypos, pos);
                }
                Some(_) => {}
            }
            iter.set_key_pos(keypos, pos as i64);
            if !self.dense.has_child_at(node, kc) {
                // the stored key is a prefix of the query, hence <= it
                iter.finish_at_dense(keypos, node, pos);
                return true;
            }
            node = self.dense.child_node(pos);
            keypos += 1;
        }

        if keypos < self.cutoff {
            if self.dense.is_terminal(node) {
                iter.set_kv_dense_o(keypos, node);
                return true;
            }
            // every key through this node extends the query and is > it;
            // seat the iterator on the smallest extension and step back
            let pos = iter.key_pos(keypos - 1);
            iter.next_left_dense(keypos - 1, pos);
            return iter.retreat();
        }

        let mut pos = if self.cutoff == 0 {
            0
        } else {
            self.sparse_child_pos(node)
        };
        while keypos < key.len() {
            let kc = key[keypos];
            let size = self.sparse.node_size(pos);
            let (found, in_node) = self.sparse.search_upper(pos, size, kc);
            iter.set_key_pos(keypos, found);
            if !in_node {
                return iter.prev_node(keypos);
            }
            let found = found as usize;
            let cc = self.sparse.label(found);
            if cc != kc {
                return iter.next_right(keypos, found);
            }
            if !self.sparse.has_child(found) {
                iter.finish_at_sparse(keypos, found);
                return true;
            }
            pos = self.sparse_child_of(found);
            keypos += 1;
        }

        if self.terminated && self.sparse.label(pos) == TERM && !self.sparse.has_child(pos) {
            iter.set_key_pos(keypos, pos as i64);
            iter.finish_at_sparse(keypos, pos);
            return true;
        }
        iter.next_left(keypos, pos);
        iter.retreat()
    }

    /// Seats the iterator on the first entry in key order.
    fn seek_first(&self, iter: &mut TrieIter<'_>) -> bool {
        if self.cutoff == 0 {
            return iter.next_left(0, 0);
        }
        if self.dense.is_terminal(0) {
            iter.set_kv_dense_o(0, 0);
            return true;
        }
        let cc = self
            .dense
            .next_label(0, 0)
            .expect("dense node without labels");
        iter.set_key_pos(0, cc as i64);
        iter.next_left_dense(0, cc as usize)
    }

    /// Seats the iterator on the empty key, if stored.
    fn seek_empty_key(&self, iter: &mut TrieIter<'_>) -> bool {
        if self.cutoff == 0 {
            if self.terminated && self.sparse.label(0) == TERM && !self.sparse.has_child(0) {
                iter.set_key_pos(0, 0);
                iter.finish_at_sparse(0, 0);
                return true;
            }
            return false;
        }
        if self.dense.is_terminal(0) {
            iter.set_kv_dense_o(0, 0);
            return true;
        }
        false
    }

    fn dense_successor(&self, level: usize, node: usize, iter: &mut TrieIter<'_>) -> bool {
        match iter.next_node_dense(level, node) {
            None => false,
            Some(found) => found,
        }
    }

    fn dense_predecessor(&self, level: usize, node: usize, iter: &mut TrieIter<'_>) -> bool {
        match iter.prev_node_dense(level, node) {
            None => false,
            Some(found) => found,
        }
    }
}
