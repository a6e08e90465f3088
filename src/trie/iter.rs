/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Bidirectional trie cursor.

The iterator keeps one [`Cursor`] per trie level. `positions[level].key_pos`
caches the slot the current path (or the last path through that level) used:
a `node << 8 | byte` position for dense levels, a flat array index for sparse
ones. `val_pos` caches the value index last read at that level, so that a
step which re-enters the level can produce the next value with a single
increment or decrement instead of three ranks. A cache of `-1` means the
level has not been visited since the last [`clear`](TrieIter::clear).

Steps maintain the adjacency invariant: whenever a step leaves a subtree, the
per-level caches below the point of departure are moved by one slot, so they
already point into the neighboring subtree if the iteration ever descends
back through those levels.

The invariant is directional: a cache shifted forward points one slot past
the old subtree, which is exactly where a backward descent must not land (and
vice versa). The iterator tracks the direction of the last step and, on a
reversal, drops every cache except the current path and the current value
index; those are recomputed from ranks on the next descent.

*/

use super::Trie;
use super::TERM;

/// Per-level iterator state.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Cursor {
    pub(crate) key_pos: i64,
    pub(crate) val_pos: i64,
    pub(crate) is_o: bool,
}

impl Cursor {
    const CLEAR: Cursor = Cursor {
        key_pos: -1,
        val_pos: -1,
        is_o: false,
    };
}

/// A cursor over the entries of a [`Trie`], in key order.
///
/// Obtained from [`Trie::lower_bound`] or [`Trie::upper_bound`]. Stepping
/// past either end of the keyspace latches a sentinel state: the iterator
/// stays on the first (resp. last) entry, whose value remains readable, and
/// further steps in that direction return `false`.
#[derive(Debug, Clone)]
pub struct TrieIter<'a> {
    trie: &'a Trie,
    positions: Vec<Cursor>,
    len: usize,
    fwd: bool,
    is_begin: bool,
    is_end: bool,
}

impl<'a> TrieIter<'a> {
    pub fn new(trie: &'a Trie) -> Self {
        Self {
            trie,
            positions: vec![Cursor::CLEAR; trie.height],
            len: 0,
            fwd: true,
            is_begin: false,
            is_end: false,
        }
    }

    #[inline(always)]
    pub(crate) fn key_pos(&self, level: usize) -> usize {
        self.positions[level].key_pos as usize
    }

    pub fn clear(&mut self) {
        self.positions.fill(Cursor::CLEAR);
        self.len = 0;
        self.fwd = true;
        self.is_begin = false;
        self.is_end = false;
    }

    /// Marks the caches a bound query is about to write as backward-adjacent.
    pub(crate) fn seed_backward(&mut self) {
        self.fwd = false;
    }

    /// Whether the iterator has been stepped past the last entry.
    pub fn at_end(&self) -> bool {
        self.is_end
    }

    /// Whether the iterator has been stepped before the first entry.
    pub fn at_begin(&self) -> bool {
        self.is_begin
    }

    /// The value of the current entry.
    pub fn value(&self) -> u64 {
        let vp = self.positions[self.len - 1].val_pos as usize;
        if self.len <= self.trie.cutoff {
            self.trie.dense.value(vp)
        } else {
            self.trie.sparse.value(vp)
        }
    }

    /// The stored key bytes of the current entry.
    ///
    /// Keys truncated at load time to their shortest distinguishing prefix
    /// come back truncated; the terminator of a key that is a proper prefix
    /// of another is stripped.
    pub fn key(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len);
        for i in 0..self.len {
            let c = &self.positions[i];
            if i < self.trie.cutoff {
                if !c.is_o {
                    out.push((c.key_pos & 255) as u8);
                }
            } else {
                let pos = c.key_pos as usize;
                let b = self.trie.sparse.label(pos);
                if !(self.trie.terminated && b == TERM && self.trie.sparse.is_boundary(pos)) {
                    out.push(b);
                }
            }
        }
        out
    }

    /// The current entry's key as a big-endian integer, for tries loaded
    /// from fixed-width integer keys. Truncated bytes read as zero.
    pub fn key_u64(&self) -> u64 {
        let k = self.key();
        let mut bytes = [0_u8; 8];
        let n = k.len().min(8);
        bytes[..n].copy_from_slice(&k[..n]);
        u64::from_be_bytes(bytes)
    }

    /// Moves to the next entry in key order. Returns `false`, and latches
    /// the end sentinel, when there is none.
    pub fn advance(&mut self) -> bool {
        if self.is_end {
            return false;
        }
        if self.len == 0 {
            return false;
        }
        let in_upper = self.len <= self.trie.cutoff;
        if self.positions[self.len - 1].val_pos == self.trie.last_value_idx as i64
            && in_upper == self.trie.last_value_in_upper
        {
            self.is_end = true;
            return false;
        }
        if !self.fwd {
            self.invalidate_caches();
            self.fwd = true;
        }
        let ok = self.advance_inner();
        if ok {
            self.is_begin = false;
        }
        ok
    }

    /// Moves to the previous entry in key order. Returns `false`, and
    /// latches the begin sentinel, when there is none.
    pub fn retreat(&mut self) -> bool {
        if self.is_begin {
            return false;
        }
        if self.len == 0 {
            return false;
        }
        let in_upper = self.len <= self.trie.cutoff;
        if self.positions[self.len - 1].val_pos == self.trie.first_value_idx as i64
            && in_upper == self.trie.first_value_in_upper
        {
            self.is_begin = true;
            return false;
        }
        if self.fwd {
            self.invalidate_caches();
            self.fwd = false;
        }
        let ok = self.retreat_inner();
        if ok {
            self.is_end = false;
        }
        ok
    }

    /// Drops the caches shifted by steps in the opposite direction. The
    /// current path keeps its positions, and the current level its value
    /// index, which is exact and steps by one in either direction; everything
    /// else is recomputed from ranks on the next descent through it.
    fn invalidate_caches(&mut self) {
        for level in 0..self.positions.len() {
            if level >= self.len {
                self.positions[level] = Cursor::CLEAR;
            } else if level != self.len - 1 {
                self.positions[level].val_pos = -1;
            }
        }
    }

    fn advance_inner(&mut self) -> bool {
        let mut level = self.len as i64 - 1;
        while level >= 0 {
            let l = level as usize;
            if l < self.trie.cutoff {
                // stale caches past the last dense node are left over from
                // speculative sibling scans
                if self.positions[l].key_pos >= self.trie.dense.pos_bound() as i64 {
                    level -= 1;
                    continue;
                }
                let c = self.positions[l];
                let node = (c.key_pos >> 8) as usize;
                let kc = (c.key_pos & 255) as u8;
                let next_kc = if kc == 0 && c.is_o { 0 } else { kc.wrapping_add(1) };
                self.positions[l].is_o = false;
                let next = if kc == 255 {
                    None
                } else {
                    self.trie.dense.next_label(node, next_kc)
                };
                return match next {
                    Some(cc) => {
                        let pos = (node << 8) + cc as usize;
                        self.set_key_pos(l, pos as i64);
                        self.next_left_dense(l, pos)
                    }
                    None => self.next_node_dense(l, node) == Some(true),
                };
            } else {
                if self.positions[l].key_pos >= self.trie.sparse.len() as i64 - 1 {
                    level -= 1;
                    continue;
                }
                self.positions[l].key_pos += 1;
                let pos = self.positions[l].key_pos as usize;
                return if self.trie.sparse.is_boundary(pos) {
                    self.next_node(l)
                } else {
                    self.next_left(l, pos)
                };
            }
        }
        false
    }

    fn retreat_inner(&mut self) -> bool {
        let mut level = self.len as i64 - 1;
        while level >= 0 {
            let l = level as usize;
            if l < self.trie.cutoff {
                if self.positions[l].key_pos < 0 {
                    level -= 1;
                    continue;
                }
                let c = self.positions[l];
                let node = (c.key_pos >> 8) as usize;
                let kc = (c.key_pos & 255) as u8;
                if kc == 0 {
                    if !c.is_o && self.trie.dense.is_terminal(node) {
                        self.positions[l].key_pos = (node << 8) as i64;
                        self.positions[l].is_o = true;
                        return self.next_right_dense(l, node << 8);
                    }
                    return self.prev_node_dense(l, node) == Some(true);
                }
                return if let Some(cc) = self.trie.dense.prev_label(node, kc - 1) {
                    let pos = (node << 8) + cc as usize;
                    self.set_key_pos(l, pos as i64);
                    self.next_right_dense(l, pos)
                } else if self.trie.dense.is_terminal(node) {
                    self.positions[l].key_pos = (node << 8) as i64;
                    self.positions[l].is_o = true;
                    self.next_right_dense(l, node << 8)
                } else {
                    self.prev_node_dense(l, node) == Some(true)
                };
            } else {
                if self.positions[l].key_pos <= 0 {
                    level -= 1;
                    continue;
                }
                let was_boundary = self.trie.sparse.is_boundary(self.positions[l].key_pos as usize);
                self.positions[l].key_pos -= 1;
                let pos = self.positions[l].key_pos as usize;
                return if was_boundary {
                    self.prev_node(l)
                } else {
                    self.next_right(l, pos)
                };
            }
        }
        false
    }

    // ------------------------------------------------------------------
    // Leftmost/rightmost descents. `next_left*` seats the iterator on the
    // smallest entry of the subtree hanging off the given position,
    // `next_right*` on the largest.
    // ------------------------------------------------------------------

    pub(crate) fn next_left_dense(&mut self, level: usize, pos: usize) -> bool {
        let mut level = level;
        let mut pos = pos;
        let mut node = pos >> 8;
        let cc = (pos & 255) as u8;
        if !self.trie.dense.has_child_at(node, cc) {
            self.set_v_dense(level, node, pos);
            return true;
        }
        level += 1;
        node = if self.positions[level].key_pos < 0 {
            self.trie.dense.child_node(pos)
        } else {
            (self.positions[level].key_pos >> 8) as usize
        };
        while level < self.trie.cutoff {
            if self.trie.dense.is_terminal(node) {
                self.set_kv_dense_o(level, node);
                return true;
            }
            let cc = self
                .trie
                .dense
                .next_label(node, 0)
                .expect("dense node without labels");
            pos = (node << 8) + cc as usize;
            self.set_key_pos(level, pos as i64);
            if !self.trie.dense.has_child_at(node, cc) {
                self.set_v_dense(level, node, pos);
                return true;
            }
            level += 1;
            node = if self.positions[level].key_pos < 0 {
                self.trie.dense.child_node(pos)
            } else {
                (self.positions[level].key_pos >> 8) as usize
            };
        }
        let pos = if self.positions[level].key_pos < 0 {
            self.trie.sparse_child_pos(node)
        } else {
            self.positions[level].key_pos as usize
        };
        self.next_left(level, pos)
    }

    pub(crate) fn next_right_dense(&mut self, level: usize, pos: usize) -> bool {
        let mut level = level;
        let mut pos = pos;
        let mut node = pos >> 8;
        let cc = (pos & 255) as u8;
        if !self.trie.dense.has_child_at(node, cc) {
            self.set_v_dense_r(level, node, pos);
            return true;
        }
        level += 1;
        node = if self.positions[level].key_pos < 0 {
            self.trie.dense.child_node(pos)
        } else {
            (self.positions[level].key_pos >> 8) as usize
        };
        while level < self.trie.cutoff {
            let cc = self
                .trie
                .dense
                .prev_label(node, 255)
                .expect("dense node without labels");
            pos = (node << 8) + cc as usize;
            self.set_key_pos(level, pos as i64);
            if !self.trie.dense.has_child_at(node, cc) {
                self.set_v_dense_r(level, node, pos);
                return true;
            }
            level += 1;
            node = if self.positions[level].key_pos < 0 {
                self.trie.dense.child_node(pos)
            } else {
                (self.positions[level].key_pos >> 8) as usize
            };
        }
        let pos = if self.positions[level].key_pos < 0 {
            let p = self.trie.sparse_child_pos(node);
            p + self.trie.sparse.node_size(p) - 1
        } else {
            self.positions[level].key_pos as usize
        };
        self.next_right(level, pos)
    }

    pub(crate) fn next_left(&mut self, level: usize, pos: usize) -> bool {
        let mut level = level;
        let mut pos = pos;
        while self.trie.sparse.has_child(pos) {
            self.set_key_pos(level, pos as i64);
            level += 1;
            pos = if self.positions[level].key_pos < 0 {
                self.trie.sparse_child_of(pos)
            } else {
                self.positions[level].key_pos as usize
            };
        }
        self.set_kv(level, pos);
        true
    }

    pub(crate) fn next_right(&mut self, level: usize, pos: usize) -> bool {
        let mut level = level;
        let mut pos = pos;
        while self.trie.sparse.has_child(pos) {
            self.set_key_pos(level, pos as i64);
            level += 1;
            pos = if self.positions[level].key_pos < 0 {
                let p = self.trie.sparse_child_of(pos);
                p + self.trie.sparse.node_size(p) - 1
            } else {
                self.positions[level].key_pos as usize
            };
        }
        self.set_kv_r(level, pos);
        true
    }

    // ------------------------------------------------------------------
    // Sibling-node advances. The dense variants return `None` past the
    // keyspace boundary, `Some(true)` when the step landed on a value in
    // the dense layers, and `Some(false)` when the caller must finish the
    // descent through the sparse caches (only possible for
    // `level >= cutoff`).
    // ------------------------------------------------------------------

    pub(crate) fn next_node_dense(&mut self, level: usize, node: usize) -> Option<bool> {
        let cutoff = self.trie.cutoff;
        let mut cur = if level < cutoff { level } else { cutoff - 1 };
        let mut node = node;
        let mut cc: u8 = 0;
        let mut in_node = false;

        while !in_node {
            if cur == 0 {
                // no next node at the root level
                return None;
            }
            node += 1;
            if self.trie.dense.is_terminal(node) {
                self.positions[cur].key_pos = (node << 8) as i64;
                self.positions[cur].is_o = true;
            } else {
                // a node one past the layer has no labels; the write is
                // speculative and never consumed in that case
                let first = self.trie.dense.next_label(node, 0).unwrap_or(0);
                self.set_key_pos(cur, ((node << 8) + first as usize) as i64);
            }
            cur -= 1;
            let cached = self.positions[cur];
            node = (cached.key_pos >> 8) as usize;
            let kc = (cached.key_pos & 255) as u8;
            let next_kc = if kc == 0 && cached.is_o { 0 } else { kc.wrapping_add(1) };
            self.positions[cur].is_o = false;
            if kc < 255 {
                if let Some(c) = self.trie.dense.next_label(node, next_kc) {
                    cc = c;
                    in_node = true;
                }
            }
        }
        self.set_key_pos(cur, ((node << 8) + cc as usize) as i64);

        while cur < level && cur < cutoff {
            let pos = self.positions[cur].key_pos as usize;
            let node = pos >> 8;
            let byte = (pos & 255) as u8;
            if !self.trie.dense.has_child_at(node, byte) {
                self.set_v_dense(cur, node, pos);
                return Some(true);
            }
            cur += 1;
        }
        if level < cutoff {
            Some(self.next_left_dense(level, self.positions[level].key_pos as usize))
        } else {
            Some(false)
        }
    }

    pub(crate) fn prev_node_dense(&mut self, level: usize, node: usize) -> Option<bool> {
        let cutoff = self.trie.cutoff;
        let mut cur = if level < cutoff { level } else { cutoff - 1 };
        let mut node = node;
        let mut cc: u8 = 0;
        let mut o_exit = false;
        let mut in_node = false;

        while !in_node {
            if node == 0 {
                // no previous node at the root level
                return None;
            }
            node -= 1;
            let last = self
                .trie
                .dense
                .prev_label(node, 255)
                .expect("dense node without labels");
            self.set_key_pos(cur, ((node << 8) + last as usize) as i64);
            cur -= 1;
            let cached = self.positions[cur];
            node = (cached.key_pos >> 8) as usize;
            let kc = (cached.key_pos & 255) as u8;
            if kc == 0 {
                if !cached.is_o && self.trie.dense.is_terminal(node) {
                    self.positions[cur].is_o = true;
                    cc = 0;
                    o_exit = true;
                    in_node = true;
                }
            } else if let Some(c) = self.trie.dense.prev_label(node, kc - 1) {
                cc = c;
                in_node = true;
            } else if self.trie.dense.is_terminal(node) {
                self.positions[cur].is_o = true;
                cc = 0;
                o_exit = true;
                in_node = true;
            }
        }
        self.positions[cur].key_pos = ((node << 8) + cc as usize) as i64;
        if !o_exit {
            self.positions[cur].is_o = false;
        }

        while cur < level && cur < cutoff {
            let pos = self.positions[cur].key_pos as usize;
            let node = pos >> 8;
            let byte = (pos & 255) as u8;
            if !self.trie.dense.has_child_at(node, byte) {
                self.set_v_dense_r(cur, node, pos);
                return Some(true);
            }
            cur += 1;
        }
        if level < cutoff {
            Some(self.next_right_dense(level, self.positions[level].key_pos as usize))
        } else {
            Some(false)
        }
    }

    /// Moves to the leftmost entry of the node after the one holding
    /// `positions[level]`, escalating through ancestors (and into the dense
    /// layers) as needed. Returns `false` past the last entry.
    pub(crate) fn next_node(&mut self, level: usize) -> bool {
        let cutoff = self.trie.cutoff;
        let mut in_node = false;
        let mut cur: i64 = level as i64 - 1;
        while !in_node && cur >= cutoff as i64 {
            let c = &mut self.positions[cur as usize];
            c.key_pos += 1;
            let pos = c.key_pos as usize;
            in_node = pos < self.trie.sparse.len() && !self.trie.sparse.is_boundary(pos);
            cur -= 1;
        }

        if !in_node {
            if cutoff == 0 {
                return false;
            }
            let lvl = cutoff - 1;
            let cached = self.positions[lvl];
            let node = (cached.key_pos >> 8) as usize;
            let kc = (cached.key_pos & 255) as u8;
            let next_kc = if kc == 0 && cached.is_o { 0 } else { kc.wrapping_add(1) };
            self.positions[lvl].is_o = false;
            let next = if kc == 255 {
                None
            } else {
                self.trie.dense.next_label(node, next_kc)
            };
            match next {
                Some(cc) => {
                    let pos = (node << 8) + cc as usize;
                    self.set_key_pos(lvl, pos as i64);
                    return self.next_left_dense(lvl, pos);
                }
                None => match self.next_node_dense(level, node) {
                    None => return false,
                    Some(true) => return true,
                    Some(false) => {}
                },
            }
        }

        let mut cur = (cur + 1) as usize;
        while cur < level {
            let pos = self.positions[cur].key_pos as usize;
            if !self.trie.sparse.has_child(pos) {
                self.set_v(cur, pos);
                return true;
            }
            cur += 1;
        }
        self.next_left(level, self.positions[level].key_pos as usize)
    }

    /// Moves to the rightmost entry of the node before the one holding
    /// `positions[level]`. Returns `false` before the first entry.
    pub(crate) fn prev_node(&mut self, level: usize) -> bool {
        let cutoff = self.trie.cutoff;
        let mut in_node = false;
        let mut cur: i64 = level as i64 - 1;
        while !in_node && cur >= cutoff as i64 {
            let c = &mut self.positions[cur as usize];
            in_node = !self.trie.sparse.is_boundary(c.key_pos as usize);
            c.key_pos -= 1;
            cur -= 1;
        }

        if !in_node {
            if cutoff == 0 {
                return false;
            }
            let lvl = cutoff - 1;
            let cached = self.positions[lvl];
            let node = (cached.key_pos >> 8) as usize;
            let kc = (cached.key_pos & 255) as u8;
            if kc == 0 {
                if !cached.is_o && self.trie.dense.is_terminal(node) {
                    self.positions[lvl].key_pos = (node << 8) as i64;
                    self.positions[lvl].is_o = true;
                    return self.next_right_dense(lvl, node << 8);
                }
            } else if let Some(cc) = self.trie.dense.prev_label(node, kc - 1) {
                let pos = (node << 8) + cc as usize;
                self.set_key_pos(lvl, pos as i64);
                return self.next_right_dense(lvl, pos);
            } else if self.trie.dense.is_terminal(node) {
                self.positions[lvl].key_pos = (node << 8) as i64;
                self.positions[lvl].is_o = true;
                return self.next_right_dense(lvl, node << 8);
            }
            match self.prev_node_dense(level, node) {
                None => return false,
                Some(true) => return true,
                Some(false) => {}
            }
        }

        let mut cur = (cur + 1) as usize;
        while cur < level {
            let pos = self.positions[cur].key_pos as usize;
            if !self.trie.sparse.has_child(pos) {
                self.set_v_r(cur, pos);
                return true;
            }
            cur += 1;
        }
        self.next_right(level, self.positions[level].key_pos as usize)
    }

    // ------------------------------------------------------------------
    // Cursor writes. The `_r` variants decrement a warm value cache
    // instead of incrementing it; a cold cache is recomputed from ranks.
    // ------------------------------------------------------------------

    #[inline(always)]
    pub(crate) fn set_key_pos(&mut self, level: usize, pos: i64) {
        self.positions[level].key_pos = pos;
        self.positions[level].is_o = false;
    }

    fn set_v_dense(&mut self, level: usize, node: usize, pos: usize) {
        self.len = level + 1;
        if self.positions[level].val_pos < 0 {
            self.positions[level].val_pos = self.trie.dense.value_pos(node, pos) as i64;
        } else {
            self.positions[level].val_pos += 1;
        }
    }

    fn set_v_dense_r(&mut self, level: usize, node: usize, pos: usize) {
        self.len = level + 1;
        if self.positions[level].val_pos <= 0 {
            self.positions[level].val_pos = self.trie.dense.value_pos(node, pos) as i64;
        } else {
            self.positions[level].val_pos -= 1;
        }
    }

    pub(crate) fn set_kv_dense_o(&mut self, level: usize, node: usize) {
        self.positions[level].key_pos = (node << 8) as i64;
        self.positions[level].is_o = true;
        self.set_v_dense(level, node, node << 8);
    }

    fn set_v(&mut self, level: usize, pos: usize) {
        self.len = level + 1;
        if self.positions[level].val_pos < 0 {
            self.positions[level].val_pos = self.trie.sparse.value_pos(pos) as i64;
        } else {
            self.positions[level].val_pos += 1;
        }
    }

    fn set_v_r(&mut self, level: usize, pos: usize) {
        self.len = level + 1;
        if self.positions[level].val_pos <= 0 {
            self.positions[level].val_pos = self.trie.sparse.value_pos(pos) as i64;
        } else {
            self.positions[level].val_pos -= 1;
        }
    }

    fn set_kv(&mut self, level: usize, pos: usize) {
        self.set_key_pos(level, pos as i64);
        self.set_v(level, pos);
    }

    fn set_kv_r(&mut self, level: usize, pos: usize) {
        self.set_key_pos(level, pos as i64);
        self.set_v_r(level, pos);
    }

    /// Seats the iterator on a dense terminal found by a bound query.
    pub(crate) fn finish_at_dense(&mut self, level: usize, node: usize, pos: usize) {
        self.len = level + 1;
        self.positions[level].val_pos = self.trie.dense.value_pos(node, pos) as i64;
    }

    /// Seats the iterator on a sparse terminal found by a bound query.
    pub(crate) fn finish_at_sparse(&mut self, level: usize, pos: usize) {
        self.len = level + 1;
        self.positions[level].val_pos = self.trie.sparse.value_pos(pos) as i64;
    }
}
