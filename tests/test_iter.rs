/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use fstrie::prelude::*;

fn mixed_length_keys() -> Vec<Vec<u8>> {
    let mut keys = Vec::new();
    for len in [1_usize, 2, 4] {
        let mut idx = vec![0_u8; len];
        loop {
            keys.push(idx.iter().map(|&i| b'a' + i).collect::<Vec<_>>());
            let mut l = len;
            loop {
                if l == 0 {
                    break;
                }
                l -= 1;
                idx[l] += 1;
                if idx[l] < 8 {
                    break;
                }
                idx[l] = 0;
            }
            if idx.iter().all(|&i| i == 0) {
                break;
            }
        }
    }
    keys.sort();
    keys
}

#[test]
fn test_forward_scan_strings() {
    let keys = mixed_length_keys();
    let values = (0..keys.len() as u64).collect::<Vec<_>>();
    let t = Trie::from_sorted(&keys, &values);

    let mut it = t.lower_bound(b"").unwrap();
    for (k, key) in keys.iter().enumerate() {
        assert_eq!(it.key(), *key, "entry {}", k);
        assert_eq!(it.value(), k as u64);
        assert_eq!(it.advance(), k + 1 < keys.len());
    }
    assert!(it.at_end());
    assert_eq!(it.value(), (keys.len() - 1) as u64);
}

#[test]
fn test_backward_scan_strings() {
    let keys = mixed_length_keys();
    let values = (0..keys.len() as u64).collect::<Vec<_>>();
    let t = Trie::from_sorted(&keys, &values);

    let mut it = t.upper_bound(b"zzzz").unwrap();
    for (k, key) in keys.iter().enumerate().rev() {
        assert_eq!(it.key(), *key, "entry {}", k);
        assert_eq!(it.value(), k as u64);
        assert_eq!(it.retreat(), k > 0);
    }
    assert!(it.at_begin());
    assert_eq!(it.value(), 0);
}

#[test]
fn test_scan_u64() {
    let n = 50_000_u64;
    let keys = (0..n).collect::<Vec<_>>();
    let t = Trie::from_u64(&keys, &keys);

    let mut it = t.lower_bound_u64(0).unwrap();
    for k in 0..n {
        assert_eq!(it.key_u64(), k);
        assert_eq!(it.value(), k);
        assert_eq!(it.advance(), k + 1 < n);
    }
    assert!(it.at_end());

    let mut it = t.upper_bound_u64(u64::MAX).unwrap();
    for k in (0..n).rev() {
        assert_eq!(it.key_u64(), k);
        assert_eq!(it.value(), k);
        assert_eq!(it.retreat(), k > 0);
    }
    assert!(it.at_begin());
}

#[test]
fn test_end_latch_then_retreat() {
    let keys = (0..1000_u64).collect::<Vec<_>>();
    let t = Trie::from_u64(&keys, &keys);

    let mut it = t.upper_bound_u64(999).unwrap();
    assert_eq!(it.value(), 999);
    assert!(!it.advance());
    assert!(it.at_end());
    assert!(!it.advance());
    // the latched iterator still sits on the last entry
    assert_eq!(it.value(), 999);

    // stepping back clears the latch
    assert!(it.retreat());
    assert!(!it.at_end());
    assert_eq!(it.value(), 998);
    assert!(it.advance());
    assert_eq!(it.value(), 999);
    assert!(!it.advance());
    assert!(it.at_end());
}

#[test]
fn test_begin_latch_then_advance() {
    let keys = (0..1000_u64).collect::<Vec<_>>();
    let t = Trie::from_u64(&keys, &keys);

    let mut it = t.lower_bound_u64(0).unwrap();
    assert!(!it.retreat());
    assert!(it.at_begin());
    assert!(!it.retreat());
    assert_eq!(it.value(), 0);

    assert!(it.advance());
    assert!(!it.at_begin());
    assert_eq!(it.value(), 1);
    assert!(it.retreat());
    assert_eq!(it.value(), 0);
    assert!(!it.retreat());
    assert!(it.at_begin());
}

#[test]
fn test_reverse_direction_small() {
    let keys = [&b"a"[..], b"b", b"ca", b"cb"];
    let t = Trie::from_sorted(&keys, &[10, 20, 30, 40]);

    // a retreat right after an advance must not reuse the forward caches
    let mut it = t.lower_bound(b"b").unwrap();
    assert_eq!(it.value(), 20);
    assert!(it.advance());
    assert_eq!(it.value(), 30);
    assert!(it.retreat());
    assert_eq!(it.value(), 20);
    assert_eq!(it.key(), b"b");

    // and an advance right after a retreat must rebuild the descent path
    let mut it = t.lower_bound(b"ca").unwrap();
    assert_eq!(it.value(), 30);
    assert!(it.retreat());
    assert_eq!(it.value(), 20);
    assert!(it.advance());
    assert_eq!(it.value(), 30);
    assert!(it.advance());
    assert_eq!(it.value(), 40);
    assert!(!it.advance());
    assert!(it.at_end());
}

#[test]
fn test_advance_after_upper_bound_miss() {
    // the failed descent leaves backward-shifted positions behind; a forward
    // step must not descend through them
    let t = Trie::from_sorted(&[&b"a"[..], b"bc"], &[10, 20]);
    let mut it = t.upper_bound(b"bb").unwrap();
    assert_eq!(it.value(), 10);
    assert!(it.advance());
    assert_eq!(it.value(), 20);
    assert!(!it.advance());
}

#[test]
fn test_ping_pong() {
    let keys = mixed_length_keys();
    let values = (0..keys.len() as u64).collect::<Vec<_>>();
    let t = Trie::from_sorted(&keys, &values);

    // alternate directions around a node boundary in the middle
    let mut it = t.lower_bound(b"dh").unwrap();
    let at = keys.iter().position(|k| k[..] == b"dh"[..]).unwrap() as u64;
    assert_eq!(it.value(), at);
    for _ in 0..5 {
        assert!(it.advance());
        assert_eq!(it.value(), at + 1);
        assert!(it.retreat());
        assert_eq!(it.value(), at);
    }
    for _ in 0..5 {
        assert!(it.retreat());
        assert_eq!(it.value(), at - 1);
        assert!(it.advance());
        assert_eq!(it.value(), at);
    }
}
