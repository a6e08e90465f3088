/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use rand::rngs::SmallRng;
use rand::Rng;
use rand::SeedableRng;

use fstrie::prelude::*;

/// All strings of the given lengths over `a..=h`, in sorted order, with
/// their ordinal as value. Lengths 1 and 2 are proper prefixes of length 4,
/// so the set exercises terminators and node-terminal bits.
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

fn init_logger() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Info)
        .try_init();
}

#[test]
fn test_prefix_truncation() {
    init_logger();
    let keys = [&b"apple"[..], b"application", b"banana"];
    let t = Trie::from_sorted(&keys, &[1, 2, 3]);
    assert_eq!(t.len(), 3);
    assert_eq!(t.height(), 11);

    assert_eq!(t.lookup(b"apple"), Some(1));
    assert_eq!(t.lookup(b"application"), Some(2));
    assert_eq!(t.lookup(b"banana"), Some(3));
    // answers are one-sided: a query extending a stored prefix hits it
    assert_eq!(t.lookup(b"applique"), Some(2));
    // misses diverge inside the stored prefixes
    assert_eq!(t.lookup(b"appx"), None);
    assert_eq!(t.lookup(b"app"), None);
    assert_eq!(t.lookup(b"grape"), None);
    assert_eq!(t.lookup(b""), None);

    let mut it = t.lower_bound(b"app").unwrap();
    assert_eq!(it.value(), 1);
    assert!(it.advance());
    assert_eq!(it.value(), 2);
    assert!(it.advance());
    assert_eq!(it.value(), 3);
    assert!(!it.advance());
    assert!(it.at_end());
    assert_eq!(it.value(), 3);

    assert_eq!(t.lower_bound(b"").unwrap().value(), 1);
    assert_eq!(t.lower_bound(b"b").unwrap().value(), 3);
    assert!(t.lower_bound(b"c").is_none());

    assert_eq!(t.upper_bound(b"az").unwrap().value(), 2);
    assert_eq!(t.upper_bound(b"zebra").unwrap().value(), 3);
    assert!(t.upper_bound(b"aardvark").is_none());
    assert!(t.upper_bound(b"").is_none());
}

#[test]
fn test_sequential_u64() {
    init_logger();
    let keys = (0..200_000_u64).collect::<Vec<_>>();
    let t = Trie::from_u64(&keys, &keys);
    assert_eq!(t.len(), 200_000);
    // integer keys are eight levels deep and split into both layers
    assert!(t.cutoff() > 0 && t.cutoff() < t.height());

    for key in [0, 1, 255, 256, 65_535, 65_536, 100_000, 199_999] {
        assert_eq!(t.lookup_u64(key), Some(key));
    }
    assert_eq!(t.lookup_u64(200_000), None);
    assert_eq!(t.lookup_u64(u64::MAX), None);

    let mut it = t.upper_bound_u64(150_000).unwrap();
    assert_eq!(it.value(), 150_000);
    assert_eq!(it.key_u64(), 150_000);
    for expected in (149_990..150_000).rev() {
        assert!(it.retreat());
        assert_eq!(it.value(), expected);
        assert_eq!(it.key_u64(), expected);
    }

    let mut it = t.lower_bound_u64(99_998).unwrap();
    assert_eq!(it.value(), 99_998);
    for expected in 99_999..100_010 {
        assert!(it.advance());
        assert_eq!(it.value(), expected);
        assert_eq!(it.key_u64(), expected);
    }

    // bound queries between stored keys land on the neighbors
    assert_eq!(t.lower_bound_u64(200_000_000).map(|i| i.value()), None);
    assert_eq!(t.upper_bound_u64(u64::MAX).unwrap().value(), 199_999);
    assert_eq!(t.lower_bound_u64(0).unwrap().value(), 0);
}

#[test]
fn test_mixed_lengths_lookup() {
    init_logger();
    let keys = mixed_length_keys();
    let values = (0..keys.len() as u64).collect::<Vec<_>>();
    let t = Trie::from_sorted(&keys, &values);
    assert_eq!(t.len(), keys.len());
    // the two top levels hold few nodes and go dense
    assert_eq!(t.cutoff(), 2);

    for (k, key) in keys.iter().enumerate() {
        assert_eq!(t.lookup(key), Some(k as u64), "key {:?}", key);
    }
    // absent lengths miss on the terminator check
    assert_eq!(t.lookup(b"abc"), None);
    assert_eq!(t.lookup(b"ab!"), None);
    assert_eq!(t.lookup(b"i"), None);
    assert_eq!(t.lookup(b""), None);
}

#[test]
fn test_mixed_lengths_bounds_oracle() {
    init_logger();
    let keys = mixed_length_keys();
    let values = (0..keys.len() as u64).collect::<Vec<_>>();
    let t = Trie::from_sorted(&keys, &values);

    let mut rng = SmallRng::seed_from_u64(3);
    // every key in this set is stored in full, so plain byte comparison
    // against the input keys is an exact oracle
    for _ in 0..2000 {
        let len = rng.random_range(0..=5);
        let query = (0..len)
            .map(|_| rng.random_range(b'`'..=b'j'))
            .collect::<Vec<_>>();

        let lower = keys.partition_point(|k| k[..] < query[..]);
        match t.lower_bound(&query) {
            Some(it) => {
                assert_eq!(it.key(), keys[lower], "lower bound of {:?}", query);
                assert_eq!(it.value(), lower as u64);
            }
            None => assert_eq!(lower, keys.len(), "lower bound of {:?}", query),
        }

        let upper = keys.partition_point(|k| k[..] <= query[..]);
        match t.upper_bound(&query) {
            Some(it) => {
                assert_eq!(it.key(), keys[upper - 1], "upper bound of {:?}", query);
                assert_eq!(it.value(), (upper - 1) as u64);
            }
            None => assert_eq!(upper, 0, "upper bound of {:?}", query),
        }
    }
}

#[test]
fn test_duplicates_first_wins() {
    let keys = [&b"ab"[..], b"ab", b"ab", b"b"];
    let t = Trie::from_sorted(&keys, &[1, 2, 3, 9]);
    assert_eq!(t.len(), 2);
    assert_eq!(t.lookup(b"ab"), Some(1));
    assert_eq!(t.lookup(b"b"), Some(9));
    let mut it = t.lower_bound(b"").unwrap();
    assert_eq!(it.value(), 1);
    assert!(it.advance());
    assert_eq!(it.value(), 9);
    assert!(!it.advance());
}

#[test]
fn test_empty_key() {
    let keys = [&b""[..], b"a", b"b"];
    let t = Trie::from_sorted(&keys, &[10, 11, 12]);
    assert_eq!(t.len(), 3);
    assert_eq!(t.lookup(b""), Some(10));
    assert_eq!(t.lookup(b"a"), Some(11));

    assert_eq!(t.lower_bound(b"").unwrap().value(), 10);
    assert_eq!(t.upper_bound(b"").unwrap().value(), 10);
    assert_eq!(t.upper_bound(b"x").unwrap().value(), 12);

    let mut it = t.lower_bound(b"a").unwrap();
    assert_eq!(it.value(), 11);
    assert!(it.retreat());
    assert_eq!(it.value(), 10);
    assert_eq!(it.key(), b"");
    assert!(!it.retreat());
    assert!(it.at_begin());
}

#[test]
fn test_single_key() {
    let t = Trie::from_sorted(&[&b"only"[..]], &[7]);
    assert_eq!(t.len(), 1);
    assert_eq!(t.lookup(b"only"), Some(7));
    assert_eq!(t.lookup(b"x"), None);
    // the single key is truncated to its first byte
    assert_eq!(t.lower_bound(b"").unwrap().key(), b"o");
    assert!(t.lower_bound(b"p").is_none());
    assert!(t.upper_bound(b"n").is_none());
    assert_eq!(t.upper_bound(b"z").unwrap().value(), 7);
}

#[test]
fn test_empty_trie() {
    let keys: [&[u8]; 0] = [];
    let t = Trie::from_sorted(&keys, &[]);
    assert!(t.is_empty());
    assert_eq!(t.lookup(b"x"), None);
    assert_eq!(t.lookup(b""), None);
    assert!(t.lower_bound(b"").is_none());
    assert!(t.upper_bound(b"x").is_none());
}

#[test]
fn test_memory_bytes() {
    init_logger();
    let keys = (0..10_000_u64).collect::<Vec<_>>();
    let a = Trie::from_u64(&keys, &keys);
    let b = Trie::from_u64(&keys, &keys);
    assert!(a.memory_bytes() > 0);
    assert_eq!(a.memory_bytes(), b.memory_bytes());
}
