/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use std::hint::black_box;

use criterion::criterion_group;
use criterion::criterion_main;
use criterion::Criterion;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use fstrie::trie::Trie;

const N: u64 = 1_000_000;

fn bench_lookup(c: &mut Criterion) {
    let keys = (0..N).collect::<Vec<_>>();
    let trie = Trie::from_u64(&keys, &keys);
    let mut rng = SmallRng::seed_from_u64(0);

    c.bench_function("lookup", |b| {
        b.iter(|| {
            let key = rng.random_range(0..N);
            black_box(trie.lookup_u64(black_box(key)))
        })
    });
}

fn bench_lower_bound(c: &mut Criterion) {
    let keys = (0..N).map(|k| k * 2).collect::<Vec<_>>();
    let values = (0..N).collect::<Vec<_>>();
    let trie = Trie::from_u64(&keys, &values);
    let mut rng = SmallRng::seed_from_u64(0);

    c.bench_function("lower_bound", |b| {
        b.iter(|| {
            let key = rng.random_range(0..2 * N);
            black_box(trie.lower_bound_u64(black_box(key)).map(|it| it.value()))
        })
    });
}

fn bench_scan(c: &mut Criterion) {
    let keys = (0..N).collect::<Vec<_>>();
    let trie = Trie::from_u64(&keys, &keys);

    c.bench_function("advance", |b| {
        let mut it = trie.lower_bound_u64(0).unwrap();
        b.iter(|| {
            if !it.advance() {
                it = trie.lower_bound_u64(0).unwrap();
            }
            black_box(it.value())
        })
    });
}

criterion_group!(benches, bench_lookup, bench_lower_bound, bench_scan);
criterion_main!(benches);
