// Raw probe table costs without key hashing or comparison overhead.
// Requires the `bench_internal` feature.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use probing_collections::raw::ProbeTable;
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn insert(t: &mut ProbeTable<u64>, x: u64) {
    if t.is_full() {
        t.grow(|_, _| {}).unwrap();
    }
    t.insert_unique(x, x, |_, _| {});
}

fn filled(seed: u64, n: usize, load: f64) -> ProbeTable<u64> {
    let mut t = ProbeTable::new(53, load).unwrap();
    for x in lcg(seed).take(n) {
        insert(&mut t, x);
    }
    t
}

fn bench_insert_by_load(c: &mut Criterion) {
    for load in [0.5, 0.75, 0.9] {
        c.bench_function(&format!("raw::insert_100k_load_{}", load), |b| {
            b.iter_batched(
                || ProbeTable::<u64>::new(53, load).unwrap(),
                |mut t| {
                    for x in lcg(1).take(100_000) {
                        insert(&mut t, x);
                    }
                    black_box(t)
                },
                BatchSize::SmallInput,
            )
        });
    }
}

fn bench_find_by_load(c: &mut Criterion) {
    for load in [0.5, 0.9] {
        c.bench_function(&format!("raw::find_miss_10k_load_{}", load), |b| {
            let t = filled(7, 100_000, load);
            let mut miss = lcg(0xdead_beef);
            b.iter(|| {
                for _ in 0..10_000 {
                    let h = miss.next().unwrap();
                    black_box(t.find(h, |x| *x == h));
                }
            })
        });
    }
}

fn bench_tombstone_churn(c: &mut Criterion) {
    c.bench_function("raw::churn_10k_on_50k", |b| {
        b.iter_batched(
            || {
                let t = filled(11, 50_000, 0.75);
                let live: Vec<u64> = lcg(11).take(10_000).collect();
                (t, live)
            },
            |(mut t, live)| {
                for (old, new) in live.into_iter().zip(lcg(13)) {
                    if let Some(i) = t.find(old, |x| *x == old) {
                        t.take(i);
                    }
                    insert(&mut t, new);
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(12)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches;
    config = bench_config();
    targets = bench_insert_by_load, bench_find_by_load, bench_tombstone_churn
}
criterion_main!(benches);
