use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use hash_bimap::HashBiMap;
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

fn filled(seed: u64, n: usize) -> (HashBiMap<String, u64>, Vec<String>) {
    let mut m = HashBiMap::new();
    let keys: Vec<_> = lcg(seed).take(n).map(key).collect();
    for (i, k) in keys.iter().enumerate() {
        m.insert(k.clone(), i as u64);
    }
    (m, keys)
}

fn bench_insert(c: &mut Criterion) {
    c.bench_function("hash_bimap_insert_10k", |b| {
        b.iter_batched(
            HashBiMap::<String, u64>::new,
            |mut m| {
                for (i, x) in lcg(1).take(10_000).enumerate() {
                    m.insert(key(x), i as u64);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_get_hit(c: &mut Criterion) {
    c.bench_function("hash_bimap_get_hit", |b| {
        let (m, keys) = filled(7, 20_000);
        let mut it = keys.iter().cycle();
        b.iter(|| {
            let k = it.next().unwrap();
            black_box(m.get(k));
        })
    });
}

fn bench_get_by_value_hit(c: &mut Criterion) {
    c.bench_function("hash_bimap_get_by_value_hit", |b| {
        let (m, _) = filled(9, 20_000);
        let mut i = 0u64;
        b.iter(|| {
            i = (i + 1) % 20_000;
            black_box(m.get_by_value(&i));
        })
    });
}

fn bench_get_miss(c: &mut Criterion) {
    c.bench_function("hash_bimap_get_miss", |b| {
        let (m, _) = filled(11, 10_000);
        let mut miss = lcg(0xdead_beef);
        b.iter(|| {
            // generate keys unlikely in map
            let k = key(miss.next().unwrap());
            black_box(m.get(&k));
        })
    });
}

fn bench_evicting_insert(c: &mut Criterion) {
    c.bench_function("hash_bimap_evicting_insert", |b| {
        let (mut m, keys) = filled(13, 10_000);
        let mut it = lcg(17);
        b.iter(|| {
            // Rebinds a live key to a live value, evicting its owner.
            let x = it.next().unwrap();
            let k = keys[(x % keys.len() as u64) as usize].clone();
            black_box(m.insert(k, (x >> 32) % 10_000));
        })
    });
}

fn bench_iterate(c: &mut Criterion) {
    c.bench_function("hash_bimap_iterate_10k", |b| {
        let (m, _) = filled(19, 10_000);
        b.iter(|| {
            let mut sum = 0u64;
            for (_, v) in m.iter() {
                sum = sum.wrapping_add(*v);
            }
            black_box(sum)
        })
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(50)
        .measurement_time(Duration::from_secs(8))
        .warm_up_time(Duration::from_secs(2))
}

criterion_group! {
    name = benches;
    config = bench_config();
    targets = bench_insert, bench_get_hit, bench_get_by_value_hit, bench_get_miss,
        bench_evicting_insert, bench_iterate
}
criterion_main!(benches);
