use assoc_maps::{AssociativeMap, ChainedHashMap, TreeMap};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::time::Duration;

const SIZES: [usize; 2] = [1_000, 10_000];

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> i32 {
    (n >> 33) as i32
}

fn filled<M>(make: fn() -> M, seed: u64, n: usize) -> M
where
    M: AssociativeMap<Key = i32, Value = String>,
{
    let mut m = make();
    for x in lcg(seed).take(n) {
        *m.get_or_insert(key(x)) = "testString".to_string();
    }
    m
}

fn bench_append<M>(c: &mut Criterion, engine: &str, make: fn() -> M)
where
    M: AssociativeMap<Key = i32, Value = String>,
{
    for n in SIZES {
        c.bench_function(&format!("{engine}::append_{n}"), |b| {
            b.iter_batched(
                make,
                |mut m| {
                    for x in lcg(1).take(n) {
                        *m.get_or_insert(key(x)) = "testString".to_string();
                    }
                    black_box(m)
                },
                BatchSize::SmallInput,
            )
        });
    }
}

fn bench_find<M>(c: &mut Criterion, engine: &str, make: fn() -> M)
where
    M: AssociativeMap<Key = i32, Value = String>,
{
    for n in SIZES {
        c.bench_function(&format!("{engine}::find_hit_{n}"), |b| {
            let m = filled(make, 7, n);
            let queries: Vec<i32> = lcg(7).take(n).map(key).collect();
            b.iter(|| {
                for k in &queries {
                    black_box(m.find(k).value().ok());
                }
            })
        });
    }
}

fn bench_iterate<M>(c: &mut Criterion, engine: &str, make: fn() -> M)
where
    M: AssociativeMap<Key = i32, Value = String>,
{
    for n in SIZES {
        c.bench_function(&format!("{engine}::cursor_walk_{n}"), |b| {
            let m = filled(make, 999, n);
            b.iter(|| {
                let mut total = 0usize;
                let mut cur = m.cursor_front();
                while let Ok(v) = cur.value() {
                    total += v.len();
                    let _ = cur.move_next();
                }
                black_box(total)
            })
        });
    }
}

fn hash_map() -> ChainedHashMap<i32, String> {
    ChainedHashMap::new()
}

fn tree_map() -> TreeMap<i32, String> {
    TreeMap::new()
}

fn bench_append_all(c: &mut Criterion) {
    bench_append(c, "hash", hash_map);
    bench_append(c, "tree", tree_map);
}

fn bench_find_all(c: &mut Criterion) {
    bench_find(c, "hash", hash_map);
    bench_find(c, "tree", tree_map);
}

fn bench_iterate_all(c: &mut Criterion) {
    bench_iterate(c, "hash", hash_map);
    bench_iterate(c, "tree", tree_map);
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(12)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches_append;
    config = bench_config();
    targets = bench_append_all
}

criterion_group! {
    name = benches_lookup;
    config = bench_config();
    targets = bench_find_all, bench_iterate_all
}

criterion_main!(benches_append, benches_lookup);
