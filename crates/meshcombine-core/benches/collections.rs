//! Benchmarks for the hashed and insertion-ordered collections

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use meshcombine_core::alloc::{HashMap, index_map};
use std::collections::HashMap as StdHashMap;

fn bench_map_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_insert");

    for size in [10, 100, 1000, 10000] {
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("std", size), &size, |b, &size| {
            b.iter(|| {
                let mut map = StdHashMap::new();
                for i in 0..size {
                    map.insert(black_box(i as u64), black_box(i));
                }
                map
            });
        });

        group.bench_with_input(BenchmarkId::new("ahash", size), &size, |b, &size| {
            b.iter(|| {
                let mut map = HashMap::new();
                for i in 0..size {
                    map.insert(black_box(i as u64), black_box(i));
                }
                map
            });
        });

        group.bench_with_input(BenchmarkId::new("index_map", size), &size, |b, &size| {
            b.iter(|| {
                let mut map = index_map();
                for i in 0..size {
                    map.insert(black_box(i as u64), black_box(i));
                }
                map
            });
        });
    }

    group.finish();
}

fn bench_map_entry(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_entry_or_insert");

    // Few distinct keys, many hits: the shape of bucketing renderables by material.
    for size in [1000, 10000] {
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("index_map", size), &size, |b, &size| {
            b.iter(|| {
                let mut map = index_map::<u64, u32>();
                for i in 0..size {
                    *map.entry(black_box(i as u64 % 16)).or_insert(0) += 1;
                }
                map
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_map_insert, bench_map_entry);
criterion_main!(benches);
