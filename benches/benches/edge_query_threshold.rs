// Copyright 2025 the Terrella Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Brute force against index descent for shapes around the bypass threshold.
//!
//! Each iteration gathers candidates for a batch of short query edges and then
//! runs an exact crossing test on every candidate, which is the work a caller
//! would do. The edge count where `indexed` overtakes `brute_force` is the
//! value to use for `max_brute_force_edges`.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use glam::DVec3;
use terrella_index::{EdgeQuery, EdgeQueryOptions, MemoryIndex, Polyline, ShapeId, ShapeIndex};

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f64(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) / ((1u64 << 53) as f64)
    }
    fn next_unit(&mut self) -> DVec3 {
        loop {
            let p = DVec3::new(
                self.next_f64() * 2.0 - 1.0,
                self.next_f64() * 2.0 - 1.0,
                self.next_f64() * 2.0 - 1.0,
            );
            let len2 = p.length_squared();
            if len2 > 0.01 && len2 <= 1.0 {
                return p.normalize();
            }
        }
    }
}

/// A closed loop of `n` edges wobbling around the equator.
fn gen_loop(n: usize) -> Polyline {
    let mut rng = Rng::new(0x5EED_F00D_1234_ABCD);
    let vertices = (0..n)
        .map(|k| {
            let t = std::f64::consts::TAU * k as f64 / n as f64;
            let z = (rng.next_f64() - 0.5) * 0.4;
            DVec3::new(t.cos(), t.sin(), z).normalize()
        })
        .collect();
    Polyline::closed(vertices)
}

fn gen_queries(count: usize, length: f64) -> Vec<(DVec3, DVec3)> {
    let mut rng = Rng::new(0xCAFE_F00D_DEAD_BEEF);
    (0..count)
        .map(|_| {
            let a = rng.next_unit();
            let b = (a + rng.next_unit() * length).normalize();
            (a, b)
        })
        .collect()
}

fn crosses(a: DVec3, b: DVec3, c: DVec3, d: DVec3) -> bool {
    let ab = a.cross(b);
    let acb = -ab.dot(c);
    let bda = ab.dot(d);
    if acb * bda <= 0.0 {
        return false;
    }
    let cd = c.cross(d);
    acb * -cd.dot(b) > 0.0 && acb * cd.dot(a) > 0.0
}

fn run(index: &MemoryIndex, options: EdgeQueryOptions, queries: &[(DVec3, DVec3)]) -> usize {
    let shape = index.shape(ShapeId::new(0)).expect("one shape");
    let mut query = EdgeQuery::with_options(index, options);
    let mut edges = Vec::new();
    let mut hits = 0;
    for &(a, b) in queries {
        query.candidates_for_shape(a, b, shape, &mut edges);
        for &e in &edges {
            let (c, d) = shape.edge(e);
            hits += usize::from(crosses(a, b, c, d));
        }
    }
    hits
}

fn bench_threshold(c: &mut Criterion) {
    let queries = gen_queries(256, 0.05);
    let mut group = c.benchmark_group("threshold");
    group.throughput(Throughput::Elements(queries.len() as u64));
    for &n in &[8usize, 16, 24, 27, 32, 48, 64, 128] {
        let index = MemoryIndex::new(vec![gen_loop(n)]);
        group.bench_with_input(BenchmarkId::new("brute_force", n), &index, |b, index| {
            let options = EdgeQueryOptions {
                max_brute_force_edges: usize::MAX,
            };
            b.iter(|| black_box(run(index, options, &queries)));
        });
        group.bench_with_input(BenchmarkId::new("indexed", n), &index, |b, index| {
            let options = EdgeQueryOptions {
                max_brute_force_edges: 0,
            };
            b.iter(|| black_box(run(index, options, &queries)));
        });
    }
    group.finish();
}

fn bench_query_length(c: &mut Criterion) {
    let index = MemoryIndex::new(vec![gen_loop(1024)]);
    let mut group = c.benchmark_group("query_length");
    for &length in &[0.001_f64, 0.01, 0.1, 1.0] {
        let queries = gen_queries(256, length);
        group.throughput(Throughput::Elements(queries.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(length),
            &queries,
            |b, queries| {
                b.iter(|| black_box(run(&index, EdgeQueryOptions::default(), queries)));
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_threshold, bench_query_length);
criterion_main!(benches);
