//! Benchmark for the hazard sweep.
//!
//! TARGET: one 200-wide layer (about 31,000 cells) inside a 50 ms tick
//!
//! Run with: cargo bench --package caldera_engine --bench hazard_sweep

use caldera_core::WorldService;
use caldera_engine::HazardEngine;
use caldera_world::{MemoryWorld, Terrain};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};

fn arena_world(size: f64) -> MemoryWorld {
    let mut world = MemoryWorld::new(20);
    world.insert_world("arena", Terrain::flat(64));
    world.set_containment_center("arena", 0.5, 0.5);
    world.set_containment_size("arena", size);
    world
}

fn benchmark_full_layer(c: &mut Criterion) {
    let mut group = c.benchmark_group("hazard_layer");
    group.sample_size(20);

    for size in [50.0, 200.0] {
        let radius = size / 2.0;
        let cells = (std::f64::consts::PI * radius * radius) as u64;
        group.throughput(Throughput::Elements(cells));
        group.bench_function(format!("size_{size}"), |b| {
            b.iter_batched(
                || (arena_world(size), HazardEngine::new(10, 1, 256)),
                |(mut world, mut hazard)| black_box(hazard.raise_level(&mut world, "arena")),
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

fn benchmark_budgeted_step(c: &mut Criterion) {
    c.bench_function("hazard_step_64_blocks", |b| {
        b.iter_batched(
            || {
                let world = arena_world(200.0);
                let mut hazard = HazardEngine::new(10, 1, 256);
                hazard.begin_raise("arena", (0.5, 0.5), 100.0);
                (world, hazard)
            },
            |(mut world, mut hazard)| black_box(hazard.step(&mut world, 64)),
            BatchSize::LargeInput,
        );
    });
}

fn benchmark_already_lava(c: &mut Criterion) {
    // Second pass over the same layer: every cell is read, none written
    c.bench_function("hazard_layer_rescan", |b| {
        b.iter_batched(
            || {
                let mut world = arena_world(200.0);
                let mut hazard = HazardEngine::new(10, 1, 256);
                hazard.raise_level(&mut world, "arena");
                (world, HazardEngine::new(10, 1, 256))
            },
            |(mut world, mut hazard)| black_box(hazard.raise_level(&mut world, "arena")),
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(
    benches,
    benchmark_full_layer,
    benchmark_budgeted_step,
    benchmark_already_lava
);
criterion_main!(benches);
