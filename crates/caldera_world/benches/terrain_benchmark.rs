//! Benchmark for terrain queries.
//!
//! Provisioning samples nine columns per candidate and the hazard sweep reads
//! one cell per column per layer, so both sit on these paths.
//!
//! Run with: cargo bench --package caldera_world --bench terrain_benchmark

use caldera_core::{BlockPos, WorldService};
use caldera_world::{MemoryWorld, SimplexNoise, Terrain, WorldSeed};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

fn benchmark_noise_sample(c: &mut Criterion) {
    let noise = SimplexNoise::new(WorldSeed::new(42));

    c.bench_function("noise_sample", |b| {
        let mut x = 0.0f64;
        b.iter(|| {
            x += 0.1;
            black_box(noise.sample(black_box(x), black_box(x * 0.7)))
        });
    });

    c.bench_function("noise_fractal_4_octaves", |b| {
        let mut x = 0.0f64;
        b.iter(|| {
            x += 0.1;
            black_box(noise.fractal(black_box(x), black_box(x * 0.7), 4))
        });
    });
}

fn benchmark_surface_heights(c: &mut Criterion) {
    let terrain = Terrain::rolling(42);

    let mut group = c.benchmark_group("surface_heights");
    // One 200x200 arena footprint
    group.throughput(Throughput::Elements(200 * 200));
    group.bench_function("rolling_200x200", |b| {
        b.iter(|| {
            for x in -100..100 {
                for z in -100..100 {
                    black_box(terrain.surface_height(x, z));
                }
            }
        });
    });
    group.finish();
}

fn benchmark_cell_reads(c: &mut Criterion) {
    let mut world = MemoryWorld::new(20);
    world.insert_world("arena", Terrain::rolling(42));
    for x in 0..64 {
        world
            .set_cell("arena", BlockPos::new(x, 70, 0), caldera_core::Material::Lava)
            .ok();
    }

    let mut group = c.benchmark_group("cell_reads");
    group.throughput(Throughput::Elements(64 * 64));
    group.bench_function("layer_64x64", |b| {
        b.iter(|| {
            for x in 0..64 {
                for z in 0..64 {
                    black_box(world.read_cell("arena", BlockPos::new(x, 70, z)).ok());
                }
            }
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    benchmark_noise_sample,
    benchmark_surface_heights,
    benchmark_cell_reads
);
criterion_main!(benches);
