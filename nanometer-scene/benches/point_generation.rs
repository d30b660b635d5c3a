//! Benchmark scene point generation.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use nanometer_io::{Color, PointProvider};
use nanometer_scene::geometry::make_cube;
use nanometer_scene::scenes::{self, SceneKind, cube, sphere};

fn bench_frames(c: &mut Criterion) {
    let cube_scene = cube::scene();
    c.bench_function("cube_frame", |b| {
        b.iter(|| black_box(cube_scene.points(Some(cube::BLANKING)).count()))
    });

    let sphere_scene = sphere::scene();
    c.bench_function("sphere_frame", |b| {
        b.iter(|| black_box(sphere_scene.points(Some(sphere::BLANKING)).count()))
    });
}

fn bench_cube_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("cube_points_per_line");
    for ppl in [10u32, 50, 200] {
        let wireframe = make_cube(ppl, Color::GREEN, true);
        group.bench_with_input(BenchmarkId::from_parameter(ppl), &wireframe, |b, shape| {
            b.iter(|| black_box(shape.points(Some(cube::BLANKING)).count()))
        });
    }
    group.finish();
}

fn bench_provider_requests(c: &mut Criterion) {
    let mut group = c.benchmark_group("provider_get_points");
    for kind in [SceneKind::Cube, SceneKind::Sphere, SceneKind::Sine] {
        let mut provider = match scenes::build(kind, None) {
            Ok(provider) => provider,
            Err(e) => panic!("failed to build {} scene: {}", kind.name(), e),
        };
        group.bench_function(kind.name(), |b| {
            b.iter(|| black_box(provider.get_points(1000).map(|p| p.len())))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_frames,
    bench_cube_resolution,
    bench_provider_requests
);
criterion_main!(benches);
