//! Benchmarks for locomotion runs and outcome analysis.
//!
//! Run with: cargo bench -p sim-locomotion
//!
//! To compare against baseline:
//! 1. First run: cargo bench -p sim-locomotion -- --save-baseline main
//! 2. After changes: cargo bench -p sim-locomotion -- --baseline main

#![allow(missing_docs, clippy::unwrap_used, clippy::cast_precision_loss)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sim_locomotion::{BatchEvaluation, Locomotion, LocomotionConfig, Outcome};
use sim_robot::{build_body, PhaseSin, Robot};
use sim_types::Grid;
use sim_voxel::{Voxel, VoxelConfig};

fn worm(len: usize) -> Robot {
    let body = build_body(&Grid::rectangle(len, 1), |_, _| Voxel::new(VoxelConfig::default())).unwrap();
    let controller = PhaseSin::from_fn(len, 1, 1.0, 1.0, |x, _| x as f64 * 0.8);
    Robot::new(body, Box::new(controller)).unwrap()
}

fn task(final_t: f64) -> Locomotion {
    Locomotion::flat(LocomotionConfig::default().with_final_t(final_t)).unwrap()
}

fn bench_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_1s");
    group.sample_size(10);
    for len in [1, 2, 4, 8] {
        let task = task(1.0);
        let mut robot = worm(len);
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, _| {
            b.iter(|| black_box(task.apply(&mut robot, None).unwrap()));
        });
    }
    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_8x4_1s");
    group.sample_size(10);
    group.bench_function("run_all", |b| {
        b.iter(|| {
            let mut batch = BatchEvaluation::shared(task(1.0), (0..8).map(|_| worm(4)));
            black_box(batch.run_all())
        });
    });
    group.finish();
}

fn bench_analysis(c: &mut Criterion) {
    let outcome: Outcome = task(30.0).apply(&mut worm(4), None).unwrap();
    let mut group = c.benchmark_group("analysis_30s");
    group.bench_function("main_gait", |b| {
        b.iter(|| black_box(outcome.main_gait(0.5, 8)));
    });
    group.bench_function("x_velocity_spectrum", |b| {
        b.iter(|| black_box(outcome.x_velocity_spectrum(20)));
    });
    group.bench_function("footprints", |b| {
        b.iter(|| black_box(outcome.footprints(8)));
    });
    group.finish();
}

criterion_group!(benches, bench_apply, bench_batch, bench_analysis);
criterion_main!(benches);
