//! Gait pipeline micro-benchmark.
//!
//! Measures the stages of one tick:
//! - single waveform evaluation
//! - phase + trajectory for all four legs
//! - full tick (limiter, mapper, simulated bus writes, report)

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use quad_common::config::RobotConfig;
use quad_common::gait::{GaitTable, Waveform};
use quad_common::types::{GaitMode, Leg};
use quad_gait::phase::PhaseEngine;
use quad_gait::trajectory::{JointAngles, creep, evaluate, trot};
use quad_gait::{GaitEngine, RunParams};
use quad_hal::DriverRegistry;

const DT: f64 = 0.05; // 20 Hz

fn bench_waveforms(c: &mut Criterion) {
    let mut step = 0u64;
    c.bench_function("creep_waveform", |b| {
        b.iter(|| {
            step += 1;
            let phase = (step as f64 * DT / 2.0) % 1.0;
            creep(black_box(30.0), 15.0, 85.0, 90.0, phase)
        });
    });

    let mut step = 0u64;
    c.bench_function("trot_waveform", |b| {
        b.iter(|| {
            step += 1;
            let phase = (step as f64 * DT) % 1.0;
            trot(black_box(30.0), 15.0, 105.0, 90.0, phase)
        });
    });
}

fn bench_all_legs(c: &mut Criterion) {
    let table = GaitTable::builtin();
    let params = *table.get(GaitMode::CreepForward);
    let phase = PhaseEngine::new(2.0).unwrap();
    let mut step = 0u64;

    c.bench_function("four_leg_trajectory", |b| {
        b.iter(|| {
            step += 1;
            let t = step as f64 * DT;
            let phases = phase.leg_phases(t, &params.phase_offset);
            let legs: [JointAngles; 4] = Leg::ALL
                .map(|leg| evaluate(Waveform::Creep, &params.leg(leg), phases[leg.index()]));
            black_box(legs)
        });
    });
}

fn bench_full_tick(c: &mut Criterion) {
    let mut config = RobotConfig::default();
    config.timing.settle_time = 0.0;
    config.timing.diagnostic_stride = u32::MAX;

    let driver = DriverRegistry::with_builtin()
        .unwrap()
        .open(&config.bus)
        .unwrap();
    let mut engine = GaitEngine::new(&config, driver).unwrap();
    engine.initialize().unwrap();
    let mut run = engine
        .start(GaitMode::TrotForward, RunParams::default())
        .unwrap();

    c.bench_function("gait_tick", |b| {
        b.iter(|| black_box(run.tick()));
    });
}

criterion_group!(benches, bench_waveforms, bench_all_legs, bench_full_tick);
criterion_main!(benches);
