//! Control-loop micro-benchmarks.
//!
//! Measures throughput of the per-tick math the drivetrain runs:
//! - speed loop compute alone
//! - heading loop compute alone (includes shortest-path normalization)
//! - arcade mix alone
//!
//! At a 20 ms tick the budget is generous; these exist to catch an
//! accidental regression (allocation, transcendental creep) in the hot
//! path, not to shave nanoseconds.

use criterion::{Criterion, criterion_group, criterion_main};

use tiller_control::mixer::DriveMixer;
use tiller_control::pid::{HeadingLoop, LoopGains, SpeedLoop};

fn bench_speed_loop(c: &mut Criterion) {
    let mut pid = SpeedLoop::new(LoopGains::new(0.4, 0.02));
    pid.enable();
    pid.set_setpoint(0.8);
    let mut cycle = 0u64;

    c.bench_function("speed_loop_calculate", |b| {
        b.iter(|| {
            cycle += 1;
            let t = cycle as f64 * 0.02;
            let rate = 0.8 + 0.1 * t.sin(); // wheel hunting around setpoint
            pid.calculate(rate)
        });
    });
}

fn bench_heading_loop(c: &mut Criterion) {
    let mut pid = HeadingLoop::new(LoopGains::new(0.015, 0.001));
    pid.enable();
    pid.set_setpoint(270.0);
    let mut cycle = 0u64;

    c.bench_function("heading_loop_calculate", |b| {
        b.iter(|| {
            cycle += 1;
            let t = cycle as f64 * 0.02;
            let angle = 265.0 + 10.0 * t.sin(); // oscillating around setpoint
            pid.calculate(angle)
        });
    });
}

fn bench_arcade_mix(c: &mut Criterion) {
    let mixer = DriveMixer::default();
    let mut cycle = 0u64;

    c.bench_function("arcade_mix", |b| {
        b.iter(|| {
            cycle += 1;
            let t = cycle as f64 * 0.02;
            let speed = 0.9 * t.sin();
            let rotation = 0.4 * t.cos();
            mixer.arcade(speed, rotation)
        });
    });
}

criterion_group!(benches, bench_speed_loop, bench_heading_loop, bench_arcade_mix);
criterion_main!(benches);
