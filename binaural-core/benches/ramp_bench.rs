use binaural_core::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn ramp_block(c: &mut Criterion) {
    c.bench_function("ramp 512 samples", |b| {
        let mut r = Ramp::new(200.0);
        b.iter(|| {
            r.set_target(black_box(240.0), 0.1, 48_000.0);
            let mut acc = 0.0;
            for _ in 0..512 {
                acc += r.next();
            }
            black_box(acc)
        });
    });
}

fn sine_block(c: &mut Criterion) {
    c.bench_function("sine01 512 samples", |b| {
        b.iter(|| {
            let mut phase = 0.0_f32;
            let mut acc = 0.0;
            for _ in 0..512 {
                phase = wrap_phase01(phase + 200.0 / 48_000.0);
                acc += sine01(phase);
            }
            black_box(acc)
        });
    });
}

criterion_group!(benches, ramp_block, sine_block);
criterion_main!(benches);
