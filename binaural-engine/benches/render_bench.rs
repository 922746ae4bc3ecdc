use binaural_engine::{EngineConfig, NoiseColor, OfflineHost, PlaybackController};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn render_block(c: &mut Criterion) {
    let host = OfflineHost::new(48_000.0);
    let config = EngineConfig { noise_seed: Some(3), ..EngineConfig::default() };
    let mut session = PlaybackController::new(host.clone(), &config);
    session.set_noise_color(NoiseColor::White);
    if session.toggle().is_err() {
        return;
    }

    let mut buf = vec![0.0_f32; 512 * 2];
    c.bench_function("render 512 stereo frames (pair + noise)", |b| {
        b.iter(|| {
            host.render(black_box(&mut buf), 2);
            black_box(buf[0])
        });
    });

    let mut flip = false;
    c.bench_function("render 512 frames while retuning", |b| {
        b.iter(|| {
            flip = !flip;
            session.retune(if flip { 200.0 } else { 300.0 }, 10.0);
            host.render(black_box(&mut buf), 2);
            black_box(buf[0])
        });
    });
}

criterion_group!(benches, render_block);
criterion_main!(benches);
