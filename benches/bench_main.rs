use std::hint::black_box;

use bevy_symbios_plasma::engine::{ManualClock, PlasmaEngine};
use bevy_symbios_plasma::fractal::{FractalField, FractalNoiseParams};
use bevy_symbios_plasma::noise::NoiseGenerator;
use bevy_symbios_plasma::options::PlasmaOptions;
use bevy_symbios_plasma::palette::{default_stops, render_palette};
use criterion::{Criterion, criterion_group, criterion_main};

fn bench_field(c: &mut Criterion) {
    let params = FractalNoiseParams::default();
    let generator = NoiseGenerator::new(1, params.octaves);
    let mut field = FractalField::new(512, 512, 512).unwrap();
    c.bench_function("field_512", |b| {
        b.iter(|| field.regenerate(black_box(&params), &generator, None))
    });
}

fn bench_palette(c: &mut Criterion) {
    let stops = default_stops();
    c.bench_function("palette_4096", |b| {
        b.iter(|| render_palette(black_box(4096), &stops))
    });
}

fn bench_frame(c: &mut Criterion) {
    let mut engine = PlasmaEngine::with_clock(
        PlasmaOptions::default(),
        512,
        512,
        ManualClock::new(0.0, 1.0 / 60.0),
    )
    .unwrap();
    let mut target = vec![0u8; 512 * 512 * 4];
    // Bake the field outside the measured loop.
    engine.render_frame(&mut target).unwrap();
    c.bench_function("frame_512", |b| {
        b.iter(|| engine.render_frame(black_box(&mut target)))
    });
}

criterion_group!(benches, bench_field, bench_palette, bench_frame);
criterion_main!(benches);
