//! Synthetic audio for tests, benches and the demo.
//!
//! Every generator returns mono `f32` samples in `-1.0..=1.0`.

use std::f32::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn sample_count(sample_rate: u32, duration: f32) -> usize {
    (duration.max(0.0) * sample_rate as f32) as usize
}

/// A pure tone at `frequency` Hz.
pub fn generate_sine(frequency: f32, sample_rate: u32, duration: f32, amplitude: f32) -> Vec<f32> {
    (0..sample_count(sample_rate, duration))
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            amplitude * (2.0 * PI * frequency * t).sin()
        })
        .collect()
}

/// A linear sweep from `start_hz` to `end_hz`, useful for exercising every bin.
pub fn generate_chirp(start_hz: f32, end_hz: f32, sample_rate: u32, duration: f32) -> Vec<f32> {
    let duration = duration.max(f32::EPSILON);
    let rate = (end_hz - start_hz) / duration;
    (0..sample_count(sample_rate, duration))
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            (2.0 * PI * (start_hz * t + 0.5 * rate * t * t)).sin() * 0.8
        })
        .collect()
}

/// Uniform white noise, reproducible for a given seed.
pub fn generate_white_noise(sample_rate: u32, duration: f32, amplitude: f32, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..sample_count(sample_rate, duration))
        .map(|_| amplitude * rng.gen_range(-1.0..=1.0))
        .collect()
}

/// A 150 ms bass drum: pitch falls from 150 Hz to 50 Hz under a fast decay.
pub fn generate_kick(sample_rate: u32) -> Vec<f32> {
    (0..sample_count(sample_rate, 0.15))
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            let freq = 50.0 + 100.0 * (-t * 30.0).exp();
            (-t * 15.0).exp() * (2.0 * PI * freq * t).sin()
        })
        .collect()
}

/// Kicks on every beat over a soft sustained chord, normalized to full scale.
pub fn generate_test_beat(bpm: f32, sample_rate: u32, duration: f32) -> Vec<f32> {
    let n = sample_count(sample_rate, duration);
    let beat = ((60.0 / bpm.max(1.0)) * sample_rate as f32) as usize;
    let kick = generate_kick(sample_rate);

    let mut samples: Vec<f32> = (0..n)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            [220.0, 277.2, 329.6, 1760.0]
                .iter()
                .map(|f| 0.12 * (2.0 * PI * f * t).sin())
                .sum::<f32>()
        })
        .collect();

    for start in (0..n).step_by(beat.max(1)) {
        for (s, k) in samples[start..].iter_mut().zip(&kick) {
            *s += 0.8 * k;
        }
    }

    let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    if peak > 1.0 {
        samples.iter_mut().for_each(|s| *s /= peak);
    }
    samples
}
