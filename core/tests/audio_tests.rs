//! Integration tests for audio analysis.

use music_visualizer::audio::{
    generate_chirp, generate_sine, generate_white_noise, AnalysisConfig, AnalysisSource, SpectrumAnalyzer,
    TrackAnalysisSource,
};
use music_visualizer::playback::{Playback, SimulatedPlayback, Track};
use std::time::Duration;

const SAMPLE_RATE: u32 = 44100;

fn analyzer(fft_size: usize) -> SpectrumAnalyzer {
    SpectrumAnalyzer::new(AnalysisConfig {
        fft_size,
        smoothing: 0.0,
        ..Default::default()
    })
    .unwrap()
}

fn peak_near(frame: &music_visualizer::FrequencyFrame, freq: f32, fft_size: usize) -> u8 {
    let bin = (freq * fft_size as f32 / SAMPLE_RATE as f32).round() as usize;
    (bin.saturating_sub(1)..=bin + 1).map(|i| frame.get(i)).max().unwrap_or(0)
}

#[test]
fn test_multiple_frequencies() {
    let samples1 = generate_sine(440.0, SAMPLE_RATE, 0.5, 0.5);
    let samples2 = generate_sine(880.0, SAMPLE_RATE, 0.5, 0.5);
    let mixed: Vec<f32> = samples1.iter().zip(&samples2).map(|(a, b)| a + b).collect();

    let mut analyzer = analyzer(4096);
    let frame = analyzer.analyze(&mixed);

    let far = peak_near(&frame, 6000.0, 4096);
    assert!(peak_near(&frame, 440.0, 4096) > far, "expected energy at 440 Hz");
    assert!(peak_near(&frame, 880.0, 4096) > far, "expected energy at 880 Hz");
}

#[test]
fn test_chirp_peak_moves_up() {
    let samples = generate_chirp(200.0, 4000.0, SAMPLE_RATE, 1.0);
    let mut analyzer = analyzer(2048);

    let peak = |frame: &music_visualizer::FrequencyFrame| {
        frame
            .bins()
            .iter()
            .enumerate()
            .max_by_key(|&(_, b)| *b)
            .map(|(i, _)| i)
            .unwrap()
    };
    let early = peak(&analyzer.analyze(&samples[..4096]));
    let late = peak(&analyzer.analyze(&samples[samples.len() - 4096..]));
    assert!(late > early, "peak bin went from {early} to {late}");
}

#[test]
fn test_white_noise_fills_every_band() {
    let samples = generate_white_noise(SAMPLE_RATE, 0.5, 1.0, 42);
    let mut analyzer = analyzer(2048);
    let frame = analyzer.analyze(&samples);

    let bands = frame.downsample(32, 1.0);
    assert_eq!(bands.len(), 32);
    assert!(bands.iter().all(|&b| b > 0.0));
    assert!(bands.iter().all(|&b| b <= 1.0));
}

#[test]
fn test_analysis_follows_playback() {
    let mut samples = vec![0.0; SAMPLE_RATE as usize / 2];
    samples.extend(generate_sine(1000.0, SAMPLE_RATE, 0.5, 0.8));
    let track = Track::new(samples, SAMPLE_RATE);

    let mut source = TrackAnalysisSource::new(
        track.clone(),
        AnalysisConfig {
            smoothing: 0.0,
            ..Default::default()
        },
    )
    .unwrap();
    let mut playback = SimulatedPlayback::with_track(track);
    playback.play().unwrap();

    playback.advance(Duration::from_millis(250));
    let quiet = source.frame().unwrap();
    assert!(quiet.bins().iter().all(|&b| b == 0));

    playback.advance(Duration::from_millis(500));
    let loud = source.frame().unwrap();
    assert!(loud.mean(1.0) > 0.0);
    assert_eq!(loud.len(), source.bin_count());
}
