//! FFT spectrum analysis using RustFFT.
//!
//! Produces byte-scaled frequency frames the way a real-time analyser node
//! does: Blackman window, magnitude per bin, temporal smoothing, then a
//! linear mapping of a decibel range onto `0..=255`.

use std::f32::consts::PI;
use std::sync::Arc;

use log::debug;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use serde::{Deserialize, Serialize};

use super::FrequencyFrame;

/// Error type for spectrum analysis operations.
#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    #[error("FFT size must be a power of 2 between 32 and 32768, got {0}")]
    InvalidFftSize(usize),
    #[error("frequency frame has no bins")]
    EmptyFrame,
    #[error("bin count must be a power of 2, got {0}")]
    NonPowerOfTwo(usize),
    #[error("decibel range is empty: min {min} >= max {max}")]
    InvalidDecibelRange { min: f32, max: f32 },
}

/// Analysis session settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Window length in samples. Bin count is half of it.
    pub fft_size: usize,
    /// Temporal smoothing coefficient in `[0, 1]`.
    pub smoothing: f32,
    pub min_decibels: f32,
    pub max_decibels: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fft_size: 512,
            smoothing: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), AnalyzerError> {
        if !self.fft_size.is_power_of_two() || !(32..=32768).contains(&self.fft_size) {
            return Err(AnalyzerError::InvalidFftSize(self.fft_size));
        }
        if self.min_decibels >= self.max_decibels {
            return Err(AnalyzerError::InvalidDecibelRange {
                min: self.min_decibels,
                max: self.max_decibels,
            });
        }
        Ok(())
    }

    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }
}

/// Spectrum analyzer for audio data.
///
/// Keeps the previous smoothed magnitudes, so successive calls on
/// overlapping windows decay instead of jumping.
pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    config: AnalysisConfig,
    window: Vec<f32>,
    smoothed: Vec<f32>,
}

impl SpectrumAnalyzer {
    pub fn new(config: AnalysisConfig) -> Result<Self, AnalyzerError> {
        config.validate()?;
        let n = config.fft_size;

        let window = (0..n)
            .map(|i| {
                let x = i as f32 / n as f32;
                0.42 - 0.5 * (2.0 * PI * x).cos() + 0.08 * (4.0 * PI * x).cos()
            })
            .collect();

        let fft = FftPlanner::new().plan_fft_forward(n);
        debug!("spectrum analyzer ready: fft_size={} bins={}", n, n / 2);

        Ok(Self {
            fft,
            window,
            smoothed: vec![0.0; n / 2],
            config: AnalysisConfig {
                smoothing: config.smoothing.clamp(0.0, 1.0),
                ..config
            },
        })
    }

    pub fn fft_size(&self) -> usize {
        self.config.fft_size
    }

    /// Number of frequency bins in the output (FFT size / 2).
    pub fn bin_count(&self) -> usize {
        self.config.bin_count()
    }

    pub fn smoothing(&self) -> f32 {
        self.config.smoothing
    }

    pub fn set_smoothing(&mut self, smoothing: f32) {
        self.config.smoothing = if smoothing.is_nan() { 0.0 } else { smoothing.clamp(0.0, 1.0) };
    }

    /// Forget the smoothing history.
    pub fn reset(&mut self) {
        self.smoothed.iter_mut().for_each(|s| *s = 0.0);
    }

    /// Get the frequency in Hz for a given bin index.
    pub fn bin_to_freq(&self, bin: usize, sample_rate: u32) -> f32 {
        bin as f32 * sample_rate as f32 / self.config.fft_size as f32
    }

    /// Analyze the most recent `fft_size` samples of `samples`.
    ///
    /// Shorter inputs are zero-padded at the front, as happens at the very
    /// start of playback.
    pub fn analyze(&mut self, samples: &[f32]) -> FrequencyFrame {
        let n = self.config.fft_size;
        let tail = &samples[samples.len().saturating_sub(n)..];
        let pad = n - tail.len();

        let mut buffer: Vec<Complex<f32>> = (0..n)
            .map(|i| {
                let s = if i < pad { 0.0 } else { tail[i - pad] };
                Complex::new(s * self.window[i], 0.0)
            })
            .collect();
        self.fft.process(&mut buffer);

        let tau = self.config.smoothing;
        let range = self.config.max_decibels - self.config.min_decibels;
        let bins = buffer[..n / 2]
            .iter()
            .zip(self.smoothed.iter_mut())
            .map(|(c, prev)| {
                let magnitude = c.norm() / n as f32;
                let s = tau * *prev + (1.0 - tau) * magnitude;
                *prev = if s.is_finite() { s } else { 0.0 };
                let db = 20.0 * prev.max(1e-12).log10();
                let scaled = 255.0 * (db - self.config.min_decibels) / range;
                scaled.floor().clamp(0.0, 255.0) as u8
            })
            .collect();

        FrequencyFrame::from_bins_unchecked(bins)
    }
}
