//! Audio analysis feeding the render loop.
//!
//! This module provides:
//! - `FrequencyFrame`: one snapshot of byte-scaled frequency magnitudes
//! - FFT spectrum analysis via RustFFT with temporal smoothing and dB mapping
//! - The `AnalysisSource` boundary the engine pulls frames from
//! - Synthetic signals for tests, benches and demos

pub mod analyzer;
pub mod frame;
pub mod source;
pub mod synth;

pub use analyzer::{AnalysisConfig, AnalyzerError, SpectrumAnalyzer};
pub use frame::FrequencyFrame;
pub use source::{AnalysisSource, ScriptedSource, TrackAnalysisSource};
pub use synth::{generate_chirp, generate_kick, generate_sine, generate_test_beat, generate_white_noise};
