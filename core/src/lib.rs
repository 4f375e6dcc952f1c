//! Music Visualizer Core
//!
//! Real-time audio spectrum visualization with synchronized video capture.
//!
//! # Features
//!
//! - FFT spectrum analysis via RustFFT with smoothing and dB scaling
//! - 36 render modes, from bar graphs to boids and lightning
//! - 33 built-in color themes plus user themes from JSON
//! - A live render loop driven by playback lifecycle events
//! - Video capture with codec fallback: animated GIF always, and H.264,
//!   VP9, VP8 or ProRes 4444 through FFmpeg (when the `ffmpeg` feature is enabled)

pub mod audio;
pub mod capture;
pub mod color;
pub mod engine;
pub mod modes;
pub mod pipeline;
pub mod playback;
pub mod render;

// Re-export commonly used types
pub use audio::{AnalysisConfig, AnalysisSource, FrequencyFrame, ScriptedSource, SpectrumAnalyzer, TrackAnalysisSource};
pub use capture::{
    ArtifactSink, CaptureConfig, CaptureError, CaptureRecorder, CaptureState, DirectorySink, EncoderBackend,
    ExportArtifact, GifBackend, MemorySink, RecordingDuration, VideoCodec,
};
#[cfg(feature = "ffmpeg")]
pub use capture::FfmpegBackend;
pub use color::{Palette, Rgb, Rgba, ThemeCatalog};
pub use engine::{render_frame, EngineState, Scene, SharedRegistry, SharedSource, VisualizationEngine};
pub use modes::{create_mode, BackgroundType, ModeKind, ModeRegistry, RenderMode, RenderParameters};
pub use pipeline::{InputSource, Visualizer, VisualizerBuilder, VisualizerConfig, VisualizerError};
pub use playback::{Playback, PlaybackEvent, PlaybackState, RecordingStatus, SimulatedPlayback, Status, Track};
pub use render::{RasterSurface, RecordingSurface, Surface};
