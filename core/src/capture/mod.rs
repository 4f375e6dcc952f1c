//! Video capture of the visualization.
//!
//! This module provides:
//! - `CaptureRecorder`: the `Idle → Preparing → Recording → Finalizing → Idle`
//!   state machine running its own tick loop against an offscreen surface
//! - The `EncoderBackend`/`StreamEncoder` boundary and codec preference
//! - `GifBackend` (always available) and `FfmpegBackend` (feature `ffmpeg`)
//! - Export artifacts and sinks

pub mod artifact;
pub mod encoder;
#[cfg(feature = "ffmpeg")]
pub mod ffmpeg;
pub mod gif;
pub mod recorder;

pub use artifact::{artifact_file_name, ArtifactSink, DirectorySink, ExportArtifact, MemorySink};
pub use encoder::{
    codec_candidates, EncoderBackend, EncoderError, EncoderSettings, StreamEncoder, VideoCodec,
};
#[cfg(feature = "ffmpeg")]
pub use ffmpeg::FfmpegBackend;
pub use gif::GifBackend;
pub use recorder::{CaptureRecorder, CaptureState, CaptureTarget, RecordingSession, SurfaceFactory};

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engine::DEFAULT_REFRESH_RATE;
use crate::playback::PlaybackError;

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("select an audio file first")]
    NoInputSelected,
    #[error("a recording is already in progress")]
    AlreadyRecording,
    #[error("no supported video encoder (tried {tried:?})")]
    EncoderUnavailable { tried: Vec<VideoCodec> },
    #[error("encoder error: {0}")]
    Encoder(#[from] EncoderError),
    #[error("playback error: {0}")]
    Playback(#[from] PlaybackError),
    #[error("could not save recording: {0}")]
    Io(#[from] std::io::Error),
}

/// When a recording stops on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingDuration {
    /// Record until playback ends or the recording is stopped.
    #[default]
    UntilPlaybackEnds,
    /// Stop after a fixed span of the capture clock.
    Fixed(Duration),
}

/// Capture settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Encoded frame rate. Independent of the tick rate.
    pub fps: u32,
    /// Bitrate for opaque captures, in bits per second.
    pub bitrate: u32,
    /// Bitrate for transparent captures. Alpha costs extra bits.
    pub transparent_bitrate: u32,
    /// Codec preference, best first.
    pub codecs: Vec<VideoCodec>,
    /// Drive the capture pass with the live mode state instead of a fresh,
    /// identically seeded copy.
    pub share_mode_state_during_capture: bool,
    pub duration: RecordingDuration,
    /// Tick rate of the capture loop's frame clock.
    pub refresh_rate: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            fps: 30,
            bitrate: 8_000_000,
            transparent_bitrate: 10_000_000,
            codecs: VideoCodec::PREFERENCE.to_vec(),
            share_mode_state_during_capture: false,
            duration: RecordingDuration::UntilPlaybackEnds,
            refresh_rate: DEFAULT_REFRESH_RATE,
        }
    }
}

impl CaptureConfig {
    pub fn bitrate_for(&self, transparent: bool) -> u32 {
        if transparent {
            self.transparent_bitrate
        } else {
            self.bitrate
        }
    }
}
