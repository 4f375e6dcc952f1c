//! The analysis-source boundary the render loop pulls frames from.

use log::debug;

use super::{AnalysisConfig, AnalyzerError, FrequencyFrame, SpectrumAnalyzer};
use crate::playback::Track;

/// A producer of frequency frames.
///
/// `frame` never blocks: it returns the most recent analysis window, or
/// `None` while the source has nothing to offer yet.
pub trait AnalysisSource {
    fn frame(&mut self) -> Option<FrequencyFrame>;

    /// Fixed bin count for this session.
    fn bin_count(&self) -> usize;

    /// Temporal smoothing in `[0, 1]`, applied by the source alone.
    fn set_smoothing(&mut self, smoothing: f32);
}

/// Analyzes the window ending at a track's playback cursor.
///
/// The analyzer runs at most once per cursor position, so every consumer
/// pulling on the same tick (the live loop and the capture loop) sees the
/// same frame and the smoothing history advances once.
pub struct TrackAnalysisSource {
    track: Track,
    analyzer: SpectrumAnalyzer,
    last: Option<CachedFrame>,
}

struct CachedFrame {
    position: usize,
    smoothing: f32,
    frame: FrequencyFrame,
}

impl TrackAnalysisSource {
    pub fn new(track: Track, config: AnalysisConfig) -> Result<Self, AnalyzerError> {
        let analyzer = SpectrumAnalyzer::new(config)?;
        debug!(
            "analysis source bound to track: {} samples @ {} Hz",
            track.len(),
            track.sample_rate()
        );
        Ok(Self {
            track,
            analyzer,
            last: None,
        })
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn smoothing(&self) -> f32 {
        self.analyzer.smoothing()
    }
}

impl AnalysisSource for TrackAnalysisSource {
    fn frame(&mut self) -> Option<FrequencyFrame> {
        if self.track.is_empty() {
            return None;
        }
        let position = self.track.position();
        let smoothing = self.analyzer.smoothing();
        if let Some(cached) = &self.last {
            if cached.position == position && cached.smoothing == smoothing {
                return Some(cached.frame.clone());
            }
        }
        let window = self.track.window(self.analyzer.fft_size());
        let frame = self.analyzer.analyze(window);
        self.last = Some(CachedFrame {
            position,
            smoothing,
            frame: frame.clone(),
        });
        Some(frame)
    }

    fn bin_count(&self) -> usize {
        self.analyzer.bin_count()
    }

    fn set_smoothing(&mut self, smoothing: f32) {
        self.analyzer.set_smoothing(smoothing);
    }
}

/// Replays a fixed sequence of frames.
///
/// Once the script runs out the source reports "not ready" unless it was
/// built with [`ScriptedSource::looping`].
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    frames: Vec<FrequencyFrame>,
    next: usize,
    looping: bool,
    smoothing: f32,
}

impl ScriptedSource {
    pub fn new(frames: Vec<FrequencyFrame>) -> Self {
        Self {
            frames,
            smoothing: AnalysisConfig::default().smoothing,
            ..Default::default()
        }
    }

    /// The same frame on every tick.
    pub fn constant(frame: FrequencyFrame) -> Self {
        Self::new(vec![frame]).looping()
    }

    /// A source that is never ready.
    pub fn pending() -> Self {
        Self::new(Vec::new())
    }

    pub fn looping(mut self) -> Self {
        self.looping = true;
        self
    }

    /// Last smoothing value forwarded to this source.
    pub fn smoothing(&self) -> f32 {
        self.smoothing
    }

    pub fn frames_served(&self) -> usize {
        self.next
    }
}

impl AnalysisSource for ScriptedSource {
    fn frame(&mut self) -> Option<FrequencyFrame> {
        if self.frames.is_empty() || (!self.looping && self.next >= self.frames.len()) {
            return None;
        }
        let frame = self.frames[self.next % self.frames.len()].clone();
        self.next += 1;
        Some(frame)
    }

    fn bin_count(&self) -> usize {
        self.frames.first().map(FrequencyFrame::len).unwrap_or(0)
    }

    fn set_smoothing(&mut self, smoothing: f32) {
        self.smoothing = smoothing.clamp(0.0, 1.0);
    }
}
