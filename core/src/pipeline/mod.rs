//! The visualizer facade wiring playback, analysis, the live loop and capture.

pub mod config;

pub use config::{ConfigError, VisualizerConfig};

use std::cell::RefCell;
use std::rc::Rc;

use log::{error, info, warn};

use crate::audio::TrackAnalysisSource;
use crate::capture::{
    ArtifactSink, CaptureError, CaptureRecorder, CaptureState, CaptureTarget, EncoderBackend, ExportArtifact, GifBackend, MemorySink,
    SurfaceFactory, VideoCodec,
};
use crate::color::Rgb;
use crate::engine::{Scene, SharedSource, VisualizationEngine};
use crate::modes::{ModeKind, ParameterError, RenderParameters};
use crate::playback::{Playback, PlaybackError, PlaybackEvent, RecordingStatus, SimulatedPlayback, Status, Track};
use crate::render::{Paint, Point, RasterSurface, Rect, Surface};

/// Errors reported by the facade. Each one also leaves a visible status.
#[derive(Debug, thiserror::Error)]
pub enum VisualizerError {
    #[error("{0}")]
    Precondition(String),
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("no supported video encoder (tried {0:?})")]
    EncoderUnavailable(Vec<VideoCodec>),
    #[error("audio device error: {0}")]
    TransientDevice(String),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid parameter: {0}")]
    Parameter(#[from] ParameterError),
    #[error("playback error: {0}")]
    Playback(#[from] PlaybackError),
    #[error("capture error: {0}")]
    Capture(CaptureError),
}

impl From<CaptureError> for VisualizerError {
    fn from(err: CaptureError) -> Self {
        match err {
            CaptureError::NoInputSelected => VisualizerError::Precondition(err.to_string()),
            CaptureError::EncoderUnavailable { tried } => VisualizerError::EncoderUnavailable(tried),
            other => VisualizerError::Capture(other),
        }
    }
}

/// A selected audio input.
#[derive(Debug, Clone, PartialEq)]
pub struct InputSource {
    pub name: String,
    pub mime_type: String,
    /// Mono samples in `[-1, 1]`.
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl InputSource {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            samples,
            sample_rate,
        }
    }

    pub fn is_audio(&self) -> bool {
        self.mime_type.starts_with("audio/")
    }
}

/// Builds a [`Visualizer`] with optional replacements for its collaborators.
pub struct VisualizerBuilder {
    config: VisualizerConfig,
    surface: Option<Box<dyn Surface>>,
    playback: Option<Box<dyn Playback>>,
    source: Option<SharedSource>,
    backends: Option<Vec<Box<dyn EncoderBackend>>>,
    sink: Option<Box<dyn ArtifactSink>>,
    capture_surfaces: Option<SurfaceFactory>,
}

impl VisualizerBuilder {
    pub fn new(config: VisualizerConfig) -> Self {
        Self {
            config,
            surface: None,
            playback: None,
            source: None,
            backends: None,
            sink: None,
            capture_surfaces: None,
        }
    }

    /// Live surface. Defaults to a [`RasterSurface`] of the configured size.
    pub fn surface(mut self, surface: Box<dyn Surface>) -> Self {
        self.surface = Some(surface);
        self
    }

    /// Defaults to [`SimulatedPlayback`].
    pub fn playback(mut self, playback: Box<dyn Playback>) -> Self {
        self.playback = Some(playback);
        self
    }

    /// Start with an analysis source already selected.
    pub fn source(mut self, source: SharedSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Encoder backends in priority order. Defaults to FFmpeg (when built
    /// with the `ffmpeg` feature) followed by GIF.
    pub fn backends(mut self, backends: Vec<Box<dyn EncoderBackend>>) -> Self {
        self.backends = Some(backends);
        self
    }

    /// Where finished recordings go. Defaults to a [`MemorySink`].
    pub fn sink(mut self, sink: Box<dyn ArtifactSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Factory for capture surfaces. Defaults to [`RasterSurface`].
    pub fn capture_surfaces(mut self, factory: SurfaceFactory) -> Self {
        self.capture_surfaces = Some(factory);
        self
    }

    pub fn build(self) -> Result<Visualizer, VisualizerError> {
        let config = self.config;
        config.validate()?;
        let scene = Scene::new(config.render.clone(), config.theme_catalog()?);

        let surface = self
            .surface
            .unwrap_or_else(|| Box::new(RasterSurface::new(config.width, config.height)));
        let live_source = self.source.clone().unwrap_or_else(pending_source);
        let engine =
            VisualizationEngine::new(surface, live_source, config.seed).with_refresh_rate(config.refresh_rate);

        let backends = self.backends.unwrap_or_else(default_backends);
        let sink = self.sink.unwrap_or_else(|| Box::new(MemorySink::new()));
        let recorder = match self.capture_surfaces {
            Some(factory) => CaptureRecorder::with_surface_factory(config.capture.clone(), backends, sink, factory),
            None => CaptureRecorder::new(config.capture.clone(), backends, sink),
        };

        let status = if self.source.is_some() {
            Status::Ready
        } else {
            Status::Idle
        };
        Ok(Visualizer {
            config,
            scene,
            playback: self.playback.unwrap_or_else(|| Box::new(SimulatedPlayback::new())),
            engine,
            recorder,
            source: self.source,
            input_name: None,
            status,
            last_artifact: None,
        })
    }
}

fn pending_source() -> SharedSource {
    Rc::new(RefCell::new(crate::audio::ScriptedSource::pending()))
}

fn default_backends() -> Vec<Box<dyn EncoderBackend>> {
    let mut backends: Vec<Box<dyn EncoderBackend>> = Vec::new();
    #[cfg(feature = "ffmpeg")]
    backends.push(Box::new(crate::capture::FfmpegBackend::new()));
    backends.push(Box::new(GifBackend::new()));
    backends
}

/// The whole visualizer: one live loop, one capture recorder, one input.
pub struct Visualizer {
    config: VisualizerConfig,
    scene: Scene,
    playback: Box<dyn Playback>,
    engine: VisualizationEngine,
    recorder: CaptureRecorder,
    source: Option<SharedSource>,
    input_name: Option<String>,
    status: Status,
    last_artifact: Option<ExportArtifact>,
}

impl Visualizer {
    /// A visualizer with default collaborators.
    pub fn new(config: VisualizerConfig) -> Result<Self, VisualizerError> {
        VisualizerBuilder::new(config).build()
    }

    pub fn builder(config: VisualizerConfig) -> VisualizerBuilder {
        VisualizerBuilder::new(config)
    }

    /// Select an audio input and bind a fresh analysis source to it.
    pub fn load_input(&mut self, input: InputSource) -> Result<(), VisualizerError> {
        self.status = Status::Loading;
        if !input.is_audio() {
            warn!("rejected input '{}' ({})", input.name, input.mime_type);
            self.status = Status::Error(format!("not an audio file: {}", input.name));
            return Err(VisualizerError::UnsupportedFormat(input.mime_type));
        }

        match self.recorder.stop() {
            Ok(Some(artifact)) => self.last_artifact = Some(artifact),
            Ok(None) => {}
            Err(e) => warn!("recording dropped while loading a new input: {}", e),
        }
        self.engine.stop();

        let track = Track::new(input.samples, input.sample_rate);
        let mut analysis = self.config.analysis.clone();
        analysis.smoothing = self.scene.params.smoothing;
        let source = match TrackAnalysisSource::new(track.clone(), analysis) {
            Ok(source) => source,
            Err(e) => {
                error!("could not set up analysis for '{}': {}", input.name, e);
                self.status = Status::Error(e.to_string());
                return Err(VisualizerError::TransientDevice(e.to_string()));
            }
        };

        let source: SharedSource = Rc::new(RefCell::new(source));
        self.engine.set_source(Rc::clone(&source));
        self.source = Some(source);
        self.playback.load(track);
        info!("input selected: {}", input.name);
        self.input_name = Some(input.name);
        self.dispatch_events();
        Ok(())
    }

    pub fn play(&mut self) -> Result<(), VisualizerError> {
        if self.source.is_none() {
            self.status = Status::Error("select an audio file first".into());
            return Err(VisualizerError::Precondition("select an audio file first".into()));
        }
        if let Err(e) = self.playback.play() {
            self.status = Status::Error(e.to_string());
            return Err(e.into());
        }
        self.dispatch_events();
        Ok(())
    }

    pub fn pause(&mut self) {
        self.playback.pause();
        self.dispatch_events();
    }

    /// Stop playback and the live loop, then paint the live surface black.
    pub fn stop(&mut self) {
        self.playback.stop();
        self.dispatch_events();
        self.engine.stop();
        self.status = Status::Stopped;

        let surface = self.engine.surface_mut();
        let bounds = surface.bounds();
        surface.fill_rect(bounds, &Paint::solid(Rgb::BLACK));
    }

    /// Record the visualization from the start of the track until it ends.
    pub fn download_video(&mut self, transparent: bool) -> Result<(), VisualizerError> {
        let surface = self.engine.surface();
        let target = CaptureTarget {
            width: surface.width(),
            height: surface.height(),
            transparent,
        };
        let registry = self.engine.registry();
        self.recorder
            .start(self.source.as_ref(), target, &registry, self.playback.as_mut())?;
        self.dispatch_events();
        Ok(())
    }

    /// Finalize the active recording, if any.
    pub fn stop_recording(&mut self) -> Result<Option<ExportArtifact>, VisualizerError> {
        let artifact = self.recorder.stop()?;
        if let Some(artifact) = &artifact {
            self.last_artifact = Some(artifact.clone());
        }
        Ok(artifact)
    }

    /// Advance one display refresh: move the playback clock, route
    /// lifecycle transitions, then run the live and capture ticks.
    ///
    /// Returns whether the live surface was drawn.
    pub fn on_frame(&mut self) -> bool {
        self.playback.advance(self.engine.scheduler().frame_interval());
        self.dispatch_events();

        let drawn = self.engine.tick(&self.scene);
        self.recorder.tick(&self.scene, self.playback.is_playing());
        drawn
    }

    fn dispatch_events(&mut self) {
        for event in self.playback.poll_events() {
            self.engine.handle_event(event);
            match self.recorder.handle_event(event) {
                Ok(Some(artifact)) => self.last_artifact = Some(artifact),
                Ok(None) => {}
                Err(e) => error!("recording could not be finalized: {}", e),
            }
            self.status = match event {
                PlaybackEvent::Loaded => Status::Ready,
                PlaybackEvent::Playing => Status::Playing,
                PlaybackEvent::Paused => Status::Paused,
                PlaybackEvent::Stopped => Status::Stopped,
                PlaybackEvent::Ended => Status::Ended,
            };
        }
    }

    /// Replace the render parameters. Takes effect on the next tick.
    pub fn set_params(&mut self, params: RenderParameters) -> Result<(), VisualizerError> {
        params.validate()?;
        if params.mode != self.scene.params.mode {
            self.engine.select_mode(params.mode);
        }
        if params.smoothing != self.scene.params.smoothing {
            if let Some(source) = &self.source {
                source.borrow_mut().set_smoothing(params.smoothing);
            }
        }
        self.scene.params = params;
        Ok(())
    }

    /// Edit a copy of the current parameters and apply it.
    pub fn update_params(&mut self, edit: impl FnOnce(&mut RenderParameters)) -> Result<(), VisualizerError> {
        let mut params = self.scene.params.clone();
        edit(&mut params);
        self.set_params(params)
    }

    pub fn set_mode(&mut self, mode: ModeKind) {
        if mode != self.scene.params.mode {
            self.engine.select_mode(mode);
            self.scene.params.mode = mode;
        }
    }

    /// Switch theme. While idle the new palette is shown on the live surface.
    pub fn set_color_theme(&mut self, theme: &str) {
        self.scene.params.color_theme = theme.to_string();
        if !self.engine.is_running() {
            self.preview_theme();
        }
    }

    /// Paint one stripe per palette color, each labelled with its hex code.
    pub fn preview_theme(&mut self) {
        let palette = self.scene.themes.palette(&self.scene.params.color_theme).clone();
        let surface = self.engine.surface_mut();
        let width = surface.width() as f32;
        let height = surface.height() as f32;
        let stripe = width / palette.len().max(1) as f32;

        let bounds = surface.bounds();
        surface.fill_rect(bounds, &Paint::solid(Rgb::BLACK));
        for (index, color) in palette.colors().iter().enumerate() {
            let x = index as f32 * stripe;
            surface.fill_rect(Rect::new(x, 0.0, stripe, height), &Paint::solid(*color));
            surface.fill_text(
                &color.to_hex(),
                Point::new(x + stripe / 2.0, height / 2.0),
                16.0,
                &Paint::solid(Rgb::WHITE),
            );
        }
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn recording_status(&self) -> &RecordingStatus {
        self.recorder.status()
    }

    /// The one status line to show: the recorder's while a capture is in
    /// flight, the playback status otherwise.
    pub fn status_line(&self) -> String {
        if self.recorder.state() == CaptureState::Idle {
            self.status.to_string()
        } else {
            self.recording_status().to_string()
        }
    }

    pub fn params(&self) -> &RenderParameters {
        &self.scene.params
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn config(&self) -> &VisualizerConfig {
        &self.config
    }

    pub fn input_name(&self) -> Option<&str> {
        self.input_name.as_deref()
    }

    pub fn has_input(&self) -> bool {
        self.source.is_some()
    }

    pub fn engine(&self) -> &VisualizationEngine {
        &self.engine
    }

    pub fn recorder(&self) -> &CaptureRecorder {
        &self.recorder
    }

    pub fn playback(&self) -> &dyn Playback {
        self.playback.as_ref()
    }

    pub fn surface(&self) -> &dyn Surface {
        self.engine.surface()
    }

    /// The most recent finished recording.
    pub fn last_artifact(&self) -> Option<&ExportArtifact> {
        self.last_artifact.as_ref()
    }
}
