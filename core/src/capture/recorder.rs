//! The capture state machine.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use log::{debug, error, info, warn};

use super::artifact::{artifact_file_name, unix_millis, ArtifactSink, ExportArtifact};
use super::encoder::{codec_candidates, EncoderBackend, EncoderSettings, StreamEncoder, VideoCodec};
use super::{CaptureConfig, CaptureError, RecordingDuration};
use crate::engine::{render_frame, FrameScheduler, Scene, SharedRegistry, SharedSource, TaskHandle};
use crate::playback::{Playback, PlaybackEvent, RecordingStatus};
use crate::render::{RasterSurface, Surface};

/// Creates the offscreen surface for a capture.
pub type SurfaceFactory = Box<dyn FnMut(u32, u32) -> Box<dyn Surface>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    Preparing,
    Recording,
    Finalizing,
}

/// Size and alpha of a requested capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureTarget {
    pub width: u32,
    pub height: u32,
    pub transparent: bool,
}

/// One export in progress.
pub struct RecordingSession {
    transparent: bool,
    codec: VideoCodec,
    bitrate: u32,
    chunks: Vec<Vec<u8>>,
    frames: u64,
    surface: Box<dyn Surface>,
    registry: SharedRegistry,
    source: SharedSource,
    encoder: Box<dyn StreamEncoder>,
    scheduler: FrameScheduler,
    task: TaskHandle,
}

impl RecordingSession {
    pub fn transparent(&self) -> bool {
        self.transparent
    }

    pub fn codec(&self) -> VideoCodec {
        self.codec
    }

    pub fn bitrate(&self) -> u32 {
        self.bitrate
    }

    /// Frames handed to the encoder so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Time on the capture clock.
    pub fn elapsed(&self) -> Duration {
        Duration::from_secs_f64(self.scheduler.ticks() as f64 / self.scheduler.refresh_rate() as f64)
    }

    pub fn surface(&self) -> &dyn Surface {
        self.surface.as_ref()
    }

    pub fn registry(&self) -> SharedRegistry {
        Rc::clone(&self.registry)
    }
}

impl fmt::Debug for RecordingSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingSession")
            .field("transparent", &self.transparent)
            .field("codec", &self.codec)
            .field("bitrate", &self.bitrate)
            .field("frames", &self.frames)
            .field("chunks", &self.chunks.len())
            .finish_non_exhaustive()
    }
}

/// Records the visualization into a video while playback runs.
pub struct CaptureRecorder {
    config: CaptureConfig,
    backends: Vec<Box<dyn EncoderBackend>>,
    new_surface: SurfaceFactory,
    sink: Box<dyn ArtifactSink>,
    state: CaptureState,
    status: RecordingStatus,
    session: Option<RecordingSession>,
}

impl CaptureRecorder {
    /// A recorder drawing captures on [`RasterSurface`]s.
    pub fn new(config: CaptureConfig, backends: Vec<Box<dyn EncoderBackend>>, sink: Box<dyn ArtifactSink>) -> Self {
        Self::with_surface_factory(
            config,
            backends,
            sink,
            Box::new(|width, height| Box::new(RasterSurface::new(width, height))),
        )
    }

    pub fn with_surface_factory(
        config: CaptureConfig,
        backends: Vec<Box<dyn EncoderBackend>>,
        sink: Box<dyn ArtifactSink>,
        new_surface: SurfaceFactory,
    ) -> Self {
        Self {
            config,
            backends,
            new_surface,
            sink,
            state: CaptureState::Idle,
            status: RecordingStatus::Ready,
            session: None,
        }
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn status(&self) -> &RecordingStatus {
        &self.status
    }

    pub fn is_recording(&self) -> bool {
        self.state == CaptureState::Recording
    }

    pub fn session(&self) -> Option<&RecordingSession> {
        self.session.as_ref()
    }

    fn set_state(&mut self, state: CaptureState, status: RecordingStatus) {
        if self.state != state {
            debug!("capture {:?} -> {:?}", self.state, state);
        }
        self.state = state;
        self.status = status;
    }

    fn fail(&mut self, err: CaptureError) -> CaptureError {
        warn!("recording aborted: {}", err);
        self.session = None;
        self.set_state(CaptureState::Idle, RecordingStatus::Failed(err.to_string()));
        err
    }

    /// Start recording `target` from the beginning of the track.
    ///
    /// `source` is `None` when no input has been selected. A second start
    /// while a session is active is rejected and creates no encoder.
    pub fn start(
        &mut self,
        source: Option<&SharedSource>,
        target: CaptureTarget,
        live_registry: &SharedRegistry,
        playback: &mut dyn Playback,
    ) -> Result<(), CaptureError> {
        if self.state != CaptureState::Idle {
            return Err(CaptureError::AlreadyRecording);
        }
        let Some(source) = source else {
            return Err(self.fail(CaptureError::NoInputSelected));
        };

        self.set_state(CaptureState::Preparing, RecordingStatus::Preparing);
        let surface = (self.new_surface)(target.width, target.height);

        let bitrate = self.config.bitrate_for(target.transparent);
        let candidates = codec_candidates(&self.config.codecs, target.transparent);
        let Some((codec, encoder)) = self.open_encoder(&candidates, target, bitrate) else {
            return Err(self.fail(CaptureError::EncoderUnavailable { tried: candidates }));
        };

        playback.seek_to_start();
        if let Err(e) = playback.play() {
            return Err(self.fail(e.into()));
        }

        let registry = if self.config.share_mode_state_during_capture {
            Rc::clone(live_registry)
        } else {
            Rc::new(RefCell::new(live_registry.borrow().fork()))
        };
        let mut scheduler = FrameScheduler::new(self.config.refresh_rate);
        let task = scheduler.request();

        info!(
            "recording started: {}x{} {} @ {} bps{}",
            target.width,
            target.height,
            codec,
            bitrate,
            if target.transparent { " (transparent)" } else { "" }
        );
        self.session = Some(RecordingSession {
            transparent: target.transparent,
            codec,
            bitrate,
            chunks: Vec::new(),
            frames: 0,
            surface,
            registry,
            source: Rc::clone(source),
            encoder,
            scheduler,
            task,
        });
        self.set_state(CaptureState::Recording, RecordingStatus::Recording);
        Ok(())
    }

    fn open_encoder(
        &self,
        candidates: &[VideoCodec],
        target: CaptureTarget,
        bitrate: u32,
    ) -> Option<(VideoCodec, Box<dyn StreamEncoder>)> {
        for &codec in candidates {
            let settings = EncoderSettings {
                codec,
                width: target.width,
                height: target.height,
                fps: self.config.fps,
                bitrate,
            };
            for backend in self.backends.iter().filter(|b| b.supports(codec)) {
                match backend.start(&settings) {
                    Ok(encoder) => return Some((codec, encoder)),
                    Err(e) => warn!("backend '{}' could not start {}: {}", backend.name(), codec, e),
                }
            }
        }
        None
    }

    /// Run one capture tick. Returns whether a frame was encoded.
    ///
    /// Only draws while recording and while playback is playing.
    pub fn tick(&mut self, scene: &Scene, playing: bool) -> bool {
        if self.state != CaptureState::Recording || !playing {
            return false;
        }
        let Some(session) = self.session.as_mut() else {
            return false;
        };

        if let RecordingDuration::Fixed(limit) = self.config.duration {
            if session.elapsed() >= limit {
                info!("recording reached its {:.1}s limit", limit.as_secs_f32());
                if let Err(e) = self.stop() {
                    error!("could not finalize recording: {}", e);
                }
                return false;
            }
        }

        let Some(tick) = session.scheduler.advance() else {
            return false;
        };
        let Some(frame) = session.source.borrow_mut().frame() else {
            return false;
        };
        render_frame(
            scene,
            &mut session.registry.borrow_mut(),
            &frame,
            session.surface.as_mut(),
            tick.time,
            session.transparent,
        );

        let pixels = session.surface.snapshot();
        match session.encoder.encode(&pixels) {
            Ok(chunk) => {
                if !chunk.is_empty() {
                    session.chunks.push(chunk);
                }
                session.frames += 1;
                true
            }
            Err(e) => {
                error!("encoding frame {} failed: {}", session.frames, e);
                self.fail(e.into());
                false
            }
        }
    }

    /// React to a playback transition. Playback ending or stopping
    /// finalizes an active recording.
    pub fn handle_event(&mut self, event: PlaybackEvent) -> Result<Option<ExportArtifact>, CaptureError> {
        match event {
            PlaybackEvent::Ended | PlaybackEvent::Stopped if self.is_recording() => self.stop(),
            _ => Ok(None),
        }
    }

    /// Finalize the active recording and deliver its artifact.
    ///
    /// Idempotent: without an active recording this returns `Ok(None)` and
    /// changes nothing.
    pub fn stop(&mut self) -> Result<Option<ExportArtifact>, CaptureError> {
        let Some(session) = self.session.take() else {
            return Ok(None);
        };
        self.set_state(CaptureState::Finalizing, RecordingStatus::Finalizing);

        let RecordingSession {
            transparent,
            codec,
            bitrate,
            mut chunks,
            frames,
            encoder,
            mut scheduler,
            task,
            ..
        } = session;
        scheduler.cancel(task);

        match encoder.finish() {
            Ok(tail) if !tail.is_empty() => chunks.push(tail),
            Ok(_) => {}
            Err(e) => return Err(self.fail(e.into())),
        }

        let artifact = ExportArtifact {
            file_name: artifact_file_name(transparent, unix_millis(), codec.extension()),
            codec,
            transparent,
            bitrate,
            frames,
            bytes: chunks.concat(),
        };
        if let Err(e) = self.sink.deliver(&artifact) {
            return Err(self.fail(e.into()));
        }

        info!("recording finished: {} ({} frames, {} bytes)", artifact.file_name, frames, artifact.len());
        self.set_state(
            CaptureState::Idle,
            RecordingStatus::Completed {
                extension: codec.extension().to_string(),
                bitrate,
            },
        );
        Ok(Some(artifact))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{FrequencyFrame, ScriptedSource};
    use crate::capture::{GifBackend, MemorySink};
    use crate::modes::ModeRegistry;
    use crate::playback::{SimulatedPlayback, Track};

    fn source() -> SharedSource {
        Rc::new(RefCell::new(ScriptedSource::constant(FrequencyFrame::filled(64, 180).unwrap())))
    }

    fn recorder(sink: &MemorySink) -> CaptureRecorder {
        CaptureRecorder::new(CaptureConfig::default(), vec![Box::new(GifBackend::new())], Box::new(sink.clone()))
    }

    const TARGET: CaptureTarget = CaptureTarget {
        width: 32,
        height: 24,
        transparent: false,
    };

    #[test]
    fn test_no_input_is_a_precondition_failure() {
        let sink = MemorySink::new();
        let mut recorder = recorder(&sink);
        let registry = Rc::new(RefCell::new(ModeRegistry::default()));
        let mut playback = SimulatedPlayback::new();

        let err = recorder.start(None, TARGET, &registry, &mut playback).unwrap_err();
        assert!(matches!(err, CaptureError::NoInputSelected));
        assert_eq!(recorder.state(), CaptureState::Idle);
        assert!(matches!(recorder.status(), RecordingStatus::Failed(_)));
    }

    #[test]
    fn test_record_until_stop() {
        let sink = MemorySink::new();
        let mut recorder = recorder(&sink);
        let registry = Rc::new(RefCell::new(ModeRegistry::default()));
        let mut playback = SimulatedPlayback::with_track(Track::new(vec![0.0; 48000], 48000));

        recorder.start(Some(&source()), TARGET, &registry, &mut playback).unwrap();
        assert!(playback.is_playing());
        assert_eq!(recorder.state(), CaptureState::Recording);

        let scene = Scene::default();
        for _ in 0..5 {
            assert!(recorder.tick(&scene, true));
        }
        assert!(!recorder.tick(&scene, false));
        assert_eq!(recorder.session().unwrap().frames(), 5);

        let artifact = recorder.stop().unwrap().unwrap();
        assert_eq!(artifact.frames, 5);
        assert_eq!(artifact.codec, VideoCodec::Gif);
        assert!(artifact.file_name.starts_with("music-visualizer-"));
        assert!(artifact.file_name.ends_with(".gif"));
        assert_eq!(sink.len(), 1);
        assert_eq!(recorder.state(), CaptureState::Idle);

        assert!(recorder.stop().unwrap().is_none());
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_fixed_duration_stops_on_its_own() {
        let sink = MemorySink::new();
        let config = CaptureConfig {
            duration: RecordingDuration::Fixed(Duration::from_millis(90)),
            refresh_rate: 30,
            ..Default::default()
        };
        let mut recorder = CaptureRecorder::new(config, vec![Box::new(GifBackend::new())], Box::new(sink.clone()));
        let registry = Rc::new(RefCell::new(ModeRegistry::default()));
        let mut playback = SimulatedPlayback::with_track(Track::new(vec![0.0; 48000], 48000));
        recorder.start(Some(&source()), TARGET, &registry, &mut playback).unwrap();

        let scene = Scene::default();
        let encoded = (0..10).filter(|_| recorder.tick(&scene, true)).count();
        assert_eq!(encoded, 3);
        assert_eq!(recorder.state(), CaptureState::Idle);
        assert_eq!(sink.artifacts()[0].frames, 3);
    }

    #[test]
    fn test_capture_state_is_separate_by_default() {
        let sink = MemorySink::new();
        let mut recorder = recorder(&sink);
        let registry = Rc::new(RefCell::new(ModeRegistry::new(9)));
        let mut playback = SimulatedPlayback::with_track(Track::new(vec![0.0; 48000], 48000));
        recorder.start(Some(&source()), TARGET, &registry, &mut playback).unwrap();

        let session_registry = recorder.session().unwrap().registry();
        assert!(!Rc::ptr_eq(&session_registry, &registry));
        assert_eq!(session_registry.borrow().seed(), 9);
    }
}
