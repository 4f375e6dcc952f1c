//! Integration tests for video capture through the visualizer.

mod common;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use common::{beat_input, recording_factory, small_config};
use music_visualizer::capture::{
    artifact_file_name, CaptureError, CaptureState, DirectorySink, EncoderBackend, EncoderError, EncoderSettings,
    GifBackend, MemorySink, StreamEncoder, VideoCodec,
};
use music_visualizer::modes::BackgroundType;
use music_visualizer::pipeline::{Visualizer, VisualizerConfig, VisualizerError};
use music_visualizer::playback::{PlaybackState, RecordingStatus, Status};
use music_visualizer::playback::{SimulatedPlayback, Track};
use music_visualizer::render::{DrawCommand, RecordingSurface};
use music_visualizer::{AnalysisConfig, AnalysisSource, FrequencyFrame, TrackAnalysisSource};

/// Counts how many encoders were started.
struct CountingBackend {
    inner: GifBackend,
    started: Rc<Cell<usize>>,
}

impl EncoderBackend for CountingBackend {
    fn name(&self) -> &str {
        "counting"
    }

    fn supports(&self, codec: VideoCodec) -> bool {
        self.inner.supports(codec)
    }

    fn start(&self, settings: &EncoderSettings) -> Result<Box<dyn StreamEncoder>, EncoderError> {
        self.started.set(self.started.get() + 1);
        self.inner.start(settings)
    }
}

/// Notes every frame handed out, tagged with the playback cursor.
struct TappedSource {
    inner: TrackAnalysisSource,
    pulls: Rc<RefCell<Vec<(usize, FrequencyFrame)>>>,
}

impl AnalysisSource for TappedSource {
    fn frame(&mut self) -> Option<FrequencyFrame> {
        let frame = self.inner.frame()?;
        let position = self.inner.track().position();
        self.pulls.borrow_mut().push((position, frame.clone()));
        Some(frame)
    }

    fn bin_count(&self) -> usize {
        self.inner.bin_count()
    }

    fn set_smoothing(&mut self, smoothing: f32) {
        self.inner.set_smoothing(smoothing);
    }
}

fn gif_visualizer(config: VisualizerConfig, sink: &MemorySink) -> Visualizer {
    Visualizer::builder(config)
        .backends(vec![Box::new(GifBackend::new())])
        .sink(Box::new(sink.clone()))
        .build()
        .unwrap()
}

// ==================== Scenario: Transparent Capture ====================

#[test]
fn test_transparent_capture_never_fills_background() {
    let mut config = small_config();
    config.render.background_type = BackgroundType::Black;
    let live = RecordingSurface::new(config.width, config.height);
    let live_log = live.log();
    let (factory, capture_logs) = recording_factory();
    let sink = MemorySink::new();

    let mut visualizer = Visualizer::builder(config)
        .surface(Box::new(live))
        .capture_surfaces(factory)
        .backends(vec![Box::new(GifBackend::new())])
        .sink(Box::new(sink.clone()))
        .build()
        .unwrap();
    visualizer.load_input(beat_input(0.25)).unwrap();
    visualizer.download_video(true).unwrap();
    assert_eq!(visualizer.recording_status(), &RecordingStatus::Recording);

    for _ in 0..40 {
        visualizer.on_frame();
    }

    let capture_log = capture_logs.borrow()[0].clone();
    assert_eq!(capture_log.count(|c| c.is_full_fill(96, 64)), 0);
    assert!(capture_log.count(|c| *c == DrawCommand::Clear) > 0);
    // The live surface keeps its solid background
    assert!(live_log.count(|c| c.is_full_fill(96, 64)) > 0);

    let artifacts = sink.artifacts();
    assert_eq!(artifacts.len(), 1);
    assert!(artifacts[0].transparent);
    assert_eq!(artifacts[0].bitrate, 10_000_000);
    assert_eq!(artifacts[0].codec, VideoCodec::Gif);
    assert!(artifacts[0].file_name.starts_with("music-visualizer-transparent-"));
}

#[test]
fn test_opaque_capture_uses_standard_bitrate() {
    let sink = MemorySink::new();
    let mut visualizer = gif_visualizer(small_config(), &sink);
    visualizer.load_input(beat_input(1.0)).unwrap();
    visualizer.download_video(false).unwrap();
    for _ in 0..5 {
        visualizer.on_frame();
    }

    let artifact = visualizer.stop_recording().unwrap().unwrap();
    assert!(!artifact.transparent);
    assert_eq!(artifact.bitrate, 8_000_000);
    assert_eq!(artifact.frames, 5);
    assert_eq!(&artifact.bytes[..6], b"GIF89a");
    assert_eq!(
        visualizer.recording_status().to_string(),
        "Video saved as GIF (8 Mbps)"
    );
}

#[test]
fn test_status_line_shows_recording_while_capturing() {
    let sink = MemorySink::new();
    let mut visualizer = gif_visualizer(small_config(), &sink);
    visualizer.load_input(beat_input(1.0)).unwrap();
    assert_eq!(visualizer.status_line(), "Ready: press play");

    visualizer.download_video(false).unwrap();
    visualizer.on_frame();
    assert_eq!(visualizer.status(), &Status::Playing);
    assert_eq!(visualizer.status_line(), "Recording... (plays the whole track)");

    visualizer.stop_recording().unwrap();
    assert_eq!(visualizer.status_line(), "Playing");
}

// ==================== Scenario: Playback Ends While Recording ====================

#[test]
fn test_track_end_finalizes_exactly_once() {
    let sink = MemorySink::new();
    let mut visualizer = gif_visualizer(small_config(), &sink);
    visualizer.load_input(beat_input(0.2)).unwrap();
    visualizer.download_video(false).unwrap();
    assert_eq!(visualizer.recorder().state(), CaptureState::Recording);

    for _ in 0..60 {
        visualizer.on_frame();
    }

    assert_eq!(sink.len(), 1);
    assert_eq!(visualizer.recorder().state(), CaptureState::Idle);
    assert!(matches!(visualizer.recording_status(), RecordingStatus::Completed { .. }));
    assert_eq!(visualizer.status(), &Status::Ended);
    assert_eq!(visualizer.last_artifact().map(|a| a.frames), Some(sink.artifacts()[0].frames));

    assert!(visualizer.stop_recording().unwrap().is_none());
    assert_eq!(sink.len(), 1);
}

#[test]
fn test_recording_rewinds_and_starts_playback() {
    let sink = MemorySink::new();
    let mut visualizer = gif_visualizer(small_config(), &sink);
    visualizer.load_input(beat_input(1.0)).unwrap();
    visualizer.play().unwrap();
    for _ in 0..20 {
        visualizer.on_frame();
    }
    visualizer.pause();

    visualizer.download_video(false).unwrap();
    assert_eq!(visualizer.playback().state(), PlaybackState::Playing);
    assert_eq!(visualizer.status(), &Status::Playing);
    assert!(visualizer.engine().is_running());
}

#[test]
fn test_stopping_playback_finalizes_recording() {
    let sink = MemorySink::new();
    let mut visualizer = gif_visualizer(small_config(), &sink);
    visualizer.load_input(beat_input(1.0)).unwrap();
    visualizer.download_video(false).unwrap();
    visualizer.on_frame();

    visualizer.stop();
    assert_eq!(sink.len(), 1);
    assert_eq!(visualizer.recorder().state(), CaptureState::Idle);
}

#[test]
fn test_pause_suspends_capture_ticks() {
    let sink = MemorySink::new();
    let mut visualizer = gif_visualizer(small_config(), &sink);
    visualizer.load_input(beat_input(1.0)).unwrap();
    visualizer.download_video(false).unwrap();
    for _ in 0..3 {
        visualizer.on_frame();
    }
    visualizer.pause();
    for _ in 0..3 {
        visualizer.on_frame();
    }
    assert_eq!(visualizer.recorder().session().map(|s| s.frames()), Some(3));
    assert!(visualizer.recorder().is_recording());
}

// ==================== Preconditions ====================

#[test]
fn test_capture_without_input_is_a_precondition_failure() {
    let sink = MemorySink::new();
    let mut visualizer = gif_visualizer(small_config(), &sink);
    let err = visualizer.download_video(false).unwrap_err();
    assert!(matches!(err, VisualizerError::Precondition(_)));
    assert_eq!(visualizer.recorder().state(), CaptureState::Idle);
    assert!(sink.is_empty());
}

#[test]
fn test_second_start_creates_no_encoder() {
    let started = Rc::new(Cell::new(0));
    let backend = CountingBackend {
        inner: GifBackend::new(),
        started: Rc::clone(&started),
    };
    let mut visualizer = Visualizer::builder(small_config())
        .backends(vec![Box::new(backend)])
        .build()
        .unwrap();
    visualizer.load_input(beat_input(1.0)).unwrap();

    visualizer.download_video(false).unwrap();
    let err = visualizer.download_video(true).unwrap_err();
    assert!(matches!(err, VisualizerError::Capture(CaptureError::AlreadyRecording)));
    assert_eq!(started.get(), 1);
    assert!(visualizer.recorder().is_recording());
    assert!(!visualizer.recorder().session().unwrap().transparent());
}

#[test]
fn test_no_backend_reports_encoder_unavailable() {
    let mut visualizer = Visualizer::builder(small_config()).backends(vec![]).build().unwrap();
    visualizer.load_input(beat_input(1.0)).unwrap();

    let err = visualizer.download_video(true).unwrap_err();
    match err {
        VisualizerError::EncoderUnavailable(tried) => {
            assert_eq!(tried, vec![VideoCodec::Vp9, VideoCodec::ProRes4444, VideoCodec::Gif]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(matches!(visualizer.recording_status(), RecordingStatus::Failed(_)));
    assert_eq!(visualizer.recorder().state(), CaptureState::Idle);
    assert_eq!(visualizer.playback().state(), PlaybackState::Stopped);
}

// ==================== Artifacts ====================

#[test]
fn test_artifact_names() {
    assert_eq!(artifact_file_name(false, 1700000000000, "mp4"), "music-visualizer-1700000000000.mp4");
    assert_eq!(
        artifact_file_name(true, 1700000000000, "webm"),
        "music-visualizer-transparent-1700000000000.webm"
    );
}

#[test]
fn test_directory_sink_writes_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let sink = DirectorySink::new(dir.path().join("exports"));
    let mut visualizer = Visualizer::builder(small_config())
        .backends(vec![Box::new(GifBackend::new())])
        .sink(Box::new(sink.clone()))
        .build()
        .unwrap();
    visualizer.load_input(beat_input(1.0)).unwrap();
    visualizer.download_video(false).unwrap();
    for _ in 0..3 {
        visualizer.on_frame();
    }
    let artifact = visualizer.stop_recording().unwrap().unwrap();

    let written = sink.written();
    assert_eq!(written.len(), 1);
    assert!(written[0].ends_with(&artifact.file_name));
    let bytes = std::fs::read(&written[0]).unwrap();
    assert_eq!(bytes, artifact.bytes);

    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (96, 64));
}

// ==================== Live And Capture Consistency ====================

fn assert_loops_share_frames(share_mode_state: bool) {
    let mut config = small_config();
    config.capture.share_mode_state_during_capture = share_mode_state;
    let track = Track::new(
        music_visualizer::audio::generate_test_beat(120.0, common::SAMPLE_RATE, 1.0),
        common::SAMPLE_RATE,
    );
    let pulls = Rc::new(RefCell::new(Vec::new()));
    let source = TappedSource {
        inner: TrackAnalysisSource::new(track.clone(), AnalysisConfig::default()).unwrap(),
        pulls: Rc::clone(&pulls),
    };
    let live = RecordingSurface::new(config.width, config.height);
    let live_log = live.log();
    let (factory, capture_logs) = recording_factory();

    let mut visualizer = Visualizer::builder(config)
        .surface(Box::new(live))
        .capture_surfaces(factory)
        .playback(Box::new(SimulatedPlayback::with_track(track)))
        .source(Rc::new(RefCell::new(source)))
        .backends(vec![Box::new(GifBackend::new())])
        .sink(Box::new(MemorySink::new()))
        .build()
        .unwrap();
    visualizer.download_video(false).unwrap();
    for _ in 0..20 {
        visualizer.on_frame();
    }

    let pulls = pulls.borrow();
    let mut paired = 0;
    for pair in pulls.windows(2) {
        if pair[0].0 == pair[1].0 {
            assert_eq!(pair[0].1, pair[1].1, "loops saw different frames at sample {}", pair[0].0);
            paired += 1;
        }
    }
    assert!(paired >= 15, "only {paired} ticks pulled by both loops");

    // Bars keep no state, so both surfaces receive the same drawing
    let capture_log = capture_logs.borrow()[0].clone();
    assert_eq!(live_log.take(), capture_log.take());
}

#[test]
fn test_capture_sees_live_frames_with_forked_mode_state() {
    assert_loops_share_frames(false);
}

#[test]
fn test_capture_sees_live_frames_with_shared_mode_state() {
    assert_loops_share_frames(true);
}
