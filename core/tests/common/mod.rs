//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use music_visualizer::audio::generate_test_beat;
use music_visualizer::capture::SurfaceFactory;
use music_visualizer::pipeline::{InputSource, VisualizerConfig};
use music_visualizer::render::{CommandLog, RecordingSurface};
use music_visualizer::{FrequencyFrame, ScriptedSource, SharedSource};

pub const SAMPLE_RATE: u32 = 8000;

/// A short beat clip, long enough for a couple dozen ticks at 60 Hz.
pub fn beat_input(seconds: f32) -> InputSource {
    InputSource::new(
        "beat.wav",
        "audio/wav",
        generate_test_beat(120.0, SAMPLE_RATE, seconds),
        SAMPLE_RATE,
    )
}

pub fn small_config() -> VisualizerConfig {
    VisualizerConfig {
        width: 96,
        height: 64,
        ..Default::default()
    }
}

pub fn constant_source(value: u8) -> SharedSource {
    Rc::new(RefCell::new(ScriptedSource::constant(
        FrequencyFrame::filled(256, value).unwrap(),
    )))
}

/// A capture surface factory producing recording surfaces, plus the logs
/// of every surface it created.
pub fn recording_factory() -> (SurfaceFactory, Rc<RefCell<Vec<CommandLog>>>) {
    let logs: Rc<RefCell<Vec<CommandLog>>> = Rc::default();
    let created = Rc::clone(&logs);
    let factory: SurfaceFactory = Box::new(move |width, height| {
        let surface = RecordingSurface::new(width, height);
        created.borrow_mut().push(surface.log());
        Box::new(surface)
    });
    (factory, logs)
}
