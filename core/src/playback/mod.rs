//! Playback lifecycle boundary.
//!
//! The engine never owns playback. It reacts to [`PlaybackEvent`]s and asks a
//! [`Playback`] implementation to play, pause, stop or rewind.

mod status;

pub use status::{RecordingStatus, Status};

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use log::{debug, info};

/// Errors reported by a playback backend.
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("no track loaded")]
    NoTrack,
    #[error("playback device error: {0}")]
    Device(String),
}

/// Lifecycle transitions observed by the engine and the recorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    Loaded,
    Playing,
    Paused,
    Stopped,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Empty,
    Stopped,
    Playing,
    Paused,
    Ended,
}

/// Transport controls plus an event queue.
pub trait Playback {
    /// Replace the current track. Any running playback stops.
    fn load(&mut self, track: Track);

    fn play(&mut self) -> Result<(), PlaybackError>;
    fn pause(&mut self);
    fn stop(&mut self);
    fn seek_to_start(&mut self);
    fn state(&self) -> PlaybackState;

    /// Drain transitions since the last call, oldest first.
    fn poll_events(&mut self) -> Vec<PlaybackEvent>;

    /// Move the playback clock forward. Backends with their own clock ignore it.
    fn advance(&mut self, _elapsed: Duration) {}

    fn is_playing(&self) -> bool {
        self.state() == PlaybackState::Playing
    }
}

/// Mono samples with a shared playback cursor.
///
/// Clones share the cursor, so an analysis source and a playback backend can
/// observe the same position without owning each other.
#[derive(Debug, Clone)]
pub struct Track {
    samples: Rc<[f32]>,
    sample_rate: u32,
    cursor: Rc<Cell<usize>>,
}

impl Track {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples: samples.into(),
            sample_rate: sample_rate.max(1),
            cursor: Rc::new(Cell::new(0)),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }

    pub fn position(&self) -> usize {
        self.cursor.get()
    }

    pub fn seek(&self, position: usize) {
        self.cursor.set(position.min(self.samples.len()));
    }

    /// Move the cursor forward. Returns `true` once the end is reached.
    pub fn advance(&self, samples: usize) -> bool {
        let next = self.cursor.get().saturating_add(samples).min(self.samples.len());
        self.cursor.set(next);
        self.is_at_end()
    }

    pub fn is_at_end(&self) -> bool {
        self.cursor.get() >= self.samples.len()
    }

    /// Up to `len` samples ending at the cursor.
    pub fn window(&self, len: usize) -> &[f32] {
        let end = self.cursor.get().min(self.samples.len());
        &self.samples[end.saturating_sub(len)..end]
    }
}

/// An in-process player driven by the frame clock.
#[derive(Debug, Default)]
pub struct SimulatedPlayback {
    track: Option<Track>,
    state: PlaybackState,
    events: VecDeque<PlaybackEvent>,
    carry: f64,
}

impl SimulatedPlayback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_track(track: Track) -> Self {
        let mut playback = Self::new();
        playback.load(track);
        playback
    }

    pub fn track(&self) -> Option<&Track> {
        self.track.as_ref()
    }

    fn transition(&mut self, state: PlaybackState, event: PlaybackEvent) {
        if self.state != state {
            debug!("playback {:?} -> {:?}", self.state, state);
            self.state = state;
            self.events.push_back(event);
        }
    }
}

impl Playback for SimulatedPlayback {
    fn load(&mut self, track: Track) {
        track.seek(0);
        info!("track loaded: {:.2}s @ {} Hz", track.duration().as_secs_f32(), track.sample_rate());
        self.track = Some(track);
        self.state = PlaybackState::Stopped;
        self.carry = 0.0;
        self.events.push_back(PlaybackEvent::Loaded);
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        let track = self.track.as_ref().ok_or(PlaybackError::NoTrack)?;
        if track.is_at_end() {
            track.seek(0);
        }
        self.transition(PlaybackState::Playing, PlaybackEvent::Playing);
        Ok(())
    }

    fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.transition(PlaybackState::Paused, PlaybackEvent::Paused);
        }
    }

    fn stop(&mut self) {
        if let Some(track) = &self.track {
            track.seek(0);
            self.carry = 0.0;
            self.transition(PlaybackState::Stopped, PlaybackEvent::Stopped);
        }
    }

    fn seek_to_start(&mut self) {
        if let Some(track) = &self.track {
            track.seek(0);
            self.carry = 0.0;
        }
    }

    fn state(&self) -> PlaybackState {
        self.state
    }

    fn poll_events(&mut self) -> Vec<PlaybackEvent> {
        self.events.drain(..).collect()
    }

    fn advance(&mut self, elapsed: Duration) {
        if self.state != PlaybackState::Playing {
            return;
        }
        let Some(track) = &self.track else { return };
        let exact = elapsed.as_secs_f64() * track.sample_rate() as f64 + self.carry;
        let whole = exact.floor();
        self.carry = exact - whole;
        if track.advance(whole as usize) {
            self.transition(PlaybackState::Ended, PlaybackEvent::Ended);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(seconds: f32) -> Track {
        Track::new(vec![0.0; (seconds * 1000.0) as usize], 1000)
    }

    #[test]
    fn test_play_without_track_fails() {
        let mut playback = SimulatedPlayback::new();
        assert!(matches!(playback.play(), Err(PlaybackError::NoTrack)));
        assert_eq!(playback.state(), PlaybackState::Empty);
    }

    #[test]
    fn test_lifecycle_events_in_order() {
        let mut playback = SimulatedPlayback::with_track(track(1.0));
        playback.play().unwrap();
        playback.pause();
        playback.pause();
        playback.stop();
        assert_eq!(
            playback.poll_events(),
            vec![
                PlaybackEvent::Loaded,
                PlaybackEvent::Playing,
                PlaybackEvent::Paused,
                PlaybackEvent::Stopped
            ]
        );
        assert!(playback.poll_events().is_empty());
    }

    #[test]
    fn test_advance_reaches_end() {
        let t = track(0.1);
        let mut playback = SimulatedPlayback::with_track(t.clone());
        playback.play().unwrap();
        playback.poll_events();

        playback.advance(Duration::from_millis(60));
        assert_eq!(t.position(), 60);
        assert!(playback.is_playing());

        playback.advance(Duration::from_millis(60));
        assert!(t.is_at_end());
        assert_eq!(playback.state(), PlaybackState::Ended);
        assert_eq!(playback.poll_events(), vec![PlaybackEvent::Ended]);

        playback.play().unwrap();
        assert_eq!(t.position(), 0);
    }

    #[test]
    fn test_paused_clock_does_not_move() {
        let t = track(1.0);
        let mut playback = SimulatedPlayback::with_track(t.clone());
        playback.advance(Duration::from_millis(500));
        assert_eq!(t.position(), 0);
    }

    #[test]
    fn test_window_ends_at_cursor() {
        let t = Track::new((0..10).map(|i| i as f32).collect(), 10);
        assert!(t.window(4).is_empty());
        t.advance(6);
        assert_eq!(t.window(4), &[2.0, 3.0, 4.0, 5.0]);
        assert_eq!(t.window(100).len(), 6);
    }
}
