//! The live render loop.
//!
//! This module provides:
//! - `VisualizationEngine`: the `Idle`/`Running` tick loop over the live surface
//! - `render_frame`: the dispatch path shared with the capture loop
//! - `FrameScheduler`: the cancellable periodic task both loops run on
//! - Background painting with trail persistence

pub mod background;
pub mod scheduler;

pub use background::{paint_background, TRAIL_ALPHA};
pub use scheduler::{FrameScheduler, FrameTick, TaskHandle, DEFAULT_REFRESH_RATE};

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, info, trace};

use crate::audio::{AnalysisSource, FrequencyFrame};
use crate::color::ThemeCatalog;
use crate::modes::{ModeContext, ModeKind, ModeRegistry, RenderParameters};
use crate::playback::PlaybackEvent;
use crate::render::Surface;

/// Analysis source shared by the live and capture loops.
pub type SharedSource = Rc<RefCell<dyn AnalysisSource>>;

/// Mode state store, shareable between loops.
pub type SharedRegistry = Rc<RefCell<ModeRegistry>>;

/// Configuration read by every tick.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub params: RenderParameters,
    pub themes: ThemeCatalog,
}

impl Scene {
    pub fn new(params: RenderParameters, themes: ThemeCatalog) -> Self {
        Self { params, themes }
    }

    pub fn context(&self, time: f32) -> ModeContext<'_> {
        ModeContext::new(&self.params, &self.themes, time)
    }
}

/// Paint the background, then dispatch `frame` to the active mode.
///
/// Both the live loop and the capture loop draw through here.
pub fn render_frame(
    scene: &Scene,
    registry: &mut ModeRegistry,
    frame: &FrequencyFrame,
    surface: &mut dyn Surface,
    time: f32,
    force_transparent: bool,
) {
    paint_background(&scene.params, surface, force_transparent);
    let ctx = scene.context(time);
    registry.render(scene.params.mode, frame, &ctx, surface);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineState {
    #[default]
    Idle,
    Running,
}

/// Drives the live surface while playback runs.
pub struct VisualizationEngine {
    surface: Box<dyn Surface>,
    source: SharedSource,
    registry: SharedRegistry,
    scheduler: FrameScheduler,
    task: Option<TaskHandle>,
}

impl VisualizationEngine {
    pub fn new(surface: Box<dyn Surface>, source: SharedSource, seed: u64) -> Self {
        Self::with_registry(surface, source, Rc::new(RefCell::new(ModeRegistry::new(seed))))
    }

    pub fn with_registry(surface: Box<dyn Surface>, source: SharedSource, registry: SharedRegistry) -> Self {
        Self {
            surface,
            source,
            registry,
            scheduler: FrameScheduler::default(),
            task: None,
        }
    }

    pub fn with_refresh_rate(mut self, refresh_rate: u32) -> Self {
        self.scheduler = FrameScheduler::new(refresh_rate);
        self
    }

    pub fn state(&self) -> EngineState {
        if self.task.is_some() {
            EngineState::Running
        } else {
            EngineState::Idle
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Enter `Running`. Starting a running engine changes nothing.
    pub fn start(&mut self) {
        if self.task.is_none() {
            self.task = Some(self.scheduler.request());
            info!("visualization started");
        }
    }

    /// Enter `Idle` and cancel the pending tick. Idempotent.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            self.scheduler.cancel(task);
            info!("visualization stopped after {} ticks", self.scheduler.ticks());
        }
    }

    /// React to a playback transition.
    pub fn handle_event(&mut self, event: PlaybackEvent) {
        match event {
            PlaybackEvent::Playing => self.start(),
            PlaybackEvent::Paused | PlaybackEvent::Stopped | PlaybackEvent::Ended => self.stop(),
            PlaybackEvent::Loaded => {}
        }
    }

    /// Run one tick. Returns whether anything was drawn.
    ///
    /// Does nothing while idle or while the source has no frame.
    pub fn tick(&mut self, scene: &Scene) -> bool {
        if self.task.is_none() {
            return false;
        }
        let Some(tick) = self.scheduler.advance() else {
            return false;
        };
        let Some(frame) = self.source.borrow_mut().frame() else {
            trace!("tick {}: analysis source not ready", tick.index);
            return false;
        };

        render_frame(
            scene,
            &mut self.registry.borrow_mut(),
            &frame,
            self.surface.as_mut(),
            tick.time,
            false,
        );
        true
    }

    /// Note a mode switch. Modes that start fresh on selection lose their state.
    pub fn select_mode(&mut self, kind: ModeKind) {
        if kind.resets_on_select() && self.registry.borrow_mut().reset(kind) {
            debug!("reset state for mode '{}'", kind);
        }
    }

    pub fn surface(&self) -> &dyn Surface {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> &mut dyn Surface {
        self.surface.as_mut()
    }

    pub fn registry(&self) -> SharedRegistry {
        Rc::clone(&self.registry)
    }

    pub fn source(&self) -> SharedSource {
        Rc::clone(&self.source)
    }

    /// Pull frames from `source` from the next tick on.
    pub fn set_source(&mut self, source: SharedSource) {
        self.source = source;
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }
}
