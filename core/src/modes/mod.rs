//! Render modes.
//!
//! Every mode turns one frequency frame plus the current parameters into
//! draw calls on a surface. Persistent simulation memory (particles, boids,
//! glyph columns) lives inside the mode value itself, and a [`ModeRegistry`]
//! owns one lazily created value per mode kind.
//!
//! Mode families:
//! - Bars: bar, spectrum, mirror, grid
//! - Lines: wave, spiral, dna, soundwave, flower
//! - Radial: circle, tunnel, ripple, kaleido, wormhole, prism, galaxyspiral
//! - Particles: particle, fluid, flock, fireworks
//! - Orbits: planet, atom, crystal, cube, starfield
//! - Fields: voronoi, waveinterference, fractals, membrane, hexagon, aurora2
//! - Electric: lightning, tesla, quantum
//! - Networks: neural, matrixrain

mod bars;
mod electric;
mod fields;
mod lines;
mod networks;
mod orbits;
mod particles;
mod radial;

pub mod params;
pub mod registry;

pub use params::{BackgroundType, ParameterError, RenderParameters};
pub use registry::{create_mode, ModeRegistry};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::audio::FrequencyFrame;
use crate::color::{Palette, Rgb, Rgba, ThemeCatalog};
use crate::render::{Paint, Path, Point, Stroke, Surface};

#[derive(Debug, thiserror::Error)]
pub enum ModeError {
    #[error("unknown render mode '{0}'")]
    UnknownMode(String),
}

/// Closed set of render modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ModeKind {
    #[default]
    Bar,
    Wave,
    Circle,
    Particle,
    Spectrum,
    Spiral,
    Mirror,
    Dna,
    Flower,
    Tunnel,
    Grid,
    Starfield,
    Kaleido,
    Lightning,
    Ripple,
    Cube,
    Wormhole,
    MatrixRain,
    Soundwave,
    Planet,
    Neural,
    Prism,
    Voronoi,
    Crystal,
    Fluid,
    GalaxySpiral,
    Membrane,
    Quantum,
    Fractals,
    WaveInterference,
    Fireworks,
    Aurora2,
    Atom,
    Flock,
    Tesla,
    Hexagon,
}

impl ModeKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bar => "bar",
            Self::Wave => "wave",
            Self::Circle => "circle",
            Self::Particle => "particle",
            Self::Spectrum => "spectrum",
            Self::Spiral => "spiral",
            Self::Mirror => "mirror",
            Self::Dna => "dna",
            Self::Flower => "flower",
            Self::Tunnel => "tunnel",
            Self::Grid => "grid",
            Self::Starfield => "starfield",
            Self::Kaleido => "kaleido",
            Self::Lightning => "lightning",
            Self::Ripple => "ripple",
            Self::Cube => "cube",
            Self::Wormhole => "wormhole",
            Self::MatrixRain => "matrixrain",
            Self::Soundwave => "soundwave",
            Self::Planet => "planet",
            Self::Neural => "neural",
            Self::Prism => "prism",
            Self::Voronoi => "voronoi",
            Self::Crystal => "crystal",
            Self::Fluid => "fluid",
            Self::GalaxySpiral => "galaxyspiral",
            Self::Membrane => "membrane",
            Self::Quantum => "quantum",
            Self::Fractals => "fractals",
            Self::WaveInterference => "waveinterference",
            Self::Fireworks => "fireworks",
            Self::Aurora2 => "aurora2",
            Self::Atom => "atom",
            Self::Flock => "flock",
            Self::Tesla => "tesla",
            Self::Hexagon => "hexagon",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Bar => "Gradient bars rising from the bottom edge",
            Self::Wave => "Three offset waveform layers",
            Self::Circle => "Radial bars on three concentric rings",
            Self::Particle => "Bouncing particles driven by overall loudness",
            Self::Spectrum => "Symmetric spectrum bars",
            Self::Spiral => "Three spirals unwinding with the signal",
            Self::Mirror => "Bars mirrored around the horizontal center",
            Self::Dna => "Double helix with base-pair rungs",
            Self::Flower => "Eight petals traced by the spectrum",
            Self::Tunnel => "Pulsing concentric rings",
            Self::Grid => "Grid of squares sized by intensity",
            Self::Starfield => "Rotating constellations",
            Self::Kaleido => "Mirrored ring segments",
            Self::Lightning => "Random bolts striking from the top edge",
            Self::Ripple => "Ripples spreading from the center",
            Self::Cube => "Rotating wireframe cube",
            Self::Wormhole => "Layered rotating wormhole rings",
            Self::MatrixRain => "Falling glyph columns",
            Self::Soundwave => "Stacked perspective sound waves",
            Self::Planet => "Planets and moons on orbits",
            Self::Neural => "Pulsing network of connected nodes",
            Self::Prism => "Light rays dispersed through a prism",
            Self::Voronoi => "Voronoi cells lit by their band",
            Self::Crystal => "Orbiting faceted crystals",
            Self::Fluid => "Damped fluid particles with viscous links",
            Self::GalaxySpiral => "Four-armed spiral galaxy",
            Self::Membrane => "Undulating triangulated membrane",
            Self::Quantum => "Probability clouds and entangled pairs",
            Self::Fractals => "Orbiting escape-time fractals",
            Self::WaveInterference => "Interference field of moving wave sources",
            Self::Fireworks => "Bursts of sparks for loud bands",
            Self::Aurora2 => "Layered aurora curtains",
            Self::Atom => "Nucleus with orbiting electrons",
            Self::Flock => "Flocking boids",
            Self::Tesla => "Tesla coils throwing arcs",
            Self::Hexagon => "Rotating hexagon tiling",
        }
    }

    /// Whether selecting this mode discards its previous state.
    pub fn resets_on_select(&self) -> bool {
        matches!(self, Self::Particle)
    }

    pub fn all() -> &'static [Self] {
        &[
            Self::Bar,
            Self::Wave,
            Self::Circle,
            Self::Particle,
            Self::Spectrum,
            Self::Spiral,
            Self::Mirror,
            Self::Dna,
            Self::Flower,
            Self::Tunnel,
            Self::Grid,
            Self::Starfield,
            Self::Kaleido,
            Self::Lightning,
            Self::Ripple,
            Self::Cube,
            Self::Wormhole,
            Self::MatrixRain,
            Self::Soundwave,
            Self::Planet,
            Self::Neural,
            Self::Prism,
            Self::Voronoi,
            Self::Crystal,
            Self::Fluid,
            Self::GalaxySpiral,
            Self::Membrane,
            Self::Quantum,
            Self::Fractals,
            Self::WaveInterference,
            Self::Fireworks,
            Self::Aurora2,
            Self::Atom,
            Self::Flock,
            Self::Tesla,
            Self::Hexagon,
        ]
    }
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModeKind {
    type Err = ModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.name() == key)
            .ok_or_else(|| ModeError::UnknownMode(s.to_string()))
    }
}

impl TryFrom<String> for ModeKind {
    type Error = ModeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Read-only inputs shared by every mode on one tick.
pub struct ModeContext<'a> {
    pub params: &'a RenderParameters,
    pub themes: &'a ThemeCatalog,
    /// Seconds on the tick clock.
    pub time: f32,
}

impl<'a> ModeContext<'a> {
    pub fn new(params: &'a RenderParameters, themes: &'a ThemeCatalog, time: f32) -> Self {
        Self { params, themes, time }
    }

    pub fn palette(&self) -> &'a Palette {
        self.themes.palette(&self.params.color_theme)
    }

    /// Intensity-driven color.
    pub fn color(&self, t: f32) -> Rgb {
        self.palette().interpolate(t)
    }

    /// Layer-driven color.
    pub fn layer(&self, index: usize) -> Rgb {
        self.palette().layer(index)
    }

    /// Position-driven color that wraps from the last palette entry back to
    /// the first, for elements laid out around a full turn.
    pub fn wheel(&self, t: f32) -> Rgb {
        let palette = self.palette();
        let k = t.rem_euclid(1.0) * palette.len() as f32;
        let i = k.floor() as usize;
        palette.layer(i).lerp(palette.layer(i + 1), k.fract())
    }

    /// Layer color for element `index` of `count`, spreading the palette
    /// evenly over the elements.
    pub fn spread(&self, index: usize, count: usize) -> Rgb {
        let len = self.palette().len();
        self.layer(index * len / count.max(1))
    }

    pub fn sensitivity(&self) -> f32 {
        self.params.sensitivity
    }

    pub fn line_width(&self) -> f32 {
        self.params.line_width
    }
}

/// One rendering algorithm plus its private state.
pub trait RenderMode {
    fn kind(&self) -> ModeKind;

    fn render(&mut self, frame: &FrequencyFrame, ctx: &ModeContext<'_>, surface: &mut dyn Surface);

    /// Number of persistent elements kept between ticks.
    fn state_len(&self) -> usize {
        0
    }

    /// Positions of persistent elements, in surface coordinates.
    fn state_points(&self) -> Vec<Point> {
        Vec::new()
    }
}

// Small drawing helpers shared by the mode families.

pub(crate) fn fill_circle(surface: &mut dyn Surface, center: Point, radius: f32, color: Rgba) {
    if radius > 0.0 && color.alpha() > 0.0 {
        surface.fill_path(&Path::circle(center, radius), &Paint::solid(color));
    }
}

pub(crate) fn stroke_circle(surface: &mut dyn Surface, center: Point, radius: f32, color: Rgba, width: f32) {
    if radius > 0.0 && width > 0.0 && color.alpha() > 0.0 {
        surface.stroke_path(&Path::circle(center, radius), &Paint::solid(color), &Stroke::new(width));
    }
}

pub(crate) fn stroke_line(surface: &mut dyn Surface, from: Point, to: Point, color: Rgba, width: f32) {
    if width > 0.0 && color.alpha() > 0.0 {
        surface.stroke_path(&Path::line(from, to), &Paint::solid(color), &Stroke::new(width));
    }
}
