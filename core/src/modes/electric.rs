//! Randomized discharge modes. Their only state is a seeded random stream,
//! so two instances created from the same seed draw the same sequence.

use std::f32::consts::{PI, TAU};

use rand::rngs::StdRng;
use rand::Rng;

use super::{fill_circle, stroke_circle, ModeContext, ModeKind, RenderMode};
use crate::audio::FrequencyFrame;
use crate::color::Rgb;
use crate::render::{Paint, Path, Point, Stroke, Surface};

/// Random in `[-0.5, 0.5)`.
fn jitter(rng: &mut StdRng) -> f32 {
    rng.gen::<f32>() - 0.5
}

/// Bolts striking down from the top edge, one per loud band.
pub struct LightningMode {
    rng: StdRng,
}

const LIGHTNING_BOLTS: usize = 5;

impl LightningMode {
    pub fn new(rng: StdRng) -> Self {
        Self { rng }
    }
}

impl RenderMode for LightningMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Lightning
    }

    fn render(&mut self, frame: &FrequencyFrame, ctx: &ModeContext<'_>, surface: &mut dyn Surface) {
        let width = surface.width() as f32;
        let height = surface.height() as f32;

        for bolt in 0..LIGHTNING_BOLTS {
            // Drawn before the level check so quiet bolts still advance the stream
            let start_x = self.rng.gen::<f32>() * width;
            let intensity = frame.band_average(bolt, LIGHTNING_BOLTS, ctx.sensitivity());
            if intensity < 0.3 {
                continue;
            }

            let mut at = Point::new(start_x, 0.0);
            let mut points = vec![at];
            while at.y < height {
                at.y += 20.0 + self.rng.gen::<f32>() * 40.0;
                at.x += jitter(&mut self.rng) * 60.0 * intensity;
                points.push(at);
            }

            let color = ctx.layer(bolt);
            let paint = Paint::solid(color.with_alpha(intensity)).with_glow(20.0, color);
            surface.stroke_path(&Path::polyline(&points, false), &paint, &Stroke::round(ctx.line_width() * intensity * 3.0));
        }
    }
}

/// Four coils on a ring throwing zigzag arcs, with arcs jumping between
/// loud neighbours.
pub struct TeslaMode {
    rng: StdRng,
}

const TESLA_COILS: usize = 4;
const TESLA_SEGMENTS: usize = 10;

impl TeslaMode {
    pub fn new(rng: StdRng) -> Self {
        Self { rng }
    }
}

impl RenderMode for TeslaMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Tesla
    }

    fn render(&mut self, frame: &FrequencyFrame, ctx: &ModeContext<'_>, surface: &mut dyn Surface) {
        let center = surface.center();
        let n = frame.len();
        let coil_at = |coil: usize| center.polar(coil as f32 * TAU / TESLA_COILS as f32, 200.0);
        let coil_level = |coil: usize| frame.intensity(coil * n / 8, ctx.sensitivity());

        for coil in 0..TESLA_COILS {
            let base = coil_at(coil);
            let intensity = coil_level(coil);
            let color = ctx.layer(coil);
            fill_circle(surface, base, 15.0, color.with_alpha(0.6));

            if intensity <= 0.4 {
                continue;
            }

            let bolts = (intensity * 8.0).floor() as usize + 3;
            let reach = intensity * 300.0 + 50.0;
            for _ in 0..bolts {
                let angle = self.rng.gen::<f32>() * TAU;
                let width = self.rng.gen::<f32>() * 3.0 + 1.0;
                let points: Vec<Point> = (0..TESLA_SEGMENTS)
                    .map(|seg| {
                        let target = base.polar(angle, reach * seg as f32 / TESLA_SEGMENTS as f32);
                        target + Point::new(jitter(&mut self.rng) * 40.0, jitter(&mut self.rng) * 40.0)
                    })
                    .collect();

                surface.stroke_path(
                    &Path::polyline(&points, false),
                    &Paint::solid(color.lighten(100).with_alpha(intensity)),
                    &Stroke::new(width),
                );
                if let Some(&tip) = points.last() {
                    fill_circle(surface, tip, intensity * 5.0, Rgb::WHITE.with_alpha(intensity * 0.8));
                }
            }

            for other in (coil + 1)..TESLA_COILS {
                let other_level = coil_level(other);
                if intensity > 0.6 && other_level > 0.6 && self.rng.gen::<f32>() < 0.3 {
                    let target = coil_at(other);
                    let mid = base.lerp(target, 0.5) + Point::new(jitter(&mut self.rng) * 100.0, jitter(&mut self.rng) * 100.0);
                    let mut arc = Path::new();
                    arc.move_to(base);
                    arc.quad_to(mid, target);

                    let combined = intensity + other_level;
                    surface.stroke_path(&arc, &Paint::solid(color.with_alpha(combined * 0.4)), &Stroke::new(combined * 2.0));
                }
            }
        }
    }
}

/// Probability clouds around a breathing ring, plus entangled pairs.
pub struct QuantumMode {
    rng: StdRng,
}

const QUANTUM_POINTS: usize = 100;
const QUANTUM_PAIRS: usize = 5;

impl QuantumMode {
    pub fn new(rng: StdRng) -> Self {
        Self { rng }
    }
}

impl RenderMode for QuantumMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Quantum
    }

    fn render(&mut self, frame: &FrequencyFrame, ctx: &ModeContext<'_>, surface: &mut dyn Surface) {
        let center = surface.center();
        let n = frame.len();
        let time = ctx.time * 5.0;

        for point in 0..QUANTUM_POINTS {
            let intensity = frame.intensity(point % n, ctx.sensitivity());
            if intensity < 0.2 {
                continue;
            }

            let angle = point as f32 / QUANTUM_POINTS as f32 * TAU;
            let radius = 100.0 + (time * 3.0 + angle * 5.0).sin() * 150.0;
            let spread = intensity * 100.0;
            let at = center.polar(angle, radius)
                + Point::new(jitter(&mut self.rng) * spread, jitter(&mut self.rng) * spread);

            let color = ctx.color(intensity);
            let size = intensity * 20.0 + 5.0;
            let alpha = ((time * 2.0 + point as f32 * 0.3).sin() + 1.0) * 0.5 * intensity;

            fill_circle(surface, at, size * 0.3, color.with_alpha(alpha));
            fill_circle(surface, at, size, color.with_alpha(alpha * 0.2));

            if self.rng.gen::<f32>() < intensity * 0.5 {
                for ring in 1..=3 {
                    stroke_circle(surface, at, size * ring as f32, color.with_alpha(alpha * 0.3 / ring as f32), 1.0);
                }
            }
        }

        for pair in 0..QUANTUM_PAIRS {
            let a = frame.intensity(pair * 2, ctx.sensitivity());
            let b = frame.intensity(pair * 2 + 1, ctx.sensitivity());
            if a <= 0.5 || b <= 0.5 {
                continue;
            }

            let angle = time + pair as f32 * PI / 3.0;
            let avg = (a + b) / 2.0;
            surface.stroke_path(
                &Path::line(center.polar(angle, 200.0), center.polar(angle + PI, 200.0)),
                &Paint::solid(ctx.color(avg).with_alpha(avg * 0.5)),
                &Stroke::new(2.0).dashed(5.0, 5.0),
            );
        }
    }
}
