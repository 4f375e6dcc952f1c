//! Line-based modes: waveform layers, spirals, the double helix, stacked
//! sound waves and the flower.

use std::f32::consts::{PI, TAU};

use super::{ModeContext, ModeKind, RenderMode};
use crate::audio::FrequencyFrame;
use crate::render::{Paint, Path, Point, Stroke, Surface, Transform};

/// Three waveform layers offset vertically around the center line.
pub struct WaveMode;

impl RenderMode for WaveMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Wave
    }

    fn render(&mut self, frame: &FrequencyFrame, ctx: &ModeContext<'_>, surface: &mut dyn Surface) {
        let width = surface.width() as f32;
        let height = surface.height() as f32;
        let n = frame.len();
        let slice = width / n as f32;

        for layer in 0..3 {
            let offset = (layer as f32 - 1.0) * 40.0;
            let alpha = 0.8 - layer as f32 * 0.2;
            let points: Vec<Point> = (0..n)
                .map(|i| {
                    let v = frame.intensity(i, ctx.sensitivity());
                    Point::new(i as f32 * slice, v * height / 3.0 + height / 2.0 + offset)
                })
                .collect();

            surface.stroke_path(
                &Path::polyline(&points, false),
                &Paint::solid(ctx.layer(layer).with_alpha(alpha)),
                &Stroke::round(ctx.line_width() * 2.0 + layer as f32),
            );
        }
    }
}

/// Three interleaved spirals whose radius and pitch grow with each bin.
pub struct SpiralMode;

impl RenderMode for SpiralMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Spiral
    }

    fn render(&mut self, frame: &FrequencyFrame, ctx: &ModeContext<'_>, surface: &mut dyn Surface) {
        let center = surface.center();

        for spiral in 0..3 {
            let mut angle = spiral as f32 * TAU / 3.0;
            let mut radius = 0.0;
            let mut points = Vec::with_capacity(frame.len() + 1);
            points.push(center);

            for i in 0..frame.len() {
                let intensity = frame.intensity(i, ctx.sensitivity());
                radius += intensity * 2.0;
                angle += 0.1 + intensity * 0.1;
                points.push(center.polar(angle, radius));
            }

            surface.stroke_path(
                &Path::polyline(&points, false),
                &Paint::solid(ctx.layer(spiral).with_alpha(0.7 - spiral as f32 * 0.2)),
                &Stroke::round(ctx.line_width() * 2.0),
            );
        }
    }
}

/// Two sine strands running top to bottom, joined by rungs every tenth bin.
pub struct DnaMode;

impl RenderMode for DnaMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Dna
    }

    fn render(&mut self, frame: &FrequencyFrame, ctx: &ModeContext<'_>, surface: &mut dyn Surface) {
        let center_x = surface.width() as f32 / 2.0;
        let height = surface.height() as f32;
        let n = frame.len();

        for strand in 0..2 {
            let phase = strand as f32 * PI;
            let mut path = Path::new();

            for i in 0..n {
                let y = i as f32 / n as f32 * height;
                let amplitude = frame.intensity(i, ctx.sensitivity()) * 200.0;
                let x = center_x + (y * 0.01 + phase).sin() * amplitude;
                let p = Point::new(x, y);

                if i == 0 {
                    path.move_to(p);
                    continue;
                }
                path.line_to(p);

                // Rungs hang off the first strand
                if strand == 0 && i % 10 == 0 {
                    let other = center_x + (y * 0.01 + PI).sin() * amplitude;
                    path.move_to(p);
                    path.line_to(Point::new(other, y));
                    path.move_to(p);
                }
            }

            surface.stroke_path(
                &path,
                &Paint::solid(ctx.layer(strand).with_alpha(0.8)),
                &Stroke::round(ctx.line_width() * 3.0),
            );
        }
    }
}

/// Five perspective-scaled waves, the middle one closest to the viewer.
pub struct SoundwaveMode;

impl RenderMode for SoundwaveMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Soundwave
    }

    fn render(&mut self, frame: &FrequencyFrame, ctx: &ModeContext<'_>, surface: &mut dyn Surface) {
        let width = surface.width() as f32;
        let center_y = surface.height() as f32 / 2.0;
        let n = frame.len();
        let phase = ctx.time * 10.0;

        let points: Vec<Point> = (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let intensity = frame.intensity(i, ctx.sensitivity());
                Point::new(t * width, center_y + (t * PI * 8.0 + phase).sin() * intensity * 200.0)
            })
            .collect();
        let wave = Path::polyline(&points, false);

        for layer in 0..5 {
            let depth = (layer as f32 - 2.0).abs();
            let scale = 1.0 - depth * 0.15;
            let alpha = 1.0 - depth * 0.2;
            let transform = Transform::scale(scale, scale).then(Transform::translate(0.0, (layer as f32 - 2.0) * 50.0));

            surface.stroke_path(
                &wave.transform(&transform),
                &Paint::solid(ctx.layer(layer).with_alpha(alpha)),
                &Stroke::round(ctx.line_width() * 3.0 * scale),
            );
        }
    }
}

/// Eight petals traced by the spectrum, rotated around the center.
pub struct FlowerMode;

const PETALS: usize = 8;

impl RenderMode for FlowerMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Flower
    }

    fn render(&mut self, frame: &FrequencyFrame, ctx: &ModeContext<'_>, surface: &mut dyn Surface) {
        let center = surface.center();
        let n = frame.len();

        for petal in 0..PETALS {
            let rotation = petal as f32 * TAU / PETALS as f32;
            let points: Vec<Point> = (0..n)
                .map(|i| {
                    let angle = i as f32 / n as f32 * TAU;
                    let radius = frame.intensity(i, ctx.sensitivity()) * 300.0;
                    center.polar(angle + rotation, (radius * (angle * 3.0).sin()).abs())
                })
                .collect();

            surface.stroke_path(
                &Path::polyline(&points, false),
                &Paint::solid(ctx.layer(petal).with_alpha(0.6)),
                &Stroke::new(ctx.line_width()),
            );
        }
    }
}
