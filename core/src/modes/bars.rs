//! Bar-style modes: bars, symmetric spectrum, mirrored bars and the
//! intensity grid.

use super::{ModeContext, ModeKind, RenderMode};
use crate::audio::FrequencyFrame;
use crate::render::{GradientStop, Paint, Point, Rect, Surface};

/// Gradient bars rising from the bottom edge.
pub struct BarMode;

impl RenderMode for BarMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Bar
    }

    fn render(&mut self, frame: &FrequencyFrame, ctx: &ModeContext<'_>, surface: &mut dyn Surface) {
        let width = surface.width() as f32;
        let height = surface.height() as f32;
        let bar_width = width / frame.len() as f32 * 2.5;

        let mut x = 0.0;
        for i in 0..frame.len() {
            if x > width {
                break;
            }
            let level = frame.normalized(i);
            let bar_height = level * height * ctx.sensitivity();

            // Silent bins produce no geometry at all
            if bar_height > 0.0 {
                let color = ctx.color(level * ctx.sensitivity());
                let top = height - bar_height;
                let paint = Paint::linear(
                    Point::new(0.0, height),
                    Point::new(0.0, top),
                    vec![
                        GradientStop::new(0.0, color.scale(0.3).with_alpha(level * 0.9 + 0.1)),
                        GradientStop::new(0.5, color.with_alpha(level * 0.8 + 0.2)),
                        GradientStop::new(1.0, color.lighten(100).with_alpha(level * 0.7 + 0.3)),
                    ],
                );
                surface.fill_rect(Rect::new(x, top, bar_width, bar_height), &paint);

                if bar_height > 10.0 {
                    let cap = color.lighten(150);
                    let glow = Paint::linear(
                        Point::new(0.0, top - 5.0),
                        Point::new(0.0, top + 5.0),
                        vec![
                            GradientStop::new(0.0, cap.with_alpha(0.0)),
                            GradientStop::new(1.0, cap.with_alpha(level * 0.3)),
                        ],
                    );
                    surface.fill_rect(Rect::new(x - 2.0, top - 5.0, bar_width + 4.0, 10.0), &glow);
                }
            }

            x += bar_width + 1.0;
        }
    }
}

/// Lower half of the spectrum drawn from both edges toward the center.
pub struct SpectrumMode;

impl RenderMode for SpectrumMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Spectrum
    }

    fn render(&mut self, frame: &FrequencyFrame, ctx: &ModeContext<'_>, surface: &mut dyn Surface) {
        let width = surface.width() as f32;
        let height = surface.height() as f32;
        let bar_count = (frame.len() / 2).max(1);
        let bar_width = width / bar_count as f32;

        for i in 0..bar_count {
            let level = frame.normalized(i);
            let bar_height = level * height * ctx.sensitivity();
            if bar_height <= 0.0 {
                continue;
            }

            let color = ctx.color(level * ctx.sensitivity());
            let dimmed = color.scale(0.3 + level * 0.7);
            let top = height - bar_height;
            let paint = Paint::linear(
                Point::new(0.0, top),
                Point::new(0.0, height),
                vec![
                    GradientStop::new(0.0, dimmed.with_alpha(0.9)),
                    GradientStop::new(0.5, color.with_alpha(0.7)),
                    GradientStop::new(1.0, color.lighten(50).with_alpha(0.3)),
                ],
            );

            let left = i as f32 * bar_width;
            surface.fill_rect(Rect::new(left, top, bar_width - 1.0, bar_height), &paint);
            surface.fill_rect(Rect::new(width - left - bar_width, top, bar_width - 1.0, bar_height), &paint);
        }
    }
}

/// Bars growing up from the horizontal center with a dimmed reflection below.
pub struct MirrorMode;

impl RenderMode for MirrorMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Mirror
    }

    fn render(&mut self, frame: &FrequencyFrame, ctx: &ModeContext<'_>, surface: &mut dyn Surface) {
        let width = surface.width() as f32;
        let mid = surface.height() as f32 / 2.0;
        let bar_width = width / frame.len() as f32;

        for i in 0..frame.len() {
            let level = frame.normalized(i);
            let bar_height = level * mid * ctx.sensitivity();
            if bar_height <= 0.0 {
                continue;
            }

            let color = ctx.color(level * ctx.sensitivity());
            let alpha = level * 0.8 + 0.2;
            let x = i as f32 * bar_width;

            surface.fill_rect(
                Rect::new(x, mid - bar_height, bar_width - 1.0, bar_height),
                &Paint::solid(color.with_alpha(alpha)),
            );
            surface.fill_rect(
                Rect::new(x, mid, bar_width - 1.0, bar_height),
                &Paint::solid(color.scale(0.7).with_alpha(alpha * 0.6)),
            );
        }
    }
}

/// Grid of centered squares, one bin per cell, sized by intensity.
pub struct GridMode;

const GRID_CELL: f32 = 40.0;

impl RenderMode for GridMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Grid
    }

    fn render(&mut self, frame: &FrequencyFrame, ctx: &ModeContext<'_>, surface: &mut dyn Surface) {
        let cols = (surface.width() as f32 / GRID_CELL).floor() as usize;
        let rows = (surface.height() as f32 / GRID_CELL).floor() as usize;
        let n = frame.len();

        for row in 0..rows {
            for col in 0..cols {
                let index = (row * cols + col) % n;
                let intensity = frame.intensity(index, ctx.sensitivity());
                let size = GRID_CELL * intensity;
                if size <= 0.0 {
                    continue;
                }

                let inset = (GRID_CELL - size) / 2.0;
                let color = ctx.spread(index, n);
                surface.fill_rect(
                    Rect::new(col as f32 * GRID_CELL + inset, row as f32 * GRID_CELL + inset, size, size),
                    &Paint::solid(color.with_alpha(intensity)),
                );
            }
        }
    }
}
