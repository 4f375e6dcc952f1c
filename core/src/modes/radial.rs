//! Radial modes laid out around the surface center.

use std::f32::consts::{PI, TAU};

use super::{fill_circle, stroke_circle, stroke_line, ModeContext, ModeKind, RenderMode};
use crate::audio::FrequencyFrame;
use crate::color::{Rgb, Rgba};
use crate::render::{GradientStop, Paint, Path, Point, Stroke, Surface};

/// Annular sector between `inner` and `outer` radii spanning `start..end`.
pub(crate) fn sector(center: Point, inner: f32, outer: f32, start: f32, end: f32) -> Path {
    let mut path = Path::new();
    path.arc(center, outer, start, end);
    path.arc(center, inner, end, start);
    path.close();
    path
}

/// Radial bars on three concentric rings.
pub struct CircleMode;

const CIRCLE_BASE_RADIUS: f32 = 200.0;

impl RenderMode for CircleMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Circle
    }

    fn render(&mut self, frame: &FrequencyFrame, ctx: &ModeContext<'_>, surface: &mut dyn Surface) {
        let center = surface.center();
        let n = frame.len();
        stroke_circle(surface, center, CIRCLE_BASE_RADIUS, Rgb::WHITE.with_alpha(0.2), 2.0);

        for ring in 0..3 {
            let radius = CIRCLE_BASE_RADIUS + ring as f32 * 60.0;
            let stroke = Stroke::round(ctx.line_width() * 2.0 + ring as f32);

            for i in 0..n {
                let position = i as f32 / n as f32;
                let angle = position * TAU;
                let level = frame.normalized(i);
                let bar_height = level * 300.0 * ctx.sensitivity();

                let color = ctx.wheel(position);
                let alpha = level * 0.8 + 0.3;
                let start = center.polar(angle, radius);
                let end = center.polar(angle, radius + bar_height);

                surface.stroke_path(
                    &Path::line(start, end),
                    &Paint::solid(color.with_alpha(alpha * (1.0 - ring as f32 * 0.2))),
                    &stroke,
                );

                if bar_height > 100.0 {
                    fill_circle(surface, end, 4.0 + ring as f32, color.lighten(100).with_alpha(alpha));
                }
            }
        }
    }
}

/// Twenty concentric rings, each pulsing with the average of its band.
pub struct TunnelMode;

const TUNNEL_RINGS: usize = 20;

impl RenderMode for TunnelMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Tunnel
    }

    fn render(&mut self, frame: &FrequencyFrame, ctx: &ModeContext<'_>, surface: &mut dyn Surface) {
        let center = surface.center();

        for ring in 0..TUNNEL_RINGS {
            let intensity = frame.band_average(ring, TUNNEL_RINGS, ctx.sensitivity());
            let radius = (ring + 1) as f32 * 30.0 + intensity * 100.0;
            let alpha = (1.0 - ring as f32 / TUNNEL_RINGS as f32).max(0.1);

            stroke_circle(
                surface,
                center,
                radius,
                ctx.layer(ring).with_alpha(alpha * intensity),
                ctx.line_width() + intensity * 5.0,
            );
        }
    }
}

/// Up to thirty ripples whose radius follows the bin index.
pub struct RippleMode;

impl RenderMode for RippleMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Ripple
    }

    fn render(&mut self, frame: &FrequencyFrame, ctx: &ModeContext<'_>, surface: &mut dyn Surface) {
        let center = surface.center();
        let max_radius = surface.width().min(surface.height()) as f32 / 2.0 * 0.8;
        let n = frame.len();
        let step = (n / 30).max(1);

        for i in (0..n).step_by(step) {
            let intensity = frame.intensity(i, ctx.sensitivity());
            if intensity < 0.1 {
                continue;
            }

            let radius = i as f32 / n as f32 * max_radius;
            let color = ctx.color(intensity);
            let width = ctx.line_width() + intensity * 4.0;
            stroke_circle(surface, center, radius, color.with_alpha(intensity * 0.6 + 0.1), width);

            if intensity > 0.5 {
                stroke_circle(surface, center, radius * 0.8, color.lighten(100).with_alpha(intensity * 0.3), width * 0.5);
            }
        }
    }
}

/// Eight rotating mirror segments of five ring sectors each.
pub struct KaleidoMode;

const KALEIDO_SEGMENTS: usize = 8;
const KALEIDO_RINGS: usize = 5;

impl RenderMode for KaleidoMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Kaleido
    }

    fn render(&mut self, frame: &FrequencyFrame, ctx: &ModeContext<'_>, surface: &mut dyn Surface) {
        let center = surface.center();
        let spread = PI / KALEIDO_SEGMENTS as f32 * 0.8;
        let bands = KALEIDO_SEGMENTS * KALEIDO_RINGS;

        for segment in 0..KALEIDO_SEGMENTS {
            let rotation = ctx.time * 2.0 + segment as f32 * TAU / KALEIDO_SEGMENTS as f32;

            for ring in 0..KALEIDO_RINGS {
                let intensity = frame.band_average(segment * KALEIDO_RINGS + ring, bands, ctx.sensitivity());
                if intensity < 0.1 {
                    continue;
                }

                let color = ctx.color(intensity);
                let inner = ring as f32 * 40.0 + 20.0;
                let outer = inner + intensity * 60.0;
                let path = sector(center, inner, outer, rotation - spread / 2.0, rotation + spread / 2.0);

                let fill = Paint::radial(
                    center,
                    inner,
                    outer,
                    vec![
                        GradientStop::new(0.0, color.with_alpha(intensity)),
                        GradientStop::new(0.7, color.lighten(50).with_alpha(intensity * 0.7)),
                        GradientStop::new(1.0, color.with_alpha(0.1)),
                    ],
                );
                surface.fill_path(&path, &fill);
                surface.stroke_path(
                    &path,
                    &Paint::solid(color.lighten(100).with_alpha(intensity * 0.5)),
                    &Stroke::new(1.0),
                );

                if intensity > 0.6 {
                    let dot_radius = (inner + outer) / 2.0;
                    for dot in 0..5 {
                        let angle = rotation - spread / 2.0 + spread * dot as f32 / 4.0;
                        fill_circle(surface, center.polar(angle, dot_radius), intensity * 3.0, Rgb::WHITE.with_alpha(intensity));
                    }
                }
            }
        }
    }
}

/// Forty rings of rotating sectors collapsing into a bright singularity.
pub struct WormholeMode;

const WORMHOLE_RINGS: usize = 40;

impl RenderMode for WormholeMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Wormhole
    }

    fn render(&mut self, frame: &FrequencyFrame, ctx: &ModeContext<'_>, surface: &mut dyn Surface) {
        let center = surface.center();
        let time = ctx.time * 3.0;
        let master = frame.mean(ctx.sensitivity());

        // Gravity well behind the rings
        let well = Paint::radial(
            center,
            50.0,
            400.0,
            vec![
                GradientStop::new(0.0, Rgba::new(0, 0, 0, 0.8)),
                GradientStop::new(0.5, Rgba::new(20, 20, 40, 0.4)),
                GradientStop::new(1.0, Rgba::TRANSPARENT),
            ],
        );
        let bounds = surface.bounds();
        surface.fill_rect(bounds, &well);

        for ring in 0..WORMHOLE_RINGS {
            let intensity = frame.band_average(ring, WORMHOLE_RINGS, ctx.sensitivity());
            if intensity < 0.05 {
                continue;
            }

            let progress = ring as f32 / WORMHOLE_RINGS as f32;
            let radius = 20.0 + progress * 450.0 + (time * 2.0 + progress * 8.0).sin() * 15.0 * intensity;
            let rotation = time * 3.0 + progress * 7.0;
            let color = ctx.color(intensity);
            let segments = 12 + (intensity * 8.0).floor() as usize;
            let span = PI / segments as f32 * 0.8;

            for layer in 0..3 {
                let layer_radius = radius + layer as f32 * 8.0;
                let layer_alpha = (1.0 - layer as f32 * 0.3) * intensity;

                for segment in 0..segments {
                    let angle = segment as f32 / segments as f32 * TAU + rotation + layer as f32 * 0.3;
                    let alpha = layer_alpha * (0.6 + (time * 4.0 + segment as f32 + layer as f32).sin() * 0.4);

                    let fill = Paint::radial(
                        center,
                        layer_radius * 0.7,
                        layer_radius * 1.3,
                        vec![
                            GradientStop::new(0.0, color.lighten(100).with_alpha(alpha)),
                            GradientStop::new(0.4, color.with_alpha(alpha * 0.8)),
                            GradientStop::new(1.0, color.scale(0.5).with_alpha(0.0)),
                        ],
                    );
                    surface.fill_path(&sector(center, layer_radius * 0.5, layer_radius, angle - span, angle + span), &fill);

                    if intensity > 0.7 && layer == 0 {
                        stroke_line(
                            surface,
                            center.polar(angle, layer_radius * 0.5),
                            center.polar(angle, layer_radius * 1.5),
                            color.lighten(150).with_alpha(intensity * 0.6),
                            2.0,
                        );
                    }
                }
            }

            if intensity > 0.5 && ring % 5 == 0 {
                for p in 0..6 {
                    let angle = p as f32 / 6.0 * TAU + time * 5.0;
                    let at = center.polar(angle, 10.0 + intensity * 30.0);
                    let paint = Paint::solid(color.lighten(100).with_alpha(intensity)).with_glow(intensity * 10.0, color);
                    surface.fill_path(&Path::circle(at, intensity * 4.0 + 1.0), &paint);
                }
            }
        }

        let core = ctx.color(master);
        let singularity = Paint::radial(
            center,
            0.0,
            25.0,
            vec![
                GradientStop::new(0.0, core.lighten(200)),
                GradientStop::new(0.6, core.with_alpha(master)),
                GradientStop::new(1.0, Rgb::BLACK),
            ],
        );
        surface.fill_path(&Path::circle(center, 15.0 + master * 10.0), &singularity);
    }
}

/// Rays dispersed into every palette color around a spinning triangle.
pub struct PrismMode;

impl RenderMode for PrismMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Prism
    }

    fn render(&mut self, frame: &FrequencyFrame, ctx: &ModeContext<'_>, surface: &mut dyn Surface) {
        let center = surface.center();
        let time = ctx.time * 3.0;
        let colors = ctx.palette().colors();
        let rays = (frame.len() / 4).max(1);

        for i in 0..rays {
            let intensity = frame.intensity(i, ctx.sensitivity());
            if intensity < 0.1 {
                continue;
            }

            let angle = i as f32 / rays as f32 * TAU + time;
            let reach = 300.0 + intensity * 200.0;

            for (index, &color) in colors.iter().enumerate() {
                let offset = angle + (index as f32 - colors.len() as f32 / 2.0) * 0.02;
                let start = center.polar(offset, 50.0);
                let end = center.polar(offset, reach);
                let paint = Paint::linear(
                    start,
                    end,
                    vec![
                        GradientStop::new(0.0, color.with_alpha(intensity)),
                        GradientStop::new(1.0, color.with_alpha(0.0)),
                    ],
                );
                surface.stroke_path(&Path::line(start, end), &paint, &Stroke::new(intensity * 5.0 + 1.0));
            }
        }

        surface.stroke_path(
            &Path::polygon(center, 40.0, 3, time),
            &Paint::solid(Rgb::WHITE.with_alpha(0.8)),
            &Stroke::new(3.0),
        );
    }
}

/// Four spiral arms of stars around a dark core.
pub struct GalaxySpiralMode;

const GALAXY_ARMS: usize = 4;

impl RenderMode for GalaxySpiralMode {
    fn kind(&self) -> ModeKind {
        ModeKind::GalaxySpiral
    }

    fn render(&mut self, frame: &FrequencyFrame, ctx: &ModeContext<'_>, surface: &mut dyn Surface) {
        let center = surface.center();
        let per_arm = (frame.len() / GALAXY_ARMS).max(1);

        for arm in 0..GALAXY_ARMS {
            let arm_angle = arm as f32 / GALAXY_ARMS as f32 * TAU;

            for i in 0..per_arm {
                let intensity = frame.intensity(arm * per_arm + i, ctx.sensitivity());
                if intensity < 0.1 {
                    continue;
                }

                let progress = i as f32 / per_arm as f32;
                let at = center.polar(arm_angle + progress * PI * 6.0 + ctx.time, progress * 300.0);
                let color = ctx.color(intensity);
                let size = intensity * 8.0 + 1.0;

                let star = Paint::solid(color.with_alpha(intensity)).with_glow(size * 3.0, color);
                surface.fill_path(&Path::circle(at, size), &star);

                if intensity > 0.3 {
                    let dust = Paint::solid(color.with_alpha(intensity)).with_glow(size * 8.0, color.scale(0.7));
                    surface.fill_path(&Path::circle(at, size * 4.0), &dust);
                }
            }
        }

        let core = Paint::radial(
            center,
            0.0,
            50.0,
            vec![
                GradientStop::new(0.0, Rgb::BLACK),
                GradientStop::new(0.7, Rgba::new(50, 30, 100, 0.5)),
                GradientStop::new(1.0, Rgba::TRANSPARENT),
            ],
        );
        surface.fill_path(&Path::circle(center, 40.0), &core);
    }
}
