//! Field modes that cover the surface with cells, tiles or curtains.

use std::f32::consts::{PI, TAU};

use image::{Rgba as Pixel, RgbaImage};
use rand::rngs::StdRng;
use rand::Rng;

use super::{fill_circle, stroke_circle, ModeContext, ModeKind, RenderMode};
use crate::audio::FrequencyFrame;
use crate::color::Rgb;
use crate::render::{GradientStop, Paint, Path, Point, Rect, Stroke, Surface};

/// Voronoi cells around fixed random sites, each lit by its own band.
///
/// The diagram is evaluated on 4x4 pixel blocks and written straight into
/// the pixel buffer.
pub struct VoronoiMode {
    rng: StdRng,
    sites: Vec<Point>,
}

const VORONOI_SITES: usize = 15;
const VORONOI_BLOCK: u32 = 4;

impl VoronoiMode {
    pub fn new(rng: StdRng) -> Self {
        Self { rng, sites: Vec::new() }
    }

    fn nearest(&self, p: Point) -> usize {
        let mut best = 0;
        let mut best_dist = f32::INFINITY;
        for (index, site) in self.sites.iter().enumerate() {
            let dist = site.distance(p);
            if dist < best_dist {
                best_dist = dist;
                best = index;
            }
        }
        best
    }
}

impl RenderMode for VoronoiMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Voronoi
    }

    fn render(&mut self, frame: &FrequencyFrame, ctx: &ModeContext<'_>, surface: &mut dyn Surface) {
        let (width, height) = (surface.width(), surface.height());
        if self.sites.is_empty() {
            let rng = &mut self.rng;
            self.sites = (0..VORONOI_SITES)
                .map(|_| Point::new(rng.gen::<f32>() * width as f32, rng.gen::<f32>() * height as f32))
                .collect();
        }

        let levels = frame.downsample(VORONOI_SITES, ctx.sensitivity());
        let cells: Vec<Pixel<u8>> = levels
            .iter()
            .map(|&intensity| {
                let color = ctx.color(intensity);
                let channel = |c: u8| (c as f32 * intensity).round().clamp(0.0, 255.0) as u8;
                Pixel([
                    channel(color.r),
                    channel(color.g),
                    channel(color.b),
                    (intensity * 255.0).round().clamp(0.0, 255.0) as u8,
                ])
            })
            .collect();

        let mut image = RgbaImage::new(width, height);
        for by in (0..height).step_by(VORONOI_BLOCK as usize) {
            for bx in (0..width).step_by(VORONOI_BLOCK as usize) {
                let pixel = cells[self.nearest(Point::new(bx as f32, by as f32))];
                for y in by..(by + VORONOI_BLOCK).min(height) {
                    for x in bx..(bx + VORONOI_BLOCK).min(width) {
                        image.put_pixel(x, y, pixel);
                    }
                }
            }
        }
        surface.put_image(&image, 0, 0);

        for (site, &intensity) in self.sites.iter().zip(&levels) {
            if intensity > 0.3 {
                fill_circle(surface, *site, 5.0 + intensity * 10.0, ctx.color(intensity).lighten(100).into());
            }
        }
    }

    fn state_len(&self) -> usize {
        self.sites.len()
    }

    fn state_points(&self) -> Vec<Point> {
        self.sites.clone()
    }
}

/// Six moving point sources whose damped waves interfere across the surface.
pub struct WaveInterferenceMode;

const WAVE_SOURCES: usize = 6;
const WAVE_RESOLUTION: usize = 4;

struct WaveSource {
    at: Point,
    intensity: f32,
    frequency: f32,
    phase: f32,
    color: Rgb,
}

impl RenderMode for WaveInterferenceMode {
    fn kind(&self) -> ModeKind {
        ModeKind::WaveInterference
    }

    fn render(&mut self, frame: &FrequencyFrame, ctx: &ModeContext<'_>, surface: &mut dyn Surface) {
        let center = surface.center();
        let time = ctx.time * 3.0;

        let sources: Vec<WaveSource> = (0..WAVE_SOURCES)
            .filter_map(|source| {
                let intensity = frame.band_average(source, WAVE_SOURCES, ctx.sensitivity());
                if intensity <= 0.1 {
                    return None;
                }
                let angle = source as f32 / WAVE_SOURCES as f32 * TAU + time * 0.5;
                Some(WaveSource {
                    at: center.polar(angle, 100.0 + intensity * 150.0),
                    intensity,
                    frequency: 0.02 + intensity * 0.05,
                    phase: time * 2.0 + source as f32 * PI / 3.0,
                    color: ctx.color(intensity),
                })
            })
            .collect();
        if sources.is_empty() {
            return;
        }

        let cell = WAVE_RESOLUTION as f32;
        for x in (0..surface.width() as usize).step_by(WAVE_RESOLUTION) {
            for y in (0..surface.height() as usize).step_by(WAVE_RESOLUTION) {
                let p = Point::new(x as f32, y as f32);
                let mut total = 0.0;
                let mut weight_sum = 0.0;
                let mut mix = [0.0f32; 3];

                for wave in &sources {
                    let distance = p.distance(wave.at);
                    let amplitude = wave.intensity * (distance * wave.frequency + wave.phase).sin() * (-distance * 0.003).exp();
                    total += amplitude;

                    let weight = amplitude.abs();
                    mix[0] += wave.color.r as f32 * weight;
                    mix[1] += wave.color.g as f32 * weight;
                    mix[2] += wave.color.b as f32 * weight;
                    weight_sum += weight;
                }
                if weight_sum <= 0.0 {
                    continue;
                }

                let alpha = (total.abs() * 2.0).min(1.0);
                if alpha > 0.05 {
                    let channel = |v: f32| (v / weight_sum).floor().clamp(0.0, 255.0) as u8;
                    let color = Rgb::new(channel(mix[0]), channel(mix[1]), channel(mix[2]));
                    surface.fill_rect(Rect::new(p.x, p.y, cell, cell), &Paint::solid(color.with_alpha(alpha)));
                }
            }
        }

        for wave in &sources {
            stroke_circle(surface, wave.at, 10.0 + wave.intensity * 20.0, wave.color.with_alpha(wave.intensity), 3.0);
        }
    }
}

/// Four orbiting escape-time fractals, one per quarter of the spectrum.
pub struct FractalsMode;

const FRACTAL_CENTERS: usize = 4;

impl FractalsMode {
    fn draw_fractal(surface: &mut dyn Surface, center: Point, zoom: f32, intensity: f32, color: Rgb, time: f32) {
        let size = 100.0 * zoom;
        let detail = (intensity * 30.0).floor() as usize + 10;
        let step = size / detail as f32;
        let max_iterations = (intensity * 20.0).floor() as u32 + 10;
        let (jx, jy) = (time.sin() * 0.5, time.cos() * 0.5);

        for px in 0..detail {
            for py in 0..detail {
                let offset = Point::new(
                    (px as f32 - detail as f32 / 2.0) * step,
                    (py as f32 - detail as f32 / 2.0) * step,
                );
                let mut zx = offset.x / size * 4.0;
                let mut zy = offset.y / size * 4.0;
                let (cx, cy) = (zx + jx, zy + jy);

                let mut iterations = 0;
                while zx * zx + zy * zy < 4.0 && iterations < max_iterations {
                    let next = zx * zx - zy * zy + cx;
                    zy = 2.0 * zx * zy + cy;
                    zx = next;
                    iterations += 1;
                }

                let alpha = iterations as f32 / max_iterations as f32 * intensity * 0.8;
                if alpha > 0.1 {
                    let at = center + offset;
                    surface.fill_rect(Rect::new(at.x, at.y, step + 1.0, step + 1.0), &Paint::solid(color.with_alpha(alpha)));
                }
            }
        }
    }
}

impl RenderMode for FractalsMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Fractals
    }

    fn render(&mut self, frame: &FrequencyFrame, ctx: &ModeContext<'_>, surface: &mut dyn Surface) {
        let center = surface.center();

        for index in 0..FRACTAL_CENTERS {
            let intensity = frame.band_average(index, FRACTAL_CENTERS, ctx.sensitivity());
            if intensity < 0.2 {
                continue;
            }

            let angle = index as f32 / FRACTAL_CENTERS as f32 * TAU + ctx.time * 0.5;
            let at = center.polar(angle, 150.0 + intensity * 100.0);
            Self::draw_fractal(surface, at, 0.5 + intensity, intensity, ctx.color(intensity), ctx.time);
        }
    }
}

/// Triangulated sheet whose vertices ripple with the music.
pub struct MembraneMode;

const MEMBRANE_CELL: f32 = 40.0;

impl RenderMode for MembraneMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Membrane
    }

    fn render(&mut self, frame: &FrequencyFrame, ctx: &ModeContext<'_>, surface: &mut dyn Surface) {
        let time = ctx.time * 2.0;
        let cols = (surface.width() as f32 / MEMBRANE_CELL).floor() as usize;
        let rows = (surface.height() as f32 / MEMBRANE_CELL).floor() as usize;
        let n = frame.len();

        for row in 0..rows.saturating_sub(1) {
            for col in 0..cols.saturating_sub(1) {
                let intensity = frame.intensity((row * cols + col) % n, ctx.sensitivity());
                if intensity <= 0.0 {
                    continue;
                }

                let x = col as f32 * MEMBRANE_CELL;
                let y = row as f32 * MEMBRANE_CELL;
                let lift = |dx: f32, dy: f32| (time + (x + dx) * 0.01 + (y + dy) * 0.01).sin() * intensity * 25.0;

                let top_left = Point::new(x, y - lift(0.0, 0.0));
                let top_right = Point::new(x + MEMBRANE_CELL, y - lift(MEMBRANE_CELL, 0.0));
                let bottom_left = Point::new(x, y + MEMBRANE_CELL - lift(0.0, MEMBRANE_CELL));
                let bottom_right = Point::new(x + MEMBRANE_CELL, y + MEMBRANE_CELL - lift(MEMBRANE_CELL, MEMBRANE_CELL));

                let color = ctx.color(intensity);
                let fill = Paint::solid(color.with_alpha(intensity * 0.7));
                let second = Path::polyline(&[top_right, bottom_right, bottom_left], true);
                surface.fill_path(&Path::polyline(&[top_left, top_right, bottom_left], true), &fill);
                surface.fill_path(&second, &fill);

                if intensity > 0.3 {
                    surface.stroke_path(&second, &Paint::solid(color.lighten(100).with_alpha(intensity)), &Stroke::new(1.0));
                }
            }
        }
    }
}

/// Rotating hexagon tiling whose cells respond by distance from the center.
pub struct HexagonMode;

const HEX_SIZE: f32 = 40.0;

impl RenderMode for HexagonMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Hexagon
    }

    fn render(&mut self, frame: &FrequencyFrame, ctx: &ModeContext<'_>, surface: &mut dyn Surface) {
        let center = surface.center();
        let n = frame.len();
        let rows = (surface.height() as f32 / (HEX_SIZE * 1.5)).ceil() as i32 + 2;
        let cols = (surface.width() as f32 / (HEX_SIZE * 1.8)).ceil() as i32 + 2;
        let palette_len = ctx.palette().len();

        for row in -(rows / 2)..=(rows / 2) {
            for col in -(cols / 2)..=(cols / 2) {
                let offset = Point::new(
                    col as f32 * HEX_SIZE * 1.8 + row.rem_euclid(2) as f32 * HEX_SIZE * 0.9,
                    row as f32 * HEX_SIZE * 1.5,
                );
                let distance = offset.length();
                let index = (distance / 300.0 * n as f32).floor() as usize % n;
                let intensity = frame.intensity(index, ctx.sensitivity());
                if intensity < 0.2 {
                    continue;
                }

                let slot = ((distance + ctx.time) * 0.01).floor() as usize % palette_len;
                let color = ctx.layer(slot);
                let at = center + offset;
                let hexagon = Path::polygon(at, HEX_SIZE * intensity, 6, ctx.time + distance * 0.01);

                surface.fill_path(&hexagon, &Paint::solid(color.with_alpha(intensity * 0.3)));
                surface.stroke_path(&hexagon, &Paint::solid(color.with_alpha(intensity * 0.8)), &Stroke::new(intensity * 2.0));

                if intensity > 0.7 {
                    fill_circle(surface, at, intensity * 8.0, Rgb::WHITE.with_alpha(intensity));
                }
            }
        }
    }
}

/// Five translucent aurora curtains hanging from the middle of the surface.
pub struct Aurora2Mode;

impl RenderMode for Aurora2Mode {
    fn kind(&self) -> ModeKind {
        ModeKind::Aurora2
    }

    fn render(&mut self, frame: &FrequencyFrame, ctx: &ModeContext<'_>, surface: &mut dyn Surface) {
        let width = surface.width() as f32;
        let height = surface.height() as f32;
        let n = frame.len();
        let millis = ctx.time * 1000.0;

        for layer in 0..5 {
            let base = height / 2.0 + layer as f32 * 50.0;
            let amplitude = 150.0 - layer as f32 * 20.0;

            let mut points = vec![Point::new(0.0, base)];
            let mut x = 0.0;
            while x < width {
                let intensity = frame.intensity((x / width * n as f32).floor() as usize, ctx.sensitivity());
                let y = base
                    + (x * 0.02 + millis * 0.003).sin() * amplitude * intensity
                    + (x * 0.005 + millis * 0.001).sin() * amplitude * 0.3;
                points.push(Point::new(x, y));
                x += 10.0;
            }
            points.push(Point::new(width, height));
            points.push(Point::new(0.0, height));

            let color = ctx.layer(layer);
            let paint = Paint::linear(
                Point::new(0.0, height / 2.0),
                Point::new(0.0, height),
                vec![
                    GradientStop::new(0.0, color.with_alpha(0.3)),
                    GradientStop::new(1.0, color.with_alpha(0.05)),
                ],
            );
            surface.fill_path(&Path::polyline(&points, true), &paint);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ThemeCatalog;
    use crate::modes::RenderParameters;
    use crate::render::{DrawCommand, RasterSurface, RecordingSurface};
    use rand::SeedableRng;

    fn render(mode: &mut dyn RenderMode, frame: &FrequencyFrame, width: u32, height: u32) -> Vec<DrawCommand> {
        let params = RenderParameters::default();
        let themes = ThemeCatalog::builtin();
        let ctx = ModeContext::new(&params, &themes, 0.5);
        let mut surface = RecordingSurface::new(width, height);
        let log = surface.log();
        mode.render(frame, &ctx, &mut surface);
        log.take()
    }

    #[test]
    fn test_voronoi_writes_full_pixel_buffer() {
        let frame = FrequencyFrame::filled(256, 255).unwrap();
        let mut mode = VoronoiMode::new(StdRng::seed_from_u64(5));
        let commands = render(&mut mode, &frame, 64, 48);
        assert_eq!(
            commands[0],
            DrawCommand::PutImage {
                x: 0,
                y: 0,
                width: 64,
                height: 48
            }
        );
        // every site is loud enough to be marked
        assert_eq!(commands.len(), 1 + VORONOI_SITES);
        assert_eq!(mode.state_len(), VORONOI_SITES);
    }

    #[test]
    fn test_silent_voronoi_is_transparent() {
        let params = RenderParameters::default();
        let themes = ThemeCatalog::builtin();
        let ctx = ModeContext::new(&params, &themes, 0.0);
        let mut surface = RasterSurface::new(16, 16);
        let mut mode = VoronoiMode::new(StdRng::seed_from_u64(5));
        mode.render(&FrequencyFrame::silent(64).unwrap(), &ctx, &mut surface);
        assert!(surface.image().pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn test_interference_needs_sources() {
        let silent = FrequencyFrame::silent(256).unwrap();
        assert!(render(&mut WaveInterferenceMode, &silent, 64, 64).is_empty());

        let loud = FrequencyFrame::filled(256, 255).unwrap();
        let commands = render(&mut WaveInterferenceMode, &loud, 64, 64);
        let rings = commands.iter().filter(|c| matches!(c, DrawCommand::StrokePath { .. })).count();
        assert_eq!(rings, WAVE_SOURCES);
    }

    #[test]
    fn test_membrane_and_hexagon_quiet_when_silent() {
        let frame = FrequencyFrame::silent(256).unwrap();
        assert!(render(&mut MembraneMode, &frame, 320, 240).is_empty());
        assert!(render(&mut HexagonMode, &frame, 320, 240).is_empty());
        assert!(render(&mut FractalsMode, &frame, 320, 240).is_empty());
    }

    #[test]
    fn test_aurora_curtains_always_drawn() {
        let frame = FrequencyFrame::silent(256).unwrap();
        let commands = render(&mut Aurora2Mode, &frame, 320, 240);
        assert_eq!(commands.len(), 5);
    }

    #[test]
    fn test_fractal_cells_scale_with_intensity() {
        let frame = FrequencyFrame::filled(256, 255).unwrap();
        let commands = render(&mut FractalsMode, &frame, 1280, 720);
        assert!(!commands.is_empty());
        assert!(commands.iter().all(|c| matches!(c, DrawCommand::FillRect { .. })));
    }
}
