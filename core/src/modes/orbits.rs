//! Orbiting bodies: planets, the atom, crystals, the wireframe cube and
//! constellations.

use std::f32::consts::{PI, TAU};

use super::{fill_circle, stroke_circle, ModeContext, ModeKind, RenderMode};
use crate::audio::FrequencyFrame;
use crate::color::Rgb;
use crate::render::{GradientStop, Paint, Path, Point, Shader, Stroke, Surface, Transform};

/// Five planets on circular orbits, each with a few moons.
pub struct PlanetMode;

const PLANETS: usize = 5;

impl RenderMode for PlanetMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Planet
    }

    fn render(&mut self, frame: &FrequencyFrame, ctx: &ModeContext<'_>, surface: &mut dyn Surface) {
        let center = surface.center();
        let time = ctx.time * 2.0;

        for planet in 0..PLANETS {
            let intensity = frame.band_average(planet, PLANETS, ctx.sensitivity());
            if intensity < 0.1 {
                continue;
            }

            let orbit = 100.0 + planet as f32 * 80.0;
            let radius = 20.0 + intensity * 40.0;
            let at = center.polar(time + planet as f32 * TAU / PLANETS as f32, orbit);
            let color = ctx.color(intensity);

            stroke_circle(surface, center, orbit, color.with_alpha(0.3), 1.0);

            // Off-center highlight fakes a lit sphere
            let shading = Paint {
                shader: Shader::Radial {
                    inner: at - Point::new(radius * 0.3, radius * 0.3),
                    inner_radius: 0.0,
                    outer: at,
                    outer_radius: radius,
                    stops: vec![
                        GradientStop::new(0.0, color.lighten(100)),
                        GradientStop::new(0.7, color.with_alpha(0.8)),
                        GradientStop::new(1.0, color.scale(0.3).with_alpha(0.6)),
                    ],
                },
                glow: None,
            };
            surface.fill_path(&Path::circle(at, radius), &shading);

            let moons = (intensity * 3.0).floor() as usize + 1;
            for moon in 0..moons {
                let angle = time * 3.0 + moon as f32 * TAU / moons as f32;
                let moon_at = at.polar(angle, radius + 15.0 + moon as f32 * 10.0);
                fill_circle(surface, moon_at, 2.0 + intensity * 5.0, color.with_alpha(intensity));
            }
        }
    }
}

/// A nucleus driven by the lowest bin with electrons on flattened orbits.
pub struct AtomMode;

const ATOM_ORBITS: usize = 6;

impl RenderMode for AtomMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Atom
    }

    fn render(&mut self, frame: &FrequencyFrame, ctx: &ModeContext<'_>, surface: &mut dyn Surface) {
        let center = surface.center();
        let n = frame.len();
        let millis = ctx.time * 1000.0;

        let core = frame.intensity(0, ctx.sensitivity());
        fill_circle(surface, center, core * 30.0 + 10.0, ctx.layer(0).with_alpha(core * 0.8 + 0.2));

        for orbit in 0..ATOM_ORBITS {
            let radius = 80.0 + orbit as f32 * 60.0;
            let speed = 0.01 + orbit as f32 * 0.005;
            stroke_circle(surface, center, radius, Rgb::WHITE.with_alpha(0.1), 1.0);

            let electrons = 2 + orbit;
            for e in 0..electrons {
                let intensity = frame.intensity((orbit * electrons + e) % n, ctx.sensitivity());
                let angle = millis * speed + e as f32 * TAU / electrons as f32;
                let at = center + Point::new(angle.cos() * radius, angle.sin() * radius * 0.3);
                let color = ctx.layer(orbit + e);

                fill_circle(surface, at, intensity * 8.0 + 3.0, color.with_alpha(intensity * 0.8 + 0.2));

                if intensity > 0.5 {
                    let mut trail = Path::new();
                    trail.arc(center, radius, angle - 0.5, angle);
                    surface.stroke_path(&trail, &Paint::solid(color.with_alpha(intensity * 0.3)), &Stroke::new(intensity * 2.0));
                }
            }
        }
    }
}

/// Eight rotating hexagonal crystals orbiting the center.
pub struct CrystalMode;

const CRYSTALS: usize = 8;
const CRYSTAL_FACES: usize = 6;

impl RenderMode for CrystalMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Crystal
    }

    fn render(&mut self, frame: &FrequencyFrame, ctx: &ModeContext<'_>, surface: &mut dyn Surface) {
        let center = surface.center();
        let time = ctx.time * 2.0;

        for crystal in 0..CRYSTALS {
            let intensity = frame.band_average(crystal, CRYSTALS, ctx.sensitivity());
            if intensity < 0.1 {
                continue;
            }

            let at = center.polar(crystal as f32 / CRYSTALS as f32 * TAU + time, 150.0 + intensity * 200.0);
            let color = ctx.color(intensity);
            let size = 30.0 + intensity * 50.0;
            let place = Transform::rotate(time + crystal as f32 * 0.5).then(Transform::translate(at.x, at.y));

            let fill = Paint::linear(
                place.apply(Point::new(-size, -size)),
                place.apply(Point::new(size, size)),
                vec![
                    GradientStop::new(0.0, color.lighten(100).with_alpha(intensity)),
                    GradientStop::new(0.5, color.with_alpha(intensity * 0.8)),
                    GradientStop::new(1.0, color.scale(0.3).with_alpha(intensity * 0.6)),
                ],
            );
            let edge = Paint::solid(color.lighten(150).with_alpha(intensity * 0.7));

            for face in 0..CRYSTAL_FACES {
                let a = face as f32 / CRYSTAL_FACES as f32 * TAU;
                let b = (face + 1) as f32 / CRYSTAL_FACES as f32 * TAU;
                let origin = Point::default();
                let facet = Path::polyline(&[origin, origin.polar(a, size), origin.polar(b, size)], true).transform(&place);

                surface.fill_path(&facet, &fill);
                surface.stroke_path(&facet, &edge, &Stroke::new(1.0));
            }
        }
    }
}

/// Wireframe cube that grows and spins faster with the overall level.
pub struct CubeMode;

const CUBE_VERTICES: [[f32; 3]; 8] = [
    [-1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [1.0, 1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, 1.0],
    [1.0, 1.0, 1.0],
    [-1.0, 1.0, 1.0],
];

const CUBE_EDGES: [(usize, usize); 12] = [
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 0),
    (4, 5),
    (5, 6),
    (6, 7),
    (7, 4),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

impl RenderMode for CubeMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Cube
    }

    fn render(&mut self, frame: &FrequencyFrame, ctx: &ModeContext<'_>, surface: &mut dyn Surface) {
        let center = surface.center();
        let intensity = frame.mean(ctx.sensitivity());
        let rotation = ctx.time * intensity;
        let half = (200.0 + intensity * 100.0) / 2.0;

        let (sin_x, cos_x) = rotation.sin_cos();
        let (sin_y, cos_y) = (rotation * 0.7).sin_cos();
        let projected: Vec<Point> = CUBE_VERTICES
            .iter()
            .map(|&[x, y, z]| {
                let (y, z) = (y * cos_x - z * sin_x, y * sin_x + z * cos_x);
                let x = x * cos_y - z * sin_y;
                center + Point::new(x * half, y * half)
            })
            .collect();

        let stroke = Stroke::new(ctx.line_width() * 2.0 + intensity * 3.0);
        for (index, &(a, b)) in CUBE_EDGES.iter().enumerate() {
            let paint = Paint::solid(ctx.layer(index).with_alpha(intensity + 0.3));
            surface.stroke_path(&Path::line(projected[a], projected[b]), &paint, &stroke);
        }
    }
}

/// Five rotating constellations of eight stars.
pub struct StarfieldMode;

const CONSTELLATIONS: usize = 5;
const STARS_PER_CONSTELLATION: usize = 8;

/// Six-pointed star outline.
fn star_path(center: Point, size: f32) -> Path {
    let points: Vec<Point> = (0..12)
        .map(|i| {
            let radius = if i % 2 == 0 { size } else { size * 0.4 };
            center.polar(i as f32 * PI / 6.0, radius)
        })
        .collect();
    Path::polyline(&points, true)
}

impl RenderMode for StarfieldMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Starfield
    }

    fn render(&mut self, frame: &FrequencyFrame, ctx: &ModeContext<'_>, surface: &mut dyn Surface) {
        let center = surface.center();
        let n = frame.len();
        let spin = ctx.time * 0.5;

        for constellation in 0..CONSTELLATIONS {
            let intensity = frame.band_average(constellation, CONSTELLATIONS, ctx.sensitivity());
            if intensity < 0.1 {
                continue;
            }

            let color = ctx.color(intensity);
            let base = constellation as f32 / CONSTELLATIONS as f32 * TAU;
            let hub = center.polar(base, 150.0 + intensity * 200.0);

            for star in 0..STARS_PER_CONSTELLATION {
                let level = frame.intensity((constellation * STARS_PER_CONSTELLATION + star) % n, ctx.sensitivity());
                let angle = star as f32 / STARS_PER_CONSTELLATION as f32 * TAU + spin;
                let at = hub.polar(angle, 30.0 + level * 80.0);
                let size = level * 15.0 + 2.0;

                let paint = Paint::solid(color.with_alpha(level + 0.3)).with_glow(size * 3.0, color);
                surface.fill_path(&Path::circle(at, size), &paint);

                if level > 0.5 {
                    surface.fill_path(&star_path(at, size * 2.0), &Paint::solid(color.lighten(100).with_alpha(level * 0.5)));
                }
            }

            if intensity > 0.3 {
                let mut links = Path::new();
                for i in 0..STARS_PER_CONSTELLATION {
                    let a = i as f32 / STARS_PER_CONSTELLATION as f32 * TAU + spin;
                    let b = ((i + 1) % STARS_PER_CONSTELLATION) as f32 / STARS_PER_CONSTELLATION as f32 * TAU + spin;
                    links.move_to(hub.polar(a, 50.0));
                    links.line_to(hub.polar(b, 50.0));
                }
                surface.stroke_path(&links, &Paint::solid(color.with_alpha(intensity * 0.3)), &Stroke::new(1.0));
            }
        }
    }
}
