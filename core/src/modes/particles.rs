//! Particle simulations.
//!
//! Every mode here keeps its bodies between ticks and seeds them lazily on
//! the first render, once the surface size is known. Bodies never leave the
//! surface: bouncing modes reflect and clamp, the flock wraps around.

use std::f32::consts::TAU;

use rand::rngs::StdRng;
use rand::Rng;

use super::{stroke_line, ModeContext, ModeKind, RenderMode};
use crate::audio::FrequencyFrame;
use crate::color::{Rgb, Rgba};
use crate::render::{GradientStop, Paint, Path, Point, Surface};

/// A moving body with a base size.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Body {
    pos: Point,
    vel: Point,
    size: f32,
}

impl Body {
    fn spawn(rng: &mut StdRng, width: f32, height: f32, min_size: f32, max_size: f32) -> Self {
        Self {
            pos: Point::new(rng.gen::<f32>() * width, rng.gen::<f32>() * height),
            vel: Point::new((rng.gen::<f32>() - 0.5) * 2.0, (rng.gen::<f32>() - 0.5) * 2.0),
            size: min_size + rng.gen::<f32>() * (max_size - min_size),
        }
    }

    /// Flip velocity components that point out of bounds, scaled by
    /// `restitution`, then clamp the position back inside.
    fn bounce(&mut self, width: f32, height: f32, restitution: f32) {
        if self.pos.x < 0.0 || self.pos.x > width {
            self.vel.x *= -restitution;
        }
        if self.pos.y < 0.0 || self.pos.y > height {
            self.vel.y *= -restitution;
        }
        self.pos.x = self.pos.x.clamp(0.0, width);
        self.pos.y = self.pos.y.clamp(0.0, height);
    }
}

fn fill_glowing(surface: &mut dyn Surface, center: Point, radius: f32, color: Rgba, blur: f32) {
    if radius > 0.0 && color.alpha() > 0.0 {
        let paint = Paint::solid(color).with_glow(blur, color.rgb());
        surface.fill_path(&Path::circle(center, radius), &paint);
    }
}

/// Bouncing particles driven by the overall loudness.
pub struct ParticleMode {
    rng: StdRng,
    particles: Vec<Body>,
}

const PARTICLE_COUNT: usize = 100;

impl ParticleMode {
    pub fn new(rng: StdRng) -> Self {
        Self {
            rng,
            particles: Vec::new(),
        }
    }
}

impl RenderMode for ParticleMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Particle
    }

    fn render(&mut self, frame: &FrequencyFrame, ctx: &ModeContext<'_>, surface: &mut dyn Surface) {
        let width = surface.width() as f32;
        let height = surface.height() as f32;
        if self.particles.is_empty() {
            let rng = &mut self.rng;
            self.particles = (0..PARTICLE_COUNT)
                .map(|_| Body::spawn(rng, width, height, 1.0, 4.0))
                .collect();
        }

        let intensity = frame.mean(ctx.sensitivity());
        let size = (intensity * 8.0).max(1.0);
        let count = self.particles.len();

        for (index, particle) in self.particles.iter_mut().enumerate() {
            particle.size = size;
            particle.pos = particle.pos + particle.vel * (intensity * 3.0);
            particle.bounce(width, height, 1.0);

            let color = ctx.spread(index, count);
            fill_glowing(surface, particle.pos, particle.size, color.with_alpha(intensity), particle.size * 2.0);
        }
    }

    fn state_len(&self) -> usize {
        self.particles.len()
    }

    fn state_points(&self) -> Vec<Point> {
        self.particles.iter().map(|p| p.pos).collect()
    }
}

/// Damped particles pushed around by the music, linked when close.
pub struct FluidMode {
    rng: StdRng,
    particles: Vec<Body>,
}

const FLUID_COUNT: usize = 150;
const FLUID_LINK_DISTANCE: f32 = 80.0;

impl FluidMode {
    pub fn new(rng: StdRng) -> Self {
        Self {
            rng,
            particles: Vec::new(),
        }
    }
}

impl RenderMode for FluidMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Fluid
    }

    fn render(&mut self, frame: &FrequencyFrame, ctx: &ModeContext<'_>, surface: &mut dyn Surface) {
        let width = surface.width() as f32;
        let height = surface.height() as f32;
        let time = ctx.time * 3.0;
        let n = frame.len();
        if self.particles.is_empty() {
            let rng = &mut self.rng;
            self.particles = (0..FLUID_COUNT)
                .map(|_| Body::spawn(rng, width, height, 2.0, 10.0))
                .collect();
        }

        for (index, particle) in self.particles.iter_mut().enumerate() {
            let intensity = frame.intensity(index % n, ctx.sensitivity());
            let phase = time + index as f32 * 0.1;
            let force = Point::new(phase.sin(), phase.cos()) * (intensity * 5.0);

            particle.vel = (particle.vel + force * 0.1) * 0.98;
            particle.pos = particle.pos + particle.vel;
            particle.bounce(width, height, 0.8);

            let color = ctx.color(intensity);
            let size = particle.size * (0.5 + intensity);
            if intensity > 0.0 {
                let paint = Paint::radial(
                    particle.pos,
                    0.0,
                    size,
                    vec![
                        GradientStop::new(0.0, color.with_alpha(intensity)),
                        GradientStop::new(1.0, color.with_alpha(0.0)),
                    ],
                );
                surface.fill_path(&Path::circle(particle.pos, size), &paint);
            }
        }

        // Viscous links between near neighbours
        for i in 0..self.particles.len() {
            for j in (i + 1)..self.particles.len() {
                let (a, b) = (self.particles[i].pos, self.particles[j].pos);
                let dist = a.distance(b);
                if dist >= FLUID_LINK_DISTANCE {
                    continue;
                }
                let avg = (frame.intensity(i % n, ctx.sensitivity()) + frame.intensity(j % n, ctx.sensitivity())) / 2.0;
                let alpha = (1.0 - dist / FLUID_LINK_DISTANCE) * avg * 0.3;
                if alpha > 0.05 {
                    stroke_line(surface, a, b, ctx.color(avg).with_alpha(alpha), 1.0);
                }
            }
        }
    }

    fn state_len(&self) -> usize {
        self.particles.len()
    }

    fn state_points(&self) -> Vec<Point> {
        self.particles.iter().map(|p| p.pos).collect()
    }
}

#[derive(Debug, Clone, Copy)]
struct Boid {
    body: Body,
    color_slot: usize,
}

/// Boids with cohesion, alignment and separation, nudged by the music.
pub struct FlockMode {
    rng: StdRng,
    boids: Vec<Boid>,
}

const FLOCK_COUNT: usize = 80;
const FLOCK_NEIGHBOUR_RADIUS: f32 = 100.0;
const FLOCK_SEPARATION_RADIUS: f32 = 30.0;

impl FlockMode {
    pub fn new(rng: StdRng) -> Self {
        Self { rng, boids: Vec::new() }
    }
}

impl RenderMode for FlockMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Flock
    }

    fn render(&mut self, frame: &FrequencyFrame, ctx: &ModeContext<'_>, surface: &mut dyn Surface) {
        let width = surface.width() as f32;
        let height = surface.height() as f32;
        let n = frame.len();
        if self.boids.is_empty() {
            let rng = &mut self.rng;
            self.boids = (0..FLOCK_COUNT)
                .map(|_| Boid {
                    body: Body::spawn(rng, width, height, 2.0, 6.0),
                    color_slot: rng.gen_range(0..16),
                })
                .collect();
        }

        for i in 0..self.boids.len() {
            let intensity = frame.intensity(i % n, ctx.sensitivity());
            let me = self.boids[i].body;

            let mut center = Point::default();
            let mut heading = Point::default();
            let mut separate = Point::default();
            let mut neighbours = 0usize;
            for (j, other) in self.boids.iter().enumerate() {
                if i == j {
                    continue;
                }
                let delta = other.body.pos - me.pos;
                let distance = delta.length();
                if distance < FLOCK_NEIGHBOUR_RADIUS {
                    center = center + other.body.pos;
                    heading = heading + other.body.vel;
                    neighbours += 1;
                    if distance > 0.0 && distance < FLOCK_SEPARATION_RADIUS {
                        separate = separate - delta * (1.0 / distance);
                    }
                }
            }

            let mut vel = me.vel;
            if neighbours > 0 {
                let k = 1.0 / neighbours as f32;
                vel = vel + (center * k - me.pos) * 0.0005;
                vel = vel + (heading * k - vel) * 0.02;
                vel = vel + separate * 0.05;
            }
            vel.x += (self.rng.gen::<f32>() - 0.5) * intensity * 0.5;
            vel.y += (self.rng.gen::<f32>() - 0.5) * intensity * 0.5;

            let speed = vel.length();
            let max_speed = 3.0 + intensity * 2.0;
            if speed > max_speed {
                vel = vel * (max_speed / speed);
            }

            let mut pos = me.pos + vel;
            if pos.x < 0.0 {
                pos.x = width;
                vel.x *= -0.5;
            } else if pos.x > width {
                pos.x = 0.0;
                vel.x *= -0.5;
            }
            if pos.y < 0.0 {
                pos.y = height;
                vel.y *= -0.5;
            } else if pos.y > height {
                pos.y = 0.0;
                vel.y *= -0.5;
            }

            let boid = &mut self.boids[i];
            boid.body.pos = pos;
            boid.body.vel = vel;

            let color = ctx.layer(boid.color_slot);
            let size = boid.body.size;
            surface.fill_path(&Path::circle(pos, size), &Paint::solid(color.with_alpha(intensity * 0.6 + 0.4)));

            let tip = pos.polar(vel.y.atan2(vel.x), size + 10.0);
            stroke_line(surface, pos, tip, color.with_alpha(intensity * 0.8), 2.0);
        }
    }

    fn state_len(&self) -> usize {
        self.boids.len()
    }

    fn state_points(&self) -> Vec<Point> {
        self.boids.iter().map(|b| b.body.pos).collect()
    }
}

/// A burst of sparks for every loud eighth bin, at a random spot.
pub struct FireworksMode {
    rng: StdRng,
}

impl FireworksMode {
    pub fn new(rng: StdRng) -> Self {
        Self { rng }
    }
}

impl RenderMode for FireworksMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Fireworks
    }

    fn render(&mut self, frame: &FrequencyFrame, ctx: &ModeContext<'_>, surface: &mut dyn Surface) {
        let width = surface.width() as f32;
        let height = surface.height() as f32;
        let center = surface.center();

        for i in (0..frame.len()).step_by(8) {
            let intensity = frame.intensity(i, ctx.sensitivity());
            if intensity < 0.3 {
                continue;
            }

            let color: Rgb = ctx.color(intensity);
            let origin = center
                + Point::new(
                    (self.rng.gen::<f32>() - 0.5) * width * 0.8,
                    (self.rng.gen::<f32>() - 0.5) * height * 0.8,
                );
            let sparks = (intensity * 20.0).floor() as usize + 10;

            for p in 0..sparks {
                let angle = TAU * p as f32 / sparks as f32;
                let radius = intensity * 100.0 * (0.5 + self.rng.gen::<f32>() * 0.5);
                let spark = origin.polar(angle, radius);

                surface.fill_path(
                    &Path::circle(spark, intensity * 3.0 + 1.0),
                    &Paint::solid(color.with_alpha(intensity * 0.8)),
                );
                stroke_line(surface, origin, spark, color.with_alpha(intensity * 0.4), intensity * 2.0);
            }
        }
    }
}
