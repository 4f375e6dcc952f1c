//! Fill styles and stroke styles.

use super::geometry::Point;
use crate::color::{Rgb, Rgba};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub offset: f32,
    pub color: Rgba,
}

impl GradientStop {
    pub fn new(offset: f32, color: impl Into<Rgba>) -> Self {
        Self { offset, color: color.into() }
    }
}

/// Source of color for a fill or stroke.
#[derive(Debug, Clone, PartialEq)]
pub enum Shader {
    Solid(Rgba),
    Linear {
        start: Point,
        end: Point,
        stops: Vec<GradientStop>,
    },
    /// Two-circle radial gradient. Colors are evaluated concentrically
    /// around the outer center.
    Radial {
        inner: Point,
        inner_radius: f32,
        outer: Point,
        outer_radius: f32,
        stops: Vec<GradientStop>,
    },
}

impl Shader {
    /// Color at a point in surface space.
    pub fn color_at(&self, p: Point) -> Rgba {
        match self {
            Shader::Solid(c) => *c,
            Shader::Linear { start, end, stops } => {
                let axis = *end - *start;
                let len2 = axis.x * axis.x + axis.y * axis.y;
                let t = if len2 > 0.0 {
                    ((p.x - start.x) * axis.x + (p.y - start.y) * axis.y) / len2
                } else {
                    0.0
                };
                sample_stops(stops, t)
            }
            Shader::Radial {
                inner_radius,
                outer,
                outer_radius,
                stops,
                ..
            } => {
                let span = outer_radius - inner_radius;
                let t = if span.abs() > f32::EPSILON {
                    (p.distance(*outer) - inner_radius) / span
                } else {
                    0.0
                };
                sample_stops(stops, t)
            }
        }
    }

    /// Representative color, for recording and for previews.
    pub fn base_color(&self) -> Rgba {
        match self {
            Shader::Solid(c) => *c,
            Shader::Linear { stops, .. } | Shader::Radial { stops, .. } => {
                stops.first().map(|s| s.color).unwrap_or(Rgba::TRANSPARENT)
            }
        }
    }
}

fn sample_stops(stops: &[GradientStop], t: f32) -> Rgba {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let Some(first) = stops.first() else {
        return Rgba::TRANSPARENT;
    };
    if t <= first.offset {
        return first.color;
    }
    for pair in stops.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t <= b.offset {
            let span = b.offset - a.offset;
            let local = if span > 0.0 { (t - a.offset) / span } else { 1.0 };
            return a.color.lerp(b.color, local);
        }
    }
    stops[stops.len() - 1].color
}

/// Soft halo drawn around a shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glow {
    pub blur: f32,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paint {
    pub shader: Shader,
    pub glow: Option<Glow>,
}

impl Paint {
    pub fn solid(color: impl Into<Rgba>) -> Self {
        Self {
            shader: Shader::Solid(color.into()),
            glow: None,
        }
    }

    pub fn linear(start: Point, end: Point, stops: Vec<GradientStop>) -> Self {
        Self {
            shader: Shader::Linear { start, end, stops },
            glow: None,
        }
    }

    pub fn radial(center: Point, inner_radius: f32, outer_radius: f32, stops: Vec<GradientStop>) -> Self {
        Self {
            shader: Shader::Radial {
                inner: center,
                inner_radius,
                outer: center,
                outer_radius,
                stops,
            },
            glow: None,
        }
    }

    pub fn with_glow(mut self, blur: f32, color: Rgb) -> Self {
        if blur > 0.0 {
            self.glow = Some(Glow { blur, color });
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub width: f32,
    pub cap: LineCap,
    /// On/off lengths of a dash pattern.
    pub dash: Option<[f32; 2]>,
}

impl Default for Stroke {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Stroke {
    pub fn new(width: f32) -> Self {
        Self {
            width,
            cap: LineCap::Butt,
            dash: None,
        }
    }

    pub fn round(width: f32) -> Self {
        Self {
            cap: LineCap::Round,
            ..Self::new(width)
        }
    }

    pub fn dashed(mut self, on: f32, off: f32) -> Self {
        if on > 0.0 && off >= 0.0 {
            self.dash = Some([on, off]);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_gradient_endpoints() {
        let paint = Paint::linear(
            Point::new(0.0, 0.0),
            Point::new(0.0, 100.0),
            vec![
                GradientStop::new(0.0, Rgb::new(0, 0, 0)),
                GradientStop::new(1.0, Rgb::new(200, 100, 0)),
            ],
        );
        assert_eq!(paint.shader.color_at(Point::new(5.0, -10.0)).rgb(), Rgb::new(0, 0, 0));
        assert_eq!(paint.shader.color_at(Point::new(5.0, 50.0)).rgb(), Rgb::new(100, 50, 0));
        assert_eq!(paint.shader.color_at(Point::new(5.0, 300.0)).rgb(), Rgb::new(200, 100, 0));
    }

    #[test]
    fn test_radial_gradient_fades_out() {
        let paint = Paint::radial(
            Point::new(0.0, 0.0),
            0.0,
            10.0,
            vec![
                GradientStop::new(0.0, Rgb::WHITE.with_alpha(1.0)),
                GradientStop::new(1.0, Rgb::WHITE.with_alpha(0.0)),
            ],
        );
        assert_eq!(paint.shader.color_at(Point::new(0.0, 0.0)).alpha(), 1.0);
        assert!((paint.shader.color_at(Point::new(5.0, 0.0)).alpha() - 0.5).abs() < 1e-5);
        assert_eq!(paint.shader.color_at(Point::new(20.0, 0.0)).alpha(), 0.0);
    }

    #[test]
    fn test_zero_blur_glow_is_dropped() {
        assert!(Paint::solid(Rgb::WHITE).with_glow(0.0, Rgb::WHITE).glow.is_none());
        assert!(Paint::solid(Rgb::WHITE).with_glow(4.0, Rgb::WHITE).glow.is_some());
    }
}
