//! Points, rectangles, affine transforms and paths.

use std::f32::consts::TAU;
use std::ops::{Add, Mul, Sub};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Point at `angle` radians, `radius` away from `self`.
    pub fn polar(self, angle: f32, radius: f32) -> Point {
        Point::new(self.x + angle.cos() * radius, self.y + angle.sin() * radius)
    }

    pub fn distance(self, other: Point) -> f32 {
        (self - other).length()
    }

    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    pub fn lerp(self, other: Point, t: f32) -> Point {
        self + (other - self) * t
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Point {
    type Output = Point;
    fn mul(self, rhs: f32) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

/// Axis-aligned rectangle. Negative extents are allowed and normalized on use.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(0.0, 0.0, width as f32, height as f32)
    }

    /// Equivalent rectangle with non-negative extents.
    pub fn normalized(self) -> Rect {
        let (x, width) = if self.width < 0.0 { (self.x + self.width, -self.width) } else { (self.x, self.width) };
        let (y, height) = if self.height < 0.0 { (self.y + self.height, -self.height) } else { (self.y, self.height) };
        Rect::new(x, y, width, height)
    }

    /// True when the rectangle covers no area.
    pub fn is_empty(&self) -> bool {
        !(self.width.abs() > 0.0 && self.height.abs() > 0.0)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, p: Point) -> bool {
        let r = self.normalized();
        p.x >= r.x && p.x <= r.x + r.width && p.y >= r.y && p.y <= r.y + r.height
    }
}

/// 2D affine transform `[a c e; b d f]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub const fn identity() -> Self {
        Self { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 }
    }

    pub fn translate(x: f32, y: f32) -> Self {
        Self { e: x, f: y, ..Self::identity() }
    }

    pub fn rotate(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self { a: c, b: s, c: -s, d: c, e: 0.0, f: 0.0 }
    }

    pub fn scale(sx: f32, sy: f32) -> Self {
        Self { a: sx, d: sy, ..Self::identity() }
    }

    /// `self` applied first, then `next`.
    pub fn then(self, next: Transform) -> Transform {
        Transform {
            a: next.a * self.a + next.c * self.b,
            b: next.b * self.a + next.d * self.b,
            c: next.a * self.c + next.c * self.d,
            d: next.b * self.c + next.d * self.d,
            e: next.a * self.e + next.c * self.f + next.e,
            f: next.b * self.e + next.d * self.f + next.f,
        }
    }

    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathElement {
    MoveTo(Point),
    LineTo(Point),
    QuadTo(Point, Point),
    Close,
}

/// A flattened subpath.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polyline {
    pub points: Vec<Point>,
    pub closed: bool,
}

/// A sequence of subpaths built with canvas-style commands.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    elements: Vec<PathElement>,
    current: Option<Point>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(from: Point, to: Point) -> Self {
        let mut path = Self::new();
        path.move_to(from);
        path.line_to(to);
        path
    }

    pub fn polyline(points: &[Point], closed: bool) -> Self {
        let mut path = Self::new();
        for (i, &p) in points.iter().enumerate() {
            if i == 0 {
                path.move_to(p);
            } else {
                path.line_to(p);
            }
        }
        if closed && !points.is_empty() {
            path.close();
        }
        path
    }

    pub fn rect(rect: Rect) -> Self {
        let Rect { x, y, width, height } = rect;
        Self::polyline(
            &[
                Point::new(x, y),
                Point::new(x + width, y),
                Point::new(x + width, y + height),
                Point::new(x, y + height),
            ],
            true,
        )
    }

    pub fn circle(center: Point, radius: f32) -> Self {
        let mut path = Self::new();
        path.arc(center, radius, 0.0, TAU);
        path.close();
        path
    }

    /// Regular polygon with its first vertex at `rotation`.
    pub fn polygon(center: Point, radius: f32, sides: usize, rotation: f32) -> Self {
        let sides = sides.max(3);
        let points: Vec<Point> = (0..sides)
            .map(|i| center.polar(rotation + TAU * i as f32 / sides as f32, radius))
            .collect();
        Self::polyline(&points, true)
    }

    pub fn move_to(&mut self, p: Point) {
        self.elements.push(PathElement::MoveTo(p));
        self.current = Some(p);
    }

    pub fn line_to(&mut self, p: Point) {
        if self.current.is_none() {
            self.move_to(p);
            return;
        }
        self.elements.push(PathElement::LineTo(p));
        self.current = Some(p);
    }

    pub fn quad_to(&mut self, control: Point, to: Point) {
        if self.current.is_none() {
            self.move_to(control);
        }
        self.elements.push(PathElement::QuadTo(control, to));
        self.current = Some(to);
    }

    /// Circular arc from `start` to `end` radians, clockwise in screen space.
    ///
    /// Joins the current point with a straight line, as a canvas arc does.
    pub fn arc(&mut self, center: Point, radius: f32, start: f32, end: f32) {
        let radius = radius.abs();
        let sweep = end - start;
        let steps = ((sweep.abs() * radius.max(1.0)).sqrt() * 2.0).ceil().clamp(4.0, 128.0) as usize;
        for i in 0..=steps {
            let p = center.polar(start + sweep * i as f32 / steps as f32, radius);
            if i == 0 {
                self.line_to(p);
            } else {
                self.elements.push(PathElement::LineTo(p));
                self.current = Some(p);
            }
        }
    }

    pub fn close(&mut self) {
        if self.current.is_some() {
            self.elements.push(PathElement::Close);
        }
    }

    pub fn elements(&self) -> &[PathElement] {
        &self.elements
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn transform(&self, transform: &Transform) -> Path {
        let map = |p: Point| transform.apply(p);
        Path {
            elements: self
                .elements
                .iter()
                .map(|e| match *e {
                    PathElement::MoveTo(p) => PathElement::MoveTo(map(p)),
                    PathElement::LineTo(p) => PathElement::LineTo(map(p)),
                    PathElement::QuadTo(c, p) => PathElement::QuadTo(map(c), map(p)),
                    PathElement::Close => PathElement::Close,
                })
                .collect(),
            current: self.current.map(map),
        }
    }

    /// All points referenced by the path, control points included.
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.elements.iter().flat_map(|e| {
            let (a, b) = match *e {
                PathElement::MoveTo(p) | PathElement::LineTo(p) => (Some(p), None),
                PathElement::QuadTo(c, p) => (Some(c), Some(p)),
                PathElement::Close => (None, None),
            };
            a.into_iter().chain(b)
        })
    }

    pub fn bounds(&self) -> Option<Rect> {
        let mut points = self.points();
        let first = points.next()?;
        let (mut min, mut max) = (first, first);
        for p in points {
            min = Point::new(min.x.min(p.x), min.y.min(p.y));
            max = Point::new(max.x.max(p.x), max.y.max(p.y));
        }
        Some(Rect::new(min.x, min.y, max.x - min.x, max.y - min.y))
    }

    /// Flatten curves into polylines.
    pub fn flatten(&self) -> Vec<Polyline> {
        let mut out = Vec::new();
        let mut current = Polyline::default();
        let mut start = Point::default();

        for element in &self.elements {
            match *element {
                PathElement::MoveTo(p) => {
                    if current.points.len() > 1 {
                        out.push(std::mem::take(&mut current));
                    }
                    current.points.clear();
                    current.closed = false;
                    current.points.push(p);
                    start = p;
                }
                PathElement::LineTo(p) => current.points.push(p),
                PathElement::QuadTo(c, p) => {
                    let from = current.points.last().copied().unwrap_or(c);
                    let steps = ((from.distance(c) + c.distance(p)) / 6.0).ceil().clamp(2.0, 64.0) as usize;
                    for i in 1..=steps {
                        let t = i as f32 / steps as f32;
                        let mt = 1.0 - t;
                        current
                            .points
                            .push(from * (mt * mt) + c * (2.0 * mt * t) + p * (t * t));
                    }
                }
                PathElement::Close => {
                    current.closed = true;
                    if current.points.len() > 1 {
                        out.push(std::mem::take(&mut current));
                    }
                    current.points.push(start);
                }
            }
        }
        if current.points.len() > 1 {
            out.push(current);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_composition() {
        let t = Transform::rotate(std::f32::consts::FRAC_PI_2).then(Transform::translate(10.0, 0.0));
        let p = t.apply(Point::new(1.0, 0.0));
        assert!((p.x - 10.0).abs() < 1e-5);
        assert!((p.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_circle_is_closed_and_round() {
        let path = Path::circle(Point::new(5.0, 5.0), 3.0);
        let polys = path.flatten();
        assert_eq!(polys.len(), 1);
        assert!(polys[0].closed);
        for p in &polys[0].points {
            assert!((p.distance(Point::new(5.0, 5.0)) - 3.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_flatten_splits_subpaths() {
        let mut path = Path::line(Point::new(0.0, 0.0), Point::new(1.0, 0.0));
        path.move_to(Point::new(5.0, 5.0));
        path.line_to(Point::new(6.0, 6.0));
        path.move_to(Point::new(9.0, 9.0));
        assert_eq!(path.flatten().len(), 2);
    }

    #[test]
    fn test_bounds_and_normalized_rect() {
        let path = Path::rect(Rect::new(2.0, 3.0, 4.0, 5.0));
        assert_eq!(path.bounds(), Some(Rect::new(2.0, 3.0, 4.0, 5.0)));
        assert_eq!(Rect::new(10.0, 10.0, -4.0, -2.0).normalized(), Rect::new(6.0, 8.0, 4.0, 2.0));
        assert!(Rect::new(0.0, 0.0, 3.0, 0.0).is_empty());
    }

    #[test]
    fn test_line_to_without_current_point_moves() {
        let mut path = Path::new();
        path.line_to(Point::new(1.0, 1.0));
        assert_eq!(path.elements(), &[PathElement::MoveTo(Point::new(1.0, 1.0))]);
    }
}
