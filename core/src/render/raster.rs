//! CPU rasterizer backed by an `image::RgbaImage`.
//!
//! Every draw call first marks its shape into a coverage mask with
//! `imageproc` primitives, then composites the paint through the mask with
//! `image`'s source-over blend. Overlapping pieces of one shape (stroke
//! segments, joins, subpaths) are unioned, so they never double up their
//! alpha. Glow is not rendered, and text is drawn as solid glyph cells.

use image::{GrayImage, Luma, Pixel as _, Rgba as RgbaPixel, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point as MaskPoint;
use imageproc::rect::Rect as MaskRect;

use super::geometry::{Path, Point, Polyline, Rect};
use super::paint::{LineCap, Paint, Shader, Stroke};
use super::surface::Surface;
use crate::color::Rgba;

const COVERED: Luma<u8> = Luma([255]);

/// Shapes are clipped to the surface grown by this many pixels before
/// being handed to the scan converter.
const CLIP_MARGIN: f32 = 2.0;

/// Hairline strokes go straight to the line drawer.
const HAIRLINE_HALF_WIDTH: f32 = 0.75;

pub struct RasterSurface {
    image: RgbaImage,
    /// All zero between draw calls.
    mask: GrayImage,
}

/// Inclusive pixel bounds touched on the mask.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Dirty {
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

/// Builds the coverage of one draw call.
struct Coverage<'a> {
    mask: &'a mut GrayImage,
    dirty: Option<Dirty>,
}

impl<'a> Coverage<'a> {
    fn new(mask: &'a mut GrayImage) -> Self {
        Self { mask, dirty: None }
    }

    fn is_degenerate(&self) -> bool {
        self.mask.width() == 0 || self.mask.height() == 0
    }

    fn clip_min(&self) -> Point {
        Point::new(-CLIP_MARGIN, -CLIP_MARGIN)
    }

    fn clip_max(&self) -> Point {
        Point::new(
            self.mask.width() as f32 + CLIP_MARGIN,
            self.mask.height() as f32 + CLIP_MARGIN,
        )
    }

    fn touch(&mut self, x0: i32, y0: i32, x1: i32, y1: i32) {
        let max_x = self.mask.width() as i32 - 1;
        let max_y = self.mask.height() as i32 - 1;
        if x1 < 0 || y1 < 0 || x0 > max_x || y0 > max_y {
            return;
        }
        let clamp = |v: i32, max: i32| v.clamp(0, max) as u32;
        let next = Dirty {
            x0: clamp(x0, max_x),
            y0: clamp(y0, max_y),
            x1: clamp(x1, max_x),
            y1: clamp(y1, max_y),
        };
        self.dirty = Some(match self.dirty {
            Some(d) => Dirty {
                x0: d.x0.min(next.x0),
                y0: d.y0.min(next.y0),
                x1: d.x1.max(next.x1),
                y1: d.y1.max(next.y1),
            },
            None => next,
        });
    }

    /// Pixels whose centers fall inside the rectangle.
    fn rect(&mut self, rect: Rect) {
        let r = rect.normalized();
        if self.is_degenerate()
            || r.is_empty()
            || !(r.x.is_finite() && r.y.is_finite() && r.width.is_finite() && r.height.is_finite())
        {
            return;
        }
        let (w, h) = (self.mask.width() as f32, self.mask.height() as f32);
        let x0 = (r.x - 0.5).ceil().clamp(0.0, w) as i32;
        let x1 = (r.x + r.width - 0.5).ceil().clamp(0.0, w) as i32;
        let y0 = (r.y - 0.5).ceil().clamp(0.0, h) as i32;
        let y1 = (r.y + r.height - 0.5).ceil().clamp(0.0, h) as i32;
        if x1 <= x0 || y1 <= y0 {
            return;
        }
        let area = MaskRect::at(x0, y0).of_size((x1 - x0) as u32, (y1 - y0) as u32);
        draw_filled_rect_mut(&mut *self.mask, area, COVERED);
        self.touch(x0, y0, x1 - 1, y1 - 1);
    }

    fn polygon(&mut self, points: &[Point]) {
        if self.is_degenerate() || points.len() < 3 || !points.iter().all(|p| p.is_finite()) {
            return;
        }
        let clipped = clip_polygon(points, self.clip_min(), self.clip_max());

        let mut poly: Vec<MaskPoint<i32>> = Vec::with_capacity(clipped.len());
        for p in &clipped {
            let q = MaskPoint::new(p.x.round() as i32, p.y.round() as i32);
            if poly.last() != Some(&q) {
                poly.push(q);
            }
        }
        while poly.len() > 1 && poly.first() == poly.last() {
            poly.pop();
        }

        match poly.len() {
            0 => {}
            1 => self.dot(poly[0].x, poly[0].y),
            2 => self.segment(to_point(poly[0]), to_point(poly[1])),
            _ => {
                let (x0, x1) = poly.iter().fold((i32::MAX, i32::MIN), |(lo, hi), p| (lo.min(p.x), hi.max(p.x)));
                let (y0, y1) = poly.iter().fold((i32::MAX, i32::MIN), |(lo, hi), p| (lo.min(p.y), hi.max(p.y)));
                draw_polygon_mut(&mut *self.mask, &poly, COVERED);
                self.touch(x0, y0, x1, y1);
            }
        }
    }

    fn segment(&mut self, a: Point, b: Point) {
        if self.is_degenerate() || !(a.is_finite() && b.is_finite()) {
            return;
        }
        let Some((a, b)) = clip_segment(a, b, self.clip_min(), self.clip_max()) else {
            return;
        };
        draw_line_segment_mut(&mut *self.mask, (a.x, a.y), (b.x, b.y), COVERED);
        self.touch(
            a.x.min(b.x).floor() as i32,
            a.y.min(b.y).floor() as i32,
            a.x.max(b.x).ceil() as i32,
            a.y.max(b.y).ceil() as i32,
        );
    }

    fn dot(&mut self, x: i32, y: i32) {
        if x >= 0 && y >= 0 && (x as u32) < self.mask.width() && (y as u32) < self.mask.height() {
            self.mask.put_pixel(x as u32, y as u32, COVERED);
            self.touch(x, y, x, y);
        }
    }

    fn disc(&mut self, center: Point, radius: f32) {
        if self.is_degenerate() || !center.is_finite() || !radius.is_finite() {
            return;
        }
        let (min, max) = (self.clip_min(), self.clip_max());
        if center.x + radius < min.x || center.y + radius < min.y || center.x - radius > max.x || center.y - radius > max.y {
            return;
        }
        let (cx, cy) = (center.x.round() as i32, center.y.round() as i32);
        let r = radius.round().max(1.0) as i32;
        draw_filled_circle_mut(&mut *self.mask, (cx, cy), r, COVERED);
        self.touch(cx - r, cy - r, cx + r, cy + r);
    }

    /// Segment quads, disc joins and caps of one flattened subpath.
    fn stroke(&mut self, polyline: &Polyline, stroke: &Stroke) {
        let half = stroke.width.max(1.0) / 2.0;
        let mut points = polyline.points.clone();
        if polyline.closed {
            if let Some(&first) = points.first() {
                points.push(first);
            }
        }
        if points.len() < 2 {
            return;
        }

        let pieces = match stroke.dash {
            Some([on, off]) if on > 0.0 => apply_dash(&points, on, off),
            _ => vec![points],
        };

        for piece in &pieces {
            let last = piece.len() - 1;
            for (i, pair) in piece.windows(2).enumerate() {
                let (mut a, mut b) = (pair[0], pair[1]);
                if half <= HAIRLINE_HALF_WIDTH {
                    self.segment(a, b);
                    continue;
                }
                let len = a.distance(b);
                if len <= 1e-6 {
                    continue;
                }
                let dir = (b - a) * (1.0 / len);
                let normal = Point::new(-dir.y, dir.x) * half;
                if stroke.cap == LineCap::Square && !polyline.closed {
                    if i == 0 {
                        a = a - dir * half;
                    }
                    if i + 1 == last {
                        b = b + dir * half;
                    }
                }
                self.polygon(&[a + normal, b + normal, b - normal, a - normal]);
            }
            if half > 1.0 {
                for &p in &piece[1..last] {
                    self.disc(p, half);
                }
            }
            if stroke.cap == LineCap::Round && half > HAIRLINE_HALF_WIDTH {
                self.disc(piece[0], half);
                self.disc(piece[last], half);
            }
        }
    }

    fn finish(self) -> Option<Dirty> {
        self.dirty
    }
}

fn to_point(p: MaskPoint<i32>) -> Point {
    Point::new(p.x as f32, p.y as f32)
}

/// Sutherland-Hodgman against an axis-aligned box.
fn clip_polygon(points: &[Point], min: Point, max: Point) -> Vec<Point> {
    let mut out = points.to_vec();
    for edge in 0..4 {
        let input = std::mem::take(&mut out);
        if input.is_empty() {
            break;
        }
        let inside = |p: Point| match edge {
            0 => p.x >= min.x,
            1 => p.x <= max.x,
            2 => p.y >= min.y,
            _ => p.y <= max.y,
        };
        let cross = |a: Point, b: Point| {
            let t = match edge {
                0 => (min.x - a.x) / (b.x - a.x),
                1 => (max.x - a.x) / (b.x - a.x),
                2 => (min.y - a.y) / (b.y - a.y),
                _ => (max.y - a.y) / (b.y - a.y),
            };
            a.lerp(b, t)
        };
        for (i, &current) in input.iter().enumerate() {
            let previous = input[(i + input.len() - 1) % input.len()];
            match (inside(previous), inside(current)) {
                (true, true) => out.push(current),
                (true, false) => out.push(cross(previous, current)),
                (false, true) => {
                    out.push(cross(previous, current));
                    out.push(current);
                }
                (false, false) => {}
            }
        }
    }
    out
}

/// Liang-Barsky.
fn clip_segment(a: Point, b: Point, min: Point, max: Point) -> Option<(Point, Point)> {
    let d = b - a;
    let (mut t0, mut t1) = (0.0f32, 1.0f32);
    for (p, q) in [
        (-d.x, a.x - min.x),
        (d.x, max.x - a.x),
        (-d.y, a.y - min.y),
        (d.y, max.y - a.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }
    Some((a + d * t0, a + d * t1))
}

/// Split a polyline into the "on" pieces of a dash pattern.
fn apply_dash(points: &[Point], on: f32, off: f32) -> Vec<Vec<Point>> {
    let mut pieces = Vec::new();
    let mut current = vec![points[0]];
    let mut drawing = true;
    let mut remaining = on;

    for pair in points.windows(2) {
        let (mut a, b) = (pair[0], pair[1]);
        let mut seg = a.distance(b);
        while seg > remaining {
            let split = a.lerp(b, remaining / seg);
            if drawing {
                current.push(split);
                pieces.push(std::mem::take(&mut current));
            } else {
                current = vec![split];
            }
            seg -= remaining;
            a = split;
            drawing = !drawing;
            remaining = if drawing { on } else { off.max(f32::EPSILON) };
        }
        remaining -= seg;
        if drawing {
            current.push(b);
        }
    }
    if drawing && current.len() > 1 {
        pieces.push(current);
    }
    pieces
}

fn to_pixel(color: Rgba) -> RgbaPixel<u8> {
    RgbaPixel([color.r, color.g, color.b, (color.alpha() * 255.0).round() as u8])
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
            mask: GrayImage::new(width, height),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        (x < self.image.width() && y < self.image.height()).then(|| self.image.get_pixel(x, y).0)
    }

    /// Blend the shader through the marked mask pixels and reset them.
    fn composite(&mut self, dirty: Option<Dirty>, shader: &Shader) {
        let Some(d) = dirty else {
            return;
        };
        let solid = match shader {
            Shader::Solid(c) => Some(to_pixel(*c)),
            _ => None,
        };
        for y in d.y0..=d.y1 {
            for x in d.x0..=d.x1 {
                if self.mask.get_pixel(x, y).0[0] == 0 {
                    continue;
                }
                self.mask.put_pixel(x, y, Luma([0]));
                let src = solid.unwrap_or_else(|| to_pixel(shader.color_at(Point::new(x as f32 + 0.5, y as f32 + 0.5))));
                self.image.get_pixel_mut(x, y).blend(&src);
            }
        }
    }
}

impl Surface for RasterSurface {
    fn width(&self) -> u32 {
        self.image.width()
    }

    fn height(&self) -> u32 {
        self.image.height()
    }

    fn clear(&mut self) {
        self.image.pixels_mut().for_each(|p| *p = RgbaPixel([0, 0, 0, 0]));
    }

    fn fill_rect(&mut self, rect: Rect, paint: &Paint) {
        let mut coverage = Coverage::new(&mut self.mask);
        coverage.rect(rect);
        let dirty = coverage.finish();
        self.composite(dirty, &paint.shader);
    }

    fn fill_path(&mut self, path: &Path, paint: &Paint) {
        let mut coverage = Coverage::new(&mut self.mask);
        for polyline in path.flatten() {
            coverage.polygon(&polyline.points);
        }
        let dirty = coverage.finish();
        self.composite(dirty, &paint.shader);
    }

    fn stroke_path(&mut self, path: &Path, paint: &Paint, stroke: &Stroke) {
        let mut coverage = Coverage::new(&mut self.mask);
        for polyline in path.flatten() {
            coverage.stroke(&polyline, stroke);
        }
        let dirty = coverage.finish();
        self.composite(dirty, &paint.shader);
    }

    fn fill_text(&mut self, text: &str, at: Point, size: f32, paint: &Paint) {
        let advance = size * 0.6;
        let total = advance * text.chars().count() as f32;
        let left = at.x - total / 2.0;
        let mut coverage = Coverage::new(&mut self.mask);
        for (i, c) in text.chars().enumerate() {
            if !c.is_whitespace() {
                coverage.rect(Rect::new(left + i as f32 * advance, at.y - size * 0.7, size * 0.5, size * 0.7));
            }
        }
        let dirty = coverage.finish();
        self.composite(dirty, &paint.shader);
    }

    fn put_image(&mut self, image: &RgbaImage, x: i32, y: i32) {
        image::imageops::replace(&mut self.image, image, x as i64, y as i64);
    }

    fn snapshot(&self) -> RgbaImage {
        self.image.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;

    #[test]
    fn test_fill_rect_covers_pixel_centers() {
        let mut surface = RasterSurface::new(8, 8);
        surface.fill_rect(Rect::new(2.0, 2.0, 3.0, 2.0), &Paint::solid(Rgb::new(255, 0, 0)));
        assert_eq!(surface.pixel(2, 2), Some([255, 0, 0, 255]));
        assert_eq!(surface.pixel(4, 3), Some([255, 0, 0, 255]));
        assert_eq!(surface.pixel(5, 3), Some([0, 0, 0, 0]));
        assert_eq!(surface.pixel(2, 4), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_translucent_fill_blends_over_opaque() {
        let mut surface = RasterSurface::new(4, 4);
        let bounds = surface.bounds();
        surface.fill_rect(bounds, &Paint::solid(Rgb::WHITE));
        surface.fill_rect(bounds, &Paint::solid(Rgb::BLACK.with_alpha(0.5)));
        let [r, g, b, a] = surface.pixel(1, 1).unwrap();
        assert_eq!(a, 255);
        assert!((125..=129).contains(&r) && r == g && g == b);
    }

    #[test]
    fn test_circle_fill_stays_inside_radius() {
        let mut surface = RasterSurface::new(21, 21);
        surface.fill_path(&Path::circle(Point::new(10.5, 10.5), 5.0), &Paint::solid(Rgb::WHITE));
        assert_eq!(surface.pixel(10, 10).map(|p| p[3]), Some(255));
        assert_eq!(surface.pixel(0, 0).map(|p| p[3]), Some(0));
        assert_eq!(surface.pixel(10, 18).map(|p| p[3]), Some(0));
    }

    #[test]
    fn test_overlapping_stroke_segments_do_not_double_alpha() {
        let mut surface = RasterSurface::new(20, 20);
        let path = Path::polyline(
            &[Point::new(2.0, 10.0), Point::new(18.0, 10.0), Point::new(2.0, 10.5)],
            false,
        );
        surface.stroke_path(&path, &Paint::solid(Rgb::WHITE.with_alpha(0.5)), &Stroke::new(4.0));
        let alpha = surface.pixel(10, 10).map(|p| p[3]).unwrap();
        assert!((127..=128).contains(&alpha), "alpha {alpha}");
    }

    #[test]
    fn test_dashed_stroke_leaves_gaps() {
        let mut surface = RasterSurface::new(40, 5);
        let path = Path::line(Point::new(0.0, 2.5), Point::new(40.0, 2.5));
        surface.stroke_path(&path, &Paint::solid(Rgb::WHITE), &Stroke::new(2.0).dashed(5.0, 5.0));
        assert_eq!(surface.pixel(2, 2).map(|p| p[3]), Some(255));
        assert_eq!(surface.pixel(7, 2).map(|p| p[3]), Some(0));
        assert_eq!(surface.pixel(12, 2).map(|p| p[3]), Some(255));
    }

    #[test]
    fn test_far_off_shapes_are_clipped() {
        let mut surface = RasterSurface::new(10, 10);
        let paint = Paint::solid(Rgb::WHITE);
        let wide = Path::polyline(
            &[Point::new(-1.0e9, 2.0), Point::new(1.0e9, 2.0), Point::new(1.0e9, 6.0), Point::new(-1.0e9, 6.0)],
            true,
        );
        surface.fill_path(&wide, &paint);
        surface.stroke_path(&Path::line(Point::new(5.0, -1.0e9), Point::new(5.0, 1.0e9)), &paint, &Stroke::new(1.0));
        assert_eq!(surface.pixel(0, 4).map(|p| p[3]), Some(255));
        assert_eq!(surface.pixel(5, 9).map(|p| p[3]), Some(255));
        assert_eq!(surface.pixel(0, 9).map(|p| p[3]), Some(0));
    }

    #[test]
    fn test_linear_gradient_varies_across_fill() {
        let mut surface = RasterSurface::new(10, 2);
        let paint = Paint {
            shader: Shader::Linear {
                start: Point::new(0.0, 0.0),
                end: Point::new(10.0, 0.0),
                stops: vec![
                    crate::render::GradientStop::new(0.0, Rgb::BLACK),
                    crate::render::GradientStop::new(1.0, Rgb::WHITE),
                ],
            },
            glow: None,
        };
        let bounds = surface.bounds();
        surface.fill_rect(bounds, &paint);
        let left = surface.pixel(0, 0).unwrap()[0];
        let right = surface.pixel(9, 0).unwrap()[0];
        assert!(left < 30 && right > 225, "{left} .. {right}");
    }

    #[test]
    fn test_mask_is_reset_between_calls() {
        let mut surface = RasterSurface::new(6, 6);
        surface.fill_rect(Rect::new(0.0, 0.0, 3.0, 3.0), &Paint::solid(Rgb::WHITE));
        surface.fill_rect(Rect::new(3.0, 3.0, 3.0, 3.0), &Paint::solid(Rgb::new(255, 0, 0)));
        assert_eq!(surface.pixel(1, 1), Some([255, 255, 255, 255]));
        assert_eq!(surface.pixel(4, 4), Some([255, 0, 0, 255]));
        assert!(surface.mask.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn test_put_image_replaces_and_clips() {
        let mut surface = RasterSurface::new(4, 4);
        let bounds = surface.bounds();
        surface.fill_rect(bounds, &Paint::solid(Rgb::WHITE));
        let block = RgbaImage::from_pixel(3, 3, RgbaPixel([1, 2, 3, 0]));
        surface.put_image(&block, 2, 2);
        assert_eq!(surface.pixel(3, 3), Some([1, 2, 3, 0]));
        assert_eq!(surface.pixel(1, 1), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_clear_resets_to_transparent() {
        let mut surface = RasterSurface::new(2, 2);
        let bounds = surface.bounds();
        surface.fill_rect(bounds, &Paint::solid(Rgb::WHITE));
        surface.clear();
        assert!(surface.snapshot().pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }
}
