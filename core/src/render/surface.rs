//! The drawing capability shared by live and capture surfaces.

use image::RgbaImage;

use super::geometry::{Path, Point, Rect};
use super::paint::{Paint, Stroke};

/// A fixed-size 2D drawing target.
///
/// Width and height never change for the lifetime of a surface. The live
/// surface and the capture surface are always distinct instances.
pub trait Surface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Reset every pixel to fully transparent.
    fn clear(&mut self);

    fn fill_rect(&mut self, rect: Rect, paint: &Paint);
    fn fill_path(&mut self, path: &Path, paint: &Paint);
    fn stroke_path(&mut self, path: &Path, paint: &Paint, stroke: &Stroke);

    /// Text centered horizontally on `at.x` with its baseline at `at.y`.
    fn fill_text(&mut self, text: &str, at: Point, size: f32, paint: &Paint);

    /// Replace a block of pixels, clipped to the surface.
    fn put_image(&mut self, image: &RgbaImage, x: i32, y: i32);

    /// Copy of the current pixels.
    fn snapshot(&self) -> RgbaImage;

    fn bounds(&self) -> Rect {
        Rect::from_size(self.width(), self.height())
    }

    fn center(&self) -> Point {
        self.bounds().center()
    }
}
