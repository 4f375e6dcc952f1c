//! A surface that records draw calls instead of rasterizing them.

use std::cell::RefCell;
use std::rc::Rc;

use image::RgbaImage;

use super::geometry::{Path, Point, Rect};
use super::paint::{Paint, Stroke};
use super::surface::Surface;

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear,
    FillRect { rect: Rect, paint: Paint },
    FillPath { path: Path, paint: Paint },
    StrokePath { path: Path, paint: Paint, stroke: Stroke },
    FillText { text: String, at: Point, size: f32, paint: Paint },
    PutImage { x: i32, y: i32, width: u32, height: u32 },
}

impl DrawCommand {
    /// True for anything other than a clear.
    pub fn is_paint(&self) -> bool {
        !matches!(self, DrawCommand::Clear)
    }

    /// True for fills that cover the whole `width` x `height` area.
    pub fn is_full_fill(&self, width: u32, height: u32) -> bool {
        match self {
            DrawCommand::FillRect { rect, .. } => {
                let r = rect.normalized();
                r.x <= 0.0 && r.y <= 0.0 && r.width >= width as f32 && r.height >= height as f32
            }
            _ => false,
        }
    }
}

/// Shared handle to a recording surface's command list.
///
/// Stays valid after the surface is moved into an engine or recorder.
#[derive(Debug, Clone, Default)]
pub struct CommandLog(Rc<RefCell<Vec<DrawCommand>>>);

impl CommandLog {
    pub fn commands(&self) -> Vec<DrawCommand> {
        self.0.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn count(&self, predicate: impl Fn(&DrawCommand) -> bool) -> usize {
        self.0.borrow().iter().filter(|c| predicate(c)).count()
    }

    /// Remove and return everything recorded so far.
    pub fn take(&self) -> Vec<DrawCommand> {
        std::mem::take(&mut *self.0.borrow_mut())
    }

    fn push(&self, command: DrawCommand) {
        self.0.borrow_mut().push(command);
    }
}

pub struct RecordingSurface {
    width: u32,
    height: u32,
    log: CommandLog,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            log: CommandLog::default(),
        }
    }

    pub fn log(&self) -> CommandLog {
        self.log.clone()
    }
}

impl Surface for RecordingSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn clear(&mut self) {
        self.log.push(DrawCommand::Clear);
    }

    fn fill_rect(&mut self, rect: Rect, paint: &Paint) {
        self.log.push(DrawCommand::FillRect { rect, paint: paint.clone() });
    }

    fn fill_path(&mut self, path: &Path, paint: &Paint) {
        self.log.push(DrawCommand::FillPath {
            path: path.clone(),
            paint: paint.clone(),
        });
    }

    fn stroke_path(&mut self, path: &Path, paint: &Paint, stroke: &Stroke) {
        self.log.push(DrawCommand::StrokePath {
            path: path.clone(),
            paint: paint.clone(),
            stroke: *stroke,
        });
    }

    fn fill_text(&mut self, text: &str, at: Point, size: f32, paint: &Paint) {
        self.log.push(DrawCommand::FillText {
            text: text.to_string(),
            at,
            size,
            paint: paint.clone(),
        });
    }

    fn put_image(&mut self, image: &RgbaImage, x: i32, y: i32) {
        self.log.push(DrawCommand::PutImage {
            x,
            y,
            width: image.width(),
            height: image.height(),
        });
    }

    /// Recording surfaces hold no pixels; the snapshot is fully transparent.
    fn snapshot(&self) -> RgbaImage {
        RgbaImage::new(self.width, self.height)
    }
}
