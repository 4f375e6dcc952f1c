//! Drawing surfaces.
//!
//! This module provides:
//! - Geometry: points, rectangles, affine transforms, paths
//! - Paint: solid colors, linear and radial gradients, stroke styles
//! - The `Surface` capability trait both render loops draw through
//! - `RecordingSurface`, which logs draw calls for inspection
//! - `RasterSurface`, a CPU rasterizer over `image::RgbaImage`

pub mod geometry;
pub mod paint;
pub mod raster;
pub mod recording;
pub mod surface;

pub use geometry::{Path, PathElement, Point, Polyline, Rect, Transform};
pub use paint::{GradientStop, Glow, LineCap, Paint, Shader, Stroke};
pub use raster::RasterSurface;
pub use recording::{CommandLog, DrawCommand, RecordingSurface};
pub use surface::Surface;
