//! Per-tick background painting.

use crate::modes::RenderParameters;
use crate::render::{Paint, Surface};

/// Alpha of the fill laid over the previous frame. Anything below 1 leaves
/// fading trails.
pub const TRAIL_ALPHA: f32 = 0.15;

/// Paint the background for one tick.
///
/// A transparent background, or `force_transparent`, clears the surface
/// outright and paints nothing. Solid backgrounds lay a translucent fill
/// over the last frame.
pub fn paint_background(params: &RenderParameters, surface: &mut dyn Surface, force_transparent: bool) {
    let color = if force_transparent {
        None
    } else {
        params.background_color()
    };

    match color {
        None => surface.clear(),
        Some(color) => {
            let bounds = surface.bounds();
            surface.fill_rect(bounds, &Paint::solid(color.with_alpha(TRAIL_ALPHA)));
        }
    }
}
