//! Translucent rendering of draggable regions on top of camera frames.

use crate::image::{draw, BlendMode, Color, Image};
use crate::region::DraggableRegion;

/// Width of the opaque border drawn around every region.
pub const BORDER_WIDTH: u32 = 2;

/// Renders `regions` onto a copy of `frame`.
///
/// Every pixel covered by at least one region is mixed with that region's color at an alpha of
/// [`BlendMode::DEFAULT_ALPHA`]. Overlapping regions are blended once, with the color of the
/// region that comes last. An opaque border is drawn around each region afterwards. Pixels outside
/// of all regions keep their original value.
pub fn render(frame: &Image, regions: &[DraggableRegion]) -> Image {
    render_with_alpha(frame, regions, BlendMode::DEFAULT_ALPHA)
}

/// Like [`render`], with a custom fill alpha.
pub fn render_with_alpha(frame: &Image, regions: &[DraggableRegion], alpha: f32) -> Image {
    let mut fill = Image::filled(frame.width(), frame.height(), Color::NULL);
    for region in regions {
        draw::rect(&mut fill, region.rect())
            .color(region.color())
            .filled();
    }

    let mut out = frame.clone();
    out.blend_from(&fill).mode(BlendMode::Mix { alpha });

    for region in regions {
        draw::rect(&mut out, region.rect())
            .color(region.color())
            .stroke_width(BORDER_WIDTH);
    }
    out
}
