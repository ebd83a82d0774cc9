//! Debug overlay marking where each target corner landed in the raw image.

use crate::core::{Image, ImagePoint, PixelFormat};
use crate::markers::Corner;

/// Ring colour per corner, winding order: red, green, blue, olive.
pub const CORNER_COLORS: [[u8; 3]; 4] = [[255, 0, 0], [0, 255, 0], [0, 0, 255], [125, 125, 0]];

/// Ring radius in pixels for an image of the given size.
pub fn default_ring_radius(width: usize, height: usize) -> f64 {
    (width.min(height) as f64 / 60.0).max(4.0)
}

/// Copy `image` and draw a ring around every corner.
///
/// The image's own corners get a ring twice the size in the same colours,
/// so a corner list in the wrong winding order shows up as mismatched
/// colours between each target ring and the nearest frame ring.
///
/// Corners outside the image are clipped, not rejected. Gray images get the
/// luma of the corner colour, RGBA images an opaque ring.
pub fn annotate_corners(image: &Image, corners: &[ImagePoint; 4], radius: f64) -> Image {
    let mut out = image.clone();
    let thickness = (radius / 4.0).max(1.5);
    let (w, h) = (image.width as f64, image.height as f64);
    let frame = [
        ImagePoint::new(0.0, 0.0),
        ImagePoint::new(w, 0.0),
        ImagePoint::new(w, h),
        ImagePoint::new(0.0, h),
    ];
    for corner in Corner::WINDING {
        let i = corner.index();
        draw_ring(&mut out, corners[i], radius, thickness, CORNER_COLORS[i]);
    }
    for corner in Corner::WINDING {
        let i = corner.index();
        draw_ring(&mut out, frame[i], 2.0 * radius, 2.0 * thickness, CORNER_COLORS[i]);
    }
    out
}

fn draw_ring(img: &mut Image, center: ImagePoint, radius: f64, thickness: f64, rgb: [u8; 3]) {
    if img.width == 0 || img.height == 0 || !center.x.is_finite() || !center.y.is_finite() {
        return;
    }
    let reach = radius + thickness;
    let x0 = (center.x - reach).floor().max(0.0) as usize;
    let y0 = (center.y - reach).floor().max(0.0) as usize;
    let x1 = (center.x + reach).ceil().min(img.width as f64 - 1.0);
    let y1 = (center.y + reach).ceil().min(img.height as f64 - 1.0);
    if x1 < 0.0 || y1 < 0.0 {
        return;
    }
    let (x1, y1) = (x1 as usize, y1 as usize);

    let half = thickness / 2.0;
    for y in y0..=y1 {
        for x in x0..=x1 {
            let dx = x as f64 + 0.5 - center.x;
            let dy = y as f64 + 0.5 - center.y;
            if ((dx * dx + dy * dy).sqrt() - radius).abs() <= half {
                paint(img.format, img.pixel_mut(x, y), rgb);
            }
        }
    }
}

#[inline]
fn paint(format: PixelFormat, px: &mut [u8], rgb: [u8; 3]) {
    match format {
        PixelFormat::Gray8 => {
            let luma = 0.299 * rgb[0] as f32 + 0.587 * rgb[1] as f32 + 0.114 * rgb[2] as f32;
            px[0] = luma.round() as u8;
        }
        PixelFormat::Rgb8 => px.copy_from_slice(&rgb),
        PixelFormat::Rgba8 => {
            px[..3].copy_from_slice(&rgb);
            px[3] = 255;
        }
    }
}
