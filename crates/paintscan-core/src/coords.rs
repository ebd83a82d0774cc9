//! Conversions between display (screen) space and sensor image space.
//!
//! The rendering surface and the raw camera image generally disagree on both
//! aspect ratio and axis orientation: in portrait use the sensor image is
//! rotated 90° relative to the display. A mapping normalises the screen point
//! to `[0, 1]²`, optionally swaps the axes, optionally flips each axis, and
//! finally scales by the image size.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Point in display space, pixels of the rendering surface, origin top-left.
pub type ScreenPoint = Point2<f64>;

/// Point in source-image pixel space, origin top-left, x along columns.
pub type ImagePoint = Point2<f64>;

/// Width and height of a surface or image, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub width: f64,
    pub height: f64,
}

impl Extent {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn from_pixels(width: usize, height: usize) -> Self {
        Self::new(width as f64, height as f64)
    }
}

/// How the normalised screen axes relate to the normalised image axes.
///
/// Applied in order: swap, then flip x, then flip y (flips act on the
/// already-swapped axes, i.e. in image orientation).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AxisMapping {
    #[serde(default)]
    pub swap_axes: bool,
    #[serde(default)]
    pub flip_x: bool,
    #[serde(default)]
    pub flip_y: bool,
}

impl AxisMapping {
    /// Screen and image share orientation.
    pub const IDENTITY: Self = Self {
        swap_axes: false,
        flip_x: false,
        flip_y: false,
    };

    /// Portrait display over a landscape back-camera sensor:
    /// `image.x = screen.y / H * image_w`, `image.y = (1 - screen.x / W) * image_h`.
    pub const PORTRAIT_SENSOR: Self = Self {
        swap_axes: true,
        flip_x: false,
        flip_y: true,
    };

    pub const fn new(swap_axes: bool, flip_x: bool, flip_y: bool) -> Self {
        Self {
            swap_axes,
            flip_x,
            flip_y,
        }
    }

    #[inline]
    fn forward(self, u: f64, v: f64) -> (f64, f64) {
        let (mut u, mut v) = if self.swap_axes { (v, u) } else { (u, v) };
        if self.flip_x {
            u = 1.0 - u;
        }
        if self.flip_y {
            v = 1.0 - v;
        }
        (u, v)
    }

    #[inline]
    fn backward(self, mut u: f64, mut v: f64) -> (f64, f64) {
        if self.flip_y {
            v = 1.0 - v;
        }
        if self.flip_x {
            u = 1.0 - u;
        }
        if self.swap_axes {
            (v, u)
        } else {
            (u, v)
        }
    }
}

#[inline]
fn normalize(value: f64, size: f64) -> f64 {
    if size > 0.0 && value.is_finite() {
        (value / size).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Map a screen point into image pixel coordinates.
///
/// Points outside the surface are clamped onto its border, so the result
/// always lies within `[0, image.width] × [0, image.height]`. A zero-sized
/// surface maps everything to its origin.
pub fn to_image_space(
    point: ScreenPoint,
    screen: Extent,
    image: Extent,
    mapping: AxisMapping,
) -> ImagePoint {
    let u = normalize(point.x, screen.width);
    let v = normalize(point.y, screen.height);
    let (u, v) = mapping.forward(u, v);
    Point2::new(u * image.width.max(0.0), v * image.height.max(0.0))
}

/// Inverse of [`to_image_space`] for points inside the image.
pub fn to_screen_space(
    point: ImagePoint,
    screen: Extent,
    image: Extent,
    mapping: AxisMapping,
) -> ScreenPoint {
    let u = normalize(point.x, image.width);
    let v = normalize(point.y, image.height);
    let (u, v) = mapping.backward(u, v);
    Point2::new(u * screen.width.max(0.0), v * screen.height.max(0.0))
}
