//! Geometry and resampling core for de-skewing photographed planar targets.
//!
//! This crate is purely geometric. It knows nothing about tracking or
//! anchors; it only converts between screen and image space, estimates a
//! four-point homography, and warps an image into a canonical square.
//!
//! ```
//! use nalgebra::Point2;
//! use paintscan_core::{
//!     canonical_square, homography_from_4pt, rectify, Image, PixelFormat, RectifyParams,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let photo = Image::new(640, 480, PixelFormat::Rgb8, &[200, 180, 160]);
//! let quad = [
//!     Point2::new(120.0, 80.0),
//!     Point2::new(520.0, 100.0),
//!     Point2::new(500.0, 420.0),
//!     Point2::new(140.0, 400.0),
//! ];
//! let h = homography_from_4pt(&quad, &canonical_square(256.0))?;
//! let out = rectify(&photo.view(), &h, &RectifyParams::square(256))?;
//! assert_eq!((out.width, out.height), (256, 256));
//! # Ok(())
//! # }
//! ```

mod coords;
mod homography;
mod image;
mod logger;
mod rectify;

pub use coords::{to_image_space, to_screen_space, AxisMapping, Extent, ImagePoint, ScreenPoint};
pub use homography::{homography_from_4pt, DegenerateInputError, Homography};
pub use image::{sample_bilinear, sample_nearest, Image, ImageError, ImageView, PixelFormat};
pub use rectify::{rectify, Interpolation, RectifyError, RectifyParams};

#[cfg(feature = "tracing")]
pub use logger::{init_tracing, DEFAULT_TRACING_FILTER};

pub use logger::{init_logger, init_with_level, LogFilter, FRAME_RATE_TARGETS};

/// Corners of the `size × size` canonical square in winding order:
/// top-left, top-right, bottom-right, bottom-left.
pub fn canonical_square(size: f64) -> [ImagePoint; 4] {
    [
        ImagePoint::new(0.0, 0.0),
        ImagePoint::new(size, 0.0),
        ImagePoint::new(size, size),
        ImagePoint::new(0.0, size),
    ]
}
