//! Inverse-mapping perspective warp into a fixed-size canonical image.

use crate::{sample_bilinear, sample_nearest, Homography, Image, ImageView};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Pixel interpolation used when sampling the source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    #[default]
    Bilinear,
    Nearest,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RectifyError {
    #[error("invalid output size {width}x{height}")]
    InvalidOutputSize { width: usize, height: usize },
    #[error("source image is empty")]
    EmptySource,
    #[error("homography is not invertible")]
    NotInvertible,
}

/// Output geometry and sampling policy for [`rectify`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RectifyParams {
    pub width: usize,
    pub height: usize,
    pub interpolation: Interpolation,
    /// Fill for pixels that map outside the source; the first
    /// `channels` entries are used (all zero = black / transparent).
    pub background: [u8; 4],
}

impl RectifyParams {
    pub fn square(size: usize) -> Self {
        Self {
            width: size,
            height: size,
            interpolation: Interpolation::Bilinear,
            background: [0; 4],
        }
    }
}

/// Warp `src` through `h_dst_from_src` into a `params.width × params.height` image.
///
/// Every destination pixel centre is mapped back through the inverse
/// homography and sampled from the source. Pixels whose preimage falls
/// outside the source, or through the line at infinity, receive the
/// background. The output keeps the source pixel format.
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "debug",
        skip(src, h_dst_from_src, params),
        fields(src_w = src.width, src_h = src.height, out_w = params.width, out_h = params.height)
    )
)]
pub fn rectify(
    src: &ImageView<'_>,
    h_dst_from_src: &Homography,
    params: &RectifyParams,
) -> Result<Image, RectifyError> {
    if params.width == 0 || params.height == 0 {
        return Err(RectifyError::InvalidOutputSize {
            width: params.width,
            height: params.height,
        });
    }
    if src.is_empty() {
        return Err(RectifyError::EmptySource);
    }
    let h_src_from_dst = h_dst_from_src
        .inverse()
        .ok_or(RectifyError::NotInvertible)?;

    let side = visible_side(&h_src_from_dst, params.width, params.height);

    let mut out = Image::try_new(params.width, params.height, src.format, &params.background)
        .map_err(|_| RectifyError::InvalidOutputSize {
            width: params.width,
            height: params.height,
        })?;
    let stride = out.row_stride();

    #[cfg(feature = "rayon")]
    out.data
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row)| warp_row(src, &h_src_from_dst, side, params, y, row));

    #[cfg(not(feature = "rayon"))]
    out.data
        .chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row)| warp_row(src, &h_src_from_dst, side, params, y, row));

    Ok(out)
}

/// `w` of the inverse map on the visible side of the line at infinity.
///
/// The output centre is the target centre, so its preimage is visible. When
/// the centre itself maps to infinity the output origin decides instead.
fn visible_side(h_src_from_dst: &Homography, width: usize, height: usize) -> f64 {
    let centre = Point2::new(width as f64 / 2.0, height as f64 / 2.0);
    let w = h_src_from_dst.w(centre);
    let scale = h_src_from_dst.h.amax() * (1.0 + centre.x.abs() + centre.y.abs());
    if w.abs() > 1e-12 * scale {
        w
    } else {
        h_src_from_dst.w(Point2::origin())
    }
}

/// Fill one destination row. Rows are independent; `row` starts pre-filled
/// with the background.
#[inline]
fn warp_row(
    src: &ImageView<'_>,
    h_src_from_dst: &Homography,
    side: f64,
    params: &RectifyParams,
    y: usize,
    row: &mut [u8],
) {
    let ch = src.channels();
    for (x, px) in row.chunks_mut(ch).enumerate() {
        let p_dst = Point2::new(x as f64 + 0.5, y as f64 + 0.5);
        let Some(p_src) = h_src_from_dst.apply_on_side(p_dst, side) else {
            continue;
        };
        if !src.contains(p_src.x, p_src.y) {
            continue;
        }
        match params.interpolation {
            Interpolation::Bilinear => sample_bilinear(src, p_src.x, p_src.y, px),
            Interpolation::Nearest => sample_nearest(src, p_src.x, p_src.y, px),
        }
    }
}
