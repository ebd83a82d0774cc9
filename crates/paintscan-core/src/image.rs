//! Interleaved 8-bit pixel buffers and sub-pixel sampling.
//!
//! Coordinates passed to the samplers are continuous image coordinates:
//! pixel `(i, j)` covers `[i, i + 1) × [j, j + 1)` and its centre sits at
//! `(i + 0.5, j + 0.5)`.

use serde::{Deserialize, Serialize};

/// Channel layout of an interleaved 8-bit image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    Gray8,
    Rgb8,
    Rgba8,
}

impl PixelFormat {
    #[inline]
    pub const fn channels(self) -> usize {
        match self {
            PixelFormat::Gray8 => 1,
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    #[error("invalid image dimensions (width={width}, height={height})")]
    InvalidDimensions { width: usize, height: usize },
    #[error("invalid pixel buffer length (expected {expected} bytes, got {got})")]
    InvalidBufferLength { expected: usize, got: usize },
    #[error("cannot allocate a {bytes}-byte pixel buffer")]
    AllocationFailed { bytes: usize },
}

fn buffer_len(width: usize, height: usize, format: PixelFormat) -> Option<usize> {
    width.checked_mul(height)?.checked_mul(format.channels())
}

fn checked_buffer_len(
    width: usize,
    height: usize,
    format: PixelFormat,
    got: usize,
) -> Result<(), ImageError> {
    let expected =
        buffer_len(width, height, format).ok_or(ImageError::InvalidDimensions { width, height })?;
    if expected != got {
        return Err(ImageError::InvalidBufferLength { expected, got });
    }
    Ok(())
}

/// Borrowed row-major image, `data.len() == width * height * channels`.
#[derive(Clone, Copy, Debug)]
pub struct ImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub format: PixelFormat,
    pub data: &'a [u8],
}

impl<'a> ImageView<'a> {
    pub fn new(
        width: usize,
        height: usize,
        format: PixelFormat,
        data: &'a [u8],
    ) -> Result<Self, ImageError> {
        checked_buffer_len(width, height, format, data.len())?;
        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.format.channels()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Channels of pixel `(x, y)`. Panics when out of bounds.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> &'a [u8] {
        let ch = self.channels();
        let start = (y * self.width + x) * ch;
        &self.data[start..start + ch]
    }

    /// True when the continuous coordinate lies inside `[0, w) × [0, h)`.
    #[inline]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= 0.0 && y >= 0.0 && x < self.width as f64 && y < self.height as f64
    }

    #[inline]
    fn clamped_pixel(&self, x: i64, y: i64) -> &'a [u8] {
        let x = x.clamp(0, self.width as i64 - 1) as usize;
        let y = y.clamp(0, self.height as i64 - 1) as usize;
        self.pixel(x, y)
    }
}

/// Owned row-major image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    pub width: usize,
    pub height: usize,
    pub format: PixelFormat,
    pub data: Vec<u8>,
}

impl Image {
    /// Allocate an image with every pixel set to `fill`.
    ///
    /// Only the first `format.channels()` entries of `fill` are used; missing
    /// entries are treated as zero. Panics when the buffer size overflows or
    /// cannot be allocated; see [`Image::try_new`].
    pub fn new(width: usize, height: usize, format: PixelFormat, fill: &[u8]) -> Self {
        match Self::try_new(width, height, format, fill) {
            Ok(img) => img,
            Err(e) => panic!("{e}"),
        }
    }

    /// Fallible [`Image::new`] for sizes that come from user input.
    pub fn try_new(
        width: usize,
        height: usize,
        format: PixelFormat,
        fill: &[u8],
    ) -> Result<Self, ImageError> {
        let len = buffer_len(width, height, format)
            .ok_or(ImageError::InvalidDimensions { width, height })?;
        let ch = format.channels();
        let mut px = [0u8; 4];
        for (dst, src) in px.iter_mut().zip(fill.iter()) {
            *dst = *src;
        }
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| ImageError::AllocationFailed { bytes: len })?;
        for _ in 0..width * height {
            data.extend_from_slice(&px[..ch]);
        }
        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    pub fn from_raw(
        width: usize,
        height: usize,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> Result<Self, ImageError> {
        checked_buffer_len(width, height, format, data.len())?;
        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    #[inline]
    pub fn view(&self) -> ImageView<'_> {
        ImageView {
            width: self.width,
            height: self.height,
            format: self.format,
            data: &self.data,
        }
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.format.channels()
    }

    #[inline]
    pub fn row_stride(&self) -> usize {
        self.width * self.channels()
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> &[u8] {
        let ch = self.channels();
        let start = (y * self.width + x) * ch;
        &self.data[start..start + ch]
    }

    #[inline]
    pub fn pixel_mut(&mut self, x: usize, y: usize) -> &mut [u8] {
        let ch = self.channels();
        let start = (y * self.width + x) * ch;
        &mut self.data[start..start + ch]
    }
}

/// Nearest-neighbour sample at continuous coordinate `(x, y)` into `out`.
///
/// Coordinates outside the image are clamped to the border pixel; callers
/// that need a background decide that before sampling.
#[inline]
pub fn sample_nearest(src: &ImageView<'_>, x: f64, y: f64, out: &mut [u8]) {
    if src.is_empty() {
        return;
    }
    let px = src.clamped_pixel(x.floor() as i64, y.floor() as i64);
    for (o, v) in out.iter_mut().zip(px) {
        *o = *v;
    }
}

/// Bilinear sample at continuous coordinate `(x, y)` into `out`.
///
/// Interpolates between the four nearest pixel centres, clamping the
/// neighbourhood at the image border.
#[inline]
pub fn sample_bilinear(src: &ImageView<'_>, x: f64, y: f64, out: &mut [u8]) {
    if src.is_empty() {
        return;
    }
    let cx = x - 0.5;
    let cy = y - 0.5;
    let x0 = cx.floor();
    let y0 = cy.floor();
    let fx = cx - x0;
    let fy = cy - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let p00 = src.clamped_pixel(x0, y0);
    let p10 = src.clamped_pixel(x0 + 1, y0);
    let p01 = src.clamped_pixel(x0, y0 + 1);
    let p11 = src.clamped_pixel(x0 + 1, y0 + 1);

    for (c, o) in out.iter_mut().enumerate().take(src.channels()) {
        let a = p00[c] as f64 + fx * (p10[c] as f64 - p00[c] as f64);
        let b = p01[c] as f64 + fx * (p11[c] as f64 - p01[c] as f64);
        let v = a + fy * (b - a);
        *o = v.round().clamp(0.0, 255.0) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_gray(w: usize, h: usize) -> Image {
        let mut data = Vec::with_capacity(w * h);
        for y in 0..h {
            for x in 0..w {
                data.push((x * 10 + y) as u8);
            }
        }
        Image::from_raw(w, h, PixelFormat::Gray8, data).expect("valid buffer")
    }

    #[test]
    fn from_raw_rejects_wrong_length() {
        let err = Image::from_raw(4, 4, PixelFormat::Rgb8, vec![0; 47]).unwrap_err();
        assert_eq!(
            err,
            ImageError::InvalidBufferLength {
                expected: 48,
                got: 47
            }
        );
    }

    #[test]
    fn new_fills_every_channel() {
        let img = Image::new(3, 2, PixelFormat::Rgba8, &[1, 2, 3, 4]);
        assert_eq!(img.data.len(), 24);
        assert_eq!(img.pixel(2, 1), &[1, 2, 3, 4]);

        let gray = Image::new(2, 2, PixelFormat::Gray8, &[9, 8, 7, 6]);
        assert_eq!(gray.data, vec![9; 4]);
    }

    #[test]
    fn bilinear_at_pixel_centre_is_exact() {
        let img = ramp_gray(8, 6);
        let view = img.view();
        let mut out = [0u8];
        for y in 0..6 {
            for x in 0..8 {
                sample_bilinear(&view, x as f64 + 0.5, y as f64 + 0.5, &mut out);
                assert_eq!(out[0], img.pixel(x, y)[0]);
            }
        }
    }

    #[test]
    fn bilinear_interpolates_between_centres() {
        let img = ramp_gray(8, 6);
        let mut out = [0u8];
        // halfway between (2,3) and (3,3): 23 and 33
        sample_bilinear(&img.view(), 3.0, 3.5, &mut out);
        assert_eq!(out[0], 28);
    }

    #[test]
    fn nearest_picks_containing_pixel() {
        let img = ramp_gray(8, 6);
        let mut out = [0u8];
        sample_nearest(&img.view(), 4.99, 2.01, &mut out);
        assert_eq!(out[0], img.pixel(4, 2)[0]);
    }

    #[test]
    fn samplers_clamp_at_border() {
        let img = ramp_gray(8, 6);
        let mut out = [0u8];
        sample_bilinear(&img.view(), 0.1, 0.1, &mut out);
        assert_eq!(out[0], img.pixel(0, 0)[0]);
        sample_nearest(&img.view(), 100.0, -3.0, &mut out);
        assert_eq!(out[0], img.pixel(7, 0)[0]);
    }

    #[test]
    fn contains_uses_half_open_bounds() {
        let img = ramp_gray(8, 6);
        let v = img.view();
        assert!(v.contains(0.0, 0.0));
        assert!(v.contains(7.999, 5.999));
        assert!(!v.contains(8.0, 1.0));
        assert!(!v.contains(1.0, -0.001));
    }

    #[test]
    fn try_new_reports_overflowing_sizes() {
        let huge = usize::MAX / 2;
        assert_eq!(
            Image::try_new(huge, 3, PixelFormat::Rgb8, &[0]).unwrap_err(),
            ImageError::InvalidDimensions {
                width: huge,
                height: 3
            }
        );
        let img = Image::try_new(2, 1, PixelFormat::Gray8, &[5]).expect("small");
        assert_eq!(img.data, vec![5, 5]);
    }
}
