//! One capture request: corners to image space, homography, warp.

use crate::core::{
    canonical_square, homography_from_4pt, rectify, to_image_space, AxisMapping,
    DegenerateInputError, Extent, Homography, Image, ImagePoint, Interpolation, RectifyError,
    RectifyParams,
};
use crate::frame::FrameSnapshot;
use crate::markers::{CaptureTarget, Corner};
use crate::TargetId;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default edge length of the canonical output, in pixels.
pub const DEFAULT_OUTPUT_SIZE: usize = 256;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CaptureError {
    #[error("no active tracked target")]
    NoTarget,
    #[error("no raw frame available")]
    FrameUnavailable,
    #[error("{corner} corner does not project onto the screen")]
    CornerNotVisible { corner: Corner },
    #[error("corner configuration cannot be rectified: {0}")]
    Rectification(#[from] DegenerateInputError),
    #[error("warp failed: {0}")]
    Warp(#[from] RectifyError),
}

/// Output geometry and screen/image relationship for captures.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CaptureParams {
    pub output_size: usize,
    pub interpolation: Interpolation,
    pub background: [u8; 4],
    pub axis_mapping: AxisMapping,
}

impl Default for CaptureParams {
    fn default() -> Self {
        Self {
            output_size: DEFAULT_OUTPUT_SIZE,
            interpolation: Interpolation::Bilinear,
            background: [0; 4],
            axis_mapping: AxisMapping::PORTRAIT_SENSOR,
        }
    }
}

impl CaptureParams {
    pub fn rectify_params(&self) -> RectifyParams {
        RectifyParams {
            width: self.output_size,
            height: self.output_size,
            interpolation: self.interpolation,
            background: self.background,
        }
    }
}

/// Output of a successful capture. The raw image is shared, never modified.
#[derive(Clone, Debug)]
pub struct CaptureResult {
    pub target: TargetId,
    /// Timestamp of the frame the capture was taken from, Unix millis.
    pub timestamp: u64,
    pub raw: Arc<Image>,
    pub rectified: Image,
    /// Target corners in raw-image pixels, winding order.
    pub image_corners: [ImagePoint; 4],
    /// Maps raw-image pixels to rectified pixels.
    pub homography: Homography,
}

/// Runs the capture pipeline against a frame and the active target.
#[derive(Clone, Copy, Debug, Default)]
pub struct CaptureOrchestrator {
    params: CaptureParams,
}

impl CaptureOrchestrator {
    pub fn new(params: CaptureParams) -> Self {
        Self { params }
    }

    #[inline]
    pub fn params(&self) -> &CaptureParams {
        &self.params
    }

    /// Rectify the active target out of `frame`. No retries: a failure is
    /// reported and the caller may try again on a later frame.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", skip_all, fields(timestamp = frame.timestamp))
    )]
    pub fn capture(
        &self,
        frame: &FrameSnapshot,
        active: Option<&CaptureTarget>,
    ) -> Result<CaptureResult, CaptureError> {
        let result = self.capture_inner(frame, active);
        match &result {
            Ok(r) => info!(
                "captured {} at {}: {}x{} -> {}x{}",
                r.target,
                r.timestamp,
                r.raw.width,
                r.raw.height,
                r.rectified.width,
                r.rectified.height
            ),
            Err(e) => warn!("capture failed: {e}"),
        }
        result
    }

    fn capture_inner(
        &self,
        frame: &FrameSnapshot,
        active: Option<&CaptureTarget>,
    ) -> Result<CaptureResult, CaptureError> {
        let target = active.ok_or(CaptureError::NoTarget)?;
        let raw = frame.image.clone().ok_or(CaptureError::FrameUnavailable)?;

        let image_corners = self.project_corners(frame, target, &raw)?;
        let (rectified, homography) = rectify_quad(&raw, &image_corners, &self.params)?;

        Ok(CaptureResult {
            target: target.id,
            timestamp: frame.timestamp,
            raw,
            rectified,
            image_corners,
            homography,
        })
    }

    /// World corners to screen through the renderer, then to raw-image pixels.
    fn project_corners(
        &self,
        frame: &FrameSnapshot,
        target: &CaptureTarget,
        raw: &Image,
    ) -> Result<[ImagePoint; 4], CaptureError> {
        let screen = frame.projector.viewport();
        let image = Extent::from_pixels(raw.width, raw.height);
        let mut out = [ImagePoint::origin(); 4];
        for corner in Corner::WINDING {
            let world = &target.corners_world[corner.index()];
            let on_screen = frame
                .projector
                .world_to_screen(world)
                .ok_or(CaptureError::CornerNotVisible { corner })?;
            out[corner.index()] =
                to_image_space(on_screen, screen, image, self.params.axis_mapping);
        }
        Ok(out)
    }
}

/// Warp the quadrilateral `image_corners` (winding order) of `image` into the
/// canonical square described by `params`.
///
/// Returns the rectified image and the raw-to-rectified homography.
pub fn rectify_quad(
    image: &Image,
    image_corners: &[ImagePoint; 4],
    params: &CaptureParams,
) -> Result<(Image, Homography), CaptureError> {
    if params.output_size == 0 {
        return Err(RectifyError::InvalidOutputSize {
            width: 0,
            height: 0,
        }
        .into());
    }
    let canonical = canonical_square(params.output_size as f64);
    let homography = homography_from_4pt(image_corners, &canonical)?;
    let rectified = rectify(&image.view(), &homography, &params.rectify_params())?;
    Ok((rectified, homography))
}
