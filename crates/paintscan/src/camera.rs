//! World-to-screen projection supplied by the renderer.

use crate::core::{Extent, ScreenPoint};
use nalgebra::{Isometry3, Point3};

/// Projects world positions onto the rendering surface.
pub trait ScreenProjector {
    /// Screen position of `world`, or `None` when it cannot be seen
    /// (behind the camera, or otherwise not projectable).
    fn world_to_screen(&self, world: &Point3<f64>) -> Option<ScreenPoint>;

    /// Current size of the rendering surface.
    fn viewport(&self) -> Extent;
}

/// Ideal pinhole camera: looks along its local +z, image y points down.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PinholeCamera {
    pub world_from_camera: Isometry3<f64>,
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
    pub viewport: Extent,
}

/// Points closer than this to the camera plane are not visible.
const MIN_DEPTH: f64 = 1e-9;

impl PinholeCamera {
    pub fn new(
        world_from_camera: Isometry3<f64>,
        fx: f64,
        fy: f64,
        cx: f64,
        cy: f64,
        viewport: Extent,
    ) -> Self {
        Self {
            world_from_camera,
            fx,
            fy,
            cx,
            cy,
            viewport,
        }
    }

    /// Square pixels with the principal point in the middle of the viewport.
    pub fn centered(world_from_camera: Isometry3<f64>, focal: f64, viewport: Extent) -> Self {
        Self::new(
            world_from_camera,
            focal,
            focal,
            viewport.width / 2.0,
            viewport.height / 2.0,
            viewport,
        )
    }
}

impl ScreenProjector for PinholeCamera {
    fn world_to_screen(&self, world: &Point3<f64>) -> Option<ScreenPoint> {
        let p = self.world_from_camera.inverse_transform_point(world);
        if p.z <= MIN_DEPTH || !p.z.is_finite() {
            return None;
        }
        Some(ScreenPoint::new(
            self.fx * p.x / p.z + self.cx,
            self.fy * p.y / p.z + self.cy,
        ))
    }

    fn viewport(&self) -> Extent {
        self.viewport
    }
}
