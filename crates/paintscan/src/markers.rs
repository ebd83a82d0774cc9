//! Four corner reference points rigidly attached to a tracked target.

use crate::anchor::{AnchorHandle, AnchorStore};
use crate::{TargetId, TargetObservation};
use nalgebra::{Isometry3, Point3};
use serde::{Deserialize, Serialize};

/// Target corner, named in canonical winding order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

impl Corner {
    /// Canonical winding order. Every corner array in this crate is indexed by it.
    pub const WINDING: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomRight,
        Corner::BottomLeft,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Corner::TopLeft => 0,
            Corner::TopRight => 1,
            Corner::BottomRight => 2,
            Corner::BottomLeft => 3,
        }
    }

    /// Signs of the `(x, z)` half-extent offsets in the anchor's local frame.
    #[inline]
    const fn local_signs(self) -> (f64, f64) {
        match self {
            Corner::TopLeft => (-1.0, -1.0),
            Corner::TopRight => (1.0, -1.0),
            Corner::BottomRight => (1.0, 1.0),
            Corner::BottomLeft => (-1.0, 1.0),
        }
    }
}

impl std::fmt::Display for Corner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Corner::TopLeft => "top-left",
            Corner::TopRight => "top-right",
            Corner::BottomRight => "bottom-right",
            Corner::BottomLeft => "bottom-left",
        };
        f.write_str(name)
    }
}

/// Anchor plus four corner points for one tracked target.
///
/// The anchor pose is captured once, on creation, and never follows later
/// pose updates: the corner geometry is rigid relative to the anchor for the
/// whole tracked lifetime. Not `Clone`; the anchor is released exactly once.
#[derive(Debug, PartialEq)]
pub struct MarkerSet {
    target: TargetId,
    anchor: Option<AnchorHandle>,
    anchor_pose: Isometry3<f64>,
    corners_local: [Point3<f64>; 4],
}

/// World-space corners of the capturable target, detached from anchor ownership.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CaptureTarget {
    pub id: TargetId,
    pub corners_world: [Point3<f64>; 4],
}

impl MarkerSet {
    /// Attach an anchor at the observed centre pose and lay out the corners
    /// at `(±extent_x / 2, 0, ±extent_z / 2)` in its local frame.
    pub fn create(observation: &TargetObservation, anchors: &mut dyn AnchorStore) -> Self {
        let half_x = observation.extent_x.abs() / 2.0;
        let half_z = observation.extent_z.abs() / 2.0;
        let corners_local = Corner::WINDING.map(|c| {
            let (sx, sz) = c.local_signs();
            Point3::new(sx * half_x, 0.0, sz * half_z)
        });
        let anchor = anchors.attach(observation.id, &observation.center_pose);
        Self {
            target: observation.id,
            anchor: Some(anchor),
            anchor_pose: observation.center_pose,
            corners_local,
        }
    }

    #[inline]
    pub fn target(&self) -> TargetId {
        self.target
    }

    /// Anchor handle, `None` once released.
    #[inline]
    pub fn anchor(&self) -> Option<AnchorHandle> {
        self.anchor
    }

    #[inline]
    pub fn anchor_pose(&self) -> &Isometry3<f64> {
        &self.anchor_pose
    }

    #[inline]
    pub fn is_released(&self) -> bool {
        self.anchor.is_none()
    }

    /// Corner offsets in the anchor frame, in winding order.
    #[inline]
    pub fn corners_local(&self) -> &[Point3<f64>; 4] {
        &self.corners_local
    }

    /// World position of one corner.
    #[inline]
    pub fn corner(&self, corner: Corner) -> Point3<f64> {
        self.anchor_pose
            .transform_point(&self.corners_local[corner.index()])
    }

    /// World positions of all four corners, in winding order.
    pub fn corners_world(&self) -> [Point3<f64>; 4] {
        Corner::WINDING.map(|c| self.corner(c))
    }

    /// Snapshot used by the capture path. `None` after release.
    pub fn capture_target(&self) -> Option<CaptureTarget> {
        self.anchor.map(|_| CaptureTarget {
            id: self.target,
            corners_world: self.corners_world(),
        })
    }

    /// Detach the anchor. Idempotent; returns `true` only when this call
    /// released it.
    pub fn release(&mut self, anchors: &mut dyn AnchorStore) -> bool {
        match self.anchor.take() {
            Some(handle) => {
                anchors.detach(handle);
                true
            }
            None => false,
        }
    }
}
