use nalgebra::Isometry3;
use serde::{Deserialize, Serialize};

/// Identity the tracking engine assigns to one physical target instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetId(pub u64);

impl std::fmt::Display for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "target#{}", self.0)
    }
}

/// Per-frame tracking state reported by the tracking engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingState {
    /// Detected but not (or no longer) confirmed.
    Paused,
    Tracking,
    /// Terminal: the identity will not be reported again.
    Stopped,
}

/// One target as observed on one frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetObservation {
    pub id: TargetId,
    pub state: TrackingState,
    /// Physical width along the target's local x axis.
    pub extent_x: f64,
    /// Physical height along the target's local z axis.
    pub extent_z: f64,
    /// Target centre in world space; the target plane is the local `y = 0` plane.
    pub center_pose: Isometry3<f64>,
}

impl TargetObservation {
    pub fn new(
        id: TargetId,
        state: TrackingState,
        extent_x: f64,
        extent_z: f64,
        center_pose: Isometry3<f64>,
    ) -> Self {
        Self {
            id,
            state,
            extent_x,
            extent_z,
            center_pose,
        }
    }
}
