//! Anchors are world-space reference frames owned by the tracking engine.
//!
//! The engine is an external collaborator; this module only describes the
//! boundary (`AnchorStore`) and ships a local implementation that mints
//! handles itself, used when no engine-side anchors are needed and in tests.

use crate::TargetId;
use nalgebra::Isometry3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Opaque handle to an anchor created through an [`AnchorStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnchorHandle(pub u64);

/// Creates and releases anchors on behalf of marker sets.
pub trait AnchorStore {
    /// Create an anchor fixed at `pose` on behalf of `target`.
    fn attach(&mut self, target: TargetId, pose: &Isometry3<f64>) -> AnchorHandle;

    /// Release an anchor. Unknown or already released handles are ignored.
    fn detach(&mut self, handle: AnchorHandle);
}

/// In-process anchor bookkeeping.
#[derive(Debug, Default)]
pub struct LocalAnchors {
    next: u64,
    live: HashMap<AnchorHandle, (TargetId, Isometry3<f64>)>,
    created: usize,
    released: usize,
}

impl LocalAnchors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of anchors attached and not yet detached.
    pub fn live(&self) -> usize {
        self.live.len()
    }

    /// Total anchors ever attached.
    pub fn created(&self) -> usize {
        self.created
    }

    /// Total anchors actually detached (repeat detaches are not counted).
    pub fn released(&self) -> usize {
        self.released
    }

    pub fn pose(&self, handle: AnchorHandle) -> Option<&Isometry3<f64>> {
        self.live.get(&handle).map(|(_, pose)| pose)
    }

    pub fn owner(&self, handle: AnchorHandle) -> Option<TargetId> {
        self.live.get(&handle).map(|(target, _)| *target)
    }
}

impl AnchorStore for LocalAnchors {
    fn attach(&mut self, target: TargetId, pose: &Isometry3<f64>) -> AnchorHandle {
        let handle = AnchorHandle(self.next);
        self.next += 1;
        self.created += 1;
        self.live.insert(handle, (target, *pose));
        handle
    }

    fn detach(&mut self, handle: AnchorHandle) {
        if self.live.remove(&handle).is_some() {
            self.released += 1;
        }
    }
}
