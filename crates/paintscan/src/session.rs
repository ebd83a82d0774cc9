//! State shared between the per-frame tracking callback and capture requests.
//!
//! The frame callback takes the write lock once per frame. A capture takes
//! the read lock just long enough to clone the latest frame and the active
//! target's corners, then runs the pipeline without holding the lock.

use crate::anchor::{AnchorStore, LocalAnchors};
use crate::capture::{CaptureError, CaptureOrchestrator, CaptureParams, CaptureResult};
use crate::frame::FrameSnapshot;
use crate::lifecycle::{LifecycleEvent, TrackingLifecycleController};
use crate::markers::CaptureTarget;
use crate::{TargetId, TargetObservation};
use log::{debug, warn};
use parking_lot::RwLock;

struct SessionState {
    controller: TrackingLifecycleController,
    anchors: Box<dyn AnchorStore + Send + Sync>,
    latest_frame: Option<FrameSnapshot>,
}

/// A scanning session. Share it behind an `Arc` between the render loop and
/// whatever triggers captures.
pub struct ScanSession {
    orchestrator: CaptureOrchestrator,
    state: RwLock<SessionState>,
}

impl ScanSession {
    /// Session with in-process anchors.
    pub fn new(params: CaptureParams) -> Self {
        Self::with_anchor_store(params, LocalAnchors::new())
    }

    pub fn with_anchor_store<A>(params: CaptureParams, anchors: A) -> Self
    where
        A: AnchorStore + Send + Sync + 'static,
    {
        Self {
            orchestrator: CaptureOrchestrator::new(params),
            state: RwLock::new(SessionState {
                controller: TrackingLifecycleController::new(),
                anchors: Box::new(anchors),
                latest_frame: None,
            }),
        }
    }

    pub fn params(&self) -> &CaptureParams {
        self.orchestrator.params()
    }

    /// Per-frame callback: record the frame and apply its observations.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "trace", skip_all, fields(timestamp = frame.timestamp))
    )]
    pub fn on_tracking_update(
        &self,
        frame: FrameSnapshot,
        observations: &[TargetObservation],
    ) -> Vec<LifecycleEvent> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let events = state
            .controller
            .on_tracking_update(observations, state.anchors.as_mut());
        state.latest_frame = Some(frame);
        events
    }

    /// Consistent view of the latest frame and the active target.
    fn snapshot(&self) -> (Option<FrameSnapshot>, Option<CaptureTarget>) {
        let state = self.state.read();
        let target = state
            .controller
            .active_markers()
            .and_then(|m| m.capture_target());
        (state.latest_frame.clone(), target)
    }

    /// Capture the active target from the latest frame.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip_all))]
    pub fn request_capture(&self) -> Result<CaptureResult, CaptureError> {
        let (frame, target) = self.snapshot();
        let Some(target) = target else {
            warn!("capture failed: {}", CaptureError::NoTarget);
            return Err(CaptureError::NoTarget);
        };
        let Some(frame) = frame else {
            warn!("capture of {} failed: {}", target.id, CaptureError::FrameUnavailable);
            return Err(CaptureError::FrameUnavailable);
        };
        self.orchestrator.capture(&frame, Some(&target))
    }

    pub fn capture_enabled(&self) -> bool {
        self.state.read().controller.capture_enabled()
    }

    pub fn active_target(&self) -> Option<TargetId> {
        self.state.read().controller.active_target()
    }

    /// Number of targets currently owning a `MarkerSet`.
    pub fn live_marker_sets(&self) -> usize {
        self.state.read().controller.live_marker_sets()
    }

    /// World corners of a target's `MarkerSet`, if it has one.
    pub fn capture_target(&self, id: TargetId) -> Option<CaptureTarget> {
        self.state
            .read()
            .controller
            .markers(id)
            .and_then(|m| m.capture_target())
    }

    /// Release every anchor and forget the latest frame.
    pub fn shutdown(&self) -> Vec<LifecycleEvent> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let events = state.controller.reset(state.anchors.as_mut());
        state.latest_frame = None;
        debug!("session shut down, {} events", events.len());
        events
    }
}

#[cfg(feature = "image")]
mod save {
    use super::ScanSession;
    use crate::capture::{CaptureError, CaptureResult};
    use crate::persist::{DirectorySink, SavedCapture};
    use log::warn;

    impl ScanSession {
        /// Capture and write the result through `sink`.
        ///
        /// A write failure is logged and reported as `None`; the capture
        /// itself still succeeds.
        pub fn request_capture_and_save(
            &self,
            sink: &DirectorySink,
        ) -> Result<(CaptureResult, Option<SavedCapture>), CaptureError> {
            let result = self.request_capture()?;
            let saved = match sink.save(&result) {
                Ok(saved) => Some(saved),
                Err(e) => {
                    warn!("failed to save capture of {}: {e}", result.target);
                    None
                }
            };
            Ok((result, saved))
        }
    }
}
