//! Per-target tracking state machine and the "active capturable target".
//!
//! | last seen        | observed   | action                                   |
//! |------------------|------------|------------------------------------------|
//! | none             | `Paused`   | remember as detected                     |
//! | none / `Paused`  | `Tracking` | create `MarkerSet`, make target active   |
//! | `Tracking`       | `Tracking` | nothing                                  |
//! | `Tracking`       | `Paused`   | keep `MarkerSet` and active status       |
//! | any live state   | `Stopped`  | release `MarkerSet`, clear if active     |
//! | `Stopped`        | any        | ignored; the identity is retired         |
//!
//! Only one target is active at a time: the most recently confirmed one.
//! A target losing the active role keeps its `MarkerSet` until it stops.

use crate::anchor::AnchorStore;
use crate::markers::MarkerSet;
use crate::{TargetId, TargetObservation, TrackingState};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Side effect of one observation, reported in the order it happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "target", rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// First seen, not yet tracked.
    Detected(TargetId),
    /// First `Tracking` observation; a `MarkerSet` was created.
    Confirmed(TargetId),
    Activated(TargetId),
    Deactivated(TargetId),
    /// The target's `MarkerSet` was released.
    Released(TargetId),
}

#[derive(Debug)]
struct TargetEntry {
    state: TrackingState,
    markers: Option<MarkerSet>,
}

/// Owns every live `MarkerSet`, keyed by target identity.
///
/// Stopped targets leave the table; only their id is kept so later
/// observations of it are ignored.
#[derive(Debug, Default)]
pub struct TrackingLifecycleController {
    targets: HashMap<TargetId, TargetEntry>,
    retired: HashSet<TargetId>,
    active: Option<TargetId>,
}

impl TrackingLifecycleController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one frame's observations, in order.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "trace", skip_all, fields(observations = observations.len()))
    )]
    pub fn on_tracking_update(
        &mut self,
        observations: &[TargetObservation],
        anchors: &mut dyn AnchorStore,
    ) -> Vec<LifecycleEvent> {
        let mut events = Vec::new();
        for observation in observations {
            self.observe(observation, anchors, &mut events);
        }
        events
    }

    fn observe(
        &mut self,
        observation: &TargetObservation,
        anchors: &mut dyn AnchorStore,
        events: &mut Vec<LifecycleEvent>,
    ) {
        let id = observation.id;
        let previous = self.phase(id);

        match (previous, observation.state) {
            (Some(TrackingState::Stopped), _) => {
                debug!("{id}: observation after stop ignored");
            }
            (None, TrackingState::Paused) => {
                self.targets.insert(
                    id,
                    TargetEntry {
                        state: TrackingState::Paused,
                        markers: None,
                    },
                );
                debug!("{id}: detected");
                events.push(LifecycleEvent::Detected(id));
            }
            (Some(_), TrackingState::Paused) => {
                if let Some(entry) = self.targets.get_mut(&id) {
                    entry.state = TrackingState::Paused;
                }
            }
            (_, TrackingState::Tracking) => {
                let entry = self.targets.entry(id).or_insert(TargetEntry {
                    state: TrackingState::Paused,
                    markers: None,
                });
                entry.state = TrackingState::Tracking;
                if entry.markers.is_none() {
                    entry.markers = Some(MarkerSet::create(observation, anchors));
                    debug!(
                        "{id}: confirmed ({:.3} x {:.3})",
                        observation.extent_x, observation.extent_z
                    );
                    events.push(LifecycleEvent::Confirmed(id));
                    self.activate(id, events);
                }
            }
            (_, TrackingState::Stopped) => {
                self.retired.insert(id);
                let markers = self.targets.remove(&id).and_then(|e| e.markers);
                if let Some(mut markers) = markers {
                    if markers.release(anchors) {
                        events.push(LifecycleEvent::Released(id));
                    }
                }
                if self.active == Some(id) {
                    self.active = None;
                    events.push(LifecycleEvent::Deactivated(id));
                }
                debug!("{id}: stopped");
            }
        }
    }

    fn activate(&mut self, id: TargetId, events: &mut Vec<LifecycleEvent>) {
        if let Some(previous) = self.active.replace(id) {
            if previous != id {
                debug!("{previous}: superseded by {id}");
                events.push(LifecycleEvent::Deactivated(previous));
            }
        }
        events.push(LifecycleEvent::Activated(id));
    }

    /// The target capture currently operates on.
    #[inline]
    pub fn active_target(&self) -> Option<TargetId> {
        self.active
    }

    /// `MarkerSet` of the active target.
    pub fn active_markers(&self) -> Option<&MarkerSet> {
        let id = self.active?;
        self.markers(id)
    }

    /// Capture is possible exactly when an active target has a live `MarkerSet`.
    #[inline]
    pub fn capture_enabled(&self) -> bool {
        self.active_markers().is_some()
    }

    pub fn markers(&self, id: TargetId) -> Option<&MarkerSet> {
        self.targets
            .get(&id)?
            .markers
            .as_ref()
            .filter(|m| !m.is_released())
    }

    /// Last observed state of a target, `None` if never seen.
    pub fn phase(&self, id: TargetId) -> Option<TrackingState> {
        if self.retired.contains(&id) {
            return Some(TrackingState::Stopped);
        }
        self.targets.get(&id).map(|e| e.state)
    }

    /// Targets seen and not yet stopped.
    pub fn tracked_targets(&self) -> usize {
        self.targets.len()
    }

    pub fn live_marker_sets(&self) -> usize {
        self.targets
            .values()
            .filter(|e| e.markers.is_some())
            .count()
    }

    /// Release every `MarkerSet` and forget all targets.
    pub fn reset(&mut self, anchors: &mut dyn AnchorStore) -> Vec<LifecycleEvent> {
        let mut events = Vec::new();
        if let Some(active) = self.active.take() {
            events.push(LifecycleEvent::Deactivated(active));
        }
        let mut ids: Vec<TargetId> = self.targets.keys().copied().collect();
        ids.sort_unstable();
        for id in ids {
            if let Some(mut markers) = self.targets.remove(&id).and_then(|e| e.markers) {
                if markers.release(anchors) {
                    events.push(LifecycleEvent::Released(id));
                }
            }
        }
        self.retired.clear();
        events
    }
}
