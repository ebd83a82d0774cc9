use std::sync::Arc;

use nalgebra::{Isometry3, Point3, Vector3};
use paintscan::core::{AxisMapping, Extent, Image, PixelFormat};
use paintscan::{
    AnchorHandle, AnchorStore, CaptureError, CaptureParams, FrameSnapshot, LifecycleEvent,
    LocalAnchors, PinholeCamera, ScanSession, TargetId, TargetObservation, TrackingState,
};
use parking_lot::Mutex;

/// Anchor store the test can inspect while the session owns it.
#[derive(Clone, Default)]
struct SharedAnchors(Arc<Mutex<LocalAnchors>>);

impl AnchorStore for SharedAnchors {
    fn attach(&mut self, target: TargetId, pose: &Isometry3<f64>) -> AnchorHandle {
        self.0.lock().attach(target, pose)
    }

    fn detach(&mut self, handle: AnchorHandle) {
        self.0.lock().detach(handle)
    }
}

fn camera() -> PinholeCamera {
    // Looking along +z from two metres back; targets sit in the z = 0 plane.
    let eye = Point3::new(0.0, 0.0, -2.0);
    PinholeCamera::centered(
        Isometry3::face_towards(&eye, &Point3::origin(), &Vector3::y()),
        600.0,
        Extent::new(640.0, 480.0),
    )
}

fn frame(timestamp: u64, with_image: bool) -> FrameSnapshot {
    let image = with_image.then(|| Arc::new(Image::new(640, 480, PixelFormat::Gray8, &[128])));
    FrameSnapshot::new(timestamp, image, Arc::new(camera()))
}

/// Target centred at `(x, 0, 0)` whose plane faces the camera.
fn seen(id: u64, state: TrackingState, x: f64) -> TargetObservation {
    let pose = Isometry3::new(
        Vector3::new(x, 0.0, 0.0),
        Vector3::x() * -std::f64::consts::FRAC_PI_2,
    );
    TargetObservation::new(TargetId(id), state, 0.4, 0.3, pose)
}

fn session() -> (ScanSession, SharedAnchors) {
    let _ = env_logger::builder().is_test(true).try_init();
    let anchors = SharedAnchors::default();
    let params = CaptureParams {
        axis_mapping: AxisMapping::IDENTITY,
        ..CaptureParams::default()
    };
    (
        ScanSession::with_anchor_store(params, anchors.clone()),
        anchors,
    )
}

#[test]
fn paused_tracking_tracking_stopped() {
    let (session, anchors) = session();
    let a = TargetId(1);

    session.on_tracking_update(frame(1, true), &[seen(1, TrackingState::Paused, 0.0)]);
    assert!(!session.capture_enabled());
    assert_eq!(
        session.request_capture().unwrap_err(),
        CaptureError::NoTarget
    );

    session.on_tracking_update(frame(2, true), &[seen(1, TrackingState::Tracking, 0.0)]);
    let first = session.capture_target(a).expect("marker set");
    assert!(session.capture_enabled());

    // A later pose does not move the anchored corners.
    session.on_tracking_update(frame(3, true), &[seen(1, TrackingState::Tracking, 0.1)]);
    assert_eq!(session.capture_target(a), Some(first));
    assert_eq!(session.live_marker_sets(), 1);

    let events =
        session.on_tracking_update(frame(4, true), &[seen(1, TrackingState::Stopped, 0.0)]);
    assert_eq!(
        events,
        vec![LifecycleEvent::Released(a), LifecycleEvent::Deactivated(a)]
    );
    assert!(!session.capture_enabled());
    assert_eq!(session.live_marker_sets(), 0);

    let store = anchors.0.lock();
    assert_eq!(store.created(), 1);
    assert_eq!(store.released(), 1);
    assert_eq!(store.live(), 0);
}

#[test]
fn second_confirmed_target_takes_over_capture() {
    let (session, anchors) = session();
    let (a, b) = (TargetId(1), TargetId(2));

    session.on_tracking_update(frame(1, true), &[seen(1, TrackingState::Tracking, -0.3)]);
    assert_eq!(session.active_target(), Some(a));

    session.on_tracking_update(
        frame(2, true),
        &[
            seen(1, TrackingState::Tracking, -0.3),
            seen(2, TrackingState::Tracking, 0.3),
        ],
    );
    assert_eq!(session.active_target(), Some(b));
    assert!(session.capture_target(a).is_some());
    assert_eq!(anchors.0.lock().live(), 2);

    let result = session.request_capture().expect("capture");
    assert_eq!(result.target, b);
    assert_eq!(result.timestamp, 2);
    // B sits right of centre: all of its corners project right of x = 320.
    assert!(result.image_corners.iter().all(|p| p.x > 320.0));
}

#[test]
fn capture_without_any_tracked_target_fails() {
    let (session, _) = session();
    assert_eq!(
        session.request_capture().unwrap_err(),
        CaptureError::NoTarget
    );
    session.on_tracking_update(frame(1, true), &[]);
    assert_eq!(
        session.request_capture().unwrap_err(),
        CaptureError::NoTarget
    );
}

#[test]
fn missing_raw_image_is_frame_unavailable() {
    let (session, _) = session();
    session.on_tracking_update(frame(1, false), &[seen(1, TrackingState::Tracking, 0.0)]);
    assert_eq!(
        session.request_capture().unwrap_err(),
        CaptureError::FrameUnavailable
    );

    // The next frame carries an image again.
    session.on_tracking_update(frame(2, true), &[seen(1, TrackingState::Tracking, 0.0)]);
    let result = session.request_capture().expect("capture");
    assert_eq!(result.rectified.pixel(128, 128), &[128]);
}

#[test]
fn shutdown_releases_all_anchors() {
    let (session, anchors) = session();
    session.on_tracking_update(
        frame(1, true),
        &[
            seen(1, TrackingState::Tracking, -0.3),
            seen(2, TrackingState::Tracking, 0.3),
        ],
    );
    session.shutdown();
    assert_eq!(anchors.0.lock().live(), 0);
    assert!(!session.capture_enabled());
    assert_eq!(
        session.request_capture().unwrap_err(),
        CaptureError::NoTarget
    );
}

#[test]
fn captures_can_run_while_frames_arrive() {
    let (session, _) = session();
    let session = Arc::new(session);
    session.on_tracking_update(frame(0, true), &[seen(1, TrackingState::Tracking, 0.0)]);

    let writer = {
        let session = Arc::clone(&session);
        std::thread::spawn(move || {
            for t in 1..50 {
                session.on_tracking_update(
                    frame(t, true),
                    &[seen(1, TrackingState::Tracking, 0.0)],
                );
            }
        })
    };
    for _ in 0..10 {
        let result = session.request_capture().expect("capture");
        assert_eq!(result.target, TargetId(1));
    }
    writer.join().expect("writer thread");
}
