//! Tracking-driven capture of planar targets.
//!
//! A tracking engine reports, once per rendered frame, which targets it sees
//! and in which state. [`ScanSession`] turns that stream into one
//! [`MarkerSet`] per confirmed target (an anchor plus four corners in fixed
//! winding order) and, on request, projects the active target's corners into
//! the latest raw frame and rectifies it into a square image.
//!
//! ```
//! use std::sync::Arc;
//! use nalgebra::{Isometry3, Point3, Vector3};
//! use paintscan::core::{AxisMapping, Extent, Image, PixelFormat};
//! use paintscan::{
//!     CaptureParams, FrameSnapshot, PinholeCamera, ScanSession, TargetId, TargetObservation,
//!     TrackingState,
//! };
//!
//! let session = ScanSession::new(CaptureParams {
//!     axis_mapping: AxisMapping::IDENTITY,
//!     ..CaptureParams::default()
//! });
//!
//! // Camera two metres in front of a target that faces it.
//! let eye = Point3::new(0.0, 0.0, -2.0);
//! let camera = PinholeCamera::centered(
//!     Isometry3::face_towards(&eye, &Point3::origin(), &Vector3::y()),
//!     800.0,
//!     Extent::new(640.0, 480.0),
//! );
//! let frame = FrameSnapshot::new(
//!     1,
//!     Some(Arc::new(Image::new(640, 480, PixelFormat::Rgb8, &[90, 90, 90]))),
//!     Arc::new(camera),
//! );
//! let pose = Isometry3::rotation(Vector3::x() * -std::f64::consts::FRAC_PI_2);
//! let seen = TargetObservation::new(TargetId(1), TrackingState::Tracking, 0.5, 0.4, pose);
//!
//! session.on_tracking_update(frame, &[seen]);
//! let capture = session.request_capture().expect("capture");
//! assert_eq!(capture.rectified.width, 256);
//! ```

mod anchor;
mod annotate;
mod camera;
mod capture;
mod config;
mod frame;
mod lifecycle;
mod markers;
#[cfg(feature = "image")]
mod persist;
mod session;
mod target;

pub use paintscan_core as core;

pub use anchor::{AnchorHandle, AnchorStore, LocalAnchors};
pub use annotate::{annotate_corners, default_ring_radius, CORNER_COLORS};
pub use camera::{PinholeCamera, ScreenProjector};
pub use capture::{
    rectify_quad, CaptureError, CaptureOrchestrator, CaptureParams, CaptureResult,
    DEFAULT_OUTPUT_SIZE,
};
pub use config::{ConfigError, OutputFormat, ScanConfig};
pub use frame::FrameSnapshot;
pub use lifecycle::{LifecycleEvent, TrackingLifecycleController};
pub use markers::{CaptureTarget, Corner, MarkerSet};
pub use session::ScanSession;
pub use target::{TargetId, TargetObservation, TrackingState};

#[cfg(feature = "image")]
pub use persist::{
    image_from_dynamic, load_image, save_image, to_dynamic, DirectorySink, PersistError,
    SavedCapture,
};
