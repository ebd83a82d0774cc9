//! Drive a scan session with a simulated tracker and save one capture.
//!
//! Usage: `cargo run -p paintscan --example synthetic_session -- [out_dir]`

use std::{env, path::PathBuf, sync::Arc};

use nalgebra::{Isometry3, Point3, Vector3};
use paintscan::core::{AxisMapping, Extent, Image, PixelFormat};
use paintscan::{
    CaptureParams, DirectorySink, FrameSnapshot, PinholeCamera, ScanSession, TargetId,
    TargetObservation, TrackingState,
};

#[cfg(not(feature = "tracing"))]
use log::{info, warn, LevelFilter};

#[cfg(feature = "tracing")]
use tracing::{info, warn};

#[cfg(feature = "tracing")]
use paintscan::core::init_tracing;
#[cfg(not(feature = "tracing"))]
use paintscan::core::{init_logger, LogFilter};

const WIDTH: usize = 960;
const HEIGHT: usize = 720;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(not(feature = "tracing"))]
    // Capture and rectify at debug; per-frame lifecycle lines stay at info.
    init_logger(LogFilter::new(LevelFilter::Debug).with_frame_level(LevelFilter::Info))?;

    #[cfg(feature = "tracing")]
    init_tracing(false);

    run()
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("scans"));

    let camera = PinholeCamera::centered(
        Isometry3::face_towards(
            &Point3::new(0.2, 0.0, -1.5),
            &Point3::origin(),
            &Vector3::y(),
        ),
        700.0,
        Extent::new(WIDTH as f64, HEIGHT as f64),
    );
    let session = ScanSession::new(CaptureParams {
        axis_mapping: AxisMapping::IDENTITY,
        ..CaptureParams::default()
    });

    // Target plane facing the camera, slightly rotated in-plane.
    let pose = Isometry3::rotation(Vector3::x() * -std::f64::consts::FRAC_PI_2)
        * Isometry3::rotation(Vector3::y() * 0.2);
    let photo = Arc::new(gradient(WIDTH, HEIGHT));
    let states = [
        TrackingState::Paused,
        TrackingState::Paused,
        TrackingState::Tracking,
        TrackingState::Tracking,
    ];
    for (t, state) in states.into_iter().enumerate() {
        let frame = FrameSnapshot::new(t as u64, Some(Arc::clone(&photo)), Arc::new(camera));
        let seen = TargetObservation::new(TargetId(1), state, 0.5, 0.35, pose);
        for event in session.on_tracking_update(frame, &[seen]) {
            info!("frame {t}: {event:?}");
        }
    }

    let sink = DirectorySink::new(&out_dir).with_marked(true);
    let (result, saved) = session.request_capture_and_save(&sink)?;
    info!(
        "corners in image: {:?}",
        result.image_corners.map(|p| (p.x.round(), p.y.round()))
    );
    match saved {
        Some(saved) => info!("wrote {}", saved.rectified.display()),
        None => warn!("capture not saved"),
    }

    session.shutdown();
    Ok(())
}

fn gradient(width: usize, height: usize) -> Image {
    let mut img = Image::new(width, height, PixelFormat::Rgb8, &[0, 0, 0]);
    for y in 0..height {
        for x in 0..width {
            let r = (x * 255 / width) as u8;
            let g = (y * 255 / height) as u8;
            let b = if (x / 40 + y / 40) % 2 == 0 { 200 } else { 60 };
            img.pixel_mut(x, y).copy_from_slice(&[r, g, b]);
        }
    }
    img
}
