#![cfg(feature = "image")]

use std::sync::Arc;

use nalgebra::{Isometry3, Point3, Vector3};
use paintscan::core::{AxisMapping, Extent, Image, PixelFormat};
use paintscan::{
    load_image, CaptureParams, DirectorySink, FrameSnapshot, OutputFormat, PinholeCamera,
    ScanConfig, ScanSession, TargetId, TargetObservation, TrackingState,
};

fn tracked_session(timestamp: u64) -> ScanSession {
    let session = ScanSession::new(CaptureParams {
        output_size: 64,
        axis_mapping: AxisMapping::IDENTITY,
        ..CaptureParams::default()
    });
    let eye = Point3::new(0.0, 0.0, -2.0);
    let camera = PinholeCamera::centered(
        Isometry3::face_towards(&eye, &Point3::origin(), &Vector3::y()),
        500.0,
        Extent::new(320.0, 240.0),
    );
    let image = Image::new(320, 240, PixelFormat::Rgba8, &[20, 40, 60, 255]);
    let frame = FrameSnapshot::new(timestamp, Some(Arc::new(image)), Arc::new(camera));
    let pose = Isometry3::rotation(Vector3::x() * -std::f64::consts::FRAC_PI_2);
    session.on_tracking_update(
        frame,
        &[TargetObservation::new(
            TargetId(3),
            TrackingState::Tracking,
            0.3,
            0.2,
            pose,
        )],
    );
    session
}

#[test]
fn capture_is_written_with_timestamped_names() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("scans");
    let sink = DirectorySink::new(&out).with_marked(true);

    let session = tracked_session(1_234);
    let (result, saved) = session.request_capture_and_save(&sink).expect("capture");
    let saved = saved.expect("saved");

    assert_eq!(saved.raw, out.join("raw_1234.png"));
    assert_eq!(saved.rectified, out.join("rectified_1234.png"));
    assert_eq!(saved.marked.as_deref(), Some(out.join("marked_1234.png").as_path()));

    let rectified = load_image(&saved.rectified).expect("decode");
    assert_eq!(rectified, result.rectified);
    let raw = load_image(&saved.raw).expect("decode");
    assert_eq!((raw.width, raw.height), (320, 240));
    assert!(saved.marked.as_ref().is_some_and(|p| p.exists()));
}

#[test]
fn jpeg_sink_drops_alpha() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = ScanConfig {
        save_dir: Some(dir.path().to_path_buf()),
        image_format: OutputFormat::Jpeg,
        ..ScanConfig::default()
    };
    let sink = DirectorySink::from_config(&config).expect("sink");

    let session = tracked_session(99);
    let (_, saved) = session.request_capture_and_save(&sink).expect("capture");
    let saved = saved.expect("saved");
    assert_eq!(saved.rectified, dir.path().join("rectified_99.jpg"));
    assert!(saved.marked.is_none());

    let decoded = load_image(&saved.rectified).expect("decode");
    assert_eq!(decoded.format, PixelFormat::Rgb8);
}

#[test]
fn write_failure_does_not_fail_the_capture() {
    let dir = tempfile::tempdir().expect("tempdir");
    // A regular file where the output directory should be.
    let blocked = dir.path().join("not-a-dir");
    std::fs::write(&blocked, b"x").expect("write");

    let session = tracked_session(5);
    let (result, saved) = session
        .request_capture_and_save(&DirectorySink::new(&blocked))
        .expect("capture still succeeds");
    assert!(saved.is_none());
    assert_eq!(result.target, TargetId(3));
}

#[test]
fn config_round_trips_through_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("scan.json");
    let config = ScanConfig {
        output_size: 512,
        save_marked: true,
        ..ScanConfig::default()
    };
    config.write_json(&path).expect("write");
    assert_eq!(ScanConfig::load_json(&path).expect("load"), config);
}
