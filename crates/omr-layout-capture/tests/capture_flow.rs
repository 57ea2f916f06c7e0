use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{TimeZone, Utc};
use image::{Rgb, RgbImage};
use omr_layout_capture::{
    CameraBackend, CameraError, CameraErrorKind, CameraStatus, CameraStream, CaptureController,
    CaptureError, CaptureEvent, CaptureParams, Facing, Origin, StreamRequest,
};
use omr_layout_core::{overlay_box, AlignmentQuality, Dimensions, Rect};

const PAGE: Dimensions = Dimensions::new(707.0, 484.0);
const W: u32 = 640;
const H: u32 = 480;

type SharedFrame = Arc<Mutex<Option<RgbImage>>>;

fn sheet_frame(rect: Option<Rect>) -> RgbImage {
    RgbImage::from_fn(W, H, |x, y| {
        let (fx, fy) = (x as f64 + 0.5, y as f64 + 0.5);
        let on_sheet = rect.is_some_and(|r| {
            fx >= r.x && fx <= r.right() && fy >= r.y && fy <= r.bottom()
        });
        if on_sheet {
            Rgb([225, 222, 215])
        } else {
            Rgb([35, 40, 45])
        }
    })
}

fn aligned() -> RgbImage {
    sheet_frame(Some(overlay_box(PAGE, Dimensions::new(W as f64, H as f64))))
}

struct FakeStream {
    frame: SharedFrame,
    stops: Arc<AtomicUsize>,
}

impl CameraStream for FakeStream {
    fn frame_size(&self) -> (u32, u32) {
        (W, H)
    }

    fn grab_frame(&mut self) -> Option<RgbImage> {
        self.frame.lock().expect("frame lock").clone()
    }

    fn stop(&mut self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct FakeBackend {
    unsupported: bool,
    fail_rear: Option<CameraError>,
    fail_any: Option<CameraError>,
    requests: Vec<StreamRequest>,
    frame: SharedFrame,
    stops: Arc<AtomicUsize>,
}

impl CameraBackend for FakeBackend {
    fn is_supported(&self) -> bool {
        !self.unsupported
    }

    fn acquire(&mut self, request: &StreamRequest) -> Result<Box<dyn CameraStream>, CameraError> {
        self.requests.push(*request);
        let failure = match request.facing {
            Facing::Environment => self.fail_rear.clone(),
            _ => self.fail_any.clone(),
        };
        if let Some(err) = failure {
            return Err(err);
        }
        Ok(Box::new(FakeStream {
            frame: Arc::clone(&self.frame),
            stops: Arc::clone(&self.stops),
        }))
    }
}

fn controller(backend: FakeBackend) -> CaptureController<FakeBackend> {
    CaptureController::new(backend, Origin::localhost(), PAGE, CaptureParams::default())
}

fn backend_with(frame: RgbImage) -> FakeBackend {
    FakeBackend {
        frame: Arc::new(Mutex::new(Some(frame))),
        ..FakeBackend::default()
    }
}

fn set_frame(ctl: &CaptureController<FakeBackend>, frame: Option<RgbImage>) {
    *ctl.backend().frame.lock().expect("frame lock") = frame;
}

/// `^omr_capture_\d{4}-\d{2}-\d{2}T\d{2}-\d{2}-\d{2}-\d{3}Z\.jpg$`
fn is_capture_name(name: &str) -> bool {
    let Some(stamp) = name
        .strip_prefix("omr_capture_")
        .and_then(|s| s.strip_suffix("Z.jpg"))
    else {
        return false;
    };
    let shape = "dddd-dd-ddTdd-dd-dd-ddd";
    stamp.len() == shape.len()
        && stamp.chars().zip(shape.chars()).all(|(c, s)| match s {
            'd' => c.is_ascii_digit(),
            other => c == other,
        })
}

#[test]
fn insecure_origin_is_rejected_before_negotiation() {
    let mut ctl = CaptureController::new(
        backend_with(aligned()),
        Origin::parse("http://192.168.0.12:3000").expect("origin"),
        PAGE,
        CaptureParams::default(),
    );
    assert_eq!(ctl.open(), Err(CameraError::InsecureContext));
    assert!(ctl.backend().requests.is_empty());
    assert_eq!(
        ctl.status(),
        CameraStatus::Failed(CameraErrorKind::InsecureContext)
    );
    assert_eq!(
        ctl.drain_events(),
        [CaptureEvent::CameraError(CameraErrorKind::InsecureContext)]
    );
}

#[test]
fn missing_camera_api_is_not_supported() {
    let mut ctl = controller(FakeBackend {
        unsupported: true,
        ..FakeBackend::default()
    });
    assert_eq!(ctl.open(), Err(CameraError::DeviceNotSupported));
    assert!(ctl.backend().requests.is_empty());
}

#[test]
fn falls_back_to_any_camera() {
    let mut backend = backend_with(aligned());
    backend.fail_rear = Some(CameraError::DeviceNotFound);
    let mut ctl = controller(backend);
    ctl.open().expect("open");
    assert_eq!(ctl.status(), CameraStatus::Open);
    assert_eq!(
        ctl.backend().requests,
        [
            StreamRequest::new(Facing::Environment, 1920, 1080),
            StreamRequest::new(Facing::Any, 1920, 1080),
        ]
    );
    assert_eq!(ctl.frame_size(), Some(Dimensions::new(640.0, 480.0)));
}

#[test]
fn permission_denied_on_both_attempts_fails() {
    let mut backend = backend_with(aligned());
    backend.fail_rear = Some(CameraError::PermissionDenied);
    backend.fail_any = Some(CameraError::PermissionDenied);
    let mut ctl = controller(backend);
    assert_eq!(ctl.open(), Err(CameraError::PermissionDenied));
    assert_eq!(
        ctl.status(),
        CameraStatus::Failed(CameraErrorKind::PermissionDenied)
    );
    assert_eq!(ctl.backend().requests.len(), 2);
    assert!(!ctl.is_open());
}

#[test]
fn capture_requires_good_alignment() {
    let mut ctl = controller(backend_with(aligned()));
    assert!(matches!(ctl.capture_frame(), Err(CaptureError::NotOpen)));
    ctl.open().expect("open");
    assert!(matches!(
        ctl.capture_frame(),
        Err(CaptureError::NotAligned(AlignmentQuality::Poor))
    ));

    assert_eq!(ctl.tick(Instant::now()), Some(AlignmentQuality::Good));
    let at = Utc
        .with_ymd_and_hms(2025, 3, 9, 8, 7, 6)
        .single()
        .expect("time");
    let artifact = ctl.capture_frame_at(at).expect("capture");
    assert_eq!(artifact.filename, "omr_capture_2025-03-09T08-07-06-000Z.jpg");
    assert!(is_capture_name(&artifact.filename));
    assert_eq!((artifact.width, artifact.height), (W, H));
    assert_eq!(ctl.last_artifact(), Some(&artifact));

    let events = ctl.drain_events();
    assert_eq!(
        events,
        [
            CaptureEvent::AlignmentChanged(AlignmentQuality::Good),
            CaptureEvent::CaptureCompleted(artifact),
        ]
    );

    let live = ctl.capture_frame().expect("capture");
    assert!(is_capture_name(&live.filename), "{}", live.filename);
}

#[test]
fn second_capture_while_in_flight_is_rejected() {
    let mut ctl = controller(backend_with(aligned()));
    ctl.open().expect("open");
    ctl.tick(Instant::now());

    let pending = ctl.begin_capture().expect("begin");
    assert!(ctl.capture_in_flight());
    assert!(matches!(
        ctl.begin_capture(),
        Err(CaptureError::CaptureInProgress)
    ));
    ctl.finish_capture(pending).expect("finish");
    assert!(!ctl.capture_in_flight());
    assert!(ctl.begin_capture().is_ok());
}

#[test]
fn closing_discards_in_flight_capture_and_releases_device() {
    let mut ctl = controller(backend_with(aligned()));
    ctl.open().expect("open");
    ctl.tick(Instant::now());
    ctl.drain_events();

    let pending = ctl.begin_capture().expect("begin");
    ctl.close();
    assert_eq!(ctl.backend().stops.load(Ordering::SeqCst), 1);
    assert!(!ctl.capture_in_flight());
    assert_eq!(ctl.quality(), AlignmentQuality::Poor);
    assert!(matches!(
        ctl.finish_capture(pending),
        Err(CaptureError::Discarded)
    ));
    assert_eq!(
        ctl.drain_events(),
        [CaptureEvent::AlignmentChanged(AlignmentQuality::Poor)]
    );

    // idempotent
    ctl.close();
    assert_eq!(ctl.backend().stops.load(Ordering::SeqCst), 1);
    assert_eq!(ctl.status(), CameraStatus::Closed);
}

#[test]
fn ticket_from_an_old_session_is_discarded() {
    let mut ctl = controller(backend_with(aligned()));
    ctl.open().expect("open");
    ctl.tick(Instant::now());
    let stale = ctl.begin_capture().expect("begin");

    ctl.open().expect("reopen");
    assert_eq!(ctl.backend().stops.load(Ordering::SeqCst), 1);
    ctl.tick(Instant::now());
    let fresh = ctl.begin_capture().expect("begin");

    assert!(matches!(
        ctl.finish_capture(stale),
        Err(CaptureError::Discarded)
    ));
    // the fresh ticket is still in flight
    assert!(ctl.capture_in_flight());
    assert!(ctl.finish_capture(fresh).is_ok());
}

#[test]
fn dropping_the_controller_releases_the_stream() {
    let backend = backend_with(aligned());
    let stops = Arc::clone(&backend.stops);
    let mut ctl = controller(backend);
    ctl.open().expect("open");
    drop(ctl);
    assert_eq!(stops.load(Ordering::SeqCst), 1);
}

#[test]
fn alignment_is_sampled_once_per_interval() {
    let mut ctl = controller(backend_with(aligned()));
    ctl.open().expect("open");
    let t0 = Instant::now();
    assert_eq!(ctl.tick(t0), Some(AlignmentQuality::Good));

    set_frame(&ctl, Some(sheet_frame(None)));
    assert_eq!(ctl.tick(t0 + Duration::from_millis(500)), None);
    assert_eq!(ctl.quality(), AlignmentQuality::Good);
    assert_eq!(
        ctl.tick(t0 + Duration::from_millis(1000)),
        Some(AlignmentQuality::Poor)
    );
    let report = ctl.last_report().expect("report");
    assert_eq!(report.edge_score, 0.0);
}

#[test]
fn no_frame_yet_blocks_capture() {
    let mut ctl = controller(backend_with(aligned()));
    ctl.open().expect("open");
    ctl.tick(Instant::now());
    set_frame(&ctl, None);
    assert!(matches!(ctl.capture_frame(), Err(CaptureError::NoFrame)));
    assert!(!ctl.capture_in_flight());
}
