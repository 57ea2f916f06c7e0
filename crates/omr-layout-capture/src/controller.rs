//! Camera session lifecycle and single-frame capture.
//!
//! Everything here is synchronous. The two operations that suspend on a real
//! platform are modelled as explicit state: [`CameraStatus::Opening`] while a
//! stream is being acquired, and a [`PendingCapture`] ticket between grabbing
//! a frame and finishing its encode.

use std::time::Instant;

use chrono::{DateTime, Utc};
use image::RgbImage;
use log::{debug, info, warn};
use omr_layout_core::{AlignmentQuality, Dimensions, GrayImageView};

use crate::alignment::{AlignmentEstimator, AlignmentReport};
use crate::artifact::ImageArtifact;
use crate::camera::{
    CameraBackend, CameraError, CameraErrorKind, CameraStream, Facing, Origin, StreamRequest,
};
use crate::params::CaptureParams;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CameraStatus {
    #[default]
    Closed,
    Opening,
    Open,
    Failed(CameraErrorKind),
}

#[derive(Clone, Debug, PartialEq)]
pub enum CaptureEvent {
    CaptureCompleted(ImageArtifact),
    CameraError(CameraErrorKind),
    AlignmentChanged(AlignmentQuality),
}

#[derive(thiserror::Error, Debug)]
pub enum CaptureError {
    #[error("sheet is not aligned (quality {0})")]
    NotAligned(AlignmentQuality),
    #[error("a capture is already in progress")]
    CaptureInProgress,
    #[error("camera is not open")]
    NotOpen,
    #[error("camera has not delivered a frame yet")]
    NoFrame,
    #[error("capture was discarded because the camera session ended")]
    Discarded,
    #[error("failed to encode capture: {0}")]
    Encode(#[from] image::ImageError),
}

/// Owns an acquired stream and stops it exactly once, on close or drop.
struct CameraSession {
    stream: Box<dyn CameraStream>,
    id: u64,
    frame_size: (u32, u32),
    stopped: bool,
}

impl CameraSession {
    fn new(stream: Box<dyn CameraStream>, id: u64) -> Self {
        let frame_size = stream.frame_size();
        Self {
            stream,
            id,
            frame_size,
            stopped: false,
        }
    }

    fn release(&mut self) {
        if !self.stopped {
            self.stream.stop();
            self.stopped = true;
            info!("camera session {} released", self.id);
        }
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.release();
    }
}

/// A frame grabbed for capture, not yet encoded.
///
/// Not `Clone`: each ticket finishes at most once.
#[derive(Debug)]
pub struct PendingCapture {
    ticket: u64,
    session: u64,
    frame: RgbImage,
}

impl PendingCapture {
    pub fn frame(&self) -> &RgbImage {
        &self.frame
    }
}

pub struct CaptureController<B: CameraBackend> {
    backend: B,
    params: CaptureParams,
    origin: Origin,
    page: Dimensions,
    status: CameraStatus,
    session: Option<CameraSession>,
    next_session: u64,
    estimator: AlignmentEstimator,
    next_ticket: u64,
    in_flight: Option<u64>,
    last_artifact: Option<ImageArtifact>,
    events: Vec<CaptureEvent>,
}

impl<B: CameraBackend> CaptureController<B> {
    /// Controller for a template whose page is `page` template units.
    pub fn new(backend: B, origin: Origin, page: Dimensions, params: CaptureParams) -> Self {
        let estimator = AlignmentEstimator::new(params.alignment.clone());
        Self::with_estimator(backend, origin, page, params, estimator)
    }

    /// Same as [`CaptureController::new`] with a custom estimator.
    pub fn with_estimator(
        backend: B,
        origin: Origin,
        page: Dimensions,
        params: CaptureParams,
        estimator: AlignmentEstimator,
    ) -> Self {
        Self {
            backend,
            params,
            origin,
            page,
            status: CameraStatus::Closed,
            session: None,
            next_session: 0,
            estimator,
            next_ticket: 0,
            in_flight: None,
            last_artifact: None,
            events: Vec::new(),
        }
    }

    pub fn status(&self) -> CameraStatus {
        self.status
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn quality(&self) -> AlignmentQuality {
        self.estimator.quality()
    }

    pub fn last_report(&self) -> Option<&AlignmentReport> {
        self.estimator.last_report()
    }

    pub fn capture_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn last_artifact(&self) -> Option<&ImageArtifact> {
        self.last_artifact.as_ref()
    }

    /// Actual frame size of the open stream.
    pub fn frame_size(&self) -> Option<Dimensions> {
        self.session
            .as_ref()
            .map(|s| Dimensions::new(s.frame_size.0 as f64, s.frame_size.1 as f64))
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn params(&self) -> &CaptureParams {
        &self.params
    }

    /// Take all pending events, oldest first.
    pub fn drain_events(&mut self) -> Vec<CaptureEvent> {
        std::mem::take(&mut self.events)
    }

    /// Acquire the camera, closing any session that is already open.
    ///
    /// Asks for the rear camera first and falls back to any camera at the
    /// same preferred resolution.
    pub fn open(&mut self) -> Result<(), CameraError> {
        self.close();
        self.status = CameraStatus::Opening;

        if !self.origin.is_secure_context() {
            return Err(self.fail(CameraError::InsecureContext));
        }
        if !self.backend.is_supported() {
            return Err(self.fail(CameraError::DeviceNotSupported));
        }

        let (w, h) = (self.params.preferred_width, self.params.preferred_height);
        let stream = match self
            .backend
            .acquire(&StreamRequest::new(Facing::Environment, w, h))
        {
            Ok(stream) => Ok(stream),
            Err(e) => {
                debug!("rear camera unavailable ({e}), trying any camera");
                self.backend.acquire(&StreamRequest::new(Facing::Any, w, h))
            }
        };
        let stream = match stream {
            Ok(stream) => stream,
            Err(e) => return Err(self.fail(e)),
        };

        self.next_session += 1;
        let session = CameraSession::new(stream, self.next_session);
        info!(
            "camera session {} open at {}x{}",
            session.id, session.frame_size.0, session.frame_size.1
        );
        self.session = Some(session);
        self.status = CameraStatus::Open;
        Ok(())
    }

    fn fail(&mut self, err: CameraError) -> CameraError {
        warn!("camera open failed: {err}");
        let kind = err.kind();
        self.status = CameraStatus::Failed(kind);
        self.events.push(CaptureEvent::CameraError(kind));
        err
    }

    /// Release the device and stop alignment. Safe to call at any time.
    pub fn close(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.release();
        }
        if self.in_flight.take().is_some() {
            debug!("in-flight capture discarded by close");
        }
        let was = self.estimator.quality();
        self.estimator.reset();
        if was != AlignmentQuality::Poor {
            self.events
                .push(CaptureEvent::AlignmentChanged(AlignmentQuality::Poor));
        }
        self.status = CameraStatus::Closed;
    }

    /// Drive the alignment timer. Grabs and classifies a frame when due.
    pub fn tick(&mut self, now: Instant) -> Option<AlignmentQuality> {
        if !self.estimator.is_due(now) {
            return None;
        }
        let frame = self.session.as_mut()?.stream.grab_frame()?;
        let gray = image::imageops::grayscale(&frame);
        let view = GrayImageView::new(gray.width() as usize, gray.height() as usize, gray.as_raw())?;
        let changed = self.estimator.tick(now, &view, self.page)?;
        self.events.push(CaptureEvent::AlignmentChanged(changed));
        Some(changed)
    }

    /// Grab the current frame for capture. Only allowed at `good` alignment
    /// and with no other capture in flight.
    pub fn begin_capture(&mut self) -> Result<PendingCapture, CaptureError> {
        let Some(session) = self.session.as_mut() else {
            return Err(CaptureError::NotOpen);
        };
        if self.in_flight.is_some() {
            return Err(CaptureError::CaptureInProgress);
        }
        let quality = self.estimator.quality();
        if !quality.is_good() {
            return Err(CaptureError::NotAligned(quality));
        }
        let frame = session.stream.grab_frame().ok_or(CaptureError::NoFrame)?;

        self.next_ticket += 1;
        self.in_flight = Some(self.next_ticket);
        debug!("capture {} started", self.next_ticket);
        Ok(PendingCapture {
            ticket: self.next_ticket,
            session: session.id,
            frame,
        })
    }

    pub fn finish_capture(&mut self, pending: PendingCapture) -> Result<ImageArtifact, CaptureError> {
        self.finish_capture_at(pending, Utc::now())
    }

    /// Encode a pending capture. Fails with `Discarded` if the session that
    /// produced it is gone.
    pub fn finish_capture_at(
        &mut self,
        pending: PendingCapture,
        now: DateTime<Utc>,
    ) -> Result<ImageArtifact, CaptureError> {
        if self.in_flight == Some(pending.ticket) {
            self.in_flight = None;
        }
        let live = self.session.as_ref().is_some_and(|s| s.id == pending.session);
        if !live {
            debug!("capture {} discarded", pending.ticket);
            return Err(CaptureError::Discarded);
        }

        let artifact = ImageArtifact::encode(&pending.frame, self.params.jpeg_quality, now)?;
        info!("captured {} ({} bytes)", artifact.filename, artifact.len());
        self.last_artifact = Some(artifact.clone());
        self.events
            .push(CaptureEvent::CaptureCompleted(artifact.clone()));
        Ok(artifact)
    }

    /// Begin and finish in one step.
    pub fn capture_frame(&mut self) -> Result<ImageArtifact, CaptureError> {
        self.capture_frame_at(Utc::now())
    }

    pub fn capture_frame_at(&mut self, now: DateTime<Utc>) -> Result<ImageArtifact, CaptureError> {
        let pending = self.begin_capture()?;
        self.finish_capture_at(pending, now)
    }
}
