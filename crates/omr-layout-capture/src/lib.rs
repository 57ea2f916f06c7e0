//! Camera capture for OMR answer sheets.
//!
//! [`CaptureController`] owns one camera session at a time, runs the
//! [`AlignmentEstimator`] on live frames and produces JPEG
//! [`ImageArtifact`]s once the sheet is aligned. Device access goes through
//! the [`CameraBackend`] / [`CameraStream`] traits so the controller can be
//! driven by any platform, or by a still picture through
//! [`StillImageBackend`].

mod alignment;
mod artifact;
mod camera;
mod controller;
mod params;
mod still;

pub use alignment::{
    AlignmentClassifier, AlignmentEstimator, AlignmentParams, AlignmentReport,
    BorderContrastClassifier, Edge,
};
pub use artifact::{capture_filename, encode_jpeg, ImageArtifact, DEFAULT_JPEG_QUALITY, JPEG_MIME};
pub use camera::{
    CameraBackend, CameraError, CameraErrorKind, CameraStream, Facing, Origin, StreamRequest,
};
pub use controller::{CameraStatus, CaptureController, CaptureError, CaptureEvent, PendingCapture};
pub use params::{CaptureConfigError, CaptureParams};
pub use still::StillImageBackend;
