//! Camera device abstraction.
//!
//! The platform side implements [`CameraBackend`]; the controller only ever
//! talks to these traits.

use image::RgbImage;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    /// Rear camera on a phone.
    Environment,
    User,
    Any,
}

/// What to ask the device for. Resolution is a preference, not a demand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamRequest {
    pub facing: Facing,
    pub width: u32,
    pub height: u32,
}

impl StreamRequest {
    pub fn new(facing: Facing, width: u32, height: u32) -> Self {
        Self {
            facing,
            width,
            height,
        }
    }
}

/// An acquired video stream. Owned by exactly one camera session.
pub trait CameraStream: Send {
    /// Actual frame size delivered, which may differ from the request.
    fn frame_size(&self) -> (u32, u32);
    /// Latest frame, or `None` if nothing has been decoded yet.
    fn grab_frame(&mut self) -> Option<RgbImage>;
    /// Stop every track. Called exactly once per stream.
    fn stop(&mut self);
}

pub trait CameraBackend {
    /// False when the platform has no camera API at all.
    fn is_supported(&self) -> bool;
    fn acquire(&mut self, request: &StreamRequest) -> Result<Box<dyn CameraStream>, CameraError>;
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    #[error("Camera permission denied. Please allow camera access and try again.")]
    PermissionDenied,
    #[error("No camera found. Please connect a camera and try again.")]
    DeviceNotFound,
    #[error("Camera not supported on this device.")]
    DeviceNotSupported,
    #[error("Camera access requires HTTPS or localhost.")]
    InsecureContext,
    #[error("Camera access denied or not available: {0}")]
    Backend(String),
}

/// Payload-free form of [`CameraError`] for status and events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraErrorKind {
    PermissionDenied,
    DeviceNotFound,
    DeviceNotSupported,
    InsecureContext,
    Backend,
}

impl CameraError {
    pub fn kind(&self) -> CameraErrorKind {
        match self {
            CameraError::PermissionDenied => CameraErrorKind::PermissionDenied,
            CameraError::DeviceNotFound => CameraErrorKind::DeviceNotFound,
            CameraError::DeviceNotSupported => CameraErrorKind::DeviceNotSupported,
            CameraError::InsecureContext => CameraErrorKind::InsecureContext,
            CameraError::Backend(_) => CameraErrorKind::Backend,
        }
    }
}

impl CameraErrorKind {
    /// Text suitable for showing to the operator.
    pub fn user_message(self) -> &'static str {
        match self {
            CameraErrorKind::PermissionDenied => {
                "Camera permission denied. Please allow camera access and try again."
            }
            CameraErrorKind::DeviceNotFound => {
                "No camera found. Please connect a camera and try again."
            }
            CameraErrorKind::DeviceNotSupported => "Camera not supported on this device.",
            CameraErrorKind::InsecureContext => "Camera access requires HTTPS or localhost.",
            CameraErrorKind::Backend => "Camera access denied or not available.",
        }
    }
}

/// Where the host page was served from. Camera access needs a secure context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Origin {
    pub scheme: String,
    pub host: String,
}

const LOCAL_HOSTS: [&str; 3] = ["localhost", "127.0.0.1", "::1"];

impl Origin {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into().to_ascii_lowercase(),
            host: host.into().to_ascii_lowercase(),
        }
    }

    /// Parse `scheme://host[:port][/path]`. Returns `None` without a scheme.
    pub fn parse(url: &str) -> Option<Self> {
        let (scheme, rest) = url.split_once("://")?;
        let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
        let authority = authority.rsplit('@').next().unwrap_or(authority);
        let host = if let Some(v6) = authority.strip_prefix('[') {
            v6.split(']').next().unwrap_or_default()
        } else {
            authority.split(':').next().unwrap_or_default()
        };
        if scheme.is_empty() || host.is_empty() {
            return None;
        }
        Some(Self::new(scheme, host))
    }

    /// Local origin used when the host does not say otherwise.
    pub fn localhost() -> Self {
        Self::new("http", "localhost")
    }

    pub fn is_secure_context(&self) -> bool {
        self.scheme == "https" || LOCAL_HOSTS.contains(&self.host.as_str())
    }
}

impl Default for Origin {
    fn default() -> Self {
        Self::localhost()
    }
}
