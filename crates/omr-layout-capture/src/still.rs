//! A camera that always shows the same picture.
//!
//! Useful for offline checks of a photographed sheet and for driving the
//! controller without hardware.

use std::path::Path;

use image::RgbImage;
use log::debug;

use crate::camera::{CameraBackend, CameraError, CameraStream, Facing, StreamRequest};

/// Backend serving one still frame on every facing.
#[derive(Clone, Debug)]
pub struct StillImageBackend {
    frame: RgbImage,
}

impl StillImageBackend {
    pub fn new(frame: RgbImage) -> Self {
        Self { frame }
    }

    /// Decode an image file (PNG or JPEG) into a still backend.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, image::ImageError> {
        let frame = image::open(path)?.to_rgb8();
        Ok(Self::new(frame))
    }

    pub fn frame(&self) -> &RgbImage {
        &self.frame
    }
}

impl CameraBackend for StillImageBackend {
    fn is_supported(&self) -> bool {
        true
    }

    fn acquire(&mut self, request: &StreamRequest) -> Result<Box<dyn CameraStream>, CameraError> {
        if self.frame.width() == 0 || self.frame.height() == 0 {
            return Err(CameraError::DeviceNotFound);
        }
        if request.facing == Facing::User {
            debug!("still backend ignores the requested facing");
        }
        Ok(Box::new(StillStream {
            frame: Some(self.frame.clone()),
        }))
    }
}

struct StillStream {
    frame: Option<RgbImage>,
}

impl CameraStream for StillStream {
    fn frame_size(&self) -> (u32, u32) {
        self.frame
            .as_ref()
            .map_or((0, 0), |f| (f.width(), f.height()))
    }

    fn grab_frame(&mut self) -> Option<RgbImage> {
        self.frame.clone()
    }

    fn stop(&mut self) {
        self.frame = None;
    }
}
