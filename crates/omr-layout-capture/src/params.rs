use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::alignment::AlignmentParams;
use crate::artifact::DEFAULT_JPEG_QUALITY;

#[derive(thiserror::Error, Debug)]
pub enum CaptureConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Camera and capture settings. Every field has a default, so a partial JSON
/// file is enough.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureParams {
    pub preferred_width: u32,
    pub preferred_height: u32,
    pub jpeg_quality: u8,
    pub alignment: AlignmentParams,
}

impl Default for CaptureParams {
    fn default() -> Self {
        Self {
            preferred_width: 1920,
            preferred_height: 1080,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            alignment: AlignmentParams::default(),
        }
    }
}

impl CaptureParams {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, CaptureConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), CaptureConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
