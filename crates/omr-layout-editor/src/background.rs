//! Reference image drawn under the layout.

use std::path::Path;

use image::ImageFormat;
use nalgebra::Vector2;
use omr_layout_core::{Dimensions, Rect};

/// Largest background file accepted, in bytes.
pub const MAX_BACKGROUND_FILE_BYTES: u64 = 10 * 1024 * 1024;
/// The fitted image covers this fraction of the limiting canvas side.
pub const BACKGROUND_FILL: f64 = 0.8;
pub const BACKGROUND_OPACITY: f64 = 0.7;
pub const MIN_BACKGROUND_SCALE: f64 = 0.1;
pub const MAX_BACKGROUND_SCALE: f64 = 3.0;

#[derive(thiserror::Error, Debug)]
pub enum BackgroundImageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("background must be a PNG or JPEG image: {0}")]
    UnsupportedFormat(String),
    #[error("background image is {size} bytes, limit is {max}")]
    TooLarge { size: u64, max: u64 },
    #[error("background image has no pixels")]
    Empty,
}

/// Scale and offset that place the image on the canvas, in template units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackgroundPlacement {
    pub scale: f64,
    pub offset: Vector2<f64>,
}

impl Default for BackgroundPlacement {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: Vector2::zeros(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BackgroundImage {
    size: Dimensions,
    href: Option<String>,
    placement: BackgroundPlacement,
}

impl BackgroundImage {
    /// Background of known pixel size with no backing file, placed at scale 1
    /// in the top-left corner.
    pub fn from_size(width: u32, height: u32) -> Result<Self, BackgroundImageError> {
        if width == 0 || height == 0 {
            return Err(BackgroundImageError::Empty);
        }
        Ok(Self {
            size: Dimensions::new(width as f64, height as f64),
            href: None,
            placement: BackgroundPlacement::default(),
        })
    }

    /// Validate a PNG/JPEG file and read its pixel size from the header.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, BackgroundImageError> {
        let path = path.as_ref();
        match ImageFormat::from_path(path) {
            Ok(ImageFormat::Png | ImageFormat::Jpeg) => {}
            _ => {
                return Err(BackgroundImageError::UnsupportedFormat(
                    path.display().to_string(),
                ))
            }
        }
        let bytes = std::fs::metadata(path)?.len();
        if bytes > MAX_BACKGROUND_FILE_BYTES {
            return Err(BackgroundImageError::TooLarge {
                size: bytes,
                max: MAX_BACKGROUND_FILE_BYTES,
            });
        }
        let (w, h) = image::image_dimensions(path)?;
        log::debug!("background {} is {w}x{h}", path.display());
        let mut bg = Self::from_size(w, h)?;
        bg.href = Some(path.display().to_string());
        Ok(bg)
    }

    #[inline]
    pub fn size(&self) -> Dimensions {
        self.size
    }

    pub fn href(&self) -> Option<&str> {
        self.href.as_deref()
    }

    #[inline]
    pub fn placement(&self) -> BackgroundPlacement {
        self.placement
    }

    /// Set the scale, clamped to `[MIN_BACKGROUND_SCALE, MAX_BACKGROUND_SCALE]`.
    /// Non-finite input is ignored.
    pub fn set_scale(&mut self, scale: f64) {
        if scale.is_finite() {
            self.placement.scale = scale.clamp(MIN_BACKGROUND_SCALE, MAX_BACKGROUND_SCALE);
        }
    }

    pub fn set_offset(&mut self, offset: Vector2<f64>) {
        if offset.x.is_finite() && offset.y.is_finite() {
            self.placement.offset = offset;
        }
    }

    /// Replace the placement with [`fit_to_canvas`] for `canvas`.
    pub fn auto_fit(&mut self, canvas: Dimensions) {
        self.placement = fit_to_canvas(self.size, canvas);
    }

    /// Builder form of [`BackgroundImage::auto_fit`].
    pub fn fitted(mut self, canvas: Dimensions) -> Self {
        self.auto_fit(canvas);
        self
    }

    /// Rectangle covered by the image in template space.
    pub fn rect(&self) -> Rect {
        let p = self.placement;
        Rect::new(
            p.offset.x,
            p.offset.y,
            self.size.width * p.scale,
            self.size.height * p.scale,
        )
    }
}

/// Uniform scale `min(cw/iw, ch/ih) * 0.8`, centered on the canvas.
pub fn fit_to_canvas(image: Dimensions, canvas: Dimensions) -> BackgroundPlacement {
    if !image.is_valid() || !canvas.is_valid() {
        return BackgroundPlacement {
            scale: 0.0,
            offset: Vector2::zeros(),
        };
    }
    let scale = (canvas.width / image.width).min(canvas.height / image.height) * BACKGROUND_FILL;
    let offset = Vector2::new(
        (canvas.width - image.width * scale) * 0.5,
        (canvas.height - image.height * scale) * 0.5,
    );
    BackgroundPlacement { scale, offset }
}
