use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;

pub const JPEG_MIME: &str = "image/jpeg";
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// A captured still, ready to hand to the upload side.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageArtifact {
    pub filename: String,
    pub mime_type: &'static str,
    pub width: u32,
    pub height: u32,
    pub captured_at: DateTime<Utc>,
    pub bytes: Vec<u8>,
}

impl ImageArtifact {
    /// Encode `frame` as JPEG and name it after `captured_at`.
    pub fn encode(
        frame: &RgbImage,
        quality: u8,
        captured_at: DateTime<Utc>,
    ) -> Result<Self, image::ImageError> {
        Ok(Self {
            filename: capture_filename(captured_at),
            mime_type: JPEG_MIME,
            width: frame.width(),
            height: frame.height(),
            captured_at,
            bytes: encode_jpeg(frame, quality)?,
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Write the JPEG into `dir` under its own filename.
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> std::io::Result<PathBuf> {
        let path = dir.as_ref().join(&self.filename);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

/// `omr_capture_<ISO-8601 UTC with ':' and '.' replaced by '-'>.jpg`,
/// e.g. `omr_capture_2024-05-01T12-30-45-123Z.jpg`.
pub fn capture_filename(at: DateTime<Utc>) -> String {
    let stamp = at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("omr_capture_{stamp}.jpg")
}

pub fn encode_jpeg(frame: &RgbImage, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100)).encode_image(frame)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn filename_replaces_separators() {
        let at = Utc
            .with_ymd_and_hms(2024, 5, 1, 12, 30, 45)
            .single()
            .expect("time")
            + chrono::Duration::milliseconds(123);
        assert_eq!(capture_filename(at), "omr_capture_2024-05-01T12-30-45-123Z.jpg");
    }

    #[test]
    fn encodes_a_decodable_jpeg() {
        let frame = RgbImage::from_pixel(32, 24, image::Rgb([200, 180, 160]));
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).single().expect("time");
        let art = ImageArtifact::encode(&frame, DEFAULT_JPEG_QUALITY, at).expect("encode");
        assert_eq!(&art.bytes[..2], &[0xff, 0xd8]);
        assert_eq!(art.mime_type, "image/jpeg");

        let decoded = image::load_from_memory(&art.bytes).expect("decode");
        assert_eq!((decoded.width(), decoded.height()), (32, 24));

        let dir = tempfile::tempdir().expect("tempdir");
        let path = art.write_to_dir(dir.path()).expect("write");
        assert!(path.ends_with("omr_capture_2024-01-02T03-04-05-000Z.jpg"));
    }
}
