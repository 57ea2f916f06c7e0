/// Borrowed 8-bit grayscale frame, row-major, `data.len() == width * height`.
#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8],
}

impl<'a> GrayImageView<'a> {
    /// Wrap a raw buffer, rejecting mismatched lengths.
    pub fn new(width: usize, height: usize, data: &'a [u8]) -> Option<Self> {
        (width.checked_mul(height)? == data.len()).then_some(Self {
            width,
            height,
            data,
        })
    }
}

// Out-of-bounds reads clamp to the nearest edge pixel.
#[inline]
fn pixel(src: &GrayImageView<'_>, x: i32, y: i32) -> f32 {
    if src.width == 0 || src.height == 0 {
        return 0.0;
    }
    let col = x.clamp(0, src.width as i32 - 1) as usize;
    let row = y.clamp(0, src.height as i32 - 1) as usize;
    src.data[row * src.width + col] as f32
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + t * (b - a)
}

/// Intensity at a sub-pixel position, pixel centers at integer coordinates.
#[inline]
pub fn sample_bilinear(src: &GrayImageView<'_>, x: f32, y: f32) -> f32 {
    let (fx, fy) = (x.floor(), y.floor());
    let (tx, ty) = (x - fx, y - fy);
    let (ix, iy) = (fx as i32, fy as i32);
    let top = lerp(pixel(src, ix, iy), pixel(src, ix + 1, iy), tx);
    let bottom = lerp(pixel(src, ix, iy + 1), pixel(src, ix + 1, iy + 1), tx);
    lerp(top, bottom, ty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_buffer() {
        let data = vec![0u8; 11];
        assert!(GrayImageView::new(4, 3, &data).is_none());
        assert!(GrayImageView::new(usize::MAX, 2, &data).is_none());
        let data = vec![0u8; 12];
        assert!(GrayImageView::new(4, 3, &data).is_some());
    }

    #[test]
    fn bilinear_interpolates_between_columns() {
        let data = [0u8, 100, 0, 100];
        let view = GrayImageView::new(2, 2, &data).expect("view");
        assert!((sample_bilinear(&view, 0.5, 0.5) - 50.0).abs() < 1e-4);
        assert!((sample_bilinear(&view, 1.0, 0.0) - 100.0).abs() < 1e-4);
        // clamped outside the frame
        assert!((sample_bilinear(&view, 5.0, 5.0) - 100.0).abs() < 1e-4);
    }
}
