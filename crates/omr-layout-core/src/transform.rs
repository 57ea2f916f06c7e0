//! Mappings between template space, view space and video space.
//!
//! - *Template space*: fixed page units, origin at the top-left page corner.
//! - *View space*: canvas pixels, `view = template * zoom + pan`.
//! - *Video space*: pixels of a live camera frame.
//!
//! Everything here is stateless; callers own the `(zoom, pan)` pair.

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use crate::geometry::{Dimensions, Rect};

/// Fraction of the video frame occupied by the page overlay box along its fitted axis.
pub const OVERLAY_FILL: f64 = 0.8;

/// Map a template point into view space.
#[inline]
pub fn to_view(p: Point2<f64>, zoom: f64, pan: Vector2<f64>) -> Point2<f64> {
    Point2::from(p.coords * zoom + pan)
}

/// Map a view point back into template space. `zoom` must be strictly positive.
#[inline]
pub fn to_template(v: Point2<f64>, zoom: f64, pan: Vector2<f64>) -> Point2<f64> {
    debug_assert!(zoom > 0.0, "zoom must be positive");
    Point2::from((v.coords - pan) / zoom)
}

/// A `(zoom, pan)` pair bundled for repeated use.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    pub zoom: f64,
    pub pan: Vector2<f64>,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl ViewTransform {
    /// Zoom 1, no pan.
    pub fn identity() -> Self {
        Self {
            zoom: 1.0,
            pan: Vector2::zeros(),
        }
    }

    pub fn new(zoom: f64, pan: Vector2<f64>) -> Self {
        Self { zoom, pan }
    }

    #[inline]
    pub fn to_view(&self, p: Point2<f64>) -> Point2<f64> {
        to_view(p, self.zoom, self.pan)
    }

    #[inline]
    pub fn to_template(&self, v: Point2<f64>) -> Point2<f64> {
        to_template(v, self.zoom, self.pan)
    }

    /// Scale a template-space length into view space.
    #[inline]
    pub fn length_to_view(&self, len: f64) -> f64 {
        len * self.zoom
    }

    pub fn rect_to_view(&self, r: Rect) -> Rect {
        let o = self.to_view(r.origin());
        Rect::new(o.x, o.y, r.width * self.zoom, r.height * self.zoom)
    }
}

/// Result of matching a canvas to a page.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PageFit {
    /// Canvas equals the page: 1:1 presentation.
    Exact(ViewTransform),
    /// Canvas and page differ; the caller decides whether to resize the
    /// canvas (see [`canvas_size_for_page`]) or pick a zoom.
    Mismatch { page: Dimensions, canvas: Dimensions },
}

/// Presentation for a freshly opened template.
///
/// Never rescales silently: a size mismatch is reported, not corrected.
pub fn fit_to_page(page: Dimensions, canvas: Dimensions) -> PageFit {
    const EPS: f64 = 1e-9;
    if (page.width - canvas.width).abs() <= EPS && (page.height - canvas.height).abs() <= EPS {
        PageFit::Exact(ViewTransform::identity())
    } else {
        PageFit::Mismatch { page, canvas }
    }
}

/// Integer canvas size that holds the page at zoom 1.
pub fn canvas_size_for_page(page: Dimensions) -> (u32, u32) {
    let w = page.width.max(0.0).ceil().min(u32::MAX as f64) as u32;
    let h = page.height.max(0.0).ceil().min(u32::MAX as f64) as u32;
    (w, h)
}

/// Aspect-fit box for the page inside a video frame.
///
/// Fit-to-width when the page is wider than the frame (relative to aspect),
/// fit-to-height otherwise; the fitted axis covers [`OVERLAY_FILL`] of the
/// frame and the box is centered with even margins.
pub fn overlay_box(page: Dimensions, frame: Dimensions) -> Rect {
    if !page.is_valid() || !frame.is_valid() {
        return Rect::new(0.0, 0.0, 0.0, 0.0);
    }
    let page_aspect = page.aspect_ratio();
    let frame_aspect = frame.aspect_ratio();

    if page_aspect > frame_aspect {
        let width = frame.width * OVERLAY_FILL;
        let height = width / page_aspect;
        Rect::new(
            frame.width * (1.0 - OVERLAY_FILL) * 0.5,
            (frame.height - height) * 0.5,
            width,
            height,
        )
    } else {
        let height = frame.height * OVERLAY_FILL;
        let width = height * page_aspect;
        Rect::new(
            (frame.width - width) * 0.5,
            frame.height * (1.0 - OVERLAY_FILL) * 0.5,
            width,
            height,
        )
    }
}

/// Map `p` from a `source`-sized space onto `target` by normalized position.
#[inline]
pub fn map_into_rect(p: Point2<f64>, source: Dimensions, target: Rect) -> Point2<f64> {
    Point2::new(
        target.x + target.width * (p.x / source.width),
        target.y + target.height * (p.y / source.height),
    )
}

/// Map a frame pixel into the on-screen overlay box.
#[inline]
pub fn video_to_overlay(p: Point2<f64>, video: Dimensions, overlay: Rect) -> Point2<f64> {
    map_into_rect(p, video, overlay)
}

/// Project a template point into the overlay box.
#[inline]
pub fn template_to_overlay(p: Point2<f64>, page: Dimensions, overlay: Rect) -> Point2<f64> {
    map_into_rect(p, page, overlay)
}

/// Per-axis scale from template units to overlay pixels.
#[inline]
pub fn overlay_scale(page: Dimensions, overlay: Rect) -> Vector2<f64> {
    Vector2::new(overlay.width / page.width, overlay.height / page.height)
}
