//! Alignment quality from a live frame.
//!
//! The default [`BorderContrastClassifier`] assumes a light sheet on a darker
//! surface. It samples pairs of pixels straddling each edge of the overlay
//! box: one a band inside, one a band outside. A pair is an edge hit when the
//! inside is brighter by at least `min_edge_contrast`. The hit fraction per
//! edge and overall, together with the interior brightness, gives the quality.

use std::time::{Duration, Instant};

use log::debug;
use omr_layout_core::{overlay_box, sample_bilinear, AlignmentQuality, Dimensions, GrayImageView, Rect};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Tuning for the alignment estimator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentParams {
    /// Re-evaluation period while the stream is open.
    pub interval_ms: u64,
    /// Sample pairs along each edge of the overlay box.
    pub samples_per_edge: usize,
    /// Offset of the inside/outside samples from the edge, as a fraction of
    /// the shorter box side.
    pub band_frac: f32,
    /// Minimum inside-minus-outside gray difference for an edge hit.
    pub min_edge_contrast: f32,
    /// Overall hit fraction for `good`.
    pub good_fraction: f32,
    /// Every edge must reach this hit fraction for `good`.
    pub min_edge_fraction: f32,
    /// Overall hit fraction for `warning`.
    pub warning_fraction: f32,
    /// Mean interior gray level required for `good`.
    pub min_paper_brightness: f32,
}

impl Default for AlignmentParams {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            samples_per_edge: 32,
            band_frac: 0.03,
            min_edge_contrast: 25.0,
            good_fraction: 0.75,
            min_edge_fraction: 0.5,
            warning_fraction: 0.4,
            min_paper_brightness: 120.0,
        }
    }
}

impl AlignmentParams {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

impl Edge {
    pub const ALL: [Edge; 4] = [Edge::Top, Edge::Right, Edge::Bottom, Edge::Left];
}

/// Outcome of classifying one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct AlignmentReport {
    pub quality: AlignmentQuality,
    /// Mean of `per_edge`.
    pub edge_score: f32,
    /// Hit fraction per edge, in [`Edge::ALL`] order.
    pub per_edge: [f32; 4],
    pub interior_mean: f32,
}

impl AlignmentReport {
    pub fn poor() -> Self {
        Self {
            quality: AlignmentQuality::Poor,
            edge_score: 0.0,
            per_edge: [0.0; 4],
            interior_mean: 0.0,
        }
    }

    pub fn edge(&self, edge: Edge) -> f32 {
        self.per_edge[edge as usize]
    }

    pub fn weakest_edge(&self) -> f32 {
        self.per_edge.iter().copied().fold(f32::INFINITY, f32::min)
    }
}

/// Decides how well the page is framed in a video frame.
pub trait AlignmentClassifier: Send {
    fn classify(&self, frame: &GrayImageView<'_>, page: Dimensions) -> AlignmentReport;
}

#[derive(Clone, Debug, Default)]
pub struct BorderContrastClassifier {
    pub params: AlignmentParams,
}

impl BorderContrastClassifier {
    pub fn new(params: AlignmentParams) -> Self {
        Self { params }
    }

    fn edge_hits(&self, frame: &GrayImageView<'_>, bx: &Rect, edge: Edge, band: f32) -> f32 {
        let n = self.params.samples_per_edge.max(1);
        let (x0, y0) = (bx.x as f32, bx.y as f32);
        let (x1, y1) = (bx.right() as f32, bx.bottom() as f32);
        let mut hits = 0usize;
        for i in 0..n {
            let t = (i as f32 + 0.5) / n as f32;
            // (point on the edge, inward normal)
            let ((px, py), (nx, ny)) = match edge {
                Edge::Top => ((x0 + t * (x1 - x0), y0), (0.0, 1.0)),
                Edge::Bottom => ((x0 + t * (x1 - x0), y1), (0.0, -1.0)),
                Edge::Left => ((x0, y0 + t * (y1 - y0)), (1.0, 0.0)),
                Edge::Right => ((x1, y0 + t * (y1 - y0)), (-1.0, 0.0)),
            };
            let inside = sample_bilinear(frame, px + nx * band, py + ny * band);
            let outside = sample_bilinear(frame, px - nx * band, py - ny * band);
            if inside - outside >= self.params.min_edge_contrast {
                hits += 1;
            }
        }
        hits as f32 / n as f32
    }

    fn interior_mean(&self, frame: &GrayImageView<'_>, bx: &Rect, band: f32) -> f32 {
        const GRID: usize = 8;
        let w = bx.width as f32 - 2.0 * band;
        let h = bx.height as f32 - 2.0 * band;
        if w <= 0.0 || h <= 0.0 {
            return 0.0;
        }
        let mut sum = 0.0;
        for j in 0..GRID {
            for i in 0..GRID {
                let x = bx.x as f32 + band + w * (i as f32 + 0.5) / GRID as f32;
                let y = bx.y as f32 + band + h * (j as f32 + 0.5) / GRID as f32;
                sum += sample_bilinear(frame, x, y);
            }
        }
        sum / (GRID * GRID) as f32
    }

    fn grade(&self, edge_score: f32, weakest: f32, interior_mean: f32) -> AlignmentQuality {
        let p = &self.params;
        if edge_score >= p.good_fraction
            && weakest >= p.min_edge_fraction
            && interior_mean >= p.min_paper_brightness
        {
            AlignmentQuality::Good
        } else if edge_score >= p.warning_fraction {
            AlignmentQuality::Warning
        } else {
            AlignmentQuality::Poor
        }
    }
}

impl AlignmentClassifier for BorderContrastClassifier {
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, frame), fields(width = frame.width, height = frame.height))
    )]
    fn classify(&self, frame: &GrayImageView<'_>, page: Dimensions) -> AlignmentReport {
        let size = Dimensions::new(frame.width as f64, frame.height as f64);
        let bx = overlay_box(page, size);
        if bx.width <= 0.0 || bx.height <= 0.0 {
            return AlignmentReport::poor();
        }
        let band = (self.params.band_frac * bx.width.min(bx.height) as f32).max(2.0);

        let mut per_edge = [0.0f32; 4];
        for (slot, edge) in per_edge.iter_mut().zip(Edge::ALL) {
            *slot = self.edge_hits(frame, &bx, edge, band);
        }
        let edge_score = per_edge.iter().sum::<f32>() / 4.0;
        let interior_mean = self.interior_mean(frame, &bx, band);
        let weakest = per_edge.iter().copied().fold(f32::INFINITY, f32::min);

        AlignmentReport {
            quality: self.grade(edge_score, weakest, interior_mean),
            edge_score,
            per_edge,
            interior_mean,
        }
    }
}

/// Runs the classifier at a fixed cadence and holds the current quality.
pub struct AlignmentEstimator {
    interval: Duration,
    classifier: Box<dyn AlignmentClassifier>,
    quality: AlignmentQuality,
    last_run: Option<Instant>,
    last_report: Option<AlignmentReport>,
}

impl std::fmt::Debug for AlignmentEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlignmentEstimator")
            .field("interval", &self.interval)
            .field("quality", &self.quality)
            .field("last_run", &self.last_run)
            .finish_non_exhaustive()
    }
}

impl AlignmentEstimator {
    pub fn new(params: AlignmentParams) -> Self {
        let interval = params.interval();
        Self::with_classifier(interval, Box::new(BorderContrastClassifier::new(params)))
    }

    pub fn with_classifier(interval: Duration, classifier: Box<dyn AlignmentClassifier>) -> Self {
        Self {
            interval,
            classifier,
            quality: AlignmentQuality::Poor,
            last_run: None,
            last_report: None,
        }
    }

    #[inline]
    pub fn quality(&self) -> AlignmentQuality {
        self.quality
    }

    pub fn last_report(&self) -> Option<&AlignmentReport> {
        self.last_report.as_ref()
    }

    /// True when no evaluation ran yet or the interval has elapsed.
    pub fn is_due(&self, now: Instant) -> bool {
        self.last_run
            .is_none_or(|last| now.saturating_duration_since(last) >= self.interval)
    }

    /// Classify `frame` if due. Returns the new quality when it changed.
    pub fn tick(
        &mut self,
        now: Instant,
        frame: &GrayImageView<'_>,
        page: Dimensions,
    ) -> Option<AlignmentQuality> {
        if !self.is_due(now) {
            return None;
        }
        self.last_run = Some(now);
        let report = self.classifier.classify(frame, page);
        debug!(
            "alignment {} (edges {:.2}, weakest {:.2}, interior {:.0})",
            report.quality,
            report.edge_score,
            report.weakest_edge(),
            report.interior_mean
        );
        let quality = report.quality;
        self.last_report = Some(report);
        if quality == self.quality {
            return None;
        }
        self.quality = quality;
        Some(quality)
    }

    /// Back to `poor` with the timer cleared.
    pub fn reset(&mut self) {
        self.quality = AlignmentQuality::Poor;
        self.last_run = None;
        self.last_report = None;
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use image::GrayImage;
    use omr_layout_core::overlay_box;

    fn view(img: &GrayImage) -> GrayImageView<'_> {
        GrayImageView::new(img.width() as usize, img.height() as usize, img.as_raw())
            .expect("view")
    }

    fn classify(img: &GrayImage) -> AlignmentReport {
        BorderContrastClassifier::default().classify(&view(img), PAGE)
    }

    #[test]
    fn sheet_on_the_guide_is_good() {
        let img = aligned_frame(640, 480);
        let r = classify(&img);
        assert_eq!(r.quality, AlignmentQuality::Good);
        assert_eq!(r.per_edge, [1.0; 4]);
        assert!(r.interior_mean > 200.0);
    }

    #[test]
    fn half_sheet_is_warning() {
        let bx = overlay_box(PAGE, Dimensions::new(640.0, 480.0));
        let left_half = Rect::new(bx.x, bx.y, bx.width * 0.5, bx.height);
        let img = frame_with_sheet(640, 480, left_half);
        let r = classify(&img);
        assert_eq!(r.edge(Edge::Left), 1.0);
        assert_eq!(r.edge(Edge::Right), 0.0);
        assert_eq!(r.quality, AlignmentQuality::Warning);
    }

    #[test]
    fn empty_or_overfilled_frame_is_poor() {
        let dark = GrayImage::from_pixel(640, 480, image::Luma([30]));
        assert_eq!(classify(&dark).quality, AlignmentQuality::Poor);
        let bright = GrayImage::from_pixel(640, 480, image::Luma([230]));
        assert_eq!(classify(&bright).quality, AlignmentQuality::Poor);
    }

    #[test]
    fn estimator_runs_once_per_interval() {
        let img = aligned_frame(640, 480);
        let frame = view(&img);
        let mut est = AlignmentEstimator::new(AlignmentParams::default());
        assert_eq!(est.quality(), AlignmentQuality::Poor);

        let t0 = Instant::now();
        assert_eq!(est.tick(t0, &frame, PAGE), Some(AlignmentQuality::Good));
        assert!(!est.is_due(t0 + Duration::from_millis(999)));
        // same quality again: no change reported
        assert_eq!(est.tick(t0 + Duration::from_millis(1000), &frame, PAGE), None);

        est.reset();
        assert_eq!(est.quality(), AlignmentQuality::Poor);
        assert!(est.is_due(t0));
        assert!(est.last_report().is_none());
    }
}
