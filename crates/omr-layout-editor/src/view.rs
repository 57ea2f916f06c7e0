use nalgebra::Vector2;
use omr_layout_core::{BlockId, ViewTransform};
use serde::{Deserialize, Deserializer, Serialize};

pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 3.0;
/// Multiplicative step for one zoom-in or zoom-out command.
pub const ZOOM_STEP: f64 = 1.2;

/// Per-session presentation state of the editor canvas. Never persisted with
/// the template.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewState {
    #[serde(deserialize_with = "clamped_zoom")]
    pub(crate) zoom: f64,
    pub pan: Vector2<f64>,
    pub selected: Option<BlockId>,
    pub show_grid: bool,
    pub show_coordinates: bool,
    pub show_background: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Vector2::zeros(),
            selected: None,
            show_grid: true,
            show_coordinates: false,
            show_background: true,
        }
    }
}

fn clamped_zoom<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    let mut view = ViewState::default();
    view.set_zoom(f64::deserialize(d)?);
    Ok(view.zoom)
}

impl ViewState {
    #[inline]
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Set the zoom, clamped to `[MIN_ZOOM, MAX_ZOOM]`. Non-finite input is ignored.
    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        }
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom * ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom / ZOOM_STEP);
    }

    /// Back to zoom 1 with no pan. Selection and toggles are kept.
    pub fn reset(&mut self) {
        self.zoom = 1.0;
        self.pan = Vector2::zeros();
    }

    pub fn toggle_grid(&mut self) {
        self.show_grid = !self.show_grid;
    }

    pub fn toggle_coordinates(&mut self) {
        self.show_coordinates = !self.show_coordinates;
    }

    pub fn toggle_background(&mut self) {
        self.show_background = !self.show_background;
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.as_deref() == Some(id)
    }

    pub fn transform(&self) -> ViewTransform {
        ViewTransform::new(self.zoom, self.pan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn zoom_steps_clamp_at_limits() {
        let mut v = ViewState::default();
        for _ in 0..20 {
            v.zoom_in();
        }
        assert_eq!(v.zoom(), MAX_ZOOM);
        for _ in 0..20 {
            v.zoom_out();
        }
        assert_eq!(v.zoom(), MIN_ZOOM);

        v.reset();
        v.zoom_in();
        assert_abs_diff_eq!(v.zoom(), 1.2, epsilon = 1e-12);
    }

    #[test]
    fn reset_keeps_selection_and_flags() {
        let mut v = ViewState {
            selected: Some("Column1".into()),
            ..ViewState::default()
        };
        v.pan = Vector2::new(40.0, -10.0);
        v.set_zoom(2.0);
        v.toggle_grid();
        v.reset();
        assert_eq!(v.zoom(), 1.0);
        assert_eq!(v.pan, Vector2::zeros());
        assert!(v.is_selected("Column1"));
        assert!(!v.show_grid);
    }

    #[test]
    fn deserialized_zoom_is_clamped() {
        let v: ViewState = serde_json::from_str(r#"{"zoom": 0.0}"#).expect("json");
        assert_eq!(v.zoom(), MIN_ZOOM);
        let v: ViewState = serde_json::from_str(r#"{"zoom": 40}"#).expect("json");
        assert_eq!(v.zoom(), MAX_ZOOM);
        let v: ViewState = serde_json::from_str("{}").expect("json");
        assert_eq!(v, ViewState::default());
    }

    #[test]
    fn ignores_nan_zoom() {
        let mut v = ViewState::default();
        v.set_zoom(f64::NAN);
        assert_eq!(v.zoom(), 1.0);
    }
}
