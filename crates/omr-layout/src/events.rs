use omr_layout_capture::{CameraErrorKind, CaptureEvent, ImageArtifact};
use omr_layout_core::{AlignmentQuality, Template};
use omr_layout_editor::EditorEvent;

/// Everything the host shell is told about, from either the editor or the
/// capture side.
#[derive(Clone, Debug, PartialEq)]
pub enum CoreEvent {
    TemplateChanged(Template),
    CaptureCompleted(ImageArtifact),
    CameraError(CameraErrorKind),
    AlignmentChanged(AlignmentQuality),
}

impl CoreEvent {
    /// Stable lower-camel name, as used by the host bindings.
    pub fn name(&self) -> &'static str {
        match self {
            CoreEvent::TemplateChanged(_) => "templateChanged",
            CoreEvent::CaptureCompleted(_) => "captureCompleted",
            CoreEvent::CameraError(_) => "cameraError",
            CoreEvent::AlignmentChanged(_) => "alignmentChanged",
        }
    }
}

impl From<EditorEvent> for CoreEvent {
    fn from(e: EditorEvent) -> Self {
        match e {
            EditorEvent::TemplateChanged(t) => CoreEvent::TemplateChanged(t),
        }
    }
}

impl From<CaptureEvent> for CoreEvent {
    fn from(e: CaptureEvent) -> Self {
        match e {
            CaptureEvent::CaptureCompleted(a) => CoreEvent::CaptureCompleted(a),
            CaptureEvent::CameraError(kind) => CoreEvent::CameraError(kind),
            CaptureEvent::AlignmentChanged(q) => CoreEvent::AlignmentChanged(q),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use omr_layout_capture::{CaptureController, CaptureParams, Origin, StillImageBackend};
    use omr_layout_core::Dimensions;

    #[test]
    fn capture_failures_surface_as_camera_errors() {
        let backend = StillImageBackend::new(image::RgbImage::new(4, 4));
        let mut ctl = CaptureController::new(
            backend,
            Origin::new("http", "10.0.0.7"),
            Dimensions::new(707.0, 484.0),
            CaptureParams::default(),
        );
        assert!(ctl.open().is_err());
        let events: Vec<CoreEvent> = ctl.drain_events().into_iter().map(Into::into).collect();
        assert_eq!(
            events,
            [CoreEvent::CameraError(CameraErrorKind::InsecureContext)]
        );
        assert_eq!(events[0].name(), "cameraError");
    }

    #[test]
    fn editor_changes_carry_the_template() {
        let mut t = Template::default();
        t.add_field_block();
        let e = CoreEvent::from(EditorEvent::TemplateChanged(t.clone()));
        assert_eq!(e.name(), "templateChanged");
        assert_eq!(e, CoreEvent::TemplateChanged(t));
    }
}
