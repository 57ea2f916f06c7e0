//! Turn a template and view state into an ordered list of draw commands.
//!
//! Two variants share the block geometry: the editor canvas (page, optional
//! background, grid and editable blocks) and the camera overlay (aspect-fit
//! guide over a video frame). Backends consume [`Scene`]; an SVG writer is
//! included.

mod commands;
mod editor;
mod overlay;
mod svg;

pub use commands::{Color, DrawCommand, Scene, Stroke, TextAlign, TextStyle};
pub use editor::{editor_canvas, render_editor, GRID_SPACING};
pub use overlay::{quality_colors, render_overlay, status_glyph};

use omr_layout_core::{AlignmentQuality, Dimensions, Template};

use crate::background::BackgroundImage;
use crate::view::ViewState;

/// Live video frame the overlay is drawn on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VideoFrame {
    pub size: Dimensions,
    pub quality: AlignmentQuality,
}

/// Render one frame: the camera overlay when `video` is given, the editor
/// canvas otherwise.
pub fn render(
    template: &Template,
    view: &ViewState,
    background: Option<&BackgroundImage>,
    video: Option<VideoFrame>,
) -> Scene {
    match video {
        Some(frame) => render_overlay(template, frame.size, frame.quality),
        None => render_editor(template, view, background),
    }
}
