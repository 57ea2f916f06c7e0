//! Core types for OMR answer-sheet layouts.
//!
//! This crate holds the pieces shared by the layout editor and the camera
//! overlay:
//!
//! - [`Template`] with its ordered [`FieldBlock`]s, lenient JSON loading and
//!   canonical serialization,
//! - [`transform`] for template, view and video space mappings, including the
//!   aspect-fit [`overlay_box`],
//! - [`AlignmentQuality`], the tri-state framing signal,
//! - a borrowed grayscale view with bilinear sampling,
//! - a tiny stderr logger for binaries.
//!
//! Rendering and capture live in their own crates; this one has no drawing or
//! device code.

mod geometry;
mod image;
mod io;
mod logger;
mod quality;
mod template;
pub mod transform;

pub use geometry::{Dimensions, Rect};
pub use image::{sample_bilinear, GrayImageView};
pub use io::{load_json_file, write_json_file, TemplateIoError, MAX_TEMPLATE_FILE_BYTES};
pub use logger::{init_with_level, parse_level};
pub use quality::AlignmentQuality;
pub use template::{
    default_label, BlockGeometry, BlockId, FieldBlock, FieldType, LoadedTemplate, Template,
    TemplateError, TemplateIssue, BUBBLES_PER_ROW, DEFAULT_BUBBLES_GAP, DEFAULT_BUBBLE_COUNT,
    DEFAULT_BUBBLE_DIMENSIONS, DEFAULT_EMPTY_VALUE, DEFAULT_LABELS_GAP, DEFAULT_PAGE_DIMENSIONS,
};
pub use transform::{
    canvas_size_for_page, fit_to_page, overlay_box, template_to_overlay, to_template, to_view,
    video_to_overlay, PageFit, ViewTransform, OVERLAY_FILL,
};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;
