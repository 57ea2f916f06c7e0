//! Entry point crate for the `omr-layout-*` workspace.
//!
//! This crate provides:
//! - re-exports of the template core, the layout editor and camera capture,
//! - [`CoreEvent`], the single event stream a host shell listens to,
//! - (feature `cli`) the `omr-layout` binary for inspecting, repairing and
//!   rendering templates from the command line.
//!
//! ## Quickstart
//!
//! ```
//! use omr_layout::editor::EditorSession;
//! use omr_layout::{CoreEvent, Template};
//!
//! let mut session = EditorSession::new(Template::default());
//! session.add_field_block();
//!
//! let events: Vec<CoreEvent> = session.drain_events().into_iter().map(Into::into).collect();
//! assert!(matches!(&events[0], CoreEvent::TemplateChanged(t) if t.len() == 1));
//! ```
//!
//! ## API map
//! - `omr_layout::core`: template model, JSON I/O, space transforms.
//! - `omr_layout::editor`: view state, drag, render pipeline and SVG output.
//! - `omr_layout::capture`: alignment estimation, camera session, JPEG capture.

pub use omr_layout_capture as capture;
pub use omr_layout_core as core;
pub use omr_layout_editor as editor;

pub use omr_layout_capture::{CameraErrorKind, ImageArtifact};
pub use omr_layout_core::{AlignmentQuality, BlockId, FieldBlock, LoadedTemplate, Template};

mod events;

pub use events::CoreEvent;
