//! Layout editor engine for OMR answer-sheet templates.
//!
//! [`EditorSession`] ties a [`Template`](omr_layout_core::Template) to a
//! [`ViewState`], the pointer [`DragController`] and the render pipeline. The
//! host feeds pointer events in view-space pixels, draws the returned
//! [`Scene`]s and forwards [`EditorEvent`]s.
//!
//! ```
//! use nalgebra::Point2;
//! use omr_layout_core::Template;
//! use omr_layout_editor::{EditorEvent, EditorSession};
//!
//! let mut session = EditorSession::new(Template::default());
//! let id = session.add_field_block();
//! session.pointer_down(Point2::new(105.0, 55.0));
//! session.pointer_move(Point2::new(125.0, 55.0));
//! session.pointer_up();
//!
//! let events = session.drain_events();
//! assert_eq!(events.len(), 2);
//! let EditorEvent::TemplateChanged(t) = &events[1];
//! assert_eq!(t.block(&id).map(|b| b.origin().x), Some(120.0));
//! let svg = session.render().to_svg();
//! assert!(svg.contains("Column1"));
//! ```

pub mod background;
mod drag;
pub mod render;
mod session;
mod view;

pub use background::{
    fit_to_canvas, BackgroundImage, BackgroundImageError, BackgroundPlacement,
};
pub use drag::{DragController, DragState, PointerOutcome};
pub use hit_test::{highlight_rect, hit_test, HIT_MARGIN};
pub use render::{render, render_editor, render_overlay, DrawCommand, Scene, VideoFrame};
pub use session::{EditorEvent, EditorSession};
pub use view::{ViewState, MAX_ZOOM, MIN_ZOOM, ZOOM_STEP};
