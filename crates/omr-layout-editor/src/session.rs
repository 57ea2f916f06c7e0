use log::{debug, info};
use nalgebra::{Point2, Vector2};
use omr_layout_core::{AlignmentQuality, BlockId, Dimensions, FieldBlock, Template};

use crate::background::BackgroundImage;
use crate::drag::{DragController, PointerOutcome};
use crate::render::{render_editor, render_overlay, Scene};
use crate::view::ViewState;

/// Notifications for the host shell.
#[derive(Clone, Debug, PartialEq)]
pub enum EditorEvent {
    /// The template changed; carries a snapshot of the new state.
    TemplateChanged(Template),
}

/// One open template in the editor: model, view, gesture state and pending
/// events.
///
/// Model edits go through the session so every change is announced once. A
/// drag emits a single `TemplateChanged` when the gesture ends, not per move.
#[derive(Debug, Default)]
pub struct EditorSession {
    template: Template,
    view: ViewState,
    drag: DragController,
    background: Option<BackgroundImage>,
    events: Vec<EditorEvent>,
}

impl EditorSession {
    pub fn new(template: Template) -> Self {
        info!(
            "editor session opened ({} blocks, page {}x{})",
            template.len(),
            template.page_dimensions().width,
            template.page_dimensions().height
        );
        Self {
            template,
            ..Self::default()
        }
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn into_template(self) -> Template {
        self.template
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    pub fn selected_block(&self) -> Option<&FieldBlock> {
        self.view
            .selected
            .as_deref()
            .and_then(|id| self.template.block(id))
    }

    pub fn select(&mut self, id: Option<&str>) {
        self.view.selected = id.filter(|id| self.template.contains(id)).map(str::to_string);
    }

    /// Take all pending events, oldest first.
    pub fn drain_events(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.events)
    }

    fn changed(&mut self) {
        self.events
            .push(EditorEvent::TemplateChanged(self.template.clone()));
    }

    // model edits

    pub fn add_field_block(&mut self) -> BlockId {
        let id = self.template.add_field_block();
        self.changed();
        id
    }

    /// Remove a block; clears the selection if it was selected.
    pub fn remove_field_block(&mut self, id: &str) -> bool {
        if self.template.remove_field_block(id).is_none() {
            return false;
        }
        if self.view.is_selected(id) {
            self.view.selected = None;
        }
        self.changed();
        true
    }

    pub fn set_origin(&mut self, id: &str, origin: Point2<f64>) -> bool {
        let ok = self.template.set_origin(id, origin);
        if ok {
            self.changed();
        }
        ok
    }

    pub fn set_bubble_count(&mut self, id: &str, count: u32) -> bool {
        let ok = self.template.set_bubble_count(id, count);
        if ok {
            self.changed();
        }
        ok
    }

    pub fn set_field_label(&mut self, id: &str, row: usize, label: impl Into<String>) -> bool {
        let ok = self.template.set_field_label(id, row, label);
        if ok {
            self.changed();
        }
        ok
    }

    // view commands

    pub fn zoom_in(&mut self) {
        self.view.zoom_in();
        debug!("zoom {:.3}", self.view.zoom());
    }

    pub fn zoom_out(&mut self) {
        self.view.zoom_out();
        debug!("zoom {:.3}", self.view.zoom());
    }

    pub fn reset_view(&mut self) {
        self.view.reset();
    }

    pub fn toggle_grid(&mut self) {
        self.view.toggle_grid();
    }

    pub fn toggle_coordinates(&mut self) {
        self.view.toggle_coordinates();
    }

    pub fn toggle_background(&mut self) {
        self.view.toggle_background();
    }

    /// Attach a reference image, fitted to the page, or detach it.
    pub fn set_background(&mut self, background: Option<BackgroundImage>) {
        let page = self.template.page_dimensions();
        self.background = background.map(|bg| bg.fitted(page));
    }

    pub fn set_background_scale(&mut self, scale: f64) {
        if let Some(bg) = self.background.as_mut() {
            bg.set_scale(scale);
            debug!("background scale {:.2}", bg.placement().scale);
        }
    }

    pub fn set_background_offset(&mut self, offset: Vector2<f64>) {
        if let Some(bg) = self.background.as_mut() {
            bg.set_offset(offset);
        }
    }

    pub fn auto_fit_background(&mut self) {
        let page = self.template.page_dimensions();
        if let Some(bg) = self.background.as_mut() {
            bg.auto_fit(page);
        }
    }

    pub fn background(&self) -> Option<&BackgroundImage> {
        self.background.as_ref()
    }

    // pointer input, view-space pixels

    pub fn pointer_down(&mut self, p: Point2<f64>) -> PointerOutcome {
        self.drag.pointer_down(p, &self.template, &mut self.view)
    }

    pub fn pointer_move(&mut self, p: Point2<f64>) -> PointerOutcome {
        self.drag
            .pointer_move(p, &mut self.template, &mut self.view)
    }

    pub fn pointer_up(&mut self) -> PointerOutcome {
        let outcome = self.drag.pointer_up();
        self.finish_gesture(&outcome);
        outcome
    }

    pub fn pointer_leave(&mut self) -> PointerOutcome {
        let outcome = self.drag.pointer_leave();
        self.finish_gesture(&outcome);
        outcome
    }

    fn finish_gesture(&mut self, outcome: &PointerOutcome) {
        if let PointerOutcome::Ended { moved: Some(id) } = outcome {
            debug!("block {id} moved");
            self.changed();
        }
    }

    // rendering

    pub fn render(&self) -> Scene {
        render_editor(&self.template, &self.view, self.background.as_ref())
    }

    pub fn render_overlay(&self, frame: Dimensions, quality: AlignmentQuality) -> Scene {
        render_overlay(&self.template, frame, quality)
    }
}
