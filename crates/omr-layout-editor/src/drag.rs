//! Pointer gesture state machine for moving blocks and panning the view.
//!
//! ```text
//! Idle --down on block--> DraggingField --up/leave--> Idle
//! Idle --down elsewhere--> Panning      --up/leave--> Idle
//! ```
//!
//! All pointer positions are view-space canvas pixels.

use log::debug;
use nalgebra::{Point2, Vector2};
use omr_layout_core::{BlockId, Template};

use crate::hit_test::hit_test;
use crate::view::ViewState;

#[derive(Clone, Debug, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    DraggingField {
        id: BlockId,
        start: Point2<f64>,
        original: Point2<f64>,
        moved: bool,
    },
    Panning {
        previous: Point2<f64>,
    },
}

/// What a pointer event did.
#[derive(Clone, Debug, PartialEq)]
pub enum PointerOutcome {
    /// No state change.
    Ignored,
    /// A block was selected and a drag started.
    DragStarted(BlockId),
    /// Empty canvas: selection cleared, panning started.
    PanStarted,
    BlockMoved { id: BlockId, origin: Point2<f64> },
    Panned(Vector2<f64>),
    /// Gesture finished; carries the block id if a drag changed its origin.
    Ended { moved: Option<BlockId> },
}

#[derive(Clone, Debug, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == DragState::Idle
    }

    /// Start a gesture. Ignored while another gesture is active.
    pub fn pointer_down(
        &mut self,
        p: Point2<f64>,
        template: &Template,
        view: &mut ViewState,
    ) -> PointerOutcome {
        if !self.is_idle() {
            return PointerOutcome::Ignored;
        }
        let at = view.transform().to_template(p);
        match hit_test(template, at) {
            Some(block) => {
                let id = block.id().to_string();
                debug!("drag start on {id} at ({:.1}, {:.1})", at.x, at.y);
                view.selected = Some(id.clone());
                self.state = DragState::DraggingField {
                    id: id.clone(),
                    start: p,
                    original: block.origin(),
                    moved: false,
                };
                PointerOutcome::DragStarted(id)
            }
            None => {
                view.selected = None;
                self.state = DragState::Panning { previous: p };
                PointerOutcome::PanStarted
            }
        }
    }

    pub fn pointer_move(
        &mut self,
        p: Point2<f64>,
        template: &mut Template,
        view: &mut ViewState,
    ) -> PointerOutcome {
        match &mut self.state {
            DragState::Idle => PointerOutcome::Ignored,
            DragState::DraggingField {
                id,
                start,
                original,
                moved,
            } => {
                let target = *original + (p - *start) / view.zoom();
                if !template.set_origin(id, target) {
                    // block vanished mid-drag
                    self.state = DragState::Idle;
                    return PointerOutcome::Ignored;
                }
                let origin = template.block(id).map_or(target, |b| b.origin());
                *moved = origin != *original;
                PointerOutcome::BlockMoved {
                    id: id.clone(),
                    origin,
                }
            }
            DragState::Panning { previous } => {
                let delta = p - *previous;
                view.pan += delta;
                *previous = p;
                PointerOutcome::Panned(delta)
            }
        }
    }

    pub fn pointer_up(&mut self) -> PointerOutcome {
        match std::mem::take(&mut self.state) {
            DragState::Idle => PointerOutcome::Ignored,
            DragState::DraggingField { id, moved, .. } => {
                debug!("drag end on {id} (moved: {moved})");
                PointerOutcome::Ended {
                    moved: moved.then_some(id),
                }
            }
            DragState::Panning { .. } => PointerOutcome::Ended { moved: None },
        }
    }

    /// Pointer left the canvas; same as releasing it.
    pub fn pointer_leave(&mut self) -> PointerOutcome {
        self.pointer_up()
    }
}
