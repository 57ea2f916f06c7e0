//! Answer-sheet template: page size, bubble size and an ordered set of field
//! blocks.
//!
//! Blocks are kept in insertion (document) order. That order is used for
//! rendering, hit testing and serialization alike.

mod block;
mod load;

pub use block::{
    default_label, BlockGeometry, BlockId, FieldBlock, FieldType, BUBBLES_PER_ROW,
    DEFAULT_BUBBLES_GAP, DEFAULT_BUBBLE_COUNT, DEFAULT_LABELS_GAP,
};
pub use load::{LoadedTemplate, TemplateError, TemplateIssue};

use log::debug;
use nalgebra::Point2;
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};

use crate::geometry::{Dimensions, Rect};

pub const DEFAULT_PAGE_DIMENSIONS: Dimensions = Dimensions::new(707.0, 484.0);
pub const DEFAULT_BUBBLE_DIMENSIONS: Dimensions = Dimensions::new(15.0, 10.0);
pub const DEFAULT_EMPTY_VALUE: &str = "-";

/// Horizontal stride between the default origins of consecutive new blocks.
const NEW_BLOCK_STRIDE: f64 = 150.0;
const NEW_BLOCK_X: f64 = 100.0;
const NEW_BLOCK_Y: f64 = 50.0;

#[derive(Clone, Debug, PartialEq)]
pub struct Template {
    page_dimensions: Dimensions,
    bubble_dimensions: Dimensions,
    blocks: Vec<FieldBlock>,
    pub empty_value: String,
}

impl Default for Template {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_DIMENSIONS, DEFAULT_BUBBLE_DIMENSIONS)
    }
}

impl Template {
    /// Empty template with the given page and bubble sizes. An invalid bubble
    /// size falls back to the default.
    pub fn new(page_dimensions: Dimensions, bubble_dimensions: Dimensions) -> Self {
        Self {
            page_dimensions,
            bubble_dimensions: if bubble_dimensions.is_valid() {
                bubble_dimensions
            } else {
                DEFAULT_BUBBLE_DIMENSIONS
            },
            blocks: Vec::new(),
            empty_value: DEFAULT_EMPTY_VALUE.to_string(),
        }
    }

    /// Page size in template units. Fixed for the lifetime of the template.
    #[inline]
    pub fn page_dimensions(&self) -> Dimensions {
        self.page_dimensions
    }

    #[inline]
    pub fn bubble_dimensions(&self) -> Dimensions {
        self.bubble_dimensions
    }

    /// Resize every bubble. Returns false and keeps the old size unless both
    /// sides are finite and positive.
    pub fn set_bubble_dimensions(&mut self, bubble: Dimensions) -> bool {
        let ok = bubble.is_valid();
        if ok {
            self.bubble_dimensions = bubble;
        }
        ok
    }

    #[inline]
    pub fn blocks(&self) -> &[FieldBlock] {
        &self.blocks
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn block(&self, id: &str) -> Option<&FieldBlock> {
        self.blocks.iter().find(|b| b.id() == id)
    }

    fn block_mut(&mut self, id: &str) -> Option<&mut FieldBlock> {
        self.blocks.iter_mut().find(|b| b.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.block(id).is_some()
    }

    /// Geometry of a block using this template's bubble size.
    pub fn geometry(&self, block: &FieldBlock) -> BlockGeometry {
        block.geometry(self.bubble_dimensions)
    }

    /// Bubble-grid bounds of the block with `id`, without any margin.
    pub fn block_bounds(&self, id: &str) -> Option<Rect> {
        self.block(id).map(|b| self.geometry(b).bounds())
    }

    /// Append a block. Returns the block back if its id is already taken.
    pub fn insert_block(&mut self, block: FieldBlock) -> Result<(), FieldBlock> {
        if self.contains(block.id()) {
            return Err(block);
        }
        self.blocks.push(block);
        Ok(())
    }

    /// Append a default block after the existing ones and return its id.
    ///
    /// With `N` blocks present the new block is `Column<N+1>` at
    /// `(100 + 150 N, 50)` labelled `Q(20N+1)..Q(20N+20)`. If removals left
    /// that id taken, `N` is bumped until the id is free.
    pub fn add_field_block(&mut self) -> BlockId {
        let mut n = self.blocks.len();
        while self.contains(&format!("Column{}", n + 1)) {
            n += 1;
        }
        let id = format!("Column{}", n + 1);
        let origin = Point2::new(NEW_BLOCK_X + NEW_BLOCK_STRIDE * n as f64, NEW_BLOCK_Y);
        let first_label = DEFAULT_BUBBLE_COUNT as usize * n + 1;
        debug!("adding field block {id} at ({}, {})", origin.x, origin.y);
        self.blocks
            .push(FieldBlock::with_defaults(id.clone(), origin, first_label));
        id
    }

    /// Delete a block; `None` if no block has that id.
    pub fn remove_field_block(&mut self, id: &str) -> Option<FieldBlock> {
        let idx = self.blocks.iter().position(|b| b.id() == id)?;
        debug!("removing field block {id}");
        Some(self.blocks.remove(idx))
    }

    /// Move a block, clamping to non-negative coordinates. Returns false if
    /// the block does not exist.
    pub fn set_origin(&mut self, id: &str, origin: Point2<f64>) -> bool {
        match self.block_mut(id) {
            Some(b) => {
                b.set_origin(origin);
                true
            }
            None => false,
        }
    }

    pub fn set_bubble_count(&mut self, id: &str, count: u32) -> bool {
        match self.block_mut(id) {
            Some(b) => {
                b.set_bubble_count(count);
                true
            }
            None => false,
        }
    }

    /// Rename one row label. False when the block or row does not exist.
    pub fn set_field_label(&mut self, id: &str, row: usize, label: impl Into<String>) -> bool {
        self.block_mut(id).is_some_and(|b| b.set_label(row, label))
    }

    /// Lenient parse of template JSON; see [`LoadedTemplate`].
    pub fn from_json_str(json: &str) -> Result<LoadedTemplate, TemplateError> {
        load::load_str(json)
    }

    pub fn to_json_value(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    /// Pretty-printed JSON in the template file shape.
    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

// `fieldBlocks` is written as an object keyed by block id, in block order.
struct BlockMap<'a>(&'a [FieldBlock]);

impl Serialize for BlockMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for block in self.0 {
            map.serialize_entry(block.id(), block)?;
        }
        map.end()
    }
}

impl Serialize for Template {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Template", 4)?;
        s.serialize_field("pageDimensions", &self.page_dimensions)?;
        s.serialize_field("bubbleDimensions", &self.bubble_dimensions)?;
        s.serialize_field("fieldBlocks", &BlockMap(&self.blocks))?;
        s.serialize_field("emptyValue", &self.empty_value)?;
        s.end()
    }
}
