//! Field blocks and their bubble-grid geometry.

use nalgebra::Point2;
use serde::{Deserialize, Serialize, Serializer};

use crate::geometry::{Dimensions, Rect};

/// Identifier of a field block; unique within a template.
pub type BlockId = String;

/// Answer columns per question row for every supported field type.
pub const BUBBLES_PER_ROW: usize = 4;

pub const DEFAULT_BUBBLES_GAP: f64 = 21.0;
pub const DEFAULT_LABELS_GAP: f64 = 22.7;
pub const DEFAULT_BUBBLE_COUNT: u32 = 20;

/// Kind of question encoded by a block.
///
/// Unknown type strings are preserved so a round trip never rewrites them.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    /// Four-option multiple choice (`QTYPE_MCQ4`).
    #[default]
    Mcq4,
    Other(String),
}

impl FieldType {
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Mcq4 => "QTYPE_MCQ4",
            FieldType::Other(s) => s,
        }
    }

    /// Bubbles per row. Every layout seen so far uses four.
    pub fn options_per_row(&self) -> usize {
        BUBBLES_PER_ROW
    }
}

impl From<String> for FieldType {
    fn from(s: String) -> Self {
        if s == "QTYPE_MCQ4" {
            FieldType::Mcq4
        } else {
            FieldType::Other(s)
        }
    }
}

impl From<FieldType> for String {
    fn from(t: FieldType) -> Self {
        match t {
            FieldType::Mcq4 => "QTYPE_MCQ4".to_string(),
            FieldType::Other(s) => s,
        }
    }
}

/// Default label for a 1-based question row.
pub fn default_label(row_number: usize) -> String {
    format!("Q{row_number}")
}

/// A rectangular group of answer-bubble rows sharing one geometry.
///
/// Geometry fields are private: the setters keep `field_labels.len() ==
/// bubble_count`, a non-negative origin and finite non-negative gaps.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldBlock {
    id: BlockId,
    pub field_type: FieldType,
    #[serde(serialize_with = "serialize_point")]
    origin: Point2<f64>,
    bubbles_gap: f64,
    labels_gap: f64,
    bubble_count: u32,
    field_labels: Vec<String>,
}

fn serialize_point<S: Serializer>(p: &Point2<f64>, s: S) -> Result<S::Ok, S::Error> {
    [p.x, p.y].serialize(s)
}

impl FieldBlock {
    /// Build a block, repairing the label list and clamping the origin. Invalid
    /// gaps fall back to the defaults.
    pub fn new(
        id: impl Into<BlockId>,
        field_type: FieldType,
        origin: Point2<f64>,
        bubbles_gap: f64,
        labels_gap: f64,
        bubble_count: u32,
        field_labels: Vec<String>,
    ) -> Self {
        let mut block = Self {
            id: id.into(),
            field_type,
            origin: clamp_origin(origin),
            bubbles_gap: DEFAULT_BUBBLES_GAP,
            labels_gap: DEFAULT_LABELS_GAP,
            bubble_count: 0,
            field_labels,
        };
        block.set_bubble_count(bubble_count);
        block.set_bubbles_gap(bubbles_gap);
        block.set_labels_gap(labels_gap);
        block
    }

    /// Block with default geometry and labels `Q<first>..`.
    pub fn with_defaults(id: impl Into<BlockId>, origin: Point2<f64>, first_label: usize) -> Self {
        let labels = (0..DEFAULT_BUBBLE_COUNT as usize)
            .map(|i| default_label(first_label + i))
            .collect();
        Self::new(
            id,
            FieldType::Mcq4,
            origin,
            DEFAULT_BUBBLES_GAP,
            DEFAULT_LABELS_GAP,
            DEFAULT_BUBBLE_COUNT,
            labels,
        )
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn origin(&self) -> Point2<f64> {
        self.origin
    }

    #[inline]
    pub fn bubble_count(&self) -> u32 {
        self.bubble_count
    }

    #[inline]
    pub fn bubbles_gap(&self) -> f64 {
        self.bubbles_gap
    }

    #[inline]
    pub fn labels_gap(&self) -> f64 {
        self.labels_gap
    }

    #[inline]
    pub fn field_labels(&self) -> &[String] {
        &self.field_labels
    }

    /// Label for a 0-based row.
    pub fn label(&self, row: usize) -> Option<&str> {
        self.field_labels.get(row).map(String::as_str)
    }

    /// Move the anchor; negative coordinates clamp to zero.
    pub fn set_origin(&mut self, origin: Point2<f64>) {
        self.origin = clamp_origin(origin);
    }

    /// Horizontal gap between bubbles. Negative or non-finite values are
    /// rejected and leave the block unchanged.
    pub fn set_bubbles_gap(&mut self, gap: f64) -> bool {
        let ok = is_valid_gap(gap);
        if ok {
            self.bubbles_gap = gap;
        }
        ok
    }

    /// Vertical gap between rows; same rules as [`FieldBlock::set_bubbles_gap`].
    pub fn set_labels_gap(&mut self, gap: f64) -> bool {
        let ok = is_valid_gap(gap);
        if ok {
            self.labels_gap = gap;
        }
        ok
    }

    /// Change the number of rows (at least one), keeping existing labels by
    /// index and padding new rows with `Q<n>`.
    pub fn set_bubble_count(&mut self, count: u32) {
        let count = count.max(1);
        let len = count as usize;
        self.field_labels.truncate(len);
        let start = self.field_labels.len();
        self.field_labels
            .extend((start..len).map(|row| default_label(row + 1)));
        self.bubble_count = count;
    }

    /// Replace one row label; returns false when `row` is out of range.
    pub fn set_label(&mut self, row: usize, label: impl Into<String>) -> bool {
        match self.field_labels.get_mut(row) {
            Some(slot) => {
                *slot = label.into();
                true
            }
            None => false,
        }
    }

    /// Bubble grid geometry for this block in template space.
    pub fn geometry(&self, bubble: Dimensions) -> BlockGeometry {
        BlockGeometry {
            origin: self.origin,
            bubble,
            columns: self.field_type.options_per_row(),
            rows: self.bubble_count as usize,
            bubbles_gap: self.bubbles_gap,
            labels_gap: self.labels_gap,
        }
    }
}

fn is_valid_gap(gap: f64) -> bool {
    gap.is_finite() && gap >= 0.0
}

fn clamp_origin(p: Point2<f64>) -> Point2<f64> {
    let fix = |v: f64| if v.is_finite() { v.max(0.0) } else { 0.0 };
    Point2::new(fix(p.x), fix(p.y))
}

/// Positions of every bubble in a block.
///
/// Columns advance by `bubble.width + bubbles_gap`, rows by
/// `bubble.height + labels_gap`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlockGeometry {
    pub origin: Point2<f64>,
    pub bubble: Dimensions,
    pub columns: usize,
    pub rows: usize,
    pub bubbles_gap: f64,
    pub labels_gap: f64,
}

impl BlockGeometry {
    #[inline]
    pub fn column_pitch(&self) -> f64 {
        self.bubble.width + self.bubbles_gap
    }

    #[inline]
    pub fn row_pitch(&self) -> f64 {
        self.bubble.height + self.labels_gap
    }

    /// Block size: `columns` bubbles with the gaps between them, and `rows`
    /// rows without the trailing labels gap.
    pub fn size(&self) -> Dimensions {
        let cols = self.columns as f64;
        let rows = self.rows as f64;
        Dimensions::new(
            cols * self.bubble.width + (cols - 1.0).max(0.0) * self.bubbles_gap,
            rows * self.row_pitch() - self.labels_gap,
        )
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.origin, self.size())
    }

    /// Bounding box of the bubble at `(row, column)`.
    pub fn bubble_rect(&self, row: usize, column: usize) -> Rect {
        Rect::new(
            self.origin.x + column as f64 * self.column_pitch(),
            self.origin.y + row as f64 * self.row_pitch(),
            self.bubble.width,
            self.bubble.height,
        )
    }

    #[inline]
    pub fn bubble_center(&self, row: usize, column: usize) -> Point2<f64> {
        self.bubble_rect(row, column).center()
    }

    /// Vertical center of a row.
    #[inline]
    pub fn row_center_y(&self, row: usize) -> f64 {
        self.origin.y + row as f64 * self.row_pitch() + 0.5 * self.bubble.height
    }
}
