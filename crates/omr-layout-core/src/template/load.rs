//! Lenient template loading.
//!
//! Only unparseable JSON or a non-object root fail the load. Everything else
//! is repaired toward the defaults and reported as a [`TemplateIssue`].

use std::fmt;

use log::warn;
use nalgebra::Point2;
use serde::de::{self, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;
#[cfg(feature = "tracing")]
use tracing::instrument;

use super::block::{
    default_label, FieldBlock, FieldType, DEFAULT_BUBBLES_GAP, DEFAULT_BUBBLE_COUNT,
    DEFAULT_LABELS_GAP,
};
use super::{Template, DEFAULT_BUBBLE_DIMENSIONS, DEFAULT_EMPTY_VALUE, DEFAULT_PAGE_DIMENSIONS};
use crate::geometry::Dimensions;

#[derive(thiserror::Error, Debug)]
pub enum TemplateError {
    #[error("template is not valid JSON: {0}")]
    Syntax(#[source] serde_json::Error),
    #[error("template root must be a JSON object: {0}")]
    NotAnObject(#[source] serde_json::Error),
}

/// A recoverable problem found while loading; the template was repaired.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TemplateIssue {
    #[error("{field} is missing or invalid, using {default:?}")]
    InvalidDimensions {
        field: &'static str,
        default: Dimensions,
    },
    #[error("emptyValue is not a string, using \"-\"")]
    InvalidEmptyValue,
    #[error("fieldBlocks is not an object, loaded no blocks")]
    InvalidFieldBlocks,
    #[error("block {key:?} is not an object and was skipped")]
    SkippedBlock { key: String },
    #[error("block {key:?}: {field} is missing or invalid, using the default")]
    BlockFieldDefaulted { key: String, field: &'static str },
    #[error("block {key:?} declares id {id:?}; the key is used")]
    IdMismatch { key: String, id: String },
    #[error("block {key:?} has {labels} labels for {count} rows; labels were resized")]
    LabelCountMismatch {
        key: String,
        labels: usize,
        count: u32,
    },
    #[error("block {key:?} had a negative origin; clamped to zero")]
    OriginClamped { key: String },
    #[error("block {key:?} appears more than once; the last entry is kept")]
    DuplicateBlock { key: String },
}

/// Result of a lenient load: the repaired template and what was repaired.
#[derive(Clone, Debug)]
pub struct LoadedTemplate {
    pub template: Template,
    pub issues: Vec<TemplateIssue>,
}

impl LoadedTemplate {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip_all, fields(bytes = json.len()))
)]
pub(super) fn load_str(json: &str) -> Result<LoadedTemplate, TemplateError> {
    let raw: RawTemplate = serde_json::from_str(json).map_err(|e| {
        if e.is_data() {
            TemplateError::NotAnObject(e)
        } else {
            TemplateError::Syntax(e)
        }
    })?;

    let mut issues = Vec::new();
    let page = dimensions_or_default(
        raw.page_dimensions.as_ref(),
        "pageDimensions",
        DEFAULT_PAGE_DIMENSIONS,
        &mut issues,
    );
    let bubble = dimensions_or_default(
        raw.bubble_dimensions.as_ref(),
        "bubbleDimensions",
        DEFAULT_BUBBLE_DIMENSIONS,
        &mut issues,
    );

    let mut template = Template::new(page, bubble);
    match raw.empty_value {
        None => {}
        Some(Value::String(s)) => template.empty_value = s,
        Some(_) => issues.push(TemplateIssue::InvalidEmptyValue),
    }

    match raw.field_blocks {
        None => {}
        Some(RawBlocks::Invalid) => issues.push(TemplateIssue::InvalidFieldBlocks),
        Some(RawBlocks::Entries(entries)) => {
            for (key, value) in entries {
                let Some(block) = repair_block(&key, &value, &mut issues) else {
                    continue;
                };
                match template.blocks.iter_mut().find(|b| b.id() == key) {
                    Some(slot) => {
                        issues.push(TemplateIssue::DuplicateBlock { key });
                        *slot = block;
                    }
                    None => template.blocks.push(block),
                }
            }
        }
    }

    for issue in &issues {
        warn!("template repaired: {issue}");
    }
    Ok(LoadedTemplate { template, issues })
}

fn dimensions_or_default(
    value: Option<&Value>,
    field: &'static str,
    default: Dimensions,
    issues: &mut Vec<TemplateIssue>,
) -> Dimensions {
    match value.and_then(number_pair) {
        Some([w, h]) if Dimensions::new(w, h).is_valid() => Dimensions::new(w, h),
        _ => {
            issues.push(TemplateIssue::InvalidDimensions { field, default });
            default
        }
    }
}

fn number_pair(value: &Value) -> Option<[f64; 2]> {
    match value.as_array()?.as_slice() {
        [a, b] => Some([a.as_f64()?, b.as_f64()?]),
        _ => None,
    }
}

fn repair_block(key: &str, value: &Value, issues: &mut Vec<TemplateIssue>) -> Option<FieldBlock> {
    let Some(obj) = value.as_object() else {
        issues.push(TemplateIssue::SkippedBlock {
            key: key.to_string(),
        });
        return None;
    };
    let mut defaulted = |field: &'static str| {
        issues.push(TemplateIssue::BlockFieldDefaulted {
            key: key.to_string(),
            field,
        })
    };

    let id_issue = match obj.get("id") {
        Some(Value::String(id)) if id == key => None,
        Some(Value::String(id)) => Some(TemplateIssue::IdMismatch {
            key: key.to_string(),
            id: id.clone(),
        }),
        _ => {
            defaulted("id");
            None
        }
    };

    let field_type = match obj.get("fieldType") {
        Some(Value::String(s)) => FieldType::from(s.clone()),
        _ => {
            defaulted("fieldType");
            FieldType::Mcq4
        }
    };

    let origin = match obj.get("origin").and_then(number_pair) {
        Some([x, y]) if x.is_finite() && y.is_finite() => Point2::new(x, y),
        _ => {
            defaulted("origin");
            Point2::origin()
        }
    };

    let mut gap = |field: &'static str, default: f64| match obj.get(field).and_then(Value::as_f64)
    {
        Some(v) if v.is_finite() && v >= 0.0 => v,
        _ => {
            defaulted(field);
            default
        }
    };
    let bubbles_gap = gap("bubblesGap", DEFAULT_BUBBLES_GAP);
    let labels_gap = gap("labelsGap", DEFAULT_LABELS_GAP);

    let labels: Option<Vec<String>> = match obj.get("fieldLabels") {
        Some(Value::Array(items)) => Some(items.iter().map(label_text).collect()),
        _ => {
            defaulted("fieldLabels");
            None
        }
    };

    let count = match obj.get("bubbleCount").and_then(row_count) {
        Some(n) => n,
        None => {
            defaulted("bubbleCount");
            labels
                .as_ref()
                .filter(|l| !l.is_empty())
                .map_or(DEFAULT_BUBBLE_COUNT, |l| l.len().min(u32::MAX as usize) as u32)
        }
    };

    let labels = labels.unwrap_or_else(|| (1..=count as usize).map(default_label).collect());

    issues.extend(id_issue);
    if labels.len() != count as usize {
        issues.push(TemplateIssue::LabelCountMismatch {
            key: key.to_string(),
            labels: labels.len(),
            count,
        });
    }
    if origin.x < 0.0 || origin.y < 0.0 {
        issues.push(TemplateIssue::OriginClamped {
            key: key.to_string(),
        });
    }

    Some(FieldBlock::new(
        key,
        field_type,
        origin,
        bubbles_gap,
        labels_gap,
        count,
        labels,
    ))
}

/// A positive whole row count; fractional or non-positive values are invalid.
fn row_count(value: &Value) -> Option<u32> {
    if let Some(n) = value.as_u64() {
        return (n >= 1).then(|| n.min(u32::MAX as u64) as u32);
    }
    let f = value.as_f64()?;
    (f.is_finite() && f >= 1.0 && f.fract() == 0.0).then(|| f.min(u32::MAX as f64) as u32)
}

fn label_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Root of a template document with every field kept loose.
struct RawTemplate {
    page_dimensions: Option<Value>,
    bubble_dimensions: Option<Value>,
    field_blocks: Option<RawBlocks>,
    empty_value: Option<Value>,
}

impl<'de> Deserialize<'de> for RawTemplate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RawTemplateVisitor)
    }
}

struct RawTemplateVisitor;

impl<'de> Visitor<'de> for RawTemplateVisitor {
    type Value = RawTemplate;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a template object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<RawTemplate, A::Error> {
        let mut raw = RawTemplate {
            page_dimensions: None,
            bubble_dimensions: None,
            field_blocks: None,
            empty_value: None,
        };
        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "pageDimensions" => raw.page_dimensions = Some(map.next_value()?),
                "bubbleDimensions" => raw.bubble_dimensions = Some(map.next_value()?),
                "fieldBlocks" => raw.field_blocks = Some(map.next_value()?),
                "emptyValue" => raw.empty_value = Some(map.next_value()?),
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        Ok(raw)
    }
}

/// `fieldBlocks` in document order, or a marker that it was not an object.
enum RawBlocks {
    Entries(Vec<(String, Value)>),
    Invalid,
}

impl<'de> Deserialize<'de> for RawBlocks {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RawBlocksVisitor)
    }
}

struct RawBlocksVisitor;

impl<'de> Visitor<'de> for RawBlocksVisitor {
    type Value = RawBlocks;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of field blocks")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<RawBlocks, A::Error> {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, value)) = map.next_entry::<String, Value>()? {
            entries.push((key, value));
        }
        Ok(RawBlocks::Entries(entries))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<RawBlocks, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(RawBlocks::Invalid)
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<RawBlocks, E> {
        Ok(RawBlocks::Invalid)
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> Result<RawBlocks, E> {
        Ok(RawBlocks::Invalid)
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> Result<RawBlocks, E> {
        Ok(RawBlocks::Invalid)
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> Result<RawBlocks, E> {
        Ok(RawBlocks::Invalid)
    }

    fn visit_str<E: de::Error>(self, _: &str) -> Result<RawBlocks, E> {
        Ok(RawBlocks::Invalid)
    }

    fn visit_unit<E: de::Error>(self) -> Result<RawBlocks, E> {
        Ok(RawBlocks::Invalid)
    }
}
