/*!
 * Document model types.
 *
 * A document enters the pipeline as an ordered list of `StructuralUnit`s and
 * leaves it as an `OutputDocumentModel` with one pair per input unit.
 */

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Paragraph alignment as reported by the document reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

/// Position of a unit on its page, for layout-driven formats such as PDF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub page: u32,
    pub x: f32,
    pub y: f32,
}

/// Formatting metadata captured by the reader.
///
/// The pipeline treats this record as opaque: it is copied onto the output
/// model and never inspected or changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormatAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,

    /// Font size in points
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f32>,

    /// Hex color such as `#1A1A1A`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Alignment>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_level: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,

    /// Reader-specific attributes that have no dedicated field
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl FormatAttributes {
    /// Attributes carrying only a style name.
    pub fn styled(style_name: &str) -> Self {
        Self {
            style_name: Some(style_name.to_string()),
            ..Self::default()
        }
    }
}

/// Whether a unit holds translatable text or stands in for opaque content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    #[default]
    Text,
    /// Image, table or other content that is never translated
    Placeholder,
}

/// One paragraph or segment of the source document.
///
/// Fields are private so a unit cannot change after the reader creates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuralUnit {
    id: String,
    order_index: usize,
    source_text: String,
    #[serde(default)]
    format_attributes: FormatAttributes,
    #[serde(default)]
    kind: UnitKind,
}

impl StructuralUnit {
    pub fn new(
        id: impl Into<String>,
        order_index: usize,
        source_text: impl Into<String>,
        format_attributes: FormatAttributes,
        kind: UnitKind,
    ) -> Self {
        Self {
            id: id.into(),
            order_index,
            source_text: source_text.into(),
            format_attributes,
            kind,
        }
    }

    /// Create a text unit
    pub fn text(
        id: impl Into<String>,
        order_index: usize,
        source_text: impl Into<String>,
        format_attributes: FormatAttributes,
    ) -> Self {
        Self::new(id, order_index, source_text, format_attributes, UnitKind::Text)
    }

    /// Create a placeholder unit; `label` is kept only for diagnostics
    pub fn placeholder(
        id: impl Into<String>,
        order_index: usize,
        label: impl Into<String>,
        format_attributes: FormatAttributes,
    ) -> Self {
        Self::new(id, order_index, label, format_attributes, UnitKind::Placeholder)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn order_index(&self) -> usize {
        self.order_index
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    pub fn format_attributes(&self) -> &FormatAttributes {
        &self.format_attributes
    }

    pub fn kind(&self) -> UnitKind {
        self.kind
    }

    pub fn is_placeholder(&self) -> bool {
        self.kind == UnitKind::Placeholder
    }

    /// True when the unit should be sent to a backend at all
    pub fn needs_translation(&self) -> bool {
        !self.is_placeholder() && !self.source_text.trim().is_empty()
    }

    /// Size of the unit in characters, used for character-bounded chunks
    pub fn char_len(&self) -> usize {
        self.source_text.chars().count()
    }
}

/// One entry of the output model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputPair {
    /// `None` when the run was configured not to preserve formatting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_attributes: Option<FormatAttributes>,
    pub text: String,
    #[serde(default)]
    pub kind: UnitKind,
}

/// Ordered, index-aligned output of a translation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputDocumentModel {
    pub pairs: Vec<OutputPair>,
}

impl OutputDocumentModel {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Texts of all pairs in order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|p| p.text.as_str())
    }
}
