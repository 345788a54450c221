//! Document data model
//!
//! Field names serialize in camelCase so the browser UI can consume the
//! JSON directly.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::geometry::{Color, Rect};

/// Highlight yellow used when an annotation arrives without a color.
pub const DEFAULT_ANNOTATION_COLOR: Color = Color::rgb(255, 255, 0);

/// Identifier of an extracted text item: `text-{pageNumber}-{runIndex}-{loadGeneration}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextItemId(pub String);

impl TextItemId {
    /// `page_index` is zero-based; the id carries the one-based page number.
    pub fn new(page_index: usize, run_index: usize, generation: u64) -> Self {
        Self(format!("text-{}-{}-{}", page_index + 1, run_index, generation))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TextItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for TextItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a layer, assigned by the store.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct LayerId(pub u64);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Text,
    Image,
    Shape,
    Annotation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationType {
    #[default]
    Highlight,
    Strikethrough,
    Underline,
    Squiggle,
    Redaction,
}

/// Editor tool currently active in the toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    #[default]
    Select,
    Text,
    Draw,
    Shape,
    Image,
    Annotate,
    Sign,
}

impl Tool {
    pub const ALL: [Tool; 7] = [
        Tool::Select,
        Tool::Text,
        Tool::Draw,
        Tool::Shape,
        Tool::Image,
        Tool::Annotate,
        Tool::Sign,
    ];

    /// Tools under which clicking a text item selects it.
    pub fn selects_on_click(&self) -> bool {
        matches!(self, Tool::Select | Tool::Text)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tool::Select => "select",
            Tool::Text => "text",
            Tool::Draw => "draw",
            Tool::Shape => "shape",
            Tool::Image => "image",
            Tool::Annotate => "annotate",
            Tool::Sign => "sign",
        }
    }
}

impl FromStr for Tool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tool::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown tool: {}", s))
    }
}

/// A rendered page of the loaded document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub index: usize,
    /// Raster width in pixels
    pub width: u32,
    /// Raster height in pixels
    pub height: u32,
    /// Scale that mapped PDF units to raster pixels
    pub scale: f64,
}

/// Positioned, styled text reconstructed from a content-stream run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditableTextItem {
    pub id: TextItemId,
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub font_size: f64,
    pub font_family: String,
    pub color: Color,
    pub original_color: Color,
    /// Advisory only; sampled from the raster behind the text
    pub background_color: Color,
    pub font_weight: FontWeight,
    pub font_style: FontStyle,
    pub page_index: usize,
}

impl EditableTextItem {
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// Partial update for a text item. `None` fields keep their value.
///
/// The id, page and original color are fixed at extraction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<FontWeight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_style: Option<FontStyle>,
}

fn merge<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(v) = value {
        *target = v.clone();
    }
}

fn merge_opt<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
    if value.is_some() {
        *target = value.clone();
    }
}

impl TextItemPatch {
    pub fn is_empty(&self) -> bool {
        *self == TextItemPatch::default()
    }

    /// Shallow-merge into `item`.
    pub fn apply_to(&self, item: &mut EditableTextItem) {
        merge(&mut item.text, &self.text);
        merge(&mut item.x, &self.x);
        merge(&mut item.y, &self.y);
        merge(&mut item.width, &self.width);
        merge(&mut item.height, &self.height);
        merge(&mut item.font_size, &self.font_size);
        merge(&mut item.font_family, &self.font_family);
        merge(&mut item.color, &self.color);
        merge(&mut item.background_color, &self.background_color);
        merge(&mut item.font_weight, &self.font_weight);
        merge(&mut item.font_style, &self.font_style);
    }
}

/// Type-specific layer styling. Every field is optional so the same
/// struct serves as a patch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayerStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<FontWeight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_style: Option<FontStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_align: Option<TextAlign>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation_type: Option<AnnotationType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation_color: Option<Color>,
}

impl LayerStyle {
    pub fn merge(&mut self, patch: &LayerStyle) {
        merge_opt(&mut self.font_size, &patch.font_size);
        merge_opt(&mut self.font_family, &patch.font_family);
        merge_opt(&mut self.font_color, &patch.font_color);
        merge_opt(&mut self.font_weight, &patch.font_weight);
        merge_opt(&mut self.font_style, &patch.font_style);
        merge_opt(&mut self.text_align, &patch.text_align);
        merge_opt(&mut self.stroke_color, &patch.stroke_color);
        merge_opt(&mut self.fill_color, &patch.fill_color);
        merge_opt(&mut self.stroke_width, &patch.stroke_width);
        merge_opt(&mut self.annotation_type, &patch.annotation_type);
        merge_opt(&mut self.annotation_color, &patch.annotation_color);
    }
}

/// Freeform decoration placed on a page by a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    /// Overwritten by the store when the layer is added
    #[serde(default)]
    pub id: LayerId,
    #[serde(rename = "type")]
    pub kind: LayerKind,
    pub page: usize,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub content: String,
    #[serde(flatten)]
    pub style: LayerStyle,
}

impl Layer {
    pub fn new(kind: LayerKind, page: usize, bounds: Rect) -> Self {
        Self {
            id: LayerId::default(),
            kind,
            page,
            x: bounds.x,
            y: bounds.y,
            width: bounds.width,
            height: bounds.height,
            content: String::new(),
            style: LayerStyle::default(),
        }
    }

    pub fn annotation(page: usize, bounds: Rect, annotation_type: AnnotationType) -> Self {
        let mut layer = Self::new(LayerKind::Annotation, page, bounds);
        layer.style.annotation_type = Some(annotation_type);
        layer.style.annotation_color = Some(DEFAULT_ANNOTATION_COLOR);
        layer
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Fill in annotation defaults for annotation layers.
    pub(crate) fn normalize(&mut self) {
        if self.kind == LayerKind::Annotation {
            if self.style.annotation_type.is_none() {
                self.style.annotation_type = Some(AnnotationType::Highlight);
            }
            if self.style.annotation_color.is_none() {
                self.style.annotation_color = Some(DEFAULT_ANNOTATION_COLOR);
            }
        }
    }
}

/// Partial update for a layer. The id and kind are fixed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayerPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(flatten)]
    pub style: LayerStyle,
}

impl LayerPatch {
    pub fn apply_to(&self, layer: &mut Layer) {
        merge(&mut layer.page, &self.page);
        merge(&mut layer.x, &self.x);
        merge(&mut layer.y, &self.y);
        merge(&mut layer.width, &self.width);
        merge(&mut layer.height, &self.height);
        merge(&mut layer.content, &self.content);
        layer.style.merge(&self.style);
    }
}

/// Deep copy of the editable state at one history step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub text_items: Vec<EditableTextItem>,
    pub layers: Vec<Layer>,
}
