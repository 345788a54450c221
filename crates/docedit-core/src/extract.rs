//! Text layout extraction
//!
//! Turns the content-stream text runs of one page, plus the page raster
//! rendered at the shared scale, into `EditableTextItem`s positioned in
//! raster space. Problems with a single run never fail the page: the run
//! is skipped or its background hint falls back to white.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EngineConfig;
use crate::geometry::{AffineTransform, Color, Rect};
use crate::model::{EditableTextItem, FontStyle, FontWeight, TextItemId};
use crate::raster::{average_color, PixelSource};

/// One text run as reported by the content-stream text provider.
///
/// Accepts pdf.js `TextItem` field names (`str`, `fontName`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRun {
    #[serde(alias = "str")]
    pub text: String,
    pub transform: AffineTransform,
    /// Advance width in PDF units, if the provider knows it
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub font_name: Option<String>,
    /// Fill color as unit-interval components (1 = gray, 3 = RGB)
    #[serde(default)]
    pub color: Option<Vec<f64>>,
}

impl TextRun {
    pub fn new(text: impl Into<String>, transform: AffineTransform) -> Self {
        Self {
            text: text.into(),
            transform,
            ..Default::default()
        }
    }

    pub fn with_width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_font(mut self, font_name: impl Into<String>) -> Self {
        self.font_name = Some(font_name.into());
        self
    }

    pub fn with_color(mut self, components: Vec<f64>) -> Self {
        self.color = Some(components);
        self
    }

    /// Read a run from JSON, mapping anything that is not a text run
    /// (pdf.js marked-content markers, for example) to an empty run that
    /// the extractor skips. Keeps the run index of every later entry.
    pub fn from_value_lenient(value: serde_json::Value) -> TextRun {
        serde_json::from_value(value).unwrap_or_default()
    }
}

/// Parse a JSON array of text runs, leniently per entry
/// (see `TextRun::from_value_lenient`).
pub fn parse_text_runs(json: &str) -> Result<Vec<TextRun>, serde_json::Error> {
    let values: Vec<serde_json::Value> = serde_json::from_str(json)?;
    Ok(values.into_iter().map(TextRun::from_value_lenient).collect())
}

/// Strip NUL and U+FFFD, then trim. Returns `None` when nothing is left.
pub fn clean_text(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != '\0' && *c != char::REPLACEMENT_CHARACTER)
        .collect();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Guess weight and style from a font name such as `Helvetica-BoldOblique`.
pub fn infer_style(font_name: Option<&str>) -> (FontWeight, FontStyle) {
    let Some(name) = font_name else {
        return (FontWeight::Normal, FontStyle::Normal);
    };
    let lower = name.to_lowercase();
    let weight = if lower.contains("bold") {
        FontWeight::Bold
    } else {
        FontWeight::Normal
    };
    let style = if lower.contains("italic") || lower.contains("oblique") {
        FontStyle::Italic
    } else {
        FontStyle::Normal
    };
    (weight, style)
}

/// Text color for a run; absent components mean black.
pub fn run_color(components: Option<&[f64]>) -> Color {
    components.map(Color::from_components).unwrap_or(Color::BLACK)
}

/// Extracts the text items of one load.
///
/// `generation` is the load generation stamped into every item id so that
/// ids from different loads never collide.
pub struct TextLayoutExtractor<'a> {
    config: &'a EngineConfig,
    generation: u64,
}

impl<'a> TextLayoutExtractor<'a> {
    pub fn new(config: &'a EngineConfig, generation: u64) -> Self {
        Self { config, generation }
    }

    /// Extract every usable run of a page, in run order.
    pub fn extract_page<R: PixelSource + ?Sized>(
        &self,
        page_index: usize,
        scale: f64,
        runs: &[TextRun],
        raster: &R,
    ) -> Vec<EditableTextItem> {
        let items: Vec<EditableTextItem> = runs
            .iter()
            .enumerate()
            .filter_map(|(run_index, run)| {
                self.extract_run(page_index, run_index, scale, run, raster)
            })
            .collect();
        debug!(
            page = page_index,
            runs = runs.len(),
            items = items.len(),
            "extracted page text"
        );
        items
    }

    /// Build the item for one run, or `None` when the run is skipped.
    pub fn extract_run<R: PixelSource + ?Sized>(
        &self,
        page_index: usize,
        run_index: usize,
        scale: f64,
        run: &TextRun,
        raster: &R,
    ) -> Option<EditableTextItem> {
        let text = clean_text(&run.text)?;

        if !run.transform.is_finite() {
            debug!(page = page_index, run = run_index, "skipping run with non-finite transform");
            return None;
        }

        let font_height = run.transform.font_height(scale);
        let origin = run.transform.translation();
        let x = origin.x * scale;
        let y = raster.height() as f64 - origin.y * scale - font_height;

        let width = match run.width {
            Some(w) if w.is_finite() && w != 0.0 => w * scale,
            declared => {
                if declared.is_some() {
                    debug!(page = page_index, run = run_index, "estimating width for run with unusable width");
                }
                run.text.chars().count() as f64 * font_height * self.config.fallback_glyph_width
            }
        };

        let color = run_color(run.color.as_deref());
        let (font_weight, font_style) = infer_style(run.font_name.as_deref());

        let bounds = Rect::new(x, y, width, font_height);
        let background_color =
            match average_color(raster, &bounds, self.config.background_sample_limit) {
                Ok(c) => c,
                Err(err) => {
                    debug!(page = page_index, run = run_index, error = %err, "background sampling fell back to white");
                    Color::WHITE
                }
            };

        Some(EditableTextItem {
            id: TextItemId::new(page_index, run_index, self.generation),
            text,
            x,
            y,
            width,
            height: font_height,
            font_size: font_height,
            font_family: run
                .font_name
                .clone()
                .unwrap_or_else(|| self.config.default_font_family.clone()),
            color,
            original_color: color,
            background_color,
            font_weight,
            font_style,
            page_index,
        })
    }
}
