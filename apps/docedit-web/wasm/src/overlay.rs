//! Canvas overlay compositor
//!
//! Draws text items, layers and selection chrome for one page onto a 2D
//! canvas context stacked above the page raster. Each text item is painted
//! over its sampled background so edits replace the rasterized glyphs.

use docedit_core::compositor::{Compositor, Frame, FrameLayer, FrameTextItem};
use docedit_core::model::{
    AnnotationType, FontStyle, FontWeight, LayerKind, TextAlign, DEFAULT_ANNOTATION_COLOR,
};
use docedit_core::{Color, Point, Rect};
use wasm_bindgen::prelude::*;
use web_sys::CanvasRenderingContext2d;

const SELECTION_COLOR: &str = "#2563eb";
const HIGHLIGHT_ALPHA: f64 = 0.35;
const SQUIGGLE_STEP: f64 = 4.0;
/// Longest zig-zag drawn, in steps; wider marks are cut short
const MAX_SQUIGGLE_STEPS: usize = 4096;

/// Zig-zag points along the bottom edge of `rect`.
///
/// Empty for non-finite rectangles. At most `MAX_SQUIGGLE_STEPS + 1` points.
pub fn squiggle_points(rect: &Rect) -> Vec<Point> {
    if ![rect.x, rect.y, rect.width, rect.height]
        .iter()
        .all(|v| v.is_finite())
        || !rect.right().is_finite()
        || !rect.bottom().is_finite()
    {
        return Vec::new();
    }
    let amplitude = (rect.height * 0.1).clamp(1.0, 3.0);
    let baseline = rect.bottom() - amplitude;
    let steps = (rect.width / SQUIGGLE_STEP)
        .ceil()
        .clamp(1.0, MAX_SQUIGGLE_STEPS as f64) as usize;
    (0..=steps)
        .map(|i| {
            let x = (rect.left() + i as f64 * SQUIGGLE_STEP).min(rect.right());
            let y = if i % 2 == 0 {
                baseline
            } else {
                baseline + amplitude
            };
            Point::new(x, y)
        })
        .collect()
}

/// Line segment drawn for strikethrough and underline marks.
pub fn mark_line(kind: AnnotationType, rect: &Rect) -> Option<(Point, Point)> {
    let y = match kind {
        AnnotationType::Strikethrough => rect.top() + rect.height / 2.0,
        AnnotationType::Underline => rect.bottom() - 1.0,
        _ => return None,
    };
    Some((Point::new(rect.left(), y), Point::new(rect.right(), y)))
}

/// CSS font shorthand for canvas text.
pub fn css_font(size: f64, family: &str, weight: FontWeight, style: FontStyle) -> String {
    let style = match style {
        FontStyle::Italic => "italic ",
        FontStyle::Normal => "",
    };
    let weight = match weight {
        FontWeight::Bold => "bold ",
        FontWeight::Normal => "",
    };
    format!("{}{}{}px {}", style, weight, size, family)
}

/// Draws frames onto a canvas 2D context.
pub struct CanvasOverlay {
    ctx: CanvasRenderingContext2d,
}

impl CanvasOverlay {
    pub fn new(ctx: CanvasRenderingContext2d) -> Self {
        Self { ctx }
    }

    fn path(&self, points: &[Point]) {
        self.ctx.begin_path();
        for (i, p) in points.iter().enumerate() {
            if i == 0 {
                self.ctx.move_to(p.x, p.y);
            } else {
                self.ctx.line_to(p.x, p.y);
            }
        }
        self.ctx.stroke();
    }

    fn draw_text_item(&self, entry: &FrameTextItem<'_>) -> Result<(), JsValue> {
        let item = entry.item;
        self.ctx.set_fill_style_str(&item.background_color.to_hex());
        self.ctx.fill_rect(item.x, item.y, item.width, item.height);
        self.ctx.set_fill_style_str(&item.color.to_hex());
        self.ctx.set_font(&css_font(
            item.font_size,
            &item.font_family,
            item.font_weight,
            item.font_style,
        ));
        self.ctx.set_text_baseline("top");
        self.ctx.fill_text(&item.text, item.x, item.y)?;
        if entry.selected {
            self.ctx.set_stroke_style_str(SELECTION_COLOR);
            self.ctx.set_line_width(1.0);
            self.ctx.stroke_rect(item.x, item.y, item.width, item.height);
        }
        Ok(())
    }

    fn draw_layer(&self, entry: &FrameLayer<'_>) -> Result<(), JsValue> {
        let layer = entry.layer;
        let rect = layer.bounds();
        match layer.kind {
            LayerKind::Annotation => {
                let color = layer.style.annotation_color.unwrap_or(DEFAULT_ANNOTATION_COLOR);
                let kind = layer.style.annotation_type.unwrap_or_default();
                self.ctx.set_fill_style_str(&color.to_hex());
                self.ctx.set_stroke_style_str(&color.to_hex());
                self.ctx.set_line_width(1.5);
                match kind {
                    AnnotationType::Highlight => {
                        self.ctx.set_global_alpha(HIGHLIGHT_ALPHA);
                        self.ctx.fill_rect(rect.x, rect.y, rect.width, rect.height);
                        self.ctx.set_global_alpha(1.0);
                    }
                    AnnotationType::Redaction => {
                        self.ctx.fill_rect(rect.x, rect.y, rect.width, rect.height);
                    }
                    AnnotationType::Squiggle => self.path(&squiggle_points(&rect)),
                    AnnotationType::Strikethrough | AnnotationType::Underline => {
                        if let Some((a, b)) = mark_line(kind, &rect) {
                            self.path(&[a, b]);
                        }
                    }
                }
            }
            LayerKind::Shape => {
                if let Some(fill) = layer.style.fill_color {
                    self.ctx.set_fill_style_str(&fill.to_hex());
                    self.ctx.fill_rect(rect.x, rect.y, rect.width, rect.height);
                }
                let stroke = layer.style.stroke_color.unwrap_or(Color::BLACK);
                self.ctx.set_stroke_style_str(&stroke.to_hex());
                self.ctx.set_line_width(layer.style.stroke_width.unwrap_or(1.0));
                self.ctx.stroke_rect(rect.x, rect.y, rect.width, rect.height);
            }
            LayerKind::Text => {
                let style = &layer.style;
                self.ctx.set_fill_style_str(&style.font_color.unwrap_or(Color::BLACK).to_hex());
                self.ctx.set_font(&css_font(
                    style.font_size.unwrap_or(16.0),
                    style.font_family.as_deref().unwrap_or("sans-serif"),
                    style.font_weight.unwrap_or_default(),
                    style.font_style.unwrap_or_default(),
                ));
                self.ctx.set_text_baseline("top");
                let (align, x) = match style.text_align.unwrap_or_default() {
                    TextAlign::Left => ("left", rect.left()),
                    TextAlign::Center => ("center", rect.left() + rect.width / 2.0),
                    TextAlign::Right => ("right", rect.right()),
                };
                self.ctx.set_text_align(align);
                self.ctx.fill_text(&layer.content, x, rect.y)?;
                self.ctx.set_text_align("left");
            }
            // Images are placed as DOM elements by the page view
            LayerKind::Image => {}
        }
        if entry.selected {
            self.ctx.set_stroke_style_str(SELECTION_COLOR);
            self.ctx.set_line_width(1.0);
            self.ctx.stroke_rect(rect.x, rect.y, rect.width, rect.height);
        }
        Ok(())
    }

    fn draw_dashed(&self, rect: &Rect) -> Result<(), JsValue> {
        let dash = js_sys::Array::of2(&JsValue::from_f64(4.0), &JsValue::from_f64(3.0));
        self.ctx.set_line_dash(&dash)?;
        self.ctx.set_stroke_style_str(SELECTION_COLOR);
        self.ctx.stroke_rect(rect.x, rect.y, rect.width, rect.height);
        self.ctx.set_line_dash(&js_sys::Array::new())?;
        Ok(())
    }
}

impl Compositor for CanvasOverlay {
    type Error = JsValue;

    fn compose(&mut self, frame: &Frame<'_>) -> Result<(), JsValue> {
        let page = &frame.page;
        self.ctx
            .clear_rect(0.0, 0.0, page.width as f64, page.height as f64);

        for entry in &frame.text_items {
            self.draw_text_item(entry)?;
        }
        for entry in &frame.layers {
            self.draw_layer(entry)?;
        }
        if let Some(bounds) = frame.selection_bounds {
            self.draw_dashed(&bounds)?;
        }
        if let Some(drag) = frame.drag_rect {
            self.ctx.set_fill_style_str(SELECTION_COLOR);
            self.ctx.set_global_alpha(0.1);
            self.ctx.fill_rect(drag.x, drag.y, drag.width, drag.height);
            self.ctx.set_global_alpha(1.0);
            self.draw_dashed(&drag)?;
        }
        Ok(())
    }
}
