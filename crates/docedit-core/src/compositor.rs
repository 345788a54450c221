//! Read-only render view for compositors
//!
//! A compositor draws a `Frame` and never mutates the store. Frames are
//! built on demand, so selection bounds always reflect the current state,
//! including mid-drag.

use serde::Serialize;

use crate::geometry::Rect;
use crate::model::{EditableTextItem, Layer, PageInfo};
use crate::store::LayerStore;

/// A text item together with its selection state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameTextItem<'a> {
    #[serde(flatten)]
    pub item: &'a EditableTextItem,
    pub selected: bool,
}

/// A layer together with its selection state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameLayer<'a> {
    #[serde(flatten)]
    pub layer: &'a Layer,
    pub selected: bool,
}

/// Everything needed to draw one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame<'a> {
    pub page: PageInfo,
    pub active: bool,
    pub text_items: Vec<FrameTextItem<'a>>,
    /// Bottom to top
    pub layers: Vec<FrameLayer<'a>>,
    pub selection_bounds: Option<Rect>,
    pub drag_rect: Option<Rect>,
}

/// Renders frames to some surface.
pub trait Compositor {
    type Error;

    fn compose(&mut self, frame: &Frame<'_>) -> Result<(), Self::Error>;
}

impl LayerStore {
    /// Build the render view of `page`, or `None` if the page does not exist.
    pub fn frame(&self, page: usize) -> Option<Frame<'_>> {
        let info = *self.page(page)?;
        let active = page == self.active_page();
        let selection = self.selection();

        let text_items = self
            .text_items_on_page(page)
            .map(|item| FrameTextItem {
                item,
                selected: selection.contains_text(&item.id),
            })
            .collect();
        let layers = self
            .layers_on_page(page)
            .map(|layer| FrameLayer {
                layer,
                selected: selection.contains_layer(layer.id),
            })
            .collect();

        Some(Frame {
            page: info,
            active,
            text_items,
            layers,
            selection_bounds: if active { self.selection_bounds() } else { None },
            drag_rect: if active { self.drag_rect() } else { None },
        })
    }

    /// Render `page` with `compositor`. Returns `Ok(false)` for a missing page.
    pub fn render_with<C: Compositor>(
        &self,
        page: usize,
        compositor: &mut C,
    ) -> Result<bool, C::Error> {
        match self.frame(page) {
            Some(frame) => {
                compositor.compose(&frame)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Color, Point};
    use crate::loader::LoadedDocument;
    use crate::model::{FontStyle, FontWeight, LayerKind, TextItemId};

    fn item(id: &str, x: f64) -> EditableTextItem {
        EditableTextItem {
            id: TextItemId::from(id),
            text: id.to_string(),
            x,
            y: 0.0,
            width: 10.0,
            height: 10.0,
            font_size: 10.0,
            font_family: "sans-serif".to_string(),
            color: Color::BLACK,
            original_color: Color::BLACK,
            background_color: Color::WHITE,
            font_weight: FontWeight::Normal,
            font_style: FontStyle::Normal,
            page_index: 0,
        }
    }

    fn store() -> LayerStore {
        let mut store = LayerStore::default();
        let ticket = store.begin_load();
        store
            .commit_load(LoadedDocument {
                ticket,
                pages: vec![PageInfo {
                    index: 0,
                    width: 595,
                    height: 842,
                    scale: 1.0,
                }],
                text_items: vec![item("A", 0.0), item("B", 40.0)],
            })
            .unwrap();
        store
    }

    /// Records what it was asked to draw
    #[derive(Default)]
    struct Recorder {
        drawn: Vec<String>,
    }

    impl Compositor for Recorder {
        type Error = String;

        fn compose(&mut self, frame: &Frame<'_>) -> Result<(), String> {
            for t in &frame.text_items {
                self.drawn.push(t.item.id.to_string());
            }
            for l in &frame.layers {
                self.drawn.push(format!("layer-{}", l.layer.id));
            }
            Ok(())
        }
    }

    #[test]
    fn test_frame_marks_selection() {
        let mut store = store();
        store.click_text_item(&"A".into(), false);
        store.click_text_item(&"B".into(), true);

        let frame = store.frame(0).unwrap();
        assert!(frame.text_items.iter().all(|t| t.selected));
        assert_eq!(frame.selection_bounds, Some(Rect::new(0.0, 0.0, 50.0, 10.0)));
        assert!(store.frame(1).is_none());
    }

    #[test]
    fn test_bounds_follow_live_edits() {
        let mut store = store();
        store.click_text_item(&"A".into(), false);
        store.click_text_item(&"B".into(), true);
        store.update_text_item(
            &"B".into(),
            &crate::model::TextItemPatch {
                x: Some(90.0),
                ..Default::default()
            },
        );
        let frame = store.frame(0).unwrap();
        assert_eq!(frame.selection_bounds, Some(Rect::new(0.0, 0.0, 100.0, 10.0)));
    }

    #[test]
    fn test_frame_includes_drag_rect() {
        let mut store = store();
        store.pointer_down(Point::new(200.0, 200.0), false);
        store.pointer_move(Point::new(220.0, 230.0));
        let frame = store.frame(0).unwrap();
        assert_eq!(frame.drag_rect, Some(Rect::new(200.0, 200.0, 20.0, 30.0)));
    }

    #[test]
    fn test_render_with_compositor() {
        let mut store = store();
        store
            .add_layer(Layer::new(LayerKind::Shape, 0, Rect::new(0.0, 0.0, 5.0, 5.0)))
            .unwrap();
        let mut recorder = Recorder::default();
        assert_eq!(store.render_with(0, &mut recorder), Ok(true));
        assert_eq!(recorder.drawn, vec!["A", "B", "layer-1"]);
        assert_eq!(store.render_with(3, &mut recorder), Ok(false));
    }

    #[test]
    fn test_frame_serializes_flat() {
        let store = store();
        let json = serde_json::to_value(store.frame(0).unwrap()).unwrap();
        assert_eq!(json["textItems"][0]["id"], "A");
        assert_eq!(json["textItems"][0]["selected"], false);
        assert_eq!(json["page"]["width"], 595);
        assert!(json["selectionBounds"].is_null());
    }
}
