//! Selection state and spatial queries
//!
//! Selection is transient: it is never captured in history, and the store
//! prunes ids that no longer exist after deletes and undo/redo.

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};
use crate::model::{EditableTextItem, Layer, LayerId, TextItemId};

/// Selected text items and layers, each in selection order without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    text_items: Vec<TextItemId>,
    layers: Vec<LayerId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.text_items.is_empty() && self.layers.is_empty()
    }

    pub fn text_items(&self) -> &[TextItemId] {
        &self.text_items
    }

    pub fn layers(&self) -> &[LayerId] {
        &self.layers
    }

    pub fn contains_text(&self, id: &TextItemId) -> bool {
        self.text_items.contains(id)
    }

    pub fn contains_layer(&self, id: LayerId) -> bool {
        self.layers.contains(&id)
    }

    /// The first selected text item; drives the formatting toolbar.
    pub fn primary_text(&self) -> Option<&TextItemId> {
        self.text_items.first()
    }

    /// Click on a text item. Without a modifier the selection becomes just
    /// this item; with one, its membership is toggled.
    pub fn click_text(&mut self, id: TextItemId, modifier: bool) {
        if modifier {
            self.toggle_text(id);
        } else {
            self.clear();
            self.text_items.push(id);
        }
    }

    /// Click on a layer, with the same rules as `click_text`.
    pub fn click_layer(&mut self, id: LayerId, modifier: bool) {
        if modifier {
            self.toggle_layer(id);
        } else {
            self.clear();
            self.layers.push(id);
        }
    }

    pub fn toggle_text(&mut self, id: TextItemId) {
        if let Some(pos) = self.text_items.iter().position(|t| *t == id) {
            self.text_items.remove(pos);
        } else {
            self.text_items.push(id);
        }
    }

    pub fn toggle_layer(&mut self, id: LayerId) {
        if let Some(pos) = self.layers.iter().position(|l| *l == id) {
            self.layers.remove(pos);
        } else {
            self.layers.push(id);
        }
    }

    /// Union text items into the selection.
    pub fn extend_text<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = TextItemId>,
    {
        for id in ids {
            if !self.text_items.contains(&id) {
                self.text_items.push(id);
            }
        }
    }

    pub fn clear(&mut self) {
        self.text_items.clear();
        self.layers.clear();
    }

    pub fn clear_text(&mut self) {
        self.text_items.clear();
    }

    /// Drop ids for which the predicates return false.
    pub fn retain(
        &mut self,
        mut keep_text: impl FnMut(&TextItemId) -> bool,
        mut keep_layer: impl FnMut(LayerId) -> bool,
    ) {
        self.text_items.retain(|id| keep_text(id));
        self.layers.retain(|id| keep_layer(*id));
    }
}

/// An in-progress rubber-band selection.
///
/// The rectangle exists only once the pointer has moved, so a press and
/// release without movement selects nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSelect {
    pub page: usize,
    pub anchor: Point,
    pub current: Option<Point>,
    /// Ctrl/cmd was held on press
    pub modifier: bool,
}

impl DragSelect {
    pub fn new(page: usize, anchor: Point, modifier: bool) -> Self {
        Self {
            page,
            anchor,
            current: None,
            modifier,
        }
    }

    pub fn update(&mut self, point: Point) {
        self.current = Some(point);
    }

    pub fn rect(&self) -> Option<Rect> {
        self.current.map(|p| Rect::from_corners(self.anchor, p))
    }
}

/// Ids of text items on `page` that strictly overlap `rect`, in item order.
pub fn items_in_rect(items: &[EditableTextItem], page: usize, rect: &Rect) -> Vec<TextItemId> {
    items
        .iter()
        .filter(|item| item.page_index == page && item.bounds().overlaps(rect))
        .map(|item| item.id.clone())
        .collect()
}

/// Box around the selected text items on `page`, when at least two are selected there.
pub fn aggregate_bounds(
    items: &[EditableTextItem],
    selection: &Selection,
    page: usize,
) -> Option<Rect> {
    let selected: Vec<Rect> = items
        .iter()
        .filter(|item| item.page_index == page && selection.contains_text(&item.id))
        .map(EditableTextItem::bounds)
        .collect();
    if selected.len() < 2 {
        return None;
    }
    Rect::bounding(selected)
}

/// What lies under a pointer position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum Hit {
    Layer(LayerId),
    TextItem(TextItemId),
    Empty,
}

/// Topmost layer containing `point`, else the first text item, else empty canvas.
pub fn hit_test(
    items: &[EditableTextItem],
    layers: &[Layer],
    page: usize,
    point: Point,
) -> Hit {
    if let Some(layer) = layers
        .iter()
        .rev()
        .find(|l| l.page == page && l.bounds().contains(point))
    {
        return Hit::Layer(layer.id);
    }
    items
        .iter()
        .find(|item| item.page_index == page && item.bounds().contains(point))
        .map_or(Hit::Empty, |item| Hit::TextItem(item.id.clone()))
}
