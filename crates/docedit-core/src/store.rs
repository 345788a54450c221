//! The layer store: owner of all mutable document state
//!
//! Every mutation that changes the document commits exactly one snapshot
//! to the history. Mutations that reference unknown ids change nothing and
//! commit nothing; they report `false` (or zero) to the caller.

use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{DocEditError, DocEditResult};
use crate::geometry::{Point, Rect};
use crate::history::{History, HistoryStatus};
use crate::loader::{
    DocumentLoader, LoadTicket, LoadedDocument, PageRasterizer, PendingLoad, TextContentProvider,
};
use crate::model::{
    EditableTextItem, Layer, LayerId, LayerPatch, PageInfo, Snapshot, TextItemId, TextItemPatch,
    Tool,
};
use crate::selection::{aggregate_bounds, hit_test, items_in_rect, DragSelect, Hit, Selection};

#[derive(Debug, Clone)]
pub struct LayerStore {
    config: EngineConfig,
    pages: Vec<PageInfo>,
    text_items: Vec<EditableTextItem>,
    layers: Vec<Layer>,
    selection: Selection,
    drag: Option<DragSelect>,
    active_page: usize,
    active_tool: Tool,
    history: History<Snapshot>,
    next_layer_id: u64,
    /// Generation of the most recently issued load ticket
    load_generation: u64,
}

impl Default for LayerStore {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl LayerStore {
    pub fn new(config: EngineConfig) -> Self {
        let history = History::new(config.history_limit);
        Self {
            config,
            pages: Vec::new(),
            text_items: Vec::new(),
            layers: Vec::new(),
            selection: Selection::new(),
            drag: None,
            active_page: 0,
            active_tool: Tool::default(),
            history,
            next_layer_id: 1,
            load_generation: 0,
        }
    }

    // ---- Read access ----

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn pages(&self) -> &[PageInfo] {
        &self.pages
    }

    pub fn page(&self, index: usize) -> Option<&PageInfo> {
        self.pages.get(index)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn text_items(&self) -> &[EditableTextItem] {
        &self.text_items
    }

    pub fn text_items_on_page(&self, page: usize) -> impl Iterator<Item = &EditableTextItem> {
        self.text_items.iter().filter(move |i| i.page_index == page)
    }

    pub fn text_item(&self, id: &TextItemId) -> Option<&EditableTextItem> {
        self.text_items.iter().find(|i| &i.id == id)
    }

    /// All layers in z-order (later is on top).
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layers_on_page(&self, page: usize) -> impl Iterator<Item = &Layer> {
        self.layers.iter().filter(move |l| l.page == page)
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn active_page(&self) -> usize {
        self.active_page
    }

    pub fn active_tool(&self) -> Tool {
        self.active_tool
    }

    pub fn history(&self) -> &History<Snapshot> {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history_status(&self) -> HistoryStatus {
        self.history.status()
    }

    /// Deep copy of the editable state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            text_items: self.text_items.clone(),
            layers: self.layers.clone(),
        }
    }

    fn has_page(&self, page: usize) -> bool {
        page < self.pages.len()
    }

    fn commit(&mut self, action: &str) {
        let snapshot = self.snapshot();
        self.history.push(snapshot);
        debug!(action, cursor = self.history.cursor(), "committed snapshot");
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.text_items = snapshot.text_items;
        self.layers = snapshot.layers;
        self.prune_selection();
    }

    fn prune_selection(&mut self) {
        let items = &self.text_items;
        let layers = &self.layers;
        self.selection.retain(
            |id| items.iter().any(|i| &i.id == id),
            |id| layers.iter().any(|l| l.id == id),
        );
    }

    // ---- Loading ----

    /// Issue a ticket for a new load. Any earlier ticket is superseded.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.load_generation += 1;
        LoadTicket(self.load_generation)
    }

    /// Start a push-style load with this store's configuration.
    pub fn begin_pending_load(&mut self) -> PendingLoad {
        let ticket = self.begin_load();
        PendingLoad::new(ticket, self.config.clone())
    }

    pub fn is_current_load(&self, ticket: LoadTicket) -> bool {
        ticket.0 == self.load_generation
    }

    /// Replace the document with a finished load.
    ///
    /// Only the most recently issued ticket is accepted. Committing clears
    /// layers, selection and history, then records the loaded state as the
    /// first snapshot.
    pub fn commit_load(&mut self, document: LoadedDocument) -> DocEditResult<()> {
        if !self.is_current_load(document.ticket) {
            warn!(
                ticket = document.ticket.0,
                current = self.load_generation,
                "discarding superseded load"
            );
            return Err(DocEditError::SupersededLoad {
                ticket: document.ticket.0,
                current: self.load_generation,
            });
        }

        self.pages = document.pages;
        self.text_items = document.text_items;
        self.layers.clear();
        self.selection.clear();
        self.drag = None;
        self.active_page = 0;
        self.history.clear();
        self.commit("load");
        info!(
            ticket = document.ticket.0,
            pages = self.pages.len(),
            items = self.text_items.len(),
            "document loaded"
        );
        Ok(())
    }

    /// Record that a load failed. The store is left untouched.
    pub fn fail_load(&self, ticket: LoadTicket, reason: &str) {
        warn!(ticket = ticket.0, reason, "document load failed");
    }

    /// Load a document synchronously through the given collaborators.
    pub fn load_document<R, P>(&mut self, rasterizer: &mut R, provider: &mut P) -> DocEditResult<()>
    where
        R: PageRasterizer + ?Sized,
        P: TextContentProvider + ?Sized,
    {
        let ticket = self.begin_load();
        let loaded = DocumentLoader::new(&self.config).load(ticket, rasterizer, provider);
        match loaded {
            Ok(document) => self.commit_load(document),
            Err(err) => {
                self.fail_load(ticket, &err.to_string());
                Err(err)
            }
        }
    }

    /// Drop the document and all state derived from it. A load in flight
    /// is superseded.
    pub fn reset(&mut self) {
        self.load_generation += 1;
        self.pages.clear();
        self.text_items.clear();
        self.layers.clear();
        self.selection.clear();
        self.drag = None;
        self.active_page = 0;
        self.history.clear();
        info!("store reset");
    }

    // ---- Mutations ----

    /// Append a layer on top of its page and return its assigned id.
    pub fn add_layer(&mut self, mut layer: Layer) -> DocEditResult<LayerId> {
        if !self.has_page(layer.page) {
            return Err(DocEditError::PageOutOfRange {
                page: layer.page,
                count: self.pages.len(),
            });
        }
        let id = LayerId(self.next_layer_id);
        self.next_layer_id += 1;
        layer.id = id;
        layer.normalize();
        self.layers.push(layer);
        self.commit("add layer");
        Ok(id)
    }

    pub fn update_layer(&mut self, id: LayerId, patch: &LayerPatch) -> bool {
        if let Some(page) = patch.page {
            if !self.has_page(page) {
                warn!(layer = %id, page, "ignoring move to a missing page");
                return false;
            }
        }
        let Some(layer) = self.layers.iter_mut().find(|l| l.id == id) else {
            debug!(layer = %id, "update of unknown layer ignored");
            return false;
        };
        patch.apply_to(layer);
        self.commit("update layer");
        true
    }

    pub fn update_text_item(&mut self, id: &TextItemId, patch: &TextItemPatch) -> bool {
        let Some(item) = self.text_items.iter_mut().find(|i| &i.id == id) else {
            debug!(item = %id, "update of unknown text item ignored");
            return false;
        };
        patch.apply_to(item);
        self.commit("update text item");
        true
    }

    pub fn delete_layer(&mut self, id: LayerId) -> bool {
        let before = self.layers.len();
        self.layers.retain(|l| l.id != id);
        if self.layers.len() == before {
            debug!(layer = %id, "delete of unknown layer ignored");
            return false;
        }
        self.prune_selection();
        self.commit("delete layer");
        true
    }

    /// Remove the given text items and return how many were removed.
    pub fn delete_text_items(&mut self, ids: &[TextItemId]) -> usize {
        let before = self.text_items.len();
        self.text_items.retain(|i| !ids.contains(&i.id));
        let removed = before - self.text_items.len();
        if removed == 0 {
            return 0;
        }
        self.prune_selection();
        self.commit("delete text items");
        removed
    }

    /// Delete every selected text item and clear the text selection.
    pub fn delete_selected_text_items(&mut self) -> usize {
        let ids = self.selection.text_items().to_vec();
        let removed = self.delete_text_items(&ids);
        self.selection.clear_text();
        removed
    }

    /// Merge `patch` into every selected text item as one undoable step.
    /// An empty patch changes nothing and commits nothing.
    pub fn apply_style_to_selection(&mut self, patch: &TextItemPatch) -> usize {
        if patch.is_empty() {
            return 0;
        }
        let selection = &self.selection;
        let mut count = 0;
        for item in self
            .text_items
            .iter_mut()
            .filter(|i| selection.contains_text(&i.id))
        {
            patch.apply_to(item);
            count += 1;
        }
        if count > 0 {
            self.commit("apply style");
        }
        count
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(snapshot) => {
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(snapshot) => {
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    pub fn set_active_page(&mut self, page: usize) -> bool {
        if !self.has_page(page) {
            return false;
        }
        if self.active_page != page {
            self.active_page = page;
            self.drag = None;
        }
        true
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.active_tool = tool;
        self.drag = None;
    }

    // ---- Selection ----

    /// Click on a text item. Returns false when the tool does not select
    /// or the item is unknown.
    pub fn click_text_item(&mut self, id: &TextItemId, modifier: bool) -> bool {
        if !self.active_tool.selects_on_click() || self.text_item(id).is_none() {
            return false;
        }
        self.selection.click_text(id.clone(), modifier);
        true
    }

    pub fn click_layer(&mut self, id: LayerId, modifier: bool) -> bool {
        if !self.active_tool.selects_on_click() || self.layer(id).is_none() {
            return false;
        }
        self.selection.click_layer(id, modifier);
        true
    }

    /// Click on empty canvas: clears the selection unless ctrl/cmd is held.
    pub fn click_empty(&mut self, modifier: bool) {
        if self.active_tool.selects_on_click() && !modifier {
            self.selection.clear();
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn hit_test(&self, point: Point) -> Hit {
        hit_test(&self.text_items, &self.layers, self.active_page, point)
    }

    /// Pointer press on the active page.
    ///
    /// Items and layers are clicked; empty canvas anchors a drag rectangle
    /// under the select tool.
    pub fn pointer_down(&mut self, point: Point, modifier: bool) -> Hit {
        let hit = self.hit_test(point);
        match &hit {
            Hit::TextItem(id) => {
                self.click_text_item(id, modifier);
            }
            Hit::Layer(id) => {
                self.click_layer(*id, modifier);
            }
            Hit::Empty => {
                if self.active_tool == Tool::Select {
                    self.drag = Some(DragSelect::new(self.active_page, point, modifier));
                } else {
                    self.click_empty(modifier);
                }
            }
        }
        hit
    }

    /// Returns true while a drag rectangle is being tracked.
    pub fn pointer_move(&mut self, point: Point) -> bool {
        match self.drag.as_mut() {
            Some(drag) => {
                drag.update(point);
                true
            }
            None => false,
        }
    }

    /// Finish a drag, adding every overlapped text item on the drag's page
    /// to the selection. A press without movement counts as an empty click.
    pub fn pointer_up(&mut self) -> usize {
        let Some(drag) = self.drag.take() else {
            return 0;
        };
        match drag.rect() {
            Some(rect) => {
                let hits = items_in_rect(&self.text_items, drag.page, &rect);
                let count = hits.len();
                self.selection.extend_text(hits);
                count
            }
            None => {
                self.click_empty(drag.modifier);
                0
            }
        }
    }

    /// The live drag rectangle, once the pointer has moved.
    pub fn drag_rect(&self) -> Option<Rect> {
        self.drag.as_ref().and_then(DragSelect::rect)
    }

    /// Box around the selected items on the active page, when two or more are selected.
    pub fn selection_bounds(&self) -> Option<Rect> {
        aggregate_bounds(&self.text_items, &self.selection, self.active_page)
    }

    pub fn primary_selection(&self) -> Option<&EditableTextItem> {
        self.selection
            .primary_text()
            .and_then(|id| self.text_item(id))
    }
}
