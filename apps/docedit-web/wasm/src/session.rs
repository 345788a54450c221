//! Editor session exposed to JavaScript
//!
//! Wraps a `LayerStore` and the in-flight page-by-page load. Every JS
//! method delegates to an `*_internal` method that returns a plain Rust
//! result so the session can be tested natively.

use docedit_core::extract::parse_text_runs;
use docedit_core::{
    DocEditError, DocEditResult, EditCommand, EngineConfig, Hit, LayerId, LayerPatch, LayerStore,
    LoadTicket, PageInfo, PendingLoad, Point, Raster, TextItemId, TextItemPatch, Tool,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use web_sys::CanvasRenderingContext2d;

use crate::overlay::CanvasOverlay;

fn to_js(err: DocEditError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> DocEditResult<String> {
    Ok(serde_json::to_string(value)?)
}

/// Stateful editing session for one document at a time
#[wasm_bindgen]
pub struct EditorSession {
    store: LayerStore,
    pending: Option<PendingLoad>,
    change_callback: Option<js_sys::Function>,
}

#[wasm_bindgen]
impl EditorSession {
    /// Create a session. `config_json` may override any engine setting.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<EditorSession, JsValue> {
        Self::from_config_json(config_json.as_deref()).map_err(to_js)
    }

    fn from_config_json(config_json: Option<&str>) -> DocEditResult<Self> {
        let config = match config_json {
            Some(json) if !json.trim().is_empty() => EngineConfig::from_json(json)?,
            _ => EngineConfig::default(),
        };
        Ok(Self {
            store: LayerStore::new(config),
            pending: None,
            change_callback: None,
        })
    }

    /// Called with no arguments whenever the document or selection changes
    #[wasm_bindgen(js_name = setChangeCallback)]
    pub fn set_change_callback(&mut self, callback: js_sys::Function) {
        self.change_callback = Some(callback);
    }

    fn notify(&self, changed: bool) {
        if !changed {
            return;
        }
        if let Some(callback) = &self.change_callback {
            if let Err(err) = callback.call0(&JsValue::NULL) {
                tracing::warn!(error = ?err, "change callback failed");
            }
        }
    }

    // ---- Loading ----

    /// Start loading a new document. Any load in flight is superseded.
    #[wasm_bindgen(js_name = beginLoad)]
    pub fn begin_load(&mut self) -> u64 {
        let pending = self.store.begin_pending_load();
        let ticket = pending.ticket();
        self.pending = Some(pending);
        ticket.0
    }

    /// Scale the renderer must use for a page of this size
    #[wasm_bindgen(js_name = scaleFor)]
    pub fn scale_for(&self, page_width: f64, page_height: f64) -> f64 {
        let config = self.store.config();
        docedit_core::geometry::fit_scale(
            page_width,
            page_height,
            config.page_width,
            config.page_height,
        )
    }

    fn pending_for(&mut self, ticket: u64) -> DocEditResult<&mut PendingLoad> {
        let current = self.pending.as_ref().map_or(0, |p| p.ticket().0);
        match self.pending.as_mut() {
            Some(pending) if pending.ticket() == LoadTicket(ticket) => Ok(pending),
            _ => Err(DocEditError::SupersededLoad { ticket, current }),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn push_page_internal(
        &mut self,
        ticket: u64,
        page_width: f64,
        page_height: f64,
        raster_width: u32,
        raster_height: u32,
        rgba: Option<Vec<u8>>,
        runs_json: &str,
    ) -> DocEditResult<PageInfo> {
        let pending = self.pending_for(ticket)?;
        let page = pending.page_count();
        let raster = match rgba {
            Some(bytes) => Raster::from_rgba(raster_width, raster_height, bytes),
            None => Raster::restricted(raster_width, raster_height),
        };
        if !raster.is_readable() {
            tracing::debug!(page, "page pixels unreadable, backgrounds fall back to white");
        }
        let result = parse_text_runs(runs_json)
            .map_err(|e| DocEditError::Extraction {
                page,
                reason: format!("invalid text content: {}", e),
            })
            .and_then(|runs| pending.add_page(page_width, page_height, &raster, &runs));

        if let Err(err) = &result {
            self.pending = None;
            self.store.fail_load(LoadTicket(ticket), &err.to_string());
        }
        result
    }

    /// Add the next page of the load in progress.
    ///
    /// `rgba` is the page's ImageData bytes, or undefined when the canvas
    /// cannot be read. `runs_json` is the pdf.js `getTextContent().items`
    /// array. A failure abandons the whole load.
    #[wasm_bindgen(js_name = pushPage)]
    #[allow(clippy::too_many_arguments)]
    pub fn push_page(
        &mut self,
        ticket: u64,
        page_width: f64,
        page_height: f64,
        raster_width: u32,
        raster_height: u32,
        rgba: Option<Vec<u8>>,
        runs_json: &str,
    ) -> Result<JsValue, JsValue> {
        let info = self
            .push_page_internal(
                ticket,
                page_width,
                page_height,
                raster_width,
                raster_height,
                rgba,
                runs_json,
            )
            .map_err(to_js)?;
        to_value(&info)
    }

    fn finish_load_internal(&mut self, ticket: u64) -> DocEditResult<usize> {
        self.pending_for(ticket)?;
        if let Some(pending) = self.pending.take() {
            self.store.commit_load(pending.finish())?;
        }
        Ok(self.store.text_items().len())
    }

    /// Commit the load. Returns the number of extracted text items.
    #[wasm_bindgen(js_name = finishLoad)]
    pub fn finish_load(&mut self, ticket: u64) -> Result<usize, JsValue> {
        let count = self.finish_load_internal(ticket).map_err(to_js)?;
        self.notify(true);
        Ok(count)
    }

    /// Abandon a load that failed on the JS side (pdf.js error, etc.)
    #[wasm_bindgen(js_name = failLoad)]
    pub fn fail_load(&mut self, ticket: u64, message: &str) {
        if self.pending_for(ticket).is_ok() {
            self.pending = None;
        }
        self.store.fail_load(LoadTicket(ticket), message);
    }

    #[wasm_bindgen(getter, js_name = isLoading)]
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    #[wasm_bindgen(getter, js_name = pageCount)]
    pub fn page_count(&self) -> usize {
        self.store.page_count()
    }

    // ---- Mutations ----

    fn dispatch_internal(&mut self, command_json: &str) -> DocEditResult<String> {
        let command: EditCommand = serde_json::from_str(command_json)
            .map_err(|e| DocEditError::InvalidCommand(e.to_string()))?;
        let outcome = self.store.execute(command)?;
        self.notify(outcome.changed);
        to_json(&outcome)
    }

    /// Execute a JSON `EditCommand`; returns the JSON outcome
    #[wasm_bindgen]
    pub fn dispatch(&mut self, command_json: &str) -> Result<String, JsValue> {
        self.dispatch_internal(command_json).map_err(to_js)
    }

    fn add_layer_internal(&mut self, layer_json: &str) -> DocEditResult<LayerId> {
        let layer = serde_json::from_str(layer_json)?;
        let id = self.store.add_layer(layer)?;
        self.notify(true);
        Ok(id)
    }

    /// Add a layer from JSON. Returns the assigned layer id.
    #[wasm_bindgen(js_name = addLayer)]
    pub fn add_layer(&mut self, layer_json: &str) -> Result<u64, JsValue> {
        self.add_layer_internal(layer_json)
            .map(|id| id.0)
            .map_err(to_js)
    }

    fn update_layer_internal(&mut self, id: u64, patch_json: &str) -> DocEditResult<bool> {
        let patch: LayerPatch = serde_json::from_str(patch_json)?;
        let changed = self.store.update_layer(LayerId(id), &patch);
        self.notify(changed);
        Ok(changed)
    }

    #[wasm_bindgen(js_name = updateLayer)]
    pub fn update_layer(&mut self, id: u64, patch_json: &str) -> Result<bool, JsValue> {
        self.update_layer_internal(id, patch_json).map_err(to_js)
    }

    #[wasm_bindgen(js_name = deleteLayer)]
    pub fn delete_layer(&mut self, id: u64) -> bool {
        let changed = self.store.delete_layer(LayerId(id));
        self.notify(changed);
        changed
    }

    fn update_text_item_internal(&mut self, id: &str, patch_json: &str) -> DocEditResult<bool> {
        let patch: TextItemPatch = serde_json::from_str(patch_json)?;
        let changed = self.store.update_text_item(&TextItemId::from(id), &patch);
        self.notify(changed);
        Ok(changed)
    }

    /// Commit an edit to a text item (call on blur, not per keystroke)
    #[wasm_bindgen(js_name = updateTextItem)]
    pub fn update_text_item(&mut self, id: &str, patch_json: &str) -> Result<bool, JsValue> {
        self.update_text_item_internal(id, patch_json)
            .map_err(to_js)
    }

    fn delete_text_items_internal(&mut self, ids_json: &str) -> DocEditResult<usize> {
        let ids: Vec<TextItemId> = serde_json::from_str(ids_json)?;
        let removed = self.store.delete_text_items(&ids);
        self.notify(removed > 0);
        Ok(removed)
    }

    #[wasm_bindgen(js_name = deleteTextItems)]
    pub fn delete_text_items(&mut self, ids_json: &str) -> Result<usize, JsValue> {
        self.delete_text_items_internal(ids_json).map_err(to_js)
    }

    #[wasm_bindgen(js_name = deleteSelectedTextItems)]
    pub fn delete_selected_text_items(&mut self) -> usize {
        let removed = self.store.delete_selected_text_items();
        self.notify(removed > 0);
        removed
    }

    fn apply_style_internal(&mut self, patch_json: &str) -> DocEditResult<usize> {
        let patch: TextItemPatch = serde_json::from_str(patch_json)?;
        let count = self.store.apply_style_to_selection(&patch);
        self.notify(count > 0);
        Ok(count)
    }

    /// Apply a style patch to every selected text item as one undo step
    #[wasm_bindgen(js_name = applyStyleToSelection)]
    pub fn apply_style_to_selection(&mut self, patch_json: &str) -> Result<usize, JsValue> {
        self.apply_style_internal(patch_json).map_err(to_js)
    }

    #[wasm_bindgen]
    pub fn undo(&mut self) -> bool {
        let changed = self.store.undo();
        self.notify(changed);
        changed
    }

    #[wasm_bindgen]
    pub fn redo(&mut self) -> bool {
        let changed = self.store.redo();
        self.notify(changed);
        changed
    }

    #[wasm_bindgen(getter, js_name = canUndo)]
    pub fn can_undo(&self) -> bool {
        self.store.can_undo()
    }

    #[wasm_bindgen(getter, js_name = canRedo)]
    pub fn can_redo(&self) -> bool {
        self.store.can_redo()
    }

    /// Drop the document (the "close file" action)
    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.pending = None;
        self.store.reset();
        self.notify(true);
    }

    // ---- Tools, pages, input ----

    #[wasm_bindgen(js_name = setActivePage)]
    pub fn set_active_page(&mut self, page: usize) -> bool {
        let changed = self.store.set_active_page(page);
        self.notify(changed);
        changed
    }

    #[wasm_bindgen(getter, js_name = activePage)]
    pub fn active_page(&self) -> usize {
        self.store.active_page()
    }

    fn set_tool_internal(&mut self, tool: &str) -> DocEditResult<()> {
        let tool: Tool = tool.parse().map_err(DocEditError::InvalidCommand)?;
        self.store.set_tool(tool);
        Ok(())
    }

    #[wasm_bindgen(js_name = setTool)]
    pub fn set_tool(&mut self, tool: &str) -> Result<(), JsValue> {
        self.set_tool_internal(tool).map_err(to_js)
    }

    #[wasm_bindgen(getter, js_name = activeTool)]
    pub fn active_tool(&self) -> String {
        self.store.active_tool().as_str().to_string()
    }

    fn pointer_down_internal(&mut self, x: f64, y: f64, modifier: bool) -> Hit {
        let hit = self.store.pointer_down(Point::new(x, y), modifier);
        self.notify(true);
        hit
    }

    /// Pointer press on the active page. Returns what was hit.
    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self, x: f64, y: f64, modifier: bool) -> Result<JsValue, JsValue> {
        let hit = self.pointer_down_internal(x, y, modifier);
        to_value(&hit)
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, x: f64, y: f64) -> bool {
        let dragging = self.store.pointer_move(Point::new(x, y));
        self.notify(dragging);
        dragging
    }

    /// Finish a drag. Returns how many items the rectangle covered.
    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self) -> usize {
        let count = self.store.pointer_up();
        self.notify(true);
        count
    }

    #[wasm_bindgen(js_name = clickTextItem)]
    pub fn click_text_item(&mut self, id: &str, modifier: bool) -> bool {
        let changed = self.store.click_text_item(&TextItemId::from(id), modifier);
        self.notify(changed);
        changed
    }

    #[wasm_bindgen(js_name = clickLayer)]
    pub fn click_layer(&mut self, id: u64, modifier: bool) -> bool {
        let changed = self.store.click_layer(LayerId(id), modifier);
        self.notify(changed);
        changed
    }

    #[wasm_bindgen(js_name = clickEmpty)]
    pub fn click_empty(&mut self, modifier: bool) {
        self.store.click_empty(modifier);
        self.notify(true);
    }

    fn handle_key_internal(&mut self, key: &str, ctrl_or_meta: bool) -> DocEditResult<bool> {
        let handled = self.store.handle_key(key, ctrl_or_meta)?;
        self.notify(handled);
        Ok(handled)
    }

    /// Keyboard shortcuts. Returns true when the caller should preventDefault.
    #[wasm_bindgen(js_name = handleKey)]
    pub fn handle_key(&mut self, key: &str, ctrl_or_meta: bool) -> Result<bool, JsValue> {
        self.handle_key_internal(key, ctrl_or_meta).map_err(to_js)
    }

    // ---- Queries ----

    fn frame_json_internal(&self, page: usize) -> DocEditResult<String> {
        let frame = self
            .store
            .frame(page)
            .ok_or(DocEditError::PageOutOfRange {
                page,
                count: self.store.page_count(),
            })?;
        to_json(&frame)
    }

    #[wasm_bindgen(js_name = frameJson)]
    pub fn frame_json(&self, page: usize) -> Result<String, JsValue> {
        self.frame_json_internal(page).map_err(to_js)
    }

    /// Render view of `page` as a plain JS object
    #[wasm_bindgen]
    pub fn frame(&self, page: usize) -> Result<JsValue, JsValue> {
        let frame = self.store.frame(page).ok_or_else(|| {
            to_js(DocEditError::PageOutOfRange {
                page,
                count: self.store.page_count(),
            })
        })?;
        to_value(&frame)
    }

    /// Draw the overlay for `page`. Returns false if the page does not exist.
    #[wasm_bindgen]
    pub fn render(&self, page: usize, ctx: &CanvasRenderingContext2d) -> Result<bool, JsValue> {
        let mut overlay = CanvasOverlay::new(ctx.clone());
        self.store.render_with(page, &mut overlay)
    }

    fn text_items_json_internal(&self, page: usize) -> DocEditResult<String> {
        let items: Vec<_> = self.store.text_items_on_page(page).collect();
        to_json(&items)
    }

    #[wasm_bindgen(js_name = textItemsJson)]
    pub fn text_items_json(&self, page: usize) -> Result<String, JsValue> {
        self.text_items_json_internal(page).map_err(to_js)
    }

    fn layers_json_internal(&self, page: usize) -> DocEditResult<String> {
        let layers: Vec<_> = self.store.layers_on_page(page).collect();
        to_json(&layers)
    }

    #[wasm_bindgen(js_name = layersJson)]
    pub fn layers_json(&self, page: usize) -> Result<String, JsValue> {
        self.layers_json_internal(page).map_err(to_js)
    }

    #[wasm_bindgen(js_name = selectionJson)]
    pub fn selection_json(&self) -> Result<String, JsValue> {
        to_json(self.store.selection()).map_err(to_js)
    }

    /// The first selected text item, for the formatting toolbar
    #[wasm_bindgen(js_name = primarySelectionJson)]
    pub fn primary_selection_json(&self) -> Result<Option<String>, JsValue> {
        self.store
            .primary_selection()
            .map(to_json)
            .transpose()
            .map_err(to_js)
    }

    #[wasm_bindgen(js_name = snapshotJson)]
    pub fn snapshot_json(&self) -> Result<String, JsValue> {
        to_json(&self.store.snapshot()).map_err(to_js)
    }

    #[wasm_bindgen(js_name = historyStatus)]
    pub fn history_status(&self) -> Result<JsValue, JsValue> {
        to_value(&self.store.history_status())
    }
}
