//! Serializable edit commands and keyboard shortcuts
//!
//! The browser and the CLI drive the store through `EditCommand` values so
//! a whole editing session can be recorded and replayed as JSON.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::DocEditResult;
use crate::model::{Layer, LayerId, LayerPatch, TextItemId, TextItemPatch, Tool};
use crate::store::LayerStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EditCommand {
    AddLayer { layer: Layer },
    UpdateLayer { id: LayerId, patch: LayerPatch },
    DeleteLayer { id: LayerId },
    UpdateTextItem { id: TextItemId, patch: TextItemPatch },
    DeleteTextItems { ids: Vec<TextItemId> },
    /// Delete the selected text items
    DeleteSelection,
    ApplyStyle { patch: TextItemPatch },
    SetActivePage { page: usize },
    SetTool { tool: Tool },
    Undo,
    Redo,
}

impl EditCommand {
    /// Map a key press to a command. `ctrl_or_meta` is ctrl on most
    /// platforms and cmd on macOS.
    pub fn from_key(key: &str, ctrl_or_meta: bool) -> Option<EditCommand> {
        match key {
            "z" | "Z" if ctrl_or_meta => Some(EditCommand::Undo),
            "y" | "Y" if ctrl_or_meta => Some(EditCommand::Redo),
            "Delete" => Some(EditCommand::DeleteSelection),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EditCommand::AddLayer { .. } => "addLayer",
            EditCommand::UpdateLayer { .. } => "updateLayer",
            EditCommand::DeleteLayer { .. } => "deleteLayer",
            EditCommand::UpdateTextItem { .. } => "updateTextItem",
            EditCommand::DeleteTextItems { .. } => "deleteTextItems",
            EditCommand::DeleteSelection => "deleteSelection",
            EditCommand::ApplyStyle { .. } => "applyStyle",
            EditCommand::SetActivePage { .. } => "setActivePage",
            EditCommand::SetTool { .. } => "setTool",
            EditCommand::Undo => "undo",
            EditCommand::Redo => "redo",
        }
    }
}

/// What a command did.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandOutcome {
    pub changed: bool,
    /// Id assigned by `addLayer`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer_id: Option<LayerId>,
}

impl CommandOutcome {
    fn changed(changed: bool) -> Self {
        Self {
            changed,
            layer_id: None,
        }
    }
}

impl LayerStore {
    /// Apply one command.
    ///
    /// Only `addLayer` on a missing page is an error; commands that
    /// reference unknown ids succeed with `changed: false`.
    pub fn execute(&mut self, command: EditCommand) -> DocEditResult<CommandOutcome> {
        let name = command.name();
        let outcome = match command {
            EditCommand::AddLayer { layer } => {
                let id = self.add_layer(layer)?;
                CommandOutcome {
                    changed: true,
                    layer_id: Some(id),
                }
            }
            EditCommand::UpdateLayer { id, patch } => {
                CommandOutcome::changed(self.update_layer(id, &patch))
            }
            EditCommand::DeleteLayer { id } => CommandOutcome::changed(self.delete_layer(id)),
            EditCommand::UpdateTextItem { id, patch } => {
                CommandOutcome::changed(self.update_text_item(&id, &patch))
            }
            EditCommand::DeleteTextItems { ids } => {
                CommandOutcome::changed(self.delete_text_items(&ids) > 0)
            }
            EditCommand::DeleteSelection => {
                CommandOutcome::changed(self.delete_selected_text_items() > 0)
            }
            EditCommand::ApplyStyle { patch } => {
                CommandOutcome::changed(self.apply_style_to_selection(&patch) > 0)
            }
            EditCommand::SetActivePage { page } => {
                CommandOutcome::changed(self.set_active_page(page))
            }
            EditCommand::SetTool { tool } => {
                self.set_tool(tool);
                CommandOutcome::changed(true)
            }
            EditCommand::Undo => CommandOutcome::changed(self.undo()),
            EditCommand::Redo => CommandOutcome::changed(self.redo()),
        };
        debug!(command = name, changed = outcome.changed, "executed command");
        Ok(outcome)
    }

    /// Handle a key press. Returns true when the key was consumed.
    ///
    /// `Delete` is consumed only when text items are selected.
    pub fn handle_key(&mut self, key: &str, ctrl_or_meta: bool) -> DocEditResult<bool> {
        let Some(command) = EditCommand::from_key(key, ctrl_or_meta) else {
            return Ok(false);
        };
        if command == EditCommand::DeleteSelection && self.selection().text_items().is_empty() {
            return Ok(false);
        }
        self.execute(command)?;
        Ok(true)
    }
}
