//! Native front end for the document editing engine
//!
//! `extract` runs the text layout extractor over a single page dump.
//! `replay` loads a fixture document and executes an edit script against it.

pub mod fixture;

use anyhow::{Context, Result};
use docedit_core::{
    CommandOutcome, EditCommand, EditableTextItem, EngineConfig, HistoryStatus, LayerStore,
    LoadTicket, PendingLoad, Snapshot,
};
use serde::Serialize;
use std::path::Path;

use fixture::{FixtureDocument, FixturePage};

/// Result of replaying an edit script
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayReport {
    pub outcomes: Vec<CommandOutcome>,
    pub snapshot: Snapshot,
    pub history: HistoryStatus,
}

pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    EngineConfig::from_json(&json).with_context(|| format!("parsing config {}", path.display()))
}

/// Extract the editable text items of one fixture page.
pub fn extract_page(page_json: &str, config: &EngineConfig) -> Result<Vec<EditableTextItem>> {
    let page: FixturePage = serde_json::from_str(page_json).context("parsing page")?;
    let mut pending = PendingLoad::new(LoadTicket(1), config.clone());
    let scale = pending.scale_for(page.width, page.height);
    pending
        .add_page(page.width, page.height, &page.raster(scale), &page.text_runs())
        .context("extracting page")?;
    Ok(pending.finish().text_items)
}

/// Load `document_json` and apply each command of `commands_json` in order.
pub fn replay(document_json: &str, commands_json: &str, config: &EngineConfig) -> Result<ReplayReport> {
    let mut document = FixtureDocument::from_json(document_json).context("parsing document")?;
    let commands: Vec<EditCommand> =
        serde_json::from_str(commands_json).context("parsing commands")?;

    let mut store = LayerStore::new(config.clone());
    let mut text = document.clone();
    store
        .load_document(&mut document, &mut text)
        .context("loading document")?;
    tracing::info!(
        pages = store.page_count(),
        items = store.text_items().len(),
        commands = commands.len(),
        "replaying"
    );

    let mut outcomes = Vec::with_capacity(commands.len());
    for (index, command) in commands.into_iter().enumerate() {
        let name = command.name();
        let outcome = store
            .execute(command)
            .with_context(|| format!("command {} ({})", index, name))?;
        tracing::debug!(index, name, changed = outcome.changed, "executed");
        outcomes.push(outcome);
    }

    Ok(ReplayReport {
        outcomes,
        snapshot: store.snapshot(),
        history: store.history_status(),
    })
}
