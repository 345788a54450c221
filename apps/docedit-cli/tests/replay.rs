//! End-to-end runs over the bundled fixtures

use docedit_cli::{extract_page, replay};
use docedit_core::{Color, EngineConfig};
use pretty_assertions::assert_eq;

const DOCUMENT: &str = include_str!("fixtures/invoice.json");
const EDITS: &str = include_str!("fixtures/invoice_edits.json");

#[test]
fn replay_invoice_edits() {
    let report = replay(DOCUMENT, EDITS, &EngineConfig::default()).unwrap();

    let changed: Vec<bool> = report.outcomes.iter().map(|o| o.changed).collect();
    assert_eq!(changed, vec![true, true, true, true, true, false, true]);
    assert_eq!(report.outcomes[2].layer_id.map(|id| id.0), Some(1));

    // load + update + add + delete, then one undo
    assert_eq!(report.history.length, 4);
    assert_eq!(report.history.cursor, 2);
    assert!(report.history.can_redo);

    let items = &report.snapshot.text_items;
    assert_eq!(items.len(), 3);
    let back = items.iter().find(|i| i.id.as_str() == "text-2-0-1").unwrap();
    assert_eq!(back.text, "Back cover");
    assert_eq!(back.color, Color::WHITE);
    assert_eq!(back.original_color, Color::BLACK);
    assert_eq!(back.background_color, Color::BLACK);
    assert_eq!((back.x, back.y, back.font_size), (50.0, 80.0, 12.0));

    let layer = &report.snapshot.layers[0];
    assert_eq!(layer.style.annotation_color, Some(Color::rgb(255, 255, 0)));
}

#[test]
fn replay_report_serializes_camel_case() {
    let report = replay(DOCUMENT, "[]", &EngineConfig::default()).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["history"]["cursor"], 0);
    assert_eq!(json["snapshot"]["textItems"][0]["backgroundColor"], "#ffffff");
    assert_eq!(json["snapshot"]["textItems"][0]["fontWeight"], "bold");
}

#[test]
fn extract_uses_configured_page_box() {
    let page = r#"{"width": 595, "height": 842, "runs": [
        {"str": "Hello", "transform": [10, 0, 0, 10, 100, 800], "width": 25}
    ]}"#;
    let config = EngineConfig::default().with_page_size(1190.0, 1684.0);
    let items = extract_page(page, &config).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].font_size, 20.0);
    assert_eq!(items[0].width, 50.0);
    assert_eq!(items[0].y, 1684.0 - 1600.0 - 20.0);
}
