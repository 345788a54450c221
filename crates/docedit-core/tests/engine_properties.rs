//! End-to-end behavior of the document engine

use docedit_core::{
    AffineTransform, Color, DocEditError, DocEditResult, EditCommand, EngineConfig, History,
    Layer, LayerId, LayerKind, LayerPatch, LayerStore, PageRasterizer, Point, Raster, Rect,
    Snapshot, TextContentProvider, TextItemId, TextItemPatch, TextRun,
};
use docedit_core::selection::items_in_rect;
use pretty_assertions::assert_eq;

/// A document whose pages are blank A4 sheets with fixed text runs
struct Fixture {
    pages: Vec<Vec<TextRun>>,
    fail_on: Option<usize>,
}

impl Fixture {
    fn new(pages: Vec<Vec<TextRun>>) -> Self {
        Self {
            pages,
            fail_on: None,
        }
    }
}

impl PageRasterizer for Fixture {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_size(&self, _page: usize) -> DocEditResult<(f64, f64)> {
        Ok((595.0, 842.0))
    }

    fn render(&mut self, page: usize, scale: f64) -> DocEditResult<Raster> {
        if self.fail_on == Some(page) {
            return Err(DocEditError::Extraction {
                page,
                reason: "render failed".to_string(),
            });
        }
        Ok(Raster::solid(
            (595.0 * scale).round() as u32,
            (842.0 * scale).round() as u32,
            Color::WHITE,
        ))
    }
}

struct Runs(Vec<Vec<TextRun>>);

impl TextContentProvider for Runs {
    fn text_runs(&mut self, page: usize) -> DocEditResult<Vec<TextRun>> {
        Ok(self.0[page].clone())
    }
}

/// Run whose raster box is exactly (x, y, w, h) on an 842px-high page
fn run_at(text: &str, x: f64, y: f64, w: f64, h: f64) -> TextRun {
    TextRun::new(text, AffineTransform::new(h, 0.0, 0.0, h, x, 842.0 - y - h)).with_width(w)
}

fn load(pages: Vec<Vec<TextRun>>) -> LayerStore {
    let mut store = LayerStore::default();
    let mut fixture = Fixture::new(pages.clone());
    store.load_document(&mut fixture, &mut Runs(pages)).unwrap();
    store
}

fn two_box_store() -> LayerStore {
    load(vec![vec![
        run_at("A", 0.0, 0.0, 10.0, 10.0),
        run_at("B", 20.0, 20.0, 10.0, 10.0),
    ]])
}

fn selected_texts(store: &LayerStore) -> Vec<String> {
    let mut texts: Vec<String> = store
        .selection()
        .text_items()
        .iter()
        .filter_map(|id| store.text_item(id))
        .map(|i| i.text.clone())
        .collect();
    texts.sort();
    texts
}

fn drag(store: &mut LayerStore, from: (f64, f64), to: (f64, f64)) {
    store.pointer_down(Point::new(from.0, from.1), false);
    store.pointer_move(Point::new(to.0, to.1));
    store.pointer_up();
}

#[test]
fn extracted_boxes_land_in_raster_space() {
    let store = two_box_store();
    let b = &store.text_items()[1];
    assert_eq!(b.bounds(), Rect::new(20.0, 20.0, 10.0, 10.0));
    assert_eq!(b.id.as_str(), "text-1-1-1");
}

#[test]
fn rectangle_hit_test_examples() {
    let store = two_box_store();
    let cases: Vec<((f64, f64), (f64, f64), Vec<&str>)> = vec![
        ((5.0, 5.0), (10.0, 10.0), vec!["A"]),
        ((15.0, 15.0), (10.0, 10.0), vec![]),
        ((0.0, 0.0), (30.0, 30.0), vec!["A", "B"]),
    ];
    for (from, to, expected) in cases {
        let rect = Rect::from_corners(Point::new(from.0, from.1), Point::new(to.0, to.1));
        let hits: Vec<String> = items_in_rect(store.text_items(), 0, &rect)
            .iter()
            .filter_map(|id| store.text_item(id))
            .map(|i| i.text.clone())
            .collect();
        assert_eq!(hits, expected);
    }
}

#[test]
fn drag_from_empty_canvas_selects_overlapped_items() {
    let mut store = two_box_store();
    drag(&mut store, (40.0, 40.0), (12.0, 12.0));
    assert_eq!(selected_texts(&store), vec!["B"]);

    store.clear_selection();
    drag(&mut store, (40.0, 40.0), (-1.0, -1.0));
    assert_eq!(selected_texts(&store), vec!["A", "B"]);
}

#[test]
fn pressing_on_an_item_clicks_instead_of_dragging() {
    let mut store = two_box_store();
    drag(&mut store, (5.0, 5.0), (30.0, 30.0));
    assert_eq!(selected_texts(&store), vec!["A"]);
    assert!(store.drag_rect().is_none());
}

#[test]
fn drag_selection_is_a_union() {
    let mut store = two_box_store();
    let a = store.text_items()[0].id.clone();
    store.click_text_item(&a, false);
    drag(&mut store, (40.0, 40.0), (25.0, 25.0));
    assert_eq!(selected_texts(&store), vec!["A", "B"]);
    assert_eq!(
        store.selection_bounds(),
        Some(Rect::new(0.0, 0.0, 30.0, 30.0))
    );
}

#[test]
fn toggling_twice_restores_selection() {
    let mut store = two_box_store();
    let a = store.text_items()[0].id.clone();
    let b = store.text_items()[1].id.clone();
    store.click_text_item(&a, false);
    let before = store.selection().clone();

    store.click_text_item(&b, true);
    store.click_text_item(&b, true);
    assert_eq!(store.selection(), &before);
}

#[test]
fn color_extraction_examples() {
    let store = load(vec![vec![
        run_at("red", 0.0, 0.0, 10.0, 10.0).with_color(vec![1.0, 0.0, 0.0]),
        run_at("gray", 0.0, 20.0, 10.0, 10.0).with_color(vec![0.5]),
        run_at("plain", 0.0, 40.0, 10.0, 10.0),
    ]]);
    let colors: Vec<String> = store
        .text_items()
        .iter()
        .map(|i| i.color.to_hex())
        .collect();
    assert_eq!(colors, vec!["#ff0000", "#7f7f7f", "#000000"]);
}

#[test]
fn history_cap_keeps_last_fifty() {
    let mut history = History::new(EngineConfig::default().history_limit);
    for n in 0..60 {
        history.push(n);
    }
    assert_eq!(history.len(), 50);
    assert_eq!(history.cursor(), 49);
    assert_eq!(history.entries()[0], 10);
}

#[test]
fn store_history_is_capped() {
    let mut store = two_box_store();
    let id = store.text_items()[0].id.clone();
    for n in 0..60 {
        let patch = TextItemPatch {
            text: Some(format!("edit {}", n)),
            ..Default::default()
        };
        assert!(store.update_text_item(&id, &patch));
    }
    assert_eq!(store.history().len(), 50);
    assert_eq!(store.history().cursor(), 49);

    let mut undos = 0;
    while store.undo() {
        undos += 1;
    }
    assert_eq!(undos, 49);
    assert_eq!(store.text_item(&id).unwrap().text, "edit 10");
}

#[test]
fn undo_redo_round_trip() {
    let mut store = two_box_store();
    let mut states: Vec<Snapshot> = vec![store.snapshot()];
    for n in 0..5 {
        let layer = Layer::new(
            LayerKind::Shape,
            0,
            Rect::new(n as f64 * 10.0, 100.0, 5.0, 5.0),
        );
        store.add_layer(layer).unwrap();
        states.push(store.snapshot());
    }

    for _ in 0..states.len() - 1 {
        assert!(store.undo());
    }
    assert!(!store.undo());
    assert_eq!(store.snapshot(), states[0]);

    for _ in 0..states.len() - 1 {
        assert!(store.redo());
    }
    assert!(!store.redo());
    assert_eq!(&store.snapshot(), states.last().unwrap());
}

#[test]
fn restored_state_does_not_alias_history() {
    let mut store = two_box_store();
    let id = store.text_items()[0].id.clone();
    store.update_text_item(
        &id,
        &TextItemPatch {
            text: Some("first".to_string()),
            ..Default::default()
        },
    );
    store.update_text_item(
        &id,
        &TextItemPatch {
            text: Some("second".to_string()),
            ..Default::default()
        },
    );
    store.undo();
    assert_eq!(store.text_item(&id).unwrap().text, "first");

    // Editing after undo must not rewrite the stored "first" entry
    store.update_text_item(
        &id,
        &TextItemPatch {
            text: Some("third".to_string()),
            ..Default::default()
        },
    );
    assert_eq!(store.history().entries()[1].text_items[0].text, "first");
    assert!(!store.can_redo());
}

#[test]
fn deleting_unknown_layer_is_byte_identical() {
    let mut store = two_box_store();
    store
        .add_layer(Layer::new(LayerKind::Image, 0, Rect::new(1.0, 2.0, 3.0, 4.0)))
        .unwrap();
    let before = serde_json::to_string(store.layers()).unwrap();
    let cursor = store.history().cursor();

    assert!(!store.delete_layer(LayerId(12345)));
    assert_eq!(serde_json::to_string(store.layers()).unwrap(), before);
    assert_eq!(store.history().cursor(), cursor);
}

#[test]
fn delete_keeps_relative_order() {
    let mut store = two_box_store();
    let ids: Vec<LayerId> = (0..4)
        .map(|n| {
            store
                .add_layer(Layer::new(
                    LayerKind::Shape,
                    0,
                    Rect::new(n as f64, 0.0, 1.0, 1.0),
                ))
                .unwrap()
        })
        .collect();
    assert!(store.delete_layer(ids[1]));
    let remaining: Vec<LayerId> = store.layers().iter().map(|l| l.id).collect();
    assert_eq!(remaining, vec![ids[0], ids[2], ids[3]]);
}

#[test]
fn update_layer_is_shallow_merge() {
    let mut store = two_box_store();
    let mut layer = Layer::new(LayerKind::Text, 0, Rect::new(10.0, 10.0, 100.0, 20.0))
        .with_content("Draft");
    layer.style.font_size = Some(16.0);
    let id = store.add_layer(layer).unwrap();

    let patch: LayerPatch = serde_json::from_str(r##"{"x": 50, "fontColor": "#336699"}"##).unwrap();
    assert!(store.update_layer(id, &patch));

    let updated = store.layer(id).unwrap();
    assert_eq!(updated.x, 50.0);
    assert_eq!(updated.y, 10.0);
    assert_eq!(updated.content, "Draft");
    assert_eq!(updated.style.font_size, Some(16.0));
    assert_eq!(updated.style.font_color, Some(Color::rgb(0x33, 0x66, 0x99)));
}

#[test]
fn failed_load_leaves_store_untouched() {
    let mut store = two_box_store();
    store
        .add_layer(Layer::new(LayerKind::Shape, 0, Rect::default()))
        .unwrap();
    let before = store.snapshot();

    let pages = vec![vec![run_at("X", 0.0, 0.0, 5.0, 5.0)]; 3];
    let mut fixture = Fixture::new(pages.clone());
    fixture.fail_on = Some(2);
    let err = store
        .load_document(&mut fixture, &mut Runs(pages))
        .unwrap_err();

    assert!(matches!(err, DocEditError::Extraction { page: 2, .. }));
    assert_eq!(store.snapshot(), before);
    assert_eq!(store.page_count(), 1);
}

#[test]
fn reload_replaces_document_and_ids() {
    let mut store = two_box_store();
    let pages = vec![vec![run_at("New", 0.0, 0.0, 5.0, 5.0)]];
    let mut fixture = Fixture::new(pages.clone());
    store.load_document(&mut fixture, &mut Runs(pages)).unwrap();

    assert_eq!(store.text_items().len(), 1);
    assert_eq!(store.text_items()[0].id, TextItemId::from("text-1-0-2"));
    assert_eq!(store.history().cursor(), 0);
}

#[test]
fn replayed_commands_match_direct_calls() {
    let script = r##"[
        {"type": "addLayer", "layer": {"type": "annotation", "page": 0, "x": 0, "y": 0,
            "width": 10, "height": 10, "annotationType": "redaction"}},
        {"type": "updateTextItem", "id": "text-1-0-1", "patch": {"text": "Alpha"}},
        {"type": "deleteTextItems", "ids": ["text-1-1-1"]},
        {"type": "undo"}
    ]"##;
    let commands: Vec<EditCommand> = serde_json::from_str(script).unwrap();
    let mut store = two_box_store();
    for command in commands {
        store.execute(command).unwrap();
    }

    let texts: Vec<&str> = store.text_items().iter().map(|i| i.text.as_str()).collect();
    assert_eq!(texts, vec!["Alpha", "B"]);
    assert_eq!(store.layers().len(), 1);
    assert_eq!(
        store.layers()[0].style.annotation_color,
        Some(Color::rgb(255, 255, 0))
    );
}
