#![allow(clippy::float_cmp)]

use std::cell::RefCell;

use super::*;
use crate::consts::ID_ATTR;
use crate::export::ResvgRasterizer;
use crate::tree::collect_ids;

const DOC: &str = r#"<svg width="100" height="100"><rect id="r1" width="10" height="10"/><rect id="r2" width="5" height="5"/><text id="t">hello</text></svg>"#;

fn engine() -> EngineCore {
    let mut engine = EngineCore::new();
    engine.import_text(DOC);
    engine
}

fn plain() -> Modifiers {
    Modifiers::default()
}

fn ctrl() -> Modifiers {
    Modifiers { ctrl: true, ..Modifiers::default() }
}

fn ctrl_shift() -> Modifiers {
    Modifiers { ctrl: true, shift: true, ..Modifiers::default() }
}

fn attr(engine: &EngineCore, id: &str, key: &str) -> Option<String> {
    engine.node(id).and_then(|n| n.attr(key)).map(str::to_owned)
}

fn markup(engine: &EngineCore) -> String {
    engine.markup().unwrap()
}

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

struct FailingRasterizer;

impl Rasterizer for FailingRasterizer {
    fn rasterize(&self, _svg: &str, _options: &RasterOptions) -> Result<Vec<u8>, RasterError> {
        Err(RasterError::Decode("boom".into()))
    }
}

/// Records what it was asked to rasterize.
#[derive(Default)]
struct RecordingRasterizer {
    calls: RefCell<Vec<(String, RasterOptions)>>,
}

impl Rasterizer for RecordingRasterizer {
    fn rasterize(&self, svg: &str, options: &RasterOptions) -> Result<Vec<u8>, RasterError> {
        self.calls.borrow_mut().push((svg.to_owned(), *options));
        Ok(b"png".to_vec())
    }
}

// =============================================================
// Import
// =============================================================

#[test]
fn import_resets_history_and_selection() {
    let mut engine = engine();
    engine.click("r1", plain());
    let actions = engine.import_text(DOC);
    assert_eq!(actions, [Action::RenderNeeded, Action::SelectionChanged, Action::HistoryChanged]);
    assert_eq!(engine.history().len(), 1);
    assert!(engine.selection().is_empty());
    assert!(!engine.can_undo());
    assert!(engine.message().is_none());
}

#[test]
fn failed_import_clears_everything() {
    let mut engine = engine();
    engine.click("r1", plain());
    let actions = engine.import_text("<div>no drawing here</div>");
    assert!(actions.contains(&Action::Message("no svg tag found".into())));
    assert!(engine.root().is_none());
    assert!(engine.history().is_empty());
    assert!(engine.selection().is_empty());
    assert_eq!(engine.message(), Some("no svg tag found"));
    assert!(engine.markup().is_none());
    assert!(engine.svg_file().is_none());
}

#[test]
fn malformed_import_shows_same_message() {
    let mut engine = engine();
    engine.import_text("<svg><rect></svg>");
    assert_eq!(engine.message(), Some("no svg tag found"));
    assert!(engine.root().is_none());
}

#[test]
fn successful_import_clears_message() {
    let mut engine = EngineCore::new();
    engine.import_text("nothing");
    engine.import_text(DOC);
    assert!(engine.message().is_none());
}

#[test]
fn upload_of_other_file_keeps_document() {
    let mut engine = engine();
    let before = markup(&engine);
    let actions = engine.import_file("photo.png", "image/png", b"\x89PNG");
    assert!(matches!(actions.as_slice(), [Action::Message(_)]));
    assert_eq!(markup(&engine), before);
    assert!(engine.message().unwrap().contains("photo.png"));
}

#[test]
fn upload_of_svg_file_imports() {
    let mut engine = EngineCore::new();
    engine.import_file("a.svg", "", DOC.as_bytes());
    assert!(engine.node("r1").is_some());
}

// =============================================================
// Attribute edits
// =============================================================

#[test]
fn fill_edit_writes_attribute_and_style() {
    let mut engine = engine();
    engine.click("r1", plain());
    let actions = engine.set_attribute("fill", "#ff0000");
    assert_eq!(actions, [Action::RenderNeeded, Action::HistoryChanged]);
    assert_eq!(attr(&engine, "r1", "fill").as_deref(), Some("#ff0000"));
    assert_eq!(attr(&engine, "r1", "style").as_deref(), Some("fill: #ff0000"));
    assert_eq!(engine.history().len(), 2);
}

#[test]
fn edit_applies_to_every_selected_node_only() {
    let mut engine = engine();
    engine.click("r1", ctrl());
    engine.click("r2", ctrl());
    engine.set_attribute("opacity", "0.5");
    assert_eq!(attr(&engine, "r1", "opacity").as_deref(), Some("0.5"));
    assert_eq!(attr(&engine, "r2", "opacity").as_deref(), Some("0.5"));
    assert_eq!(attr(&engine, "t", "opacity"), None);
    assert!(engine.root().unwrap().attr("opacity").is_none());
    assert_eq!(engine.history().len(), 2);
}

#[test]
fn edit_with_nothing_selected_is_ignored() {
    let mut engine = engine();
    assert!(engine.set_attribute("fill", "red").is_empty());
    assert!(engine.set_color("fill", "red", 0.0).is_empty());
    assert!(engine.set_rotation(10.0).is_empty());
    assert_eq!(engine.history().len(), 1);
}

#[test]
fn empty_value_removes_attribute() {
    let mut engine = engine();
    engine.click("r1", plain());
    engine.set_attribute("stroke", "blue");
    engine.set_attribute("stroke", "");
    assert_eq!(attr(&engine, "r1", "stroke"), None);
    assert_eq!(attr(&engine, "r1", "style"), None);
}

#[test]
fn rotation_keeps_translate() {
    let mut engine = engine();
    engine.click("r1", plain());
    engine.set_attribute("transform", "translate(4 5) rotate(10)");
    engine.set_rotation(45.0);
    assert_eq!(attr(&engine, "r1", "transform").as_deref(), Some("translate(4 5) rotate(45)"));
    engine.clear_selection();
    engine.click("r1", plain());
    assert_eq!(engine.controls().rotation, 45.0);
}

#[test]
fn text_edit_replaces_first_leaf() {
    let mut engine = engine();
    engine.click("t", plain());
    assert_eq!(engine.controls().text, "hello");
    engine.set_text("bye");
    assert!(markup(&engine).contains("<text id=\"t\">bye</text>"));
    engine.clear_selection();
    engine.click("t", plain());
    assert_eq!(engine.controls().text, "bye");
}

#[test]
fn text_edit_adds_leaf_with_unique_id() {
    let mut engine = engine();
    engine.click("r1", plain());
    engine.set_text("label");
    let root = engine.root().unwrap();
    assert_eq!(collect_ids(root).len(), tree::count_nodes(root));
    assert_eq!(engine.node("r1").unwrap().text_content(), Some("label"));
}

// =============================================================
// Coalesced history
// =============================================================

#[test]
fn color_burst_commits_once_after_quiet_period() {
    let mut engine = engine();
    engine.click("r1", plain());
    for i in 0..10 {
        let value = format!("#0000{i:02}");
        assert_eq!(engine.set_color("fill", &value, f64::from(i) * 10.0), [Action::RenderNeeded]);
    }
    assert_eq!(attr(&engine, "r1", "fill").as_deref(), Some("#000009"));
    assert_eq!(engine.history().len(), 1);
    assert_eq!(engine.pending_deadline(), Some(590.0));
    assert!(engine.can_undo());

    assert!(engine.poll_history(589.0).is_empty());
    assert_eq!(engine.poll_history(590.0), [Action::HistoryChanged]);
    assert_eq!(engine.history().len(), 2);
    assert!(engine.poll_history(5000.0).is_empty());
}

#[test]
fn undo_during_burst_flushes_first() {
    let mut engine = engine();
    engine.click("r1", plain());
    engine.set_color("fill", "#123456", 0.0);
    engine.undo();
    assert_eq!(attr(&engine, "r1", "fill"), None);
    assert!(engine.pending_deadline().is_none());
    engine.redo();
    assert_eq!(attr(&engine, "r1", "fill").as_deref(), Some("#123456"));
}

#[test]
fn immediate_commit_flushes_pending_color_first() {
    let mut engine = engine();
    engine.click("r1", plain());
    engine.set_color("fill", "#123456", 0.0);
    engine.set_attribute("opacity", "0.5");
    assert_eq!(engine.history().len(), 3);
    engine.undo();
    assert_eq!(attr(&engine, "r1", "fill").as_deref(), Some("#123456"));
    assert_eq!(attr(&engine, "r1", "opacity"), None);
}

#[test]
fn cancelled_burst_leaves_history_alone() {
    let mut engine = engine();
    engine.click("r1", plain());
    engine.set_color("fill", "#123456", 0.0);
    assert!(engine.cancel_pending_history());
    assert!(!engine.flush_pending_history());
    assert_eq!(engine.history().len(), 1);
}

#[test]
fn flush_commits_pending_burst() {
    let mut engine = engine();
    engine.click("r1", plain());
    engine.set_color("stroke", "#abcdef", 0.0);
    assert!(!engine.can_redo());
    assert!(engine.flush_pending_history());
    assert_eq!(engine.history().len(), 2);
}

// =============================================================
// Undo / redo
// =============================================================

#[test]
fn undo_then_redo_round_trips_markup() {
    let mut engine = engine();
    let before = markup(&engine);
    engine.click("r1", plain());
    engine.set_attribute("fill", "green");
    let after = markup(&engine);

    assert_eq!(engine.undo(), [Action::RenderNeeded, Action::HistoryChanged]);
    assert_eq!(markup(&engine), before);
    assert!(engine.can_redo());
    engine.redo();
    assert_eq!(markup(&engine), after);
    assert!(engine.redo().is_empty());
}

#[test]
fn new_edit_after_undo_drops_redo() {
    let mut engine = engine();
    engine.click("r1", plain());
    engine.set_attribute("fill", "green");
    engine.undo();
    engine.set_attribute("fill", "blue");
    assert!(!engine.can_redo());
    assert!(engine.redo().is_empty());
}

#[test]
fn undo_at_start_does_nothing() {
    let mut engine = engine();
    assert!(engine.undo().is_empty());
    assert!(EngineCore::new().undo().is_empty());
}

#[test]
fn undo_prunes_vanished_selection() {
    let mut engine = engine();
    engine.click("r1", plain());
    engine.duplicate_selected();
    assert_eq!(engine.selection().ids(), ["r1-copy"]);
    let actions = engine.undo();
    assert!(actions.contains(&Action::SelectionChanged));
    assert!(engine.selection().is_empty());
}

// =============================================================
// Structural edits
// =============================================================

#[test]
fn delete_removes_selection_and_returns_to_root() {
    let mut engine = engine();
    engine.click("r1", ctrl());
    engine.click("t", ctrl());
    let actions = engine.delete_selected();
    assert!(actions.contains(&Action::SelectionChanged));
    assert!(engine.node("r1").is_none());
    assert!(engine.node("t").is_none());
    assert!(engine.node("r2").is_some());
    assert!(engine.selection().is_empty());
    engine.undo();
    assert!(engine.node("r1").is_some());
}

#[test]
fn delete_with_nothing_selected_keeps_root() {
    let mut engine = engine();
    assert!(engine.delete_selected().is_empty());
    assert!(engine.root().is_some());
}

#[test]
fn duplicate_inserts_copy_after_original() {
    let mut engine = engine();
    engine.click("r1", plain());
    let before = tree::count_nodes(engine.root().unwrap());
    engine.duplicate_selected();

    let root = engine.root().unwrap();
    assert_eq!(tree::count_nodes(root), before + 1);
    assert_eq!(root.children[1].id, "r1-copy");
    assert_eq!(engine.selection().ids(), ["r1-copy"]);

    let strip = |n: &Node| {
        let mut attrs = n.attributes.clone();
        attrs.remove(ID_ATTR);
        attrs.remove("id");
        attrs
    };
    assert_eq!(strip(&root.children[0]), strip(&root.children[1]));
    assert_eq!(root.children[1].attr("id"), Some("r1-copy"));
}

#[test]
fn repeated_duplicates_stay_unique() {
    let mut engine = engine();
    engine.click("t", plain());
    for _ in 0..3 {
        engine.duplicate_selected();
    }
    engine.click("t", plain());
    engine.duplicate_selected();
    let root = engine.root().unwrap();
    assert_eq!(collect_ids(root).len(), tree::count_nodes(root));
    assert_eq!(engine.selection().ids(), ["t-copy-2"]);
}

#[test]
fn group_then_ungroup_restores_markup() {
    let mut engine = engine();
    let before = markup(&engine);
    engine.click("r2", plain());
    engine.group_selected();

    let group_id = engine.selection().first().unwrap().to_owned();
    let group = engine.node(&group_id).unwrap();
    assert_eq!(group.tag, "g");
    assert_eq!(group.children[0].id, "r2");
    assert_eq!(engine.root().unwrap().children[1].id, group_id);

    engine.ungroup_selected();
    assert_eq!(engine.selection().ids(), ["r2"]);
    assert_eq!(markup(&engine), before);
    assert_eq!(engine.history().len(), 3);
}

#[test]
fn ungroup_of_non_group_is_ignored() {
    let mut engine = engine();
    engine.click("r1", plain());
    assert!(engine.ungroup_selected().is_empty());
    assert_eq!(engine.history().len(), 1);
}

// =============================================================
// Selection
// =============================================================

#[test]
fn plain_click_toggles_sole_selection() {
    let mut engine = engine();
    assert_eq!(engine.click("r1", plain()), [Action::SelectionChanged, Action::RenderNeeded]);
    assert_eq!(engine.selection().ids(), ["r1"]);
    engine.click("r1", plain());
    assert!(engine.selection().is_empty());
}

#[test]
fn clicks_on_root_are_ignored() {
    let mut engine = engine();
    let root_id = engine.root().unwrap().id.clone();
    assert!(engine.click(&root_id, plain()).is_empty());
    assert!(engine.selection().is_empty());
}

#[test]
fn select_all_toggles() {
    let mut engine = engine();
    engine.select_all();
    assert_eq!(engine.selection().ids(), ["r1", "r2", "t"]);
    engine.select_all();
    assert!(engine.selection().is_empty());
}

#[test]
fn controls_follow_selection() {
    let mut engine = engine();
    engine.click("r1", plain());
    engine.set_attribute("stroke-width", "4");
    engine.click("r2", plain());
    assert_eq!(engine.controls().stroke_width, 1.0);
    engine.click("r1", plain());
    assert_eq!(engine.controls().stroke_width, 4.0);
    engine.clear_selection();
    assert_eq!(engine.controls(), &ControlValues::default());
}

#[test]
fn edits_leave_controls_until_selection_changes() {
    let mut engine = engine();
    engine.click("r1", plain());
    let shown = engine.controls().clone();

    engine.set_color("fill", "#00ff00", 0.0);
    assert_eq!(engine.controls(), &shown);
    engine.poll_history(1_000.0);
    engine.set_attribute("stroke-width", "7");
    engine.undo();
    assert_eq!(engine.controls(), &shown);

    engine.clear_selection();
    engine.click("r1", plain());
    assert_eq!(engine.controls().fill, "#00ff00");
    assert_eq!(engine.controls().stroke_width, 1.0);
}

// =============================================================
// Pointer gestures
// =============================================================

#[test]
fn drag_moves_node_and_commits_once() {
    let mut engine = engine();
    engine.on_pointer_down(Some("r1"), pt(0.0, 0.0), Button::Primary);
    assert!(engine.on_pointer_move(pt(2.0, 2.0)).is_empty());
    assert!(matches!(engine.input(), InputState::Pressed(_)));

    assert_eq!(engine.on_pointer_move(pt(20.0, 10.0)), [Action::RenderNeeded]);
    assert!(matches!(engine.input(), InputState::Dragging(_)));
    assert_eq!(attr(&engine, "r1", "transform").as_deref(), Some("translate(20 10)"));
    assert_eq!(engine.history().len(), 1);

    engine.on_pointer_move(pt(25.0, 10.0));
    let actions = engine.on_pointer_up(pt(30.0, 10.0), plain());
    assert_eq!(actions, [Action::RenderNeeded, Action::HistoryChanged]);
    assert_eq!(attr(&engine, "r1", "transform").as_deref(), Some("translate(30 10)"));
    assert_eq!(engine.history().len(), 2);
    assert_eq!(engine.input(), &InputState::Idle);
    assert!(engine.selection().is_empty());
}

#[test]
fn drag_composes_onto_existing_transform() {
    let mut engine = engine();
    engine.click("r1", plain());
    engine.set_rotation(45.0);
    engine.on_pointer_down(Some("r1"), pt(0.0, 0.0), Button::Primary);
    engine.on_pointer_up(pt(10.0, 0.0), plain());
    assert_eq!(attr(&engine, "r1", "transform").as_deref(), Some("rotate(45) translate(10 0)"));
}

#[test]
fn drag_delta_is_scaled_by_zoom() {
    let mut engine = engine();
    engine.set_zoom(2.0);
    engine.on_pointer_down(Some("r2"), pt(0.0, 0.0), Button::Primary);
    engine.on_pointer_up(pt(20.0, 10.0), plain());
    assert_eq!(attr(&engine, "r2", "transform").as_deref(), Some("translate(10 5)"));
}

#[test]
fn drag_is_undone_in_one_step() {
    let mut engine = engine();
    let before = markup(&engine);
    engine.on_pointer_down(Some("r1"), pt(0.0, 0.0), Button::Primary);
    for x in 1..=10 {
        engine.on_pointer_move(pt(f64::from(x) * 3.0, 0.0));
    }
    engine.on_pointer_up(pt(30.0, 0.0), plain());
    engine.undo();
    assert_eq!(markup(&engine), before);
}

#[test]
fn drag_after_pending_color_keeps_both_undo_steps() {
    let mut engine = engine();
    engine.click("r1", plain());
    engine.set_color("fill", "#ff0000", 0.0);

    assert_eq!(engine.on_pointer_down(Some("r1"), pt(0.0, 0.0), Button::Primary), [Action::HistoryChanged]);
    assert!(engine.pending_deadline().is_none());
    engine.on_pointer_move(pt(20.0, 0.0));
    engine.on_pointer_up(pt(30.0, 0.0), plain());
    assert_eq!(engine.history().len(), 3);

    engine.undo();
    assert_eq!(attr(&engine, "r1", "transform"), None);
    assert_eq!(attr(&engine, "r1", "fill").as_deref(), Some("#ff0000"));
    engine.undo();
    assert_eq!(attr(&engine, "r1", "fill"), None);
}

#[test]
fn timer_firing_mid_drag_snapshots_nothing() {
    let mut engine = engine();
    engine.click("r1", plain());
    engine.set_color("fill", "#ff0000", 0.0);
    engine.on_pointer_down(Some("r1"), pt(0.0, 0.0), Button::Primary);
    engine.on_pointer_move(pt(20.0, 0.0));
    assert!(engine.poll_history(600.0).is_empty());
    engine.on_pointer_up(pt(30.0, 0.0), plain());

    engine.undo();
    assert_eq!(attr(&engine, "r1", "transform"), None);
    assert_eq!(attr(&engine, "r1", "fill").as_deref(), Some("#ff0000"));
}

#[test]
fn press_during_unfinished_drag_commits_partial_move() {
    let mut engine = engine();
    engine.on_pointer_down(Some("r1"), pt(0.0, 0.0), Button::Primary);
    engine.on_pointer_move(pt(20.0, 0.0));

    let actions = engine.on_pointer_down(Some("r2"), pt(50.0, 50.0), Button::Primary);
    assert_eq!(actions, [Action::RenderNeeded, Action::HistoryChanged]);
    assert_eq!(engine.history().len(), 2);
    assert!(matches!(engine.input(), InputState::Pressed(_)));
    engine.on_pointer_up(pt(50.0, 50.0), plain());

    engine.set_attribute("opacity", "0.5");
    engine.undo();
    assert_eq!(attr(&engine, "r2", "opacity"), None);
    assert_eq!(attr(&engine, "r1", "transform").as_deref(), Some("translate(20 0)"));
    engine.undo();
    assert_eq!(attr(&engine, "r1", "transform"), None);
}

#[test]
fn press_release_in_place_is_a_click() {
    let mut engine = engine();
    engine.on_pointer_down(Some("r1"), pt(5.0, 5.0), Button::Primary);
    engine.on_pointer_move(pt(6.0, 6.0));
    let actions = engine.on_pointer_up(pt(6.0, 6.0), ctrl());
    assert!(actions.contains(&Action::SelectionChanged));
    assert_eq!(engine.selection().ids(), ["r1"]);
    assert_eq!(attr(&engine, "r1", "transform"), None);
    assert_eq!(engine.history().len(), 1);
}

#[test]
fn non_primary_and_root_presses_start_nothing() {
    let mut engine = engine();
    engine.on_pointer_down(Some("r1"), pt(0.0, 0.0), Button::Secondary);
    assert_eq!(engine.input(), &InputState::Idle);
    let root_id = engine.root().unwrap().id.clone();
    engine.on_pointer_down(Some(&root_id), pt(0.0, 0.0), Button::Primary);
    assert_eq!(engine.input(), &InputState::Idle);
    engine.on_pointer_down(None, pt(0.0, 0.0), Button::Primary);
    assert!(engine.on_pointer_move(pt(50.0, 50.0)).is_empty());
    assert!(engine.on_pointer_up(pt(50.0, 50.0), plain()).is_empty());
}

#[test]
fn zoom_is_clamped() {
    let mut engine = EngineCore::new();
    assert_eq!(engine.set_zoom(100.0), 10.0);
    assert_eq!(engine.set_zoom(0.0), 0.1);
    assert_eq!(engine.zoom(), 0.1);
}

// =============================================================
// Keyboard
// =============================================================

#[test]
fn delete_keys_remove_selection() {
    for key in ["Delete", "Backspace"] {
        let mut engine = engine();
        engine.click("r1", plain());
        engine.on_key_down(&Key::new(key), plain());
        assert!(engine.node("r1").is_none(), "{key}");
    }
}

#[test]
fn undo_redo_shortcuts() {
    let mut engine = engine();
    engine.click("r1", plain());
    engine.set_attribute("fill", "red");
    engine.on_key_down(&Key::new("z"), ctrl());
    assert_eq!(attr(&engine, "r1", "fill"), None);
    engine.on_key_down(&Key::new("Z"), ctrl_shift());
    assert_eq!(attr(&engine, "r1", "fill").as_deref(), Some("red"));
    engine.on_key_down(&Key::new("z"), Modifiers { meta: true, ..Modifiers::default() });
    engine.on_key_down(&Key::new("y"), ctrl());
    assert_eq!(attr(&engine, "r1", "fill").as_deref(), Some("red"));
}

#[test]
fn structural_shortcuts() {
    let mut engine = engine();
    engine.click("r1", plain());
    engine.on_key_down(&Key::new("d"), ctrl());
    assert!(engine.node("r1-copy").is_some());

    engine.on_key_down(&Key::new("g"), ctrl());
    let group_id = engine.selection().first().unwrap().to_owned();
    assert_eq!(engine.node(&group_id).unwrap().tag, "g");

    engine.on_key_down(&Key::new("G"), ctrl_shift());
    assert!(engine.node(&group_id).is_none());
    assert_eq!(engine.selection().ids(), ["r1-copy"]);
}

#[test]
fn select_all_and_escape_shortcuts() {
    let mut engine = engine();
    engine.on_key_down(&Key::new("a"), ctrl());
    assert_eq!(engine.selection().len(), 3);
    engine.on_key_down(&Key::new("Escape"), plain());
    assert!(engine.selection().is_empty());
}

#[test]
fn unbound_keys_do_nothing() {
    let mut engine = engine();
    engine.click("r1", plain());
    assert!(engine.on_key_down(&Key::new("d"), plain()).is_empty());
    assert!(engine.on_key_down(&Key::new("q"), ctrl()).is_empty());
    assert!(engine.on_key_down(&Key::new("Shift"), plain()).is_empty());
}

// =============================================================
// Export
// =============================================================

#[test]
fn svg_download_uses_configured_name() {
    let config = EditorConfig { export_basename: "poster".into(), ..EditorConfig::default() };
    let mut engine = EngineCore::with_config(config);
    engine.import_text(DOC);
    let file = engine.svg_file().unwrap();
    assert_eq!(file.filename, "poster.svg");
    assert_eq!(file.bytes, markup(&engine).into_bytes());
    assert!(!markup(&engine).contains(ID_ATTR));
}

#[test]
fn png_download_passes_markup_and_options() {
    let mut engine = engine();
    let rasterizer = RecordingRasterizer::default();
    let file = engine.png_file(&rasterizer).unwrap().unwrap();
    assert_eq!(file.filename, "drawing.png");
    assert_eq!(file.bytes, b"png");

    let calls = rasterizer.calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, markup(&engine));
    assert_eq!(
        calls[0].1,
        RasterOptions { background: (255, 255, 255), fallback_size: (800, 600), max_pixels: 67_108_864 }
    );
}

#[test]
fn png_failure_sets_message() {
    let mut engine = engine();
    let err = engine.png_file(&FailingRasterizer).unwrap_err();
    assert_eq!(err.error_code(), "E_RASTER_DECODE");
    assert!(engine.message().unwrap().contains("boom"));
}

#[test]
fn oversized_png_export_fails_with_message() {
    let config = EditorConfig { raster_max_pixels: 50, ..EditorConfig::default() };
    let mut engine = EngineCore::with_config(config);
    engine.import_text(DOC);
    let err = engine.png_file(&ResvgRasterizer::without_fonts()).unwrap_err();
    assert_eq!(err.error_code(), "E_RASTER_SURFACE");
    assert!(engine.message().unwrap().contains("100x100"));
    assert!(engine.root().is_some());
}

#[test]
fn png_without_document_is_none() {
    let mut engine = EngineCore::new();
    assert!(engine.png_file(&FailingRasterizer).unwrap().is_none());
}

// =============================================================
// Collaborators
// =============================================================

struct Rejecting;

impl Sanitizer for Rejecting {
    fn sanitize(&self, _raw: &str) -> Result<String, ParseError> {
        Ok("<div/>".to_owned())
    }
}

#[test]
fn custom_sanitizer_is_used() {
    let mut engine = EngineCore::with_sanitizer(EditorConfig::default(), Box::new(Rejecting));
    engine.import_text(DOC);
    assert!(engine.root().is_none());
    assert_eq!(engine.message(), Some("no svg tag found"));
}
