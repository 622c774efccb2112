//! Editing engine: owns the live tree, history, selection and gesture state.
//!
//! DESIGN
//! ======
//! Every visible edit goes through one of two paths:
//!
//! - **Immediate commit** (`set_attribute`, `set_rotation`, `set_text`, `delete_selected`,
//!   `duplicate_selected`, `group_selected`, `ungroup_selected`, drag release): the new
//!   root is applied and exactly one snapshot is pushed.
//! - **Coalesced** (`set_color`): the new root is applied at once for live feedback, and
//!   the snapshot is deferred behind a [`Debounce`] deadline that each call re-arms. The
//!   host drives the clock: it calls [`EngineCore::poll_history`] once the deadline from
//!   [`EngineCore::pending_deadline`] has passed.
//!
//! A pending coalesced snapshot is flushed before any immediate commit, undo or redo, so
//! snapshots land in edit order and a gesture is never lost. Pressing the pointer flushes
//! it too, so a drag always starts from a committed tree. Handlers return [`Action`]s
//! describing what the host should refresh.
//!
//! Control values are derived from the first selected node only when the selection
//! changes. Edits leave them alone, since the control that made the edit already shows
//! the new value.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use std::rc::Rc;

use crate::config::EditorConfig;
use crate::error::ErrorCode;
use crate::export::{self, ExportFile, RasterError, RasterOptions, Rasterizer};
use crate::history::{Debounce, History};
use crate::import::{self, ParseError};
use crate::input::{Button, DragState, InputState, Key, Modifiers, Point};
use crate::sanitize::{Sanitizer, SvgSanitizer};
use crate::selection::{ControlValues, Selection};
use crate::style;
use crate::transform;
use crate::tree::{self, IdGen, Node, NodeId, NodeRef};

/// Actions returned from engine operations for the host to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// The live tree changed; re-render it.
    RenderNeeded,
    /// The selection (and with it the control values) changed.
    SelectionChanged,
    /// History gained, lost or moved between entries; refresh undo/redo affordances.
    HistoryChanged,
    /// A user-visible message to display.
    Message(String),
}

/// Core engine state. Has no browser dependencies, so it is tested natively.
pub struct EngineCore {
    config: EditorConfig,
    sanitizer: Box<dyn Sanitizer>,
    ids: IdGen,
    root: Option<NodeRef>,
    history: History,
    debounce: Debounce,
    selection: Selection,
    controls: ControlValues,
    input: InputState,
    zoom: f64,
    message: Option<String>,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EditorConfig::default())
    }

    #[must_use]
    pub fn with_config(config: EditorConfig) -> Self {
        Self::with_sanitizer(config, Box::new(SvgSanitizer))
    }

    /// Engine with a custom sanitizer collaborator.
    #[must_use]
    pub fn with_sanitizer(config: EditorConfig, sanitizer: Box<dyn Sanitizer>) -> Self {
        Self {
            debounce: Debounce::new(config.history_debounce_ms),
            config,
            sanitizer,
            ids: IdGen::new(),
            root: None,
            history: History::new(),
            selection: Selection::new(),
            controls: ControlValues::default(),
            input: InputState::Idle,
            zoom: 1.0,
            message: None,
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// The live tree, if a document is loaded.
    #[must_use]
    pub fn root(&self) -> Option<&NodeRef> {
        self.root.as_ref()
    }

    /// Look up a node in the live tree.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&NodeRef> {
        self.root.as_ref().and_then(|root| tree::find(root, id))
    }

    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    #[must_use]
    pub fn controls(&self) -> &ControlValues {
        &self.controls
    }

    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo() || self.debounce.is_pending()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.debounce.is_pending() && self.history.can_redo()
    }

    /// When the pending coalesced snapshot is due, on the host's clock.
    #[must_use]
    pub fn pending_deadline(&self) -> Option<f64> {
        self.debounce.deadline()
    }

    #[must_use]
    pub fn input(&self) -> &InputState {
        &self.input
    }

    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Last user-visible message (parse or raster failure).
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn clear_message(&mut self) {
        self.message = None;
    }

    // --- Import ---

    /// Replace the document with `raw` markup.
    ///
    /// On success history is reset to the new tree and the selection is cleared. On a
    /// parse failure the tree, history and selection are all cleared and a message is
    /// set; nothing propagates to the caller.
    pub fn import_text(&mut self, raw: &str) -> Vec<Action> {
        self.debounce.cancel();
        self.input = InputState::Idle;
        match import::import_tree(raw, self.sanitizer.as_ref(), &mut self.ids) {
            Ok(root) => {
                tracing::info!(nodes = tree::count_nodes(&root), "imported document");
                self.history.reset(Rc::clone(&root));
                self.root = Some(root);
                self.message = None;
                self.selection.clear();
                self.sync_controls();
                vec![Action::RenderNeeded, Action::SelectionChanged, Action::HistoryChanged]
            }
            Err(err) => self.fail_import(&err),
        }
    }

    /// Import an uploaded file.
    ///
    /// Files that are not SVG, or not UTF-8, are rejected with a message and leave the
    /// current document untouched.
    pub fn import_file(&mut self, name: &str, mime: &str, bytes: &[u8]) -> Vec<Action> {
        match import::decode_file(name, mime, bytes) {
            Ok(text) => self.import_text(&text),
            Err(err) => {
                tracing::warn!(code = err.error_code(), %err, "rejected upload");
                self.report(&err)
            }
        }
    }

    fn fail_import(&mut self, err: &ParseError) -> Vec<Action> {
        tracing::warn!(code = err.error_code(), %err, "import failed");
        self.root = None;
        self.history.clear();
        self.selection.clear();
        self.sync_controls();
        let mut actions = vec![Action::RenderNeeded, Action::SelectionChanged, Action::HistoryChanged];
        actions.extend(self.report(err));
        actions
    }

    fn report(&mut self, err: &dyn ErrorCode) -> Vec<Action> {
        let message = err.user_message();
        self.message = Some(message.clone());
        vec![Action::Message(message)]
    }

    // --- Export ---

    /// Serialized document, for the clipboard. `None` without a document.
    #[must_use]
    pub fn markup(&self) -> Option<String> {
        self.root.as_ref().map(|root| export::serialize(root))
    }

    /// SVG download payload. `None` without a document.
    #[must_use]
    pub fn svg_file(&self) -> Option<ExportFile> {
        self.root
            .as_ref()
            .map(|root| export::svg_file(root, &self.config.export_basename))
    }

    /// PNG download payload. `Ok(None)` without a document.
    ///
    /// # Errors
    ///
    /// Propagates the rasterizer's [`RasterError`]; the engine message is set as well.
    pub fn png_file(&mut self, rasterizer: &dyn Rasterizer) -> Result<Option<ExportFile>, RasterError> {
        let Some(markup) = self.markup() else {
            return Ok(None);
        };
        let options = RasterOptions {
            background: self.config.background_rgb(),
            fallback_size: (self.config.raster_fallback_width, self.config.raster_fallback_height),
            max_pixels: self.config.raster_max_pixels,
        };
        match rasterizer.rasterize(&markup, &options) {
            Ok(png) => Ok(Some(export::png_file(png, &self.config.export_basename))),
            Err(err) => {
                tracing::warn!(code = err.error_code(), %err, "png export failed");
                self.message = Some(err.user_message());
                Err(err)
            }
        }
    }

    // --- Attribute edits ---

    /// Set (or, with an empty value, remove) a property on every selected node and
    /// commit one snapshot. Fill and stroke are mirrored into `style`.
    pub fn set_attribute(&mut self, key: &str, value: &str) -> Vec<Action> {
        let Some(next) = self.update_selected(|node| style::set_property(node, key, Some(value))) else {
            return Vec::new();
        };
        self.commit(next)
    }

    /// Coalesced color edit for continuous input such as a color picker drag.
    ///
    /// The tree updates immediately; the snapshot is deferred until `now_ms` plus the
    /// debounce window passes without another call.
    pub fn set_color(&mut self, key: &str, value: &str, now_ms: f64) -> Vec<Action> {
        let Some(next) = self.update_selected(|node| style::set_property(node, key, Some(value))) else {
            return Vec::new();
        };
        self.root = Some(next);
        self.debounce.arm(now_ms);
        vec![Action::RenderNeeded]
    }

    /// Set the rotation of every selected node, keeping each node's translate.
    pub fn set_rotation(&mut self, angle: f64) -> Vec<Action> {
        let Some(next) = self.update_selected(|node| {
            let current = node.attr("transform").unwrap_or_default();
            let rebuilt = transform::with_rotation(current, angle);
            node.set_attr("transform", &rebuilt);
        }) else {
            return Vec::new();
        };
        self.commit(next)
    }

    /// Replace the text of the first selected node.
    pub fn set_text(&mut self, text: &str) -> Vec<Action> {
        let (Some(root), Some(first)) = (self.root.as_ref(), self.selection.first()) else {
            return Vec::new();
        };
        if !tree::is_selectable(root, first) {
            return Vec::new();
        }
        let leaf_id = self.ids.fresh(&tree::collect_ids(root));
        let next = tree::update_one(root, first, |node| tree::set_text(node, text, || leaf_id));
        self.commit(next)
    }

    fn update_selected(&self, mutate: impl FnMut(&mut Node)) -> Option<NodeRef> {
        let root = self.root.as_ref()?;
        if self.selection.is_empty() {
            return None;
        }
        let next = tree::update_many(root, &self.selection.to_set(), mutate);
        (!Rc::ptr_eq(&next, root)).then_some(next)
    }

    // --- Structural edits ---

    /// Remove every selected node. The selection returns to the root.
    pub fn delete_selected(&mut self) -> Vec<Action> {
        let Some(root) = self.root.as_ref() else {
            return Vec::new();
        };
        if self.selection.is_empty() {
            return Vec::new();
        }
        let Some(next) = tree::remove_many(root, &self.selection.to_set()) else {
            return Vec::new();
        };
        if Rc::ptr_eq(&next, root) {
            return Vec::new();
        }
        let removed = tree::count_nodes(root) - tree::count_nodes(&next);
        tracing::debug!(removed, "deleted selection");
        let mut actions = self.commit(next);
        self.selection.clear();
        self.sync_controls();
        actions.push(Action::SelectionChanged);
        actions
    }

    /// Duplicate the first selected node right after itself and select the copy.
    pub fn duplicate_selected(&mut self) -> Vec<Action> {
        let (Some(root), Some(first)) = (self.root.as_ref(), self.selection.first()) else {
            return Vec::new();
        };
        let Some(original) = tree::find(root, first).filter(|_| tree::is_selectable(root, first)) else {
            return Vec::new();
        };
        let mut taken = tree::collect_ids(root);
        let copy = tree::duplicate(original, &mut taken);
        let copy_id = copy.id.clone();
        let next = tree::insert_after(root, first, Rc::new(copy));
        self.commit_and_select(next, Some(copy_id))
    }

    /// Wrap the first selected node in a new `<g>` and select the group.
    pub fn group_selected(&mut self) -> Vec<Action> {
        let (Some(root), Some(first)) = (self.root.as_ref(), self.selection.first()) else {
            return Vec::new();
        };
        let group_id = self.ids.fresh(&tree::collect_ids(root));
        let Some(next) = tree::group(root, first, &group_id) else {
            return Vec::new();
        };
        self.commit_and_select(next, Some(group_id))
    }

    /// Dissolve the first selected `<g>` and select its first former child.
    pub fn ungroup_selected(&mut self) -> Vec<Action> {
        let (Some(root), Some(first)) = (self.root.as_ref(), self.selection.first()) else {
            return Vec::new();
        };
        let Some((next, first_child)) = tree::ungroup(root, first) else {
            return Vec::new();
        };
        self.commit_and_select(next, first_child)
    }

    fn commit_and_select(&mut self, next: NodeRef, select: Option<NodeId>) -> Vec<Action> {
        let mut actions = self.commit(next);
        let changed = match (self.root.as_ref(), select) {
            (Some(root), Some(id)) => self.selection.select_only(root, &id),
            _ => self.selection.clear(),
        };
        if changed {
            self.sync_controls();
            actions.push(Action::SelectionChanged);
        }
        actions
    }

    // --- History ---

    /// Apply `next` as the live tree and push it as one snapshot.
    ///
    /// Controls are left alone: they already show the value the user just entered.
    fn commit(&mut self, next: NodeRef) -> Vec<Action> {
        self.flush_pending_history();
        self.history.push(Rc::clone(&next));
        self.root = Some(next);
        tracing::debug!(index = self.history.index(), entries = self.history.len(), "history commit");
        vec![Action::RenderNeeded, Action::HistoryChanged]
    }

    /// Commit the pending coalesced snapshot once its deadline has passed at `now_ms`.
    pub fn poll_history(&mut self, now_ms: f64) -> Vec<Action> {
        if !self.debounce.take_due(now_ms) {
            return Vec::new();
        }
        if self.push_live() {
            vec![Action::HistoryChanged]
        } else {
            Vec::new()
        }
    }

    /// Commit the pending coalesced snapshot now, if there is one.
    pub fn flush_pending_history(&mut self) -> bool {
        self.debounce.cancel() && self.push_live()
    }

    /// Drop the pending coalesced snapshot without committing it.
    pub fn cancel_pending_history(&mut self) -> bool {
        self.debounce.cancel()
    }

    fn push_live(&mut self) -> bool {
        let Some(root) = self.root.as_ref() else {
            return false;
        };
        self.history.push(Rc::clone(root));
        tracing::debug!(index = self.history.index(), "coalesced history commit");
        true
    }

    pub fn undo(&mut self) -> Vec<Action> {
        self.flush_pending_history();
        let Some(root) = self.history.undo() else {
            return Vec::new();
        };
        tracing::debug!(index = self.history.index(), "undo");
        self.restore(root)
    }

    pub fn redo(&mut self) -> Vec<Action> {
        self.flush_pending_history();
        let Some(root) = self.history.redo() else {
            return Vec::new();
        };
        tracing::debug!(index = self.history.index(), "redo");
        self.restore(root)
    }

    fn restore(&mut self, root: NodeRef) -> Vec<Action> {
        self.input = InputState::Idle;
        let pruned = self.selection.prune(&root);
        self.root = Some(root);
        let mut actions = vec![Action::RenderNeeded, Action::HistoryChanged];
        if pruned {
            self.sync_controls();
            actions.push(Action::SelectionChanged);
        }
        actions
    }

    // --- Selection ---

    /// Apply a click on `id` with the given modifiers.
    pub fn click(&mut self, id: &str, modifiers: Modifiers) -> Vec<Action> {
        let Some(root) = self.root.as_ref() else {
            return Vec::new();
        };
        let changed = self.selection.click(root, id, modifiers.click_kind());
        self.selection_actions(changed)
    }

    /// Toggle between everything and nothing selected.
    pub fn select_all(&mut self) -> Vec<Action> {
        let Some(root) = self.root.as_ref() else {
            return Vec::new();
        };
        let changed = self.selection.select_all(root);
        self.selection_actions(changed)
    }

    /// Return focus to the root.
    pub fn clear_selection(&mut self) -> Vec<Action> {
        let changed = self.selection.clear();
        self.selection_actions(changed)
    }

    fn selection_actions(&mut self, changed: bool) -> Vec<Action> {
        if !changed {
            return Vec::new();
        }
        self.sync_controls();
        vec![Action::SelectionChanged, Action::RenderNeeded]
    }

    fn sync_controls(&mut self) {
        self.controls = ControlValues::derive(self.root.as_ref(), &self.selection);
    }

    // --- Viewport ---

    /// Set the zoom factor, clamped to the configured range. Returns the applied value.
    pub fn set_zoom(&mut self, zoom: f64) -> f64 {
        self.zoom = self.config.clamp_zoom(zoom);
        self.zoom
    }

    // --- Input events ---

    /// Pointer pressed over `target` (the node id resolved from the event target).
    ///
    /// Only a primary press on a selectable node starts a gesture.
    ///
    /// A drag still in flight (its release was never delivered) is committed where it
    /// stands, and a pending coalesced snapshot lands before the new gesture, so no drag
    /// frame is ever folded into another edit's history entry.
    pub fn on_pointer_down(&mut self, target: Option<&str>, screen_pt: Point, button: Button) -> Vec<Action> {
        let mut actions = match std::mem::take(&mut self.input) {
            InputState::Dragging(drag) => {
                tracing::debug!(id = %drag.id, "drag interrupted by a new press");
                self.commit_live()
            }
            InputState::Idle | InputState::Pressed(_) => Vec::new(),
        };
        if self.flush_pending_history() {
            actions.push(Action::HistoryChanged);
        }
        if button != Button::Primary {
            return actions;
        }
        let (Some(root), Some(id)) = (self.root.as_ref(), target) else {
            return actions;
        };
        if !tree::is_selectable(root, id) {
            return actions;
        }
        let baseline = tree::find(root, id)
            .and_then(|node| node.attr("transform"))
            .unwrap_or_default()
            .to_owned();
        self.input = InputState::Pressed(DragState { id: id.to_owned(), start: screen_pt, baseline });
        actions
    }

    /// Pointer moved. Past the drag threshold the pressed node follows the pointer.
    pub fn on_pointer_move(&mut self, screen_pt: Point) -> Vec<Action> {
        let drag = match std::mem::take(&mut self.input) {
            InputState::Idle => return Vec::new(),
            InputState::Pressed(drag) if !self.past_threshold(&drag, screen_pt) => {
                self.input = InputState::Pressed(drag);
                return Vec::new();
            }
            InputState::Pressed(drag) | InputState::Dragging(drag) => drag,
        };
        self.apply_drag(&drag, screen_pt);
        self.input = InputState::Dragging(drag);
        vec![Action::RenderNeeded]
    }

    /// Pointer released. A press that never became a drag is a click; a drag commits
    /// one history entry.
    pub fn on_pointer_up(&mut self, screen_pt: Point, modifiers: Modifiers) -> Vec<Action> {
        match std::mem::take(&mut self.input) {
            InputState::Idle => Vec::new(),
            InputState::Pressed(drag) if !self.past_threshold(&drag, screen_pt) => self.click(&drag.id, modifiers),
            InputState::Pressed(drag) | InputState::Dragging(drag) => {
                self.apply_drag(&drag, screen_pt);
                self.commit_live()
            }
        }
    }

    /// Push the live tree, with its uncommitted drag frame, as one snapshot.
    fn commit_live(&mut self) -> Vec<Action> {
        match self.root.clone() {
            Some(root) => self.commit(root),
            None => Vec::new(),
        }
    }

    fn past_threshold(&self, drag: &DragState, screen_pt: Point) -> bool {
        screen_pt.distance(drag.start) > self.config.drag_threshold_px
    }

    /// Live, uncommitted move: baseline transform plus the screen delta in document units.
    fn apply_drag(&mut self, drag: &DragState, screen_pt: Point) {
        let Some(root) = self.root.as_ref() else {
            return;
        };
        let dx = (screen_pt.x - drag.start.x) / self.zoom;
        let dy = (screen_pt.y - drag.start.y) / self.zoom;
        let composed = transform::compose_drag(&drag.baseline, dx, dy);
        self.root = Some(tree::update_one(root, &drag.id, |node| node.set_attr("transform", &composed)));
    }

    /// Keyboard shortcuts. Unhandled keys return no actions.
    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers) -> Vec<Action> {
        let command = modifiers.command();
        match key.0.as_str() {
            "Delete" | "Backspace" => self.delete_selected(),
            "Escape" => self.clear_selection(),
            _ if command && key.is_char('z') && modifiers.shift => self.redo(),
            _ if command && key.is_char('z') => self.undo(),
            _ if command && key.is_char('y') => self.redo(),
            _ if command && key.is_char('d') => self.duplicate_selected(),
            _ if command && key.is_char('g') && modifiers.shift => self.ungroup_selected(),
            _ if command && key.is_char('g') => self.group_selected(),
            _ if command && key.is_char('a') => self.select_all(),
            _ => Vec::new(),
        }
    }
}
