//! Browser binding around [`EngineCore`].
//!
//! The host page renders [`Editor::render_markup`], resolves event targets to node ids
//! through the `data-svgedit-id` attribute, and forwards pointer and keyboard events.
//! [`Editor::markup`] is the clean export text.
//! Every handler returns an array of action names (`"render"`, `"selection"`,
//! `"history"`, `"message"`) telling the host what to refresh.
//!
//! The coalesced-history deadline is driven by a `gloo-timers` [`Timeout`]. The editor
//! keeps at most one; storing a new one drops, and so cancels, the previous.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo_timers::callback::Timeout;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::config::EditorConfig;
use crate::engine::{Action, EngineCore};
use crate::error::{ErrorCode, ErrorReport};
use crate::export::{self, ExportFile, ResvgRasterizer};
use crate::input::{Button, Key, Modifiers, Point};
use crate::logging;

#[wasm_bindgen(start)]
pub fn start() {
    logging::init();
}

#[wasm_bindgen]
pub struct Editor {
    core: Rc<RefCell<EngineCore>>,
    history_timer: Option<Timeout>,
    on_history: Option<js_sys::Function>,
}

#[wasm_bindgen]
impl Editor {
    /// Create an editor. `config_json` may be omitted for the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<Editor, JsError> {
        let config = match config_json {
            Some(raw) => EditorConfig::from_json(&raw).map_err(|err| report_error(&err))?,
            None => EditorConfig::default(),
        };
        Ok(Self {
            core: Rc::new(RefCell::new(EngineCore::with_config(config))),
            history_timer: None,
            on_history: None,
        })
    }

    /// Callback invoked (with no arguments) when a deferred history snapshot lands.
    pub fn set_on_history(&mut self, callback: Option<js_sys::Function>) {
        self.on_history = callback;
    }

    // --- Import / export ---

    pub fn import_text(&mut self, raw: &str) -> js_sys::Array {
        self.history_timer = None;
        action_names(&self.core.borrow_mut().import_text(raw))
    }

    pub fn import_file(&mut self, name: &str, mime: &str, bytes: &[u8]) -> js_sys::Array {
        self.history_timer = None;
        action_names(&self.core.borrow_mut().import_file(name, mime, bytes))
    }

    /// Serialized document for the clipboard. The host performs the clipboard write.
    pub fn markup(&self) -> Option<String> {
        self.core.borrow().markup()
    }

    /// Markup including the id marker, for rendering into the page.
    pub fn render_markup(&self) -> Option<String> {
        self.core.borrow().root().map(|root| export::serialize_for_render(root))
    }

    /// Download the document as SVG. Returns `false` when there is no document.
    pub fn download_svg(&self) -> Result<bool, JsValue> {
        let Some(file) = self.core.borrow().svg_file() else {
            return Ok(false);
        };
        download(&file)?;
        Ok(true)
    }

    /// Download the document as PNG. Returns `false` when there is no document or
    /// rasterizing failed; in the latter case [`Editor::message`] says why.
    pub fn download_png(&self) -> Result<bool, JsValue> {
        let rasterizer = ResvgRasterizer::default();
        let result = self.core.borrow_mut().png_file(&rasterizer);
        match result {
            Ok(Some(file)) => {
                download(&file)?;
                Ok(true)
            }
            Ok(None) | Err(_) => Ok(false),
        }
    }

    // --- Edits ---

    pub fn set_attribute(&mut self, key: &str, value: &str) -> js_sys::Array {
        self.run(|core| core.set_attribute(key, value))
    }

    /// Coalesced color edit; call on every `input` event of a color picker.
    pub fn set_color(&mut self, key: &str, value: &str) -> js_sys::Array {
        let now = js_sys::Date::now();
        let actions = self.core.borrow_mut().set_color(key, value, now);
        self.schedule_history();
        action_names(&actions)
    }

    pub fn set_rotation(&mut self, angle: f64) -> js_sys::Array {
        self.run(|core| core.set_rotation(angle))
    }

    pub fn set_text(&mut self, text: &str) -> js_sys::Array {
        self.run(|core| core.set_text(text))
    }

    pub fn delete_selected(&mut self) -> js_sys::Array {
        self.run(EngineCore::delete_selected)
    }

    pub fn duplicate_selected(&mut self) -> js_sys::Array {
        self.run(EngineCore::duplicate_selected)
    }

    pub fn group_selected(&mut self) -> js_sys::Array {
        self.run(EngineCore::group_selected)
    }

    pub fn ungroup_selected(&mut self) -> js_sys::Array {
        self.run(EngineCore::ungroup_selected)
    }

    pub fn undo(&mut self) -> js_sys::Array {
        self.run(EngineCore::undo)
    }

    pub fn redo(&mut self) -> js_sys::Array {
        self.run(EngineCore::redo)
    }

    pub fn can_undo(&self) -> bool {
        self.core.borrow().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.core.borrow().can_redo()
    }

    // --- Selection ---

    pub fn click(&mut self, id: &str, shift: bool, ctrl: bool, alt: bool, meta: bool) -> js_sys::Array {
        let modifiers = Modifiers { shift, ctrl, alt, meta };
        self.run(|core| core.click(id, modifiers))
    }

    pub fn select_all(&mut self) -> js_sys::Array {
        self.run(EngineCore::select_all)
    }

    pub fn clear_selection(&mut self) -> js_sys::Array {
        self.run(EngineCore::clear_selection)
    }

    pub fn selection(&self) -> Vec<String> {
        self.core.borrow().selection().ids().to_vec()
    }

    /// Control values for the first selected node, as JSON.
    pub fn controls(&self) -> Result<String, JsError> {
        serde_json::to_string(self.core.borrow().controls()).map_err(|err| JsError::new(&err.to_string()))
    }

    pub fn message(&self) -> Option<String> {
        self.core.borrow().message().map(str::to_owned)
    }

    // --- Input events ---

    pub fn set_zoom(&mut self, zoom: f64) -> f64 {
        self.core.borrow_mut().set_zoom(zoom)
    }

    /// `button` follows `PointerEvent.button`: 0 primary, 1 middle, 2 secondary.
    pub fn pointer_down(&mut self, target: Option<String>, x: f64, y: f64, button: i16) -> js_sys::Array {
        let button = match button {
            0 => Button::Primary,
            1 => Button::Middle,
            _ => Button::Secondary,
        };
        self.run(|core| core.on_pointer_down(target.as_deref(), Point::new(x, y), button))
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) -> js_sys::Array {
        self.run(|core| core.on_pointer_move(Point::new(x, y)))
    }

    pub fn pointer_up(&mut self, x: f64, y: f64, shift: bool, ctrl: bool, alt: bool, meta: bool) -> js_sys::Array {
        let modifiers = Modifiers { shift, ctrl, alt, meta };
        self.run(|core| core.on_pointer_up(Point::new(x, y), modifiers))
    }

    /// Keyboard shortcut dispatch. An empty array means the key was not handled.
    pub fn key_down(&mut self, key: &str, shift: bool, ctrl: bool, alt: bool, meta: bool) -> js_sys::Array {
        let modifiers = Modifiers { shift, ctrl, alt, meta };
        let key = Key::new(key);
        self.run(|core| core.on_key_down(&key, modifiers))
    }
}

impl Editor {
    /// Run an immediate engine operation. Any pending deferred snapshot is flushed by the
    /// engine itself, so the timer only has to be dropped.
    fn run(&mut self, op: impl FnOnce(&mut EngineCore) -> Vec<Action>) -> js_sys::Array {
        let actions = op(&mut *self.core.borrow_mut());
        if self.core.borrow().pending_deadline().is_none() {
            self.history_timer = None;
        }
        action_names(&actions)
    }

    /// (Re)arm the deferred-snapshot timer for the engine's current deadline.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn schedule_history(&mut self) {
        let Some(deadline) = self.core.borrow().pending_deadline() else {
            self.history_timer = None;
            return;
        };
        let delay = (deadline - js_sys::Date::now()).max(0.0).ceil() as u32;
        let core = Rc::downgrade(&self.core);
        let callback = self.on_history.clone();
        self.history_timer = Some(Timeout::new(delay, move || fire_history(&core, callback.as_ref())));
    }
}

impl Drop for Editor {
    fn drop(&mut self) {
        self.history_timer = None;
        if let Ok(mut core) = self.core.try_borrow_mut() {
            core.flush_pending_history();
        }
    }
}

/// Timer body: commit the deferred snapshot and tell the host.
fn fire_history(core: &Weak<RefCell<EngineCore>>, callback: Option<&js_sys::Function>) {
    let Some(core) = core.upgrade() else {
        return;
    };
    let Ok(mut core) = core.try_borrow_mut() else {
        tracing::warn!("engine busy when history timer fired");
        return;
    };
    if !core.flush_pending_history() {
        return;
    }
    drop(core);
    if let Some(callback) = callback {
        if let Err(err) = callback.call0(&JsValue::NULL) {
            tracing::warn!(?err, "history callback failed");
        }
    }
}

fn action_names(actions: &[Action]) -> js_sys::Array {
    actions
        .iter()
        .map(|action| {
            JsValue::from_str(match action {
                Action::RenderNeeded => "render",
                Action::SelectionChanged => "selection",
                Action::HistoryChanged => "history",
                Action::Message(_) => "message",
            })
        })
        .collect()
}

fn report_error(err: &impl ErrorCode) -> JsError {
    let report = ErrorReport::from_error(err);
    JsError::new(&format!("{}: {}", report.code, report.message))
}

/// Hand `file` to the browser as a download: blob, object URL, temporary anchor.
///
/// The object URL is revoked whether or not the click succeeded.
fn download(file: &ExportFile) -> Result<(), JsValue> {
    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| JsValue::from_str("no document available for download"))?;

    let parts = js_sys::Array::of1(&js_sys::Uint8Array::from(file.bytes.as_slice()));
    let options = web_sys::BlobPropertyBag::new();
    options.set_type(file.mime);
    let blob = web_sys::Blob::new_with_u8_array_sequence_and_options(&parts, &options)?;
    let url = web_sys::Url::create_object_url_with_blob(&blob)?;

    let clicked = click_anchor(&document, &url, &file.filename);
    let revoked = web_sys::Url::revoke_object_url(&url);
    clicked?;
    revoked
}

fn click_anchor(document: &web_sys::Document, url: &str, filename: &str) -> Result<(), JsValue> {
    let anchor = document
        .create_element("a")?
        .dyn_into::<web_sys::HtmlAnchorElement>()
        .map_err(JsValue::from)?;
    anchor.set_href(url);
    anchor.set_download(filename);
    anchor.click();
    Ok(())
}
