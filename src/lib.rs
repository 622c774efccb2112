//! Editing engine for an in-browser SVG editor.
//!
//! The crate turns pasted or uploaded SVG into an owned, immutable document tree, lets
//! the user select and edit nodes (colors, stroke, opacity, rotation, text, grouping,
//! duplication, deletion, drag-move) with linear undo/redo, and writes the tree back out
//! as SVG markup or a PNG. Rendering stays with the browser's own SVG implementation:
//! the host page inserts the markup the engine hands it and forwards DOM events back.
//!
//! Everything except [`web`] is browser-independent and tested natively through
//! [`engine::EngineCore`].
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Engine façade owning tree, history, selection; returns [`engine::Action`]s |
//! | [`tree`] | Document nodes and pure structural operations with structural sharing |
//! | [`style`] | Presentation attribute / inline `style` reconciliation |
//! | [`selection`] | Selection set and derived control values |
//! | [`history`] | Undo/redo snapshots and the debounce deadline |
//! | [`transform`] | `translate`/`rotate` transform codec |
//! | [`input`] | Pointer, modifier and key types; press/drag gesture state |
//! | [`sanitize`] | SVG allowlist sanitizer |
//! | [`import`] | Sanitize → parse → tree pipeline and upload checks |
//! | [`export`] | Serializer, download payloads, PNG rasterizer |
//! | [`config`] | Host-supplied editor configuration |
//! | [`error`] | Stable error codes |
//! | [`logging`] | Logger installation |
//! | [`consts`] | Shared constants (debounce window, drag threshold, fallbacks) |
//! | `web` | `wasm-bindgen` façade (feature `web`) |

pub mod config;
pub mod consts;
pub mod engine;
pub mod error;
pub mod export;
pub mod history;
pub mod import;
pub mod input;
pub mod logging;
pub mod sanitize;
pub mod selection;
pub mod style;
pub mod transform;
pub mod tree;
#[cfg(feature = "web")]
pub mod web;
