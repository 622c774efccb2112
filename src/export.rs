//! Serializer, download payloads, and the PNG rasterizer.
//!
//! Serialization is the inverse of import up to formatting: elements are written as
//! explicit open/close pairs with attributes in key order, text leaves verbatim (escaped
//! so the output stays well-formed), and the id marker attribute is never written.

#[cfg(test)]
#[path = "export_test.rs"]
mod export_test;

use std::borrow::Cow;
use std::sync::Arc;

use resvg::usvg;

use crate::consts::{ID_ATTR, PNG_MIME, SVG_MIME};
use crate::error::ErrorCode;
use crate::tree::Node;

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("could not load the drawing as an image: {0}")]
    Decode(String),
    #[error("could not allocate a {width}x{height} image")]
    Surface { width: u32, height: u32 },
    #[error("could not encode PNG: {0}")]
    Encode(String),
}

impl ErrorCode for RasterError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Decode(_) => "E_RASTER_DECODE",
            Self::Surface { .. } => "E_RASTER_SURFACE",
            Self::Encode(_) => "E_RASTER_ENCODE",
        }
    }
}

// =============================================================
// Markup
// =============================================================

/// Serialize a node and its subtree to markup.
#[must_use]
pub fn serialize(node: &Node) -> String {
    let mut out = String::new();
    write_node(node, false, &mut out);
    out
}

/// Like [`serialize`] but keeps the id marker, for markup rendered into the page where
/// event targets must map back to nodes.
#[must_use]
pub fn serialize_for_render(node: &Node) -> String {
    let mut out = String::new();
    write_node(node, true, &mut out);
    out
}

fn write_node(node: &Node, keep_marker: bool, out: &mut String) {
    if node.is_text() {
        out.push_str(&escape_text(node.text.as_deref().unwrap_or_default()));
        return;
    }
    out.push('<');
    out.push_str(&node.tag);
    for (key, value) in &node.attributes {
        if key == ID_ATTR && !keep_marker {
            continue;
        }
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape_attr(value));
        out.push('"');
    }
    out.push('>');
    for child in &node.children {
        write_node(child, keep_marker, out);
    }
    out.push_str("</");
    out.push_str(&node.tag);
    out.push('>');
}

/// Escape `&`, `<` and `>` for text content.
#[must_use]
pub fn escape_text(text: &str) -> Cow<'_, str> {
    escape(text, |c| matches!(c, '&' | '<' | '>'))
}

/// Escape `&`, `<` and `"` for a double-quoted attribute value.
#[must_use]
pub fn escape_attr(value: &str) -> Cow<'_, str> {
    escape(value, |c| matches!(c, '&' | '<' | '"'))
}

fn escape(input: &str, needs_escape: impl Fn(char) -> bool) -> Cow<'_, str> {
    if !input.chars().any(&needs_escape) {
        return Cow::Borrowed(input);
    }
    let mut out = String::with_capacity(input.len() + 8);
    for c in input.chars() {
        match c {
            '&' if needs_escape(c) => out.push_str("&amp;"),
            '<' if needs_escape(c) => out.push_str("&lt;"),
            '>' if needs_escape(c) => out.push_str("&gt;"),
            '"' if needs_escape(c) => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

// =============================================================
// Download payloads
// =============================================================

/// A file ready to hand to the host's download mechanism.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub filename: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

/// `<basename>.svg` containing the serialized document.
#[must_use]
pub fn svg_file(root: &Node, basename: &str) -> ExportFile {
    ExportFile {
        filename: format!("{basename}.svg"),
        mime: SVG_MIME,
        bytes: serialize(root).into_bytes(),
    }
}

/// `<basename>.png` wrapping already-encoded PNG bytes.
#[must_use]
pub fn png_file(png: Vec<u8>, basename: &str) -> ExportFile {
    ExportFile { filename: format!("{basename}.png"), mime: PNG_MIME, bytes: png }
}

// =============================================================
// Rasterizing
// =============================================================

/// Raster surface parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterOptions {
    /// Opaque color painted before the drawing.
    pub background: (u8, u8, u8),
    /// Surface size used when the drawing has no usable natural size.
    pub fallback_size: (u32, u32),
    /// Largest surface, in pixels, that may be allocated.
    pub max_pixels: u64,
}

/// Turns serialized SVG into encoded PNG bytes.
pub trait Rasterizer {
    /// # Errors
    ///
    /// [`RasterError`] when the markup cannot be loaded, the surface cannot be
    /// allocated, or encoding fails.
    fn rasterize(&self, svg: &str, options: &RasterOptions) -> Result<Vec<u8>, RasterError>;
}

/// Rasterizer backed by `resvg`.
///
/// System fonts are loaded on construction so `<text>` renders; use
/// [`ResvgRasterizer::without_fonts`] where font discovery is unavailable.
#[derive(Clone)]
pub struct ResvgRasterizer {
    fonts: Arc<usvg::fontdb::Database>,
}

impl std::fmt::Debug for ResvgRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResvgRasterizer")
            .field("faces", &self.fonts.len())
            .finish()
    }
}

impl Default for ResvgRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ResvgRasterizer {
    #[must_use]
    pub fn new() -> Self {
        let mut fonts = usvg::fontdb::Database::new();
        fonts.load_system_fonts();
        Self { fonts: Arc::new(fonts) }
    }

    #[must_use]
    pub fn without_fonts() -> Self {
        Self { fonts: Arc::new(usvg::fontdb::Database::new()) }
    }
}

impl Rasterizer for ResvgRasterizer {
    fn rasterize(&self, svg: &str, options: &RasterOptions) -> Result<Vec<u8>, RasterError> {
        let mut usvg_options = usvg::Options { fontdb: Arc::clone(&self.fonts), ..usvg::Options::default() };
        if let Some(viewport) = fallback_viewport(options.fallback_size) {
            usvg_options.default_size = viewport;
        }
        let tree = usvg::Tree::from_str(svg, &usvg_options).map_err(|e| RasterError::Decode(e.to_string()))?;

        let (width, height) = surface_size(tree.size(), options.fallback_size);
        if u64::from(width) * u64::from(height) > options.max_pixels {
            return Err(RasterError::Surface { width, height });
        }
        let mut pixmap = tiny_skia::Pixmap::new(width, height).ok_or(RasterError::Surface { width, height })?;
        let (r, g, b) = options.background;
        pixmap.fill(tiny_skia::Color::from_rgba8(r, g, b, 255));
        resvg::render(&tree, tiny_skia::Transform::identity(), &mut pixmap.as_mut());

        pixmap.encode_png().map_err(|e| RasterError::Encode(e.to_string()))
    }
}

/// Viewport assumed for drawings with neither `width`/`height` nor a `viewBox`.
#[allow(clippy::cast_precision_loss)]
fn fallback_viewport((width, height): (u32, u32)) -> Option<usvg::Size> {
    usvg::Size::from_wh(width as f32, height as f32)
}

/// Natural size rounded up to whole pixels, or the fallback when either side is empty.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn surface_size(size: usvg::Size, fallback: (u32, u32)) -> (u32, u32) {
    let (w, h) = (size.width().ceil(), size.height().ceil());
    if w.is_finite() && h.is_finite() && w >= 1.0 && h >= 1.0 {
        (w as u32, h as u32)
    } else {
        fallback
    }
}
