//! Shared constants for the editing engine.

// ── Tree model ──────────────────────────────────────────────────

/// Tag carried by text leaves. Not a valid XML name, so it never collides with an element.
pub const TEXT_TAG: &str = "#text";

/// Attribute mirroring a node's id so the rendered DOM can be mapped back to the tree.
pub const ID_ATTR: &str = "data-svgedit-id";

/// Prefix for synthetic node ids.
pub const SYNTHETIC_ID_PREFIX: &str = "node-";

/// Suffix appended to derive the id of a duplicated node.
pub const COPY_SUFFIX: &str = "-copy";

/// Local name of the SVG root element.
pub const SVG_TAG: &str = "svg";

/// Tag used for groups created by the group operation.
pub const GROUP_TAG: &str = "g";

// ── History ─────────────────────────────────────────────────────

/// Quiet period after the last coalesced edit before a snapshot is committed.
pub const HISTORY_DEBOUNCE_MS: f64 = 500.0;

// ── Input ───────────────────────────────────────────────────────

/// Pointer travel (screen pixels) beyond which a press becomes a drag instead of a click.
pub const DRAG_THRESHOLD_PX: f64 = 5.0;

/// Lower zoom bound.
pub const MIN_ZOOM: f64 = 0.1;

/// Upper zoom bound.
pub const MAX_ZOOM: f64 = 10.0;

// ── Export ──────────────────────────────────────────────────────

/// Base filename for downloads, without extension.
pub const EXPORT_BASENAME: &str = "drawing";

/// MIME type for SVG input and output.
pub const SVG_MIME: &str = "image/svg+xml";

/// MIME type for raster output.
pub const PNG_MIME: &str = "image/png";

/// Raster width when the document has no usable natural size.
pub const RASTER_FALLBACK_WIDTH: u32 = 800;

/// Raster height when the document has no usable natural size.
pub const RASTER_FALLBACK_HEIGHT: u32 = 600;

/// Largest raster surface, in pixels, a PNG export may allocate (8192 × 8192).
pub const RASTER_MAX_PIXELS: u64 = 67_108_864;

/// Background painted beneath the document before rasterizing.
pub const CANVAS_BACKGROUND: &str = "#ffffff";

// ── Controls ────────────────────────────────────────────────────

/// Fill shown in the controls when nothing is selected or the node has none.
pub const DEFAULT_FILL: &str = "#000000";

/// Stroke shown in the controls when nothing is selected or the node has none.
pub const DEFAULT_STROKE: &str = "none";
