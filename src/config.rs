//! Editor configuration supplied by the host.
//!
//! Every field has a default, so an empty JSON object (or no config at all) yields the
//! stock editor. There are no environment variables; the host passes JSON.

use serde::Deserialize;

use crate::consts::{
    CANVAS_BACKGROUND, DRAG_THRESHOLD_PX, EXPORT_BASENAME, HISTORY_DEBOUNCE_MS, MAX_ZOOM, MIN_ZOOM,
    RASTER_FALLBACK_HEIGHT, RASTER_FALLBACK_WIDTH, RASTER_MAX_PIXELS,
};
use crate::error::ErrorCode;
use crate::style::parse_hex_rgb;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse editor config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid editor config: {0}")]
    Invalid(String),
}

impl ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Json(_) => "E_CONFIG_PARSE",
            Self::Invalid(_) => "E_CONFIG_INVALID",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    /// Quiet period before a coalesced edit is snapshotted.
    pub history_debounce_ms: f64,
    /// Pointer travel that turns a press into a drag.
    pub drag_threshold_px: f64,
    /// Download filename without extension.
    pub export_basename: String,
    /// `#rgb` / `#rrggbb` painted beneath the document in PNG exports.
    pub canvas_background: String,
    pub raster_fallback_width: u32,
    pub raster_fallback_height: u32,
    /// PNG exports whose surface would exceed this many pixels fail instead.
    pub raster_max_pixels: u64,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_debounce_ms: HISTORY_DEBOUNCE_MS,
            drag_threshold_px: DRAG_THRESHOLD_PX,
            export_basename: EXPORT_BASENAME.to_owned(),
            canvas_background: CANVAS_BACKGROUND.to_owned(),
            raster_fallback_width: RASTER_FALLBACK_WIDTH,
            raster_fallback_height: RASTER_FALLBACK_HEIGHT,
            raster_max_pixels: RASTER_MAX_PIXELS,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
        }
    }
}

impl EditorConfig {
    /// Parse and validate a JSON config. Missing fields take their defaults.
    ///
    /// Optional fields:
    /// - `history_debounce_ms`: default 500
    /// - `drag_threshold_px`: default 5
    /// - `export_basename`: default `"drawing"`
    /// - `canvas_background`: default `"#ffffff"`
    /// - `raster_fallback_width` / `raster_fallback_height`: default 800 × 600
    /// - `raster_max_pixels`: default 67108864 (8192 × 8192)
    /// - `min_zoom` / `max_zoom`: default 0.1 / 10
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.history_debounce_ms.is_finite() || self.history_debounce_ms < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "history_debounce_ms must be a non-negative number, got {}",
                self.history_debounce_ms
            )));
        }
        if !self.drag_threshold_px.is_finite() || self.drag_threshold_px < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "drag_threshold_px must be a non-negative number, got {}",
                self.drag_threshold_px
            )));
        }
        if self.export_basename.trim().is_empty() {
            return Err(ConfigError::Invalid("export_basename must not be empty".into()));
        }
        if parse_hex_rgb(&self.canvas_background).is_none() {
            return Err(ConfigError::Invalid(format!(
                "canvas_background must be #rgb or #rrggbb, got '{}'",
                self.canvas_background
            )));
        }
        if self.raster_fallback_width == 0 || self.raster_fallback_height == 0 {
            return Err(ConfigError::Invalid("raster fallback size must be non-zero".into()));
        }
        if self.raster_max_pixels == 0 {
            return Err(ConfigError::Invalid("raster_max_pixels must be non-zero".into()));
        }
        if !(self.min_zoom > 0.0 && self.min_zoom <= self.max_zoom && self.max_zoom.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "zoom range must satisfy 0 < min_zoom <= max_zoom, got {}..{}",
                self.min_zoom, self.max_zoom
            )));
        }
        Ok(())
    }

    /// Clamp a zoom factor into the configured range. Non-finite input resets to 1.
    #[must_use]
    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        if zoom.is_finite() {
            zoom.clamp(self.min_zoom, self.max_zoom)
        } else {
            1.0_f64.clamp(self.min_zoom, self.max_zoom)
        }
    }

    /// Background as RGB channels; white if the string does not parse.
    #[must_use]
    pub fn background_rgb(&self) -> (u8, u8, u8) {
        parse_hex_rgb(&self.canvas_background).unwrap_or((255, 255, 255))
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
