//! Engine configuration
//!
//! Every field has a default, so a partial JSON object is a valid config.

use serde::{Deserialize, Serialize};

use crate::error::{DocEditError, DocEditResult};

/// Nominal page width in PDF units (72 DPI).
pub const PAGE_WIDTH: f64 = 595.0;
/// Nominal page height in PDF units (72 DPI).
pub const PAGE_HEIGHT: f64 = 842.0;
/// Maximum number of snapshots kept by the history.
pub const HISTORY_LIMIT: usize = 50;
/// Maximum number of pixels averaged for a background hint.
pub const BACKGROUND_SAMPLE_LIMIT: usize = 100;
/// Glyph width as a fraction of font height when a run has no declared width.
pub const FALLBACK_GLYPH_WIDTH: f64 = 0.6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Target raster width every page is fitted into
    pub page_width: f64,
    /// Target raster height every page is fitted into
    pub page_height: f64,
    pub history_limit: usize,
    pub background_sample_limit: usize,
    pub fallback_glyph_width: f64,
    /// Allowed difference, in pixels, between a rendered raster and the fitted page size
    pub scale_tolerance_px: f64,
    pub default_font_family: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            page_width: PAGE_WIDTH,
            page_height: PAGE_HEIGHT,
            history_limit: HISTORY_LIMIT,
            background_sample_limit: BACKGROUND_SAMPLE_LIMIT,
            fallback_glyph_width: FALLBACK_GLYPH_WIDTH,
            scale_tolerance_px: 1.0,
            default_font_family: "sans-serif".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_size(mut self, width: f64, height: f64) -> Self {
        self.page_width = width;
        self.page_height = height;
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn with_background_sample_limit(mut self, limit: usize) -> Self {
        self.background_sample_limit = limit;
        self
    }

    pub fn with_default_font_family(mut self, family: impl Into<String>) -> Self {
        self.default_font_family = family.into();
        self
    }

    /// Parse a config from JSON, filling missing fields with defaults.
    pub fn from_json(json: &str) -> DocEditResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> DocEditResult<()> {
        if !(self.page_width.is_finite() && self.page_width > 0.0)
            || !(self.page_height.is_finite() && self.page_height > 0.0)
        {
            return Err(DocEditError::InvalidConfig(format!(
                "page size must be positive, got {}x{}",
                self.page_width, self.page_height
            )));
        }
        if self.history_limit == 0 {
            return Err(DocEditError::InvalidConfig(
                "history limit must be at least 1".to_string(),
            ));
        }
        if self.background_sample_limit == 0 {
            return Err(DocEditError::InvalidConfig(
                "background sample limit must be at least 1".to_string(),
            ));
        }
        if !(self.fallback_glyph_width.is_finite() && self.fallback_glyph_width > 0.0) {
            return Err(DocEditError::InvalidConfig(format!(
                "fallback glyph width must be positive, got {}",
                self.fallback_glyph_width
            )));
        }
        if !(self.scale_tolerance_px.is_finite() && self.scale_tolerance_px >= 0.0) {
            return Err(DocEditError::InvalidConfig(format!(
                "scale tolerance must be non-negative, got {}",
                self.scale_tolerance_px
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.page_width, 595.0);
        assert_eq!(config.page_height, 842.0);
        assert_eq!(config.history_limit, 50);
        assert_eq!(config.background_sample_limit, 100);
        assert_eq!(config.default_font_family, "sans-serif");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json(r#"{"historyLimit": 5}"#).unwrap();
        assert_eq!(config.history_limit, 5);
        assert_eq!(config.page_width, PAGE_WIDTH);
    }

    #[test]
    fn test_rejects_zero_history() {
        let err = EngineConfig::from_json(r#"{"historyLimit": 0}"#).unwrap_err();
        assert!(matches!(err, DocEditError::InvalidConfig(_)));
    }

    #[test]
    fn test_builder() {
        let config = EngineConfig::new()
            .with_page_size(612.0, 792.0)
            .with_history_limit(10)
            .with_default_font_family("serif");
        assert_eq!(config.page_width, 612.0);
        assert_eq!(config.history_limit, 10);
        assert_eq!(config.default_font_family, "serif");
    }

    #[test]
    fn test_rejects_negative_page() {
        let config = EngineConfig::new().with_page_size(-1.0, 10.0);
        assert!(config.validate().is_err());
    }
}
