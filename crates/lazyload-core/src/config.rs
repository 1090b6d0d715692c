//! Loader configuration
//!
//! Defaults applied to every [`ResourceRequest`](crate::ResourceRequest) built
//! from it, plus the URL-synthesis conventions of the image host.

use crate::error::ConfigError;
use crate::types::{CandidateWidths, LoadMode};
use serde::{Deserialize, Serialize};
use smallvec::smallvec;

/// Loader configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Pre-trigger margin around the viewport, in pixels
    pub root_margin_px: f64,
    /// Quality used when a request does not set one
    pub default_quality: u8,
    /// Widths to synthesize candidates for
    pub candidate_widths: CandidateWidths,
    /// Default `sizes` descriptor
    pub sizes_descriptor: String,
    /// Asset shown when the primary resource fails
    pub fallback_url: String,
    /// Format requested from the transformation service
    pub target_format: String,
    /// Substring marking a URL as already optimized
    pub optimization_marker: String,
    /// Load mode used when a request does not set one
    pub default_load_mode: LoadMode,
}

impl LoaderConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from TOML; missing keys take their defaults
    ///
    /// # Errors
    /// - `ConfigError::Parse` on malformed TOML
    /// - any error from [`LoaderConfig::validate`]
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        if let Err(e) = config.validate() {
            tracing::warn!(error = %e, "rejecting loader configuration");
            return Err(e);
        }
        tracing::debug!(
            root_margin_px = config.root_margin_px,
            default_quality = config.default_quality,
            target_format = %config.target_format,
            "loader configuration loaded"
        );
        Ok(config)
    }

    /// With root margin
    #[inline]
    #[must_use]
    pub fn with_root_margin(mut self, margin_px: f64) -> Self {
        self.root_margin_px = margin_px;
        self
    }

    /// With default quality
    #[inline]
    #[must_use]
    pub fn with_default_quality(mut self, quality: u8) -> Self {
        self.default_quality = quality;
        self
    }

    /// With candidate widths
    #[must_use]
    pub fn with_candidate_widths(mut self, widths: impl IntoIterator<Item = u32>) -> Self {
        self.candidate_widths = widths.into_iter().collect();
        self
    }

    /// With fallback URL
    #[inline]
    #[must_use]
    pub fn with_fallback_url(mut self, url: impl Into<String>) -> Self {
        self.fallback_url = url.into();
        self
    }

    /// With target format
    #[inline]
    #[must_use]
    pub fn with_target_format(mut self, format: impl Into<String>) -> Self {
        self.target_format = format.into();
        self
    }

    /// With default load mode
    #[inline]
    #[must_use]
    pub fn with_default_load_mode(mut self, mode: LoadMode) -> Self {
        self.default_load_mode = mode;
        self
    }

    /// Validate configuration values
    ///
    /// # Errors
    /// Returns the first invalid field found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.root_margin_px.is_finite() {
            return Err(ConfigError::InvalidMargin(self.root_margin_px));
        }
        if !(1..=100).contains(&self.default_quality) {
            return Err(ConfigError::InvalidQuality(self.default_quality));
        }
        if self.candidate_widths.contains(&0) {
            return Err(ConfigError::ZeroWidth);
        }
        if self.fallback_url.trim().is_empty() {
            return Err(ConfigError::EmptyUrl("fallback_url"));
        }
        let format_ok = !self.target_format.is_empty()
            && self.target_format.chars().all(|c| c.is_ascii_alphanumeric());
        if !format_ok {
            return Err(ConfigError::InvalidFormat(self.target_format.clone()));
        }
        Ok(())
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            root_margin_px: 50.0,
            default_quality: 85,
            candidate_widths: smallvec![400, 800, 1200, 1600],
            sizes_descriptor: "100vw".to_string(),
            fallback_url: "/placeholder.svg".to_string(),
            target_format: "webp".to_string(),
            optimization_marker: "/optimized/".to_string(),
            default_load_mode: LoadMode::Lazy,
        }
    }
}
