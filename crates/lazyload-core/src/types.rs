//! Core types for deferred loading
//!
//! Defines the request a host mounts a resource with, and the enums that
//! make up a resource's observable state.

use crate::config::LoaderConfig;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Candidate widths for responsive delivery (four inline slots covers the defaults)
pub type CandidateWidths = SmallVec<[u32; 4]>;

/// When acquisition may start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadMode {
    /// Acquire immediately on mount
    Eager,
    /// Acquire once the anchor nears the viewport
    #[default]
    Lazy,
}

impl LoadMode {
    /// Value of the host `loading` attribute for this mode
    #[inline]
    #[must_use]
    pub fn as_attr(self) -> &'static str {
        match self {
            Self::Eager => "eager",
            Self::Lazy => "lazy",
        }
    }
}

/// Whether the anchor has been seen near the viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Not yet near the viewport
    #[default]
    Pending,
    /// Near or inside the viewport; acquisition may start
    InView,
}

impl Visibility {
    /// Check if acquisition may start
    #[inline]
    #[must_use]
    pub fn is_in_view(self) -> bool {
        matches!(self, Self::InView)
    }
}

/// Load phase of a single resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Waiting for visibility
    #[default]
    Idle,
    /// A fetch for `active_url` is outstanding
    Loading,
    /// Content decoded and shown
    Loaded,
    /// Fetch failed; terminal once the fallback has been tried
    Error,
}

impl Phase {
    /// All phases, in declaration order
    pub const ALL: [Phase; 4] = [Phase::Idle, Phase::Loading, Phase::Loaded, Phase::Error];

    /// Check if the phase is settled for the current URL
    #[inline]
    #[must_use]
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Loaded | Self::Error)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Loaded => "loaded",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// Request to mount a resource; immutable once mounted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRequest {
    /// URL of the resource to acquire
    pub primary_url: String,
    /// URL substituted once when the primary fails
    pub fallback_url: String,
    /// Eager or viewport-triggered acquisition
    pub load_mode: LoadMode,
    /// Intrinsic width hint in CSS pixels
    pub intrinsic_width: Option<u32>,
    /// Intrinsic height hint in CSS pixels
    pub intrinsic_height: Option<u32>,
    /// Quality requested from the transformation service (1-100)
    pub quality_hint: u8,
    /// Widths to synthesize responsive candidates for
    pub candidate_widths: CandidateWidths,
    /// Layout hint passed through to the host untouched
    pub sizes_descriptor: String,
}

impl ResourceRequest {
    /// Create request with default configuration
    #[inline]
    #[must_use]
    pub fn new(primary_url: impl Into<String>) -> Self {
        Self::from_config(primary_url, &LoaderConfig::default())
    }

    /// Create request taking defaults from `config`
    #[must_use]
    pub fn from_config(primary_url: impl Into<String>, config: &LoaderConfig) -> Self {
        Self {
            primary_url: primary_url.into(),
            fallback_url: config.fallback_url.clone(),
            load_mode: config.default_load_mode,
            intrinsic_width: None,
            intrinsic_height: None,
            quality_hint: config.default_quality,
            candidate_widths: config.candidate_widths.clone(),
            sizes_descriptor: config.sizes_descriptor.clone(),
        }
    }

    /// With fallback URL
    #[inline]
    #[must_use]
    pub fn with_fallback(mut self, fallback_url: impl Into<String>) -> Self {
        self.fallback_url = fallback_url.into();
        self
    }

    /// With load mode
    #[inline]
    #[must_use]
    pub fn with_load_mode(mut self, mode: LoadMode) -> Self {
        self.load_mode = mode;
        self
    }

    /// With intrinsic size hints
    #[inline]
    #[must_use]
    pub fn with_intrinsic_size(mut self, width: u32, height: u32) -> Self {
        self.intrinsic_width = Some(width);
        self.intrinsic_height = Some(height);
        self
    }

    /// With quality hint
    #[inline]
    #[must_use]
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality_hint = quality;
        self
    }

    /// With candidate widths
    #[must_use]
    pub fn with_candidate_widths(mut self, widths: impl IntoIterator<Item = u32>) -> Self {
        self.candidate_widths = widths.into_iter().collect();
        self
    }

    /// With sizes descriptor
    #[inline]
    #[must_use]
    pub fn with_sizes(mut self, sizes: impl Into<String>) -> Self {
        self.sizes_descriptor = sizes.into();
        self
    }

    /// Validate the request before mounting
    ///
    /// # Errors
    /// - `ConfigError::EmptyUrl` if the primary or fallback URL is blank
    /// - `ConfigError::InvalidQuality` if the quality is outside 1-100
    /// - `ConfigError::ZeroWidth` if any candidate width is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.primary_url.trim().is_empty() {
            return Err(ConfigError::EmptyUrl("primary_url"));
        }
        if self.fallback_url.trim().is_empty() {
            return Err(ConfigError::EmptyUrl("fallback_url"));
        }
        if !(1..=100).contains(&self.quality_hint) {
            return Err(ConfigError::InvalidQuality(self.quality_hint));
        }
        if self.candidate_widths.contains(&0) {
            return Err(ConfigError::ZeroWidth);
        }
        Ok(())
    }
}
