//! Outbound "load resource at URL" capability

use async_trait::async_trait;
use lazyload_core::AcquisitionError;

/// A successfully loaded and decoded resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedResource {
    /// URL that was loaded
    pub url: String,
    /// Decoded width, if the host reports it
    pub natural_width: Option<u32>,
    /// Decoded height, if the host reports it
    pub natural_height: Option<u32>,
}

impl LoadedResource {
    /// Loaded resource without dimensions
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            natural_width: None,
            natural_height: None,
        }
    }

    /// With decoded dimensions
    #[inline]
    #[must_use]
    pub fn with_natural_size(mut self, width: u32, height: u32) -> Self {
        self.natural_width = Some(width);
        self.natural_height = Some(height);
        self
    }
}

/// Loads and decodes a resource
///
/// Timeouts and transport retries belong to the implementation and surface
/// here as a single failure.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    /// Load `url`
    async fn load(&self, url: &str) -> Result<LoadedResource, AcquisitionError>;
}
