//! Error types for deferred loading
//!
//! Provides the error taxonomy shared by the workspace:
//! - Configuration and request validation
//! - Illegal state-machine transitions
//! - Viewport observation setup
//! - Resource acquisition (recovered locally via fallback)
//! - Deferred resolution (surfaced to every waiting caller)

use crate::types::Phase;

/// Configuration or request validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required URL is blank
    #[error("{0} must not be empty")]
    EmptyUrl(&'static str),

    /// Quality outside 1-100
    #[error("quality must be within 1..=100, got {0}")]
    InvalidQuality(u8),

    /// A candidate width of zero
    #[error("candidate widths must be non-zero")]
    ZeroWidth,

    /// Root margin is NaN or infinite
    #[error("root margin must be finite, got {0}")]
    InvalidMargin(f64),

    /// Target format is blank or contains reserved characters
    #[error("invalid target format: '{0}'")]
    InvalidFormat(String),

    /// TOML could not be parsed
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Illegal phase transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal phase transition: {from} -> {to}")]
pub struct TransitionError {
    /// Phase the machine was in
    pub from: Phase,
    /// Phase that was requested
    pub to: Phase,
}

impl TransitionError {
    /// Create transition error
    #[inline]
    #[must_use]
    pub fn new(from: Phase, to: Phase) -> Self {
        Self { from, to }
    }
}

/// Viewport watch could not be installed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObserveError {
    /// The environment has no intersection capability
    #[error("viewport observation unsupported: {0}")]
    Unsupported(String),

    /// The observer was shut down before the watch was installed
    #[error("observer is closed")]
    Closed,
}

/// A resource failed to load from a URL
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AcquisitionError {
    /// Transport-level failure (including transport timeouts)
    #[error("request for {url} failed: {reason}")]
    Network {
        /// URL that was requested
        url: String,
        /// Transport message
        reason: String,
    },

    /// Bytes arrived but could not be decoded
    #[error("resource at {url} could not be decoded: {reason}")]
    Decode {
        /// URL that was requested
        url: String,
        /// Decoder message
        reason: String,
    },
}

impl AcquisitionError {
    /// Create network error for URL
    pub fn network(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Network {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create decode error for URL
    pub fn decode(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// URL the failure belongs to
    #[inline]
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Network { url, .. } | Self::Decode { url, .. } => url,
        }
    }
}

/// Deferred implementation could not be resolved
///
/// `Clone` so that one failed attempt can be handed to every caller that
/// was waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    /// No entry declared under the name
    #[error("no deferred entry registered under '{0}'")]
    UnknownName(String),

    /// The loader function reported a failure
    #[error("loading '{name}' failed: {reason}")]
    LoadFailed {
        /// Logical name being resolved
        name: String,
        /// Loader message
        reason: String,
    },

    /// A load had to start but no tokio runtime was current
    #[error("no tokio runtime available to load '{0}'")]
    NoRuntime(String),
}

impl ResolutionError {
    /// Create load failure for name
    pub fn load_failed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::LoadFailed {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Check if a later `resolve` may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::LoadFailed { .. })
    }
}

/// Combined loader error
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("transition error: {0}")]
    Transition(#[from] TransitionError),

    #[error("observe error: {0}")]
    Observe(#[from] ObserveError),

    #[error("acquisition error: {0}")]
    Acquisition(#[from] AcquisitionError),

    #[error("resolution error: {0}")]
    Resolution(#[from] ResolutionError),
}

/// Result type alias for loader operations
pub type LoaderResult<T> = Result<T, LoaderError>;
