//! Lazyload Core
//!
//! Shared vocabulary for deferred, viewport/usage-triggered resource
//! acquisition:
//! - Request and state types ([`ResourceRequest`], [`LoadMode`], [`Phase`], [`Visibility`])
//! - The error taxonomy used by every other crate in the workspace
//! - [`LoaderConfig`] defaults and TOML loading
//! - Tracing subscriber setup
//!
//! # Example
//!
//! ```rust,ignore
//! use lazyload_core::{LoaderConfig, ResourceRequest, LoadMode};
//!
//! let config = LoaderConfig::from_toml_str("root_margin_px = 120.0")?;
//! let request = ResourceRequest::from_config("/images/hero.jpg", &config)
//!     .with_load_mode(LoadMode::Eager)
//!     .with_intrinsic_size(1600, 900);
//! request.validate()?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod telemetry;
pub mod types;

// Re-exports for convenience
pub use config::LoaderConfig;
pub use error::{
    AcquisitionError, ConfigError, LoaderError, LoaderResult, ObserveError, ResolutionError,
    TransitionError,
};
pub use types::{CandidateWidths, LoadMode, Phase, ResourceRequest, Visibility};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the loader types
    pub use crate::config::LoaderConfig;
    pub use crate::error::{AcquisitionError, LoaderError, ResolutionError};
    pub use crate::types::{LoadMode, Phase, ResourceRequest, Visibility};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
