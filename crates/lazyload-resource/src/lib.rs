//! Lazyload Resource
//!
//! Per-resource acquisition: a load state machine with a single fallback
//! substitution, responsive source synthesis, and a driver that ties both
//! to the viewport signal.
//!
//! # Architecture
//!
//! ```text
//! ViewportLoader ──InView──▶ ResourceStateMachine ──Effect::Fetch──▶ ResourceFetcher
//!                                   ▲                                     │
//!                                   └────── success / failure ────────────┘
//!                                   │
//!                                   └──▶ RenderView (placeholder / error / content)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use lazyload_resource::ProgressiveImage;
//!
//! let mut image = ProgressiveImage::mount(anchor, request, &config, observer, fetcher)?;
//! let phase = image.run(entries).await?;
//! render(image.render_view());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod fetcher;
pub mod image;
pub mod machine;
pub mod srcset;
pub mod transitions;
pub mod view;

// Re-exports
pub use fetcher::{LoadedResource, ResourceFetcher};
pub use image::ProgressiveImage;
pub use machine::{Effect, ResourceState, ResourceStateMachine};
pub use srcset::{is_external, Candidate, SourceSet, UrlKind, UrlSynthesizer};
pub use transitions::{allowed_transitions, validate_transition};
pub use view::RenderView;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
