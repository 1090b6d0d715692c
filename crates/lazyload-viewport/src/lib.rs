//! Lazyload Viewport
//!
//! Produces the one-shot "should acquire" signal for a mounted resource.
//!
//! # Core Concepts
//!
//! - [`ViewportObserver`]: injectable intersection capability (`observe` / `unobserve`)
//! - [`PollingObserver`]: geometry-based observer for hosts without a native one
//! - [`UnsupportedObserver`]: observer for environments with no capability at all
//! - [`ViewportLoader`]: flips [`Visibility`](lazyload_core::Visibility) exactly once
//!
//! # Example
//!
//! ```rust,ignore
//! use lazyload_viewport::{PollingObserver, RootMargin, ViewportLoader, AnchorId, Rect};
//! use lazyload_core::LoadMode;
//! use std::sync::Arc;
//!
//! let observer = Arc::new(PollingObserver::new());
//! observer.set_anchor_bounds(AnchorId(1), Some(Rect::new(0.0, 900.0, 300.0, 200.0)));
//!
//! let mut loader = ViewportLoader::new(AnchorId(1), LoadMode::Lazy, observer.clone(), RootMargin::default());
//! for entry in observer.poll(Rect::new(0.0, 0.0, 1280.0, 860.0)) {
//!     loader.on_intersection(&entry);
//! }
//! assert!(loader.visibility().is_in_view());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod geometry;
pub mod loader;
pub mod observer;

// Re-exports
pub use geometry::{Rect, RootMargin};
pub use loader::{wait_for_in_view, ViewportLoader};
pub use observer::{
    AnchorId, IntersectionEntry, PollingObserver, UnsupportedObserver, ViewportObserver, WatchId,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
