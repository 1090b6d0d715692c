//! Lazyload Registry
//!
//! Name-keyed registry of deferred implementations. Each name is backed by
//! an asynchronous loader that is invoked at most once per attempt, with
//! concurrent callers coalesced onto the same load.
//!
//! # Example
//!
//! ```rust,ignore
//! use lazyload_registry::DeferredComponentRegistry;
//!
//! let routes = DeferredComponentRegistry::builder()
//!     .register("dashboard", || async { load_chunk("dashboard").await })
//!     .register("settings", || async { load_chunk("settings").await })
//!     .build();
//!
//! let page = routes.resolve("dashboard").await?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod entry;
pub mod registry;

// Re-exports
pub use entry::{BoxError, EntryState, LoaderFn};
pub use registry::{DeferredComponentRegistry, RegistryBuilder, RegistryStats};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
