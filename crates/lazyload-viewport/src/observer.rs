//! Viewport intersection capability
//!
//! The loader never talks to a rendering surface directly. It asks a
//! [`ViewportObserver`] to watch an anchor and is handed
//! [`IntersectionEntry`] values by the host. Browser hosts back this with a
//! native intersection observer; [`PollingObserver`] covers hosts that only
//! know element rectangles.

use crate::geometry::{Rect, RootMargin};
use dashmap::DashMap;
use lazyload_core::ObserveError;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use ulid::Ulid;

/// Host-assigned identifier of a placeholder element
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AnchorId(pub u64);

impl std::fmt::Display for AnchorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "anchor#{}", self.0)
    }
}

/// Identifier of one installed watch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WatchId(pub Ulid);

impl WatchId {
    /// Generate new watch ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for WatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for WatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One intersection notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntersectionEntry {
    /// Watch the entry was produced for
    pub watch: WatchId,
    /// Anchor being watched
    pub anchor: AnchorId,
    /// Whether the anchor overlaps the margin-expanded viewport
    pub is_intersecting: bool,
}

/// Injectable intersection capability
///
/// `observe` installs a watch; `unobserve` removes it and must be
/// idempotent. After `unobserve` returns, no entry for that watch may be
/// produced.
#[cfg_attr(test, mockall::automock)]
pub trait ViewportObserver: Send + Sync {
    /// Start watching `anchor` with a pre-trigger margin
    ///
    /// # Errors
    /// - `ObserveError::Unsupported` if the environment cannot observe
    /// - `ObserveError::Closed` if the observer was shut down
    fn observe(&self, anchor: AnchorId, margin: RootMargin) -> Result<WatchId, ObserveError>;

    /// Stop a watch
    fn unobserve(&self, watch: WatchId);
}

#[derive(Debug, Clone, Copy)]
struct Watch {
    anchor: AnchorId,
    margin: RootMargin,
}

/// Observer driven by explicit viewport updates
///
/// The host reports anchor layout with [`set_anchor_bounds`](Self::set_anchor_bounds)
/// and the visible region with [`poll`](Self::poll). Anchors without bounds are
/// treated as detached and never intersect.
#[derive(Debug, Default)]
pub struct PollingObserver {
    anchors: DashMap<AnchorId, Rect>,
    watches: DashMap<WatchId, Watch>,
    closed: AtomicBool,
}

impl PollingObserver {
    /// Create new observer
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the layout of an anchor; `None` detaches it
    pub fn set_anchor_bounds(&self, anchor: AnchorId, bounds: Option<Rect>) {
        match bounds {
            Some(rect) => {
                self.anchors.insert(anchor, rect);
            }
            None => {
                self.anchors.remove(&anchor);
            }
        }
    }

    /// Evaluate every active watch against `viewport`
    ///
    /// Entries are produced for all active watches, intersecting or not,
    /// ordered by watch id.
    #[must_use]
    pub fn poll(&self, viewport: Rect) -> Vec<IntersectionEntry> {
        let mut entries: Vec<IntersectionEntry> = self
            .watches
            .iter()
            .map(|watch| {
                let Watch { anchor, margin } = *watch.value();
                let is_intersecting = self
                    .anchors
                    .get(&anchor)
                    .is_some_and(|bounds| viewport.expand(margin).intersects(bounds.value()));
                IntersectionEntry {
                    watch: *watch.key(),
                    anchor,
                    is_intersecting,
                }
            })
            .collect();
        entries.sort_by_key(|entry| entry.watch);
        entries
    }

    /// Number of installed watches
    #[inline]
    #[must_use]
    pub fn active_watches(&self) -> usize {
        self.watches.len()
    }

    /// Check if a watch is installed
    #[inline]
    #[must_use]
    pub fn is_watching(&self, watch: WatchId) -> bool {
        self.watches.contains_key(&watch)
    }

    /// Refuse new watches and drop existing ones
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.watches.clear();
    }
}

impl ViewportObserver for PollingObserver {
    fn observe(&self, anchor: AnchorId, margin: RootMargin) -> Result<WatchId, ObserveError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ObserveError::Closed);
        }
        let id = WatchId::new();
        self.watches.insert(id, Watch { anchor, margin });
        Ok(id)
    }

    fn unobserve(&self, watch: WatchId) {
        self.watches.remove(&watch);
    }
}

/// Observer for environments without any intersection capability
#[derive(Debug, Clone, Default)]
pub struct UnsupportedObserver {
    reason: String,
}

impl UnsupportedObserver {
    /// Create observer that always refuses with `reason`
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl ViewportObserver for UnsupportedObserver {
    fn observe(&self, _anchor: AnchorId, _margin: RootMargin) -> Result<WatchId, ObserveError> {
        Err(ObserveError::Unsupported(self.reason.clone()))
    }

    fn unobserve(&self, _watch: WatchId) {}
}
