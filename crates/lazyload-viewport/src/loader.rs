//! One-shot viewport acquisition signal
//!
//! A [`ViewportLoader`] starts in `Pending` (lazy) or `InView` (eager) and
//! can move to `InView` at most once. Once it has fired, or once it is
//! disposed, its watch is gone and every later entry is ignored.

use crate::geometry::RootMargin;
use crate::observer::{AnchorId, IntersectionEntry, ViewportObserver, WatchId};
use lazyload_core::{LoadMode, Visibility};
use std::sync::Arc;
use tokio::sync::watch;

/// Viewport-triggered acquisition signal for one anchor
pub struct ViewportLoader {
    anchor: AnchorId,
    mode: LoadMode,
    observer: Arc<dyn ViewportObserver>,
    watch: Option<WatchId>,
    signal: watch::Sender<Visibility>,
}

impl ViewportLoader {
    /// Create loader for `anchor`
    ///
    /// Eager mode fires immediately and installs nothing. Lazy mode installs
    /// a watch; if the observer refuses, the loader stays `Pending` for good
    /// and eager mode is the escape hatch.
    pub fn new(
        anchor: AnchorId,
        mode: LoadMode,
        observer: Arc<dyn ViewportObserver>,
        margin: RootMargin,
    ) -> Self {
        let (signal, _) = watch::channel(Visibility::Pending);
        let mut loader = Self {
            anchor,
            mode,
            observer,
            watch: None,
            signal,
        };

        match mode {
            LoadMode::Eager => {
                loader.signal.send_replace(Visibility::InView);
                tracing::debug!(%anchor, "eager load, skipping observation");
            }
            LoadMode::Lazy => match loader.observer.observe(anchor, margin) {
                Ok(id) => {
                    loader.watch = Some(id);
                    tracing::debug!(%anchor, watch = %id, margin_px = margin.px(), "watch installed");
                }
                Err(e) => {
                    tracing::warn!(%anchor, error = %e, "viewport watch unavailable, resource stays pending");
                }
            },
        }

        loader
    }

    /// Anchor being watched
    #[inline]
    #[must_use]
    pub fn anchor(&self) -> AnchorId {
        self.anchor
    }

    /// Mode the loader was created with
    #[inline]
    #[must_use]
    pub fn mode(&self) -> LoadMode {
        self.mode
    }

    /// Current signal value
    #[inline]
    #[must_use]
    pub fn visibility(&self) -> Visibility {
        *self.signal.borrow()
    }

    /// Installed watch, if still observing
    #[inline]
    #[must_use]
    pub fn watch_id(&self) -> Option<WatchId> {
        self.watch
    }

    /// Check if a watch is still installed
    #[inline]
    #[must_use]
    pub fn is_observing(&self) -> bool {
        self.watch.is_some()
    }

    /// Receiver that observes the signal
    ///
    /// The receiver sees the sender close when the loader is dropped.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Visibility> {
        self.signal.subscribe()
    }

    /// Handle one intersection entry
    ///
    /// Returns `true` only for the call that flips the signal. Entries for
    /// other watches, non-intersecting entries, and anything arriving after
    /// the signal fired or the loader was disposed are no-ops.
    pub fn on_intersection(&mut self, entry: &IntersectionEntry) -> bool {
        if self.watch != Some(entry.watch) || !entry.is_intersecting {
            return false;
        }
        if self.visibility().is_in_view() {
            return false;
        }

        self.signal.send_replace(Visibility::InView);
        tracing::debug!(anchor = %self.anchor, "anchor near viewport, signal fired");
        self.teardown();
        true
    }

    /// Tear down the watch without firing
    pub fn dispose(&mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if let Some(id) = self.watch.take() {
            self.observer.unobserve(id);
            tracing::trace!(anchor = %self.anchor, watch = %id, "watch removed");
        }
    }
}

impl Drop for ViewportLoader {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for ViewportLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewportLoader")
            .field("anchor", &self.anchor)
            .field("mode", &self.mode)
            .field("watch", &self.watch)
            .field("visibility", &self.visibility())
            .finish_non_exhaustive()
    }
}

/// Wait until `rx` reports `InView`
///
/// Returns `false` if the loader was dropped before the signal fired.
pub async fn wait_for_in_view(mut rx: watch::Receiver<Visibility>) -> bool {
    rx.wait_for(|v| v.is_in_view()).await.map(drop).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::MockViewportObserver;
    use lazyload_core::ObserveError;
    use mockall::predicate::eq;

    fn entry(watch: WatchId, is_intersecting: bool) -> IntersectionEntry {
        IntersectionEntry {
            watch,
            anchor: AnchorId(1),
            is_intersecting,
        }
    }

    #[test]
    fn eager_installs_no_watch() {
        let mut mock = MockViewportObserver::new();
        mock.expect_observe().never();
        mock.expect_unobserve().never();

        let loader = ViewportLoader::new(
            AnchorId(1),
            LoadMode::Eager,
            Arc::new(mock),
            RootMargin::default(),
        );

        assert_eq!(loader.visibility(), Visibility::InView);
        assert!(!loader.is_observing());
    }

    #[test]
    fn lazy_fires_once_and_unobserves_once() {
        let id = WatchId::new();
        let mut mock = MockViewportObserver::new();
        mock.expect_observe()
            .withf(|anchor, margin| *anchor == AnchorId(1) && margin.px() == 50.0)
            .times(1)
            .returning(move |_, _| Ok(id));
        mock.expect_unobserve().with(eq(id)).times(1).return_const(());

        let mut loader = ViewportLoader::new(
            AnchorId(1),
            LoadMode::Lazy,
            Arc::new(mock),
            RootMargin::default(),
        );
        assert_eq!(loader.visibility(), Visibility::Pending);

        assert!(!loader.on_intersection(&entry(id, false)));
        assert!(loader.on_intersection(&entry(id, true)));
        assert!(!loader.on_intersection(&entry(id, true)));
        assert!(!loader.on_intersection(&entry(id, false)));

        assert_eq!(loader.visibility(), Visibility::InView);
        assert!(!loader.is_observing());
        // Dropping must not unobserve a second time
        drop(loader);
    }

    #[test]
    fn dispose_before_fire_unobserves() {
        let id = WatchId::new();
        let mut mock = MockViewportObserver::new();
        mock.expect_observe().times(1).returning(move |_, _| Ok(id));
        mock.expect_unobserve().with(eq(id)).times(1).return_const(());

        let mut loader = ViewportLoader::new(
            AnchorId(1),
            LoadMode::Lazy,
            Arc::new(mock),
            RootMargin::default(),
        );
        loader.dispose();
        loader.dispose();

        assert!(!loader.on_intersection(&entry(id, true)));
        assert_eq!(loader.visibility(), Visibility::Pending);
    }

    #[test]
    fn drop_before_fire_unobserves() {
        let id = WatchId::new();
        let mut mock = MockViewportObserver::new();
        mock.expect_observe().times(1).returning(move |_, _| Ok(id));
        mock.expect_unobserve().with(eq(id)).times(1).return_const(());

        let loader = ViewportLoader::new(
            AnchorId(1),
            LoadMode::Lazy,
            Arc::new(mock),
            RootMargin::new(0.0),
        );
        drop(loader);
    }

    #[test]
    fn observe_failure_stays_pending() {
        let mut mock = MockViewportObserver::new();
        mock.expect_observe()
            .times(1)
            .returning(|_, _| Err(ObserveError::Unsupported("headless".to_string())));
        mock.expect_unobserve().never();

        let mut loader = ViewportLoader::new(
            AnchorId(1),
            LoadMode::Lazy,
            Arc::new(mock),
            RootMargin::default(),
        );

        assert!(!loader.is_observing());
        assert!(!loader.on_intersection(&entry(WatchId::new(), true)));
        assert_eq!(loader.visibility(), Visibility::Pending);
    }

    #[test]
    fn foreign_watch_entries_ignored() {
        let id = WatchId::new();
        let mut mock = MockViewportObserver::new();
        mock.expect_observe().returning(move |_, _| Ok(id));
        mock.expect_unobserve().return_const(());

        let mut loader = ViewportLoader::new(
            AnchorId(1),
            LoadMode::Lazy,
            Arc::new(mock),
            RootMargin::default(),
        );

        assert!(!loader.on_intersection(&entry(WatchId::new(), true)));
        assert_eq!(loader.visibility(), Visibility::Pending);
    }

    #[tokio::test]
    async fn subscriber_sees_signal() {
        let id = WatchId::new();
        let mut mock = MockViewportObserver::new();
        mock.expect_observe().returning(move |_, _| Ok(id));
        mock.expect_unobserve().return_const(());

        let mut loader = ViewportLoader::new(
            AnchorId(1),
            LoadMode::Lazy,
            Arc::new(mock),
            RootMargin::default(),
        );
        let rx = loader.subscribe();
        let waiter = tokio::spawn(wait_for_in_view(rx));

        loader.on_intersection(&entry(id, true));
        assert!(waiter.await.unwrap());
    }

    #[tokio::test]
    async fn waiter_released_when_loader_dropped() {
        let id = WatchId::new();
        let mut mock = MockViewportObserver::new();
        mock.expect_observe().returning(move |_, _| Ok(id));
        mock.expect_unobserve().return_const(());

        let loader = ViewportLoader::new(
            AnchorId(1),
            LoadMode::Lazy,
            Arc::new(mock),
            RootMargin::default(),
        );
        let rx = loader.subscribe();
        drop(loader);

        assert!(!wait_for_in_view(rx).await);
    }
}
