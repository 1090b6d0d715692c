//! Progressive image
//!
//! Couples a [`ViewportLoader`] with a [`ResourceStateMachine`] and drives
//! the fetch/fallback loop through a [`ResourceFetcher`].

use crate::fetcher::{LoadedResource, ResourceFetcher};
use crate::machine::{Effect, ResourceStateMachine};
use crate::view::RenderView;
use lazyload_core::{ConfigError, LoaderConfig, LoaderResult, Phase, ResourceRequest};
use lazyload_viewport::{AnchorId, IntersectionEntry, RootMargin, ViewportLoader, ViewportObserver};
use std::sync::Arc;
use tokio::sync::mpsc;

/// A mounted, viewport-deferred resource
pub struct ProgressiveImage {
    viewport: ViewportLoader,
    machine: ResourceStateMachine,
    fetcher: Arc<dyn ResourceFetcher>,
    loaded: Option<LoadedResource>,
}

impl ProgressiveImage {
    /// Mount a resource
    ///
    /// # Errors
    /// - any `ConfigError` from [`ResourceRequest::validate`]
    pub fn mount(
        anchor: AnchorId,
        request: ResourceRequest,
        config: &LoaderConfig,
        observer: Arc<dyn ViewportObserver>,
        fetcher: Arc<dyn ResourceFetcher>,
    ) -> Result<Self, ConfigError> {
        let machine = ResourceStateMachine::new(request, config)?;
        let viewport = ViewportLoader::new(
            anchor,
            machine.request().load_mode,
            observer,
            RootMargin::from(config),
        );

        Ok(Self {
            viewport,
            machine,
            fetcher,
            loaded: None,
        })
    }

    /// Mount a resource and drive it until it settles or `entries` closes
    ///
    /// # Errors
    /// - `LoaderError::Config` if the request is invalid
    /// - `LoaderError::Transition` if the phase table is violated
    pub async fn load(
        anchor: AnchorId,
        request: ResourceRequest,
        config: &LoaderConfig,
        observer: Arc<dyn ViewportObserver>,
        fetcher: Arc<dyn ResourceFetcher>,
        entries: mpsc::UnboundedReceiver<IntersectionEntry>,
    ) -> LoaderResult<Self> {
        let mut image = Self::mount(anchor, request, config, observer, fetcher)?;
        image.run(entries).await?;
        Ok(image)
    }

    /// Viewport signal
    #[inline]
    #[must_use]
    pub fn viewport(&self) -> &ViewportLoader {
        &self.viewport
    }

    /// Load state machine
    #[inline]
    #[must_use]
    pub fn machine(&self) -> &ResourceStateMachine {
        &self.machine
    }

    /// Current phase
    #[inline]
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.machine.state().phase()
    }

    /// Resource shown once loaded
    #[inline]
    #[must_use]
    pub fn loaded(&self) -> Option<&LoadedResource> {
        self.loaded.as_ref()
    }

    /// Render snapshot
    #[must_use]
    pub fn render_view(&self) -> RenderView {
        RenderView::of(&self.machine)
    }

    /// Route an intersection entry to the viewport signal
    pub fn on_intersection(&mut self, entry: &IntersectionEntry) -> bool {
        self.viewport.on_intersection(entry)
    }

    /// Acquire the resource if the signal has fired
    ///
    /// Returns the settled phase, or `Idle` while still pending. Calling
    /// again after settling performs no fetch. If a previous call was
    /// dropped mid-fetch, the outstanding fetch is issued again.
    ///
    /// # Errors
    /// - `LoaderError::Transition` if the phase table is violated
    pub async fn acquire(&mut self) -> LoaderResult<Phase> {
        if !self.viewport.visibility().is_in_view() {
            return Ok(self.phase());
        }

        let pending = self.machine.pending_fetch().map(str::to_string);
        let mut effect = match pending {
            Some(url) => {
                tracing::debug!(%url, "resuming interrupted fetch");
                Effect::Fetch(url)
            }
            None => self.machine.reveal()?,
        };
        while let Effect::Fetch(url) = effect {
            effect = match self.fetcher.load(&url).await {
                Ok(resource) => {
                    let effect = self.machine.on_load_success(&url)?;
                    if effect == Effect::ShowContent {
                        self.loaded = Some(resource);
                    }
                    effect
                }
                Err(e) => self.machine.on_load_failure(&url, e)?,
            };
        }

        Ok(self.phase())
    }

    /// Wait for the signal on `entries`, then acquire
    ///
    /// If the entry stream closes before the signal fires, the watch is
    /// torn down and the resource stays `Idle`.
    ///
    /// # Errors
    /// - `LoaderError::Transition` if the phase table is violated
    pub async fn run(
        &mut self,
        mut entries: mpsc::UnboundedReceiver<IntersectionEntry>,
    ) -> LoaderResult<Phase> {
        while !self.viewport.visibility().is_in_view() {
            if let Some(entry) = entries.recv().await {
                self.viewport.on_intersection(&entry);
            } else {
                self.viewport.dispose();
                return Ok(self.phase());
            }
        }
        self.acquire().await
    }
}

impl std::fmt::Debug for ProgressiveImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressiveImage")
            .field("viewport", &self.viewport)
            .field("machine", &self.machine)
            .field("loaded", &self.loaded)
            .finish_non_exhaustive()
    }
}
