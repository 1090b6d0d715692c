//! Per-resource load state machine
//!
//! Events come in from the host (visibility, load success, load failure)
//! and each handler returns the [`Effect`] the host must carry out. Events
//! that do not apply to the current state (duplicates, stale URLs, anything
//! after `Loaded`) are absorbed as [`Effect::Ignored`].
//!
//! | from      | event            | to        | effect                 |
//! |-----------|------------------|-----------|------------------------|
//! | `Idle`    | reveal           | `Loading` | fetch primary          |
//! | `Loading` | success          | `Loaded`  | show content (fade-in) |
//! | `Loading` | failure, primary | `Loading` | fetch fallback         |
//! | `Loading` | failure, fallback| `Error`   | show error placeholder |

use crate::srcset::{SourceSet, UrlSynthesizer};
use crate::transitions::validate_transition;
use lazyload_core::{
    AcquisitionError, ConfigError, LoaderConfig, Phase, ResourceRequest, TransitionError,
    Visibility,
};
use serde::Serialize;

/// Mutable state of one mounted resource
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ResourceState {
    visibility: Visibility,
    phase: Phase,
    active_url: String,
}

impl ResourceState {
    /// Visibility of the anchor
    #[inline]
    #[must_use]
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Current phase
    #[inline]
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// URL being fetched or shown; empty while pending
    #[inline]
    #[must_use]
    pub fn active_url(&self) -> &str {
        &self.active_url
    }

    /// `active_url` is set exactly when the anchor is in view
    #[inline]
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.active_url.is_empty() != self.visibility.is_in_view()
    }
}

/// What the host must do after an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Start loading this URL
    Fetch(String),
    /// Remove the placeholder and fade the content in
    ShowContent,
    /// Render the error placeholder permanently
    ShowError,
    /// Event did not apply; nothing to do
    Ignored,
}

/// Load state machine for one mounted resource
#[derive(Debug, Clone)]
pub struct ResourceStateMachine {
    request: ResourceRequest,
    synthesizer: UrlSynthesizer,
    state: ResourceState,
    source_set: Option<SourceSet>,
    fetches: u32,
    last_error: Option<AcquisitionError>,
}

impl ResourceStateMachine {
    /// Create machine in `Idle`/`Pending`
    ///
    /// # Errors
    /// - any `ConfigError` from [`ResourceRequest::validate`]
    pub fn new(request: ResourceRequest, config: &LoaderConfig) -> Result<Self, ConfigError> {
        Self::with_synthesizer(request, UrlSynthesizer::from_config(config))
    }

    /// Create machine with an explicit synthesizer
    ///
    /// # Errors
    /// - any `ConfigError` from [`ResourceRequest::validate`]
    pub fn with_synthesizer(
        request: ResourceRequest,
        synthesizer: UrlSynthesizer,
    ) -> Result<Self, ConfigError> {
        request.validate()?;
        Ok(Self {
            request,
            synthesizer,
            state: ResourceState::default(),
            source_set: None,
            fetches: 0,
            last_error: None,
        })
    }

    /// Request the machine was mounted with
    #[inline]
    #[must_use]
    pub fn request(&self) -> &ResourceRequest {
        &self.request
    }

    /// Current state
    #[inline]
    #[must_use]
    pub fn state(&self) -> &ResourceState {
        &self.state
    }

    /// Responsive candidates for the active URL, once in view
    #[inline]
    #[must_use]
    pub fn source_set(&self) -> Option<&SourceSet> {
        self.source_set.as_ref()
    }

    /// Number of fetches requested so far (at most two)
    #[inline]
    #[must_use]
    pub fn fetch_count(&self) -> u32 {
        self.fetches
    }

    /// Most recent acquisition failure
    #[inline]
    #[must_use]
    pub fn last_error(&self) -> Option<&AcquisitionError> {
        self.last_error.as_ref()
    }

    /// URL of the fetch the host still owes a result for
    ///
    /// `Some` while `Loading`. A driver whose fetch was interrupted resumes
    /// with this URL; `reveal` would only return `Ignored`.
    #[must_use]
    pub fn pending_fetch(&self) -> Option<&str> {
        (self.state.phase == Phase::Loading).then_some(self.state.active_url.as_str())
    }

    /// Check if the fallback has replaced the primary URL
    #[inline]
    #[must_use]
    pub fn is_on_fallback(&self) -> bool {
        self.state.visibility.is_in_view() && self.state.active_url == self.request.fallback_url
    }

    /// Anchor became visible (or eager mount)
    ///
    /// # Errors
    /// Returns `TransitionError` only if the phase table is violated.
    pub fn reveal(&mut self) -> Result<Effect, TransitionError> {
        if self.state.visibility.is_in_view() {
            return Ok(Effect::Ignored);
        }

        let url = self.synthesizer.active_url(&self.request);
        self.source_set = Some(self.synthesizer.source_set(&self.request));
        self.state.visibility = Visibility::InView;
        self.enter_loading(url)
    }

    /// Load of `url` succeeded
    ///
    /// # Errors
    /// Returns `TransitionError` only if the phase table is violated.
    pub fn on_load_success(&mut self, url: &str) -> Result<Effect, TransitionError> {
        if !self.is_current_load(url) {
            tracing::trace!(url, phase = %self.state.phase, "stale load success ignored");
            return Ok(Effect::Ignored);
        }

        self.transition(Phase::Loaded)?;
        tracing::info!(url, fallback = self.is_on_fallback(), "resource loaded");
        Ok(Effect::ShowContent)
    }

    /// Load of `url` failed
    ///
    /// The first failure of a non-fallback URL switches to the fallback;
    /// any failure of the fallback is terminal.
    ///
    /// # Errors
    /// Returns `TransitionError` only if the phase table is violated.
    pub fn on_load_failure(
        &mut self,
        url: &str,
        error: AcquisitionError,
    ) -> Result<Effect, TransitionError> {
        if !self.is_current_load(url) {
            tracing::trace!(url, phase = %self.state.phase, "stale load failure ignored");
            return Ok(Effect::Ignored);
        }

        self.transition(Phase::Error)?;
        self.last_error = Some(error);

        if self.state.active_url == self.request.fallback_url {
            tracing::warn!(url, "fallback failed, showing error placeholder");
            return Ok(Effect::ShowError);
        }

        let fallback = self.request.fallback_url.clone();
        tracing::warn!(url, fallback = %fallback, "load failed, switching to fallback");
        self.source_set = Some(SourceSet::single(fallback.clone()));
        self.enter_loading(fallback)
    }

    fn is_current_load(&self, url: &str) -> bool {
        self.state.phase == Phase::Loading && self.state.active_url == url
    }

    fn enter_loading(&mut self, url: String) -> Result<Effect, TransitionError> {
        self.transition(Phase::Loading)?;
        self.state.active_url.clone_from(&url);
        self.fetches += 1;
        Ok(Effect::Fetch(url))
    }

    fn transition(&mut self, to: Phase) -> Result<(), TransitionError> {
        validate_transition(self.state.phase, to)?;
        tracing::debug!(from = %self.state.phase, to = %to, "phase transition");
        self.state.phase = to;
        Ok(())
    }
}
