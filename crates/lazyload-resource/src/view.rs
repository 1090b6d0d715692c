//! Host-facing render snapshot

use crate::machine::ResourceStateMachine;
use lazyload_core::Phase;
use serde::Serialize;

/// Everything the host needs to draw a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderView {
    /// Current phase
    pub phase: Phase,
    /// `src`; absent until in view
    pub src: Option<String>,
    /// `srcset` descriptor; absent until in view
    pub srcset: Option<String>,
    /// `sizes` descriptor, passed through
    pub sizes: String,
    /// Width hint
    pub width: Option<u32>,
    /// Height hint
    pub height: Option<u32>,
    /// `loading` attribute
    pub loading: &'static str,
    /// `decoding` attribute
    pub decoding: &'static str,
    /// Placeholder is visible (idle or loading)
    pub show_placeholder: bool,
    /// Error placeholder is visible
    pub show_error: bool,
    /// Content is visible and fades in
    pub fade_in: bool,
}

impl RenderView {
    /// Snapshot a machine
    #[must_use]
    pub fn of(machine: &ResourceStateMachine) -> Self {
        let request = machine.request();
        let state = machine.state();
        let phase = state.phase();
        let in_view = state.visibility().is_in_view();

        Self {
            phase,
            src: in_view.then(|| state.active_url().to_string()),
            srcset: machine.source_set().map(|set| set.descriptor()),
            sizes: request.sizes_descriptor.clone(),
            width: request.intrinsic_width,
            height: request.intrinsic_height,
            loading: request.load_mode.as_attr(),
            decoding: "async",
            show_placeholder: matches!(phase, Phase::Idle | Phase::Loading),
            show_error: phase == Phase::Error,
            fade_in: phase == Phase::Loaded,
        }
    }
}

impl From<&ResourceStateMachine> for RenderView {
    fn from(machine: &ResourceStateMachine) -> Self {
        Self::of(machine)
    }
}
