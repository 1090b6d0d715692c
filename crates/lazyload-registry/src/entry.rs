//! One deferred entry and its in-flight bookkeeping
//!
//! Each entry owns a slot that is either empty, holding the shared outcome
//! of the single in-flight load, or holding the settled result. The load
//! itself runs in a spawned task so it completes even when every caller
//! has stopped waiting.

use futures::future::{BoxFuture, FutureExt, Shared};
use lazyload_core::ResolutionError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Error type loader functions may return
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Type-erased loader function
pub type LoaderFn<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, BoxError>> + Send + Sync>;

type SharedOutcome<T> = Shared<BoxFuture<'static, Result<T, ResolutionError>>>;

/// Lifecycle of a deferred entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryState {
    /// Loader never invoked
    Unfetched,
    /// Loader running
    Fetching,
    /// Implementation cached
    Ready,
    /// Last attempt failed; the next resolve retries
    Failed,
}

/// Registry-wide counters
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub(crate) invocations: AtomicU64,
    pub(crate) hits: AtomicU64,
    pub(crate) coalesced: AtomicU64,
    pub(crate) failures: AtomicU64,
}

enum Slot<T> {
    Unfetched,
    Fetching(SharedOutcome<T>),
    Ready(T),
    Failed(ResolutionError),
}

/// How a resolve call was served
pub(crate) enum Join<T> {
    Ready(T),
    InFlight(SharedOutcome<T>),
}

pub(crate) struct DeferredEntry<T> {
    name: String,
    loader: LoaderFn<T>,
    slot: Mutex<Slot<T>>,
    counters: Arc<Counters>,
}

impl<T> DeferredEntry<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(name: String, loader: LoaderFn<T>, counters: Arc<Counters>) -> Self {
        Self {
            name,
            loader,
            slot: Mutex::new(Slot::Unfetched),
            counters,
        }
    }

    pub(crate) fn state(&self) -> EntryState {
        match &*self.slot.lock() {
            Slot::Unfetched => EntryState::Unfetched,
            Slot::Fetching(_) => EntryState::Fetching,
            Slot::Ready(_) => EntryState::Ready,
            Slot::Failed(_) => EntryState::Failed,
        }
    }

    pub(crate) fn last_error(&self) -> Option<ResolutionError> {
        match &*self.slot.lock() {
            Slot::Failed(e) => Some(e.clone()),
            _ => None,
        }
    }

    /// Return the cached value, join the in-flight load, or start one.
    ///
    /// # Errors
    /// - `ResolutionError::NoRuntime` if a load must start outside a tokio runtime
    pub(crate) fn join(self: &Arc<Self>) -> Result<Join<T>, ResolutionError> {
        let mut slot = self.slot.lock();
        match &*slot {
            Slot::Ready(value) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                Ok(Join::Ready(value.clone()))
            }
            Slot::Fetching(outcome) => {
                self.counters.coalesced.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(name = %self.name, "joining in-flight load");
                Ok(Join::InFlight(outcome.clone()))
            }
            Slot::Unfetched | Slot::Failed(_) => {
                let outcome = self.start()?;
                *slot = Slot::Fetching(outcome.clone());
                Ok(Join::InFlight(outcome))
            }
        }
    }

    /// Start a load if none is cached or running; touches no hit counters.
    pub(crate) fn preload(self: &Arc<Self>) -> Result<bool, ResolutionError> {
        let mut slot = self.slot.lock();
        if !matches!(&*slot, Slot::Unfetched | Slot::Failed(_)) {
            return Ok(false);
        }
        *slot = Slot::Fetching(self.start()?);
        Ok(true)
    }

    fn start(self: &Arc<Self>) -> Result<SharedOutcome<T>, ResolutionError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| ResolutionError::NoRuntime(self.name.clone()))?;

        self.counters.invocations.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(name = %self.name, "invoking loader");

        let entry = Arc::clone(self);
        let handle = runtime.spawn(async move {
            let load = AssertUnwindSafe(async { (entry.loader)().await }).catch_unwind();
            let outcome = match load.await {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(e)) => Err(ResolutionError::load_failed(&entry.name, e.to_string())),
                Err(_) => Err(ResolutionError::load_failed(&entry.name, "loader panicked")),
            };
            entry.settle(&outcome);
            outcome
        });

        let name = self.name.clone();
        Ok(async move {
            handle.await.unwrap_or_else(|e| {
                Err(ResolutionError::load_failed(
                    name,
                    format!("loader task aborted: {e}"),
                ))
            })
        }
        .boxed()
        .shared())
    }

    fn settle(&self, outcome: &Result<T, ResolutionError>) {
        let mut slot = self.slot.lock();
        *slot = match outcome {
            Ok(value) => {
                tracing::info!(name = %self.name, "deferred entry ready");
                Slot::Ready(value.clone())
            }
            Err(e) => {
                self.counters.failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(name = %self.name, error = %e, "deferred entry failed");
                Slot::Failed(e.clone())
            }
        };
    }
}

impl<T> std::fmt::Debug for DeferredEntry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &*self.slot.lock() {
            Slot::Unfetched => "unfetched",
            Slot::Fetching(_) => "fetching",
            Slot::Ready(_) => "ready",
            Slot::Failed(_) => "failed",
        };
        f.debug_struct("DeferredEntry")
            .field("name", &self.name)
            .field("state", &state)
            .finish_non_exhaustive()
    }
}
