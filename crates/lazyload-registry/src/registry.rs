//! Deferred component registry
//!
//! Maps logical names (routes, features) to loader functions and caches
//! each implementation after its first successful load.

use crate::entry::{BoxError, Counters, DeferredEntry, EntryState, Join, LoaderFn};
use dashmap::DashMap;
use futures::future::FutureExt;
use lazyload_core::ResolutionError;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Snapshot of registry counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Number of declared entries
    pub entry_count: usize,
    /// Entries currently cached
    pub ready_count: usize,
    /// Loader functions invoked
    pub loader_invocations: u64,
    /// Calls served from the cache
    pub cache_hits: u64,
    /// Calls that joined an in-flight load
    pub coalesced_calls: u64,
    /// Failed load attempts
    pub failures: u64,
}

fn erase<T, F, Fut, E>(loader: F) -> LoaderFn<T>
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    E: Into<BoxError>,
{
    Arc::new(move || loader().map(|r| r.map_err(Into::into)).boxed())
}

/// Builder declaring the entries of a registry
pub struct RegistryBuilder<T> {
    loaders: HashMap<String, LoaderFn<T>>,
}

impl<T> RegistryBuilder<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create empty builder
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            loaders: HashMap::new(),
        }
    }

    /// Declare an entry; a later declaration of the same name replaces it
    #[must_use]
    pub fn register<F, Fut, E>(mut self, name: impl Into<String>, loader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Into<BoxError>,
    {
        let name = name.into();
        if self.loaders.insert(name.clone(), erase(loader)).is_some() {
            tracing::warn!(%name, "deferred entry declared twice, keeping the last loader");
        }
        self
    }

    /// Build the registry
    #[must_use]
    pub fn build(self) -> DeferredComponentRegistry<T> {
        let registry = DeferredComponentRegistry::new();
        for (name, loader) in self.loaders {
            registry.insert(name, loader);
        }
        registry
    }
}

impl<T> Default for RegistryBuilder<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Name → implementation registry with coalesced first-use loading
///
/// - The first `resolve` of a name invokes its loader once; concurrent
///   callers share that load.
/// - Success is cached for the life of the registry.
/// - Failure is delivered to every caller of that attempt and is not
///   cached: the next `resolve` invokes the loader again.
///
/// Loads run on the ambient tokio runtime and complete even if every
/// caller stops waiting.
pub struct DeferredComponentRegistry<T> {
    entries: DashMap<String, Arc<DeferredEntry<T>>>,
    counters: Arc<Counters>,
}

impl<T> DeferredComponentRegistry<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Start declaring entries
    #[inline]
    #[must_use]
    pub fn builder() -> RegistryBuilder<T> {
        RegistryBuilder::new()
    }

    /// Declare an entry after construction
    ///
    /// Returns `false` and keeps the existing entry if the name is taken.
    pub fn register<F, Fut, E>(&self, name: impl Into<String>, loader: F) -> bool
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Into<BoxError>,
    {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return false;
        }
        self.insert(name, erase(loader))
    }

    fn insert(&self, name: String, loader: LoaderFn<T>) -> bool {
        let mut inserted = false;
        self.entries.entry(name.clone()).or_insert_with(|| {
            inserted = true;
            Arc::new(DeferredEntry::new(name, loader, Arc::clone(&self.counters)))
        });
        inserted
    }

    /// Resolve the implementation registered under `name`
    ///
    /// # Errors
    /// - `ResolutionError::UnknownName` if nothing is declared under `name`
    /// - `ResolutionError::LoadFailed` if this attempt's loader failed
    /// - `ResolutionError::NoRuntime` if a load must start and no tokio
    ///   runtime is current
    pub async fn resolve(&self, name: &str) -> Result<T, ResolutionError> {
        let entry = self.entry(name)?;
        match entry.join()? {
            Join::Ready(value) => Ok(value),
            Join::InFlight(outcome) => outcome.await,
        }
    }

    /// Start loading `name` without waiting for it
    ///
    /// Shares the same in-flight load as `resolve`; a no-op when already
    /// cached or loading. The load is spawned on the current tokio runtime.
    ///
    /// # Errors
    /// - `ResolutionError::UnknownName` if nothing is declared under `name`
    /// - `ResolutionError::NoRuntime` if a load must start and no tokio
    ///   runtime is current
    pub fn preload(&self, name: &str) -> Result<(), ResolutionError> {
        if self.entry(name)?.preload()? {
            tracing::debug!(name, "preloading deferred entry");
        }
        Ok(())
    }

    /// Lifecycle state of `name`
    #[must_use]
    pub fn state(&self, name: &str) -> Option<EntryState> {
        self.entries.get(name).map(|entry| entry.state())
    }

    /// Failure of the last attempt for `name`, if it failed
    #[must_use]
    pub fn last_error(&self, name: &str) -> Option<ResolutionError> {
        self.entries.get(name).and_then(|entry| entry.last_error())
    }

    /// Check if `name` is declared
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Declared names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Number of declared entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no entries are declared
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Counter snapshot
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        let ready_count = self
            .entries
            .iter()
            .filter(|e| e.value().state() == EntryState::Ready)
            .count();
        RegistryStats {
            entry_count: self.entries.len(),
            ready_count,
            loader_invocations: self.counters.invocations.load(Ordering::Relaxed),
            cache_hits: self.counters.hits.load(Ordering::Relaxed),
            coalesced_calls: self.counters.coalesced.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
        }
    }

    fn entry(&self, name: &str) -> Result<Arc<DeferredEntry<T>>, ResolutionError> {
        self.entries
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| ResolutionError::UnknownName(name.to_string()))
    }
}

impl<T> Default for DeferredComponentRegistry<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for DeferredComponentRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredComponentRegistry")
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}
