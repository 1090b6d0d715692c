//! Testing utilities for the lazyload workspace
//!
//! Scripted fetchers, counting loaders and request fixtures.

#![allow(missing_docs)]

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use lazyload_core::{AcquisitionError, LoadMode, LoaderConfig, ResourceRequest};
use lazyload_resource::{LoadedResource, ResourceFetcher};
use lazyload_viewport::{AnchorId, PollingObserver, Rect};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const VIEWPORT: Rect = Rect::new(0.0, 0.0, 1024.0, 768.0);
pub const PRIMARY_URL: &str = "/images/hero.jpg";
pub const EXTERNAL_URL: &str = "https://cdn.example.com/hero.jpg";

#[derive(Debug, Clone)]
pub enum Outcome {
    Load,
    NetworkError(&'static str),
    DecodeError(&'static str),
}

/// Fetcher answering from a per-URL script; unscripted URLs load
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    script: Mutex<HashMap<String, Outcome>>,
    calls: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn script(self, url: impl Into<String>, outcome: Outcome) -> Self {
        self.script.lock().insert(url.into(), outcome);
        self
    }

    pub fn failing(url: impl Into<String>) -> Self {
        Self::new().script(url, Outcome::NetworkError("404 Not Found"))
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl ResourceFetcher for ScriptedFetcher {
    async fn load(&self, url: &str) -> Result<LoadedResource, AcquisitionError> {
        self.calls.lock().push(url.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let outcome = self.script.lock().get(url).cloned().unwrap_or(Outcome::Load);
        match outcome {
            Outcome::Load => Ok(LoadedResource::new(url).with_natural_size(1600, 900)),
            Outcome::NetworkError(reason) => Err(AcquisitionError::network(url, reason)),
            Outcome::DecodeError(reason) => Err(AcquisitionError::decode(url, reason)),
        }
    }
}

/// Registry loader that counts invocations
#[derive(Debug, Clone, Default)]
pub struct CountingLoader {
    calls: Arc<AtomicUsize>,
}

impl CountingLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Loader resolving to `value` after `delay`
    pub fn returning<T>(
        &self,
        value: T,
        delay: Duration,
    ) -> impl Fn() -> BoxFuture<'static, Result<T, String>> + Send + Sync + 'static
    where
        T: Clone + Send + Sync + 'static,
    {
        let calls = Arc::clone(&self.calls);
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            let value = value.clone();
            async move {
                tokio::time::sleep(delay).await;
                Ok(value)
            }
            .boxed()
        }
    }

    /// Loader failing its first `failures` invocations, then resolving to `value`
    pub fn flaky<T>(
        &self,
        failures: usize,
        value: T,
    ) -> impl Fn() -> BoxFuture<'static, Result<T, String>> + Send + Sync + 'static
    where
        T: Clone + Send + Sync + 'static,
    {
        let calls = Arc::clone(&self.calls);
        move || {
            let attempt = calls.fetch_add(1, Ordering::SeqCst);
            let value = value.clone();
            async move {
                if attempt < failures {
                    Err(format!("chunk request {attempt} failed"))
                } else {
                    Ok(value)
                }
            }
            .boxed()
        }
    }
}

pub fn lazy_request() -> ResourceRequest {
    ResourceRequest::new(PRIMARY_URL)
        .with_intrinsic_size(800, 600)
        .with_load_mode(LoadMode::Lazy)
}

pub fn eager_request() -> ResourceRequest {
    lazy_request().with_load_mode(LoadMode::Eager)
}

pub fn external_request() -> ResourceRequest {
    ResourceRequest::new(EXTERNAL_URL).with_load_mode(LoadMode::Lazy)
}

pub fn test_config() -> LoaderConfig {
    LoaderConfig::default()
}

/// Observer with `anchor` placed `offset` pixels below the viewport
pub fn observer_with_anchor(anchor: AnchorId, offset: f64) -> Arc<PollingObserver> {
    let observer = Arc::new(PollingObserver::new());
    observer.set_anchor_bounds(anchor, Some(below_viewport(offset)));
    observer
}

pub fn below_viewport(offset: f64) -> Rect {
    Rect::new(0.0, VIEWPORT.bottom() + offset, 300.0, 200.0)
}

pub fn init_test_tracing() {
    let _ = lazyload_core::telemetry::init_tracing("debug");
}
