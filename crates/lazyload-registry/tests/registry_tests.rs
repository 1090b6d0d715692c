//! DeferredComponentRegistry Tests
//!
//! Coalescing, caching and retry behavior under real concurrency.

use lazyload_core::ResolutionError;
use lazyload_registry::{DeferredComponentRegistry, EntryState};
use lazyload_test_utils::{init_test_tracing, CountingLoader};
use once_cell::sync::Lazy;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Page {
    title: &'static str,
}

const SLOW: Duration = Duration::from_millis(50);

static DASHBOARD: Lazy<CountingLoader> = Lazy::new(CountingLoader::new);

static ROUTES: Lazy<DeferredComponentRegistry<Page>> = Lazy::new(|| {
    DeferredComponentRegistry::builder()
        .register(
            "dashboard",
            DASHBOARD.returning(Page { title: "Dashboard" }, Duration::from_millis(5)),
        )
        .build()
});

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_tasks_invoke_loader_once() {
    init_test_tracing();
    let loader = CountingLoader::new();
    let registry = Arc::new(
        DeferredComponentRegistry::builder()
            .register("editor", loader.returning(Page { title: "Editor" }, SLOW))
            .build(),
    );

    let handles: Vec<_> = (0..32)
        .map(|_| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.resolve("editor").await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap(), Ok(Page { title: "Editor" }));
    }
    assert_eq!(loader.calls(), 1);

    let stats = registry.stats();
    assert_eq!(stats.loader_invocations, 1);
    assert_eq!(stats.coalesced_calls + stats.cache_hits, 31);
    assert_eq!(stats.ready_count, 1);
}

#[tokio::test]
async fn failed_attempt_is_shared_then_retried() {
    let loader = CountingLoader::new();
    let registry = DeferredComponentRegistry::builder()
        .register("reports", loader.flaky(1, Page { title: "Reports" }))
        .build();

    let (a, b) = tokio::join!(registry.resolve("reports"), registry.resolve("reports"));
    let expected = ResolutionError::load_failed("reports", "chunk request 0 failed");
    assert_eq!(a, Err(expected.clone()));
    assert_eq!(b, Err(expected));
    assert_eq!(loader.calls(), 1);
    assert_eq!(registry.state("reports"), Some(EntryState::Failed));

    assert_eq!(
        registry.resolve("reports").await,
        Ok(Page { title: "Reports" })
    );
    assert_eq!(loader.calls(), 2);
    assert_eq!(registry.state("reports"), Some(EntryState::Ready));
}

#[tokio::test]
async fn abandoned_resolve_still_completes() {
    let loader = CountingLoader::new();
    let registry = DeferredComponentRegistry::builder()
        .register("admin", loader.returning(Page { title: "Admin" }, SLOW))
        .build();

    let abandoned = tokio::time::timeout(Duration::from_millis(1), registry.resolve("admin")).await;
    assert!(abandoned.is_err());
    assert_eq!(registry.state("admin"), Some(EntryState::Fetching));

    tokio::time::sleep(SLOW * 3).await;
    assert_eq!(registry.state("admin"), Some(EntryState::Ready));
    assert_eq!(registry.resolve("admin").await, Ok(Page { title: "Admin" }));
    assert_eq!(loader.calls(), 1);
}

#[tokio::test]
async fn preload_starts_shared_load() {
    let loader = CountingLoader::new();
    let registry = DeferredComponentRegistry::builder()
        .register("profile", loader.returning(Page { title: "Profile" }, SLOW))
        .build();

    registry.preload("profile").unwrap();
    registry.preload("profile").unwrap();
    assert_eq!(registry.state("profile"), Some(EntryState::Fetching));

    assert_eq!(registry.resolve("profile").await, Ok(Page { title: "Profile" }));
    registry.preload("profile").unwrap();
    assert_eq!(loader.calls(), 1);
}

#[tokio::test]
async fn unknown_names_are_reported() {
    let registry: DeferredComponentRegistry<Page> = DeferredComponentRegistry::new();
    assert!(registry.is_empty());
    assert_eq!(
        registry.resolve("nowhere").await,
        Err(ResolutionError::UnknownName("nowhere".to_string()))
    );
    assert_eq!(registry.state("nowhere"), None);
    assert!(!registry.contains("nowhere"));
}

#[tokio::test]
async fn entries_are_independent() {
    let good = CountingLoader::new();
    let bad = CountingLoader::new();
    let registry = DeferredComponentRegistry::builder()
        .register("good", good.returning(Page { title: "Good" }, Duration::ZERO))
        .register("bad", bad.flaky(usize::MAX, Page { title: "Bad" }))
        .build();

    assert!(registry.resolve("bad").await.is_err());
    assert_eq!(registry.resolve("good").await, Ok(Page { title: "Good" }));
    assert_eq!(registry.state("bad"), Some(EntryState::Failed));
    assert_eq!(registry.state("good"), Some(EntryState::Ready));
    assert_eq!(registry.names(), vec!["bad".to_string(), "good".to_string()]);
}

#[tokio::test]
async fn static_registry_resolves() {
    assert_eq!(ROUTES.resolve("dashboard").await, Ok(Page { title: "Dashboard" }));
    assert_eq!(ROUTES.resolve("dashboard").await, Ok(Page { title: "Dashboard" }));
    assert_eq!(DASHBOARD.calls(), 1);
}
