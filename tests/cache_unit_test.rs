//! Unit tests for the query cache.
//!
//! Run with: cargo test --test cache_unit_test

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use repair_console::error::AppError;
use repair_console::services::QueryCache;
use repair_console::services::cache::{self, Invalidation};

fn new_cache() -> QueryCache {
    QueryCache::with_limits(64, Duration::from_secs(300))
}

#[test]
fn cache_key_builds_correctly() {
    assert_eq!(cache::cache_key("customers", &[]), "customers");
    assert_eq!(cache::models_key(7), "models:7");
    assert_eq!(cache::stats_key("2025-01"), "entries-stats:2025-01");

    // Empty components preserved (ensures query uniqueness)
    assert_ne!(
        cache::cache_key("models", &["7", ""]),
        cache::cache_key("models", &["7"])
    );
}

#[test]
fn invalidation_scope() {
    let key = Invalidation::Key(cache::CUSTOMERS.to_string());
    assert!(key.affects("customers"));
    assert!(!key.affects("customers:extra"));

    let prefix = Invalidation::Prefix("models:".to_string());
    assert!(prefix.affects("models:3"));
    assert!(!prefix.affects("all-models"));
}

#[tokio::test]
async fn second_read_is_served_from_cache() {
    let cache = new_cache();
    let counter = AtomicUsize::new(0);
    let fetches = &counter;

    for _ in 0..3 {
        let value: Vec<String> = cache
            .get_or_fetch(cache::DEVICES, move || async move {
                fetches.fetch_add(1, Ordering::SeqCst);
                Ok(vec!["Phone".to_string()])
            })
            .await
            .expect("fetch devices");
        assert_eq!(value, vec!["Phone".to_string()]);
    }

    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert!(cache.peek(cache::DEVICES).await.is_some());
}

#[tokio::test]
async fn failed_fetch_is_not_stored() {
    let cache = new_cache();

    let result: Result<Vec<String>, AppError> = cache
        .get_or_fetch(cache::CUSTOMERS, || async {
            Err(AppError::Api {
                message: "down".to_string(),
            })
        })
        .await;
    tokio_test::assert_err!(result);
    assert!(cache.peek(cache::CUSTOMERS).await.is_none());
}

#[tokio::test]
async fn invalidate_forces_refetch_and_notifies() {
    let cache = new_cache();
    let mut events = cache.subscribe();
    let counter = AtomicUsize::new(0);
    let fetches = &counter;
    let fetch = move || async move { Ok::<_, AppError>(fetches.fetch_add(1, Ordering::SeqCst)) };

    assert_eq!(cache.get_or_fetch(cache::CUSTOMERS, fetch).await.expect("first"), 0);
    assert_eq!(cache.get_or_fetch(cache::CUSTOMERS, fetch).await.expect("cached"), 0);

    cache.invalidate(cache::CUSTOMERS).await;
    assert_eq!(
        events.recv().await.expect("invalidation event"),
        Invalidation::Key(cache::CUSTOMERS.to_string())
    );

    assert_eq!(cache.get_or_fetch(cache::CUSTOMERS, fetch).await.expect("refetched"), 1);
}

#[tokio::test]
async fn prefix_invalidation_only_touches_matching_keys() {
    let cache = new_cache();
    let mut events = cache.subscribe();

    for key in [cache::models_key(1), cache::models_key(2), cache::ALL_MODELS.to_string()] {
        let _: String = cache
            .get_or_fetch(&key, || async { Ok("cached".to_string()) })
            .await
            .expect("seed");
    }

    cache.invalidate_prefix("models:").await;
    assert_eq!(
        events.recv().await.expect("invalidation event"),
        Invalidation::Prefix("models:".to_string())
    );

    assert!(cache.peek(&cache::models_key(1)).await.is_none());
    assert!(cache.peek(&cache::models_key(2)).await.is_none());
    assert!(cache.peek(cache::ALL_MODELS).await.is_some());
}

#[tokio::test]
async fn read_overlapping_an_invalidation_is_not_stored() {
    let cache = new_cache();
    let (started_tx, started) = tokio::sync::oneshot::channel::<()>();
    let (release, gate) = tokio::sync::oneshot::channel::<()>();

    let in_flight = cache.get_or_fetch(cache::CUSTOMERS, || async move {
        let _ = started_tx.send(());
        gate.await.expect("fetch released");
        Ok::<_, AppError>(vec![1])
    });
    let write = async {
        started.await.expect("fetch started");
        cache.invalidate(cache::CUSTOMERS).await;
        release.send(()).expect("fetch still waiting");
    };

    let (pre_write, ()) = tokio::join!(in_flight, write);
    assert_eq!(pre_write.expect("in-flight read"), vec![1]);
    assert!(cache.peek(cache::CUSTOMERS).await.is_none());

    let fresh: Vec<i32> = cache
        .get_or_fetch(cache::CUSTOMERS, || async { Ok(vec![1, 2]) })
        .await
        .expect("refetch");
    assert_eq!(fresh, vec![1, 2]);
    assert!(cache.peek(cache::CUSTOMERS).await.is_some());
}
