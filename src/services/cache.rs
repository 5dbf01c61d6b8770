//! Keyed response cache for shop reads.
//!
//! Every read goes through [`QueryCache::get_or_fetch`], which stores the raw
//! JSON of the backend collection under a string key. Writes call
//! [`QueryCache::invalidate`] (or [`QueryCache::invalidate_prefix`] for keyed
//! families such as `models:{deviceId}`) once the backend accepted them, so
//! the next read refetches.
//!
//! A fetch that was in flight while an invalidation ran does not store its
//! result: every invalidation bumps a generation counter, and a fetch only
//! keeps what it read if the generation is unchanged once it is stored.
//!
//! Invalidations are also published on a broadcast channel. Subscribers get
//! the invalidated key (or prefix) and decide for themselves whether to
//! refetch.
//!
//! # Keys
//!
//! | Key | Source |
//! |-----|--------|
//! | `devices` | `get-devices` |
//! | `customers` | `get-customers` |
//! | `entries` | `get-entries` |
//! | `all-models` | `get-all-models` |
//! | `models:{deviceId}` | `get-model?deviceId=` |
//! | `payment-pending` | `get-payment-pending` |
//! | `next-entry-id` | `get-next-entry-id` |
//! | `entries-stats:{yearMonth}` | `entries-stats` |

use moka::future::Cache;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::broadcast;

use crate::config::Config;
use crate::error::{AppError, AppResult};

pub const DEVICES: &str = "devices";
pub const CUSTOMERS: &str = "customers";
pub const ENTRIES: &str = "entries";
pub const ALL_MODELS: &str = "all-models";
pub const MODELS: &str = "models";
pub const PAYMENT_PENDING: &str = "payment-pending";
pub const NEXT_ENTRY_ID: &str = "next-entry-id";
pub const ENTRIES_STATS: &str = "entries-stats";

const NOTIFY_CAPACITY: usize = 64;

/// Build a cache key from a prefix and components.
///
/// Components are joined with `:` separator. Empty components are included
/// to ensure different queries produce different keys.
#[must_use]
pub fn cache_key(prefix: &str, components: &[&str]) -> String {
    let mut key = prefix.to_string();
    for c in components {
        key.push(':');
        key.push_str(c);
    }
    key
}

/// Key for the model list of one device.
#[must_use]
pub fn models_key(device_id: i64) -> String {
    cache_key(MODELS, &[&device_id.to_string()])
}

/// Key for the statistics of one `YYYY-MM` month.
#[must_use]
pub fn stats_key(year_month: &str) -> String {
    cache_key(ENTRIES_STATS, &[year_month])
}

/// Serialized response as stored in the cache.
#[derive(Clone, Debug)]
pub struct CachedResponse {
    pub data: Arc<Vec<u8>>,
}

/// What an invalidation covered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Invalidation {
    Key(String),
    Prefix(String),
}

impl Invalidation {
    /// Whether a subscriber interested in `key` should refetch.
    #[must_use]
    pub fn affects(&self, key: &str) -> bool {
        match self {
            Self::Key(k) => k == key,
            Self::Prefix(p) => key.starts_with(p.as_str()),
        }
    }
}

#[derive(Clone)]
pub struct QueryCache {
    responses: Cache<String, CachedResponse>,
    generation: Arc<AtomicU64>,
    notify: broadcast::Sender<Invalidation>,
}

impl QueryCache {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self::with_limits(
            config.cache_max_entries,
            Duration::from_secs(config.cache_ttl_seconds),
        )
    }

    #[must_use]
    pub fn with_limits(max_entries: u64, ttl: Duration) -> Self {
        let responses = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .support_invalidation_closures()
            .build();
        let (notify, _) = broadcast::channel(NOTIFY_CAPACITY);

        Self {
            responses,
            generation: Arc::new(AtomicU64::new(0)),
            notify,
        }
    }

    /// Cached value for `key`, fetching and storing it on a miss.
    ///
    /// A failed fetch is returned as-is and nothing is stored. Neither is a
    /// fetch that overlapped an invalidation; its value is still returned to
    /// this caller.
    ///
    /// # Errors
    ///
    /// Returns the fetch error, or `AppError::Internal` if the cached bytes
    /// cannot be decoded as `T`.
    pub async fn get_or_fetch<T, F, Fut>(&self, key: &str, fetch: F) -> AppResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        if let Some(cached) = self.responses.get(key).await {
            tracing::debug!(cache_key = %key, "cache_hit");
            return serde_json::from_slice(&cached.data)
                .map_err(|e| AppError::Internal(format!("Corrupt cache entry {key}: {e}")));
        }

        let generation = self.generation.load(Ordering::SeqCst);
        let value = fetch().await?;
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(cache_key = %key, "cache_store_skipped_after_invalidation");
            return Ok(value);
        }

        let bytes = serde_json::to_vec(&value).map_err(|e| AppError::Internal(e.to_string()))?;
        let size = bytes.len();
        self.responses
            .insert(
                key.to_string(),
                CachedResponse {
                    data: Arc::new(bytes),
                },
            )
            .await;

        // An invalidation may have landed between the check and the insert.
        if self.generation.load(Ordering::SeqCst) != generation {
            self.responses.invalidate(key).await;
            tracing::debug!(cache_key = %key, "cache_store_dropped_after_invalidation");
            return Ok(value);
        }

        tracing::debug!(cache_key = %key, size_bytes = size, "cache_stored");
        Ok(value)
    }

    /// Raw cached entry, if present.
    pub async fn peek(&self, key: &str) -> Option<CachedResponse> {
        self.responses.get(key).await
    }

    /// Drop one entry and notify subscribers.
    pub async fn invalidate(&self, key: &str) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.responses.invalidate(key).await;
        tracing::debug!(cache_key = %key, "cache_invalidated");
        let _ = self.notify.send(Invalidation::Key(key.to_string()));
    }

    /// Drop every entry whose key starts with `prefix` and notify subscribers.
    pub async fn invalidate_prefix(&self, prefix: &str) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let prefix_owned = prefix.to_string();
        if let Err(e) = self
            .responses
            .invalidate_entries_if(move |key, _| key.starts_with(&prefix_owned))
        {
            tracing::warn!(prefix = %prefix, error = %e, "cache_prefix_invalidation_failed");
        }
        tracing::debug!(prefix = %prefix, "cache_prefix_invalidated");
        let _ = self.notify.send(Invalidation::Prefix(prefix.to_string()));
    }

    /// Receive every invalidation from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Invalidation> {
        self.notify.subscribe()
    }
}
