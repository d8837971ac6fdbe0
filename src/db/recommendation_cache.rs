//! Read-through cache for AI recommendation batches.
//!
//! The whole cache lives under a single key of the [`KeyValueStore`] as one JSON
//! object mapping fingerprint keys to [`CacheEntry`] values. Every read and write
//! pass deserializes the full object, purges expired entries and, when it
//! changed anything, writes the full object back.
//!
//! Storage problems never reach the caller: an unreadable or corrupt store
//! behaves like an empty one and a failed write is only logged.

use std::collections::HashMap;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Local, NaiveDate, TimeDelta, Utc};
use serde_json::json;

use crate::db::store::KeyValueStore;
use crate::models::{CacheEntry, RecommendationFilters, RecommendationRecord};

/// Key under which the serialized cache is persisted
pub const CACHE_STORAGE_KEY: &str = "cinematch_recommendations_cache";

/// How long a recommendation batch stays fresh (1 hour).
pub const CACHE_TTL_SECS: i64 = 60 * 60;

type StoreMap = HashMap<String, CacheEntry>;

/// Result of consulting the cache
///
/// Callers only see hit or miss; `Unavailable` exists so logs can tell a broken
/// store apart from a genuine miss.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    Hit(CacheEntry),
    Miss,
    Unavailable,
}

/// Computes the cache fingerprint for a set of filters
///
/// Special-occasion requests include today's local date so they refresh daily.
pub fn compute_key(filters: &RecommendationFilters, special: bool) -> String {
    compute_key_for_day(filters, special, Local::now().date_naive())
}

/// Same as [`compute_key`] with an explicit calendar day
pub fn compute_key_for_day(
    filters: &RecommendationFilters,
    special: bool,
    today: NaiveDate,
) -> String {
    // serde_json::Value orders object keys, which keeps the encoding canonical
    let mut fingerprint = json!({
        "genres": sorted(&filters.genres),
        "directors": sorted(&filters.directors),
        "actors": sorted(&filters.actors),
        "minYear": filters.min_year,
        "maxDuration": filters.max_duration,
        "includeAdult": filters.include_adult,
        "special": special,
    });

    if special {
        fingerprint["day"] = json!(today.format("%Y-%m-%d").to_string());
    }

    STANDARD.encode(fingerprint.to_string())
}

fn sorted(values: &[String]) -> Vec<&str> {
    let mut values: Vec<&str> = values.iter().map(String::as_str).collect();
    values.sort_unstable();
    values
}

/// Store-wide TTL cache of recommendation batches
#[derive(Clone)]
pub struct RecommendationCache {
    store: Arc<dyn KeyValueStore>,
    ttl: TimeDelta,
}

impl RecommendationCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_ttl(store, TimeDelta::seconds(CACHE_TTL_SECS))
    }

    pub fn with_ttl(store: Arc<dyn KeyValueStore>, ttl: TimeDelta) -> Self {
        Self { store, ttl }
    }

    /// Returns the cached batch for `key` while it is still fresh
    pub async fn get(&self, key: &str) -> Option<Vec<RecommendationRecord>> {
        self.get_at(key, Utc::now()).await
    }

    pub async fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<Vec<RecommendationRecord>> {
        match self.lookup_at(key, now).await {
            CacheLookup::Hit(entry) => {
                tracing::debug!(key = %key, expires_at = %entry.expires_at, "Recommendation cache hit");
                Some(entry.data)
            }
            CacheLookup::Miss => {
                tracing::debug!(key = %key, "Recommendation cache miss");
                None
            }
            CacheLookup::Unavailable => {
                tracing::debug!(key = %key, "Recommendation cache unavailable, treating as miss");
                None
            }
        }
    }

    /// Looks `key` up at instant `now`, purging every expired entry on the way
    pub async fn lookup_at(&self, key: &str, now: DateTime<Utc>) -> CacheLookup {
        let Some(mut entries) = self.load().await else {
            return CacheLookup::Unavailable;
        };

        if purge_expired(&mut entries, now) > 0 {
            self.persist(&entries).await;
        }

        match entries.remove(key) {
            Some(entry) => CacheLookup::Hit(entry),
            None => CacheLookup::Miss,
        }
    }

    /// Caches `records` under `key` for one TTL
    pub async fn put(&self, key: &str, records: &[RecommendationRecord]) {
        self.put_at(key, records, Utc::now()).await
    }

    pub async fn put_at(&self, key: &str, records: &[RecommendationRecord], now: DateTime<Utc>) {
        let mut entries = self.load().await.unwrap_or_default();
        purge_expired(&mut entries, now);

        entries.insert(
            key.to_string(),
            CacheEntry {
                data: records.to_vec(),
                created_at: now,
                expires_at: now + self.ttl,
            },
        );

        if self.persist(&entries).await {
            tracing::debug!(key = %key, records = records.len(), entries = entries.len(), "Cached recommendations");
        }
    }

    /// Drops the entry for `key`, if any
    pub async fn invalidate(&self, key: &str) {
        if let Some(mut entries) = self.load().await {
            if entries.remove(key).is_some() {
                self.persist(&entries).await;
            }
        }
    }

    /// Removes the whole persisted cache
    pub async fn clear(&self) {
        if let Err(e) = self.store.remove(CACHE_STORAGE_KEY).await {
            tracing::warn!(error = %e, "Failed to clear recommendation cache");
        }
    }

    /// Reads the persisted store; `None` means the store cannot be used
    async fn load(&self) -> Option<StoreMap> {
        let raw = match self.store.get(CACHE_STORAGE_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Some(StoreMap::new()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read recommendation cache");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(entries) => Some(entries),
            Err(e) => {
                tracing::warn!(error = %e, "Corrupt recommendation cache, ignoring it");
                None
            }
        }
    }

    /// Writes the full store back; failures are logged and reported as `false`
    async fn persist(&self, entries: &StoreMap) -> bool {
        let json = match serde_json::to_string(entries) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "Cache serialization error");
                return false;
            }
        };

        match self.store.set(CACHE_STORAGE_KEY, &json).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to persist recommendation cache");
                false
            }
        }
    }
}

fn purge_expired(entries: &mut StoreMap, now: DateTime<Utc>) -> usize {
    let before = entries.len();
    entries.retain(|_, entry| entry.is_valid_at(now));
    before - entries.len()
}
