//! TTL cache injected into every market tool
//!
//! One [`TimedCache`] per tool, each with that tool's lifespan. Entries are
//! keyed by the identifier the tool was asked about, the tool name and a
//! fingerprint of the remaining arguments.

use cached::{Cached, TimedCache};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::MarketConfig;

/// Cache key for one tool request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    /// Symbol or search query, upper-cased for symbols
    pub identifier: String,
    /// Tool that produced the payload
    pub tool: String,
    /// Compact JSON of the arguments that shape the payload
    pub fingerprint: String,
}

impl CacheKey {
    pub fn new(identifier: impl Into<String>, tool: impl Into<String>, args: &Value) -> Self {
        Self {
            identifier: identifier.into(),
            tool: tool.into(),
            fingerprint: fingerprint(args),
        }
    }
}

/// Compact JSON with object keys sorted at every level
fn fingerprint(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let fields: Vec<String> = entries
                .into_iter()
                .map(|(k, v)| format!("{}:{}", Value::String(k.clone()), fingerprint(v)))
                .collect();
            format!("{{{}}}", fields.join(","))
        }
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(fingerprint).collect();
            format!("[{}]", items.join(","))
        }
        other => other.to_string(),
    }
}

/// A cached payload and when it was fetched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub payload: Value,
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(payload: Value) -> Self {
        Self {
            payload,
            fetched_at: Utc::now(),
        }
    }

    /// Payload with `fetched_at` added when it is a JSON object
    pub fn into_payload(self) -> Value {
        match self.payload {
            Value::Object(mut map) => {
                map.insert(
                    "fetched_at".to_string(),
                    Value::String(self.fetched_at.to_rfc3339()),
                );
                Value::Object(map)
            }
            other => other,
        }
    }
}

type Store = HashMap<String, TimedCache<CacheKey, CacheEntry>>;

/// Shared, cloneable cache service
#[derive(Clone)]
pub struct CacheService {
    stores: Arc<RwLock<Store>>,
    ttls: Arc<HashMap<String, Duration>>,
    default_ttl: Duration,
}

impl CacheService {
    /// Cache where every tool uses `default_ttl`
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            stores: Arc::new(RwLock::new(HashMap::new())),
            ttls: Arc::new(HashMap::new()),
            default_ttl,
        }
    }

    /// Cache with the per-tool lifespans from `config`
    pub fn from_config(config: &MarketConfig) -> Self {
        Self::new(config.cache_ttl_quote)
            .with_ttl("get_quote", config.cache_ttl_quote)
            .with_ttl("get_indicators", config.cache_ttl_indicators)
            .with_ttl("get_news_sentiment", config.cache_ttl_sentiment)
            .with_ttl("get_fear_greed", config.cache_ttl_sentiment)
            .with_ttl("web_search", config.cache_ttl_search)
    }

    /// Override the lifespan for one tool; call before first use
    pub fn with_ttl(mut self, tool: impl Into<String>, ttl: Duration) -> Self {
        Arc::make_mut(&mut self.ttls).insert(tool.into(), ttl);
        self
    }

    /// Lifespan applied to `tool`
    pub fn ttl(&self, tool: &str) -> Duration {
        self.ttls.get(tool).copied().unwrap_or(self.default_ttl)
    }

    /// Get an unexpired entry
    pub async fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        let mut stores = self.stores.write().await;
        stores.get_mut(&key.tool)?.cache_get(key).cloned()
    }

    /// Insert or replace an entry, dropping the tool's expired entries first
    pub async fn insert(&self, key: CacheKey, entry: CacheEntry) {
        let ttl = self.ttl(&key.tool);
        let mut stores = self.stores.write().await;
        let store = stores
            .entry(key.tool.clone())
            .or_insert_with(|| TimedCache::with_lifespan(ttl));
        store.flush();
        let _ = store.cache_set(key, entry);
    }

    /// Return the cached entry, or run `fetcher` and cache its payload
    ///
    /// Fetch errors are returned as-is and nothing is cached.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: CacheKey, fetcher: F) -> Result<CacheEntry, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, E>>,
    {
        if let Some(entry) = self.get(&key).await {
            debug!(tool = %key.tool, identifier = %key.identifier, "cache hit");
            return Ok(entry);
        }

        debug!(tool = %key.tool, identifier = %key.identifier, "cache miss");
        let entry = CacheEntry::new(fetcher().await?);
        self.insert(key, entry.clone()).await;
        Ok(entry)
    }

    /// Drop a single entry
    pub async fn invalidate(&self, key: &CacheKey) {
        let mut stores = self.stores.write().await;
        if let Some(store) = stores.get_mut(&key.tool) {
            let _ = store.cache_remove(key);
        }
    }

    /// Remove every expired entry
    pub async fn evict_expired(&self) {
        let mut stores = self.stores.write().await;
        for store in stores.values_mut() {
            store.flush();
        }
    }

    /// Clear all cached entries
    pub async fn clear(&self) {
        let mut stores = self.stores.write().await;
        stores.clear();
    }

    /// Number of stored entries, expired ones included until evicted
    pub async fn len(&self) -> usize {
        let stores = self.stores.read().await;
        stores.values().map(|store| store.cache_size()).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for CacheService {
    fn default() -> Self {
        Self::from_config(&MarketConfig::default())
    }
}
