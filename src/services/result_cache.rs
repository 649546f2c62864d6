use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::models::dividends::DividendRecord;

/// The cache backend could not be reached. Callers treat it as a miss.
#[derive(Debug, Error)]
#[error("cache unavailable: {0}")]
pub struct CacheUnavailable(pub String);

/// Short-lived cache of dividend reads keyed by `(netuid, hotkey)`.
///
/// Keys are compared exactly, hotkeys are case-sensitive. A record returned by
/// `get` always has `from_cache` set.
#[async_trait]
pub trait ResultCache: Send + Sync {
    async fn get(&self, netuid: u16, hotkey: &str) -> Result<Option<DividendRecord>, CacheUnavailable>;

    async fn put(&self, record: &DividendRecord, ttl: Duration) -> Result<(), CacheUnavailable>;
}

pub fn cache_key(netuid: u16, hotkey: &str) -> String {
    format!("dividends:{}:{}", netuid, hotkey)
}

#[derive(Clone)]
struct CachedDividend {
    record: DividendRecord,
    ttl: Duration,
}

/// Expires each entry after the ttl it was stored with.
struct PerEntryTtl;

impl Expiry<String, CachedDividend> for PerEntryTtl {
    fn expire_after_create(&self, _key: &String, value: &CachedDividend, _created_at: Instant) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedDividend,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process cache backed by moka.
#[derive(Clone)]
pub struct MokaResultCache {
    cache: Arc<Cache<String, CachedDividend>>,
}

impl MokaResultCache {
    pub fn new(max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryTtl)
            .build();

        Self {
            cache: Arc::new(cache),
        }
    }
}

#[async_trait]
impl ResultCache for MokaResultCache {
    async fn get(&self, netuid: u16, hotkey: &str) -> Result<Option<DividendRecord>, CacheUnavailable> {
        let key = cache_key(netuid, hotkey);

        Ok(self.cache.get(&key).await.map(|entry| {
            tracing::debug!("Cache hit for {}", key);
            DividendRecord {
                from_cache: true,
                ..entry.record
            }
        }))
    }

    async fn put(&self, record: &DividendRecord, ttl: Duration) -> Result<(), CacheUnavailable> {
        let entry = CachedDividend {
            record: DividendRecord {
                from_cache: false,
                ..record.clone()
            },
            ttl,
        };

        self.cache
            .insert(cache_key(record.netuid, &record.hotkey), entry)
            .await;

        Ok(())
    }
}
