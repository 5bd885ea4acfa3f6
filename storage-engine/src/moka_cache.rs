use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use reel::domain::{CacheEntry, CachedPayload, QueryFingerprint};
use reel::ports::QueryCache;
use shared::config::CacheSettings;
use std::fmt::Debug;
use std::time::{Duration, Instant};
use tracing::debug;

/// Expires every entry after the TTL it was stored with
struct EntryTtl;

impl Expiry<QueryFingerprint, CacheEntry> for EntryTtl {
    fn expire_after_create(
        &self,
        _key: &QueryFingerprint,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl())
    }

    // An overwrite restarts the clock with the new entry's TTL
    fn expire_after_update(
        &self,
        _key: &QueryFingerprint,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl())
    }
}

/// Moka-based query cache with per-entry TTL
/// Provides lock-free, concurrent cache with optional size bounds
pub struct MokaQueryCache {
    cache: Cache<QueryFingerprint, CacheEntry>,
}

impl MokaQueryCache {
    /// Create a new unbounded cache
    pub fn new_unbounded() -> Self {
        Self {
            cache: Cache::builder().expire_after(EntryTtl).build(),
        }
    }

    /// Create a new bounded cache; least valuable entries are evicted past `max_entries`
    pub fn new_bounded(max_entries: u64) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(max_entries)
                .expire_after(EntryTtl)
                .build(),
        }
    }

    pub fn from_settings(settings: &CacheSettings) -> Self {
        match settings.max_entries {
            0 => Self::new_unbounded(),
            max => Self::new_bounded(max),
        }
    }
}

#[async_trait]
impl QueryCache for MokaQueryCache {
    async fn get(&self, fingerprint: &QueryFingerprint) -> Option<CacheEntry> {
        let entry = self.cache.get(fingerprint).await?;

        // Moka evicts lazily; never hand out an entry past its deadline
        if entry.is_expired() {
            debug!("Dropping expired entry for key: {}", fingerprint);
            self.cache.invalidate(fingerprint).await;
            return None;
        }

        Some(entry)
    }

    async fn put(&self, fingerprint: QueryFingerprint, value: CachedPayload, ttl: Duration) {
        let entry = CacheEntry::new(fingerprint.clone(), value, ttl);
        self.cache.insert(fingerprint, entry).await;
    }

    fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Debug for MokaQueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaQueryCache")
            .field("entry_count", &self.cache.entry_count())
            .field("weighted_size", &self.cache.weighted_size())
            .finish()
    }
}
