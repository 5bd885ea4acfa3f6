use crate::domain::{CacheEntry, CachedPayload, Genre, MovieItem, QueryFingerprint, UpstreamPage};
use async_trait::async_trait;
use shared::Result;
use std::time::Duration;

// Ports are the pluggable extension points for the cache backend and the
// movie-data provider

/// Port for the query cache (e.g., Moka)
#[async_trait]
pub trait QueryCache: Send + Sync + 'static {
    /// Returns `None` when the fingerprint was never stored or its entry expired
    async fn get(&self, fingerprint: &QueryFingerprint) -> Option<CacheEntry>;

    /// Store `value` until `now + ttl`, replacing any previous entry
    async fn put(&self, fingerprint: QueryFingerprint, value: CachedPayload, ttl: Duration);

    /// Approximate number of live entries
    fn entry_count(&self) -> u64;
}

/// Port for the upstream movie-data provider.
///
/// Each call issues exactly one request; every failure is reported as
/// `Error::UpstreamUnavailable`.
#[async_trait]
pub trait MovieProvider: Send + Sync + 'static {
    async fn search(&self, query: &str, page: u32) -> Result<UpstreamPage>;

    async fn trending(&self, page: u32) -> Result<UpstreamPage>;

    async fn genres(&self) -> Result<Vec<Genre>>;

    async fn details(&self, id: u64) -> Result<MovieItem>;

    async fn recommendations(&self, id: u64, page: u32) -> Result<UpstreamPage>;

    async fn similar(&self, id: u64, page: u32) -> Result<UpstreamPage>;
}
