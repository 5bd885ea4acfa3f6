use crate::domain::{
    CachedPayload, Genre, MovieItem, Operation, PageRequest, PagedResult, QueryFingerprint,
    UpstreamPage,
};
use crate::ports::{MovieProvider, QueryCache};
use shared::Result;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Application service in front of the movie-data provider.
///
/// Search, trending and genre listings are memoized in the query cache for a
/// fixed TTL. Details, recommendations and similar titles always go upstream.
/// Concurrent misses on one fingerprint are not coalesced; each calls the
/// provider and the last write wins.
#[derive(Clone)]
pub struct CatalogService {
    provider: Arc<dyn MovieProvider>,
    cache: Arc<dyn QueryCache>,
    ttl: Duration,
}

impl CatalogService {
    pub fn new(provider: Arc<dyn MovieProvider>, cache: Arc<dyn QueryCache>, ttl: Duration) -> Self {
        Self {
            provider,
            cache,
            ttl,
        }
    }

    pub async fn search(&self, query: &str, request: PageRequest) -> Result<Arc<PagedResult>> {
        let fingerprint = QueryFingerprint::builder(Operation::Search)
            .param("query", query)
            .param("page", request.page)
            .param("limit", request.limit)
            .build();

        self.cached_page(Operation::Search, fingerprint, request, || {
            self.provider.search(query, request.page)
        })
        .await
    }

    pub async fn trending(&self, request: PageRequest) -> Result<Arc<PagedResult>> {
        let fingerprint = QueryFingerprint::builder(Operation::Trending)
            .param("page", request.page)
            .param("limit", request.limit)
            .build();

        self.cached_page(Operation::Trending, fingerprint, request, || {
            self.provider.trending(request.page)
        })
        .await
    }

    pub async fn genres(&self) -> Result<Arc<Vec<Genre>>> {
        let fingerprint = QueryFingerprint::builder(Operation::Genres).build();

        if let Some(entry) = self.cache.get(&fingerprint).await {
            if let CachedPayload::Genres(genres) = entry.value {
                debug!("Cache hit for key: {}", fingerprint);
                return Ok(genres);
            }
        }

        debug!("Cache miss for key: {}", fingerprint);
        let genres = self
            .provider
            .genres()
            .await
            .inspect_err(|e| warn!("Upstream {} failed: {}", Operation::Genres, e))?;

        let genres = Arc::new(genres);
        self.cache
            .put(fingerprint, CachedPayload::Genres(genres.clone()), self.ttl)
            .await;

        Ok(genres)
    }

    pub async fn details(&self, id: u64) -> Result<MovieItem> {
        self.provider
            .details(id)
            .await
            .inspect_err(|e| warn!("Upstream {} for movie {} failed: {}", Operation::Details, id, e))
    }

    pub async fn recommendations(&self, id: u64, request: PageRequest) -> Result<PagedResult> {
        let upstream = self
            .provider
            .recommendations(id, request.page)
            .await
            .inspect_err(|e| {
                warn!(
                    "Upstream {} for movie {} failed: {}",
                    Operation::Recommendations,
                    id,
                    e
                )
            })?;

        Ok(PagedResult::from_upstream(upstream, request))
    }

    pub async fn similar(&self, id: u64, request: PageRequest) -> Result<PagedResult> {
        let upstream = self
            .provider
            .similar(id, request.page)
            .await
            .inspect_err(|e| warn!("Upstream {} for movie {} failed: {}", Operation::Similar, id, e))?;

        Ok(PagedResult::from_upstream(upstream, request))
    }

    pub fn cached_queries(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Serve a paginated read from cache, or fetch, slice and store it
    async fn cached_page<F, Fut>(
        &self,
        operation: Operation,
        fingerprint: QueryFingerprint,
        request: PageRequest,
        fetch: F,
    ) -> Result<Arc<PagedResult>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<UpstreamPage>>,
    {
        debug_assert!(operation.is_cacheable(), "{operation} bypasses the cache");

        if let Some(entry) = self.cache.get(&fingerprint).await {
            if let CachedPayload::Page(page) = entry.value {
                debug!("Cache hit for key: {}", fingerprint);
                return Ok(page);
            }
        }

        debug!("Cache miss for key: {}", fingerprint);
        let upstream = fetch()
            .await
            .inspect_err(|e| warn!("Upstream {} failed: {}", operation, e))?;

        let page = Arc::new(PagedResult::from_upstream(upstream, request));
        self.cache
            .put(fingerprint, CachedPayload::Page(page.clone()), self.ttl)
            .await;

        Ok(page)
    }
}

impl std::fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogService")
            .field("ttl", &self.ttl)
            .field("cached_queries", &self.cache.entry_count())
            .finish()
    }
}
