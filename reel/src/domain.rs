use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// A provider record (movie, person, ...) passed through untouched
pub type MovieItem = serde_json::Value;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: u64,
    pub name: String,
}

/// One page exactly as the provider returned it
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct UpstreamPage {
    pub total_results: u64,
    pub total_pages: u64,
    pub results: Vec<MovieItem>,
}

/// The shaped response for paginated operations.
///
/// `total_pages` and `total_results` are the provider's numbers; they are not
/// adjusted for the local `limit` cut applied to `results`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult {
    pub page: u32,
    pub total_pages: u64,
    pub total_results: u64,
    pub results: Vec<MovieItem>,
}

impl PagedResult {
    /// Keep the first `limit` items of an upstream page, in provider order
    pub fn from_upstream(upstream: UpstreamPage, request: PageRequest) -> Self {
        let mut results = upstream.results;
        results.truncate(request.limit as usize);

        Self {
            page: request.page,
            total_pages: upstream.total_pages,
            total_results: upstream.total_results,
            results,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(DEFAULT_PAGE),
            limit: limit.unwrap_or(DEFAULT_LIMIT),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Read operations offered by the catalog
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Search,
    Trending,
    Genres,
    Details,
    Recommendations,
    Similar,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Search => "search",
            Operation::Trending => "trending",
            Operation::Genres => "genres",
            Operation::Details => "details",
            Operation::Recommendations => "recommendations",
            Operation::Similar => "similar",
        }
    }

    pub fn is_cacheable(&self) -> bool {
        matches!(
            self,
            Operation::Search | Operation::Trending | Operation::Genres
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cache key identifying one logical query
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QueryFingerprint(String);

impl QueryFingerprint {
    pub fn builder(operation: Operation) -> FingerprintBuilder {
        FingerprintBuilder {
            key: operation.as_str().to_string(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Appends parameters in call order as `|name:len:value`.
///
/// The byte length in front of every value keeps free text from spelling out
/// another parameter list.
pub struct FingerprintBuilder {
    key: String,
}

impl FingerprintBuilder {
    pub fn param(mut self, name: &str, value: impl fmt::Display) -> Self {
        let value = value.to_string();
        self.key
            .push_str(&format!("|{}:{}:{}", name, value.len(), value));
        self
    }

    pub fn build(self) -> QueryFingerprint {
        QueryFingerprint(self.key)
    }
}

/// Values the query cache can hold
#[derive(Clone, Debug, PartialEq)]
pub enum CachedPayload {
    Page(Arc<PagedResult>),
    Genres(Arc<Vec<Genre>>),
}

#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub fingerprint: QueryFingerprint,
    pub value: CachedPayload,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(fingerprint: QueryFingerprint, value: CachedPayload, ttl: Duration) -> Self {
        let created_at = Utc::now();
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        let expires_at = created_at
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            fingerprint,
            value,
            created_at,
            expires_at,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Lifetime the entry was stored with
    pub fn ttl(&self) -> Duration {
        (self.expires_at - self.created_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}
