use async_trait::async_trait;
use reel::domain::{Genre, MovieItem, UpstreamPage};
use reel::ports::MovieProvider;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use shared::config::ProviderConfig;
use shared::{Error, Result, UpstreamFailure};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct GenreList {
    genres: Vec<Genre>,
}

/// Client for The Movie Database v3 API
#[derive(Debug, Clone)]
pub struct TmdbProvider {
    http_client: Client,
    base_url: String,
    api_key: String,
}

impl TmdbProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// One GET against `path`; the API key rides along on every call
    async fn get_json<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::upstream(UpstreamFailure::Status(status.as_u16())));
        }

        let body = response.bytes().await.map_err(classify)?;
        serde_json::from_slice(&body)
            .map_err(|e| Error::upstream(UpstreamFailure::Malformed(e.to_string())))
    }
}

fn classify(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::upstream(UpstreamFailure::Timeout)
    } else {
        Error::upstream(UpstreamFailure::Transport(err.to_string()))
    }
}

#[async_trait]
impl MovieProvider for TmdbProvider {
    async fn search(&self, query: &str, page: u32) -> Result<UpstreamPage> {
        self.get_json(
            "/search/movie",
            &[
                ("query", query.to_string()),
                ("page", page.to_string()),
                ("include_adult", "false".to_string()),
            ],
        )
        .await
    }

    async fn trending(&self, page: u32) -> Result<UpstreamPage> {
        self.get_json("/trending/movie/day", &[("page", page.to_string())])
            .await
    }

    async fn genres(&self) -> Result<Vec<Genre>> {
        let list: GenreList = self.get_json("/genre/movie/list", &[]).await?;
        Ok(list.genres)
    }

    async fn details(&self, id: u64) -> Result<MovieItem> {
        self.get_json(&format!("/movie/{id}"), &[]).await
    }

    async fn recommendations(&self, id: u64, page: u32) -> Result<UpstreamPage> {
        self.get_json(
            &format!("/movie/{id}/recommendations"),
            &[("page", page.to_string())],
        )
        .await
    }

    async fn similar(&self, id: u64, page: u32) -> Result<UpstreamPage> {
        self.get_json(&format!("/movie/{id}/similar"), &[("page", page.to_string())])
            .await
    }
}
