use std::time::Duration;
use tracing::warn;

/// Movie-data provider connection settings
#[derive(Clone, Debug)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

/// Query cache sizing and expiry
#[derive(Clone, Debug)]
pub struct CacheSettings {
    pub ttl: Duration,
    /// 0 means unbounded
    pub max_entries: u64,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_dir: String,
    pub allowed_origins: Vec<String>,
    pub provider: ProviderConfig,
    pub cache: CacheSettings,
    pub session_ttl: Duration,
    pub reset_token_ttl: Duration,
}

impl Config {
    const DEFAULT_HOST: &str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 5000;
    const DEFAULT_DATA_DIR: &str = "./data";
    const DEFAULT_PROVIDER_URL: &str = "https://api.themoviedb.org/3";
    const DEFAULT_PROVIDER_TIMEOUT_MS: u64 = 10_000;
    const DEFAULT_CACHE_TTL_SECS: u64 = 600;
    const DEFAULT_CACHE_MAX_ENTRIES: u64 = 10_000;
    const DEFAULT_SESSION_TTL_SECS: u64 = 3600;
    const DEFAULT_RESET_TOKEN_TTL_SECS: u64 = 900;

    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let number = |name: &str, default: u64| -> u64 {
            lookup(name)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(default)
        };

        let api_key = lookup("TMDB_API_KEY").unwrap_or_else(|| {
            warn!("TMDB_API_KEY not set, provider requests will be rejected");
            String::new()
        });

        Self {
            host: lookup("REEL_HOST").unwrap_or_else(|| Self::DEFAULT_HOST.to_string()),
            port: lookup("REEL_PORT")
                .and_then(|v| v.trim().parse::<u16>().ok())
                .unwrap_or(Self::DEFAULT_PORT),
            data_dir: lookup("REEL_DATA_DIR")
                .unwrap_or_else(|| Self::DEFAULT_DATA_DIR.to_string()),
            allowed_origins: lookup("REEL_ALLOWED_ORIGINS")
                .unwrap_or_else(|| "*".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            provider: ProviderConfig {
                base_url: lookup("TMDB_BASE_URL")
                    .unwrap_or_else(|| Self::DEFAULT_PROVIDER_URL.to_string())
                    .trim_end_matches('/')
                    .to_string(),
                api_key,
                timeout: Duration::from_millis(number(
                    "TMDB_TIMEOUT_MS",
                    Self::DEFAULT_PROVIDER_TIMEOUT_MS,
                )),
            },
            cache: CacheSettings {
                ttl: Duration::from_secs(number(
                    "REEL_CACHE_TTL_SECS",
                    Self::DEFAULT_CACHE_TTL_SECS,
                )),
                max_entries: number("REEL_CACHE_MAX_ENTRIES", Self::DEFAULT_CACHE_MAX_ENTRIES),
            },
            session_ttl: Duration::from_secs(number(
                "REEL_SESSION_TTL_SECS",
                Self::DEFAULT_SESSION_TTL_SECS,
            )),
            reset_token_ttl: Duration::from_secs(number(
                "REEL_RESET_TOKEN_TTL_SECS",
                Self::DEFAULT_RESET_TOKEN_TTL_SECS,
            )),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.is_empty() || self.allowed_origins.iter().any(|o| o == "*")
    }
}
