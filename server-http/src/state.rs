use provider_tmdb::TmdbProvider;
use reel::auth::{
    AccountService, AuthService, LogResetNotifier, MokaSessionRepository, ResetTokenStore,
    SessionStore, SledUserRepository,
};
use reel::catalog::CatalogService;
use shared::config::Config;
use shared::{Error, Result};
use std::sync::Arc;
use storage_engine::MokaQueryCache;
use tracing::info;

/// Server state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogService,
    pub auth_service: Arc<AuthService>,
    pub accounts: Arc<AccountService>,
    pub session_store: Arc<SessionStore<MokaSessionRepository>>,
}

impl AppState {
    pub fn new(
        catalog: CatalogService,
        auth_service: Arc<AuthService>,
        accounts: Arc<AccountService>,
        session_store: Arc<SessionStore<MokaSessionRepository>>,
    ) -> Self {
        Self {
            catalog,
            auth_service,
            accounts,
            session_store,
        }
    }

    /// Wire the production adapters described by `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider = Arc::new(TmdbProvider::new(&config.provider)?);
        let cache = Arc::new(MokaQueryCache::from_settings(&config.cache));
        info!(
            "Query cache ready (ttl: {:?}, max entries: {})",
            config.cache.ttl, config.cache.max_entries
        );
        let catalog = CatalogService::new(provider, cache, config.cache.ttl);

        let data_dir = std::path::Path::new(&config.data_dir);
        std::fs::create_dir_all(data_dir)
            .map_err(|e| Error::Internal(format!("cannot create {}: {e}", config.data_dir)))?;

        let user_repo = Arc::new(
            SledUserRepository::new(data_dir.join("users.sled"))
                .map_err(|e| Error::Internal(format!("cannot open user store: {e}")))?,
        );

        let auth_service = Arc::new(AuthService::new(user_repo.clone()));
        let accounts = Arc::new(AccountService::new(
            user_repo,
            ResetTokenStore::new(config.reset_token_ttl),
            Arc::new(LogResetNotifier),
        ));

        let session_repository = Arc::new(MokaSessionRepository::new(
            None, // No max sessions limit
            Some(config.session_ttl),
        ));
        let session_store = Arc::new(SessionStore::new(
            session_repository,
            config.session_ttl.as_millis() as u64,
        ));

        Ok(Self::new(catalog, auth_service, accounts, session_store))
    }
}
