use super::models::User;
use super::session::{Session, SessionToken};
use async_trait::async_trait;
use shared::Result;
use std::sync::Arc;

/// Trait for session storage operations
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Create a new session for the given user with specified TTL and optional client IP
    async fn create_session(
        &self,
        user: &User,
        ttl_ms: u64,
        client_ip: Option<String>,
    ) -> Result<Session>;

    /// Look up a live session; `Error::NotFound` if unknown or expired
    async fn get_session(&self, token: &SessionToken) -> Result<Session>;

    /// Delete a session (logout)
    async fn delete_session(&self, token: &SessionToken) -> Result<bool>;

    /// Delete all sessions of a user, returning how many were removed
    async fn delete_user_sessions(&self, user_id: &str) -> Result<usize>;
}

/// Session store service
pub struct SessionStore<S: SessionRepository> {
    repository: Arc<S>,
    ttl_ms: u64,
}

impl<S: SessionRepository> SessionStore<S> {
    pub fn new(repository: Arc<S>, ttl_ms: u64) -> Self {
        Self { repository, ttl_ms }
    }

    /// Create a new session for a user with the store's TTL
    pub async fn create_session(&self, user: &User, client_ip: Option<String>) -> Result<Session> {
        self.repository
            .create_session(user, self.ttl_ms, client_ip)
            .await
    }

    /// Validate a session token and return the session
    pub async fn validate_session(&self, token: &SessionToken) -> Result<Session> {
        self.repository.get_session(token).await
    }

    /// Invalidate a session (logout)
    pub async fn invalidate_session(&self, token: &SessionToken) -> Result<bool> {
        self.repository.delete_session(token).await
    }

    /// Invalidate all sessions for a user (logout all devices)
    pub async fn invalidate_user_sessions(&self, user_id: &str) -> Result<usize> {
        self.repository.delete_user_sessions(user_id).await
    }
}
