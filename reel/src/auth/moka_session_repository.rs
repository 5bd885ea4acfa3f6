use super::models::User;
use super::session::{Session, SessionToken, generate_token};
use super::session_store::SessionRepository;
use async_trait::async_trait;
use moka::future::Cache;
use parking_lot::RwLock;
use shared::{Error, Result};
use std::sync::Arc;
use std::time::Duration;

type UserId = String;

/// Moka-based in-memory session repository with a per-user token index
pub struct MokaSessionRepository {
    // Primary index: token -> session
    sessions: Cache<SessionToken, Session>,
    // Secondary index: user id -> session tokens
    user_sessions: Cache<UserId, Arc<RwLock<Vec<SessionToken>>>>,
}

impl MokaSessionRepository {
    /// Create a repository with optional capacity and a cache-wide TTL
    pub fn new(max_sessions: Option<u64>, default_ttl: Option<Duration>) -> Self {
        let mut sessions_builder = Cache::builder();
        let mut user_sessions_builder = Cache::builder();

        if let Some(capacity) = max_sessions {
            sessions_builder = sessions_builder.max_capacity(capacity);
            user_sessions_builder = user_sessions_builder.max_capacity(capacity);
        }

        if let Some(ttl) = default_ttl {
            sessions_builder = sessions_builder.time_to_live(ttl);
            user_sessions_builder = user_sessions_builder.time_to_live(ttl);
        }

        Self {
            sessions: sessions_builder.build(),
            user_sessions: user_sessions_builder.build(),
        }
    }

    /// Unbounded, 1 hour TTL
    pub fn with_defaults() -> Self {
        Self::new(None, Some(Duration::from_secs(3600)))
    }
}

#[async_trait]
impl SessionRepository for MokaSessionRepository {
    async fn create_session(
        &self,
        user: &User,
        ttl_ms: u64,
        client_ip: Option<String>,
    ) -> Result<Session> {
        let token = generate_token();
        let session = Session::new(token.clone(), user, ttl_ms, client_ip);

        self.sessions.insert(token.clone(), session.clone()).await;

        let tokens_lock = self
            .user_sessions
            .get(&user.id)
            .await
            .unwrap_or_else(|| Arc::new(RwLock::new(Vec::new())));

        {
            let mut tokens = tokens_lock.write();
            tokens.retain(|t| self.sessions.contains_key(t));
            tokens.push(token);
        }

        self.user_sessions.insert(user.id.clone(), tokens_lock).await;

        Ok(session)
    }

    async fn get_session(&self, token: &SessionToken) -> Result<Session> {
        let mut session = self.sessions.get(token).await.ok_or(Error::NotFound)?;

        if session.is_expired() {
            self.sessions.invalidate(token).await;
            return Err(Error::NotFound);
        }

        session.update_last_accessed();
        self.sessions.insert(token.clone(), session.clone()).await;

        Ok(session)
    }

    async fn delete_session(&self, token: &SessionToken) -> Result<bool> {
        let session = self.sessions.remove(token).await;

        if let Some(data) = &session {
            if let Some(tokens_lock) = self.user_sessions.get(&data.user_id).await {
                tokens_lock.write().retain(|t| t != token);
            }
        }

        Ok(session.is_some())
    }

    async fn delete_user_sessions(&self, user_id: &str) -> Result<usize> {
        let Some(tokens_lock) = self.user_sessions.remove(user_id).await else {
            return Ok(0);
        };

        // Clone tokens to release lock before awaiting
        let token_list: Vec<SessionToken> = tokens_lock.read().clone();

        let mut count = 0;
        for token in token_list.iter() {
            if self.sessions.remove(token).await.is_some() {
                count += 1;
            }
        }

        Ok(count)
    }
}
