use super::error::AuthError;
use super::models::User;
use super::session::generate_token;
use async_trait::async_trait;
use moka::future::Cache;
use std::time::{Duration, Instant};
use tracing::info;

/// Single-use password reset tokens, each mapped to a user id
#[derive(Clone)]
pub struct ResetTokenStore {
    // token -> (user id, deadline)
    tokens: Cache<String, (String, Instant)>,
    ttl: Duration,
}

impl ResetTokenStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            tokens: Cache::builder().time_to_live(ttl).build(),
            ttl,
        }
    }

    /// Issue a fresh token for `user_id`
    pub async fn issue(&self, user_id: &str) -> String {
        let token = generate_token();
        let deadline = Instant::now() + self.ttl;
        self.tokens
            .insert(token.clone(), (user_id.to_string(), deadline))
            .await;
        token
    }

    /// Consume a token, returning the user id it was issued for
    pub async fn redeem(&self, token: &str) -> Option<String> {
        let (user_id, deadline) = self.tokens.remove(token).await?;
        (Instant::now() < deadline).then_some(user_id)
    }
}

/// Delivers reset tokens to account owners
#[async_trait]
pub trait ResetNotifier: Send + Sync {
    async fn send_reset_token(&self, user: &User, token: &str) -> Result<(), AuthError>;
}

/// Writes the token to the log instead of mailing it
#[derive(Debug, Default, Clone, Copy)]
pub struct LogResetNotifier;

#[async_trait]
impl ResetNotifier for LogResetNotifier {
    async fn send_reset_token(&self, user: &User, token: &str) -> Result<(), AuthError> {
        info!(
            "Password reset requested for {} <{}>, token: {}",
            user.username, user.email, token
        );
        Ok(())
    }
}
