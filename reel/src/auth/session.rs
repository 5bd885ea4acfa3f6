use super::models::User;
use chrono::DateTime;
use std::time::{SystemTime, UNIX_EPOCH};

/// Session token type - a secure random string
pub type SessionToken = String;

/// Get current timestamp in milliseconds since Unix epoch
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Format a timestamp (ms since epoch) as ISO 8601 UTC string
pub fn format_utc_time(timestamp_ms: u64) -> String {
    DateTime::from_timestamp_millis(timestamp_ms as i64)
        .unwrap_or_default()
        .format("%Y-%m-%dT%H:%M:%SZ")
        .to_string()
}

/// A logged-in user. Only the id is kept so profile edits are visible to
/// every open session.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: SessionToken,
    pub user_id: String,
    pub username: String,
    pub created_at: u64,
    pub expires_at: u64,
    pub last_accessed: u64,
    pub client_ip: Option<String>,
}

impl Session {
    pub fn new(token: SessionToken, user: &User, ttl_ms: u64, client_ip: Option<String>) -> Self {
        let now = current_timestamp_ms();

        Self {
            token,
            user_id: user.id.clone(),
            username: user.username.clone(),
            created_at: now,
            expires_at: now.saturating_add(ttl_ms),
            last_accessed: now,
            client_ip,
        }
    }

    pub fn is_expired(&self) -> bool {
        current_timestamp_ms() >= self.expires_at
    }

    pub fn update_last_accessed(&mut self) {
        self.last_accessed = current_timestamp_ms();
    }

    pub fn remaining_ttl_ms(&self) -> u64 {
        self.expires_at.saturating_sub(current_timestamp_ms())
    }

    pub fn expires_at_utc(&self) -> String {
        format_utc_time(self.expires_at)
    }
}

/// Generate a cryptographically secure random token (32 bytes, hex encoded)
pub fn generate_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
