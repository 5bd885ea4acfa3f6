use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account with its viewing preferences and watchlist
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    /// Free-form tags, usually genre names
    #[serde(default)]
    pub preferences: Vec<String>,
    /// Provider movie ids in insertion order, no duplicates
    #[serde(default)]
    pub watchlist: Vec<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            username,
            email: normalize_email(&email),
            password_hash,
            preferences: Vec::new(),
            watchlist: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a movie unless already present; returns whether it was added
    pub fn add_to_watchlist(&mut self, movie_id: u64) -> bool {
        if self.watchlist.contains(&movie_id) {
            return false;
        }
        self.watchlist.push(movie_id);
        true
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Emails are stored and looked up trimmed and lowercased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
