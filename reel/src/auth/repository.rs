use super::error::AuthError;
use super::models::User;
use async_trait::async_trait;

/// In-place edit of a stored user; returns false to leave the record untouched
pub type UserChange<'a> = dyn Fn(&mut User) -> Result<bool, AuthError> + Send + Sync + 'a;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user; fails if the username or email is taken
    async fn create(&self, user: User) -> Result<User, AuthError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AuthError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError>;

    /// Lookup is case-insensitive
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;

    /// Apply `change` to the stored user as one atomic read-modify-write,
    /// keeping the username and email indexes in step. `change` may run more
    /// than once if the record is contended.
    async fn modify(&self, id: &str, change: &UserChange<'_>) -> Result<User, AuthError>;

    async fn username_exists(&self, username: &str) -> Result<bool, AuthError>;

    async fn email_exists(&self, email: &str) -> Result<bool, AuthError>;
}
