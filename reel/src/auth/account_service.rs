use super::error::AuthError;
use super::models::{User, normalize_email};
use super::password::{hash_password, validate_password_strength, verify_password};
use super::repository::UserRepository;
use super::reset::{ResetNotifier, ResetTokenStore};
use std::sync::Arc;
use tracing::{debug, info};

/// Registration, profile, watchlist and password management
pub struct AccountService {
    user_repo: Arc<dyn UserRepository>,
    reset_tokens: ResetTokenStore,
    notifier: Arc<dyn ResetNotifier>,
}

impl AccountService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        reset_tokens: ResetTokenStore,
        notifier: Arc<dyn ResetNotifier>,
    ) -> Self {
        Self {
            user_repo,
            reset_tokens,
            notifier,
        }
    }

    /// Create a new account
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let username = required("Username", username)?;
        let email = required("Email", email)?;
        if password.is_empty() {
            return Err(AuthError::MissingField("Password"));
        }
        validate_username(username)?;
        validate_email(email)?;

        if self.user_repo.username_exists(username).await? {
            return Err(AuthError::UserAlreadyExists);
        }
        if self.user_repo.email_exists(email).await? {
            return Err(AuthError::EmailAlreadyExists);
        }

        let password_hash = hash_password(password)?;
        let user = self
            .user_repo
            .create(User::new(username.to_string(), email.to_string(), password_hash))
            .await?;

        info!("Registered user {}", user.username);
        Ok(user)
    }

    pub async fn get_user_by_id(&self, id: &str) -> Result<User, AuthError> {
        self.user_repo
            .find_by_id(id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Change username and email together; both are required
    pub async fn update_details(
        &self,
        user_id: &str,
        email: &str,
        username: &str,
    ) -> Result<User, AuthError> {
        let email = normalize_email(required("Email", email)?);
        let username = required("Username", username)?;
        validate_username(username)?;
        validate_email(&email)?;

        self.user_repo
            .modify(user_id, &|user| {
                user.email = email.clone();
                user.username = username.to_string();
                Ok(true)
            })
            .await
    }

    /// Replace the preference list wholesale
    pub async fn update_preferences(
        &self,
        user_id: &str,
        preferences: Vec<String>,
    ) -> Result<User, AuthError> {
        self.user_repo
            .modify(user_id, &|user| {
                user.preferences = preferences.clone();
                Ok(true)
            })
            .await
    }

    /// Add a movie to the watchlist; adding one already present is a no-op
    pub async fn add_to_watchlist(&self, user_id: &str, movie_id: u64) -> Result<User, AuthError> {
        self.user_repo
            .modify(user_id, &|user| Ok(user.add_to_watchlist(movie_id)))
            .await
    }

    pub async fn get_watchlist(&self, user_id: &str) -> Result<Vec<u64>, AuthError> {
        Ok(self.get_user_by_id(user_id).await?.watchlist)
    }

    /// Change password after checking the current one
    pub async fn change_password(
        &self,
        user_id: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<User, AuthError> {
        let current = self.get_user_by_id(user_id).await?;
        if !verify_password(old_password, &current.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let password_hash = hash_password(new_password)?;
        self.set_password_hash(user_id, password_hash).await
    }

    /// Issue a reset token and hand it to the notifier. Unknown emails succeed
    /// without issuing anything.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let email = required("Email", email)?;

        let Some(user) = self.user_repo.find_by_email(email).await? else {
            debug!("Password reset requested for unknown email");
            return Ok(());
        };

        let token = self.reset_tokens.issue(&user.id).await;
        self.notifier.send_reset_token(&user, &token).await
    }

    /// Set a new password using a reset token; the token is consumed
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<User, AuthError> {
        let token = required("Token", token)?;
        validate_password_strength(new_password)?;

        let user_id = self
            .reset_tokens
            .redeem(token)
            .await
            .ok_or(AuthError::InvalidResetToken)?;

        let password_hash = hash_password(new_password)?;
        let user = self.set_password_hash(&user_id, password_hash).await?;
        info!("Password reset for user {}", user.username);
        Ok(user)
    }

    async fn set_password_hash(&self, user_id: &str, password_hash: String) -> Result<User, AuthError> {
        self.user_repo
            .modify(user_id, &|user| {
                user.password_hash = password_hash.clone();
                Ok(true)
            })
            .await
    }
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, AuthError> {
    let value = value.trim();
    if value.is_empty() {
        Err(AuthError::MissingField(field))
    } else {
        Ok(value)
    }
}

/// Usernames never contain `@`, so a login with one is always an email
fn validate_username(username: &str) -> Result<(), AuthError> {
    if username.contains('@') {
        Err(AuthError::InvalidUsername)
    } else {
        Ok(())
    }
}

/// One `@`, a non-empty local part and a dotted domain
pub fn validate_email(email: &str) -> Result<(), AuthError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
                && domain
                    .split_once('.')
                    .is_some_and(|(host, rest)| !host.is_empty() && !rest.is_empty() && !rest.ends_with('.'))
        }
        None => false,
    };

    if valid { Ok(()) } else { Err(AuthError::InvalidEmail) }
}
