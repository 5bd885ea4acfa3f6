use super::error::AuthError;
use super::models::User;
use super::password::verify_password;
use super::repository::UserRepository;
use std::sync::Arc;

pub struct AuthService {
    user_repo: Arc<dyn UserRepository>,
}

impl AuthService {
    pub fn new(user_repo: Arc<dyn UserRepository>) -> Self {
        Self { user_repo }
    }

    /// Authenticate by username or email and password. A login containing
    /// `@` is always an email.
    pub async fn authenticate(&self, login: &str, password: &str) -> Result<User, AuthError> {
        let login = login.trim();

        let user = if login.contains('@') {
            self.user_repo.find_by_email(login).await?
        } else {
            self.user_repo.find_by_username(login).await?
        }
        .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user)
    }
}
