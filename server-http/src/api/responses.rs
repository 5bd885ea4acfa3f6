use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use reel::auth::{AuthError, User};
use serde::Serialize;
use shared::{Error, UpstreamFailure};
use tracing::error;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub message: String,
    pub cached_queries: u64,
}

/// Body of every error and of plain acknowledgements
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub type MessageResponse = ErrorResponse;

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse::new(message)))
}

/// Account view without the password hash
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub preferences: Vec<String>,
    pub watchlist: Vec<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            preferences: user.preferences,
            watchlist: user.watchlist,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: u64,
    pub expires_at: String,
    pub user: UserResponse,
}

/// Map a catalog failure to a status; `message` names the operation.
/// The catalog only reports upstream failures, anything else is a bug.
pub fn upstream_error(err: &Error, message: &str) -> ApiError {
    let status = match err {
        Error::UpstreamUnavailable(UpstreamFailure::Timeout) => StatusCode::GATEWAY_TIMEOUT,
        Error::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
        Error::NotFound | Error::Internal(_) => {
            error!("Unexpected catalog error: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    api_error(status, message)
}

pub fn auth_error(err: AuthError) -> ApiError {
    let status = match &err {
        AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AuthError::UserNotFound => StatusCode::NOT_FOUND,
        AuthError::UserAlreadyExists | AuthError::EmailAlreadyExists => StatusCode::CONFLICT,
        AuthError::WeakPassword
        | AuthError::InvalidEmail
        | AuthError::InvalidUsername
        | AuthError::MissingField(_)
        | AuthError::InvalidResetToken => StatusCode::BAD_REQUEST,
        AuthError::StorageError(_)
        | AuthError::SerializationError(_)
        | AuthError::PasswordHashError(_) => {
            error!("Account operation failed: {}", err);
            return api_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
        }
    };
    api_error(status, err.to_string())
}
