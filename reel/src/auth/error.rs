use sled::transaction::TransactionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Username already taken")]
    UserAlreadyExists,

    #[error("Email already registered")]
    EmailAlreadyExists,

    #[error("Password does not meet strength requirements")]
    WeakPassword,

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Username cannot contain '@'")]
    InvalidUsername,

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Invalid or expired reset token")]
    InvalidResetToken,

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Password hashing error: {0}")]
    PasswordHashError(String),
}

impl AuthError {
    /// True for failures caused by the caller's input rather than the server
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            AuthError::StorageError(_)
                | AuthError::SerializationError(_)
                | AuthError::PasswordHashError(_)
        )
    }
}

impl From<sled::Error> for AuthError {
    fn from(err: sled::Error) -> Self {
        AuthError::StorageError(err.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        AuthError::SerializationError(err.to_string())
    }
}

impl From<TransactionError<AuthError>> for AuthError {
    fn from(err: TransactionError<AuthError>) -> Self {
        match err {
            TransactionError::Abort(err) => err,
            TransactionError::Storage(err) => err.into(),
        }
    }
}
