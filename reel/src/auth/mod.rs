// Public API
pub mod account_service;
pub mod auth_service;
pub mod error;
pub mod moka_session_repository;
pub mod models;
pub mod password;
pub mod repository;
pub mod reset;
pub mod session;
pub mod session_store;
pub mod sled_repository;

// Re-export commonly used types
pub use account_service::{AccountService, validate_email};
pub use auth_service::AuthService;
pub use error::AuthError;
pub use moka_session_repository::MokaSessionRepository;
pub use models::User;
pub use repository::UserRepository;
pub use reset::{LogResetNotifier, ResetNotifier, ResetTokenStore};
pub use session::{current_timestamp_ms, format_utc_time, generate_token, Session, SessionToken};
pub use session_store::{SessionRepository, SessionStore};
pub use sled_repository::SledUserRepository;
