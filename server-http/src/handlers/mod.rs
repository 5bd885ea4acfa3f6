pub mod auth;
pub mod health;
pub mod movies;
pub mod users;

pub use auth::{login, logout, register, request_reset, reset_password};
pub use health::health_check;
pub use movies::{details, genres, recommendations, search, similar, trending};
pub use users::{add_to_watchlist, change_password, get_watchlist, profile, update_details, update_preferences};
