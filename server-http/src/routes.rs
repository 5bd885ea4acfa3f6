use crate::handlers;
use crate::middleware::require_session;
use crate::state::AppState;
use axum::{
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};
use shared::config::Config;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::normalize_path::NormalizePath;
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Build and configure the application router
pub fn build_router(state: AppState, config: &Config) -> Router {
    let movies = Router::new()
        .route("/api/movies/search", get(handlers::search))
        .route("/api/movies/trending", get(handlers::trending))
        .route("/api/movies/genres", get(handlers::genres))
        .route("/api/movies/{id}", get(handlers::details))
        .route("/api/movies/recommendations/{id}", get(handlers::recommendations))
        .route("/api/movies/similar/{id}", get(handlers::similar));

    let auth = Router::new()
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/logout", post(handlers::logout))
        .route("/api/auth/request-reset", post(handlers::request_reset))
        .route("/api/auth/reset-password", post(handlers::reset_password));

    // Everything under /api/users needs a live session
    let users = Router::new()
        .route("/api/users", patch(handlers::update_details))
        .route("/api/users/profile", get(handlers::profile))
        .route("/api/users/preferences", patch(handlers::update_preferences))
        .route(
            "/api/users/watchlist",
            get(handlers::get_watchlist).post(handlers::add_to_watchlist),
        )
        .route("/api/users/password", post(handlers::change_password))
        .route_layer(from_fn_with_state(state.clone(), require_session));

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        .merge(movies)
        .merge(auth)
        .merge(users)
        // Middleware
        .layer(cors_layer(config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// The router with trailing slashes trimmed before routing
pub fn build_app(state: AppState, config: &Config) -> NormalizePath<Router> {
    NormalizePath::trim_trailing_slash(build_router(state, config))
}

fn cors_layer(config: &Config) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if config.allows_any_origin() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| {
            HeaderValue::from_str(origin)
                .inspect_err(|_| warn!("Ignoring invalid CORS origin: {}", origin))
                .ok()
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}
