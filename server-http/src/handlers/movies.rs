use crate::api::{api_error, upstream_error, ApiError, PageQuery};
use crate::state::AppState;
use crate::validation::{self, ValidationError};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use reel::domain::{Genre, MovieItem, PagedResult};
use shared::{Error, UpstreamFailure};
use std::sync::Arc;
use tracing::info;

fn bad_request(err: ValidationError) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, err.to_string())
}

/// GET /api/movies/search?query=&page=&limit=
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<PageQuery>,
) -> Result<Json<Arc<PagedResult>>, ApiError> {
    let query = validation::search_text(&params).map_err(bad_request)?;
    let request = validation::page_request(&params).map_err(bad_request)?;
    info!("Searching movies for '{}' (page {}, limit {})", query, request.page, request.limit);

    state
        .catalog
        .search(query, request)
        .await
        .map(Json)
        .map_err(|e| upstream_error(&e, "Error fetching movies"))
}

/// GET /api/movies/trending?page=&limit=
pub async fn trending(
    State(state): State<AppState>,
    Query(params): Query<PageQuery>,
) -> Result<Json<Arc<PagedResult>>, ApiError> {
    let request = validation::page_request(&params).map_err(bad_request)?;

    state
        .catalog
        .trending(request)
        .await
        .map(Json)
        .map_err(|e| upstream_error(&e, "Error fetching trending movies"))
}

/// GET /api/movies/genres
pub async fn genres(State(state): State<AppState>) -> Result<Json<Arc<Vec<Genre>>>, ApiError> {
    state
        .catalog
        .genres()
        .await
        .map(Json)
        .map_err(|e| upstream_error(&e, "Error fetching popular genres"))
}

/// GET /api/movies/{id}
pub async fn details(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MovieItem>, ApiError> {
    let id = validation::movie_id(&id).map_err(bad_request)?;

    state.catalog.details(id).await.map(Json).map_err(|e| match e {
        Error::UpstreamUnavailable(UpstreamFailure::Status(404)) => {
            api_error(StatusCode::NOT_FOUND, "Movie not found")
        }
        e => upstream_error(&e, "Error fetching movie details"),
    })
}

/// GET /api/movies/recommendations/{id}?page=&limit=
pub async fn recommendations(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<PageQuery>,
) -> Result<Json<PagedResult>, ApiError> {
    let id = validation::movie_id(&id).map_err(bad_request)?;
    let request = validation::page_request(&params).map_err(bad_request)?;

    state
        .catalog
        .recommendations(id, request)
        .await
        .map(Json)
        .map_err(|e| upstream_error(&e, "Error fetching recommended movies"))
}

/// GET /api/movies/similar/{id}?page=&limit=
pub async fn similar(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<PageQuery>,
) -> Result<Json<PagedResult>, ApiError> {
    let id = validation::movie_id(&id).map_err(bad_request)?;
    let request = validation::page_request(&params).map_err(bad_request)?;

    state
        .catalog
        .similar(id, request)
        .await
        .map(Json)
        .map_err(|e| upstream_error(&e, "Error fetching similar movies"))
}
