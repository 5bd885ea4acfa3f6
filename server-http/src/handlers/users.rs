use crate::api::{
    api_error, auth_error, json_body, ApiError, ChangePasswordRequest, MessageResponse,
    UpdateDetailsRequest, UserResponse,
};
use crate::handlers::auth::drop_sessions;
use crate::middleware::CurrentUser;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::Value;

/// GET /api/users/profile
pub async fn profile(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .accounts
        .get_user_by_id(&current.user_id)
        .await
        .map_err(auth_error)?;

    Ok(Json(user.into()))
}

/// PATCH /api/users/preferences with body `{ "preferences": [...] }`
pub async fn update_preferences(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    let body = json_body(body)?;
    let preferences = parse_preferences(&body)
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Preferences should be an array"))?;

    let user = state
        .accounts
        .update_preferences(&current.user_id, preferences)
        .await
        .map_err(auth_error)?;

    Ok(Json(user.into()))
}

/// PATCH /api/users
pub async fn update_details(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    body: Result<Json<UpdateDetailsRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    let req = json_body(body)?;

    let (Some(email), Some(username)) = (
        req.email.filter(|e| !e.trim().is_empty()),
        req.username.filter(|u| !u.trim().is_empty()),
    ) else {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Email and username are required",
        ));
    };

    let user = state
        .accounts
        .update_details(&current.user_id, &email, &username)
        .await
        .map_err(auth_error)?;

    Ok(Json(user.into()))
}

/// POST /api/users/watchlist with body `{ "movieId": 603 }`
///
/// Adding a movie that is already listed succeeds without changing anything.
pub async fn add_to_watchlist(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    let body = json_body(body)?;
    let movie_id = parse_movie_id(&body)?;

    let user = state
        .accounts
        .add_to_watchlist(&current.user_id, movie_id)
        .await
        .map_err(auth_error)?;

    Ok(Json(user.into()))
}

/// GET /api/users/watchlist
pub async fn get_watchlist(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<Vec<u64>>, ApiError> {
    state
        .accounts
        .get_watchlist(&current.user_id)
        .await
        .map(Json)
        .map_err(auth_error)
}

/// POST /api/users/password
///
/// Every session of the user, including the current one, is logged out.
pub async fn change_password(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    body: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let req = json_body(body)?;

    state
        .accounts
        .change_password(&current.user_id, &req.old_password, &req.new_password)
        .await
        .map_err(auth_error)?;

    drop_sessions(&state, &current.user_id).await;

    Ok(Json(MessageResponse::new("Password changed, please log in again")))
}

/// `preferences` must be an array of strings
fn parse_preferences(body: &Value) -> Option<Vec<String>> {
    body.get("preferences")?
        .as_array()?
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}

/// `movieId` as a positive number or a numeric string
fn parse_movie_id(body: &Value) -> Result<u64, ApiError> {
    let required = || api_error(StatusCode::BAD_REQUEST, "Movie ID is required");
    let invalid = || api_error(StatusCode::BAD_REQUEST, "Movie ID must be a positive integer");

    let id = match body.get("movieId") {
        None | Some(Value::Null) => return Err(required()),
        Some(Value::String(s)) if s.trim().is_empty() => return Err(required()),
        Some(Value::String(s)) => s.trim().parse::<u64>().map_err(|_| invalid())?,
        Some(value) => value.as_u64().ok_or_else(invalid)?,
    };

    if id == 0 {
        return Err(required());
    }
    Ok(id)
}
