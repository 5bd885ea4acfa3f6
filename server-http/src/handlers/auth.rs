use crate::api::{
    api_error, auth_error, json_body, ApiError, LoginRequest, LoginResponse, MessageResponse,
    RegisterRequest, RegisterResponse, RequestResetRequest, ResetPasswordRequest,
};
use crate::middleware::{extract_basic_auth, extract_bearer_token};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use tracing::{error, info, warn};

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let req = json_body(body)?;

    let user = state
        .accounts
        .register(&req.username, &req.email, &req.password)
        .await
        .map_err(auth_error)?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            user: user.into(),
        }),
    ))
}

/// POST /api/auth/login
///
/// This endpoint accepts either:
/// 1. JSON body: {"login": "deckard", "password": "..."} (`username` or `email` also work)
/// 2. Basic Auth header: Authorization: Basic base64(login:password)
///
/// Returns a session token for the Bearer-protected user routes.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (login, password) = match body {
        Ok(Json(req)) => (req.login, req.password),
        // If no valid JSON body, try Basic Auth header
        Err(_) => {
            let auth_header = headers
                .get(header::AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .ok_or_else(|| {
                    api_error(
                        StatusCode::BAD_REQUEST,
                        "Missing credentials. Provide either JSON body or Basic Auth header",
                    )
                })?;

            extract_basic_auth(auth_header).ok_or_else(|| {
                api_error(StatusCode::BAD_REQUEST, "Invalid Authorization header format")
            })?
        }
    };

    let user = state
        .auth_service
        .authenticate(&login, &password)
        .await
        .map_err(|e| {
            warn!("Failed login for '{}'", login);
            if e.is_client_error() {
                api_error(StatusCode::UNAUTHORIZED, "Invalid username or password")
            } else {
                auth_error(e)
            }
        })?;

    let session = state
        .session_store
        .create_session(&user, client_ip(&headers))
        .await
        .map_err(|e| {
            error!("Failed to create session: {}", e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create session")
        })?;

    info!("User {} logged in", user.username);

    Ok(Json(LoginResponse {
        token: session.token.clone(),
        expires_in: session.remaining_ttl_ms() / 1000,
        expires_at: session.expires_at_utc(),
        user: user.into(),
    }))
}

/// POST /api/auth/logout
///
/// Accepts the session token in the Authorization header as Bearer token:
/// Authorization: Bearer <token>
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, ApiError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| api_error(StatusCode::UNAUTHORIZED, "Missing Authorization header"))?;

    let token = extract_bearer_token(auth_header).ok_or_else(|| {
        api_error(
            StatusCode::BAD_REQUEST,
            "Invalid Authorization header format. Expected: Bearer <token>",
        )
    })?;

    match state.session_store.invalidate_session(&token).await {
        Ok(true) => Ok(Json(MessageResponse::new("Session logged out successfully"))),
        Ok(false) => Err(api_error(
            StatusCode::NOT_FOUND,
            "Session not found or already expired",
        )),
        Err(e) => {
            error!("Failed to logout session: {}", e);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to logout session",
            ))
        }
    }
}

/// POST /api/auth/request-reset
///
/// Unknown emails get the same answer as registered ones.
pub async fn request_reset(
    State(state): State<AppState>,
    body: Result<Json<RequestResetRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let req = json_body(body)?;

    state
        .accounts
        .request_password_reset(&req.email)
        .await
        .map_err(auth_error)?;

    Ok(Json(MessageResponse::new(
        "If that email is registered, a reset token has been sent",
    )))
}

/// POST /api/auth/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    body: Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let req = json_body(body)?;

    let user = state
        .accounts
        .reset_password(&req.token, &req.new_password)
        .await
        .map_err(auth_error)?;

    drop_sessions(&state, &user.id).await;

    Ok(Json(MessageResponse::new("Password has been reset")))
}

/// Log out every device of a user after a credential change
pub(crate) async fn drop_sessions(state: &AppState, user_id: &str) {
    match state.session_store.invalidate_user_sessions(user_id).await {
        Ok(count) => info!("Invalidated {} session(s) for user {}", count, user_id),
        Err(e) => error!("Failed to invalidate sessions for user {}: {}", user_id, e),
    }
}

/// Client IP address from proxy headers only
fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("X-Forwarded-For")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .or_else(|| {
            headers
                .get("X-Real-IP")
                .and_then(|h| h.to_str().ok())
                .map(|s| s.to_string())
        })
}
