use crate::api::api_error;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine};
use tracing::debug;

/// The session owner, attached to requests that passed `require_session`
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: String,
}

/// Extract Basic Auth credentials from Authorization header
pub fn extract_basic_auth(auth_header: &str) -> Option<(String, String)> {
    // Authorization: Basic <base64>
    let parts: Vec<&str> = auth_header.split_whitespace().collect();

    if parts.len() != 2 || parts[0] != "Basic" {
        return None;
    }

    let decoded = STANDARD.decode(parts[1]).ok()?;
    let decoded_str = String::from_utf8(decoded).ok()?;

    // Password may contain colons
    let (username, password) = decoded_str.split_once(':')?;

    Some((username.to_string(), password.to_string()))
}

/// Extract Bearer token from Authorization header
pub fn extract_bearer_token(auth_header: &str) -> Option<String> {
    // Authorization: Bearer <token>
    let parts: Vec<&str> = auth_header.split_whitespace().collect();

    if parts.len() != 2 || parts[0] != "Bearer" {
        return None;
    }

    Some(parts[1].to_string())
}

/// Session middleware: requires `Authorization: Bearer <token>` naming a live session
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let unauthorized = |message: &str| {
        (
            [(header::WWW_AUTHENTICATE, "Bearer")],
            api_error(StatusCode::UNAUTHORIZED, message),
        )
            .into_response()
    };

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| unauthorized("Not authorized, no token"))?;

    let token = extract_bearer_token(auth_header)
        .ok_or_else(|| unauthorized("Invalid Authorization header format. Expected: Bearer <token>"))?;

    let session = state
        .session_store
        .validate_session(&token)
        .await
        .map_err(|_| {
            debug!("Rejected unknown or expired session token");
            unauthorized("Not authorized, token failed")
        })?;

    request.extensions_mut().insert(CurrentUser {
        user_id: session.user_id,
    });

    Ok(next.run(request).await)
}
