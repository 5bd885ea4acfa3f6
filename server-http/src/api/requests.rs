use serde::Deserialize;

/// Query string of the paginated movie endpoints. Values stay raw so that
/// bad numbers get a JSON error body instead of an extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub query: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// `login` may be a username or an email
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "username", alias = "email")]
    pub login: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RequestResetRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub token: String,
    #[serde(default, alias = "newPassword")]
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDetailsRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(alias = "oldPassword")]
    pub old_password: String,
    #[serde(alias = "newPassword")]
    pub new_password: String,
}

/// Unwrap a JSON body, turning extractor rejections into `{ message }` errors
pub fn json_body<T>(
    payload: Result<axum::Json<T>, axum::extract::rejection::JsonRejection>,
) -> Result<T, crate::api::ApiError> {
    payload.map(|axum::Json(value)| value).map_err(|rejection| {
        crate::api::api_error(axum::http::StatusCode::BAD_REQUEST, rejection.body_text())
    })
}
