/// Authentication endpoints
///
/// - `POST /api/auth/signup` - register a user
/// - `POST /api/auth/login` - exchange form credentials for an access token
/// - `POST /api/auth/request-reset` - start a password reset
/// - `POST /api/auth/reset-password` - finish a password reset
/// - `DELETE /api/auth/delete-account` - delete the caller's account
///
/// Login and reset requests answer identically for known and unknown emails.

use crate::{
    app::AppState,
    error::ApiResult,
};
use axum::{extract::State, http::StatusCode, Extension, Form, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;
use volunteer_shared::{auth::Identity, models::user::NewUser};

const RESET_REQUESTED: &str = "If that email exists, a reset link has been sent";

/// Signup request
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, max = 100, message = "First name must be 1-100 characters"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 100, message = "Last name must be 1-100 characters"))]
    pub last_name: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login form, OAuth2 password-grant style
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    /// The user's email
    pub username: String,
    pub password: String,
}

/// Issued access token
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,

    /// Always "bearer"
    pub token_type: String,
}

/// Reset request body
#[derive(Debug, Deserialize)]
pub struct RequestResetBody {
    pub email: String,
}

/// Reset confirmation body
#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordBody {
    pub token: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub new_password: String,
}

/// Plain message response
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

/// Registers a user
///
/// ```text
/// POST /api/auth/signup
/// {"email": "ada@example.com", "first_name": "Ada", "last_name": "Lovelace", "password": "..."}
/// ```
///
/// # Errors
///
/// - `409 Conflict`: email already registered
/// - `422 Unprocessable Entity`: malformed email or empty fields
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> ApiResult<(StatusCode, Json<Identity>)> {
    req.validate()?;

    let user = state
        .auth
        .signup(
            NewUser {
                email: req.email,
                first_name: req.first_name,
                last_name: req.last_name,
            },
            req.password,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Logs in with form-encoded `username` and `password`
///
/// # Errors
///
/// - `401 Unauthorized` with `WWW-Authenticate: Bearer` for any bad credentials
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> ApiResult<Json<TokenResponse>> {
    let access_token = state.auth.login(&form.username, form.password).await?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

/// Starts a password reset; always answers with the same message
pub async fn request_reset(
    State(state): State<AppState>,
    Json(req): Json<RequestResetBody>,
) -> ApiResult<Json<MessageResponse>> {
    state.auth.request_password_reset(&req.email).await?;
    Ok(MessageResponse::new(RESET_REQUESTED))
}

/// Sets a new password from a reset token
///
/// # Errors
///
/// - `400 Bad Request`: invalid, expired or non-reset token
/// - `404 Not Found`: the user was deleted after the token was issued
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordBody>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate()?;

    state.auth.reset_password(&req.token, req.new_password).await?;
    Ok(MessageResponse::new("Password has been reset successfully"))
}

/// Deletes the caller's account
///
/// # Errors
///
/// - `401 Unauthorized`: missing or invalid token
/// - `409 Conflict`: the caller created an organization
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<MessageResponse>> {
    state.auth.delete_account(&identity).await?;
    Ok(MessageResponse::new("Account deleted successfully"))
}
