use axum::{
    extract::{Path, Request, State},
    response::Json,
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::AppState;
use crate::auth::{
    extract_bearer_token, AuthError, CurrentUser, LoginResponse, MessageResponse,
    RegisterResponse, VerificationOutcome,
};
use crate::error::ApiError;
use crate::models::{LoginRequest, RegisterRequest, ResendVerificationRequest, UserResponse};

/// Register a new user account (role is always `user`).
#[tracing::instrument(skip(state, request))]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, ApiError> {
    request.validate()?;
    let response = state.auth.register(request).await?;
    Ok(Json(response))
}

/// Login with email and password.
#[tracing::instrument(skip(state, request))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    request.validate()?;
    let response = state.auth.login(request).await?;
    Ok(Json(response))
}

/// Logout: revoke the presented token only.
#[tracing::instrument(skip(state, request))]
pub async fn logout(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<MessageResponse>, AuthError> {
    let auth_header = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or(AuthError::MissingAuthHeader)?;

    let token = extract_bearer_token(auth_header)?;
    state.auth.logout(token).await?;

    Ok(Json(MessageResponse::new("Logged out successfully")))
}

/// Current authenticated user.
#[tracing::instrument(skip(state, caller))]
pub async fn me(
    State(state): State<AppState>,
    Extension(caller): Extension<CurrentUser>,
) -> Result<Json<serde_json::Value>, AuthError> {
    let user: UserResponse = state.auth.me(&caller).await?;
    Ok(Json(serde_json::json!({ "user": user })))
}

/// Re-send the verification email.
#[tracing::instrument(skip(state, request))]
pub async fn resend_verification(
    State(state): State<AppState>,
    Json(request): Json<ResendVerificationRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    request.validate()?;
    let message = state.auth.resend_verification(&request.email).await?;
    Ok(Json(MessageResponse::new(message)))
}

/// Confirm an email address through the signed link.
#[tracing::instrument(skip(state))]
pub async fn verify_email(
    State(state): State<AppState>,
    Path((user_id, hash)): Path<(Uuid, String)>,
) -> Result<Json<MessageResponse>, AuthError> {
    let message = match state.auth.verify_email(user_id, &hash).await? {
        VerificationOutcome::Verified => "Email verified successfully.",
        VerificationOutcome::AlreadyVerified => "Email already verified.",
    };
    Ok(Json(MessageResponse::new(message)))
}
