use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("The provided credentials are incorrect.")]
    InvalidCredentials,
    #[error("User not found.")]
    UserNotFound,
    #[error("The email has already been taken.")]
    EmailAlreadyExists,
    #[error("Please verify your email before logging in.")]
    EmailNotVerified,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Missing authorization header")]
    MissingAuthHeader,
    #[error("Invalid authorization header format")]
    InvalidAuthHeaderFormat,
    #[error("Unauthorized")]
    InsufficientPermissions,
    #[error("Invalid verification link.")]
    InvalidVerificationHash,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("Password hashing error: {0}")]
    PasswordHashing(#[from] crate::auth::password::PasswordError),
    #[error("Mail error: {0}")]
    Mail(#[from] crate::services::MailerError),
}

impl AuthError {
    /// Stable machine-readable code included in every error body.
    fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::UserNotFound => "not_found",
            AuthError::EmailAlreadyExists => "validation_failed",
            AuthError::EmailNotVerified => "email_not_verified",
            AuthError::InvalidToken => "invalid_token",
            AuthError::TokenExpired => "token_expired",
            AuthError::MissingAuthHeader | AuthError::InvalidAuthHeaderFormat => "unauthenticated",
            AuthError::InsufficientPermissions => "forbidden",
            AuthError::InvalidVerificationHash => "invalid_verification_link",
            AuthError::Database(_) | AuthError::PasswordHashing(_) | AuthError::Mail(_) => {
                "internal_error"
            }
            AuthError::Jwt(_) => "invalid_token",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials
            | AuthError::InvalidToken
            | AuthError::TokenExpired
            | AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeaderFormat
            | AuthError::Jwt(_) => StatusCode::UNAUTHORIZED,
            AuthError::EmailNotVerified | AuthError::InsufficientPermissions => {
                StatusCode::FORBIDDEN
            }
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::EmailAlreadyExists => StatusCode::UNPROCESSABLE_ENTITY,
            AuthError::InvalidVerificationHash => StatusCode::FORBIDDEN,
            AuthError::Database(_) | AuthError::PasswordHashing(_) | AuthError::Mail(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "auth operation failed");
        }

        // Internal failure details are logged, never returned.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let mut body = json!({
            "error": self.code(),
            "message": message,
        });

        // Duplicate email surfaces as a field-level validation failure.
        if matches!(self, AuthError::EmailAlreadyExists) {
            body["errors"] = json!({ "email": ["The email has already been taken."] });
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unverified_login_maps_to_forbidden_with_code() {
        let error = AuthError::EmailNotVerified;
        assert_eq!(error.status(), StatusCode::FORBIDDEN);
        assert_eq!(error.code(), "email_not_verified");
    }

    #[test]
    fn credential_failures_share_one_shape() {
        // Unknown email and wrong password must be indistinguishable.
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "The provided credentials are incorrect."
        );
        assert_eq!(AuthError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
    }
}
