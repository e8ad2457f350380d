use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;

/// Error taxonomy for the catalog and booking surface. Validation,
/// not-found and policy violations are expected outcomes reported to the
/// caller; only genuinely unexpected failures become 500s, with details
/// kept in the logs.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("The given data was invalid.")]
    Validation(#[from] validator::ValidationErrors),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Unauthorized")]
    Forbidden,
    #[error("{0}")]
    Policy(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn policy(message: impl Into<String>) -> Self {
        ApiError::Policy(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Auth(inner) = self {
            return inner.into_response();
        }

        let (status, code) = match &self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "validation_failed")
            }
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
            ApiError::Policy(_) => (StatusCode::CONFLICT, "policy_violation"),
            ApiError::Auth(_) => unreachable!(),
            ApiError::Database(_) | ApiError::Storage(_) | ApiError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let mut body = json!({
            "error": code,
            "message": message,
        });

        if let ApiError::Validation(errors) = &self {
            body["errors"] = serde_json::to_value(errors).unwrap_or_default();
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_violations_are_conflicts_not_server_errors() {
        let response =
            ApiError::policy("Only pending bookings can be cancelled").into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn not_found_maps_to_404() {
        let response = ApiError::NotFound("Booking").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn internal_errors_hide_details() {
        let response = ApiError::Internal(anyhow::anyhow!("secret detail")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
