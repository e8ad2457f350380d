use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use tower_http::cors::{Any, CorsLayer};

use crate::auth::{extract_bearer_token, AuthError, AuthService, CurrentUser};

/// Bearer-token authentication middleware. Resolves the caller (fresh from
/// the database, so role and verification state are current) and attaches
/// it to the request.
pub async fn auth_middleware(
    State(auth_service): State<AuthService>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or(AuthError::MissingAuthHeader)?;

    let token = extract_bearer_token(auth_header)?;
    let caller = auth_service.authenticate(token).await?;

    request.extensions_mut().insert(caller);

    Ok(next.run(request).await)
}

/// Regular users must have a verified email to reach the catalog and
/// booking surface; admins pass through untouched.
pub async fn verified_email_middleware(
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let caller = request
        .extensions()
        .get::<CurrentUser>()
        .ok_or(AuthError::InsufficientPermissions)?;

    if caller.is_user() && !caller.email_verified {
        return Err(AuthError::EmailNotVerified);
    }

    Ok(next.run(request).await)
}

/// CORS configuration for the JSON API.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Security headers middleware
pub fn security_headers_layer(
) -> tower_http::set_header::SetResponseHeaderLayer<axum::http::HeaderValue> {
    tower_http::set_header::SetResponseHeaderLayer::overriding(
        axum::http::header::HeaderName::from_static("x-content-type-options"),
        axum::http::HeaderValue::from_static("nosniff"),
    )
}
