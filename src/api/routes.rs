use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::api::{auth as auth_api, bookings, health::health_check, payments, services, users, AppState};
use crate::auth::{
    auth_middleware, cors_layer, security_headers_layer, verified_email_middleware, AuthService,
};
use crate::config::AppConfig;
use crate::services::{
    BookingService, CatalogService, ImageStorage, VerificationMailer, UserService,
};

pub fn create_app_state(
    db: PgPool,
    config: &AppConfig,
    mailer: Arc<VerificationMailer>,
) -> AppState {
    AppState {
        auth: AuthService::new(
            db.clone(),
            &config.jwt_secret,
            mailer,
            config.app_url.clone(),
        ),
        users: UserService::new(db.clone()),
        catalog: CatalogService::new(db.clone(), ImageStorage::from_env()),
        bookings: BookingService::new(db),
    }
}

pub fn create_routes(state: AppState) -> Router {
    // Catalog and booking surface: authenticated and, for regular users,
    // email-verified. Admin-only operations are gated by the authorization
    // policy inside each handler.
    let verified = Router::new()
        .route("/users", get(users::list_users))
        .route(
            "/services",
            get(services::list_services).post(services::create_service),
        )
        .route(
            "/services/:id",
            get(services::get_service)
                .put(services::update_service)
                .delete(services::delete_service),
        )
        .route(
            "/bookings",
            get(bookings::list_bookings).post(bookings::create_booking),
        )
        .route("/bookings/:id", get(bookings::get_booking))
        .route("/bookings/:id/cancel", patch(bookings::cancel_booking))
        .route("/bookings/:id/status", patch(bookings::update_booking_status))
        .route("/bookings/:id/complete", patch(bookings::complete_booking))
        .route(
            "/bookings/:id/mark-payment-received",
            patch(bookings::mark_payment_received),
        )
        .route("/payments/pending", get(payments::pending_payments))
        .route("/payments/summary", get(payments::payment_summary))
        .layer(middleware::from_fn(verified_email_middleware));

    let protected = Router::new()
        .route("/logout", post(auth_api::logout))
        .route("/me", get(auth_api::me))
        .merge(verified)
        .layer(middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/register", post(auth_api::register))
        .route("/login", post(auth_api::login))
        .route("/resend-verification", post(auth_api::resend_verification))
        .route("/verify-email/:id/:hash", get(auth_api::verify_email))
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(security_headers_layer())
                .layer(cors_layer()),
        )
        .with_state(state)
}
