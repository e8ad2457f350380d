// API routes and handlers

pub mod auth;
pub mod bookings;
pub mod health;
pub mod payments;
pub mod routes;
pub mod services;
pub mod users;

use serde::Serialize;

use crate::auth::AuthService;
use crate::services::{BookingService, CatalogService, UserService};

#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub users: UserService,
    pub catalog: CatalogService,
    pub bookings: BookingService,
}

/// Standard response envelope: every endpoint answers with a `message`
/// and, where applicable, a `data` payload.
#[derive(Debug, Serialize)]
pub struct ApiMessage {
    pub message: String,
}

impl ApiMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiData<T> {
    pub message: String,
    pub data: T,
}

impl<T> ApiData<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data,
        }
    }
}
