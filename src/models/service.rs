use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Service {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub duration_minutes: i32,
    pub category: String,
    pub image: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateServicePayload {
    #[validate(length(min = 1, max = 255, message = "The name field is required."))]
    pub name: String,
    #[validate(length(min = 1, message = "The description field is required."))]
    pub description: String,
    #[validate(range(min = 0.0, message = "The price must be at least 0."))]
    pub price: f64,
    #[validate(range(min = 1, message = "The duration must be at least 1 minute."))]
    pub duration_minutes: i32,
    #[validate(length(min = 1, max = 100, message = "The category field is required."))]
    pub category: String,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateServicePayload {
    #[validate(length(min = 1, max = 255, message = "The name may not be empty."))]
    pub name: Option<String>,
    #[validate(length(min = 1, message = "The description may not be empty."))]
    pub description: Option<String>,
    #[validate(range(min = 0.0, message = "The price must be at least 0."))]
    pub price: Option<f64>,
    #[validate(range(min = 1, message = "The duration must be at least 1 minute."))]
    pub duration_minutes: Option<i32>,
    #[validate(length(min = 1, max = 100, message = "The category may not be empty."))]
    pub category: Option<String>,
    pub is_active: Option<bool>,
}

/// A new image for a service: either an uploaded file (stored locally and
/// referenced by path) or a direct external URL kept verbatim.
#[derive(Debug, Clone)]
pub enum ServiceImage {
    Upload { extension: String, data: Vec<u8> },
    ExternalUrl(String),
}

#[derive(Debug, Deserialize)]
pub struct ServiceListQuery {
    pub category: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn create_payload_rejects_negative_price() {
        let payload = CreateServicePayload {
            name: "AC Maintenance".to_string(),
            description: "Air conditioning maintenance.".to_string(),
            price: -1.0,
            duration_minutes: 60,
            category: "Maintenance".to_string(),
            is_active: None,
        };
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("price"));
    }

    #[test]
    fn create_payload_rejects_zero_duration() {
        let payload = CreateServicePayload {
            name: "AC Maintenance".to_string(),
            description: "Air conditioning maintenance.".to_string(),
            price: 75.0,
            duration_minutes: 0,
            category: "Maintenance".to_string(),
            is_active: None,
        };
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("duration_minutes"));
    }

    #[test]
    fn update_payload_accepts_partial_fields() {
        let payload = UpdateServicePayload {
            price: Some(80.0),
            ..Default::default()
        };
        assert!(payload.validate().is_ok());
    }
}
