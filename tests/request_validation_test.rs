use chrono::NaiveDate;
use validator::Validate;

use service_booking::models::{
    CreateBookingRequest, CreateServicePayload, LoginRequest, MarkPaymentRequest,
    RegisterRequest, UpdateStatusRequest,
};

fn register_request() -> RegisterRequest {
    RegisterRequest {
        name: "Jane Roe".to_string(),
        email: "jane@example.com".to_string(),
        password: "password123".to_string(),
        password_confirmation: "password123".to_string(),
        phone: Some("+1555000111".to_string()),
    }
}

#[test]
fn register_accepts_a_well_formed_request() {
    assert!(register_request().validate().is_ok());
}

#[test]
fn register_rejects_short_passwords() {
    let mut request = register_request();
    request.password = "short".to_string();
    request.password_confirmation = "short".to_string();

    let errors = request.validate().unwrap_err();
    assert!(errors.field_errors().contains_key("password"));
}

#[test]
fn register_rejects_mismatched_confirmation() {
    let mut request = register_request();
    request.password_confirmation = "different123".to_string();

    let errors = request.validate().unwrap_err();
    assert!(errors.field_errors().contains_key("password_confirmation"));
}

#[test]
fn register_rejects_a_malformed_email() {
    let mut request = register_request();
    request.email = "not-an-email".to_string();

    let errors = request.validate().unwrap_err();
    assert!(errors.field_errors().contains_key("email"));
}

#[test]
fn login_requires_a_password() {
    let request = LoginRequest {
        email: "jane@example.com".to_string(),
        password: String::new(),
    };

    let errors = request.validate().unwrap_err();
    assert!(errors.field_errors().contains_key("password"));
}

#[test]
fn service_payload_rejects_negative_price() {
    let payload = CreateServicePayload {
        name: "Window Washing".to_string(),
        description: "Interior and exterior window cleaning.".to_string(),
        price: -1.0,
        duration_minutes: 60,
        category: "Cleaning".to_string(),
        is_active: None,
    };

    let errors = payload.validate().unwrap_err();
    assert!(errors.field_errors().contains_key("price"));
}

#[test]
fn service_payload_rejects_zero_duration() {
    let payload = CreateServicePayload {
        name: "Window Washing".to_string(),
        description: "Interior and exterior window cleaning.".to_string(),
        price: 45.0,
        duration_minutes: 0,
        category: "Cleaning".to_string(),
        is_active: None,
    };

    let errors = payload.validate().unwrap_err();
    assert!(errors.field_errors().contains_key("duration_minutes"));
}

#[test]
fn booking_request_rejects_a_malformed_time() {
    let request = CreateBookingRequest {
        service_id: uuid::Uuid::new_v4(),
        booking_date: NaiveDate::from_ymd_opt(2026, 9, 15).unwrap(),
        booking_time: "half past nine".to_string(),
        notes: None,
    };

    let errors = request.validate().unwrap_err();
    assert!(errors.field_errors().contains_key("booking_time"));
}

#[test]
fn booking_request_accepts_both_time_formats() {
    for time in ["09:30", "09:30:00"] {
        let request = CreateBookingRequest {
            service_id: uuid::Uuid::new_v4(),
            booking_date: NaiveDate::from_ymd_opt(2026, 9, 15).unwrap(),
            booking_time: time.to_string(),
            notes: None,
        };
        assert!(request.validate().is_ok(), "{time} should validate");
    }
}

#[test]
fn status_update_rejects_unknown_status_values() {
    let result: Result<UpdateStatusRequest, _> =
        serde_json::from_value(serde_json::json!({ "status": "archived" }));
    assert!(result.is_err());

    let request: UpdateStatusRequest =
        serde_json::from_value(serde_json::json!({ "status": "approved" })).unwrap();
    assert!(request.validate().is_ok());
}

#[test]
fn payment_marking_rejects_negative_amounts() {
    let request = MarkPaymentRequest {
        received_amount: -10.0,
        admin_notes: None,
    };

    let errors = request.validate().unwrap_err();
    assert!(errors.field_errors().contains_key("received_amount"));
}
