use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::auth::UserRole;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub phone: Option<String>,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn role(&self) -> UserRole {
        UserRole::from_str(&self.role).unwrap_or(UserRole::User)
    }

    pub fn is_admin(&self) -> bool {
        self.role() == UserRole::Admin
    }

    pub fn is_user(&self) -> bool {
        self.role() == UserRole::User
    }

    pub fn has_verified_email(&self) -> bool {
        self.email_verified_at.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub role: UserRole,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 255, message = "The name field is required."))]
    pub name: String,
    #[validate(email(message = "The email must be a valid email address."))]
    pub email: String,
    #[validate(length(min = 8, message = "The password must be at least 8 characters."))]
    pub password: String,
    #[validate(must_match(other = "password", message = "The password confirmation does not match."))]
    pub password_confirmation: String,
    #[validate(length(max = 20, message = "The phone may not be greater than 20 characters."))]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "The email must be a valid email address."))]
    pub email: String,
    #[validate(length(min = 1, message = "The password field is required."))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResendVerificationRequest {
    #[validate(email(message = "The email must be a valid email address."))]
    pub email: String,
}

/// Public view of a user, safe to return from the API.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub phone: Option<String>,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        let is_verified = user.has_verified_email();
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            phone: user.phone,
            email_verified_at: user.email_verified_at,
            is_verified,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user(role: &str, verified: bool) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            name: "Test User".to_string(),
            email: "user@service.com".to_string(),
            password_hash: "hash".to_string(),
            role: role.to_string(),
            phone: None,
            email_verified_at: verified.then_some(now),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn role_helpers_match_stored_role() {
        let admin = sample_user("admin", true);
        assert!(admin.is_admin());
        assert!(!admin.is_user());

        let user = sample_user("user", false);
        assert!(user.is_user());
        assert!(!user.is_admin());
    }

    #[test]
    fn unknown_role_falls_back_to_user() {
        let odd = sample_user("superhero", false);
        assert!(odd.is_user());
    }

    #[test]
    fn register_request_requires_matching_confirmation() {
        let request = RegisterRequest {
            name: "Jane".to_string(),
            email: "jane@example.com".to_string(),
            password: "secret-password".to_string(),
            password_confirmation: "different".to_string(),
            phone: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn register_request_rejects_short_password() {
        let request = RegisterRequest {
            name: "Jane".to_string(),
            email: "jane@example.com".to_string(),
            password: "short".to_string(),
            password_confirmation: "short".to_string(),
            phone: None,
        };
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
    }
}
