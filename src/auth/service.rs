use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::{AuthError, CurrentUser, JwtService, LoginResponse, RegisterResponse, UserRole};
use crate::models::{LoginRequest, RegisterRequest, User, UserResponse};
use crate::services::VerificationMailer;

/// Signature embedded in the email-verification link; the link is only
/// valid for the address it was issued for.
pub fn verification_hash(email: &str) -> String {
    format!("{:x}", md5::compute(email.as_bytes()))
}

/// What came out of a verification attempt. `Verified` is emitted at most
/// once per user; repeats land on `AlreadyVerified`.
#[derive(Debug, PartialEq, Eq)]
pub enum VerificationOutcome {
    Verified,
    AlreadyVerified,
}

#[derive(Clone)]
pub struct AuthService {
    jwt_service: JwtService,
    db: PgPool,
    mailer: Arc<VerificationMailer>,
    app_url: String,
}

impl AuthService {
    pub fn new(db: PgPool, jwt_secret: &str, mailer: Arc<VerificationMailer>, app_url: String) -> Self {
        Self {
            jwt_service: JwtService::new(jwt_secret),
            db,
            mailer,
            app_url,
        }
    }

    /// Register a new user. Always role=user and unverified; admins are
    /// seeded, never registered.
    pub async fn register(&self, request: RegisterRequest) -> Result<RegisterResponse, AuthError> {
        if self.get_user_by_email(&request.email).await?.is_some() {
            return Err(AuthError::EmailAlreadyExists);
        }

        let password_hash = hash_password(&request.password)?;

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, name, email, password_hash, role, phone)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&request.name)
        .bind(&request.email)
        .bind(&password_hash)
        .bind(UserRole::User.as_str())
        .bind(&request.phone)
        .fetch_one(&self.db)
        .await
        .map_err(AuthError::Database)?;

        // Registration stands even when the mail bounces; the user can ask
        // for a resend.
        if let Err(error) = self.send_verification_mail(&user).await {
            tracing::warn!(user_id = %user.id, %error, "failed to send verification email");
        }

        Ok(RegisterResponse {
            message: "User registered successfully. Please verify your email before logging in."
                .to_string(),
            user: user.into(),
        })
    }

    /// Login. Unknown email and wrong password produce the same failure so
    /// neither field leaks; unverified `user` accounts are turned away with
    /// a dedicated 403 contract.
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AuthError> {
        let user = self
            .get_user_by_email(&request.email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(&request.password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        if user.is_user() && !user.has_verified_email() {
            return Err(AuthError::EmailNotVerified);
        }

        let access_token =
            self.jwt_service
                .create_access_token(user.id, &user.email, user.role())?;

        Ok(LoginResponse {
            message: "Login successful".to_string(),
            user: user.into(),
            access_token,
            token_type: "Bearer".to_string(),
        })
    }

    /// Logout revokes exactly the presented token by blacklisting its jti.
    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        let claims = self.jwt_service.validate_token(token)?;
        self.blacklist_token(&claims.jti, claims.exp as i64).await
    }

    /// Resolve the caller for a bearer token: valid signature, not
    /// blacklisted, and still backed by a user row.
    pub async fn authenticate(&self, token: &str) -> Result<CurrentUser, AuthError> {
        let claims = self.jwt_service.validate_token(token)?;

        if self.is_token_blacklisted(&claims.jti).await? {
            return Err(AuthError::InvalidToken);
        }

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;
        let user = self
            .get_user_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        Ok(CurrentUser {
            id: user.id,
            name: user.name,
            email: user.email,
            role: UserRole::from_str(&user.role).unwrap_or(UserRole::User),
            email_verified: user.email_verified_at.is_some(),
            jti: claims.jti,
        })
    }

    pub async fn me(&self, caller: &CurrentUser) -> Result<UserResponse, AuthError> {
        let user = self
            .get_user_by_id(caller.id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        Ok(user.into())
    }

    /// Re-send the verification mail. Unknown email is a 404; an already
    /// verified account is a no-op with a message.
    pub async fn resend_verification(&self, email: &str) -> Result<&'static str, AuthError> {
        let user = self
            .get_user_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if user.has_verified_email() {
            return Ok("Email already verified.");
        }

        self.send_verification_mail(&user).await?;
        Ok("Verification email sent successfully.")
    }

    /// Verify an email address through the signed link. Idempotent: the
    /// second call reports `AlreadyVerified` and does not re-emit the
    /// verified event.
    pub async fn verify_email(
        &self,
        user_id: Uuid,
        hash: &str,
    ) -> Result<VerificationOutcome, AuthError> {
        let user = self
            .get_user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if hash != verification_hash(&user.email) {
            return Err(AuthError::InvalidVerificationHash);
        }

        if user.has_verified_email() {
            return Ok(VerificationOutcome::AlreadyVerified);
        }

        // Guarded update keeps this idempotent under concurrent clicks on
        // the same link.
        let result = sqlx::query(
            "UPDATE users SET email_verified_at = $2, updated_at = $2
             WHERE id = $1 AND email_verified_at IS NULL",
        )
        .bind(user.id)
        .bind(Utc::now())
        .execute(&self.db)
        .await
        .map_err(AuthError::Database)?;

        if result.rows_affected() == 0 {
            return Ok(VerificationOutcome::AlreadyVerified);
        }

        tracing::info!(user_id = %user.id, "email verified");
        Ok(VerificationOutcome::Verified)
    }

    async fn send_verification_mail(&self, user: &User) -> Result<(), AuthError> {
        let link = format!(
            "{}/verify-email/{}/{}",
            self.app_url,
            user.id,
            verification_hash(&user.email)
        );
        self.mailer
            .send_verification(&user.email, &user.name, &link)
            .await?;
        Ok(())
    }

    pub async fn is_token_blacklisted(&self, jti: &str) -> Result<bool, AuthError> {
        let result =
            sqlx::query("SELECT 1 FROM token_blacklist WHERE jti = $1 AND expires_at > now()")
                .bind(jti)
                .fetch_optional(&self.db)
                .await
                .map_err(AuthError::Database)?;

        Ok(result.is_some())
    }

    // Private helper methods

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.db)
            .await
            .map_err(AuthError::Database)?;

        Ok(user)
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.db)
            .await
            .map_err(AuthError::Database)?;

        Ok(user)
    }

    async fn blacklist_token(&self, jti: &str, exp: i64) -> Result<(), AuthError> {
        let expires_at =
            chrono::DateTime::from_timestamp(exp, 0).ok_or(AuthError::InvalidToken)?;

        sqlx::query(
            "INSERT INTO token_blacklist (jti, expires_at) VALUES ($1, $2)
             ON CONFLICT (jti) DO NOTHING",
        )
        .bind(jti)
        .bind(expires_at)
        .execute(&self.db)
        .await
        .map_err(AuthError::Database)?;

        Ok(())
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("jwt_service", &self.jwt_service)
            .field("app_url", &self.app_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_hash_is_stable_per_email() {
        let first = verification_hash("user@service.com");
        let second = verification_hash("user@service.com");
        assert_eq!(first, second);
        assert_ne!(first, verification_hash("admin@service.com"));
    }

    #[test]
    fn verification_hash_is_lowercase_hex() {
        let hash = verification_hash("user@service.com");
        assert_eq!(hash.len(), 32);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
