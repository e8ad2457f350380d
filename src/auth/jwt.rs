use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::{AuthError, Claims, UserRole};

/// JWT token service for issuing and validating bearer tokens.
///
/// Tokens carry a `jti` so logout can revoke exactly the presented token
/// through the blacklist table.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_expires_in: Duration,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("encoding_key", &"[REDACTED]")
            .field("decoding_key", &"[REDACTED]")
            .field("token_expires_in", &self.token_expires_in)
            .finish()
    }
}

impl JwtService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            token_expires_in: Duration::hours(24),
        }
    }

    /// Create an access token for a user
    pub fn create_access_token(
        &self,
        user_id: Uuid,
        email: &str,
        role: UserRole,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now + self.token_expires_in;
        let jti = Uuid::new_v4().to_string();

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role,
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
            jti,
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(AuthError::Jwt)
    }

    /// Validate and decode a token
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let validation = Validation::new(Algorithm::HS256);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|token_data| token_data.claims)
            .map_err(|err| match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            })
    }
}

/// Extract bearer token from authorization header
pub fn extract_bearer_token(auth_header: &str) -> Result<&str, AuthError> {
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidAuthHeaderFormat)?;
    if token.is_empty() {
        return Err(AuthError::InvalidAuthHeaderFormat);
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_jwt_creation_and_validation() {
        let jwt_service = JwtService::new("test_secret");
        let user_id = Uuid::new_v4();
        let email = "test@example.com";

        let token = jwt_service
            .create_access_token(user_id, email, UserRole::User)
            .unwrap();

        let claims = jwt_service.validate_token(&token).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, email);
        assert_eq!(claims.role, UserRole::User);
        assert!(!claims.jti.is_empty());
    }

    #[test]
    fn test_token_rejected_with_wrong_secret() {
        let issuer = JwtService::new("secret_a");
        let verifier = JwtService::new("secret_b");

        let token = issuer
            .create_access_token(Uuid::new_v4(), "test@example.com", UserRole::Admin)
            .unwrap();

        assert_matches!(
            verifier.validate_token(&token),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(
            extract_bearer_token("Bearer test_token").unwrap(),
            "test_token"
        );

        assert!(extract_bearer_token("Invalid header").is_err());
        assert!(extract_bearer_token("Bearer ").is_err());
    }

    #[test]
    fn test_tokens_get_distinct_jtis() {
        let jwt_service = JwtService::new("test_secret");
        let user_id = Uuid::new_v4();

        let first = jwt_service
            .create_access_token(user_id, "test@example.com", UserRole::User)
            .unwrap();
        let second = jwt_service
            .create_access_token(user_id, "test@example.com", UserRole::User)
            .unwrap();

        let first_jti = jwt_service.validate_token(&first).unwrap().jti;
        let second_jti = jwt_service.validate_token(&second).unwrap().jti;
        assert_ne!(first_jti, second_jti);
    }
}
