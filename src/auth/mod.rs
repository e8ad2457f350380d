// Authentication, token handling and authorization policy

pub mod errors;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod policy;
pub mod service;

pub use errors::AuthError;
pub use jwt::{extract_bearer_token, JwtService};
pub use middleware::{auth_middleware, cors_layer, security_headers_layer, verified_email_middleware};
pub use models::{Claims, CurrentUser, LoginResponse, MessageResponse, RegisterResponse, UserRole};
pub use policy::{authorize, Action};
pub use service::{verification_hash, AuthService, VerificationOutcome};
