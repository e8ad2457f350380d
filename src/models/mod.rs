// Persisted data models and request/response schemas

pub mod booking;
pub mod service;
pub mod user;

pub use booking::*;
pub use service::*;
pub use user::*;
