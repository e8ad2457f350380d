// Business services operating on the shared database pool

pub mod booking_service;
pub mod catalog_service;
pub mod image_storage;
pub mod mailer;
pub mod user_service;

pub use booking_service::{BookingService, MarkPaymentOutcome, PaymentInfo};
pub use catalog_service::CatalogService;
pub use image_storage::{is_external_url, ImageStorage};
pub use mailer::{MailerError, SmtpConfig, VerificationMailer};
pub use user_service::UserService;
