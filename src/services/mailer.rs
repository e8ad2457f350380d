use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailerError {
    #[error("Invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("Failed to build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
}

impl SmtpConfig {
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(587),
            username: std::env::var("SMTP_USERNAME").unwrap_or_default(),
            password: std::env::var("SMTP_PASSWORD").unwrap_or_default(),
            from_email: std::env::var("MAIL_FROM")
                .unwrap_or_else(|_| "no-reply@service.com".to_string()),
            from_name: std::env::var("MAIL_FROM_NAME")
                .unwrap_or_else(|_| "Service Booking".to_string()),
        }
    }
}

/// Outbound verification mail. The one notification this system sends;
/// called explicitly from the auth service rather than through any event
/// broadcast.
pub struct VerificationMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl VerificationMailer {
    pub fn new(config: SmtpConfig) -> Result<Self, MailerError> {
        let transport = if config.username.is_empty() {
            // Local development relay without TLS or credentials.
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
                .port(config.port)
                .build()
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
                .port(config.port)
                .credentials(Credentials::new(config.username, config.password))
                .build()
        };

        Ok(Self {
            transport,
            from: format!("{} <{}>", config.from_name, config.from_email),
        })
    }

    pub async fn send_verification(
        &self,
        to_email: &str,
        to_name: &str,
        link: &str,
    ) -> Result<(), MailerError> {
        let body = format!(
            "Hello {to_name},\n\n\
             Please confirm your email address by opening the link below:\n\n\
             {link}\n\n\
             If you did not create an account, no further action is required.\n"
        );

        let message = Message::builder()
            .from(self.from.parse()?)
            .to(format!("{to_name} <{to_email}>").parse()?)
            .subject("Verify your email address")
            .header(ContentType::TEXT_PLAIN)
            .body(body)?;

        self.transport.send(message).await?;
        tracing::debug!(%to_email, "verification email sent");
        Ok(())
    }
}

impl std::fmt::Debug for VerificationMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationMailer")
            .field("from", &self.from)
            .finish()
    }
}
